use super::common::*;
use crate::forms::state::FormError;
use crate::forms::validator::{validate, INVALID_EMAIL, REQUIRED};

#[test]
fn new_store_starts_empty_and_invalid() {
    let store = interview_store();
    let state = store.state();

    assert!(state.values().values().all(String::is_empty));
    assert_eq!(state.values().len(), 4);
    assert!(state.touched().is_empty());
    assert_eq!(state.errors().len(), 4);
    assert!(!store.is_valid());
}

#[test]
fn untouched_form_hides_errors_but_reports_invalid() {
    let mut store = interview_store();
    store.set_value("firstName", "Jane").expect("known field");

    let snapshot = store.snapshot();
    assert!(!snapshot.is_valid);
    assert!(snapshot.errors.is_empty());
    assert_eq!(snapshot.values.get("firstName").map(String::as_str), Some("Jane"));
}

#[test]
fn blurring_a_field_reveals_only_its_error() {
    let mut store = interview_store();
    store.set_value("email", "not-an-email").expect("known field");
    store.set_touched("email").expect("known field");

    let snapshot = store.snapshot();
    assert_eq!(
        snapshot.errors,
        values(&[("email", INVALID_EMAIL)])
    );
    assert!(!snapshot.is_valid);
    assert_eq!(store.visible_error("firstName"), None);
    assert_eq!(store.state().errors().get("firstName").map(String::as_str), Some(REQUIRED));
}

#[test]
fn over_length_error_exists_before_it_is_visible() {
    let mut store = interview_store();
    store
        .set_value("firstName", "Maximilianusxyz1")
        .expect("known field");

    assert_eq!(
        store.state().errors().get("firstName").map(String::as_str),
        Some("Must be 15 characters or less")
    );
    assert_eq!(store.visible_error("firstName"), None);

    store.set_touched("firstName").expect("known field");
    assert_eq!(
        store.visible_error("firstName"),
        Some("Must be 15 characters or less")
    );
}

#[test]
fn touching_one_field_never_changes_another_fields_visibility() {
    let mut store = interview_store();
    store.set_touched("lastName").expect("known field");
    let before = store.visible_error("lastName").map(str::to_string);

    for field in ["firstName", "email", "github"] {
        store.set_touched(field).expect("known field");
        assert_eq!(store.visible_error("lastName").map(str::to_string), before);
    }
    assert_eq!(before.as_deref(), Some(REQUIRED));
}

#[test]
fn errors_always_match_a_fresh_validation() {
    let mut store = interview_store();
    let edits = [
        ("firstName", "J"),
        ("email", "jane@"),
        ("email", "jane@doe.com"),
        ("github", "github.com/jane"),
        ("firstName", ""),
        ("github", "https://github.com/jane"),
    ];

    for (field, value) in edits {
        store.set_value(field, value).expect("known field");
        let expected = validate(store.schema(), store.state().values());
        assert_eq!(store.state().errors(), &expected);
        assert_eq!(store.is_valid(), expected.is_empty());
    }
}

#[test]
fn set_touched_does_not_touch_values_or_errors() {
    let mut store = interview_store();
    store.set_value("email", "jane@doe.com").expect("known field");
    let errors_before = store.state().errors().clone();
    let values_before = store.state().values().clone();

    store.set_touched("email").expect("known field");
    assert_eq!(store.state().errors(), &errors_before);
    assert_eq!(store.state().values(), &values_before);
}

#[test]
fn is_valid_ignores_touched_state() {
    let mut store = interview_store();
    fill_valid_interview(&mut store);
    assert!(store.is_valid());

    store.touch_all();
    assert!(store.is_valid());

    store.set_value("email", "broken").expect("known field");
    assert!(!store.is_valid());
    assert!(store.snapshot().errors.contains_key("email"));
}

#[test]
fn reset_restores_initial_state() {
    let mut store = interview_store();
    fill_valid_interview(&mut store);
    store.touch_all();

    store.reset();

    let fresh = interview_store();
    assert_eq!(store.state(), fresh.state());
}

#[test]
fn unknown_fields_are_rejected_without_side_effects() {
    let mut store = interview_store();
    let before = store.state().clone();

    let err = store.set_value("phone", "555").expect_err("unknown field");
    assert_eq!(
        err,
        FormError::UnknownField {
            form: "interview".to_string(),
            field: "phone".to_string(),
        }
    );
    assert!(store.set_touched("phone").is_err());
    assert_eq!(store.state(), &before);
}
