use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use super::schema::FormSchema;
use super::validator::{validate, ErrorMap, FieldValues};

/// Values, touched set, and derived errors for one mounted form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormState {
    values: FieldValues,
    touched: BTreeSet<String>,
    errors: ErrorMap,
}

impl FormState {
    /// Fresh state: every field empty, nothing touched, errors computed against empty values.
    pub fn initial(schema: &FormSchema) -> Self {
        let values: FieldValues = schema
            .field_names()
            .map(|name| (name.to_string(), String::new()))
            .collect();
        let errors = validate(schema, &values);
        Self {
            values,
            touched: BTreeSet::new(),
            errors,
        }
    }

    pub fn values(&self) -> &FieldValues {
        &self.values
    }

    pub fn touched(&self) -> &BTreeSet<String> {
        &self.touched
    }

    /// Full error map, independent of what has been touched.
    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn is_touched(&self, name: &str) -> bool {
        self.touched.contains(name)
    }

    /// Submit gating: ignores the touched set entirely.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Error exposed to the view: only for touched fields.
    pub fn visible_error(&self, name: &str) -> Option<&str> {
        if !self.is_touched(name) {
            return None;
        }
        self.errors.get(name).map(String::as_str)
    }

    pub fn visible_errors(&self) -> ErrorMap {
        self.errors
            .iter()
            .filter(|(name, _)| self.touched.contains(name.as_str()))
            .map(|(name, message)| (name.clone(), message.clone()))
            .collect()
    }
}

/// Read-only projection rendered by the view binding after every mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSnapshot {
    pub form: String,
    pub values: FieldValues,
    pub errors: ErrorMap,
    pub touched: BTreeSet<String>,
    pub is_valid: bool,
}

/// Single-writer store wrapping the state of one form instance.
///
/// Every mutation completes its re-validation before returning, so no caller can observe
/// values and errors that disagree.
#[derive(Debug, Clone)]
pub struct FormStore {
    schema: Arc<FormSchema>,
    state: FormState,
}

impl FormStore {
    pub fn new(schema: Arc<FormSchema>) -> Self {
        let state = FormState::initial(&schema);
        Self { schema, state }
    }

    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn is_valid(&self) -> bool {
        self.state.is_valid()
    }

    pub fn visible_error(&self, name: &str) -> Option<&str> {
        self.state.visible_error(name)
    }

    pub fn set_value(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        self.ensure_field(name)?;
        self.state.values.insert(name.to_string(), value.into());
        self.revalidate();
        Ok(())
    }

    pub fn set_touched(&mut self, name: &str) -> Result<(), FormError> {
        self.ensure_field(name)?;
        self.state.touched.insert(name.to_string());
        Ok(())
    }

    pub fn touch_all(&mut self) {
        let names: Vec<String> = self.schema.field_names().map(str::to_string).collect();
        self.state.touched.extend(names);
    }

    /// Recompute the error map from the current values, replacing it wholesale.
    pub fn revalidate(&mut self) {
        self.state.errors = validate(&self.schema, &self.state.values);
    }

    pub fn reset(&mut self) {
        self.state = FormState::initial(&self.schema);
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            form: self.schema.id().to_string(),
            values: self.state.values.clone(),
            errors: self.state.visible_errors(),
            touched: self.state.touched.clone(),
            is_valid: self.state.is_valid(),
        }
    }

    fn ensure_field(&self, name: &str) -> Result<(), FormError> {
        if self.schema.contains(name) {
            Ok(())
        } else {
            Err(FormError::UnknownField {
                form: self.schema.id().to_string(),
                field: name.to_string(),
            })
        }
    }
}

/// Events that name a field the schema does not declare.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    #[error("form `{form}` has no field named `{field}`")]
    UnknownField { form: String, field: String },
}
