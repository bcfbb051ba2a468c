//! Pure validation of form values against a [`FormSchema`].

use std::collections::BTreeMap;

use super::schema::{FieldKind, FieldSchema, FormSchema};

/// Current string value per field name.
pub type FieldValues = BTreeMap<String, String>;

/// At most one message per failing field.
pub type ErrorMap = BTreeMap<String, String>;

pub const REQUIRED: &str = "Required";
pub const INVALID_EMAIL: &str = "Invalid email address";
pub const INVALID_URL: &str = "Invalid URL";
pub const INVALID_SELECTION: &str = "Invalid selection";

pub fn max_length_message(max_length: usize) -> String {
    format!("Must be {max_length} characters or less")
}

/// Validate every field of `schema`; fields absent from `values` count as empty.
pub fn validate(schema: &FormSchema, values: &FieldValues) -> ErrorMap {
    schema
        .fields()
        .iter()
        .filter_map(|field| {
            let value = values.get(&field.name).map(String::as_str).unwrap_or("");
            validate_field(field, value).map(|message| (field.name.clone(), message))
        })
        .collect()
}

/// First failing rule for a single field, if any.
pub fn validate_field(field: &FieldSchema, value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return field.required.then(|| REQUIRED.to_string());
    }

    match &field.kind {
        FieldKind::Text {
            max_length: Some(max_length),
        } if value.chars().count() > *max_length => Some(max_length_message(*max_length)),
        FieldKind::Text { .. } => None,
        FieldKind::Email => (!is_email(trimmed)).then(|| INVALID_EMAIL.to_string()),
        FieldKind::Url { lenient } => {
            let valid = is_absolute_url(trimmed)
                || (*lenient
                    && !trimmed.contains("://")
                    && is_absolute_url(&format!("https://{trimmed}")));
            (!valid).then(|| INVALID_URL.to_string())
        }
        FieldKind::Select { allowed_values } => {
            (!allowed_values.contains(trimmed)).then(|| INVALID_SELECTION.to_string())
        }
        FieldKind::Multiline => None,
    }
}

const LOCAL_PART_SYMBOLS: &str = "!#$%&'*+/=?^_`{|}~.-";

pub(crate) fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };

    let local_ok = !local.is_empty()
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_alphanumeric() || LOCAL_PART_SYMBOLS.contains(c));
    if !local_ok {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || !labels.iter().all(|label| is_host_label(label)) {
        return false;
    }

    labels
        .last()
        .is_some_and(|tld| tld.chars().count() >= 2 && !tld.chars().all(|c| c.is_ascii_digit()))
}

/// `scheme://host[:port][/path][?query][#fragment]` with a non-empty host.
pub(crate) fn is_absolute_url(value: &str) -> bool {
    if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    let Some((scheme, rest)) = value.split_once("://") else {
        return false;
    };
    if !is_scheme(scheme) {
        return false;
    }

    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    let host_port = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host_port)| host_port);

    if let Some(bracketed) = host_port.strip_prefix('[') {
        let Some((address, remainder)) = bracketed.split_once(']') else {
            return false;
        };
        let address_ok = !address.is_empty()
            && address
                .chars()
                .all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.');
        let port_ok = remainder.is_empty()
            || remainder.strip_prefix(':').is_some_and(is_port);
        return address_ok && port_ok;
    }

    let host = match host_port.rsplit_once(':') {
        Some((host, port)) if is_port(port) => host,
        Some(_) => return false,
        None => host_port,
    };

    !host.is_empty() && host.split('.').all(is_host_label)
}

fn is_scheme(scheme: &str) -> bool {
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

fn is_port(port: &str) -> bool {
    !port.is_empty() && port.len() <= 5 && port.chars().all(|c| c.is_ascii_digit())
}

fn is_host_label(label: &str) -> bool {
    !label.is_empty()
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_alphanumeric() || c == '-')
}
