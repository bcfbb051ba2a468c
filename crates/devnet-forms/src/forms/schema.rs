use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

/// Constraint set attached to a field; each variant has exactly one validator branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    Email,
    Url {
        /// Accept values without a scheme prefix (profile handles such as `linkedin.com/in/jane`).
        #[serde(default)]
        lenient: bool,
    },
    Select {
        allowed_values: BTreeSet<String>,
    },
    Multiline,
}

impl FieldKind {
    pub fn text() -> Self {
        Self::Text { max_length: None }
    }

    pub fn bounded_text(max_length: usize) -> Self {
        Self::Text {
            max_length: Some(max_length),
        }
    }

    pub fn url() -> Self {
        Self::Url { lenient: false }
    }

    pub fn lenient_url() -> Self {
        Self::Url { lenient: true }
    }

    pub fn select<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Select {
            allowed_values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "text",
            FieldKind::Email => "email",
            FieldKind::Url { .. } => "url",
            FieldKind::Select { .. } => "select",
            FieldKind::Multiline => "multiline",
        }
    }
}

/// Declarative description of a single input slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldSchema {
    pub fn new(name: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            required: false,
            kind,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Ordered, validated set of fields describing one form type.
///
/// Construction is the only place schema defects are reported; a `FormSchema` value always
/// satisfies the uniqueness and per-kind invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormSchema {
    id: String,
    title: String,
    fields: Vec<FieldSchema>,
}

impl FormSchema {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        fields: Vec<FieldSchema>,
    ) -> Result<Self, SchemaError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(SchemaError::MissingFormId);
        }

        let mut seen = HashSet::new();
        for field in &fields {
            if field.name.trim().is_empty() {
                return Err(SchemaError::EmptyFieldName { form: id });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    form: id,
                    field: field.name.clone(),
                });
            }
            match &field.kind {
                FieldKind::Text {
                    max_length: Some(0),
                } => {
                    return Err(SchemaError::ZeroMaxLength {
                        form: id,
                        field: field.name.clone(),
                    });
                }
                FieldKind::Select { allowed_values } if allowed_values.is_empty() => {
                    return Err(SchemaError::EmptySelection {
                        form: id,
                        field: field.name.clone(),
                    });
                }
                _ => {}
            }
        }

        Ok(Self {
            id,
            title: title.into(),
            fields,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fields(&self) -> &[FieldSchema] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|field| field.name.as_str())
    }
}

#[derive(Deserialize)]
struct RawFormSchema {
    id: String,
    #[serde(default)]
    title: String,
    fields: Vec<FieldSchema>,
}

impl<'de> Deserialize<'de> for FormSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = RawFormSchema::deserialize(deserializer)?;
        FormSchema::new(raw.id, raw.title, raw.fields).map_err(serde::de::Error::custom)
    }
}

/// Configuration defects detected while building or loading a schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("form schema is missing an id")]
    MissingFormId,
    #[error("form `{form}` declares a field without a name")]
    EmptyFieldName { form: String },
    #[error("form `{form}` declares field `{field}` more than once")]
    DuplicateField { form: String, field: String },
    #[error("form `{form}` field `{field}` has a max length of zero")]
    ZeroMaxLength { form: String, field: String },
    #[error("form `{form}` select field `{field}` has no allowed values")]
    EmptySelection { form: String, field: String },
    #[error("form catalog declares `{0}` more than once")]
    DuplicateForm(String),
    #[error("invalid form schema: {0}")]
    Parse(String),
}
