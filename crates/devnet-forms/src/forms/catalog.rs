use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use super::schema::{FieldKind, FieldSchema, FormSchema, SchemaError};

pub const BOOKING_FORM: &str = "booking";
pub const HIRING_REQUEST_FORM: &str = "hiring_request";

/// Channels offered in the booking form's "how did you find us" picker.
pub const DISCOVERY_CHANNELS: [&str; 5] = ["podcast", "linkedin", "github", "referral", "other"];

/// Interview booking form shown to developers who want to be featured.
pub fn booking_schema() -> Result<FormSchema, SchemaError> {
    FormSchema::new(
        BOOKING_FORM,
        "Book Your Interview",
        vec![
            FieldSchema::new("firstName", "First Name", FieldKind::bounded_text(15)).required(),
            FieldSchema::new("lastName", "Last Name", FieldKind::bounded_text(20)).required(),
            FieldSchema::new("email", "Email", FieldKind::Email).required(),
            FieldSchema::new("github", "GitHub URL", FieldKind::url()).required(),
            FieldSchema::new("linkedin", "LinkedIn URL", FieldKind::lenient_url()),
            FieldSchema::new("website", "Personal Website", FieldKind::url()),
            FieldSchema::new(
                "howFound",
                "How did you hear about us?",
                FieldKind::select(DISCOVERY_CHANNELS),
            ),
        ],
    )
}

/// Recruiter hiring request shared with the developer network.
pub fn hiring_request_schema() -> Result<FormSchema, SchemaError> {
    FormSchema::new(
        HIRING_REQUEST_FORM,
        "Hiring Request",
        vec![
            FieldSchema::new("company", "Company Name", FieldKind::text()).required(),
            FieldSchema::new("recruiterName", "Your Name", FieldKind::text()).required(),
            FieldSchema::new("email", "Contact Email", FieldKind::Email).required(),
            FieldSchema::new("position", "Position Title", FieldKind::text()).required(),
            FieldSchema::new("description", "Job Description", FieldKind::Multiline).required(),
            FieldSchema::new("requirements", "Requirements", FieldKind::Multiline).required(),
        ],
    )
}

/// Registry of the form types the service can mount.
#[derive(Debug, Clone, Default)]
pub struct FormCatalog {
    forms: BTreeMap<String, Arc<FormSchema>>,
}

impl FormCatalog {
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_schemas(vec![booking_schema()?, hiring_request_schema()?])
    }

    pub fn from_schemas(schemas: Vec<FormSchema>) -> Result<Self, SchemaError> {
        let mut forms = BTreeMap::new();
        for schema in schemas {
            let id = schema.id().to_string();
            if forms.insert(id.clone(), Arc::new(schema)).is_some() {
                return Err(SchemaError::DuplicateForm(id));
            }
        }
        Ok(Self { forms })
    }

    /// Parse a JSON array of form schemas.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let schemas: Vec<FormSchema> =
            serde_json::from_str(json).map_err(|err| SchemaError::Parse(err.to_string()))?;
        Self::from_schemas(schemas)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::from_json(&json)?)
    }

    pub fn get(&self, id: &str) -> Option<Arc<FormSchema>> {
        self.forms.get(id).cloned()
    }

    pub fn schemas(&self) -> impl Iterator<Item = &FormSchema> {
        self.forms.values().map(|schema| schema.as_ref())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.forms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("unable to read form catalog {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_holds_both_forms() {
        let catalog = FormCatalog::builtin().expect("built-in schemas are valid");
        assert_eq!(
            catalog.ids().collect::<Vec<_>>(),
            vec![BOOKING_FORM, HIRING_REQUEST_FORM]
        );

        let booking = catalog.get(BOOKING_FORM).expect("booking form");
        assert_eq!(
            booking.field_names().collect::<Vec<_>>(),
            vec![
                "firstName",
                "lastName",
                "email",
                "github",
                "linkedin",
                "website",
                "howFound"
            ]
        );

        let hiring = catalog.get(HIRING_REQUEST_FORM).expect("hiring form");
        assert!(hiring.fields().iter().all(|field| field.required));
    }

    #[test]
    fn rejects_duplicate_form_ids() {
        let booking = booking_schema().expect("valid");
        let result = FormCatalog::from_schemas(vec![booking.clone(), booking]);
        assert!(matches!(result, Err(SchemaError::DuplicateForm(id)) if id == BOOKING_FORM));
    }

    #[test]
    fn from_json_surfaces_schema_defects() {
        let json = r#"[{ "id": "newsletter", "fields": [ { "name": "email", "kind": "phone" } ] }]"#;
        assert!(matches!(
            FormCatalog::from_json(json),
            Err(SchemaError::Parse(_))
        ));
    }

    #[test]
    fn load_reports_missing_files() {
        let missing = Path::new("/nonexistent/devnet-forms/catalog.json");
        assert!(matches!(
            FormCatalog::load(missing),
            Err(CatalogError::Read { .. })
        ));
    }

    #[test]
    fn load_reads_catalog_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{ "id": "newsletter", "title": "Newsletter", "fields": [
                { "name": "email", "kind": "email", "required": true }
            ] }]"#,
        )
        .expect("write catalog");

        let catalog = FormCatalog::load(&path).expect("catalog loads");
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get("newsletter").map(|schema| schema.title().to_string()),
            Some("Newsletter".to_string())
        );
    }
}
