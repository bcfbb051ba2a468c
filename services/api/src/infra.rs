use devnet_forms::config::{AppConfig, SinkKind};
use devnet_forms::error::AppError;
use devnet_forms::forms::{
    CsvSubmissionSink, FieldValues, FormCatalog, SinkError, SubmissionSink,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Submission record kept by the in-memory sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedSubmission {
    pub(crate) form: String,
    pub(crate) values: FieldValues,
}

#[derive(Default, Clone)]
pub(crate) struct InMemorySubmissionSink {
    records: Arc<Mutex<Vec<RecordedSubmission>>>,
}

impl SubmissionSink for InMemorySubmissionSink {
    fn record(&self, form: &str, values: &FieldValues) -> Result<(), SinkError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|_| SinkError::Unavailable("in-memory sink poisoned".to_string()))?;
        guard.push(RecordedSubmission {
            form: form.to_string(),
            values: values.clone(),
        });
        info!(form, total = guard.len(), "submission recorded in memory");
        Ok(())
    }
}

impl InMemorySubmissionSink {
    pub(crate) fn records(&self) -> Vec<RecordedSubmission> {
        self.records
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

/// Sink selected by `APP_SINK`.
pub(crate) enum ConfiguredSink {
    Memory(InMemorySubmissionSink),
    Csv(CsvSubmissionSink),
}

impl ConfiguredSink {
    pub(crate) fn from_config(config: &AppConfig) -> Self {
        match config.submissions.sink {
            SinkKind::Memory => Self::Memory(InMemorySubmissionSink::default()),
            SinkKind::Csv => Self::Csv(CsvSubmissionSink::new(&config.submissions.sink_dir)),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            ConfiguredSink::Memory(_) => "memory".to_string(),
            ConfiguredSink::Csv(sink) => format!("csv ({})", sink.dir().display()),
        }
    }
}

impl SubmissionSink for ConfiguredSink {
    fn record(&self, form: &str, values: &FieldValues) -> Result<(), SinkError> {
        match self {
            ConfiguredSink::Memory(sink) => sink.record(form, values),
            ConfiguredSink::Csv(sink) => sink.record(form, values),
        }
    }
}

/// Built-in schemas unless `APP_FORMS_CATALOG` points at a replacement file.
pub(crate) fn load_catalog(config: &AppConfig) -> Result<FormCatalog, AppError> {
    match &config.forms.catalog_path {
        Some(path) => {
            let catalog = FormCatalog::load(path)?;
            info!(path = %path.display(), forms = catalog.len(), "loaded form catalog");
            Ok(catalog)
        }
        None => Ok(FormCatalog::builtin()?),
    }
}

/// Parse a `name=value` pair from the command line.
pub(crate) fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing field name in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}
