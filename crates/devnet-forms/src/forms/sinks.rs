use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use tracing::{debug, info};

use super::submission::{SinkError, SubmissionSink};
use super::validator::FieldValues;

/// Appends each accepted submission to `<dir>/<form>.csv`.
///
/// The first row of a new file is a header of `submitted_at` followed by the field names;
/// field columns follow the sorted field-name order of the value map. When the field set of
/// a form changes between runs, rows go to the first `<form>-<n>.csv` whose header matches
/// instead of being appended under the old columns.
pub struct CsvSubmissionSink {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvSubmissionSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Primary output file for `form`.
    pub fn path_for(&self, form: &str) -> PathBuf {
        self.dir.join(format!("{form}.csv"))
    }

    fn rollover_path(&self, form: &str, generation: usize) -> PathBuf {
        if generation <= 1 {
            self.path_for(form)
        } else {
            self.dir.join(format!("{form}-{generation}.csv"))
        }
    }

    /// First file for `form` that is empty or already carries `header`.
    fn target_for(&self, form: &str, header: &[&str]) -> Result<PathBuf, SinkError> {
        for generation in 1..=MAX_GENERATIONS {
            let path = self.rollover_path(form, generation);
            match existing_header(&path)? {
                None => return Ok(path),
                Some(existing) if existing.iter().eq(header.iter().copied()) => return Ok(path),
                Some(existing) => {
                    debug!(
                        form,
                        path = %path.display(),
                        columns = existing.len(),
                        "csv header differs; trying next file"
                    );
                }
            }
        }
        Err(SinkError::Encode(format!(
            "no csv file for `{form}` matches its current fields after {MAX_GENERATIONS} attempts"
        )))
    }
}

const MAX_GENERATIONS: usize = 64;

/// Header row of `path`, or `None` when the file is missing or empty.
fn existing_header(path: &Path) -> Result<Option<csv::StringRecord>, SinkError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(file);
    reader
        .records()
        .next()
        .transpose()
        .map_err(|err| SinkError::Encode(err.to_string()))
}

impl SubmissionSink for CsvSubmissionSink {
    fn record(&self, form: &str, values: &FieldValues) -> Result<(), SinkError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| SinkError::Unavailable("csv writer lock poisoned".to_string()))?;

        fs::create_dir_all(&self.dir)?;
        let header: Vec<&str> = std::iter::once("submitted_at")
            .chain(values.keys().map(String::as_str))
            .collect();
        let path = self.target_for(form, &header)?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let needs_header = file.metadata()?.len() == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            writer
                .write_record(&header)
                .map_err(|err| SinkError::Encode(err.to_string()))?;
        }

        let submitted_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let row = std::iter::once(submitted_at.as_str()).chain(values.values().map(String::as_str));
        writer
            .write_record(row)
            .map_err(|err| SinkError::Encode(err.to_string()))?;
        writer.flush()?;

        info!(form, path = %path.display(), fields = values.len(), "submission recorded");
        Ok(())
    }
}
