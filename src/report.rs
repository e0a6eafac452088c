//! Batch error accumulator
//!
//! Expectation mismatches, lookup failures, and bridge errors never abort
//! a batch; they are collected here and inspected once every project has
//! been processed. The report decides the process exit code and is
//! mirrored to an error log file whose mere existence tells surrounding
//! automation that action is needed.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::error;

/// One recorded batch error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedError {
    /// Project being processed when the error occurred, if any.
    pub project: Option<String>,
    /// `op` of the step being executed, if any.
    pub op: Option<String>,
    pub message: String,
}

impl std::fmt::Display for RecordedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.project, &self.op) {
            (Some(project), Some(op)) => write!(f, "[{} / {}] {}", project, op, self.message),
            (Some(project), None) => write!(f, "[{}] {}", project, self.message),
            _ => write!(f, "{}", self.message),
        }
    }
}

/// Accumulated outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    errors: Vec<RecordedError>,
    projects_processed: usize,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error and emit it to the error log stream. Recording is
    /// the only failure signal inside a running batch.
    pub fn record(
        &mut self,
        project: Option<&str>,
        op: Option<&str>,
        message: impl Into<String>,
    ) {
        let entry = RecordedError {
            project: project.map(str::to_string),
            op: op.map(str::to_string),
            message: message.into(),
        };
        error!("{}", entry);
        self.errors.push(entry);
    }

    /// Count a processed project (generated or attempted).
    pub fn project_processed(&mut self) {
        self.projects_processed += 1;
    }

    pub fn projects_processed(&self) -> usize {
        self.projects_processed
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[RecordedError] {
        &self.errors
    }

    /// Exit code for surrounding automation: 0 iff nothing was recorded.
    pub fn exit_code(&self) -> i32 {
        if self.is_clean() { 0 } else { 1 }
    }

    /// Write the error log file. The file is only created when errors
    /// exist, so its presence is the failure signal.
    pub fn write_log(&self, path: &Path) -> std::io::Result<()> {
        if self.is_clean() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::File::create(path)?;
        for entry in &self.errors {
            writeln!(
                file,
                "{} - ERROR - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                entry
            )?;
        }
        Ok(())
    }

    /// One-line summary for the end of the batch.
    pub fn summary(&self) -> String {
        if self.is_clean() {
            format!(
                "All {} project(s) processed with no errors.",
                self.projects_processed
            )
        } else {
            format!(
                "All {} project(s) processed. {} error(s) were found.",
                self.projects_processed,
                self.errors.len()
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_report() {
        let mut report = BatchReport::new();
        report.project_processed();
        assert!(report.is_clean());
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.summary(), "All 1 project(s) processed with no errors.");
    }

    #[test]
    fn test_recorded_error_formats_context() {
        let mut report = BatchReport::new();
        report.record(Some("p0"), Some("build"), "expected completed-1, got completed-0");
        assert_eq!(report.exit_code(), 1);
        assert_eq!(
            report.errors()[0].to_string(),
            "[p0 / build] expected completed-1, got completed-0"
        );
    }

    #[test]
    fn test_log_file_only_written_on_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/errors.log");

        let report = BatchReport::new();
        report.write_log(&path).unwrap();
        assert!(!path.exists());

        let mut report = BatchReport::new();
        report.record(None, None, "boom");
        report.write_log(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("ERROR - boom"));
    }
}
