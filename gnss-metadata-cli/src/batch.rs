//! Batch processing: every file is processed, whatever happened to the previous ones
use std::path::{Path, PathBuf};

use gnss_metadata::{
    correct_file,
    prelude::{Config, DiscrepancyReport, Registry},
    validate_file,
};

use crate::Error;

/// Process exit codes, ordered by severity
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    /// Header matches the registry
    Valid = 0,
    /// Discrepancies found
    Discrepancies = 1,
    /// Fatal error
    Fatal = 2,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Mode {
    Validate,
    Correct { backup: bool },
}

/// Result of one file
#[derive(Debug)]
pub struct Checked {
    pub report: DiscrepancyReport,
    /// Corrected file, in correction mode
    pub corrected: Option<PathBuf>,
}

impl Checked {
    /// Discrepancies left in the file once processed
    pub fn remaining(&self) -> usize {
        match self.corrected {
            Some(_) => self
                .report
                .discrepancies()
                .filter(|entry| !entry.correctable)
                .count(),
            None => self.report.discrepancies().count(),
        }
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub path: PathBuf,
    pub result: Result<Checked, Error>,
}

impl Outcome {
    pub fn status(&self) -> Status {
        match &self.result {
            Ok(checked) if checked.remaining() > 0 => Status::Discrepancies,
            Ok(_) => Status::Valid,
            Err(_) => Status::Fatal,
        }
    }
}

/// Worst status of a batch
pub fn status(outcomes: &[Outcome]) -> Status {
    outcomes
        .iter()
        .map(|outcome| outcome.status())
        .max()
        .unwrap_or(Status::Valid)
}

fn process<R: Registry>(
    registry: &R,
    station: &str,
    path: &Path,
    cfg: &Config,
    mode: Mode,
) -> Result<Checked, Error> {
    match mode {
        Mode::Validate => {
            let report = validate_file(registry, station, path, cfg)?;
            Ok(Checked {
                report,
                corrected: None,
            })
        },
        Mode::Correct { backup } => {
            let (report, corrected) = correct_file(registry, station, path, cfg, backup)?;
            for entry in report.corrections() {
                info!(
                    "{}: {} corrected to \"{}\"",
                    path.display(),
                    entry.field,
                    entry
                        .authoritative
                        .as_ref()
                        .map(|v| v.to_string())
                        .unwrap_or_default(),
                );
            }
            Ok(Checked {
                report,
                corrected: Some(corrected),
            })
        },
    }
}

/// Processes all files, in order
pub fn run<R: Registry>(
    registry: &R,
    station: &str,
    files: &[PathBuf],
    cfg: &Config,
    mode: Mode,
) -> Vec<Outcome> {
    files
        .iter()
        .map(|path| {
            let result = process(registry, station, path, cfg, mode);
            if let Err(e) = &result {
                error!("{}: {}", path.display(), e);
            }
            Outcome {
                path: path.clone(),
                result,
            }
        })
        .collect()
}
