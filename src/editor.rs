//! Header correction: rewrites mismatched fields in place,
//! preserving every other byte of the file.
use crate::{
    cfg::Config,
    header::{records, ColumnFormat, FieldValue, FormatError, HeaderField, END_OF_HEADER},
    reader::{is_gzip, read_to_string, write_synced},
    validator::{Discrepancy, DiscrepancyReport},
};

use itertools::Itertools;
use std::{
    fs::{File, OpenOptions},
    ops::Range,
    path::{Path, PathBuf},
};
use thiserror::Error;

#[cfg(feature = "log")]
use log::{debug, error};

#[derive(Error, Debug)]
pub enum EditError {
    #[error("conflicting corrections of \"{label}\": {first} and {second}")]
    Conflict {
        label: &'static str,
        first: HeaderField,
        second: HeaderField,
    },
    #[error("{field}: \"{value}\" does not fit in {width} columns")]
    Overflow {
        field: HeaderField,
        value: String,
        width: usize,
    },
    #[error("{field}: \"{value}\" does not match the column format")]
    InvalidValue { field: HeaderField, value: String },
    #[error("{field}: no authoritative value to write")]
    MissingValue { field: HeaderField },
    #[error("{field}: missing \"{label}\" record")]
    MissingRecord {
        field: HeaderField,
        label: &'static str,
    },
    #[error("header format error: {0}")]
    Format(#[from] FormatError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/*
 * Formats a value exactly as wide as the field
 */
fn render(field: HeaderField, value: &FieldValue) -> Result<String, EditError> {
    let layout = field.layout();
    let width = layout.width();
    let rendered = match (layout.format, value) {
        (ColumnFormat::Text, FieldValue::Text(s)) => {
            format!("{:<width$}", s.trim(), width = width)
        },
        (ColumnFormat::Float { precision }, FieldValue::Number(v)) => {
            format!("{:>width$.precision$}", v, width = width, precision = precision)
        },
        (ColumnFormat::Vector3 { width: w, precision }, FieldValue::Position(pos)) => {
            let (x, y, z) = pos.to_ecef_wgs84();
            format!(
                "{:>w$.p$}{:>w$.p$}{:>w$.p$}",
                x,
                y,
                z,
                w = w,
                p = precision
            )
        },
        _ => {
            return Err(EditError::InvalidValue {
                field,
                value: value.to_string(),
            });
        },
    };
    if rendered.chars().count() > width {
        return Err(EditError::Overflow {
            field,
            value: value.to_string(),
            width,
        });
    }
    Ok(rendered)
}

/// Applies the correctable entries of a [DiscrepancyReport] to raw file content.
/// Only the columns of each corrected field change, every other byte
/// (line terminators and file body included) is preserved.
/// Nothing is applied when one correction fails.
pub fn apply_corrections(raw: &str, report: &DiscrepancyReport) -> Result<String, EditError> {
    let corrections = report.corrections().collect::<Vec<&Discrepancy>>();
    if corrections.is_empty() {
        return Ok(raw.to_string());
    }

    for (a, b) in corrections.iter().tuple_combinations() {
        let (layout_a, layout_b) = (a.field.layout(), b.field.layout());
        if layout_a.overlaps(&layout_b) {
            return Err(EditError::Conflict {
                label: layout_a.label,
                first: a.field,
                second: b.field,
            });
        }
    }

    let records = records(raw);
    if records.last().map(|r| r.label) != Some(END_OF_HEADER) {
        return Err(FormatError::MissingRecord(END_OF_HEADER).into());
    }

    let mut splices = Vec::<(Range<usize>, String)>::with_capacity(corrections.len());

    for correction in corrections {
        let field = correction.field;
        let layout = field.layout();
        let value = correction
            .authoritative
            .as_ref()
            .ok_or(EditError::MissingValue { field })?;

        let record = records
            .iter()
            .find(|r| r.label == layout.label)
            .ok_or(EditError::MissingRecord {
                field,
                label: layout.label,
            })?;

        let rendered = render(field, value)?;
        let span = record.span(&layout.columns);

        #[cfg(feature = "log")]
        debug!(
            "line {}: {} \"{}\" -> \"{}\"",
            record.line,
            field,
            &record.content[span.clone()],
            rendered
        );

        splices.push((record.offset + span.start..record.offset + span.end, rendered));
    }

    splices.sort_by_key(|(range, _)| range.start);

    let mut corrected = String::with_capacity(raw.len());
    let mut cursor = 0;
    for (range, rendered) in splices {
        corrected.push_str(&raw[cursor..range.start]);
        corrected.push_str(&rendered);
        cursor = range.end;
    }
    corrected.push_str(&raw[cursor..]);
    Ok(corrected)
}

/*
 * Temporary sibling of the file being corrected,
 * removed when dropped unless persisted.
 */
struct TempSibling {
    path: PathBuf,
    persisted: bool,
}

impl TempSibling {
    fn create(target: &Path) -> std::io::Result<(Self, File)> {
        let name = target
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let path = target.with_file_name(format!(".{}.{}.tmp", name, std::process::id()));
        let file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        Ok((
            Self {
                path,
                persisted: false,
            },
            file,
        ))
    }
    fn persist(mut self, target: &Path) -> std::io::Result<()> {
        std::fs::rename(&self.path, target)?;
        self.persisted = true;
        Ok(())
    }
}

impl Drop for TempSibling {
    fn drop(&mut self) {
        if !self.persisted {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// [Editor] corrects files on disk
#[derive(Debug, Clone)]
pub struct Editor {
    backup: bool,
    suffix: String,
}

impl Default for Editor {
    fn default() -> Self {
        Self {
            backup: true,
            suffix: Config::default().backup_suffix,
        }
    }
}

impl Editor {
    /// Builds an [Editor] that backs files up with the configured suffix
    pub fn new(config: &Config) -> Self {
        Self {
            backup: true,
            suffix: config.backup_suffix.clone(),
        }
    }
    /// Copies and sets whether a backup should be created
    pub fn with_backup(&self, backup: bool) -> Self {
        let mut s = self.clone();
        s.backup = backup;
        s
    }
    /// Backup path of given file
    pub fn backup_path(&self, path: &Path) -> PathBuf {
        let mut backup = path.as_os_str().to_os_string();
        backup.push(&self.suffix);
        PathBuf::from(backup)
    }
    /// First backup path not in use yet: [Self::backup_path],
    /// then the same path suffixed by ".1", ".2"..
    /// Previous backups are never overwritten.
    pub fn available_backup_path(&self, path: &Path) -> PathBuf {
        let backup = self.backup_path(path);
        let mut candidate = backup.clone();
        let mut index = 0;
        while candidate.exists() {
            index += 1;
            let mut name = backup.as_os_str().to_os_string();
            name.push(format!(".{}", index));
            candidate = PathBuf::from(name);
        }
        candidate
    }
    /// Corrects given file in place, and returns its path.
    /// The backup copy is complete and synced before the original is touched.
    /// The corrected content is written to a temporary sibling first,
    /// then renamed over the original: on failure, the original is left as is.
    /// Gzip compressed files are rewritten gzip compressed.
    /// Nothing is written when the report has no correction.
    pub fn correct(&self, path: &Path, report: &DiscrepancyReport) -> Result<PathBuf, EditError> {
        if report.is_clean() {
            return Ok(path.to_path_buf());
        }

        let raw = read_to_string(path)?;
        let corrected = apply_corrections(&raw, report)?;

        if self.backup {
            let backup = self.available_backup_path(path);
            std::fs::copy(path, &backup)?;
            File::open(&backup)?.sync_all()?;
            #[cfg(feature = "log")]
            debug!("{}: backed up", backup.display());
        }

        let (tmp, file) = TempSibling::create(path)?;

        if let Err(e) = write_synced(file, &corrected, is_gzip(path)) {
            #[cfg(feature = "log")]
            error!("{}: failed to write correction: {}", path.display(), e);
            return Err(e.into());
        }

        tmp.persist(path)?;

        #[cfg(feature = "log")]
        debug!("{}: corrected", path.display());

        Ok(path.to_path_buf())
    }
}
