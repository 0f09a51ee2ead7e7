#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::type_complexity)]

/*
 * gnss-metadata: GNSS station metadata toolkit.
 * Reconstructs station equipment sessions from registry records,
 * validates RINEX observation headers against them
 * and corrects mismatched header fields in place.
 */

pub mod cfg;
pub mod domes;
pub mod editor;
pub mod epoch;
pub mod event;
pub mod hardware;
pub mod header;
pub mod position;
pub mod reader;
pub mod registry;
pub mod session;
pub mod validator;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use thiserror::Error;

use cfg::Config;
use editor::{EditError, Editor};
use header::{parse_header, FormatError};
use registry::{ingest, IngestError, Registry};
use session::{IntegrityError, Timeline};
use validator::{DiscrepancyReport, Validator};

#[cfg(feature = "log")]
use log::debug;

/// Package to include all basic structures
pub mod prelude {
    // export
    pub use crate::{
        cfg::Config,
        domes::{Domes, TrackingPoint},
        editor::{apply_corrections, EditError, Editor},
        event::EquipmentEvent,
        hardware::{Antenna, Device, DeviceKind, Monument, Radome, Receiver},
        header::{parse_header, FieldValue, FormatError, HeaderField, HeaderRecord},
        position::{Geodetic, GroundPosition},
        registry::{ingest, IngestError, Operator, Registry, RegistryRecord, StationMetadata},
        session::{build_sessions, Equipment, EquipmentChange, IntegrityError, Session, Timeline},
        validator::{validate, Discrepancy, DiscrepancyReport, Severity, Validator},
        Error,
    };
    // pub re-export
    pub use hifitime::{Duration, Epoch, TimeScale};
}

/// Errors of the file level operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("registry error: {0}")]
    Registry(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

fn registry_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> Error {
    Error::Registry(Box::new(e))
}

/// Reconstructs the [Timeline] of a station, from its registry records
pub fn timeline<R: Registry>(registry: &R, station: &str) -> Result<Timeline, Error> {
    let records = registry.equipment(station).map_err(registry_error)?;
    let events = ingest(&records)?;
    let timeline = Timeline::new(&events)?;
    #[cfg(feature = "log")]
    debug!("{}: {} sessions", station, timeline.len());
    Ok(timeline)
}

/// Validates the header of a local RINEX observation file
/// against the registry content for this station.
pub fn validate_file<R: Registry>(
    registry: &R,
    station: &str,
    path: &Path,
    config: &Config,
) -> Result<DiscrepancyReport, Error> {
    let metadata = registry.station(station).map_err(registry_error)?;
    let timeline = timeline(registry, station)?;
    let raw = reader::read_header(path)?;
    let header = parse_header(&raw)?;
    let validator = Validator::new(config.clone()).with_station(metadata);
    Ok(validator.validate(&header, timeline.sessions()))
}

/// Validates then corrects a local RINEX observation file in place.
/// Returns the validation report and the corrected file path.
pub fn correct_file<R: Registry>(
    registry: &R,
    station: &str,
    path: &Path,
    config: &Config,
    backup: bool,
) -> Result<(DiscrepancyReport, PathBuf), Error> {
    let report = validate_file(registry, station, path, config)?;
    let editor = Editor::new(config).with_backup(backup);
    let corrected = editor.correct(path, &report)?;
    Ok((report, corrected))
}
