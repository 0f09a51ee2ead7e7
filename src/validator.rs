//! Cross checks declared header fields against the station timeline
use crate::{
    cfg::Config,
    header::{FieldValue, HeaderField, HeaderRecord},
    registry::StationMetadata,
    session::{Equipment, Session},
};

use hifitime::Epoch;
use itertools::Itertools;

#[cfg(feature = "log")]
use log::debug;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Outcome of one field comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Severity {
    /// Declared value matches the authority
    Ok,
    /// Declared value differs from the authority
    Mismatch,
    /// Authority changed during the observation window
    Ambiguous,
    /// No authority for this field over the observation window
    NoAuthority,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Mismatch => write!(f, "mismatch"),
            Self::Ambiguous => write!(f, "ambiguous"),
            Self::NoAuthority => write!(f, "no authority"),
        }
    }
}

/// One field comparison
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Discrepancy {
    pub field: HeaderField,
    /// Value declared in the header
    pub declared: Option<FieldValue>,
    /// Value the header should declare
    pub authoritative: Option<FieldValue>,
    pub severity: Severity,
    /// True if the editor may rewrite this field
    pub correctable: bool,
}

impl Discrepancy {
    /// Builds a correctable [Severity::Mismatch], as the editor expects it
    pub fn mismatch(field: HeaderField, declared: Option<FieldValue>, authoritative: FieldValue) -> Self {
        Self {
            field,
            declared,
            authoritative: Some(authoritative),
            severity: Severity::Mismatch,
            correctable: field.is_correctable(),
        }
    }
}

/// Result of one validation
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DiscrepancyReport {
    pub entries: Vec<Discrepancy>,
}

impl DiscrepancyReport {
    /// Returns the entry of given field, if it was compared
    pub fn get(&self, field: HeaderField) -> Option<&Discrepancy> {
        self.entries.iter().find(|e| e.field == field)
    }
    /// Returns every entry that is not [Severity::Ok]
    pub fn discrepancies(&self) -> impl Iterator<Item = &Discrepancy> {
        self.entries.iter().filter(|e| e.severity != Severity::Ok)
    }
    /// Returns the entries the editor may apply
    pub fn corrections(&self) -> impl Iterator<Item = &Discrepancy> {
        self.entries
            .iter()
            .filter(|e| e.correctable && e.severity == Severity::Mismatch)
    }
    /// True if at least one entry is not [Severity::Ok]
    pub fn has_discrepancies(&self) -> bool {
        self.discrepancies().next().is_some()
    }
    /// True if the editor has nothing to apply
    pub fn is_clean(&self) -> bool {
        self.corrections().next().is_none()
    }
}

/*
 * Authoritative value of a device field for one equipment set
 */
fn device_authority(field: HeaderField, equipment: &Equipment) -> Option<FieldValue> {
    let text = |s: Option<&str>| -> Option<FieldValue> {
        s.map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| FieldValue::Text(s.to_string()))
    };
    match field {
        HeaderField::ReceiverSerial => text(equipment.receiver.as_ref()?.sn.as_deref()),
        HeaderField::ReceiverType => text(Some(equipment.receiver.as_ref()?.model.as_str())),
        HeaderField::ReceiverVersion => text(equipment.receiver.as_ref()?.version()),
        HeaderField::AntennaSerial => text(equipment.antenna.as_ref()?.sn.as_deref()),
        HeaderField::AntennaType => text(equipment.antenna_type().as_deref()),
        HeaderField::AntennaDeltaH => equipment.antenna_delta_h().map(FieldValue::Number),
        HeaderField::AntennaDeltaE => equipment.antenna_delta_e().map(FieldValue::Number),
        HeaderField::AntennaDeltaN => equipment.antenna_delta_n().map(FieldValue::Number),
        _ => None,
    }
}

/*
 * True if given sessions (chronological order) cover [start, end) without hole
 */
fn covers(sessions: &[&Session], start: Epoch, end: Epoch) -> bool {
    let (Some(first), Some(last)) = (sessions.first(), sessions.last()) else {
        return false;
    };
    let contiguous = sessions
        .iter()
        .tuple_windows()
        .all(|(prev, next)| prev.end == Some(next.start));
    first.start <= start && contiguous && last.end.map(|e| e >= end).unwrap_or(true)
}

/// [Validator] compares a [HeaderRecord] against the station timeline,
/// and optionally against station level [StationMetadata].
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: Config,
    station: Option<StationMetadata>,
}

impl Validator {
    /// Builds a [Validator] with given tolerances
    pub fn new(config: Config) -> Self {
        Self {
            config,
            station: None,
        }
    }
    /// Copies and enables station level checks
    pub fn with_station(&self, station: StationMetadata) -> Self {
        let mut s = self.clone();
        s.station = Some(station);
        s
    }
    /*
     * Compares two values of the same field
     */
    fn matches(&self, declared: &FieldValue, authoritative: &FieldValue) -> bool {
        match (declared, authoritative) {
            (FieldValue::Text(d), FieldValue::Text(a)) => d.trim() == a.trim(),
            (FieldValue::Number(d), FieldValue::Number(a)) => {
                (d - a).abs() <= self.config.offset_tolerance
            },
            (FieldValue::Position(d), FieldValue::Position(a)) => {
                d.distance(a) <= self.config.position_tolerance
            },
            _ => false,
        }
    }
    fn compare(
        &self,
        field: HeaderField,
        declared: FieldValue,
        authoritative: Option<FieldValue>,
    ) -> Discrepancy {
        let (severity, correctable) = match &authoritative {
            None => (Severity::NoAuthority, false),
            Some(value) if self.matches(&declared, value) => (Severity::Ok, false),
            Some(_) => (Severity::Mismatch, field.is_correctable()),
        };
        #[cfg(feature = "log")]
        debug!("{}: \"{}\" {}", field, declared, severity);
        Discrepancy {
            field,
            declared: Some(declared),
            authoritative,
            severity,
            correctable,
        }
    }
    /*
     * Device fields, against all sessions overlapping the observation window
     */
    fn validate_devices(
        &self,
        header: &HeaderRecord,
        sessions: &[&Session],
        (start, end): (Epoch, Epoch),
    ) -> Vec<Discrepancy> {
        let covered = covers(sessions, start, end);
        let mut entries = Vec::new();
        for field in HeaderField::DEVICE_FIELDS {
            let declared = header.value(field);

            if sessions.is_empty() {
                entries.push(Discrepancy {
                    field,
                    declared,
                    authoritative: None,
                    severity: Severity::NoAuthority,
                    correctable: false,
                });
                continue;
            }

            let Some(declared) = declared else {
                continue;
            };

            let mut candidates = Vec::<Option<FieldValue>>::new();
            for session in sessions {
                let value = device_authority(field, &session.equipment);
                if !candidates.contains(&value) {
                    candidates.push(value);
                }
            }
            // part of the window is not covered: no device there
            if !covered && !candidates.contains(&None) {
                candidates.push(None);
            }

            if candidates.len() > 1 {
                #[cfg(feature = "log")]
                debug!("{}: {} authoritative values", field, candidates.len());
                entries.push(Discrepancy {
                    field,
                    declared: Some(declared),
                    authoritative: None,
                    severity: Severity::Ambiguous,
                    correctable: false,
                });
                continue;
            }

            let authoritative = candidates.pop().flatten();
            entries.push(self.compare(field, declared, authoritative));
        }
        entries
    }
    /*
     * Station fields, against the station metadata
     */
    fn validate_station(&self, header: &HeaderRecord, station: &StationMetadata) -> Vec<Discrepancy> {
        let operator = station.operator.as_ref();
        let authority = |field: HeaderField| -> Option<FieldValue> {
            let value = match field {
                HeaderField::MarkerName => Some(FieldValue::Text(station.marker.clone())),
                HeaderField::MarkerNumber => Some(FieldValue::Text(station.marker_number())),
                HeaderField::Observer => operator.map(|op| FieldValue::Text(op.observer.clone())),
                HeaderField::Agency => operator.map(|op| FieldValue::Text(op.agency.clone())),
                HeaderField::ApproxPosition => station.ecef().map(FieldValue::Position),
                _ => None,
            };
            value.filter(|value| !value.is_blank())
        };

        [
            HeaderField::MarkerName,
            HeaderField::MarkerNumber,
            HeaderField::Observer,
            HeaderField::Agency,
            HeaderField::ApproxPosition,
        ]
        .into_iter()
        .filter_map(|field| {
            let declared = header.value(field)?;
            Some(self.compare(field, declared, authority(field)))
        })
        .collect()
    }
    /// Validates a [HeaderRecord] against the station [Session]s.
    /// Only sessions overlapping the observation window are considered.
    pub fn validate(&self, header: &HeaderRecord, sessions: &[Session]) -> DiscrepancyReport {
        let (start, end) = header.observation_window();
        let overlapping = sessions
            .iter()
            .filter(|s| s.overlaps(start, end))
            .collect::<Vec<_>>();

        #[cfg(feature = "log")]
        debug!(
            "\"{}\" [{}, {}): {} overlapping sessions",
            header.marker_name,
            start,
            end,
            overlapping.len()
        );

        let mut entries = Vec::new();
        if let Some(station) = &self.station {
            entries.extend(self.validate_station(header, station));
        }
        entries.extend(self.validate_devices(header, &overlapping, (start, end)));
        entries.sort_by_key(|e| e.field);
        DiscrepancyReport { entries }
    }
}

/// Validates a [HeaderRecord] against the station [Session]s,
/// with default tolerances and no station level checks.
pub fn validate(header: &HeaderRecord, sessions: &[Session]) -> DiscrepancyReport {
    Validator::default().validate(header, sessions)
}
