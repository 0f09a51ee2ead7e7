//! Station registry interface, and ingestion of its flat
//! attribute records into typed [EquipmentEvent]s.
use crate::{
    domes::Domes,
    epoch::{parse_registry_datetime, ParsingError},
    event::EquipmentEvent,
    hardware::{Antenna, Device, DeviceKind, Monument, Radome, Receiver, UnknownDeviceKind},
    position::{Geodetic, GroundPosition},
    session::elementary_intervals,
};

use hifitime::Epoch;
use std::collections::BTreeMap;
use thiserror::Error;

#[cfg(feature = "log")]
use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Registry records that cannot be turned into [EquipmentEvent]s
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error(transparent)]
    UnknownDevice(#[from] UnknownDeviceKind),
    #[error("invalid date \"{value}\"")]
    InvalidDate {
        value: String,
        #[source]
        source: ParsingError,
    },
    #[error("invalid {attribute} value \"{value}\"")]
    InvalidAttribute { attribute: String, value: String },
    #[error("conflicting {attribute} values for {kind} at {epoch}: \"{first}\" and \"{second}\"")]
    AttributeConflict {
        kind: DeviceKind,
        attribute: String,
        epoch: Epoch,
        first: String,
        second: String,
    },
}

/// One attribute row, as stored by the station registry:
/// `attribute_name` of the device equals `attribute_value`
/// from `valid_from` (inclusive) until `valid_to` (exclusive).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RegistryRecord {
    /// "gnss_receiver", "antenna", "radome" or "monument"
    pub device_kind: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub serial_number: Option<String>,
    pub attribute_name: String,
    pub attribute_value: String,
    /// "yyyy-mm-ddThh:mm:ss", optionally terminated by 'Z'
    pub valid_from: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub valid_to: Option<String>,
}

/// Station operator, as declared in OBSERVER / AGENCY
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Operator {
    pub observer: String,
    pub agency: String,
}

/// Station level metadata
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StationMetadata {
    /// Station marker, usually the 4 character ID
    pub marker: String,
    /// DOMES number, when allocated
    #[cfg_attr(feature = "serde", serde(default))]
    pub domes: Option<Domes>,
    /// Reference coordinates
    #[cfg_attr(feature = "serde", serde(default))]
    pub position: Option<Geodetic>,
    /// Station operator
    #[cfg_attr(feature = "serde", serde(default))]
    pub operator: Option<Operator>,
}

impl StationMetadata {
    /// Builds new [StationMetadata] for given marker
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
            ..Default::default()
        }
    }
    /// Copies and sets DOMES number
    pub fn with_domes(&self, domes: Domes) -> Self {
        let mut s = self.clone();
        s.domes = Some(domes);
        s
    }
    /// Copies and sets reference coordinates
    pub fn with_position(&self, position: Geodetic) -> Self {
        let mut s = self.clone();
        s.position = Some(position);
        s
    }
    /// Copies and sets station operator
    pub fn with_operator(&self, observer: &str, agency: &str) -> Self {
        let mut s = self.clone();
        s.operator = Some(Operator {
            observer: observer.to_string(),
            agency: agency.to_string(),
        });
        s
    }
    /// MARKER NUMBER a header should declare:
    /// DOMES number if known, station marker otherwise.
    pub fn marker_number(&self) -> String {
        match self.domes {
            Some(domes) => domes.to_string(),
            None => self.marker.clone(),
        }
    }
    /// Reference coordinates, as ECEF WGS84
    pub fn ecef(&self) -> Option<GroundPosition> {
        self.position.map(GroundPosition::from)
    }
}

/// [Registry] is the authoritative source of station metadata.
/// Network transport and authentication are up to implementors.
pub trait Registry {
    type Error: std::error::Error + Send + Sync + 'static;
    /// Returns station level metadata
    fn station(&self, id: &str) -> Result<StationMetadata, Self::Error>;
    /// Returns every equipment record of this station, in any order
    fn equipment(&self, id: &str) -> Result<Vec<RegistryRecord>, Self::Error>;
}

/*
 * Registry record with parsed kind and validity
 */
struct Row<'a> {
    record: &'a RegistryRecord,
    valid_from: Epoch,
    valid_to: Option<Epoch>,
}

impl Row<'_> {
    fn contains(&self, start: Epoch, end: Option<Epoch>) -> bool {
        if start < self.valid_from {
            return false;
        }
        match (self.valid_to, end) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(valid_to), Some(end)) => end <= valid_to,
        }
    }
}

fn parse_date(value: &str) -> Result<Epoch, IngestError> {
    parse_registry_datetime(value).map_err(|source| IngestError::InvalidDate {
        value: value.to_string(),
        source,
    })
}

fn parse_float(attribute: &str, value: &str) -> Result<f64, IngestError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| IngestError::InvalidAttribute {
            attribute: attribute.to_string(),
            value: value.to_string(),
        })
}

/*
 * Builds one device from the attribute set valid over one interval
 */
fn build_device(
    kind: DeviceKind,
    serial_number: Option<&str>,
    attributes: &BTreeMap<&str, &str>,
) -> Result<Device, IngestError> {
    let sn = serial_number
        .or(attributes.get("serial_number").copied())
        .map(|sn| sn.trim().to_string())
        .filter(|sn| !sn.is_empty());

    let text = |name: &str| attributes.get(name).map(|v| v.trim().to_string());
    let float = |name: &str| -> Result<Option<f64>, IngestError> {
        attributes
            .get(name)
            .map(|v| parse_float(name, v))
            .transpose()
    };

    let device = match kind {
        DeviceKind::Receiver => Device::Receiver(Receiver {
            model: text("model").unwrap_or_default(),
            sn,
            firmware: text("firmware_version"),
            software: text("software_version"),
        }),
        DeviceKind::Antenna => Device::Antenna(Antenna {
            model: text("model").unwrap_or_default(),
            sn,
            height: float("antenna_height")?,
            eastern: float("antenna_offset_east")?,
            northern: float("antenna_offset_north")?,
            reference_point: text("antenna_reference_point"),
        }),
        DeviceKind::Radome => Device::Radome(Radome {
            model: text("model").unwrap_or_default(),
            sn,
        }),
        DeviceKind::Monument => Device::Monument(Monument {
            sn,
            height: match float("monument_height")? {
                Some(height) => Some(height),
                None => float("antenna_height")?,
            },
            eastern: float("antenna_offset_east")?,
            northern: float("antenna_offset_north")?,
        }),
    };
    Ok(device)
}

/// Converts flat [RegistryRecord]s of one station into [EquipmentEvent]s.
/// Records are grouped per device (kind and serial number). The life of each
/// device is split at every attribute boundary, producing one event per
/// interval where its attribute set is constant.
/// Empty and reversed records are dropped.
pub fn ingest(records: &[RegistryRecord]) -> Result<Vec<EquipmentEvent>, IngestError> {
    let mut devices = BTreeMap::<(DeviceKind, Option<&str>), Vec<Row>>::new();

    for record in records {
        let kind = record.device_kind.parse::<DeviceKind>()?;
        let valid_from = parse_date(&record.valid_from)?;
        let valid_to = match &record.valid_to {
            Some(s) if !s.trim().is_empty() => Some(parse_date(s)?),
            _ => None,
        };

        if let Some(valid_to) = valid_to {
            if valid_to <= valid_from {
                #[cfg(feature = "log")]
                warn!(
                    "dropping zero duration {} record \"{}\" ({} - {})",
                    kind, record.attribute_name, record.valid_from, valid_to
                );
                continue;
            }
        }

        let serial_number = record
            .serial_number
            .as_deref()
            .map(str::trim)
            .filter(|sn| !sn.is_empty());

        devices.entry((kind, serial_number)).or_default().push(Row {
            record,
            valid_from,
            valid_to,
        });
    }

    let mut events = Vec::<EquipmentEvent>::new();

    for ((kind, serial_number), rows) in devices.iter() {
        let mut device_events = Vec::<EquipmentEvent>::new();

        for (start, end) in elementary_intervals(rows.iter().map(|r| (r.valid_from, r.valid_to))) {
            let mut attributes = BTreeMap::<&str, &str>::new();

            for row in rows.iter().filter(|r| r.contains(start, end)) {
                let name = row.record.attribute_name.trim();
                let value = row.record.attribute_value.as_str();
                if let Some(prev) = attributes.insert(name, value) {
                    if prev.trim() != value.trim() {
                        return Err(IngestError::AttributeConflict {
                            kind: *kind,
                            attribute: name.to_string(),
                            epoch: start,
                            first: prev.to_string(),
                            second: value.to_string(),
                        });
                    }
                }
            }

            if attributes.is_empty() {
                continue;
            }

            #[cfg(feature = "log")]
            for name in attributes.keys() {
                if !is_known_attribute(*kind, name) {
                    debug!("{}: ignoring attribute \"{}\"", kind, name);
                }
            }

            let device = build_device(*kind, *serial_number, &attributes)?;

            if let Some(last) = device_events.last_mut() {
                if last.valid_to == Some(start) && last.device == device {
                    last.valid_to = end;
                    continue;
                }
            }

            device_events.push(EquipmentEvent {
                device,
                valid_from: start,
                valid_to: end,
            });
        }

        events.extend(device_events);
    }

    #[cfg(feature = "log")]
    debug!("{} registry records -> {} events", records.len(), events.len());

    Ok(events)
}

#[cfg(feature = "log")]
fn is_known_attribute(kind: DeviceKind, name: &str) -> bool {
    match kind {
        DeviceKind::Receiver => matches!(
            name,
            "model" | "serial_number" | "firmware_version" | "software_version"
        ),
        DeviceKind::Antenna => matches!(
            name,
            "model"
                | "serial_number"
                | "antenna_height"
                | "antenna_offset_north"
                | "antenna_offset_east"
                | "antenna_reference_point"
        ),
        DeviceKind::Radome => matches!(name, "model" | "serial_number"),
        DeviceKind::Monument => matches!(
            name,
            "serial_number"
                | "monument_height"
                | "antenna_height"
                | "antenna_offset_north"
                | "antenna_offset_east"
        ),
    }
}
