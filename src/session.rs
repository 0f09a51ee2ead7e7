//! Device sessions: the station timeline, as reconstructed from
//! unordered equipment events.
use crate::{
    event::EquipmentEvent,
    hardware::{Antenna, Device, DeviceKind, Monument, Radome, Receiver},
};

use hifitime::{Duration, Epoch};
use itertools::Itertools;
use std::collections::BTreeMap;
use thiserror::Error;

#[cfg(feature = "log")]
use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Equipment events that cannot describe a single station state
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntegrityError {
    #[error("overlapping {kind} events at {epoch}: {first} and {second}")]
    OverlappingEvents {
        kind: DeviceKind,
        epoch: Epoch,
        first: Box<EquipmentEvent>,
        second: Box<EquipmentEvent>,
    },
}

/// Full set of devices installed at one point in time,
/// at most one per [DeviceKind].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Equipment {
    pub receiver: Option<Receiver>,
    pub antenna: Option<Antenna>,
    pub radome: Option<Radome>,
    pub monument: Option<Monument>,
}

impl Equipment {
    /// Installs given device, replacing the device of the same kind
    pub fn insert(&mut self, device: &Device) {
        match device {
            Device::Receiver(r) => self.receiver = Some(r.clone()),
            Device::Antenna(a) => self.antenna = Some(a.clone()),
            Device::Radome(r) => self.radome = Some(r.clone()),
            Device::Monument(m) => self.monument = Some(m.clone()),
        }
    }
    /// Returns installed device of given kind
    pub fn device(&self, kind: DeviceKind) -> Option<Device> {
        match kind {
            DeviceKind::Receiver => self.receiver.clone().map(Device::Receiver),
            DeviceKind::Antenna => self.antenna.clone().map(Device::Antenna),
            DeviceKind::Radome => self.radome.clone().map(Device::Radome),
            DeviceKind::Monument => self.monument.clone().map(Device::Monument),
        }
    }
    /// True if a device of given kind is installed
    pub fn has(&self, kind: DeviceKind) -> bool {
        match kind {
            DeviceKind::Receiver => self.receiver.is_some(),
            DeviceKind::Antenna => self.antenna.is_some(),
            DeviceKind::Radome => self.radome.is_some(),
            DeviceKind::Monument => self.monument.is_some(),
        }
    }
    /// True if no device is installed
    pub fn is_empty(&self) -> bool {
        DeviceKind::ALL.iter().all(|kind| !self.has(*kind))
    }
    /// Antenna type as declared in RINEX: antenna model on 16 columns,
    /// followed by the radome code on 4 columns when a radome is installed.
    pub fn antenna_type(&self) -> Option<String> {
        let antenna = self.antenna.as_ref()?;
        match &self.radome {
            Some(radome) => Some(format!("{:<16.16}{:>4.4}", antenna.model, radome.model)),
            None => Some(antenna.model.clone()),
        }
    }
    /// Antenna height above the marker: antenna height + monument height.
    /// Unknown components count as zero, None without an antenna.
    pub fn antenna_delta_h(&self) -> Option<f64> {
        let antenna = self.antenna.as_ref()?;
        let monument = self.monument.as_ref().and_then(|m| m.height);
        Some(antenna.height.unwrap_or(0.0) + monument.unwrap_or(0.0))
    }
    /// Eastern antenna eccentricity: antenna + monument components
    pub fn antenna_delta_e(&self) -> Option<f64> {
        let antenna = self.antenna.as_ref()?;
        let monument = self.monument.as_ref().and_then(|m| m.eastern);
        Some(antenna.eastern.unwrap_or(0.0) + monument.unwrap_or(0.0))
    }
    /// Northern antenna eccentricity: antenna + monument components
    pub fn antenna_delta_n(&self) -> Option<f64> {
        let antenna = self.antenna.as_ref()?;
        let monument = self.monument.as_ref().and_then(|m| m.northern);
        Some(antenna.northern.unwrap_or(0.0) + monument.unwrap_or(0.0))
    }
}

/// [Session] is one interval of the station timeline, during which
/// the installed [Equipment] did not change.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Session {
    /// First instant (inclusive)
    pub start: Epoch,
    /// Last instant (exclusive), None while still active
    pub end: Option<Epoch>,
    /// Installed equipment
    pub equipment: Equipment,
}

impl Session {
    /// True if this session is not terminated
    pub fn is_current(&self) -> bool {
        self.end.is_none()
    }
    /// True if this session covers given instant
    pub fn contains(&self, t: Epoch) -> bool {
        t >= self.start && self.end.map(|end| t < end).unwrap_or(true)
    }
    /// True if this session shares at least one instant with [start, end)
    pub fn overlaps(&self, start: Epoch, end: Epoch) -> bool {
        self.start < end && self.end.map(|e| e > start).unwrap_or(true)
    }
    /// Session duration, None while still active
    pub fn duration(&self) -> Option<Duration> {
        self.end.map(|end| end - self.start)
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {})", self.start, end),
            None => write!(f, "[{}, ..)", self.start),
        }
    }
}

/*
 * Splits the union of given [start, end) intervals at every boundary.
 * Returned intervals are sorted, contiguous where the input is, and
 * each one lies either entirely inside or entirely outside of any input.
 * An unbounded interval is appended when one input is unbounded.
 */
pub(crate) fn elementary_intervals<I>(bounds: I) -> Vec<(Epoch, Option<Epoch>)>
where
    I: IntoIterator<Item = (Epoch, Option<Epoch>)>,
{
    let mut unbounded = false;
    let mut cuts = Vec::new();
    for (start, end) in bounds {
        cuts.push(start);
        match end {
            Some(end) => cuts.push(end),
            None => unbounded = true,
        }
    }

    let cuts = cuts.into_iter().sorted().dedup().collect::<Vec<_>>();

    let mut intervals = cuts
        .iter()
        .tuple_windows()
        .map(|(start, end)| (*start, Some(*end)))
        .collect::<Vec<_>>();

    if unbounded {
        if let Some(last) = cuts.last() {
            intervals.push((*last, None));
        }
    }
    intervals
}

/// Reconstructs the ordered, non overlapping list of [Session]s
/// from an unordered list of [EquipmentEvent]s of one station.
/// Empty and reversed events are dropped. Instants covered by no event
/// are gaps and produce no session. Contiguous intervals with identical
/// equipment are merged into a single session.
/// Two events of the same kind valid at the same instant are an [IntegrityError].
pub fn build_sessions(events: &[EquipmentEvent]) -> Result<Vec<Session>, IntegrityError> {
    let events = events
        .iter()
        .filter(|event| {
            if event.is_degenerate() {
                #[cfg(feature = "log")]
                warn!("dropping zero duration event: {}", event);
                false
            } else {
                true
            }
        })
        .collect::<Vec<_>>();

    let mut sessions = Vec::<Session>::new();

    for (start, end) in elementary_intervals(events.iter().map(|e| (e.valid_from, e.valid_to))) {
        let mut selected = BTreeMap::<DeviceKind, &EquipmentEvent>::new();

        for event in events.iter().copied().filter(|e| e.contains(start, end)) {
            if let Some(prev) = selected.insert(event.kind(), event) {
                return Err(IntegrityError::OverlappingEvents {
                    kind: event.kind(),
                    epoch: start,
                    first: Box::new(prev.clone()),
                    second: Box::new(event.clone()),
                });
            }
        }

        if selected.is_empty() {
            #[cfg(feature = "log")]
            debug!("no equipment from {}", start);
            continue;
        }

        let mut equipment = Equipment::default();
        for event in selected.values() {
            equipment.insert(&event.device);
        }

        if let Some(last) = sessions.last_mut() {
            if last.end == Some(start) && last.equipment == equipment {
                last.end = end;
                continue;
            }
        }

        sessions.push(Session {
            start,
            end,
            equipment,
        });
    }

    #[cfg(feature = "log")]
    debug!("{} events -> {} sessions", events.len(), sessions.len());

    Ok(sessions)
}

/// Device swap between two consecutive sessions
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EquipmentChange {
    /// Instant the new state takes effect
    pub epoch: Epoch,
    pub kind: DeviceKind,
    /// Device installed until then
    pub before: Option<Device>,
    /// Device installed from then on
    pub after: Option<Device>,
}

/// Station [Timeline]: ordered, non overlapping [Session]s.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timeline {
    sessions: Vec<Session>,
}

impl Timeline {
    /// Builds a [Timeline] from unordered [EquipmentEvent]s,
    /// see [build_sessions].
    pub fn new(events: &[EquipmentEvent]) -> Result<Self, IntegrityError> {
        Ok(Self {
            sessions: build_sessions(events)?,
        })
    }
    /// Returns all sessions, in chronological order
    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
    pub fn len(&self) -> usize {
        self.sessions.len()
    }
    /// Returns the session active at given instant
    pub fn at(&self, t: Epoch) -> Option<&Session> {
        self.sessions.iter().find(|s| s.contains(t))
    }
    /// Returns all sessions sharing at least one instant with [start, end)
    pub fn overlapping(&self, start: Epoch, end: Epoch) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| s.overlaps(start, end))
            .collect()
    }
    /// Returns the session still active, if any
    pub fn current(&self) -> Option<&Session> {
        self.sessions.last().filter(|s| s.is_current())
    }
    /// Returns the [start, end) holes between consecutive sessions
    pub fn gaps(&self) -> Vec<(Epoch, Epoch)> {
        self.sessions
            .iter()
            .tuple_windows()
            .filter_map(|(prev, next)| match prev.end {
                Some(end) if end < next.start => Some((end, next.start)),
                _ => None,
            })
            .collect()
    }
    /// Returns every device swap, in chronological order
    pub fn changes(&self) -> Vec<EquipmentChange> {
        let mut changes = Vec::new();
        for (prev, next) in self.sessions.iter().tuple_windows() {
            for kind in DeviceKind::ALL {
                let before = prev.equipment.device(kind);
                let after = next.equipment.device(kind);
                if before != after {
                    changes.push(EquipmentChange {
                        epoch: next.start,
                        kind,
                        before,
                        after,
                    });
                }
            }
        }
        changes
    }
    /// Returns sessions lacking one of the required devices
    pub fn incomplete(&self, required: &[DeviceKind]) -> Vec<&Session> {
        self.sessions
            .iter()
            .filter(|s| required.iter().any(|kind| !s.equipment.has(*kind)))
            .collect()
    }
}

impl From<Vec<Session>> for Timeline {
    fn from(mut sessions: Vec<Session>) -> Self {
        sessions.sort_by(|a, b| a.start.cmp(&b.start));
        Self { sessions }
    }
}
