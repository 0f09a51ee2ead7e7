//! Equipment events: one device state over a validity interval
use crate::hardware::{Device, DeviceKind};
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// [EquipmentEvent] describes one installed device state,
/// valid from `valid_from` (inclusive) until `valid_to` (exclusive).
/// `valid_to` is None while the device is still installed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EquipmentEvent {
    /// Installed device
    pub device: Device,
    /// Installation instant (inclusive)
    pub valid_from: Epoch,
    /// Removal instant (exclusive)
    pub valid_to: Option<Epoch>,
}

impl EquipmentEvent {
    /// Builds a new [EquipmentEvent], still valid as of today.
    pub fn new(device: impl Into<Device>, valid_from: Epoch) -> Self {
        Self {
            device: device.into(),
            valid_from,
            valid_to: None,
        }
    }
    /// Copies and closes Self at given instant
    pub fn with_valid_to(&self, valid_to: Epoch) -> Self {
        let mut s = self.clone();
        s.valid_to = Some(valid_to);
        s
    }
    /// Returns the kind of device this event describes
    pub fn kind(&self) -> DeviceKind {
        self.device.kind()
    }
    /// True when this event describes an empty (or reversed) interval
    pub fn is_degenerate(&self) -> bool {
        match self.valid_to {
            Some(end) => end <= self.valid_from,
            None => false,
        }
    }
    /// True if this event is valid at given instant
    pub fn is_valid_at(&self, t: Epoch) -> bool {
        t >= self.valid_from && self.valid_to.map(|end| t < end).unwrap_or(true)
    }
    /// True if this event covers the entire [start, end) interval,
    /// end being None for an unbounded interval.
    pub fn contains(&self, start: Epoch, end: Option<Epoch>) -> bool {
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

impl std::fmt::Display for EquipmentEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} [{}, ", self.device, self.valid_from)?;
        match self.valid_to {
            Some(end) => write!(f, "{})", end),
            None => write!(f, "..)"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::hardware::Antenna;
    #[test]
    fn validity() {
        let t0 = Epoch::from_gregorian_utc_at_midnight(2000, 1, 1);
        let t1 = Epoch::from_gregorian_utc_at_midnight(2010, 6, 15);
        let t2 = Epoch::from_gregorian_utc_at_midnight(2012, 1, 1);
        let event = EquipmentEvent::new(Antenna::default().with_model("TRM29659.00"), t0);
        assert!(!event.is_degenerate());
        assert!(event.is_valid_at(t2));
        assert!(event.contains(t1, None));

        let event = event.with_valid_to(t1);
        assert!(event.is_valid_at(t0));
        assert!(!event.is_valid_at(t1), "valid_to is exclusive");
        assert!(event.contains(t0, Some(t1)));
        assert!(!event.contains(t0, Some(t2)));
        assert!(!event.contains(t0, None));

        assert!(event.with_valid_to(t0).is_degenerate());
        assert!(event.with_valid_to(t0 - hifitime::Duration::from_days(1.0)).is_degenerate());
    }
}
