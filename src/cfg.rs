use crate::hardware::DeviceKind;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

fn default_offset_tolerance() -> f64 {
    0.0001
}

fn default_position_tolerance() -> f64 {
    60.0
}

fn default_required_devices() -> Vec<DeviceKind> {
    vec![DeviceKind::Receiver, DeviceKind::Antenna]
}

fn default_backup_suffix() -> String {
    ".backup".to_string()
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Maximal difference between declared and authoritative
    /// antenna offsets (H/E/N), in meters.
    #[cfg_attr(feature = "serde", serde(default = "default_offset_tolerance"))]
    pub offset_tolerance: f64,
    /// Maximal 3D distance between APPROX POSITION XYZ
    /// and the station reference coordinates, in meters.
    /// Approximate positions are rarely better than a few meters.
    #[cfg_attr(feature = "serde", serde(default = "default_position_tolerance"))]
    pub position_tolerance: f64,
    /// Devices a session must comprise to be complete
    #[cfg_attr(feature = "serde", serde(default = "default_required_devices"))]
    pub required_devices: Vec<DeviceKind>,
    /// Suffix of the backup copy created before correcting a file
    #[cfg_attr(feature = "serde", serde(default = "default_backup_suffix"))]
    pub backup_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            offset_tolerance: default_offset_tolerance(),
            position_tolerance: default_position_tolerance(),
            required_devices: default_required_devices(),
            backup_suffix: default_backup_suffix(),
        }
    }
}

impl Config {
    /// Copies and sets antenna offsets tolerance, in meters
    pub fn with_offset_tolerance(&self, tolerance: f64) -> Self {
        let mut s = self.clone();
        s.offset_tolerance = tolerance;
        s
    }
    /// Copies and sets position tolerance, in meters
    pub fn with_position_tolerance(&self, tolerance: f64) -> Self {
        let mut s = self.clone();
        s.position_tolerance = tolerance;
        s
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.offset_tolerance, 0.0001);
        assert_eq!(cfg.position_tolerance, 60.0);
        assert_eq!(
            cfg.required_devices,
            vec![DeviceKind::Receiver, DeviceKind::Antenna]
        );
        assert_eq!(cfg.backup_suffix, ".backup");
    }
    #[test]
    #[cfg(feature = "serde")]
    fn partial_deserialization() {
        let cfg: Config = serde_json::from_str("{\"position_tolerance\": 5.0}").unwrap();
        assert_eq!(cfg.position_tolerance, 5.0);
        assert_eq!(cfg.offset_tolerance, 0.0001);
        assert_eq!(cfg.backup_suffix, ".backup");
    }
}
