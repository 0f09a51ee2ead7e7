//! Hardware: receiver, antenna, radome and monument descriptions
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unknown device kind \"{0}\"")]
pub struct UnknownDeviceKind(pub String);

/// Kinds of equipment a station session is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DeviceKind {
    /// GNSS receiver
    Receiver,
    /// GNSS antenna
    Antenna,
    /// Antenna radome
    Radome,
    /// Monument the antenna is mounted on
    Monument,
}

impl DeviceKind {
    /// All device kinds, in session order
    pub const ALL: [Self; 4] = [Self::Receiver, Self::Antenna, Self::Radome, Self::Monument];
}

impl std::fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Receiver => write!(f, "receiver"),
            Self::Antenna => write!(f, "antenna"),
            Self::Radome => write!(f, "radome"),
            Self::Monument => write!(f, "monument"),
        }
    }
}

impl std::str::FromStr for DeviceKind {
    type Err = UnknownDeviceKind;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "receiver" | "gnss_receiver" | "gnss receiver" => Ok(Self::Receiver),
            "antenna" | "gnss_antenna" | "gnss antenna" => Ok(Self::Antenna),
            "radome" => Ok(Self::Radome),
            "monument" => Ok(Self::Monument),
            _ => Err(UnknownDeviceKind(s.to_string())),
        }
    }
}

/// GNSS receiver description
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Receiver {
    /// Receiver (hardware) model
    pub model: String,
    /// Receiver (hardware) identification info
    pub sn: Option<String>,
    /// Receiver firmware version
    pub firmware: Option<String>,
    /// Receiver embedded software version
    pub software: Option<String>,
}

impl Receiver {
    /// Sets desired model
    pub fn with_model(&self, m: &str) -> Self {
        let mut s = self.clone();
        s.model = m.to_string();
        s
    }
    /// Sets desired Serial Number
    pub fn with_serial_number(&self, sn: &str) -> Self {
        let mut s = self.clone();
        s.sn = Some(sn.to_string());
        s
    }
    /// Sets firmware version
    pub fn with_firmware(&self, firmware: &str) -> Self {
        let mut s = self.clone();
        s.firmware = Some(firmware.to_string());
        s
    }
    /// Sets software version
    pub fn with_software(&self, software: &str) -> Self {
        let mut s = self.clone();
        s.software = Some(software.to_string());
        s
    }
    /// Version string a RINEX header should declare:
    /// software version, falling back to firmware version.
    pub fn version(&self) -> Option<&str> {
        self.software
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .or(self.firmware.as_deref())
    }
}

/// Antenna description
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Antenna {
    /// Hardware model / make descriptor
    pub model: String,
    /// Serial number / identification number
    pub sn: Option<String>,
    /// Optionnal `h` eccentricity (height component),
    /// referenced to base/reference point, in meter
    pub height: Option<f64>,
    /// Optionnal `eastern` eccentricity (eastern component),
    /// referenced to base/reference point, in meter
    pub eastern: Option<f64>,
    /// Optionnal `northern` eccentricity (northern component),
    /// referenced to base/reference point, in meter
    pub northern: Option<f64>,
    /// Antenna reference point (ARP, BPA..)
    pub reference_point: Option<String>,
}

impl Antenna {
    /// Sets desired model
    pub fn with_model(&self, m: &str) -> Self {
        let mut s = self.clone();
        s.model = m.to_string();
        s
    }
    /// Sets desired Serial Number
    pub fn with_serial_number(&self, sn: &str) -> Self {
        let mut s = self.clone();
        s.sn = Some(sn.to_string());
        s
    }
    /// Sets antenna `h` eccentricity component
    pub fn with_height(&self, h: f64) -> Self {
        let mut s = self.clone();
        s.height = Some(h);
        s
    }
    /// Sets antenna `eastern` coordinates component
    pub fn with_eastern_component(&self, e: f64) -> Self {
        let mut s = self.clone();
        s.eastern = Some(e);
        s
    }
    /// Sets antenna `northern` coordinates component
    pub fn with_northern_component(&self, n: f64) -> Self {
        let mut s = self.clone();
        s.northern = Some(n);
        s
    }
    /// Sets antenna reference point
    pub fn with_reference_point(&self, arp: &str) -> Self {
        let mut s = self.clone();
        s.reference_point = Some(arp.to_string());
        s
    }
}

/// Radome description
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Radome {
    /// Radome model, usually a 4 letter IGS code like "SCIS"
    pub model: String,
    /// Serial number / identification number
    pub sn: Option<String>,
}

impl Radome {
    /// Sets desired model
    pub fn with_model(&self, m: &str) -> Self {
        let mut s = self.clone();
        s.model = m.to_string();
        s
    }
    /// Sets desired Serial Number
    pub fn with_serial_number(&self, sn: &str) -> Self {
        let mut s = self.clone();
        s.sn = Some(sn.to_string());
        s
    }
}

/// Monument description.
/// Its eccentricities add up to the antenna's, in meter.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Monument {
    /// Serial number / identification number
    pub sn: Option<String>,
    pub height: Option<f64>,
    pub eastern: Option<f64>,
    pub northern: Option<f64>,
}

impl Monument {
    /// Sets desired Serial Number
    pub fn with_serial_number(&self, sn: &str) -> Self {
        let mut s = self.clone();
        s.sn = Some(sn.to_string());
        s
    }
    /// Sets monument height
    pub fn with_height(&self, h: f64) -> Self {
        let mut s = self.clone();
        s.height = Some(h);
        s
    }
    /// Sets monument `eastern` eccentricity
    pub fn with_eastern_component(&self, e: f64) -> Self {
        let mut s = self.clone();
        s.eastern = Some(e);
        s
    }
    /// Sets monument `northern` eccentricity
    pub fn with_northern_component(&self, n: f64) -> Self {
        let mut s = self.clone();
        s.northern = Some(n);
        s
    }
}

/// One installed device, tagged by kind
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Device {
    Receiver(Receiver),
    Antenna(Antenna),
    Radome(Radome),
    Monument(Monument),
}

impl Device {
    /// Returns the kind of this device
    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Receiver(_) => DeviceKind::Receiver,
            Self::Antenna(_) => DeviceKind::Antenna,
            Self::Radome(_) => DeviceKind::Radome,
            Self::Monument(_) => DeviceKind::Monument,
        }
    }
    /// Returns serial number, if known
    pub fn serial_number(&self) -> Option<&str> {
        match self {
            Self::Receiver(r) => r.sn.as_deref(),
            Self::Antenna(a) => a.sn.as_deref(),
            Self::Radome(r) => r.sn.as_deref(),
            Self::Monument(m) => m.sn.as_deref(),
        }
    }
    /// Returns model descriptor. Monuments have none.
    pub fn model(&self) -> Option<&str> {
        match self {
            Self::Receiver(r) => Some(&r.model),
            Self::Antenna(a) => Some(&a.model),
            Self::Radome(r) => Some(&r.model),
            Self::Monument(_) => None,
        }
    }
}

impl From<Receiver> for Device {
    fn from(r: Receiver) -> Self {
        Self::Receiver(r)
    }
}

impl From<Antenna> for Device {
    fn from(a: Antenna) -> Self {
        Self::Antenna(a)
    }
}

impl From<Radome> for Device {
    fn from(r: Radome) -> Self {
        Self::Radome(r)
    }
}

impl From<Monument> for Device {
    fn from(m: Monument) -> Self {
        Self::Monument(m)
    }
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.kind())?;
        if let Some(model) = self.model() {
            write!(f, " {}", model)?;
        }
        if let Some(sn) = self.serial_number() {
            write!(f, " (#{})", sn)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;
    #[test]
    fn device_kind_parsing() {
        for (content, expected) in [
            ("gnss_receiver", DeviceKind::Receiver),
            ("receiver", DeviceKind::Receiver),
            ("Antenna", DeviceKind::Antenna),
            ("radome", DeviceKind::Radome),
            (" monument ", DeviceKind::Monument),
        ] {
            assert_eq!(DeviceKind::from_str(content), Ok(expected));
        }
        assert!(DeviceKind::from_str("tripod").is_err());
    }
    #[test]
    fn receiver_version() {
        let rcvr = Receiver::default()
            .with_model("TRIMBLE NETR9")
            .with_firmware("4.85");
        assert_eq!(rcvr.version(), Some("4.85"));
        let rcvr = rcvr.with_software("5.22");
        assert_eq!(rcvr.version(), Some("5.22"));
        assert_eq!(Receiver::default().version(), None);
    }
    #[test]
    fn device_descriptor() {
        let device = Device::from(
            Antenna::default()
                .with_model("TRM29659.00")
                .with_serial_number("A1"),
        );
        assert_eq!(device.kind(), DeviceKind::Antenna);
        assert_eq!(device.model(), Some("TRM29659.00"));
        assert_eq!(device.serial_number(), Some("A1"));
        assert_eq!(device.to_string(), "antenna TRM29659.00 (#A1)");
        let device = Device::from(Monument::default().with_height(1.5));
        assert_eq!(device.model(), None);
        assert_eq!(device.to_string(), "monument");
    }
}
