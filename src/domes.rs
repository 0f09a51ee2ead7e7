use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// DOMES parsing error
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("invalid DOMES number \"{0}\"")]
    InvalidFormat(String),
    #[error("DOMES numbers are 9 characters long: \"{0}\"")]
    InvalidLength(String),
}

/// DOMES site reference point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrackingPoint {
    /// Monument (pole, pillar, geodetic marker..)
    Monument,
    /// Instrument reference point, usually the antenna reference point.
    Instrument,
}

/// DOMES site identifier, as allocated by IGN for ITRF stations.
/// When known, it is the authoritative MARKER NUMBER of a station.
/// Serialized as its 9 character descriptor, for example "10202M006".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct Domes {
    /// Area / Country code (3 digits)
    pub area: u16,
    /// Area site number (2 digits)
    pub site: u8,
    /// Tracking point
    pub point: TrackingPoint,
    /// Sequential number (3 digits)
    pub sequential: u16,
}

impl std::str::FromStr for Domes {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 9 || !s.is_ascii() {
            return Err(Error::InvalidLength(s.to_string()));
        }
        let invalid = |_| Error::InvalidFormat(s.to_string());
        let point = match &s[5..6] {
            "M" => TrackingPoint::Monument,
            "S" => TrackingPoint::Instrument,
            _ => return Err(Error::InvalidFormat(s.to_string())),
        };
        let area = s[..3].parse::<u16>().map_err(invalid)?;
        let site = s[3..5].parse::<u8>().map_err(invalid)?;
        let sequential = s[6..].parse::<u16>().map_err(invalid)?;
        Ok(Self {
            point,
            area,
            site,
            sequential,
        })
    }
}

impl TryFrom<String> for Domes {
    type Error = Error;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Domes> for String {
    fn from(domes: Domes) -> Self {
        domes.to_string()
    }
}

impl std::fmt::Display for Domes {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let point = match self.point {
            TrackingPoint::Monument => 'M',
            TrackingPoint::Instrument => 'S',
        };
        write!(
            f,
            "{:03}{:02}{}{:03}",
            self.area, self.site, point, self.sequential
        )
    }
}
