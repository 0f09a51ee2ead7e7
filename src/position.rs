use map_3d::{deg2rad, ecef2geodetic, geodetic2ecef, rad2deg, Ellipsoid};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ground position, stored as ECEF WGS84 coordinates in meters.
/// This is what RINEX headers declare as APPROX POSITION XYZ.
#[derive(Default, Copy, Debug, Clone, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroundPosition(f64, f64, f64);

/// Geodetic coordinates, as published by station registries:
/// latitude and longitude in decimal degrees, altitude in meters
/// above the WGS84 ellipsoid.
#[derive(Default, Copy, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Geodetic {
    pub lat: f64,
    pub lon: f64,
    pub altitude: f64,
}

impl From<(f64, f64, f64)> for GroundPosition {
    fn from(xyz: (f64, f64, f64)) -> Self {
        Self(xyz.0, xyz.1, xyz.2)
    }
}

impl From<GroundPosition> for (f64, f64, f64) {
    fn from(val: GroundPosition) -> Self {
        (val.0, val.1, val.2)
    }
}

impl From<Geodetic> for GroundPosition {
    fn from(geo: Geodetic) -> Self {
        Self::from_geodetic((geo.lat, geo.lon, geo.altitude))
    }
}

impl GroundPosition {
    /// Builds Self from ECEF WGS84 coordinates
    pub fn from_ecef_wgs84(pos: (f64, f64, f64)) -> Self {
        Self(pos.0, pos.1, pos.2)
    }
    /// Builds Self from Geodetic coordinates in ddeg.
    /// Altitude is expressed in meters and is not converted.
    pub fn from_geodetic(pos: (f64, f64, f64)) -> Self {
        let (lat, lon, alt) = pos;
        let (x, y, z) = geodetic2ecef(deg2rad(lat), deg2rad(lon), alt, Ellipsoid::WGS84);
        Self(x, y, z)
    }
    /// Converts Self to ECEF WGS84
    pub fn to_ecef_wgs84(&self) -> (f64, f64, f64) {
        (self.0, self.1, self.2)
    }
    /// Converts Self to geodetic coordinates in ddeg
    pub fn to_geodetic(&self) -> Geodetic {
        let (x, y, z) = (self.0, self.1, self.2);
        let (lat, lon, altitude) = ecef2geodetic(x, y, z, Ellipsoid::WGS84);
        Geodetic {
            lat: rad2deg(lat),
            lon: rad2deg(lon),
            altitude,
        }
    }
    /// 3D euclidean distance to other position, in meters
    pub fn distance(&self, rhs: &Self) -> f64 {
        let (dx, dy, dz) = (self.0 - rhs.0, self.1 - rhs.1, self.2 - rhs.2);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

impl std::fmt::Display for GroundPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "WGS84 ({}m {}m {}m)", self.0, self.1, self.2)
    }
}

/*
 * RINEX compatible formatting
 */
impl std::fmt::UpperHex for GroundPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:14.4}{:14.4}{:14.4}", self.0, self.1, self.2)
    }
}
