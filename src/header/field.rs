//! Fixed column layout of the header fields we validate and correct
use crate::position::GroundPosition;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a field is written within its column range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    /// Left justified text
    Text,
    /// Right justified float, with given number of decimals
    Float { precision: usize },
    /// Three right justified floats, each `width` wide
    Vector3 { width: usize, precision: usize },
}

/// Location of one field: header label and column range
/// (0 based, end exclusive) within that record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    pub label: &'static str,
    pub columns: Range<usize>,
    pub format: ColumnFormat,
}

impl FieldLayout {
    /// Field width, in characters
    pub fn width(&self) -> usize {
        self.columns.end - self.columns.start
    }
    /// True if both layouts target at least one common column
    /// of the same record.
    pub fn overlaps(&self, rhs: &Self) -> bool {
        self.label == rhs.label
            && self.columns.start < rhs.columns.end
            && rhs.columns.start < self.columns.end
    }
}

/// Header fields known to the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeaderField {
    MarkerName,
    MarkerNumber,
    Observer,
    Agency,
    ReceiverSerial,
    ReceiverType,
    ReceiverVersion,
    AntennaSerial,
    AntennaType,
    AntennaDeltaH,
    AntennaDeltaE,
    AntennaDeltaN,
    ApproxPosition,
}

pub const MARKER_NAME: &str = "MARKER NAME";
pub const MARKER_NUMBER: &str = "MARKER NUMBER";
pub const OBSERVER_AGENCY: &str = "OBSERVER / AGENCY";
pub const RECEIVER: &str = "REC # / TYPE / VERS";
pub const ANTENNA: &str = "ANT # / TYPE";
pub const ANTENNA_DELTA: &str = "ANTENNA: DELTA H/E/N";
pub const APPROX_POSITION: &str = "APPROX POSITION XYZ";

impl HeaderField {
    /// Every field, in header order
    pub const ALL: [Self; 13] = [
        Self::MarkerName,
        Self::MarkerNumber,
        Self::Observer,
        Self::Agency,
        Self::ReceiverSerial,
        Self::ReceiverType,
        Self::ReceiverVersion,
        Self::AntennaSerial,
        Self::AntennaType,
        Self::AntennaDeltaH,
        Self::AntennaDeltaE,
        Self::AntennaDeltaN,
        Self::ApproxPosition,
    ];
    /// Fields describing installed devices
    pub const DEVICE_FIELDS: [Self; 8] = [
        Self::ReceiverSerial,
        Self::ReceiverType,
        Self::ReceiverVersion,
        Self::AntennaSerial,
        Self::AntennaType,
        Self::AntennaDeltaH,
        Self::AntennaDeltaE,
        Self::AntennaDeltaN,
    ];
    /// Returns the fixed column layout of this field
    pub fn layout(&self) -> FieldLayout {
        let (label, columns, format) = match self {
            Self::MarkerName => (MARKER_NAME, 0..60, ColumnFormat::Text),
            Self::MarkerNumber => (MARKER_NUMBER, 0..20, ColumnFormat::Text),
            Self::Observer => (OBSERVER_AGENCY, 0..20, ColumnFormat::Text),
            Self::Agency => (OBSERVER_AGENCY, 20..60, ColumnFormat::Text),
            Self::ReceiverSerial => (RECEIVER, 0..20, ColumnFormat::Text),
            Self::ReceiverType => (RECEIVER, 20..40, ColumnFormat::Text),
            Self::ReceiverVersion => (RECEIVER, 40..60, ColumnFormat::Text),
            Self::AntennaSerial => (ANTENNA, 0..20, ColumnFormat::Text),
            Self::AntennaType => (ANTENNA, 20..40, ColumnFormat::Text),
            Self::AntennaDeltaH => (ANTENNA_DELTA, 0..14, ColumnFormat::Float { precision: 4 }),
            Self::AntennaDeltaE => (ANTENNA_DELTA, 14..28, ColumnFormat::Float { precision: 4 }),
            Self::AntennaDeltaN => (ANTENNA_DELTA, 28..42, ColumnFormat::Float { precision: 4 }),
            Self::ApproxPosition => (
                APPROX_POSITION,
                0..42,
                ColumnFormat::Vector3 {
                    width: 14,
                    precision: 4,
                },
            ),
        };
        FieldLayout {
            label,
            columns,
            format,
        }
    }
    /// Header label this field belongs to
    pub fn label(&self) -> &'static str {
        self.layout().label
    }
    /// False for fields that are reported but never rewritten
    pub fn is_correctable(&self) -> bool {
        !matches!(self, Self::ApproxPosition)
    }
    /// True for numeric fields, compared within tolerance
    pub fn is_numeric(&self) -> bool {
        !matches!(self.layout().format, ColumnFormat::Text)
    }
}

impl std::fmt::Display for HeaderField {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::MarkerName => write!(f, "MARKER NAME"),
            Self::MarkerNumber => write!(f, "MARKER NUMBER"),
            Self::Observer => write!(f, "OBSERVER"),
            Self::Agency => write!(f, "AGENCY"),
            Self::ReceiverSerial => write!(f, "REC #"),
            Self::ReceiverType => write!(f, "REC TYPE"),
            Self::ReceiverVersion => write!(f, "REC VERS"),
            Self::AntennaSerial => write!(f, "ANT #"),
            Self::AntennaType => write!(f, "ANT TYPE"),
            Self::AntennaDeltaH => write!(f, "ANTENNA DELTA H"),
            Self::AntennaDeltaE => write!(f, "ANTENNA DELTA E"),
            Self::AntennaDeltaN => write!(f, "ANTENNA DELTA N"),
            Self::ApproxPosition => write!(f, "APPROX POSITION XYZ"),
        }
    }
}

/// Value of a header field, declared or authoritative
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Position(GroundPosition),
}

impl FieldValue {
    /// Blank text is no value at all
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        Self::Number(f)
    }
}

impl From<GroundPosition> for FieldValue {
    fn from(pos: GroundPosition) -> Self {
        Self::Position(pos)
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Text(s) => write!(f, "{}", s),
            Self::Number(v) => write!(f, "{:.4}", v),
            Self::Position(pos) => {
                let (x, y, z) = pos.to_ecef_wgs84();
                write!(f, "{:.4} {:.4} {:.4}", x, y, z)
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn layouts() {
        for field in HeaderField::ALL {
            let layout = field.layout();
            assert!(layout.columns.end <= 60, "{} exceeds data columns", field);
            assert!(layout.width() > 0);
        }
        assert!(HeaderField::Observer
            .layout()
            .overlaps(&HeaderField::Observer.layout()));
        assert!(!HeaderField::Observer
            .layout()
            .overlaps(&HeaderField::Agency.layout()));
        assert!(!HeaderField::ReceiverSerial
            .layout()
            .overlaps(&HeaderField::AntennaSerial.layout()));
        assert!(!HeaderField::ApproxPosition.is_correctable());
        assert!(HeaderField::AntennaDeltaH.is_numeric());
        assert!(!HeaderField::AntennaType.is_numeric());
    }
    #[test]
    fn value_display() {
        assert_eq!(FieldValue::from(1.5).to_string(), "1.5000");
        assert_eq!(FieldValue::from("TRM57971.00").to_string(), "TRM57971.00");
        assert!(FieldValue::from("   ").is_blank());
    }
}
