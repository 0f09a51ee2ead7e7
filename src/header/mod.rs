//! RINEX observation header reader.
//! Header records are 80 columns wide: data in columns 1-60,
//! record label in columns 61-80.
use crate::{
    epoch::{one_day, parse_utc, ParsingError},
    position::GroundPosition,
};

use hifitime::{Duration, Epoch, Unit};
use std::{collections::HashSet, ops::Range};
use thiserror::Error;

#[cfg(feature = "log")]
use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod field;

pub use field::{ColumnFormat, FieldLayout, FieldValue, HeaderField};

use field::{
    ANTENNA, ANTENNA_DELTA, APPROX_POSITION, MARKER_NAME, MARKER_NUMBER, OBSERVER_AGENCY,
    RECEIVER,
};

pub const END_OF_HEADER: &str = "END OF HEADER";
pub const RINEX_VERSION: &str = "RINEX VERSION / TYPE";
pub const COMMENT: &str = "COMMENT";
pub const INTERVAL: &str = "INTERVAL";
pub const TIME_OF_FIRST_OBS: &str = "TIME OF FIRST OBS";
pub const TIME_OF_LAST_OBS: &str = "TIME OF LAST OBS";

/// Labels that must be present in every header we validate
pub const REQUIRED_LABELS: [&str; 4] = [MARKER_NAME, RECEIVER, ANTENNA, TIME_OF_FIRST_OBS];

/// Labels we interprete. Other labels may legitimately repeat.
const KNOWN_LABELS: [&str; 10] = [
    RINEX_VERSION,
    MARKER_NAME,
    MARKER_NUMBER,
    OBSERVER_AGENCY,
    RECEIVER,
    ANTENNA,
    ANTENNA_DELTA,
    APPROX_POSITION,
    TIME_OF_FIRST_OBS,
    TIME_OF_LAST_OBS,
];

/// Header that violates the fixed column format
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("missing \"{0}\" record")]
    MissingRecord(&'static str),
    #[error("line {line}: invalid {field} \"{content}\" (columns {first_column}-{last_column})")]
    InvalidNumber {
        field: String,
        line: usize,
        first_column: usize,
        last_column: usize,
        content: String,
    },
    #[error("line {line}: invalid \"{label}\" epoch")]
    InvalidEpoch {
        label: &'static str,
        line: usize,
        #[source]
        source: ParsingError,
    },
}

/*
 * Byte position of given character column, clipped to the line length
 */
fn byte_position(content: &str, column: usize) -> usize {
    content
        .char_indices()
        .nth(column)
        .map(|(i, _)| i)
        .unwrap_or(content.len())
}

/// One header line
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Record<'a> {
    /// Line number, starting at 1
    pub line: usize,
    /// Byte offset of the first character of this line
    pub offset: usize,
    /// Line content, without line terminator
    pub content: &'a str,
    /// Trimmed label (columns 61-80)
    pub label: &'a str,
}

impl<'a> Record<'a> {
    /// Byte range of given columns, within this line
    pub fn span(&self, columns: &Range<usize>) -> Range<usize> {
        byte_position(self.content, columns.start)..byte_position(self.content, columns.end)
    }
    /// Content of given columns. Missing columns are empty.
    pub fn columns(&self, columns: &Range<usize>) -> &'a str {
        &self.content[self.span(columns)]
    }
    fn text(&self, field: HeaderField) -> String {
        self.columns(&field.layout().columns).trim().to_string()
    }
    fn float(&self, name: &str, columns: Range<usize>) -> Result<Option<f64>, FormatError> {
        let content = self.columns(&columns).trim();
        if content.is_empty() {
            return Ok(None);
        }
        content
            .parse::<f64>()
            .map(Some)
            .map_err(|_| FormatError::InvalidNumber {
                field: name.to_string(),
                line: self.line,
                first_column: columns.start + 1,
                last_column: columns.end,
                content: content.to_string(),
            })
    }
    fn epoch(&self, label: &'static str) -> Result<Epoch, FormatError> {
        parse_utc(self.columns(&(0..43))).map_err(|source| FormatError::InvalidEpoch {
            label,
            line: self.line,
            source,
        })
    }
}

/// Splits raw content into header lines, up to and including END OF HEADER.
/// Line terminators are excluded from each line but preserved in the offsets.
pub(crate) fn records(raw: &str) -> Vec<Record<'_>> {
    let mut records = Vec::new();
    let mut offset = 0;
    for (index, line) in raw.split_inclusive('\n').enumerate() {
        let content = line.strip_suffix('\n').unwrap_or(line);
        let content = content.strip_suffix('\r').unwrap_or(content);
        let label = content[byte_position(content, 60)..].trim();
        records.push(Record {
            line: index + 1,
            offset,
            content,
            label,
        });
        offset += line.len();
        if label == END_OF_HEADER {
            break;
        }
    }
    records
}

/// Declared content of a RINEX observation header
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeaderRecord {
    /// RINEX revision, as declared ("2.11", "3.04"..)
    pub version: Option<String>,
    /// RINEX type ('O' for observation files)
    pub rinex_type: Option<char>,
    pub marker_name: String,
    pub marker_number: String,
    pub observer: String,
    pub agency: String,
    pub receiver_serial: String,
    pub receiver_type: String,
    pub receiver_version: String,
    pub antenna_serial: String,
    pub antenna_type: String,
    pub antenna_delta_h: Option<f64>,
    pub antenna_delta_e: Option<f64>,
    pub antenna_delta_n: Option<f64>,
    /// APPROX POSITION XYZ (ECEF WGS84)
    pub approx_position: Option<GroundPosition>,
    /// Sampling interval
    pub interval: Option<Duration>,
    pub time_of_first_obs: Epoch,
    pub time_of_last_obs: Option<Epoch>,
    /// Time system declared in TIME OF FIRST OBS
    pub time_system: Option<String>,
    pub comments: Vec<String>,
}

impl HeaderRecord {
    /// Declared value of given field. Blank fields have no value.
    pub fn value(&self, field: HeaderField) -> Option<FieldValue> {
        let text = |s: &String| {
            if s.trim().is_empty() {
                None
            } else {
                Some(FieldValue::Text(s.clone()))
            }
        };
        match field {
            HeaderField::MarkerName => text(&self.marker_name),
            HeaderField::MarkerNumber => text(&self.marker_number),
            HeaderField::Observer => text(&self.observer),
            HeaderField::Agency => text(&self.agency),
            HeaderField::ReceiverSerial => text(&self.receiver_serial),
            HeaderField::ReceiverType => text(&self.receiver_type),
            HeaderField::ReceiverVersion => text(&self.receiver_version),
            HeaderField::AntennaSerial => text(&self.antenna_serial),
            HeaderField::AntennaType => text(&self.antenna_type),
            HeaderField::AntennaDeltaH => self.antenna_delta_h.map(FieldValue::Number),
            HeaderField::AntennaDeltaE => self.antenna_delta_e.map(FieldValue::Number),
            HeaderField::AntennaDeltaN => self.antenna_delta_n.map(FieldValue::Number),
            HeaderField::ApproxPosition => self.approx_position.map(FieldValue::Position),
        }
    }
    /// Observation window [start, end).
    /// The window closes one sampling interval after TIME OF LAST OBS,
    /// or one nanosecond after it when the interval is unknown.
    /// Without TIME OF LAST OBS, this is a daily file starting at TIME OF FIRST OBS.
    pub fn observation_window(&self) -> (Epoch, Epoch) {
        let start = self.time_of_first_obs;
        let end = match self.time_of_last_obs {
            Some(last) if last >= start => {
                let interval = self
                    .interval
                    .filter(|dt| *dt > Duration::ZERO)
                    .unwrap_or(1 * Unit::Nanosecond);
                last + interval
            },
            _ => start + one_day(),
        };
        (start, end)
    }
}

/// Parses a RINEX observation header. Records are scanned in file order
/// until END OF HEADER. The first occurrence of a label wins.
pub fn parse_header(raw: &str) -> Result<HeaderRecord, FormatError> {
    let mut seen = HashSet::<&str>::new();
    let mut terminated = false;

    let mut version = None;
    let mut rinex_type = None;
    let mut marker_name = String::new();
    let mut marker_number = String::new();
    let mut observer = String::new();
    let mut agency = String::new();
    let mut receiver_serial = String::new();
    let mut receiver_type = String::new();
    let mut receiver_version = String::new();
    let mut antenna_serial = String::new();
    let mut antenna_type = String::new();
    let (mut delta_h, mut delta_e, mut delta_n) = (None, None, None);
    let mut approx_position = None;
    let mut interval = None;
    let mut time_of_first_obs = None;
    let mut time_of_last_obs = None;
    let mut time_system = None;
    let mut comments = Vec::new();

    for record in records(raw) {
        let label = record.label;
        if label == END_OF_HEADER {
            terminated = true;
            break;
        }
        if label == COMMENT {
            comments.push(record.columns(&(0..60)).trim_end().to_string());
            continue;
        }
        if KNOWN_LABELS.contains(&label) || label == INTERVAL {
            if !seen.insert(label) {
                #[cfg(feature = "log")]
                warn!("line {}: ignoring repeated \"{}\" record", record.line, label);
                continue;
            }
        }

        match label {
            RINEX_VERSION => {
                let v = record.columns(&(0..9)).trim();
                if !v.is_empty() {
                    version = Some(v.to_string());
                }
                rinex_type = record.columns(&(20..21)).chars().find(|c| !c.is_whitespace());
            },
            MARKER_NAME => marker_name = record.text(HeaderField::MarkerName),
            MARKER_NUMBER => marker_number = record.text(HeaderField::MarkerNumber),
            OBSERVER_AGENCY => {
                observer = record.text(HeaderField::Observer);
                agency = record.text(HeaderField::Agency);
            },
            RECEIVER => {
                receiver_serial = record.text(HeaderField::ReceiverSerial);
                receiver_type = record.text(HeaderField::ReceiverType);
                receiver_version = record.text(HeaderField::ReceiverVersion);
            },
            ANTENNA => {
                antenna_serial = record.text(HeaderField::AntennaSerial);
                antenna_type = record.text(HeaderField::AntennaType);
            },
            ANTENNA_DELTA => {
                for (field, value) in [
                    (HeaderField::AntennaDeltaH, &mut delta_h),
                    (HeaderField::AntennaDeltaE, &mut delta_e),
                    (HeaderField::AntennaDeltaN, &mut delta_n),
                ] {
                    *value = record.float(&field.to_string(), field.layout().columns)?;
                }
            },
            APPROX_POSITION => {
                let name = HeaderField::ApproxPosition.to_string();
                let x = record.float(&name, 0..14)?;
                let y = record.float(&name, 14..28)?;
                let z = record.float(&name, 28..42)?;
                approx_position = match (x, y, z) {
                    (Some(x), Some(y), Some(z)) => Some(GroundPosition::from_ecef_wgs84((x, y, z))),
                    (None, None, None) => None,
                    _ => {
                        return Err(FormatError::InvalidNumber {
                            field: name,
                            line: record.line,
                            first_column: 1,
                            last_column: 42,
                            content: record.columns(&(0..42)).to_string(),
                        });
                    },
                };
            },
            INTERVAL => {
                interval = record.float(INTERVAL, 0..10)?.map(Duration::from_seconds);
            },
            TIME_OF_FIRST_OBS => {
                time_of_first_obs = Some(record.epoch(TIME_OF_FIRST_OBS)?);
                let ts = record.columns(&(48..51)).trim();
                if !ts.is_empty() {
                    time_system = Some(ts.to_string());
                }
            },
            TIME_OF_LAST_OBS => {
                time_of_last_obs = Some(record.epoch(TIME_OF_LAST_OBS)?);
            },
            _ => {},
        }
    }

    if !terminated {
        return Err(FormatError::MissingRecord(END_OF_HEADER));
    }

    for label in REQUIRED_LABELS {
        if !seen.contains(label) {
            return Err(FormatError::MissingRecord(label));
        }
    }

    let time_of_first_obs =
        time_of_first_obs.ok_or(FormatError::MissingRecord(TIME_OF_FIRST_OBS))?;

    #[cfg(feature = "log")]
    debug!(
        "marker \"{}\": receiver \"{}\" antenna \"{}\" from {}",
        marker_name, receiver_type, antenna_type, time_of_first_obs
    );

    Ok(HeaderRecord {
        version,
        rinex_type,
        marker_name,
        marker_number,
        observer,
        agency,
        receiver_serial,
        receiver_type,
        receiver_version,
        antenna_serial,
        antenna_type,
        antenna_delta_h: delta_h,
        antenna_delta_e: delta_e,
        antenna_delta_n: delta_n,
        approx_position,
        interval,
        time_of_first_obs,
        time_of_last_obs,
        time_system,
        comments,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    fn line(content: &str, label: &str) -> String {
        format!("{:<60}{:<20}\n", content, label)
    }
    fn header(lines: &[(&str, &str)]) -> String {
        lines.iter().map(|(content, label)| line(content, label)).collect()
    }
    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("     2.11           OBSERVATION DATA    G (GPS)", RINEX_VERSION),
            ("REYK", MARKER_NAME),
            ("10202M006", MARKER_NUMBER),
            ("IMO                 Icelandic Met Office", OBSERVER_AGENCY),
            ("5001                TRIMBLE NETR9       4.85", RECEIVER),
            ("A1                  TRM29659.00     SCIS", ANTENNA),
            ("  2587384.0000 -1043033.0000  5716564.0000", APPROX_POSITION),
            ("        0.0083        0.0000        0.0000", ANTENNA_DELTA),
            ("    30.000", INTERVAL),
            ("  2012     1     1     0     0    0.0000000     GPS", TIME_OF_FIRST_OBS),
            ("", END_OF_HEADER),
        ]
    }
    #[test]
    fn parser() {
        let header = parse_header(&header(&minimal())).unwrap();
        assert_eq!(header.version.as_deref(), Some("2.11"));
        assert_eq!(header.rinex_type, Some('O'));
        assert_eq!(header.marker_name, "REYK");
        assert_eq!(header.marker_number, "10202M006");
        assert_eq!(header.observer, "IMO");
        assert_eq!(header.agency, "Icelandic Met Office");
        assert_eq!(header.receiver_serial, "5001");
        assert_eq!(header.receiver_type, "TRIMBLE NETR9");
        assert_eq!(header.receiver_version, "4.85");
        assert_eq!(header.antenna_serial, "A1");
        assert_eq!(header.antenna_type, "TRM29659.00     SCIS");
        assert_eq!(header.antenna_delta_h, Some(0.0083));
        assert_eq!(header.antenna_delta_e, Some(0.0));
        assert_eq!(
            header.approx_position,
            Some(GroundPosition::from_ecef_wgs84((
                2587384.0,
                -1043033.0,
                5716564.0
            )))
        );
        assert_eq!(header.interval, Some(Duration::from_seconds(30.0)));
        assert_eq!(header.time_system.as_deref(), Some("GPS"));
        assert_eq!(
            header.time_of_first_obs,
            Epoch::from_gregorian_utc_at_midnight(2012, 1, 1)
        );
        let (start, end) = header.observation_window();
        assert_eq!(start, Epoch::from_gregorian_utc_at_midnight(2012, 1, 1));
        assert_eq!(end, Epoch::from_gregorian_utc_at_midnight(2012, 1, 2));
    }
    #[test]
    fn observation_window() {
        let mut lines = minimal();
        lines.insert(
            10,
            ("  2012     1     1    23    59   30.0000000     GPS", TIME_OF_LAST_OBS),
        );
        let header = parse_header(&header(&lines)).unwrap();
        let (_, end) = header.observation_window();
        assert_eq!(end, Epoch::from_gregorian_utc_at_midnight(2012, 1, 2));
    }
    #[test]
    fn blank_fields() {
        let mut lines = minimal();
        lines[7] = ("", ANTENNA_DELTA);
        lines[6] = ("", APPROX_POSITION);
        lines[2] = ("", MARKER_NUMBER);
        let header = parse_header(&header(&lines)).unwrap();
        assert_eq!(header.antenna_delta_h, None, "blank is not zero");
        assert_eq!(header.approx_position, None);
        assert_eq!(header.value(HeaderField::MarkerNumber), None);
        assert_eq!(header.value(HeaderField::AntennaDeltaH), None);
    }
    #[test]
    fn first_occurrence_wins() {
        let mut lines = minimal();
        lines.insert(2, ("ELDC", MARKER_NAME));
        lines.insert(0, ("a comment", COMMENT));
        let header = parse_header(&header(&lines)).unwrap();
        assert_eq!(header.marker_name, "REYK");
        assert_eq!(header.comments, vec!["a comment".to_string()]);
    }
    #[test]
    fn invalid_number() {
        let mut lines = minimal();
        lines[7] = ("        0.0083       0.0x00        0.0000", ANTENNA_DELTA);
        match parse_header(&header(&lines)) {
            Err(FormatError::InvalidNumber {
                field,
                line,
                first_column,
                last_column,
                content,
            }) => {
                assert_eq!(field, "ANTENNA DELTA E");
                assert_eq!(line, 8);
                assert_eq!(first_column, 15);
                assert_eq!(last_column, 28);
                assert_eq!(content, "0.0x00");
            },
            other => panic!("expecting format error, got {:?}", other),
        }
    }
    #[test]
    fn partial_position() {
        let mut lines = minimal();
        lines[6] = ("  2587384.0000              5716564.0000", APPROX_POSITION);
        assert!(matches!(
            parse_header(&header(&lines)),
            Err(FormatError::InvalidNumber { line: 7, .. })
        ));
    }
    #[test]
    fn missing_records() {
        for (index, label) in [
            (1, MARKER_NAME),
            (4, RECEIVER),
            (5, ANTENNA),
            (9, TIME_OF_FIRST_OBS),
            (10, END_OF_HEADER),
        ] {
            let mut lines = minimal();
            lines.remove(index);
            assert_eq!(
                parse_header(&header(&lines)),
                Err(FormatError::MissingRecord(label)),
                "missing {} not detected",
                label
            );
        }
    }
    #[test]
    fn invalid_epoch() {
        let mut lines = minimal();
        lines[9] = ("  2012    13     1     0     0    0.0000000     GPS", TIME_OF_FIRST_OBS);
        assert!(matches!(
            parse_header(&header(&lines)),
            Err(FormatError::InvalidEpoch { line: 10, .. })
        ));
    }
    #[test]
    fn record_offsets() {
        let raw = "first line\r\nsecond\n";
        let records = records(raw);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content, "first line");
        assert_eq!(records[1].offset, 12);
        assert_eq!(records[1].content, "second");
        assert_eq!(records[1].label, "");
        assert_eq!(records[0].columns(&(6..20)), "line");
    }
}
