//! Epoch parsing helpers: header records and registry timestamps
use hifitime::{Duration, Epoch};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParsingError {
    #[error("expecting \"yyyy mm dd hh mm ss.sssssss\" format")]
    FormatError,
    #[error("expecting \"yyyy-mm-ddThh:mm:ss\" format, got \"{0}\"")]
    DatetimeFormat(String),
    #[error("failed to parse years from \"{0}\"")]
    YearField(String),
    #[error("failed to parse months from \"{0}\"")]
    MonthField(String),
    #[error("failed to parse days from \"{0}\"")]
    DayField(String),
    #[error("failed to parse hours from \"{0}\"")]
    HoursField(String),
    #[error("failed to parse minutes field from \"{0}\"")]
    MinutesField(String),
    #[error("failed to parse seconds field from \"{0}\"")]
    SecondsField(String),
    #[error("failed to parse nanos from \"{0}\"")]
    NanosecondsField(String),
    #[error("invalid calendar date {0:04}-{1:02}-{2:02} {3:02}:{4:02}:{5:02}")]
    InvalidDate(i32, u8, u8, u8, u8, u8),
}

/*
 * Builds an UTC Epoch, refusing out of range fields
 * rather than letting hifitime panic on them.
 */
fn gregorian_utc(
    y: i32,
    m: u8,
    d: u8,
    hh: u8,
    mm: u8,
    ss: u8,
    ns: u32,
) -> Result<Epoch, ParsingError> {
    Epoch::maybe_from_gregorian_utc(y, m, d, hh, mm, ss, ns)
        .map_err(|_| ParsingError::InvalidDate(y, m, d, hh, mm, ss))
}

/*
 * Fractional seconds to nanoseconds, whatever the number of digits
 */
fn parse_nanos(fraction: &str) -> Result<u32, ParsingError> {
    let fraction = fraction.trim();
    if fraction.is_empty() {
        return Ok(0);
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParsingError::NanosecondsField(fraction.to_string()));
    }
    let digits: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
    digits
        .parse::<u32>()
        .map_err(|_| ParsingError::NanosecondsField(fraction.to_string()))
}

/// Parses a "yyyy mm dd hh mm ss.sssssss" header epoch, as found in
/// TIME OF FIRST OBS and TIME OF LAST OBS records.
/// The datetime is interpreted as UTC civil time.
pub fn parse_utc(content: &str) -> Result<Epoch, ParsingError> {
    let mut y = 0_i32;
    let mut m = 0_u8;
    let mut d = 0_u8;
    let mut hh = 0_u8;
    let mut mm = 0_u8;
    let mut ss = 0_u8;
    let mut ns = 0_u32;

    if content.split_ascii_whitespace().count() < 6 {
        return Err(ParsingError::FormatError);
    }

    for (field_index, item) in content.split_ascii_whitespace().enumerate() {
        match field_index {
            0 => {
                y = item
                    .parse::<i32>()
                    .map_err(|_| ParsingError::YearField(item.to_string()))?;

                /* old RINEX problem: YY is sometimes encoded on two digits */
                if y < 100 {
                    if y < 80 {
                        y += 2000;
                    } else {
                        y += 1900;
                    }
                }
            },
            1 => {
                m = item
                    .parse::<u8>()
                    .map_err(|_| ParsingError::MonthField(item.to_string()))?;
            },
            2 => {
                d = item
                    .parse::<u8>()
                    .map_err(|_| ParsingError::DayField(item.to_string()))?;
            },
            3 => {
                hh = item
                    .parse::<u8>()
                    .map_err(|_| ParsingError::HoursField(item.to_string()))?;
            },
            4 => {
                mm = item
                    .parse::<u8>()
                    .map_err(|_| ParsingError::MinutesField(item.to_string()))?;
            },
            5 => {
                let (secs, fraction) = match item.find('.') {
                    Some(dot) => (&item[..dot], &item[dot + 1..]),
                    None => (item, ""),
                };
                ss = secs
                    .trim()
                    .parse::<u8>()
                    .map_err(|_| ParsingError::SecondsField(item.to_string()))?;
                ns = parse_nanos(fraction)?;
            },
            _ => {},
        }
    }

    gregorian_utc(y, m, d, hh, mm, ss, ns)
}

/// Parses a registry timestamp: "yyyy-mm-ddThh:mm:ss", optionally
/// terminated by 'Z' and optionally carrying fractional seconds.
/// A plain "yyyy-mm-dd" date is midnight UTC.
pub fn parse_registry_datetime(content: &str) -> Result<Epoch, ParsingError> {
    let trimmed = content.trim();
    let trimmed = trimmed.strip_suffix('Z').unwrap_or(trimmed);

    let (date, time) = match trimmed.split_once(|c: char| c == 'T' || c == ' ') {
        Some((date, time)) => (date, Some(time)),
        None => (trimmed, None),
    };

    let format_err = || ParsingError::DatetimeFormat(content.to_string());

    let mut date_items = date.split('-');
    let (Some(y), Some(m), Some(d), None) = (
        date_items.next(),
        date_items.next(),
        date_items.next(),
        date_items.next(),
    ) else {
        return Err(format_err());
    };

    let y = y
        .parse::<i32>()
        .map_err(|_| ParsingError::YearField(y.to_string()))?;
    let m = m
        .parse::<u8>()
        .map_err(|_| ParsingError::MonthField(m.to_string()))?;
    let d = d
        .parse::<u8>()
        .map_err(|_| ParsingError::DayField(d.to_string()))?;

    let (mut hh, mut mm, mut ss, mut ns) = (0_u8, 0_u8, 0_u8, 0_u32);

    if let Some(time) = time {
        let mut time_items = time.split(':');
        let (Some(h), Some(min), secs, None) = (
            time_items.next(),
            time_items.next(),
            time_items.next(),
            time_items.next(),
        ) else {
            return Err(format_err());
        };
        hh = h
            .parse::<u8>()
            .map_err(|_| ParsingError::HoursField(h.to_string()))?;
        mm = min
            .parse::<u8>()
            .map_err(|_| ParsingError::MinutesField(min.to_string()))?;
        if let Some(secs) = secs {
            let (whole, fraction) = secs.split_once('.').unwrap_or((secs, ""));
            ss = whole
                .parse::<u8>()
                .map_err(|_| ParsingError::SecondsField(secs.to_string()))?;
            ns = parse_nanos(fraction)?;
        }
    }

    gregorian_utc(y, m, d, hh, mm, ss, ns)
}

/// Formats an Epoch the way registry timestamps are written
pub fn format_registry_datetime(epoch: Epoch) -> String {
    let (y, m, d, hh, mm, ss, _) = epoch.to_gregorian_utc();
    format!("{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z", y, m, d, hh, mm, ss)
}

/// One day, the span of a daily observation file
pub(crate) fn one_day() -> Duration {
    Duration::from_days(1.0)
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn header_epoch_parsing() {
        for (content, expected) in [
            (
                "  2012     1     1     0     0    0.0000000",
                Epoch::from_gregorian_utc(2012, 1, 1, 0, 0, 0, 0),
            ),
            (
                "  2021    12    21    23    59   30.5000000",
                Epoch::from_gregorian_utc(2021, 12, 21, 23, 59, 30, 500_000_000),
            ),
            (
                "    99     3     4     5     6    7.0000000",
                Epoch::from_gregorian_utc(1999, 3, 4, 5, 6, 7, 0),
            ),
            (
                "  2010     6    15    12     0    0",
                Epoch::from_gregorian_utc(2010, 6, 15, 12, 0, 0, 0),
            ),
        ] {
            let epoch = parse_utc(content).unwrap();
            assert_eq!(epoch, expected, "failed to parse \"{}\"", content);
        }
    }
    #[test]
    fn header_epoch_errors() {
        assert_eq!(parse_utc("  2012     1     1"), Err(ParsingError::FormatError));
        assert_eq!(
            parse_utc("  2012    1a     1     0     0    0.0000000"),
            Err(ParsingError::MonthField("1a".to_string()))
        );
        assert!(matches!(
            parse_utc("  2012    13     1     0     0    0.0000000"),
            Err(ParsingError::InvalidDate(2012, 13, 1, 0, 0, 0))
        ));
    }
    #[test]
    fn registry_datetime_parsing() {
        for (content, expected) in [
            (
                "2010-06-15T00:00:00",
                Epoch::from_gregorian_utc(2010, 6, 15, 0, 0, 0, 0),
            ),
            (
                "2010-06-15T13:45:10Z",
                Epoch::from_gregorian_utc(2010, 6, 15, 13, 45, 10, 0),
            ),
            (
                "2010-06-15 13:45",
                Epoch::from_gregorian_utc(2010, 6, 15, 13, 45, 0, 0),
            ),
            (
                "2000-01-01",
                Epoch::from_gregorian_utc(2000, 1, 1, 0, 0, 0, 0),
            ),
        ] {
            let epoch = parse_registry_datetime(content).unwrap();
            assert_eq!(epoch, expected, "failed to parse \"{}\"", content);
        }
        assert!(parse_registry_datetime("15/06/2010").is_err());
        assert!(parse_registry_datetime("2010-06-15T25:00:00").is_err());
    }
    #[test]
    fn registry_datetime_formatting() {
        let epoch = Epoch::from_gregorian_utc(2010, 6, 15, 13, 45, 10, 0);
        assert_eq!(format_registry_datetime(epoch), "2010-06-15T13:45:10Z");
        assert_eq!(
            parse_registry_datetime(&format_registry_datetime(epoch)).unwrap(),
            epoch
        );
    }
}
