use crate::{
    prelude::*,
    tests::toolkit::{header_line, reyk_registry, test_resource},
    validate_file,
};

fn daily_header(antenna_type: &str) -> String {
    [
        header_line("REYK", "MARKER NAME"),
        header_line("", "REC # / TYPE / VERS"),
        header_line(&format!("{:<20}{}", "", antenna_type), "ANT # / TYPE"),
        header_line(
            "  2012     1     1     0     0    0.0000000     GPS",
            "TIME OF FIRST OBS",
        ),
        header_line("", "END OF HEADER"),
    ]
    .concat()
}

#[test]
fn antenna_mismatch() {
    let (t0, t1) = (
        Epoch::from_gregorian_utc_at_midnight(2000, 1, 1),
        Epoch::from_gregorian_utc_at_midnight(2010, 6, 15),
    );
    let events = [
        EquipmentEvent::new(
            Antenna::default()
                .with_model("TRM29659.00")
                .with_serial_number("A1"),
            t0,
        )
        .with_valid_to(t1),
        EquipmentEvent::new(
            Antenna::default()
                .with_model("TRM57971.00")
                .with_serial_number("B2"),
            t1,
        ),
    ];
    let sessions = build_sessions(&events).unwrap();
    let header = parse_header(&daily_header("TRM29659.00")).unwrap();
    assert_eq!(
        header.observation_window(),
        (
            Epoch::from_gregorian_utc_at_midnight(2012, 1, 1),
            Epoch::from_gregorian_utc_at_midnight(2012, 1, 2)
        )
    );

    let report = validate(&header, &sessions);
    assert_eq!(
        report.entries,
        vec![Discrepancy {
            field: HeaderField::AntennaType,
            declared: Some(FieldValue::from("TRM29659.00")),
            authoritative: Some(FieldValue::from("TRM57971.00")),
            severity: Severity::Mismatch,
            correctable: true,
        }]
    );

    let corrected = apply_corrections(&daily_header("TRM29659.00"), &report).unwrap();
    assert_eq!(corrected, daily_header("TRM57971.00"));
}

#[test]
fn reyk_mismatch() {
    let path = test_resource("OBS/REYK0010.12o");
    let report = validate_file(&reyk_registry(), "REYK", &path, &Config::default()).unwrap();
    assert!(report.has_discrepancies());

    let corrections = report
        .corrections()
        .map(|e| (e.field, e.authoritative.clone()))
        .collect::<Vec<_>>();
    assert_eq!(
        corrections,
        vec![
            (HeaderField::AntennaSerial, Some(FieldValue::from("B2"))),
            (
                HeaderField::AntennaType,
                Some(FieldValue::from("TRM57971.00     NONE"))
            ),
        ]
    );

    for field in [
        HeaderField::MarkerName,
        HeaderField::MarkerNumber,
        HeaderField::Observer,
        HeaderField::Agency,
        HeaderField::ReceiverSerial,
        HeaderField::ReceiverType,
        HeaderField::ReceiverVersion,
        HeaderField::AntennaDeltaH,
        HeaderField::AntennaDeltaE,
        HeaderField::AntennaDeltaN,
        HeaderField::ApproxPosition,
    ] {
        let entry = report.get(field).unwrap();
        assert_eq!(entry.severity, Severity::Ok, "{} should match", field);
    }
}

#[test]
fn reyk_antenna_swap_day() {
    let path = test_resource("OBS/REYK1650.10o");
    let report = validate_file(&reyk_registry(), "REYK", &path, &Config::default()).unwrap();
    for field in [HeaderField::AntennaSerial, HeaderField::AntennaType] {
        let entry = report.get(field).unwrap();
        assert_eq!(entry.severity, Severity::Ambiguous, "{} not ambiguous", field);
        assert!(!entry.correctable);
    }
    assert_eq!(
        report.get(HeaderField::AntennaDeltaH).unwrap().severity,
        Severity::Ok
    );
    assert!(report.is_clean());
}

#[test]
fn reyk_valid() {
    let path = test_resource("OBS/REYK0020.12o");
    let report = validate_file(&reyk_registry(), "REYK", &path, &Config::default()).unwrap();
    assert!(!report.has_discrepancies(), "{:#?}", report);
}

#[test]
fn format_error() {
    let path = test_resource("OBS/BAD_0010.12o");
    match validate_file(&reyk_registry(), "REYK", &path, &Config::default()) {
        Err(Error::Format(FormatError::InvalidNumber { field, line, .. })) => {
            assert_eq!(field, "ANTENNA DELTA E");
            assert_eq!(line, 10);
        },
        other => panic!("expecting format error, got {:?}", other),
    }
}

#[test]
fn position_tolerance() {
    let path = test_resource("OBS/REYK0020.12o");
    let cfg = Config::default().with_position_tolerance(0.5);
    let report = validate_file(&reyk_registry(), "REYK", &path, &cfg).unwrap();
    let entry = report.get(HeaderField::ApproxPosition).unwrap();
    assert_eq!(entry.severity, Severity::Mismatch);
    assert!(!entry.correctable);
    assert!(report.is_clean());
}

#[test]
#[cfg(feature = "flate2")]
fn gzip_file() {
    let path = test_resource("OBS/REYK0010.12o.gz");
    let report = validate_file(&reyk_registry(), "REYK", &path, &Config::default()).unwrap();
    assert_eq!(report.corrections().count(), 2);
}
