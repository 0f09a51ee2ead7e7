use crate::{
    correct_file,
    prelude::*,
    reader::read_to_string,
    tests::toolkit::{reyk_registry, test_resource},
    validate_file,
};
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/*
 * Copies a test resource into a fresh temporary directory
 */
fn scratch_copy(relative: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let source = test_resource(relative);
    let target = dir.path().join(source.file_name().unwrap());
    fs::copy(&source, &target).unwrap();
    (dir, target)
}

#[test]
fn correction_locality() {
    let (dir, path) = scratch_copy("OBS/REYK0010.12o");
    let original = fs::read_to_string(&path).unwrap();

    let (report, corrected_path) =
        correct_file(&reyk_registry(), "REYK", &path, &Config::default(), true).unwrap();
    assert_eq!(corrected_path, path);
    assert_eq!(report.corrections().count(), 2);

    let corrected = fs::read_to_string(&path).unwrap();
    assert_eq!(corrected.len(), original.len());

    // only the ANT # / TYPE record changed
    for (lhs, rhs) in original.lines().zip(corrected.lines()) {
        if lhs.ends_with("ANT # / TYPE        ") {
            assert_eq!(
                rhs,
                "B2                  TRM57971.00     NONE                    ANT # / TYPE        "
            );
        } else {
            assert_eq!(lhs, rhs);
        }
    }

    // backup is the original content
    let backup = dir.path().join("REYK0010.12o.backup");
    assert_eq!(fs::read_to_string(&backup).unwrap(), original);

    // no temporary file left behind
    let entries = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 2);

    // corrected file now validates
    let report = validate_file(&reyk_registry(), "REYK", &path, &Config::default()).unwrap();
    assert!(!report.has_discrepancies(), "{:#?}", report);
}

#[test]
fn clean_file_is_untouched() {
    let (dir, path) = scratch_copy("OBS/REYK0020.12o");
    let original = fs::read(&path).unwrap();
    correct_file(&reyk_registry(), "REYK", &path, &Config::default(), true).unwrap();
    assert_eq!(fs::read(&path).unwrap(), original);
    assert!(
        !dir.path().join("REYK0020.12o.backup").exists(),
        "no backup without correction"
    );
}

#[test]
fn without_backup() {
    let (dir, path) = scratch_copy("OBS/REYK0010.12o");
    correct_file(&reyk_registry(), "REYK", &path, &Config::default(), false).unwrap();
    assert!(!dir.path().join("REYK0010.12o.backup").exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn failed_correction_leaves_original() {
    let (dir, path) = scratch_copy("OBS/REYK0010.12o");
    let original = fs::read(&path).unwrap();
    let report = DiscrepancyReport {
        entries: vec![Discrepancy::mismatch(
            HeaderField::AntennaType,
            None,
            FieldValue::from("THIS MODEL NAME IS WAY TOO LONG"),
        )],
    };
    let result = Editor::default().correct(&path, &report);
    assert!(matches!(result, Err(EditError::Overflow { .. })));
    assert_eq!(fs::read(&path).unwrap(), original);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1, "nothing written");
}

#[test]
fn custom_backup_suffix() {
    let (dir, path) = scratch_copy("OBS/REYK0010.12o");
    let cfg = Config {
        backup_suffix: ".orig".to_string(),
        ..Default::default()
    };
    correct_file(&reyk_registry(), "REYK", &path, &cfg, true).unwrap();
    assert!(dir.path().join("REYK0010.12o.orig").exists());
}

#[test]
#[cfg(feature = "flate2")]
fn gzip_correction() {
    let (dir, path) = scratch_copy("OBS/REYK0010.12o.gz");
    let original = read_to_string(&path).unwrap();
    correct_file(&reyk_registry(), "REYK", &path, &Config::default(), true).unwrap();

    let corrected = read_to_string(&path).unwrap();
    assert_eq!(corrected.len(), original.len());
    assert!(corrected.contains("B2                  TRM57971.00     NONE"));

    let backup = dir.path().join("REYK0010.12o.gz.backup");
    assert_eq!(fs::read(&backup).unwrap(), fs::read(test_resource("OBS/REYK0010.12o.gz")).unwrap());
}

#[test]
fn plain_read_matches_raw() {
    let path = test_resource("OBS/REYK0020.12o");
    assert_eq!(read_to_string(&path).unwrap(), fs::read_to_string(&path).unwrap());
}
