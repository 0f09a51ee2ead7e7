//! Text and JSON renditions
use std::path::Path;

use gnss_metadata::{
    epoch::format_registry_datetime,
    prelude::{Config, DeviceKind, DiscrepancyReport, FieldValue, Timeline},
};
use itertools::Itertools;
use serde_json::json;

use crate::{
    batch::{status, Checked, Outcome, Status},
    Error,
};

fn value(v: &Option<FieldValue>) -> String {
    match v {
        Some(v) => format!("\"{}\"", v),
        None => "-".to_string(),
    }
}

/// Renders a validation report, one line per compared field
pub fn discrepancies(path: &Path, report: &DiscrepancyReport) -> String {
    let mut content = format!(
        "{}: {} discrepancie(s), {} correctable\n",
        path.display(),
        report.discrepancies().count(),
        report.corrections().count(),
    );
    for entry in report.entries.iter() {
        content.push_str(&format!(
            "{:<20}{:<14}{:<40}{}{}\n",
            entry.field.to_string(),
            entry.severity.to_string(),
            value(&entry.declared),
            value(&entry.authoritative),
            if entry.correctable { " (correctable)" } else { "" },
        ));
    }
    content
}

/// Renders a batch: one report per file, then one summary line per file
pub fn batch(outcomes: &[Outcome]) -> String {
    let mut content = String::new();
    for outcome in outcomes {
        if let Ok(checked) = &outcome.result {
            content.push_str(&discrepancies(&outcome.path, &checked.report));
        }
    }
    let (valid, discrepant, failed) = outcomes.iter().fold((0, 0, 0), |(v, d, f), outcome| {
        match outcome.status() {
            Status::Valid => (v + 1, d, f),
            Status::Discrepancies => (v, d + 1, f),
            Status::Fatal => (v, d, f + 1),
        }
    });
    content.push_str(&format!(
        "summary: {} file(s), {} valid, {} with discrepancies, {} failed\n",
        outcomes.len(),
        valid,
        discrepant,
        failed
    ));
    for outcome in outcomes {
        let status = match &outcome.result {
            Ok(checked) => match (&checked.corrected, checked.remaining()) {
                (Some(_), 0) => format!("ok ({} correction(s))", checked.report.corrections().count()),
                (None, 0) => "ok".to_string(),
                (_, remaining) => format!("{} discrepancie(s)", remaining),
            },
            Err(e) => format!("failed: {}", e),
        };
        content.push_str(&format!("    {}: {}\n", outcome.path.display(), status));
    }
    content
}

fn outcome_json(outcome: &Outcome) -> serde_json::Value {
    let file = outcome.path.display().to_string();
    match &outcome.result {
        Ok(Checked {
            report,
            corrected: Some(corrected),
        }) => json!({
            "file": file,
            "corrected": corrected.display().to_string(),
            "corrections": report.corrections().collect::<Vec<_>>(),
            "remaining": report
                .discrepancies()
                .filter(|entry| !entry.correctable)
                .collect::<Vec<_>>(),
        }),
        Ok(Checked {
            report,
            corrected: None,
        }) => json!({
            "file": file,
            "discrepancies": report.has_discrepancies(),
            "entries": report.entries,
        }),
        Err(e) => json!({
            "file": file,
            "error": e.to_string(),
        }),
    }
}

pub fn batch_json(outcomes: &[Outcome]) -> Result<String, Error> {
    let content = json!({
        "files": outcomes.iter().map(outcome_json).collect::<Vec<_>>(),
        "status": status(outcomes) as i32,
    });
    Ok(serde_json::to_string_pretty(&content)?)
}

/// Renders the station timeline: sessions, changes and gaps
pub fn timeline(station: &str, timeline: &Timeline, cfg: &Config) -> String {
    let incomplete = timeline.incomplete(&cfg.required_devices);
    let mut content = format!("{}: {} session(s)\n", station, timeline.len());
    for session in timeline.sessions() {
        let flag = if incomplete.contains(&session) {
            let missing = cfg
                .required_devices
                .iter()
                .filter(|kind| !session.equipment.has(**kind))
                .join(", ");
            format!(" (missing {})", missing)
        } else {
            String::new()
        };
        let end = session
            .end
            .map(format_registry_datetime)
            .unwrap_or("..".to_string());
        let duration = session
            .duration()
            .map(|dt| format!(" ({})", dt))
            .unwrap_or_default();
        content.push_str(&format!(
            "{} -> {}{}{}\n",
            format_registry_datetime(session.start),
            end,
            duration,
            flag
        ));
        for kind in DeviceKind::ALL {
            if let Some(device) = session.equipment.device(kind) {
                content.push_str(&format!("    {}\n", device));
            }
        }
    }
    for (start, end) in timeline.gaps() {
        content.push_str(&format!(
            "gap: {} -> {}\n",
            format_registry_datetime(start),
            format_registry_datetime(end)
        ));
    }
    content
}

pub fn timeline_json(station: &str, timeline: &Timeline, cfg: &Config) -> Result<String, Error> {
    let content = json!({
        "station": station,
        "sessions": timeline.sessions(),
        "incomplete": timeline.incomplete(&cfg.required_devices),
        "changes": timeline.changes(),
        "gaps": timeline.gaps(),
    });
    Ok(serde_json::to_string_pretty(&content)?)
}
