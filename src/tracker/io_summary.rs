// The JSON summary of a run.

use std::fs;
use std::path::Path;

use chrono::SecondsFormat;
use log::{debug, warn};
use serde_json::json;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use vote_timeline::{Record, SkippedRevision, Timeline};

use crate::tracker::config_reader::Settings;
use crate::tracker::*;

/// Keeps the requested jurisdictions. `None` keeps them all.
pub fn filter_jurisdictions(timeline: &Timeline, names: Option<&[String]>) -> Timeline {
    match names {
        None => timeline.clone(),
        Some(names) => {
            for name in names.iter() {
                if !timeline.contains_key(name) {
                    warn!("filter_jurisdictions: no record for {:?}", name);
                }
            }
            timeline
                .iter()
                .filter(|(name, _)| names.contains(*name))
                .map(|(name, records)| (name.clone(), records.clone()))
                .collect()
        }
    }
}

fn record_to_json(r: &Record) -> JSValue {
    json!({
        "timestamp": r.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true),
        "leader": r.leader().map(|c| c.id.clone()),
        "trailing": r.trailing().map(|c| c.id.clone()),
        "margin": r.margin().to_string(),
        "totalVotes": r.total_votes().to_string(),
        "votesRemaining": r.votes_remaining().map(|v| v.to_string()),
        "precinctsReporting": r.precincts_reporting().to_string(),
        "precinctsTotal": r.precincts_total().to_string(),
        "hurdle": r.hurdle_moving_average(),
    })
}

pub fn build_summary_js(
    settings: &Settings,
    timeline: &Timeline,
    skipped: &[SkippedRevision],
) -> JSValue {
    let config = json!({
        "documentPath": settings.document_path,
        "schemaVersion": settings.schema_version.to_string(),
        "hurdleThreshold": settings.hurdle_threshold.to_string(),
    });

    let skipped_js: Vec<JSValue> = skipped
        .iter()
        .map(|s| json!({"revision": s.revision_id, "error": s.error.to_string()}))
        .collect();

    let mut jurisdictions: Vec<JSValue> = Vec::new();
    for (name, records) in timeline.iter() {
        // The abbreviation and electoral votes of the latest record are reported.
        let last = records.last();
        jurisdictions.push(json!({
            "name": name,
            "abbrev": last.map(|r| r.unit_abbrev()),
            "electoralVotes": last.map(|r| r.electoral_votes().to_string()),
            "rows": records.iter().map(record_to_json).collect::<Vec<JSValue>>(),
        }));
    }

    json!({
        "config": config,
        "skipped": skipped_js,
        "jurisdictions": jurisdictions,
    })
}

pub fn read_summary(path: &Path) -> TrackerResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_summary: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;
    use vote_timeline::builder::RecordBuilder;
    use vote_timeline::{FailurePolicy, SourceError, TimelineError};

    fn settings() -> Settings {
        Settings {
            repository: PathBuf::from("."),
            document_path: "results.json".to_string(),
            cache_directory: PathBuf::from("_cache"),
            schema_version: 2,
            hurdle_threshold: 30_000,
            jurisdictions: None,
            summary: SummaryOutput::Disabled,
            csv_path: None,
            reference_path: None,
            failure_policy: FailurePolicy::SkipRevision,
        }
    }

    fn timeline() -> Timeline {
        let t = Utc.with_ymd_and_hms(2020, 11, 5, 14, 30, 0).unwrap();
        let nevada = RecordBuilder::new("Nevada", t)
            .abbrev("NV")
            .electoral_votes(6)
            .candidate("bidenj", 900)
            .candidate("trumpd", 600)
            .total_votes(1500)
            .expected_total_votes(3000)
            .precincts(50, 100)
            .build()
            .with_hurdle(Some(0.4));
        let georgia = RecordBuilder::new("Georgia", t).build();
        let mut timeline = Timeline::new();
        timeline.insert("Nevada".to_string(), vec![nevada]);
        timeline.insert("Georgia".to_string(), vec![georgia]);
        timeline
    }

    #[test]
    fn summary_shape() {
        let skipped = vec![SkippedRevision {
            revision_id: "abc123".to_string(),
            error: TimelineError::Fetch {
                revision_id: "abc123".to_string(),
                source: SourceError::Unavailable {
                    message: "timeout".to_string(),
                },
            },
        }];
        let js = build_summary_js(&settings(), &timeline(), &skipped);
        assert_eq!(
            js["config"],
            json!({"documentPath": "results.json", "schemaVersion": "2", "hurdleThreshold": "30000"})
        );
        assert_eq!(js["skipped"][0]["revision"], json!("abc123"));
        assert_eq!(
            js["skipped"][0]["error"],
            json!("could not fetch revision abc123")
        );
        let nevada = &js["jurisdictions"][1];
        assert_eq!(nevada["name"], json!("Nevada"));
        assert_eq!(nevada["abbrev"], json!("NV"));
        assert_eq!(nevada["electoralVotes"], json!("6"));
        assert_eq!(
            nevada["rows"][0],
            json!({
                "timestamp": "2020-11-05T14:30:00Z",
                "leader": "bidenj",
                "trailing": "trumpd",
                "margin": "300",
                "totalVotes": "1500",
                "votesRemaining": "1500",
                "precinctsReporting": "50",
                "precinctsTotal": "100",
                "hurdle": 0.4
            })
        );
    }

    #[test]
    fn empty_record_renders_nulls() {
        let js = build_summary_js(&settings(), &timeline(), &[]);
        let georgia = &js["jurisdictions"][0];
        assert_eq!(georgia["abbrev"], json!("Unknown"));
        let row = &georgia["rows"][0];
        assert_eq!(row["leader"], JSValue::Null);
        assert_eq!(row["trailing"], JSValue::Null);
        assert_eq!(row["votesRemaining"], JSValue::Null);
        assert_eq!(row["hurdle"], JSValue::Null);
    }

    #[test]
    fn filter_keeps_requested_names() {
        let t = timeline();
        assert_eq!(filter_jurisdictions(&t, None), t);
        let only = filter_jurisdictions(&t, Some(&["Nevada".to_string(), "Ohio".to_string()][..]));
        assert_eq!(only.keys().collect::<Vec<_>>(), vec!["Nevada"]);
    }
}
