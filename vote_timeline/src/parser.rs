//! Decoding of one revision of the results document.
//!
//! The document is a collection of races, each one carrying its update time
//! and the reporting units (states) with their candidate totals. Every field
//! is optional: missing values get a default here and never travel further.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value as JSValue;
use snafu::ResultExt;

use crate::builder::RecordBuilder;
use crate::config::*;

#[derive(Debug, Clone, Deserialize)]
struct ResultsDocument {
    races: Option<Vec<Race>>,
}

// Below the list of races, a value of the wrong type is treated as missing.
#[derive(Debug, Clone, Deserialize)]
struct Race {
    #[serde(default, deserialize_with = "lenient")]
    updated_at: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    electoral_votes: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    reporting_units: Option<Vec<ReportingUnit>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ReportingUnit {
    #[serde(default, deserialize_with = "lenient")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    state_abb: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    electoral_votes: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    candidates: Option<Vec<UnitCandidate>>,
    #[serde(default, deserialize_with = "lenient")]
    total_votes: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    total_expected_vote: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    precincts_total: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    precincts_reporting: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct UnitCandidate {
    #[serde(default, deserialize_with = "lenient")]
    nyt_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    votes: Option<CandidateTally>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateTally {
    #[serde(default, deserialize_with = "lenient")]
    total: Option<u64>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = JSValue::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    match serde_json::from_value::<T>(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            debug!("lenient: ignoring field of the wrong type: {}", e);
            Ok(None)
        }
    }
}

/// Reads all the records of one raw document: one record per reporting unit
/// and per race.
///
/// Fails only if the bytes are not a document at all: invalid JSON, a root
/// that is not an object, or `races` that is not a list. Any other value of
/// the wrong type is read as missing.
pub fn parse_document(raw: &[u8]) -> Result<Vec<Record>, TimelineError> {
    let document: ResultsDocument =
        serde_json::from_slice(raw).context(MalformedDocumentSnafu {})?;

    let mut records: Vec<Record> = Vec::new();
    for (race_idx, race) in document.races.unwrap_or_default().into_iter().enumerate() {
        let timestamp = parse_update_time(race_idx, race.updated_at.as_deref());
        for unit in race.reporting_units.unwrap_or_default() {
            let mut builder =
                RecordBuilder::new(unit.name.as_deref().unwrap_or(UNKNOWN_UNIT), timestamp)
                    .abbrev(unit.state_abb.as_deref().unwrap_or(UNKNOWN_UNIT))
                    .electoral_votes(
                        unit.electoral_votes
                            .or(race.electoral_votes)
                            .unwrap_or(0),
                    )
                    .total_votes(unit.total_votes.unwrap_or(0))
                    .expected_total_votes(unit.total_expected_vote.unwrap_or(0))
                    .precincts(
                        unit.precincts_reporting.unwrap_or(0),
                        unit.precincts_total.unwrap_or(0),
                    );
            for c in unit.candidates.unwrap_or_default() {
                let votes = c.votes.and_then(|v| v.total).unwrap_or(0);
                builder.add_candidate(c.nyt_id.as_deref().unwrap_or(""), votes);
            }
            records.push(builder.build());
        }
    }
    debug!("parse_document: {} records", records.len());
    Ok(records)
}

// The update time is normally RFC 3339. Local times without an offset are
// read as UTC. Anything else falls back to the Unix epoch.
fn parse_update_time(race_idx: usize, raw: Option<&str>) -> DateTime<Utc> {
    let s = match raw {
        Some(s) => s,
        None => {
            warn!(
                "parse_update_time: race {} has no update time, using the epoch",
                race_idx
            );
            return DateTime::<Utc>::default();
        }
    };
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return ts.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Utc.from_utc_datetime(&naive);
    }
    warn!(
        "parse_update_time: race {}: could not understand update time {:?}, using the epoch",
        race_idx, s
    );
    DateTime::<Utc>::default()
}
