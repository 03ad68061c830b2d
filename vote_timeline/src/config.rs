// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use snafu::Snafu;

/// The vote total of one candidate within one reporting unit.
///
/// Candidates are identified by the stable identifier of the source document,
/// never by their display name.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Serialize, Deserialize)]
pub struct CandidateVotes {
    pub id: String,
    pub votes: u64,
}

/// One jurisdiction's observation at one race update.
///
/// Records are immutable: they are assembled with [`crate::builder::RecordBuilder`]
/// and only read afterwards. The serialized form is the row format of the
/// snapshot cache. Fields added after the first cache schema carry serde
/// defaults so that older rows still decode.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    pub(crate) timestamp: DateTime<Utc>,
    pub(crate) unit_name: String,
    pub(crate) unit_abbrev: String,
    pub(crate) electoral_votes: u32,
    pub(crate) candidates: Vec<CandidateVotes>,
    pub(crate) total_votes: u64,
    pub(crate) expected_total_votes: u64,
    pub(crate) precincts_total: u32,
    pub(crate) precincts_reporting: u32,
    #[serde(default)]
    pub(crate) county_breakdown: BTreeMap<String, u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) hurdle_moving_average: Option<f64>,
}

impl Record {
    /// The update time of the race this record was read from.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn unit_name(&self) -> &str {
        &self.unit_name
    }

    pub fn unit_abbrev(&self) -> &str {
        &self.unit_abbrev
    }

    pub fn electoral_votes(&self) -> u32 {
        self.electoral_votes
    }

    /// The candidates, in the order of the source document.
    pub fn candidates(&self) -> &[CandidateVotes] {
        &self.candidates
    }

    pub fn total_votes(&self) -> u64 {
        self.total_votes
    }

    pub fn expected_total_votes(&self) -> u64 {
        self.expected_total_votes
    }

    pub fn precincts_total(&self) -> u32 {
        self.precincts_total
    }

    pub fn precincts_reporting(&self) -> u32 {
        self.precincts_reporting
    }

    /// Always empty for now: the source document is not read at the county level.
    pub fn county_breakdown(&self) -> &BTreeMap<String, u64> {
        &self.county_breakdown
    }

    /// The hurdle moving average of the trailing candidate at this point of the
    /// timeline, or `None` when it is unavailable.
    pub fn hurdle_moving_average(&self) -> Option<f64> {
        self.hurdle_moving_average
    }

    /// Returns a copy of this record carrying the given hurdle value.
    pub fn with_hurdle(self, hurdle_moving_average: Option<f64>) -> Record {
        Record {
            hurdle_moving_average,
            ..self
        }
    }

    pub fn candidate(&self, id: &str) -> Option<&CandidateVotes> {
        self.candidates.iter().find(|c| c.id == id)
    }

    /// The sum of the votes of all the candidates.
    ///
    /// This may differ from `total_votes`, which is copied as-is from the source.
    /// Saturates at `u64::MAX`.
    pub fn candidate_votes_total(&self) -> u64 {
        self.candidates
            .iter()
            .fold(0u64, |acc, c| acc.saturating_add(c.votes))
    }

    /// The candidates by decreasing number of votes. Ties keep the document order.
    pub fn ranked_candidates(&self) -> Vec<&CandidateVotes> {
        let mut ranked: Vec<&CandidateVotes> = self.candidates.iter().collect();
        ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
        ranked
    }

    pub fn leader(&self) -> Option<&CandidateVotes> {
        self.ranked_candidates().first().cloned()
    }

    /// The runner-up, if there are at least two candidates.
    pub fn trailing(&self) -> Option<&CandidateVotes> {
        self.ranked_candidates().get(1).cloned()
    }

    /// The lead of the leader over the trailing candidate (0 with fewer than two candidates).
    pub fn margin(&self) -> u64 {
        match (self.leader(), self.trailing()) {
            (Some(leader), Some(trailing)) => leader.votes - trailing.votes,
            _ => 0,
        }
    }

    /// The estimated number of votes still to be counted, if the source publishes an estimate.
    pub fn votes_remaining(&self) -> Option<u64> {
        if self.expected_total_votes > 0 {
            Some(self.expected_total_votes.saturating_sub(self.total_votes))
        } else {
            None
        }
    }

    pub fn precincts_reporting_ratio(&self) -> Option<f64> {
        if self.precincts_total > 0 {
            Some(self.precincts_reporting as f64 / self.precincts_total as f64)
        } else {
            None
        }
    }
}

/// The records of every jurisdiction, keyed by jurisdiction name.
/// Each sequence is in ascending timestamp order.
pub type Timeline = BTreeMap<String, Vec<Record>>;

// ******** Output data structures *********

/// Where the records of a revision came from.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum RevisionOrigin {
    /// Read back from the snapshot cache.
    Cached,
    /// Fetched and parsed during this run.
    Parsed,
}

#[derive(PartialEq, Debug, Clone)]
pub struct IngestedRevision {
    pub revision_id: String,
    pub origin: RevisionOrigin,
    pub records: Vec<Record>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ProcessedRevision {
    pub revision_id: String,
    pub origin: RevisionOrigin,
    pub record_count: usize,
}

/// A revision that could not be ingested and was left out of the timeline.
#[derive(Debug)]
pub struct SkippedRevision {
    pub revision_id: String,
    pub error: TimelineError,
}

/// The outcome of a pipeline run.
#[derive(Debug)]
pub struct TimelineReport {
    /// The annotated timeline, built from the processed revisions only.
    pub timeline: Timeline,
    /// The revisions that contributed to the timeline, in processing order.
    pub processed: Vec<ProcessedRevision>,
    /// The revisions that failed. Empty unless the history is partial.
    pub skipped: Vec<SkippedRevision>,
}

impl TimelineReport {
    pub fn is_partial(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn records(&self, jurisdiction: &str) -> &[Record] {
        self.timeline
            .get(jurisdiction)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

// ********* Errors **********

/// Failures of the external revision store.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SourceError {
    #[snafu(display("{document_path} does not exist at revision {revision_id}"))]
    DocumentNotFound {
        revision_id: String,
        document_path: String,
    },
    #[snafu(display("could not run {command}"))]
    Command {
        command: String,
        source: std::io::Error,
    },
    #[snafu(display("revision store unavailable: {message}"))]
    Unavailable { message: String },
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TimelineError {
    #[snafu(display("the results document could not be decoded"))]
    MalformedDocument { source: serde_json::Error },
    #[snafu(display("could not fetch revision {revision_id}"))]
    Fetch {
        revision_id: String,
        source: SourceError,
    },
    #[snafu(display("could not list the revisions of {document_path}"))]
    Listing {
        document_path: String,
        source: SourceError,
    },
    #[snafu(display("cache i/o error on {}", path.display()))]
    CacheIo {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("could not encode the cache entry of revision {revision_id}"))]
    CacheEncode {
        revision_id: String,
        source: serde_json::Error,
    },
    #[snafu(display("revision id {revision_id:?} cannot be used as a cache key"))]
    InvalidRevisionId { revision_id: String },
}

// ********* Configuration **********

/// The cache schema version. Bumping it invalidates every cache entry.
pub const DEFAULT_SCHEMA_VERSION: u32 = 2;

/// Size of the lookback window of the hurdle moving average, in votes.
pub const DEFAULT_HURDLE_THRESHOLD: u64 = 30_000;

/// Name and abbreviation given to reporting units that do not carry one.
pub const UNKNOWN_UNIT: &str = "Unknown";

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CacheConfig {
    pub directory: PathBuf,
    pub schema_version: u32,
}

impl CacheConfig {
    pub fn new(directory: impl Into<PathBuf>) -> CacheConfig {
        CacheConfig {
            directory: directory.into(),
            schema_version: DEFAULT_SCHEMA_VERSION,
        }
    }

    pub fn with_schema_version(self, schema_version: u32) -> CacheConfig {
        CacheConfig {
            schema_version,
            ..self
        }
    }
}

/// What a run does when one revision cannot be ingested.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum FailurePolicy {
    /// Leave the revision out and report it in [`TimelineReport::skipped`].
    SkipRevision,
    /// Stop the run with the error of the revision.
    Abort,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PipelineConfig {
    /// Path of the tracked document inside the revision store.
    pub document_path: String,
    pub cache: CacheConfig,
    pub hurdle_threshold: u64,
    pub failure_policy: FailurePolicy,
}

impl PipelineConfig {
    pub fn new(document_path: &str, cache_directory: impl Into<PathBuf>) -> PipelineConfig {
        PipelineConfig {
            document_path: document_path.to_string(),
            cache: CacheConfig::new(cache_directory),
            hurdle_threshold: DEFAULT_HURDLE_THRESHOLD,
            failure_policy: FailurePolicy::SkipRevision,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RecordBuilder;
    use chrono::TimeZone;

    fn record(candidates: &[(&str, u64)]) -> Record {
        let mut b = RecordBuilder::new("Georgia", Utc.with_ymd_and_hms(2020, 11, 4, 6, 0, 0).unwrap());
        for (id, votes) in candidates {
            b.add_candidate(id, *votes);
        }
        b.build()
    }

    #[test]
    fn leader_and_trailing_by_votes() {
        let r = record(&[("trumpd", 2400), ("bidenj", 2450), ("jorgensenj", 60)]);
        assert_eq!(r.leader().map(|c| c.id.as_str()), Some("bidenj"));
        assert_eq!(r.trailing().map(|c| c.id.as_str()), Some("trumpd"));
        assert_eq!(r.margin(), 50);
        assert_eq!(r.candidate_votes_total(), 4910);
    }

    #[test]
    fn ties_keep_document_order() {
        let r = record(&[("a", 10), ("b", 10)]);
        assert_eq!(r.leader().map(|c| c.id.as_str()), Some("a"));
        assert_eq!(r.trailing().map(|c| c.id.as_str()), Some("b"));
        assert_eq!(r.margin(), 0);
    }

    #[test]
    fn single_candidate_has_no_trailing() {
        let r = record(&[("a", 10)]);
        assert!(r.trailing().is_none());
        assert_eq!(r.margin(), 0);
    }

    #[test]
    fn votes_remaining_requires_an_estimate() {
        let r = RecordBuilder::new("Arizona", Utc.with_ymd_and_hms(2020, 11, 4, 6, 0, 0).unwrap())
            .total_votes(900)
            .build();
        assert_eq!(r.votes_remaining(), None);
        let r = RecordBuilder::new("Arizona", Utc.with_ymd_and_hms(2020, 11, 4, 6, 0, 0).unwrap())
            .total_votes(900)
            .expected_total_votes(1000)
            .precincts(3, 4)
            .build();
        assert_eq!(r.votes_remaining(), Some(100));
        assert_eq!(r.precincts_reporting_ratio(), Some(0.75));
    }

    #[test]
    fn older_rows_decode_with_defaults() {
        let row = r#"{"timestamp":"2020-11-04T06:00:00Z","unit_name":"Alaska","unit_abbrev":"AK",
            "electoral_votes":3,"candidates":[{"id":"trumpd","votes":10}],"total_votes":10,
            "expected_total_votes":0,"precincts_total":0,"precincts_reporting":0}"#;
        let r: Record = serde_json::from_str(row).unwrap();
        assert!(r.county_breakdown().is_empty());
        assert_eq!(r.hurdle_moving_average(), None);
        assert_eq!(r.unit_abbrev(), "AK");
    }
}
