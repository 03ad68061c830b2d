use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

pub use crate::config::*;

/// A builder for records.
///
/// The parser goes through the builder, and so should any code that needs to
/// produce records by hand (tests, alternative document readers).
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use vote_timeline::builder::RecordBuilder;
///
/// let record = RecordBuilder::new("Nevada", Utc.with_ymd_and_hms(2020, 11, 5, 12, 0, 0).unwrap())
///     .abbrev("NV")
///     .electoral_votes(6)
///     .candidate("bidenj", 600)
///     .candidate("trumpd", 400)
///     .total_votes(1000)
///     .build();
///
/// assert_eq!(record.margin(), 200);
/// assert_eq!(record.trailing().unwrap().id, "trumpd");
/// ```
pub struct RecordBuilder {
    pub(crate) _timestamp: DateTime<Utc>,
    pub(crate) _unit_name: String,
    pub(crate) _unit_abbrev: String,
    pub(crate) _electoral_votes: u32,
    pub(crate) _candidates: Vec<CandidateVotes>,
    pub(crate) _total_votes: u64,
    pub(crate) _expected_total_votes: u64,
    pub(crate) _precincts_total: u32,
    pub(crate) _precincts_reporting: u32,
}

impl RecordBuilder {
    /// Starts a record for the given jurisdiction. All the counts start at zero
    /// and the abbreviation is [`UNKNOWN_UNIT`].
    pub fn new(unit_name: &str, timestamp: DateTime<Utc>) -> RecordBuilder {
        RecordBuilder {
            _timestamp: timestamp,
            _unit_name: unit_name.to_string(),
            _unit_abbrev: UNKNOWN_UNIT.to_string(),
            _electoral_votes: 0,
            _candidates: Vec::new(),
            _total_votes: 0,
            _expected_total_votes: 0,
            _precincts_total: 0,
            _precincts_reporting: 0,
        }
    }

    pub fn abbrev(self, unit_abbrev: &str) -> RecordBuilder {
        RecordBuilder {
            _unit_abbrev: unit_abbrev.to_string(),
            ..self
        }
    }

    pub fn electoral_votes(self, electoral_votes: u32) -> RecordBuilder {
        RecordBuilder {
            _electoral_votes: electoral_votes,
            ..self
        }
    }

    pub fn candidate(mut self, id: &str, votes: u64) -> RecordBuilder {
        self.add_candidate(id, votes);
        self
    }

    /// Adds a candidate after the ones already added.
    ///
    /// Identifiers do not need to be unique or non-empty: the source document
    /// is trusted as it is.
    pub fn add_candidate(&mut self, id: &str, votes: u64) {
        self._candidates.push(CandidateVotes {
            id: id.to_string(),
            votes,
        });
    }

    pub fn total_votes(self, total_votes: u64) -> RecordBuilder {
        RecordBuilder {
            _total_votes: total_votes,
            ..self
        }
    }

    pub fn expected_total_votes(self, expected_total_votes: u64) -> RecordBuilder {
        RecordBuilder {
            _expected_total_votes: expected_total_votes,
            ..self
        }
    }

    pub fn precincts(self, reporting: u32, total: u32) -> RecordBuilder {
        RecordBuilder {
            _precincts_reporting: reporting,
            _precincts_total: total,
            ..self
        }
    }

    pub fn build(self) -> Record {
        Record {
            timestamp: self._timestamp,
            unit_name: self._unit_name,
            unit_abbrev: self._unit_abbrev,
            electoral_votes: self._electoral_votes,
            candidates: self._candidates,
            total_votes: self._total_votes,
            expected_total_votes: self._expected_total_votes,
            precincts_total: self._precincts_total,
            precincts_reporting: self._precincts_reporting,
            county_breakdown: BTreeMap::new(),
            hurdle_moving_average: None,
        }
    }
}
