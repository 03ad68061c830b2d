use log::debug;

use crate::config::*;

/// Merges the records of all the revisions into a timeline.
///
/// The records are sorted by timestamp with a stable sort, so records sharing
/// a timestamp stay in the order the revisions were given. Nothing is merged
/// or deduplicated: a record repeated by several revisions appears several times.
pub fn aggregate<I>(per_revision: I) -> Timeline
where
    I: IntoIterator<Item = Vec<Record>>,
{
    let mut all_records: Vec<Record> = per_revision.into_iter().flatten().collect();
    all_records.sort_by_key(|r| r.timestamp());

    let mut timeline = Timeline::new();
    for record in all_records {
        timeline
            .entry(record.unit_name().to_string())
            .or_insert_with(Vec::new)
            .push(record);
    }
    debug!(
        "aggregate: {} jurisdictions: {:?}",
        timeline.len(),
        timeline.iter().map(|(k, v)| (k, v.len())).collect::<Vec<_>>()
    );
    timeline
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::RecordBuilder;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 11, 5, hour, 0, 0).unwrap()
    }

    fn nevada(hour: u32, a: u64, b: u64) -> Record {
        RecordBuilder::new("Nevada", at(hour))
            .candidate("a", a)
            .candidate("b", b)
            .total_votes(a + b)
            .build()
    }

    #[test]
    fn keeps_both_observations_with_their_totals() {
        // The revisions come newest first, as a revision log lists them.
        let timeline = aggregate(vec![vec![nevada(12, 900, 600)], vec![nevada(10, 600, 400)]]);
        let nv = &timeline["Nevada"];
        assert_eq!(nv.len(), 2);
        assert_eq!(nv[0].total_votes(), 1000);
        assert_eq!(nv[1].total_votes(), 1500);
        assert_eq!(nv[1].candidates()[0].votes - nv[0].candidates()[0].votes, 300);
        assert_eq!(nv[1].candidates()[1].votes - nv[0].candidates()[1].votes, 200);
    }

    #[test]
    fn groups_by_jurisdiction_in_time_order() {
        let georgia = |hour| RecordBuilder::new("Georgia", at(hour)).build();
        let timeline = aggregate(vec![
            vec![georgia(8), nevada(3, 1, 1)],
            vec![nevada(9, 2, 2), georgia(1)],
            vec![],
        ]);
        assert_eq!(timeline.keys().collect::<Vec<_>>(), vec!["Georgia", "Nevada"]);
        for records in timeline.values() {
            assert!(records.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
        }
        assert_eq!(timeline["Georgia"][0].timestamp(), at(1));
    }

    #[test]
    fn equal_timestamps_keep_revision_order() {
        let timeline = aggregate(vec![vec![nevada(10, 5, 0)], vec![nevada(10, 7, 0)]]);
        let firsts: Vec<u64> = timeline["Nevada"]
            .iter()
            .map(|r| r.candidates()[0].votes)
            .collect();
        assert_eq!(firsts, vec![5, 7]);
    }

    #[test]
    fn duplicates_are_retained() {
        let timeline = aggregate(vec![vec![nevada(10, 5, 5)], vec![nevada(10, 5, 5)]]);
        assert_eq!(timeline["Nevada"].len(), 2);
        assert_eq!(timeline["Nevada"][0], timeline["Nevada"][1]);
    }
}
