//! The hurdle moving average.
//!
//! The hurdle rate is the share of the remaining votes that a trailing
//! candidate needs to close the gap. As a trend indicator, it is compared to
//! the share that candidate actually obtained among the most recent votes:
//! the moving average below, taken over a fixed number of votes.

use log::debug;

use crate::config::*;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct HurdleEstimator {
    threshold: u64,
}

impl Default for HurdleEstimator {
    fn default() -> Self {
        HurdleEstimator::new(DEFAULT_HURDLE_THRESHOLD)
    }
}

impl HurdleEstimator {
    /// `threshold` is the number of votes the moving average spans.
    pub fn new(threshold: u64) -> HurdleEstimator {
        HurdleEstimator { threshold }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// The share of the trailing candidate among the most recent `threshold` votes.
    ///
    /// Arguments:
    /// * `history` the earlier batches of the jurisdiction, most recent first
    /// * `newest_batch_votes` and `newest_batch_trailing_share` the batch the
    ///   average is anchored on, which is always counted in full
    /// * `trailing_candidate_id` the candidate to follow in the history
    ///
    /// The batches of the history are taken whole until the threshold would be
    /// exceeded, then only the needed fraction of the last one is taken. Each
    /// batch contributes the sum of its candidates' recorded votes: this is the
    /// total of the batch, not the votes added since the previous batch.
    ///
    /// Returns `None` when no vote at all was seen.
    pub fn estimate<'a, I>(
        &self,
        history: I,
        newest_batch_votes: u64,
        newest_batch_trailing_share: f64,
        trailing_candidate_id: &str,
    ) -> Option<f64>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let mut agg_votes: u64 = newest_batch_votes;
        let mut agg_trailing_votes: u64 =
            round_votes(newest_batch_trailing_share * newest_batch_votes as f64);

        let mut batches = history.into_iter();
        while agg_votes < self.threshold {
            let batch = match batches.next() {
                Some(b) => b,
                None => break,
            };
            let relevant_votes = batch.candidate_votes_total();
            if relevant_votes == 0 {
                continue;
            }
            let trailing_votes = batch
                .candidate(trailing_candidate_id)
                .map(|c| c.votes)
                .unwrap_or(0);
            let trailing_share = trailing_votes as f64 / relevant_votes as f64;

            if agg_votes.saturating_add(relevant_votes) > self.threshold {
                // Only the part of the batch that fills the window.
                let subset_pct = (self.threshold - agg_votes) as f64 / relevant_votes as f64;
                let subset_votes = round_votes(relevant_votes as f64 * subset_pct);
                let subset_trailing =
                    round_votes(trailing_share * relevant_votes as f64 * subset_pct);
                agg_votes = agg_votes.saturating_add(subset_votes);
                agg_trailing_votes = agg_trailing_votes.saturating_add(subset_trailing);
                break;
            }
            let batch_trailing = round_votes(trailing_share * relevant_votes as f64);
            agg_votes = agg_votes.saturating_add(relevant_votes);
            agg_trailing_votes = agg_trailing_votes.saturating_add(batch_trailing);
        }

        if agg_votes == 0 {
            None
        } else {
            Some(agg_trailing_votes as f64 / agg_votes as f64)
        }
    }
}

// Half away from zero. Negative and NaN values saturate to 0.
fn round_votes(votes: f64) -> u64 {
    votes.round() as u64
}

/// The hurdle moving average of `record`, given the records of the same
/// jurisdiction that precede it (oldest first).
///
/// The record is the newest batch and its runner-up is the trailing
/// candidate. A record with fewer than two candidates has no hurdle.
pub fn record_hurdle(
    record: &Record,
    earlier: &[Record],
    estimator: &HurdleEstimator,
) -> Option<f64> {
    let trailing = record.trailing()?;
    let newest_votes = record.candidate_votes_total();
    let newest_share = if newest_votes > 0 {
        trailing.votes as f64 / newest_votes as f64
    } else {
        0.0
    };
    estimator.estimate(earlier.iter().rev(), newest_votes, newest_share, &trailing.id)
}

/// Attaches the hurdle moving average to every record of the timeline.
///
/// Each record only looks at the records of its own jurisdiction that come
/// before it in the timeline.
pub fn annotate_hurdles(timeline: Timeline, estimator: &HurdleEstimator) -> Timeline {
    timeline
        .into_iter()
        .map(|(jurisdiction, records)| {
            let annotated: Vec<Record> = records
                .iter()
                .enumerate()
                .map(|(idx, record)| {
                    let hurdle = record_hurdle(record, &records[..idx], estimator);
                    record.clone().with_hurdle(hurdle)
                })
                .collect();
            debug!(
                "annotate_hurdles: {}: latest hurdle {:?}",
                jurisdiction,
                annotated.last().and_then(|r| r.hurdle_moving_average())
            );
            (jurisdiction, annotated)
        })
        .collect()
}
