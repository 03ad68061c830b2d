use log::{debug, info, warn};
use snafu::ResultExt;

use crate::aggregate::aggregate;
use crate::cache::SnapshotCache;
use crate::config::*;
use crate::hurdle::{annotate_hurdles, HurdleEstimator};
use crate::parser::parse_document;
use crate::source::{RevisionLister, SnapshotFetcher};

/// Reads the records of one revision, from the cache if possible.
///
/// On a miss, the document is fetched, parsed and written back to the cache.
/// A failed write-back only loses the cache entry: the records are returned
/// all the same.
pub fn ingest_revision<F>(
    revision_id: &str,
    document_path: &str,
    fetcher: &F,
    cache: &SnapshotCache,
) -> Result<IngestedRevision, TimelineError>
where
    F: SnapshotFetcher + ?Sized,
{
    if let Some(records) = cache.get(revision_id) {
        debug!(
            "ingest_revision: {}: {} records from the cache",
            revision_id,
            records.len()
        );
        return Ok(IngestedRevision {
            revision_id: revision_id.to_string(),
            origin: RevisionOrigin::Cached,
            records,
        });
    }

    let raw = fetcher
        .fetch(revision_id, document_path)
        .context(FetchSnafu { revision_id })?;
    let records = parse_document(&raw)?;
    debug!(
        "ingest_revision: {}: parsed {} records from {} bytes",
        revision_id,
        records.len(),
        raw.len()
    );
    if let Err(e) = cache.put(revision_id, &records) {
        warn!(
            "ingest_revision: {}: could not write the cache entry: {}",
            revision_id, e
        );
    }
    Ok(IngestedRevision {
        revision_id: revision_id.to_string(),
        origin: RevisionOrigin::Parsed,
        records,
    })
}

/// Builds the annotated timeline of a document from its whole revision history.
pub struct Pipeline {
    config: PipelineConfig,
    cache: SnapshotCache,
    estimator: HurdleEstimator,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Pipeline {
        let cache = SnapshotCache::new(config.cache.clone());
        let estimator = HurdleEstimator::new(config.hurdle_threshold);
        Pipeline {
            config,
            cache,
            estimator,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn estimator(&self) -> &HurdleEstimator {
        &self.estimator
    }

    /// Lists the revisions, ingests them in the listed order and assembles the timeline.
    ///
    /// Records are ordered by their timestamp only. Records with equal
    /// timestamps keep the listing order, so with a newest-first lister (like
    /// `git log`) the record of the latest revision comes first.
    ///
    /// A listing failure stops the run. A revision that fails is handled
    /// according to the failure policy: left out and reported in
    /// [`TimelineReport::skipped`], or returned as the error of the run.
    pub fn run<L, F>(&self, lister: &L, fetcher: &F) -> Result<TimelineReport, TimelineError>
    where
        L: RevisionLister + ?Sized,
        F: SnapshotFetcher + ?Sized,
    {
        let document_path = self.config.document_path.as_str();
        let revision_ids = lister
            .list_revisions(document_path)
            .context(ListingSnafu { document_path })?;
        info!(
            "run: {} revisions of {} (cache schema version {})",
            revision_ids.len(),
            document_path,
            self.config.cache.schema_version
        );

        let mut per_revision: Vec<Vec<Record>> = Vec::new();
        let mut processed: Vec<ProcessedRevision> = Vec::new();
        let mut skipped: Vec<SkippedRevision> = Vec::new();
        for revision_id in revision_ids {
            match ingest_revision(&revision_id, document_path, fetcher, &self.cache) {
                Ok(ingested) => {
                    processed.push(ProcessedRevision {
                        revision_id: ingested.revision_id,
                        origin: ingested.origin,
                        record_count: ingested.records.len(),
                    });
                    per_revision.push(ingested.records);
                }
                Err(error) if self.config.failure_policy == FailurePolicy::SkipRevision => {
                    warn!("run: skipping revision {}: {}", revision_id, error);
                    skipped.push(SkippedRevision { revision_id, error });
                }
                Err(error) => return Err(error),
            }
        }

        let cached = processed
            .iter()
            .filter(|p| p.origin == RevisionOrigin::Cached)
            .count();
        info!(
            "run: {} revisions processed ({} from the cache), {} skipped",
            processed.len(),
            cached,
            skipped.len()
        );

        let timeline = annotate_hurdles(aggregate(per_revision), &self.estimator);
        Ok(TimelineReport {
            timeline,
            processed,
            skipped,
        })
    }
}
