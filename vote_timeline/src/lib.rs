/*!
Per-jurisdiction vote timelines built from the revision history of a results
document, and the hurdle moving average of the trailing candidate.

The entry point is [`Pipeline`]: given something that lists the revisions of
the document and something that reads the document at one revision, it
produces a [`TimelineReport`]. Every stage is also usable on its own:
[`parse_document`], [`SnapshotCache`], [`aggregate`] and [`HurdleEstimator`].

```
use vote_timeline::*;

let mut store = MemoryRevisionStore::new();
store.commit("results.json", br#"{"races": [{"updated_at": "2020-11-05T10:00:00Z",
    "reporting_units": [{"name": "Nevada", "candidates": [
        {"nyt_id": "bidenj", "votes": {"total": 600}},
        {"nyt_id": "trumpd", "votes": {"total": 400}}]}]}]}"#);

let cache_dir = std::env::temp_dir().join("vote_timeline_doc");
let report = Pipeline::new(PipelineConfig::new("results.json", cache_dir))
    .run(&store, &store)?;

assert_eq!(report.timeline["Nevada"].len(), 1);
assert_eq!(report.timeline["Nevada"][0].hurdle_moving_average(), Some(0.4));
# Ok::<(), TimelineError>(())
```

See the [`manual`] for the document and cache formats.
*/

pub mod aggregate;
pub mod builder;
pub mod cache;
mod config;
pub mod hurdle;
pub mod manual;
pub mod parser;
pub mod pipeline;
pub mod source;

pub use crate::aggregate::aggregate;
pub use crate::cache::SnapshotCache;
pub use crate::config::*;
pub use crate::hurdle::{annotate_hurdles, record_hurdle, HurdleEstimator};
pub use crate::parser::parse_document;
pub use crate::pipeline::{ingest_revision, Pipeline};
pub use crate::source::{MemoryRevisionStore, RevisionLister, SnapshotFetcher};
