use log::{debug, info, warn};
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value as JSValue;
use text_diff::print_diff;
use vote_timeline::*;

use crate::args::Args;
use crate::tracker::config_reader::*;
use crate::tracker::io_csv::write_timeline_csv_file;
use crate::tracker::io_git::GitRevisionStore;
use crate::tracker::io_summary::*;

mod config_reader;
mod io_csv;
mod io_git;
mod io_summary;

#[derive(Debug, Snafu)]
pub enum TrackerError {
    #[snafu(display("Error opening file {}", path.display()))]
    OpeningJson {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing file {}", path.display()))]
    WritingOutput {
        source: std::io::Error,
        path: PathBuf,
    },
    #[snafu(display("Error writing CSV"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Error building the timeline"))]
    Timeline { source: TimelineError },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TrackerResult<T> = Result<T, TrackerError>;

pub fn run_tracker(args: &Args) -> TrackerResult<()> {
    let (config, config_dir) = match &args.config {
        Some(config_path) => {
            let config_p = Path::new(config_path.as_str());
            let config = read_config(config_p)?;
            info!("run_tracker: config: {:?}", config);
            let config_dir = config_p
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, config_dir)
        }
        None => (TrackerConfig::default(), PathBuf::new()),
    };
    let settings = resolve_settings(args, &config, &config_dir);
    info!("run_tracker: settings: {:?}", settings);

    let store = GitRevisionStore::new(settings.repository.clone());
    info!("run_tracker: reading history from {:?}", store.repository());
    run_with_source(&settings, &store, &store)?;
    Ok(())
}

/// Builds the timeline from the given revision store and writes all the outputs.
///
/// Returns the summary that was written.
pub fn run_with_source<L, F>(settings: &Settings, lister: &L, fetcher: &F) -> TrackerResult<JSValue>
where
    L: RevisionLister + ?Sized,
    F: SnapshotFetcher + ?Sized,
{
    let pipeline = Pipeline::new(settings.pipeline_config());
    let report = pipeline.run(lister, fetcher).context(TimelineSnafu {})?;
    info!(
        "run_with_source: {} revisions processed, {} skipped, {} jurisdictions",
        report.processed.len(),
        report.skipped.len(),
        report.timeline.len()
    );
    for skipped in report.skipped.iter() {
        warn!(
            "run_with_source: revision {} left out: {}",
            skipped.revision_id, skipped.error
        );
    }

    let timeline = filter_jurisdictions(&report.timeline, settings.jurisdictions.as_deref());

    if let Some(csv_path) = &settings.csv_path {
        write_timeline_csv_file(csv_path, &timeline)?;
        info!("run_with_source: CSV written to {:?}", csv_path);
    }

    let summary_js = build_summary_js(settings, &timeline, &report.skipped);
    let pretty_js_summary =
        serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    match &settings.summary {
        SummaryOutput::Stdout => {
            println!("{}", pretty_js_summary);
        }
        SummaryOutput::File(path) => {
            fs::write(path, pretty_js_summary.as_bytes())
                .context(WritingOutputSnafu { path })?;
            info!("run_with_source: summary written to {:?}", path);
        }
        SummaryOutput::Disabled => {
            debug!("run_with_source: summary not written");
        }
    }

    // The reference summary, if provided for comparison
    if let Some(reference_p) = &settings.reference_path {
        let summary_ref = read_summary(reference_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_summary {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
    }

    Ok(summary_js)
}
