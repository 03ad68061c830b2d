use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use vote_timeline::{
    CacheConfig, FailurePolicy, PipelineConfig, DEFAULT_HURDLE_THRESHOLD, DEFAULT_SCHEMA_VERSION,
};

use crate::args::Args;
use crate::tracker::*;

pub const DEFAULT_REPOSITORY: &str = ".";
pub const DEFAULT_DOCUMENT: &str = "results.json";
pub const DEFAULT_CACHE_DIRECTORY: &str = "_cache";

/// Passed to `--out` to print the summary instead of writing it to a file.
pub const STDOUT_TARGET: &str = "stdout";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "summaryPath")]
    pub summary_path: Option<String>,
    #[serde(rename = "csvPath")]
    pub csv_path: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub repository: Option<String>,
    #[serde(rename = "documentPath")]
    pub document_path: Option<String>,
    #[serde(rename = "cacheDirectory")]
    pub cache_directory: Option<String>,
    #[serde(rename = "schemaVersion")]
    pub schema_version: Option<u32>,
    #[serde(rename = "hurdleThreshold")]
    pub hurdle_threshold: Option<u64>,
    pub jurisdictions: Option<Vec<String>>,
    #[serde(rename = "outputSettings")]
    pub output_settings: Option<OutputSettings>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SummaryOutput {
    Stdout,
    File(PathBuf),
    Disabled,
}

/// The settings of one run, after merging the command line and the configuration file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub repository: PathBuf,
    pub document_path: String,
    pub cache_directory: PathBuf,
    pub schema_version: u32,
    pub hurdle_threshold: u64,
    pub jurisdictions: Option<Vec<String>>,
    pub summary: SummaryOutput,
    pub csv_path: Option<PathBuf>,
    pub reference_path: Option<PathBuf>,
    pub failure_policy: FailurePolicy,
}

impl Settings {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            document_path: self.document_path.clone(),
            cache: CacheConfig::new(self.cache_directory.clone())
                .with_schema_version(self.schema_version),
            hurdle_threshold: self.hurdle_threshold,
            failure_policy: self.failure_policy,
        }
    }
}

pub fn read_config(path: &Path) -> TrackerResult<TrackerConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read_config: {:?}", contents);
    let config: TrackerConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

/// Merges the command line with the configuration file.
///
/// Command line values win. Paths from the configuration file are relative to
/// `config_dir`, paths from the command line to the working directory.
pub fn resolve_settings(args: &Args, config: &TrackerConfig, config_dir: &Path) -> Settings {
    let from_config = |p: &Option<String>| p.as_ref().map(|s| config_dir.join(s));
    let output_settings = config.output_settings.clone().unwrap_or_default();

    let repository = args
        .repository
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| from_config(&config.repository))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPOSITORY));

    let cache_directory = args
        .cache_dir
        .as_ref()
        .map(PathBuf::from)
        .or_else(|| from_config(&config.cache_directory))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIRECTORY));

    let summary = match (&args.out, &output_settings.summary_path) {
        (Some(s), _) => summary_output(Path::new(""), s),
        (None, Some(s)) => summary_output(config_dir, s),
        (None, None) => SummaryOutput::Stdout,
    };

    let csv_path = match (&args.csv, &output_settings.csv_path) {
        (Some(s), _) if s.is_empty() => None,
        (Some(s), _) => Some(PathBuf::from(s)),
        (None, Some(s)) if s.is_empty() => None,
        (None, Some(s)) => Some(config_dir.join(s)),
        (None, None) => None,
    };

    Settings {
        repository,
        document_path: args
            .document
            .clone()
            .or_else(|| config.document_path.clone())
            .unwrap_or_else(|| DEFAULT_DOCUMENT.to_string()),
        cache_directory,
        schema_version: args
            .schema_version
            .or(config.schema_version)
            .unwrap_or(DEFAULT_SCHEMA_VERSION),
        hurdle_threshold: args
            .threshold
            .or(config.hurdle_threshold)
            .unwrap_or(DEFAULT_HURDLE_THRESHOLD),
        jurisdictions: args
            .jurisdiction
            .clone()
            .or_else(|| config.jurisdictions.clone()),
        summary,
        csv_path,
        reference_path: args.reference.as_ref().map(PathBuf::from),
        failure_policy: if args.fail_fast {
            FailurePolicy::Abort
        } else {
            FailurePolicy::SkipRevision
        },
    }
}

fn summary_output(dir: &Path, target: &str) -> SummaryOutput {
    match target {
        "" => SummaryOutput::Disabled,
        STDOUT_TARGET => SummaryOutput::Stdout,
        p => SummaryOutput::File(dir.join(p)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(extra: &[&str]) -> Args {
        let mut v = vec!["hurdle-tracker"];
        v.extend_from_slice(extra);
        Args::parse_from(v)
    }

    #[test]
    fn defaults_without_config() {
        let s = resolve_settings(&args(&[]), &TrackerConfig::default(), Path::new(""));
        assert_eq!(s.repository, PathBuf::from("."));
        assert_eq!(s.document_path, "results.json");
        assert_eq!(s.cache_directory, PathBuf::from("_cache"));
        assert_eq!(s.schema_version, DEFAULT_SCHEMA_VERSION);
        assert_eq!(s.hurdle_threshold, 30_000);
        assert_eq!(s.jurisdictions, None);
        assert_eq!(s.summary, SummaryOutput::Stdout);
        assert_eq!(s.csv_path, None);
        assert_eq!(s.failure_policy, FailurePolicy::SkipRevision);
    }

    #[test]
    fn config_paths_are_relative_to_config_dir() {
        let config: TrackerConfig = serde_json::from_str(
            r#"{
                "repository": "results-repo",
                "documentPath": "data/results.json",
                "cacheDirectory": "_cache",
                "hurdleThreshold": 20000,
                "jurisdictions": ["Nevada", "Georgia"],
                "outputSettings": {"summaryPath": "out/summary.json", "csvPath": "out/rows.csv"}
            }"#,
        )
        .unwrap();
        let s = resolve_settings(&args(&[]), &config, Path::new("/etc/tracker"));
        assert_eq!(s.repository, PathBuf::from("/etc/tracker/results-repo"));
        // The document path lives inside the repository and is left alone.
        assert_eq!(s.document_path, "data/results.json");
        assert_eq!(s.cache_directory, PathBuf::from("/etc/tracker/_cache"));
        assert_eq!(s.hurdle_threshold, 20_000);
        assert_eq!(
            s.jurisdictions,
            Some(vec!["Nevada".to_string(), "Georgia".to_string()])
        );
        assert_eq!(
            s.summary,
            SummaryOutput::File(PathBuf::from("/etc/tracker/out/summary.json"))
        );
        assert_eq!(s.csv_path, Some(PathBuf::from("/etc/tracker/out/rows.csv")));
    }

    #[test]
    fn command_line_overrides_config() {
        let config = TrackerConfig {
            hurdle_threshold: Some(20_000),
            schema_version: Some(3),
            jurisdictions: Some(vec!["Georgia".to_string()]),
            output_settings: Some(OutputSettings {
                summary_path: Some("summary.json".to_string()),
                csv_path: Some("rows.csv".to_string()),
            }),
            ..TrackerConfig::default()
        };
        let a = args(&[
            "--threshold",
            "1000",
            "--schema-version",
            "4",
            "--jurisdiction",
            "Nevada",
            "--jurisdiction",
            "Arizona",
            "--out",
            "stdout",
            "--csv",
            "",
            "--fail-fast",
        ]);
        let s = resolve_settings(&a, &config, Path::new("conf"));
        assert_eq!(s.hurdle_threshold, 1000);
        assert_eq!(s.schema_version, 4);
        assert_eq!(
            s.jurisdictions,
            Some(vec!["Nevada".to_string(), "Arizona".to_string()])
        );
        assert_eq!(s.summary, SummaryOutput::Stdout);
        assert_eq!(s.csv_path, None);
        assert_eq!(s.failure_policy, FailurePolicy::Abort);
    }

    #[test]
    fn empty_out_disables_summary() {
        let s = resolve_settings(
            &args(&["--out", ""]),
            &TrackerConfig::default(),
            Path::new(""),
        );
        assert_eq!(s.summary, SummaryOutput::Disabled);
    }

    #[test]
    fn pipeline_config_carries_settings() {
        let s = resolve_settings(
            &args(&["--cache-dir", "/tmp/c", "--schema-version", "5", "--threshold", "12"]),
            &TrackerConfig::default(),
            Path::new(""),
        );
        let p = s.pipeline_config();
        assert_eq!(p.document_path, "results.json");
        assert_eq!(p.cache.directory, PathBuf::from("/tmp/c"));
        assert_eq!(p.cache.schema_version, 5);
        assert_eq!(p.hurdle_threshold, 12);
    }

    #[test]
    fn read_config_reports_missing_file() {
        let res = read_config(Path::new("/nonexistent/tracker.json"));
        assert!(matches!(res, Err(TrackerError::OpeningJson { .. })));
    }

    #[test]
    fn unknown_keys_are_ignored_mistyped_values_are_not() {
        let ok: Result<TrackerConfig, _> = serde_json::from_str(r#"{"comment": "x"}"#);
        assert!(ok.is_ok());
        let bad: Result<TrackerConfig, _> = serde_json::from_str(r#"{"hurdleThreshold": "x"}"#);
        assert!(bad.is_err());
    }
}
