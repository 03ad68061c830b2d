use clap::Parser;

/// Follows the vote tallies of each state across the revision history of a results document.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the settings of the tracker. Relative paths in this
    /// file are resolved against its directory. Values given on the command line take precedence.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, default '.') The git repository that holds the history of the document.
    #[clap(long, value_parser)]
    pub repository: Option<String>,

    /// (path, default 'results.json') The path of the results document inside the repository.
    #[clap(short, long, value_parser)]
    pub document: Option<String>,

    /// (directory, default '_cache') Where the parsed revisions are cached.
    #[clap(long, value_parser)]
    pub cache_dir: Option<String>,

    /// (integer) The cache schema version. Changing it forces all the revisions to be parsed again.
    #[clap(long, value_parser)]
    pub schema_version: Option<u32>,

    /// (number of votes, default 30000) The window of the hurdle moving average.
    #[clap(long, value_parser)]
    pub threshold: Option<u64>,

    /// (state name, repeatable) If specified, only these states are reported.
    #[clap(long, value_parser)]
    pub jurisdiction: Option<Vec<String>>,

    /// (file path, 'stdout' or empty) If specified, the JSON summary is written to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, every record of the timeline is written to this CSV file.
    #[clap(long, value_parser)]
    pub csv: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, the tracker checks that the
    /// summary it produces matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// Stop at the first revision that cannot be read instead of skipping it.
    #[clap(long, takes_value = false)]
    pub fail_fast: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
