// Reads the history of the results document from a git repository, through the git command line.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use log::debug;
use snafu::prelude::*;
use vote_timeline::{
    CommandSnafu, DocumentNotFoundSnafu, RevisionLister, SnapshotFetcher, SourceError,
    UnavailableSnafu,
};

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GitRevisionStore {
    repository: PathBuf,
}

impl GitRevisionStore {
    pub fn new(repository: impl Into<PathBuf>) -> GitRevisionStore {
        GitRevisionStore {
            repository: repository.into(),
        }
    }

    pub fn repository(&self) -> &Path {
        self.repository.as_path()
    }

    fn git(&self, args: &[&str]) -> Result<Output, SourceError> {
        debug!("git: {:?} in {:?}", args, self.repository);
        Command::new("git")
            .arg("-C")
            .arg(&self.repository)
            .args(args)
            .output()
            .context(CommandSnafu {
                command: format!("git {}", args.join(" ")),
            })
    }
}

/// One revision id per line, as printed by `git log --format=%H`.
pub fn parse_revision_list(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.to_string())
        .collect()
}

/// Turns the error output of a failed `git show` into a [`SourceError`].
pub fn classify_show_failure(revision_id: &str, document_path: &str, stderr: &str) -> SourceError {
    if stderr.contains("does not exist") || stderr.contains("exists on disk, but not in") {
        DocumentNotFoundSnafu {
            revision_id,
            document_path,
        }
        .build()
    } else {
        UnavailableSnafu {
            message: stderr.trim(),
        }
        .build()
    }
}

impl RevisionLister for GitRevisionStore {
    fn list_revisions(&self, document_path: &str) -> Result<Vec<String>, SourceError> {
        let output = self.git(&["log", "--format=%H", "--", document_path])?;
        if !output.status.success() {
            return UnavailableSnafu {
                message: String::from_utf8_lossy(&output.stderr).trim(),
            }
            .fail();
        }
        let revisions = parse_revision_list(&String::from_utf8_lossy(&output.stdout));
        debug!(
            "list_revisions: {} revisions of {}",
            revisions.len(),
            document_path
        );
        Ok(revisions)
    }
}

impl SnapshotFetcher for GitRevisionStore {
    fn fetch(&self, revision_id: &str, document_path: &str) -> Result<Vec<u8>, SourceError> {
        let object = format!("{}:{}", revision_id, document_path);
        let output = self.git(&["show", object.as_str()])?;
        if output.status.success() {
            Ok(output.stdout)
        } else {
            Err(classify_show_failure(
                revision_id,
                document_path,
                &String::from_utf8_lossy(&output.stderr),
            ))
        }
    }
}
