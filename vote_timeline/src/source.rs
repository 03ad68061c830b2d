//! Access to the revision history of the tracked document.
//!
//! The history itself lives outside of this crate (typically a git
//! repository). It is reached through two traits: one to list the revisions
//! of a document, one to read the document at a given revision.

use std::collections::HashMap;

use crate::config::*;

pub trait RevisionLister {
    /// The revisions in which the document changed.
    ///
    /// The order is whatever the store provides and is not assumed to be chronological.
    fn list_revisions(&self, document_path: &str) -> Result<Vec<String>, SourceError>;
}

pub trait SnapshotFetcher {
    /// The raw content of the document at this revision.
    ///
    /// Fails with [`SourceError::DocumentNotFound`] if the document did not
    /// exist at that revision.
    fn fetch(&self, revision_id: &str, document_path: &str) -> Result<Vec<u8>, SourceError>;
}

/// A revision history held in memory.
///
/// Each commit gets an id derived from the SHA-256 digest of its parent, the
/// document path and the content, so ids are never reused for different
/// content. Revisions are listed newest first, as `git log` does.
#[derive(Debug, Clone, Default)]
pub struct MemoryRevisionStore {
    commits: Vec<MemoryCommit>,
    // revision id -> index in commits
    index: HashMap<String, usize>,
}

#[derive(Debug, Clone)]
struct MemoryCommit {
    id: String,
    document_path: String,
    // None when the commit removed the document.
    contents: Option<Vec<u8>>,
}

impl MemoryRevisionStore {
    pub fn new() -> MemoryRevisionStore {
        MemoryRevisionStore::default()
    }

    /// Records a new version of the document and returns its revision id.
    pub fn commit(&mut self, document_path: &str, contents: &[u8]) -> String {
        self.add_commit(document_path, Some(contents.to_vec()))
    }

    /// Records the removal of the document. Fetching the document at the
    /// returned revision fails.
    pub fn remove(&mut self, document_path: &str) -> String {
        self.add_commit(document_path, None)
    }

    fn add_commit(&mut self, document_path: &str, contents: Option<Vec<u8>>) -> String {
        let parent = self.commits.last().map(|c| c.id.as_str()).unwrap_or("");
        let content_digest = match &contents {
            Some(bytes) => sha256::digest(bytes.as_slice()),
            None => "removed".to_string(),
        };
        let id = sha256::digest(format!("{}\n{}\n{}", parent, document_path, content_digest));
        self.index.insert(id.clone(), self.commits.len());
        self.commits.push(MemoryCommit {
            id: id.clone(),
            document_path: document_path.to_string(),
            contents,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

impl RevisionLister for MemoryRevisionStore {
    fn list_revisions(&self, document_path: &str) -> Result<Vec<String>, SourceError> {
        Ok(self
            .commits
            .iter()
            .rev()
            .filter(|c| c.document_path == document_path)
            .map(|c| c.id.clone())
            .collect())
    }
}

impl SnapshotFetcher for MemoryRevisionStore {
    fn fetch(&self, revision_id: &str, document_path: &str) -> Result<Vec<u8>, SourceError> {
        let not_found = || SourceError::DocumentNotFound {
            revision_id: revision_id.to_string(),
            document_path: document_path.to_string(),
        };
        // Like git, the document as of a revision is its latest version up to that commit.
        let idx = *self.index.get(revision_id).ok_or_else(not_found)?;
        self.commits[..=idx]
            .iter()
            .rev()
            .find(|c| c.document_path == document_path)
            .and_then(|c| c.contents.clone())
            .ok_or_else(not_found)
    }
}
