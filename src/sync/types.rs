//! Run report types.

use std::path::PathBuf;

use serde::Serialize;

/// A document whose synchronization failed while the run kept going.
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    /// Local document path.
    pub path: PathBuf,
    /// Page the document is linked to.
    pub page_id: String,
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Statistics for one publishing run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct SyncReport {
    /// Documents resolved to a page during indexing.
    pub indexed: usize,
    /// Documents that received a new identity marker in this run.
    pub linked: usize,
    /// Documents whose page content was replaced.
    pub synchronized: usize,
    /// Attachments uploaded, including rendered diagrams.
    pub attachments: usize,
    /// Failures collected when continuing past errors.
    pub failures: Vec<SyncFailure>,
}

impl SyncReport {
    /// Returns true if every indexed document was synchronized.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.synchronized == self.indexed
    }
}
