//! Remote services.
//!
//! - [`RemoteClient`] - page CRUD and attachment upload, implemented by
//!   [`ConfluenceClient`] over the Confluence REST API
//! - [`KrokiClient`] - renders Mermaid diagrams to PNG
//!
//! Every page operation takes the space key explicitly. There is no
//! "current space" session state to switch and restore.

pub mod confluence;
pub mod kroki;

#[cfg(test)]
pub(crate) mod fake;

pub use confluence::ConfluenceClient;
pub use kroki::KrokiClient;

use std::future::Future;
use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// A page as returned by the remote wiki.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub id: String,
    pub title: String,
    pub space_key: Option<String>,
    pub version: Option<u64>,
}

/// Attachment payload: a file on disk or bytes produced in memory.
#[derive(Debug, Clone, Copy)]
pub enum AttachmentData<'a> {
    File(&'a Path),
    Bytes(&'a [u8]),
}

impl AttachmentData<'_> {
    /// Load the payload into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if a file payload cannot be read.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => Ok(std::fs::read(path)?),
            Self::Bytes(bytes) => Ok(bytes.to_vec()),
        }
    }
}

/// Trait for remote wiki clients.
///
/// Implemented by [`ConfluenceClient`]; tests use an in-memory fake.
pub trait RemoteClient: Send + Sync {
    /// Wiki host name, e.g. `example.atlassian.net`.
    fn domain(&self) -> &str;

    /// Wiki base path, e.g. `/wiki/`.
    fn base_path(&self) -> &str;

    /// Default space for pages whose identity carries no space key.
    fn space_key(&self) -> &str;

    /// Fetch a page by ID.
    fn get_page(
        &self,
        page_id: &str,
        space_key: &str,
    ) -> impl Future<Output = Result<Page>> + Send;

    /// Return the page titled `title` in the space, creating it under
    /// `parent_id` if it does not exist yet.
    fn get_or_create_page(
        &self,
        title: &str,
        parent_id: &str,
        space_key: &str,
    ) -> impl Future<Output = Result<Page>> + Send;

    /// Replace the full storage-format content of a page.
    fn update_page(
        &self,
        page_id: &str,
        space_key: &str,
        content: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Create or replace the attachment `name` on a page.
    fn upload_attachment(
        &self,
        page_id: &str,
        space_key: &str,
        name: &str,
        data: AttachmentData<'_>,
    ) -> impl Future<Output = Result<()>> + Send;
}
