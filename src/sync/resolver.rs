//! Identity resolution for a single document.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Document, PageMetadata, QualifiedId};
use crate::remote::{Page, RemoteClient};
use crate::sync::writer::write_qualified_id;

/// Outcome of resolving a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    pub metadata: PageMetadata,
    /// Set when the document received its marker in this call
    pub linked: bool,
}

/// Resolve the page a document is published to.
///
/// A document carrying an identity marker is looked up by ID and never
/// creates anything. Otherwise the page is found or created by title under
/// `parent`, and the new identity is written back into the file.
///
/// # Errors
///
/// Returns `Error::MissingParent` for an unmarked document without parent,
/// and propagates file and remote errors.
pub async fn resolve_page<C: RemoteClient>(
    client: &C,
    path: &Path,
    parent: Option<&QualifiedId>,
) -> Result<Resolved> {
    let text = fs::read_to_string(path)?;
    let document = Document::parse(&text);

    if let Some(id) = &document.qualified_id {
        let space_key = id.space_or(client.space_key());
        let page = client.get_page(&id.page_id, space_key).await?;
        debug!(path = %path.display(), id = %id, title = %page.title, "Found marked page");
        return Ok(Resolved {
            metadata: metadata_for(client, page, space_key),
            linked: false,
        });
    }

    let Some(parent) = parent else {
        return Err(Error::MissingParent {
            path: path.to_path_buf(),
        });
    };

    let title = match document.title() {
        Some(title) => title.to_string(),
        None => path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| Error::InvalidPath {
                path: path.to_path_buf(),
            })?
            .to_string(),
    };

    let space_key = parent.space_or(client.space_key());
    let page = client
        .get_or_create_page(&title, &parent.page_id, space_key)
        .await?;
    let metadata = metadata_for(client, page, space_key);

    let id = metadata.qualified_id();
    write_qualified_id(path, &text, &id)?;
    info!(path = %path.display(), id = %id, title = %metadata.title, "Linked document to page");

    Ok(Resolved {
        metadata,
        linked: true,
    })
}

fn metadata_for<C: RemoteClient>(client: &C, page: Page, requested_space: &str) -> PageMetadata {
    PageMetadata {
        domain: client.domain().to_string(),
        base_path: client.base_path().to_string(),
        page_id: page.id,
        space_key: page.space_key.unwrap_or_else(|| requested_space.to_string()),
        title: page.title,
    }
}
