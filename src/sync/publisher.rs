//! Two-phase publishing of a file or directory tree.

use std::fs;
use std::path::Path;

use tracing::{error, info};

use crate::convert::{Converter, ConverterOptions};
use crate::error::{Error, Result};
use crate::matcher::MatcherOptions;
use crate::model::{IdentityMap, QualifiedId};
use crate::remote::{KrokiClient, RemoteClient};
use crate::sync::indexer::{DirectoryIndex, Indexer};
use crate::sync::resolver::resolve_page;
use crate::sync::synchronizer::PageSynchronizer;
use crate::sync::types::{SyncFailure, SyncReport};

/// Options of a publishing run.
#[derive(Debug, Clone, Default)]
pub struct PublishOptions {
    /// Parent page of top-level documents, in the default space
    pub root_page_id: Option<String>,
    /// Continue with the next document when synchronizing one fails
    pub keep_going: bool,
    pub matcher: MatcherOptions,
    pub converter: ConverterOptions,
}

/// Publishes local documents to the remote wiki.
pub struct Publisher<'a, C: RemoteClient> {
    client: &'a C,
    options: PublishOptions,
    kroki: Option<KrokiClient>,
}

impl<'a, C: RemoteClient> Publisher<'a, C> {
    /// Create a publisher. A Kroki client is set up when diagrams are rendered.
    #[must_use]
    pub fn new(client: &'a C, options: PublishOptions) -> Self {
        let kroki = options.converter.render_mermaid.then(KrokiClient::new);
        Self {
            client,
            options,
            kroki,
        }
    }

    /// Use a specific diagram renderer.
    #[must_use]
    pub fn with_kroki(mut self, kroki: KrokiClient) -> Self {
        self.kroki = Some(kroki);
        self
    }

    /// Publish a single Markdown file or a whole directory tree.
    ///
    /// Phase one resolves the page of every document. Phase two uploads
    /// attachments and content in traversal order.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidPath` if `path` is neither a file nor a
    /// directory, any indexing error, and the first synchronization error
    /// unless `keep_going` is set. With `keep_going`, failures are collected
    /// in the returned report.
    pub async fn synchronize(&self, path: &Path) -> Result<SyncReport> {
        let path = fs::canonicalize(path).map_err(|_| Error::InvalidPath {
            path: path.to_path_buf(),
        })?;
        let root = self
            .options
            .root_page_id
            .as_ref()
            .map(|id| QualifiedId::new(id.clone(), None));

        let index = if path.is_dir() {
            let indexer = Indexer::new(self.client, self.options.matcher.clone());
            indexer.index_directory(&path, root).await?
        } else if path.is_file() {
            let resolved = resolve_page(self.client, &path, root.as_ref()).await?;
            let mut pages = IdentityMap::new();
            pages.insert(path.clone(), resolved.metadata);
            DirectoryIndex {
                pages,
                linked: usize::from(resolved.linked),
            }
        } else {
            return Err(Error::InvalidPath { path });
        };

        info!(
            path = %path.display(),
            documents = index.pages.len(),
            linked = index.linked,
            "Indexed documents"
        );

        self.synchronize_pages(index).await
    }

    async fn synchronize_pages(&self, index: DirectoryIndex) -> Result<SyncReport> {
        let synchronizer = PageSynchronizer::new(
            self.client,
            Converter::new(self.options.converter.clone()),
            self.kroki.clone(),
        );
        let mut report = SyncReport {
            indexed: index.pages.len(),
            linked: index.linked,
            ..SyncReport::default()
        };

        for (path, metadata) in &index.pages {
            match synchronizer.synchronize_page(path, metadata, &index.pages).await {
                Ok(uploaded) => {
                    report.synchronized += 1;
                    report.attachments += uploaded;
                }
                Err(e) if self.options.keep_going => {
                    error!(path = %path.display(), page_id = %metadata.page_id, error = %e, "Failed to synchronize page");
                    report.failures.push(SyncFailure {
                        path: path.clone(),
                        page_id: metadata.page_id.clone(),
                        code: e.error_code().as_str().to_string(),
                        message: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }
}
