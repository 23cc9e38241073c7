//! Publishing a single document to its page.

use std::path::Path;

use tracing::{debug, info};

use crate::convert::{Converter, attachment_name};
use crate::error::Result;
use crate::model::{Document, IdentityMap, PageMetadata};
use crate::remote::{AttachmentData, KrokiClient, RemoteClient};

/// Logical folder name for attachments produced in memory.
const EMBEDDED_FOLDER: &str = "EMB";

/// Uploads attachments and content of documents.
pub struct PageSynchronizer<'a, C: RemoteClient> {
    client: &'a C,
    converter: Converter,
    kroki: Option<KrokiClient>,
}

impl<'a, C: RemoteClient> PageSynchronizer<'a, C> {
    /// `kroki` renders diagrams; without it, diagrams are skipped.
    #[must_use]
    pub fn new(client: &'a C, converter: Converter, kroki: Option<KrokiClient>) -> Self {
        Self {
            client,
            converter,
            kroki,
        }
    }

    /// Publish the document at `path` to the page in `metadata`.
    ///
    /// Every remote call is made in the page's own space. Attachments are
    /// uploaded before the content is replaced.
    ///
    /// Returns the number of attachments uploaded.
    ///
    /// # Errors
    ///
    /// Returns conversion, diagram, file and remote errors.
    pub async fn synchronize_page(
        &self,
        path: &Path,
        metadata: &PageMetadata,
        pages: &IdentityMap,
    ) -> Result<usize> {
        let document = Document::read(path)?;
        let mut converted = self.converter.convert(&document, path, pages)?;
        let space_key = metadata.space_key.as_str();
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));

        if let Some(kroki) = &self.kroki {
            for diagram in &converted.diagrams {
                let image = kroki.render(&diagram.source).await?;
                converted.embedded_images.insert(diagram.name.clone(), image);
            }
        } else if !converted.diagrams.is_empty() {
            debug!(path = %path.display(), "No diagram renderer configured, skipping diagrams");
        }

        let mut uploaded = 0;
        for image in &converted.images {
            let name = attachment_name(image);
            debug!(page_id = %metadata.page_id, name = %name, "Uploading image");
            self.client
                .upload_attachment(
                    &metadata.page_id,
                    space_key,
                    &name,
                    AttachmentData::File(&base_dir.join(image)),
                )
                .await?;
            uploaded += 1;
        }

        for (image, bytes) in &converted.embedded_images {
            let name = attachment_name(image);
            debug!(page_id = %metadata.page_id, name = %name, folder = EMBEDDED_FOLDER, "Uploading embedded image");
            self.client
                .upload_attachment(&metadata.page_id, space_key, &name, AttachmentData::Bytes(bytes))
                .await?;
            uploaded += 1;
        }

        self.client
            .update_page(&metadata.page_id, space_key, &converted.xhtml)
            .await?;

        info!(
            path = %path.display(),
            page_id = %metadata.page_id,
            space = space_key,
            attachments = uploaded,
            "Synchronized page"
        );
        Ok(uploaded)
    }
}
