//! Writes page identity markers back into local documents.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::model::QualifiedId;
use crate::model::document::frontmatter_end;

/// Write content to a file atomically.
///
/// The content goes to a sibling temp file which is synced to disk and then
/// renamed over the target. On failure the original file remains untouched.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &str) -> Result<()> {
    let mut temp_name = path.file_name().unwrap_or_default().to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    {
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}

/// Marker comment lines for an identity, each ending in `newline`.
#[must_use]
pub fn marker_lines(id: &QualifiedId, newline: &str) -> String {
    let mut lines = format!("<!-- confluence-page-id: {} -->{newline}", id.page_id);
    if let Some(space_key) = &id.space_key {
        lines.push_str(&format!("<!-- confluence-space-key: {space_key} -->{newline}"));
    }
    lines
}

/// Insert identity markers into document text.
///
/// Markers go right after a leading front-matter block, which is kept
/// byte for byte, or at the top of the text. Marker lines follow the
/// text's line endings.
#[must_use]
pub fn insert_markers(text: &str, id: &QualifiedId) -> String {
    let newline = if text.contains("\r\n") { "\r\n" } else { "\n" };
    let markers = marker_lines(id, newline);
    let split = frontmatter_end(text).unwrap_or(0);

    let mut out = String::with_capacity(text.len() + markers.len() + 2);
    out.push_str(&text[..split]);
    if split > 0 && !text[..split].ends_with('\n') {
        out.push_str(newline);
    }
    out.push_str(&markers);
    out.push_str(&text[split..]);
    out
}

/// Persist the identity of the document at `path`.
///
/// `text` is the document content the identity was resolved from.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_qualified_id(path: &Path, text: &str, id: &QualifiedId) -> Result<()> {
    atomic_write(path, &insert_markers(text, id))?;
    debug!(path = %path.display(), id = %id, "Wrote identity marker");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Document;
    use tempfile::TempDir;

    #[test]
    fn test_prepends_markers_without_frontmatter() {
        let text = "# Title\n\nBody\n";
        let out = insert_markers(text, &QualifiedId::new("42", None));
        assert_eq!(out, "<!-- confluence-page-id: 42 -->\n# Title\n\nBody\n");
    }

    #[test]
    fn test_space_marker_only_when_present() {
        let out = insert_markers("Body\n", &QualifiedId::new("42", Some("OPS".into())));
        assert_eq!(
            out,
            "<!-- confluence-page-id: 42 -->\n<!-- confluence-space-key: OPS -->\nBody\n"
        );
    }

    #[test]
    fn test_frontmatter_preserved_verbatim() {
        let text = "---\ntitle:   Spaced  Out\ntags: [a, b]   \n---\nBody\n";
        let out = insert_markers(text, &QualifiedId::new("42", None));

        assert!(out.starts_with("---\ntitle:   Spaced  Out\ntags: [a, b]   \n---\n"));
        assert_eq!(
            &out[text.len() - "Body\n".len()..],
            "<!-- confluence-page-id: 42 -->\nBody\n"
        );
    }

    #[test]
    fn test_frontmatter_without_trailing_newline() {
        let out = insert_markers("---\ntitle: x\n---", &QualifiedId::new("42", None));
        assert_eq!(out, "---\ntitle: x\n---\n<!-- confluence-page-id: 42 -->\n");
    }

    #[test]
    fn test_crlf_frontmatter_keeps_markers_below() {
        let text = "---\r\ntitle: Installing\r\n---\r\nBody\r\n";
        let out = insert_markers(text, &QualifiedId::new("1001", Some("DOCS".into())));

        assert_eq!(
            out,
            "---\r\ntitle: Installing\r\n---\r\n\
             <!-- confluence-page-id: 1001 -->\r\n\
             <!-- confluence-space-key: DOCS -->\r\n\
             Body\r\n"
        );
        let document = Document::parse(&out);
        assert_eq!(document.title(), Some("Installing"));
        assert_eq!(document.qualified_id.unwrap().page_id, "1001");
    }

    #[test]
    fn test_written_document_parses_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("guide.md");
        let text = "---\ntitle: Guide\n---\nBody\n";
        fs::write(&path, text).unwrap();

        let id = QualifiedId::new("77", Some("DOCS".into()));
        write_qualified_id(&path, text, &id).unwrap();

        let document = Document::read(&path).unwrap();
        assert_eq!(document.qualified_id, Some(id));
        assert_eq!(document.title(), Some("Guide"));
        assert!(!dir.path().join("guide.md.tmp").exists());
    }
}
