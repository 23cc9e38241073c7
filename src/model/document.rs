//! Local Markdown document model.
//!
//! A document may carry two pieces of state besides its body:
//!
//! ```markdown
//! ---
//! title: Getting Started
//! ---
//! <!-- confluence-page-id: 123456 -->
//! <!-- confluence-space-key: DOCS -->
//!
//! Body text...
//! ```
//!
//! The front-matter block must start at the very beginning of the file. The
//! identity marker comments may appear anywhere, but are written right after
//! the front-matter (or at the top of the file when there is none).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use super::page::QualifiedId;
use crate::error::Result;

static PAGE_ID_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s+confluence-page-id:\s*(\S+)\s+-->").expect("valid regex")
});

static SPACE_KEY_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<!--\s+confluence-space-key:\s*(\S+)\s+-->").expect("valid regex")
});

static FRONTMATTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?ms)\A---\r?$(.+?)^---\r?$").expect("valid regex"));

/// Front-matter properties. Only `title` is interpreted; other keys pass through.
pub type Properties = BTreeMap<String, serde_yaml::Value>;

/// A parsed Markdown file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identity embedded by a previous run, if any
    pub qualified_id: Option<QualifiedId>,

    /// Front-matter properties; `None` if absent or not a YAML mapping
    pub properties: Option<Properties>,

    /// Markdown body with the marker comments and front-matter removed
    pub body: String,
}

impl Document {
    /// Parse document text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let (qualified_id, rest) = extract_qualified_id(text);
        let (frontmatter, body) = extract_frontmatter(&rest);
        let properties = frontmatter.as_deref().and_then(parse_properties);

        Self {
            qualified_id,
            properties,
            body,
        }
    }

    /// Read and parse a document from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read as UTF-8 text.
    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// The `title` front-matter property, if it is a string.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.properties
            .as_ref()
            .and_then(|p| p.get("title"))
            .and_then(serde_yaml::Value::as_str)
    }
}

/// Read only the identity marker of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_qualified_id(path: &Path) -> Result<Option<QualifiedId>> {
    let text = fs::read_to_string(path)?;
    Ok(extract_qualified_id(&text).0)
}

/// Remove the first match of `pattern` and return its first capture group.
fn extract_value(pattern: &Regex, text: &str) -> (Option<String>, String) {
    match pattern.captures(text) {
        Some(caps) => {
            let whole = caps.get(0).map_or(0..0, |m| m.range());
            let value = caps.get(1).map(|m| m.as_str().to_string());
            let mut rest = String::with_capacity(text.len());
            rest.push_str(&text[..whole.start]);
            rest.push_str(&text[whole.end..]);
            (value, rest)
        }
        None => (None, text.to_string()),
    }
}

/// Extract the page ID and optional space key markers.
///
/// A space key without a page ID is ignored and left in place.
#[must_use]
pub fn extract_qualified_id(text: &str) -> (Option<QualifiedId>, String) {
    let (page_id, rest) = extract_value(&PAGE_ID_MARKER, text);
    let Some(page_id) = page_id else {
        return (None, rest);
    };

    let (space_key, rest) = extract_value(&SPACE_KEY_MARKER, &rest);
    (Some(QualifiedId::new(page_id, space_key)), rest)
}

/// Extract the raw YAML of a leading front-matter block.
#[must_use]
pub fn extract_frontmatter(text: &str) -> (Option<String>, String) {
    extract_value(&FRONTMATTER, text)
}

/// Byte offset just past the closing front-matter delimiter line.
///
/// Delimiter lines may end in `\n` or `\r\n`; a trailing `\r` is part of
/// the match. Returns `None` when the text does not start with a front-matter
/// block.
#[must_use]
pub fn frontmatter_end(text: &str) -> Option<usize> {
    let end = FRONTMATTER.find(text)?.end();
    if text[end..].starts_with('\n') {
        Some(end + 1)
    } else {
        Some(end)
    }
}

/// Parse a YAML block as an open property map.
///
/// Malformed YAML and non-mapping documents yield `None`.
fn parse_properties(yaml: &str) -> Option<Properties> {
    let value = serde_yaml::from_str::<serde_yaml::Value>(yaml).ok()?;
    let serde_yaml::Value::Mapping(mapping) = value else {
        return None;
    };

    Some(
        mapping
            .into_iter()
            .filter_map(|(k, v)| k.as_str().map(|k| (k.to_string(), v)))
            .collect(),
    )
}
