//! Page identity model.
//!
//! A local document is linked to exactly one Confluence page. The link is
//! recorded as a [`QualifiedId`] inside the document itself, and expanded
//! into [`PageMetadata`] while indexing.

use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Page ID with an optional space key.
///
/// A missing space key means the default space of the session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct QualifiedId {
    /// Opaque Confluence page identifier
    pub page_id: String,

    /// Space the page lives in, if not the default one
    pub space_key: Option<String>,
}

impl QualifiedId {
    pub fn new(page_id: impl Into<String>, space_key: Option<String>) -> Self {
        Self {
            page_id: page_id.into(),
            space_key,
        }
    }

    /// Resolve the space key, falling back to `default_space`.
    #[must_use]
    pub fn space_or<'a>(&'a self, default_space: &'a str) -> &'a str {
        self.space_key.as_deref().unwrap_or(default_space)
    }
}

impl fmt::Display for QualifiedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.space_key {
            Some(space) => write!(f, "{space}:{}", self.page_id),
            None => write!(f, "{}", self.page_id),
        }
    }
}

/// Everything needed to publish a document and to link to it from others.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageMetadata {
    /// Confluence host, e.g. `example.atlassian.net`
    pub domain: String,

    /// Wiki base path, e.g. `/wiki/`
    pub base_path: String,

    pub page_id: String,

    /// Always resolved: the page's own space, else the default space
    pub space_key: String,

    pub title: String,
}

impl PageMetadata {
    #[must_use]
    pub fn qualified_id(&self) -> QualifiedId {
        QualifiedId::new(self.page_id.clone(), Some(self.space_key.clone()))
    }

    /// Browser URL of the page.
    #[must_use]
    pub fn url(&self) -> String {
        format!(
            "https://{}{}spaces/{}/pages/{}/{}",
            self.domain,
            self.base_path,
            self.space_key,
            self.page_id,
            urlencoding::encode(&self.title).replace("%20", "+"),
        )
    }
}

/// Local path → page metadata, in traversal order.
pub type IdentityMap = IndexMap<PathBuf, PageMetadata>;
