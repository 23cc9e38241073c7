//! Data models for confluence-sync.
//!
//! - Document (local Markdown file with marker and front-matter)
//! - QualifiedId / PageMetadata (remote page identity)
//! - IdentityMap (local path → page metadata)

pub mod document;
pub mod page;

pub use document::{Document, Properties};
pub use page::{IdentityMap, PageMetadata, QualifiedId};
