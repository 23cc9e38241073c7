//! Synchronization engine.
//!
//! Publishing runs in two phases:
//!
//! - **Index**: walk the tree top-down and resolve the page of every document,
//!   creating missing pages and writing identity markers back into the files
//! - **Synchronize**: for every indexed document, upload its attachments and
//!   replace the page content
//!
//! Indexing is sequential because each directory's representative document
//! (`index.md` or `README.md`) becomes the parent of its siblings and
//! subdirectories.
//!
//! # Example
//!
//! ```ignore
//! use csync::sync::{PublishOptions, Publisher};
//!
//! let publisher = Publisher::new(&client, PublishOptions::default());
//! let report = publisher.synchronize(Path::new("docs")).await?;
//! println!("{} pages synchronized", report.synchronized);
//! ```

mod indexer;
mod publisher;
mod resolver;
mod synchronizer;
mod types;
mod writer;

pub use indexer::{DirectoryIndex, Indexer};
pub use publisher::{PublishOptions, Publisher};
pub use resolver::{Resolved, resolve_page};
pub use synchronizer::PageSynchronizer;
pub use types::{SyncFailure, SyncReport};
pub use writer::{atomic_write, insert_markers, write_qualified_id};
