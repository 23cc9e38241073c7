//! Recursive directory indexing.
//!
//! Each directory is indexed in three steps:
//!
//! 1. Its representative document (`index.md`, else `README.md`) is
//!    resolved under the inherited parent.
//! 2. The identity of that document becomes the parent of everything else
//!    in the directory; without one the inherited parent is kept.
//! 3. The remaining files are resolved, then each subdirectory is indexed
//!    and its map appended.

use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::matcher::{Matcher, MatcherOptions};
use crate::model::document::read_qualified_id;
use crate::model::{IdentityMap, PageMetadata, QualifiedId};
use crate::remote::RemoteClient;
use crate::sync::resolver::resolve_page;

const REPRESENTATIVE_NAMES: [&str; 2] = ["index.md", "README.md"];

/// Identity map of a directory tree.
#[derive(Debug, Default)]
pub struct DirectoryIndex {
    pub pages: IdentityMap,
    /// Documents linked to a page in this walk
    pub linked: usize,
}

impl DirectoryIndex {
    /// Document already mapped to `page_id`, if any.
    #[must_use]
    pub fn path_of(&self, page_id: &str) -> Option<&Path> {
        self.pages
            .iter()
            .find(|(_, metadata)| metadata.page_id == page_id)
            .map(|(path, _)| path.as_path())
    }

    fn insert(&mut self, path: PathBuf, metadata: PageMetadata) {
        if let Some(existing) = self.path_of(&metadata.page_id) {
            warn!(
                path = %path.display(),
                existing = %existing.display(),
                page_id = %metadata.page_id,
                title = %metadata.title,
                "Documents resolve to the same page; give one a distinct front-matter title"
            );
        }
        self.pages.insert(path, metadata);
    }

    fn merge(&mut self, other: Self) {
        for (path, metadata) in other.pages {
            self.insert(path, metadata);
        }
        self.linked += other.linked;
    }
}

type IndexFuture<'a> = Pin<Box<dyn Future<Output = Result<DirectoryIndex>> + Send + 'a>>;

/// Walks a directory tree and resolves every eligible document.
pub struct Indexer<'a, C: RemoteClient> {
    client: &'a C,
    matcher: MatcherOptions,
}

impl<'a, C: RemoteClient> Indexer<'a, C> {
    #[must_use]
    pub fn new(client: &'a C, matcher: MatcherOptions) -> Self {
        Self { client, matcher }
    }

    /// Index `dir` and all subdirectories.
    ///
    /// The first resolution error aborts the walk.
    ///
    /// # Errors
    ///
    /// Returns file system errors and any error of [`resolve_page`].
    pub fn index_directory<'s>(
        &'s self,
        dir: &'s Path,
        parent: Option<QualifiedId>,
    ) -> IndexFuture<'s> {
        Box::pin(async move {
            let (files, directories) = self.list_entries(dir)?;
            let mut index = DirectoryIndex::default();

            let representative = REPRESENTATIVE_NAMES
                .iter()
                .find_map(|name| files.iter().find(|f| f.file_name().is_some_and(|n| n == *name)))
                .cloned();

            let mut parent = parent;
            if let Some(path) = &representative {
                self.resolve_into(&mut index, path, parent.as_ref()).await?;
                parent = read_qualified_id(path)?.or(parent);
                debug!(dir = %dir.display(), representative = %path.display(), "Resolved directory page");
            }

            for path in files.iter().filter(|f| Some(*f) != representative.as_ref()) {
                self.resolve_into(&mut index, path, parent.as_ref()).await?;
            }

            for subdir in &directories {
                let sub_index = self.index_directory(subdir, parent.clone()).await?;
                index.merge(sub_index);
            }

            Ok(index)
        })
    }

    async fn resolve_into(
        &self,
        index: &mut DirectoryIndex,
        path: &Path,
        parent: Option<&QualifiedId>,
    ) -> Result<()> {
        let resolved = resolve_page(self.client, path, parent).await?;
        if resolved.linked {
            index.linked += 1;
        }
        index.insert(path.to_path_buf(), resolved.metadata);
        Ok(())
    }

    /// Eligible files and subdirectories of `dir`, each sorted by name.
    fn list_entries(&self, dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
        let matcher = Matcher::new(&self.matcher, dir);
        let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(fs::DirEntry::file_name);

        let mut files = Vec::new();
        let mut directories = Vec::new();
        for entry in entries {
            let path = entry.path();
            let is_dir = path.is_dir();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if matcher.is_excluded(&name, is_dir) {
                trace!(path = %path.display(), "Skipping excluded entry");
                continue;
            }

            if is_dir {
                directories.push(path);
            } else if path.is_file() {
                files.push(path);
            }
        }

        Ok((files, directories))
    }
}
