//! In-memory remote client for engine tests.

use std::collections::HashSet;
use std::sync::Mutex;

use super::{AttachmentData, Page, RemoteClient};
use crate::error::{Error, Result};

/// A recorded remote call, with the space it was made in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetPage { page_id: String, space_key: String },
    GetOrCreate { title: String, parent_id: String, space_key: String },
    Update { page_id: String, space_key: String, content: String },
    Upload { page_id: String, space_key: String, name: String, size: usize },
}

impl Call {
    pub fn space_key(&self) -> &str {
        match self {
            Self::GetPage { space_key, .. }
            | Self::GetOrCreate { space_key, .. }
            | Self::Update { space_key, .. }
            | Self::Upload { space_key, .. } => space_key,
        }
    }
}

#[derive(Default)]
struct State {
    pages: Vec<(Page, Option<String>)>,
    next_id: u64,
    calls: Vec<Call>,
    created: Vec<String>,
    failing_updates: HashSet<String>,
}

pub struct FakeClient {
    space_key: String,
    state: Mutex<State>,
}

impl FakeClient {
    pub fn new(space_key: &str) -> Self {
        Self {
            space_key: space_key.to_string(),
            state: Mutex::new(State {
                next_id: 1000,
                ..State::default()
            }),
        }
    }

    /// Seed an existing page.
    pub fn with_page(self, id: &str, title: &str, space_key: &str) -> Self {
        self.state.lock().unwrap().pages.push((
            Page {
                id: id.to_string(),
                title: title.to_string(),
                space_key: Some(space_key.to_string()),
                version: Some(1),
            },
            None,
        ));
        self
    }

    /// Make `update_page` fail for the given page.
    pub fn fail_updates_for(&self, page_id: &str) {
        self.state.lock().unwrap().failing_updates.insert(page_id.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Titles of pages created through `get_or_create_page`.
    pub fn created(&self) -> Vec<String> {
        self.state.lock().unwrap().created.clone()
    }

    /// Parent page ID a page was created under.
    pub fn parent_of(&self, title: &str) -> Option<String> {
        self.state
            .lock()
            .unwrap()
            .pages
            .iter()
            .find(|(p, _)| p.title == title)
            .and_then(|(_, parent)| parent.clone())
    }

    /// Last content submitted for a page.
    pub fn content_of(&self, page_id: &str) -> Option<String> {
        self.calls().into_iter().rev().find_map(|call| match call {
            Call::Update { page_id: id, content, .. } if id == page_id => Some(content),
            _ => None,
        })
    }
}

impl RemoteClient for FakeClient {
    fn domain(&self) -> &str {
        "example.atlassian.net"
    }

    fn base_path(&self) -> &str {
        "/wiki/"
    }

    fn space_key(&self) -> &str {
        &self.space_key
    }

    async fn get_page(&self, page_id: &str, space_key: &str) -> Result<Page> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetPage {
            page_id: page_id.to_string(),
            space_key: space_key.to_string(),
        });
        state
            .pages
            .iter()
            .find(|(p, _)| p.id == page_id)
            .map(|(p, _)| p.clone())
            .ok_or(Error::Remote {
                status: 404,
                message: format!("No content found with id {page_id}"),
            })
    }

    async fn get_or_create_page(&self, title: &str, parent_id: &str, space_key: &str) -> Result<Page> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetOrCreate {
            title: title.to_string(),
            parent_id: parent_id.to_string(),
            space_key: space_key.to_string(),
        });

        if let Some((page, _)) = state
            .pages
            .iter()
            .find(|(p, _)| p.title == title && p.space_key.as_deref() == Some(space_key))
        {
            return Ok(page.clone());
        }

        state.next_id += 1;
        let page = Page {
            id: state.next_id.to_string(),
            title: title.to_string(),
            space_key: Some(space_key.to_string()),
            version: Some(1),
        };
        state.pages.push((page.clone(), Some(parent_id.to_string())));
        state.created.push(title.to_string());
        Ok(page)
    }

    async fn update_page(&self, page_id: &str, space_key: &str, content: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Update {
            page_id: page_id.to_string(),
            space_key: space_key.to_string(),
            content: content.to_string(),
        });
        if state.failing_updates.contains(page_id) {
            return Err(Error::Remote {
                status: 409,
                message: format!("Version conflict on page {page_id}"),
            });
        }
        Ok(())
    }

    async fn upload_attachment(
        &self,
        page_id: &str,
        space_key: &str,
        name: &str,
        data: AttachmentData<'_>,
    ) -> Result<()> {
        let size = data.to_bytes()?.len();
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Upload {
            page_id: page_id.to_string(),
            space_key: space_key.to_string(),
            name: name.to_string(),
            size,
        });
        Ok(())
    }
}
