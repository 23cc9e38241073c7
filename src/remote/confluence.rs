//! Confluence REST API client.
//!
//! Talks to the v1 content API (`{base}/rest/api/content`). Credentials are
//! passed through as configured: basic auth when a user name is set, a bearer
//! token otherwise.

use reqwest::RequestBuilder;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AttachmentData, Page, RemoteClient};
use crate::config::ConnectionProperties;
use crate::error::{Error, Result};

enum Auth {
    Basic { user_name: String, api_key: String },
    Bearer(String),
}

/// Confluence REST API client.
pub struct ConfluenceClient {
    client: reqwest::Client,
    api_url: String,
    domain: String,
    base_path: String,
    space_key: String,
    auth: Auth,
}

impl ConfluenceClient {
    /// Create a client from resolved connection properties.
    #[must_use]
    pub fn new(properties: &ConnectionProperties) -> Self {
        let api_url = properties.api_url.clone().unwrap_or_else(|| {
            format!("https://{}{}rest/api/", properties.domain, properties.base_path)
        });
        let api_url = if api_url.ends_with('/') {
            api_url
        } else {
            format!("{api_url}/")
        };

        let auth = match &properties.user_name {
            Some(user_name) => Auth::Basic {
                user_name: user_name.clone(),
                api_key: properties.api_key.clone(),
            },
            None => Auth::Bearer(properties.api_key.clone()),
        };

        Self {
            client: reqwest::Client::new(),
            api_url,
            domain: properties.domain.clone(),
            base_path: properties.base_path.clone(),
            space_key: properties.space_key.clone(),
            auth,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.api_url)
    }

    /// Attach credentials, send, and map non-success statuses to errors.
    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response> {
        let request = match &self.auth {
            Auth::Basic { user_name, api_key } => request.basic_auth(user_name, Some(api_key)),
            Auth::Bearer(token) => request.bearer_auth(token),
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Remote {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn find_page_by_title(&self, title: &str, space_key: &str) -> Result<Option<Page>> {
        let request = self.client.get(self.url("content")).query(&[
            ("type", "page"),
            ("title", title),
            ("spaceKey", space_key),
            ("expand", "space,version"),
        ]);

        let list: ContentList<ContentResponse> = self.send(request).await?.json().await?;
        Ok(list.results.into_iter().next().map(Page::from))
    }

    async fn create_page(&self, title: &str, parent_id: &str, space_key: &str) -> Result<Page> {
        let body = CreatePageRequest {
            kind: "page",
            title,
            space: SpaceKey { key: space_key },
            ancestors: vec![Ancestor {
                kind: "page",
                id: parent_id,
            }],
            body: Body::storage(""),
        };

        let request = self.client.post(self.url("content")).json(&body);
        let created: ContentResponse = self.send(request).await?.json().await?;
        info!(title, page_id = %created.id, parent_id, space_key, "Created page");
        Ok(Page::from(created))
    }

    async fn find_attachment(&self, page_id: &str, name: &str) -> Result<Option<String>> {
        let request = self
            .client
            .get(self.url(&format!("content/{page_id}/child/attachment")))
            .query(&[("filename", name)]);

        let list: ContentList<AttachmentResponse> = self.send(request).await?.json().await?;
        Ok(list.results.into_iter().next().map(|a| a.id))
    }
}

/// Paged list envelope.
#[derive(Debug, Deserialize)]
struct ContentList<T> {
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    id: String,
    title: String,
    space: Option<SpaceResponse>,
    version: Option<VersionResponse>,
}

#[derive(Debug, Deserialize)]
struct SpaceResponse {
    key: String,
}

#[derive(Debug, Deserialize)]
struct VersionResponse {
    number: u64,
}

#[derive(Debug, Deserialize)]
struct AttachmentResponse {
    id: String,
}

impl From<ContentResponse> for Page {
    fn from(content: ContentResponse) -> Self {
        Self {
            id: content.id,
            title: content.title,
            space_key: content.space.map(|s| s.key),
            version: content.version.map(|v| v.number),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpaceKey<'a> {
    key: &'a str,
}

#[derive(Debug, Serialize)]
struct Ancestor<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    id: &'a str,
}

#[derive(Debug, Serialize)]
struct Storage<'a> {
    value: &'a str,
    representation: &'a str,
}

#[derive(Debug, Serialize)]
struct Body<'a> {
    storage: Storage<'a>,
}

impl<'a> Body<'a> {
    fn storage(value: &'a str) -> Self {
        Self {
            storage: Storage {
                value,
                representation: "storage",
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct CreatePageRequest<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    title: &'a str,
    space: SpaceKey<'a>,
    ancestors: Vec<Ancestor<'a>>,
    body: Body<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct NewVersion {
    minor_edit: bool,
    number: u64,
}

#[derive(Debug, Serialize)]
struct UpdatePageRequest<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    title: &'a str,
    space: SpaceKey<'a>,
    body: Body<'a>,
    version: NewVersion,
}

impl RemoteClient for ConfluenceClient {
    fn domain(&self) -> &str {
        &self.domain
    }

    fn base_path(&self) -> &str {
        &self.base_path
    }

    fn space_key(&self) -> &str {
        &self.space_key
    }

    async fn get_page(&self, page_id: &str, space_key: &str) -> Result<Page> {
        debug!(page_id, space_key, "Fetching page");
        let request = self
            .client
            .get(self.url(&format!("content/{page_id}")))
            .query(&[("spaceKey", space_key), ("expand", "space,version")]);

        let content: ContentResponse = self.send(request).await?.json().await?;
        Ok(Page::from(content))
    }

    async fn get_or_create_page(&self, title: &str, parent_id: &str, space_key: &str) -> Result<Page> {
        if let Some(page) = self.find_page_by_title(title, space_key).await? {
            debug!(title, page_id = %page.id, "Found existing page by title");
            return Ok(page);
        }
        self.create_page(title, parent_id, space_key).await
    }

    async fn update_page(&self, page_id: &str, space_key: &str, content: &str) -> Result<()> {
        let page = self.get_page(page_id, space_key).await?;
        let version = page.version.unwrap_or(0) + 1;

        let body = UpdatePageRequest {
            id: page_id,
            kind: "page",
            title: &page.title,
            space: SpaceKey { key: space_key },
            body: Body::storage(content),
            version: NewVersion {
                minor_edit: true,
                number: version,
            },
        };

        let request = self
            .client
            .put(self.url(&format!("content/{page_id}")))
            .json(&body);
        self.send(request).await?;
        debug!(page_id, version, "Updated page content");
        Ok(())
    }

    async fn upload_attachment(
        &self,
        page_id: &str,
        space_key: &str,
        name: &str,
        data: AttachmentData<'_>,
    ) -> Result<()> {
        let bytes = data.to_bytes()?;
        let mime = mime_guess::from_path(name).first_or_octet_stream();
        let part = Part::bytes(bytes)
            .file_name(name.to_string())
            .mime_str(mime.as_ref())?;
        let form = Form::new().part("file", part).text("minorEdit", "true");

        let path = match self.find_attachment(page_id, name).await? {
            Some(attachment_id) => format!("content/{page_id}/child/attachment/{attachment_id}/data"),
            None => format!("content/{page_id}/child/attachment"),
        };

        let request = self
            .client
            .post(self.url(&path))
            .header("X-Atlassian-Token", "no-check")
            .multipart(form);
        self.send(request).await?;
        debug!(page_id, space_key, name, "Uploaded attachment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ConfluenceClient {
        ConfluenceClient::new(&ConnectionProperties {
            domain: "example.atlassian.net".into(),
            base_path: "/wiki/".into(),
            space_key: "DOCS".into(),
            user_name: Some("bot@example.com".into()),
            api_key: "secret".into(),
            api_url: Some(format!("{}/rest/api", server.uri())),
        })
    }

    fn page_json(id: &str, title: &str, version: u64) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "space": {"key": "DOCS"},
            "version": {"number": version}
        })
    }

    #[test]
    fn test_default_api_url() {
        let client = ConfluenceClient::new(&ConnectionProperties {
            domain: "example.atlassian.net".into(),
            base_path: "/wiki/".into(),
            space_key: "DOCS".into(),
            user_name: None,
            api_key: "token".into(),
            api_url: None,
        });
        assert_eq!(
            client.url("content"),
            "https://example.atlassian.net/wiki/rest/api/content"
        );
    }

    #[tokio::test]
    async fn test_get_page_parses_space_and_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content/123"))
            .and(query_param("spaceKey", "DOCS"))
            .and(header_exists("Authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json("123", "Home", 4)))
            .mount(&server)
            .await;

        let page = test_client(&server).get_page("123", "DOCS").await.unwrap();
        assert_eq!(page.id, "123");
        assert_eq!(page.title, "Home");
        assert_eq!(page.space_key.as_deref(), Some("DOCS"));
        assert_eq!(page.version, Some(4));
    }

    #[tokio::test]
    async fn test_get_page_maps_http_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content/404"))
            .respond_with(ResponseTemplate::new(404).set_body_string("No content found"))
            .mount(&server)
            .await;

        let err = test_client(&server).get_page("404", "DOCS").await.unwrap_err();
        match err {
            Error::Remote { status, message } => {
                assert_eq!(status, 404);
                assert!(message.contains("No content"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_or_create_reuses_page_with_same_title() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content"))
            .and(query_param("title", "Guide"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"results": [page_json("77", "Guide", 2)]})),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/api/content"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let page = test_client(&server)
            .get_or_create_page("Guide", "1", "DOCS")
            .await
            .unwrap();
        assert_eq!(page.id, "77");
    }

    #[tokio::test]
    async fn test_get_or_create_creates_under_parent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/api/content"))
            .and(body_partial_json(serde_json::json!({
                "type": "page",
                "title": "Guide",
                "space": {"key": "DOCS"},
                "ancestors": [{"type": "page", "id": "1"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json("78", "Guide", 1)))
            .expect(1)
            .mount(&server)
            .await;

        let page = test_client(&server)
            .get_or_create_page("Guide", "1", "DOCS")
            .await
            .unwrap();
        assert_eq!(page.id, "78");
    }

    #[tokio::test]
    async fn test_update_page_bumps_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content/55"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json("55", "Notes", 3)))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/rest/api/content/55"))
            .and(body_partial_json(serde_json::json!({
                "title": "Notes",
                "version": {"number": 4, "minorEdit": true},
                "body": {"storage": {"value": "<p>hi</p>", "representation": "storage"}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json("55", "Notes", 4)))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server)
            .update_page("55", "DOCS", "<p>hi</p>")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_new_attachment() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content/55/child/attachment"))
            .and(query_param("filename", "diagram.png"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/api/content/55/child/attachment"))
            .and(header("X-Atlassian-Token", "no-check"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"results": []})))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server)
            .upload_attachment("55", "DOCS", "diagram.png", AttachmentData::Bytes(b"png"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upload_replaces_existing_attachment() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/api/content/55/child/attachment"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"results": [{"id": "att9"}]})),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/rest/api/content/55/child/attachment/att9/data"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server)
            .upload_attachment("55", "DOCS", "diagram.png", AttachmentData::Bytes(b"png"))
            .await
            .unwrap();
    }
}
