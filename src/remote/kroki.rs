//! Kroki diagram rendering.
//!
//! Mermaid sources are deflated, base64url-encoded and sent to a Kroki server
//! as a GET path segment. Run a local server with:
//!
//! ```text
//! docker run -p8000:8000 yuzutech/kroki
//! ```

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE;
use flate2::Compression;
use flate2::write::ZlibEncoder;
use tracing::debug;

use crate::error::{Error, Result};

const DEFAULT_SERVER: &str = "https://kroki.io";

/// Resolve the Kroki server URL from `KROKI_SERVER_URL`.
#[must_use]
pub fn resolve_kroki_server() -> String {
    match std::env::var("KROKI_SERVER_URL") {
        Ok(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
        _ => DEFAULT_SERVER.to_string(),
    }
}

/// Encode a diagram source the way Kroki expects in GET URLs.
///
/// # Errors
///
/// Returns an error if compression fails.
pub fn encode_source(source: &str) -> Result<String> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(source.as_bytes())?;
    let compressed = encoder.finish()?;
    Ok(URL_SAFE.encode(compressed))
}

/// Kroki client rendering Mermaid diagrams to PNG.
#[derive(Clone)]
pub struct KrokiClient {
    client: reqwest::Client,
    server: String,
}

impl KrokiClient {
    /// Create a client for the server named by `KROKI_SERVER_URL`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_server(resolve_kroki_server())
    }

    #[must_use]
    pub fn with_server(server: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            server: server.into(),
        }
    }

    /// Render a Mermaid diagram to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns `Error::Diagram` if the server rejects the diagram.
    pub async fn render(&self, source: &str) -> Result<Vec<u8>> {
        let url = format!("{}/mermaid/png/{}", self.server, encode_source(source)?);
        debug!(server = %self.server, "Rendering Mermaid diagram");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Diagram(format!(
                "Kroki returned HTTP status code {}",
                status.as_u16()
            )));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for KrokiClient {
    fn default() -> Self {
        Self::new()
    }
}
