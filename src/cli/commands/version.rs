//! Version command implementation.
//!
//! Besides the version, prints where settings are read from so a user can
//! tell which config file and diagram server a `sync` run would use.

use serde::Serialize;

use crate::config::default_config_path;
use crate::error::Result;
use crate::remote::kroki::resolve_kroki_server;

#[derive(Serialize)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
    config_path: Option<String>,
    kroki_server: String,
}

/// Execute the version command.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub fn execute(json: bool) -> Result<()> {
    let output = VersionOutput {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        config_path: default_config_path().map(|p| p.display().to_string()),
        kroki_server: resolve_kroki_server(),
    };

    if json {
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    println!("csync ({}) {}", output.name, output.version);
    if let Some(path) = &output.config_path {
        println!("  Config: {path}");
    }
    println!("  Kroki:  {}", output.kroki_server);
    Ok(())
}
