//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

/// Publish Markdown documents to Confluence
#[derive(Parser, Debug)]
#[command(name = "csync", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.confluence-sync/config.json)
    #[arg(long, global = true, env = "CSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish a Markdown file or directory tree
    Sync(SyncArgs),

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments of `csync sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Markdown file or directory to publish
    pub path: PathBuf,

    /// Parent page of top-level documents
    #[arg(short, long, env = "CONFLUENCE_ROOT_PAGE")]
    pub root_page: Option<String>,

    /// Confluence host, e.g. example.atlassian.net
    #[arg(short, long, env = "CONFLUENCE_DOMAIN")]
    pub domain: Option<String>,

    /// Wiki base path (default: /wiki/)
    #[arg(short = 'p', long, env = "CONFLUENCE_PATH")]
    pub base_path: Option<String>,

    /// Default space key
    #[arg(short, long, env = "CONFLUENCE_SPACE_KEY")]
    pub space: Option<String>,

    /// User name for basic auth; bearer token auth when omitted
    #[arg(short, long, env = "CONFLUENCE_USER_NAME")]
    pub username: Option<String>,

    /// API token or password
    #[arg(short, long, env = "CONFLUENCE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// REST API base URL override
    #[arg(long, env = "CONFLUENCE_API_URL")]
    pub api_url: Option<String>,

    /// Continue with other documents when publishing one fails
    #[arg(long)]
    pub keep_going: bool,

    /// Render Mermaid diagrams to images with Kroki
    #[arg(long)]
    pub render_mermaid: bool,

    /// Add an info panel with this text to every page
    #[arg(long)]
    pub generated_by: Option<String>,

    /// Publish links to unknown documents as plain text
    #[arg(long)]
    pub ignore_invalid_url: bool,
}
