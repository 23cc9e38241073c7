//! confluence-sync - publish Markdown document trees to Confluence
//!
//! This crate provides the core functionality for the `csync` CLI tool.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Local documents and page identities
//! - [`sync`] - Indexing and publishing engine
//! - [`remote`] - Confluence REST client and Kroki diagram renderer
//! - [`convert`] - Markdown to Confluence storage format
//! - [`matcher`] - Directory entry exclusion rules
//! - [`config`] - Configuration management
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod convert;
pub mod error;
pub mod matcher;
pub mod model;
pub mod remote;
pub mod sync;

pub use error::{Error, Result};
