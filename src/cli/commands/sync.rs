//! Sync command implementation.
//!
//! Resolves the connection settings, then runs the publisher on a Tokio
//! runtime and prints the run report.

use std::path::Path;

use colored::Colorize;

use crate::cli::SyncArgs;
use crate::config::{ConnectionOverrides, ConnectionProperties, load_config};
use crate::convert::ConverterOptions;
use crate::error::{Error, Result};
use crate::matcher::MatcherOptions;
use crate::remote::ConfluenceClient;
use crate::sync::{PublishOptions, Publisher, SyncReport};

/// Execute the sync command.
///
/// # Errors
///
/// Returns configuration, indexing and publishing errors. With
/// `--keep-going`, returns `Error::PartialFailure` after printing the
/// report if any document failed.
pub fn execute(args: &SyncArgs, config_path: Option<&Path>, json: bool, quiet: bool) -> Result<()> {
    let file = load_config(config_path)?;
    let overrides = ConnectionOverrides {
        domain: args.domain.clone(),
        base_path: args.base_path.clone(),
        space_key: args.space.clone(),
        user_name: args.username.clone(),
        api_key: args.api_key.clone(),
        api_url: args.api_url.clone(),
    };
    let properties = ConnectionProperties::resolve(overrides, &file)?;

    let options = PublishOptions {
        root_page_id: args.root_page.clone().or(file.root_page_id),
        keep_going: args.keep_going,
        matcher: MatcherOptions::default(),
        converter: ConverterOptions {
            ignore_invalid_url: args.ignore_invalid_url,
            render_mermaid: args.render_mermaid,
            generated_by: args.generated_by.clone(),
        },
    };

    let client = ConfluenceClient::new(&properties);
    let publisher = Publisher::new(&client, options);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    let report = rt.block_on(async { publisher.synchronize(&args.path).await })?;

    if json {
        let output = serde_json::json!({
            "success": report.failures.is_empty(),
            "path": args.path.display().to_string(),
            "space": properties.space_key,
            "report": report,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else if !quiet {
        print_report(&args.path, &report);
    }

    if report.failures.is_empty() {
        Ok(())
    } else {
        Err(Error::PartialFailure {
            failed: report.failures.len(),
            total: report.indexed,
        })
    }
}

fn print_report(path: &Path, report: &SyncReport) {
    if report.indexed == 0 {
        println!("No documents found in: {}", path.display());
        return;
    }

    println!("{} {}", "Published".green().bold(), path.display());
    println!();
    println!("  Documents:     {}", report.indexed);
    if report.linked > 0 {
        println!("  Newly linked:  {}", report.linked);
    }
    println!("  Synchronized:  {}", report.synchronized);
    if report.attachments > 0 {
        println!("  Attachments:   {}", report.attachments);
    }

    if !report.failures.is_empty() {
        println!();
        println!("{}", "Failed".red().bold());
        for failure in &report.failures {
            println!(
                "  {} (page {}): {}",
                failure.path.display(),
                failure.page_id,
                failure.message
            );
        }
    }
}
