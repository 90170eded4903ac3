//! Config command
//!
//! Inspect the effective comments configuration.

use super::Workspace;
use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use comments_core::config::REMOTE_CONFIG_KEY;
use comments_core::store::ConfigStore;
use serde_json::Value;

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show {
        /// Show as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a single dotted path
    Get {
        /// Dotted path, e.g. badWords or enabledCollections.0
        path: String,

        /// Read the local file even when a remote document exists
        #[arg(long)]
        local: bool,
    },
}

/// Execute the config command
pub async fn execute(workspace: &Workspace, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => show_config(workspace, json).await,
        ConfigCommand::Get { path, local } => get_value(workspace, &path, local).await,
    }
}

async fn show_config(workspace: &Workspace, as_json: bool) -> Result<()> {
    let config = workspace.service.get_config().await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let remote = workspace.data.config_store()?.get(REMOTE_CONFIG_KEY).await?;
    let source = if remote.is_some() {
        "remote document".to_string()
    } else {
        workspace.data.local_config_path().display().to_string()
    };

    println!("{}", "Configuration:".bold().underline());
    println!("{}", source.dimmed());
    println!();
    println!(
        "  Enabled collections: {}",
        list_or_none(&config.enabled_collections)
    );
    println!(
        "  Bad words filter:    {}",
        if config.bad_words.is_enabled() {
            "enabled".green()
        } else {
            "disabled".red()
        }
    );
    println!("  Approval flow:       {}", list_or_none(&config.approval_flow));
    println!(
        "  Hidden author props: {}",
        list_or_none(&config.blocked_author_props)
    );

    let collections = workspace.store.collections().await?;
    println!();
    println!("{}", "Data:".bold().underline());
    println!("{}", workspace.data.root().display().to_string().dimmed());
    println!("  Stored collections:  {}", list_or_none(&collections));
    Ok(())
}

async fn get_value(workspace: &Workspace, path: &str, local: bool) -> Result<()> {
    let value = workspace
        .service
        .get_config_value(path, Value::Null, local)
        .await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn list_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "(none)".dimmed().to_string()
    } else {
        items.join(", ")
    }
}
