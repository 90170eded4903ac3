//! Moderation commands
//!
//! Single-comment lookup, blocking and cascading field updates.

use super::Workspace;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comments_core::query::Criteria;
use comments_core::RecordId;
use serde_json::Value;

/// Arguments of `comments show`
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Comment ID
    pub id: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `comments block` / `comments unblock`
#[derive(Debug, Args)]
pub struct BlockArgs {
    /// Comment ID
    pub id: String,

    /// Apply to the whole reply thread
    #[arg(long)]
    pub thread: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `comments cascade`
#[derive(Debug, Args)]
pub struct CascadeArgs {
    /// Root comment ID
    pub id: String,

    /// Field to set on every reply
    pub field: String,

    /// JSON value to set (bare words are taken as strings)
    pub value: String,

    /// Output the full report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute `comments show`
pub async fn show(workspace: &Workspace, args: ShowArgs) -> Result<()> {
    let id = RecordId::parse(&args.id);
    let comment = workspace
        .service
        .find_one(&Criteria::new().eq("id", id.to_value()))
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comment)?);
        return Ok(());
    }

    println!("{} {}", "Comment".bold(), format!("#{}", comment.id).green());
    if let Some(author) = &comment.author {
        println!(
            "  Author:  {}",
            author.name.as_deref().unwrap_or("anonymous").cyan()
        );
    }
    if let Some(parent) = &comment.thread_of {
        println!("  Reply to: #{}", parent);
    }
    println!("  Blocked: {}", comment.blocked);
    println!("  Thread blocked: {}", comment.blocked_thread);
    if !comment.reports.is_empty() {
        println!("  Open reports: {}", comment.reports.len().to_string().yellow());
    }
    println!();
    println!("{}", comment.content);
    Ok(())
}

/// Execute `comments block` / `comments unblock`
pub async fn set_blocked(workspace: &Workspace, args: BlockArgs, blocked: bool) -> Result<()> {
    let id = RecordId::parse(&args.id);
    let outcome = if args.thread {
        workspace.service.block_thread(&id, blocked).await?
    } else {
        workspace.service.block_comment(&id, blocked).await?
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let action = if blocked { "Blocked" } else { "Unblocked" };
    let target = if args.thread { "thread of comment" } else { "comment" };
    println!("{} {} {} #{}", "✓".green(), action, target, id);
    if let Some(report) = outcome.cascade {
        println!("  {} replies updated", report.updated);
        if !report.succeeded() {
            eprintln!(
                "{} Some replies could not be updated ({} failed branches, {} cycles)",
                "⚠".yellow(),
                report.failed_branches,
                report.cycles
            );
        }
    }
    Ok(())
}

/// Execute `comments cascade`
pub async fn cascade(workspace: &Workspace, args: CascadeArgs) -> Result<()> {
    let id = RecordId::parse(&args.id);
    let value = parse_value(&args.value);

    let report = workspace
        .service
        .cascade_field_update_report(&id, &args.field, value)
        .await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.succeeded() {
        println!(
            "{} Set '{}' on {} of {} replies below #{}",
            "✓".green(),
            args.field,
            report.updated,
            report.matched,
            id
        );
    } else {
        eprintln!(
            "{} Cascade below #{} incomplete ({} failed branches, {} cycles)",
            "✗".red(),
            id,
            report.failed_branches,
            report.cycles
        );
    }

    if !report.succeeded() {
        anyhow::bail!("cascade below comment #{} did not complete", id);
    }
    Ok(())
}

/// JSON literal, or the raw text as a string
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
