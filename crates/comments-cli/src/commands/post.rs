//! Post command
//!
//! Admit a new comment and append it to the comments collection.

use super::Workspace;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comments_core::comment::{NewAuthor, NewComment};
use comments_core::store::COMMENTS_COLLECTION;
use comments_core::RecordId;
use serde_json::Value;

/// Arguments of `comments post`
#[derive(Debug, Args)]
pub struct PostArgs {
    /// Relation token of the commented record
    #[arg(long)]
    pub related: String,

    /// Comment text
    #[arg(long)]
    pub content: String,

    /// Parent comment ID for replies
    #[arg(long)]
    pub reply_to: Option<String>,

    /// Registered author ID
    #[arg(long, conflicts_with_all = ["name", "email"])]
    pub user: Option<String>,

    /// Anonymous author name
    #[arg(long, requires = "email")]
    pub name: Option<String>,

    /// Anonymous author email
    #[arg(long, requires = "name")]
    pub email: Option<String>,

    /// Output the stored record as JSON
    #[arg(long)]
    pub json: bool,
}

impl PostArgs {
    fn author(&self) -> Result<NewAuthor> {
        if let Some(user) = &self.user {
            return Ok(NewAuthor::User(RecordId::parse(user)));
        }
        match (&self.name, &self.email) {
            (Some(name), Some(email)) => Ok(NewAuthor::Anonymous {
                id: None,
                name: name.clone(),
                email: email.clone(),
                avatar: None,
            }),
            _ => anyhow::bail!("either --user or --name and --email are required"),
        }
    }
}

/// Execute `comments post`
pub async fn execute(workspace: &Workspace, args: PostArgs) -> Result<()> {
    let draft = NewComment {
        content: args.content.clone(),
        related: args.related.clone(),
        thread_of: args.reply_to.as_deref().map(RecordId::parse),
        author: args.author()?,
        approval_status: None,
    };

    let record = workspace.service.prepare_comment(draft).await?;
    let record = workspace.store.create(COMMENTS_COLLECTION, record).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        println!(
            "{} Posted comment {}",
            "✓".green(),
            format!("#{}", record["id"]).green()
        );
        if record.get("approvalStatus").and_then(Value::as_str) == Some("PENDING") {
            println!("  {}", "Awaiting approval".yellow());
        }
    }
    Ok(())
}
