//! Check and validate commands

use super::Workspace;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

/// Arguments of `comments check`
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Text to check
    pub text: String,
}

/// Arguments of `comments validate`
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Relation token, e.g. api::article.article:1
    pub token: String,
}

/// Execute `comments check`
pub async fn check(workspace: &Workspace, args: CheckArgs) -> Result<()> {
    match workspace.service.check_bad_words(Some(&args.text)).await {
        Ok(_) => {
            println!("{} Content is clean.", "✓".green());
            Ok(())
        }
        Err(err) => {
            if let Some(details) = err.details() {
                if let Some(filtered) = details["content"]["filtered"].as_str() {
                    eprintln!("{} {}", "Filtered:".yellow(), filtered);
                }
            }
            Err(err.into())
        }
    }
}

/// Execute `comments validate`
pub async fn validate(workspace: &Workspace, args: ValidateArgs) -> Result<()> {
    let relation = workspace.service.validate_relation(&args.token).await?;
    println!(
        "{} {} -> collection {}, id {}",
        "✓".green(),
        args.token,
        relation.collection.cyan(),
        relation.id
    );
    Ok(())
}
