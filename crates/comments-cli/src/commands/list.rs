//! List and tree commands
//!
//! Flat, annotated listings and reply trees.

use super::Workspace;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use comments_core::comment::{CommentNode, CommentView, Related};
use comments_core::query::{PaginationInput, SortInput};
use comments_core::{FindParams, HierarchyParams, RecordId, RelatedLookup};

/// Filters shared by both listings
#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Only comments attached to this relation token
    #[arg(long)]
    pub related: Option<String>,

    /// Sort field, optionally suffixed with :asc or :desc (repeatable)
    #[arg(long)]
    pub sort: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `comments list`
#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Page number (selects page-based pagination)
    #[arg(long)]
    pub page: Option<u64>,

    /// Page size (selects page-based pagination)
    #[arg(long)]
    pub page_size: Option<u64>,

    /// Records to skip
    #[arg(long, conflicts_with_all = ["page", "page_size"])]
    pub start: Option<u64>,

    /// Records to return
    #[arg(long, conflicts_with_all = ["page", "page_size"])]
    pub limit: Option<u64>,

    /// Report the total number of matches
    #[arg(long)]
    pub with_count: bool,
}

impl ListArgs {
    fn pagination(&self) -> Option<PaginationInput> {
        let requested = self.page.is_some()
            || self.page_size.is_some()
            || self.start.is_some()
            || self.limit.is_some()
            || self.with_count;
        if !requested {
            return None;
        }
        let mut input = PaginationInput {
            page: self.page.map(Into::into),
            page_size: self.page_size.map(Into::into),
            start: self.start.map(Into::into),
            limit: self.limit.map(Into::into),
            with_count: None,
        };
        if self.with_count {
            input = input.with_count();
        }
        Some(input)
    }
}

/// Arguments of `comments tree`
#[derive(Debug, Args)]
pub struct TreeArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    /// Show the replies of this comment instead of the roots
    #[arg(long)]
    pub from: Option<String>,

    /// Hide blocked threads entirely
    #[arg(long)]
    pub drop_blocked: bool,
}

fn find_params(filter: &FilterArgs) -> FindParams {
    let mut params = FindParams::new();
    if let Some(related) = &filter.related {
        params = params.related(related.clone());
    }
    if !filter.sort.is_empty() {
        params.sort = Some(SortInput::Many(filter.sort.clone()));
    }
    params
}

/// Execute `comments list`
pub async fn execute_list(workspace: &Workspace, args: ListArgs) -> Result<()> {
    let mut params = find_params(&args.filter);
    params.pagination = args.pagination();

    let page = workspace.service.find_all_flat(&params, RelatedLookup::Batch).await?;

    if args.filter.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    if page.data.is_empty() {
        println!("No comments found.");
        return Ok(());
    }

    println!("{}", "Comments:".bold().underline());
    println!();
    for comment in &page.data {
        print_comment(comment, 1);
        if let Some(thread) = &comment.thread {
            if thread.has_children {
                println!(
                    "    {}",
                    format!("{} direct replies", thread.immediate_child_count).dimmed()
                );
            }
        }
    }
    if let Some(meta) = &page.meta {
        println!();
        println!("{}", serde_json::to_string(&meta.pagination)?.dimmed());
    }
    Ok(())
}

/// Execute `comments tree`
pub async fn execute_tree(workspace: &Workspace, args: TreeArgs) -> Result<()> {
    let params = HierarchyParams {
        find: find_params(&args.filter),
        starting_from: args.from.as_deref().map(RecordId::parse),
        drop_blocked_threads: args.drop_blocked,
    };

    let forest = workspace
        .service
        .find_all_in_hierarchy(&params, RelatedLookup::Batch)
        .await?;

    if args.filter.json {
        println!("{}", serde_json::to_string_pretty(&forest)?);
        return Ok(());
    }

    if forest.is_empty() {
        println!("No comments found.");
        return Ok(());
    }
    for node in &forest {
        print_node(node, 1);
    }
    let total: usize = forest.iter().map(CommentNode::size).sum();
    println!();
    println!(
        "{}",
        format!("{} threads, {} comments", forest.len(), total).dimmed()
    );
    Ok(())
}

fn print_node(node: &CommentNode, depth: usize) {
    print_comment(&node.comment, depth);
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn print_comment(comment: &CommentView, depth: usize) {
    let indent = "  ".repeat(depth);
    let author = comment
        .author
        .as_ref()
        .and_then(|a| a.name.clone())
        .unwrap_or_else(|| "anonymous".to_string());

    let mut flags = Vec::new();
    if comment.blocked {
        flags.push("blocked".red().to_string());
    }
    if comment.blocked_thread {
        flags.push("thread blocked".red().to_string());
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    println!(
        "{}{} {}{}: {}",
        indent,
        format!("#{}", comment.id).green(),
        author.cyan(),
        flags,
        comment.content
    );
    if let Some(Related::Entity(entity)) = &comment.related {
        if let Some(title) = entity.get("title").and_then(|t| t.as_str()) {
            println!("{}  {}", indent, format!("on {}", title).dimmed());
        }
    }
}
