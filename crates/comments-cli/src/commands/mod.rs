//! CLI commands module
//!
//! This module contains all CLI command implementations.

pub mod check;
pub mod config;
pub mod list;
pub mod moderate;
pub mod post;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comments_core::CommentService;
use comments_storage::{DataDir, JsonFileStore};
use std::path::PathBuf;
use std::sync::Arc;

/// comments - threaded comment retrieval and moderation
#[derive(Debug, Parser)]
#[command(name = "comments")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Data directory (collections, config document, comments.toml)
    #[arg(short, long, global = true, env = "COMMENTS_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List comments as a flat, annotated page
    List(list::ListArgs),

    /// Show comments as reply trees
    Tree(list::TreeArgs),

    /// Show a single comment
    Show(moderate::ShowArgs),

    /// Block a comment or its whole thread
    Block(moderate::BlockArgs),

    /// Unblock a comment or its whole thread
    Unblock(moderate::BlockArgs),

    /// Set a field on every reply below a comment
    Cascade(moderate::CascadeArgs),

    /// Run the profanity check on some text
    Check(check::CheckArgs),

    /// Validate a relation token against the enabled collections
    Validate(check::ValidateArgs),

    /// Submit a new comment
    Post(post::PostArgs),

    /// Inspect configuration
    #[command(subcommand)]
    Config(config::ConfigCommand),
}

/// Opened data directory
pub struct Workspace {
    pub data: DataDir,
    pub store: Arc<JsonFileStore>,
    pub service: CommentService,
}

impl Workspace {
    /// Open the data directory and wire the service over it
    pub fn open(data_dir: Option<PathBuf>) -> Result<Self> {
        let data = data_dir
            .map(DataDir::new)
            .unwrap_or_else(DataDir::default_location);
        let store = Arc::new(
            data.record_store()
                .with_context(|| format!("Failed to open data directory {:?}", data.root()))?,
        );
        let resolver = data.resolver().context("Failed to load configuration")?;
        let service = CommentService::new(store.clone(), resolver);
        Ok(Self {
            data,
            store,
            service,
        })
    }
}

/// Run the CLI application
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    setup_logging(cli.verbose);

    // Handle color output
    if cli.no_color {
        colored::control::set_override(false);
    }

    let workspace = Workspace::open(cli.data_dir)?;

    // Dispatch to command handler
    match cli.command {
        Commands::List(args) => list::execute_list(&workspace, args).await,
        Commands::Tree(args) => list::execute_tree(&workspace, args).await,
        Commands::Show(args) => moderate::show(&workspace, args).await,
        Commands::Block(args) => moderate::set_blocked(&workspace, args, true).await,
        Commands::Unblock(args) => moderate::set_blocked(&workspace, args, false).await,
        Commands::Cascade(args) => moderate::cascade(&workspace, args).await,
        Commands::Check(args) => check::check(&workspace, args).await,
        Commands::Validate(args) => check::validate(&workspace, args).await,
        Commands::Post(args) => post::execute(&workspace, args).await,
        Commands::Config(cmd) => config::execute(&workspace, cmd).await,
    }
}

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::EnvFilter;

    let filter = match verbosity {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
