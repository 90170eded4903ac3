//! comments - threaded comment retrieval and moderation CLI
//!
//! Operator front-end over a comments data directory.
//!
//! ## Quick Start
//!
//! ```bash
//! # List the second page of comments attached to an article
//! comments list --related api::article.article:1 --page 2 --page-size 5 --with-count
//!
//! # Show the reply tree, hiding blocked threads
//! comments tree --related api::article.article:1 --drop-blocked
//!
//! # Block a whole thread
//! comments block 12 --thread
//! ```

mod commands;

#[tokio::main]
async fn main() {
    if let Err(err) = commands::run().await {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
