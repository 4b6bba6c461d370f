// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line interface — argument parsing and command dispatch.
//
// Every command prints its result as JSON on stdout; logs go to stderr.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::info;

use leafcount_core::error::{LeafcountError, Result};
use leafcount_core::types::{BookId, ExternalBook, PageId, PageStatus};
use leafcount_pipeline::ProcessingTask;

use crate::services::app_services::{AppServices, config_path, persist_config};

#[derive(Debug, Parser)]
#[command(name = "leafcount")]
#[command(about = "Word counts and readability for photographed book pages")]
#[command(version)]
pub struct Cli {
    /// Data directory holding the database, images and config.json
    #[arg(long, global = true, env = "LEAFCOUNT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage books
    Book {
        #[command(subcommand)]
        command: BookCommand,
    },

    /// Manage photographed pages
    Page {
        #[command(subcommand)]
        command: PageCommand,
    },

    /// Show or write the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum BookCommand {
    /// Create a book
    Create {
        title: String,
        #[arg(long)]
        author: Option<String>,
        /// Page count of the physical book, enables whole-book estimates
        #[arg(long)]
        total_pages: Option<u32>,
    },

    /// List books, newest first
    List,

    /// Show a book with its word-count and readability statistics
    Show { id: BookId },

    /// Delete a book with all of its pages and images
    Delete { id: BookId },

    /// Import a book from a reading-tracker account (idempotent)
    Import(ImportArgs),

    /// Find the book imported from an external record
    FindExternal { external_id: String },
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    #[arg(long)]
    pub external_id: String,
    #[arg(long)]
    pub external_user_id: String,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub total_pages: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum PageCommand {
    /// Upload a page photo and process it
    Upload {
        book: BookId,
        number: u32,
        file: PathBuf,
    },

    /// Run a page through OCR and analysis again
    Reprocess { id: PageId },

    /// List a book's pages in page order
    List { book: BookId },

    /// Delete a page and its image
    Delete { id: PageId },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write the effective configuration to config.json
    Init,
}

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let services = AppServices::init(cli.data_dir)?;
    let library = &services.library;

    match cli.command {
        Command::Book { command } => match command {
            BookCommand::Create {
                title,
                author,
                total_pages,
            } => print_json(&library.create_book(title, author, total_pages)?),
            BookCommand::List => print_json(&library.list_books()?),
            BookCommand::Show { id } => print_json(&library.summarize_book(&id)?),
            BookCommand::Delete { id } => {
                library.delete_book(&id).await?;
                print_json(&json!({ "deleted": id }))
            }
            BookCommand::Import(args) => {
                let id = library.import_external_book(ExternalBook {
                    external_id: args.external_id,
                    external_user_id: args.external_user_id,
                    title: args.title,
                    author: args.author,
                    total_pages: args.total_pages,
                })?;
                print_json(&json!({ "id": id }))
            }
            BookCommand::FindExternal { external_id } => {
                print_json(&library.find_by_external_id(&external_id)?)
            }
        },

        Command::Page { command } => match command {
            PageCommand::Upload { book, number, file } => {
                let image = tokio::fs::read(&file).await?;
                let (page_id, task) = library.upload_page(&book, number, &image).await?;
                let status = wait(task).await?;
                info!(page_id = %page_id, status = %status, "upload finished");
                print_json(&library.get_page(&page_id)?)
            }
            PageCommand::Reprocess { id } => {
                let status = wait(library.reprocess_page(&id)?).await?;
                info!(page_id = %id, status = %status, "re-process finished");
                print_json(&library.get_page(&id)?)
            }
            PageCommand::List { book } => print_json(&library.list_pages(&book).await?),
            PageCommand::Delete { id } => {
                library.delete_page(&id).await?;
                print_json(&json!({ "deleted": id }))
            }
        },

        Command::Config { command } => match command {
            ConfigCommand::Show => print_json(&services.config),
            ConfigCommand::Init => {
                persist_config(&services.data_dir, &services.config)?;
                print_json(&json!({ "written": config_path(&services.data_dir) }))
            }
        },
    }
}

async fn wait(task: ProcessingTask) -> Result<PageStatus> {
    task.await
        .map_err(|e| LeafcountError::Task(e.to_string()))?
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
