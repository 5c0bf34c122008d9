//! Command-line front end for the library catalog.

use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;
use uuid::Uuid;

use library_batch::{
    catalog::{Category, EntityKind, MemberStatus, Selection},
    core::{
        job::{ExportJob, ExportScope, ImportJobBuilder},
        step::{Progress, RecordFailure, StepListener},
    },
    item::store::{BookFilter, CatalogStore, MemberFilter, SqliteStore},
};

/// Bulk CSV import and export for a library catalog.
#[derive(Parser)]
#[command(name = "library-batch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Catalog database URL.
    #[arg(
        long,
        global = true,
        env = "LIBRARY_DATABASE_URL",
        default_value = "sqlite://library.db"
    )]
    database_url: String,

    /// Signed-in owner.
    #[arg(long, global = true, env = "LIBRARY_USER_ID")]
    user: Option<Uuid>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a CSV file of books or members.
    Import {
        /// The `.csv` file to import.
        file: PathBuf,

        /// What the file holds: books or members.
        #[arg(short, long, default_value = "books")]
        kind: EntityKind,

        /// Validate every record without saving anything.
        #[arg(long)]
        dry_run: bool,
    },

    /// Export books to CSV.
    Export {
        /// Export only these book ids (comma-separated).
        #[arg(long)]
        ids: Option<Selection>,

        /// Directory to write the file into.
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Browse and delete books.
    Books {
        #[command(subcommand)]
        action: BookAction,
    },

    /// Browse and manage members.
    Members {
        #[command(subcommand)]
        action: MemberAction,
    },
}

#[derive(Subcommand)]
enum BookAction {
    /// List books ordered by title.
    List {
        /// Match title, author or ISBN.
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        category: Option<Category>,
    },

    Delete { id: i64 },
}

#[derive(Subcommand)]
enum MemberAction {
    /// List members ordered by name.
    List {
        /// Match name or email.
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Change the status of a member.
    Status { id: i64, status: MemberStatus },

    Delete { id: i64 },
}

/// Prints import progress on stderr.
struct ConsoleProgress;

impl StepListener for ConsoleProgress {
    fn on_progress(&self, progress: Progress) {
        eprint!(
            "\rImporting... {}% ({}/{})",
            progress.percent, progress.processed, progress.total
        );
        if progress.processed == progress.total {
            eprintln!();
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let store = SqliteStore::connect(&cli.database_url)
        .with_context(|| format!("cannot open {}", cli.database_url))?
        .with_user(cli.user);

    match cli.command {
        Commands::Import {
            file,
            kind,
            dry_run,
        } => import(&store, &file, kind, dry_run),
        Commands::Export { ids, out } => export(&store, ids, &out),
        Commands::Books { action } => books(&store, action),
        Commands::Members { action } => members(&store, action),
    }
}

fn import(store: &SqliteStore, file: &Path, kind: EntityKind, dry_run: bool) -> Result<()> {
    let progress = ConsoleProgress;
    let job = ImportJobBuilder::new()
        .store(store)
        .kind(kind)
        .dry_run(dry_run)
        .listener(&progress)
        .build()?;

    let outcome = job
        .run_path(file)
        .with_context(|| format!("cannot import {}", file.display()))?;

    println!("{}", outcome.summary());
    for RecordFailure { index, reason } in &outcome.failures {
        println!("  record {}: {}", index, reason.describe());
    }

    Ok(())
}

fn export(store: &SqliteStore, ids: Option<Selection>, out: &Path) -> Result<()> {
    let scope = match &ids {
        Some(selection) => ExportScope::from(selection),
        None => ExportScope::All,
    };

    let file = ExportJob::new(store).run_today(&scope)?;
    let path = file.write_to_dir(out)?;

    println!("Exported {} books to {}", file.count, path.display());
    Ok(())
}

fn books(store: &SqliteStore, action: BookAction) -> Result<()> {
    match action {
        BookAction::List { search, category } => {
            let mut filter = BookFilter::new();
            if let Some(owner_id) = store.current_user_id() {
                filter = filter.owner(owner_id);
            }
            if let Some(search) = search {
                filter = filter.search(&search);
            }
            if let Some(category) = category {
                filter = filter.category(category);
            }

            for book in store.query_books(&filter)? {
                println!(
                    "{:>6}  {}  [{}, {}]",
                    book.id.unwrap_or_default(),
                    book.label(),
                    book.category,
                    book.status
                );
            }
        }
        BookAction::Delete { id } => {
            store.delete_book(id)?;
            println!("Deleted book {id}");
        }
    }

    Ok(())
}

fn members(store: &SqliteStore, action: MemberAction) -> Result<()> {
    match action {
        MemberAction::List { search } => {
            let mut filter = MemberFilter::new();
            if let Some(owner_id) = store.current_user_id() {
                filter = filter.owner(owner_id);
            }
            if let Some(search) = search {
                filter = filter.search(&search);
            }

            for member in store.query_members(&filter)? {
                println!(
                    "{:>6}  {}  [{}]",
                    member.id.unwrap_or_default(),
                    member.label(),
                    member.status
                );
            }
        }
        MemberAction::Status { id, status } => {
            store.update_member_status(id, status)?;
            println!("Member {id} is now {status}");
        }
        MemberAction::Delete { id } => {
            store.delete_member(id)?;
            println!("Deleted member {id}");
        }
    }

    Ok(())
}
