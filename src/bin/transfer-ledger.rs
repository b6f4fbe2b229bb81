use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use transfer_ledger::{
    bin_utils::{
        TransferService,
        csv_printer::{print_groups, print_summary},
        seed_accounts, write_accounts,
    },
    demo,
    engine::TransferError,
    store::{
        AccountQuery, AccountStore, AggregateSelection, GroupField,
        in_memory::InMemoryAccountStore, sqlite::SqliteAccountStore,
    },
};

#[derive(Parser)]
#[command(name = "transfer-ledger")]
#[command(author, version, about = "Accounts and money transfers on top of a pluggable store")]
struct Cli {
    /// SQLite database file; without it every run starts from an empty
    /// in-memory store
    #[arg(long, env = "LEDGER_DB", global = true)]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create accounts from a `username,email,age,country,balance` CSV file
    Seed { file: PathBuf },

    /// Apply transfers from an `amount,description,sender,recipient` CSV file
    /// and print the resulting accounts
    Transfer {
        file: PathBuf,

        /// Accounts CSV to create before applying the transfers
        #[arg(long)]
        seed: Option<PathBuf>,
    },

    /// Print all accounts as CSV
    Accounts,

    /// Print account count, total balance and average age
    Stats,

    /// Print account count and average age per group
    Groups {
        #[arg(long, value_enum, default_value = "country")]
        by: GroupBy,
    },

    /// Run the demonstration routines
    Demo,
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupBy {
    Country,
    Age,
}

impl From<GroupBy> for GroupField {
    fn from(by: GroupBy) -> Self {
        match by {
            GroupBy::Country => GroupField::Country,
            GroupBy::Age => GroupField::Age,
        }
    }
}

fn open(file: &Path) -> Result<File> {
    File::open(file).with_context(|| format!("Failed to open `{}`", file.display()))
}

fn run<S: AccountStore>(mut store: S, command: Commands) -> Result<S> {
    match command {
        Commands::Seed { file } => {
            seed_accounts(open(&file)?, &mut store)?;
        }
        Commands::Transfer { file, seed } => {
            if let Some(seed) = seed {
                seed_accounts(open(&seed)?, &mut store)?;
            }
            let input = open(&file)?;
            let service = TransferService {
                input,
                output: &mut std::io::stdout(),
                store,
                error_printer: Box::new(|index, err| match err {
                    TransferError::Validation(_) | TransferError::AccountNotFound { .. } => {
                        eprintln!("Transfer #{index} rejected: {err}")
                    }
                    TransferError::Store(_) => eprintln!("Transfer #{index} failed: {err}"),
                }),
            };
            store = service.run()?;
        }
        Commands::Accounts => write_accounts(&mut std::io::stdout(), &store)?,
        Commands::Stats => {
            let count = store.list_accounts(&AccountQuery::all())?.len();
            let aggregate = store.aggregate_accounts(AggregateSelection::all())?;
            print_summary(&mut std::io::stdout(), count, aggregate)?;
        }
        Commands::Groups { by } => {
            let groups = store.group_accounts_by(by.into())?;
            print_groups(&mut std::io::stdout(), groups)?;
        }
        Commands::Demo => {
            let reports = demo::run_all(&mut store);
            let failed = reports.iter().filter(|r| r.result.is_err()).count();
            if failed > 0 {
                anyhow::bail!("{failed} demo task(s) failed");
            }
        }
    }
    Ok(store)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG if set, stdout is reserved for CSV output
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "transfer_ledger=debug".to_string()
        } else {
            "transfer_ledger=info".to_string()
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.db {
        Some(path) => {
            let store = SqliteAccountStore::open(&path)
                .with_context(|| format!("Failed to open database `{}`", path.display()))?;
            run(store, cli.command).map(drop)
        }
        None => run(InMemoryAccountStore::default(), cli.command).map(drop),
    }
}
