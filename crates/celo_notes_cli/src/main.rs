//! Terminal front-end for the notes dApp.
//!
//! # Responsibility
//! - Load configuration, start logging and mount the dApp façade.
//! - Map one subcommand to one user intent and print the resulting view.

use celo_notes_core::{
    init_logging, ActionResponse, AppConfig, NotesDapp, SessionManager, ViewSnapshot,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "celo-notes")]
#[command(version = celo_notes_core::core_version())]
#[command(about = "Manage on-chain notes from a Celo wallet")]
struct Cli {
    /// Env file to load instead of `./.env`
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show address, balance and all notes
    List,
    /// Show the connected address and CELO balance
    Balance,
    /// Add a public note
    Add {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        body: String,
    },
    /// Mark a note as completed
    Complete {
        /// Decimal note id as shown by `list`
        id: String,
    },
    /// Delete a note
    Delete {
        /// Decimal note id as shown by `list`
        id: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::List);

    let config = match cli.env_file.as_deref() {
        Some(path) => AppConfig::from_env_file(path),
        None => AppConfig::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = init_logging(&config.log_level, config.log_dir.as_deref()) {
        eprintln!("logging disabled: {err}");
    }
    log::debug!("event=cli_start module=cli status=ok config={config:?}");

    let (provider, contract_address) =
        match (config.wallet_provider(), config.contract_address()) {
            (Ok(provider), Ok(address)) => (provider, address),
            (Err(err), _) | (_, Err(err)) => {
                eprintln!("configuration error: {err}");
                return ExitCode::FAILURE;
            }
        };

    let mut dapp = NotesDapp::new(SessionManager::new(provider, contract_address));
    let mounted = dapp.mount().await;
    if !mounted.ok {
        print_view(&dapp.snapshot(), false);
        eprintln!("{}", mounted.message);
        return ExitCode::FAILURE;
    }

    let outcome = match command {
        Commands::List => mounted,
        Commands::Balance => {
            print_view(&dapp.snapshot(), false);
            return ExitCode::SUCCESS;
        }
        Commands::Add { title, body } => dapp.add_note(&title, &body).await,
        Commands::Complete { id } => dapp.complete_note(&id).await,
        Commands::Delete { id } => dapp.delete_note(&id).await,
    };

    print_view(&dapp.snapshot(), true);
    report(&outcome)
}

fn report(outcome: &ActionResponse) -> ExitCode {
    match (&outcome.tx_hash, outcome.ok) {
        (Some(tx), true) => println!("{} (tx {tx})", outcome.message),
        (None, true) => println!("{}", outcome.message),
        (_, false) => eprintln!("error: {}", outcome.message),
    }
    if outcome.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_view(view: &ViewSnapshot, with_notes: bool) {
    if let Some(notice) = &view.notice {
        println!("! {notice}");
    }
    let address = view.short_address.as_deref().unwrap_or("not connected");
    let balance = view.balance.as_deref().unwrap_or("-- CELO");
    println!("{address}  {balance}");

    if !with_notes {
        return;
    }
    if view.notes.is_empty() {
        println!("(no notes)");
    }
    for note in &view.notes {
        println!(
            "#{} [{}] {} ({})",
            note.id, note.status, note.title, note.last_modified
        );
        if !note.body.is_empty() {
            println!("    {}", note.body);
        }
    }
}
