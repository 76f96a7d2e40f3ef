//! Access code manager for the career highlights page.
//!
//! Codes live in a local SQLite file. After changing them, run `export` and
//! copy the printed list into the server's `CAREER_CODES` variable.

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use thiserror::Error;

use career_gate::config::CODES_VAR;
use career_gate::expiry::{parse_instant, parse_lifetime, LifetimeError};
use career_gate::models::access_code::CodeStatus;
use career_gate::store::{CodeStore, StoreError};

#[derive(Debug, Parser)]
#[command(name = "manage-codes", version, about = "Career Highlights access code manager")]
struct Cli {
    /// SQLite file holding the issued codes
    #[arg(long, env = "CAREER_CODES_DB", default_value = "career-codes.db")]
    db: PathBuf,

    /// Page URL used to print a direct link for new codes
    #[arg(long, env = "CAREER_LINK_BASE")]
    link_base: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new code, e.g. `add "Jane Smith" 7d`
    Add {
        name: String,
        /// Lifetime such as 7d, 48h or 30d
        duration: String,
    },
    /// Show all codes and their status
    List,
    /// Remove a specific code
    Revoke { code: String },
    /// Remove all expired codes
    Cleanup,
    /// Print the JSON list for the CAREER_CODES variable
    Export,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Lifetime(#[from] LifetimeError),

    #[error("could not encode codes: {0}")]
    Encode(#[from] serde_json::Error),
}

fn display_time(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d %H:%M UTC").to_string()
}

/// Single-quote a value for a POSIX shell.
fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

fn run(cli: Cli) -> Result<(), CliError> {
    let store = CodeStore::open(&cli.db)?;
    log::debug!("using code store at {}", cli.db.display());

    match cli.command {
        Command::Add { name, duration } => {
            let lifetime = parse_lifetime(&duration)?;
            let created = store.add(&name, lifetime, Utc::now())?;
            let expires = parse_instant(&created.expires)
                .map(display_time)
                .unwrap_or_else(|| created.expires.clone());

            println!("\n  Code created successfully:\n");
            println!("  Code:     {}", created.code);
            println!("  For:      {}", created.name);
            println!("  Expires:  {expires}");
            if let Some(base) = cli.link_base {
                println!("\n  Direct link: {base}?code={}", created.code);
            }
            println!("\n  Run \"manage-codes export\" to get the {CODES_VAR} value.\n");
        }
        Command::List => {
            let codes = store.list()?;
            if codes.is_empty() {
                println!("\n  No codes found.\n");
                return Ok(());
            }
            println!("\n  Access codes:\n");
            let now = Utc::now();
            for code in codes {
                let status = match code.status(now) {
                    CodeStatus::Active(until) => format!("valid until {}", display_time(until)),
                    CodeStatus::Expired => "EXPIRED".to_string(),
                };
                println!("  {}  |  {:<20}  |  {status}", code.code, code.name);
            }
            println!();
        }
        Command::Revoke { code } => {
            let revoked = store.revoke(&code)?;
            println!("\n  Code \"{revoked}\" revoked.\n");
        }
        Command::Cleanup => {
            let report = store.cleanup(Utc::now())?;
            println!(
                "\n  Removed {} expired codes. {} active.\n",
                report.removed, report.remaining
            );
        }
        Command::Export => {
            let exported = serde_json::to_string(&store.export()?)?;
            println!("\n  Copy this value into the {CODES_VAR} environment variable:\n");
            println!("{exported}");
            println!("\n  Or in a shell:");
            println!("  export {CODES_VAR}={}\n", shell_quote(&exported));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\n  {e}\n");
            ExitCode::FAILURE
        }
    }
}
