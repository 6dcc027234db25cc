//! # tabsplit CLI
//!
//! Finalizes or inspects a receipt document.
//!
//! ## Usage
//! ```bash
//! # Print the finalized split as JSON
//! cargo run -p tabsplit-session --bin tabsplit -- finalize receipt.json
//!
//! # Print claimed / remaining units per item
//! cargo run -p tabsplit-session --bin tabsplit -- check receipt.json
//!
//! # Use a specific config file
//! cargo run -p tabsplit-session --bin tabsplit -- --config ./tabsplit.toml check receipt.json
//! ```
//!
//! ## Document Format
//! ```json
//! {
//!   "id": "dinner",
//!   "totals": { "subtotal": "30.00", "tax_total": "3.00", "tip_total": "5.00" },
//!   "items": [{ "id": "a", "name": "Pizza", "quantity": 1, "total_price": "20.00" }],
//!   "claims": [{ "item_id": "a", "user_id": "alice", "claimed_quantity": 1 }]
//! }
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use tabsplit_core::ReceiptDocument;
use tabsplit_session::{init_tracing, ReceiptSession, SessionConfig, SessionResult};
use tracing::error;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Finalize(PathBuf),
    Check(PathBuf),
}

/// Outcome of reading the command line.
#[derive(Debug, PartialEq, Eq)]
enum Parsed {
    Run {
        config_path: Option<PathBuf>,
        command: Command,
    },
    Help,
    /// Bad arguments; the message, if any, is printed before the usage text.
    Usage(Option<String>),
}

fn print_usage() {
    println!("tabsplit - split a shared receipt");
    println!();
    println!("Usage: tabsplit [OPTIONS] <COMMAND> <RECEIPT.json>");
    println!();
    println!("Commands:");
    println!("  finalize   Print the finalized per-user split as JSON");
    println!("  check      Print claimed and remaining units per item");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>   Config file (default: platform config dir)");
    println!("  -h, --help            Show this help message");
}

fn parse_args(args: &[String]) -> Parsed {
    let mut config_path: Option<PathBuf> = None;
    let mut positional: Vec<&str> = Vec::new();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let Some(path) = args.get(i + 1) else {
                    return Parsed::Usage(Some(format!("{} requires a path", args[i])));
                };
                config_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--help" | "-h" => return Parsed::Help,
            other => positional.push(other),
        }
        i += 1;
    }

    let command = match positional.as_slice() {
        ["finalize", path] => Command::Finalize(PathBuf::from(path)),
        ["check", path] => Command::Check(PathBuf::from(path)),
        _ => return Parsed::Usage(None),
    };
    Parsed::Run {
        config_path,
        command,
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    let (config_path, command) = match parse_args(&args) {
        Parsed::Run {
            config_path,
            command,
        } => (config_path, command),
        Parsed::Help => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Parsed::Usage(message) => {
            if let Some(message) = message {
                eprintln!("error: {message}");
            }
            print_usage();
            return ExitCode::from(2);
        }
    };

    let config = SessionConfig::load_or_default(config_path);
    init_tracing(&config.logging.filter);

    match run(command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(code = e.code(), "{}", e);
            eprintln!("error [{}]: {}", e.code(), e);
            ExitCode::FAILURE
        }
    }
}

fn load(path: &Path, config: &SessionConfig) -> SessionResult<ReceiptSession> {
    let contents = std::fs::read_to_string(path)?;
    let document: ReceiptDocument = serde_json::from_str(&contents)?;
    ReceiptSession::from_document(document, config)
}

fn run(command: Command, config: &SessionConfig) -> SessionResult<()> {
    match command {
        Command::Finalize(path) => {
            let session = load(&path, config)?;
            let snapshot = session.finalize("cli")?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Check(path) => {
            let session = load(&path, config)?;
            let (rows, tax_rate) = session.read(|receipt| {
                let rows = receipt
                    .items()
                    .iter()
                    .map(|item| {
                        let claimed = receipt.total_claimed(&item.id);
                        let remaining = receipt.ledger().remaining(item);
                        let mode = if receipt.ledger().is_split(&item.id) {
                            "split"
                        } else if !item.available {
                            "unavailable"
                        } else {
                            "units"
                        };
                        format!(
                            "{:<20} {:>4} {:>8} {:>9} {:>10}  {}",
                            item.id,
                            item.quantity,
                            claimed,
                            remaining,
                            item.total_price.to_string(),
                            mode
                        )
                    })
                    .collect::<Vec<_>>();
                (rows, receipt.effective_tax_rate())
            })?;

            println!(
                "{:<20} {:>4} {:>8} {:>9} {:>10}  mode",
                "item", "qty", "claimed", "remaining", "price"
            );
            for row in rows {
                println!("{row}");
            }
            println!();
            println!("effective tax rate: {:.2}%", tax_rate.percentage());
            match session.preview() {
                Ok(preview) => {
                    println!("available subtotal: {}", preview.available_subtotal);
                    println!("unclaimed:          {}", preview.unclaimed);
                    println!("would bill:         {}", preview.grand_total);
                }
                Err(e) => println!("\nnot finalizable yet: {e}"),
            }
        }
    }
    Ok(())
}
