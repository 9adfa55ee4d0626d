//! Maintenance CLI over the classsync cache database.

use clap::{Parser, Subcommand};
use classsync_core::{CacheKey, CacheStore, EngineConfig, SqliteCacheStore};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "classsync", version, about = "Inspect and maintain the classsync cache")]
struct Cli {
    /// TOML config file; falls back to CLASSSYNC_CONFIG, then defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Checks that the core library links.
    Ping,
    Version,
    /// Lists cached keys, optionally limited to one namespace.
    CacheKeys {
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Clears the cache but keeps the stored credential.
    ResetCache,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Ping => println!("classsync_core ping={}", classsync_core::ping()),
        Command::Version => println!("classsync_core version={}", classsync_core::core_version()),
        Command::CacheKeys { namespace } => {
            let store = open_store(cli.config)?;
            let keys = store.list_keys().map_err(|err| err.to_string())?;
            for key in keys {
                let matches = match (&namespace, CacheKey::parse(&key)) {
                    (None, _) => true,
                    (Some(wanted), Some(parsed)) => parsed.namespace() == wanted,
                    (Some(_), None) => false,
                };
                if matches {
                    println!("{key}");
                }
            }
        }
        Command::ResetCache => {
            let store = open_store(cli.config)?;
            let removed = store
                .reset_preserving_credential()
                .map_err(|err| err.to_string())?;
            println!("removed={removed}");
        }
    }
    Ok(())
}

fn open_store(config_path: Option<PathBuf>) -> Result<SqliteCacheStore, String> {
    let config = EngineConfig::load(config_path.as_deref()).map_err(|err| err.to_string())?;
    classsync_core::init_from_config(&config).map_err(|err| err.to_string())?;
    log::info!(
        "event=cli_open module=cli status=ok cache_path={}",
        config.cache_path.display()
    );
    SqliteCacheStore::open(&config.cache_path).map_err(|err| err.to_string())
}
