//! credcache CLI - inspect, fill and clear the local login credential cache
//!
//! Automation agents normally link `credcache-core` directly; this binary is
//! for operators who want to seed a session ahead of an unattended run, check
//! what is cached, or throw the session away.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use credcache_core::config::{DEFAULT_KEY_FILE, DEFAULT_SESSION_FILE};
use credcache_core::{
    CredentialStore, DisabledPrompt, Environment, KeyBackend, ProcessEnvironment, StoreConfig,
};

/// credcache - encrypted local cache for automation login credentials
#[derive(Parser, Debug)]
#[command(name = "credcache")]
#[command(version)]
#[command(about = "Encrypted local cache for automation login credentials")]
struct Args {
    /// JSON config file (missing file means defaults)
    #[arg(long, global = true, env = "CREDCACHE_CONFIG")]
    config: Option<PathBuf>,

    /// Path of the session key file
    #[arg(long, global = true)]
    key_file: Option<PathBuf>,

    /// Path of the encrypted session record
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    /// Keep both files in the per-user data directory
    #[arg(long, global = true)]
    user_dir: bool,

    /// Keep the session key in the OS keychain instead of a key file
    #[arg(long, global = true)]
    keychain: bool,

    /// Never prompt; fail if no session or environment credentials exist
    #[arg(long, global = true)]
    no_prompt: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Resolve credentials (session, environment, then prompt) and cache them
    Acquire,
    /// Show what is cached on disk
    Status,
    /// Delete the session record and key
    Clear,
}

/// Layer config file, `--user-dir`, `CREDCACHE_*` environment overrides, then
/// path flags
fn build_config(args: &Args, env: &dyn Environment) -> Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => StoreConfig::default(),
    };

    if args.user_dir {
        let dir = StoreConfig::user_data_dir()?;
        config.key_file = dir.join(DEFAULT_KEY_FILE);
        config.session_file = dir.join(DEFAULT_SESSION_FILE);
    }

    config
        .apply_env_overrides(env)
        .context("Invalid CREDCACHE_* environment override")?;

    if let Some(path) = &args.key_file {
        config.key_file = path.clone();
    }
    if let Some(path) = &args.session_file {
        config.session_file = path.clone();
    }
    if args.keychain {
        config.key_backend = KeyBackend::Keychain;
    }

    Ok(config)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    // Logs go to stderr so stdout stays clean for status output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

/// Execute a command; `env` feeds both the config overrides and the
/// credential variables
fn run(args: Args, env: Box<dyn Environment>) -> Result<()> {
    let config = build_config(&args, env.as_ref())?;
    debug!(?config, "Resolved configuration");

    let mut store = CredentialStore::new(config).with_environment(env);
    if args.no_prompt {
        store = store.with_prompt(DisabledPrompt);
    }

    match args.command {
        Command::Acquire => {
            let pair = store
                .acquire_credentials()
                .context("No credentials available")?;
            let source = store
                .source()
                .map(|s| s.to_string())
                .unwrap_or_else(|| "memory".to_string());
            println!(
                "Credentials ready for {} (source: {})",
                pair.masked_identity(),
                source
            );
        }
        Command::Status => {
            let status = store.status();
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Command::Clear => {
            store.clear_session();
            println!("Session cleared");
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);
    run(args, Box::new(ProcessEnvironment))
}
