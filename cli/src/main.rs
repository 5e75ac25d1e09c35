// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Astra CLI
//!
//! Entry point for the `astra` binary. Parses arguments, initializes
//! logging and the alias store, builds the client for the selected
//! network, and dispatches to the command handlers.
//!
//! The binary never panics on user error: handlers return errors, and this
//! file formats them and exits non-zero (or prints the bare `error` token
//! in `--testing` mode, for harnesses that grep output).

mod cli;
mod commands;
mod logging;
mod resolver;
mod store;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;

use astra_client::{Client, Network};

use cli::{AstraCli, Commands};
use commands::App;
use logging::LogFormat;
use resolver::Resolver;
use store::SledStore;

#[tokio::main]
async fn main() {
    let args = AstraCli::parse();

    let default_level = if args.verbose {
        "astra_cli=debug,astra_client=debug"
    } else {
        "astra_cli=warn,astra_client=warn"
    };
    let format = std::env::var("ASTRA_LOG_FORMAT")
        .map(|s| LogFormat::from_str_lossy(&s))
        .unwrap_or(LogFormat::Pretty);
    logging::init_logging(default_level, format);

    let testing = args.testing;
    if let Err(err) = run(args).await {
        if testing {
            // Fixed token for test harnesses, regardless of the cause.
            println!("error");
        } else {
            eprintln!("error: {err:#}");
        }
        std::process::exit(1);
    }
}

async fn run(args: AstraCli) -> Result<()> {
    if let Commands::Version = args.command {
        print_version();
        return Ok(());
    }

    let client = build_client(&args.network)?;
    let store = SledStore::open(&args.store)
        .with_context(|| format!("could not open store at {}", args.store.display()))?;
    let app = App::new(Resolver::new(client, Arc::new(store), &args.ns));

    match &args.command {
        Commands::Version => unreachable!("handled above"),
        Commands::Set(set_args) => app.set(set_args),
        Commands::Get { key } => app.get(key),
        Commands::Del { key } => app.del(key),
        Commands::Account(cmd) => app.account(cmd).await,
        Commands::Asset(cmd) => app.asset(cmd),
        Commands::Pay(pay_args) => app.pay(pay_args).await,
        Commands::Balance { account, asset } => app.balance(account, asset.as_deref()).await,
        Commands::Watch { account, cursor } => app.watch(account, cursor.as_deref()).await,
    }
}

/// Builds the client for the requested network.
///
/// Only the in-process fake network has a transport in this build; the
/// test and public networks are recognized but refused with a clear error
/// rather than silently falling back to the fake.
fn build_client(network: &str) -> Result<Client> {
    let network: Network = network
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown network: {network} (expected fake, test, or public)"))?;

    match network {
        Network::Fake => Ok(Client::fake()),
        other => bail!(
            "network '{other}' has no transport wired into this build; \
             only --network fake is supported"
        ),
    }
}

/// Prints version information to stdout.
fn print_version() {
    println!("astra {}", env!("CARGO_PKG_VERSION"));
}
