//! # CLI Interface
//!
//! Defines the command-line argument structure for `astra` using `clap`
//! derive. Global flags select the network, store location, and namespace;
//! subcommands cover payments, balances, watching, and alias management.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Astra ledger command-line client.
///
/// Sends payments, manages trustlines and signers, watches payment
/// streams, and keeps a local store of account and asset aliases so you
/// can say `mom` instead of a 59-character address.
#[derive(Parser, Debug)]
#[command(
    name = "astra",
    about = "Astra ledger command-line client",
    version,
    propagate_version = true
)]
pub struct AstraCli {
    /// Network to talk to: fake, test, or public.
    #[arg(long, global = true, env = "ASTRA_NETWORK", default_value = "fake")]
    pub network: String,

    /// Path to the local alias store.
    #[arg(long, global = true, env = "ASTRA_STORE", default_value = ".astra-store")]
    pub store: PathBuf,

    /// Namespace for store keys. Separate namespaces see separate aliases.
    #[arg(long, global = true, env = "ASTRA_NS", default_value = "default")]
    pub ns: String,

    /// Print the bare token `error` on failure instead of a diagnostic.
    /// For driving the binary from test harnesses.
    #[arg(long, global = true, hide = true)]
    pub testing: bool,

    /// Enable debug logging.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `astra` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print version information and exit.
    Version,

    /// Store a variable.
    Set(SetArgs),

    /// Print a stored variable.
    Get {
        /// Variable name.
        key: String,
    },

    /// Delete a stored variable.
    Del {
        /// Variable name.
        key: String,
    },

    /// Manage account aliases.
    #[command(subcommand)]
    Account(AccountCmd),

    /// Manage asset aliases.
    #[command(subcommand)]
    Asset(AssetCmd),

    /// Send a payment.
    Pay(PayArgs),

    /// Print an account's balance.
    Balance {
        /// Account name, address, or seed.
        account: String,
        /// Asset name or `code:issuer[:type]`. Native when omitted.
        asset: Option<String>,
    },

    /// Watch payments to and from an account, printing each as JSON.
    Watch {
        /// Account name, address, or federation name.
        account: String,
        /// Stream position to resume from.
        #[arg(long)]
        cursor: Option<String>,
    },
}

/// Arguments for the `set` subcommand.
#[derive(Parser, Debug)]
pub struct SetArgs {
    /// Variable name.
    pub key: String,

    /// Value to store.
    pub value: String,

    /// Expiry in seconds. The variable vanishes after this long.
    #[arg(long)]
    pub ttl: Option<u64>,
}

/// Account alias management.
#[derive(Subcommand, Debug)]
pub enum AccountCmd {
    /// Associate a name with an address, seed, federation name, or
    /// another alias.
    Set {
        /// Alias name.
        name: String,
        /// Address, seed, federation name, or alias to point at.
        value: String,
    },
    /// Remove an alias.
    Del {
        /// Alias name.
        name: String,
    },
    /// Print the address an alias resolves to.
    Address {
        /// Alias name (or anything resolvable to an address).
        name: String,
    },
    /// Print the seed an alias resolves to.
    Seed {
        /// Alias name (or a literal seed).
        name: String,
    },
    /// Generate a brand new keypair and print it.
    New,
}

/// Asset alias management.
#[derive(Subcommand, Debug)]
pub enum AssetCmd {
    /// Define an asset alias.
    Set {
        /// Alias name.
        name: String,
        /// Asset code, e.g. USD.
        code: String,
        /// Issuer address or account alias.
        issuer: String,
        /// Asset type: credit4 or credit12. Inferred from the code length
        /// when omitted.
        #[arg(long = "type")]
        kind: Option<String>,
    },
    /// Remove an asset alias.
    Del {
        /// Alias name.
        name: String,
    },
}

/// Arguments for the `pay` subcommand.
#[derive(Parser, Debug)]
pub struct PayArgs {
    /// Amount to send, as a decimal string.
    pub amount: String,

    /// Asset name or `code:issuer[:type]`. Native when omitted.
    pub asset: Option<String>,

    /// Paying account: name, address, or seed.
    #[arg(long)]
    pub from: String,

    /// Receiving account: name, address, or federation name.
    #[arg(long)]
    pub to: String,

    /// Create and fund the destination instead of paying it. Native only.
    #[arg(long)]
    pub fund: bool,

    /// Attach a text memo.
    #[arg(long)]
    pub memotext: Option<String>,

    /// Attach a numeric ID memo.
    #[arg(long)]
    pub memoid: Option<u64>,

    /// Extra signers, comma separated. Each is resolved to a seed.
    #[arg(long)]
    pub signers: Option<String>,

    /// Leave the transaction unsigned.
    #[arg(long)]
    pub nosign: bool,

    /// Build and sign but stop before submitting; prints the envelope.
    #[arg(long)]
    pub nosubmit: bool,
}
