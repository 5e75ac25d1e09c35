//! # Client Façade
//!
//! [`Client`] is the one-stop entry point: each ledger action is a single
//! method that runs the whole build → sign → submit pipeline internally.
//! Callers who need step-level control can drive a [`Tx`](crate::tx::Tx)
//! themselves; everyone else calls [`Client::pay`] and friends.
//!
//! A client is a [`Network`] plus an injected [`LedgerService`]. The fake
//! service ships in this crate; live transports are provided by the caller
//! and plug into the same trait, so nothing downstream of the constructor
//! knows which kind it is talking to.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::asset::Asset;
use crate::error::Error;
use crate::keys::{valid_address, valid_seed, Keypair};
use crate::ledger::{AccountSnapshot, FakeLedger, LedgerService};
use crate::operation::Operation;
use crate::options::TxOptions;
use crate::tx::{Submission, Tx};
use crate::watch::PaymentWatcher;

// ---------------------------------------------------------------------------
// Network
// ---------------------------------------------------------------------------

/// Which Astra network a client is bound to.
///
/// The passphrase is folded into every signature, so transactions signed
/// for one network can never replay on another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Network {
    /// In-process fake network for tests and development.
    Fake,
    /// The public test network.
    Test,
    /// The production network.
    Public,
    /// A private deployment with its own passphrase.
    Custom {
        /// Short name used in logs and `Display`.
        name: String,
        /// The deployment's network passphrase.
        passphrase: String,
    },
}

impl Network {
    /// The passphrase bound into signatures on this network.
    pub fn passphrase(&self) -> &str {
        match self {
            Self::Fake => "Astra Local Fake Network ; 2026",
            Self::Test => "Astra Test Network ; 2026",
            Self::Public => "Astra Public Network ; 2026",
            Self::Custom { passphrase, .. } => passphrase,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fake => write!(f, "fake"),
            Self::Test => write!(f, "test"),
            Self::Public => write!(f, "public"),
            Self::Custom { name, .. } => write!(f, "{name}"),
        }
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fake" => Ok(Self::Fake),
            "test" => Ok(Self::Test),
            "public" => Ok(Self::Public),
            other => Err(Error::InvalidInput {
                what: "network",
                value: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Handle to one Astra network. Cheap to clone; safe to share across tasks.
#[derive(Clone)]
pub struct Client {
    network: Network,
    service: Arc<dyn LedgerService>,
}

impl Client {
    /// Creates a client for `network` backed by the given service.
    pub fn new(network: Network, service: Arc<dyn LedgerService>) -> Self {
        Self { network, service }
    }

    /// Creates a client wired to an in-process [`FakeLedger`].
    pub fn fake() -> Self {
        Self::new(Network::Fake, Arc::new(FakeLedger::new()))
    }

    /// The network this client is bound to.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Generates a fresh keypair. Purely local; the account does not exist
    /// on the ledger until someone funds it.
    pub fn create_key_pair(&self) -> Keypair {
        Keypair::generate()
    }

    // -- account reads ------------------------------------------------------

    /// Loads the account snapshot for an address (or the address a seed
    /// derives).
    pub async fn load_account(&self, address_or_seed: &str) -> Result<AccountSnapshot, Error> {
        let address = source_address(address_or_seed)?;
        self.service.load_account(&address).await.map_err(Error::Load)
    }

    /// Resolves a federation name (`user*domain`) to an address.
    pub async fn resolve_federation(&self, name: &str) -> Result<String, Error> {
        self.service
            .resolve_federation(name)
            .await
            .map_err(Error::Federation)
    }

    // -- payments and account management -------------------------------------

    /// Creates and funds a new account with `amount` of the native asset.
    pub async fn fund_account(
        &self,
        source: &str,
        target: &str,
        amount: &str,
        options: TxOptions,
    ) -> Result<Submission, Error> {
        let target = self.require_address("target address", target)?;
        self.run(source, Operation::create_account(&target, amount)?, options)
            .await
    }

    /// Pays `amount` of `asset` from `source` to `target`.
    pub async fn pay(
        &self,
        source: &str,
        target: &str,
        asset: &Asset,
        amount: &str,
        options: TxOptions,
    ) -> Result<Submission, Error> {
        let target = self.require_address("target address", target)?;
        self.run(source, Operation::payment(&target, asset, amount)?, options)
            .await
    }

    /// Pays `amount` of the native asset from `source` to `target`.
    pub async fn pay_native(
        &self,
        source: &str,
        target: &str,
        amount: &str,
        options: TxOptions,
    ) -> Result<Submission, Error> {
        self.pay(source, target, &Asset::native(), amount, options)
            .await
    }

    /// Opens (or resizes) a trustline from `source` to `asset`. An empty
    /// limit means "no explicit limit".
    pub async fn create_trust_line(
        &self,
        source: &str,
        asset: &Asset,
        limit: &str,
        options: TxOptions,
    ) -> Result<Submission, Error> {
        self.run(source, Operation::change_trust(asset, Some(limit))?, options)
            .await
    }

    /// Removes the trustline from `source` to `asset`.
    pub async fn remove_trust_line(
        &self,
        source: &str,
        asset: &Asset,
        options: TxOptions,
    ) -> Result<Submission, Error> {
        self.run(source, Operation::remove_trust(asset), options).await
    }

    /// Sets the master signing weight of the source account. Weight zero
    /// locks the master key out.
    pub async fn set_master_weight(
        &self,
        source: &str,
        weight: u32,
        options: TxOptions,
    ) -> Result<Submission, Error> {
        self.run(source, Operation::SetMasterWeight { weight }, options)
            .await
    }

    /// Adds `signer` (an address) to the source account with `weight`.
    pub async fn add_signer(
        &self,
        source: &str,
        signer: &str,
        weight: u32,
        options: TxOptions,
    ) -> Result<Submission, Error> {
        let address = self.require_address("signer address", signer)?;
        self.run(source, Operation::AddSigner { address, weight }, options)
            .await
    }

    /// Removes `signer` from the source account.
    pub async fn remove_signer(
        &self,
        source: &str,
        signer: &str,
        options: TxOptions,
    ) -> Result<Submission, Error> {
        let address = self.require_address("signer address", signer)?;
        self.run(source, Operation::RemoveSigner { address }, options)
            .await
    }

    /// Sets the low/medium/high operation thresholds of the source account.
    pub async fn set_thresholds(
        &self,
        source: &str,
        low: u32,
        medium: u32,
        high: u32,
        options: TxOptions,
    ) -> Result<Submission, Error> {
        self.run(source, Operation::SetThresholds { low, medium, high }, options)
            .await
    }

    // -- streaming ------------------------------------------------------------

    /// Starts watching payments to and from `address`, resuming from the
    /// options' cursor when one is set.
    pub fn watch_payments(
        &self,
        address_or_seed: &str,
        mut options: TxOptions,
    ) -> Result<PaymentWatcher, Error> {
        let address = source_address(address_or_seed)?;
        PaymentWatcher::spawn(self.service.clone(), &address, options.cursor.take())
    }

    // -- internals --------------------------------------------------------------

    /// Runs the full pipeline for one operation.
    ///
    /// `source` may be a seed (used for both the envelope source and
    /// signing) or a bare address (only valid together with
    /// [`TxOptions::skip_signatures`], since there is nothing to sign with).
    async fn run(
        &self,
        source: &str,
        operation: Operation,
        options: TxOptions,
    ) -> Result<Submission, Error> {
        let address = source_address(source)?;

        let mut tx = Tx::new(self.network.passphrase(), self.service.clone());
        tx.set_options(options);
        tx.build(&address, operation)?;
        tx.sign(source)?;
        let outcome = tx.submit().await?;

        info!(
            network = %self.network,
            source = %address,
            op = tx.envelope().map(|e| e.operation.tag()).unwrap_or("?"),
            vetoed = matches!(outcome, Submission::Vetoed),
            "transaction finished"
        );
        Ok(outcome)
    }

    fn require_address(&self, what: &'static str, value: &str) -> Result<String, Error> {
        if valid_address(value) {
            Ok(value.to_string())
        } else {
            Err(Error::InvalidInput {
                what,
                value: value.to_string(),
            })
        }
    }
}

/// Maps an address-or-seed credential to the account address it denotes.
fn source_address(source: &str) -> Result<String, Error> {
    if valid_address(source) {
        Ok(source.to_string())
    } else if valid_seed(source) {
        Ok(Keypair::from_seed(source)?.address())
    } else {
        Err(Error::InvalidInput {
            what: "source",
            value: source.to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
