// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Astra Client SDK
//!
//! A friendly Rust client for the Astra ledger: build, sign, and submit
//! transactions, watch payment streams, and stop worrying about the wire.
//!
//! Two ways in, one set of semantics:
//!
//! - **[`Client`]** — the façade. One method per ledger action, the whole
//!   build → sign → submit pipeline handled for you.
//! - **[`Tx`]** — the pipeline itself, for callers who want to inspect or
//!   veto between steps.
//!
//! Everything network-shaped hides behind [`LedgerService`]. The crate
//! ships [`FakeLedger`], a deterministic in-process implementation, so the
//! exact code paths your tests exercise are the ones production runs —
//! "fake" is a wiring choice, not a separate SDK.
//!
//! ## Modules
//!
//! - **keys** — Bech32 addresses and seeds, Ed25519 keypairs.
//! - **asset** — Native and credit assets.
//! - **operation** — Operation payloads, envelopes, canonical signing bytes.
//! - **options** — Per-transaction knobs: memos, signers, hooks, cursors.
//! - **tx** — The build/sign/submit state machine.
//! - **ledger** — The service trait, wire types, and the fake network.
//! - **watch** — Live payment subscriptions.
//! - **client** — The façade tying it all together.
//!
//! ## Quick start
//!
//! ```
//! use astra_client::{Client, TxOptions};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), astra_client::Error> {
//! let client = Client::fake();
//! let alice = client.create_key_pair();
//! let bob = client.create_key_pair();
//!
//! client
//!     .pay_native(&alice.seed(), &bob.address(), "42.5", TxOptions::new())
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod client;
pub mod error;
pub mod keys;
pub mod ledger;
pub mod operation;
pub mod options;
pub mod tx;
pub mod watch;

pub use asset::{Asset, AssetKind};
pub use client::{Client, Network};
pub use error::{error_string, Error};
pub use keys::Keypair;
pub use ledger::{
    AccountSnapshot, Balance, Cursor, FakeLedger, LedgerError, LedgerService, Payment,
    SubmitReceipt,
};
pub use operation::{Envelope, Operation, SignedEnvelope};
pub use options::{BeforeSubmitHook, HookDecision, Memo, TxOptions};
pub use tx::{Submission, Tx, TxState};
pub use watch::PaymentWatcher;
