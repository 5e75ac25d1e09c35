//! # Remote Ledger Service Interface
//!
//! Everything the SDK needs from the network fits in four calls: submit a
//! signed envelope, load an account snapshot, stream payment events, and
//! resolve a federation name. [`LedgerService`] is that seam — the live
//! transport lives outside this crate and is injected by the caller, while
//! [`FakeLedger`] ships here as a deterministic in-process implementation
//! for tests and development.
//!
//! Because the fake and the live transport implement the same trait, every
//! pipeline and watcher code path is identical in both modes; "fake" is a
//! property of the wiring, not of the algorithms.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, watch};

use crate::asset::Asset;
use crate::operation::SignedEnvelope;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures reported by a ledger service implementation.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The network rejected a submitted transaction.
    #[error("transaction rejected: {reason}")]
    Rejected {
        /// Human-readable rejection reason from the server.
        reason: String,
        /// Machine-readable result code, when the server provided one.
        result_code: Option<String>,
    },

    /// The requested account does not exist on the ledger.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    /// The transport failed before the server could answer.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The event stream was closed by the server.
    #[error("event stream closed by server")]
    StreamClosed,

    /// An event arrived that could not be decoded.
    #[error("malformed event: {0}")]
    MalformedEvent(String),

    /// Federation lookup failed for a name.
    #[error("no federation record for {name}: {reason}")]
    FederationFailed {
        /// The federation name that was looked up.
        name: String,
        /// Why the lookup failed.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Wire value types
// ---------------------------------------------------------------------------

/// Opaque position marker in the payment event feed. Returned with each
/// payment and accepted by a watch call to resume from that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor(String);

impl Cursor {
    /// Returns the raw cursor token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Cursor {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Cursor {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable snapshot of one finalized payment event.
///
/// Produced by the remote feed (or synthesized by [`FakeLedger`]) and
/// consumed exactly once by a watcher's subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Paying account.
    pub from: String,
    /// Receiving account.
    pub to: String,
    /// Asset code; empty for the native asset.
    pub asset_code: String,
    /// Amount as the server's decimal string.
    pub amount: String,
    /// Event type as reported by the feed ("payment", "create_account").
    pub kind: String,
    /// Feed position of this event, usable to resume a watch.
    pub cursor: Option<Cursor>,
    /// Server-side timestamp, when the feed provided one.
    pub recorded_at: Option<DateTime<Utc>>,
    /// Raw server fields that did not map onto the struct, kept for
    /// diagnostics and forward compatibility.
    pub raw: Option<serde_json::Value>,
}

/// One balance line of an account snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Balance {
    /// The asset this balance is denominated in.
    pub asset: Asset,
    /// Balance as the server's decimal string.
    pub amount: String,
}

/// Read-only snapshot of an account's state on the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    /// The account's address.
    pub address: String,
    /// Current sequence number.
    pub sequence: u64,
    /// All balances held by the account, native first by convention.
    pub balances: Vec<Balance>,
}

impl AccountSnapshot {
    /// Returns the native-asset balance, or `"0"` if the account holds none.
    pub fn native_balance(&self) -> &str {
        self.balance_for(&Asset::native()).unwrap_or("0")
    }

    /// Returns the balance for a specific asset, if present.
    pub fn balance_for(&self, asset: &Asset) -> Option<&str> {
        self.balances
            .iter()
            .find(|b| &b.asset == asset)
            .map(|b| b.amount.as_str())
    }

    /// Returns the balance whose asset code matches `code`, if present.
    /// Matches the first line with that code regardless of issuer.
    pub fn balance(&self, code: &str) -> Option<&str> {
        self.balances
            .iter()
            .find(|b| b.asset.code == code)
            .map(|b| b.amount.as_str())
    }
}

/// The server's acknowledgment of an accepted transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    /// Hash of the accepted envelope.
    pub hash: String,
    /// Ledger sequence the transaction was included in, when known.
    pub ledger: Option<u64>,
}

// ---------------------------------------------------------------------------
// LedgerService
// ---------------------------------------------------------------------------

/// The minimal contract the SDK requires from a ledger network.
///
/// `stream_payments` blocks until the shutdown channel fires or the stream
/// ends (server close or transport error), forwarding each event onto
/// `sink` in feed order. A send failure on `sink` means the consumer went
/// away and is a clean termination, not an error. Implementations must
/// check `shutdown` between events so cancellation is honored promptly.
#[async_trait]
pub trait LedgerService: Send + Sync {
    /// Submits a signed envelope, returning the server's receipt.
    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmitReceipt, LedgerError>;

    /// Loads the current snapshot for `address`.
    async fn load_account(&self, address: &str) -> Result<AccountSnapshot, LedgerError>;

    /// Streams payment events touching `address`, starting at `cursor`
    /// (feed tip when `None`), into `sink`.
    async fn stream_payments(
        &self,
        shutdown: watch::Receiver<bool>,
        address: &str,
        cursor: Option<Cursor>,
        sink: mpsc::Sender<Payment>,
    ) -> Result<(), LedgerError>;

    /// Resolves a federation name (`user*domain`) to an address.
    async fn resolve_federation(&self, name: &str) -> Result<String, LedgerError>;
}

// ---------------------------------------------------------------------------
// FakeLedger
// ---------------------------------------------------------------------------

/// Interval between synthetic payments emitted by the fake stream. Any
/// bounded interval is acceptable; this one keeps tests fast while still
/// exercising the sleep/cancel select.
const FAKE_STREAM_INTERVAL: Duration = Duration::from_millis(50);

/// Synthetic default balance for accounts on the fake network.
const FAKE_NATIVE_BALANCE: &str = "10000.0000000";

/// A deterministic in-process ledger used for tests and development.
///
/// - `submit` accepts everything and records the envelope (inspectable via
///   [`submissions`](Self::submissions)).
/// - `load_account` returns a synthetic default snapshot.
/// - `stream_payments` emits the canonical synthetic payment (`FAKESOURCE`
///   → `FAKEDEST`, 5 QBIT) on a fixed interval until cancelled.
/// - `resolve_federation` consults a map seeded with
///   [`with_federation`](Self::with_federation).
#[derive(Default)]
pub struct FakeLedger {
    submissions: Mutex<Vec<SignedEnvelope>>,
    federation: Mutex<HashMap<String, String>>,
}

impl FakeLedger {
    /// Creates an empty fake ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a federation record, for exercising resolution paths.
    pub fn with_federation(self, name: &str, address: &str) -> Self {
        self.federation
            .lock()
            .insert(name.to_string(), address.to_string());
        self
    }

    /// Returns a copy of every envelope submitted so far, in order.
    pub fn submissions(&self) -> Vec<SignedEnvelope> {
        self.submissions.lock().clone()
    }

    /// The synthetic payment every fake stream emits.
    fn synthetic_payment(sequence: u64) -> Payment {
        Payment {
            from: "FAKESOURCE".to_string(),
            to: "FAKEDEST".to_string(),
            asset_code: "QBIT".to_string(),
            amount: "5".to_string(),
            kind: "payment".to_string(),
            cursor: Some(Cursor::from(sequence.to_string())),
            recorded_at: Some(Utc::now()),
            raw: None,
        }
    }
}

#[async_trait]
impl LedgerService for FakeLedger {
    async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmitReceipt, LedgerError> {
        let mut submissions = self.submissions.lock();
        submissions.push(envelope.clone());
        Ok(SubmitReceipt {
            hash: envelope.envelope.hash(),
            ledger: Some(submissions.len() as u64),
        })
    }

    async fn load_account(&self, address: &str) -> Result<AccountSnapshot, LedgerError> {
        Ok(AccountSnapshot {
            address: address.to_string(),
            sequence: 1,
            balances: vec![Balance {
                asset: Asset::native(),
                amount: FAKE_NATIVE_BALANCE.to_string(),
            }],
        })
    }

    async fn stream_payments(
        &self,
        mut shutdown: watch::Receiver<bool>,
        _address: &str,
        cursor: Option<Cursor>,
        sink: mpsc::Sender<Payment>,
    ) -> Result<(), LedgerError> {
        // Resume numbering after the supplied cursor so resumed watches
        // see monotonically increasing positions.
        let mut sequence: u64 = cursor
            .and_then(|c| c.as_str().parse().ok())
            .unwrap_or_default();

        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            sequence += 1;
            if sink
                .send(Self::synthetic_payment(sequence))
                .await
                .is_err()
            {
                // Consumer dropped its receiver; clean end of stream.
                return Ok(());
            }

            tokio::select! {
                _ = tokio::time::sleep(FAKE_STREAM_INTERVAL) => {}
                _ = shutdown.changed() => return Ok(()),
            }
        }
    }

    async fn resolve_federation(&self, name: &str) -> Result<String, LedgerError> {
        self.federation
            .lock()
            .get(name)
            .cloned()
            .ok_or_else(|| LedgerError::FederationFailed {
                name: name.to_string(),
                reason: "not found".to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
