//! # Transaction Options
//!
//! [`TxOptions`] accumulates the optional knobs of a single transaction or
//! watch call: memo, extra signers, signature skipping, a stream cursor,
//! and the before-submit hook. It is a consuming builder — every setter
//! takes `self` and returns it, no setter performs I/O — and each value is
//! built fresh per operation, handed to exactly one [`Tx`](crate::tx::Tx)
//! or watcher, and then discarded. Never share one across concurrent
//! operations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ledger::Cursor;
use crate::operation::Envelope;

// ---------------------------------------------------------------------------
// Memo
// ---------------------------------------------------------------------------

/// Optional memo attached to a transaction. Text and ID memos are mutually
/// exclusive — the last setter called on the options wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Memo {
    /// No memo.
    #[default]
    None,
    /// Free-form text memo.
    Text(String),
    /// Numeric ID memo.
    Id(u64),
}

// ---------------------------------------------------------------------------
// Before-submit hook
// ---------------------------------------------------------------------------

/// What a before-submit hook tells the pipeline to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookDecision {
    /// Carry on and submit to the network.
    Proceed,
    /// Stop here. The pipeline treats a veto as a deliberate non-error
    /// success with no network call — the sign-only / dry-run path.
    Veto,
}

/// Callback invoked synchronously just before submission, with the built
/// envelope. There is exactly one hook point today, so it is a typed slot
/// on the options rather than a string-keyed dispatch table.
pub type BeforeSubmitHook = Box<dyn FnMut(&Envelope) -> HookDecision + Send>;

// ---------------------------------------------------------------------------
// TxOptions
// ---------------------------------------------------------------------------

/// Optional parameters for a transaction or payment watch.
#[derive(Default)]
pub struct TxOptions {
    pub(crate) memo: Memo,
    pub(crate) signers: Vec<String>,
    pub(crate) skip_signatures: bool,
    pub(crate) cursor: Option<Cursor>,
    pub(crate) before_submit: Option<BeforeSubmitHook>,
}

impl TxOptions {
    /// Returns empty options. Equivalent to `TxOptions::default()`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a text memo. Overrides any previously set memo.
    pub fn with_memo_text(mut self, text: &str) -> Self {
        self.memo = Memo::Text(text.to_string());
        self
    }

    /// Attaches a numeric ID memo. Overrides any previously set memo.
    pub fn with_memo_id(mut self, id: u64) -> Self {
        self.memo = Memo::Id(id);
        self
    }

    /// Adds an extra signing seed. Signers sign in the order they were
    /// added, after the primary source seed.
    pub fn with_signer(mut self, seed: &str) -> Self {
        self.signers.push(seed.to_string());
        self
    }

    /// Marks the transaction as unsigned: [`Tx::sign`](crate::tx::Tx::sign)
    /// becomes a no-op and the envelope is submitted without signatures.
    pub fn skip_signatures(mut self) -> Self {
        self.skip_signatures = true;
        self
    }

    /// Sets the stream position to resume a payment watch from. Ignored by
    /// the transaction pipeline.
    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Registers the before-submit hook. The hook may veto submission, in
    /// which case the pipeline stops without a network call and without
    /// recording an error.
    pub fn on_before_submit(mut self, hook: BeforeSubmitHook) -> Self {
        self.before_submit = Some(hook);
        self
    }

    /// Returns the cursor, if one was set.
    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }
}

impl fmt::Debug for TxOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TxOptions")
            .field("memo", &self.memo)
            .field("signers", &self.signers.len())
            .field("skip_signatures", &self.skip_signatures)
            .field("cursor", &self.cursor)
            .field("before_submit", &self.before_submit.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
