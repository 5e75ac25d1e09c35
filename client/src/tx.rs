//! # Transaction Pipeline
//!
//! [`Tx`] drives one transaction through its lifecycle:
//!
//! ```text
//! Unbuilt --build()--> Built --sign()--> Signed --submit()--> Submitted
//! ```
//!
//! Steps run strictly in order; calling one out of turn returns
//! [`Error::InvalidState`] and does nothing else. Every failure is sticky —
//! recorded in the pipeline and returned again by [`Tx::err`] — so a caller
//! that chained the steps can ask afterwards what went wrong. A submitted
//! or failed pipeline is finished; [`Tx::reset`] is the only way back to
//! `Unbuilt`.

use std::sync::Arc;
use tracing::debug;

use crate::error::Error;
use crate::keys::Keypair;
use crate::ledger::{LedgerService, SubmitReceipt};
use crate::operation::{Envelope, Operation, SignedEnvelope};
use crate::options::{HookDecision, TxOptions};

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Where a transaction is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    /// Fresh pipeline, no envelope yet.
    Unbuilt,
    /// Envelope constructed, not yet signed.
    Built,
    /// Envelope signed (or signing deliberately skipped).
    Signed,
    /// Terminal: submitted, vetoed, or failed.
    Submitted,
}

impl TxState {
    /// Lowercase state name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unbuilt => "unbuilt",
            Self::Built => "built",
            Self::Signed => "signed",
            Self::Submitted => "submitted",
        }
    }
}

// ---------------------------------------------------------------------------
// Submission outcome
// ---------------------------------------------------------------------------

/// Successful outcome of [`Tx::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// The network accepted the transaction.
    Accepted(SubmitReceipt),
    /// The before-submit hook vetoed submission. Not an error: the envelope
    /// was built and signed, the network was simply never contacted.
    Vetoed,
}

// ---------------------------------------------------------------------------
// Tx
// ---------------------------------------------------------------------------

/// A single transaction moving through build, sign, and submit.
///
/// One `Tx` carries one operation and is not reusable after reaching a
/// terminal state without an explicit [`reset`](Self::reset). Not `Sync`;
/// drive it from one task.
pub struct Tx {
    passphrase: String,
    service: Arc<dyn LedgerService>,
    options: TxOptions,
    state: TxState,
    envelope: Option<Envelope>,
    signatures: Vec<String>,
    err: Option<Error>,
}

impl Tx {
    /// Creates a fresh pipeline bound to a network passphrase and a ledger
    /// service.
    pub fn new(passphrase: &str, service: Arc<dyn LedgerService>) -> Self {
        Self {
            passphrase: passphrase.to_string(),
            service,
            options: TxOptions::default(),
            state: TxState::Unbuilt,
            envelope: None,
            signatures: Vec::new(),
            err: None,
        }
    }

    /// Replaces the pipeline's options. Call before [`build`](Self::build);
    /// later changes do not affect an already built envelope's memo.
    pub fn set_options(&mut self, options: TxOptions) {
        self.options = options;
    }

    /// Returns the first error this pipeline hit, if any. Errors are
    /// sticky: once recorded, every later step fails with
    /// [`Error::InvalidState`] until [`reset`](Self::reset).
    pub fn err(&self) -> Option<Error> {
        self.err.clone()
    }

    /// Current pipeline state.
    pub fn state(&self) -> TxState {
        self.state
    }

    /// The built envelope, once [`build`](Self::build) has succeeded.
    pub fn envelope(&self) -> Option<&Envelope> {
        self.envelope.as_ref()
    }

    /// Returns the pipeline to `Unbuilt`, clearing the envelope,
    /// signatures, recorded error, and options.
    pub fn reset(&mut self) {
        self.options = TxOptions::default();
        self.state = TxState::Unbuilt;
        self.envelope = None;
        self.signatures.clear();
        self.err = None;
    }

    /// Builds the envelope for one operation from `source` (an address).
    ///
    /// Validates the operation's asset if it carries one. Must be the first
    /// step; rebuilding an already built pipeline is a state error.
    pub fn build(&mut self, source: &str, operation: Operation) -> Result<(), Error> {
        self.gate("build", TxState::Unbuilt)?;

        if let Operation::Payment { asset, .. }
        | Operation::ChangeTrust { asset, .. }
        | Operation::RemoveTrust { asset } = &operation
        {
            if let Err(err) = asset.validate() {
                return Err(self.fail(err));
            }
        }

        let envelope = Envelope {
            network_passphrase: self.passphrase.clone(),
            source: source.to_string(),
            operation,
            memo: self.options.memo.clone(),
        };

        debug!(hash = %envelope.hash(), op = envelope.operation.tag(), "transaction built");
        self.envelope = Some(envelope);
        self.state = TxState::Built;
        Ok(())
    }

    /// Signs the built envelope with `seed`, then with every extra signer
    /// from the options, in order.
    ///
    /// When the options skip signatures this transitions to `Signed`
    /// without touching `seed` at all, so callers on the unsigned path may
    /// pass any placeholder.
    pub fn sign(&mut self, seed: &str) -> Result<(), Error> {
        self.gate("sign", TxState::Built)?;

        if self.options.skip_signatures {
            self.state = TxState::Signed;
            return Ok(());
        }

        let envelope = self.envelope.as_ref().expect("built state has an envelope");
        let message = envelope.signable_bytes();

        let mut seeds: Vec<&str> = vec![seed];
        seeds.extend(self.options.signers.iter().map(String::as_str));

        let mut signatures = Vec::with_capacity(seeds.len());
        for seed in seeds {
            let keypair = match Keypair::from_seed(seed) {
                Ok(kp) => kp,
                Err(_) => {
                    return Err(self.fail(Error::Sign(
                        "signer credential is not a valid seed".to_string(),
                    )))
                }
            };
            signatures.push(keypair.sign_hex(&message));
        }

        debug!(count = signatures.len(), "transaction signed");
        self.signatures = signatures;
        self.state = TxState::Signed;
        Ok(())
    }

    /// Runs the before-submit hook (if any) and submits to the network.
    ///
    /// A hook veto short-circuits with [`Submission::Vetoed`]: the pipeline
    /// finishes cleanly, no network call is made, no error is recorded.
    pub async fn submit(&mut self) -> Result<Submission, Error> {
        self.gate("submit", TxState::Signed)?;

        let envelope = self.envelope.take().expect("signed state has an envelope");

        if let Some(mut hook) = self.options.before_submit.take() {
            if hook(&envelope) == HookDecision::Veto {
                debug!(hash = %envelope.hash(), "submission vetoed by hook");
                self.envelope = Some(envelope);
                self.state = TxState::Submitted;
                return Ok(Submission::Vetoed);
            }
        }

        let signed = SignedEnvelope {
            envelope,
            signatures: std::mem::take(&mut self.signatures),
        };

        match self.service.submit(&signed).await {
            Ok(receipt) => {
                debug!(hash = %receipt.hash, ledger = ?receipt.ledger, "transaction accepted");
                self.envelope = Some(signed.envelope);
                self.state = TxState::Submitted;
                Ok(Submission::Accepted(receipt))
            }
            Err(source) => {
                self.envelope = Some(signed.envelope);
                Err(self.fail(Error::Remote {
                    stage: "submit",
                    source,
                }))
            }
        }
    }

    /// Checks the step precondition: no sticky error and the expected state.
    fn gate(&mut self, step: &'static str, expected: TxState) -> Result<(), Error> {
        if self.err.is_some() {
            return Err(self.fail(Error::InvalidState {
                step,
                state: "failed",
            }));
        }
        if self.state != expected {
            let state = self.state.name();
            return Err(self.fail(Error::InvalidState { step, state }));
        }
        Ok(())
    }

    /// Records the sticky error and hands a copy back.
    fn fail(&mut self, err: Error) -> Error {
        if self.err.is_none() {
            self.err = Some(err.clone());
        }
        err
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
