//! Error types for the Astra client SDK.
//!
//! The taxonomy separates failures the caller can fix before any network
//! round-trip (invalid input, pipeline misuse) from failures the remote
//! ledger reported (submit rejection, load failure, broken stream). The
//! SDK never retries on its own — retry policy belongs to the caller.

use thiserror::Error;

use crate::ledger::LedgerError;

/// Errors returned by the Astra client SDK.
///
/// Every variant is `Clone` so the transaction pipeline can both record a
/// terminal error and hand a copy back to the caller.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// An argument failed structural validation before any network call.
    /// `what` names the offending argument.
    #[error("invalid {what}: {value}")]
    InvalidInput {
        /// Which argument was malformed ("source seed", "target address", ...).
        what: &'static str,
        /// The value as supplied by the caller.
        value: String,
    },

    /// An asset failed validation (bad issuer, empty code).
    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    /// Transaction construction failed (malformed operation payload).
    #[error("transaction build failed: {0}")]
    Build(String),

    /// Transaction signing failed (unsigned pipeline misuse or a signer
    /// credential that is not a seed).
    #[error("transaction signing failed: {0}")]
    Sign(String),

    /// A pipeline step was called out of order.
    #[error("{step} called in {state} state")]
    InvalidState {
        /// The step that was attempted ("build", "sign", "submit").
        step: &'static str,
        /// The state the transaction was actually in.
        state: &'static str,
    },

    /// The remote ledger service rejected an operation.
    #[error("{stage} failed: {source}")]
    Remote {
        /// Which pipeline stage hit the remote failure ("submit", ...).
        stage: &'static str,
        #[source]
        source: LedgerError,
    },

    /// An account snapshot could not be loaded.
    #[error("could not load account: {0}")]
    Load(#[source] LedgerError),

    /// The payment event stream broke mid-flight. Found in a watcher's
    /// error slot after its channel closes, never thrown across the
    /// channel itself.
    #[error("payment stream disconnected: {0}")]
    Stream(#[source] LedgerError),

    /// Federation lookup failed.
    #[error("federation lookup failed: {0}")]
    Federation(#[source] LedgerError),
}

/// Flattens an [`Error`] into a one-line diagnostic string for display.
///
/// For remote rejections this surfaces the ledger's own reason (and result
/// code when present) instead of the generic wrapper text. For every other
/// variant it falls back to the `Display` impl — it never panics on errors
/// that did not originate at the remote service.
pub fn error_string(err: &Error) -> String {
    match err {
        Error::Remote { source, .. }
        | Error::Load(source)
        | Error::Stream(source)
        | Error::Federation(source) => match source {
            LedgerError::Rejected {
                reason,
                result_code: Some(code),
            } => format!("{reason} [{code}]"),
            other => other.to_string(),
        },
        other => other.to_string(),
    }
}
