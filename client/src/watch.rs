//! # Payment Watcher
//!
//! A [`PaymentWatcher`] is a live subscription to the payment events of one
//! address. The stream runs in a background task and hands payments over a
//! capacity-1 channel, so the producer never runs ahead of the consumer by
//! more than one event.
//!
//! Channel close is the single termination signal. After [`recv`]
//! (PaymentWatcher::recv) returns `None`, [`err`](PaymentWatcher::err)
//! distinguishes the two ways the stream can end: `None` means the watch
//! was cancelled, `Some` means the stream broke. The error slot is always
//! written before the channel closes, so a consumer that observed the close
//! will observe the error.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::error::Error;
use crate::keys::valid_address;
use crate::ledger::{Cursor, LedgerService, Payment};

/// A running payment subscription.
///
/// Obtained from [`Client::watch_payments`](crate::client::Client::watch_payments).
/// Dropping the watcher cancels the subscription.
#[derive(Debug)]
pub struct PaymentWatcher {
    rx: mpsc::Receiver<Payment>,
    cancel: watch::Sender<bool>,
    err: Arc<Mutex<Option<Error>>>,
}

impl PaymentWatcher {
    /// Starts watching `address` from `cursor` (feed tip when `None`).
    ///
    /// Validates the address structurally before spawning anything; an
    /// invalid address fails here, not asynchronously through the stream.
    pub(crate) fn spawn(
        service: Arc<dyn LedgerService>,
        address: &str,
        cursor: Option<Cursor>,
    ) -> Result<Self, Error> {
        if !valid_address(address) {
            return Err(Error::InvalidInput {
                what: "watch address",
                value: address.to_string(),
            });
        }

        let (cancel, cancel_rx) = watch::channel(false);
        let (tx, rx) = mpsc::channel(1);
        let err = Arc::new(Mutex::new(None));

        let err_slot = err.clone();
        let address = address.to_string();
        tokio::spawn(async move {
            // The service gets a clone of the sender; `tx` stays alive in
            // this task so the channel cannot close until after the error
            // slot is written below.
            let result = service
                .stream_payments(cancel_rx, &address, cursor, tx.clone())
                .await;
            if let Err(source) = result {
                debug!(%address, error = %source, "payment stream ended with error");
                *err_slot.lock() = Some(Error::Stream(source));
            }
            drop(tx);
        });

        Ok(Self { rx, cancel, err })
    }

    /// Receives the next payment. Returns `None` once the stream has
    /// terminated; consult [`err`](Self::err) to learn why.
    pub async fn recv(&mut self) -> Option<Payment> {
        self.rx.recv().await
    }

    /// Cancels the subscription. Idempotent: calling it on an already
    /// cancelled or already terminated watcher does nothing.
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }

    /// The stream error, if the subscription ended abnormally. `None` both
    /// while the stream is healthy and after a clean cancellation.
    pub fn err(&self) -> Option<Error> {
        self.err.lock().clone()
    }
}

impl Drop for PaymentWatcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::Keypair;
    use crate::ledger::{AccountSnapshot, FakeLedger, LedgerError, SubmitReceipt};
    use crate::operation::SignedEnvelope;
    use async_trait::async_trait;

    #[tokio::test]
    async fn watcher_receives_and_cancels() {
        let fake = Arc::new(FakeLedger::new());
        let address = Keypair::generate().address();
        let mut watcher = PaymentWatcher::spawn(fake, &address, None).unwrap();

        let payment = watcher.recv().await.expect("synthetic payment");
        assert_eq!(payment.asset_code, "QBIT");

        watcher.cancel();
        // Drain until the channel closes; at most one payment is in flight.
        while watcher.recv().await.is_some() {}
        assert!(watcher.err().is_none());
    }

    #[tokio::test]
    async fn cancel_is_idempotent() {
        let fake = Arc::new(FakeLedger::new());
        let address = Keypair::generate().address();
        let mut watcher = PaymentWatcher::spawn(fake, &address, None).unwrap();

        watcher.cancel();
        watcher.cancel();
        while watcher.recv().await.is_some() {}
        watcher.cancel();
        assert!(watcher.err().is_none());
    }

    #[tokio::test]
    async fn invalid_address_fails_synchronously() {
        let fake = Arc::new(FakeLedger::new());
        let err = PaymentWatcher::spawn(fake, "bogus", None).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidInput {
                what: "watch address",
                ..
            }
        ));
    }

    /// Service whose stream fails immediately, for exercising the error
    /// slot ordering.
    struct BrokenStream;

    #[async_trait]
    impl LedgerService for BrokenStream {
        async fn submit(&self, _: &SignedEnvelope) -> Result<SubmitReceipt, LedgerError> {
            unimplemented!("not used in this test")
        }

        async fn load_account(&self, _: &str) -> Result<AccountSnapshot, LedgerError> {
            unimplemented!("not used in this test")
        }

        async fn stream_payments(
            &self,
            _shutdown: watch::Receiver<bool>,
            _address: &str,
            _cursor: Option<Cursor>,
            _sink: mpsc::Sender<Payment>,
        ) -> Result<(), LedgerError> {
            Err(LedgerError::StreamClosed)
        }

        async fn resolve_federation(&self, _: &str) -> Result<String, LedgerError> {
            unimplemented!("not used in this test")
        }
    }

    #[tokio::test]
    async fn stream_error_is_visible_after_close() {
        let address = Keypair::generate().address();
        let mut watcher = PaymentWatcher::spawn(Arc::new(BrokenStream), &address, None).unwrap();

        assert!(watcher.recv().await.is_none());
        // Channel closed, so the slot write has already happened.
        assert!(matches!(
            watcher.err(),
            Some(Error::Stream(LedgerError::StreamClosed))
        ));
    }
}
