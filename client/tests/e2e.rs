//! End-to-end integration tests for the Astra client SDK.
//!
//! These tests drive the public API exactly the way an application would:
//! a [`Client`] wired to the in-process fake ledger, payments built and
//! signed from real keypairs, watchers subscribed and cancelled. They prove
//! that the façade, the pipeline, the watcher, and the fake service compose
//! correctly end to end.
//!
//! Each test builds its own client and keypairs. No shared state, no test
//! ordering dependencies, no flaky failures.

use std::sync::Arc;

use astra_client::{
    Asset, AssetKind, Client, Error, FakeLedger, HookDecision, Keypair, LedgerError, Memo,
    Network, Submission, TxOptions,
};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

/// A fake-backed client plus a handle to the fake itself, so tests can
/// inspect what actually hit the wire.
fn setup() -> (Arc<FakeLedger>, Client) {
    let fake = Arc::new(FakeLedger::new());
    let client = Client::new(Network::Fake, fake.clone());
    (fake, client)
}

// ---------------------------------------------------------------------------
// 1. Full Payment Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn full_payment_lifecycle() {
    let (fake, client) = setup();

    let alice = client.create_key_pair();
    let bob = client.create_key_pair();
    assert!(alice.address().starts_with("astra1"));
    assert!(alice.seed().starts_with("astrasec1"));
    assert_ne!(alice.address(), bob.address());

    let outcome = client
        .pay_native(
            &alice.seed(),
            &bob.address(),
            "123.45",
            TxOptions::new().with_memo_text("rent"),
        )
        .await
        .unwrap();

    let Submission::Accepted(receipt) = outcome else {
        panic!("fake network accepts everything");
    };
    assert_eq!(receipt.hash.len(), 64);
    assert_eq!(receipt.ledger, Some(1));

    // Exactly what we built reached the service: the derived source
    // address, the memo, and one valid signature over the signable bytes.
    let recorded = fake.submissions();
    assert_eq!(recorded.len(), 1);
    let signed = &recorded[0];
    assert_eq!(signed.envelope.source, alice.address());
    assert_eq!(signed.envelope.memo, Memo::Text("rent".to_string()));
    assert_eq!(signed.envelope.hash(), receipt.hash);
    assert_eq!(
        signed.signatures,
        vec![alice.sign_hex(&signed.envelope.signable_bytes())]
    );
}

// ---------------------------------------------------------------------------
// 2. Watch, Receive, Cancel
// ---------------------------------------------------------------------------

#[tokio::test]
async fn watch_receive_cancel() {
    let (_, client) = setup();
    let address = Keypair::generate().address();

    let mut watcher = client.watch_payments(&address, TxOptions::new()).unwrap();

    // The fake feed emits its synthetic payment on a short interval.
    let first = watcher.recv().await.expect("at least one payment");
    assert_eq!(first.from, "FAKESOURCE");
    assert_eq!(first.to, "FAKEDEST");
    assert_eq!(first.asset_code, "QBIT");
    assert_eq!(first.amount, "5");

    watcher.cancel();
    // Drain whatever was already in flight; the channel must then close.
    while watcher.recv().await.is_some() {}

    // Clean cancellation leaves no error behind.
    assert!(watcher.err().is_none());

    // Cancelling again is a no-op, not a panic.
    watcher.cancel();
}

// ---------------------------------------------------------------------------
// 3. Watch From a Cursor
// ---------------------------------------------------------------------------

#[tokio::test]
async fn watch_resumes_from_cursor() {
    let (_, client) = setup();
    let address = Keypair::generate().address();

    let mut watcher = client
        .watch_payments(&address, TxOptions::new().with_cursor("100".into()))
        .unwrap();

    let payment = watcher.recv().await.unwrap();
    assert_eq!(payment.cursor.unwrap().as_str(), "101");
    watcher.cancel();
}

// ---------------------------------------------------------------------------
// 4. Watch Rejects a Bad Address Up Front
// ---------------------------------------------------------------------------

#[tokio::test]
async fn watch_rejects_bad_address() {
    let (_, client) = setup();

    let err = client
        .watch_payments("not-an-address", TxOptions::new())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));
}

// ---------------------------------------------------------------------------
// 5. Veto Hook: Sign Without Submitting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn veto_hook_dry_run() {
    let (fake, client) = setup();
    let alice = client.create_key_pair();
    let bob = client.create_key_pair();

    let options = TxOptions::new().on_before_submit(Box::new(|envelope| {
        // The hook sees the fully built envelope before any network call.
        assert_eq!(envelope.operation.tag(), "payment");
        HookDecision::Veto
    }));

    let outcome = client
        .pay_native(&alice.seed(), &bob.address(), "7", options)
        .await
        .unwrap();

    assert_eq!(outcome, Submission::Vetoed);
    assert!(fake.submissions().is_empty());
}

// ---------------------------------------------------------------------------
// 6. Multisig: Extra Signers Sign in Order
// ---------------------------------------------------------------------------

#[tokio::test]
async fn multisig_payment() {
    let (fake, client) = setup();
    let alice = client.create_key_pair();
    let cosigner_a = client.create_key_pair();
    let cosigner_b = client.create_key_pair();
    let bob = client.create_key_pair();

    client
        .pay_native(
            &alice.seed(),
            &bob.address(),
            "9",
            TxOptions::new()
                .with_signer(&cosigner_a.seed())
                .with_signer(&cosigner_b.seed()),
        )
        .await
        .unwrap();

    let signed = &fake.submissions()[0];
    let message = signed.envelope.signable_bytes();
    assert_eq!(
        signed.signatures,
        vec![
            alice.sign_hex(&message),
            cosigner_a.sign_hex(&message),
            cosigner_b.sign_hex(&message),
        ]
    );
}

// ---------------------------------------------------------------------------
// 7. Trustlines and Account Setup End to End
// ---------------------------------------------------------------------------

#[tokio::test]
async fn account_setup_flow() {
    let (fake, client) = setup();
    let issuer = client.create_key_pair();
    let alice = client.create_key_pair();
    let usd = Asset::new("USD", &issuer.address(), AssetKind::Credit4);

    // Fund a new account, open a trustline, receive a credit payment,
    // then tighten the account's signing policy.
    client
        .fund_account(&issuer.seed(), &alice.address(), "100", TxOptions::new())
        .await
        .unwrap();
    client
        .create_trust_line(&alice.seed(), &usd, "5000", TxOptions::new())
        .await
        .unwrap();
    client
        .pay(&issuer.seed(), &alice.address(), &usd, "250", TxOptions::new())
        .await
        .unwrap();
    client
        .set_thresholds(&alice.seed(), 1, 2, 2, TxOptions::new())
        .await
        .unwrap();

    let ops: Vec<&str> = fake
        .submissions()
        .iter()
        .map(|s| s.envelope.operation.tag())
        .collect();
    assert_eq!(
        ops,
        vec!["create_account", "change_trust", "payment", "set_thresholds"]
    );
}

// ---------------------------------------------------------------------------
// 8. Balances Through the Façade
// ---------------------------------------------------------------------------

#[tokio::test]
async fn load_account_balances() {
    let (_, client) = setup();
    let alice = client.create_key_pair();

    // Seed and address resolve to the same snapshot.
    let by_seed = client.load_account(&alice.seed()).await.unwrap();
    let by_address = client.load_account(&alice.address()).await.unwrap();
    assert_eq!(by_seed, by_address);
    assert_eq!(by_seed.native_balance(), "10000.0000000");

    let usd = Asset::new("USD", &alice.address(), AssetKind::Credit4);
    assert_eq!(by_seed.balance_for(&usd), None);
}

// ---------------------------------------------------------------------------
// 9. Federation Resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn federation_resolution() {
    let bob = Keypair::generate();
    let fake = Arc::new(FakeLedger::new().with_federation("bob*astra.org", &bob.address()));
    let client = Client::new(Network::Fake, fake);

    let resolved = client.resolve_federation("bob*astra.org").await.unwrap();
    assert_eq!(resolved, bob.address());

    let err = client
        .resolve_federation("missing*astra.org")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Federation(LedgerError::FederationFailed { .. })
    ));
}

// ---------------------------------------------------------------------------
// 10. Errors Never Reach the Wire
// ---------------------------------------------------------------------------

#[tokio::test]
async fn local_failures_never_reach_the_wire() {
    let (fake, client) = setup();
    let alice = client.create_key_pair();
    let bob = client.create_key_pair();

    // Malformed amount: fails at build.
    let err = client
        .pay_native(&alice.seed(), &bob.address(), "12.abc", TxOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { what: "amount", .. }));

    // Bad target address: fails before the pipeline even starts.
    let err = client
        .pay_native(&alice.seed(), "bob", "1", TxOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidInput { .. }));

    // Signing with an address: fails at sign.
    let err = client
        .pay_native(&alice.address(), &bob.address(), "1", TxOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Sign(_)));

    assert!(fake.submissions().is_empty());
}
