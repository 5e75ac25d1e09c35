//! # Command Handlers
//!
//! One async handler per subcommand. Handlers resolve names through the
//! [`Resolver`], call the client, and print results to stdout; every
//! failure propagates as `anyhow::Error` for `main` to format. Nothing in
//! here exits the process.

use anyhow::{anyhow, bail, Context, Result};
use std::time::Duration;
use tracing::info;

use astra_client::{error_string, HookDecision, Submission, TxOptions};

use crate::cli::{AccountCmd, AssetCmd, PayArgs, SetArgs};
use crate::resolver::{KeyType, Resolver};

/// The running application: a resolver (which carries the client and the
/// store) plus command state.
pub struct App {
    resolver: Resolver,
}

impl App {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver }
    }

    fn vars_key(&self, key: &str) -> String {
        self.resolver.key(&format!("vars:{key}"))
    }

    // -- variables --------------------------------------------------------

    /// `astra set KEY VALUE [--ttl SECONDS]`
    pub fn set(&self, args: &SetArgs) -> Result<()> {
        let ttl = args.ttl.map(Duration::from_secs);
        self.resolver
            .store()
            .set(&self.vars_key(&args.key), &args.value, ttl)
            .with_context(|| format!("could not store {}", args.key))?;
        Ok(())
    }

    /// `astra get KEY`
    pub fn get(&self, key: &str) -> Result<()> {
        match self.resolver.store().get(&self.vars_key(key))? {
            Some(value) => {
                println!("{value}");
                Ok(())
            }
            None => bail!("no such variable: {key}"),
        }
    }

    /// `astra del KEY`
    pub fn del(&self, key: &str) -> Result<()> {
        self.resolver
            .store()
            .delete(&self.vars_key(key))
            .with_context(|| format!("could not delete {key}"))?;
        Ok(())
    }

    // -- aliases ----------------------------------------------------------

    /// `astra account set|del|address|seed|new ...`
    pub async fn account(&self, cmd: &AccountCmd) -> Result<()> {
        match cmd {
            AccountCmd::Set { name, value } => {
                let kind = self.resolver.define_account(name, value)?;
                info!(%name, %kind, "account alias stored");
                Ok(())
            }
            AccountCmd::Del { name } => {
                self.resolver.forget_account(name)?;
                Ok(())
            }
            AccountCmd::Address { name } => {
                let address = self.resolver.resolve_account(name, KeyType::Address).await?;
                println!("{address}");
                Ok(())
            }
            AccountCmd::Seed { name } => {
                let seed = self.resolver.resolve_account(name, KeyType::Seed).await?;
                println!("{seed}");
                Ok(())
            }
            AccountCmd::New => {
                let kp = self.resolver.client().create_key_pair();
                println!("address: {}", kp.address());
                println!("seed:    {}", kp.seed());
                Ok(())
            }
        }
    }

    /// `astra asset set|del ...`
    pub fn asset(&self, cmd: &AssetCmd) -> Result<()> {
        match cmd {
            AssetCmd::Set {
                name,
                code,
                issuer,
                kind,
            } => {
                let kind = match kind.as_deref() {
                    Some(s) => Some(
                        s.parse::<astra_client::AssetKind>()
                            .map_err(|e| anyhow!("{}", error_string(&e)))?,
                    ),
                    None => None,
                };
                self.resolver.define_asset(name, code, issuer, kind)?;
                Ok(())
            }
            AssetCmd::Del { name } => {
                self.resolver.forget_asset(name)?;
                Ok(())
            }
        }
    }

    // -- ledger commands ----------------------------------------------------

    /// `astra pay AMOUNT [ASSET] --from X --to Y [flags]`
    pub async fn pay(&self, args: &PayArgs) -> Result<()> {
        let source = self.resolver.resolve_source(&args.from).await?;
        let target = self
            .resolver
            .resolve_account(&args.to, KeyType::Address)
            .await?;

        let mut options = TxOptions::new();
        if let Some(text) = &args.memotext {
            options = options.with_memo_text(text);
        }
        if let Some(id) = args.memoid {
            options = options.with_memo_id(id);
        }
        if let Some(signers) = &args.signers {
            for name in signers.split(',').filter(|s| !s.is_empty()) {
                let seed = self.resolver.resolve_account(name, KeyType::Seed).await?;
                options = options.with_signer(&seed);
            }
        }
        if args.nosign {
            options = options.skip_signatures();
        }
        if args.nosubmit {
            options = options.on_before_submit(Box::new(|envelope| {
                match serde_json::to_string_pretty(envelope) {
                    Ok(json) => println!("{json}"),
                    Err(e) => eprintln!("could not render envelope: {e}"),
                }
                HookDecision::Veto
            }));
        }

        let client = self.resolver.client();
        let outcome = if args.fund {
            if args.asset.is_some() {
                bail!("--fund only works with the native asset");
            }
            client
                .fund_account(&source, &target, &args.amount, options)
                .await
        } else {
            let asset = self
                .resolver
                .resolve_asset(args.asset.as_deref().unwrap_or(""))
                .await?;
            client
                .pay(&source, &target, &asset, &args.amount, options)
                .await
        };

        match outcome {
            Ok(Submission::Accepted(receipt)) => {
                println!("{}", receipt.hash);
                Ok(())
            }
            // The veto hook already printed the envelope.
            Ok(Submission::Vetoed) => Ok(()),
            Err(err) => Err(anyhow!("{}", error_string(&err))),
        }
    }

    /// `astra balance ACCOUNT [ASSET]`
    pub async fn balance(&self, account: &str, asset: Option<&str>) -> Result<()> {
        let address = self
            .resolver
            .resolve_account(account, KeyType::Address)
            .await?;
        let snapshot = self
            .resolver
            .client()
            .load_account(&address)
            .await
            .map_err(|err| anyhow!("{}", error_string(&err)))?;

        let amount = match asset {
            None | Some("") | Some("native") => snapshot.native_balance().to_string(),
            Some(name) => {
                let asset = self.resolver.resolve_asset(name).await?;
                snapshot.balance_for(&asset).unwrap_or("0").to_string()
            }
        };
        println!("{amount}");
        Ok(())
    }

    /// `astra watch ACCOUNT [--cursor C]`
    ///
    /// Prints each payment as a JSON line until the stream ends or the
    /// user hits Ctrl+C.
    pub async fn watch(&self, account: &str, cursor: Option<&str>) -> Result<()> {
        let address = self
            .resolver
            .resolve_account(account, KeyType::Address)
            .await?;

        let mut options = TxOptions::new();
        if let Some(cursor) = cursor {
            options = options.with_cursor(cursor.into());
        }

        let mut watcher = self
            .resolver
            .client()
            .watch_payments(&address, options)
            .map_err(|err| anyhow!("{}", error_string(&err)))?;

        loop {
            tokio::select! {
                maybe = watcher.recv() => match maybe {
                    Some(payment) => println!("{}", serde_json::to_string(&payment)?),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted, closing watch");
                    watcher.cancel();
                    // Keep draining; the channel closes once the stream
                    // task observes the cancellation.
                }
            }
        }

        match watcher.err() {
            Some(err) => Err(anyhow!("{}", error_string(&err))),
            None => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use astra_client::{Client, FakeLedger, Keypair, Memo, Network};
    use std::sync::Arc;

    fn app_with_fake() -> (Arc<FakeLedger>, App) {
        let fake = Arc::new(FakeLedger::new());
        let client = Client::new(Network::Fake, fake.clone());
        let resolver = Resolver::new(client, Arc::new(MemoryStore::new()), "test");
        (fake, App::new(resolver))
    }

    fn pay_args(from: &str, to: &str, amount: &str) -> PayArgs {
        PayArgs {
            amount: amount.to_string(),
            asset: None,
            from: from.to_string(),
            to: to.to_string(),
            fund: false,
            memotext: None,
            memoid: None,
            signers: None,
            nosign: false,
            nosubmit: false,
        }
    }

    #[tokio::test]
    async fn pay_through_aliases() {
        let (fake, app) = app_with_fake();
        let mo = Keypair::generate();
        let kelly = Keypair::generate();

        app.account(&AccountCmd::Set {
            name: "mo".to_string(),
            value: mo.seed(),
        })
        .await
        .unwrap();
        app.account(&AccountCmd::Set {
            name: "kelly".to_string(),
            value: kelly.address(),
        })
        .await
        .unwrap();

        app.pay(&pay_args("mo", "kelly", "10")).await.unwrap();

        let recorded = fake.submissions();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].envelope.source, mo.address());
        assert_eq!(recorded[0].signatures.len(), 1);
    }

    #[tokio::test]
    async fn pay_with_memo_and_extra_signer() {
        let (fake, app) = app_with_fake();
        let mo = Keypair::generate();
        let cosigner = Keypair::generate();
        let kelly = Keypair::generate();

        app.account(&AccountCmd::Set {
            name: "cosigner".to_string(),
            value: cosigner.seed(),
        })
        .await
        .unwrap();

        let mut args = pay_args(&mo.seed(), &kelly.address(), "5");
        args.memotext = Some("rent".to_string());
        args.signers = Some("cosigner".to_string());
        app.pay(&args).await.unwrap();

        let signed = &fake.submissions()[0];
        assert_eq!(signed.envelope.memo, Memo::Text("rent".to_string()));
        assert_eq!(signed.signatures.len(), 2);
    }

    #[tokio::test]
    async fn nosubmit_vetoes_and_records_nothing() {
        let (fake, app) = app_with_fake();
        let mo = Keypair::generate();
        let kelly = Keypair::generate();

        let mut args = pay_args(&mo.seed(), &kelly.address(), "5");
        args.nosubmit = true;
        app.pay(&args).await.unwrap();

        assert!(fake.submissions().is_empty());
    }

    #[tokio::test]
    async fn fund_creates_account() {
        let (fake, app) = app_with_fake();
        let mo = Keypair::generate();
        let fresh = Keypair::generate();

        let mut args = pay_args(&mo.seed(), &fresh.address(), "100");
        args.fund = true;
        app.pay(&args).await.unwrap();

        assert_eq!(
            fake.submissions()[0].envelope.operation.tag(),
            "create_account"
        );

        // --fund with an asset makes no sense.
        let mut args = pay_args(&mo.seed(), &fresh.address(), "100");
        args.fund = true;
        args.asset = Some("USD:somewhere".to_string());
        assert!(app.pay(&args).await.is_err());
    }

    #[tokio::test]
    async fn pay_with_credit_asset_alias() {
        let (fake, app) = app_with_fake();
        let mo = Keypair::generate();
        let kelly = Keypair::generate();
        let issuer = Keypair::generate();

        app.asset(&AssetCmd::Set {
            name: "dollars".to_string(),
            code: "USD".to_string(),
            issuer: issuer.address(),
            kind: None,
        })
        .unwrap();

        let mut args = pay_args(&mo.seed(), &kelly.address(), "25");
        args.asset = Some("dollars".to_string());
        app.pay(&args).await.unwrap();

        let signed = &fake.submissions()[0];
        assert_eq!(signed.envelope.operation.tag(), "payment");
    }

    #[tokio::test]
    async fn vars_set_get_del() {
        let (_, app) = app_with_fake();

        app.set(&SetArgs {
            key: "greeting".to_string(),
            value: "hello".to_string(),
            ttl: None,
        })
        .unwrap();
        app.get("greeting").unwrap();
        app.del("greeting").unwrap();
        assert!(app.get("greeting").is_err());
    }

    #[tokio::test]
    async fn balance_of_fake_account() {
        let (_, app) = app_with_fake();
        let mo = Keypair::generate();

        app.balance(&mo.address(), None).await.unwrap();
        app.balance(&mo.address(), Some("native")).await.unwrap();
    }

    #[tokio::test]
    async fn pay_fails_for_unknown_names() {
        let (fake, app) = app_with_fake();
        assert!(app.pay(&pay_args("stranger", "nobody", "1")).await.is_err());
        assert!(fake.submissions().is_empty());
    }
}
