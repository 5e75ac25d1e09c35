//! # Account and Asset Resolvers
//!
//! Users hand the CLI names like `mom`, `bob*federation.org`, or
//! `USD:issuer-alias`; the ledger wants addresses, seeds, and fully formed
//! assets. The resolvers bridge the two using the alias store and, for
//! federation names, the client.
//!
//! Account resolution follows alias chains (an alias may point at another
//! alias) but is bounded: at most [`MAX_RESOLUTION_HOPS`] hops with a
//! visited set, so a cycle in the store fails fast with
//! [`ResolveError::ResolutionCycle`] instead of spinning.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use astra_client::keys::{valid_address_or_seed, valid_seed};
use astra_client::{Asset, AssetKind, Client};
use thiserror::Error;
use tracing::debug;

use crate::store::{Store, StoreError};

/// Upper bound on alias-chain length during account resolution.
pub const MAX_RESOLUTION_HOPS: usize = 8;

/// Asset codes up to this length resolve to the short code class when the
/// user does not name a type explicitly.
const CREDIT4_MAX_CODE_LEN: usize = 5;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures while turning user-facing names into ledger values.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No address/seed and no alias entry for the name.
    #[error("could not resolve {kind} for {name}")]
    UnresolvedAccount {
        /// The name (or intermediate alias) that failed to resolve.
        name: String,
        /// What was being looked for.
        kind: KeyType,
    },

    /// An asset alias is missing one of its stored fields.
    #[error("could not resolve asset {name}: missing {field}")]
    UnresolvedAsset {
        name: String,
        field: &'static str,
    },

    /// Alias chain looped or exceeded the hop bound.
    #[error("alias resolution for {0} did not terminate (cycle or chain too long)")]
    ResolutionCycle(String),

    /// Asset fields resolved but do not form a valid asset.
    #[error("bad asset definition: {0}")]
    BadAsset(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

// ---------------------------------------------------------------------------
// KeyType
// ---------------------------------------------------------------------------

/// Which credential an account lookup wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Address,
    Seed,
}

impl KeyType {
    /// The other credential kind, used as a lookup fallback.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Address => Self::Seed,
            Self::Seed => Self::Address,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address => write!(f, "address"),
            Self::Seed => write!(f, "seed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves account names and asset names against the alias store.
///
/// Every store key is prefixed with the resolver's namespace, so separate
/// namespaces are fully isolated alias worlds.
pub struct Resolver {
    client: Client,
    store: Arc<dyn Store>,
    ns: String,
}

impl Resolver {
    pub fn new(client: Client, store: Arc<dyn Store>, ns: &str) -> Self {
        Self {
            client,
            store,
            ns: ns.to_string(),
        }
    }

    /// The client this resolver consults for federation lookups.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The underlying alias store. Callers namespace their own keys with
    /// [`key`](Self::key).
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Namespaces a raw store key.
    pub fn key(&self, rest: &str) -> String {
        format!("{}:{}", self.ns, rest)
    }

    fn account_key(&self, name: &str, kind: KeyType) -> String {
        self.key(&format!("account:{name}:{kind}"))
    }

    fn asset_key(&self, name: &str, field: &str) -> String {
        self.key(&format!("asset:{name}:{field}"))
    }

    // -- accounts -------------------------------------------------------------

    /// Resolves `name` to a credential, preferring the requested kind.
    ///
    /// Any structurally valid address or seed passes straight through
    /// unchanged, whichever kind was asked for: the requested kind steers
    /// which alias key is consulted first, it is not a filter on the
    /// answer. A stored seed is therefore a usable answer to an address
    /// question and vice versa; callers that strictly need one form
    /// validate the result themselves.
    ///
    /// Names carrying the federation marker (`*`) are looked up remotely
    /// first; a federation failure is non-fatal and falls through to the
    /// alias store. Alias values re-enter the loop, so chains of aliases
    /// work, bounded by [`MAX_RESOLUTION_HOPS`].
    pub async fn resolve_account(
        &self,
        name: &str,
        kind: KeyType,
    ) -> Result<String, ResolveError> {
        let mut current = name.to_string();
        let mut visited = HashSet::new();

        loop {
            if valid_address_or_seed(&current) {
                return Ok(current);
            }

            if kind == KeyType::Address && current.contains('*') {
                match self.client.resolve_federation(&current).await {
                    Ok(address) => return Ok(address),
                    Err(err) => {
                        debug!(name = %current, error = %err, "federation miss, trying alias store");
                    }
                }
            }

            if visited.len() >= MAX_RESOLUTION_HOPS || !visited.insert(current.clone()) {
                return Err(ResolveError::ResolutionCycle(name.to_string()));
            }

            let next = match self.store.get(&self.account_key(&current, kind))? {
                Some(v) => Some(v),
                None => self.store.get(&self.account_key(&current, kind.opposite()))?,
            };

            match next {
                Some(value) => current = value,
                None => {
                    return Err(ResolveError::UnresolvedAccount {
                        name: current,
                        kind,
                    })
                }
            }
        }
    }

    /// Resolves a payment source. Asking for the seed kind makes the seed
    /// alias key win when a name has both credentials stored, so the
    /// payment signs rather than degrading to the unsigned path; a name
    /// that only reaches an address still resolves, for unsigned use.
    pub async fn resolve_source(&self, name: &str) -> Result<String, ResolveError> {
        self.resolve_account(name, KeyType::Seed).await
    }

    /// Associates `name` with an address, seed, or onward alias. Returns
    /// the key type the value was stored under.
    pub fn define_account(&self, name: &str, value: &str) -> Result<KeyType, ResolveError> {
        // Seeds file under the seed key; everything else (addresses,
        // federation names, other aliases) under the address key, where
        // the resolution loop picks them up.
        let kind = if valid_seed(value) {
            KeyType::Seed
        } else {
            KeyType::Address
        };
        self.store.set(&self.account_key(name, kind), value, None)?;
        Ok(kind)
    }

    /// Removes both credential entries for `name`.
    pub fn forget_account(&self, name: &str) -> Result<(), ResolveError> {
        self.store.delete(&self.account_key(name, KeyType::Address))?;
        self.store.delete(&self.account_key(name, KeyType::Seed))?;
        Ok(())
    }

    // -- assets ---------------------------------------------------------------

    /// Resolves an asset name.
    ///
    /// Accepts the empty string or `"native"` for the native asset,
    /// `code:issuer[:type]` literals (issuer resolved as an account name,
    /// type inferred from code length when omitted), or a stored asset
    /// alias.
    pub async fn resolve_asset(&self, name: &str) -> Result<Asset, ResolveError> {
        if name.is_empty() || name == "native" {
            return Ok(Asset::native());
        }

        if let Some((code, rest)) = name.split_once(':') {
            let (issuer_name, kind) = match rest.split_once(':') {
                Some((issuer, kind_str)) => {
                    let kind: AssetKind = kind_str
                        .parse()
                        .map_err(|_| ResolveError::BadAsset(format!("unknown type: {kind_str}")))?;
                    (issuer, Some(kind))
                }
                None => (rest, None),
            };
            let issuer = self.resolve_account(issuer_name, KeyType::Address).await?;
            return self.checked_asset(code, &issuer, kind);
        }

        let code = self
            .store
            .get(&self.asset_key(name, "code"))?
            .ok_or(ResolveError::UnresolvedAsset {
                name: name.to_string(),
                field: "code",
            })?;
        let issuer = self
            .store
            .get(&self.asset_key(name, "issuer"))?
            .ok_or(ResolveError::UnresolvedAsset {
                name: name.to_string(),
                field: "issuer",
            })?;
        let kind = match self.store.get(&self.asset_key(name, "type"))? {
            Some(kind_str) => Some(
                kind_str
                    .parse()
                    .map_err(|_| ResolveError::BadAsset(format!("unknown type: {kind_str}")))?,
            ),
            None => None,
        };

        let issuer = self.resolve_account(&issuer, KeyType::Address).await?;
        self.checked_asset(&code, &issuer, kind)
    }

    /// Stores an asset alias. The issuer may itself be an account name; it
    /// is stored as given and resolved on lookup.
    pub fn define_asset(
        &self,
        name: &str,
        code: &str,
        issuer: &str,
        kind: Option<AssetKind>,
    ) -> Result<(), ResolveError> {
        self.store.set(&self.asset_key(name, "code"), code, None)?;
        self.store.set(&self.asset_key(name, "issuer"), issuer, None)?;
        let kind = kind.unwrap_or_else(|| infer_kind(code));
        self.store
            .set(&self.asset_key(name, "type"), &kind.to_string(), None)?;
        Ok(())
    }

    /// Removes all stored fields of an asset alias.
    pub fn forget_asset(&self, name: &str) -> Result<(), ResolveError> {
        for field in ["code", "issuer", "type"] {
            self.store.delete(&self.asset_key(name, field))?;
        }
        Ok(())
    }

    fn checked_asset(
        &self,
        code: &str,
        issuer: &str,
        kind: Option<AssetKind>,
    ) -> Result<Asset, ResolveError> {
        let asset = Asset::new(code, issuer, kind.unwrap_or_else(|| infer_kind(code)));
        asset
            .validate()
            .map_err(|e| ResolveError::BadAsset(e.to_string()))?;
        Ok(asset)
    }
}

/// Infers the credit class from the code length.
fn infer_kind(code: &str) -> AssetKind {
    if code.len() <= CREDIT4_MAX_CODE_LEN {
        AssetKind::Credit4
    } else {
        AssetKind::Credit12
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use astra_client::{FakeLedger, Keypair, Network};
    use std::sync::Arc;

    fn resolver() -> Resolver {
        Resolver::new(Client::fake(), Arc::new(MemoryStore::new()), "test")
    }

    #[tokio::test]
    async fn literal_credentials_pass_through() {
        let r = resolver();
        let kp = Keypair::generate();

        assert_eq!(
            r.resolve_account(&kp.address(), KeyType::Address).await.unwrap(),
            kp.address()
        );
        assert_eq!(
            r.resolve_account(&kp.seed(), KeyType::Seed).await.unwrap(),
            kp.seed()
        );
        // The requested kind never filters a valid literal.
        assert_eq!(
            r.resolve_account(&kp.address(), KeyType::Seed).await.unwrap(),
            kp.address()
        );
        assert_eq!(
            r.resolve_account(&kp.seed(), KeyType::Address).await.unwrap(),
            kp.seed()
        );
    }

    #[tokio::test]
    async fn alias_resolves_to_address() {
        let r = resolver();
        let kp = Keypair::generate();
        r.define_account("mom", &kp.address()).unwrap();

        assert_eq!(
            r.resolve_account("mom", KeyType::Address).await.unwrap(),
            kp.address()
        );
    }

    #[tokio::test]
    async fn alias_chain_follows_multiple_hops() {
        let r = resolver();
        let kp = Keypair::generate();
        r.define_account("mom", "mother").unwrap();
        r.define_account("mother", &kp.address()).unwrap();

        assert_eq!(
            r.resolve_account("mom", KeyType::Address).await.unwrap(),
            kp.address()
        );
    }

    #[tokio::test]
    async fn address_request_falls_back_to_stored_seed() {
        let r = resolver();
        let kp = Keypair::generate();
        r.define_account("hot-wallet", &kp.seed()).unwrap();

        // Only the seed is stored. An address request finds it through the
        // opposite-kind fallback and returns it unchanged.
        assert_eq!(
            r.resolve_account("hot-wallet", KeyType::Address).await.unwrap(),
            kp.seed()
        );
        assert_eq!(r.resolve_source("hot-wallet").await.unwrap(), kp.seed());
    }

    #[tokio::test]
    async fn seed_request_accepts_address() {
        let r = resolver();
        let kp = Keypair::generate();
        r.define_account("watch-only", &kp.address()).unwrap();

        // A seed request on an address-only alias yields the address; the
        // caller decides whether an unsigned pipeline is acceptable.
        assert_eq!(
            r.resolve_account("watch-only", KeyType::Seed).await.unwrap(),
            kp.address()
        );
        assert_eq!(r.resolve_source("watch-only").await.unwrap(), kp.address());
    }

    #[tokio::test]
    async fn cycle_detected_instead_of_looping() {
        let r = resolver();
        r.define_account("a", "b").unwrap();
        r.define_account("b", "a").unwrap();

        let err = r.resolve_account("a", KeyType::Address).await.unwrap_err();
        assert!(matches!(err, ResolveError::ResolutionCycle(_)));
    }

    #[tokio::test]
    async fn overlong_chain_hits_hop_bound() {
        let r = resolver();
        for i in 0..(MAX_RESOLUTION_HOPS + 2) {
            r.define_account(&format!("n{i}"), &format!("n{}", i + 1))
                .unwrap();
        }

        let err = r.resolve_account("n0", KeyType::Address).await.unwrap_err();
        assert!(matches!(err, ResolveError::ResolutionCycle(_)));
    }

    #[tokio::test]
    async fn federation_name_resolves_remotely() {
        let kp = Keypair::generate();
        let fake = Arc::new(FakeLedger::new().with_federation("bob*astra.org", &kp.address()));
        let client = Client::new(Network::Fake, fake);
        let r = Resolver::new(client, Arc::new(MemoryStore::new()), "test");

        assert_eq!(
            r.resolve_account("bob*astra.org", KeyType::Address)
                .await
                .unwrap(),
            kp.address()
        );
    }

    #[tokio::test]
    async fn federation_failure_falls_through_to_store() {
        let r = resolver();
        let kp = Keypair::generate();
        // The fake has no federation record, but the alias store does.
        r.define_account("bob*astra.org", &kp.address()).unwrap();

        assert_eq!(
            r.resolve_account("bob*astra.org", KeyType::Address)
                .await
                .unwrap(),
            kp.address()
        );
    }

    #[tokio::test]
    async fn unresolved_account_reports_name() {
        let r = resolver();
        let err = r
            .resolve_account("stranger", KeyType::Address)
            .await
            .unwrap_err();
        match err {
            ResolveError::UnresolvedAccount { name, kind } => {
                assert_eq!(name, "stranger");
                assert_eq!(kind, KeyType::Address);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn native_asset_spellings() {
        let r = resolver();
        assert!(r.resolve_asset("").await.unwrap().is_native());
        assert!(r.resolve_asset("native").await.unwrap().is_native());
    }

    #[tokio::test]
    async fn asset_literal_with_issuer_alias() {
        let r = resolver();
        let issuer = Keypair::generate();
        r.define_account("bank", &issuer.address()).unwrap();

        let asset = r.resolve_asset("USD:bank").await.unwrap();
        assert_eq!(asset.code, "USD");
        assert_eq!(asset.issuer, issuer.address());
        assert_eq!(asset.kind, AssetKind::Credit4);

        let asset = r.resolve_asset("MEGATOKEN:bank").await.unwrap();
        assert_eq!(asset.kind, AssetKind::Credit12);

        let asset = r.resolve_asset("USD:bank:credit12").await.unwrap();
        assert_eq!(asset.kind, AssetKind::Credit12);
    }

    #[tokio::test]
    async fn asset_alias_roundtrip() {
        let r = resolver();
        let issuer = Keypair::generate();
        r.define_asset("dollars", "USD", &issuer.address(), None)
            .unwrap();

        let asset = r.resolve_asset("dollars").await.unwrap();
        assert_eq!(asset.code, "USD");
        assert_eq!(asset.issuer, issuer.address());
        assert_eq!(asset.kind, AssetKind::Credit4);

        r.forget_asset("dollars").unwrap();
        let err = r.resolve_asset("dollars").await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnresolvedAsset { field: "code", .. }
        ));
    }

    #[tokio::test]
    async fn asset_with_bad_issuer_rejected() {
        let r = resolver();
        let err = r.resolve_asset("USD:nobody").await.unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedAccount { .. }));
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let kp = Keypair::generate();
        let store: Arc<dyn crate::store::Store> = Arc::new(MemoryStore::new());

        // Same physical store, different namespaces: the alias written by
        // one resolver is invisible to the other.
        let r_a = Resolver::new(Client::fake(), store.clone(), "team-a");
        r_a.define_account("mom", &kp.address()).unwrap();

        let r_b = Resolver::new(Client::fake(), store, "team-b");
        assert!(r_b.resolve_account("mom", KeyType::Address).await.is_err());
        assert_eq!(
            r_a.resolve_account("mom", KeyType::Address).await.unwrap(),
            kp.address()
        );
    }
}
