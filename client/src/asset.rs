//! # Asset Types
//!
//! An [`Asset`] identifies what is being moved: either the network's native
//! token or a credit asset issued by a specific account. Credit assets come
//! in two wire classes, a 4-byte code class and a 12-byte code class, which
//! only affect how the code is packed into the envelope.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::keys::valid_address;

// ---------------------------------------------------------------------------
// AssetKind
// ---------------------------------------------------------------------------

/// Discriminant for the three asset classes on the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetKind {
    /// The network's native token. No code, no issuer.
    Native,
    /// Credit asset with a short (4-byte class) code.
    Credit4,
    /// Credit asset with a long (12-byte class) code.
    Credit12,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Credit4 => write!(f, "credit4"),
            Self::Credit12 => write!(f, "credit12"),
        }
    }
}

impl FromStr for AssetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Self::Native),
            "credit4" => Ok(Self::Credit4),
            "credit12" => Ok(Self::Credit12),
            other => Err(Error::InvalidAsset(format!("unknown asset type: {other}"))),
        }
    }
}

// ---------------------------------------------------------------------------
// Asset
// ---------------------------------------------------------------------------

/// A native or credit asset. Immutable after construction.
///
/// Invariants (enforced by [`Asset::validate`]):
/// - `Native` implies empty `code` and empty `issuer`.
/// - `Credit4`/`Credit12` require a non-empty code and a structurally
///   valid issuer address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Asset code, e.g. `"USD"`. Empty for the native asset.
    pub code: String,
    /// Issuing account address. Empty for the native asset.
    pub issuer: String,
    /// Which of the three asset classes this is.
    pub kind: AssetKind,
}

impl Asset {
    /// Returns the native asset singleton value.
    pub fn native() -> Self {
        Self {
            code: String::new(),
            issuer: String::new(),
            kind: AssetKind::Native,
        }
    }

    /// Creates a credit (or native) asset from its parts.
    pub fn new(code: &str, issuer: &str, kind: AssetKind) -> Self {
        Self {
            code: code.to_string(),
            issuer: issuer.to_string(),
            kind,
        }
    }

    /// Returns `true` for the native asset.
    pub fn is_native(&self) -> bool {
        self.kind == AssetKind::Native
    }

    /// Validates the asset's structural invariants.
    ///
    /// Credit assets must carry a non-empty code of at most 12 characters
    /// and an issuer that passes address validation. The native asset is
    /// always valid. Code length is not cross-checked against the 4/12
    /// class — the class only selects the wire packing.
    pub fn validate(&self) -> Result<(), Error> {
        if self.is_native() {
            return Ok(());
        }

        if self.code.is_empty() {
            return Err(Error::InvalidAsset("credit asset has no code".to_string()));
        }

        if self.code.len() > 12 {
            return Err(Error::InvalidAsset(format!(
                "asset code too long: {}",
                self.code
            )));
        }

        if !valid_address(&self.issuer) {
            return Err(Error::InvalidAsset(format!(
                "bad issuer address: {}",
                self.issuer
            )));
        }

        Ok(())
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_native() {
            write!(f, "native")
        } else {
            write!(f, "{}:{}", self.code, self.issuer)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
