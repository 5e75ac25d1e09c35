//! # Operations and Envelopes
//!
//! An [`Operation`] is the payload of exactly one ledger state change; an
//! [`Envelope`] wraps one operation with the network passphrase, source
//! account, and memo, and defines the canonical bytes that get signed.
//!
//! Amounts enter the SDK as decimal strings (`"10"`, `"0.5"`) and are
//! parsed into integer micro-units at build time — seven decimal places,
//! no floating point anywhere near money. A malformed amount fails the
//! build before any network interaction.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::asset::Asset;
use crate::error::Error;
use crate::options::Memo;

/// Decimal places carried by the ledger's integer amount representation.
pub const AMOUNT_DECIMALS: u32 = 7;

/// One micro-unit multiplier: `10^AMOUNT_DECIMALS`.
const UNIT: i64 = 10_000_000;

// ---------------------------------------------------------------------------
// Amount parsing
// ---------------------------------------------------------------------------

/// Parses a decimal amount string into integer micro-units.
///
/// Accepts `"10"`, `"10.5"`, `"0.0000001"`. Rejects empty strings, signs,
/// more than seven fractional digits, and anything that is not plain
/// ASCII-digit decimal.
pub fn parse_amount(s: &str) -> Result<i64, Error> {
    let invalid = || Error::InvalidInput {
        what: "amount",
        value: s.to_string(),
    };

    let (whole, frac) = match s.split_once('.') {
        Some((w, f)) => (w, f),
        None => (s, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > AMOUNT_DECIMALS as usize {
        return Err(invalid());
    }

    let whole_units: i64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };

    let frac_units: i64 = if frac.is_empty() {
        0
    } else {
        let parsed: i64 = frac.parse().map_err(|_| invalid())?;
        parsed * 10i64.pow(AMOUNT_DECIMALS - frac.len() as u32)
    };

    whole_units
        .checked_mul(UNIT)
        .and_then(|v| v.checked_add(frac_units))
        .ok_or_else(invalid)
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// The payload of a single ledger operation.
///
/// Constructed through the checked constructors below, which parse amount
/// strings and surface malformed input as build-stage errors. One
/// transaction carries exactly one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Create and fund a new account.
    CreateAccount {
        destination: String,
        starting_balance: i64,
    },
    /// Move an amount of an asset from the source to a destination.
    Payment {
        destination: String,
        asset: Asset,
        amount: i64,
    },
    /// Open (or resize) a trustline from the source to a credit asset.
    /// `limit = None` means the maximum representable limit.
    ChangeTrust { asset: Asset, limit: Option<i64> },
    /// Remove a trustline (a change-trust with a zero limit).
    RemoveTrust { asset: Asset },
    /// Change the master signing weight of the source account.
    SetMasterWeight { weight: u32 },
    /// Add `address` as a signer on the source account.
    AddSigner { address: String, weight: u32 },
    /// Remove `address` as a signer from the source account.
    RemoveSigner { address: String },
    /// Set the low/medium/high operation thresholds of the source account.
    SetThresholds { low: u32, medium: u32, high: u32 },
}

impl Operation {
    /// Builds a create-account operation, parsing the funding amount.
    pub fn create_account(destination: &str, amount: &str) -> Result<Self, Error> {
        Ok(Self::CreateAccount {
            destination: destination.to_string(),
            starting_balance: parse_amount(amount)?,
        })
    }

    /// Builds a payment operation, parsing the amount.
    pub fn payment(destination: &str, asset: &Asset, amount: &str) -> Result<Self, Error> {
        Ok(Self::Payment {
            destination: destination.to_string(),
            asset: asset.clone(),
            amount: parse_amount(amount)?,
        })
    }

    /// Builds a change-trust operation. An empty limit string means
    /// "no explicit limit".
    pub fn change_trust(asset: &Asset, limit: Option<&str>) -> Result<Self, Error> {
        let limit = match limit {
            Some(l) if !l.is_empty() => Some(parse_amount(l)?),
            _ => None,
        };
        Ok(Self::ChangeTrust {
            asset: asset.clone(),
            limit,
        })
    }

    /// Builds a remove-trust operation.
    pub fn remove_trust(asset: &Asset) -> Self {
        Self::RemoveTrust {
            asset: asset.clone(),
        }
    }

    /// Short tag used in the canonical byte encoding and in logs.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CreateAccount { .. } => "create_account",
            Self::Payment { .. } => "payment",
            Self::ChangeTrust { .. } => "change_trust",
            Self::RemoveTrust { .. } => "remove_trust",
            Self::SetMasterWeight { .. } => "set_master_weight",
            Self::AddSigner { .. } => "add_signer",
            Self::RemoveSigner { .. } => "remove_signer",
            Self::SetThresholds { .. } => "set_thresholds",
        }
    }

    /// Appends this operation's canonical bytes to `buf`.
    ///
    /// Strings are null-terminated, integers are fixed-width little-endian.
    /// serde is deliberately not used here: field ordering must be stable
    /// across versions for signatures to keep verifying.
    fn write_bytes(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.tag().as_bytes());
        buf.push(0x00);

        let mut put_str = |buf: &mut Vec<u8>, s: &str| {
            buf.extend_from_slice(s.as_bytes());
            buf.push(0x00);
        };

        match self {
            Self::CreateAccount {
                destination,
                starting_balance,
            } => {
                put_str(buf, destination);
                buf.extend_from_slice(&starting_balance.to_le_bytes());
            }
            Self::Payment {
                destination,
                asset,
                amount,
            } => {
                put_str(buf, destination);
                put_str(buf, &asset.code);
                put_str(buf, &asset.issuer);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::ChangeTrust { asset, limit } => {
                put_str(buf, &asset.code);
                put_str(buf, &asset.issuer);
                match limit {
                    Some(l) => {
                        buf.push(0x01);
                        buf.extend_from_slice(&l.to_le_bytes());
                    }
                    None => buf.push(0x00),
                }
            }
            Self::RemoveTrust { asset } => {
                put_str(buf, &asset.code);
                put_str(buf, &asset.issuer);
            }
            Self::SetMasterWeight { weight } => {
                buf.extend_from_slice(&weight.to_le_bytes());
            }
            Self::AddSigner { address, weight } => {
                put_str(buf, address);
                buf.extend_from_slice(&weight.to_le_bytes());
            }
            Self::RemoveSigner { address } => {
                put_str(buf, address);
            }
            Self::SetThresholds { low, medium, high } => {
                buf.extend_from_slice(&low.to_le_bytes());
                buf.extend_from_slice(&medium.to_le_bytes());
                buf.extend_from_slice(&high.to_le_bytes());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The wire-level transaction envelope: one operation plus the context the
/// network needs to interpret and replay-protect it.
///
/// The envelope hash is `hex(sha256(sha256(signable_bytes)))` and is stable
/// across signing — signatures live next to the envelope, never inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Network passphrase, bound into the signature so a transaction
    /// signed for one network can never be replayed on another.
    pub network_passphrase: String,
    /// Source account address.
    pub source: String,
    /// The single operation this envelope carries.
    pub operation: Operation,
    /// Optional memo attached by the caller.
    pub memo: Memo,
}

impl Envelope {
    /// Returns the canonical byte representation that gets signed.
    pub fn signable_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(256);

        buf.extend_from_slice(self.network_passphrase.as_bytes());
        buf.push(0x00);

        buf.extend_from_slice(self.source.as_bytes());
        buf.push(0x00);

        match &self.memo {
            Memo::None => buf.push(0x00),
            Memo::Text(text) => {
                buf.push(0x01);
                buf.extend_from_slice(text.as_bytes());
                buf.push(0x00);
            }
            Memo::Id(id) => {
                buf.push(0x02);
                buf.extend_from_slice(&id.to_le_bytes());
            }
        }

        self.operation.write_bytes(&mut buf);
        buf
    }

    /// Computes the envelope hash: `hex(double_sha256(signable_bytes))`.
    pub fn hash(&self) -> String {
        hex::encode(double_sha256(&self.signable_bytes()))
    }
}

/// A fully signed envelope, ready for submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    /// The envelope that was signed.
    pub envelope: Envelope,
    /// Hex-encoded Ed25519 signatures over the envelope's signable bytes,
    /// in signing order. Empty when signatures were deliberately skipped.
    pub signatures: Vec<String>,
}

/// SHA-256 applied twice. Double hashing guards the envelope hash against
/// length-extension mischief.
fn double_sha256(data: &[u8]) -> [u8; 32] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    second.into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
