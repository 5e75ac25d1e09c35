//! # Addresses, Seeds, and Keypairs
//!
//! On the Astra network a **seed** is a private signing credential and an
//! **address** is a public account identifier. Both are Bech32 strings with
//! distinct human-readable prefixes, so the two kinds can never be confused
//! by a checksum-validating parser:
//!
//! ```text
//! Address: bech32("astra",    pubkey[32])  -> astra1qw508d6qe...
//! Seed:    bech32("astrasec", secret[32])  -> astrasec1lmr0t...
//! ```
//!
//! A seed derives exactly one address: the Ed25519 secret scalar produces
//! one verifying key, and the address is that key's Bech32 encoding. The
//! validity predicates in this module are purely structural — they check
//! prefix, checksum, and payload length, and never touch the network. They
//! cannot tell you whether a structurally valid seed is *meant* as a seed;
//! callers pass the wrong kind at their own risk.

use bech32::{Bech32, Hrp};
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use std::fmt;

use crate::error::Error;

/// Human-readable prefix for public account identifiers.
const ADDRESS_HRP: &str = "astra";

/// Human-readable prefix for private signing credentials.
const SEED_HRP: &str = "astrasec";

/// Both address and seed payloads are raw 32-byte Ed25519 key material.
const KEY_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Structural validity predicates
// ---------------------------------------------------------------------------

/// Returns `true` iff `s` is a structurally valid Astra address.
///
/// Checks the `astra` prefix, the Bech32 checksum, and the 32-byte payload
/// length. Pure — no I/O, no network.
pub fn valid_address(s: &str) -> bool {
    decode_with_hrp(s, ADDRESS_HRP).is_some()
}

/// Returns `true` iff `s` is a structurally valid Astra seed.
pub fn valid_seed(s: &str) -> bool {
    decode_with_hrp(s, SEED_HRP).is_some()
}

/// Returns `true` iff `s` is a valid address *or* a valid seed.
///
/// The prefixes are disjoint, so at most one of the two predicates can
/// hold for any given string.
pub fn valid_address_or_seed(s: &str) -> bool {
    valid_address(s) || valid_seed(s)
}

/// Decodes a Bech32 string and returns its payload iff the HRP matches
/// and the payload is exactly [`KEY_LENGTH`] bytes.
fn decode_with_hrp(s: &str, expected_hrp: &str) -> Option<[u8; KEY_LENGTH]> {
    let (hrp, data) = bech32::decode(s).ok()?;
    let expected = Hrp::parse(expected_hrp).expect("static HRP is valid");
    if hrp != expected || data.len() != KEY_LENGTH {
        return None;
    }
    let mut bytes = [0u8; KEY_LENGTH];
    bytes.copy_from_slice(&data);
    Some(bytes)
}

fn encode_with_hrp(bytes: &[u8; KEY_LENGTH], hrp: &str) -> String {
    let hrp = Hrp::parse(hrp).expect("static HRP is valid");
    bech32::encode::<Bech32>(hrp, bytes).expect("encoding a 32-byte payload should never fail")
}

/// Encodes raw public key bytes as an Astra address string.
pub fn encode_address(public_key: &[u8; KEY_LENGTH]) -> String {
    encode_with_hrp(public_key, ADDRESS_HRP)
}

/// Encodes raw secret key bytes as an Astra seed string.
pub fn encode_seed(secret_key: &[u8; KEY_LENGTH]) -> String {
    encode_with_hrp(secret_key, SEED_HRP)
}

// ---------------------------------------------------------------------------
// Keypair
// ---------------------------------------------------------------------------

/// An Ed25519 signing identity on the Astra network.
///
/// Wraps the signing key and exposes the two string encodings callers deal
/// in: the shareable address and the guard-with-your-life seed.
///
/// `Keypair` intentionally does NOT implement `Serialize`/`Deserialize`.
/// Writing a seed somewhere should be a deliberate act, not a side effect
/// of serializing a struct that happens to contain one.
///
/// # Examples
///
/// ```
/// use astra_client::keys::{valid_address, valid_seed, Keypair};
///
/// let kp = Keypair::generate();
/// assert!(valid_address(&kp.address()));
/// assert!(valid_seed(&kp.seed()));
/// ```
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generates a fresh keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Reconstructs a keypair from a seed string.
    ///
    /// Fails with [`Error::InvalidInput`] when the string is not a
    /// structurally valid seed. This is the only way key material enters
    /// the transaction pipeline.
    pub fn from_seed(seed: &str) -> Result<Self, Error> {
        let bytes = decode_with_hrp(seed, SEED_HRP).ok_or_else(|| Error::InvalidInput {
            what: "seed",
            value: seed.to_string(),
        })?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }

    /// Returns the address derived from this keypair's verifying key.
    pub fn address(&self) -> String {
        encode_address(&self.signing_key.verifying_key().to_bytes())
    }

    /// Returns the seed encoding of the secret key. Handle with care.
    pub fn seed(&self) -> String {
        encode_seed(&self.signing_key.to_bytes())
    }

    /// Signs a message, returning the raw 64-byte Ed25519 signature.
    ///
    /// Ed25519 signing is deterministic — same key, same message, same
    /// signature. No nonce management at signing time.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Signs a message and returns the signature hex-encoded, the form
    /// carried inside a signed envelope.
    pub fn sign_hex(&self, message: &[u8]) -> String {
        hex::encode(self.sign(message))
    }
}

impl Clone for Keypair {
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for Keypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print seed material, not even partially.
        write!(f, "Keypair({})", self.address())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_address_and_seed_validate() {
        let kp = Keypair::generate();
        assert!(valid_address(&kp.address()));
        assert!(valid_seed(&kp.seed()));
    }

    #[test]
    fn predicates_are_disjoint() {
        // A well-formed address must never pass the seed predicate and
        // vice versa — the HRPs differ, so the XOR property holds.
        let kp = Keypair::generate();
        assert!(!valid_seed(&kp.address()));
        assert!(!valid_address(&kp.seed()));
    }

    #[test]
    fn address_or_seed_accepts_both() {
        let kp = Keypair::generate();
        assert!(valid_address_or_seed(&kp.address()));
        assert!(valid_address_or_seed(&kp.seed()));
    }

    #[test]
    fn garbage_strings_rejected() {
        for s in ["", "bob", "astra1", "G1234", "invalid-address"] {
            assert!(!valid_address(s), "{s:?} must not validate");
            assert!(!valid_seed(s), "{s:?} must not validate");
        }
    }

    #[test]
    fn corrupted_checksum_rejected() {
        let kp = Keypair::generate();
        let mut addr = kp.address();
        // Flip the final checksum character.
        let last = addr.pop().unwrap();
        addr.push(if last == 'q' { 'p' } else { 'q' });
        assert!(!valid_address(&addr));
    }

    #[test]
    fn seed_derives_exactly_one_address() {
        let kp = Keypair::generate();
        let restored = Keypair::from_seed(&kp.seed()).unwrap();
        assert_eq!(kp.address(), restored.address());
    }

    #[test]
    fn from_seed_rejects_address() {
        let kp = Keypair::generate();
        let err = Keypair::from_seed(&kp.address()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { what: "seed", .. }));
    }

    #[test]
    fn signing_is_deterministic() {
        let kp = Keypair::generate();
        assert_eq!(kp.sign(b"pay alice 10"), kp.sign(b"pay alice 10"));
    }

    #[test]
    fn two_generated_keypairs_differ() {
        let kp1 = Keypair::generate();
        let kp2 = Keypair::generate();
        assert_ne!(kp1.address(), kp2.address());
    }

    #[test]
    fn debug_does_not_leak_seed() {
        let kp = Keypair::generate();
        let debug = format!("{:?}", kp);
        assert!(debug.contains(&kp.address()));
        assert!(!debug.contains(&kp.seed()));
    }

    #[test]
    fn sign_hex_is_128_chars() {
        let kp = Keypair::generate();
        let sig = kp.sign_hex(b"message");
        assert_eq!(sig.len(), 128);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
