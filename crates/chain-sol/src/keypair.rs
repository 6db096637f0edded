use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};
use rand_core::OsRng;
use zeroize::Zeroizing;

use crate::address::bytes_to_address;
use crate::error::SolError;

/// Text encoding a secret key was supplied in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    Base64,
    JsonArray,
    Base58,
}

impl std::fmt::Display for KeyFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyFormat::Base64 => write!(f, "base64"),
            KeyFormat::JsonArray => write!(f, "json-array"),
            KeyFormat::Base58 => write!(f, "base58"),
        }
    }
}

/// An Ed25519 keypair.
///
/// The exported secret is the 64-byte `seed || pubkey` layout used by the
/// Solana CLI and browser wallets.
pub struct SolKeypair {
    signing_key: SigningKey,
}

impl SolKeypair {
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Accepts the 64-byte `seed || pubkey` layout; the public half must
    /// belong to the seed.
    pub fn from_keypair_bytes(bytes: &[u8]) -> Result<Self, SolError> {
        let bytes: &[u8; 64] = bytes.try_into().map_err(|_| {
            SolError::InvalidPrivateKey(format!(
                "invalid key length: {} bytes (expected 64)",
                bytes.len()
            ))
        })?;
        let signing_key = SigningKey::from_keypair_bytes(bytes).map_err(|e| {
            SolError::InvalidPrivateKey(format!("public key does not match secret: {e}"))
        })?;
        Ok(Self { signing_key })
    }

    /// Parse a secret key in any of the supported text encodings.
    ///
    /// Input starting with `[` is a JSON byte array; input containing `+`,
    /// `/` or `=` is base64; anything else is base58.
    pub fn parse(input: &str) -> Result<(Self, KeyFormat), SolError> {
        let input = input.trim();

        let (bytes, format) = if input.starts_with('[') {
            let parsed: Vec<u8> = serde_json::from_str(input).map_err(|e| {
                SolError::InvalidPrivateKey(format!("JSON array parse failed: {e}"))
            })?;
            (Zeroizing::new(parsed), KeyFormat::JsonArray)
        } else if input.contains(['+', '/', '=']) {
            let decoded = STANDARD
                .decode(input)
                .map_err(|e| SolError::InvalidPrivateKey(format!("base64 decode failed: {e}")))?;
            (Zeroizing::new(decoded), KeyFormat::Base64)
        } else {
            let decoded = bs58::decode(input)
                .into_vec()
                .map_err(|e| SolError::InvalidPrivateKey(format!("base58 decode failed: {e}")))?;
            (Zeroizing::new(decoded), KeyFormat::Base58)
        };

        Ok((Self::from_keypair_bytes(&bytes)?, format))
    }

    pub fn pubkey(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    pub fn address(&self) -> String {
        bytes_to_address(&self.pubkey())
    }

    pub fn keypair_bytes(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.keypair_bytes().as_slice()).into_string()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.keypair_bytes().as_slice())
    }

    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

impl std::fmt::Debug for SolKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolKeypair")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
