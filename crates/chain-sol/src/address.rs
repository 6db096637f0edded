//! Solana addresses are the base58 encoding of a raw 32-byte Ed25519 public
//! key. There is no hashing step.

use crate::error::SolError;

/// Decode an address into its 32 bytes.
pub fn address_to_bytes(address: &str) -> Result<[u8; 32], SolError> {
    let bytes = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| SolError::InvalidAddress(format!("base58 decode failed: {e}")))?;

    bytes.try_into().map_err(|v: Vec<u8>| {
        SolError::InvalidAddress(format!("expected 32 bytes, got {}", v.len()))
    })
}

pub fn bytes_to_address(bytes: &[u8; 32]) -> String {
    bs58::encode(bytes).into_string()
}

/// Whether `address` decodes to exactly 32 bytes.
///
/// Off-curve addresses (PDAs) are valid recipients, so no curve check is made.
pub fn validate_address(address: &str) -> bool {
    address_to_bytes(address).is_ok()
}
