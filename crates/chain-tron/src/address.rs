use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};

use crate::error::TronError;

/// Version byte of every Tron mainnet/testnet address.
pub const ADDRESS_PREFIX: u8 = 0x41;

/// Base58check address controlled by a raw 32-byte private key.
pub fn address_from_private_key(private_key: &[u8; 32]) -> Result<String, TronError> {
    let signing_key = SigningKey::from_bytes(private_key.into())
        .map_err(|e| TronError::InvalidPrivateKey(e.to_string()))?;
    let point = signing_key.verifying_key().to_encoded_point(false);

    // Same 20-byte account hash as Ethereum, different envelope.
    let hash = Keccak256::digest(&point.as_bytes()[1..]);
    let mut raw = [0u8; 20];
    raw.copy_from_slice(&hash[12..]);
    Ok(encode_address(&raw))
}

/// Base58check of `0x41 || raw`.
pub fn encode_address(raw: &[u8; 20]) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(ADDRESS_PREFIX);
    payload.extend_from_slice(raw);
    bs58::encode(payload).with_check().into_string()
}

/// The 20-byte account hash behind a base58 address.
pub fn decode_address(address: &str) -> Result<[u8; 20], TronError> {
    let payload = bs58::decode(address.trim())
        .with_check(None)
        .into_vec()
        .map_err(|e| TronError::InvalidAddress(format!("invalid base58check: {e}")))?;

    if payload.len() != 21 {
        return Err(TronError::InvalidAddress(format!(
            "expected 21 bytes, got {}",
            payload.len()
        )));
    }
    if payload[0] != ADDRESS_PREFIX {
        return Err(TronError::InvalidAddress(format!(
            "prefix 0x{:02x} is not a Tron address",
            payload[0]
        )));
    }

    let mut raw = [0u8; 20];
    raw.copy_from_slice(&payload[1..]);
    Ok(raw)
}

pub fn validate_address(address: &str) -> bool {
    decode_address(address).is_ok()
}

/// `41`-prefixed hex form used by the TronGrid HTTP API.
pub fn to_hex_address(address: &str) -> Result<String, TronError> {
    let raw = decode_address(address)?;
    Ok(format!("{:02x}{}", ADDRESS_PREFIX, hex::encode(raw)))
}

/// Inverse of [`to_hex_address`].
pub fn from_hex_address(hex_address: &str) -> Result<String, TronError> {
    let bytes = hex::decode(hex_address.trim_start_matches("0x"))
        .map_err(|e| TronError::InvalidAddress(format!("invalid hex: {e}")))?;
    match bytes.as_slice() {
        [ADDRESS_PREFIX, rest @ ..] if rest.len() == 20 => {
            let mut raw = [0u8; 20];
            raw.copy_from_slice(rest);
            Ok(encode_address(&raw))
        }
        _ => Err(TronError::InvalidAddress(format!(
            "{hex_address} is not a 41-prefixed 21-byte address"
        ))),
    }
}
