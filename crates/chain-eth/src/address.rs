use k256::ecdsa::SigningKey;
use sha3::{Digest, Keccak256};

use crate::error::EthError;

/// Derives an EIP-55 checksummed address from an uncompressed secp256k1
/// public key (65 bytes, starting with 0x04).
pub fn pubkey_to_eth_address(uncompressed_pubkey: &[u8; 65]) -> Result<String, EthError> {
    if uncompressed_pubkey[0] != 0x04 {
        return Err(EthError::InvalidPublicKey(
            "uncompressed key must start with 0x04".into(),
        ));
    }

    // Keccak-256 of the 64-byte key, last 20 bytes.
    let hash = Keccak256::digest(&uncompressed_pubkey[1..]);
    checksum_address(&format!("0x{}", hex::encode(&hash[12..])))
}

/// Address controlled by a raw 32-byte private key.
pub fn address_from_private_key(private_key: &[u8; 32]) -> Result<String, EthError> {
    let signing_key = SigningKey::from_bytes(private_key.into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))?;
    let point = signing_key.verifying_key().to_encoded_point(false);

    let mut key_65 = [0u8; 65];
    key_65.copy_from_slice(point.as_bytes());
    pubkey_to_eth_address(&key_65)
}

/// Parses a private key given as 64 hex characters, with or without `0x`.
pub fn parse_private_key(input: &str) -> Result<[u8; 32], EthError> {
    let trimmed = input.trim();
    let hex_part = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);

    let bytes = hex::decode(hex_part)
        .map_err(|e| EthError::InvalidPrivateKey(format!("invalid hex: {e}")))?;
    let key: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
        EthError::InvalidPrivateKey(format!("expected 32 bytes, got {}", b.len()))
    })?;

    // Rejects zero and out-of-range scalars.
    SigningKey::from_bytes((&key).into())
        .map_err(|e| EthError::InvalidPrivateKey(e.to_string()))?;
    Ok(key)
}

/// Parses a 0x-prefixed address into its 20 raw bytes.
///
/// Only the shape is checked here; use [`validate_address`] to verify an
/// EIP-55 checksum.
pub fn parse_address(address: &str) -> Result<[u8; 20], EthError> {
    let hex_str = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| EthError::InvalidAddress("address must start with 0x".into()))?;

    if hex_str.len() != 40 {
        return Err(EthError::InvalidAddress(format!(
            "expected 40 hex characters, got {}",
            hex_str.len()
        )));
    }

    let bytes =
        hex::decode(hex_str).map_err(|e| EthError::InvalidAddress(format!("invalid hex: {e}")))?;
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&bytes);
    Ok(addr)
}

/// Validates an address string.
///
/// All-lowercase and all-uppercase addresses carry no checksum and are
/// accepted as-is; mixed case must match EIP-55. Malformed input is an error,
/// a well-formed address with a wrong checksum is `Ok(false)`.
pub fn validate_address(address: &str) -> Result<bool, EthError> {
    parse_address(address)?;
    let hex_part = &address[2..];

    let is_all_lower = hex_part.chars().all(|c| !c.is_ascii_uppercase());
    let is_all_upper = hex_part.chars().all(|c| !c.is_ascii_lowercase());
    if is_all_lower || is_all_upper {
        return Ok(true);
    }

    let checksummed = checksum_address(address)?;
    Ok(checksummed[2..] == *hex_part)
}

/// Boolean form of [`validate_address`].
pub fn is_valid_address(address: &str) -> bool {
    matches!(validate_address(address), Ok(true))
}

/// Applies EIP-55 mixed-case checksum encoding to an address.
pub fn checksum_address(address: &str) -> Result<String, EthError> {
    parse_address(address)?;
    let hex_part = address[2..].to_lowercase();

    let hash = Keccak256::digest(hex_part.as_bytes());

    let mut checksummed = String::with_capacity(42);
    checksummed.push_str("0x");
    for (i, c) in hex_part.chars().enumerate() {
        // Nibble i of the hash decides the case of character i.
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if c.is_ascii_alphabetic() && nibble >= 8 {
            checksummed.push(c.to_ascii_uppercase());
        } else {
            checksummed.push(c);
        }
    }

    Ok(checksummed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eip55_checksum_known_addresses() {
        let cases = [
            "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed",
            "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359",
            "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB",
            "0xD1220A0cf47c7B9Be7A2E6BA89F429762e7b9aDb",
        ];

        for expected in &cases {
            let lower = format!("0x{}", expected[2..].to_lowercase());
            assert_eq!(&checksum_address(&lower).unwrap(), expected);
        }
    }

    #[test]
    fn address_of_key_one() {
        let mut key = [0u8; 32];
        key[31] = 1;
        let addr = address_from_private_key(&key).unwrap();
        assert_eq!(
            addr.to_lowercase(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
        assert!(validate_address(&addr).unwrap());
    }

    #[test]
    fn address_of_eip155_example_key() {
        let key = [0x46u8; 32];
        let addr = address_from_private_key(&key).unwrap();
        assert_eq!(
            addr.to_lowercase(),
            "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f"
        );
    }

    #[test]
    fn parse_private_key_accepts_optional_prefix() {
        let hex_key = "46".repeat(32);
        assert_eq!(parse_private_key(&hex_key).unwrap(), [0x46; 32]);
        assert_eq!(parse_private_key(&format!("0x{hex_key}")).unwrap(), [0x46; 32]);
    }

    #[test]
    fn parse_private_key_rejects_bad_input() {
        assert!(parse_private_key("0x1234").is_err());
        assert!(parse_private_key(&"zz".repeat(32)).is_err());
        assert!(parse_private_key(&"00".repeat(32)).is_err());
    }

    #[test]
    fn validate_case_rules() {
        assert!(validate_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap());
        assert!(validate_address("0x5AAEB6053F3E94C9B9A09F33669435E7EF1BEAED").unwrap());
        assert!(!validate_address("0x5AAEB6053F3E94C9b9A09f33669435E7Ef1BeAed").unwrap());
    }

    #[test]
    fn validate_malformed_is_error() {
        assert!(validate_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
        assert!(validate_address("0x5aaeb6").is_err());
        assert!(validate_address("0xZZaeb6053f3e94c9b9a09f33669435e7ef1beaed").is_err());
        assert!(!is_valid_address("0xZZaeb6053f3e94c9b9a09f33669435e7ef1beaed"));
    }

    #[test]
    fn non_04_prefix_rejected() {
        let mut key = [0u8; 65];
        key[0] = 0x02;
        assert!(pubkey_to_eth_address(&key).is_err());
    }
}
