use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::UtxoError;
use crate::network::UtxoNetwork;

/// Flag byte appended to WIF payloads of compressed keys.
const COMPRESSED_FLAG: u8 = 0x01;

/// Generate a fresh secp256k1 secret key from the OS RNG.
pub fn generate_secret_key() -> SecretKey {
    loop {
        let mut bytes = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(bytes.as_mut());
        // Out-of-range scalars are astronomically rare; draw again.
        if let Ok(key) = SecretKey::from_slice(bytes.as_ref()) {
            return key;
        }
    }
}

/// Parse a raw 32-byte scalar.
pub fn secret_from_bytes(bytes: &[u8]) -> Result<SecretKey, UtxoError> {
    SecretKey::from_slice(bytes)
        .map_err(|e| UtxoError::InvalidPrivateKey(format!("invalid secret key: {e}")))
}

/// 33-byte compressed public key of `secret`.
pub fn compressed_public_key(secret: &SecretKey) -> [u8; 33] {
    let secp = Secp256k1::signing_only();
    PublicKey::from_secret_key(&secp, secret).serialize()
}

/// Encode a secret key as compressed WIF for `network`.
pub fn encode_wif(secret: &SecretKey, network: &UtxoNetwork) -> String {
    let mut payload = Zeroizing::new(Vec::with_capacity(34));
    payload.push(network.wif);
    payload.extend_from_slice(&secret.secret_bytes());
    payload.push(COMPRESSED_FLAG);
    bs58::encode(payload.as_slice()).with_check().into_string()
}

/// Decode a compressed WIF string, checking the version byte against `network`.
pub fn decode_wif(wif: &str, network: &UtxoNetwork) -> Result<SecretKey, UtxoError> {
    let payload = Zeroizing::new(
        bs58::decode(wif.trim())
            .with_check(None)
            .into_vec()
            .map_err(|e| UtxoError::InvalidPrivateKey(format!("invalid WIF encoding: {e}")))?,
    );

    match payload.len() {
        34 if payload[33] == COMPRESSED_FLAG => {}
        33 => {
            return Err(UtxoError::InvalidPrivateKey(
                "uncompressed WIF keys are not supported".into(),
            ))
        }
        n => {
            return Err(UtxoError::InvalidPrivateKey(format!(
                "unexpected WIF payload length {n}"
            )))
        }
    }

    if payload[0] != network.wif {
        return Err(UtxoError::InvalidPrivateKey(format!(
            "WIF version 0x{:02x} does not belong to {} (expected 0x{:02x})",
            payload[0], network.name, network.wif
        )));
    }

    secret_from_bytes(&payload[1..33])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_one() -> SecretKey {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        SecretKey::from_slice(&bytes).unwrap()
    }

    #[test]
    fn wif_test_vector_for_key_one() {
        let wif = encode_wif(&key_one(), &UtxoNetwork::bitcoin_testnet());
        assert_eq!(wif, "cMahea7zqjxrtgAbB7LSGbcQUr1uX1ojuat9jZodMN87JcbXMTcA");
    }

    #[test]
    fn decode_wif_recovers_key() {
        let net = UtxoNetwork::litecoin_testnet();
        let key = generate_secret_key();
        let decoded = decode_wif(&encode_wif(&key, &net), &net).unwrap();
        assert_eq!(decoded, key);
    }

    #[test]
    fn decode_rejects_wrong_version() {
        let mut net = UtxoNetwork::bitcoin_testnet();
        let wif = encode_wif(&key_one(), &net);
        net.wif = 0x80;
        let err = decode_wif(&wif, &net).unwrap_err();
        assert!(err.to_string().contains("does not belong"));
    }

    #[test]
    fn decode_rejects_bad_checksum() {
        let wif = encode_wif(&key_one(), &UtxoNetwork::bitcoin_testnet());
        let mut chars: Vec<char> = wif.chars().collect();
        let last = chars.len() - 1;
        chars[last] = if chars[last] == 'A' { 'B' } else { 'A' };
        let tampered: String = chars.into_iter().collect();
        assert!(decode_wif(&tampered, &UtxoNetwork::bitcoin_testnet()).is_err());
    }

    #[test]
    fn decode_rejects_uncompressed_payload() {
        let mut payload = vec![0xef];
        payload.extend_from_slice(&key_one().secret_bytes());
        let wif = bs58::encode(payload).with_check().into_string();
        let err = decode_wif(&wif, &UtxoNetwork::bitcoin_testnet()).unwrap_err();
        assert!(err.to_string().contains("uncompressed"));
    }

    #[test]
    fn compressed_public_key_of_key_one() {
        assert_eq!(
            hex::encode(compressed_public_key(&key_one())),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );
    }

    #[test]
    fn zero_scalar_is_rejected() {
        assert!(secret_from_bytes(&[0u8; 32]).is_err());
    }
}
