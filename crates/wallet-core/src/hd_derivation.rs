use bip32::{DerivationPath, XPrv};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use zeroize::Zeroize;

use crate::error::WalletError;

/// BIP-44 path of the first EVM account.
pub const EVM_PATH: &str = "m/44'/60'/0'/0/0";
/// BIP-44 path of the first Tron account (coin type 195).
pub const TRON_PATH: &str = "m/44'/195'/0'/0/0";
/// SLIP-0010 path used by Solana wallets; every level is hardened.
pub const SOLANA_PATH: &str = "m/44'/501'/0'/0'";

const HARDENED: u32 = 0x8000_0000;

type HmacSha512 = Hmac<Sha512>;

/// Derive a secp256k1 private key from seed using BIP-32
pub fn derive_secp256k1_key(seed: &[u8], path: &str) -> Result<DerivedKey, WalletError> {
    let parsed: DerivationPath = path
        .parse()
        .map_err(|e: bip32::Error| WalletError::DerivationFailed(e.to_string()))?;

    let xprv = XPrv::derive_from_path(seed, &parsed)
        .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;

    Ok(DerivedKey {
        private_key: xprv.to_bytes().into(),
        derivation_path: path.to_string(),
    })
}

/// Derive an Ed25519 private key from seed using SLIP-0010.
///
/// Ed25519 has no public child derivation, so every path component must be
/// hardened.
pub fn derive_ed25519_key(seed: &[u8], path: &str) -> Result<DerivedKey, WalletError> {
    let components = parse_derivation_path(path)?;

    // Master key: HMAC-SHA512(key="ed25519 seed", data=seed)
    let mut mac = HmacSha512::new_from_slice(b"ed25519 seed")
        .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;
    mac.update(seed);
    let mut result: [u8; 64] = mac.finalize().into_bytes().into();

    let mut key = [0u8; 32];
    let mut chain_code = [0u8; 32];
    key.copy_from_slice(&result[..32]);
    chain_code.copy_from_slice(&result[32..]);

    for child_index in components {
        if child_index & HARDENED == 0 {
            key.zeroize();
            chain_code.zeroize();
            result.zeroize();
            return Err(WalletError::DerivationFailed(format!(
                "{path}: ed25519 derivation requires hardened components"
            )));
        }

        let mut mac = HmacSha512::new_from_slice(&chain_code)
            .map_err(|e| WalletError::DerivationFailed(e.to_string()))?;
        // Hardened child: 0x00 || key || index
        mac.update(&[0x00]);
        mac.update(&key);
        mac.update(&child_index.to_be_bytes());
        result = mac.finalize().into_bytes().into();

        key.copy_from_slice(&result[..32]);
        chain_code.copy_from_slice(&result[32..]);
    }

    let derived = DerivedKey {
        private_key: key,
        derivation_path: path.to_string(),
    };

    key.zeroize();
    chain_code.zeroize();
    result.zeroize();

    Ok(derived)
}

/// Parse "m/44'/501'/0'/0'" into indices with the hardened bit applied.
fn parse_derivation_path(path: &str) -> Result<Vec<u32>, WalletError> {
    let rest = path
        .strip_prefix("m/")
        .ok_or_else(|| WalletError::DerivationFailed("Path must start with m/".into()))?;

    rest.split('/')
        .map(|component| {
            let (num_str, hardened) = match component
                .strip_suffix('\'')
                .or_else(|| component.strip_suffix('h'))
            {
                Some(n) => (n, true),
                None => (component, false),
            };
            let index: u32 = num_str.parse().map_err(|e| {
                WalletError::DerivationFailed(format!("Invalid path component {component:?}: {e}"))
            })?;
            if index >= HARDENED {
                return Err(WalletError::DerivationFailed(format!(
                    "Path component {component:?} out of range"
                )));
            }
            Ok(if hardened { index | HARDENED } else { index })
        })
        .collect()
}

/// A derived 32-byte private key, zeroized on drop.
pub struct DerivedKey {
    pub private_key: [u8; 32],
    pub derivation_path: String,
}

impl Drop for DerivedKey {
    fn drop(&mut self) {
        self.private_key.zeroize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mnemonic::mnemonic_to_seed;

    // BIP-39 test vector: "abandon" x11 + "about"
    const TEST_MNEMONIC: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn test_seed() -> [u8; 64] {
        *mnemonic_to_seed(TEST_MNEMONIC, "").unwrap()
    }

    #[test]
    fn test_derive_eth_key_vector() {
        let key = derive_secp256k1_key(&test_seed(), EVM_PATH).unwrap();
        assert_eq!(key.derivation_path, "m/44'/60'/0'/0/0");
        let address = chain_eth::address::address_from_private_key(&key.private_key).unwrap();
        assert_eq!(address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
    }

    #[test]
    fn test_tron_and_evm_keys_differ() {
        let seed = test_seed();
        let evm = derive_secp256k1_key(&seed, EVM_PATH).unwrap();
        let tron = derive_secp256k1_key(&seed, TRON_PATH).unwrap();
        assert_ne!(evm.private_key, tron.private_key);
    }

    #[test]
    fn test_derivation_deterministic() {
        let seed = test_seed();
        let a = derive_secp256k1_key(&seed, "m/44'/2'/0'/0/0").unwrap();
        let b = derive_secp256k1_key(&seed, "m/44'/2'/0'/0/0").unwrap();
        assert_eq!(a.private_key, b.private_key);
    }

    #[test]
    fn test_derive_sol_key() {
        let seed = test_seed();
        let key = derive_ed25519_key(&seed, SOLANA_PATH).unwrap();
        assert_eq!(key.derivation_path, "m/44'/501'/0'/0'");
        let again = derive_ed25519_key(&seed, SOLANA_PATH).unwrap();
        assert_eq!(key.private_key, again.private_key);
        let other = derive_ed25519_key(&seed, "m/44'/501'/1'/0'").unwrap();
        assert_ne!(key.private_key, other.private_key);
    }

    #[test]
    fn test_slip10_vector_1_master_child() {
        // SLIP-0010 ed25519 test vector 1, chain m/0'.
        let seed = hex::decode("000102030405060708090a0b0c0d0e0f").unwrap();
        let key = derive_ed25519_key(&seed, "m/0'").unwrap();
        assert_eq!(
            hex::encode(key.private_key),
            "68e0fe46dfb67e368c75379acec591dad19df3cde26e63b93a8e704f1dade7a3"
        );
    }

    #[test]
    fn test_ed25519_rejects_unhardened() {
        assert!(derive_ed25519_key(&test_seed(), "m/44'/501'/0'/0").is_err());
    }

    #[test]
    fn test_parse_derivation_path() {
        assert_eq!(
            parse_derivation_path("m/44'/60'/0'/0/0").unwrap(),
            vec![44 | HARDENED, 60 | HARDENED, HARDENED, 0, 0]
        );
        assert_eq!(parse_derivation_path("m/1h").unwrap(), vec![1 | HARDENED]);
        assert!(parse_derivation_path("44'/60'").is_err());
        assert!(parse_derivation_path("m/x").is_err());
    }
}
