use bip39::{Language, Mnemonic};
use rand::RngCore;
use zeroize::{Zeroize, Zeroizing};

use crate::error::WalletError;

/// Generate a new 12-word BIP-39 mnemonic (128 bits of entropy)
pub fn generate_mnemonic() -> Result<String, WalletError> {
    let mut entropy = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut entropy);
    let mnemonic = Mnemonic::from_entropy_in(Language::English, &entropy)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()));
    entropy.zeroize();
    Ok(mnemonic?.to_string())
}

/// Validate a mnemonic phrase
pub fn validate_mnemonic(phrase: &str) -> bool {
    Mnemonic::parse_in_normalized(Language::English, phrase).is_ok()
}

/// Derive the 64-byte BIP-39 seed from a mnemonic and passphrase.
pub fn mnemonic_to_seed(phrase: &str, passphrase: &str) -> Result<Zeroizing<[u8; 64]>, WalletError> {
    let mnemonic = Mnemonic::parse_in_normalized(Language::English, phrase)
        .map_err(|e| WalletError::InvalidMnemonic(e.to_string()))?;
    Ok(Zeroizing::new(mnemonic.to_seed(passphrase)))
}

/// The supplied phrase, normalised, or a fresh one when none is given.
pub fn phrase_or_generate(phrase: Option<&str>) -> Result<Zeroizing<String>, WalletError> {
    match phrase {
        Some(p) => {
            let normalised = p.split_whitespace().collect::<Vec<_>>().join(" ");
            if !validate_mnemonic(&normalised) {
                return Err(WalletError::InvalidMnemonic("Invalid mnemonic phrase".into()));
            }
            Ok(Zeroizing::new(normalised))
        }
        None => Ok(Zeroizing::new(generate_mnemonic()?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    #[test]
    fn test_generate_mnemonic_12_words() {
        let mnemonic = generate_mnemonic().unwrap();
        assert_eq!(mnemonic.split_whitespace().count(), 12);
        assert!(validate_mnemonic(&mnemonic));
    }

    #[test]
    fn test_validate_invalid_mnemonic() {
        assert!(!validate_mnemonic("invalid mnemonic phrase here"));
    }

    #[test]
    fn test_bip39_test_vector() {
        let seed = mnemonic_to_seed(ABANDON, "").unwrap();
        assert_eq!(
            hex::encode(seed.as_slice()),
            "5eb00bbddcf069084889a8ab9155568165f5c453ccb85e70811aaed6f6da5fc1\
             9a5ac40b389cd370d086206dec8aa6c43daea6690f20ad3d8d48b2d2ce9e38e4"
        );
    }

    #[test]
    fn test_passphrase_changes_seed() {
        let plain = mnemonic_to_seed(ABANDON, "").unwrap();
        let salted = mnemonic_to_seed(ABANDON, "mypassphrase").unwrap();
        assert_ne!(plain.as_slice(), salted.as_slice());
    }

    #[test]
    fn test_phrase_is_normalised() {
        let messy = format!("  {}  ", ABANDON.replace(' ', "   "));
        assert_eq!(phrase_or_generate(Some(&messy)).unwrap().as_str(), ABANDON);
    }

    #[test]
    fn test_bad_phrase_rejected() {
        let err = phrase_or_generate(Some("abandon abandon")).unwrap_err();
        assert!(matches!(err, WalletError::InvalidMnemonic(_)));
    }

    #[test]
    fn test_missing_phrase_generates() {
        let phrase = phrase_or_generate(None).unwrap();
        assert!(validate_mnemonic(&phrase));
    }
}
