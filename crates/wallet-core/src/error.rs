use thiserror::Error;

use crate::providers::ProviderError;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("Invalid mnemonic: {0}")]
    InvalidMnemonic(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Private key does not match the from address (key controls {derived}, request says {requested})")]
    KeyMismatch { derived: String, requested: String },

    #[error("No funds available")]
    NoFunds,

    #[error(
        "Insufficient funds: have {available} {unit}, need {required} {unit} (short by {shortfall} {unit})"
    )]
    InsufficientFunds {
        available: String,
        required: String,
        shortfall: String,
        unit: String,
    },

    #[error("Unknown network: {key}. Available networks: {available}")]
    UnknownNetwork { key: String, available: String },

    #[error("{0} is not supported on this network")]
    Unsupported(String),

    #[error("Transaction not found: {0}")]
    NotFound(String),

    #[error("Transaction build failed: {0}")]
    TransactionFailed(String),

    #[error("Broadcast rejected: {0}")]
    BroadcastRejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl WalletError {
    /// Whether repeating the same call later could succeed.
    ///
    /// Only transport-level provider failures qualify; validation, funding
    /// and node rejections are terminal.
    pub fn is_retryable(&self) -> bool {
        match self {
            WalletError::Provider(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<chain_utxo::error::UtxoError> for WalletError {
    fn from(e: chain_utxo::error::UtxoError) -> Self {
        use chain_utxo::error::UtxoError;
        match e {
            UtxoError::InvalidPrivateKey(m) => WalletError::InvalidPrivateKey(m),
            UtxoError::InvalidPublicKey(m) => WalletError::InvalidPrivateKey(m),
            UtxoError::InvalidAddress(m) => WalletError::InvalidAddress(m),
            UtxoError::InvalidAmount(m) => WalletError::InvalidAmount(m),
            UtxoError::NoFunds => WalletError::NoFunds,
            UtxoError::InsufficientFunds {
                available,
                required,
                shortfall,
            } => WalletError::InsufficientFunds {
                available: available.to_string(),
                required: required.to_string(),
                shortfall: shortfall.to_string(),
                unit: "sat".into(),
            },
            other => WalletError::TransactionFailed(format!("UTXO: {other}")),
        }
    }
}

impl From<chain_eth::error::EthError> for WalletError {
    fn from(e: chain_eth::error::EthError) -> Self {
        use chain_eth::error::EthError;
        match e {
            EthError::InvalidPrivateKey(m) => WalletError::InvalidPrivateKey(m),
            EthError::InvalidAddress(m) => WalletError::InvalidAddress(m),
            other => WalletError::TransactionFailed(format!("ETH: {other}")),
        }
    }
}

impl From<chain_tron::error::TronError> for WalletError {
    fn from(e: chain_tron::error::TronError) -> Self {
        use chain_tron::error::TronError;
        match e {
            TronError::InvalidPrivateKey(m) => WalletError::InvalidPrivateKey(m),
            TronError::InvalidAddress(m) => WalletError::InvalidAddress(m),
            other => WalletError::TransactionFailed(format!("TRON: {other}")),
        }
    }
}

impl From<chain_sol::error::SolError> for WalletError {
    fn from(e: chain_sol::error::SolError) -> Self {
        use chain_sol::error::SolError;
        match e {
            SolError::InvalidPrivateKey(m) => WalletError::InvalidPrivateKey(m),
            SolError::InvalidAddress(m) => WalletError::InvalidAddress(m),
            other => WalletError::TransactionFailed(format!("SOL: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_utxo::error::UtxoError;

    #[test]
    fn insufficient_funds_keeps_shortfall() {
        let err: WalletError = UtxoError::InsufficientFunds {
            available: 100_000,
            required: 160_000,
            shortfall: 60_000,
        }
        .into();
        let msg = err.to_string();
        assert_eq!(
            msg,
            "Insufficient funds: have 100000 sat, need 160000 sat (short by 60000 sat)"
        );
    }

    #[test]
    fn no_funds_maps_directly() {
        let err: WalletError = UtxoError::NoFunds.into();
        assert!(matches!(err, WalletError::NoFunds));
        assert_eq!(err.to_string(), "No funds available");
    }

    #[test]
    fn unknown_network_lists_alternatives() {
        let err = WalletError::UnknownNetwork {
            key: "dogecoin".into(),
            available: "bitcoin, litecoin".into(),
        };
        assert_eq!(
            err.to_string(),
            "Unknown network: dogecoin. Available networks: bitcoin, litecoin"
        );
    }

    #[test]
    fn only_transport_failures_are_retryable() {
        assert!(WalletError::Provider(ProviderError::Timeout).is_retryable());
        assert!(WalletError::Provider(ProviderError::Status {
            status: 503,
            body: String::new()
        })
        .is_retryable());
        assert!(!WalletError::Provider(ProviderError::Status {
            status: 400,
            body: String::new()
        })
        .is_retryable());
        assert!(!WalletError::NoFunds.is_retryable());
        assert!(!WalletError::BroadcastRejected("dup".into()).is_retryable());
    }

    #[test]
    fn chain_address_errors_stay_address_errors() {
        let err: WalletError = chain_sol::error::SolError::InvalidAddress("x".into()).into();
        assert!(matches!(err, WalletError::InvalidAddress(_)));
        let err: WalletError = chain_tron::error::TronError::InvalidAddress("y".into()).into();
        assert!(matches!(err, WalletError::InvalidAddress(_)));
    }
}
