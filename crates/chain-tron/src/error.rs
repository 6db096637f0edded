use thiserror::Error;

/// Tron chain operation errors.
#[derive(Debug, Error)]
pub enum TronError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("transaction id mismatch: node returned {returned}, raw data hashes to {computed}")]
    TxIdMismatch { returned: String, computed: String },

    #[error("node-built transaction does not match the request: {0}")]
    ContractMismatch(String),

    #[error("signing error: {0}")]
    SigningError(String),

    #[error("encoding error: {0}")]
    EncodingError(String),
}

impl From<chain_eth::error::EthError> for TronError {
    fn from(e: chain_eth::error::EthError) -> Self {
        TronError::EncodingError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_address() {
        let err = TronError::InvalidAddress("bad prefix".into());
        assert_eq!(err.to_string(), "invalid address: bad prefix");
    }

    #[test]
    fn display_txid_mismatch() {
        let err = TronError::TxIdMismatch {
            returned: "aa".into(),
            computed: "bb".into(),
        };
        assert_eq!(
            err.to_string(),
            "transaction id mismatch: node returned aa, raw data hashes to bb"
        );
    }

    #[test]
    fn eth_errors_convert() {
        let err: TronError = chain_eth::error::EthError::DecodingError("short".into()).into();
        assert!(matches!(err, TronError::EncodingError(_)));
    }
}
