use async_trait::async_trait;
use chain_utxo::utxo::UnspentOutput;
use serde::Serialize;
use tracing::warn;

use super::ProviderError;

/// Balance of one address as reported by an indexer, in satoshis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressBalance {
    pub confirmed: u64,
    /// Net mempool delta; negative while a spend is unconfirmed.
    pub unconfirmed: i64,
}

/// Confirmation state of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedTransaction {
    pub txid: String,
    pub confirmed: bool,
    pub block_height: Option<u64>,
    pub confirmations: u64,
    pub fee: Option<u64>,
}

/// Read and broadcast access to a UTXO chain.
#[async_trait]
pub trait UtxoIndexer: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    async fn balance(&self, address: &str) -> Result<AddressBalance, ProviderError>;

    async fn unspent_outputs(&self, address: &str) -> Result<Vec<UnspentOutput>, ProviderError>;

    /// Full serialized transaction as hex.
    async fn raw_transaction(&self, txid: &str) -> Result<String, ProviderError>;

    /// Submit a signed transaction; returns its txid.
    async fn broadcast(&self, tx_hex: &str) -> Result<String, ProviderError>;

    async fn transaction_status(&self, txid: &str) -> Result<IndexedTransaction, ProviderError>;
}

/// Sends every call to `primary` and, when it fails, once more to
/// `secondary`.
///
/// When both fail the secondary's error is returned.
pub struct FallbackIndexer {
    primary: Box<dyn UtxoIndexer>,
    secondary: Option<Box<dyn UtxoIndexer>>,
}

impl FallbackIndexer {
    pub fn new(primary: Box<dyn UtxoIndexer>, secondary: Option<Box<dyn UtxoIndexer>>) -> Self {
        Self { primary, secondary }
    }

    fn fallback(&self, op: &str, err: &ProviderError) -> Option<&dyn UtxoIndexer> {
        let secondary = self.secondary.as_deref()?;
        warn!(
            primary = self.primary.name(),
            secondary = secondary.name(),
            "{op} failed on primary indexer, falling back: {err}"
        );
        Some(secondary)
    }
}

#[async_trait]
impl UtxoIndexer for FallbackIndexer {
    fn name(&self) -> &str {
        self.primary.name()
    }

    async fn balance(&self, address: &str) -> Result<AddressBalance, ProviderError> {
        match self.primary.balance(address).await {
            Ok(v) => Ok(v),
            Err(e) => match self.fallback("balance", &e) {
                Some(secondary) => secondary.balance(address).await,
                None => Err(e),
            },
        }
    }

    async fn unspent_outputs(&self, address: &str) -> Result<Vec<UnspentOutput>, ProviderError> {
        match self.primary.unspent_outputs(address).await {
            Ok(v) => Ok(v),
            Err(e) => match self.fallback("unspent_outputs", &e) {
                Some(secondary) => secondary.unspent_outputs(address).await,
                None => Err(e),
            },
        }
    }

    async fn raw_transaction(&self, txid: &str) -> Result<String, ProviderError> {
        match self.primary.raw_transaction(txid).await {
            Ok(v) => Ok(v),
            Err(e) => match self.fallback("raw_transaction", &e) {
                Some(secondary) => secondary.raw_transaction(txid).await,
                None => Err(e),
            },
        }
    }

    async fn broadcast(&self, tx_hex: &str) -> Result<String, ProviderError> {
        match self.primary.broadcast(tx_hex).await {
            Ok(v) => Ok(v),
            Err(e) => match self.fallback("broadcast", &e) {
                Some(secondary) => secondary.broadcast(tx_hex).await,
                None => Err(e),
            },
        }
    }

    async fn transaction_status(&self, txid: &str) -> Result<IndexedTransaction, ProviderError> {
        match self.primary.transaction_status(txid).await {
            Ok(v) => Ok(v),
            Err(e) => match self.fallback("transaction_status", &e) {
                Some(secondary) => secondary.transaction_status(txid).await,
                None => Err(e),
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory indexer for tests.

    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    pub struct FakeIndexer {
        pub label: String,
        pub fail_status: Option<u16>,
        pub balance: AddressBalance,
        pub utxos: Vec<UnspentOutput>,
        pub raw: HashMap<String, String>,
        pub broadcast_txid: String,
        pub broadcasts: Arc<Mutex<Vec<String>>>,
        pub calls: Arc<AtomicUsize>,
    }

    impl FakeIndexer {
        pub fn failing(label: &str, status: u16) -> Self {
            Self {
                label: label.into(),
                fail_status: Some(status),
                ..Default::default()
            }
        }

        fn enter(&self) -> Result<(), ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_status {
                Some(status) => Err(ProviderError::Status {
                    status,
                    body: format!("{} unavailable", self.label),
                }),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl UtxoIndexer for FakeIndexer {
        fn name(&self) -> &str {
            &self.label
        }

        async fn balance(&self, _address: &str) -> Result<AddressBalance, ProviderError> {
            self.enter()?;
            Ok(self.balance)
        }

        async fn unspent_outputs(&self, _address: &str) -> Result<Vec<UnspentOutput>, ProviderError> {
            self.enter()?;
            Ok(self.utxos.clone())
        }

        async fn raw_transaction(&self, txid: &str) -> Result<String, ProviderError> {
            self.enter()?;
            self.raw.get(txid).cloned().ok_or(ProviderError::Status {
                status: 404,
                body: "Transaction not found".into(),
            })
        }

        async fn broadcast(&self, tx_hex: &str) -> Result<String, ProviderError> {
            self.enter()?;
            if let Ok(mut sent) = self.broadcasts.lock() {
                sent.push(tx_hex.to_string());
            }
            Ok(self.broadcast_txid.clone())
        }

        async fn transaction_status(&self, txid: &str) -> Result<IndexedTransaction, ProviderError> {
            self.enter()?;
            Ok(IndexedTransaction {
                txid: txid.into(),
                ..Default::default()
            })
        }
    }
}
