//! Esplora-compatible REST API (Blockstream, mempool.space, litecoinspace).

use async_trait::async_trait;
use chain_utxo::utxo::UnspentOutput;
use serde::Deserialize;
use tracing::debug;

use super::indexer::{AddressBalance, IndexedTransaction, UtxoIndexer};
use super::{check_status, join_url, ProviderError};

#[derive(Debug, Deserialize)]
struct AddressStats {
    chain_stats: TxoStats,
    mempool_stats: TxoStats,
}

#[derive(Debug, Deserialize)]
struct TxoStats {
    funded_txo_sum: u64,
    spent_txo_sum: u64,
}

impl TxoStats {
    fn net(&self) -> i64 {
        self.funded_txo_sum as i64 - self.spent_txo_sum as i64
    }
}

impl From<AddressStats> for AddressBalance {
    fn from(stats: AddressStats) -> Self {
        Self {
            confirmed: stats
                .chain_stats
                .funded_txo_sum
                .saturating_sub(stats.chain_stats.spent_txo_sum),
            unconfirmed: stats.mempool_stats.net(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EsploraUtxo {
    txid: String,
    vout: u32,
    value: u64,
}

impl From<EsploraUtxo> for UnspentOutput {
    fn from(u: EsploraUtxo) -> Self {
        Self {
            transaction_id: u.txid,
            output_index: u.vout,
            value_satoshis: u.value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct EsploraTx {
    txid: String,
    status: EsploraTxStatus,
    fee: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct EsploraTxStatus {
    confirmed: bool,
    block_height: Option<u64>,
}

fn to_indexed(tx: EsploraTx, tip_height: Option<u64>) -> IndexedTransaction {
    let confirmations = match (tx.status.block_height, tip_height) {
        (Some(height), Some(tip)) if tx.status.confirmed => tip.saturating_sub(height) + 1,
        _ => 0,
    };
    IndexedTransaction {
        txid: tx.txid,
        confirmed: tx.status.confirmed,
        block_height: tx.status.block_height,
        confirmations,
        fee: tx.fee,
    }
}

pub struct EsploraIndexer {
    client: reqwest::Client,
    base_url: String,
}

impl EsploraIndexer {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn get(&self, path: &str) -> Result<reqwest::Response, ProviderError> {
        let url = join_url(&self.base_url, path);
        debug!(%url, "esplora GET");
        let resp = self.client.get(&url).send().await?;
        check_status(resp).await
    }

    async fn tip_height(&self) -> Result<u64, ProviderError> {
        let text = self.get("blocks/tip/height").await?.text().await?;
        text.trim()
            .parse()
            .map_err(|e| ProviderError::InvalidResponse(format!("tip height {text:?}: {e}")))
    }
}

#[async_trait]
impl UtxoIndexer for EsploraIndexer {
    fn name(&self) -> &str {
        "esplora"
    }

    async fn balance(&self, address: &str) -> Result<AddressBalance, ProviderError> {
        match self.get(&format!("address/{address}")).await {
            Ok(resp) => Ok(resp.json::<AddressStats>().await?.into()),
            // Esplora answers 404 for addresses it has never seen.
            Err(e) if e.is_not_found() => Ok(AddressBalance::default()),
            Err(e) => Err(e),
        }
    }

    async fn unspent_outputs(&self, address: &str) -> Result<Vec<UnspentOutput>, ProviderError> {
        let utxos: Vec<EsploraUtxo> = self
            .get(&format!("address/{address}/utxo"))
            .await?
            .json()
            .await?;
        Ok(utxos.into_iter().map(UnspentOutput::from).collect())
    }

    async fn raw_transaction(&self, txid: &str) -> Result<String, ProviderError> {
        let text = self.get(&format!("tx/{txid}/hex")).await?.text().await?;
        Ok(text.trim().to_string())
    }

    async fn broadcast(&self, tx_hex: &str) -> Result<String, ProviderError> {
        let url = join_url(&self.base_url, "tx");
        let resp = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain")
            .body(tx_hex.to_string())
            .send()
            .await?;
        let txid = check_status(resp).await?.text().await?;
        Ok(txid.trim().to_string())
    }

    async fn transaction_status(&self, txid: &str) -> Result<IndexedTransaction, ProviderError> {
        let tx: EsploraTx = self.get(&format!("tx/{txid}")).await?.json().await?;
        let tip = if tx.status.confirmed {
            Some(self.tip_height().await?)
        } else {
            None
        };
        Ok(to_indexed(tx, tip))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_normalise_to_balance() {
        let body = r#"{
            "address": "tb1q...",
            "chain_stats": {"funded_txo_count": 3, "funded_txo_sum": 160000, "spent_txo_count": 1, "spent_txo_sum": 10000, "tx_count": 4},
            "mempool_stats": {"funded_txo_count": 0, "funded_txo_sum": 0, "spent_txo_count": 1, "spent_txo_sum": 50000, "tx_count": 1}
        }"#;
        let stats: AddressStats = serde_json::from_str(body).unwrap();
        let balance = AddressBalance::from(stats);
        assert_eq!(balance.confirmed, 150_000);
        assert_eq!(balance.unconfirmed, -50_000);
    }

    #[test]
    fn utxo_list_normalises() {
        let body = r#"[
            {"txid": "aa", "vout": 0, "status": {"confirmed": true, "block_height": 10}, "value": 100000},
            {"txid": "bb", "vout": 3, "status": {"confirmed": false}, "value": 546}
        ]"#;
        let utxos: Vec<EsploraUtxo> = serde_json::from_str(body).unwrap();
        let normalised: Vec<UnspentOutput> = utxos.into_iter().map(Into::into).collect();
        assert_eq!(
            normalised[1],
            UnspentOutput {
                transaction_id: "bb".into(),
                output_index: 3,
                value_satoshis: 546,
            }
        );
    }

    #[test]
    fn confirmations_count_from_tip() {
        let tx: EsploraTx = serde_json::from_str(
            r#"{"txid": "cc", "status": {"confirmed": true, "block_height": 100}, "fee": 4000}"#,
        )
        .unwrap();
        let status = to_indexed(tx, Some(105));
        assert!(status.confirmed);
        assert_eq!(status.confirmations, 6);
        assert_eq!(status.fee, Some(4000));
    }

    #[test]
    fn mempool_tx_has_zero_confirmations() {
        let tx: EsploraTx =
            serde_json::from_str(r#"{"txid": "dd", "status": {"confirmed": false}}"#).unwrap();
        let status = to_indexed(tx, None);
        assert!(!status.confirmed);
        assert_eq!(status.block_height, None);
        assert_eq!(status.confirmations, 0);
    }
}
