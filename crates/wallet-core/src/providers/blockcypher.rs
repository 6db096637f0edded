//! BlockCypher REST API (`https://api.blockcypher.com/v1/{coin}/{chain}`).

use std::collections::HashSet;

use async_trait::async_trait;
use chain_utxo::utxo::UnspentOutput;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::indexer::{AddressBalance, IndexedTransaction, UtxoIndexer};
use super::{check_status, join_url, ProviderError};

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    balance: u64,
    #[serde(default)]
    unconfirmed_balance: i64,
}

/// Largest page BlockCypher serves; the default is 50.
const PAGE_LIMIT: u32 = 2000;
const MAX_PAGES: usize = 10;

#[derive(Debug, Deserialize)]
struct AddressResponse {
    /// Confirmed outputs only; `unconfirmed_txrefs` is ignored.
    #[serde(default)]
    txrefs: Vec<TxRef>,
    #[serde(default, rename = "hasMore")]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct TxRef {
    tx_hash: String,
    tx_output_n: u32,
    value: u64,
    #[serde(default)]
    block_height: i64,
}

#[derive(Debug, Deserialize)]
struct TxResponse {
    hash: String,
    #[serde(default)]
    block_height: i64,
    #[serde(default)]
    confirmations: u64,
    fees: Option<u64>,
    hex: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PushResponse {
    tx: PushedTx,
}

#[derive(Debug, Deserialize)]
struct PushedTx {
    hash: String,
}

impl AddressResponse {
    #[cfg(test)]
    fn into_unspent(self) -> Vec<UnspentOutput> {
        let mut out = Vec::new();
        self.absorb(&mut HashSet::new(), &mut out);
        out
    }

    /// Append unseen refs to `out` and return the `before` cursor of the
    /// next page, if the server has one.
    ///
    /// The cursor repeats the lowest block height of this page, since refs
    /// of one block may straddle pages; repeats are dropped through `seen`.
    fn absorb(
        self,
        seen: &mut HashSet<(String, u32)>,
        out: &mut Vec<UnspentOutput>,
    ) -> Option<(i64, usize)> {
        let lowest = self.txrefs.iter().map(|r| r.block_height).min();
        let before = out.len();
        for r in self.txrefs {
            if seen.insert((r.tx_hash.clone(), r.tx_output_n)) {
                out.push(UnspentOutput {
                    transaction_id: r.tx_hash,
                    output_index: r.tx_output_n,
                    value_satoshis: r.value,
                });
            }
        }
        let added = out.len() - before;
        match (self.has_more, lowest) {
            (true, Some(height)) => Some((height + 1, added)),
            _ => None,
        }
    }
}

impl From<TxResponse> for IndexedTransaction {
    fn from(tx: TxResponse) -> Self {
        // Unconfirmed transactions report block_height -1.
        let block_height = u64::try_from(tx.block_height).ok();
        Self {
            txid: tx.hash,
            confirmed: tx.confirmations > 0,
            block_height,
            confirmations: tx.confirmations,
            fee: tx.fees,
        }
    }
}

pub struct BlockCypherIndexer {
    client: reqwest::Client,
    base_url: String,
}

impl BlockCypherIndexer {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ProviderError> {
        let url = join_url(&self.base_url, path);
        debug!(%url, "blockcypher GET");
        let resp = self.client.get(&url).send().await?;
        Ok(check_status(resp).await?.json().await?)
    }
}

#[async_trait]
impl UtxoIndexer for BlockCypherIndexer {
    fn name(&self) -> &str {
        "blockcypher"
    }

    async fn balance(&self, address: &str) -> Result<AddressBalance, ProviderError> {
        let data: BalanceResponse = self.get(&format!("addrs/{address}/balance")).await?;
        Ok(AddressBalance {
            confirmed: data.balance,
            unconfirmed: data.unconfirmed_balance,
        })
    }

    async fn unspent_outputs(&self, address: &str) -> Result<Vec<UnspentOutput>, ProviderError> {
        let mut seen = HashSet::new();
        let mut utxos = Vec::new();
        let mut cursor: Option<i64> = None;

        for _ in 0..MAX_PAGES {
            let mut path = format!("addrs/{address}?unspentOnly=true&limit={PAGE_LIMIT}");
            if let Some(before) = cursor {
                path.push_str(&format!("&before={before}"));
            }
            let page: AddressResponse = self.get(&path).await?;
            match page.absorb(&mut seen, &mut utxos) {
                None => return Ok(utxos),
                Some((_, 0)) => break,
                Some((next, _)) => {
                    debug!(address, collected = utxos.len(), before = next, "blockcypher has more txrefs");
                    cursor = Some(next);
                }
            }
        }

        // Spending from a truncated list would under-report the balance.
        Err(ProviderError::InvalidResponse(format!(
            "could not page through all unspent outputs of {address}"
        )))
    }

    async fn raw_transaction(&self, txid: &str) -> Result<String, ProviderError> {
        let data: TxResponse = self.get(&format!("txs/{txid}?includeHex=true")).await?;
        data.hex
            .ok_or_else(|| ProviderError::InvalidResponse(format!("no hex returned for {txid}")))
    }

    async fn broadcast(&self, tx_hex: &str) -> Result<String, ProviderError> {
        let url = join_url(&self.base_url, "txs/push");
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "tx": tx_hex }))
            .send()
            .await?;
        let data: PushResponse = check_status(resp).await?.json().await?;
        Ok(data.tx.hash)
    }

    async fn transaction_status(&self, txid: &str) -> Result<IndexedTransaction, ProviderError> {
        let data: TxResponse = self.get(&format!("txs/{txid}")).await?;
        Ok(data.into())
    }
}
