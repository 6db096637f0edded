//! Bitcoin and Litecoin testnet wallets (legacy P2PKH).

use async_trait::async_trait;
use chain_utxo::address::{address_for_key, p2pkh_address, p2pkh_script, script_for_address};
use chain_utxo::keys::{
    compressed_public_key, decode_wif, encode_wif, generate_secret_key, secret_from_bytes,
};
use chain_utxo::transaction::{
    assemble_psbt, extract_transaction, parse_transaction_hex, sign_p2pkh, to_hex,
};
use chain_utxo::utxo::select_coins;
use tracing::{debug, info};

use super::{ensure_key_matches, ensure_positive, ChainHandler};
use crate::config::{HttpConfig, IndexerConfig, IndexerKind, UtxoNetworkConfig};
use crate::error::WalletError;
use crate::hd_derivation::derive_secp256k1_key;
use crate::mnemonic::{mnemonic_to_seed, phrase_or_generate};
use crate::providers::blockcypher::BlockCypherIndexer;
use crate::providers::esplora::EsploraIndexer;
use crate::providers::http_client;
use crate::providers::indexer::{FallbackIndexer, UtxoIndexer};
use crate::types::{
    Balance, FaucetInfo, SendReceipt, SendRequest, TransactionStatus, TxState, UtxoList,
    WalletKeys,
};
use crate::units::{format_units_i64, format_units_u64, parse_units_u64};

pub struct UtxoWallet {
    config: UtxoNetworkConfig,
    indexer: Box<dyn UtxoIndexer>,
}

impl UtxoWallet {
    /// Wallet backed by the configured primary indexer, falling back to the
    /// secondary when one is set.
    pub fn new(config: &UtxoNetworkConfig, http: &HttpConfig) -> Result<Self, WalletError> {
        let client = http_client(http)?;
        let primary = build_indexer(&config.primary, client.clone());
        let secondary = config
            .secondary
            .as_ref()
            .map(|c| build_indexer(c, client.clone()));
        Ok(Self::with_indexer(
            config.clone(),
            Box::new(FallbackIndexer::new(primary, secondary)),
        ))
    }

    pub fn with_indexer(config: UtxoNetworkConfig, indexer: Box<dyn UtxoIndexer>) -> Self {
        Self { config, indexer }
    }

    fn decimals(&self) -> u8 {
        self.config.params.decimals
    }

    fn explorer_tx_url(&self, txid: &str) -> String {
        format!("{}/tx/{txid}", self.config.explorer_url.trim_end_matches('/'))
    }

    fn ensure_address(&self, address: &str) -> Result<(), WalletError> {
        if self.validate_address(address) {
            Ok(())
        } else {
            Err(WalletError::InvalidAddress(format!(
                "{address} is not a valid {} address",
                self.config.params.name
            )))
        }
    }

    fn keys_for(&self, secret: &bitcoin::secp256k1::SecretKey) -> WalletKeys {
        let pubkey = compressed_public_key(secret);
        WalletKeys {
            address: p2pkh_address(&pubkey, &self.config.params),
            private_key: encode_wif(secret, &self.config.params),
            public_key: Some(hex::encode(pubkey)),
            address_type: Some("p2pkh".into()),
            network: self.config.params.name.clone(),
            ..Default::default()
        }
    }
}

fn build_indexer(config: &IndexerConfig, client: reqwest::Client) -> Box<dyn UtxoIndexer> {
    match config.kind {
        IndexerKind::Blockcypher => Box::new(BlockCypherIndexer::new(client, config.url.clone())),
        IndexerKind::Esplora => Box::new(EsploraIndexer::new(client, config.url.clone())),
    }
}

#[async_trait]
impl ChainHandler for UtxoWallet {
    fn network_name(&self) -> &str {
        &self.config.params.name
    }

    fn generate_wallet(&self) -> Result<WalletKeys, WalletError> {
        let secret = generate_secret_key();
        Ok(self.keys_for(&secret))
    }

    fn wallet_from_mnemonic(&self, phrase: Option<&str>) -> Result<WalletKeys, WalletError> {
        let phrase = phrase_or_generate(phrase)?;
        let seed = mnemonic_to_seed(&phrase, "")?;
        let path = self.config.params.derivation_path();
        let derived = derive_secp256k1_key(seed.as_slice(), &path)?;
        let secret = secret_from_bytes(&derived.private_key)?;

        Ok(WalletKeys {
            mnemonic: Some(phrase.to_string()),
            derivation_path: Some(path),
            ..self.keys_for(&secret)
        })
    }

    fn import_private_key(&self, private_key: &str) -> Result<WalletKeys, WalletError> {
        let secret = decode_wif(private_key, &self.config.params)?;
        Ok(self.keys_for(&secret))
    }

    fn validate_address(&self, address: &str) -> bool {
        chain_utxo::address::validate_address(address, &self.config.params)
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, WalletError> {
        self.ensure_address(address)?;
        let balance = self.indexer.balance(address).await?;

        Ok(Balance {
            address: address.to_string(),
            balance: format_units_u64(balance.confirmed, self.decimals()),
            balance_base_units: balance.confirmed.to_string(),
            unconfirmed: Some(format_units_i64(balance.unconfirmed, self.decimals())),
            symbol: self.config.params.symbol.clone(),
            network: self.config.params.name.clone(),
        })
    }

    async fn send_native(&self, request: &SendRequest) -> Result<SendReceipt, WalletError> {
        let network = &self.config.params;
        let target = parse_units_u64(&request.amount, network.decimals)?;
        ensure_positive(&request.amount, target == 0)?;

        let secret = decode_wif(&request.private_key, network)?;
        ensure_key_matches(&address_for_key(&secret, network), &request.from)?;
        let recipient = script_for_address(request.to.trim(), network)?;

        info!(
            network = %network.name,
            from = %request.from,
            to = %request.to,
            amount_sat = target,
            "sending"
        );

        let utxos = self.indexer.unspent_outputs(&request.from).await?;
        let plan = select_coins(&utxos, target, &self.config.fee_policy)?;
        debug!(
            inputs = plan.inputs_used(),
            total = plan.total_input_value,
            fee = plan.fee_estimate,
            change = plan.change_value,
            "coin selection"
        );

        // Every input needs its full parent for the legacy sighash; one
        // missing parent aborts the send.
        let mut parents = Vec::with_capacity(plan.inputs_used());
        for input in &plan.selected_inputs {
            let raw = self.indexer.raw_transaction(&input.transaction_id).await?;
            parents.push(parse_transaction_hex(&raw)?);
        }

        let change = p2pkh_script(&compressed_public_key(&secret));
        let mut psbt = assemble_psbt(&plan, parents, recipient, change)?;
        sign_p2pkh(&mut psbt, &secret)?;
        let tx = extract_transaction(psbt)?;

        let txid = self.indexer.broadcast(&to_hex(&tx)).await?;
        info!(network = %network.name, %txid, fee = plan.fee_paid(), "broadcast accepted");

        Ok(SendReceipt {
            explorer_url: self.explorer_tx_url(&txid),
            tx_hash: txid,
            from: request.from.clone(),
            to: request.to.clone(),
            amount: format_units_u64(target, network.decimals),
            fee: Some(format_units_u64(plan.fee_paid(), network.decimals)),
            network: network.name.clone(),
            inputs_used: Some(plan.inputs_used()),
            change: plan
                .change_output()
                .map(|v| format_units_u64(v, network.decimals)),
            token: None,
        })
    }

    async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, WalletError> {
        let tx = self
            .indexer
            .transaction_status(tx_hash)
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    WalletError::NotFound(tx_hash.to_string())
                } else {
                    e.into()
                }
            })?;

        let state = if tx.confirmed {
            TxState::Confirmed
        } else {
            TxState::Pending
        };
        let mut status = TransactionStatus::new(
            tx_hash,
            state,
            self.explorer_tx_url(tx_hash),
            &self.config.params.name,
        );
        status.block_height = tx.block_height;
        status.confirmations = Some(tx.confirmations);
        status.fee = tx.fee.map(|f| format_units_u64(f, self.decimals()));
        Ok(status)
    }

    fn faucet_info(&self) -> FaucetInfo {
        FaucetInfo {
            network: self.config.params.name.clone(),
            symbol: self.config.params.symbol.clone(),
            faucets: self.config.faucets.clone(),
        }
    }

    async fn unspent_outputs(&self, address: &str) -> Result<UtxoList, WalletError> {
        self.ensure_address(address)?;
        let utxos = self.indexer.unspent_outputs(address).await?;
        let total = utxos
            .iter()
            .fold(0u64, |acc, u| acc.saturating_add(u.value_satoshis));

        Ok(UtxoList {
            address: address.to_string(),
            count: utxos.len(),
            total: format_units_u64(total, self.decimals()),
            utxos,
        })
    }
}
