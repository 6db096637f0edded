//! Tron (Shasta) wallets over the TronGrid HTTP API.

use alloy_primitives::U256;
use async_trait::async_trait;
use chain_eth::address::parse_private_key;
use chain_tron::address::{address_from_private_key, to_hex_address};
use chain_tron::transaction::{sign_txid, verify_contract, verify_txid, ExpectedContract};
use chain_tron::trc20;
use k256::ecdsa::SigningKey;
use serde_json::{json, Value};
use tracing::{info, warn};
use zeroize::Zeroizing;

use super::{ensure_key_matches, ensure_positive, ChainHandler};
use crate::config::{HttpConfig, TronNetworkConfig};
use crate::error::WalletError;
use crate::hd_derivation::{derive_secp256k1_key, TRON_PATH};
use crate::mnemonic::{mnemonic_to_seed, phrase_or_generate};
use crate::providers::trongrid::TronGridClient;
use crate::providers::{http_client, ProviderError};
use crate::types::{
    Balance, FaucetInfo, SendReceipt, SendRequest, TokenBalance, TokenInfo, TokenSendRequest,
    TransactionStatus, TxState, WalletKeys,
};
use crate::units::{format_units, format_units_u64, parse_units, parse_units_u64};

/// Bandwidth reserve required on top of a TRX transfer (0.3 TRX).
const NATIVE_FEE_RESERVE_SUN: u64 = 300_000;
/// Minimum TRX balance for a TRC-20 transfer to cover energy (10 TRX).
const TOKEN_FEE_RESERVE_SUN: u64 = 10_000_000;
const DEFAULT_TOKEN_DECIMALS: u8 = 18;

pub struct TronWallet {
    config: TronNetworkConfig,
    api: TronGridClient,
}

impl TronWallet {
    pub fn new(config: &TronNetworkConfig, http: &HttpConfig) -> Result<Self, WalletError> {
        let client = http_client(http)?;
        Ok(Self {
            api: TronGridClient::new(client, config.api_url.clone(), config.api_key.clone()),
            config: config.clone(),
        })
    }

    fn explorer_tx_url(&self, txid: &str) -> String {
        format!(
            "{}/transaction/{txid}",
            self.config.explorer_url.trim_end_matches('/')
        )
    }

    fn keys_for(&self, private_key: &[u8; 32]) -> Result<WalletKeys, WalletError> {
        let signing_key = SigningKey::from_bytes(private_key.into())
            .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;
        let public_key = signing_key.verifying_key().to_encoded_point(false);

        Ok(WalletKeys {
            address: address_from_private_key(private_key)?,
            private_key: hex::encode(private_key),
            public_key: Some(hex::encode(public_key.as_bytes())),
            network: self.config.name.clone(),
            ..Default::default()
        })
    }

    fn signing_key_for(&self, private_key: &str, from: &str) -> Result<Zeroizing<[u8; 32]>, WalletError> {
        let key = Zeroizing::new(parse_private_key(private_key)?);
        ensure_key_matches(&address_from_private_key(&key)?, from)?;
        Ok(key)
    }

    async fn balance_sun(&self, address: &str) -> Result<u64, WalletError> {
        let account = self.api.get_account(&to_hex_address(address)?).await?;
        Ok(account.balance)
    }

    /// Read-only contract call; returns the first `constant_result` word.
    async fn constant_call(
        &self,
        owner: &str,
        contract: &str,
        selector: &str,
        parameter: &str,
    ) -> Result<String, WalletError> {
        let resp = self
            .api
            .trigger_constant_contract(
                &to_hex_address(owner)?,
                &to_hex_address(contract)?,
                selector,
                parameter,
            )
            .await?;
        if !resp.result.result {
            return Err(ProviderError::InvalidResponse(format!(
                "{selector} failed: {}",
                resp.result.message.unwrap_or_default()
            ))
            .into());
        }
        resp.constant_result
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::InvalidResponse(format!("{selector} returned no data")).into())
    }

    async fn token_units_of(&self, owner: &str, contract: &str) -> Result<U256, WalletError> {
        let parameter = trc20::balance_of_parameter(owner)?;
        let result = self
            .constant_call(owner, contract, trc20::BALANCE_OF_SIGNATURE, &parameter)
            .await?;
        Ok(trc20::decode_uint_result(&result)?)
    }

    async fn token_decimals(&self, owner: &str, contract: &str) -> Result<u8, WalletError> {
        let result = self
            .constant_call(owner, contract, trc20::DECIMALS_SIGNATURE, "")
            .await?;
        let decimals = trc20::decode_uint_result(&result)?;
        u8::try_from(decimals).map_err(|_| {
            ProviderError::InvalidResponse(format!("decimals() returned {decimals}")).into()
        })
    }

    async fn token_symbol(&self, owner: &str, contract: &str) -> Option<String> {
        let result = self
            .constant_call(owner, contract, trc20::SYMBOL_SIGNATURE, "")
            .await
            .ok()?;
        trc20::decode_string_result(&result).ok()
    }

    async fn token_string(&self, contract: &str, signature: &str) -> Option<String> {
        let result = self.constant_call(contract, contract, signature, "").await.ok()?;
        trc20::decode_string_result(&result).ok()
    }

    /// Assemble token metadata from raw `constant_result` words. Tokens that
    /// do not answer `decimals()` are assumed to use 18.
    fn token_info_from(
        &self,
        token: &str,
        name: Option<String>,
        symbol: Option<String>,
        decimals_hex: Option<&str>,
        total_supply_hex: Option<&str>,
    ) -> TokenInfo {
        let decimals = decimals_hex
            .and_then(|hex| trc20::decode_uint_result(hex).ok())
            .and_then(|d| u8::try_from(d).ok())
            .unwrap_or_else(|| {
                warn!(token, "decimals() unavailable, assuming 18");
                DEFAULT_TOKEN_DECIMALS
            });
        let total_supply = total_supply_hex
            .and_then(|hex| trc20::decode_uint_result(hex).ok())
            .map(|supply| format_units(supply, decimals));

        TokenInfo {
            token_address: token.to_string(),
            name,
            symbol,
            decimals,
            total_supply,
            network: self.config.name.clone(),
            ..Default::default()
        }
    }

    /// Check the node-built transaction against the request, sign its id
    /// and broadcast.
    async fn sign_and_broadcast(
        &self,
        mut tx: Value,
        expected: ExpectedContract<'_>,
        private_key: &[u8; 32],
    ) -> Result<String, WalletError> {
        let raw_data_hex = tx
            .get("raw_data_hex")
            .and_then(Value::as_str)
            .ok_or_else(|| WalletError::TransactionFailed("node returned no raw_data_hex".into()))?;
        let tx_id = tx
            .get("txID")
            .and_then(Value::as_str)
            .ok_or_else(|| WalletError::TransactionFailed("node returned no txID".into()))?
            .to_string();

        verify_contract(raw_data_hex, &expected)?;
        let digest = verify_txid(raw_data_hex, &tx_id)?;
        let signature = sign_txid(&digest, private_key)?;
        tx["signature"] = json!([signature]);

        let resp = self.api.broadcast_transaction(&tx).await?;
        if !resp.result {
            return Err(WalletError::BroadcastRejected(resp.error_message()));
        }
        Ok(resp.txid.unwrap_or(tx_id))
    }

    fn insufficient_trx(&self, available: u64, required: u64) -> WalletError {
        WalletError::InsufficientFunds {
            available: format_units_u64(available, self.config.decimals),
            required: format_units_u64(required, self.config.decimals),
            shortfall: format_units_u64(required.saturating_sub(available), self.config.decimals),
            unit: self.config.symbol.clone(),
        }
    }
}

#[async_trait]
impl ChainHandler for TronWallet {
    fn network_name(&self) -> &str {
        &self.config.name
    }

    fn generate_wallet(&self) -> Result<WalletKeys, WalletError> {
        let signing_key = SigningKey::random(&mut rand::rngs::OsRng);
        let mut private_key = Zeroizing::new([0u8; 32]);
        private_key.copy_from_slice(&signing_key.to_bytes());
        self.keys_for(&private_key)
    }

    fn wallet_from_mnemonic(&self, phrase: Option<&str>) -> Result<WalletKeys, WalletError> {
        let phrase = phrase_or_generate(phrase)?;
        let seed = mnemonic_to_seed(&phrase, "")?;
        let derived = derive_secp256k1_key(seed.as_slice(), TRON_PATH)?;

        Ok(WalletKeys {
            mnemonic: Some(phrase.to_string()),
            derivation_path: Some(derived.derivation_path.clone()),
            ..self.keys_for(&derived.private_key)?
        })
    }

    fn import_private_key(&self, private_key: &str) -> Result<WalletKeys, WalletError> {
        let key = Zeroizing::new(parse_private_key(private_key)?);
        self.keys_for(&key)
    }

    fn validate_address(&self, address: &str) -> bool {
        chain_tron::address::validate_address(address)
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, WalletError> {
        let sun = self.balance_sun(address).await?;
        Ok(Balance {
            address: address.to_string(),
            balance: format_units_u64(sun, self.config.decimals),
            balance_base_units: sun.to_string(),
            unconfirmed: None,
            symbol: self.config.symbol.clone(),
            network: self.config.name.clone(),
        })
    }

    async fn send_native(&self, request: &SendRequest) -> Result<SendReceipt, WalletError> {
        let amount = parse_units_u64(&request.amount, self.config.decimals)?;
        ensure_positive(&request.amount, amount == 0)?;
        let key = self.signing_key_for(&request.private_key, &request.from)?;
        let to_hex = to_hex_address(&request.to)?;
        let from_hex = to_hex_address(&request.from)?;

        let balance = self.balance_sun(&request.from).await?;
        let required = amount.saturating_add(NATIVE_FEE_RESERVE_SUN);
        if balance < required {
            return Err(self.insufficient_trx(balance, required));
        }

        info!(network = %self.config.name, from = %request.from, to = %request.to, amount_sun = amount, "sending");

        let tx = self.api.create_transaction(&from_hex, &to_hex, amount).await?;
        let expected = ExpectedContract::Transfer {
            owner: &request.from,
            to: &request.to,
            amount,
        };
        let txid = self.sign_and_broadcast(tx, expected, &key).await?;
        info!(network = %self.config.name, %txid, "broadcast accepted");

        Ok(SendReceipt {
            explorer_url: self.explorer_tx_url(&txid),
            tx_hash: txid,
            from: request.from.clone(),
            to: request.to.clone(),
            amount: format_units_u64(amount, self.config.decimals),
            network: self.config.name.clone(),
            ..Default::default()
        })
    }

    async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, WalletError> {
        if self.api.get_transaction_by_id(tx_hash).await?.is_none() {
            return Err(WalletError::NotFound(tx_hash.to_string()));
        }
        let info = self.api.get_transaction_info_by_id(tx_hash).await?;

        let receipt_failed = info
            .receipt
            .as_ref()
            .and_then(|r| r.result.as_deref())
            .is_some_and(|r| r != "SUCCESS");
        let state = if info.block_number.is_none() {
            TxState::Pending
        } else if info.result.as_deref() == Some("FAILED") || receipt_failed {
            TxState::Failed
        } else {
            TxState::Success
        };

        let mut status = TransactionStatus::new(
            tx_hash,
            state,
            self.explorer_tx_url(tx_hash),
            &self.config.name,
        );
        status.block_height = info.block_number;
        status.fee = info.fee.map(|f| format_units_u64(f, self.config.decimals));
        status.energy_used = info.receipt.and_then(|r| r.energy_usage_total);
        Ok(status)
    }

    fn faucet_info(&self) -> FaucetInfo {
        FaucetInfo {
            network: self.config.name.clone(),
            symbol: self.config.symbol.clone(),
            faucets: self.config.faucets.clone(),
        }
    }

    async fn token_balance(&self, address: &str, token: &str) -> Result<TokenBalance, WalletError> {
        let units = self.token_units_of(address, token).await?;
        let decimals = self.token_decimals(address, token).await?;
        let symbol = self.token_symbol(address, token).await;

        Ok(TokenBalance {
            address: address.to_string(),
            token: token.to_string(),
            balance: format_units(units, decimals),
            balance_base_units: units.to_string(),
            decimals,
            symbol,
            network: self.config.name.clone(),
        })
    }

    async fn token_info(&self, token: &str) -> Result<TokenInfo, WalletError> {
        if !self.validate_address(token) {
            return Err(WalletError::InvalidAddress(format!(
                "{token} is not a {} address",
                self.config.name
            )));
        }
        // Read-only calls need an owner; the token contract itself always exists.
        let decimals = self
            .constant_call(token, token, trc20::DECIMALS_SIGNATURE, "")
            .await
            .ok();
        let total_supply = self
            .constant_call(token, token, trc20::TOTAL_SUPPLY_SIGNATURE, "")
            .await
            .ok();
        let name = self.token_string(token, trc20::NAME_SIGNATURE).await;
        let symbol = self.token_string(token, trc20::SYMBOL_SIGNATURE).await;

        Ok(self.token_info_from(token, name, symbol, decimals.as_deref(), total_supply.as_deref()))
    }

    async fn send_token(&self, request: &TokenSendRequest) -> Result<SendReceipt, WalletError> {
        let key = self.signing_key_for(&request.private_key, &request.from)?;
        let from_hex = to_hex_address(&request.from)?;
        let contract_hex = to_hex_address(&request.token)?;

        let decimals = self.token_decimals(&request.from, &request.token).await?;
        let amount = parse_units(&request.amount, decimals)?;
        ensure_positive(&request.amount, amount.is_zero())?;

        let held = self.token_units_of(&request.from, &request.token).await?;
        if held < amount {
            let unit = self
                .token_symbol(&request.from, &request.token)
                .await
                .unwrap_or_else(|| "tokens".into());
            return Err(WalletError::InsufficientFunds {
                available: format_units(held, decimals),
                required: format_units(amount, decimals),
                shortfall: format_units(amount - held, decimals),
                unit,
            });
        }

        let trx = self.balance_sun(&request.from).await?;
        if trx < TOKEN_FEE_RESERVE_SUN {
            return Err(self.insufficient_trx(trx, TOKEN_FEE_RESERVE_SUN));
        }

        info!(network = %self.config.name, token = %request.token, to = %request.to, "sending token");

        let parameter = trc20::transfer_parameter(&request.to, amount)?;
        let resp = self
            .api
            .trigger_smart_contract(
                &from_hex,
                &contract_hex,
                trc20::TRANSFER_SIGNATURE,
                &parameter,
                trc20::DEFAULT_FEE_LIMIT,
            )
            .await?;
        if !resp.result.result {
            return Err(WalletError::TransactionFailed(
                resp.result
                    .message
                    .unwrap_or_else(|| "triggersmartcontract failed".into()),
            ));
        }
        let tx = resp
            .transaction
            .ok_or_else(|| WalletError::TransactionFailed("node returned no transaction".into()))?;

        let calldata = trc20::transfer_calldata(&request.to, amount)?;
        let expected = ExpectedContract::TriggerSmartContract {
            owner: &request.from,
            contract: &request.token,
            data: &calldata,
            max_fee_limit: trc20::DEFAULT_FEE_LIMIT,
        };
        let txid = self.sign_and_broadcast(tx, expected, &key).await?;
        info!(network = %self.config.name, %txid, "token transfer accepted");

        Ok(SendReceipt {
            explorer_url: self.explorer_tx_url(&txid),
            tx_hash: txid,
            from: request.from.clone(),
            to: request.to.clone(),
            amount: format_units(amount, decimals),
            network: self.config.name.clone(),
            token: Some(request.token.clone()),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkConfig, WalletConfig};

    fn shasta() -> TronWallet {
        let config = WalletConfig::with_defaults();
        let NetworkConfig::Tron(c) = config.network("tron").unwrap() else {
            panic!("tron is not a tron network");
        };
        TronWallet::new(c, &config.http).unwrap()
    }

    #[test]
    fn generated_address_has_tron_prefix() {
        let w = shasta();
        let keys = w.generate_wallet().unwrap();
        assert!(keys.address.starts_with('T'));
        assert!(w.validate_address(&keys.address));
        assert_eq!(keys.private_key.len(), 64);
        assert_eq!(w.import_private_key(&keys.private_key).unwrap().address, keys.address);
    }

    #[test]
    fn mnemonic_uses_tron_coin_type() {
        let w = shasta();
        let phrase = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
        let keys = w.wallet_from_mnemonic(Some(phrase)).unwrap();
        assert_eq!(keys.derivation_path.as_deref(), Some("m/44'/195'/0'/0/0"));
        assert!(keys.address.starts_with('T'));
        assert_eq!(w.wallet_from_mnemonic(Some(phrase)).unwrap().address, keys.address);
    }

    #[test]
    fn import_accepts_prefixed_hex() {
        let w = shasta();
        let a = w.import_private_key(&"46".repeat(32)).unwrap();
        let b = w.import_private_key(&format!("0x{}", "46".repeat(32))).unwrap();
        assert_eq!(a.address, b.address);
    }

    #[test]
    fn explorer_links_use_transaction_path() {
        assert_eq!(
            shasta().explorer_tx_url("ab"),
            "https://shasta.tronscan.org/#/transaction/ab"
        );
    }

    #[test]
    fn token_info_decodes_constant_results() {
        let decimals = format!("{:0>64}", "6");
        let supply = format!("{:0>64}", "e8d4a51000");
        let info = shasta().token_info_from(
            "TG3XXyExBkPp9nzdajDZsozEu4BkaSJozs",
            Some("Tether USD".into()),
            Some("USDT".into()),
            Some(&decimals),
            Some(&supply),
        );
        assert_eq!(info.decimals, 6);
        assert_eq!(info.total_supply.as_deref(), Some("1000000"));
        assert_eq!(info.symbol.as_deref(), Some("USDT"));
        assert!(info.mint_authority.is_none());
    }

    #[test]
    fn token_info_defaults_missing_decimals() {
        let info = shasta().token_info_from(
            "TG3XXyExBkPp9nzdajDZsozEu4BkaSJozs",
            None,
            None,
            None,
            Some("zz"),
        );
        assert_eq!(info.decimals, 18);
        assert!(info.total_supply.is_none());
        assert!(info.name.is_none());
    }

    #[tokio::test]
    async fn token_info_rejects_bad_contract_offline() {
        let err = shasta().token_info("0xdeadbeef").await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn foreign_key_is_rejected_offline() {
        let w = shasta();
        let other = w.generate_wallet().unwrap();
        let request = SendRequest {
            from: other.address,
            to: "T9yD14Nj9j7xAB4dbGeiX9h8unkKHxuWwb".into(),
            amount: "1".into(),
            private_key: "46".repeat(32),
        };
        let err = w.send_native(&request).await.unwrap_err();
        assert!(matches!(err, WalletError::KeyMismatch { .. }));
    }
}
