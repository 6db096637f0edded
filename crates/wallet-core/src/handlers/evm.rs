//! EVM testnet wallets over JSON-RPC.

use alloy_primitives::U256;
use async_trait::async_trait;
use chain_eth::address::{address_from_private_key, is_valid_address, parse_private_key};
use chain_eth::erc20;
use chain_eth::transaction::{
    build_erc20_transfer, build_transfer, sign_transaction, SignedEthTransaction,
    TRANSFER_GAS_LIMIT,
};
use k256::ecdsa::SigningKey;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::{ensure_key_matches, ensure_positive, ChainHandler};
use crate::config::{EvmNetworkConfig, HttpConfig};
use crate::error::WalletError;
use crate::hd_derivation::{derive_secp256k1_key, EVM_PATH};
use crate::mnemonic::{mnemonic_to_seed, phrase_or_generate};
use crate::providers::json_rpc::{parse_quantity, parse_quantity_u128, parse_quantity_u64, JsonRpcClient};
use crate::providers::{http_client, ProviderError};
use crate::types::{
    Balance, FaucetInfo, GasPrice, MetaMaskConfig, NativeCurrency, NetworkInfo, SendReceipt,
    SendRequest, TokenBalance, TokenInfo, TokenSendRequest, TransactionStatus, TxState,
    WalletKeys,
};
use crate::units::{format_units, parse_units};

/// `eth_estimateGas` result is scaled by this percentage for token sends.
const GAS_HEADROOM_PERCENT: u64 = 120;
const GWEI_DECIMALS: u8 = 9;

/// `value + gas_price * gas_limit` in wei; an overflow is an invalid amount.
fn total_cost(value: U256, gas_price: u128, gas_limit: u64) -> Result<U256, WalletError> {
    U256::from(gas_price)
        .checked_mul(U256::from(gas_limit))
        .and_then(|gas| value.checked_add(gas))
        .ok_or_else(|| WalletError::InvalidAmount("amount plus gas cost exceeds uint256".into()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    status: Option<String>,
    block_number: Option<String>,
    gas_used: Option<String>,
    effective_gas_price: Option<String>,
}

pub struct EvmWallet {
    config: EvmNetworkConfig,
    rpc: JsonRpcClient,
}

impl EvmWallet {
    pub fn new(config: &EvmNetworkConfig, http: &HttpConfig) -> Result<Self, WalletError> {
        let client = http_client(http)?;
        Ok(Self {
            rpc: JsonRpcClient::new(client, config.rpc_url.clone()),
            config: config.clone(),
        })
    }

    fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{tx_hash}", self.config.explorer_url.trim_end_matches('/'))
    }

    fn keys_for(&self, private_key: &[u8; 32]) -> Result<WalletKeys, WalletError> {
        let signing_key = SigningKey::from_bytes(private_key.into())
            .map_err(|e| WalletError::InvalidPrivateKey(e.to_string()))?;
        let public_key = signing_key.verifying_key().to_encoded_point(false);

        Ok(WalletKeys {
            address: address_from_private_key(private_key)?,
            private_key: format!("0x{}", hex::encode(private_key)),
            public_key: Some(format!("0x{}", hex::encode(public_key.as_bytes()))),
            network: self.config.name.clone(),
            ..Default::default()
        })
    }

    fn ensure_address(&self, address: &str) -> Result<(), WalletError> {
        if is_valid_address(address) {
            Ok(())
        } else {
            Err(WalletError::InvalidAddress(format!(
                "{address} is not a valid EVM address"
            )))
        }
    }

    /// Parse the key and check it controls `from`.
    fn signing_key_for(&self, private_key: &str, from: &str) -> Result<Zeroizing<[u8; 32]>, WalletError> {
        let key = Zeroizing::new(parse_private_key(private_key)?);
        let derived = address_from_private_key(&key)?;
        ensure_key_matches(&derived.to_lowercase(), &from.to_lowercase())?;
        Ok(key)
    }

    async fn native_balance(&self, address: &str) -> Result<U256, WalletError> {
        let wei: String = self
            .rpc
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        Ok(parse_quantity(&wei)?)
    }

    async fn pending_nonce(&self, address: &str) -> Result<u64, WalletError> {
        let nonce: String = self
            .rpc
            .call("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        Ok(parse_quantity_u64(&nonce)?)
    }

    async fn gas_price_wei(&self) -> Result<u128, WalletError> {
        let price: String = self.rpc.call("eth_gasPrice", json!([])).await?;
        Ok(parse_quantity_u128(&price)?)
    }

    async fn eth_call(&self, to: &str, data: &[u8]) -> Result<Vec<u8>, WalletError> {
        let result: String = self
            .rpc
            .call(
                "eth_call",
                json!([{ "to": to, "data": format!("0x{}", hex::encode(data)) }, "latest"]),
            )
            .await?;
        let bytes = hex::decode(result.trim_start_matches("0x")).map_err(|e| {
            ProviderError::InvalidResponse(format!("eth_call returned non-hex data: {e}"))
        })?;
        Ok(bytes)
    }

    async fn token_decimals(&self, token: &str) -> Result<u8, WalletError> {
        let data = self.eth_call(token, &erc20::encode_decimals()).await?;
        Ok(erc20::decode_decimals(&data)?)
    }

    async fn token_units_of(&self, token: &str, owner: &str) -> Result<U256, WalletError> {
        let data = self
            .eth_call(token, &erc20::encode_balance_of(owner)?)
            .await?;
        Ok(chain_eth::abi::decode_uint256(&data)?)
    }

    /// `None` for tokens without a readable `symbol()`.
    async fn token_symbol(&self, token: &str) -> Option<String> {
        let data = self.eth_call(token, &erc20::encode_symbol()).await.ok()?;
        chain_eth::abi::decode_string(&data).ok()
    }

    async fn submit(&self, signed: &SignedEthTransaction) -> Result<String, WalletError> {
        let tx_hash: String = self
            .rpc
            .call("eth_sendRawTransaction", json!([signed.raw_hex()]))
            .await?;
        if !tx_hash.eq_ignore_ascii_case(&signed.tx_hash) {
            debug!(node = %tx_hash, local = %signed.tx_hash, "node reported a different hash");
        }
        Ok(tx_hash)
    }

    fn gas_price_report(&self, wei: u128) -> GasPrice {
        GasPrice {
            gas_price: wei.to_string(),
            gas_price_gwei: format_units(U256::from(wei), GWEI_DECIMALS),
            network: self.config.name.clone(),
        }
    }

    /// Combine `eth_chainId`, `eth_blockNumber` and `eth_gasPrice` results.
    fn network_info_from(
        &self,
        chain_id: &str,
        block_number: &str,
        gas_price: &str,
    ) -> Result<NetworkInfo, WalletError> {
        let chain_id = parse_quantity_u64(chain_id)?;
        if chain_id != self.config.chain_id {
            warn!(
                network = %self.config.name,
                configured = self.config.chain_id,
                reported = chain_id,
                "RPC endpoint serves a different chain"
            );
        }
        let price = self.gas_price_report(parse_quantity_u128(gas_price)?);
        Ok(NetworkInfo {
            name: self.config.name.clone(),
            chain_id,
            block_number: parse_quantity_u64(block_number)?,
            gas_price: price.gas_price,
            gas_price_gwei: price.gas_price_gwei,
            rpc_url: self.config.rpc_url.clone(),
            explorer_url: self.config.explorer_url.clone(),
        })
    }

    /// `None` for tokens without a readable `name()`.
    async fn token_name(&self, token: &str) -> Option<String> {
        let data = self.eth_call(token, &erc20::encode_name()).await.ok()?;
        chain_eth::abi::decode_string(&data).ok()
    }

    async fn token_total_supply(&self, token: &str) -> Option<U256> {
        let data = self.eth_call(token, &erc20::encode_total_supply()).await.ok()?;
        chain_eth::abi::decode_uint256(&data).ok()
    }

    fn insufficient(&self, available: U256, required: U256, decimals: u8, unit: &str) -> WalletError {
        WalletError::InsufficientFunds {
            available: format_units(available, decimals),
            required: format_units(required, decimals),
            shortfall: format_units(required.saturating_sub(available), decimals),
            unit: unit.to_string(),
        }
    }
}

#[async_trait]
impl ChainHandler for EvmWallet {
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
        let derived = derive_secp256k1_key(seed.as_slice(), EVM_PATH)?;

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
        is_valid_address(address)
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, WalletError> {
        self.ensure_address(address)?;
        let wei = self.native_balance(address).await?;

        Ok(Balance {
            address: address.to_string(),
            balance: format_units(wei, self.config.decimals),
            balance_base_units: wei.to_string(),
            unconfirmed: None,
            symbol: self.config.symbol.clone(),
            network: self.config.name.clone(),
        })
    }

    async fn send_native(&self, request: &SendRequest) -> Result<SendReceipt, WalletError> {
        let value = parse_units(&request.amount, self.config.decimals)?;
        ensure_positive(&request.amount, value.is_zero())?;
        let key = self.signing_key_for(&request.private_key, &request.from)?;
        self.ensure_address(&request.to)?;

        info!(network = %self.config.name, from = %request.from, to = %request.to, "sending");

        let nonce = self.pending_nonce(&request.from).await?;
        let gas_price = self.gas_price_wei().await?;
        let required = total_cost(value, gas_price, TRANSFER_GAS_LIMIT)?;
        let balance = self.native_balance(&request.from).await?;
        if balance < required {
            return Err(self.insufficient(balance, required, self.config.decimals, &self.config.symbol));
        }

        let tx = build_transfer(self.config.chain_id, nonce, &request.to, value, gas_price)?;
        let signed = sign_transaction(&tx, &key)?;
        let tx_hash = self.submit(&signed).await?;
        info!(network = %self.config.name, %tx_hash, nonce, "broadcast accepted");

        Ok(SendReceipt {
            explorer_url: self.explorer_tx_url(&tx_hash),
            tx_hash,
            from: request.from.clone(),
            to: request.to.clone(),
            amount: format_units(value, self.config.decimals),
            fee: Some(format_units(required - value, self.config.decimals)),
            network: self.config.name.clone(),
            ..Default::default()
        })
    }

    async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, WalletError> {
        let receipt: Option<RpcReceipt> = self
            .rpc
            .call("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;

        let Some(receipt) = receipt else {
            let pending: Option<Value> = self
                .rpc
                .call("eth_getTransactionByHash", json!([tx_hash]))
                .await?;
            return match pending {
                Some(_) => Ok(TransactionStatus::new(
                    tx_hash,
                    TxState::Pending,
                    self.explorer_tx_url(tx_hash),
                    &self.config.name,
                )),
                None => Err(WalletError::NotFound(tx_hash.to_string())),
            };
        };

        let state = match receipt.status.as_deref() {
            Some("0x1") => TxState::Success,
            _ => TxState::Failed,
        };
        let gas_used = receipt.gas_used.as_deref().map(parse_quantity_u64).transpose()?;
        let gas_price = receipt
            .effective_gas_price
            .as_deref()
            .map(parse_quantity)
            .transpose()?;

        let mut status = TransactionStatus::new(
            tx_hash,
            state,
            self.explorer_tx_url(tx_hash),
            &self.config.name,
        );
        status.block_height = receipt
            .block_number
            .as_deref()
            .map(parse_quantity_u64)
            .transpose()?;
        status.gas_used = gas_used;
        status.fee = match (gas_used, gas_price) {
            (Some(used), Some(price)) => {
                Some(format_units(U256::from(used) * price, self.config.decimals))
            }
            _ => None,
        };
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
        self.ensure_address(address)?;
        self.ensure_address(token)?;

        let units = self.token_units_of(token, address).await?;
        let decimals = self.token_decimals(token).await?;
        let symbol = self.token_symbol(token).await;

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

    async fn send_token(&self, request: &TokenSendRequest) -> Result<SendReceipt, WalletError> {
        let key = self.signing_key_for(&request.private_key, &request.from)?;
        self.ensure_address(&request.to)?;
        self.ensure_address(&request.token)?;

        let decimals = self.token_decimals(&request.token).await?;
        let amount = parse_units(&request.amount, decimals)?;
        ensure_positive(&request.amount, amount.is_zero())?;

        let held = self.token_units_of(&request.token, &request.from).await?;
        if held < amount {
            let unit = self
                .token_symbol(&request.token)
                .await
                .unwrap_or_else(|| "tokens".into());
            return Err(self.insufficient(held, amount, decimals, &unit));
        }

        info!(
            network = %self.config.name,
            token = %request.token,
            from = %request.from,
            to = %request.to,
            "sending token"
        );

        let calldata = erc20::encode_transfer(&request.to, amount)?;
        let estimate: String = self
            .rpc
            .call(
                "eth_estimateGas",
                json!([{
                    "from": request.from,
                    "to": request.token,
                    "data": format!("0x{}", hex::encode(&calldata)),
                }]),
            )
            .await?;
        let gas_limit = parse_quantity_u64(&estimate)?.saturating_mul(GAS_HEADROOM_PERCENT) / 100;

        let nonce = self.pending_nonce(&request.from).await?;
        let gas_price = self.gas_price_wei().await?;
        let gas_cost = total_cost(U256::ZERO, gas_price, gas_limit)?;
        let balance = self.native_balance(&request.from).await?;
        if balance < gas_cost {
            return Err(self.insufficient(balance, gas_cost, self.config.decimals, &self.config.symbol));
        }

        let tx = build_erc20_transfer(
            self.config.chain_id,
            nonce,
            &request.token,
            &request.to,
            amount,
            gas_price,
            gas_limit,
        )?;
        let signed = sign_transaction(&tx, &key)?;
        let tx_hash = self.submit(&signed).await?;
        info!(network = %self.config.name, %tx_hash, gas_limit, "token transfer accepted");

        Ok(SendReceipt {
            explorer_url: self.explorer_tx_url(&tx_hash),
            tx_hash,
            from: request.from.clone(),
            to: request.to.clone(),
            amount: format_units(amount, decimals),
            fee: Some(format_units(gas_cost, self.config.decimals)),
            network: self.config.name.clone(),
            token: Some(request.token.clone()),
            ..Default::default()
        })
    }

    async fn token_info(&self, token: &str) -> Result<TokenInfo, WalletError> {
        self.ensure_address(token)?;
        let decimals = self.token_decimals(token).await?;
        let name = self.token_name(token).await;
        let symbol = self.token_symbol(token).await;
        let total_supply = self
            .token_total_supply(token)
            .await
            .map(|supply| format_units(supply, decimals));

        Ok(TokenInfo {
            token_address: token.to_string(),
            name,
            symbol,
            decimals,
            total_supply,
            network: self.config.name.clone(),
            ..Default::default()
        })
    }

    async fn gas_price(&self) -> Result<GasPrice, WalletError> {
        let wei = self.gas_price_wei().await?;
        Ok(self.gas_price_report(wei))
    }

    async fn network_info(&self) -> Result<NetworkInfo, WalletError> {
        let chain_id: String = self.rpc.call("eth_chainId", json!([])).await?;
        let block_number: String = self.rpc.call("eth_blockNumber", json!([])).await?;
        let gas_price: String = self.rpc.call("eth_gasPrice", json!([])).await?;
        self.network_info_from(&chain_id, &block_number, &gas_price)
    }

    fn metamask_config(&self) -> Result<MetaMaskConfig, WalletError> {
        Ok(MetaMaskConfig {
            chain_id: format!("0x{:x}", self.config.chain_id),
            chain_name: self.config.name.clone(),
            native_currency: NativeCurrency {
                name: self.config.symbol.clone(),
                symbol: self.config.symbol.clone(),
                decimals: self.config.decimals,
            },
            rpc_urls: vec![self.config.rpc_url.clone()],
            block_explorer_urls: vec![self.config.explorer_url.clone()],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NetworkConfig, WalletConfig};

    const ABANDON: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn sepolia() -> EvmWallet {
        let config = WalletConfig::with_defaults();
        let NetworkConfig::Evm(c) = config.network("ethereum_sepolia").unwrap() else {
            panic!("ethereum_sepolia is not an evm network");
        };
        EvmWallet::new(c, &config.http).unwrap()
    }

    #[test]
    fn mnemonic_wallet_matches_known_vector() {
        let keys = sepolia().wallet_from_mnemonic(Some(ABANDON)).unwrap();
        assert_eq!(keys.address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
        assert_eq!(keys.derivation_path.as_deref(), Some("m/44'/60'/0'/0/0"));
        assert!(keys.public_key.unwrap().starts_with("0x04"));
    }

    #[test]
    fn gas_price_is_reported_in_gwei() {
        let price = sepolia().gas_price_report(parse_quantity_u128("0x6fc23ac00").unwrap());
        assert_eq!(price.gas_price, "30000000000");
        assert_eq!(price.gas_price_gwei, "30");
        assert_eq!(price.network, "Ethereum Sepolia");
    }

    #[test]
    fn network_info_parses_rpc_quantities() {
        let w = sepolia();
        let info = w.network_info_from("0xaa36a7", "0x6c1d2b", "0x3b9aca07").unwrap();
        assert_eq!(info.chain_id, 11_155_111);
        assert_eq!(info.block_number, 7_085_355);
        assert_eq!(info.gas_price, "1000000007");
        assert_eq!(info.gas_price_gwei, "1.000000007");
        assert_eq!(info.rpc_url, w.config.rpc_url);
    }

    #[test]
    fn network_info_rejects_malformed_quantity() {
        assert!(sepolia().network_info_from("0xaa36a7", "latest", "0x1").is_err());
    }

    #[test]
    fn metamask_config_uses_hex_chain_id() {
        let w = sepolia();
        let config = w.metamask_config().unwrap();
        assert_eq!(config.chain_id, "0xaa36a7");
        assert_eq!(config.native_currency.decimals, 18);
        assert_eq!(config.rpc_urls, vec![w.config.rpc_url.clone()]);
        assert_eq!(config.block_explorer_urls, vec![w.config.explorer_url.clone()]);
    }

    #[tokio::test]
    async fn token_info_rejects_bad_contract_offline() {
        let err = sepolia().token_info("0x1234").await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidAddress(_)));
    }

    #[test]
    fn total_cost_adds_gas() {
        let cost = total_cost(U256::from(1_000u64), 30_000_000_000, TRANSFER_GAS_LIMIT).unwrap();
        assert_eq!(cost, U256::from(630_000_000_001_000u64));
    }

    #[test]
    fn total_cost_rejects_wrapping_amount() {
        let value = parse_units(
            "115792089237316195423570985008687907853269984665640564039457.584007913129639935",
            18,
        )
        .unwrap();
        assert_eq!(value, U256::MAX);
        let err = total_cost(value, 30_000_000_000, TRANSFER_GAS_LIMIT).unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(_)));
    }

    #[test]
    fn import_accepts_optional_prefix() {
        let w = sepolia();
        let plain = w.import_private_key(&"46".repeat(32)).unwrap();
        let prefixed = w.import_private_key(&format!("0x{}", "46".repeat(32))).unwrap();
        assert_eq!(plain.address, prefixed.address);
        assert_eq!(
            plain.address.to_lowercase(),
            "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f"
        );
        assert_eq!(plain.private_key, format!("0x{}", "46".repeat(32)));
    }

    #[test]
    fn generated_wallet_imports_back() {
        let w = sepolia();
        let keys = w.generate_wallet().unwrap();
        assert!(w.validate_address(&keys.address));
        assert_eq!(w.import_private_key(&keys.private_key).unwrap().address, keys.address);
    }

    #[test]
    fn bad_checksum_is_invalid() {
        let w = sepolia();
        assert!(w.validate_address("0x9858effd232b4033e47d90003d41ec34ecaeda94"));
        assert!(!w.validate_address("0x9858EFFD232B4033E47d90003D41EC34EcaEda94"));
        assert!(!w.validate_address("mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r"));
    }

    #[tokio::test]
    async fn send_with_foreign_key_is_rejected_offline() {
        let request = SendRequest {
            from: "0x9858EfFD232B4033E47d90003D41EC34EcaEda94".into(),
            to: "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f".into(),
            amount: "0.01".into(),
            private_key: "46".repeat(32),
        };
        let err = sepolia().send_native(&request).await.unwrap_err();
        assert!(matches!(err, WalletError::KeyMismatch { .. }));
    }

    #[tokio::test]
    async fn send_of_zero_is_rejected_offline() {
        let request = SendRequest {
            from: "0x9d8a62f656a8d1615c1294fd71e9cfb3e4855a4f".into(),
            to: "0x9858EfFD232B4033E47d90003D41EC34EcaEda94".into(),
            amount: "0".into(),
            private_key: "46".repeat(32),
        };
        let err = sepolia().send_native(&request).await.unwrap_err();
        assert!(matches!(err, WalletError::InvalidAmount(_)));
    }

    #[test]
    fn receipt_parses_node_json() {
        let receipt: RpcReceipt = serde_json::from_value(json!({
            "status": "0x1",
            "blockNumber": "0x5c29fb",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "logs": [],
        }))
        .unwrap();
        assert_eq!(receipt.status.as_deref(), Some("0x1"));
        assert_eq!(parse_quantity_u64(receipt.gas_used.as_deref().unwrap()).unwrap(), 21_000);
    }
}
