//! Request and response records shared by every chain handler.
//!
//! Amounts cross this boundary as decimal strings in display units; base
//! unit values are carried alongside as integer strings.

use chain_utxo::utxo::UnspentOutput;
use serde::{Deserialize, Serialize};

/// Key material of a generated, derived or imported wallet.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletKeys {
    pub address: String,
    /// WIF on UTXO chains, hex on EVM and Tron, base58 keypair on Solana.
    pub private_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub derivation_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_base64: Option<String>,
    /// Encoding the imported secret was recognised as.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub address: String,
    /// Display units, e.g. `"0.0012"`.
    pub balance: String,
    /// Smallest unit (satoshi, wei, sun, lamport).
    pub balance_base_units: String,
    /// Mempool delta in display units, UTXO chains only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unconfirmed: Option<String>,
    pub symbol: String,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub from: String,
    pub to: String,
    /// Display units.
    pub amount: String,
    pub private_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSendRequest {
    pub from: String,
    pub to: String,
    /// Contract address on EVM and Tron, mint address on Solana.
    pub token: String,
    /// Display units of the token.
    pub amount: String,
    pub private_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendReceipt {
    pub tx_hash: String,
    pub from: String,
    pub to: String,
    pub amount: String,
    /// Fee in display units: paid on UTXO chains, estimated elsewhere.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    pub explorer_url: String,
    pub network: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs_used: Option<usize>,
    /// Change returned to the sender in display units; `None` when absorbed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxState {
    Pending,
    /// Included in a block (UTXO chains report no execution outcome).
    Confirmed,
    Success,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStatus {
    pub tx_hash: String,
    pub state: TxState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_height: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmations: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy_used: Option<u64>,
    pub explorer_url: String,
    pub network: String,
}

impl TransactionStatus {
    pub fn new(tx_hash: &str, state: TxState, explorer_url: String, network: &str) -> Self {
        Self {
            tx_hash: tx_hash.to_string(),
            state,
            block_height: None,
            confirmations: None,
            fee: None,
            gas_used: None,
            energy_used: None,
            explorer_url,
            network: network.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaucetInfo {
    pub network: String,
    pub symbol: String,
    pub faucets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoList {
    pub address: String,
    pub utxos: Vec<UnspentOutput>,
    pub count: usize,
    /// Sum of all outputs in display units.
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub address: String,
    pub token: String,
    pub balance: String,
    pub balance_base_units: String,
    pub decimals: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub network: String,
}

/// Metadata of an ERC-20, TRC-20 or SPL token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    /// Contract address on EVM and Tron, mint address on Solana.
    pub token_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    pub decimals: u8,
    /// Display units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint_authority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freeze_authority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_initialized: Option<bool>,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GasPrice {
    /// Wei.
    pub gas_price: String,
    pub gas_price_gwei: String,
    pub network: String,
}

/// Live view of an EVM network next to its configured endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    pub name: String,
    pub chain_id: u64,
    pub block_number: u64,
    pub gas_price: String,
    pub gas_price_gwei: String,
    pub rpc_url: String,
    pub explorer_url: String,
}

/// `wallet_addEthereumChain` parameters for browser wallets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaMaskConfig {
    /// `0x`-prefixed hex.
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirdropReceipt {
    pub signature: String,
    pub address: String,
    /// Display units.
    pub amount: String,
    pub explorer_url: String,
    pub network: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub key: String,
    pub name: String,
    pub family: String,
    pub symbol: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn receipt_serializes_camel_case_without_empty_fields() {
        let receipt = SendReceipt {
            tx_hash: "ab".into(),
            from: "a".into(),
            to: "b".into(),
            amount: "0.0012".into(),
            fee: Some("0.00004".into()),
            explorer_url: "https://x/tx/ab".into(),
            network: "Bitcoin Testnet".into(),
            inputs_used: Some(2),
            change: None,
            token: None,
        };
        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["txHash"], "ab");
        assert_eq!(value["inputsUsed"], 2);
        assert_eq!(value["explorerUrl"], "https://x/tx/ab");
        assert!(value.get("change").is_none());
        assert!(value.get("token").is_none());
    }

    #[test]
    fn tx_state_is_lowercase() {
        let status = TransactionStatus::new("ff", TxState::Pending, "u".into(), "n");
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["state"], "pending");
        assert!(value.get("blockHeight").is_none());
    }

    #[test]
    fn send_request_reads_camel_case() {
        let req: SendRequest = serde_json::from_value(json!({
            "from": "a", "to": "b", "amount": "1", "privateKey": "k"
        }))
        .unwrap();
        assert_eq!(req.private_key, "k");
    }

    #[test]
    fn metamask_config_uses_wallet_field_names() {
        let config = MetaMaskConfig {
            chain_id: "0xaa36a7".into(),
            chain_name: "Ethereum Sepolia".into(),
            native_currency: NativeCurrency {
                name: "ETH".into(),
                symbol: "ETH".into(),
                decimals: 18,
            },
            rpc_urls: vec!["https://rpc".into()],
            block_explorer_urls: vec!["https://explorer".into()],
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["chainId"], "0xaa36a7");
        assert_eq!(value["nativeCurrency"]["decimals"], 18);
        assert_eq!(value["rpcUrls"], json!(["https://rpc"]));
        assert_eq!(value["blockExplorerUrls"], json!(["https://explorer"]));
    }

    #[test]
    fn token_info_omits_unknown_fields() {
        let info = TokenInfo {
            token_address: "0xabc".into(),
            decimals: 6,
            network: "Tron Shasta".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["tokenAddress"], "0xabc");
        assert_eq!(value["decimals"], 6);
        assert!(value.get("name").is_none());
        assert!(value.get("totalSupply").is_none());
    }
}
