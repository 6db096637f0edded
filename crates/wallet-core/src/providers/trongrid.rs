//! TronGrid full-node HTTP API (`/wallet/*`), using hex addresses
//! (`visible: false`).

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{check_status, join_url, ProviderError};

#[derive(Debug, Default, Deserialize)]
pub struct TronAccount {
    /// Absent for accounts that were never activated.
    #[serde(default)]
    pub balance: u64,
}

#[derive(Debug, Deserialize)]
pub struct TriggerResult {
    #[serde(default)]
    pub result: bool,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TriggerResponse {
    pub result: TriggerResult,
    pub transaction: Option<Value>,
    #[serde(default)]
    pub constant_result: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BroadcastResponse {
    #[serde(default)]
    pub result: bool,
    pub txid: Option<String>,
    pub code: Option<String>,
    /// Hex-encoded UTF-8 on failure.
    pub message: Option<String>,
}

impl BroadcastResponse {
    pub fn error_message(&self) -> String {
        let decoded = self
            .message
            .as_deref()
            .and_then(|m| hex::decode(m).ok())
            .and_then(|b| String::from_utf8(b).ok())
            .or_else(|| self.message.clone());
        match (&self.code, decoded) {
            (Some(code), Some(msg)) => format!("{code}: {msg}"),
            (Some(code), None) => code.clone(),
            (None, Some(msg)) => msg,
            (None, None) => "transaction broadcast failed".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TronTransactionInfo {
    pub id: Option<String>,
    #[serde(rename = "blockNumber")]
    pub block_number: Option<u64>,
    pub fee: Option<u64>,
    /// `"FAILED"` when execution failed, absent otherwise.
    pub result: Option<String>,
    pub receipt: Option<TronReceipt>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TronReceipt {
    pub energy_usage_total: Option<u64>,
    pub net_usage: Option<u64>,
    pub result: Option<String>,
}

pub struct TronGridClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl TronGridClient {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T, ProviderError> {
        let url = join_url(&self.base_url, path);
        debug!(%url, "trongrid POST");
        let mut req = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            req = req.header("TRON-PRO-API-KEY", key);
        }
        let resp = req.send().await?;
        Ok(check_status(resp).await?.json().await?)
    }

    pub async fn get_account(&self, address_hex: &str) -> Result<TronAccount, ProviderError> {
        self.post("wallet/getaccount", &json!({ "address": address_hex }))
            .await
    }

    /// Unsigned TRX transfer. The node answers `{"Error": ...}` instead of a
    /// transaction when the request is invalid.
    pub async fn create_transaction(
        &self,
        owner_hex: &str,
        to_hex: &str,
        amount_sun: u64,
    ) -> Result<Value, ProviderError> {
        let tx: Value = self
            .post(
                "wallet/createtransaction",
                &json!({
                    "owner_address": owner_hex,
                    "to_address": to_hex,
                    "amount": amount_sun,
                }),
            )
            .await?;
        reject_node_error(tx)
    }

    pub async fn trigger_smart_contract(
        &self,
        owner_hex: &str,
        contract_hex: &str,
        function_selector: &str,
        parameter: &str,
        fee_limit: u64,
    ) -> Result<TriggerResponse, ProviderError> {
        self.post(
            "wallet/triggersmartcontract",
            &json!({
                "owner_address": owner_hex,
                "contract_address": contract_hex,
                "function_selector": function_selector,
                "parameter": parameter,
                "fee_limit": fee_limit,
                "call_value": 0,
            }),
        )
        .await
    }

    pub async fn trigger_constant_contract(
        &self,
        owner_hex: &str,
        contract_hex: &str,
        function_selector: &str,
        parameter: &str,
    ) -> Result<TriggerResponse, ProviderError> {
        self.post(
            "wallet/triggerconstantcontract",
            &json!({
                "owner_address": owner_hex,
                "contract_address": contract_hex,
                "function_selector": function_selector,
                "parameter": parameter,
            }),
        )
        .await
    }

    pub async fn broadcast_transaction(
        &self,
        signed_tx: &Value,
    ) -> Result<BroadcastResponse, ProviderError> {
        self.post("wallet/broadcasttransaction", signed_tx).await
    }

    /// `None` when the node does not know the id.
    pub async fn get_transaction_by_id(&self, txid: &str) -> Result<Option<Value>, ProviderError> {
        let tx: Value = self
            .post("wallet/gettransactionbyid", &json!({ "value": txid }))
            .await?;
        Ok(tx.get("txID").is_some().then_some(tx))
    }

    pub async fn get_transaction_info_by_id(
        &self,
        txid: &str,
    ) -> Result<TronTransactionInfo, ProviderError> {
        self.post("wallet/gettransactioninfobyid", &json!({ "value": txid }))
            .await
    }
}

fn reject_node_error(value: Value) -> Result<Value, ProviderError> {
    match value.get("Error").and_then(Value::as_str) {
        Some(msg) => Err(ProviderError::Rpc {
            code: 0,
            message: msg.to_string(),
        }),
        None => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_account_has_zero_balance() {
        let account: TronAccount = serde_json::from_str("{}").unwrap();
        assert_eq!(account.balance, 0);
        let account: TronAccount =
            serde_json::from_str(r#"{"address": "41ab", "balance": 2500000}"#).unwrap();
        assert_eq!(account.balance, 2_500_000);
    }

    #[test]
    fn node_error_is_rejected() {
        let err = reject_node_error(json!({"Error": "class java.lang.NullPointerException"}))
            .unwrap_err();
        assert!(matches!(err, ProviderError::Rpc { .. }));
        assert!(reject_node_error(json!({"txID": "aa"})).is_ok());
    }

    #[test]
    fn broadcast_message_is_hex_decoded() {
        let resp: BroadcastResponse = serde_json::from_value(json!({
            "code": "CONTRACT_VALIDATE_ERROR",
            "message": hex::encode("balance is not sufficient"),
        }))
        .unwrap();
        assert!(!resp.result);
        assert_eq!(
            resp.error_message(),
            "CONTRACT_VALIDATE_ERROR: balance is not sufficient"
        );
    }

    #[test]
    fn trigger_constant_response_parses() {
        let resp: TriggerResponse = serde_json::from_value(json!({
            "result": {"result": true},
            "energy_used": 935,
            "constant_result": ["000000000000000000000000000000000000000000000000000000000000002a"],
        }))
        .unwrap();
        assert!(resp.result.result);
        assert_eq!(resp.constant_result.len(), 1);
        assert!(resp.transaction.is_none());
    }

    #[test]
    fn transaction_info_parses() {
        let info: TronTransactionInfo = serde_json::from_value(json!({
            "id": "ab",
            "blockNumber": 45_000_000u64,
            "fee": 1_100_000u64,
            "receipt": {"energy_usage_total": 14_650u64, "net_usage": 345u64, "result": "SUCCESS"},
        }))
        .unwrap();
        assert_eq!(info.block_number, Some(45_000_000));
        assert_eq!(info.receipt.unwrap().result.as_deref(), Some("SUCCESS"));
    }
}
