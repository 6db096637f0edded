//! Solana (devnet) wallets over JSON-RPC.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chain_sol::{
    address_to_bytes, build_create_ata_idempotent, build_sol_transfer, build_transfer_checked,
    compile_transaction, derive_associated_token_address, sign_transaction, SolKeypair,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{ensure_key_matches, ensure_positive, ChainHandler};
use crate::config::{HttpConfig, SolanaNetworkConfig};
use crate::error::WalletError;
use crate::hd_derivation::{derive_ed25519_key, SOLANA_PATH};
use crate::mnemonic::{mnemonic_to_seed, phrase_or_generate};
use crate::providers::json_rpc::JsonRpcClient;
use crate::providers::{http_client, ProviderError};
use crate::types::{
    AirdropReceipt, Balance, FaucetInfo, SendReceipt, SendRequest, TokenBalance, TokenInfo,
    TokenSendRequest, TransactionStatus, TxState, WalletKeys,
};
use crate::units::{format_units_u64, parse_units_u64};

/// Base fee of a single-signature transaction.
const SIGNATURE_FEE_LAMPORTS: u64 = 5_000;
/// Clusters whose RPC nodes hand out airdrops.
const AIRDROP_CLUSTERS: [&str; 2] = ["devnet", "testnet"];

/// `{"context": ..., "value": T}` wrapper used by most Solana RPC results.
#[derive(Debug, Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Debug, Deserialize)]
struct LatestBlockhash {
    blockhash: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignatureStatus {
    slot: u64,
    confirmations: Option<u64>,
    #[serde(default)]
    err: Option<Value>,
    confirmation_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenAmount {
    amount: String,
    decimals: u8,
}

/// `getAccountInfo` with `jsonParsed` encoding.
#[derive(Debug, Deserialize)]
struct ParsedAccount {
    data: ParsedData,
}

#[derive(Debug, Deserialize)]
struct ParsedData {
    parsed: ParsedInfo,
}

#[derive(Debug, Deserialize)]
struct ParsedInfo {
    #[serde(rename = "type")]
    kind: String,
    info: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MintInfo {
    decimals: u8,
    supply: String,
    mint_authority: Option<String>,
    freeze_authority: Option<String>,
    is_initialized: bool,
}

impl TokenAmount {
    fn units(&self) -> Result<u64, ProviderError> {
        self.amount
            .parse()
            .map_err(|e| ProviderError::InvalidResponse(format!("token amount {:?}: {e}", self.amount)))
    }
}

pub struct SolanaWallet {
    config: SolanaNetworkConfig,
    rpc: JsonRpcClient,
}

impl SolanaWallet {
    pub fn new(config: &SolanaNetworkConfig, http: &HttpConfig) -> Result<Self, WalletError> {
        let client = http_client(http)?;
        Ok(Self {
            rpc: JsonRpcClient::new(client, config.rpc_url.clone()),
            config: config.clone(),
        })
    }

    fn explorer_tx_url(&self, signature: &str) -> String {
        let base = self.config.explorer_url.trim_end_matches('/');
        match &self.config.cluster {
            Some(cluster) => format!("{base}/tx/{signature}?cluster={cluster}"),
            None => format!("{base}/tx/{signature}"),
        }
    }

    fn keys_for(&self, keypair: &SolKeypair) -> WalletKeys {
        let address = keypair.address();
        WalletKeys {
            private_key: keypair.to_base58(),
            private_key_base64: Some(keypair.to_base64()),
            public_key: Some(address.clone()),
            address,
            network: self.config.name.clone(),
            ..Default::default()
        }
    }

    fn keypair_for(&self, private_key: &str, from: &str) -> Result<SolKeypair, WalletError> {
        let (keypair, _) = SolKeypair::parse(private_key)?;
        ensure_key_matches(&keypair.address(), from)?;
        Ok(keypair)
    }

    async fn lamports(&self, address: &str) -> Result<u64, WalletError> {
        let balance: WithContext<u64> = self.rpc.call("getBalance", json!([address])).await?;
        Ok(balance.value)
    }

    async fn latest_blockhash(&self) -> Result<[u8; 32], WalletError> {
        let latest: WithContext<LatestBlockhash> = self
            .rpc
            .call("getLatestBlockhash", json!([{ "commitment": "finalized" }]))
            .await?;
        address_to_bytes(&latest.value.blockhash).map_err(|e| {
            ProviderError::InvalidResponse(format!("blockhash {}: {e}", latest.value.blockhash))
                .into()
        })
    }

    async fn submit(&self, wire: &[u8]) -> Result<String, WalletError> {
        let signature: String = self
            .rpc
            .call(
                "sendTransaction",
                json!([STANDARD.encode(wire), { "encoding": "base64" }]),
            )
            .await?;
        Ok(signature)
    }

    async fn mint_decimals(&self, mint: &str) -> Result<u8, WalletError> {
        let supply: WithContext<TokenAmount> =
            self.rpc.call("getTokenSupply", json!([mint])).await?;
        Ok(supply.value.decimals)
    }

    fn mint_info_from(
        &self,
        mint: &str,
        account: Option<ParsedAccount>,
    ) -> Result<TokenInfo, WalletError> {
        let account = account.ok_or_else(|| {
            ProviderError::InvalidResponse(format!("mint account {mint} does not exist"))
        })?;
        if account.data.parsed.kind != "mint" {
            return Err(ProviderError::InvalidResponse(format!(
                "{mint} is a {} account, not a mint",
                account.data.parsed.kind
            ))
            .into());
        }
        let info: MintInfo = serde_json::from_value(account.data.parsed.info)
            .map_err(|e| ProviderError::InvalidResponse(format!("mint {mint}: {e}")))?;
        let supply: u64 = info
            .supply
            .parse()
            .map_err(|e| ProviderError::InvalidResponse(format!("mint supply {:?}: {e}", info.supply)))?;

        Ok(TokenInfo {
            token_address: mint.to_string(),
            decimals: info.decimals,
            total_supply: Some(format_units_u64(supply, info.decimals)),
            mint_authority: info.mint_authority,
            freeze_authority: info.freeze_authority,
            is_initialized: Some(info.is_initialized),
            network: self.config.name.clone(),
            ..Default::default()
        })
    }

    fn ensure_airdrop_cluster(&self) -> Result<(), WalletError> {
        match self.config.cluster.as_deref() {
            Some(cluster) if AIRDROP_CLUSTERS.contains(&cluster) => Ok(()),
            _ => Err(WalletError::Unsupported("Airdrops".into())),
        }
    }

    /// Sum of every token account `owner` holds for `mint`.
    async fn owned_token_units(&self, owner: &str, mint: &str) -> Result<Option<TokenAmount>, WalletError> {
        let accounts: WithContext<Vec<Value>> = self
            .rpc
            .call(
                "getTokenAccountsByOwner",
                json!([owner, { "mint": mint }, { "encoding": "jsonParsed" }]),
            )
            .await?;

        let mut total: Option<(u64, u8)> = None;
        for account in &accounts.value {
            let amount = &account["account"]["data"]["parsed"]["info"]["tokenAmount"];
            let amount: TokenAmount = serde_json::from_value(amount.clone()).map_err(|e| {
                ProviderError::InvalidResponse(format!("unexpected token account layout: {e}"))
            })?;
            let units = amount.units()?;
            total = Some(match total {
                Some((sum, decimals)) => (sum.saturating_add(units), decimals),
                None => (units, amount.decimals),
            });
        }
        Ok(total.map(|(sum, decimals)| TokenAmount {
            amount: sum.to_string(),
            decimals,
        }))
    }

    fn insufficient_sol(&self, available: u64, required: u64) -> WalletError {
        WalletError::InsufficientFunds {
            available: format_units_u64(available, self.config.decimals),
            required: format_units_u64(required, self.config.decimals),
            shortfall: format_units_u64(required.saturating_sub(available), self.config.decimals),
            unit: self.config.symbol.clone(),
        }
    }
}

#[async_trait]
impl ChainHandler for SolanaWallet {
    fn network_name(&self) -> &str {
        &self.config.name
    }

    fn generate_wallet(&self) -> Result<WalletKeys, WalletError> {
        Ok(self.keys_for(&SolKeypair::generate()))
    }

    fn wallet_from_mnemonic(&self, phrase: Option<&str>) -> Result<WalletKeys, WalletError> {
        let phrase = phrase_or_generate(phrase)?;
        let seed = mnemonic_to_seed(&phrase, "")?;
        let derived = derive_ed25519_key(seed.as_slice(), SOLANA_PATH)?;
        let keypair = SolKeypair::from_seed(&derived.private_key);

        Ok(WalletKeys {
            mnemonic: Some(phrase.to_string()),
            derivation_path: Some(derived.derivation_path.clone()),
            ..self.keys_for(&keypair)
        })
    }

    fn import_private_key(&self, private_key: &str) -> Result<WalletKeys, WalletError> {
        let (keypair, format) = SolKeypair::parse(private_key)?;
        Ok(WalletKeys {
            key_format: Some(format.to_string()),
            ..self.keys_for(&keypair)
        })
    }

    fn validate_address(&self, address: &str) -> bool {
        chain_sol::validate_address(address)
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, WalletError> {
        address_to_bytes(address)?;
        let lamports = self.lamports(address).await?;
        Ok(Balance {
            address: address.to_string(),
            balance: format_units_u64(lamports, self.config.decimals),
            balance_base_units: lamports.to_string(),
            unconfirmed: None,
            symbol: self.config.symbol.clone(),
            network: self.config.name.clone(),
        })
    }

    async fn send_native(&self, request: &SendRequest) -> Result<SendReceipt, WalletError> {
        let lamports = parse_units_u64(&request.amount, self.config.decimals)?;
        ensure_positive(&request.amount, lamports == 0)?;
        let keypair = self.keypair_for(&request.private_key, &request.from)?;
        let to = address_to_bytes(&request.to)?;

        let balance = self.lamports(&request.from).await?;
        let required = lamports.saturating_add(SIGNATURE_FEE_LAMPORTS);
        if balance < required {
            return Err(self.insufficient_sol(balance, required));
        }

        info!(network = %self.config.name, from = %request.from, to = %request.to, lamports, "sending");

        let blockhash = self.latest_blockhash().await?;
        let tx = build_sol_transfer(&keypair.pubkey(), &to, lamports, &blockhash)?;
        let wire = sign_transaction(&tx, &keypair)?;
        let signature = self.submit(&wire).await?;
        info!(network = %self.config.name, %signature, "broadcast accepted");

        Ok(SendReceipt {
            explorer_url: self.explorer_tx_url(&signature),
            tx_hash: signature,
            from: request.from.clone(),
            to: request.to.clone(),
            amount: format_units_u64(lamports, self.config.decimals),
            fee: Some(format_units_u64(SIGNATURE_FEE_LAMPORTS, self.config.decimals)),
            network: self.config.name.clone(),
            ..Default::default()
        })
    }

    async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, WalletError> {
        let statuses: WithContext<Vec<Option<SignatureStatus>>> = self
            .rpc
            .call(
                "getSignatureStatuses",
                json!([[tx_hash], { "searchTransactionHistory": true }]),
            )
            .await?;
        let Some(found) = statuses.value.into_iter().next().flatten() else {
            return Err(WalletError::NotFound(tx_hash.to_string()));
        };

        let state = if found.err.as_ref().is_some_and(|e| !e.is_null()) {
            TxState::Failed
        } else {
            match found.confirmation_status.as_deref() {
                Some("confirmed") | Some("finalized") => TxState::Success,
                _ => TxState::Pending,
            }
        };

        let mut status = TransactionStatus::new(
            tx_hash,
            state,
            self.explorer_tx_url(tx_hash),
            &self.config.name,
        );
        status.block_height = Some(found.slot);
        status.confirmations = found.confirmations;
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
        address_to_bytes(address)?;
        address_to_bytes(token)?;

        let (units, decimals) = match self.owned_token_units(address, token).await? {
            Some(amount) => (amount.units()?, amount.decimals),
            // No token account yet: nothing held.
            None => (0, self.mint_decimals(token).await?),
        };

        Ok(TokenBalance {
            address: address.to_string(),
            token: token.to_string(),
            balance: format_units_u64(units, decimals),
            balance_base_units: units.to_string(),
            decimals,
            symbol: None,
            network: self.config.name.clone(),
        })
    }

    async fn token_info(&self, token: &str) -> Result<TokenInfo, WalletError> {
        address_to_bytes(token)?;
        let account: WithContext<Option<ParsedAccount>> = self
            .rpc
            .call("getAccountInfo", json!([token, { "encoding": "jsonParsed" }]))
            .await?;
        self.mint_info_from(token, account.value)
    }

    async fn request_airdrop(&self, address: &str, amount: &str) -> Result<AirdropReceipt, WalletError> {
        self.ensure_airdrop_cluster()?;
        let lamports = parse_units_u64(amount, self.config.decimals)?;
        ensure_positive(amount, lamports == 0)?;
        address_to_bytes(address)?;

        info!(network = %self.config.name, %address, lamports, "requesting airdrop");
        let signature: String = self
            .rpc
            .call("requestAirdrop", json!([address, lamports]))
            .await?;

        Ok(AirdropReceipt {
            explorer_url: self.explorer_tx_url(&signature),
            signature,
            address: address.to_string(),
            amount: format_units_u64(lamports, self.config.decimals),
            network: self.config.name.clone(),
        })
    }

    async fn send_token(&self, request: &TokenSendRequest) -> Result<SendReceipt, WalletError> {
        let keypair = self.keypair_for(&request.private_key, &request.from)?;
        let owner = keypair.pubkey();
        let recipient = address_to_bytes(&request.to)?;
        let mint = address_to_bytes(&request.token)?;

        let decimals = self.mint_decimals(&request.token).await?;
        let amount = parse_units_u64(&request.amount, decimals)?;
        ensure_positive(&request.amount, amount == 0)?;

        let source = derive_associated_token_address(&owner, &mint)?;
        let destination = derive_associated_token_address(&recipient, &mint)?;

        let source_address = chain_sol::bytes_to_address(&source);
        let held = match self
            .rpc
            .call::<WithContext<TokenAmount>>("getTokenAccountBalance", json!([source_address]))
            .await
        {
            Ok(balance) => balance.value.units()?,
            // The node answers with an RPC error when the account does not exist.
            Err(ProviderError::Rpc { code, message }) => {
                warn!(code, %message, account = %source_address, "no source token account");
                0
            }
            Err(e) => return Err(e.into()),
        };
        if held < amount {
            return Err(WalletError::InsufficientFunds {
                available: format_units_u64(held, decimals),
                required: format_units_u64(amount, decimals),
                shortfall: format_units_u64(amount - held, decimals),
                unit: "tokens".into(),
            });
        }

        let lamports = self.lamports(&request.from).await?;
        if lamports < SIGNATURE_FEE_LAMPORTS {
            return Err(self.insufficient_sol(lamports, SIGNATURE_FEE_LAMPORTS));
        }

        info!(network = %self.config.name, mint = %request.token, to = %request.to, amount, "sending token");

        let instructions = [
            build_create_ata_idempotent(&owner, &recipient, &mint)?,
            build_transfer_checked(&source, &mint, &destination, &owner, amount, decimals)?,
        ];
        let blockhash = self.latest_blockhash().await?;
        let tx = compile_transaction(&instructions, &owner, &blockhash)?;
        let wire = sign_transaction(&tx, &keypair)?;
        let signature = self.submit(&wire).await?;
        info!(network = %self.config.name, %signature, "token transfer accepted");

        Ok(SendReceipt {
            explorer_url: self.explorer_tx_url(&signature),
            tx_hash: signature,
            from: request.from.clone(),
            to: request.to.clone(),
            amount: format_units_u64(amount, decimals),
            fee: Some(format_units_u64(SIGNATURE_FEE_LAMPORTS, self.config.decimals)),
            network: self.config.name.clone(),
            token: Some(request.token.clone()),
            ..Default::default()
        })
    }
}
