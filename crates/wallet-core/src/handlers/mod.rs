//! Per-family wallet handlers and the dispatch enum over them.

pub mod evm;
pub mod solana;
pub mod tron;
pub mod utxo;

use async_trait::async_trait;

use crate::config::{NetworkConfig, WalletConfig};
use crate::error::WalletError;
use crate::types::{
    AirdropReceipt, Balance, FaucetInfo, GasPrice, MetaMaskConfig, NetworkInfo, NetworkSummary,
    SendReceipt, SendRequest, TokenBalance, TokenInfo, TokenSendRequest, TransactionStatus,
    UtxoList, WalletKeys,
};

pub use evm::EvmWallet;
pub use solana::SolanaWallet;
pub use tron::TronWallet;
pub use utxo::UtxoWallet;

/// Operations every network supports, plus optional capabilities that
/// default to [`WalletError::Unsupported`].
#[async_trait]
pub trait ChainHandler: Send + Sync {
    /// Human-readable network name, e.g. "Bitcoin Testnet".
    fn network_name(&self) -> &str;

    fn generate_wallet(&self) -> Result<WalletKeys, WalletError>;

    /// Derive the first account from `phrase`, or from a fresh 12-word
    /// mnemonic when none is given.
    fn wallet_from_mnemonic(&self, phrase: Option<&str>) -> Result<WalletKeys, WalletError>;

    fn import_private_key(&self, private_key: &str) -> Result<WalletKeys, WalletError>;

    fn validate_address(&self, address: &str) -> bool;

    async fn get_balance(&self, address: &str) -> Result<Balance, WalletError>;

    async fn send_native(&self, request: &SendRequest) -> Result<SendReceipt, WalletError>;

    async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, WalletError>;

    fn faucet_info(&self) -> FaucetInfo;

    async fn unspent_outputs(&self, _address: &str) -> Result<UtxoList, WalletError> {
        Err(WalletError::Unsupported("Listing unspent outputs".into()))
    }

    async fn token_balance(
        &self,
        _address: &str,
        _token: &str,
    ) -> Result<TokenBalance, WalletError> {
        Err(WalletError::Unsupported("Token balances".into()))
    }

    async fn send_token(&self, _request: &TokenSendRequest) -> Result<SendReceipt, WalletError> {
        Err(WalletError::Unsupported("Token transfers".into()))
    }

    async fn token_info(&self, _token: &str) -> Result<TokenInfo, WalletError> {
        Err(WalletError::Unsupported("Token info".into()))
    }

    async fn gas_price(&self) -> Result<GasPrice, WalletError> {
        Err(WalletError::Unsupported("Gas price".into()))
    }

    async fn network_info(&self) -> Result<NetworkInfo, WalletError> {
        Err(WalletError::Unsupported("Network info".into()))
    }

    fn metamask_config(&self) -> Result<MetaMaskConfig, WalletError> {
        Err(WalletError::Unsupported("MetaMask configuration".into()))
    }

    /// Faucet funding straight from the cluster, devnet and testnet only.
    async fn request_airdrop(
        &self,
        _address: &str,
        _amount: &str,
    ) -> Result<AirdropReceipt, WalletError> {
        Err(WalletError::Unsupported("Airdrops".into()))
    }
}

/// A wallet for one configured network.
///
/// The variant is fixed when the wallet is opened; every call is a `match`
/// onto the family's handler.
pub enum ChainWallet {
    Utxo(UtxoWallet),
    Evm(EvmWallet),
    Tron(TronWallet),
    Solana(SolanaWallet),
}

impl ChainWallet {
    /// Open the wallet for `network_key`. Each wallet gets its own HTTP
    /// client with the configured timeout.
    pub fn open(network_key: &str, config: &WalletConfig) -> Result<Self, WalletError> {
        let wallet = match config.network(network_key)? {
            NetworkConfig::Utxo(c) => ChainWallet::Utxo(UtxoWallet::new(c, &config.http)?),
            NetworkConfig::Evm(c) => ChainWallet::Evm(EvmWallet::new(c, &config.http)?),
            NetworkConfig::Tron(c) => ChainWallet::Tron(TronWallet::new(c, &config.http)?),
            NetworkConfig::Solana(c) => ChainWallet::Solana(SolanaWallet::new(c, &config.http)?),
        };
        Ok(wallet)
    }

    fn handler(&self) -> &dyn ChainHandler {
        match self {
            ChainWallet::Utxo(w) => w,
            ChainWallet::Evm(w) => w,
            ChainWallet::Tron(w) => w,
            ChainWallet::Solana(w) => w,
        }
    }
}

#[async_trait]
impl ChainHandler for ChainWallet {
    fn network_name(&self) -> &str {
        self.handler().network_name()
    }

    fn generate_wallet(&self) -> Result<WalletKeys, WalletError> {
        self.handler().generate_wallet()
    }

    fn wallet_from_mnemonic(&self, phrase: Option<&str>) -> Result<WalletKeys, WalletError> {
        self.handler().wallet_from_mnemonic(phrase)
    }

    fn import_private_key(&self, private_key: &str) -> Result<WalletKeys, WalletError> {
        self.handler().import_private_key(private_key)
    }

    fn validate_address(&self, address: &str) -> bool {
        self.handler().validate_address(address)
    }

    async fn get_balance(&self, address: &str) -> Result<Balance, WalletError> {
        self.handler().get_balance(address).await
    }

    async fn send_native(&self, request: &SendRequest) -> Result<SendReceipt, WalletError> {
        self.handler().send_native(request).await
    }

    async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, WalletError> {
        self.handler().transaction_status(tx_hash).await
    }

    fn faucet_info(&self) -> FaucetInfo {
        self.handler().faucet_info()
    }

    async fn unspent_outputs(&self, address: &str) -> Result<UtxoList, WalletError> {
        self.handler().unspent_outputs(address).await
    }

    async fn token_balance(&self, address: &str, token: &str) -> Result<TokenBalance, WalletError> {
        self.handler().token_balance(address, token).await
    }

    async fn send_token(&self, request: &TokenSendRequest) -> Result<SendReceipt, WalletError> {
        self.handler().send_token(request).await
    }

    async fn token_info(&self, token: &str) -> Result<TokenInfo, WalletError> {
        self.handler().token_info(token).await
    }

    async fn gas_price(&self) -> Result<GasPrice, WalletError> {
        self.handler().gas_price().await
    }

    async fn network_info(&self) -> Result<NetworkInfo, WalletError> {
        self.handler().network_info().await
    }

    fn metamask_config(&self) -> Result<MetaMaskConfig, WalletError> {
        self.handler().metamask_config()
    }

    async fn request_airdrop(&self, address: &str, amount: &str) -> Result<AirdropReceipt, WalletError> {
        self.handler().request_airdrop(address, amount).await
    }
}

/// One entry per configured network, in key order.
pub fn list_networks(config: &WalletConfig) -> Vec<NetworkSummary> {
    config
        .networks
        .iter()
        .map(|(key, network)| NetworkSummary {
            key: key.clone(),
            name: network.name().to_string(),
            family: network.family().to_string(),
            symbol: network.symbol().to_string(),
        })
        .collect()
}

/// Reject a request whose key controls a different address than `from`.
pub(crate) fn ensure_key_matches(derived: &str, requested: &str) -> Result<(), WalletError> {
    if derived == requested.trim() {
        Ok(())
    } else {
        Err(WalletError::KeyMismatch {
            derived: derived.to_string(),
            requested: requested.to_string(),
        })
    }
}

pub(crate) fn ensure_positive(amount: &str, is_zero: bool) -> Result<(), WalletError> {
    if is_zero {
        Err(WalletError::InvalidAmount(format!(
            "{amount:?} must be greater than zero"
        )))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_selects_variant_by_family() {
        let config = WalletConfig::with_defaults();
        assert!(matches!(
            ChainWallet::open("bitcoin", &config).unwrap(),
            ChainWallet::Utxo(_)
        ));
        assert!(matches!(
            ChainWallet::open("litecoin", &config).unwrap(),
            ChainWallet::Utxo(_)
        ));
        assert!(matches!(
            ChainWallet::open("polygon_amoy", &config).unwrap(),
            ChainWallet::Evm(_)
        ));
        assert!(matches!(
            ChainWallet::open("tron", &config).unwrap(),
            ChainWallet::Tron(_)
        ));
        assert!(matches!(
            ChainWallet::open("solana", &config).unwrap(),
            ChainWallet::Solana(_)
        ));
    }

    #[test]
    fn open_unknown_network_fails() {
        let config = WalletConfig::with_defaults();
        let err = ChainWallet::open("dogecoin", &config).err().unwrap();
        assert!(matches!(err, WalletError::UnknownNetwork { .. }));
    }

    #[test]
    fn network_name_comes_from_config() {
        let config = WalletConfig::with_defaults();
        let wallet = ChainWallet::open("tron", &config).unwrap();
        assert_eq!(wallet.network_name(), "Tron Shasta Testnet");
        assert_eq!(wallet.faucet_info().symbol, "TRX");
    }

    #[tokio::test]
    async fn utxo_networks_have_no_tokens() {
        let config = WalletConfig::with_defaults();
        let wallet = ChainWallet::open("bitcoin", &config).unwrap();
        let err = wallet.token_balance("addr", "token").await.unwrap_err();
        assert_eq!(err.to_string(), "Token balances is not supported on this network");
    }

    #[tokio::test]
    async fn account_networks_have_no_utxos() {
        let config = WalletConfig::with_defaults();
        let wallet = ChainWallet::open("solana", &config).unwrap();
        let err = wallet.unspent_outputs("addr").await.unwrap_err();
        assert!(matches!(err, WalletError::Unsupported(_)));
    }

    #[tokio::test]
    async fn evm_only_queries_are_unsupported_elsewhere() {
        let config = WalletConfig::with_defaults();
        let tron = ChainWallet::open("tron", &config).unwrap();
        assert!(matches!(tron.metamask_config(), Err(WalletError::Unsupported(_))));
        assert!(matches!(tron.gas_price().await, Err(WalletError::Unsupported(_))));
        assert!(matches!(tron.network_info().await, Err(WalletError::Unsupported(_))));

        let btc = ChainWallet::open("bitcoin", &config).unwrap();
        assert!(matches!(btc.token_info("x").await, Err(WalletError::Unsupported(_))));
        let err = btc.request_airdrop("addr", "1").await.unwrap_err();
        assert_eq!(err.to_string(), "Airdrops is not supported on this network");
    }

    #[test]
    fn metamask_config_dispatches_to_evm() {
        let config = WalletConfig::with_defaults();
        let wallet = ChainWallet::open("ethereum_sepolia", &config).unwrap();
        let mm = wallet.metamask_config().unwrap();
        assert_eq!(mm.chain_id, "0xaa36a7");
        assert_eq!(mm.chain_name, wallet.network_name());
    }

    #[test]
    fn list_networks_covers_config() {
        let config = WalletConfig::with_defaults();
        let networks = list_networks(&config);
        assert_eq!(networks.len(), config.networks.len());
        let btc = networks.iter().find(|n| n.key == "bitcoin").unwrap();
        assert_eq!(btc.family, "utxo");
        assert_eq!(btc.symbol, "tBTC");
    }

    #[test]
    fn key_mismatch_is_reported() {
        assert!(ensure_key_matches("abc", "abc").is_ok());
        assert!(ensure_key_matches("abc", " abc ").is_ok());
        let err = ensure_key_matches("abc", "xyz").unwrap_err();
        assert!(matches!(err, WalletError::KeyMismatch { .. }));
    }
}
