//! Network and HTTP configuration.
//!
//! A [`WalletConfig`] is built once at startup, from the built-in testnet
//! table optionally overridden by a TOML file, and is read-only afterwards.
//!
//! ```toml
//! [http]
//! timeout_secs = 15
//!
//! [networks.bitcoin]
//! family = "utxo"
//! name = "Bitcoin Testnet"
//! symbol = "tBTC"
//! pubkey_hash = 0x6f
//! script_hash = 0xc4
//! wif = 0xef
//! bech32_hrp = "tb"
//! coin_type = 1
//! explorer_url = "https://mempool.space/testnet"
//! primary = { kind = "esplora", url = "https://mempool.space/testnet/api" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use chain_eth::chains::TESTNET_CHAINS;
use chain_utxo::network::UtxoNetwork;
use chain_utxo::utxo::FeePolicy;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexerKind {
    Blockcypher,
    Esplora,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerConfig {
    pub kind: IndexerKind,
    pub url: String,
}

impl IndexerConfig {
    fn esplora(url: &str) -> Self {
        Self {
            kind: IndexerKind::Esplora,
            url: url.into(),
        }
    }

    fn blockcypher(url: &str) -> Self {
        Self {
            kind: IndexerKind::Blockcypher,
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtxoNetworkConfig {
    #[serde(flatten)]
    pub params: UtxoNetwork,
    pub primary: IndexerConfig,
    #[serde(default)]
    pub secondary: Option<IndexerConfig>,
    pub explorer_url: String,
    #[serde(default)]
    pub faucets: Vec<String>,
    #[serde(default)]
    pub fee_policy: FeePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvmNetworkConfig {
    pub name: String,
    pub chain_id: u64,
    pub symbol: String,
    #[serde(default = "default_evm_decimals")]
    pub decimals: u8,
    pub rpc_url: String,
    pub explorer_url: String,
    #[serde(default)]
    pub faucets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TronNetworkConfig {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_tron_decimals")]
    pub decimals: u8,
    pub api_url: String,
    pub explorer_url: String,
    #[serde(default)]
    pub faucets: Vec<String>,
    /// Sent as `TRON-PRO-API-KEY` when set.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolanaNetworkConfig {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_solana_decimals")]
    pub decimals: u8,
    pub rpc_url: String,
    pub explorer_url: String,
    /// Appended to explorer links as `?cluster=`.
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub faucets: Vec<String>,
}

fn default_evm_decimals() -> u8 {
    18
}

fn default_tron_decimals() -> u8 {
    6
}

fn default_solana_decimals() -> u8 {
    9
}

/// One configured network, tagged by chain family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum NetworkConfig {
    Utxo(UtxoNetworkConfig),
    Evm(EvmNetworkConfig),
    Tron(TronNetworkConfig),
    Solana(SolanaNetworkConfig),
}

impl NetworkConfig {
    pub fn family(&self) -> &'static str {
        match self {
            NetworkConfig::Utxo(_) => "utxo",
            NetworkConfig::Evm(_) => "evm",
            NetworkConfig::Tron(_) => "tron",
            NetworkConfig::Solana(_) => "solana",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NetworkConfig::Utxo(c) => &c.params.name,
            NetworkConfig::Evm(c) => &c.name,
            NetworkConfig::Tron(c) => &c.name,
            NetworkConfig::Solana(c) => &c.name,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            NetworkConfig::Utxo(c) => &c.params.symbol,
            NetworkConfig::Evm(c) => &c.symbol,
            NetworkConfig::Tron(c) => &c.symbol,
            NetworkConfig::Solana(c) => &c.symbol,
        }
    }

    fn endpoint_urls(&self) -> Vec<&str> {
        match self {
            NetworkConfig::Utxo(c) => {
                let mut urls = vec![c.primary.url.as_str(), c.explorer_url.as_str()];
                if let Some(secondary) = &c.secondary {
                    urls.push(&secondary.url);
                }
                urls
            }
            NetworkConfig::Evm(c) => vec![&c.rpc_url, &c.explorer_url],
            NetworkConfig::Tron(c) => vec![&c.api_url, &c.explorer_url],
            NetworkConfig::Solana(c) => vec![&c.rpc_url, &c.explorer_url],
        }
    }
}

/// Layout of a configuration file; every section is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    http: Option<HttpConfig>,
    networks: BTreeMap<String, NetworkConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletConfig {
    pub http: HttpConfig,
    pub networks: BTreeMap<String, NetworkConfig>,
}

impl WalletConfig {
    /// The built-in testnet table.
    pub fn with_defaults() -> Self {
        let mut networks = BTreeMap::new();

        networks.insert(
            "bitcoin".to_string(),
            NetworkConfig::Utxo(UtxoNetworkConfig {
                params: UtxoNetwork::bitcoin_testnet(),
                primary: IndexerConfig::esplora("https://blockstream.info/testnet/api"),
                secondary: Some(IndexerConfig::esplora("https://mempool.space/testnet/api")),
                explorer_url: "https://blockstream.info/testnet".into(),
                faucets: strings(&[
                    "https://bitcoinfaucet.uo1.net/",
                    "https://testnet-faucet.mempool.co/",
                    "https://coinfaucet.eu/en/btc-testnet/",
                ]),
                fee_policy: FeePolicy::default(),
            }),
        );

        networks.insert(
            "litecoin".to_string(),
            NetworkConfig::Utxo(UtxoNetworkConfig {
                params: UtxoNetwork::litecoin_testnet(),
                primary: IndexerConfig::blockcypher("https://api.blockcypher.com/v1/ltc/test3"),
                secondary: Some(IndexerConfig::esplora("https://litecoinspace.org/testnet/api")),
                explorer_url: "https://litecoinspace.org/testnet".into(),
                faucets: strings(&[
                    "https://cypherfaucet.com/ltc-testnet",
                    "https://litecoinspace.org/testnet",
                ]),
                fee_policy: FeePolicy::default(),
            }),
        );

        networks.insert(
            "tron".to_string(),
            NetworkConfig::Tron(TronNetworkConfig {
                name: "Tron Shasta Testnet".into(),
                symbol: "TRX".into(),
                decimals: 6,
                api_url: "https://api.shasta.trongrid.io".into(),
                explorer_url: "https://shasta.tronscan.org/#".into(),
                faucets: strings(&["https://www.trongrid.io/shasta"]),
                api_key: None,
            }),
        );

        networks.insert(
            "solana".to_string(),
            NetworkConfig::Solana(SolanaNetworkConfig {
                name: "Solana Devnet".into(),
                symbol: "SOL".into(),
                decimals: 9,
                rpc_url: "https://api.devnet.solana.com".into(),
                explorer_url: "https://explorer.solana.com".into(),
                cluster: Some("devnet".into()),
                faucets: strings(&["https://faucet.solana.com", "https://solfaucet.com"]),
            }),
        );

        for chain in TESTNET_CHAINS {
            networks.insert(
                chain.key.to_string(),
                NetworkConfig::Evm(EvmNetworkConfig {
                    name: chain.name.into(),
                    chain_id: chain.chain_id,
                    symbol: chain.symbol.into(),
                    decimals: chain.decimals,
                    rpc_url: chain.rpc_url.into(),
                    explorer_url: chain.explorer_url.into(),
                    faucets: strings(chain.faucets),
                }),
            );
        }

        Self {
            http: HttpConfig::default(),
            networks,
        }
    }

    /// Defaults overlaid with the networks and HTTP settings in `input`.
    ///
    /// A network key present in the file replaces the built-in entry of the
    /// same key entirely; new keys are added.
    pub fn from_toml_str(input: &str) -> Result<Self, WalletError> {
        let file: ConfigFile =
            toml::from_str(input).map_err(|e| WalletError::Config(e.to_string()))?;

        let mut config = Self::with_defaults();
        if let Some(http) = file.http {
            config.http = http;
        }
        config.networks.extend(file.networks);
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| WalletError::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&input)
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.http.timeout_secs == 0 {
            return Err(WalletError::Config("http.timeout_secs must be > 0".into()));
        }
        for (key, network) in &self.networks {
            for url in network.endpoint_urls() {
                if !validate_url(url) {
                    return Err(WalletError::Config(format!(
                        "network {key}: invalid URL {url:?}"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn network(&self, key: &str) -> Result<&NetworkConfig, WalletError> {
        self.networks
            .get(key)
            .ok_or_else(|| WalletError::UnknownNetwork {
                key: key.to_string(),
                available: self.network_keys().collect::<Vec<_>>().join(", "),
            })
    }

    pub fn network_keys(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}
