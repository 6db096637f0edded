use serde::{Deserialize, Serialize};

/// Base58 and bech32 parameters of a UTXO chain.
///
/// Values are plain data so that additional chains can be described in
/// configuration without code changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoNetwork {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    pub pubkey_hash: u8,
    pub script_hash: u8,
    pub wif: u8,
    pub bech32_hrp: String,
    /// BIP-44 coin type used for mnemonic derivation.
    pub coin_type: u32,
}

fn default_decimals() -> u8 {
    8
}

impl UtxoNetwork {
    pub fn bitcoin_testnet() -> Self {
        Self {
            name: "Bitcoin Testnet".into(),
            symbol: "tBTC".into(),
            decimals: 8,
            pubkey_hash: 0x6f,
            script_hash: 0xc4,
            wif: 0xef,
            bech32_hrp: "tb".into(),
            coin_type: 1,
        }
    }

    pub fn litecoin_testnet() -> Self {
        Self {
            name: "Litecoin Testnet".into(),
            symbol: "tLTC".into(),
            decimals: 8,
            pubkey_hash: 0x6f,
            script_hash: 0x3a,
            wif: 0xef,
            bech32_hrp: "tltc".into(),
            coin_type: 2,
        }
    }

    /// BIP-44 path of the first receive address.
    pub fn derivation_path(&self) -> String {
        format!("m/44'/{}'/0'/0/0", self.coin_type)
    }
}

impl std::fmt::Display for UtxoNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}
