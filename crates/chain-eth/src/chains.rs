use serde::Serialize;

/// Definition of an EVM-compatible test network.
#[derive(Debug, Clone, Serialize)]
pub struct EvmChain {
    /// Lookup key, e.g. `ethereum_sepolia`.
    pub key: &'static str,
    pub chain_id: u64,
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
    pub rpc_url: &'static str,
    pub explorer_url: &'static str,
    pub faucets: &'static [&'static str],
}

pub const ETHEREUM_SEPOLIA: EvmChain = EvmChain {
    key: "ethereum_sepolia",
    chain_id: 11_155_111,
    name: "Ethereum Sepolia",
    symbol: "ETH",
    decimals: 18,
    rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
    explorer_url: "https://sepolia.etherscan.io",
    faucets: &["https://sepoliafaucet.com/", "https://www.infura.io/faucet/sepolia"],
};

pub const POLYGON_AMOY: EvmChain = EvmChain {
    key: "polygon_amoy",
    chain_id: 80_002,
    name: "Polygon Amoy",
    symbol: "POL",
    decimals: 18,
    rpc_url: "https://rpc-amoy.polygon.technology",
    explorer_url: "https://amoy.polygonscan.com",
    faucets: &["https://faucet.polygon.technology/"],
};

pub const ARBITRUM_SEPOLIA: EvmChain = EvmChain {
    key: "arbitrum_sepolia",
    chain_id: 421_614,
    name: "Arbitrum Sepolia",
    symbol: "ETH",
    decimals: 18,
    rpc_url: "https://arbitrum-sepolia-rpc.publicnode.com",
    explorer_url: "https://sepolia.arbiscan.io",
    faucets: &["https://faucet.quicknode.com/arbitrum/sepolia"],
};

pub const CRONOS_TESTNET: EvmChain = EvmChain {
    key: "cronos_testnet",
    chain_id: 338,
    name: "Cronos Testnet",
    symbol: "TCRO",
    decimals: 18,
    rpc_url: "https://evm-t3.cronos.org",
    explorer_url: "https://explorer.cronos.org/testnet",
    faucets: &["https://cronos.org/faucet"],
};

pub const BASE_SEPOLIA: EvmChain = EvmChain {
    key: "base_sepolia",
    chain_id: 84_532,
    name: "Base Sepolia",
    symbol: "ETH",
    decimals: 18,
    rpc_url: "https://base-sepolia-rpc.publicnode.com",
    explorer_url: "https://sepolia.basescan.org",
    faucets: &["https://www.alchemy.com/faucets/base-sepolia"],
};

pub const BNB_TESTNET: EvmChain = EvmChain {
    key: "bnb_testnet",
    chain_id: 97,
    name: "BNB Smart Chain Testnet",
    symbol: "tBNB",
    decimals: 18,
    rpc_url: "https://bsc-testnet.public.blastapi.io",
    explorer_url: "https://testnet.bscscan.com",
    faucets: &["https://testnet.bnbchain.org/faucet-smart"],
};

pub const AVALANCHE_FUJI: EvmChain = EvmChain {
    key: "avalanche_fuji",
    chain_id: 43_113,
    name: "Avalanche Fuji",
    symbol: "AVAX",
    decimals: 18,
    rpc_url: "https://ava-testnet.public.blastapi.io/ext/bc/C/rpc",
    explorer_url: "https://testnet.snowtrace.io",
    faucets: &["https://core.app/tools/testnet-faucet/"],
};

pub const CELO_ALFAJORES: EvmChain = EvmChain {
    key: "celo_alfajores",
    chain_id: 44_787,
    name: "Celo Alfajores",
    symbol: "CELO",
    decimals: 18,
    rpc_url: "https://alfajores-forno.celo-testnet.org",
    explorer_url: "https://alfajores.celoscan.io",
    faucets: &["https://faucet.celo.org/alfajores"],
};

/// Every built-in EVM test network.
pub const TESTNET_CHAINS: &[EvmChain] = &[
    ETHEREUM_SEPOLIA,
    POLYGON_AMOY,
    ARBITRUM_SEPOLIA,
    CRONOS_TESTNET,
    BASE_SEPOLIA,
    BNB_TESTNET,
    AVALANCHE_FUJI,
    CELO_ALFAJORES,
];

pub fn chain_by_key(key: &str) -> Option<&'static EvmChain> {
    TESTNET_CHAINS.iter().find(|c| c.key == key)
}

pub fn chain_by_id(chain_id: u64) -> Option<&'static EvmChain> {
    TESTNET_CHAINS.iter().find(|c| c.chain_id == chain_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn chain_ids_and_keys_are_unique() {
        let ids: HashSet<u64> = TESTNET_CHAINS.iter().map(|c| c.chain_id).collect();
        let keys: HashSet<&str> = TESTNET_CHAINS.iter().map(|c| c.key).collect();
        assert_eq!(ids.len(), TESTNET_CHAINS.len());
        assert_eq!(keys.len(), TESTNET_CHAINS.len());
    }

    #[test]
    fn lookups() {
        assert_eq!(chain_by_key("polygon_amoy").unwrap().chain_id, 80_002);
        assert_eq!(chain_by_id(97).unwrap().symbol, "tBNB");
        assert!(chain_by_key("ethereum_mainnet").is_none());
    }

    #[test]
    fn every_chain_has_https_endpoints_and_a_faucet() {
        for chain in TESTNET_CHAINS {
            assert!(chain.rpc_url.starts_with("https://"), "{}", chain.key);
            assert!(chain.explorer_url.starts_with("https://"), "{}", chain.key);
            assert!(!chain.faucets.is_empty(), "{}", chain.key);
            assert_eq!(chain.decimals, 18);
        }
    }
}
