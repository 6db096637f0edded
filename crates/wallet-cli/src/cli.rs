use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Testnet wallet for Bitcoin, Litecoin, EVM chains, Tron and Solana.
///
/// Every command prints a JSON object with a `success` flag on stdout;
/// logs go to stderr (`RUST_LOG` overrides the level).
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML file overriding or extending the built-in networks
    #[arg(long, global = true, env = "WALLET_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct NetworkArg {
    /// Network key, e.g. bitcoin, litecoin, ethereum_sepolia, tron, solana
    #[arg(short, long)]
    pub network: String,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub target: NetworkArg,

    #[arg(long)]
    pub from: String,

    #[arg(long)]
    pub to: String,

    /// Amount in display units, e.g. 0.0012
    #[arg(long)]
    pub amount: String,

    /// WIF, hex or Solana keypair depending on the network
    #[arg(long, env = "WALLET_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List configured networks
    Networks,

    /// Create a random wallet
    Generate(NetworkArg),

    /// Derive the first account of a mnemonic (a new one if omitted)
    FromMnemonic {
        #[command(flatten)]
        target: NetworkArg,

        #[arg(long, env = "WALLET_MNEMONIC", hide_env_values = true)]
        mnemonic: Option<String>,
    },

    /// Show the address controlled by a private key
    Import {
        #[command(flatten)]
        target: NetworkArg,

        #[arg(long, env = "WALLET_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,
    },

    /// Check an address against the network's format
    Validate {
        #[command(flatten)]
        target: NetworkArg,

        address: String,
    },

    /// Native balance of an address
    Balance {
        #[command(flatten)]
        target: NetworkArg,

        address: String,
    },

    /// Unspent outputs of an address (Bitcoin, Litecoin)
    Utxos {
        #[command(flatten)]
        target: NetworkArg,

        address: String,
    },

    /// Send the native coin
    Send(SendArgs),

    /// Confirmation state of a transaction
    Status {
        #[command(flatten)]
        target: NetworkArg,

        tx_hash: String,
    },

    /// Faucets for funding a testnet address
    Faucet(NetworkArg),

    /// Token balance (ERC-20, TRC-20 or SPL mint)
    TokenBalance {
        #[command(flatten)]
        target: NetworkArg,

        address: String,

        token: String,
    },

    /// Send a token (ERC-20, TRC-20 or SPL mint)
    TokenSend {
        #[command(flatten)]
        send: SendArgs,

        /// Contract or mint address
        #[arg(long)]
        token: String,
    },

    /// Name, symbol, decimals and supply of a token
    TokenInfo {
        #[command(flatten)]
        target: NetworkArg,

        /// Contract or mint address
        token: String,
    },

    /// Current gas price (EVM)
    GasPrice(NetworkArg),

    /// Chain id, head block and gas price as reported by the RPC node (EVM)
    NetworkInfo(NetworkArg),

    /// `wallet_addEthereumChain` parameters for MetaMask (EVM)
    MetamaskConfig(NetworkArg),

    /// Ask the cluster for test SOL (Solana devnet/testnet)
    Airdrop {
        #[command(flatten)]
        target: NetworkArg,

        address: String,

        /// Amount in SOL
        #[arg(long, default_value = "1")]
        amount: String,
    },
}

impl Command {
    /// Network the command runs against; `None` for `networks`.
    pub fn network(&self) -> Option<&str> {
        let target = match self {
            Command::Networks => return None,
            Command::Generate(t)
            | Command::Faucet(t)
            | Command::GasPrice(t)
            | Command::NetworkInfo(t)
            | Command::MetamaskConfig(t) => t,
            Command::FromMnemonic { target, .. }
            | Command::Import { target, .. }
            | Command::Validate { target, .. }
            | Command::Balance { target, .. }
            | Command::Utxos { target, .. }
            | Command::Status { target, .. }
            | Command::TokenBalance { target, .. }
            | Command::TokenInfo { target, .. }
            | Command::Airdrop { target, .. } => target,
            Command::Send(send) | Command::TokenSend { send, .. } => &send.target,
        };
        Some(&target.network)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_send() {
        let cli = Cli::try_parse_from([
            "testnet-wallet",
            "send",
            "--network",
            "bitcoin",
            "--from",
            "mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r",
            "--to",
            "mipcBbFg9gMiCh81Kj8tqqdgoZub1ZJRfn",
            "--amount",
            "0.0012",
            "--private-key",
            "cMahea7zqjxrtgAbB7LSGbcQUr1uX1ojuat9jZodMN87JcbXMTcA",
        ])
        .unwrap();
        assert_eq!(cli.command.network(), Some("bitcoin"));
        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.amount, "0.0012");
    }

    #[test]
    fn airdrop_defaults_to_one_sol() {
        let cli = Cli::try_parse_from([
            "testnet-wallet",
            "airdrop",
            "-n",
            "solana",
            "Owner111",
        ])
        .unwrap();
        assert_eq!(cli.command.network(), Some("solana"));
        let Command::Airdrop { address, amount, .. } = cli.command else {
            panic!("expected airdrop");
        };
        assert_eq!(address, "Owner111");
        assert_eq!(amount, "1");
    }

    #[test]
    fn parses_evm_queries() {
        for sub in ["gas-price", "network-info", "metamask-config"] {
            let cli = Cli::try_parse_from(["testnet-wallet", sub, "-n", "polygon_amoy"]).unwrap();
            assert_eq!(cli.command.network(), Some("polygon_amoy"));
        }
        let cli = Cli::try_parse_from(["testnet-wallet", "token-info", "-n", "tron", "TToken"]).unwrap();
        assert!(matches!(cli.command, Command::TokenInfo { ref token, .. } if token == "TToken"));
    }

    #[test]
    fn parses_token_balance_positionals() {
        let cli = Cli::try_parse_from([
            "testnet-wallet",
            "token-balance",
            "-n",
            "solana",
            "Owner111",
            "Mint111",
        ])
        .unwrap();
        let Command::TokenBalance { address, token, .. } = cli.command else {
            panic!("expected token-balance");
        };
        assert_eq!(address, "Owner111");
        assert_eq!(token, "Mint111");
    }

    #[test]
    fn networks_needs_no_network() {
        let cli = Cli::try_parse_from(["testnet-wallet", "networks"]).unwrap();
        assert!(cli.command.network().is_none());
    }

    #[test]
    fn config_flag_is_global() {
        let cli =
            Cli::try_parse_from(["testnet-wallet", "faucet", "-n", "tron", "--config", "w.toml"])
                .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("w.toml")));
    }
}
