//! Multi-chain testnet wallet toolkit.
//!
//! A [`ChainWallet`] is opened for one configured network and exposes key
//! generation, balance queries and transaction submission through
//! [`ChainHandler`]. Bitcoin and Litecoin sends go through greedy coin
//! selection and PSBT assembly in `chain-utxo`; EVM, Tron and Solana sends
//! are single signed transactions built by their chain crates.

pub mod config;
pub mod error;
pub mod handlers;
pub mod hd_derivation;
pub mod mnemonic;
pub mod providers;
pub mod response;
pub mod types;
pub mod units;

pub use config::WalletConfig;
pub use error::WalletError;
pub use handlers::{list_networks, ChainHandler, ChainWallet};
pub use response::envelope;
pub use types::{
    AirdropReceipt, Balance, FaucetInfo, GasPrice, MetaMaskConfig, NativeCurrency, NetworkInfo,
    NetworkSummary, SendReceipt, SendRequest, TokenBalance, TokenInfo, TokenSendRequest,
    TransactionStatus, TxState, UtxoList, WalletKeys,
};
