//! UTXO chain support (Bitcoin and Litecoin testnets) for the wallet.
//!
//! Provides legacy P2PKH key and address handling, in-order coin selection
//! with a flat fee policy, and PSBT assembly and signing over full parent
//! transactions.

pub mod address;
pub mod error;
pub mod keys;
pub mod network;
pub mod transaction;
pub mod utxo;
