//! Tron chain support for the wallet.
//!
//! Tron reuses secp256k1 keys and the EVM ABI, but encodes addresses as
//! base58check with a `0x41` prefix and signs the SHA-256 transaction id
//! produced by the node.

pub mod address;
pub mod error;
pub mod transaction;
pub mod trc20;
