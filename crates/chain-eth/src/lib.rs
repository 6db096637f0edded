//! Ethereum/EVM chain support for the wallet.
//!
//! This crate provides:
//! - Address derivation from secp256k1 keys with EIP-55 checksums
//! - Legacy (EIP-155) transaction building and signing
//! - ERC-20 call encoding and return-value decoding
//! - The default table of EVM testnets

pub mod abi;
pub mod address;
pub mod chains;
pub mod erc20;
pub mod error;
pub mod transaction;
