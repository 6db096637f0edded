//! Solana chain support for the wallet.
//!
//! Address handling, keypair import/export, the compact message wire format,
//! System transfers and SPL token instructions, built by hand on top of
//! `ed25519-dalek` and `bs58` rather than `solana-sdk`.

pub mod address;
pub mod error;
pub mod keypair;
pub mod spl_token;
pub mod transaction;

pub use address::{address_to_bytes, bytes_to_address, validate_address};
pub use error::SolError;
pub use keypair::SolKeypair;
pub use spl_token::{
    build_create_ata_idempotent, build_transfer_checked, derive_associated_token_address,
    ASSOCIATED_TOKEN_PROGRAM_ID, TOKEN_PROGRAM_ID,
};
pub use transaction::{
    build_sol_transfer, compile_transaction, encode_compact_u16, serialize_message,
    sign_transaction, SolAccountMeta, SolInstruction, SolTransaction, SYSTEM_PROGRAM_ID,
};
