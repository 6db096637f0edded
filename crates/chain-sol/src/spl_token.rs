//! SPL Token instructions and associated token account derivation, without
//! the `spl-token` or `spl-associated-token-account` crates.

use sha2::{Digest, Sha256};

use crate::error::SolError;
use crate::transaction::{SolAccountMeta, SolInstruction, SYSTEM_PROGRAM_ID};

/// `TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA`
pub const TOKEN_PROGRAM_ID: [u8; 32] = [
    0x06, 0xdd, 0xf6, 0xe1, 0xd7, 0x65, 0xa1, 0x93, 0xd9, 0xcb, 0xe1, 0x46, 0xce, 0xeb, 0x79, 0xac,
    0x1c, 0xb4, 0x85, 0xed, 0x5f, 0x5b, 0x37, 0x91, 0x3a, 0x8c, 0xf5, 0x85, 0x7e, 0xff, 0x00, 0xa9,
];

/// `ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL`
pub const ASSOCIATED_TOKEN_PROGRAM_ID: [u8; 32] = [
    0x8c, 0x97, 0x25, 0x8f, 0x4e, 0x24, 0x89, 0xf1, 0xbb, 0x3d, 0x10, 0x29, 0x14, 0x8e, 0x0d, 0x83,
    0x0b, 0x5a, 0x13, 0x99, 0xda, 0xff, 0x10, 0x84, 0x04, 0x8e, 0x7b, 0xd8, 0xdb, 0xe9, 0xf8, 0x59,
];

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

const TRANSFER_CHECKED_IX: u8 = 12;
const CREATE_IDEMPOTENT_IX: u8 = 1;

/// Token program `TransferChecked`.
///
/// Data is `[12] || amount (u64 LE) || decimals`. The program rejects the
/// instruction if `decimals` does not match the mint.
pub fn build_transfer_checked(
    source: &[u8; 32],
    mint: &[u8; 32],
    destination: &[u8; 32],
    owner: &[u8; 32],
    amount: u64,
    decimals: u8,
) -> Result<SolInstruction, SolError> {
    if amount == 0 {
        return Err(SolError::TransactionBuildError(
            "token transfer amount must be > 0".into(),
        ));
    }

    let mut data = Vec::with_capacity(10);
    data.push(TRANSFER_CHECKED_IX);
    data.extend_from_slice(&amount.to_le_bytes());
    data.push(decimals);

    Ok(SolInstruction {
        program_id: TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*source, false),
            SolAccountMeta::readonly(*mint, false),
            SolAccountMeta::writable(*destination, false),
            SolAccountMeta::readonly(*owner, true),
        ],
        data,
    })
}

/// Associated token account program `CreateIdempotent`.
///
/// Creates `wallet`'s account for `mint` if it does not exist yet and is a
/// no-op otherwise, so it can be prepended to every token transfer.
pub fn build_create_ata_idempotent(
    payer: &[u8; 32],
    wallet: &[u8; 32],
    mint: &[u8; 32],
) -> Result<SolInstruction, SolError> {
    let ata = derive_associated_token_address(wallet, mint)?;

    Ok(SolInstruction {
        program_id: ASSOCIATED_TOKEN_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*payer, true),
            SolAccountMeta::writable(ata, false),
            SolAccountMeta::readonly(*wallet, false),
            SolAccountMeta::readonly(*mint, false),
            SolAccountMeta::readonly(SYSTEM_PROGRAM_ID, false),
            SolAccountMeta::readonly(TOKEN_PROGRAM_ID, false),
        ],
        data: vec![CREATE_IDEMPOTENT_IX],
    })
}

/// Associated token account of `wallet` for `mint`.
///
/// Seeds are `[wallet, token_program_id, mint]` under the associated token
/// account program.
pub fn derive_associated_token_address(
    wallet: &[u8; 32],
    mint: &[u8; 32],
) -> Result<[u8; 32], SolError> {
    find_program_address(
        &[wallet.as_ref(), &TOKEN_PROGRAM_ID, mint.as_ref()],
        &ASSOCIATED_TOKEN_PROGRAM_ID,
    )
    .map(|(address, _bump)| address)
}

/// First bump from 255 down whose derived address is off the curve.
fn find_program_address(
    seeds: &[&[u8]],
    program_id: &[u8; 32],
) -> Result<([u8; 32], u8), SolError> {
    for bump in (0u8..=255).rev() {
        if let Some(address) = try_create_program_address(seeds, bump, program_id) {
            return Ok((address, bump));
        }
    }

    Err(SolError::InvalidAddress(
        "could not find valid PDA bump seed".into(),
    ))
}

fn try_create_program_address(seeds: &[&[u8]], bump: u8, program_id: &[u8; 32]) -> Option<[u8; 32]> {
    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id);
    hasher.update(PDA_MARKER);

    let hash: [u8; 32] = hasher.finalize().into();
    (!is_on_curve(&hash)).then_some(hash)
}

fn is_on_curve(bytes: &[u8; 32]) -> bool {
    curve25519_dalek::edwards::CompressedEdwardsY(*bytes)
        .decompress()
        .is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;
    use crate::transaction::compile_transaction;

    #[test]
    fn program_ids_match_their_addresses() {
        assert_eq!(
            address::bytes_to_address(&TOKEN_PROGRAM_ID),
            "TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"
        );
        assert_eq!(
            address::bytes_to_address(&ASSOCIATED_TOKEN_PROGRAM_ID),
            "ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL"
        );
    }

    #[test]
    fn transfer_checked_data() {
        let ix = build_transfer_checked(&[1; 32], &[2; 32], &[3; 32], &[4; 32], 500_000, 6).unwrap();
        assert_eq!(ix.program_id, TOKEN_PROGRAM_ID);
        assert_eq!(ix.data.len(), 10);
        assert_eq!(ix.data[0], 12);
        assert_eq!(u64::from_le_bytes(ix.data[1..9].try_into().unwrap()), 500_000);
        assert_eq!(ix.data[9], 6);
    }

    #[test]
    fn transfer_checked_account_roles() {
        let ix = build_transfer_checked(&[1; 32], &[2; 32], &[3; 32], &[4; 32], 1, 9).unwrap();
        let roles: Vec<(bool, bool)> = ix.accounts.iter().map(|a| (a.is_signer, a.is_writable)).collect();
        assert_eq!(roles, vec![(false, true), (false, false), (false, true), (true, false)]);
        assert_eq!(ix.accounts[1].pubkey, [2; 32]);
    }

    #[test]
    fn transfer_checked_zero_amount_fails() {
        assert!(build_transfer_checked(&[1; 32], &[2; 32], &[3; 32], &[4; 32], 0, 6).is_err());
    }

    #[test]
    fn create_idempotent_layout() {
        let payer = [0x10; 32];
        let wallet = [0x20; 32];
        let mint = [0x30; 32];
        let ix = build_create_ata_idempotent(&payer, &wallet, &mint).unwrap();

        assert_eq!(ix.program_id, ASSOCIATED_TOKEN_PROGRAM_ID);
        assert_eq!(ix.data, vec![1]);
        assert_eq!(ix.accounts.len(), 6);
        assert!(ix.accounts[0].is_signer && ix.accounts[0].is_writable);
        assert_eq!(
            ix.accounts[1].pubkey,
            derive_associated_token_address(&wallet, &mint).unwrap()
        );
        assert_eq!(ix.accounts[4].pubkey, SYSTEM_PROGRAM_ID);
        assert_eq!(ix.accounts[5].pubkey, TOKEN_PROGRAM_ID);
    }

    #[test]
    fn token_send_compiles_with_owner_as_only_signer() {
        let owner = [0x01; 32];
        let recipient = [0x02; 32];
        let mint = [0x03; 32];
        let source = derive_associated_token_address(&owner, &mint).unwrap();
        let dest = derive_associated_token_address(&recipient, &mint).unwrap();

        let create = build_create_ata_idempotent(&owner, &recipient, &mint).unwrap();
        let transfer = build_transfer_checked(&source, &mint, &dest, &owner, 10, 6).unwrap();
        let tx = compile_transaction(&[create, transfer], &owner, &[0; 32]).unwrap();

        assert_eq!(tx.num_required_signatures, 1);
        assert_eq!(tx.account_keys[0], owner);
    }

    #[test]
    fn ata_is_off_curve_and_deterministic() {
        let wallet = [0xAA; 32];
        let mint = [0xBB; 32];
        let a = derive_associated_token_address(&wallet, &mint).unwrap();
        let b = derive_associated_token_address(&wallet, &mint).unwrap();
        assert_eq!(a, b);
        assert!(!is_on_curve(&a));
    }

    #[test]
    fn ata_depends_on_wallet_and_mint() {
        let base = derive_associated_token_address(&[1; 32], &[9; 32]).unwrap();
        assert_ne!(base, derive_associated_token_address(&[2; 32], &[9; 32]).unwrap());
        assert_ne!(base, derive_associated_token_address(&[1; 32], &[8; 32]).unwrap());
    }

    #[test]
    fn curve_check() {
        let basepoint: [u8; 32] = [
            0x58, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
            0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66, 0x66,
            0x66, 0x66, 0x66, 0x66,
        ];
        assert!(is_on_curve(&basepoint));
        assert!(!is_on_curve(&[0x02; 32]));
    }
}
