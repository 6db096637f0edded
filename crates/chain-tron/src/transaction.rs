use k256::ecdsa::signature::hazmat::PrehashSigner;
use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use prost::Message;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::address::{decode_address, ADDRESS_PREFIX};
use crate::error::TronError;

const TRANSFER_CONTRACT: i32 = 1;
const TRIGGER_SMART_CONTRACT: i32 = 31;

// The subset of `protocol.Transaction.raw` the wallet inspects before signing.
#[derive(Clone, PartialEq, Message)]
struct RawTransaction {
    #[prost(message, repeated, tag = "11")]
    contract: Vec<Contract>,
    #[prost(int64, tag = "18")]
    fee_limit: i64,
}

#[derive(Clone, PartialEq, Message)]
struct Contract {
    #[prost(int32, tag = "1")]
    kind: i32,
    #[prost(message, optional, tag = "2")]
    parameter: Option<Any>,
}

#[derive(Clone, PartialEq, Message)]
struct Any {
    #[prost(string, tag = "1")]
    type_url: String,
    #[prost(bytes = "vec", tag = "2")]
    value: Vec<u8>,
}

#[derive(Clone, PartialEq, Message)]
struct TransferContract {
    #[prost(bytes = "vec", tag = "1")]
    owner_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    to_address: Vec<u8>,
    #[prost(int64, tag = "3")]
    amount: i64,
}

#[derive(Clone, PartialEq, Message)]
struct TriggerSmartContract {
    #[prost(bytes = "vec", tag = "1")]
    owner_address: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    contract_address: Vec<u8>,
    #[prost(int64, tag = "3")]
    call_value: i64,
    #[prost(bytes = "vec", tag = "4")]
    data: Vec<u8>,
}

/// What the wallet asked the node to build. Addresses are base58.
#[derive(Debug, Clone)]
pub enum ExpectedContract<'a> {
    Transfer {
        owner: &'a str,
        to: &'a str,
        amount: u64,
    },
    TriggerSmartContract {
        owner: &'a str,
        contract: &'a str,
        data: &'a [u8],
        max_fee_limit: u64,
    },
}

fn mismatch(what: &str) -> TronError {
    TronError::ContractMismatch(what.to_string())
}

fn ensure_address(field: &str, actual: &[u8], expected: &str) -> Result<(), TronError> {
    let raw = decode_address(expected)?;
    if actual.len() != 21 || actual[0] != ADDRESS_PREFIX || actual[1..] != raw {
        return Err(mismatch(&format!("{field} is {}", hex::encode(actual))));
    }
    Ok(())
}

/// Decode the node-built `raw_data_hex` and check its single contract
/// against what was requested: kind, parties, amount or call data, and fee
/// ceiling.
pub fn verify_contract(raw_data_hex: &str, expected: &ExpectedContract<'_>) -> Result<(), TronError> {
    let raw = hex::decode(raw_data_hex)
        .map_err(|e| TronError::EncodingError(format!("invalid raw_data_hex: {e}")))?;
    let tx = RawTransaction::decode(raw.as_slice())
        .map_err(|e| TronError::EncodingError(format!("undecodable raw data: {e}")))?;

    let [contract] = tx.contract.as_slice() else {
        return Err(mismatch(&format!("{} contracts, expected one", tx.contract.len())));
    };
    let parameter = contract
        .parameter
        .as_ref()
        .ok_or_else(|| mismatch("contract has no parameter"))?;

    match *expected {
        ExpectedContract::Transfer { owner, to, amount } => {
            if contract.kind != TRANSFER_CONTRACT {
                return Err(mismatch(&format!("contract type {}", contract.kind)));
            }
            let transfer = TransferContract::decode(parameter.value.as_slice())
                .map_err(|e| TronError::EncodingError(format!("undecodable transfer: {e}")))?;
            ensure_address("owner", &transfer.owner_address, owner)?;
            ensure_address("recipient", &transfer.to_address, to)?;
            if u64::try_from(transfer.amount).ok() != Some(amount) {
                return Err(mismatch(&format!("amount is {}", transfer.amount)));
            }
        }
        ExpectedContract::TriggerSmartContract {
            owner,
            contract: contract_address,
            data,
            max_fee_limit,
        } => {
            if contract.kind != TRIGGER_SMART_CONTRACT {
                return Err(mismatch(&format!("contract type {}", contract.kind)));
            }
            let call = TriggerSmartContract::decode(parameter.value.as_slice())
                .map_err(|e| TronError::EncodingError(format!("undecodable trigger: {e}")))?;
            ensure_address("owner", &call.owner_address, owner)?;
            ensure_address("contract", &call.contract_address, contract_address)?;
            if call.call_value != 0 {
                return Err(mismatch(&format!("call value is {}", call.call_value)));
            }
            if call.data != data {
                return Err(mismatch("call data differs"));
            }
            if u64::try_from(tx.fee_limit).map_or(true, |fee| fee > max_fee_limit) {
                return Err(mismatch(&format!("fee limit is {}", tx.fee_limit)));
            }
        }
    }
    Ok(())
}

/// Check that a node-built transaction id is the SHA-256 of its raw data.
///
/// This only proves the id and `raw_data_hex` agree; [`verify_contract`]
/// checks that the raw data is the requested transaction.
pub fn verify_txid(raw_data_hex: &str, tx_id: &str) -> Result<[u8; 32], TronError> {
    let raw = hex::decode(raw_data_hex)
        .map_err(|e| TronError::EncodingError(format!("invalid raw_data_hex: {e}")))?;
    let computed: [u8; 32] = Sha256::digest(&raw).into();
    let computed_hex = hex::encode(computed);

    if !computed_hex.eq_ignore_ascii_case(tx_id) {
        return Err(TronError::TxIdMismatch {
            returned: tx_id.to_string(),
            computed: computed_hex,
        });
    }
    Ok(computed)
}

/// Sign a 32-byte transaction id.
///
/// Returns the 65-byte `r || s || v` signature as hex, `v = recovery_id + 27`.
pub fn sign_txid(txid: &[u8; 32], private_key: &[u8; 32]) -> Result<String, TronError> {
    let mut key_bytes = *private_key;
    let signing_key = SigningKey::from_bytes((&key_bytes).into())
        .map_err(|e| TronError::InvalidPrivateKey(e.to_string()));
    key_bytes.zeroize();
    let signing_key = signing_key?;

    let (signature, recovery_id): (Signature, RecoveryId) = signing_key
        .sign_prehash(txid)
        .map_err(|e| TronError::SigningError(e.to_string()))?;

    let mut sig = Vec::with_capacity(65);
    sig.extend_from_slice(&signature.r().to_bytes());
    sig.extend_from_slice(&signature.s().to_bytes());
    sig.push(recovery_id.to_byte() + 27);
    Ok(hex::encode(sig))
}
