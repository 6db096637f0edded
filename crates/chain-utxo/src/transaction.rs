use std::str::FromStr;

use bitcoin::absolute::LockTime;
use bitcoin::hashes::Hash;
use bitcoin::psbt::Psbt;
use bitcoin::script::{Builder, PushBytesBuf, ScriptBuf};
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::sighash::{EcdsaSighashType, SighashCache};
use bitcoin::transaction::Version;
use bitcoin::{Amount, OutPoint, Sequence, Transaction, TxIn, TxOut, Txid, Witness};

use crate::address::p2pkh_script;
use crate::error::UtxoError;
use crate::keys::compressed_public_key;
use crate::utxo::SpendPlan;

/// Decode a raw transaction from its hex serialization.
pub fn parse_transaction_hex(raw_hex: &str) -> Result<Transaction, UtxoError> {
    let bytes = hex::decode(raw_hex.trim())
        .map_err(|e| UtxoError::TransactionBuildError(format!("invalid transaction hex: {e}")))?;
    bitcoin::consensus::deserialize(&bytes)
        .map_err(|e| UtxoError::TransactionBuildError(format!("invalid transaction: {e}")))
}

/// Hex serialization of a transaction, ready for broadcast.
pub fn to_hex(tx: &Transaction) -> String {
    hex::encode(bitcoin::consensus::serialize(tx))
}

/// Build an unsigned PSBT from a spend plan.
///
/// `parents` must hold the full previous transaction of every selected input,
/// in plan order. Each is attached as `non_witness_utxo` after checking that it
/// hashes to the referenced txid and carries the declared output value.
/// Output 0 pays the target; output 1 returns change when the plan emits it.
pub fn assemble_psbt(
    plan: &SpendPlan,
    parents: Vec<Transaction>,
    recipient: ScriptBuf,
    change: ScriptBuf,
) -> Result<Psbt, UtxoError> {
    if parents.len() != plan.selected_inputs.len() {
        return Err(UtxoError::TransactionBuildError(format!(
            "expected {} parent transactions, got {}",
            plan.selected_inputs.len(),
            parents.len()
        )));
    }

    let mut inputs = Vec::with_capacity(parents.len());
    for (utxo, parent) in plan.selected_inputs.iter().zip(&parents) {
        let txid = Txid::from_str(&utxo.transaction_id)
            .map_err(|e| UtxoError::TransactionBuildError(format!("invalid txid: {e}")))?;

        let parent_txid = parent.compute_txid();
        if parent_txid != txid {
            return Err(UtxoError::TransactionBuildError(format!(
                "parent transaction {parent_txid} does not match input {txid}"
            )));
        }

        let spent = parent.output.get(utxo.output_index as usize).ok_or_else(|| {
            UtxoError::TransactionBuildError(format!(
                "parent {txid} has no output {}",
                utxo.output_index
            ))
        })?;
        if spent.value.to_sat() != utxo.value_satoshis {
            return Err(UtxoError::TransactionBuildError(format!(
                "output {txid}:{} holds {} sat, indexer reported {}",
                utxo.output_index,
                spent.value.to_sat(),
                utxo.value_satoshis
            )));
        }

        inputs.push(TxIn {
            previous_output: OutPoint::new(txid, utxo.output_index),
            script_sig: ScriptBuf::new(),
            sequence: Sequence::MAX,
            witness: Witness::default(),
        });
    }

    let mut outputs = vec![TxOut {
        value: Amount::from_sat(plan.target_value),
        script_pubkey: recipient,
    }];
    if let Some(change_value) = plan.change_output() {
        outputs.push(TxOut {
            value: Amount::from_sat(change_value),
            script_pubkey: change,
        });
    }

    let tx = Transaction {
        version: Version::TWO,
        lock_time: LockTime::ZERO,
        input: inputs,
        output: outputs,
    };

    let mut psbt = Psbt::from_unsigned_tx(tx)
        .map_err(|e| UtxoError::TransactionBuildError(format!("psbt creation failed: {e}")))?;
    for (input, parent) in psbt.inputs.iter_mut().zip(parents) {
        input.non_witness_utxo = Some(parent);
    }

    Ok(psbt)
}

/// Sign and finalize every input of `psbt` with a single P2PKH key.
///
/// Every spent output must be locked to the key's P2PKH script; inputs owned
/// by anything else are rejected rather than left unsigned.
pub fn sign_p2pkh(psbt: &mut Psbt, secret: &SecretKey) -> Result<(), UtxoError> {
    let secp = Secp256k1::new();
    let pubkey = bitcoin::PublicKey::new(PublicKey::from_secret_key(&secp, secret));
    let own_script = p2pkh_script(&compressed_public_key(secret));

    let unsigned = psbt.unsigned_tx.clone();
    let cache = SighashCache::new(&unsigned);

    for (index, input) in psbt.inputs.iter_mut().enumerate() {
        let prevout = unsigned.input[index].previous_output;
        let parent = input.non_witness_utxo.as_ref().ok_or_else(|| {
            UtxoError::SigningError(format!("input {index} has no parent transaction"))
        })?;
        let spent = parent.output.get(prevout.vout as usize).ok_or_else(|| {
            UtxoError::SigningError(format!("input {index} references a missing output"))
        })?;
        if spent.script_pubkey != own_script {
            return Err(UtxoError::SigningError(format!(
                "input {index} is not locked to the signing key"
            )));
        }

        let sighash = cache
            .legacy_signature_hash(index, &own_script, EcdsaSighashType::All.to_u32())
            .map_err(|e| UtxoError::SigningError(format!("sighash computation failed: {e}")))?;
        let msg = Message::from_digest(sighash.to_byte_array());
        let signature = bitcoin::ecdsa::Signature::sighash_all(secp.sign_ecdsa(&msg, secret));

        let sig_push = PushBytesBuf::try_from(signature.to_vec())
            .map_err(|e| UtxoError::SigningError(format!("signature push failed: {e}")))?;
        let script_sig = Builder::new()
            .push_slice(sig_push)
            .push_key(&pubkey)
            .into_script();

        input.final_script_sig = Some(script_sig);
    }

    Ok(())
}

/// Extract the network transaction from a fully finalized PSBT.
pub fn extract_transaction(psbt: Psbt) -> Result<Transaction, UtxoError> {
    if let Some(index) = psbt
        .inputs
        .iter()
        .position(|input| input.final_script_sig.is_none())
    {
        return Err(UtxoError::SigningError(format!("input {index} is not finalized")));
    }
    Ok(psbt.extract_tx_unchecked_fee_rate())
}
