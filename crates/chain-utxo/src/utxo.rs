use serde::{Deserialize, Serialize};

use crate::error::UtxoError;

/// Change at or below this value is folded into the fee instead of
/// producing an output.
pub const DUST_THRESHOLD: u64 = 546;

/// A spendable output as reported by a block indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnspentOutput {
    /// Originating transaction id, hex in display order.
    pub transaction_id: String,
    pub output_index: u32,
    pub value_satoshis: u64,
}

/// Flat fee heuristic: a fixed charge per input plus a fixed charge per
/// output, always sized for `assumed_outputs` outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeePolicy {
    pub per_input: u64,
    pub per_output: u64,
    pub assumed_outputs: u64,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            per_input: 1_000,
            per_output: 1_000,
            assumed_outputs: 2,
        }
    }
}

impl FeePolicy {
    /// Fee charged for a transaction spending `inputs` outputs.
    pub fn fee_for(&self, inputs: usize) -> u64 {
        self.per_input
            .saturating_mul(inputs as u64)
            .saturating_add(self.per_output.saturating_mul(self.assumed_outputs))
    }
}

/// Outcome of coin selection for a single send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendPlan {
    /// Inputs in the order they were accumulated.
    pub selected_inputs: Vec<UnspentOutput>,
    pub total_input_value: u64,
    pub target_value: u64,
    pub fee_estimate: u64,
    /// `total_input_value - target_value - fee_estimate`.
    pub change_value: u64,
}

impl SpendPlan {
    /// Value of the change output, if one is emitted.
    pub fn change_output(&self) -> Option<u64> {
        (self.change_value > DUST_THRESHOLD).then_some(self.change_value)
    }

    /// Fee actually paid to miners: the estimate plus any absorbed dust.
    pub fn fee_paid(&self) -> u64 {
        match self.change_output() {
            Some(_) => self.fee_estimate,
            None => self.fee_estimate + self.change_value,
        }
    }

    pub fn inputs_used(&self) -> usize {
        self.selected_inputs.len()
    }
}

/// Accumulate outputs in the given order until they cover the target plus
/// the fee for the inputs selected so far.
///
/// The fee threshold is recomputed after every added input since each input
/// raises the fee. Outputs are never reordered.
pub fn select_coins(
    utxos: &[UnspentOutput],
    target_value: u64,
    policy: &FeePolicy,
) -> Result<SpendPlan, UtxoError> {
    if utxos.is_empty() {
        return Err(UtxoError::NoFunds);
    }
    if target_value == 0 {
        return Err(UtxoError::InvalidAmount("amount must be greater than zero".into()));
    }

    let mut selected = Vec::new();
    let mut total: u64 = 0;

    for utxo in utxos {
        selected.push(utxo.clone());
        total = total
            .checked_add(utxo.value_satoshis)
            .ok_or_else(|| UtxoError::InvalidAmount("input total overflows u64".into()))?;

        let fee = policy.fee_for(selected.len());
        let threshold = target_value.saturating_add(fee);
        if total >= threshold {
            return Ok(SpendPlan {
                selected_inputs: selected,
                total_input_value: total,
                target_value,
                fee_estimate: fee,
                change_value: total - threshold,
            });
        }
    }

    let required = target_value.saturating_add(policy.fee_for(selected.len()));
    Err(UtxoError::InsufficientFunds {
        available: total,
        required,
        shortfall: required - total,
    })
}
