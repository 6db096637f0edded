use alloy_primitives::U256;
use chain_eth::abi::{encode_function_call, encode_params, AbiParam};
use chain_eth::erc20::TRANSFER_SELECTOR;

use crate::address::decode_address;
use crate::error::TronError;

pub const TRANSFER_SIGNATURE: &str = "transfer(address,uint256)";
pub const BALANCE_OF_SIGNATURE: &str = "balanceOf(address)";
pub const DECIMALS_SIGNATURE: &str = "decimals()";
pub const SYMBOL_SIGNATURE: &str = "symbol()";
pub const NAME_SIGNATURE: &str = "name()";
pub const TOTAL_SUPPLY_SIGNATURE: &str = "totalSupply()";

/// Fee ceiling for TRC-20 calls, in sun (100 TRX).
pub const DEFAULT_FEE_LIMIT: u64 = 100_000_000;

/// Hex `parameter` for `transfer(to, amount)`.
pub fn transfer_parameter(to: &str, amount: U256) -> Result<String, TronError> {
    let recipient = decode_address(to)?;
    Ok(hex::encode(encode_params(&[
        AbiParam::Address(recipient),
        AbiParam::Uint256(amount),
    ])))
}

/// Full call data (selector and arguments) of `transfer(to, amount)`, as it
/// appears in a node-built `TriggerSmartContract`.
pub fn transfer_calldata(to: &str, amount: U256) -> Result<Vec<u8>, TronError> {
    let recipient = decode_address(to)?;
    Ok(encode_function_call(
        TRANSFER_SELECTOR,
        &[AbiParam::Address(recipient), AbiParam::Uint256(amount)],
    ))
}

/// Hex `parameter` for `balanceOf(owner)`.
pub fn balance_of_parameter(owner: &str) -> Result<String, TronError> {
    let owner = decode_address(owner)?;
    Ok(hex::encode(encode_params(&[AbiParam::Address(owner)])))
}

/// Decodes the first `constant_result` entry of a `uint256` view call.
pub fn decode_uint_result(result_hex: &str) -> Result<U256, TronError> {
    let bytes = hex::decode(result_hex)
        .map_err(|e| TronError::EncodingError(format!("invalid result hex: {e}")))?;
    Ok(chain_eth::abi::decode_uint256(&bytes)?)
}

/// Decodes the first `constant_result` entry of a `string` view call.
pub fn decode_string_result(result_hex: &str) -> Result<String, TronError> {
    let bytes = hex::decode(result_hex)
        .map_err(|e| TronError::EncodingError(format!("invalid result hex: {e}")))?;
    Ok(chain_eth::abi::decode_string(&bytes)?)
}
