//! Minimal ABI encoding for EVM function calls and the handful of return
//! shapes the wallet reads back (`uint256`, `string`).

use alloy_primitives::U256;

use crate::error::EthError;

/// A single static ABI parameter.
#[derive(Debug, Clone)]
pub enum AbiParam {
    /// A 20-byte address, left-padded to 32 bytes.
    Address([u8; 20]),
    /// A 256-bit unsigned integer.
    Uint256(U256),
}

/// Encodes `selector || word(params[0]) || word(params[1]) || ...`.
pub fn encode_function_call(selector: [u8; 4], params: &[AbiParam]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + params.len() * 32);
    data.extend_from_slice(&selector);
    data.extend_from_slice(&encode_params(params));
    data
}

/// Encodes the argument words alone, without a selector. Tron's
/// `triggersmartcontract` takes arguments in this form.
pub fn encode_params(params: &[AbiParam]) -> Vec<u8> {
    params.iter().flat_map(encode_param).collect()
}

fn encode_param(param: &AbiParam) -> [u8; 32] {
    match param {
        AbiParam::Address(addr) => {
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(addr);
            word
        }
        AbiParam::Uint256(value) => value.to_be_bytes::<32>(),
    }
}

/// Decodes the first 32-byte word of `data` as a uint256.
pub fn decode_uint256(data: &[u8]) -> Result<U256, EthError> {
    let word = data.get(..32).ok_or_else(|| {
        EthError::DecodingError(format!(
            "expected at least 32 bytes for uint256, got {}",
            data.len()
        ))
    })?;
    Ok(U256::from_be_slice(word))
}

/// Decodes a single `string` return value.
///
/// Some older tokens return `bytes32` for `symbol()`/`name()`; a 32-byte
/// payload is therefore read as a NUL-padded fixed string.
pub fn decode_string(data: &[u8]) -> Result<String, EthError> {
    if data.len() == 32 {
        let end = data.iter().position(|&b| b == 0).unwrap_or(32);
        return String::from_utf8(data[..end].to_vec())
            .map_err(|e| EthError::DecodingError(format!("invalid utf-8: {e}")));
    }

    let offset = word_to_usize(data, 0)?;
    let len = word_to_usize(data, offset)?;
    let start = offset + 32;
    let bytes = data
        .get(start..start.saturating_add(len))
        .ok_or_else(|| EthError::DecodingError("string data out of bounds".into()))?;

    String::from_utf8(bytes.to_vec())
        .map_err(|e| EthError::DecodingError(format!("invalid utf-8: {e}")))
}

fn word_to_usize(data: &[u8], at: usize) -> Result<usize, EthError> {
    let word = data
        .get(at..at.saturating_add(32))
        .ok_or_else(|| EthError::DecodingError(format!("missing word at offset {at}")))?;
    let value = U256::from_be_slice(word);
    usize::try_from(value)
        .map_err(|_| EthError::DecodingError(format!("offset {value} does not fit in usize")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_address_param_is_left_padded() {
        let mut addr = [0u8; 20];
        addr[0] = 0xde;
        addr[19] = 0xad;

        let word = encode_param(&AbiParam::Address(addr));
        assert_eq!(&word[..12], &[0u8; 12]);
        assert_eq!(&word[12..], &addr);
    }

    #[test]
    fn encode_uint_param_is_big_endian() {
        let word = encode_param(&AbiParam::Uint256(U256::from(0x0102u64)));
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0x02);
        assert_eq!(&word[..30], &[0u8; 30]);
    }

    #[test]
    fn function_call_layout() {
        let data = encode_function_call(
            [0xaa, 0xbb, 0xcc, 0xdd],
            &[AbiParam::Address([1u8; 20]), AbiParam::Uint256(U256::from(5u64))],
        );
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[..4], &[0xaa, 0xbb, 0xcc, 0xdd]);
        assert_eq!(data[67], 5);
    }

    #[test]
    fn decode_uint_from_word() {
        let mut word = [0u8; 32];
        word[31] = 42;
        assert_eq!(decode_uint256(&word).unwrap(), U256::from(42u64));
        assert!(decode_uint256(&word[..10]).is_err());
    }

    #[test]
    fn decode_dynamic_string() {
        // offset 0x20, length 4, "USDC" right-padded
        let mut data = vec![0u8; 96];
        data[31] = 0x20;
        data[63] = 4;
        data[64..68].copy_from_slice(b"USDC");
        assert_eq!(decode_string(&data).unwrap(), "USDC");
    }

    #[test]
    fn decode_bytes32_string() {
        let mut data = [0u8; 32];
        data[..3].copy_from_slice(b"MKR");
        assert_eq!(decode_string(&data).unwrap(), "MKR");
    }

    #[test]
    fn decode_truncated_string_fails() {
        let mut data = vec![0u8; 64];
        data[31] = 0x20;
        data[63] = 10;
        assert!(decode_string(&data).is_err());
    }
}
