use bitcoin::hashes::{hash160, Hash};
use bitcoin::script::ScriptBuf;
use bitcoin::secp256k1::SecretKey;
use bitcoin::{PubkeyHash, ScriptHash, WitnessProgram, WitnessVersion};

use crate::error::UtxoError;
use crate::keys::compressed_public_key;
use crate::network::UtxoNetwork;

/// RIPEMD160(SHA256(data)).
pub fn hash160(data: &[u8]) -> [u8; 20] {
    hash160::Hash::hash(data).to_byte_array()
}

/// Derive the legacy P2PKH address for a compressed public key.
pub fn p2pkh_address(pubkey: &[u8; 33], network: &UtxoNetwork) -> String {
    let mut payload = Vec::with_capacity(21);
    payload.push(network.pubkey_hash);
    payload.extend_from_slice(&hash160(pubkey));
    bs58::encode(payload).with_check().into_string()
}

/// P2PKH address controlled by `secret`.
pub fn address_for_key(secret: &SecretKey, network: &UtxoNetwork) -> String {
    p2pkh_address(&compressed_public_key(secret), network)
}

/// P2PKH locking script for a compressed public key.
pub fn p2pkh_script(pubkey: &[u8; 33]) -> ScriptBuf {
    ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(hash160(pubkey)))
}

fn witness_script(version: u8, program: &[u8]) -> Result<ScriptBuf, UtxoError> {
    let version = WitnessVersion::try_from(version)
        .map_err(|e| UtxoError::InvalidAddress(format!("invalid witness version: {e}")))?;
    let program = WitnessProgram::new(version, program)
        .map_err(|e| UtxoError::InvalidAddress(format!("invalid witness program: {e}")))?;
    Ok(ScriptBuf::new_witness_program(&program))
}

/// Resolve an address string into its locking script.
///
/// Accepts base58 P2PKH and P2SH addresses carrying the network's version
/// bytes, and segwit v0/v1 addresses with the network's bech32 HRP.
pub fn script_for_address(address: &str, network: &UtxoNetwork) -> Result<ScriptBuf, UtxoError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(UtxoError::InvalidAddress("address is empty".into()));
    }

    let prefix = format!("{}1", network.bech32_hrp);
    if address.to_ascii_lowercase().starts_with(&prefix) {
        let (hrp, version, program) = bech32::segwit::decode(address)
            .map_err(|e| UtxoError::InvalidAddress(format!("invalid bech32 address: {e}")))?;
        if hrp.to_string().to_ascii_lowercase() != network.bech32_hrp {
            return Err(UtxoError::InvalidAddress(format!(
                "address HRP {hrp} does not belong to {}",
                network.name
            )));
        }
        return witness_script(version.to_u8(), &program);
    }

    let payload = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| UtxoError::InvalidAddress(format!("invalid base58 address: {e}")))?;
    if payload.len() != 21 {
        return Err(UtxoError::InvalidAddress(format!(
            "unexpected address payload length {}",
            payload.len()
        )));
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&payload[1..]);
    match payload[0] {
        v if v == network.pubkey_hash => Ok(ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(hash))),
        v if v == network.script_hash => Ok(ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(hash))),
        v => Err(UtxoError::InvalidAddress(format!(
            "version byte 0x{v:02x} does not belong to {}",
            network.name
        ))),
    }
}

/// Whether `address` is a valid address on `network`.
pub fn validate_address(address: &str, network: &UtxoNetwork) -> bool {
    script_for_address(address, network).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PUBKEY_ONE: &str = "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";
    const HASH_ONE: &str = "751e76e8199196d454941c45d1b3a323f1433bd6";

    fn pubkey_one() -> [u8; 33] {
        hex::decode(PUBKEY_ONE).unwrap().try_into().unwrap()
    }

    #[test]
    fn hash160_of_generator_pubkey() {
        assert_eq!(hex::encode(hash160(&pubkey_one())), HASH_ONE);
    }

    #[test]
    fn p2pkh_testnet_vector() {
        let address = p2pkh_address(&pubkey_one(), &UtxoNetwork::bitcoin_testnet());
        assert_eq!(address, "mrCDrCybB6J1vRfbwM5hemdJz73FwDBC8r");
    }

    #[test]
    fn p2pkh_address_resolves_to_its_script() {
        let net = UtxoNetwork::litecoin_testnet();
        let address = p2pkh_address(&pubkey_one(), &net);
        let script = script_for_address(&address, &net).unwrap();
        assert_eq!(script, p2pkh_script(&pubkey_one()));
        assert_eq!(
            hex::encode(script.as_bytes()),
            format!("76a914{HASH_ONE}88ac")
        );
    }

    #[test]
    fn bech32_v0_resolves_to_witness_script() {
        let script = script_for_address(
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx",
            &UtxoNetwork::bitcoin_testnet(),
        )
        .unwrap();
        assert_eq!(hex::encode(script.as_bytes()), format!("0014{HASH_ONE}"));
    }

    #[test]
    fn bech32m_v1_resolves_to_taproot_script() {
        let script = script_for_address(
            "tb1pqqqqp399et2xygdj5xreqhjjvcmzhxw4aywxecjdzew6hylgvsesf3hn0c",
            &UtxoNetwork::bitcoin_testnet(),
        )
        .unwrap();
        assert!(script.is_p2tr());
        assert_eq!(
            hex::encode(script.as_bytes()),
            "5120000000c4a5cad46221b2a187905e5266362b99d5e91c6ce24d165dab93e86433"
        );
    }

    #[test]
    fn p2pkh_script_uses_typed_builder() {
        let script = p2pkh_script(&pubkey_one());
        assert!(script.is_p2pkh());
        assert_eq!(&script.as_bytes()[3..23], &hex::decode(HASH_ONE).unwrap()[..]);
    }

    #[test]
    fn bitcoin_bech32_is_not_litecoin() {
        assert!(!validate_address(
            "tb1qw508d6qejxtdg4y5r3zarvary0c5xw7kxpjzsx",
            &UtxoNetwork::litecoin_testnet(),
        ));
    }

    #[test]
    fn p2sh_uses_network_script_version() {
        let ltc = UtxoNetwork::litecoin_testnet();
        let mut payload = vec![ltc.script_hash];
        payload.extend_from_slice(&[0x11; 20]);
        let address = bs58::encode(&payload).with_check().into_string();
        let script = script_for_address(&address, &ltc).unwrap();
        assert!(script.is_p2sh());
        assert_eq!(&script.as_bytes()[2..22], &[0x11; 20]);

        // Bitcoin testnet uses 0xc4 for P2SH, so the same payload is foreign there.
        assert!(!validate_address(&address, &UtxoNetwork::bitcoin_testnet()));
    }

    #[test]
    fn mainnet_address_is_rejected_on_testnet() {
        assert!(!validate_address(
            "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
            &UtxoNetwork::bitcoin_testnet(),
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(!validate_address("notanaddress!!!", &UtxoNetwork::bitcoin_testnet()));
        assert!(!validate_address("", &UtxoNetwork::bitcoin_testnet()));
    }
}
