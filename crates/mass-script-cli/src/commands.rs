pub mod disasm;
pub mod verify;

use crate::error::Result;

/// Decodes a hex string, with or without the `0x` prefix.
pub(crate) fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let str_without_0x = input.strip_prefix("0x").unwrap_or(input);
    Ok(hex::decode(str_without_0x)?)
}

/// Decodes a consensus encoded transaction from hex.
pub(crate) fn decode_transaction(input: &str) -> Result<bitcoin::Transaction> {
    let bytes = decode_hex(input)?;
    Ok(bitcoin::consensus::deserialize(&bytes)?)
}
