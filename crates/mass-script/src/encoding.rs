//! Canonical encoding checks for signatures, hash types and public keys.
//!
//! All checks are pure functions of their input.

use crate::VerifyFlags;
use crate::constants::{
    COMPRESSED_PUBKEY_SIZE, HALF_ORDER, SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_SINGLE,
    UNCOMPRESSED_PUBKEY_SIZE,
};
use num_bigint::{BigInt, Sign};

/// Structural violations of strict DER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SignatureEncodingError {
    #[error("too short: {0} < 8")]
    TooShort(usize),
    #[error("too long: {0} > 72")]
    TooLong(usize),
    #[error("format has wrong type: {0:#x}")]
    InvalidSequenceId(u8),
    #[error("bad length: {declared} != {actual}")]
    InvalidDataLength { declared: usize, actual: usize },
    #[error("S out of bounds")]
    SOutOfBounds,
    #[error("invalid R length")]
    InvalidElementLength,
    #[error("missing first integer marker")]
    InvalidIntegerIdR,
    #[error("R length is zero")]
    ZeroLengthR,
    #[error("R value is negative")]
    NegativeR,
    #[error("invalid R value")]
    TooMuchPaddingR,
    #[error("missing second integer marker")]
    InvalidIntegerIdS,
    #[error("S length is zero")]
    ZeroLengthS,
    #[error("S value is negative")]
    NegativeS,
    #[error("invalid S value")]
    TooMuchPaddingS,
}

/// Encoding errors raised by signature checking opcodes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("malformed signature: {0}")]
    Der(#[from] SignatureEncodingError),
    #[error("signature is not canonical due to unnecessarily high S value")]
    HighS,
    #[error("invalid hashtype: {0:#x}")]
    InvalidHashType(u8),
    #[error("unsupported public key type of {len} bytes")]
    InvalidPubKey { len: usize },
    #[error("only compressed keys are accepted in witness version 0 programs")]
    WitnessPubKeyType,
}

impl EncodingError {
    /// Whether the input is well formed but has a malleable, non-canonical form.
    pub fn is_non_canonical(&self) -> bool {
        matches!(self, Self::HighS)
    }
}

/// Checks the sighash type byte when strict encoding is enabled.
pub fn check_hash_type_encoding(hash_type: u8, flags: VerifyFlags) -> Result<(), EncodingError> {
    if !flags.contains(VerifyFlags::STRICTENC) {
        return Ok(());
    }

    let base_type = hash_type & !SIGHASH_ANYONECANPAY;
    if !(SIGHASH_ALL..=SIGHASH_SINGLE).contains(&base_type) {
        return Err(EncodingError::InvalidHashType(hash_type));
    }

    Ok(())
}

// The format of a DER encoded signature, without the trailing hash type:
//
// 0x30 <total length> 0x02 <length of R> <R> 0x02 <length of S> <S>
//
// https://github.com/bitcoin/bips/blob/master/bip-0062.mediawiki#der-encoding
/// Checks that `sig` is strict DER with a low S value.
pub fn check_signature_encoding(sig: &[u8]) -> Result<(), EncodingError> {
    let len = sig.len();

    // 0x30 + <1-byte> + 0x02 + 0x01 + <byte> + 0x2 + 0x01 + <byte>
    if len < 8 {
        return Err(SignatureEncodingError::TooShort(len).into());
    }

    // 0x30 + <1-byte> + 0x02 + 0x21 + <33 bytes> + 0x2 + 0x21 + <33 bytes>
    if len > 72 {
        return Err(SignatureEncodingError::TooLong(len).into());
    }

    if sig[0] != 0x30 {
        return Err(SignatureEncodingError::InvalidSequenceId(sig[0]).into());
    }

    if sig[1] as usize != len - 2 {
        return Err(SignatureEncodingError::InvalidDataLength {
            declared: sig[1] as usize,
            actual: len - 2,
        }
        .into());
    }

    let r_len = sig[3] as usize;

    // The S length byte must be inside the signature.
    if r_len + 5 >= len {
        return Err(SignatureEncodingError::SOutOfBounds.into());
    }

    let s_len = sig[r_len + 5] as usize;

    if r_len + s_len + 6 != len {
        return Err(SignatureEncodingError::InvalidElementLength.into());
    }

    if sig[2] != 0x02 {
        return Err(SignatureEncodingError::InvalidIntegerIdR.into());
    }

    if r_len == 0 {
        return Err(SignatureEncodingError::ZeroLengthR.into());
    }

    if sig[4] & 0x80 != 0 {
        return Err(SignatureEncodingError::NegativeR.into());
    }

    // A leading zero is only allowed when the next byte would read as negative.
    if r_len > 1 && sig[4] == 0x00 && sig[5] & 0x80 == 0 {
        return Err(SignatureEncodingError::TooMuchPaddingR.into());
    }

    if sig[r_len + 4] != 0x02 {
        return Err(SignatureEncodingError::InvalidIntegerIdS.into());
    }

    if s_len == 0 {
        return Err(SignatureEncodingError::ZeroLengthS.into());
    }

    let s_offset = r_len + 6;

    if sig[s_offset] & 0x80 != 0 {
        return Err(SignatureEncodingError::NegativeS.into());
    }

    if s_len > 1 && sig[s_offset] == 0x00 && sig[s_offset + 1] & 0x80 == 0 {
        return Err(SignatureEncodingError::TooMuchPaddingS.into());
    }

    // S and N - S both verify, only the lower one is accepted.
    let s_value = BigInt::from_bytes_be(Sign::Plus, &sig[s_offset..s_offset + s_len]);
    if s_value > *HALF_ORDER {
        return Err(EncodingError::HighS);
    }

    Ok(())
}

/// Checks the public key format.
///
/// Witness version 0 programs only accept compressed keys, regardless of flags.
/// Otherwise, under strict encoding, compressed and uncompressed keys are accepted.
pub fn check_pubkey_encoding(
    pubkey: &[u8],
    witness_v0: bool,
    flags: VerifyFlags,
) -> Result<(), EncodingError> {
    let compressed = pubkey.len() == COMPRESSED_PUBKEY_SIZE && matches!(pubkey[0], 0x02 | 0x03);

    if witness_v0 && !compressed {
        return Err(EncodingError::WitnessPubKeyType);
    }

    if !flags.contains(VerifyFlags::STRICTENC) {
        return Ok(());
    }

    let uncompressed = pubkey.len() == UNCOMPRESSED_PUBKEY_SIZE && pubkey[0] == 0x04;

    if compressed || uncompressed {
        Ok(())
    } else {
        Err(EncodingError::InvalidPubKey { len: pubkey.len() })
    }
}
