//! Classification of the spent output and validation of the spending witness.

use crate::constants::{
    LOCK_HEIGHT_SIZE, LOCK_HEIGHT_WITNESS_VERSION, MIN_LOCK_HEIGHT, SEQUENCE_LOCK_TIME_IS_SECONDS,
    WITNESS_V0_KEYHASH_SIZE, WITNESS_V0_SCRIPTHASH_SIZE,
};
use crate::error::Error;
use crate::parser::{ParsedOpcode, is_push_only, parse_script};
use bitcoin::hashes::{Hash, hash160, sha256};
use bitcoin::opcodes::all::{OP_PUSHBYTES_0, OP_PUSHBYTES_8};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WitnessError {
    #[error("input index {index} out of range, transaction has {inputs} inputs")]
    InvalidInputIndex { index: usize, inputs: usize },
    #[error("witness element {position} is missing or empty")]
    InvalidIndex { position: usize },
    #[error("witness signature script is not push only")]
    NonPushOnly,
    #[error("nonstandard locking script")]
    NonStandard,
    #[error("witness program {} does not commit to the redeem script", hex::encode(.program))]
    WitnessProgramMismatch { program: Vec<u8> },
    #[error("lock height {0} unsupported, only block heights in [{MIN_LOCK_HEIGHT}, {SEQUENCE_LOCK_TIME_IS_SECONDS}) are")]
    UnsupportedLockHeight(u64),
}

/// Supported spending conditions of a locking script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpendCondition {
    /// `OP_0 <program>`, the program being the hash of the redeem script.
    HashLocked { program: Vec<u8> },
    /// A single 8-byte push of a little-endian block height.
    LockHeight { height: u64 },
}

impl SpendCondition {
    /// Witness version the engine runs the spend under.
    pub fn witness_version(&self) -> u8 {
        match self {
            Self::HashLocked { .. } => 0,
            Self::LockHeight { .. } => LOCK_HEIGHT_WITNESS_VERSION,
        }
    }
}

fn hash_locked_program(pops: &[ParsedOpcode]) -> Option<&[u8]> {
    match pops {
        [version, program]
            if version.opcode.opcode == OP_PUSHBYTES_0
                && program.is_push()
                && matches!(
                    program.data.len(),
                    WITNESS_V0_KEYHASH_SIZE | WITNESS_V0_SCRIPTHASH_SIZE
                ) =>
        {
            Some(program.data.as_slice())
        }
        _ => None,
    }
}

fn lock_height(pops: &[ParsedOpcode]) -> Option<u64> {
    match pops {
        [push] if push.opcode.opcode == OP_PUSHBYTES_8 => {
            let bytes: [u8; LOCK_HEIGHT_SIZE] = push.data.as_slice().try_into().ok()?;
            Some(u64::from_le_bytes(bytes))
        }
        _ => None,
    }
}

/// Classifies `locking_script` and checks the two-element `witness` against it.
///
/// `witness[0]` is the signature script, `witness[1]` the redeem script.
pub fn classify_spend(locking_script: &[u8], witness: &[Vec<u8>]) -> Result<SpendCondition, Error> {
    for position in 0..2 {
        if witness.get(position).is_none_or(|element| element.is_empty()) {
            return Err(WitnessError::InvalidIndex { position }.into());
        }
    }

    if !is_push_only(&witness[0]) {
        return Err(WitnessError::NonPushOnly.into());
    }

    let pops = parse_script(locking_script)?;

    if let Some(program) = hash_locked_program(&pops) {
        let redeem_script = &witness[1];
        let matches = if program.len() == WITNESS_V0_SCRIPTHASH_SIZE {
            sha256::Hash::hash(redeem_script).as_byte_array() == program
        } else {
            hash160::Hash::hash(redeem_script).as_byte_array() == program
        };

        if !matches {
            return Err(WitnessError::WitnessProgramMismatch {
                program: program.to_vec(),
            }
            .into());
        }

        return Ok(SpendCondition::HashLocked {
            program: program.to_vec(),
        });
    }

    if let Some(height) = lock_height(&pops) {
        if !(MIN_LOCK_HEIGHT..u64::from(SEQUENCE_LOCK_TIME_IS_SECONDS)).contains(&height) {
            return Err(WitnessError::UnsupportedLockHeight(height).into());
        }
        return Ok(SpendCondition::LockHeight { height });
    }

    Err(WitnessError::NonStandard.into())
}
