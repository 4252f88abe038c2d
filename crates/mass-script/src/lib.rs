//! Transaction script engine.
//!
//! Every input spends an output locked by one of two witness conditions: a
//! hash of the redeem script, or a block height. The two witness elements of
//! the input are executed by a stack machine which decides whether the spend
//! is authorized.

mod cond_stack;
pub mod constants;
mod encoding;
mod engine;
mod error;
mod num;
mod opcode;
mod parser;
mod sig_cache;
mod signature_checker;
mod stack;
mod witness;


use bitcoin::{Transaction, TxOut};
use bitflags::bitflags;
use rayon::prelude::*;

pub use self::cond_stack::{Condition, ConditionalStack};
pub use self::encoding::{
    EncodingError, SignatureEncodingError, check_hash_type_encoding, check_pubkey_encoding,
    check_signature_encoding,
};
pub use self::engine::{Engine, EngineState};
pub use self::error::Error;
pub use self::num::{NumError, ScriptNum};
pub use self::opcode::{OpcodeDescriptor, OperandLength, Operation};
pub use self::parser::{
    ParseError, ParsedOpcode, disasm_string, is_push_only, parse_script, unparse_script,
};
pub use self::sig_cache::SigCache;
pub use self::signature_checker::{
    NoSignatureCheck, SignatureChecker, SignatureError, TransactionSignatureChecker,
};
pub use self::stack::{Stack, StackError};
pub use self::witness::{SpendCondition, WitnessError, classify_spend};

pub(crate) const LOG_TARGET: &str = "mass_script";

bitflags! {
    /// Script verification flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct VerifyFlags: u32 {
        /// Reject non-canonical hash types and public keys.
        const STRICTENC = 1 << 0;
        /// Require data pushes and numbers to use their shortest encoding.
        const MINIMALDATA = 1 << 1;
        /// Reject upgradable NOPs, reserved for soft forks.
        const DISCOURAGE_UPGRADABLE_NOPS = 1 << 2;
        /// Enforce OP_CHECKLOCKTIMEVERIFY (BIP65), a NOP otherwise.
        const CHECKLOCKTIMEVERIFY = 1 << 3;
        /// Enforce OP_CHECKSEQUENCEVERIFY (BIP112), a NOP otherwise.
        const CHECKSEQUENCEVERIFY = 1 << 4;
        /// Require the extra element consumed by OP_CHECKMULTISIG to be empty.
        const NULLDUMMY = 1 << 5;
    }
}

/// Verifies input `input_index` of `tx` spending an output of `amount`
/// locked by `locking_script`.
pub fn verify_input(
    locking_script: &[u8],
    tx: &Transaction,
    input_index: usize,
    amount: bitcoin::Amount,
    flags: VerifyFlags,
    sig_cache: Option<&SigCache>,
) -> Result<(), Error> {
    Engine::new(locking_script, tx, input_index, flags, sig_cache, amount)?.execute()
}

/// Verifies every input of `tx` in parallel on the rayon thread pool.
///
/// `spent_outputs[i]` is the output spent by input `i`. Results are returned
/// in input order.
pub fn verify_transaction_inputs(
    tx: &Transaction,
    spent_outputs: &[TxOut],
    flags: VerifyFlags,
    sig_cache: Option<&SigCache>,
) -> Vec<Result<(), Error>> {
    (0..tx.input.len())
        .into_par_iter()
        .map(|input_index| {
            let spent =
                spent_outputs
                    .get(input_index)
                    .ok_or(WitnessError::InvalidInputIndex {
                        index: input_index,
                        inputs: spent_outputs.len(),
                    })?;

            verify_input(
                spent.script_pubkey.as_bytes(),
                tx,
                input_index,
                spent.value,
                flags,
                sig_cache,
            )
        })
        .collect()
}
