use crate::constants::{MAX_OPS_PER_SCRIPT, MAX_SCRIPT_ELEMENT_SIZE, MAX_STACK_SIZE};
use crate::encoding::EncodingError;
use crate::num::NumError;
use crate::parser::ParseError;
use crate::signature_checker::SignatureError;
use crate::stack::StackError;
use crate::witness::WitnessError;
use bitcoin::opcodes::Opcode;

/// Script error type.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    ///////////////////////////
    // Construction errors.
    ///////////////////////////
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Witness(#[from] WitnessError),

    ///////////////////////////
    // Execution errors.
    ///////////////////////////
    #[error("past input scripts {script_index}:{offset} ({script_count} scripts)")]
    PastEndOfScript {
        script_index: usize,
        offset: usize,
        script_count: usize,
    },
    #[error("attempt to execute disabled opcode {0}")]
    DisabledOpcode(Opcode),
    #[error("attempt to execute reserved opcode {0}")]
    ReservedOpcode(Opcode),
    #[error("attempt to execute invalid opcode {0}")]
    InvalidOpcode(Opcode),
    #[error("exceeded max operation limit of {MAX_OPS_PER_SCRIPT}")]
    TooManyOperations,
    #[error("element size {0} exceeds max allowed size {MAX_SCRIPT_ELEMENT_SIZE}")]
    ElementTooBig(usize),
    // Stack and altstack combined depth is over the limit.
    #[error("combined stack size {0} exceeds limit of {MAX_STACK_SIZE}")]
    StackOverflow(usize),
    #[error("end of script reached in conditional execution")]
    MissingEndif,
    #[error("encountered {0} with no matching opcode to begin conditional execution")]
    UnbalancedConditional(Opcode),
    #[error("data push of {len} bytes encoded with non-minimal opcode {opcode}")]
    MinimalData { opcode: Opcode, len: usize },
    #[error("script returned early")]
    EarlyReturn,
    #[error("{0} failed")]
    Verify(Opcode),
    #[error("error check when script unfinished")]
    ScriptUnfinished,
    #[error("stack contains {0} unexpected items")]
    CleanStack(usize),
    #[error("stack empty at end of execution")]
    EmptyStack,
    #[error("script terminated with a false stack element")]
    ScriptFailed,
    #[error(transparent)]
    Stack(#[from] StackError),
    #[error(transparent)]
    Num(#[from] NumError),

    // Softfork safeness.
    #[error("{0} reserved for soft-fork upgrades")]
    DiscourageUpgradableNops(Opcode),

    ///////////////////////////
    // Signature checking.
    ///////////////////////////
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("too many pubkeys: {0}")]
    InvalidPubKeyCount(i64),
    #[error("invalid signature count {count}, expected in the range of [0, {max}]")]
    InvalidSignatureCount { count: i64, max: usize },
    #[error("multisig dummy argument has length {0} instead of 0")]
    NullDummy(usize),

    // CHECKLOCKTIMEVERIFY and CHECKSEQUENCEVERIFY
    #[error("negative lock time: {0}")]
    NegativeLockTime(i64),
    #[error("required lock time has not been reached")]
    UnsatisfiedLockTime,
}
