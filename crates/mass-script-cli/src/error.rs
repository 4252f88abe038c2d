pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("Failed to decode transaction: {0}")]
    Decode(#[from] bitcoin::consensus::encode::Error),
    #[error("Expected {expected} locking scripts, got {got}")]
    LockingScriptCount { expected: usize, got: usize },
    #[error("Expected 1 or {expected} amounts, got {got}")]
    AmountCount { expected: usize, got: usize },
    #[error("Input {index} does not exist, transaction has {inputs} inputs")]
    MissingInput { index: usize, inputs: usize },
    #[error("{failed} of {total} inputs failed verification")]
    VerificationFailed { failed: usize, total: usize },
    #[error(transparent)]
    Parse(#[from] mass_script::ParseError),
}
