use num_traits::Num;
use std::sync::LazyLock;

/// Maximum size in bytes of a single script.
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum number of bytes pushable to the stack.
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Maximum number of non-push operations per script.
pub const MAX_OPS_PER_SCRIPT: usize = 201;

/// The maximum combined height of stack and alt stack during script execution.
pub const MAX_STACK_SIZE: usize = 1000;

/// Maximum number of public keys per multisig.
pub const MAX_PUBKEYS_PER_MULTISIG: i64 = 20;

pub const COMPRESSED_PUBKEY_SIZE: usize = 33;
pub const UNCOMPRESSED_PUBKEY_SIZE: usize = 65;

pub const WITNESS_V0_KEYHASH_SIZE: usize = 20;
pub const WITNESS_V0_SCRIPTHASH_SIZE: usize = 32;

/// Size of the little-endian lock height carried by a lock-height locking script.
pub const LOCK_HEIGHT_SIZE: usize = 8;

/// Lowest lock height a lock-height locking script may commit to.
pub const MIN_LOCK_HEIGHT: u64 = 1000;

/// Relative lock-times at or above this value are interpreted as seconds.
pub const SEQUENCE_LOCK_TIME_IS_SECONDS: u32 = 1 << 22;

/// Mask applied to a sequence number to extract the relative lock-time.
pub const SEQUENCE_LOCK_TIME_MASK: u32 = 0x0000_ffff;

/// Below flags apply in the context of BIP 68
/// If this flag set, CTxIn::nSequence is NOT interpreted as a relative lock-time.
pub const SEQUENCE_LOCKTIME_DISABLE_FLAG: u32 = 1u32 << 31;

/// Sequence number of a finalized input.
pub const MAX_TX_IN_SEQUENCE_NUM: u32 = 0xffff_ffff;

/// Absolute lock-times below this value are block heights, timestamps otherwise.
pub const LOCK_TIME_THRESHOLD: i64 = 500_000_000;

/// Witness version assigned to lock-height spends.
///
/// Any version at or above this value selects the redeem script expansion path.
pub const LOCK_HEIGHT_WITNESS_VERSION: u8 = 10;

pub const SIGHASH_ALL: u8 = 0x01;
pub const SIGHASH_NONE: u8 = 0x02;
pub const SIGHASH_SINGLE: u8 = 0x03;
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;

pub static HALF_ORDER: LazyLock<num_bigint::BigInt> = LazyLock::new(|| {
    pub const N: &str = "7fffffffffffffffffffffffffffffff5d576e7357a4501ddfe92f46681b20a0";
    num_bigint::BigInt::from_str_radix(N, 16).expect("Static value must be valid")
});
