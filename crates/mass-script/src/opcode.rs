//! Opcode table.
//!
//! Every byte value maps to exactly one [`OpcodeDescriptor`], which tells the
//! parser how many operand bytes follow and the engine which [`Operation`] to run.

use bitcoin::opcodes::Opcode;
use bitcoin::opcodes::all::*;
use std::sync::LazyLock;

/// How the operand of an opcode is encoded in the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandLength {
    /// No operand bytes.
    None,
    /// Exactly `n` immediate data bytes.
    Fixed(usize),
    /// A little-endian length prefix of the given width (1, 2 or 4 bytes), then the data.
    Prefixed(usize),
}

/// The operation performed when an opcode executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    // Constants.
    PushBytes,
    PushNum(i8),

    // Flow control.
    Nop,
    If,
    NotIf,
    Else,
    EndIf,
    Verify,
    Return,

    // Stack.
    ToAltStack,
    FromAltStack,
    Drop2,
    Dup2,
    Dup3,
    Over2,
    Rot2,
    Swap2,
    IfDup,
    Depth,
    Drop,
    Dup,
    Nip,
    Over,
    Pick,
    Roll,
    Rot,
    Swap,
    Tuck,

    // Splice and bitwise logic.
    Size,
    Equal,
    EqualVerify,

    // Arithmetic.
    Add1,
    Sub1,
    Negate,
    Abs,
    Not,
    NotEqual0,
    Add,
    Sub,
    BoolAnd,
    BoolOr,
    NumEqual,
    NumEqualVerify,
    NumNotEqual,
    LessThan,
    GreaterThan,
    LessThanOrEqual,
    GreaterThanOrEqual,
    Min,
    Max,
    Within,

    // Crypto.
    Ripemd160,
    Sha1,
    Sha256,
    Hash160,
    Hash256,
    CodeSeparator,
    CheckSig,
    CheckSigVerify,
    CheckMultiSig,
    CheckMultiSigVerify,

    // Locktime.
    CheckLockTimeVerify,
    CheckSequenceVerify,

    /// NOP1 and NOP4-NOP10, reserved for soft-fork upgrades.
    UpgradableNop,
    /// Rejected wherever it appears.
    Disabled,
    /// OP_VERIF and OP_VERNOTIF, rejected wherever they appear.
    AlwaysIllegal,
    /// Fails only when executed.
    Reserved,
    /// Unassigned opcode, fails only when executed.
    Invalid,
}

impl Operation {
    fn of(opcode: Opcode) -> Self {
        let value = opcode.to_u8();
        if value <= OP_PUSHDATA4.to_u8() {
            return Self::PushBytes;
        }
        if (OP_PUSHNUM_1.to_u8()..=OP_PUSHNUM_16.to_u8()).contains(&value) {
            return Self::PushNum((value - OP_PUSHNUM_1.to_u8() + 1) as i8);
        }

        match opcode {
            OP_PUSHNUM_NEG1 => Self::PushNum(-1),
            OP_NOP => Self::Nop,
            OP_IF => Self::If,
            OP_NOTIF => Self::NotIf,
            OP_ELSE => Self::Else,
            OP_ENDIF => Self::EndIf,
            OP_VERIFY => Self::Verify,
            OP_RETURN => Self::Return,

            OP_TOALTSTACK => Self::ToAltStack,
            OP_FROMALTSTACK => Self::FromAltStack,
            OP_2DROP => Self::Drop2,
            OP_2DUP => Self::Dup2,
            OP_3DUP => Self::Dup3,
            OP_2OVER => Self::Over2,
            OP_2ROT => Self::Rot2,
            OP_2SWAP => Self::Swap2,
            OP_IFDUP => Self::IfDup,
            OP_DEPTH => Self::Depth,
            OP_DROP => Self::Drop,
            OP_DUP => Self::Dup,
            OP_NIP => Self::Nip,
            OP_OVER => Self::Over,
            OP_PICK => Self::Pick,
            OP_ROLL => Self::Roll,
            OP_ROT => Self::Rot,
            OP_SWAP => Self::Swap,
            OP_TUCK => Self::Tuck,

            OP_SIZE => Self::Size,
            OP_EQUAL => Self::Equal,
            OP_EQUALVERIFY => Self::EqualVerify,

            OP_1ADD => Self::Add1,
            OP_1SUB => Self::Sub1,
            OP_NEGATE => Self::Negate,
            OP_ABS => Self::Abs,
            OP_NOT => Self::Not,
            OP_0NOTEQUAL => Self::NotEqual0,
            OP_ADD => Self::Add,
            OP_SUB => Self::Sub,
            OP_BOOLAND => Self::BoolAnd,
            OP_BOOLOR => Self::BoolOr,
            OP_NUMEQUAL => Self::NumEqual,
            OP_NUMEQUALVERIFY => Self::NumEqualVerify,
            OP_NUMNOTEQUAL => Self::NumNotEqual,
            OP_LESSTHAN => Self::LessThan,
            OP_GREATERTHAN => Self::GreaterThan,
            OP_LESSTHANOREQUAL => Self::LessThanOrEqual,
            OP_GREATERTHANOREQUAL => Self::GreaterThanOrEqual,
            OP_MIN => Self::Min,
            OP_MAX => Self::Max,
            OP_WITHIN => Self::Within,

            OP_RIPEMD160 => Self::Ripemd160,
            OP_SHA1 => Self::Sha1,
            OP_SHA256 => Self::Sha256,
            OP_HASH160 => Self::Hash160,
            OP_HASH256 => Self::Hash256,
            OP_CODESEPARATOR => Self::CodeSeparator,
            OP_CHECKSIG => Self::CheckSig,
            OP_CHECKSIGVERIFY => Self::CheckSigVerify,
            OP_CHECKMULTISIG => Self::CheckMultiSig,
            OP_CHECKMULTISIGVERIFY => Self::CheckMultiSigVerify,

            OP_CLTV => Self::CheckLockTimeVerify,
            OP_CSV => Self::CheckSequenceVerify,

            OP_NOP1 | OP_NOP4 | OP_NOP5 | OP_NOP6 | OP_NOP7 | OP_NOP8 | OP_NOP9 | OP_NOP10 => {
                Self::UpgradableNop
            }

            OP_CAT | OP_SUBSTR | OP_LEFT | OP_RIGHT | OP_INVERT | OP_AND | OP_OR | OP_XOR
            | OP_2MUL | OP_2DIV | OP_MUL | OP_DIV | OP_MOD | OP_LSHIFT | OP_RSHIFT => {
                Self::Disabled
            }

            OP_VERIF | OP_VERNOTIF => Self::AlwaysIllegal,

            OP_RESERVED | OP_VER | OP_RESERVED1 | OP_RESERVED2 => Self::Reserved,

            _ => Self::Invalid,
        }
    }
}

/// Static information about one opcode value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeDescriptor {
    pub opcode: Opcode,
    pub length: OperandLength,
    pub operation: Operation,
}

static OPCODE_TABLE: LazyLock<[OpcodeDescriptor; 256]> =
    LazyLock::new(|| std::array::from_fn(|value| OpcodeDescriptor::build(value as u8)));

impl OpcodeDescriptor {
    fn build(value: u8) -> Self {
        let opcode = Opcode::from(value);

        let length = match opcode {
            OP_PUSHDATA1 => OperandLength::Prefixed(1),
            OP_PUSHDATA2 => OperandLength::Prefixed(2),
            OP_PUSHDATA4 => OperandLength::Prefixed(4),
            _ if value < OP_PUSHDATA1.to_u8() => OperandLength::Fixed(value as usize),
            _ => OperandLength::None,
        };

        Self {
            opcode,
            length,
            operation: Operation::of(opcode),
        }
    }

    /// Returns the descriptor for the given opcode byte.
    pub fn from_u8(value: u8) -> Self {
        OPCODE_TABLE[value as usize]
    }

    /// Numeric opcode value.
    pub fn value(&self) -> u8 {
        self.opcode.to_u8()
    }

    /// Human readable opcode name.
    pub fn name(&self) -> String {
        self.opcode.to_string()
    }
}
