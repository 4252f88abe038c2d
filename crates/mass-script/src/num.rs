//! Script numbers.
//!
//! Numbers on the stack are little-endian byte sequences with the sign carried
//! in the high bit of the last byte. Arithmetic operands are limited to 4 bytes,
//! lock-time operands to 5.

use std::ops::{Add, Neg, Sub};

/// Failure to read a stack item as a number.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum NumError {
    #[error("numeric value encoded as {len} bytes exceeds max allowed of {max}")]
    Overflow { len: usize, max: usize },
    #[error("numeric value is not minimally encoded")]
    NotMinimallyEncoded,
    #[error("arithmetic overflow")]
    ArithmeticOverflow,
}

/// Integer read from or pushed onto the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ScriptNum {
    value: i64,
}

impl<T: Into<i64>> From<T> for ScriptNum {
    fn from(value: T) -> Self {
        Self {
            value: value.into(),
        }
    }
}

impl ScriptNum {
    /// Maximum length in bytes of an arithmetic operand.
    pub const MAX_NUM_SIZE: usize = 4;

    /// Maximum length in bytes of a lock-time operand.
    pub const LOCK_TIME_NUM_SIZE: usize = 5;

    /// Interprets `data` as a script number no longer than `max_size` bytes.
    pub fn from_bytes(data: &[u8], require_minimal: bool, max_size: usize) -> Result<Self, NumError> {
        if data.len() > max_size {
            return Err(NumError::Overflow {
                len: data.len(),
                max: max_size,
            });
        }

        if require_minimal && !Self::is_minimally_encoded(data) {
            return Err(NumError::NotMinimallyEncoded);
        }

        let Some((&last, _)) = data.split_last() else {
            return Ok(Self { value: 0 });
        };

        let mut result = 0i64;
        for (i, &byte) in data.iter().enumerate() {
            result |= i64::from(byte).wrapping_shl(8 * i as u32);
        }

        if last & 0x80 != 0 {
            let sign_bit = 0x80i64.wrapping_shl(8 * (data.len() - 1) as u32);
            return Ok(Self {
                value: -(result & !sign_bit),
            });
        }

        Ok(Self { value: result })
    }

    /// Converts the number to its minimal byte encoding.
    pub fn to_bytes(&self) -> Vec<u8> {
        if self.value == 0 {
            return Vec::new();
        }

        let negative = self.value < 0;
        let mut magnitude = self.value.unsigned_abs();
        let mut result = Vec::with_capacity(9);

        while magnitude != 0 {
            result.push((magnitude & 0xff) as u8);
            magnitude >>= 8;
        }

        // An extra byte is needed when the most significant byte collides with the sign bit.
        match result.last_mut() {
            Some(msb) if *msb & 0x80 != 0 => result.push(if negative { 0x80 } else { 0x00 }),
            Some(msb) if negative => *msb |= 0x80,
            _ => {}
        }

        result
    }

    /// Returns whether `data` is the shortest possible encoding of its value.
    ///
    /// The most significant byte may only be zero (ignoring the sign bit) when the
    /// byte below it has its high bit set.
    pub fn is_minimally_encoded(data: &[u8]) -> bool {
        match data {
            [] => true,
            [.., last] if last & 0x7f != 0 => true,
            [_] => false,
            [.., second_last, _] => second_last & 0x80 != 0,
        }
    }

    /// Decoded integer value.
    pub fn value(&self) -> i64 {
        self.value
    }

    pub fn is_zero(&self) -> bool {
        self.value == 0
    }

    pub fn is_negative(&self) -> bool {
        self.value.is_negative()
    }

    pub fn abs(&self) -> Self {
        self.value.abs().into()
    }
}

impl Add for ScriptNum {
    type Output = Result<Self, NumError>;

    fn add(self, other: Self) -> Result<Self, NumError> {
        self.value
            .checked_add(other.value)
            .map(|value| Self { value })
            .ok_or(NumError::ArithmeticOverflow)
    }
}

impl Sub for ScriptNum {
    type Output = Result<Self, NumError>;

    fn sub(self, other: Self) -> Result<Self, NumError> {
        self.value
            .checked_sub(other.value)
            .map(|value| Self { value })
            .ok_or(NumError::ArithmeticOverflow)
    }
}

impl Neg for ScriptNum {
    type Output = Result<Self, NumError>;

    fn neg(self) -> Result<Self, NumError> {
        self.value
            .checked_neg()
            .map(|value| Self { value })
            .ok_or(NumError::ArithmeticOverflow)
    }
}
