use crate::constants::MAX_SCRIPT_SIZE;
use crate::error::Error;
use crate::opcode::{OpcodeDescriptor, OperandLength, Operation};
use bitcoin::opcodes::Opcode;
use bitcoin::opcodes::all::*;

/// Script parse error type.
#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("script size {0} is larger than max allowed size {MAX_SCRIPT_SIZE}")]
    ScriptTooLarge(usize),
    #[error("opcode {opcode} requires {required} bytes, but script only has {remaining} remaining")]
    MalformedPush {
        opcode: Opcode,
        required: usize,
        remaining: usize,
    },
}

/// An opcode together with the operand bytes that followed it in the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedOpcode {
    pub opcode: OpcodeDescriptor,
    pub data: Vec<u8>,
}

impl ParsedOpcode {
    pub fn value(&self) -> u8 {
        self.opcode.value()
    }

    pub fn operation(&self) -> Operation {
        self.opcode.operation
    }

    /// Disabled opcodes fail even inside a non-executing branch.
    pub fn is_disabled(&self) -> bool {
        self.opcode.operation == Operation::Disabled
    }

    pub fn always_illegal(&self) -> bool {
        self.opcode.operation == Operation::AlwaysIllegal
    }

    pub fn is_conditional(&self) -> bool {
        matches!(
            self.opcode.operation,
            Operation::If | Operation::NotIf | Operation::Else | Operation::EndIf
        )
    }

    /// Whether this opcode only pushes data. OP_RESERVED sits inside the push range.
    pub fn is_push(&self) -> bool {
        self.value() <= OP_PUSHNUM_16.to_u8()
    }

    /// Returns an error unless the push uses the shortest encoding for its data.
    pub fn check_minimal_data_push(&self) -> Result<(), Error> {
        let len = self.data.len();
        let opcode = self.opcode.opcode;

        let minimal = match self.data.as_slice() {
            [] => opcode == OP_PUSHBYTES_0,
            [n @ 1..=16] => opcode.to_u8() == OP_PUSHNUM_1.to_u8() + n - 1,
            [0x81] => opcode == OP_PUSHNUM_NEG1,
            _ if len <= 75 => opcode.to_u8() as usize == len,
            _ if len <= 0xff => opcode == OP_PUSHDATA1,
            _ if len <= 0xffff => opcode == OP_PUSHDATA2,
            _ => true,
        };

        if minimal {
            Ok(())
        } else {
            Err(Error::MinimalData { opcode, len })
        }
    }

    /// Appends the serialized opcode and operand to `out`.
    pub fn write(&self, out: &mut Vec<u8>) {
        out.push(self.value());
        match self.opcode.length {
            OperandLength::None => {}
            OperandLength::Fixed(_) => out.extend_from_slice(&self.data),
            OperandLength::Prefixed(width) => {
                let len = (self.data.len() as u32).to_le_bytes();
                out.extend_from_slice(&len[..width]);
                out.extend_from_slice(&self.data);
            }
        }
    }

    /// Human readable form, like `OP_PUSHBYTES_2 0x0102` or `OP_CHECKSIG`.
    ///
    /// The one line form prints pushed data as bare hex and small integers as numbers.
    pub fn print(&self, oneline: bool) -> String {
        if oneline {
            return match (self.opcode.operation, self.opcode.length) {
                (Operation::PushNum(n), _) => n.to_string(),
                (_, OperandLength::Fixed(0)) => "0".to_string(),
                (_, OperandLength::None) => self.opcode.name(),
                _ => hex::encode(&self.data),
            };
        }

        let name = self.opcode.name();
        match self.opcode.length {
            OperandLength::None | OperandLength::Fixed(0) => name,
            _ => format!("{name} 0x{}", hex::encode(&self.data)),
        }
    }
}

/// Splits a raw script into opcodes and their operands.
///
/// Nothing is evaluated here. Scripts larger than [`MAX_SCRIPT_SIZE`] are
/// rejected before any byte is looked at.
pub fn parse_script(script: &[u8]) -> Result<Vec<ParsedOpcode>, ParseError> {
    if script.len() > MAX_SCRIPT_SIZE {
        return Err(ParseError::ScriptTooLarge(script.len()));
    }

    let mut parsed = Vec::new();
    let mut rest = script;

    while let Some((&value, tail)) = rest.split_first() {
        let opcode = OpcodeDescriptor::from_u8(value);
        let malformed = |required: usize, remaining: usize| ParseError::MalformedPush {
            opcode: opcode.opcode,
            required,
            remaining,
        };

        let (data, tail) = match opcode.length {
            OperandLength::None => (Vec::new(), tail),
            OperandLength::Fixed(n) => {
                if tail.len() < n {
                    return Err(malformed(n, tail.len()));
                }
                let (data, tail) = tail.split_at(n);
                (data.to_vec(), tail)
            }
            OperandLength::Prefixed(width) => {
                if tail.len() < width {
                    return Err(malformed(width, tail.len()));
                }
                let (prefix, tail) = tail.split_at(width);
                let mut len_bytes = [0u8; 4];
                len_bytes[..width].copy_from_slice(prefix);
                let len = u32::from_le_bytes(len_bytes) as usize;
                if tail.len() < len {
                    return Err(malformed(len, tail.len()));
                }
                let (data, tail) = tail.split_at(len);
                (data.to_vec(), tail)
            }
        };

        parsed.push(ParsedOpcode { opcode, data });
        rest = tail;
    }

    Ok(parsed)
}

/// Serializes parsed opcodes back into raw script bytes.
pub fn unparse_script(opcodes: &[ParsedOpcode]) -> Vec<u8> {
    let mut script = Vec::new();
    for pop in opcodes {
        pop.write(&mut script);
    }
    script
}

/// Returns true if the script parses and contains nothing but data pushes.
pub fn is_push_only(script: &[u8]) -> bool {
    parse_script(script).is_ok_and(|opcodes| opcodes.iter().all(ParsedOpcode::is_push))
}

/// Disassembles a script into a single line, `[error]` marking a parse failure.
pub fn disasm_string(script: &[u8]) -> String {
    match parse_script(script) {
        Ok(opcodes) => opcodes
            .iter()
            .map(|pop| pop.print(true))
            .collect::<Vec<_>>()
            .join(" "),
        Err(_) => "[error]".to_string(),
    }
}
