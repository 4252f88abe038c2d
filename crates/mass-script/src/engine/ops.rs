use super::Engine;
use crate::VerifyFlags;
use crate::cond_stack::Condition;
use crate::constants::SEQUENCE_LOCKTIME_DISABLE_FLAG;
use crate::encoding::{check_hash_type_encoding, check_pubkey_encoding, check_signature_encoding};
use crate::error::Error;
use crate::num::ScriptNum;
use crate::opcode::Operation;
use crate::parser::ParsedOpcode;
use crate::signature_checker::SignatureChecker;
use crate::stack::{Stack, StackError};
use bitcoin::Script;
use bitcoin::hashes::{Hash, hash160, ripemd160, sha1, sha256, sha256d};
use bitcoin::opcodes::Opcode;
use bitcoin::secp256k1::PublicKey;
use bitcoin::secp256k1::ecdsa::Signature;

impl<C: SignatureChecker> Engine<C> {
    pub(super) fn dispatch(&mut self, pop: &ParsedOpcode) -> Result<(), Error> {
        let op = pop.opcode.opcode;
        let stack = &mut self.stack;

        match pop.operation() {
            // Constants
            Operation::PushBytes => {
                stack.push(pop.data.clone());
            }
            Operation::PushNum(n) => {
                stack.push_num(n);
            }

            // Flow control
            Operation::Nop => {}
            Operation::If | Operation::NotIf => {
                let condition = if self.cond_stack.is_executing() {
                    let mut value = stack.pop_bool()?;
                    if pop.operation() == Operation::NotIf {
                        value = !value;
                    }
                    if value { Condition::True } else { Condition::False }
                } else {
                    Condition::Skip
                };
                self.cond_stack.push(condition);
            }
            Operation::Else => {
                if !self.cond_stack.toggle() {
                    return Err(Error::UnbalancedConditional(op));
                }
            }
            Operation::EndIf => {
                if !self.cond_stack.pop() {
                    return Err(Error::UnbalancedConditional(op));
                }
            }
            Operation::Verify => {
                if !stack.pop_bool()? {
                    return Err(Error::Verify(op));
                }
            }
            Operation::Return => return Err(Error::EarlyReturn),

            // Stack
            Operation::ToAltStack => {
                self.alt_stack.push(stack.pop()?);
            }
            Operation::FromAltStack => {
                stack.push(self.alt_stack.pop()?);
            }
            Operation::Drop2 => stack.drop_n(2)?,
            Operation::Dup2 => stack.dup_n(2)?,
            Operation::Dup3 => stack.dup_n(3)?,
            Operation::Over2 => stack.over_n(2)?,
            Operation::Rot2 => stack.rot_n(2)?,
            Operation::Swap2 => stack.swap_n(2)?,
            Operation::IfDup => {
                if stack.peek_bool()? {
                    stack.dup_n(1)?;
                }
            }
            Operation::Depth => {
                let depth = stack.depth() as i64;
                stack.push_num(depth);
            }
            Operation::Drop => stack.drop_n(1)?,
            Operation::Dup => stack.dup_n(1)?,
            Operation::Nip => {
                stack.nip_n(1)?;
            }
            Operation::Over => stack.over_n(1)?,
            Operation::Pick => {
                let idx = stack.pop_num()?.value();
                stack.pick_n(idx)?;
            }
            Operation::Roll => {
                let idx = stack.pop_num()?.value();
                stack.roll_n(idx)?;
            }
            Operation::Rot => stack.rot_n(1)?,
            Operation::Swap => stack.swap_n(1)?,
            Operation::Tuck => stack.tuck()?,

            // Splice and bitwise logic
            Operation::Size => {
                let size = stack.peek(0)?.len() as i64;
                stack.push_num(size);
            }
            Operation::Equal => {
                let equal = stack.pop()? == stack.pop()?;
                stack.push_bool(equal);
            }
            Operation::EqualVerify => {
                if stack.pop()? != stack.pop()? {
                    return Err(Error::Verify(op));
                }
            }

            // Arithmetic
            Operation::Add1 => {
                let n = stack.pop_num()?;
                stack.push_num((n + ScriptNum::from(1))?);
            }
            Operation::Sub1 => {
                let n = stack.pop_num()?;
                stack.push_num((n - ScriptNum::from(1))?);
            }
            Operation::Negate => {
                let n = stack.pop_num()?;
                stack.push_num((-n)?);
            }
            Operation::Abs => {
                let n = stack.pop_num()?;
                stack.push_num(n.abs());
            }
            Operation::Not => {
                let n = stack.pop_num()?;
                stack.push_num(n.is_zero());
            }
            Operation::NotEqual0 => {
                let n = stack.pop_num()?;
                stack.push_num(!n.is_zero());
            }
            Operation::Add | Operation::Sub => {
                let (a, b) = pop_pair(stack)?;
                let n = if pop.operation() == Operation::Add { a + b } else { a - b };
                stack.push_num(n?);
            }
            Operation::NumEqualVerify => {
                let (a, b) = pop_pair(stack)?;
                if a != b {
                    return Err(Error::Verify(op));
                }
            }
            Operation::BoolAnd
            | Operation::BoolOr
            | Operation::NumEqual
            | Operation::NumNotEqual
            | Operation::LessThan
            | Operation::GreaterThan
            | Operation::LessThanOrEqual
            | Operation::GreaterThanOrEqual => {
                let (a, b) = pop_pair(stack)?;
                let result = match pop.operation() {
                    Operation::BoolAnd => !a.is_zero() && !b.is_zero(),
                    Operation::BoolOr => !a.is_zero() || !b.is_zero(),
                    Operation::NumEqual => a == b,
                    Operation::NumNotEqual => a != b,
                    Operation::LessThan => a < b,
                    Operation::GreaterThan => a > b,
                    Operation::LessThanOrEqual => a <= b,
                    _ => a >= b,
                };
                stack.push_num(result);
            }
            Operation::Min => {
                let (a, b) = pop_pair(stack)?;
                stack.push_num(a.min(b));
            }
            Operation::Max => {
                let (a, b) = pop_pair(stack)?;
                stack.push_num(a.max(b));
            }
            Operation::Within => {
                let (min, max) = pop_pair(stack)?;
                let x = stack.pop_num()?;
                stack.push_bool((min..max).contains(&x));
            }

            // Crypto
            Operation::Ripemd160
            | Operation::Sha1
            | Operation::Sha256
            | Operation::Hash160
            | Operation::Hash256 => {
                let data = stack.pop()?;
                let digest = match pop.operation() {
                    Operation::Ripemd160 => ripemd160::Hash::hash(&data).to_byte_array().to_vec(),
                    Operation::Sha1 => sha1::Hash::hash(&data).to_byte_array().to_vec(),
                    Operation::Sha256 => sha256::Hash::hash(&data).to_byte_array().to_vec(),
                    Operation::Hash160 => hash160::Hash::hash(&data).to_byte_array().to_vec(),
                    _ => sha256d::Hash::hash(&data).to_byte_array().to_vec(),
                };
                stack.push(digest);
            }
            Operation::CodeSeparator => {
                self.last_code_separator = self.offset + 1;
            }
            Operation::CheckSig | Operation::CheckSigVerify => {
                // [sig pubkey] -> bool
                let pubkey = stack.pop()?;
                let sig = stack.pop()?;

                let success = self.check_sig(&sig, &pubkey)?;

                if pop.operation() == Operation::CheckSig {
                    self.stack.push_bool(success);
                } else if !success {
                    return Err(Error::Verify(op));
                }
            }
            Operation::CheckMultiSig | Operation::CheckMultiSigVerify => {
                let success = self.check_multisig()?;

                if pop.operation() == Operation::CheckMultiSig {
                    self.stack.push_bool(success);
                } else if !success {
                    return Err(Error::Verify(op));
                }
            }

            // Locktime
            Operation::CheckLockTimeVerify => {
                if !self.flags.contains(VerifyFlags::CHECKLOCKTIMEVERIFY) {
                    return self.upgradable_nop(op);
                }

                // Lock times are compared as 5-byte numbers to cover the full u32 range.
                let lock_time = stack.peek_num(ScriptNum::LOCK_TIME_NUM_SIZE)?;

                if lock_time.is_negative() {
                    return Err(Error::NegativeLockTime(lock_time.value()));
                }

                if !self.checker.check_lock_time(lock_time) {
                    return Err(Error::UnsatisfiedLockTime);
                }
            }
            Operation::CheckSequenceVerify => {
                if !self.flags.contains(VerifyFlags::CHECKSEQUENCEVERIFY) {
                    return self.upgradable_nop(op);
                }

                let sequence = stack.peek_num(ScriptNum::LOCK_TIME_NUM_SIZE)?;

                if sequence.is_negative() {
                    return Err(Error::NegativeLockTime(sequence.value()));
                }

                // Relative lock disabled, behaves as a NOP.
                if sequence.value() & i64::from(SEQUENCE_LOCKTIME_DISABLE_FLAG) != 0 {
                    return Ok(());
                }

                if !self.checker.check_sequence(sequence) {
                    return Err(Error::UnsatisfiedLockTime);
                }
            }

            Operation::UpgradableNop => return self.upgradable_nop(op),
            Operation::Disabled => return Err(Error::DisabledOpcode(op)),
            Operation::AlwaysIllegal | Operation::Reserved => {
                return Err(Error::ReservedOpcode(op));
            }
            Operation::Invalid => return Err(Error::InvalidOpcode(op)),
        }

        Ok(())
    }

    fn upgradable_nop(&self, op: Opcode) -> Result<(), Error> {
        if self.flags.contains(VerifyFlags::DISCOURAGE_UPGRADABLE_NOPS) {
            return Err(Error::DiscourageUpgradableNops(op));
        }
        Ok(())
    }

    // An empty signature is a valid way to fail a check.
    fn check_sig(&mut self, full_sig: &[u8], pubkey: &[u8]) -> Result<bool, Error> {
        let Some((&hash_type, sig)) = full_sig.split_last() else {
            return Ok(false);
        };

        check_hash_type_encoding(hash_type, self.flags)?;
        check_signature_encoding(sig)?;
        check_pubkey_encoding(pubkey, self.is_witness_v0(), self.flags)?;

        let script_code = self.sub_script();

        self.verify_signature(sig, hash_type, pubkey, &script_code)
    }

    /// Verifies a DER signature, without its hash type byte, against a
    /// serialized public key. Unparsable input is not a valid signature.
    pub(super) fn verify_signature(
        &mut self,
        sig: &[u8],
        hash_type: u8,
        pubkey: &[u8],
        script_code: &Script,
    ) -> Result<bool, Error> {
        let Ok(signature) = Signature::from_der(sig) else {
            return Ok(false);
        };

        let Ok(pubkey) = PublicKey::from_slice(pubkey) else {
            return Ok(false);
        };

        Ok(self.checker.check_ecdsa_signature(
            &signature,
            u32::from(hash_type),
            &pubkey,
            script_code,
        )?)
    }
}

// Pops `[... a b]`, returning `(a, b)`.
fn pop_pair(stack: &mut Stack) -> Result<(ScriptNum, ScriptNum), StackError> {
    let b = stack.pop_num()?;
    let a = stack.pop_num()?;
    Ok((a, b))
}
