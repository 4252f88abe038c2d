use super::Engine;
use crate::VerifyFlags;
use crate::constants::{MAX_OPS_PER_SCRIPT, MAX_PUBKEYS_PER_MULTISIG};
use crate::encoding::{check_hash_type_encoding, check_pubkey_encoding, check_signature_encoding};
use crate::error::Error;
use crate::signature_checker::SignatureChecker;

impl<C: SignatureChecker> Engine<C> {
    /// Evaluates OP_CHECKMULTISIG.
    ///
    /// Stack layout, top last:
    /// `[dummy] [sig 1] ... [sig m] <m> [pubkey 1] ... [pubkey n] <n>`
    ///
    /// Signatures must appear in the same order as the public keys they
    /// belong to. Each public key is tried at most once.
    pub(super) fn check_multisig(&mut self) -> Result<bool, Error> {
        let num_keys = self.stack.pop_num()?.value();
        if !(0..=MAX_PUBKEYS_PER_MULTISIG).contains(&num_keys) {
            return Err(Error::InvalidPubKeyCount(num_keys));
        }

        let num_keys = num_keys as usize;

        self.num_ops += num_keys;
        if self.num_ops > MAX_OPS_PER_SCRIPT {
            return Err(Error::TooManyOperations);
        }

        let mut pubkeys = Vec::with_capacity(num_keys);
        for _ in 0..num_keys {
            pubkeys.push(self.stack.pop()?);
        }

        let num_sigs = self.stack.pop_num()?.value();
        if num_sigs < 0 || num_sigs as usize > num_keys {
            return Err(Error::InvalidSignatureCount {
                count: num_sigs,
                max: num_keys,
            });
        }

        let num_sigs = num_sigs as usize;

        let mut sigs = Vec::with_capacity(num_sigs);
        for _ in 0..num_sigs {
            sigs.push(self.stack.pop()?);
        }

        // One extra element is consumed, a consensus quirk.
        let dummy = self.stack.pop()?;
        if self.flags.contains(VerifyFlags::NULLDUMMY) && !dummy.is_empty() {
            return Err(Error::NullDummy(dummy.len()));
        }

        let script_code = self.sub_script();
        let witness_v0 = self.is_witness_v0();

        let mut pubkeys = pubkeys.iter();
        let mut sigs_left = sigs.iter().peekable();

        while let Some(&full_sig) = sigs_left.peek() {
            // More signatures left than keys to match them.
            if pubkeys.len() < sigs_left.len() {
                return Ok(false);
            }

            let Some(pubkey) = pubkeys.next() else {
                return Ok(false);
            };

            let Some((&hash_type, sig)) = full_sig.split_last() else {
                continue;
            };

            check_hash_type_encoding(hash_type, self.flags)?;
            check_signature_encoding(sig)?;
            check_pubkey_encoding(pubkey, witness_v0, self.flags)?;

            if self.verify_signature(sig, hash_type, pubkey, &script_code)? {
                sigs_left.next();
            }
        }

        Ok(true)
    }
}
