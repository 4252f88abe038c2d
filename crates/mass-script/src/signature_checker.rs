use crate::constants::{
    LOCK_TIME_THRESHOLD, MAX_TX_IN_SEQUENCE_NUM, SEQUENCE_LOCK_TIME_IS_SECONDS,
    SEQUENCE_LOCK_TIME_MASK, SEQUENCE_LOCKTIME_DISABLE_FLAG,
};
use crate::num::ScriptNum;
use crate::sig_cache::SigCache;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, VerifyOnly};
use bitcoin::sighash::SighashCache;
use bitcoin::{Amount, EcdsaSighashType, Script, Transaction};

/// Errors computing the message a signature commits to.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    #[error("failed to compute signature hash: {0}")]
    Sighash(String),
}

/// Checks transaction signatures and lock times on behalf of the engine.
pub trait SignatureChecker {
    /// Returns whether `sig` is a valid signature by `pubkey` over the
    /// spending transaction, committing to `script_code` under `hash_type`.
    fn check_ecdsa_signature(
        &mut self,
        sig: &Signature,
        hash_type: u32,
        pubkey: &PublicKey,
        script_code: &Script,
    ) -> Result<bool, SignatureError>;

    /// BIP65 check of a non-negative stack lock time against the transaction.
    fn check_lock_time(&self, lock_time: ScriptNum) -> bool;

    /// BIP112 check of a non-negative stack sequence against the spent input.
    fn check_sequence(&self, sequence: ScriptNum) -> bool;
}

/// Skips every check.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSignatureCheck;

impl SignatureChecker for NoSignatureCheck {
    fn check_ecdsa_signature(
        &mut self,
        _sig: &Signature,
        _hash_type: u32,
        _pubkey: &PublicKey,
        _script_code: &Script,
    ) -> Result<bool, SignatureError> {
        Ok(true)
    }

    fn check_lock_time(&self, _lock_time: ScriptNum) -> bool {
        true
    }

    fn check_sequence(&self, _sequence: ScriptNum) -> bool {
        true
    }
}

/// Checks signatures against one input of a transaction.
///
/// Signature hashes follow BIP143 over the spent `amount`.
pub struct TransactionSignatureChecker<'a> {
    tx: &'a Transaction,
    input_index: usize,
    amount: Amount,
    sighash_cache: SighashCache<&'a Transaction>,
    sig_cache: Option<&'a SigCache>,
    secp: Secp256k1<VerifyOnly>,
}

impl<'a> TransactionSignatureChecker<'a> {
    pub fn new(
        tx: &'a Transaction,
        input_index: usize,
        amount: Amount,
        sig_cache: Option<&'a SigCache>,
    ) -> Self {
        Self {
            tx,
            input_index,
            amount,
            sighash_cache: SighashCache::new(tx),
            sig_cache,
            secp: Secp256k1::verification_only(),
        }
    }

    fn input_sequence(&self) -> Option<u32> {
        self.tx
            .input
            .get(self.input_index)
            .map(|input| input.sequence.0)
    }
}

// Both lock times must be of the same kind (height or time), and the
// required one must not exceed the one of the transaction.
fn verify_lock_time(tx_lock_time: i64, threshold: i64, lock_time: i64) -> bool {
    let same_kind = (tx_lock_time < threshold && lock_time < threshold)
        || (tx_lock_time >= threshold && lock_time >= threshold);

    same_kind && lock_time <= tx_lock_time
}

impl SignatureChecker for TransactionSignatureChecker<'_> {
    fn check_ecdsa_signature(
        &mut self,
        sig: &Signature,
        hash_type: u32,
        pubkey: &PublicKey,
        script_code: &Script,
    ) -> Result<bool, SignatureError> {
        let sighash = self
            .sighash_cache
            .p2wsh_signature_hash(
                self.input_index,
                script_code,
                self.amount,
                EcdsaSighashType::from_consensus(hash_type),
            )
            .map_err(|err| SignatureError::Sighash(err.to_string()))?;

        let digest = sighash.to_byte_array();

        if let Some(sig_cache) = self.sig_cache {
            if sig_cache.exists(&digest, sig, pubkey) {
                return Ok(true);
            }
        }

        let msg = Message::from_digest(digest);
        let valid = self.secp.verify_ecdsa(&msg, sig, pubkey).is_ok();

        if valid {
            if let Some(sig_cache) = self.sig_cache {
                sig_cache.add(digest, *sig, *pubkey);
            }
        }

        Ok(valid)
    }

    fn check_lock_time(&self, lock_time: ScriptNum) -> bool {
        let tx_lock_time = i64::from(self.tx.lock_time.to_consensus_u32());

        if !verify_lock_time(tx_lock_time, LOCK_TIME_THRESHOLD, lock_time.value()) {
            return false;
        }

        // A finalized input opts out of lock time enforcement altogether.
        self.input_sequence()
            .is_some_and(|sequence| sequence != MAX_TX_IN_SEQUENCE_NUM)
    }

    fn check_sequence(&self, sequence: ScriptNum) -> bool {
        if self.tx.version.0 < 2 {
            return false;
        }

        let Some(tx_sequence) = self.input_sequence() else {
            return false;
        };

        if tx_sequence & SEQUENCE_LOCKTIME_DISABLE_FLAG != 0 {
            return false;
        }

        let mask = i64::from(SEQUENCE_LOCK_TIME_IS_SECONDS | SEQUENCE_LOCK_TIME_MASK);

        verify_lock_time(
            i64::from(tx_sequence) & mask,
            i64::from(SEQUENCE_LOCK_TIME_IS_SECONDS),
            sequence.value() & mask,
        )
    }
}
