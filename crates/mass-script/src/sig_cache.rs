use bitcoin::secp256k1::PublicKey;
use bitcoin::secp256k1::ecdsa::Signature;
use parking_lot::Mutex;
use schnellru::{ByLength, LruMap};

#[derive(Debug, Clone, PartialEq, Eq)]
struct SigCacheEntry {
    sig: Signature,
    pubkey: PublicKey,
}

/// Cache of ECDSA signatures already verified successfully, keyed by sighash.
///
/// Shared between concurrent validations. Only successful verifications are
/// stored, so a lookup can shortcut a verification but never change its result.
/// A full cache evicts the least recently used entry.
pub struct SigCache {
    entries: Mutex<LruMap<[u8; 32], SigCacheEntry, ByLength>>,
    max_entries: usize,
}

impl std::fmt::Debug for SigCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigCache")
            .field("len", &self.len())
            .field("max_entries", &self.max_entries)
            .finish()
    }
}

impl SigCache {
    /// Creates a cache holding at most `max_entries` signatures. Zero disables caching.
    pub fn new(max_entries: usize) -> Self {
        let limit = u32::try_from(max_entries).unwrap_or(u32::MAX);
        Self {
            entries: Mutex::new(LruMap::new(ByLength::new(limit))),
            max_entries,
        }
    }

    /// Returns true if `sig` over `sighash` was already verified against `pubkey`.
    ///
    /// A hit marks the entry as recently used.
    pub fn exists(&self, sighash: &[u8; 32], sig: &Signature, pubkey: &PublicKey) -> bool {
        self.entries
            .lock()
            .get(sighash)
            .is_some_and(|entry| entry.sig == *sig && entry.pubkey == *pubkey)
    }

    /// Records a successful verification.
    pub fn add(&self, sighash: [u8; 32], sig: Signature, pubkey: PublicKey) {
        if self.max_entries == 0 {
            return;
        }

        self.entries
            .lock()
            .insert(sighash, SigCacheEntry { sig, pubkey });
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
