use clap::Parser;
use mass_script::VerifyFlags;

/// Script verification flags, all disabled by default.
#[derive(Debug, Clone, Default, Parser)]
pub struct VerifyFlagParams {
    /// Reject non-canonical hash types and public keys.
    #[clap(long)]
    pub strict_encoding: bool,

    /// Require data pushes and numbers to use their shortest encoding.
    #[clap(long)]
    pub minimal_data: bool,

    /// Fail on the NOP opcodes reserved for soft forks.
    #[clap(long)]
    pub discourage_upgradable_nops: bool,

    /// Enforce OP_CHECKLOCKTIMEVERIFY instead of treating it as a NOP.
    #[clap(long)]
    pub check_lock_time: bool,

    /// Enforce OP_CHECKSEQUENCEVERIFY instead of treating it as a NOP.
    #[clap(long)]
    pub check_sequence: bool,

    /// Require the extra element consumed by OP_CHECKMULTISIG to be empty.
    #[clap(long)]
    pub null_dummy: bool,
}

impl VerifyFlagParams {
    pub fn verify_flags(&self) -> VerifyFlags {
        [
            (self.strict_encoding, VerifyFlags::STRICTENC),
            (self.minimal_data, VerifyFlags::MINIMALDATA),
            (
                self.discourage_upgradable_nops,
                VerifyFlags::DISCOURAGE_UPGRADABLE_NOPS,
            ),
            (self.check_lock_time, VerifyFlags::CHECKLOCKTIMEVERIFY),
            (self.check_sequence, VerifyFlags::CHECKSEQUENCEVERIFY),
            (self.null_dummy, VerifyFlags::NULLDUMMY),
        ]
        .into_iter()
        .filter(|(enabled, _)| *enabled)
        .fold(VerifyFlags::empty(), |flags, (_, flag)| flags | flag)
    }
}
