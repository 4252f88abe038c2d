use super::*;
use crate::verify_input;
use bitcoin::opcodes::all::OP_CLTV;
use hex_literal::hex;

const NON_FINAL: u32 = 0xffff_fffe;

fn spend(
    redeem_script: &[u8],
    version: i32,
    lock_time: u32,
    sequence: u32,
    flags: VerifyFlags,
) -> Result<(), Error> {
    let tx = spending_tx(
        version,
        lock_time,
        sequence,
        vec![hex!("51").to_vec(), redeem_script.to_vec()],
    );
    verify_input(&p2wsh(redeem_script), &tx, 0, Amount::from_sat(1_000), flags, None)
}

#[test]
fn test_check_lock_time_verify() {
    init_logger();

    // OP_DROP <1000> OP_CLTV OP_DROP OP_TRUE
    let redeem_script = hex!("75 02e803 b1 75 51");
    let flags = VerifyFlags::CHECKLOCKTIMEVERIFY;

    assert_eq!(spend(&redeem_script, 1, 1500, NON_FINAL, flags), Ok(()));
    assert_eq!(spend(&redeem_script, 1, 1000, NON_FINAL, flags), Ok(()));
    assert_eq!(
        spend(&redeem_script, 1, 900, NON_FINAL, flags),
        Err(Error::UnsatisfiedLockTime)
    );
    // A height can not be satisfied by a timestamp.
    assert_eq!(
        spend(&redeem_script, 1, 500_000_001, NON_FINAL, flags),
        Err(Error::UnsatisfiedLockTime)
    );
    assert_eq!(
        spend(&redeem_script, 1, 1500, 0xffff_ffff, flags),
        Err(Error::UnsatisfiedLockTime)
    );
}

#[test]
fn test_lock_time_operand() {
    let flags = VerifyFlags::CHECKLOCKTIMEVERIFY;

    assert_eq!(
        spend(&hex!("75 4f b1 75 51"), 1, 1500, NON_FINAL, flags),
        Err(Error::NegativeLockTime(-1))
    );
    assert_eq!(
        spend(&hex!("75 b1"), 1, 1500, NON_FINAL, flags),
        Err(Error::Stack(crate::StackError::EmptyStack))
    );

    // Lock times beyond the 4-byte range take 5 bytes.
    let redeem_script = hex!("75 05 0000008000 b1 75 51");
    assert_eq!(spend(&redeem_script, 1, 0xffff_fffe, NON_FINAL, flags), Ok(()));
    assert_eq!(
        spend(&hex!("75 06 000000800000 b1 75 51"), 1, 0xffff_fffe, NON_FINAL, flags),
        Err(Error::Stack(crate::StackError::Num(crate::NumError::Overflow {
            len: 6,
            max: 5
        })))
    );
}

#[test]
fn test_lock_time_opcodes_without_flags() {
    let redeem_script = hex!("75 02e803 b1 75 51");

    assert_eq!(
        spend(&redeem_script, 1, 0, NON_FINAL, VerifyFlags::empty()),
        Ok(())
    );
    assert_eq!(
        spend(
            &redeem_script,
            1,
            0,
            NON_FINAL,
            VerifyFlags::DISCOURAGE_UPGRADABLE_NOPS
        ),
        Err(Error::DiscourageUpgradableNops(OP_CLTV))
    );
    assert_eq!(
        spend(&hex!("75 5a b2 75 51"), 1, 0, 0, VerifyFlags::empty()),
        Ok(())
    );
}

#[test]
fn test_check_sequence_verify() {
    // OP_DROP <10> OP_CSV OP_DROP OP_TRUE
    let redeem_script = hex!("75 5a b2 75 51");
    let flags = VerifyFlags::CHECKSEQUENCEVERIFY;

    assert_eq!(spend(&redeem_script, 2, 0, 10, flags), Ok(()));
    assert_eq!(spend(&redeem_script, 2, 0, 25, flags), Ok(()));
    assert_eq!(
        spend(&redeem_script, 2, 0, 5, flags),
        Err(Error::UnsatisfiedLockTime)
    );
    // Relative lock times require version 2 transactions.
    assert_eq!(
        spend(&redeem_script, 1, 0, 10, flags),
        Err(Error::UnsatisfiedLockTime)
    );
    // Relative lock time disabled on the input.
    assert_eq!(
        spend(&redeem_script, 2, 0, (1 << 31) | 10, flags),
        Err(Error::UnsatisfiedLockTime)
    );
    // Blocks versus seconds.
    assert_eq!(
        spend(&redeem_script, 2, 0, (1 << 22) | 10, flags),
        Err(Error::UnsatisfiedLockTime)
    );
}

#[test]
fn test_check_sequence_verify_disabled_operand() {
    // The disable bit on the operand turns the check into a NOP.
    let redeem_script = hex!("75 05 0000008000 b2 75 51");
    assert_eq!(
        spend(&redeem_script, 1, 0, 0, VerifyFlags::CHECKSEQUENCEVERIFY),
        Ok(())
    );

    assert_eq!(
        spend(&hex!("75 4f b2 75 51"), 2, 0, 10, VerifyFlags::CHECKSEQUENCEVERIFY),
        Err(Error::NegativeLockTime(-1))
    );
}
