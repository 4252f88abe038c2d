use super::*;
use crate::{EncodingError, SigCache, verify_input, verify_transaction_inputs};
use bitcoin::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use bitcoin::sighash::SighashCache;
use bitcoin::{EcdsaSighashType, Script};
use hex_literal::hex;

const AMOUNT: Amount = Amount::from_sat(50_000);

fn secret_key(seed: u8) -> SecretKey {
    SecretKey::from_slice(&[seed; 32]).unwrap()
}

fn pubkey(seed: u8) -> Vec<u8> {
    let secp = Secp256k1::new();
    PublicKey::from_secret_key(&secp, &secret_key(seed))
        .serialize()
        .to_vec()
}

/// DER signature of input `input_index` committing to `script_code`,
/// followed by the SIGHASH_ALL byte.
fn sign(
    tx: &Transaction,
    input_index: usize,
    script_code: &[u8],
    amount: Amount,
    seed: u8,
) -> Vec<u8> {
    let sighash = SighashCache::new(tx)
        .p2wsh_signature_hash(
            input_index,
            Script::from_bytes(script_code),
            amount,
            EcdsaSighashType::All,
        )
        .unwrap();

    let secp = Secp256k1::new();
    let sig = secp.sign_ecdsa(
        &Message::from_digest(sighash.to_byte_array()),
        &secret_key(seed),
    );

    let mut sig = sig.serialize_der().to_vec();
    sig.push(EcdsaSighashType::All as u8);
    sig
}

/// `<pubkey> OP_CHECKSIG`
fn checksig_script(pubkey: &[u8]) -> Vec<u8> {
    let mut script = push(pubkey);
    script.push(0xac);
    script
}

/// `<m> <pubkey 1> ... <pubkey n> <n> OP_CHECKMULTISIG`
fn multisig_script(required: u8, seeds: &[u8]) -> Vec<u8> {
    let mut script = vec![0x50 + required];
    for &seed in seeds {
        script.extend(push(&pubkey(seed)));
    }
    script.push(0x50 + seeds.len() as u8);
    script.push(0xae);
    script
}

/// Signs `redeem_script` with each of `seeds` and builds the spending transaction.
fn signed_spend(redeem_script: &[u8], dummy: Option<&[u8]>, seeds: &[u8]) -> Transaction {
    let mut tx = spending_tx(1, 0, 0xffff_ffff, Vec::new());

    let mut sig_script = dummy.map(<[u8]>::to_vec).unwrap_or_default();
    for &seed in seeds {
        sig_script.extend(push(&sign(&tx, 0, redeem_script, AMOUNT, seed)));
    }

    tx.input[0].witness = Witness::from_slice(&[sig_script, redeem_script.to_vec()]);
    tx
}

#[test]
fn test_checksig() {
    init_logger();

    let redeem_script = checksig_script(&pubkey(1));
    let locking_script = p2wsh(&redeem_script);
    let tx = signed_spend(&redeem_script, None, &[1]);
    let flags = VerifyFlags::STRICTENC | VerifyFlags::MINIMALDATA;

    let sig_cache = SigCache::new(100);
    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, flags, Some(&sig_cache)),
        Ok(())
    );
    assert_eq!(sig_cache.len(), 1);

    // Served from the cache the second time.
    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, flags, Some(&sig_cache)),
        Ok(())
    );
    assert_eq!(sig_cache.len(), 1);

    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, flags, None),
        Ok(())
    );
}

#[test]
fn test_checksig_commits_to_amount_and_key() {
    let redeem_script = checksig_script(&pubkey(1));
    let locking_script = p2wsh(&redeem_script);
    let sig_cache = SigCache::new(100);

    let tx = signed_spend(&redeem_script, None, &[1]);
    assert_eq!(
        verify_input(
            &locking_script,
            &tx,
            0,
            Amount::from_sat(49_999),
            VerifyFlags::STRICTENC,
            Some(&sig_cache)
        ),
        Err(Error::ScriptFailed)
    );
    assert!(sig_cache.is_empty());

    let tx = signed_spend(&redeem_script, None, &[2]);
    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, VerifyFlags::STRICTENC, None),
        Err(Error::ScriptFailed)
    );
}

#[test]
fn test_checksig_commits_to_code_separator() {
    let pubkey = pubkey(3);
    let mut redeem_script = vec![0xab];
    redeem_script.extend(checksig_script(&pubkey));
    let locking_script = p2wsh(&redeem_script);

    // Only the part after the separator is signed.
    let mut tx = spending_tx(1, 0, 0xffff_ffff, Vec::new());
    let sig = sign(&tx, 0, &redeem_script[1..], AMOUNT, 3);
    tx.input[0].witness = Witness::from_slice(&[push(&sig), redeem_script.clone()]);
    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, VerifyFlags::empty(), None),
        Ok(())
    );

    let tx = signed_spend(&redeem_script, None, &[3]);
    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, VerifyFlags::empty(), None),
        Err(Error::ScriptFailed)
    );
}

#[test]
fn test_witness_v0_requires_compressed_key() {
    let secp = Secp256k1::new();
    let uncompressed = PublicKey::from_secret_key(&secp, &secret_key(1)).serialize_uncompressed();
    let redeem_script = checksig_script(&uncompressed);
    let tx = signed_spend(&redeem_script, None, &[1]);

    assert_eq!(
        verify_input(&p2wsh(&redeem_script), &tx, 0, AMOUNT, VerifyFlags::empty(), None),
        Err(Error::Encoding(EncodingError::WitnessPubKeyType))
    );
}

#[test]
fn test_high_s_signature_is_rejected() {
    // r = 1, s = n - 1
    let high_s = hex!(
        "3026 020101"
        "0221 00fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364140"
        "01"
    );
    let redeem_script = checksig_script(&pubkey(1));

    assert_eq!(
        run_witness(
            &p2wsh(&redeem_script),
            vec![push(&high_s), redeem_script.clone()],
            VerifyFlags::empty()
        ),
        Err(Error::Encoding(EncodingError::HighS))
    );
}

#[test]
fn test_strict_hash_type() {
    let redeem_script = checksig_script(&pubkey(1));
    let locking_script = p2wsh(&redeem_script);

    let mut tx = spending_tx(1, 0, 0xffff_ffff, Vec::new());
    let mut sig = sign(&tx, 0, &redeem_script, AMOUNT, 1);
    *sig.last_mut().unwrap() = 0x04;
    tx.input[0].witness = Witness::from_slice(&[push(&sig), redeem_script.clone()]);

    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, VerifyFlags::STRICTENC, None),
        Err(Error::Encoding(EncodingError::InvalidHashType(0x04)))
    );
}

#[test]
fn test_empty_signature_fails_check() {
    let redeem_script = checksig_script(&pubkey(1));
    assert_eq!(
        run_witness(
            &p2wsh(&redeem_script),
            vec![hex!("00").to_vec(), redeem_script.clone()],
            VerifyFlags::STRICTENC
        ),
        Err(Error::ScriptFailed)
    );

    // <pubkey> OP_CHECKSIGVERIFY OP_TRUE
    let mut redeem_script = push(&pubkey(1));
    redeem_script.extend([0xad, 0x51]);
    assert_eq!(
        run_witness(
            &p2wsh(&redeem_script),
            vec![hex!("00").to_vec(), redeem_script.clone()],
            VerifyFlags::STRICTENC
        ),
        Err(Error::Verify(bitcoin::opcodes::all::OP_CHECKSIGVERIFY))
    );
}

#[test]
fn test_multisig() {
    let redeem_script = multisig_script(2, &[1, 2, 3]);
    let locking_script = p2wsh(&redeem_script);
    let flags = VerifyFlags::STRICTENC | VerifyFlags::NULLDUMMY;

    for seeds in [[1, 2], [1, 3], [2, 3]] {
        let tx = signed_spend(&redeem_script, Some(&[0x00][..]), &seeds);
        assert_eq!(
            verify_input(&locking_script, &tx, 0, AMOUNT, flags, None),
            Ok(()),
            "signed by {seeds:?}"
        );
    }

    // Signatures out of key order.
    let tx = signed_spend(&redeem_script, Some(&[0x00][..]), &[2, 1]);
    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, flags, None),
        Err(Error::ScriptFailed)
    );

    // Signature by a key not in the script.
    let tx = signed_spend(&redeem_script, Some(&[0x00][..]), &[1, 4]);
    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, flags, None),
        Err(Error::ScriptFailed)
    );
}

#[test]
fn test_multisig_dummy() {
    let redeem_script = multisig_script(1, &[1, 2]);
    let locking_script = p2wsh(&redeem_script);
    let tx = signed_spend(&redeem_script, Some(&[0x51][..]), &[2]);

    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, VerifyFlags::NULLDUMMY, None),
        Err(Error::NullDummy(1))
    );
    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, VerifyFlags::empty(), None),
        Ok(())
    );

    // Without a dummy the last signature gets consumed in its place.
    let tx = signed_spend(&redeem_script, None, &[2]);
    assert_eq!(
        verify_input(&locking_script, &tx, 0, AMOUNT, VerifyFlags::empty(), None),
        Err(Error::Stack(crate::StackError::EmptyStack))
    );
}

#[test]
fn test_multisig_counts() {
    let run = |redeem_script: &[u8]| {
        run_witness(
            &p2wsh(redeem_script),
            vec![hex!("00").to_vec(), redeem_script.to_vec()],
            VerifyFlags::empty(),
        )
    };

    assert_eq!(run(&hex!("01 15 ae")), Err(Error::InvalidPubKeyCount(21)));
    assert_eq!(run(&hex!("4f ae")), Err(Error::InvalidPubKeyCount(-1)));
    assert_eq!(
        run(&hex!("53 01 02 51 ae")),
        Err(Error::InvalidSignatureCount { count: 3, max: 1 })
    );
    assert_eq!(
        run(&hex!("4f 01 02 51 ae")),
        Err(Error::InvalidSignatureCount { count: -1, max: 1 })
    );
    // 0-of-0 succeeds with only the dummy consumed.
    assert_eq!(run(&hex!("00 00 ae")), Ok(()));
}

#[test]
fn test_multisig_keys_count_as_operations() {
    // Every public key of a multisig counts as one operation.
    let mut redeem_script = Vec::new();
    for _ in 0..10 {
        redeem_script.extend(hex!("00"));
        redeem_script.extend(hex!("00"));
        redeem_script.extend(std::iter::repeat_n(0x51, 20));
        redeem_script.extend(hex!("01 14 ae 75"));
    }
    redeem_script.push(0x51);

    assert_eq!(
        run_witness(
            &p2wsh(&redeem_script),
            vec![hex!("51").to_vec(), redeem_script.clone()],
            VerifyFlags::empty()
        ),
        Err(Error::TooManyOperations)
    );
}

#[test]
fn test_verify_transaction_inputs() {
    let checksig_redeem = checksig_script(&pubkey(5));
    let plain_redeem = hex!("75 51").to_vec();

    let mut tx = spending_tx(1, 0, 0xffff_ffff, Vec::new());
    tx.input.push(tx.input[0].clone());

    let sig = sign(&tx, 0, &checksig_redeem, AMOUNT, 5);
    tx.input[0].witness = Witness::from_slice(&[push(&sig), checksig_redeem.clone()]);
    tx.input[1].witness = Witness::from_slice(&[hex!("51").to_vec(), plain_redeem.clone()]);

    let spent_outputs = vec![
        TxOut {
            value: AMOUNT,
            script_pubkey: ScriptBuf::from_bytes(p2wsh(&checksig_redeem)),
        },
        TxOut {
            value: Amount::from_sat(1_000),
            script_pubkey: ScriptBuf::from_bytes(p2wsh(&plain_redeem)),
        },
    ];

    let sig_cache = SigCache::new(10);
    assert_eq!(
        verify_transaction_inputs(&tx, &spent_outputs, VerifyFlags::STRICTENC, Some(&sig_cache)),
        vec![Ok(()), Ok(())]
    );
    assert_eq!(sig_cache.len(), 1);

    assert_eq!(
        verify_transaction_inputs(&tx, &spent_outputs[..1], VerifyFlags::STRICTENC, None),
        vec![
            Ok(()),
            Err(Error::Witness(crate::WitnessError::InvalidInputIndex {
                index: 1,
                inputs: 1
            }))
        ]
    );

    // Input 1 does not reveal the redeem script committed to by its output.
    let swapped = [spent_outputs[0].clone(), spent_outputs[0].clone()];
    let results = verify_transaction_inputs(&tx, &swapped, VerifyFlags::empty(), None);
    assert_eq!(results[0], Ok(()));
    assert_eq!(
        results[1],
        Err(Error::Witness(crate::WitnessError::WitnessProgramMismatch {
            program: p2wsh(&checksig_redeem)[2..].to_vec()
        }))
    );
}

#[test]
fn test_verify_transaction_inputs_keeps_input_order() {
    let passing_redeem = hex!("75 51").to_vec();
    let failing_redeem = hex!("75 00").to_vec();

    let mut tx = spending_tx(1, 0, 0xffff_ffff, Vec::new());
    let template = tx.input[0].clone();
    tx.input = (0..200)
        .map(|index| {
            let mut input = template.clone();
            let redeem = if index % 2 == 0 { &passing_redeem } else { &failing_redeem };
            input.witness = Witness::from_slice(&[hex!("51").to_vec(), redeem.clone()]);
            input
        })
        .collect();

    let spent_outputs = (0..200)
        .map(|index| {
            let redeem = if index % 2 == 0 { &passing_redeem } else { &failing_redeem };
            TxOut {
                value: Amount::from_sat(1_000),
                script_pubkey: ScriptBuf::from_bytes(p2wsh(redeem)),
            }
        })
        .collect::<Vec<_>>();

    let results = verify_transaction_inputs(&tx, &spent_outputs, VerifyFlags::empty(), None);
    assert_eq!(results.len(), 200);
    for (index, result) in results.iter().enumerate() {
        assert_eq!(result.is_ok(), index % 2 == 0, "input {index}: {result:?}");
    }
}
