mod common;

use alloy::primitives::{address, keccak256, Address, Bytes, B256, U256};
use alloy::signers::SignerSync;

use rusty_safe_multisig_core::{Signature, SignatureSet, Signed};

use common::{owner_address, owner_signer, sign};

fn digest() -> B256 {
    keccak256(b"safe tx digest")
}

#[test]
fn eoa_signature_recovers_owner() {
    let sig = sign(0, digest());
    assert!(matches!(sig.v(), Some(27) | Some(28)));
    assert_eq!(sig.recover(digest()).expect("recover"), owner_address(0));
    sig.verify(digest()).expect("signature verifies");
}

#[test]
fn signature_from_wrong_owner_is_rejected() {
    let mut sig = sign(1, digest());
    sig.signer = owner_address(0);
    let err = sig.verify(digest()).expect_err("must fail");
    assert!(err.to_string().contains("recovers to"));
}

#[test]
fn eth_sign_signature_uses_shifted_v() {
    let signer = owner_signer(2);
    let raw = signer
        .sign_message_sync(digest().as_slice())
        .expect("eth_sign");
    let mut bytes = raw.as_bytes().to_vec();
    bytes[64] += 4;
    let sig = Signature::eoa(signer.address(), bytes).expect("65 bytes");
    assert!(matches!(sig.v(), Some(31) | Some(32)));
    sig.verify(digest()).expect("eth_sign signature verifies");
}

#[test]
fn v_zero_is_not_recoverable() {
    let mut bytes = vec![0x11; 65];
    bytes[64] = 0;
    let sig = Signature::eoa(owner_address(0), bytes).expect("65 bytes");
    let err = sig.recover(digest()).expect_err("must fail");
    assert!(err.to_string().contains("not ECDSA"));
}

#[test]
fn zero_signer_is_rejected() {
    let err = Signature::contract(Address::ZERO, vec![1u8]).expect_err("must fail");
    assert!(err.to_string().contains("zero address"));
}

#[test]
fn mixed_case_signer_requires_checksum() {
    let data = format!("0x{}", "11".repeat(64) + "1b");
    Signature::from_parts("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266", &data, false)
        .expect("valid checksum");
    let err = Signature::from_parts("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92267", &data, false)
        .expect_err("must fail");
    assert!(err.to_string().contains("checksum"));
}

#[test]
fn adding_the_same_signature_twice_is_idempotent() {
    let sig = sign(0, digest());
    let once = SignatureSet::new().with(sig.clone());
    let twice = once.clone().with(sig);
    assert_eq!(once, twice);
    assert_eq!(twice.len(), 1);
}

#[test]
fn later_signature_from_same_signer_replaces_earlier() {
    let first = sign(0, digest());
    let second = sign(0, keccak256(b"other digest"));
    let set = SignatureSet::new().with(first).with(second.clone());
    assert_eq!(set.len(), 1);
    assert_eq!(set.get(owner_address(0)), Some(&second));
}

#[test]
fn merge_is_commutative_and_idempotent() {
    let shared = address!("0x00000000000000000000000000000000000000cc");
    let a = SignatureSet::new()
        .with(sign(0, digest()))
        .with(Signature::contract(shared, vec![0x01, 0x02]).expect("contract sig"));
    let b = SignatureSet::new()
        .with(sign(1, digest()))
        .with(Signature::contract(shared, vec![0x09]).expect("contract sig"));

    let ab = a.merge(&b);
    let ba = b.merge(&a);
    assert_eq!(ab, ba);
    assert_eq!(ab.len(), 3);
    assert_eq!(ab.merge(&ab), ab);
    assert_eq!(ab.merge(&SignatureSet::new()), ab);
}

#[test]
fn threshold_counts_distinct_signers() {
    let set: SignatureSet = [sign(0, digest()), sign(0, digest()), sign(1, digest())]
        .into_iter()
        .collect();
    assert!(set.is_threshold_met(2));
    assert!(!set.is_threshold_met(3));
}

#[test]
fn encoding_orders_by_signer_and_appends_contract_data() {
    let low = address!("0x0000000000000000000000000000000000000001");
    let high = address!("0xffffffffffffffffffffffffffffffffffffff01");
    let mut eoa_bytes = vec![0x22; 65];
    eoa_bytes[64] = 27;
    let eoa = Signature::eoa(high, eoa_bytes.clone()).expect("eoa");
    let contract = Signature::contract(low, vec![0xab, 0xcd, 0xef]).expect("contract");

    let encoded = SignatureSet::new().with(eoa).with(contract).encode();

    let mut expected = Vec::new();
    // contract slot for `low`: signer, offset to dynamic part (2 * 65), v = 0
    expected.extend_from_slice(&[0u8; 12]);
    expected.extend_from_slice(low.as_slice());
    expected.extend_from_slice(&U256::from(130).to_be_bytes::<32>());
    expected.push(0);
    expected.extend_from_slice(&eoa_bytes);
    expected.extend_from_slice(&U256::from(3).to_be_bytes::<32>());
    expected.extend_from_slice(&[0xab, 0xcd, 0xef]);
    assert_eq!(encoded, Bytes::from(expected));
}

#[test]
fn encoding_is_independent_of_insertion_order() {
    let sigs = [sign(0, digest()), sign(1, digest()), sign(2, digest())];
    let forward: SignatureSet = sigs.iter().cloned().collect();
    let backward: SignatureSet = sigs.iter().rev().cloned().collect();
    assert_eq!(forward.encode(), backward.encode());
    assert_eq!(forward.encode().len(), 3 * 65);

    let signers: Vec<Address> = forward.signers().collect();
    let mut sorted = signers.clone();
    sorted.sort();
    assert_eq!(signers, sorted);
}

#[test]
fn signed_merge_keeps_local_data() {
    let local = Signed::new("local").with_signature(sign(0, digest()));
    let remote = Signed::new("remote").with_signature(sign(1, digest()));
    let merged = local.merge(&remote);
    assert_eq!(merged.data, "local");
    assert!(merged.is_threshold_met(2));
}

#[test]
fn deserializing_short_eoa_signature_fails() {
    let json = serde_json::json!([{
        "signer": "0x0000000000000000000000000000000000000001",
        "data": "0x1234",
        "isContractSignature": false
    }]);
    let err = serde_json::from_value::<SignatureSet>(json).expect_err("must fail");
    assert!(err.to_string().contains("65 bytes"));
}
