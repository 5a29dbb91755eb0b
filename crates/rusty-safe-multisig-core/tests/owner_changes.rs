use alloy::primitives::{address, Address, U256};
use alloy::sol_types::SolCall;

use rusty_safe_multisig_core::contracts::ISafe;
use rusty_safe_multisig_core::{
    decode_multisend_calldata, plan_owner_changes, prev_owner, ContractSet, CoreError, Operation,
    OwnerChange, OwnerOperation, SENTINEL_OWNERS,
};

const A: Address = address!("0x00000000000000000000000000000000000000a1");
const B: Address = address!("0x00000000000000000000000000000000000000b2");
const C: Address = address!("0x00000000000000000000000000000000000000c3");
const D: Address = address!("0x00000000000000000000000000000000000000d4");
const SAFE: Address = address!("0x000000000000000000000000000000000000beef");

#[test]
fn prev_owner_of_head_is_sentinel() {
    let owners = [A, B, C];
    assert_eq!(prev_owner(&owners, A).expect("head"), SENTINEL_OWNERS);
    assert_eq!(prev_owner(&owners, C).expect("tail"), B);
    assert!(matches!(
        prev_owner(&owners, D).expect_err("must fail"),
        CoreError::OwnerNotFound(missing) if missing == D
    ));
}

#[test]
fn one_removal_and_one_addition_become_a_swap() {
    let plan = plan_owner_changes(
        &[A, B, C],
        2,
        &[OwnerChange::Remove(B), OwnerChange::Add(D)],
        2,
    )
    .expect("plan");
    assert_eq!(
        plan.operations,
        vec![OwnerOperation::SwapOwner {
            prev_owner: A,
            old_owner: B,
            new_owner: D,
        }]
    );
    assert_eq!(plan.final_owners, vec![A, D, C]);

    let tx = plan
        .to_transaction(SAFE, ContractSet::default().multi_send)
        .expect("transaction");
    assert_eq!(tx.to, SAFE);
    assert_eq!(tx.operation, Operation::Call);
    let call = ISafe::swapOwnerCall::abi_decode(&tx.data, true).expect("swapOwner calldata");
    assert_eq!(call.prevOwner, A);
    assert_eq!(call.oldOwner, B);
    assert_eq!(call.newOwner, D);
}

#[test]
fn threshold_change_is_batched_last() {
    let plan = plan_owner_changes(&[A, B, C], 2, &[OwnerChange::Add(D)], 3).expect("plan");
    assert_eq!(
        plan.operations,
        vec![
            OwnerOperation::AddOwnerWithThreshold {
                owner: D,
                threshold: 2,
            },
            OwnerOperation::ChangeThreshold { threshold: 3 },
        ]
    );
    assert_eq!(plan.final_owners, vec![D, A, B, C]);
    assert_eq!(plan.final_threshold, 3);

    let multi_send = ContractSet::default().multi_send;
    let tx = plan.to_transaction(SAFE, multi_send).expect("transaction");
    assert_eq!(tx.to, multi_send);
    assert_eq!(tx.operation, Operation::DelegateCall);

    let calls = decode_multisend_calldata(&tx.data).expect("multisend calldata");
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.to == SAFE && c.value == U256::ZERO));
    assert_eq!(calls[0].data, plan.operations[0].calldata());
    let change = ISafe::changeThresholdCall::abi_decode(&calls[1].data, true).expect("changeThreshold");
    assert_eq!(change.threshold, U256::from(3));
}

#[test]
fn removals_track_the_simulated_list() {
    let plan = plan_owner_changes(
        &[A, B, C],
        2,
        &[OwnerChange::Remove(A), OwnerChange::Remove(C)],
        1,
    )
    .expect("plan");
    assert_eq!(
        plan.operations,
        vec![
            OwnerOperation::RemoveOwner {
                prev_owner: SENTINEL_OWNERS,
                owner: A,
                threshold: 2,
            },
            OwnerOperation::RemoveOwner {
                prev_owner: B,
                owner: C,
                threshold: 1,
            },
        ]
    );
    assert_eq!(plan.final_owners, vec![B]);
}

#[test]
fn removal_then_addition_uses_clamped_threshold() {
    let plan = plan_owner_changes(
        &[A, B],
        2,
        &[OwnerChange::Remove(B), OwnerChange::Add(C), OwnerChange::Add(D)],
        2,
    )
    .expect("plan");
    assert_eq!(
        plan.operations,
        vec![
            OwnerOperation::RemoveOwner {
                prev_owner: A,
                owner: B,
                threshold: 1,
            },
            OwnerOperation::AddOwnerWithThreshold {
                owner: C,
                threshold: 1,
            },
            OwnerOperation::AddOwnerWithThreshold {
                owner: D,
                threshold: 1,
            },
            OwnerOperation::ChangeThreshold { threshold: 2 },
        ]
    );
}

#[test]
fn threshold_only_change_is_a_direct_call() {
    let plan = plan_owner_changes(&[A, B, C], 2, &[], 1).expect("plan");
    let tx = plan
        .to_transaction(SAFE, ContractSet::default().multi_send)
        .expect("transaction");
    assert_eq!(tx.to, SAFE);
    assert_eq!(tx.data, OwnerOperation::ChangeThreshold { threshold: 1 }.calldata());
}

#[test]
fn unknown_owner_removal_is_rejected() {
    let err = plan_owner_changes(&[A, B], 1, &[OwnerChange::Remove(D)], 1).expect_err("must fail");
    assert!(matches!(err, CoreError::OwnerNotFound(missing) if missing == D));
}

#[test]
fn threshold_out_of_range_is_rejected() {
    for threshold in [0, 4] {
        let err = plan_owner_changes(&[A, B, C], 2, &[], threshold).expect_err("must fail");
        assert!(err.to_string().contains("out of range"));
    }
}

#[test]
fn adding_an_existing_owner_is_rejected() {
    let err = plan_owner_changes(&[A, B], 1, &[OwnerChange::Add(B)], 1).expect_err("must fail");
    assert!(err.to_string().contains("already an owner"));
}

#[test]
fn sentinel_and_zero_are_not_owners() {
    for bad in [Address::ZERO, SENTINEL_OWNERS] {
        let err = plan_owner_changes(&[A], 1, &[OwnerChange::Add(bad)], 1).expect_err("must fail");
        assert!(err.to_string().contains("invalid owner"));
    }
}

#[test]
fn no_op_request_is_rejected() {
    let err = plan_owner_changes(&[A, B], 1, &[], 1).expect_err("must fail");
    assert!(err.to_string().contains("no owner or threshold change"));
}

#[test]
fn removing_every_owner_first_is_rejected() {
    let err = plan_owner_changes(
        &[A, B],
        1,
        &[
            OwnerChange::Remove(A),
            OwnerChange::Remove(B),
            OwnerChange::Add(C),
            OwnerChange::Add(D),
        ],
        1,
    )
    .expect_err("must fail");
    assert!(err.to_string().contains("every current owner"));
}

#[test]
fn owner_change_json_shape() {
    let change: OwnerChange = serde_json::from_value(serde_json::json!({
        "type": "remove",
        "address": "0x00000000000000000000000000000000000000b2"
    }))
    .expect("owner change json");
    assert_eq!(change, OwnerChange::Remove(B));
}
