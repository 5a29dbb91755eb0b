mod common;

use serde_json::json;

use rusty_safe_multisig_adapters::{
    OutgoingResponse, Session, SessionStatus, WalletConnectAdapter,
};
use rusty_safe_multisig_core::{is_stale_session_error, PortError, RequestResponder};

use common::safe_address;

const TOPIC: &str = "topic-1";

fn adapter() -> WalletConnectAdapter {
    let wc = WalletConnectAdapter::default();
    wc.insert_session(Session {
        topic: TOPIC.to_owned(),
        account: safe_address(),
        chain_id: 100,
        dapp_name: "Swap".to_owned(),
        status: SessionStatus::Approved,
    })
    .expect("insert session");
    wc
}

#[test]
fn received_request_carries_session_chain() {
    let wc = adapter();
    let request = wc
        .receive(TOPIC, "7", "personal_sign", json!(["0x6869", "0xbeef"]))
        .expect("receive");
    assert_eq!(request.chain_id, 100);
    assert_eq!(request.id, "7");
    assert_eq!(request.received_at_ms, None);
    assert_eq!(wc.pending_request_ids().expect("ids"), vec!["7".to_owned()]);
}

#[test]
fn approve_and_reject_queue_responses() {
    let wc = adapter();
    wc.receive(TOPIC, "1", "eth_sendTransaction", json!([]))
        .expect("receive");
    wc.receive(TOPIC, "2", "eth_sign", json!([]))
        .expect("receive");

    wc.approve("1", json!("0xabcd")).expect("approve");
    wc.reject("2", 4001, "User rejected the request")
        .expect("reject");

    let mut responses = wc.drain_responses().expect("drain");
    responses.sort_by_key(|r| match r {
        OutgoingResponse::Result { id, .. } | OutgoingResponse::Error { id, .. } => id.clone(),
    });
    assert_eq!(
        responses,
        vec![
            OutgoingResponse::Result {
                topic: TOPIC.to_owned(),
                id: "1".to_owned(),
                result: json!("0xabcd"),
            },
            OutgoingResponse::Error {
                topic: TOPIC.to_owned(),
                id: "2".to_owned(),
                code: 4001,
                message: "User rejected the request".to_owned(),
            },
        ]
    );
    assert!(wc.drain_responses().expect("drain again").is_empty());
    assert!(wc.pending_request_ids().expect("ids").is_empty());
}

#[test]
fn answering_twice_is_a_stale_error() {
    let wc = adapter();
    wc.receive(TOPIC, "1", "personal_sign", json!([]))
        .expect("receive");
    wc.approve("1", json!("0x")).expect("first answer");
    let err = wc.approve("1", json!("0x")).expect_err("must fail");
    assert!(matches!(err, PortError::NotFound(_)));
    assert!(is_stale_session_error(&err.to_string()));
}

#[test]
fn disconnected_session_drops_its_requests() {
    let wc = adapter();
    wc.receive(TOPIC, "1", "personal_sign", json!([]))
        .expect("receive");
    wc.disconnect(TOPIC).expect("disconnect");

    assert!(wc.pending_request_ids().expect("ids").is_empty());
    let err = wc.reject("1", 4001, "nope").expect_err("must fail");
    assert!(is_stale_session_error(&err.to_string()));

    let sessions = wc.sessions().expect("sessions");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SessionStatus::Disconnected);

    let err = wc
        .receive(TOPIC, "2", "personal_sign", json!([]))
        .expect_err("must fail");
    assert!(err.to_string().contains("No matching key"));
}

#[test]
fn unknown_topic_is_not_found() {
    let wc = adapter();
    let err = wc
        .receive("other", "1", "personal_sign", json!([]))
        .expect_err("must fail");
    assert!(is_stale_session_error(&err.to_string()));
    let err = wc.disconnect("other").expect_err("must fail");
    assert!(matches!(err, PortError::NotFound(_)));
}

#[test]
fn outgoing_response_serializes_with_kind_tag() {
    let response = OutgoingResponse::Error {
        topic: TOPIC.to_owned(),
        id: "9".to_owned(),
        code: 4100,
        message: "unauthorized".to_owned(),
    };
    let value = serde_json::to_value(&response).expect("json");
    assert_eq!(value["kind"], "error");
    assert_eq!(value["code"], 4100);
}
