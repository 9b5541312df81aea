//! Config push tests for datacore-transport.
// crates/datacore-transport/tests/config_push.rs
// ============================================================================
// Module: Config Push Tests
// Description: Queued user-info delivery into the shared config store.
// Purpose: Ensure pushes apply in order, idempotently, and fail closed.
// Dependencies: datacore-transport, datacore-config, datacore-core
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::time::Duration;

use datacore_config::SharedConfig;
use datacore_config::SharedConfigStore;
use datacore_core::ConfigPush;
use datacore_transport::ConfigPushDelegate;
use datacore_transport::RelayLink;

fn push(address: &str) -> ConfigPush {
    ConfigPush {
        server_address: address.to_string(),
    }
}

fn empty_store() -> SharedConfigStore {
    SharedConfigStore::new(SharedConfig {
        base_address: None,
        group_container_id: "group.test".to_string(),
    })
}

#[test]
fn drain_applies_pushes_in_order() {
    let (watch_end, host_session) = RelayLink::pair(Duration::from_secs(5));
    let store = empty_store();
    let mut delegate = ConfigPushDelegate::new(store.clone(), watch_end.user_info);
    let sender = host_session.user_info_sender();

    assert!(sender.transfer_user_info(push("http://first:5000")));
    assert!(sender.transfer_user_info(push("http://second:5000")));
    assert!(sender.transfer_user_info(push("http://second:5000")));

    let applied = delegate.drain();
    let changed: Vec<bool> = applied.iter().map(|entry| *entry.result.as_ref().unwrap()).collect();
    assert_eq!(changed, vec![true, true, false]);
    assert_eq!(store.base_address().as_deref(), Some("http://second:5000"));
    assert!(delegate.drain().is_empty());
}

#[test]
fn empty_push_clears_and_invalid_push_is_rejected() {
    let (watch_end, host_session) = RelayLink::pair(Duration::from_secs(5));
    let store = empty_store();
    let mut delegate = ConfigPushDelegate::new(store.clone(), watch_end.user_info);
    let sender = host_session.user_info_sender();

    sender.transfer_user_info(push("https://datacore.local"));
    sender.transfer_user_info(push("gopher://elsewhere"));
    let applied = delegate.drain();
    assert!(applied[1].result.is_err());
    assert_eq!(store.base_address().as_deref(), Some("https://datacore.local"));

    sender.transfer_user_info(push(""));
    let applied = delegate.drain();
    assert!(*applied[0].result.as_ref().unwrap());
    assert!(store.base_address().is_none());
}

#[tokio::test]
async fn next_applied_ends_when_host_is_gone() {
    let (watch_end, host_session) = RelayLink::pair(Duration::from_secs(5));
    let store = empty_store();
    let mut delegate = ConfigPushDelegate::new(store.clone(), watch_end.user_info);
    host_session.user_info_sender().transfer_user_info(push("http://host:5000"));
    drop(host_session);

    let applied = delegate.next_applied().await.unwrap();
    assert_eq!(applied.push.address(), Some("http://host:5000"));
    assert!(delegate.next_applied().await.is_none());
    assert_eq!(store.base_address().as_deref(), Some("http://host:5000"));
}
