use order_hub::handlers::InvocationError;
use order_hub::lifecycle::{HubConfig, OrderHub};
use order_hub::model::{CallContext, CheckResult, ConnectionId, HubEvent, OrderId, Target, WatchFailure};
use order_hub::testing::{RecordingTransport, ScriptedStatusSource};
use order_hub::watcher::WatchOutcome;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

struct Harness {
    hub: OrderHub,
    transport: Arc<RecordingTransport>,
    source: Arc<ScriptedStatusSource>,
}

fn harness() -> Harness {
    let transport = Arc::new(RecordingTransport::new());
    let source = Arc::new(ScriptedStatusSource::new());
    let hub = OrderHub::with_status_source(HubConfig::default(), transport.clone(), source.clone());
    Harness {
        hub,
        transport,
        source,
    }
}

fn conn(id: &str) -> ConnectionId {
    ConnectionId::from(id)
}

/// Brewing → Ready: two updates then Finished, addressed only to the caller.
#[tokio::test(start_paused = true)]
async fn test_watch_streams_to_caller_only() {
    let h = harness();
    h.hub.on_connect(conn("caller"), None).await.unwrap();
    h.hub.on_connect(conn("bystander"), None).await.unwrap();
    h.source
        .push(OrderId(1), CheckResult::changed("Brewing"))
        .push(OrderId(1), CheckResult::completed("Ready"));

    let outcome = h
        .hub
        .watch_order_status(conn("caller"), OrderId(1))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome, WatchOutcome::Completed { updates: 2 });
    assert_eq!(
        h.transport.events_for(&conn("caller")),
        vec![
            HubEvent::ReceiveOrderUpdate("Brewing".into()),
            HubEvent::ReceiveOrderUpdate("Ready".into()),
            HubEvent::Finished,
        ]
    );
    assert!(h.transport.events_for(&conn("bystander")).is_empty());

    h.hub.shutdown().await.unwrap();
}

/// k-th poll finished (not new) after k-1 new polls: k-1 updates, one terminal, k polls.
#[tokio::test(start_paused = true)]
async fn test_poll_count_is_bounded_by_finish() {
    let h = harness();
    h.hub.on_connect(conn("c"), None).await.unwrap();
    for stage in ["one", "two", "three"] {
        h.source.push(OrderId(9), CheckResult::changed(stage));
    }
    h.source.push(OrderId(9), CheckResult::new(false, "three", true));

    let outcome = h
        .hub
        .watch_order_status(conn("c"), OrderId(9))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(outcome, WatchOutcome::Completed { updates: 3 });
    assert_eq!(h.source.polls(OrderId(9)), 4);
    assert_eq!(
        h.transport.event_names_for(&conn("c")),
        vec![
            "ReceiveOrderUpdate",
            "ReceiveOrderUpdate",
            "ReceiveOrderUpdate",
            "Finished"
        ]
    );

    h.hub.shutdown().await.unwrap();
}

/// Group "AmericanoGroup" = {A, B}; A leaves → {B}; B leaves → group gone.
#[tokio::test]
async fn test_group_shrinks_and_disappears_on_disconnect() {
    let h = harness();
    for id in ["A", "B"] {
        h.hub.on_connect(conn(id), None).await.unwrap();
        h.hub.join_group(conn(id), "AmericanoGroup").await.unwrap();
    }

    h.hub.on_disconnect(conn("A")).await.unwrap();
    let members = h.hub.members_of("AmericanoGroup").await.unwrap();
    assert_eq!(members.into_iter().collect::<Vec<_>>(), vec![conn("B")]);

    h.hub.on_disconnect(conn("B")).await.unwrap();
    assert!(h.hub.members_of("AmericanoGroup").await.unwrap().is_empty());
    assert_eq!(h.hub.registry.stats().await.unwrap().groups, 0);

    let report = h
        .hub
        .send(Target::group("AmericanoGroup"), HubEvent::Finished)
        .await
        .unwrap();
    assert_eq!(report.attempted, 0);

    h.hub.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_register_twice_is_register_once() {
    let h = harness();
    assert!(h.hub.on_connect(conn("c"), None).await.unwrap());
    h.hub.join_group(conn("c"), "g").await.unwrap();
    let before = h.hub.registry.stats().await.unwrap();

    assert!(!h.hub.on_connect(conn("c"), None).await.unwrap());
    assert_eq!(h.hub.registry.stats().await.unwrap(), before);
    assert!(h.hub.members_of("g").await.unwrap().contains(&conn("c")));

    h.hub.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_new_order_reaches_every_connection_despite_failures() {
    let h = harness();
    for id in ["a", "b", "c", "d"] {
        h.hub.on_connect(conn(id), None).await.unwrap();
    }
    h.transport.fail_for(conn("b"));

    let submission = h
        .hub
        .submit(order_hub::model::OrderCreate::new("Latte", "Small"))
        .await
        .unwrap();

    let report = submission.broadcast.unwrap();
    assert_eq!(report.attempted, 4);
    assert_eq!(report.delivered, 3);
    assert_eq!(report.failed.len(), 1);
    for id in ["a", "c", "d"] {
        assert_eq!(h.transport.event_names_for(&conn(id)), vec!["NewOrder"]);
    }

    h.hub.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_order_is_rejected_without_broadcast() {
    let h = harness();
    h.hub.on_connect(conn("a"), None).await.unwrap();

    assert!(h.hub.submit_order("  ", "Large").await.is_err());
    assert!(h.transport.deliveries().is_empty());

    h.hub.shutdown().await.unwrap();
}

/// Nothing reaches the caller after it disconnects, not even a terminal event.
#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_watch_immediately() {
    let h = harness();
    h.hub.on_connect(conn("c"), None).await.unwrap();
    h.source
        .push(OrderId(1), CheckResult::changed("Brewing"))
        .push(OrderId(1), CheckResult::unchanged("Brewing"));

    let session = h.hub.watch_order_status(conn("c"), OrderId(1));
    tokio::time::sleep(Duration::from_millis(1500)).await;

    // The session is asleep until t=2s; disconnect must wake it now
    let disconnected_at = tokio::time::Instant::now();
    let departure = h.hub.on_disconnect(conn("c")).await.unwrap().unwrap();
    assert_eq!(departure.cancelled_watches, vec![OrderId(1)]);

    let outcome = session.await.unwrap().unwrap();
    assert_eq!(outcome, WatchOutcome::Cancelled);
    assert_eq!(disconnected_at.elapsed(), Duration::ZERO);

    let delivered_at_cancel = h.transport.deliveries().len();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.transport.deliveries().len(), delivered_at_cancel);
    assert_eq!(
        h.transport.event_names_for(&conn("c")),
        vec!["ReceiveOrderUpdate"]
    );

    h.hub.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_unknown_order_and_source_outage() {
    let h = harness();
    h.hub.on_connect(conn("c"), None).await.unwrap();
    for _ in 0..3 {
        h.source.push_failure(OrderId(2), "timeout");
    }

    let unknown = h
        .hub
        .watch_order_status(conn("c"), OrderId(1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unknown, WatchOutcome::Failed(WatchFailure::UnknownOrder));

    let outage = h
        .hub
        .watch_order_status(conn("c"), OrderId(2))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(outage, WatchOutcome::Failed(WatchFailure::SourceUnavailable));
    assert_eq!(h.source.polls(OrderId(2)), 3);

    assert_eq!(
        h.transport.events_for(&conn("c")),
        vec![
            HubEvent::WatchFailed {
                order_id: OrderId(1),
                reason: WatchFailure::UnknownOrder
            },
            HubEvent::WatchFailed {
                order_id: OrderId(2),
                reason: WatchFailure::SourceUnavailable
            },
        ]
    );

    h.hub.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_invoke_routes_watch_aliases() {
    let h = harness();
    assert_eq!(
        h.hub.handlers().methods(),
        vec!["GetUpdateForOrder", "WatchOrderStatus"]
    );
    h.hub.on_connect(conn("c"), None).await.unwrap();
    h.source.push(OrderId(3), CheckResult::completed("Ready"));
    h.source.push(OrderId(4), CheckResult::completed("Ready"));

    let reply = h
        .hub
        .invoke(CallContext::new("c"), "GetUpdateForOrder", json!("3"))
        .await
        .unwrap();
    assert_eq!(reply, json!({ "orderId": 3, "accepted": true }));
    tokio::time::sleep(Duration::from_secs(1)).await;

    h.hub
        .invoke(CallContext::new("c"), "WatchOrderStatus", json!(4))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(
        h.transport.event_names_for(&conn("c")),
        vec![
            "ReceiveOrderUpdate",
            "Finished",
            "ReceiveOrderUpdate",
            "Finished"
        ]
    );

    let unknown = h
        .hub
        .invoke(CallContext::new("c"), "PlaceOrder", json!({}))
        .await;
    assert_eq!(
        unknown,
        Err(InvocationError::UnknownMethod("PlaceOrder".into()))
    );

    let bad = h
        .hub
        .invoke(CallContext::new("c"), "GetUpdateForOrder", json!("latte"))
        .await;
    assert!(matches!(bad, Err(InvocationError::InvalidPayload { .. })));

    h.hub.shutdown().await.unwrap();
}

/// The reply only acknowledges the request; a rejected watch is reported as an event.
#[tokio::test(start_paused = true)]
async fn test_duplicate_invoke_is_accepted_then_rejected_by_event() {
    let h = harness();
    h.hub.on_connect(conn("c"), None).await.unwrap();
    h.source
        .push(OrderId(5), CheckResult::changed("Brewing"))
        .push(OrderId(5), CheckResult::unchanged("Brewing"))
        .push(OrderId(5), CheckResult::completed("Ready"));

    let first = h
        .hub
        .invoke(CallContext::new("c"), "WatchOrderStatus", json!(5))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    let second = h
        .hub
        .invoke(CallContext::new("c"), "WatchOrderStatus", json!({ "orderId": 5 }))
        .await
        .unwrap();

    assert_eq!(first, json!({ "orderId": 5, "accepted": true }));
    assert_eq!(second, first);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(
        h.transport.events_for(&conn("c")),
        vec![
            HubEvent::ReceiveOrderUpdate("Brewing".into()),
            HubEvent::WatchFailed {
                order_id: OrderId(5),
                reason: WatchFailure::AlreadyWatching
            },
            HubEvent::ReceiveOrderUpdate("Ready".into()),
            HubEvent::Finished,
        ]
    );

    h.hub.shutdown().await.unwrap();
}

/// Shutdown cancels sessions that are still polling.
#[tokio::test(start_paused = true)]
async fn test_shutdown_cancels_running_sessions() {
    let h = harness();
    h.hub.on_connect(conn("c"), None).await.unwrap();
    h.source.push(OrderId(1), CheckResult::unchanged("Order received"));

    let session = h.hub.watch_order_status(conn("c"), OrderId(1));
    tokio::time::sleep(Duration::from_millis(2500)).await;

    h.hub.shutdown().await.unwrap();
    assert_eq!(session.await.unwrap().unwrap(), WatchOutcome::Cancelled);
    assert!(h.transport.deliveries().is_empty());
}
