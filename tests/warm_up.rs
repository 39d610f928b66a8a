//! Warm-up gating of queue-group handlers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use routed_rust::{Bus, InMemoryTransport, Message, Options};

#[test]
fn queue_handlers_skip_during_warm_up_while_fanout_runs() {
    let transport = InMemoryTransport::new();
    let producer = Bus::new(Arc::new(transport.clone()), Options::new());

    // A timeout far longer than the test keeps the gate unsettled.
    let consumer = Bus::new(
        Arc::new(transport.clone()),
        Options::new().with_warm_up_timeout(Duration::from_secs(60)),
    );

    let fanout = Arc::new(Mutex::new(0_u32));
    let queued = Arc::new(Mutex::new(0_u32));

    let fanout_count = Arc::clone(&fanout);
    let queued_count = Arc::clone(&queued);
    consumer.receiver().route("root.warm", |r| {
        r.handle("evt", move |_msg: &Message| {
            *fanout_count.lock().unwrap() += 1;
            Ok(())
        })
        .unwrap();
        r.handle_queue_as("evt", "pool", move |_msg: &Message| {
            *queued_count.lock().unwrap() += 1;
            Ok(())
        })
        .unwrap();
    });

    producer
        .sender()
        .publish_bytes("root.warm.evt", Vec::new())
        .unwrap();

    assert!(!consumer.is_settled());
    // Fan-out handlers run during warm-up; queue handlers are skipped.
    assert_eq!(*fanout.lock().unwrap(), 1);
    assert_eq!(*queued.lock().unwrap(), 0);

    // The skipped delivery was acknowledged, not parked for retry.
    transport.redeliver_unacked("root.warm.evt");
    assert_eq!(*queued.lock().unwrap(), 0);
}

#[test]
fn queue_handlers_run_after_settlement() {
    let transport = InMemoryTransport::new();
    let producer = Bus::new(Arc::new(transport.clone()), Options::new());
    let consumer = Bus::new(
        Arc::new(transport.clone()),
        Options::new().with_warm_up_timeout(Duration::from_millis(30)),
    );

    let queued = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&queued);
    consumer.receiver().route("root.live", |r| {
        r.handle_queue_as("evt", "pool", move |_msg: &Message| {
            *counter.lock().unwrap() += 1;
            Ok(())
        })
        .unwrap();
    });

    consumer.wait_until_settled();
    assert!(consumer.is_settled());

    producer
        .sender()
        .publish_bytes("root.live.evt", Vec::new())
        .unwrap();

    assert_eq!(*queued.lock().unwrap(), 1);
}

#[test]
fn backlog_drains_before_queue_handlers_go_live() {
    let transport = InMemoryTransport::new();
    let producer = Bus::new(Arc::new(transport.clone()), Options::new());

    // Backlog accumulated while the consumer was down.
    let sender = producer.sender();
    for _ in 0..3 {
        sender
            .publish_bytes("root.catchup.evt", Vec::new())
            .unwrap();
    }

    let consumer = Bus::new(
        Arc::new(transport.clone()),
        Options::new().with_warm_up_timeout(Duration::from_millis(300)),
    );

    let handled = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&handled);
    consumer.receiver().route("root.catchup", |r| {
        // Binding the subscription replays the backlog immediately,
        // inside the warm-up window.
        r.handle_queue_as("evt", "pool", move |_msg: &Message| {
            *counter.lock().unwrap() += 1;
            Ok(())
        })
        .unwrap();
    });

    // The three historical deliveries were skipped, not handled.
    assert_eq!(*handled.lock().unwrap(), 0);

    consumer.wait_until_settled();

    sender
        .publish_bytes("root.catchup.evt", Vec::new())
        .unwrap();
    assert_eq!(*handled.lock().unwrap(), 1);
}

#[test]
fn disabled_gate_runs_queue_handlers_immediately() {
    let transport = InMemoryTransport::new();
    let producer = Bus::new(Arc::new(transport.clone()), Options::new());
    // Zero timeout: gating disabled, gate born settled.
    let consumer = Bus::new(Arc::new(transport.clone()), Options::new());

    assert!(consumer.is_settled());

    let queued = Arc::new(Mutex::new(0_u32));
    let counter = Arc::clone(&queued);
    consumer.receiver().route("root.nogate", |r| {
        r.handle_queue_as("evt", "pool", move |_msg: &Message| {
            *counter.lock().unwrap() += 1;
            Ok(())
        })
        .unwrap();
    });

    producer
        .sender()
        .publish_bytes("root.nogate.evt", Vec::new())
        .unwrap();

    assert_eq!(*queued.lock().unwrap(), 1);
}
