//! Cross-task event delivery.

use semble_events::{Event, EventSystem, ListenerError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn waiter_in_another_task_sees_emit() {
    let events = EventSystem::new();
    let waiter = tokio::spawn(events.wait_for("sync.done", Some(Duration::from_secs(2)), None));

    let emitter = events.clone();
    tokio::spawn(async move {
        emitter
            .emit(Event::new("sync.done", "poller").with_payload("count", 3))
            .await;
    })
    .await
    .unwrap();

    let event = waiter.await.unwrap().unwrap();
    assert_eq!(event.source, "poller");
    assert_eq!(event.get("count"), Some(&serde_json::json!(3)));
}

#[tokio::test]
async fn slow_async_listener_does_not_starve_others() {
    let events = EventSystem::new();
    let fast = Arc::new(AtomicUsize::new(0));

    events.on_async("x", |_| async {
        tokio::time::sleep(Duration::from_millis(20)).await;
        Err(ListenerError::new("slow and failing"))
    });
    let counter = Arc::clone(&fast);
    events.on_async("x", move |_| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    });

    events.emit(Event::new("x", "test")).await;
    assert_eq!(fast.load(Ordering::SeqCst), 1);
}
