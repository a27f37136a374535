use pretty_assertions::assert_eq;
use serde_json::json;
use simput_sync::mock::MockTransport;
use simput_sync::protocol::PushMessage;
use simput_sync::{
    BusEvent, DataManager, EventKind, ManagerConfig, ReloadTarget, SimputChannel, Subscriber,
};
use simput_types::{DirtyEntry, ItemId};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn recording(channel: &SimputChannel, kind: EventKind) -> Arc<Mutex<Vec<BusEvent>>> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    channel.on(kind, move |event| sink.lock().unwrap().push(event.clone()));
    log
}

// ── Listeners ────────────────────────────────────────────────────

#[test]
fn emit_reaches_listeners_of_that_kind() {
    let channel = SimputChannel::new();
    let reloads = recording(&channel, EventKind::Reload);
    let connects = recording(&channel, EventKind::Connect);

    channel.emit(&BusEvent::Reload(ReloadTarget::Ui));

    assert_eq!(
        *reloads.lock().unwrap(),
        vec![BusEvent::Reload(ReloadTarget::Ui)]
    );
    assert!(connects.lock().unwrap().is_empty());
}

#[test]
fn once_fires_a_single_time() {
    let channel = SimputChannel::new();
    let count = Arc::new(Mutex::new(0));
    let counter = count.clone();
    channel.once(EventKind::Connect, move |_| *counter.lock().unwrap() += 1);
    assert_eq!(channel.listener_count(EventKind::Connect), 1);

    channel.emit(&BusEvent::Connect);
    channel.emit(&BusEvent::Connect);

    assert_eq!(*count.lock().unwrap(), 1);
    assert_eq!(channel.listener_count(EventKind::Connect), 0);
}

#[test]
fn off_removes_listener() {
    let channel = SimputChannel::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    let id = channel.on(EventKind::Change, move |e| sink.lock().unwrap().push(e.clone()));

    assert!(channel.off(id));
    assert!(!channel.off(id));
    channel.emit(&BusEvent::Change(Default::default()));
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn listener_may_remove_itself() {
    let channel = SimputChannel::new();
    let slot = Arc::new(Mutex::new(None));
    let inner = channel.clone();
    let own = slot.clone();
    let id = channel.on(EventKind::Disconnect, move |_| {
        if let Some(id) = own.lock().unwrap().take() {
            inner.off(id);
        }
    });
    *slot.lock().unwrap() = Some(id);

    channel.emit(&BusEvent::Disconnect);
    assert_eq!(channel.listener_count(EventKind::Disconnect), 0);
}

#[test]
fn notify_is_emit() {
    let channel = SimputChannel::new();
    let log = recording(&channel, EventKind::TemplateTs);
    channel.notify(&BusEvent::TemplateTs(4));
    assert_eq!(*log.lock().unwrap(), vec![BusEvent::TemplateTs(4)]);
}

// ── Dirty forwarding ─────────────────────────────────────────────

#[tokio::test]
async fn unbound_dirty_is_noop() {
    let channel = SimputChannel::new();
    assert!(!channel.is_bound());
    channel.mark_dirty(&ItemId::from("p1"), "a").await.unwrap();
    channel.mark_dirty_many(&ItemId::from("p1"), &["a", "b"]).await.unwrap();
}

#[tokio::test]
async fn dirty_marks_reach_connected_manager() {
    let transport = MockTransport::new();
    let manager = DataManager::new("m", ManagerConfig::default(), Arc::new(transport.clone()));
    let channel = SimputChannel::new();
    let connects = recording(&channel, EventKind::Connect);

    manager.connect_bus(channel.clone());
    assert!(channel.is_bound());
    assert_eq!(connects.lock().unwrap().len(), 1);

    manager
        .handle_push(PushMessage::data(
            "p1",
            json!({ "id": "p1", "type": "T", "properties": { "a": 1, "b": 2 } }),
        ))
        .await
        .unwrap();
    manager.set_property(&ItemId::from("p1"), "a", json!(5)).unwrap();
    channel.mark_dirty(&ItemId::from("p1"), "a").await.unwrap();

    assert_eq!(
        transport.updates("simput"),
        vec![vec![DirtyEntry::new(ItemId::from("p1"), "a", json!(5))]]
    );

    let subscriber: Arc<dyn Subscriber> = channel.clone();
    manager.disconnect_bus(&subscriber);
    assert!(!channel.is_bound());
}

#[tokio::test]
async fn dropped_manager_unbinds() {
    let transport = MockTransport::new();
    let manager = DataManager::new("m", ManagerConfig::default(), Arc::new(transport));
    let channel = SimputChannel::new();
    manager.connect_bus(channel.clone());

    drop(manager);
    assert!(!channel.is_bound());
}

// ── Query debounce ───────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn query_is_debounced_and_lowercased() {
    let channel = SimputChannel::new();
    let queries = recording(&channel, EventKind::Query);

    channel.set_query("Rad");
    channel.push_query();
    tokio::time::sleep(Duration::from_millis(100)).await;
    channel.set_query("RADIUS");
    channel.push_query();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(queries.lock().unwrap().is_empty());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(
        *queries.lock().unwrap(),
        vec![BusEvent::Query("radius".into())]
    );
    assert_eq!(channel.query(), "RADIUS");
}

#[tokio::test(start_paused = true)]
async fn custom_debounce() {
    let channel = SimputChannel::with_debounce(Duration::from_millis(10));
    let queries = recording(&channel, EventKind::Query);

    channel.push_query();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(*queries.lock().unwrap(), vec![BusEvent::Query(String::new())]);
}

#[test]
fn query_without_runtime_is_immediate() {
    let channel = SimputChannel::new();
    let queries = recording(&channel, EventKind::Query);
    channel.set_query("Center");
    channel.push_query();
    assert_eq!(
        *queries.lock().unwrap(),
        vec![BusEvent::Query("center".into())]
    );
}
