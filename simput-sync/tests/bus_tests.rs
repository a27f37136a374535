use pretty_assertions::assert_eq;
use simput_sync::{BusEvent, ChangeNotice, EventKind, NotificationBus, ReloadTarget, Subscriber};
use simput_types::ItemId;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Recorder {
    name: &'static str,
    log: Arc<Mutex<Vec<(&'static str, BusEvent)>>>,
}

impl Subscriber for Recorder {
    fn notify(&self, event: &BusEvent) {
        self.log.lock().unwrap().push((self.name, event.clone()));
    }
}

// ── Events ───────────────────────────────────────────────────────

#[test]
fn event_kinds() {
    assert_eq!(BusEvent::Connect.kind(), EventKind::Connect);
    assert_eq!(BusEvent::Disconnect.kind(), EventKind::Disconnect);
    assert_eq!(
        BusEvent::Change(ChangeNotice::default()).kind(),
        EventKind::Change
    );
    assert_eq!(BusEvent::Reload(ReloadTarget::Ui).kind(), EventKind::Reload);
    assert_eq!(BusEvent::TemplateTs(2).kind(), EventKind::TemplateTs);
    assert_eq!(BusEvent::Query("x".into()).kind(), EventKind::Query);
}

#[test]
fn change_notice_emptiness() {
    assert!(ChangeNotice::default().is_empty());
    let notice = ChangeNotice {
        id: Some(ItemId::from("p1")),
        type_name: None,
    };
    assert!(!notice.is_empty());
}

#[test]
fn reload_target_names() {
    for (name, target) in [
        ("data", ReloadTarget::Data),
        ("ui", ReloadTarget::Ui),
        ("domain", ReloadTarget::Domain),
    ] {
        assert_eq!(name.parse::<ReloadTarget>(), Ok(target));
        assert_eq!(target.to_string(), name);
    }
    assert!("domains".parse::<ReloadTarget>().is_err());
}

// ── Bus ──────────────────────────────────────────────────────────

#[test]
fn connect_is_idempotent() {
    let mut bus = NotificationBus::new();
    let sub: Arc<dyn Subscriber> = Arc::new(Recorder::default());

    assert!(bus.connect(sub.clone()));
    assert!(!bus.connect(sub.clone()));
    assert_eq!(bus.len(), 1);
    assert!(bus.is_connected(&sub));
}

#[test]
fn disconnect_unknown_is_noop() {
    let mut bus = NotificationBus::new();
    let sub: Arc<dyn Subscriber> = Arc::new(Recorder::default());
    assert!(!bus.disconnect(&sub));
    assert!(bus.is_empty());
}

#[test]
fn snapshot_in_connection_order() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut bus = NotificationBus::new();
    for name in ["first", "second"] {
        bus.connect(Arc::new(Recorder {
            name,
            log: log.clone(),
        }));
    }

    for subscriber in bus.subscribers() {
        subscriber.notify(&BusEvent::TemplateTs(5));
    }

    assert_eq!(
        *log.lock().unwrap(),
        vec![
            ("first", BusEvent::TemplateTs(5)),
            ("second", BusEvent::TemplateTs(5)),
        ]
    );
}

#[test]
fn disconnected_subscriber_gets_nothing() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut bus = NotificationBus::new();
    let sub: Arc<dyn Subscriber> = Arc::new(Recorder {
        name: "only",
        log: log.clone(),
    });
    bus.connect(sub.clone());
    assert!(bus.disconnect(&sub));

    for subscriber in bus.subscribers() {
        subscriber.notify(&BusEvent::Connect);
    }
    assert!(log.lock().unwrap().is_empty());
}
