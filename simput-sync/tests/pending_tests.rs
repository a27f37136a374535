use simput_sync::{PendingTracker, ResourceKind};
use simput_types::ItemId;

// ── Fetch flags ──────────────────────────────────────────────────

#[test]
fn begin_is_exclusive_per_key() {
    let mut pending = PendingTracker::new();
    assert!(pending.begin(ResourceKind::Data, "p1"));
    assert!(!pending.begin(ResourceKind::Data, "p1"));
    assert!(pending.begin(ResourceKind::Data, "p2"));
    assert_eq!(pending.pending_count(ResourceKind::Data), 2);
}

#[test]
fn kinds_are_independent() {
    let mut pending = PendingTracker::new();
    assert!(pending.begin(ResourceKind::Data, "p1"));
    assert!(pending.begin(ResourceKind::Domains, "p1"));
    assert!(pending.begin(ResourceKind::Ui, "p1"));

    assert!(pending.complete(ResourceKind::Domains, "p1"));
    assert!(pending.is_pending(ResourceKind::Data, "p1"));
    assert!(!pending.is_pending(ResourceKind::Domains, "p1"));
    assert!(pending.is_pending(ResourceKind::Ui, "p1"));
}

#[test]
fn complete_unknown_key() {
    let mut pending = PendingTracker::new();
    assert!(!pending.complete(ResourceKind::Ui, "Sphere"));
}

#[test]
fn complete_allows_new_fetch() {
    let mut pending = PendingTracker::new();
    pending.begin(ResourceKind::Ui, "Sphere");
    pending.complete(ResourceKind::Ui, "Sphere");
    assert!(pending.begin(ResourceKind::Ui, "Sphere"));
}

#[test]
fn counts_are_per_kind() {
    let mut pending = PendingTracker::new();
    pending.begin(ResourceKind::Ui, "Sphere");
    pending.begin(ResourceKind::Ui, "Cone");
    pending.begin(ResourceKind::Domains, "p1");

    assert_eq!(pending.pending_count(ResourceKind::Ui), 2);
    assert_eq!(pending.pending_count(ResourceKind::Domains), 1);
    assert_eq!(pending.pending_count(ResourceKind::Data), 0);
    assert!(!pending.is_pending(ResourceKind::Data, "Sphere"));
}

#[test]
fn clear_kind_only_touches_that_kind() {
    let mut pending = PendingTracker::new();
    pending.begin(ResourceKind::Data, "p1");
    pending.begin(ResourceKind::Domains, "p1");

    pending.clear_kind(ResourceKind::Domains);
    assert!(pending.is_pending(ResourceKind::Data, "p1"));
    assert_eq!(pending.pending_count(ResourceKind::Domains), 0);
}

// ── Flush gate ───────────────────────────────────────────────────

#[test]
fn flush_gate_is_global() {
    let mut pending = PendingTracker::new();
    assert!(!pending.flush_in_flight());

    pending.begin_flush(ItemId::from("p1"));
    pending.begin_flush(ItemId::from("p2"));
    assert!(pending.flush_in_flight());
    assert!(pending.is_flushing(&ItemId::from("p1")));

    assert!(pending.complete_flush(&ItemId::from("p1")));
    assert!(pending.flush_in_flight());

    pending.complete_flush(&ItemId::from("p2"));
    assert!(!pending.flush_in_flight());
}

#[test]
fn clear_resets_everything() {
    let mut pending = PendingTracker::new();
    pending.begin(ResourceKind::Data, "p1");
    pending.begin(ResourceKind::Ui, "T");
    pending.begin_flush(ItemId::from("p1"));

    pending.clear();
    assert!(!pending.is_pending(ResourceKind::Data, "p1"));
    assert!(!pending.is_pending(ResourceKind::Ui, "T"));
    assert!(!pending.flush_in_flight());
}
