use pretty_assertions::assert_eq;
use simput_sync::{PropertyStatus, StatusTable};
use simput_types::ItemId;

fn p1() -> ItemId {
    ItemId::from("p1")
}

#[test]
fn unknown_property_is_synced() {
    let table = StatusTable::new();
    assert_eq!(table.get(&p1(), "radius"), PropertyStatus::Synced);
    assert!(table.unsynced(&p1()).is_empty());
}

#[test]
fn full_lifecycle() {
    let mut table = StatusTable::new();
    table.edited(&p1(), "radius");
    assert_eq!(table.get(&p1(), "radius"), PropertyStatus::PendingLocalEdit);

    table.sent(&p1(), "radius");
    assert_eq!(table.get(&p1(), "radius"), PropertyStatus::PendingConfirmation);

    table.confirmed(&p1());
    assert_eq!(table.get(&p1(), "radius"), PropertyStatus::Synced);
}

#[test]
fn confirmation_keeps_unsent_edits() {
    let mut table = StatusTable::new();
    table.edited(&p1(), "a");
    table.sent(&p1(), "a");
    table.edited(&p1(), "b");

    table.confirmed(&p1());
    assert_eq!(
        table.unsynced(&p1()),
        vec![("b".to_string(), PropertyStatus::PendingLocalEdit)]
    );
}

#[test]
fn reedit_while_awaiting_confirmation() {
    let mut table = StatusTable::new();
    table.sent(&p1(), "a");
    table.edited(&p1(), "a");

    table.confirmed(&p1());
    assert_eq!(table.get(&p1(), "a"), PropertyStatus::PendingLocalEdit);
}

#[test]
fn unsynced_is_sorted() {
    let mut table = StatusTable::new();
    table.edited(&p1(), "z");
    table.sent(&p1(), "a");
    let names: Vec<_> = table.unsynced(&p1()).into_iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["a", "z"]);
}

#[test]
fn clear_forgets_all() {
    let mut table = StatusTable::new();
    table.edited(&p1(), "a");
    table.clear();
    assert_eq!(table.get(&p1(), "a"), PropertyStatus::Synced);
}
