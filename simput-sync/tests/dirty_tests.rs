use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::json;
use simput_sync::DirtyQueue;
use simput_types::{DirtyEntry, ItemId};
use std::collections::HashMap;

fn id(s: &str) -> ItemId {
    ItemId::from(s)
}

// ── Marking ──────────────────────────────────────────────────────

#[test]
fn new_queue_is_empty() {
    let queue = DirtyQueue::new();
    assert!(queue.is_empty());
    assert_eq!(queue.len(), 0);
}

#[test]
fn remark_keeps_latest_value_at_end() {
    let mut queue = DirtyQueue::new();
    queue.mark(id("p1"), "a", json!(1));
    queue.mark(id("p1"), "b", json!(2));
    queue.mark(id("p1"), "a", json!(3));

    assert_eq!(
        queue.entries(),
        &[
            DirtyEntry::new(id("p1"), "b", json!(2)),
            DirtyEntry::new(id("p1"), "a", json!(3)),
        ]
    );
}

#[test]
fn same_name_on_different_items_is_distinct() {
    let mut queue = DirtyQueue::new();
    queue.mark(id("p1"), "a", json!(1));
    queue.mark(id("p2"), "a", json!(2));
    assert_eq!(queue.len(), 2);
    assert!(queue.contains(&id("p1"), "a"));
    assert!(queue.contains(&id("p2"), "a"));
    assert!(!queue.contains(&id("p3"), "a"));
}

#[test]
fn take_empties_queue() {
    let mut queue = DirtyQueue::new();
    queue.mark(id("p1"), "a", json!(1));

    let batch = queue.take();
    assert_eq!(batch.len(), 1);
    assert!(queue.is_empty());
    assert!(queue.take().is_empty());
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn one_entry_per_property_with_last_value(
        marks in prop::collection::vec((0u8..3, 0u8..4, any::<i32>()), 0..40)
    ) {
        let mut queue = DirtyQueue::new();
        let mut last = HashMap::new();
        for (item, name, value) in &marks {
            let key = (format!("p{item}"), format!("f{name}"));
            queue.mark(ItemId::from(key.0.as_str()), key.1.clone(), json!(value));
            last.insert(key, json!(value));
        }

        prop_assert_eq!(queue.len(), last.len());
        for entry in queue.entries() {
            let key = (entry.id.to_string(), entry.name.clone());
            prop_assert_eq!(Some(&entry.value), last.get(&key));
        }
    }

    #[test]
    fn last_marked_is_last_in_queue(
        marks in prop::collection::vec((0u8..3, 0u8..4), 1..40)
    ) {
        let mut queue = DirtyQueue::new();
        for (item, name) in &marks {
            queue.mark(ItemId::from(format!("p{item}")), format!("f{name}"), json!(null));
        }
        let (item, name) = marks[marks.len() - 1];
        let tail = &queue.entries()[queue.len() - 1];
        prop_assert_eq!(tail.id.to_string(), format!("p{item}"));
        prop_assert_eq!(tail.name.clone(), format!("f{name}"));
    }
}
