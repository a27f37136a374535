use simput_types::ItemId;
use std::collections::HashSet;
use std::str::FromStr;

// ── ItemId ────────────────────────────────────────────────────────

#[test]
fn item_id_display_and_parse() {
    let id = ItemId::new("42");
    let parsed = ItemId::parse(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
    assert_eq!(parsed.as_str(), "42");
}

#[test]
fn item_id_from_str() {
    let parsed: ItemId = ItemId::from_str("p1").unwrap();
    assert_eq!(parsed, ItemId::from("p1"));
}

#[test]
fn item_id_parse_rejects_blank() {
    assert!(ItemId::parse("").is_err());
    assert!(ItemId::parse("   ").is_err());
}

#[test]
fn item_id_hash_and_eq() {
    let mut set = HashSet::new();
    set.insert(ItemId::from("a"));
    set.insert(ItemId::from(String::from("a")));
    assert_eq!(set.len(), 1);
}

#[test]
fn item_id_borrows_as_str() {
    let mut set = HashSet::new();
    set.insert(ItemId::from("a"));
    assert!(set.contains("a"));
}

#[test]
fn item_id_serializes_as_string() {
    let json = serde_json::to_string(&ItemId::from("7")).unwrap();
    assert_eq!(json, "\"7\"");
}

#[test]
fn item_id_deserializes_from_string_or_integer() {
    let from_text: ItemId = serde_json::from_str("\"7\"").unwrap();
    let from_int: ItemId = serde_json::from_str("7").unwrap();
    assert_eq!(from_text, from_int);
}

#[test]
fn item_id_rejects_other_json() {
    assert!(serde_json::from_str::<ItemId>("[1]").is_err());
    assert!(serde_json::from_str::<ItemId>("null").is_err());
}
