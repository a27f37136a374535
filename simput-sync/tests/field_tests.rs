use simput_sync::field::{should_show, text_to_query};
use simput_types::Decorator;

fn hidden() -> Decorator {
    Decorator {
        show: false,
        ..Decorator::default()
    }
}

#[test]
fn query_text_is_lowercased_name_and_label() {
    assert_eq!(text_to_query("Radius", "Sphere Radius"), "radius sphere radius");
    assert_eq!(text_to_query("x", ""), "x ");
}

#[test]
fn empty_query_uses_show_flag() {
    assert!(should_show("", "radius", "Radius", &Decorator::default()));
    assert!(!should_show("", "radius", "Radius", &hidden()));
}

#[test]
fn single_token_is_a_substring_match() {
    let d = Decorator::default();
    assert!(should_show("rad", "radius", "Radius", &d));
    assert!(should_show("adiu", "radius", "Radius", &d));
    assert!(!should_show("center", "radius", "Radius", &d));
}

#[test]
fn query_overrides_hidden_decorator() {
    assert!(should_show("rad", "radius", "Radius", &hidden()));
}

#[test]
fn any_token_may_match() {
    let d = Decorator::default();
    assert!(should_show("center rad", "radius", "Radius", &d));
    assert!(!should_show("center opacity", "radius", "Radius", &d));
}

#[test]
fn blank_tokens_never_match() {
    let d = Decorator::default();
    assert!(!should_show("zzz  ", "radius", "Radius", &d));
}

#[test]
fn non_queryable_field_ignores_query() {
    let d = Decorator {
        query: false,
        ..Decorator::default()
    };
    assert!(should_show("zzz", "radius", "Radius", &d));
    let d = Decorator {
        query: false,
        show: false,
        ..Decorator::default()
    };
    assert!(!should_show("rad", "radius", "Radius", &d));
}
