//! Search filtering of property fields.

use simput_types::Decorator;

/// Text a query is matched against: lowercased name and label.
pub fn text_to_query(name: &str, label: &str) -> String {
    format!("{} {}", name.to_lowercase(), label.to_lowercase())
}

/// Whether a field should be displayed.
///
/// With a non-empty query on a queryable field, a query made of several
/// space-separated tokens matches when any non-empty token occurs in the
/// field's text; a single-token query must occur as a whole. Otherwise the
/// decorator's `show` decides.
pub fn should_show(query: &str, name: &str, label: &str, decorator: &Decorator) -> bool {
    if query.is_empty() || !decorator.query {
        return decorator.show;
    }
    let text = text_to_query(name, label);
    let tokens: Vec<&str> = query.split(' ').collect();
    if tokens.len() > 1 {
        return tokens
            .iter()
            .map(|t| t.trim())
            .any(|t| !t.is_empty() && text.contains(t));
    }
    text.contains(query)
}
