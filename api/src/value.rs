//! Field picking and numeric coercion over loosely-typed payloads.
//!
//! The upstream API has shipped several response shapes over the years, so
//! every normalizer resolves fields through an ordered candidate-path list
//! instead of fixed serde structs. A path is a slice of object keys; a
//! single-element path is a flat key.

use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Walk a nested path. Missing intermediate nodes resolve to `None`
/// rather than an error.
pub fn resolve<'a>(record: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = record;
    for key in path {
        current = current.get(key)?;
    }
    Some(current)
}

/// A value counts as present unless it is null or an empty string.
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

/// Return the first candidate path whose resolved value is present,
/// in declared order.
pub fn pick_first<'a>(record: &'a Value, paths: &[&[&str]]) -> Option<&'a Value> {
    paths
        .iter()
        .find_map(|path| resolve(record, path).filter(|v| is_present(v)))
}

/// String form of the first present candidate. Numbers and booleans are
/// stringified, since the upstream sends ids as either strings or numbers.
pub fn pick_string(record: &Value, paths: &[&[&str]]) -> Option<String> {
    pick_first(record, paths).and_then(as_string)
}

pub fn pick_number(record: &Value, paths: &[&[&str]]) -> Option<f64> {
    pick_first(record, paths).and_then(to_number)
}

pub fn pick_stat(record: &Value, paths: &[&[&str]]) -> Option<StatValue> {
    pick_first(record, paths).and_then(to_stat)
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Strict numeric coercion: a finite number, or a string stripped down to
/// digits/`.`/`-` that parses to a finite number. Anything else is absent.
/// Player statistics use this mode.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
        }
        _ => None,
    }
}

/// Lenient numeric coercion: like [`to_number`], but a non-empty string
/// that fails to parse is preserved as display text instead of being
/// dropped. Ladder columns use this mode.
pub fn to_stat(value: &Value) -> Option<StatValue> {
    if let Some(n) = to_number(value) {
        return Some(StatValue::Number(n));
    }
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(StatValue::Text(s.clone())),
        _ => None,
    }
}

/// A ladder statistic: numeric when the upstream value parsed, otherwise
/// the original text carried through for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl StatValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            StatValue::Number(n) => Some(*n),
            StatValue::Text(_) => None,
        }
    }
}

impl fmt::Display for StatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatValue::Number(n) => write!(f, "{n}"),
            StatValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pick_first_honors_declared_order() {
        let record = json!({"teamId": 7, "id": "abc"});
        let picked = pick_first(&record, &[&["id"], &["teamId"]]);
        assert_eq!(picked, Some(&json!("abc")));
    }

    #[test]
    fn pick_first_skips_null_and_empty_string() {
        let record = json!({"id": null, "teamId": "", "teamUniqueKey": "t-9"});
        let picked = pick_string(&record, &[&["id"], &["teamId"], &["teamUniqueKey"]]);
        assert_eq!(picked.as_deref(), Some("t-9"));
    }

    #[test]
    fn pick_first_traverses_nested_paths_without_panicking() {
        let record = json!({"team": {"id": 42}});
        // "club.id" has no intermediate node; the nested candidate still wins.
        let picked = pick_string(&record, &[&["club", "id"], &["team", "id"]]);
        assert_eq!(picked.as_deref(), Some("42"));
    }

    #[test]
    fn pick_first_falls_through_to_none() {
        let record = json!({"unrelated": 1});
        assert_eq!(pick_first(&record, &[&["id"], &["team", "id"]]), None);
    }

    #[test]
    fn pick_first_works_on_non_object_records() {
        assert_eq!(pick_first(&json!(null), &[&["id"]]), None);
        assert_eq!(pick_first(&json!([1, 2]), &[&["id"]]), None);
    }

    #[test]
    fn to_number_strips_currency_formatting() {
        assert_eq!(to_number(&json!("$1,234.5")), Some(1234.5));
        assert_eq!(to_number(&json!("12 pts")), Some(12.0));
        assert_eq!(to_number(&json!(-3)), Some(-3.0));
    }

    #[test]
    fn to_number_rejects_unparseable_values() {
        assert_eq!(to_number(&json!("n/a")), None);
        assert_eq!(to_number(&json!("")), None);
        assert_eq!(to_number(&json!(null)), None);
        assert_eq!(to_number(&json!({"nested": 1})), None);
        // Multiple separators survive the strip but fail the parse.
        assert_eq!(to_number(&json!("1.2.3")), None);
    }

    #[test]
    fn to_stat_preserves_unparseable_text() {
        assert_eq!(to_stat(&json!("10")), Some(StatValue::Number(10.0)));
        assert_eq!(to_stat(&json!("BYE")), Some(StatValue::Text("BYE".into())));
        assert_eq!(to_stat(&json!("")), None);
        assert_eq!(to_stat(&json!(null)), None);
    }
}
