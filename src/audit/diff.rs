//! Change summaries for the audit log

use serde_json::Value;

/// Fields that change on every write and carry no information
const IGNORED_FIELDS: &[&str] = &["updated_at"];

/// Fields whose values must never be written to the log
const SECRET_FIELDS: &[&str] = &["password_hash"];

/// Summarize top-level field changes between two records
///
/// Returns `None` when nothing meaningful changed.
pub fn summarize_changes(before: &Value, after: &Value) -> Option<String> {
    let (Value::Object(before_obj), Value::Object(after_obj)) = (before, after) else {
        return (before != after)
            .then(|| format!("{} -> {}", format_value(before), format_value(after)));
    };

    let mut changes = Vec::new();
    for (key, before_val) in before_obj {
        if IGNORED_FIELDS.contains(&key.as_str()) {
            continue;
        }
        match after_obj.get(key) {
            Some(after_val) if after_val == before_val => {}
            Some(_) if SECRET_FIELDS.contains(&key.as_str()) => {
                changes.push(format!("{}: (changed)", key));
            }
            Some(after_val) => changes.push(format!(
                "{}: {} -> {}",
                key,
                format_value(before_val),
                format_value(after_val)
            )),
            None => changes.push(format!("{}: {} -> (removed)", key, format_value(before_val))),
        }
    }
    for (key, after_val) in after_obj {
        if !before_obj.contains_key(key) && !IGNORED_FIELDS.contains(&key.as_str()) {
            changes.push(format!("{}: (added) -> {}", key, format_value(after_val)));
        }
    }

    if changes.is_empty() {
        None
    } else {
        Some(changes.join(", "))
    }
}

/// Strip secret fields from a serialized record before it is logged
pub fn redact(mut value: Value) -> Value {
    if let Value::Object(obj) = &mut value {
        for field in SECRET_FIELDS {
            if obj.contains_key(*field) {
                obj.insert((*field).to_string(), Value::String("[redacted]".into()));
            }
        }
    }
    value
}

fn format_value(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::String(s) if s.chars().count() > 40 => {
            let head: String = s.chars().take(37).collect();
            format!("\"{}...\"", head)
        }
        Value::String(s) => format!("\"{}\"", s),
        Value::Array(items) => format!("[{} items]", items.len()),
        Value::Object(fields) => format!("{{{} fields}}", fields.len()),
        other => other.to_string(),
    }
}
