//! Non-failing narrowing of dynamically typed control-block fields.
//!
//! Each accessor returns `None` when the field is absent or has the wrong
//! JSON type. List accessors keep only conforming elements.

use serde_json::{Map, Value};

pub type Object = Map<String, Value>;

pub fn string_field(container: &Object, key: &str) -> Option<String> {
    container.get(key).and_then(Value::as_str).map(str::to_string)
}

/// JSON numbers narrowed to integers, truncating any fraction toward zero.
pub fn int_field(container: &Object, key: &str) -> Option<i64> {
    container.get(key).and_then(Value::as_f64).map(|n| n as i64)
}

pub fn string_list_field(container: &Object, key: &str) -> Option<Vec<String>> {
    let items = container.get(key).and_then(Value::as_array)?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

pub fn object_list_field(container: &Object, key: &str) -> Option<Vec<Object>> {
    let items = container.get(key).and_then(Value::as_array)?;
    Some(
        items
            .iter()
            .filter_map(Value::as_object)
            .cloned()
            .collect(),
    )
}
