//! Preference Bag
//!
//! Key/value preferences carried by the chart endpoint's validation response.

use serde_json::{Map, Number, Value};

/// Preferences extracted from a validation response, in server order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceBag {
    entries: Vec<(String, String)>,
}

impl PreferenceBag {
    /// Parse a response body.
    ///
    /// The preferences are the `data` field when it is truthy, otherwise the
    /// whole body. Returns `Ok(None)` when that value is not object-shaped and
    /// `Err` when the body is not JSON at all.
    pub fn from_response_body(body: &str) -> Result<Option<Self>, serde_json::Error> {
        let result: Value = serde_json::from_str(body)?;

        let prefs = match result.get("data") {
            Some(data) if is_truthy(data) => data,
            _ => &result,
        };

        let bag = match prefs {
            Value::Object(map) => Self::from_object(map),
            Value::Array(items) => Self::from_array(items),
            _ => return Ok(None),
        };
        Ok(Some(bag))
    }

    fn from_object(map: &Map<String, Value>) -> Self {
        let entries = map
            .iter()
            .filter_map(|(key, value)| stored_form(value).map(|v| (key.clone(), v)))
            .collect();
        Self { entries }
    }

    // Arrays are objects keyed by index
    fn from_array(items: &[Value]) -> Self {
        let entries = items
            .iter()
            .enumerate()
            .filter_map(|(i, value)| stored_form(value).map(|v| (i.to_string(), v)))
            .collect();
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// String form written to the store; `None` for null
fn stored_form(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(number_text(n)),
        nested => Some(nested.to_string()),
    }
}

/// Integral floats drop the fraction (`2.0` is stored as `2`)
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => n.to_string(),
    }
}
