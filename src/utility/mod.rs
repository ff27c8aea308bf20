//! Small helpers shared by the YAML loaders and the sentence builder.

use yaml_rust2::Yaml;

/// Upper-cases the first character, leaving the rest untouched
/// (`"du"` → `"Du"`, `"Sie"` → `"Sie"`).
pub fn capitalize_first(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ----------------- YAML field readers -----------------
//
// Each reader treats a missing key (`BadValue`) and an explicit `null` as
// absent, and reports a type mismatch as a message the caller wraps into
// its own error type.

fn is_absent(value: &Yaml) -> bool {
    matches!(value, Yaml::BadValue | Yaml::Null)
}

pub fn optional_bool(value: &Yaml, key: &str) -> Result<Option<bool>, String> {
    match value {
        v if is_absent(v) => Ok(None),
        Yaml::Boolean(b) => Ok(Some(*b)),
        other => Err(format!("'{key}' must be a boolean, got {other:?}")),
    }
}

pub fn optional_str(value: &Yaml, key: &str) -> Result<Option<String>, String> {
    match value {
        v if is_absent(v) => Ok(None),
        Yaml::String(s) => Ok(Some(s.clone())),
        other => Err(format!("'{key}' must be a string, got {other:?}")),
    }
}

pub fn required_str(value: &Yaml, key: &str) -> Result<String, String> {
    optional_str(value, key)?.ok_or_else(|| format!("missing '{key}'"))
}

pub fn optional_f64(value: &Yaml, key: &str) -> Result<Option<f64>, String> {
    match value {
        v if is_absent(v) => Ok(None),
        Yaml::Real(_) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| format!("'{key}' is not a valid number")),
        Yaml::Integer(i) => Ok(Some(*i as f64)),
        other => Err(format!("'{key}' must be a number, got {other:?}")),
    }
}

/// A sequence of strings; a missing key is an empty list.
pub fn string_list(value: &Yaml, key: &str) -> Result<Vec<String>, String> {
    match value {
        v if is_absent(v) => Ok(Vec::new()),
        Yaml::Array(items) => items
            .iter()
            .map(|item| match item {
                Yaml::String(s) => Ok(s.clone()),
                other => Err(format!("'{key}' must only contain strings, got {other:?}")),
            })
            .collect(),
        other => Err(format!("'{key}' must be a list, got {other:?}")),
    }
}
