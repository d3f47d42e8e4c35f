//! Preparing stored response fixtures for comparison against a live instance.
//!
//! Expected-response files are captured from one CKAN instance and compared
//! against another, so identifiers, timestamps and other instance-specific
//! values must either be stripped or replaced with `<<name>>` placeholders that
//! a per-environment variables file fills in.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

/// Keys whose values differ between instances holding the same data.
pub const UNSTABLE_KEYS: [&str; 19] = [
    "_version_",
    "created",
    "creator_user_id",
    "data_dict",
    "harvest_source_reference",
    "id",
    "import_source",
    "indexed_ts",
    "metadata_created",
    "metadata_modified",
    "owner_org",
    "package_count",
    "package_id",
    "revision_id",
    "validated_data_dict",
    "index_id",
    "site_id",
    "harvest_object_id",
    "harvest_source_id",
];

/// Keys holding `[{"key": ..., "value": ...}]` lists.
const KEY_VALUE_LIST_KEYS: [&str; 2] = ["harvest", "extras"];

#[must_use]
pub fn is_unstable_key(key: &str) -> bool {
    UNSTABLE_KEYS.contains(&key)
}

/// Recursively drop unstable data.
///
/// Object entries with an unstable key are removed, as are `{"key", "value"}`
/// pair elements of arrays whose `key` names an unstable field.
#[must_use]
pub fn strip_unstable_data(value: &Value) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .filter(|(key, _)| !is_unstable_key(key))
                .map(|(key, inner)| (key.clone(), strip_unstable_data(inner)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !is_unstable_pair(item))
                .map(strip_unstable_data)
                .collect(),
        ),
        other => other.clone(),
    }
}

fn is_unstable_pair(item: &Value) -> bool {
    let Some(object) = item.as_object() else {
        return false;
    };
    object.len() == 2
        && object.contains_key("value")
        && object
            .get("key")
            .and_then(Value::as_str)
            .is_some_and(is_unstable_key)
}

/// Replace unstable values with `<<key>>` placeholders, in place.
///
/// - Items of `harvest`/`extras` key-value lists get `<<{item key}-value>>`.
/// - The root object's own `id` is kept; nested ids are replaced.
/// - Values that already hold a placeholder are left alone.
///
/// Non-object roots are left untouched.
pub fn clean_unstable_elements(value: &mut Value) {
    if let Value::Object(object) = value {
        clean_object(object, true);
    }
}

fn clean_object(object: &mut Map<String, Value>, is_root: bool) {
    for (key, value) in object.iter_mut() {
        if KEY_VALUE_LIST_KEYS.contains(&key.as_str()) {
            placeholder_key_value_list(value);
            continue;
        }
        match value {
            Value::Array(items) => {
                for item in items.iter_mut().filter_map(Value::as_object_mut) {
                    clean_object(item, false);
                }
            }
            Value::Object(inner) => clean_object(inner, false),
            scalar => {
                if is_unstable_key(key) && !(is_root && key == "id") && !is_placeholder(scalar) {
                    *scalar = Value::String(format!("<<{key}>>"));
                }
            }
        }
    }
}

fn placeholder_key_value_list(list: &mut Value) {
    let Some(items) = list.as_array_mut() else {
        return;
    };
    for item in items.iter_mut().filter_map(Value::as_object_mut) {
        let Some(item_key) = item.get("key").map(plain_string) else {
            continue;
        };
        item.insert(
            "value".to_string(),
            Value::String(format!("<<{item_key}-value>>")),
        );
    }
}

fn is_placeholder(value: &Value) -> bool {
    value.as_str().is_some_and(|text| text.starts_with("<<"))
}

fn plain_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Recursively drop every object entry named in `keys`.
#[must_use]
pub fn remove_keys(value: &Value, keys: &[&str]) -> Value {
    match value {
        Value::Object(object) => Value::Object(
            object
                .iter()
                .filter(|(key, _)| !keys.contains(&key.as_str()))
                .map(|(key, inner)| (key.clone(), remove_keys(inner, keys)))
                .collect(),
        ),
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| remove_keys(item, keys)).collect())
        }
        other => other.clone(),
    }
}

/// Fill `<<name>>` placeholders from `vars`.
///
/// Substitution runs over the serialized JSON text, so it reaches object keys
/// as well as string values. Replacement text is inserted verbatim; a value
/// containing JSON syntax characters such as `"` yields a [`Error::Json`].
pub fn substitute_vars(value: &Value, vars: &BTreeMap<String, String>) -> Result<Value> {
    let mut text = serde_json::to_string(value)?;
    for (name, replacement) in vars {
        let placeholder = format!("<<{name}>>");
        if text.contains(&placeholder) {
            text = text.replace(&placeholder, replacement);
        }
    }
    Ok(serde_json::from_str(&text)?)
}

/// Parse a `name=value` per line variables file.
///
/// Names and values are trimmed; a line without `=` defines an empty value.
/// Blank lines and `#` comments are skipped.
#[must_use]
pub fn parse_vars(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let (name, value) = line.split_once('=').unwrap_or((line, ""));
            (name.trim().to_string(), value.trim().to_string())
        })
        .collect()
}

pub fn load_vars(path: &Path) -> Result<BTreeMap<String, String>> {
    let text = std::fs::read_to_string(path).map_err(|err| {
        Error::config(format!("failed to read vars file {}: {err}", path.display()))
    })?;
    Ok(parse_vars(&text))
}

/// Load a stored example response.
pub fn load_fixture(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn uuid_regex() -> &'static Regex {
    static UUID_RE: OnceLock<Regex> = OnceLock::new();
    UUID_RE.get_or_init(|| {
        Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$")
            .expect("uuid regex")
    })
}

#[must_use]
pub fn is_uuid(text: &str) -> bool {
    uuid_regex().is_match(text)
}

/// Package slugs suitable for random sampling from a `package_list` result.
///
/// Bare UUIDs and harvest-related packages are excluded.
pub fn suitable_package_slugs(package_list: &Value) -> Result<Vec<&str>> {
    let names = package_list
        .as_array()
        .ok_or_else(|| Error::validation("package_list result is not an array"))?;
    let suitable: Vec<&str> = names
        .iter()
        .filter_map(Value::as_str)
        .filter(|name| !is_uuid(name) && !name.contains("harvest"))
        .collect();
    if suitable.is_empty() {
        return Err(Error::validation("No suitable package slugs found"));
    }
    Ok(suitable)
}

/// Look up an entry of a package's `extras` key-value list.
#[must_use]
pub fn extra_value<'a>(package: &'a Value, key: &str) -> Option<&'a Value> {
    package
        .get("extras")?
        .as_array()?
        .iter()
        .find(|item| item.get("key").and_then(Value::as_str) == Some(key))?
        .get("value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unstable_pair_requires_exact_key_value_shape() {
        assert!(is_unstable_pair(&json!({"key": "harvest_object_id", "value": "x"})));
        assert!(!is_unstable_pair(&json!({"key": "harvest_object_id", "value": "x", "n": 1})));
        assert!(!is_unstable_pair(&json!({"key": "licence", "value": "x"})));
        assert!(!is_unstable_pair(&json!("harvest_object_id")));
    }

    #[test]
    fn uuid_detection() {
        assert!(is_uuid("5f1b8c1e-0d4a-4c5e-9a77-1f2b3c4d5e6f"));
        assert!(!is_uuid("example-dataset-number-one"));
        assert!(!is_uuid("x5f1b8c1e-0d4a-4c5e-9a77-1f2b3c4d5e6f"));
    }

    #[test]
    fn parse_vars_trims_and_skips_noise() {
        let vars = parse_vars("# comment\n org_id = abc-123 \n\nflag\nurl=http://x/?a=b\n");
        assert_eq!(vars.get("org_id").map(String::as_str), Some("abc-123"));
        assert_eq!(vars.get("flag").map(String::as_str), Some(""));
        assert_eq!(vars.get("url").map(String::as_str), Some("http://x/?a=b"));
        assert_eq!(vars.len(), 3);
    }

    #[test]
    fn extra_value_finds_pair() {
        let package = json!({"extras": [{"key": "a", "value": 1}, {"key": "harvest_object_id", "value": "h-1"}]});
        assert_eq!(extra_value(&package, "harvest_object_id"), Some(&json!("h-1")));
        assert_eq!(extra_value(&package, "missing"), None);
        assert_eq!(extra_value(&json!({}), "a"), None);
    }
}
