//! JSON loading for report data sources

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde_json::{Map, Value as JsonValue};

use crate::data_source::{ColumnDef, DataSource, DataType, Record, Value};
use crate::error::{DataError, Result};

/// JSON loader configuration
#[derive(Debug, Clone)]
pub struct JsonConfig {
    /// Root path to the data array (e.g., "data.orders")
    pub root_path: Option<String>,
    /// Whether to flatten nested objects with dot notation
    pub flatten_nested: bool,
    /// Maximum nesting depth for flattening
    pub max_depth: usize,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            flatten_nested: true,
            max_depth: 3,
        }
    }
}

impl JsonConfig {
    /// Set the root path for the data array
    pub fn with_root_path(mut self, path: impl Into<String>) -> Self {
        self.root_path = Some(path.into());
        self
    }

    /// Set whether to flatten nested objects
    pub fn with_flatten(mut self, flatten: bool) -> Self {
        self.flatten_nested = flatten;
        self
    }

    /// Set maximum depth for flattening
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}

/// Builds [`DataSource`]s from JSON arrays of objects
#[derive(Debug, Clone, Default)]
pub struct JsonLoader {
    config: JsonConfig,
}

impl JsonLoader {
    /// Create a loader with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a loader with custom configuration
    pub fn with_config(config: JsonConfig) -> Self {
        Self { config }
    }

    /// Load a JSON file
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<DataSource> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DataError::FileNotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)?;
        let id = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("json_source")
            .to_string();

        self.load_str(&content, id)
    }

    /// Load JSON from a string
    pub fn load_str(&self, data: &str, id: impl Into<String>) -> Result<DataSource> {
        let json: JsonValue = serde_json::from_str(data)?;
        self.load_value(&json, id.into())
    }

    fn load_value(&self, json: &JsonValue, id: String) -> Result<DataSource> {
        let data = match self.config.root_path {
            Some(ref path) => navigate_to_path(json, path)?,
            None => json,
        };

        let items: Vec<&Map<String, JsonValue>> = match data {
            JsonValue::Array(arr) => arr
                .iter()
                .map(|item| match item {
                    JsonValue::Object(obj) => Ok(obj),
                    _ => Err(DataError::InvalidDataSource(
                        "Expected every array element to be an object".to_string(),
                    )),
                })
                .collect::<Result<_>>()?,
            JsonValue::Object(obj) => vec![obj],
            _ => {
                return Err(DataError::InvalidDataSource(
                    "Expected JSON array or object".to_string(),
                ));
            }
        };

        let mut source = DataSource::new(id);
        for (name, data_type) in self.collect_columns(&items) {
            source.add_column(ColumnDef::new(name, data_type));
        }
        for obj in items {
            source.add_record(self.object_to_record(obj, "", 0));
        }

        tracing::debug!(
            "Loaded data source '{}' with {} records",
            source.id,
            source.record_count()
        );
        Ok(source)
    }

    /// Collect all unique column names (in first-seen order) and their types
    fn collect_columns(&self, items: &[&Map<String, JsonValue>]) -> Vec<(String, DataType)> {
        let mut column_types: HashMap<String, Vec<DataType>> = HashMap::new();
        let mut column_order: Vec<String> = Vec::new();

        for obj in items {
            self.collect_columns_from_object(obj, "", 0, &mut column_types, &mut column_order);
        }

        column_order
            .into_iter()
            .map(|name| {
                let data_type = column_types
                    .get(&name)
                    .map(|types| infer_column_type(types))
                    .unwrap_or(DataType::Text);
                (name, data_type)
            })
            .collect()
    }

    fn collect_columns_from_object(
        &self,
        obj: &Map<String, JsonValue>,
        prefix: &str,
        depth: usize,
        column_types: &mut HashMap<String, Vec<DataType>>,
        column_order: &mut Vec<String>,
    ) {
        for (key, value) in obj {
            let full_key = join_key(prefix, key);

            match value {
                JsonValue::Object(nested) if self.config.flatten_nested && depth < self.config.max_depth => {
                    self.collect_columns_from_object(nested, &full_key, depth + 1, column_types, column_order);
                }
                _ => {
                    if !column_types.contains_key(&full_key) {
                        column_order.push(full_key.clone());
                    }
                    // Nulls carry no type information
                    let types = column_types.entry(full_key).or_default();
                    if let Some(data_type) = json_value_to_data_type(value) {
                        types.push(data_type);
                    }
                }
            }
        }
    }

    fn object_to_record(&self, obj: &Map<String, JsonValue>, prefix: &str, depth: usize) -> Record {
        let mut record = Record::new();

        for (key, value) in obj {
            let full_key = join_key(prefix, key);

            match value {
                JsonValue::Object(nested) if self.config.flatten_nested && depth < self.config.max_depth => {
                    record.extend(self.object_to_record(nested, &full_key, depth + 1));
                }
                _ => {
                    record.insert(full_key, json_value_to_value(value));
                }
            }
        }

        record
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

/// Navigate to a nested path in a JSON value using dot notation
fn navigate_to_path<'a>(json: &'a JsonValue, path: &str) -> Result<&'a JsonValue> {
    let mut current = json;

    for part in path.split('.') {
        current = match current {
            JsonValue::Object(obj) => obj
                .get(part)
                .ok_or_else(|| DataError::InvalidPath(format!("Path '{}' not found", path)))?,
            JsonValue::Array(arr) => {
                let index: usize = part.parse().map_err(|_| {
                    DataError::InvalidPath(format!(
                        "Expected numeric index for array access, got '{}'",
                        part
                    ))
                })?;
                arr.get(index).ok_or_else(|| {
                    DataError::InvalidPath(format!("Array index {} out of bounds", index))
                })?
            }
            _ => {
                return Err(DataError::InvalidPath(format!(
                    "Cannot access '{}' on non-object/array value",
                    part
                )));
            }
        };
    }

    Ok(current)
}

fn json_value_to_value(json: &JsonValue) -> Value {
    match json {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Boolean(*b),
        JsonValue::Number(n) => n.as_f64().map(Value::Number).unwrap_or(Value::Null),
        JsonValue::String(s) => match Value::parse_auto(s) {
            // Keep textual numbers and flags as written; only dates are promoted
            date @ Value::Date(_) => date,
            Value::Null if !s.trim().is_empty() => Value::Text(s.clone()),
            Value::Null => Value::Null,
            _ => Value::Text(s.clone()),
        },
        JsonValue::Array(_) | JsonValue::Object(_) => Value::Text(json.to_string()),
    }
}

fn json_value_to_data_type(json: &JsonValue) -> Option<DataType> {
    match json_value_to_value(json) {
        Value::Null => None,
        value => value.data_type(),
    }
}

/// Infer the best column type from a list of observed types
fn infer_column_type(types: &[DataType]) -> DataType {
    let unique: HashSet<DataType> = types.iter().copied().collect();
    match types.first() {
        Some(first) if unique.len() == 1 => *first,
        _ => DataType::Text,
    }
}

/// Extract a value from a JSON document using a dot notation path
pub fn get_nested_value<'a>(json: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    navigate_to_path(json, path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataCursor;

    #[test]
    fn test_load_simple_array() {
        let json = r#"[
            {"name": "Alice", "age": 30},
            {"name": "Bob", "age": 25}
        ]"#;

        let ds = JsonLoader::new().load_str(json, "test").unwrap();

        assert_eq!(ds.column_count(), 2);
        assert_eq!(ds.record_count(), 2);
        assert_eq!(ds.get_column("age").unwrap().data_type, DataType::Number);
    }

    #[test]
    fn test_empty_array_is_an_empty_source() {
        let mut ds = JsonLoader::new().load_str("[]", "empty").unwrap();
        assert_eq!(ds.record_count(), 0);
        assert!(!ds.advance());
    }

    #[test]
    fn test_load_with_root_path() {
        let json = r#"{"data": {"orders": [{"id": 1}, {"id": 2}, {"id": 3}]}}"#;

        let loader = JsonLoader::with_config(JsonConfig::default().with_root_path("data.orders"));
        let ds = loader.load_str(json, "orders").unwrap();

        assert_eq!(ds.record_count(), 3);
    }

    #[test]
    fn test_flatten_nested_objects() {
        let json = r#"[{"name": "Alice", "address": {"city": "Oslo"}}]"#;

        let ds = JsonLoader::new().load_str(json, "test").unwrap();

        assert!(ds.has_column("address.city"));
        assert_eq!(ds.get_value_at(0, "address.city"), Some(&Value::Text("Oslo".into())));
    }

    #[test]
    fn test_no_flatten_keeps_json_text() {
        let json = r#"[{"address": {"city": "Oslo"}}]"#;

        let loader = JsonLoader::with_config(JsonConfig::default().with_flatten(false));
        let ds = loader.load_str(json, "test").unwrap();

        assert!(ds.has_column("address"));
        assert!(ds.get_value_at(0, "address").unwrap().to_string_value().contains("Oslo"));
    }

    #[test]
    fn test_null_does_not_decide_column_type() {
        let json = r#"[{"value": null}, {"value": 42}]"#;

        let ds = JsonLoader::new().load_str(json, "test").unwrap();

        assert_eq!(ds.get_column("value").unwrap().data_type, DataType::Number);
        assert!(ds.get_value_at(0, "value").unwrap().is_null());
    }

    #[test]
    fn test_date_strings_are_promoted() {
        let json = r#"[{"shipped": "2024-03-01", "code": "007"}]"#;

        let ds = JsonLoader::new().load_str(json, "test").unwrap();

        assert_eq!(ds.get_column("shipped").unwrap().data_type, DataType::Date);
        assert_eq!(ds.get_value_at(0, "code"), Some(&Value::Text("007".into())));
    }

    #[test]
    fn test_invalid_root_path() {
        let loader = JsonLoader::with_config(JsonConfig::default().with_root_path("nope.path"));
        let result = loader.load_str(r#"{"data": []}"#, "test");

        assert!(matches!(result, Err(DataError::InvalidPath(_))));
    }

    #[test]
    fn test_scalar_elements_rejected() {
        let result = JsonLoader::new().load_str("[1, 2]", "test");
        assert!(matches!(result, Err(DataError::InvalidDataSource(_))));
    }

    #[test]
    fn test_get_nested_value() {
        let json: JsonValue = serde_json::from_str(r#"{"a": {"b": [10, 20]}}"#).unwrap();
        assert_eq!(get_nested_value(&json, "a.b.1").and_then(|v| v.as_i64()), Some(20));
        assert!(get_nested_value(&json, "a.c").is_none());
    }
}
