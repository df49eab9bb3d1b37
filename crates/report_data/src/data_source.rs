//! In-memory row data source

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An in-memory table of records with a forward-only read position.
///
/// The read position starts before the first record; [`DataCursor::advance`]
/// moves it onto the next one.
///
/// [`DataCursor::advance`]: crate::DataCursor::advance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    /// Identifier of this data source (file stem, query name, ...)
    pub id: String,
    /// Column definitions
    pub columns: Vec<ColumnDef>,
    /// Data records
    pub records: Vec<Record>,
    /// Index of the current record, `None` before the first advance
    #[serde(skip)]
    pub(crate) position: Option<usize>,
}

impl DataSource {
    /// Create an empty data source with the given ID
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            columns: Vec::new(),
            records: Vec::new(),
            position: None,
        }
    }

    /// Create a data source from column names and rows of values.
    ///
    /// Column types are inferred from the first non-null value in each column.
    pub fn from_rows<C, R, V>(id: impl Into<String>, columns: C, rows: R) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator<Item = Vec<V>>,
        V: Into<Value>,
    {
        let names: Vec<String> = columns.into_iter().map(Into::into).collect();
        let mut source = Self::new(id);

        for row in rows {
            let record: Record = names
                .iter()
                .cloned()
                .zip(row.into_iter().map(Into::into))
                .collect();
            source.add_record(record);
        }

        for name in names {
            let data_type = source
                .records
                .iter()
                .filter_map(|r| r.get(&name).and_then(Value::data_type))
                .next()
                .unwrap_or(DataType::Text);
            source.add_column(ColumnDef::new(name, data_type));
        }

        source
    }

    /// Add a column definition
    pub fn add_column(&mut self, column: ColumnDef) {
        self.columns.push(column);
    }

    /// Add a record
    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Add a column definition (builder style)
    pub fn with_column(mut self, column: ColumnDef) -> Self {
        self.add_column(column);
        self
    }

    /// Add a record (builder style)
    pub fn with_record(mut self, record: Record) -> Self {
        self.add_record(record);
        self
    }

    /// Get the number of records
    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get column names
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Get a record by index
    pub fn get_record(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    /// Check if a column exists
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Get column definition by name
    pub fn get_column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get value from a specific record and column
    pub fn get_value_at(&self, record_index: usize, column_name: &str) -> Option<&Value> {
        self.records.get(record_index).and_then(|r| r.get(column_name))
    }

    /// The record under the read position
    pub fn current_record(&self) -> Option<&Record> {
        self.position.and_then(|i| self.records.get(i))
    }

    /// Move the read position back before the first record
    pub fn rewind(&mut self) {
        self.position = None;
    }

    /// Stable sort of the records by the given columns, first column most significant.
    ///
    /// Resets the read position.
    pub fn sort_by_columns(&mut self, columns: &[String]) {
        if columns.is_empty() {
            return;
        }
        let null = Value::Null;
        self.records.sort_by(|a, b| {
            columns
                .iter()
                .map(|c| {
                    let left = a.get(c).unwrap_or(&null);
                    let right = b.get(c).unwrap_or(&null);
                    left.compare(right)
                })
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        self.position = None;
    }
}

/// Column definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name (used for field binding)
    pub name: String,
    /// Data type of the column
    pub data_type: DataType,
    /// Optional display name
    pub display_name: Option<String>,
}

impl ColumnDef {
    /// Create a new column definition
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            display_name: None,
        }
    }

    /// Set a display name
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Get the display name, falling back to the column name
    pub fn display(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

/// Data type for column values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Text/string value
    Text,
    /// Numeric value (floating point)
    Number,
    /// Date value
    Date,
    /// Boolean value
    Boolean,
}

impl DataType {
    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Number => "number",
            DataType::Date => "date",
            DataType::Boolean => "boolean",
        }
    }
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single record (row) of data
pub type Record = HashMap<String, Value>;

/// A value in a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// Text/string value
    Text(String),
    /// Numeric value
    Number(f64),
    /// Date value
    Date(NaiveDate),
    /// Boolean value
    Boolean(bool),
    /// Null/missing value
    #[default]
    Null,
}

impl Value {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the data type of this value
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Text(_) => Some(DataType::Text),
            Value::Number(_) => Some(DataType::Number),
            Value::Date(_) => Some(DataType::Date),
            Value::Boolean(_) => Some(DataType::Boolean),
            Value::Null => None,
        }
    }

    /// Convert to string representation
    pub fn to_string_value(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            Value::Number(n) => {
                // Integers print without decimal places
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::Boolean(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Null => String::new(),
        }
    }

    /// Try to get as text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get as number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get as date
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Try to get as boolean
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Total order used for sorting rows.
    ///
    /// Nulls sort first, then booleans, numbers, dates and text. Values of
    /// the same kind compare naturally; NaN sorts after every other number.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Text(a), Value::Text(b)) => a.cmp(b),
            (Value::Number(a), Value::Number(b)) => a.total_cmp(b),
            (Value::Date(a), Value::Date(b)) => a.cmp(b),
            (Value::Boolean(a), Value::Boolean(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Boolean(_) => 1,
            Value::Number(_) => 2,
            Value::Date(_) => 3,
            Value::Text(_) => 4,
        }
    }

    /// Parse a string value with automatic type detection
    pub fn parse_auto(s: &str) -> Value {
        let trimmed = s.trim();

        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") || trimmed.eq_ignore_ascii_case("na") {
            return Value::Null;
        }

        if trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("yes") {
            return Value::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") || trimmed.eq_ignore_ascii_case("no") {
            return Value::Boolean(false);
        }

        if let Some(date) = try_parse_date(trimmed) {
            return Value::Date(date);
        }

        if let Ok(n) = trimmed.parse::<f64>() {
            return Value::Number(n);
        }

        Value::Text(s.to_string())
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_value())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        match opt {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Try to parse a date from the common unambiguous formats
fn try_parse_date(s: &str) -> Option<NaiveDate> {
    let formats = [
        "%Y-%m-%d",  // 2024-01-15
        "%Y/%m/%d",  // 2024/01/15
        "%d.%m.%Y",  // 15.01.2024
        "%B %d, %Y", // January 15, 2024
        "%b %d, %Y", // Jan 15, 2024
        "%d %B %Y",  // 15 January 2024
        "%d %b %Y",  // 15 Jan 2024
    ];

    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(s, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_parse_auto() {
        assert!(matches!(Value::parse_auto(""), Value::Null));
        assert!(matches!(Value::parse_auto("null"), Value::Null));
        assert!(matches!(Value::parse_auto("NA"), Value::Null));

        assert!(matches!(Value::parse_auto("true"), Value::Boolean(true)));
        assert!(matches!(Value::parse_auto("no"), Value::Boolean(false)));

        assert_eq!(Value::parse_auto("42"), Value::Number(42.0));
        assert_eq!(
            Value::parse_auto("2024-01-15"),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
        assert_eq!(Value::parse_auto("Hello World"), Value::Text("Hello World".into()));
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(Value::Text("hello".to_string()).to_string_value(), "hello");
        assert_eq!(Value::Number(42.0).to_string_value(), "42");
        assert_eq!(Value::Number(3.5).to_string_value(), "3.5");
        assert_eq!(Value::Boolean(true).to_string_value(), "true");
        assert_eq!(Value::Null.to_string_value(), "");
    }

    #[test]
    fn test_value_compare_orders_kinds() {
        assert_eq!(Value::Null.compare(&Value::Number(1.0)), Ordering::Less);
        assert_eq!(Value::Number(2.0).compare(&Value::Number(10.0)), Ordering::Less);
        assert_eq!(Value::Text("b".into()).compare(&Value::Text("a".into())), Ordering::Greater);
        assert_eq!(Value::Number(5.0).compare(&Value::Text("5".into())), Ordering::Less);
    }

    #[test]
    fn test_from_rows_infers_columns() {
        let ds = DataSource::from_rows(
            "orders",
            ["customer", "total"],
            vec![
                vec![Value::from("Acme"), Value::from(12.5)],
                vec![Value::from("Globex"), Value::Null],
            ],
        );

        assert_eq!(ds.record_count(), 2);
        assert_eq!(ds.column_names(), vec!["customer", "total"]);
        assert_eq!(ds.get_column("total").unwrap().data_type, DataType::Number);
        assert_eq!(ds.get_value_at(0, "customer"), Some(&Value::from("Acme")));
    }

    #[test]
    fn test_builder_adds_columns_and_records() {
        let record: Record = [("sku".to_string(), Value::from("A-1"))].into_iter().collect();
        let ds = DataSource::new("stock")
            .with_column(ColumnDef::new("sku", DataType::Text).with_display_name("SKU"))
            .with_record(record);

        assert_eq!(ds.column_count(), 1);
        assert_eq!(ds.get_column("sku").unwrap().display(), "SKU");
        assert_eq!(ds.get_value_at(0, "sku"), Some(&Value::from("A-1")));
    }

    #[test]
    fn test_sort_by_columns_is_stable() {
        let mut ds = DataSource::from_rows(
            "t",
            ["group", "seq"],
            vec![
                vec![Value::from("b"), Value::from(1)],
                vec![Value::from("a"), Value::from(2)],
                vec![Value::from("b"), Value::from(3)],
                vec![Value::from("a"), Value::from(4)],
            ],
        );
        ds.sort_by_columns(&["group".to_string()]);

        let seq: Vec<String> = ds
            .records
            .iter()
            .map(|r| r["seq"].to_string_value())
            .collect();
        assert_eq!(seq, vec!["2", "4", "1", "3"]);
    }
}
