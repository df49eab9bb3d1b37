//! Forward-only row cursor consumed by the pagination engine

use crate::data_source::{DataSource, Value};

/// A forward-only cursor over report rows.
///
/// The engine calls [`advance`](DataCursor::advance) once when leaving the
/// report header and once per detail row; it never advances during page or
/// group bands.
pub trait DataCursor {
    /// Move onto the next row. Returns `false` once the rows are exhausted.
    fn advance(&mut self) -> bool;

    /// Index of the current row, `None` before the first advance or after exhaustion
    fn current_row_index(&self) -> Option<usize>;

    /// Whether the current row is the last one
    fn is_last(&self) -> bool;

    /// Value of a field in the current row
    fn get_value(&self, field_name: &str) -> Option<Value>;

    /// Reorder the rows by the given fields, first field most significant
    fn apply_sort(&mut self, field_names: &[String]);

    /// Names of the fields this cursor can serve
    fn field_names(&self) -> Vec<String>;

    /// Value of a field rendered as text, empty when the row or field is missing
    fn value_or_default(&self, field_name: &str) -> String {
        match self.get_value(field_name) {
            Some(value) => value.to_string_value(),
            None => {
                tracing::debug!(
                    field = field_name,
                    row = ?self.current_row_index(),
                    "field lookup missed, using empty value"
                );
                String::new()
            }
        }
    }
}

impl DataCursor for DataSource {
    fn advance(&mut self) -> bool {
        let next = self.position.map_or(0, |i| i + 1);
        if next < self.records.len() {
            self.position = Some(next);
            true
        } else {
            self.position = Some(self.records.len());
            false
        }
    }

    fn current_row_index(&self) -> Option<usize> {
        self.position.filter(|i| *i < self.records.len())
    }

    fn is_last(&self) -> bool {
        match self.position {
            Some(i) => i + 1 == self.records.len(),
            None => false,
        }
    }

    fn get_value(&self, field_name: &str) -> Option<Value> {
        self.current_record().and_then(|r| r.get(field_name)).cloned()
    }

    fn apply_sort(&mut self, field_names: &[String]) {
        self.sort_by_columns(field_names);
    }

    fn field_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// Cursor with no rows, used when a report has no data bound
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyDataSource;

impl DataCursor for EmptyDataSource {
    fn advance(&mut self) -> bool {
        false
    }

    fn current_row_index(&self) -> Option<usize> {
        None
    }

    fn is_last(&self) -> bool {
        false
    }

    fn get_value(&self, _field_name: &str) -> Option<Value> {
        None
    }

    fn apply_sort(&mut self, _field_names: &[String]) {}

    fn field_names(&self) -> Vec<String> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn three_rows() -> DataSource {
        DataSource::from_rows(
            "rows",
            ["name"],
            vec![vec!["a"], vec!["b"], vec!["c"]],
        )
    }

    #[test]
    fn test_advance_walks_all_rows() {
        let mut ds = three_rows();
        assert_eq!(ds.current_row_index(), None);

        assert!(ds.advance());
        assert_eq!(ds.current_row_index(), Some(0));
        assert_eq!(ds.value_or_default("name"), "a");
        assert!(!ds.is_last());

        assert!(ds.advance());
        assert!(ds.advance());
        assert!(ds.is_last());
        assert_eq!(ds.value_or_default("name"), "c");

        assert!(!ds.advance());
        assert_eq!(ds.current_row_index(), None);
        assert!(!ds.advance());
    }

    #[test]
    fn test_missing_field_is_empty() {
        let mut ds = three_rows();
        ds.advance();
        assert_eq!(ds.get_value("missing"), None);
        assert_eq!(ds.value_or_default("missing"), "");
    }

    #[test]
    fn test_value_before_first_advance_is_empty() {
        let ds = three_rows();
        assert_eq!(ds.value_or_default("name"), "");
    }

    #[test]
    fn test_apply_sort_rewinds() {
        let mut ds = DataSource::from_rows("rows", ["k"], vec![vec!["z"], vec!["m"], vec!["a"]]);
        ds.advance();
        ds.apply_sort(&["k".to_string()]);
        assert_eq!(ds.current_row_index(), None);
        assert!(ds.advance());
        assert_eq!(ds.value_or_default("k"), "a");
    }

    #[test]
    fn test_empty_source_never_advances() {
        let mut empty = EmptyDataSource;
        assert!(!empty.advance());
        assert_eq!(empty.value_or_default("anything"), "");
        assert!(empty.field_names().is_empty());
    }

    proptest! {
        #[test]
        fn prop_sort_groups_keys_and_keeps_every_row(
            keys in proptest::collection::vec(0u8..4, 0..40)
        ) {
            let rows = keys
                .iter()
                .enumerate()
                .map(|(i, k)| vec![format!("k{}", k), format!("{}", i)]);
            let mut ds = DataSource::from_rows("rows", ["key", "seq"], rows);
            ds.apply_sort(&["key".to_string()]);

            let mut seen = Vec::new();
            while ds.advance() {
                seen.push((ds.value_or_default("key"), ds.value_or_default("seq")));
            }
            prop_assert_eq!(seen.len(), keys.len());
            prop_assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
            // Stable: rows sharing a key keep their input order
            for w in seen.windows(2).filter(|w| w[0].0 == w[1].0) {
                let a: usize = w[0].1.parse().unwrap();
                let b: usize = w[1].1.parse().unwrap();
                prop_assert!(a < b);
            }
        }
    }
}
