use crate::value::Value;
use derive_more::{Deref, IntoIterator};
use serde::{Deserialize, Serialize};

///
/// Column
///
/// One named cell of a raw result row.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub value: Value,
}

///
/// Row
///
/// Ordered named columns; the raw unit every shard returns and every merge
/// policy consumes. Column order is significant: distributed projections
/// are read back positionally.
///

#[derive(Clone, Debug, Default, Deref, Deserialize, IntoIterator, PartialEq, Serialize)]
pub struct Row {
    #[deref]
    #[into_iterator(owned, ref)]
    columns: Vec<Column>,
}

impl Row {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            columns: Vec::new(),
        }
    }

    /// Fluent column append.
    #[must_use]
    pub fn col(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.push(Column {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        self.columns.push(Column {
            name: name.into(),
            value,
        });
    }

    /// Look a column up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| &column.value)
    }

    /// Positional column access.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.columns.get(index).map(|column| &column.value)
    }

    /// The sole cell of a single-column row.
    #[must_use]
    pub fn single(&self) -> Option<&Value> {
        match self.columns.as_slice() {
            [column] => Some(&column.value),
            _ => None,
        }
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, value)| Column { name, value })
                .collect(),
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name_and_position() {
        let row = Row::new().col("id", 7_i64).col("name", "ice");

        assert_eq!(row.get("name"), Some(&Value::Text("ice".to_string())));
        assert_eq!(row.at(0), Some(&Value::Int(7)));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.single(), None);
    }

    #[test]
    fn single_requires_exactly_one_column() {
        let row = Row::new().col("count", 3_i64);

        assert_eq!(row.single(), Some(&Value::Int(3)));
    }

    #[test]
    fn serde_round_trip_preserves_column_order() {
        let row = Row::new().col("b", 2_i64).col("a", 1_i64);

        let json = serde_json::to_string(&row).unwrap();
        let back: Row = serde_json::from_str(&json).unwrap();

        assert_eq!(row, back);
        assert_eq!(back.at(0), Some(&Value::Int(2)));
    }
}
