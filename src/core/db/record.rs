/// Record Module
///
/// An ordered column-name to value map. Insertion order is the column order
/// used when a statement is generated from the record.

use rusqlite::types::Value;

/// Ordered set of `column = value` pairs used as input to the CRUD helpers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Record { fields: Vec::new() }
    }

    /// Builder-style `set`
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    /// Sets `column` to `value`.
    ///
    /// An existing column keeps its position and only has its value replaced.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(name, _)| *name == column) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in insertion order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// The single `(column, value)` pair of a one-key record
    pub fn single(&self) -> Option<(&str, &Value)> {
        match self.fields.as_slice() {
            [(name, value)] => Some((name.as_str(), value)),
            _ => None,
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Record
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (column, value) in iter {
            record.set(column, value);
        }
        record
    }
}

/// Builds a [`Record`] from `column => value` pairs, keeping their order.
///
/// ```
/// use sqlentity::record;
///
/// let user = record! { "id" => 1, "name" => "alice".to_string() };
/// assert_eq!(user.columns().collect::<Vec<_>>(), vec!["id", "name"]);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::core::db::Record::new()
    };
    ($($column:expr => $value:expr),+ $(,)?) => {
        $crate::core::db::Record::new()$(.with($column, $value))+
    };
}
