//! Row records.

use std::collections::BTreeMap;

use crate::value::Value;

/// A stored row: column name to value.
///
/// Users, roles and user-role links are all records; which columns they carry
/// is decided by the realm's schema mapping, not by this type.
pub type Record = BTreeMap<String, Value>;

/// Builds a [`Record`] from `column => value` pairs.
///
/// ```
/// use realm_model::{record, Value};
///
/// let user = record! { "username" => "dave", "active" => 1 };
/// assert_eq!(user["username"], Value::from("dave"));
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($column:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(record.insert(::std::string::String::from($column), $crate::Value::from($value));)+
        record
    }};
}

/// Convenience accessors on records.
pub trait RecordExt {
    /// Returns the column value, treating `Null` as absent.
    fn value(&self, column: &str) -> Option<&Value>;

    /// Returns the column as text.
    fn text(&self, column: &str) -> Option<&str>;
}

impl RecordExt for BTreeMap<String, Value> {
    fn value(&self, column: &str) -> Option<&Value> {
        self.get(column).filter(|v| !v.is_null())
    }

    fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_str)
    }
}
