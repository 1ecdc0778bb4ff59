//! Search filters.
//!
//! A [`Filter`] is a conjunction of per-column [`Condition`]s. Filters are
//! built from realm settings (the valid-user predicate, written as a JSON-like
//! map) and from lookups (column equality), and are evaluated either by the
//! schema facade or by [`Filter::matches`] for in-memory stores.

use std::collections::BTreeMap;

use crate::error::{ModelError, ModelResult};
use crate::record::Record;
use crate::value::Value;

/// A condition on a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Column equals the value.
    Eq(Value),
    /// Column differs from the value (and is not `NULL`).
    Ne(Value),
    /// Column is less than the value.
    Lt(Value),
    /// Column is less than or equal to the value.
    Le(Value),
    /// Column is greater than the value.
    Gt(Value),
    /// Column is greater than or equal to the value.
    Ge(Value),
    /// Column equals one of the values.
    In(Vec<Value>),
    /// Column equals none of the values.
    NotIn(Vec<Value>),
    /// Column is `NULL` or missing.
    IsNull,
    /// Column is present and not `NULL`.
    IsNotNull,
    /// All nested conditions hold.
    All(Vec<Condition>),
}

impl Condition {
    /// Evaluates the condition against a column value (`None` if the column is absent).
    #[must_use]
    pub fn evaluate(&self, actual: Option<&Value>) -> bool {
        let actual = actual.filter(|v| !v.is_null());
        match self {
            Self::IsNull => actual.is_none(),
            Self::IsNotNull => actual.is_some(),
            Self::Eq(Value::Null) => actual.is_none(),
            Self::Ne(Value::Null) => actual.is_some(),
            Self::Eq(expected) => actual.is_some_and(|a| a.loosely_eq(expected)),
            Self::Ne(expected) => actual.is_some_and(|a| !a.loosely_eq(expected)),
            Self::Lt(bound) => actual.is_some_and(|a| a.compare(bound).is_some_and(|o| o.is_lt())),
            Self::Le(bound) => actual.is_some_and(|a| a.compare(bound).is_some_and(|o| o.is_le())),
            Self::Gt(bound) => actual.is_some_and(|a| a.compare(bound).is_some_and(|o| o.is_gt())),
            Self::Ge(bound) => actual.is_some_and(|a| a.compare(bound).is_some_and(|o| o.is_ge())),
            Self::In(values) => actual.is_some_and(|a| values.iter().any(|v| a.loosely_eq(v))),
            Self::NotIn(values) => actual.is_some_and(|a| !values.iter().any(|v| a.loosely_eq(v))),
            Self::All(conditions) => conditions.iter().all(|c| c.evaluate(actual)),
        }
    }

    /// Returns the value this condition pins the column to, if it is a plain equality.
    #[must_use]
    pub const fn equality(&self) -> Option<&Value> {
        match self {
            Self::Eq(v) if !v.is_null() => Some(v),
            _ => None,
        }
    }

    /// Parses a condition from its settings form.
    ///
    /// A scalar means equality, `null` means `IS NULL`, an array means `IN`, and
    /// an object maps operators (`=`, `!=`, `<`, `<=`, `>`, `>=`, `-in`,
    /// `-not_in`) to operands. `{"!=": null}` means `IS NOT NULL`. Several
    /// operators in one object must all hold.
    ///
    /// ## Errors
    ///
    /// Returns `ModelError::UnknownOperator` or `ModelError::InvalidOperand`.
    pub fn from_json(column: &str, json: &serde_json::Value) -> ModelResult<Self> {
        match json {
            serde_json::Value::Null => Ok(Self::IsNull),
            serde_json::Value::Array(items) => Ok(Self::In(
                items.iter().cloned().map(Value::from).collect(),
            )),
            serde_json::Value::Object(ops) => {
                let mut conditions = ops
                    .iter()
                    .map(|(op, operand)| Self::from_operator(column, op, operand))
                    .collect::<ModelResult<Vec<_>>>()?;
                match conditions.len() {
                    0 => Err(ModelError::invalid_operand(column, "empty condition")),
                    1 => Ok(conditions.remove(0)),
                    _ => Ok(Self::All(conditions)),
                }
            }
            scalar => Ok(Self::Eq(Value::from(scalar.clone()))),
        }
    }

    fn from_operator(column: &str, op: &str, operand: &serde_json::Value) -> ModelResult<Self> {
        let list = |operand: &serde_json::Value| match operand {
            serde_json::Value::Array(items) => {
                Ok(items.iter().cloned().map(Value::from).collect::<Vec<_>>())
            }
            _ => Err(ModelError::invalid_operand(column, "expected a list")),
        };
        let scalar = |operand: &serde_json::Value| match operand {
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
                Err(ModelError::invalid_operand(column, "expected a scalar"))
            }
            other => Ok(Value::from(other.clone())),
        };

        match op.to_ascii_lowercase().as_str() {
            "=" | "==" | "-eq" if operand.is_null() => Ok(Self::IsNull),
            "!=" | "<>" | "-ne" if operand.is_null() => Ok(Self::IsNotNull),
            "=" | "==" | "-eq" => scalar(operand).map(Self::Eq),
            "!=" | "<>" | "-ne" => scalar(operand).map(Self::Ne),
            "<" | "-lt" => scalar(operand).map(Self::Lt),
            "<=" | "-le" => scalar(operand).map(Self::Le),
            ">" | "-gt" => scalar(operand).map(Self::Gt),
            ">=" | "-ge" => scalar(operand).map(Self::Ge),
            "-in" => list(operand).map(Self::In),
            "-not_in" => list(operand).map(Self::NotIn),
            _ => Err(ModelError::UnknownOperator {
                column: column.to_string(),
                operator: op.to_string(),
            }),
        }
    }
}

/// A conjunction of column conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    conditions: BTreeMap<String, Condition>,
}

impl Filter {
    /// Creates an empty filter (matches every row).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a single-column equality filter.
    #[must_use]
    pub fn equals(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().with(column, Condition::Eq(value.into()))
    }

    /// Adds a condition, replacing any existing condition on the same column.
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, condition: Condition) -> Self {
        self.conditions.insert(column.into(), condition);
        self
    }

    /// Adds an equality condition, replacing any existing condition on the column.
    #[must_use]
    pub fn and_eq(self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with(column, Condition::Eq(value.into()))
    }

    /// Merges another filter in; its conditions win on shared columns.
    #[must_use]
    pub fn merge(mut self, other: &Self) -> Self {
        for (column, condition) in &other.conditions {
            self.conditions.insert(column.clone(), condition.clone());
        }
        self
    }

    /// Returns the condition on a column.
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Condition> {
        self.conditions.get(column)
    }

    /// Iterates over `(column, condition)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns true if the filter has no conditions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns the number of constrained columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    /// Evaluates the filter against a row.
    #[must_use]
    pub fn matches(&self, row: &Record) -> bool {
        self.conditions
            .iter()
            .all(|(column, condition)| condition.evaluate(row.get(column)))
    }

    /// Returns the columns pinned by plain equality, with their values.
    ///
    /// Used to seed new rows so they satisfy the filter they were created under.
    #[must_use]
    pub fn equalities(&self) -> Record {
        self.conditions
            .iter()
            .filter_map(|(column, c)| c.equality().map(|v| (column.clone(), v.clone())))
            .collect()
    }

    /// Parses a filter from a settings map of `column -> condition`.
    ///
    /// ## Errors
    ///
    /// Returns the first condition parse error.
    pub fn from_json_map(map: &BTreeMap<String, serde_json::Value>) -> ModelResult<Self> {
        map.iter().try_fold(Self::new(), |filter, (column, json)| {
            Ok(filter.with(column.clone(), Condition::from_json(column, json)?))
        })
    }
}
