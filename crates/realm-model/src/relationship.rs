//! Relationship descriptors.
//!
//! Schemas declare how their entities link to one another. A descriptor lives
//! on its source entity and names the target entity plus the join condition as
//! `(foreign column on target, local column on source)` pairs, the same shape
//! an ORM uses for `has_many` / `belongs_to` declarations.

use serde::Serialize;

use crate::filter::Filter;
use crate::record::{Record, RecordExt};

/// How many target rows a relationship yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Multiplicity {
    /// At most one target row (`belongs_to`, `might_have`).
    One,
    /// Any number of target rows (`has_many`).
    Many,
}

/// SQL join semantics of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// Inner join.
    Inner,
    /// Left outer join.
    Left,
}

/// One column pair of a join condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinColumn {
    /// Column on the target entity.
    pub foreign: String,
    /// Column on the source entity.
    pub local: String,
}

/// A declared relationship from a source entity to a target entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relationship {
    /// Relationship (accessor) name.
    pub name: String,
    /// Target entity name.
    pub target: String,
    /// Multiplicity.
    pub multiplicity: Multiplicity,
    /// Join type.
    pub join_type: JoinType,
    /// Join condition.
    pub condition: Vec<JoinColumn>,
}

impl Relationship {
    /// Declares a `has_many` relationship: target rows whose `foreign` column
    /// equals this row's `local` column. Left join, many.
    #[must_use]
    pub fn has_many(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            multiplicity: Multiplicity::Many,
            join_type: JoinType::Left,
            condition: vec![JoinColumn {
                foreign: foreign.into(),
                local: local.into(),
            }],
        }
    }

    /// Declares a `belongs_to` relationship: the target row whose `foreign`
    /// column equals this row's `local` column. Inner join, one.
    #[must_use]
    pub fn belongs_to(
        name: impl Into<String>,
        target: impl Into<String>,
        foreign: impl Into<String>,
        local: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            multiplicity: Multiplicity::One,
            join_type: JoinType::Inner,
            condition: vec![JoinColumn {
                foreign: foreign.into(),
                local: local.into(),
            }],
        }
    }

    /// Overrides the join type.
    #[must_use]
    pub const fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self
    }

    /// Returns the join column if the condition has exactly one.
    #[must_use]
    pub fn single_column(&self) -> Option<&JoinColumn> {
        match self.condition.as_slice() {
            [column] => Some(column),
            _ => None,
        }
    }

    /// Returns true if this relationship links `source` to the target the way
    /// `forward` links its target back to `source`, i.e. the condition is the
    /// swapped image of `forward`'s.
    #[must_use]
    pub fn is_inverse_of(&self, forward: &Self, source: &str) -> bool {
        self.target == source
            && self.condition.len() == forward.condition.len()
            && self.condition.iter().all(|c| {
                forward
                    .condition
                    .iter()
                    .any(|f| f.foreign == c.local && f.local == c.foreign)
            })
    }

    /// Builds the inverse of this relationship as seen from its target.
    #[must_use]
    pub fn inverse(&self, name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: source.into(),
            multiplicity: Multiplicity::One,
            join_type: JoinType::Inner,
            condition: self
                .condition
                .iter()
                .map(|c| JoinColumn {
                    foreign: c.local.clone(),
                    local: c.foreign.clone(),
                })
                .collect(),
        }
    }

    /// Builds the target-side filter selecting the rows related to `row`.
    ///
    /// Returns `None` if `row` lacks a value for a local join column.
    #[must_use]
    pub fn related_filter(&self, row: &Record) -> Option<Filter> {
        self.condition.iter().try_fold(Filter::new(), |filter, c| {
            row.value(&c.local)
                .map(|value| filter.and_eq(c.foreign.clone(), value.clone()))
        })
    }

    /// Builds the target-side column values that link a new target row to `row`.
    #[must_use]
    pub fn link_values(&self, row: &Record) -> Option<Record> {
        self.condition
            .iter()
            .map(|c| row.value(&c.local).map(|v| (c.foreign.clone(), v.clone())))
            .collect()
    }
}
