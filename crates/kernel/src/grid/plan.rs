//! Query plan accumulator.
//!
//! The adapter's bind handlers push predicates and sort terms into a
//! [`QueryPlan`]; backends read the finished plan. Neither side sees the
//! other's API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::columns::ColumnEntry;
use super::operators::{Operand, Operator};

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl FromStr for SortDirection {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.trim().eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(())
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved sort directive, displayed as `"alias direction"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderDirective {
    pub alias: String,
    pub direction: SortDirection,
}

impl fmt::Display for OrderDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.alias, self.direction)
    }
}

/// A single column predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: ColumnEntry,
    pub operator: Operator,
    pub operand: Operand,
}

impl Predicate {
    pub fn new(column: ColumnEntry, operator: Operator, operand: Operand) -> Self {
        Self {
            column,
            operator,
            operand,
        }
    }

    /// Substring match: `column LIKE '<w>text<w>'` with LIKE metacharacters
    /// in `text` escaped.
    pub fn contains(column: ColumnEntry, text: &str, wildcard: &str) -> Self {
        Self::new(
            column,
            Operator::Like,
            Operand::Single(format!("{wildcard}{}{wildcard}", escape_like_wildcards(text))),
        )
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {:?}",
            self.column.alias,
            self.operator,
            self.operand.values()
        )
    }
}

/// Escape LIKE wildcard characters (`%`, `_`, `\`) in a value.
pub fn escape_like_wildcards(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Predicates and ordering accumulated for one build cycle.
///
/// Evaluated as `(any[0] OR any[1] ...) AND all[0] AND all[1] ...`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    any: Vec<Predicate>,
    all: Vec<Predicate>,
    order: Vec<(ColumnEntry, SortDirection)>,
}

impl QueryPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate to the OR group.
    pub fn add_or_predicate(&mut self, predicate: Predicate) {
        self.any.push(predicate);
    }

    /// Add a predicate that must always hold.
    pub fn add_and_predicate(&mut self, predicate: Predicate) {
        self.all.push(predicate);
    }

    /// Replace the ordering.
    pub fn set_order(&mut self, order: Vec<(ColumnEntry, SortDirection)>) {
        self.order = order;
    }

    pub fn any(&self) -> &[Predicate] {
        &self.any
    }

    pub fn all(&self) -> &[Predicate] {
        &self.all
    }

    pub fn order(&self) -> &[(ColumnEntry, SortDirection)] {
        &self.order
    }

    /// Whether the plan filters rows.
    pub fn has_predicates(&self) -> bool {
        !self.any.is_empty() || !self.all.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        !self.has_predicates() && self.order.is_empty()
    }
}
