//! In-memory backend over a fixed set of rows.
//!
//! Rows are keyed by column alias. Comparison is numeric when both sides
//! parse as numbers, lexicographic otherwise. A missing or null field never
//! satisfies a predicate, negated or not, matching SQL NULL semantics.

use std::cmp::Ordering;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use super::{QueryBackend, page_offset};
use crate::error::{GridError, GridResult};
use crate::grid::operators::{Operand, Operator};
use crate::grid::plan::{Predicate, QueryPlan, SortDirection};
use crate::grid::response::Row;

/// Backend holding its rows in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    rows: Vec<Row>,
}

impl MemoryBackend {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Build from JSON values; anything that is not an object is ignored.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self::new(
            values
                .into_iter()
                .filter_map(|value| match value {
                    Value::Object(row) => Some(row),
                    _ => None,
                })
                .collect(),
        )
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    fn matching(&self, plan: &QueryPlan) -> GridResult<Vec<&Row>> {
        let any = compile_all(plan.any())?;
        let all = compile_all(plan.all())?;

        Ok(self
            .rows
            .iter()
            .filter(|row| any.is_empty() || any.iter().any(|p| p.matches(row)))
            .filter(|row| all.iter().all(|p| p.matches(row)))
            .collect())
    }
}

#[async_trait]
impl QueryBackend for MemoryBackend {
    async fn count_all(&self) -> GridResult<u64> {
        Ok(self.rows.len() as u64)
    }

    async fn count_filtered(&self, plan: &QueryPlan) -> GridResult<u64> {
        Ok(self.matching(plan)?.len() as u64)
    }

    async fn fetch_page(&self, plan: &QueryPlan, page: u32, limit: u32) -> GridResult<Vec<Row>> {
        let mut rows = self.matching(plan)?;

        rows.sort_by(|a, b| {
            plan.order()
                .iter()
                .map(|(column, direction)| {
                    let ordering =
                        compare_fields(a.get(&column.alias), b.get(&column.alias));
                    match direction {
                        SortDirection::Asc => ordering,
                        SortDirection::Desc => ordering.reverse(),
                    }
                })
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });

        let offset = usize::try_from(page_offset(page, limit)).unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

enum Test {
    Pattern(Regex),
    Compare(String, fn(Ordering) -> bool),
    Member(Vec<String>),
    Range(String, String),
}

struct CompiledPredicate<'p> {
    alias: &'p str,
    test: Test,
    negate: bool,
}

impl CompiledPredicate<'_> {
    fn matches(&self, row: &Row) -> bool {
        let Some(value) = row.get(self.alias).and_then(field_text) else {
            return false;
        };

        let hit = match &self.test {
            Test::Pattern(regex) => regex.is_match(&value),
            Test::Compare(operand, accept) => accept(compare_text(&value, operand)),
            Test::Member(items) => items.iter().any(|item| compare_text(&value, item).is_eq()),
            Test::Range(low, high) => {
                compare_text(&value, low).is_ge() && compare_text(&value, high).is_le()
            }
        };

        hit != self.negate
    }
}

fn compile_all(predicates: &[Predicate]) -> GridResult<Vec<CompiledPredicate<'_>>> {
    predicates.iter().map(compile).collect()
}

fn compile(predicate: &Predicate) -> GridResult<CompiledPredicate<'_>> {
    let negate = matches!(
        predicate.operator,
        Operator::NotEqual
            | Operator::NotLike
            | Operator::NotIn
            | Operator::NotBetween
            | Operator::NotRegex
    );

    let test = match (predicate.operator, &predicate.operand) {
        (Operator::Like | Operator::NotLike, Operand::Single(pattern)) => {
            Test::Pattern(like_to_regex(pattern)?)
        }
        (Operator::Regex | Operator::NotRegex, Operand::Single(pattern)) => {
            Test::Pattern(Regex::new(pattern)?)
        }
        (Operator::Equal | Operator::NotEqual, Operand::Single(v)) => {
            Test::Compare(v.clone(), Ordering::is_eq)
        }
        (Operator::Greater, Operand::Single(v)) => Test::Compare(v.clone(), Ordering::is_gt),
        (Operator::GreaterEqual, Operand::Single(v)) => Test::Compare(v.clone(), Ordering::is_ge),
        (Operator::Lower, Operand::Single(v)) => Test::Compare(v.clone(), Ordering::is_lt),
        (Operator::LowerEqual, Operand::Single(v)) => Test::Compare(v.clone(), Ordering::is_le),
        (_, Operand::List(items)) => Test::Member(items.clone()),
        (_, Operand::Range(low, high)) => Test::Range(low.clone(), high.clone()),
        (operator, operand) => {
            return Err(GridError::InvalidOperand {
                operator,
                value: operand.values().join(","),
            });
        }
    };

    Ok(CompiledPredicate {
        alias: &predicate.column.alias,
        test,
        negate,
    })
}

/// Translate a LIKE pattern: `%` any run, `_` one character, `\` escapes.
fn like_to_regex(pattern: &str) -> GridResult<Regex> {
    let mut expr = String::from("(?s)^");
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '%' => expr.push_str(".*"),
            '_' => expr.push('.'),
            '\\' => {
                let literal = chars.next().unwrap_or('\\');
                expr.push_str(&regex::escape(&literal.to_string()));
            }
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');

    Ok(Regex::new(&expr)?)
}

fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn compare_text(left: &str, right: &str) -> Ordering {
    match (numeric(left), numeric(right)) {
        (Some(l), Some(r)) => l.total_cmp(&r),
        _ => left.cmp(right),
    }
}

/// Finite number, if the text is one. `nan` and `inf` stay text.
fn numeric(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Sort order for row fields; missing and null sort first.
fn compare_fields(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    match (left.and_then(field_text), right.and_then(field_text)) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(l), Some(r)) => compare_text(&l, &r),
    }
}
