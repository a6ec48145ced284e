//! Operator mapping table for typed external filters.
//!
//! Each operator maps to a clause template (rendered by SQL backends into a
//! parameterized predicate) and a value template. The table is immutable and
//! shared by every build cycle.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// Comparison operators accepted in external filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    Like,
    Greater,
    GreaterEqual,
    Lower,
    LowerEqual,
    NotEqual,
    NotLike,
    In,
    NotIn,
    Between,
    NotBetween,
    Regex,
    NotRegex,
}

impl Operator {
    pub const ALL: [Operator; 14] = [
        Operator::Equal,
        Operator::Like,
        Operator::Greater,
        Operator::GreaterEqual,
        Operator::Lower,
        Operator::LowerEqual,
        Operator::NotEqual,
        Operator::NotLike,
        Operator::In,
        Operator::NotIn,
        Operator::Between,
        Operator::NotBetween,
        Operator::Regex,
        Operator::NotRegex,
    ];

    /// Wire name, e.g. `greater_equal`.
    pub fn name(self) -> &'static str {
        self.rule().name
    }

    /// Mapping rule for this operator.
    pub fn rule(self) -> &'static OperatorRule {
        // RULES is declared in variant order.
        &RULES[self as usize]
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a raw filter value is split into bound operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// One operand.
    Single,
    /// Comma-separated list (`{values}`).
    List,
    /// Exactly two comma-separated bounds (`{low}`, `{high}`).
    Range,
}

/// Bound operand(s) of a predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Single(String),
    List(Vec<String>),
    Range(String, String),
}

impl Operand {
    /// Operands in binding order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            Operand::Single(v) => vec![v.as_str()],
            Operand::List(vs) => vs.iter().map(String::as_str).collect(),
            Operand::Range(low, high) => vec![low.as_str(), high.as_str()],
        }
    }
}

/// Clause and value templates for one operator.
#[derive(Debug)]
pub struct OperatorRule {
    pub operator: Operator,
    pub name: &'static str,
    /// Clause with `{column}` and operand placeholders.
    pub clause: &'static str,
    /// Shape applied to each raw operand; `{value}` is the identity.
    pub value: &'static str,
    pub arity: Arity,
}

impl OperatorRule {
    /// Apply the value template to one raw operand.
    pub fn shape_value(&self, raw: &str) -> String {
        self.value.replace("{value}", raw)
    }

    /// Split and shape a raw filter value according to the rule's arity.
    pub fn operand(&self, raw: &str) -> GridResult<Operand> {
        match self.arity {
            Arity::Single => Ok(Operand::Single(self.shape_value(raw))),
            Arity::List => Ok(Operand::List(
                raw.split(',')
                    .map(|item| self.shape_value(item.trim()))
                    .collect(),
            )),
            Arity::Range => match raw.split(',').collect::<Vec<_>>().as_slice() {
                [low, high] => Ok(Operand::Range(
                    self.shape_value(low.trim()),
                    self.shape_value(high.trim()),
                )),
                _ => Err(GridError::InvalidOperand {
                    operator: self.operator,
                    value: raw.to_string(),
                }),
            },
        }
    }

    /// Render the clause for `column`, numbering placeholders `$1..$n`.
    ///
    /// Returns the clause text and the operands in placeholder order.
    pub fn render(&self, column: &str, operand: &Operand) -> (String, Vec<String>) {
        let mut clause = self.clause.replace("{column}", column);
        let values: Vec<String> = operand.values().into_iter().map(str::to_string).collect();

        match operand {
            Operand::Single(_) => {
                clause = clause.replace("{value}", "$1");
            }
            Operand::List(items) => {
                let placeholders: Vec<String> = (1..=items.len()).map(|i| format!("${i}")).collect();
                clause = clause.replace("{values}", &placeholders.join(", "));
            }
            Operand::Range(..) => {
                clause = clause.replace("{low}", "$1").replace("{high}", "$2");
            }
        }

        (clause, values)
    }
}

const fn rule(
    operator: Operator,
    name: &'static str,
    clause: &'static str,
    arity: Arity,
) -> OperatorRule {
    OperatorRule {
        operator,
        name,
        clause,
        value: "{value}",
        arity,
    }
}

static RULES: [OperatorRule; 14] = [
    rule(Operator::Equal, "equal", "{column} = {value}", Arity::Single),
    rule(
        Operator::Like,
        "like",
        "CAST({column} AS TEXT) LIKE {value}",
        Arity::Single,
    ),
    rule(Operator::Greater, "greater", "{column} > {value}", Arity::Single),
    rule(
        Operator::GreaterEqual,
        "greater_equal",
        "{column} >= {value}",
        Arity::Single,
    ),
    rule(Operator::Lower, "lower", "{column} < {value}", Arity::Single),
    rule(
        Operator::LowerEqual,
        "lower_equal",
        "{column} <= {value}",
        Arity::Single,
    ),
    rule(
        Operator::NotEqual,
        "not_equal",
        "{column} <> {value}",
        Arity::Single,
    ),
    rule(
        Operator::NotLike,
        "not_like",
        "CAST({column} AS TEXT) NOT LIKE {value}",
        Arity::Single,
    ),
    rule(Operator::In, "in", "{column} IN ({values})", Arity::List),
    rule(
        Operator::NotIn,
        "not_in",
        "{column} NOT IN ({values})",
        Arity::List,
    ),
    rule(
        Operator::Between,
        "between",
        "{column} BETWEEN {low} AND {high}",
        Arity::Range,
    ),
    rule(
        Operator::NotBetween,
        "not_between",
        "{column} NOT BETWEEN {low} AND {high}",
        Arity::Range,
    ),
    rule(
        Operator::Regex,
        "regex",
        "CAST({column} AS TEXT) ~ {value}",
        Arity::Single,
    ),
    rule(
        Operator::NotRegex,
        "not_regex",
        "CAST({column} AS TEXT) !~ {value}",
        Arity::Single,
    ),
];

static BY_NAME: LazyLock<HashMap<&'static str, &'static OperatorRule>> =
    LazyLock::new(|| RULES.iter().map(|rule| (rule.name, rule)).collect());

/// Look up an operator rule by name, ignoring case.
pub fn lookup(name: &str) -> GridResult<&'static OperatorRule> {
    BY_NAME
        .get(name.to_lowercase().as_str())
        .copied()
        .ok_or_else(|| GridError::UnsupportedOperator(name.to_string()))
}
