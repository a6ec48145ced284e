//! Grid query builder using SeaQuery.
//!
//! Renders PostgreSQL statements for a [`QueryPlan`]:
//! - select list from the registered columns (`table.field AS alias`)
//! - predicates from the operator clause templates, with bound values
//! - ORDER BY on the qualified columns
//! - LIMIT/OFFSET pagination

use sea_query::{
    Alias, Asterisk, Cond, Expr, Order, PostgresQueryBuilder, Query, SelectStatement, SimpleExpr,
};

use super::page_offset;
use crate::grid::columns::{ColumnEntry, ColumnRegistry};
use crate::grid::plan::{Predicate, QueryPlan, SortDirection};

/// SQL join types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinType {
    #[default]
    Inner,
    Left,
    Right,
}

#[derive(Debug, Clone)]
struct JoinSpec {
    join_type: JoinType,
    table: String,
    alias: String,
    local_field: String,
    foreign_field: String,
}

/// Builds count and page statements over a base table.
#[derive(Debug, Clone)]
pub struct SqlQueryBuilder {
    table: String,
    table_alias: Option<String>,
    columns: Vec<ColumnEntry>,
    joins: Vec<JoinSpec>,
}

impl SqlQueryBuilder {
    /// Select the registry's columns from `table`.
    pub fn new(table: &str, registry: &ColumnRegistry) -> Self {
        Self {
            table: table.to_string(),
            table_alias: None,
            columns: registry.entries().cloned().collect(),
            joins: Vec::new(),
        }
    }

    /// Alias the base table, e.g. `users AS u`.
    pub fn with_alias(mut self, alias: &str) -> Self {
        self.table_alias = Some(alias.to_string());
        self
    }

    /// Join `table AS alias ON base.local_field = alias.foreign_field`.
    pub fn join(
        mut self,
        join_type: JoinType,
        table: &str,
        alias: &str,
        local_field: &str,
        foreign_field: &str,
    ) -> Self {
        self.joins.push(JoinSpec {
            join_type,
            table: table.to_string(),
            alias: alias.to_string(),
            local_field: local_field.to_string(),
            foreign_field: foreign_field.to_string(),
        });
        self
    }

    /// Name the base table is referenced by.
    fn base_ref(&self) -> &str {
        self.table_alias.as_deref().unwrap_or(&self.table)
    }

    /// Build the unfiltered COUNT query.
    pub fn build_total(&self) -> String {
        let mut query = self.base_query();
        query.expr(Expr::col(Asterisk).count());
        query.to_string(PostgresQueryBuilder)
    }

    /// Build the COUNT query for the plan's predicates.
    pub fn build_count(&self, plan: &QueryPlan) -> String {
        let mut query = self.base_query();
        query.expr(Expr::col(Asterisk).count());
        Self::add_filters(&mut query, plan);
        query.to_string(PostgresQueryBuilder)
    }

    /// Build the SELECT query for one page of the plan.
    pub fn build_page(&self, plan: &QueryPlan, page: u32, limit: u32) -> String {
        let mut query = self.base_query();

        self.add_select_fields(&mut query);
        Self::add_filters(&mut query, plan);
        Self::add_sorts(&mut query, plan);

        query.limit(u64::from(limit));
        query.offset(page_offset(page, limit));

        query.to_string(PostgresQueryBuilder)
    }

    /// FROM and JOIN clauses shared by every statement.
    fn base_query(&self) -> SelectStatement {
        let mut query = Query::select();

        match &self.table_alias {
            Some(alias) => query.from_as(Alias::new(&self.table), Alias::new(alias)),
            None => query.from(Alias::new(&self.table)),
        };

        for join in &self.joins {
            let join_type = match join.join_type {
                JoinType::Inner => sea_query::JoinType::InnerJoin,
                JoinType::Left => sea_query::JoinType::LeftJoin,
                JoinType::Right => sea_query::JoinType::RightJoin,
            };

            let on_condition = Expr::col((
                Alias::new(self.base_ref()),
                Alias::new(&join.local_field),
            ))
            .equals((Alias::new(&join.alias), Alias::new(&join.foreign_field)));

            query.join_as(
                join_type,
                Alias::new(&join.table),
                Alias::new(&join.alias),
                on_condition,
            );
        }

        query
    }

    fn add_select_fields(&self, query: &mut SelectStatement) {
        if self.columns.is_empty() {
            query.column((Alias::new(self.base_ref()), Asterisk));
            return;
        }
        for column in &self.columns {
            query.expr_as(column_expr(column), Alias::new(&column.alias));
        }
    }

    /// `(any...) AND all...`
    fn add_filters(query: &mut SelectStatement, plan: &QueryPlan) {
        if !plan.has_predicates() {
            return;
        }

        let mut condition = Cond::all();
        if !plan.any().is_empty() {
            let any = plan
                .any()
                .iter()
                .fold(Cond::any(), |cond, p| cond.add(predicate_expr(p)));
            condition = condition.add(any);
        }
        for predicate in plan.all() {
            condition = condition.add(predicate_expr(predicate));
        }

        query.cond_where(condition);
    }

    fn add_sorts(query: &mut SelectStatement, plan: &QueryPlan) {
        for (column, direction) in plan.order() {
            let order = match direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            query.order_by_expr(column_expr(column), order);
        }
    }
}

fn column_expr(column: &ColumnEntry) -> SimpleExpr {
    match &column.table {
        Some(table) => Expr::col((Alias::new(table), Alias::new(&column.field))).into(),
        None => Expr::col(Alias::new(&column.field)).into(),
    }
}

/// Quoted column reference for clause templates. Column identifiers are
/// restricted to `[A-Za-z0-9_]` by the registry parser.
fn quoted_column(column: &ColumnEntry) -> String {
    match &column.table {
        Some(table) => format!("\"{table}\".\"{}\"", column.field),
        None => format!("\"{}\"", column.field),
    }
}

fn predicate_expr(predicate: &Predicate) -> SimpleExpr {
    let (clause, values) = predicate
        .operator
        .rule()
        .render(&quoted_column(&predicate.column), &predicate.operand);
    Expr::cust_with_values(clause, values)
}
