//! Grid adapter: orchestrates one response build.
//!
//! 1. unfiltered count
//! 2. global search, column search, external search, order (in that order)
//! 3. filtered count
//! 4. page fetch
//! 5. envelope

use super::backend::QueryBackend;
use super::binder::{Bind, Binder};
use super::columns::ColumnRegistry;
use super::intent::QueryIntentSource;
use super::operators;
use super::plan::{OrderDirective, Predicate, QueryPlan};
use super::response::{ResponseEnvelope, ResultSet, format_response};
use crate::config::GridConfig;
use crate::error::GridResult;

/// Builds grid responses for a fixed set of columns.
#[derive(Debug, Clone)]
pub struct GridAdapter {
    columns: ColumnRegistry,
    config: GridConfig,
}

impl GridAdapter {
    pub fn new<I, S>(descriptors: I, config: GridConfig) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            columns: ColumnRegistry::from_descriptors(descriptors),
            config,
        }
    }

    pub fn columns(&self) -> &ColumnRegistry {
        &self.columns
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Translate the request into a query plan.
    ///
    /// Fails on an unsupported operator or a malformed typed filter value.
    pub fn plan<S>(&self, source: &S, wildcard: &str) -> GridResult<QueryPlan>
    where
        S: QueryIntentSource + ?Sized,
    {
        let binder = Binder::new(&self.columns, source, self.config.search_max_length, wildcard);
        let mut plan = QueryPlan::new();

        let mut global = |alias: &str, text: &str| -> GridResult<()> {
            if let Some(column) = self.columns.get(alias) {
                plan.add_or_predicate(Predicate::contains(column.clone(), text, wildcard));
            }
            Ok(())
        };
        binder.apply(Bind::GlobalSearch(&mut global))?;

        let mut column_search = |alias: &str, text: &str| -> GridResult<()> {
            if let Some(column) = self.columns.get(alias) {
                plan.add_and_predicate(Predicate::contains(column.clone(), text, wildcard));
            }
            Ok(())
        };
        binder.apply(Bind::ColumnSearch(&mut column_search))?;

        let mut external = |alias: &str, operator: &str, value: &str| -> GridResult<()> {
            let rule = operators::lookup(operator)?;
            let operand = rule.operand(value)?;
            if let Some(column) = self.columns.get(alias) {
                plan.add_and_predicate(Predicate::new(column.clone(), rule.operator, operand));
            }
            Ok(())
        };
        binder.apply(Bind::ExternalSearch(&mut external))?;

        let mut order = |directives: Vec<OrderDirective>| -> GridResult<()> {
            let resolved: Vec<_> = directives
                .iter()
                .filter_map(|d| self.columns.get(&d.alias).map(|c| (c.clone(), d.direction)))
                .collect();
            if !resolved.is_empty() {
                plan.set_order(resolved);
            }
            Ok(())
        };
        binder.apply(Bind::Order(&mut order))?;

        Ok(plan)
    }

    /// Build the response envelope for one request.
    pub async fn build_response<B, S>(&self, backend: &B, source: &S) -> GridResult<ResponseEnvelope>
    where
        B: QueryBackend + ?Sized,
        S: QueryIntentSource + ?Sized,
    {
        let total = backend.count_all().await?;

        let plan = self.plan(source, backend.wildcard())?;

        let filtered = backend.count_filtered(&plan).await?;

        let limit = self.page_length(source.limit());
        let page = page_at_offset(requested_offset(source), limit);
        if let Some(sql) = backend.query_text(&plan, page, limit) {
            tracing::debug!(%sql, "grid query");
        }
        let rows = backend.fetch_page(&plan, page, limit).await?;

        tracing::debug!(
            total,
            filtered,
            page,
            limit,
            rows = rows.len(),
            "grid response built"
        );

        Ok(format_response(
            source.draw(),
            ResultSet {
                total,
                filtered,
                rows,
            },
        ))
    }

    /// Requested page length, defaulted and capped by configuration.
    fn page_length(&self, requested: u32) -> u32 {
        if requested == 0 {
            return self.config.default_page_length;
        }
        if requested > self.config.max_page_length {
            tracing::warn!(
                requested,
                capped = self.config.max_page_length,
                "page length exceeds maximum, capping"
            );
            return self.config.max_page_length;
        }
        requested
    }
}

/// Row offset of the window the source asked for, using its own page length.
fn requested_offset<S>(source: &S) -> u64
where
    S: QueryIntentSource + ?Sized,
{
    u64::from(source.page().max(1) - 1) * u64::from(source.limit())
}

/// 1-based page containing `offset` when pages hold `limit` rows.
fn page_at_offset(offset: u64, limit: u32) -> u32 {
    offset
        .checked_div(u64::from(limit))
        .map_or(1, |page| u32::try_from(page).map_or(u32::MAX, |p| p.saturating_add(1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridError;
    use crate::grid::intent::{ColumnParam, ExternalFilter, GridRequest, OrderRequest, SearchParam};
    use crate::grid::operators::{Operand, Operator};

    fn adapter() -> GridAdapter {
        GridAdapter::new(
            ["u.id AS id", "u.name AS name", "u.age AS age"],
            GridConfig::default(),
        )
    }

    fn request() -> GridRequest {
        GridRequest {
            search: SearchParam {
                value: "jo".to_string(),
                regex: false,
            },
            columns: vec![
                ColumnParam::new("id"),
                ColumnParam::new("name"),
                ColumnParam {
                    searchable: false,
                    ..ColumnParam::new("age")
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn plan_routes_categories() {
        let mut req = request();
        req.columns[1].search.value = "smith".to_string();
        req.external.push(ExternalFilter {
            name: "age".to_string(),
            operator: "Between".to_string(),
            value: "18,65".to_string(),
        });
        req.order.push(OrderRequest {
            column: Some(1),
            dir: Some("desc".to_string()),
        });

        let plan = adapter().plan(&req, "%").unwrap();

        let global: Vec<&str> = plan.any().iter().map(|p| p.column.alias.as_str()).collect();
        assert_eq!(global, vec!["id", "name"]);

        assert_eq!(plan.all().len(), 2);
        assert_eq!(plan.all()[0].operand, Operand::Single("%smith%".to_string()));
        assert_eq!(plan.all()[1].operator, Operator::Between);
        assert_eq!(
            plan.all()[1].operand,
            Operand::Range("18".to_string(), "65".to_string())
        );

        assert_eq!(plan.order().len(), 1);
        assert_eq!(plan.order()[0].0.alias, "name");
    }

    #[test]
    fn unsupported_operator_fails_plan() {
        let mut req = request();
        req.external.push(ExternalFilter {
            name: "age".to_string(),
            operator: "approximately".to_string(),
            value: "30".to_string(),
        });

        let err = adapter().plan(&req, "%").unwrap_err();
        assert!(matches!(err, GridError::UnsupportedOperator(ref op) if op == "approximately"));
    }

    #[test]
    fn page_length_defaults_and_caps() {
        let adapter = adapter();
        assert_eq!(adapter.page_length(0), 10);
        assert_eq!(adapter.page_length(25), 25);
        assert_eq!(adapter.page_length(5000), 100);
    }

    #[test]
    fn capped_window_keeps_requested_offset() {
        let req = GridRequest {
            start: 200,
            length: 200,
            ..request()
        };
        let adapter = adapter();

        let limit = adapter.page_length(req.limit());
        let page = page_at_offset(requested_offset(&req), limit);

        assert_eq!((page, limit), (3, 100));
    }

    #[test]
    fn page_at_offset_edges() {
        assert_eq!(page_at_offset(0, 10), 1);
        assert_eq!(page_at_offset(25, 10), 3);
        assert_eq!(page_at_offset(40, 0), 1);
        assert_eq!(page_at_offset(u64::MAX, 1), u32::MAX);
    }
}
