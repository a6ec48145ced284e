//! Filter/sort binder.
//!
//! Dispatches the four intent categories of a grid request to
//! caller-supplied handlers, after validating every referenced column against
//! the [`ColumnRegistry`] and truncating every value handed on.

use std::fmt;
use std::str::FromStr;

use super::columns::ColumnRegistry;
use super::intent::QueryIntentSource;
use super::plan::{OrderDirective, SortDirection};
use crate::error::{GridError, GridResult};

/// Handler for global and per-column search: `(alias, text)`.
pub type SearchHandler<'h> = dyn FnMut(&str, &str) -> GridResult<()> + 'h;

/// Handler for typed filters: `(alias, operator, value)`.
pub type ExternalHandler<'h> = dyn FnMut(&str, &str, &str) -> GridResult<()> + 'h;

/// Handler for ordering, called once with every valid directive.
pub type OrderHandler<'h> = dyn FnMut(Vec<OrderDirective>) -> GridResult<()> + 'h;

/// Intent category tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindCategory {
    GlobalSearch,
    ColumnSearch,
    ExternalSearch,
    Order,
}

impl BindCategory {
    pub const ALL: [BindCategory; 4] = [
        BindCategory::GlobalSearch,
        BindCategory::ColumnSearch,
        BindCategory::ExternalSearch,
        BindCategory::Order,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BindCategory::GlobalSearch => "global_search",
            BindCategory::ColumnSearch => "column_search",
            BindCategory::ExternalSearch => "external_search",
            BindCategory::Order => "order",
        }
    }
}

impl FromStr for BindCategory {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BindCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| GridError::UnknownBindCategory(s.to_string()))
    }
}

impl fmt::Display for BindCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One intent category together with its handler.
pub enum Bind<'h> {
    /// Invoked per searchable column with the same text (OR semantics).
    GlobalSearch(&'h mut SearchHandler<'h>),
    /// Invoked per searched column with that column's text (AND semantics).
    ColumnSearch(&'h mut SearchHandler<'h>),
    /// Invoked per typed filter.
    ExternalSearch(&'h mut ExternalHandler<'h>),
    /// Invoked once with the combined ordering.
    Order(&'h mut OrderHandler<'h>),
}

impl Bind<'_> {
    pub fn category(&self) -> BindCategory {
        match self {
            Bind::GlobalSearch(_) => BindCategory::GlobalSearch,
            Bind::ColumnSearch(_) => BindCategory::ColumnSearch,
            Bind::ExternalSearch(_) => BindCategory::ExternalSearch,
            Bind::Order(_) => BindCategory::Order,
        }
    }
}

/// Binds request intents against a column registry.
pub struct Binder<'a, S: QueryIntentSource + ?Sized> {
    registry: &'a ColumnRegistry,
    source: &'a S,
    max_length: usize,
    wildcard: &'a str,
}

impl<'a, S: QueryIntentSource + ?Sized> Binder<'a, S> {
    /// `max_length` bounds every value in characters; `wildcard` replaces
    /// `*` in typed filter values.
    pub fn new(
        registry: &'a ColumnRegistry,
        source: &'a S,
        max_length: usize,
        wildcard: &'a str,
    ) -> Self {
        Self {
            registry,
            source,
            max_length,
            wildcard,
        }
    }

    /// Truncate to the configured number of characters.
    pub fn sanitize(&self, value: &str) -> String {
        value.chars().take(self.max_length).collect()
    }

    /// Apply one intent category. Handler errors are returned unchanged.
    pub fn apply(&self, bind: Bind<'_>) -> GridResult<()> {
        match bind {
            Bind::GlobalSearch(handler) => self.global_search(handler),
            Bind::ColumnSearch(handler) => self.column_search(handler),
            Bind::ExternalSearch(handler) => self.external_search(handler),
            Bind::Order(handler) => self.order(handler),
        }
    }

    fn global_search(&self, handler: &mut SearchHandler<'_>) -> GridResult<()> {
        let search = self.source.search_value();
        if search.trim().is_empty() {
            return Ok(());
        }

        let text = self.sanitize(search);
        for alias in self.source.searchable_columns() {
            if !self.registry.exists(alias) {
                tracing::debug!(alias, "global search skips unknown column");
                continue;
            }
            handler(alias, &text)?;
        }
        Ok(())
    }

    fn column_search(&self, handler: &mut SearchHandler<'_>) -> GridResult<()> {
        for search in self.source.columns_search() {
            if !self.registry.exists(&search.alias) {
                tracing::debug!(alias = %search.alias, "column search skips unknown column");
                continue;
            }
            handler(&search.alias, &self.sanitize(&search.text))?;
        }
        Ok(())
    }

    fn external_search(&self, handler: &mut ExternalHandler<'_>) -> GridResult<()> {
        for filter in self.source.external_search() {
            if !self.registry.exists(&filter.name) {
                tracing::debug!(alias = %filter.name, "external search skips unknown column");
                continue;
            }
            let value = filter.value.replace('*', self.wildcard);
            handler(
                &filter.name,
                &filter.operator.to_lowercase(),
                &self.sanitize(&value),
            )?;
        }
        Ok(())
    }

    fn order(&self, handler: &mut OrderHandler<'_>) -> GridResult<()> {
        let requested = self.source.order();
        if requested.is_empty() {
            return Ok(());
        }

        let mut directives = Vec::with_capacity(requested.len());
        for request in requested {
            let (Some(index), Some(dir)) = (request.column, request.dir.as_deref()) else {
                tracing::debug!(?request, "order directive missing column or direction");
                continue;
            };
            let Ok(direction) = dir.parse::<SortDirection>() else {
                tracing::debug!(dir, "order directive has unknown direction");
                continue;
            };
            let Some(alias) = self.resolve_index(index) else {
                tracing::debug!(index, "order directive references unknown column index");
                continue;
            };
            if !self.registry.exists(alias) {
                tracing::debug!(index, alias, "order directive resolves to unknown column");
                continue;
            }
            directives.push(OrderDirective {
                alias: alias.to_string(),
                direction,
            });
        }

        handler(directives)
    }

    /// Alias at a positional index: the source's own mapping first, then
    /// registration order.
    fn resolve_index(&self, index: usize) -> Option<&'a str> {
        let source: &'a S = self.source;
        let registry: &'a ColumnRegistry = self.registry;
        source
            .column_by_id(index)
            .or_else(|| registry.alias_at(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::intent::{ColumnSearch, ExternalFilter, OrderRequest};
    use crate::grid::response::DrawToken;

    #[derive(Default)]
    struct StubSource {
        search: String,
        searchable: Vec<&'static str>,
        columns: Vec<ColumnSearch>,
        external: Vec<ExternalFilter>,
        order: Vec<OrderRequest>,
        column_ids: Vec<&'static str>,
    }

    impl QueryIntentSource for StubSource {
        fn draw(&self) -> DrawToken {
            DrawToken::Number(1)
        }
        fn search_value(&self) -> &str {
            &self.search
        }
        fn searchable_columns(&self) -> Vec<&str> {
            self.searchable.clone()
        }
        fn columns_search(&self) -> Vec<ColumnSearch> {
            self.columns.clone()
        }
        fn external_search(&self) -> Vec<ExternalFilter> {
            self.external.clone()
        }
        fn order(&self) -> Vec<OrderRequest> {
            self.order.clone()
        }
        fn column_by_id(&self, index: usize) -> Option<&str> {
            self.column_ids.get(index).copied()
        }
        fn limit(&self) -> u32 {
            10
        }
        fn page(&self) -> u32 {
            1
        }
    }

    fn registry() -> ColumnRegistry {
        ColumnRegistry::from_descriptors(["u.id AS id", "u.name AS name", "u.email AS email"])
    }

    fn order(column: Option<usize>, dir: Option<&str>) -> OrderRequest {
        OrderRequest {
            column,
            dir: dir.map(str::to_string),
        }
    }

    #[test]
    fn sanitize_truncates_characters() {
        let registry = registry();
        let source = StubSource::default();
        let binder = Binder::new(&registry, &source, 3, "%");
        assert_eq!(binder.sanitize("hello"), "hel");
        assert_eq!(binder.sanitize("héllo"), "hél");
        assert_eq!(binder.sanitize("hi"), "hi");
    }

    #[test]
    fn global_search_empty_text_invokes_nothing() {
        let registry = registry();
        let source = StubSource {
            search: "  ".to_string(),
            searchable: vec!["name"],
            ..Default::default()
        };
        let binder = Binder::new(&registry, &source, 30, "%");

        let mut calls = 0;
        let mut handler = |_: &str, _: &str| -> GridResult<()> {
            calls += 1;
            Ok(())
        };
        binder.apply(Bind::GlobalSearch(&mut handler)).unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn global_search_reuses_truncated_text_for_known_columns() {
        let registry = registry();
        let source = StubSource {
            search: "johnathan".to_string(),
            searchable: vec!["name", "missing", "email"],
            ..Default::default()
        };
        let binder = Binder::new(&registry, &source, 4, "%");

        let mut seen = Vec::new();
        let mut handler = |alias: &str, text: &str| -> GridResult<()> {
            seen.push((alias.to_string(), text.to_string()));
            Ok(())
        };
        binder.apply(Bind::GlobalSearch(&mut handler)).unwrap();

        assert_eq!(
            seen,
            vec![
                ("name".to_string(), "john".to_string()),
                ("email".to_string(), "john".to_string()),
            ]
        );
    }

    #[test]
    fn column_search_uses_each_columns_text() {
        let registry = registry();
        let source = StubSource {
            columns: vec![
                ColumnSearch {
                    alias: "name".to_string(),
                    text: "smith".to_string(),
                },
                ColumnSearch {
                    alias: "nope".to_string(),
                    text: "x".to_string(),
                },
                ColumnSearch {
                    alias: "email".to_string(),
                    text: "example.org".to_string(),
                },
            ],
            ..Default::default()
        };
        let binder = Binder::new(&registry, &source, 30, "%");

        let mut seen = Vec::new();
        let mut handler = |alias: &str, text: &str| -> GridResult<()> {
            seen.push(format!("{alias}={text}"));
            Ok(())
        };
        binder.apply(Bind::ColumnSearch(&mut handler)).unwrap();

        assert_eq!(seen, vec!["name=smith", "email=example.org"]);
    }

    #[test]
    fn external_search_substitutes_wildcard_before_truncation() {
        let registry = registry();
        let source = StubSource {
            external: vec![ExternalFilter {
                name: "name".to_string(),
                operator: "IN".to_string(),
                value: "*ab".to_string(),
            }],
            ..Default::default()
        };
        let binder = Binder::new(&registry, &source, 3, "%%");

        let mut seen = Vec::new();
        let mut handler = |alias: &str, op: &str, value: &str| -> GridResult<()> {
            seen.push((alias.to_string(), op.to_string(), value.to_string()));
            Ok(())
        };
        binder.apply(Bind::ExternalSearch(&mut handler)).unwrap();

        // "*ab" -> "%%ab" -> truncated to "%%a"
        assert_eq!(
            seen,
            vec![("name".to_string(), "in".to_string(), "%%a".to_string())]
        );
    }

    #[test]
    fn external_search_skips_unknown_columns() {
        let registry = registry();
        let source = StubSource {
            external: vec![ExternalFilter {
                name: "age".to_string(),
                operator: "greater".to_string(),
                value: "30".to_string(),
            }],
            ..Default::default()
        };
        let binder = Binder::new(&registry, &source, 30, "%");

        let mut calls = 0;
        let mut handler = |_: &str, _: &str, _: &str| -> GridResult<()> {
            calls += 1;
            Ok(())
        };
        binder.apply(Bind::ExternalSearch(&mut handler)).unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn order_invokes_once_with_valid_directives() {
        let registry = registry();
        let source = StubSource {
            order: vec![
                order(Some(1), Some("desc")),
                order(Some(7), Some("asc")),
                order(None, Some("asc")),
                order(Some(0), None),
                order(Some(2), Some("upward")),
                order(Some(0), Some("ASC")),
            ],
            ..Default::default()
        };
        let binder = Binder::new(&registry, &source, 30, "%");

        let mut calls = Vec::new();
        let mut handler = |directives: Vec<OrderDirective>| -> GridResult<()> {
            calls.push(
                directives
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>(),
            );
            Ok(())
        };
        binder.apply(Bind::Order(&mut handler)).unwrap();

        assert_eq!(calls, vec![vec!["name desc".to_string(), "id asc".to_string()]]);
    }

    #[test]
    fn order_without_directives_invokes_nothing() {
        let registry = registry();
        let source = StubSource::default();
        let binder = Binder::new(&registry, &source, 30, "%");

        let mut calls = 0;
        let mut handler = |_: Vec<OrderDirective>| -> GridResult<()> {
            calls += 1;
            Ok(())
        };
        binder.apply(Bind::Order(&mut handler)).unwrap();
        assert_eq!(calls, 0);
    }

    #[test]
    fn order_skips_unparsed_positions() {
        let registry = ColumnRegistry::from_descriptors(["u.id AS id", "not a column!", "name"]);
        let source = StubSource {
            order: vec![order(Some(1), Some("asc")), order(Some(2), Some("asc"))],
            ..Default::default()
        };
        let binder = Binder::new(&registry, &source, 30, "%");

        let mut seen = Vec::new();
        let mut handler = |directives: Vec<OrderDirective>| -> GridResult<()> {
            seen = directives;
            Ok(())
        };
        binder.apply(Bind::Order(&mut handler)).unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].alias, "name");
    }

    #[test]
    fn order_prefers_source_column_mapping() {
        let registry = registry();
        let source = StubSource {
            order: vec![
                order(Some(0), Some("desc")),
                order(Some(1), Some("asc")),
                order(Some(2), Some("asc")),
            ],
            // index 1 names a column the registry does not know; index 2 is
            // not mapped by the source and falls back to registration order
            column_ids: vec!["email", "password"],
            ..Default::default()
        };
        let binder = Binder::new(&registry, &source, 30, "%");

        let mut seen = Vec::new();
        let mut handler = |directives: Vec<OrderDirective>| -> GridResult<()> {
            seen = directives.iter().map(ToString::to_string).collect();
            Ok(())
        };
        binder.apply(Bind::Order(&mut handler)).unwrap();

        assert_eq!(seen, vec!["email desc".to_string(), "email asc".to_string()]);
    }

    #[test]
    fn handler_errors_propagate() {
        let registry = registry();
        let source = StubSource {
            external: vec![ExternalFilter {
                name: "name".to_string(),
                operator: "soundex".to_string(),
                value: "x".to_string(),
            }],
            ..Default::default()
        };
        let binder = Binder::new(&registry, &source, 30, "%");

        let mut handler = |_: &str, op: &str, _: &str| -> GridResult<()> {
            Err(GridError::UnsupportedOperator(op.to_string()))
        };
        let err = binder
            .apply(Bind::ExternalSearch(&mut handler))
            .unwrap_err();
        assert!(matches!(err, GridError::UnsupportedOperator(ref op) if op == "soundex"));
    }

    #[test]
    fn category_names() {
        for category in BindCategory::ALL {
            assert_eq!(category.as_str().parse::<BindCategory>().unwrap(), category);
        }
        let err = "group_by".parse::<BindCategory>().unwrap_err();
        assert_eq!(err.to_string(), "unknown bind category: group_by");
    }
}
