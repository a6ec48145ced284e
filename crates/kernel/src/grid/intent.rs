//! Query intent source.
//!
//! The binder reads parsed request state through [`QueryIntentSource`].
//! [`GridRequest`] is a structured, serde-deserializable implementation that
//! follows the DataTables server-side parameter layout.

use serde::{Deserialize, Serialize};

use super::response::DrawToken;

/// Per-column search value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSearch {
    pub alias: String,
    pub text: String,
}

/// Externally supplied typed filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFilter {
    /// Column alias.
    pub name: String,

    /// Operator name, matched case-insensitively against the operator table.
    #[serde(rename = "type")]
    pub operator: String,

    /// Raw value; `*` is treated as a wildcard.
    pub value: String,
}

/// One requested sort directive. Either part may be missing in the request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Positional column index into the registered columns.
    #[serde(default)]
    pub column: Option<usize>,

    /// Direction token, expected to be `asc` or `desc`.
    #[serde(default)]
    pub dir: Option<String>,
}

/// Parsed request state consumed by the binder and adapter.
pub trait QueryIntentSource {
    /// Opaque draw token echoed in the response.
    fn draw(&self) -> DrawToken;

    /// Global search text.
    fn search_value(&self) -> &str;

    /// Aliases the global search applies to.
    fn searchable_columns(&self) -> Vec<&str>;

    /// Per-column search values.
    fn columns_search(&self) -> Vec<ColumnSearch>;

    /// Typed filters supplied outside the grid's own column search.
    fn external_search(&self) -> Vec<ExternalFilter>;

    /// Sort directives in priority order.
    fn order(&self) -> Vec<OrderRequest>;

    /// Alias the request itself associates with a column position.
    fn column_by_id(&self, index: usize) -> Option<&str>;

    /// Requested page length; 0 means "use the default".
    fn limit(&self) -> u32;

    /// 1-based page number.
    fn page(&self) -> u32;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParam {
    #[serde(default)]
    pub value: String,

    #[serde(default)]
    pub regex: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnParam {
    /// Column alias.
    pub data: String,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default = "default_true")]
    pub searchable: bool,

    #[serde(default = "default_true")]
    pub orderable: bool,

    #[serde(default)]
    pub search: SearchParam,
}

fn default_true() -> bool {
    true
}

impl ColumnParam {
    /// Searchable, orderable column with no search value.
    pub fn new(data: &str) -> Self {
        Self {
            data: data.to_string(),
            name: None,
            searchable: true,
            orderable: true,
            search: SearchParam::default(),
        }
    }
}

/// A grid request in DataTables server-side layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridRequest {
    #[serde(default = "default_draw")]
    pub draw: DrawToken,

    /// Offset of the first requested row.
    #[serde(default)]
    pub start: u64,

    /// Page length; negative means "all".
    #[serde(default)]
    pub length: i64,

    #[serde(default)]
    pub search: SearchParam,

    #[serde(default)]
    pub columns: Vec<ColumnParam>,

    #[serde(default)]
    pub order: Vec<OrderRequest>,

    #[serde(default)]
    pub external: Vec<ExternalFilter>,
}

fn default_draw() -> DrawToken {
    DrawToken::Number(0)
}

impl Default for GridRequest {
    fn default() -> Self {
        Self {
            draw: default_draw(),
            start: 0,
            length: 0,
            search: SearchParam::default(),
            columns: Vec::new(),
            order: Vec::new(),
            external: Vec::new(),
        }
    }
}

impl QueryIntentSource for GridRequest {
    fn draw(&self) -> DrawToken {
        self.draw.clone()
    }

    fn search_value(&self) -> &str {
        &self.search.value
    }

    fn searchable_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.searchable)
            .map(|c| c.data.as_str())
            .collect()
    }

    fn columns_search(&self) -> Vec<ColumnSearch> {
        self.columns
            .iter()
            .filter(|c| c.searchable && !c.search.value.is_empty())
            .map(|c| ColumnSearch {
                alias: c.data.clone(),
                text: c.search.value.clone(),
            })
            .collect()
    }

    fn external_search(&self) -> Vec<ExternalFilter> {
        self.external.clone()
    }

    fn order(&self) -> Vec<OrderRequest> {
        self.order.clone()
    }

    fn column_by_id(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(|c| c.data.as_str())
    }

    fn limit(&self) -> u32 {
        u32::try_from(self.length).unwrap_or(0)
    }

    fn page(&self) -> u32 {
        match u64::try_from(self.length) {
            Ok(length) if length > 0 => u32::try_from(self.start / length + 1).unwrap_or(u32::MAX),
            _ => 1,
        }
    }
}
