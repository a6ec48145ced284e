//! Grid request translation.
//!
//! This module provides:
//! - ColumnRegistry: column descriptors and their aliases
//! - Binder: dispatch of search, filter and order intents
//! - Operator table: typed filter operators and their clause templates
//! - QueryBackend: pluggable execution (memory, SeaQuery/PostgreSQL)
//! - GridAdapter and format_response: the response build cycle

mod adapter;
pub mod backend;
mod binder;
pub mod columns;
pub mod intent;
pub mod operators;
pub mod plan;
pub mod response;

pub use adapter::GridAdapter;
pub use backend::{JoinType, MemoryBackend, PgBackend, QueryBackend, SqlQueryBuilder};
pub use binder::{Bind, BindCategory, Binder, ExternalHandler, OrderHandler, SearchHandler};
pub use columns::{ColumnDescriptor, ColumnEntry, ColumnRegistry};
pub use intent::{
    ColumnParam, ColumnSearch, ExternalFilter, GridRequest, OrderRequest, QueryIntentSource,
    SearchParam,
};
pub use operators::{Arity, Operand, Operator, OperatorRule};
pub use plan::{OrderDirective, Predicate, QueryPlan, SortDirection};
pub use response::{DrawToken, ResponseEnvelope, ResultSet, Row, format_response};
