//! Pluggable query backends.
//!
//! A backend executes a finished [`QueryPlan`]: one unfiltered count, one
//! filtered count and one page fetch per response build.

mod memory;
mod postgres;
mod sql;

use async_trait::async_trait;

use super::plan::QueryPlan;
use super::response::Row;
use crate::error::GridResult;

pub use memory::MemoryBackend;
pub use postgres::PgBackend;
pub use sql::{JoinType, SqlQueryBuilder};

/// Executes grid query plans against a data source.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    /// Multi-character wildcard token substituted for `*` in typed filters.
    fn wildcard(&self) -> &str {
        "%"
    }

    /// Count rows of the base query with nothing applied.
    async fn count_all(&self) -> GridResult<u64>;

    /// Count rows matching the plan's predicates, ignoring paging.
    async fn count_filtered(&self, plan: &QueryPlan) -> GridResult<u64>;

    /// Fetch one page (1-based) of rows matching the plan, in plan order.
    async fn fetch_page(&self, plan: &QueryPlan, page: u32, limit: u32) -> GridResult<Vec<Row>>;

    /// Generated query text for diagnostics, if the backend has any.
    fn query_text(&self, plan: &QueryPlan, page: u32, limit: u32) -> Option<String> {
        let _ = (plan, page, limit);
        None
    }
}

/// Zero-based row offset of a 1-based page.
pub(crate) fn page_offset(page: u32, limit: u32) -> u64 {
    u64::from(page.saturating_sub(1)) * u64::from(limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offsets() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(2, 10), 10);
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(u32::MAX, u32::MAX), u64::from(u32::MAX - 1) * u64::from(u32::MAX));
    }
}
