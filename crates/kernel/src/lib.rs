//! gridbind kernel
//!
//! Translates server-side grid requests (search, column filters, typed
//! filters, ordering, paging) into query plans, runs them on a pluggable
//! backend and shapes the result into the grid response envelope.

pub mod config;
pub mod error;
pub mod grid;

pub use config::GridConfig;
pub use error::{GridError, GridResult};
