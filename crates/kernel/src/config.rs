//! Grid configuration, optionally loaded from environment variables.

use std::env;

use anyhow::{Context, Result};

/// Limits applied while binding a grid request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridConfig {
    /// Maximum number of characters passed to the backend per search value (default: 30).
    pub search_max_length: usize,

    /// Page length used when the request asks for 0 or "all" rows (default: 10).
    pub default_page_length: u32,

    /// Upper bound on the requested page length (default: 100).
    pub max_page_length: u32,

    /// Statement timeout for SQL backends, in seconds (default: 10).
    pub statement_timeout_secs: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            search_max_length: 30,
            default_page_length: 10,
            max_page_length: 100,
            statement_timeout_secs: 10,
        }
    }
}

impl GridConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let search_max_length = parse_var("GRID_SEARCH_MAX_LENGTH", defaults.search_max_length)
            .context("GRID_SEARCH_MAX_LENGTH must be a valid usize")?;

        let default_page_length =
            parse_var("GRID_DEFAULT_PAGE_LENGTH", defaults.default_page_length)
                .context("GRID_DEFAULT_PAGE_LENGTH must be a valid u32")?;

        let max_page_length = parse_var("GRID_MAX_PAGE_LENGTH", defaults.max_page_length)
            .context("GRID_MAX_PAGE_LENGTH must be a valid u32")?;

        let statement_timeout_secs =
            parse_var("GRID_STATEMENT_TIMEOUT_SECS", defaults.statement_timeout_secs)
                .context("GRID_STATEMENT_TIMEOUT_SECS must be a valid u64")?;

        if default_page_length > max_page_length {
            anyhow::bail!(
                "GRID_DEFAULT_PAGE_LENGTH ({default_page_length}) exceeds GRID_MAX_PAGE_LENGTH ({max_page_length})"
            );
        }

        Ok(Self {
            search_max_length,
            default_page_length,
            max_page_length,
            statement_timeout_secs,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => Ok(raw.trim().parse()?),
        Err(_) => Ok(default),
    }
}
