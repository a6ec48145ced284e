//! gridbind test utilities.
//!
//! Helpers for integration testing: row fixtures, DataTables-style request
//! builders, and test logging.

use std::sync::Once;

use serde_json::{Map, Value as JsonValue, json};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Install a test-writer tracing subscriber once per test binary.
///
/// Honors `RUST_LOG`; defaults to `debug` for gridbind crates.
pub fn init_test_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,gridbind_kernel=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Create a test user row with default values.
pub fn test_user(id: i64, name: &str) -> TestRow {
    TestRow::new()
        .with_field("id", json!(id))
        .with_field("name", json!(name))
        .with_field("email", json!(format!("{}@example.org", name.to_lowercase())))
        .with_field("age", json!(30))
        .with_field("active", json!(true))
}

/// A row builder for backend fixtures.
#[derive(Debug, Clone, Default)]
pub struct TestRow {
    fields: Map<String, JsonValue>,
}

impl TestRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field.
    pub fn with_field(mut self, name: &str, value: JsonValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Set the age.
    pub fn aged(self, age: i64) -> Self {
        self.with_field("age", json!(age))
    }

    /// Mark as inactive.
    pub fn inactive(self) -> Self {
        self.with_field("active", json!(false))
    }

    /// Remove a field.
    pub fn without(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }

    pub fn into_row(self) -> Map<String, JsonValue> {
        self.fields
    }

    pub fn into_json(self) -> JsonValue {
        JsonValue::Object(self.fields)
    }
}

/// A small user table: ids 1..=6, mixed ages and activity.
pub fn user_rows() -> Vec<Map<String, JsonValue>> {
    vec![
        test_user(1, "Alice").aged(34).into_row(),
        test_user(2, "Bob").aged(19).inactive().into_row(),
        test_user(3, "john").aged(51).into_row(),
        test_user(4, "Joanna").aged(27).into_row(),
        test_user(5, "Mallory").aged(45).inactive().into_row(),
        test_user(6, "jonah").aged(62).into_row(),
    ]
}

/// Create a DataTables-style request builder.
pub fn test_request(draw: u64) -> TestRequest {
    TestRequest {
        draw,
        start: 0,
        length: 10,
        search: String::new(),
        columns: Vec::new(),
        order: Vec::new(),
        external: Vec::new(),
    }
}

/// Builds a grid request in DataTables server-side JSON layout.
#[derive(Debug, Clone)]
pub struct TestRequest {
    draw: u64,
    start: u64,
    length: i64,
    search: String,
    columns: Vec<JsonValue>,
    order: Vec<JsonValue>,
    external: Vec<JsonValue>,
}

impl TestRequest {
    /// Add a searchable, orderable column.
    pub fn column(self, data: &str) -> Self {
        self.column_with(data, true, "")
    }

    /// Add a column that global search ignores.
    pub fn unsearchable_column(self, data: &str) -> Self {
        self.column_with(data, false, "")
    }

    /// Add a column with its own search value.
    pub fn searched_column(self, data: &str, value: &str) -> Self {
        self.column_with(data, true, value)
    }

    fn column_with(mut self, data: &str, searchable: bool, value: &str) -> Self {
        self.columns.push(json!({
            "data": data,
            "searchable": searchable,
            "orderable": true,
            "search": {"value": value, "regex": false}
        }));
        self
    }

    /// Set the global search text.
    pub fn search(mut self, value: &str) -> Self {
        self.search = value.to_string();
        self
    }

    /// Add a sort directive on a positional column index.
    pub fn order(mut self, column: usize, dir: &str) -> Self {
        self.order.push(json!({"column": column, "dir": dir}));
        self
    }

    /// Add a raw sort directive, e.g. one missing its direction.
    pub fn raw_order(mut self, directive: JsonValue) -> Self {
        self.order.push(directive);
        self
    }

    /// Add a typed external filter.
    pub fn external(mut self, name: &str, operator: &str, value: &str) -> Self {
        self.external
            .push(json!({"name": name, "type": operator, "value": value}));
        self
    }

    /// Set offset and page length.
    pub fn window(mut self, start: u64, length: i64) -> Self {
        self.start = start;
        self.length = length;
        self
    }

    pub fn into_json(self) -> JsonValue {
        json!({
            "draw": self.draw,
            "start": self.start,
            "length": self.length,
            "search": {"value": self.search, "regex": false},
            "columns": self.columns,
            "order": self.order,
            "external": self.external,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_fixture_shape() {
        let row = test_user(9, "Zed").into_row();
        assert_eq!(row["id"], json!(9));
        assert_eq!(row["email"], json!("zed@example.org"));
        assert_eq!(row["active"], json!(true));
    }

    #[test]
    fn row_builder_modifiers() {
        let row = test_user(1, "A").aged(70).inactive().without("email").into_row();
        assert_eq!(row["age"], json!(70));
        assert_eq!(row["active"], json!(false));
        assert!(!row.contains_key("email"));
    }

    #[test]
    fn request_json_layout() {
        let req = test_request(4)
            .column("id")
            .searched_column("name", "jo")
            .search("x")
            .order(1, "desc")
            .external("age", "greater", "30")
            .window(20, 10)
            .into_json();

        assert_eq!(req["draw"], json!(4));
        assert_eq!(req["columns"][1]["search"]["value"], json!("jo"));
        assert_eq!(req["order"][0]["dir"], json!("desc"));
        assert_eq!(req["external"][0]["type"], json!("greater"));
        assert_eq!(req["start"], json!(20));
    }
}
