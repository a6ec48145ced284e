//! Response formatter.
//!
//! Reshapes already-computed counts and rows into the grid response
//! envelope. No filtering, sorting or counting happens here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A result row keyed by column alias.
pub type Row = serde_json::Map<String, Value>;

/// Field injected into rows that carry an `id`.
pub const ROW_ID_FIELD: &str = "DT_RowId";

/// Opaque request sequence marker, echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DrawToken {
    Number(u64),
    Text(String),
}

impl From<u64> for DrawToken {
    fn from(value: u64) -> Self {
        DrawToken::Number(value)
    }
}

impl From<&str> for DrawToken {
    fn from(value: &str) -> Self {
        DrawToken::Text(value.to_string())
    }
}

/// Counts and rows produced by a backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    /// Row count before any search or filter.
    pub total: u64,

    /// Row count after predicates, before paging.
    pub filtered: u64,

    /// Rows of the requested page.
    pub rows: Vec<Row>,
}

/// Wire envelope consumed by the grid UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub draw: DrawToken,
    pub records_total: u64,
    pub records_filtered: u64,
    pub data: Vec<Row>,
}

/// Build the response envelope.
///
/// Rows keep their order. Every row with an `id` field also receives a
/// `DT_RowId` field holding the same value.
pub fn format_response(draw: DrawToken, result: ResultSet) -> ResponseEnvelope {
    let data = result
        .rows
        .into_iter()
        .map(|mut row| {
            if let Some(id) = row.get("id").cloned() {
                row.insert(ROW_ID_FIELD.to_string(), id);
            }
            row
        })
        .collect();

    ResponseEnvelope {
        draw,
        records_total: result.total,
        records_filtered: result.filtered,
        data,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        match value {
            Value::Object(map) => map,
            _ => panic!("row fixture must be an object"),
        }
    }

    #[test]
    fn injects_row_id_next_to_id() {
        let envelope = format_response(
            DrawToken::Number(1),
            ResultSet {
                total: 1,
                filtered: 1,
                rows: vec![row(json!({"id": 7, "name": "x"}))],
            },
        );

        assert_eq!(
            envelope.data,
            vec![row(json!({"id": 7, "name": "x", "DT_RowId": 7}))]
        );
    }

    #[test]
    fn rows_without_id_are_untouched() {
        let envelope = format_response(
            DrawToken::Number(1),
            ResultSet {
                rows: vec![row(json!({"name": "x"}))],
                ..Default::default()
            },
        );

        assert!(!envelope.data[0].contains_key(ROW_ID_FIELD));
    }

    #[test]
    fn omitted_fields_default_to_empty() {
        let envelope = format_response(DrawToken::from("7"), ResultSet::default());

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            json!({"draw": "7", "recordsTotal": 0, "recordsFiltered": 0, "data": []})
        );
    }

    #[test]
    fn preserves_row_order() {
        let envelope = format_response(
            DrawToken::Number(2),
            ResultSet {
                total: 3,
                filtered: 3,
                rows: vec![
                    row(json!({"id": "c"})),
                    row(json!({"id": "a"})),
                    row(json!({"id": "b"})),
                ],
            },
        );

        let ids: Vec<&Value> = envelope.data.iter().map(|r| &r[ROW_ID_FIELD]).collect();
        assert_eq!(ids, vec![&json!("c"), &json!("a"), &json!("b")]);
    }
}
