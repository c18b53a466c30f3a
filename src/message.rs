//! Request/response boundary between a host surface and the extractor.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::dom::Dom;
use crate::extract::{ExtractionContext, extract_tables, table_by_index};
use crate::model::TableRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Request {
    #[serde(rename = "getTables")]
    GetTables,
    /// `tableIndex` is kept as sent; anything but a non-negative integer finds no table.
    #[serde(rename = "getTableByIndex", rename_all = "camelCase")]
    GetTableByIndex {
        #[serde(default)]
        table_index: Option<Value>,
    },
}

impl Request {
    pub fn table_by_index(index: i64) -> Self {
        Self::GetTableByIndex {
            table_index: Some(Value::from(index)),
        }
    }
}

/// Exactly one of these answers every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Tables { tables: Vec<TableRecord> },
    Table { table: Option<TableRecord> },
    Error { error: String },
}

pub fn handle_request<D: Dom>(
    dom: &D,
    context: &ExtractionContext,
    request: &Request,
) -> Response {
    match request {
        Request::GetTables => {
            let tables = extract_tables(dom, context);
            debug!(count = tables.len(), "answered getTables");
            Response::Tables { tables }
        }
        Request::GetTableByIndex { table_index } => {
            let table = table_index
                .as_ref()
                .and_then(integral_index)
                .and_then(|index| table_by_index(dom, context, index));
            debug!(
                ?table_index,
                found = table.is_some(),
                "answered getTableByIndex"
            );
            Response::Table { table }
        }
    }
}

/// Integer-valued JSON numbers, `3.0` included.
fn integral_index(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|number| number.fract() == 0.0 && number.abs() < 9.0e15)
            .map(|number| number as i64)
    })
}

/// Decode a raw JSON request and answer it; undecodable input gets an error response.
pub fn handle_message<D: Dom>(dom: &D, context: &ExtractionContext, raw: &str) -> Response {
    match serde_json::from_str::<Request>(raw) {
        Ok(request) => handle_request(dom, context, &request),
        Err(err) => {
            warn!(error = %err, "rejected malformed request");
            Response::Error {
                error: format!("invalid request: {err}"),
            }
        }
    }
}
