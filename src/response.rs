//! Standard response envelope: every endpoint returns the same JSON shape.

use crate::error::ValidationErrors;
use crate::pagination::Pagination;
use crate::registry::{ColumnSpec, SchemaField};
use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Non-fatal, user-facing message about a parameter fallback. Never an error.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Notification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Warning,
    Success,
}

impl Notification {
    pub fn warning(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Warning,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notification {
            kind: NotificationKind::Info,
            message: message.into(),
        }
    }
}

/// Applied sort, echoed back so the UI can highlight the active column.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SortState {
    pub column: String,
    pub dir: String,
}

/// Applied filter plus the fields filtering is available on.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FilterState {
    pub applied: Option<AppliedFilter>,
    pub available: Vec<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AppliedFilter {
    pub field: String,
    pub value: String,
}

/// Contextual fields accompanying a paginated list response.
#[derive(Clone, Debug, Default)]
pub struct ListContext {
    pub search: Option<String>,
    pub sort: Option<SortState>,
    pub filters: Option<FilterState>,
    pub notifications: Vec<Notification>,
}

fn to_value<T: Serialize>(v: &T) -> Value {
    serde_json::to_value(v).unwrap_or(Value::Null)
}

/// Success envelope. `search`/`sort`/`filters`/`schema`/`notifications` are
/// emitted as null when absent; `columns` only when explicitly supplied or
/// `data` is a non-empty list (ID-only fallback then).
pub fn success(
    data: Option<Value>,
    message: Option<&str>,
    status: StatusCode,
    columns: Option<Vec<ColumnSpec>>,
    meta: Option<Value>,
) -> (StatusCode, Json<Value>) {
    let mut body = Map::new();
    body.insert("success".into(), Value::Bool(true));
    if let Some(m) = message {
        body.insert("message".into(), Value::String(m.to_string()));
    }
    let data_is_list = matches!(&data, Some(Value::Array(rows)) if !rows.is_empty());
    body.insert("data".into(), data.unwrap_or(Value::Null));
    body.insert("search".into(), Value::Null);
    body.insert("sort".into(), Value::Null);
    body.insert("filters".into(), Value::Null);
    body.insert("schema".into(), Value::Null);
    match columns {
        Some(cols) => {
            body.insert("columns".into(), to_value(&cols));
        }
        None if data_is_list => {
            body.insert("columns".into(), to_value(&ColumnSpec::id_fallback()));
        }
        None => {}
    }
    body.insert("notifications".into(), Value::Null);
    if let Some(meta) = meta {
        body.insert("meta".into(), meta);
    }
    (status, Json(Value::Object(body)))
}

/// Paginated list envelope: `pagination`, `search`, `sort`, `filters`,
/// `columns`, `schema` and `notifications` are always present.
pub fn paginated(
    data: Vec<Value>,
    pagination: Pagination,
    ctx: ListContext,
    columns: Vec<ColumnSpec>,
    schema: Vec<SchemaField>,
    message: Option<&str>,
) -> (StatusCode, Json<Value>) {
    let mut body = Map::new();
    body.insert("success".into(), Value::Bool(true));
    if let Some(m) = message {
        body.insert("message".into(), Value::String(m.to_string()));
    }
    body.insert("data".into(), Value::Array(data));
    body.insert("pagination".into(), to_value(&pagination));
    body.insert(
        "search".into(),
        ctx.search.map(Value::String).unwrap_or(Value::Null),
    );
    body.insert(
        "sort".into(),
        ctx.sort.as_ref().map(to_value).unwrap_or(Value::Null),
    );
    body.insert(
        "filters".into(),
        ctx.filters.as_ref().map(to_value).unwrap_or(Value::Null),
    );
    body.insert("schema".into(), to_value(&schema));
    // Never null: the registry guarantees an ID-only fallback.
    let columns = if columns.is_empty() {
        ColumnSpec::id_fallback()
    } else {
        columns
    };
    body.insert("columns".into(), to_value(&columns));
    body.insert(
        "notifications".into(),
        if ctx.notifications.is_empty() {
            Value::Null
        } else {
            to_value(&ctx.notifications)
        },
    );
    (StatusCode::OK, Json(Value::Object(body)))
}

/// Error envelope body. `validation_errors` appears only for 422s.
pub fn error_body(
    code: &str,
    message: &str,
    details: Vec<Value>,
    validation_errors: Option<ValidationErrors>,
) -> Value {
    let mut error = Map::new();
    error.insert("code".into(), Value::String(code.to_string()));
    error.insert("details".into(), Value::Array(details));
    if let Some(errors) = validation_errors {
        error.insert("validation_errors".into(), to_value(&errors));
    }
    json!({
        "success": false,
        "message": message,
        "error": Value::Object(error),
    })
}
