//! Generic resource handlers: one controller for every registered resource,
//! resolved from the slug in the matched route.

use crate::error::AppError;
use crate::pagination::Pagination;
use crate::query::ListQuery;
use crate::registry::{PkType, ResourceDescriptor};
use crate::response::{self, ListContext};
use crate::service::CrudService;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::{Map, Value};
use std::collections::HashMap;

fn resolve<'a>(state: &'a AppState, slug: &str) -> Result<&'a ResourceDescriptor, AppError> {
    state
        .registry
        .get(slug)
        .ok_or_else(|| AppError::NotFound(format!("resource '{}'", slug)))
}

fn parse_id(id_str: &str, pk_type: PkType) -> Result<Value, AppError> {
    Ok(match pk_type {
        PkType::BigInt => {
            let n: i64 = id_str
                .parse()
                .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))?;
            Value::Number(n.into())
        }
        PkType::Uuid => {
            let u = uuid::Uuid::parse_str(id_str)
                .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))?;
            Value::String(u.to_string())
        }
        PkType::Text => Value::String(id_str.to_string()),
    })
}

fn body_to_map(value: Value) -> Result<Map<String, Value>, AppError> {
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

/// GET /{resource}: paginated, sorted, filtered, searched list. Invalid
/// parameters never fail the request; they fall back with notifications.
pub async fn index(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let desc = resolve(&state, &resource)?;
    let mut query = ListQuery::parse(&params, desc);

    let total = CrudService::count(&state.pool, desc, &query).await?;
    let (pagination, clamp_note) =
        Pagination::compute(total, query.page, query.per_page, uri.path(), &query.url_query);
    let mut notifications = std::mem::take(&mut query.notifications);
    notifications.extend(clamp_note);

    let rows = CrudService::page(&state.pool, desc, &query, pagination.offset()).await?;
    let ctx = ListContext {
        search: query.search.clone(),
        sort: Some(query.sort_state()),
        filters: Some(query.filter_state(desc)),
        notifications,
    };
    Ok(response::paginated(
        rows,
        pagination,
        ctx,
        desc.columns_or_default(),
        desc.schema_fields(),
        None,
    ))
}

/// GET /{resource}/{id}
pub async fn show(
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let desc = resolve(&state, &resource)?;
    let id = parse_id(&id_str, desc.pk_type)?;
    let row = CrudService::read(&state.pool, desc, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} '{}'", desc.name, id_str)))?;
    Ok(response::success(Some(row), None, StatusCode::OK, None, None))
}

/// POST /{resource}
pub async fn store(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    payload: Result<axum::Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let desc = resolve(&state, &resource)?;
    let axum::Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let body = body_to_map(body)?;
    let row = CrudService::create(&state.pool, desc, body).await?;
    Ok(response::success(
        Some(row),
        Some("Resource created successfully"),
        StatusCode::CREATED,
        None,
        None,
    ))
}

/// PUT/PATCH /{resource}/{id}: partial update, all fields optional.
pub async fn update(
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
    payload: Result<axum::Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let desc = resolve(&state, &resource)?;
    let id = parse_id(&id_str, desc.pk_type)?;
    let axum::Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let body = body_to_map(body)?;
    // Resolve the record first: a missing id is a 404 even when the payload
    // would not validate.
    CrudService::read(&state.pool, desc, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} '{}'", desc.name, id_str)))?;
    let row = CrudService::update(&state.pool, desc, &id, body)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} '{}'", desc.name, id_str)))?;
    Ok(response::success(
        Some(row),
        Some("Resource updated successfully"),
        StatusCode::OK,
        None,
        None,
    ))
}

/// DELETE /{resource}/{id}: a second delete of the same id is a 404.
pub async fn destroy(
    State(state): State<AppState>,
    Path((resource, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let desc = resolve(&state, &resource)?;
    let id = parse_id(&id_str, desc.pk_type)?;
    CrudService::delete(&state.pool, desc, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} '{}'", desc.name, id_str)))?;
    Ok(response::success(
        None,
        Some("Resource deleted successfully"),
        StatusCode::OK,
        None,
        None,
    ))
}

/// GET /{resource}/schema: form-field metadata, independent of any record.
pub async fn schema(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let desc = resolve(&state, &resource)?;
    let fields = serde_json::to_value(desc.schema_fields())
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response::success(Some(fields), None, StatusCode::OK, None, None))
}

/// GET /{resource}/columns: table-column metadata for list rendering.
pub async fn columns(
    State(state): State<AppState>,
    Path(resource): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let desc = resolve(&state, &resource)?;
    let cols = desc.columns_or_default();
    let data = serde_json::to_value(&cols).map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response::success(Some(data), None, StatusCode::OK, Some(cols), None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_per_pk_type() {
        assert_eq!(parse_id("42", PkType::BigInt).unwrap(), Value::Number(42.into()));
        assert!(parse_id("forty-two", PkType::BigInt).is_err());
        assert!(parse_id("not-a-uuid", PkType::Uuid).is_err());
        assert_eq!(
            parse_id("ABC-1", PkType::Text).unwrap(),
            Value::String("ABC-1".into())
        );
    }

    #[test]
    fn body_must_be_an_object() {
        assert!(body_to_map(serde_json::json!([1, 2])).is_err());
        assert!(body_to_map(serde_json::json!({"a": 1})).is_ok());
    }
}
