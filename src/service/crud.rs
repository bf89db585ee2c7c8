//! Generic CRUD execution against PostgreSQL, parameterized by a resource
//! descriptor. Writes run inside a transaction; password fields are hashed
//! (or dropped when empty on update) before they reach the database.

use crate::error::{AppError, ValidationErrors};
use crate::query::ListQuery;
use crate::registry::{FieldCast, PkType, ResourceDescriptor};
use crate::service::rules::{self, RuleMode};
use crate::sql::{self, BindValue, QueryBuf};
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

pub struct CrudService;

impl CrudService {
    /// Total row count under the query's filter and search.
    pub async fn count(
        pool: &PgPool,
        desc: &ResourceDescriptor,
        query: &ListQuery,
    ) -> Result<u64, AppError> {
        let q = sql::count(desc, query.filter.as_ref(), query.search.as_deref());
        tracing::debug!(sql = %q.sql, params = ?q.params, "count");
        let mut sq = sqlx::query_scalar::<_, i64>(&q.sql);
        for p in &q.params {
            sq = sq.bind(BindValue::from(p));
        }
        let n = sq.fetch_one(pool).await?;
        Ok(n.max(0) as u64)
    }

    /// One page of rows for a validated query and clamped page offset.
    pub async fn page(
        pool: &PgPool,
        desc: &ResourceDescriptor,
        query: &ListQuery,
        offset: u64,
    ) -> Result<Vec<Value>, AppError> {
        let q = sql::select_page(
            desc,
            query.filter.as_ref(),
            query.search.as_deref(),
            &query.sort,
            query.dir,
            query.per_page,
            offset,
        );
        Self::fetch_all(pool, &q, desc).await
    }

    /// Fetch one row by primary key.
    pub async fn read(
        pool: &PgPool,
        desc: &ResourceDescriptor,
        id: &Value,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::select_by_id(desc);
        tracing::debug!(sql = %q.sql, "read");
        let row = sqlx::query(&q.sql)
            .bind(BindValue::from(id))
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| row_to_json(desc, &r)))
    }

    /// Validate, prepare and insert one record. Returns the created row.
    pub async fn create(
        pool: &PgPool,
        desc: &ResourceDescriptor,
        mut body: Map<String, Value>,
    ) -> Result<Value, AppError> {
        let ruleset = rules::synthesize(desc, RuleMode::Create);
        rules::validate_body(&body, &ruleset).map_err(AppError::Validation)?;
        Self::probe_unique(pool, desc, &body, None).await?;
        prepare_passwords(desc, &mut body)?;

        let q = sql::insert(desc, &body);
        let mut tx = pool.begin().await?;
        tracing::debug!(sql = %q.sql, "insert");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(BindValue::from(p));
        }
        let row = query.fetch_one(&mut *tx).await?;
        tx.commit().await?;
        Ok(row_to_json(desc, &row))
    }

    /// Validate, prepare and update one record. Empty/null passwords are
    /// dropped from the payload before validation so they are neither an
    /// error nor persisted. Returns None when the id does not exist.
    pub async fn update(
        pool: &PgPool,
        desc: &ResourceDescriptor,
        id: &Value,
        mut body: Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        drop_empty_passwords(desc, &mut body);
        let ruleset = rules::synthesize(desc, RuleMode::Update);
        rules::validate_body(&body, &ruleset).map_err(AppError::Validation)?;
        Self::probe_unique(pool, desc, &body, Some(id)).await?;
        prepare_passwords(desc, &mut body)?;

        let q = sql::update(desc, id, &body);
        let mut tx = pool.begin().await?;
        tracing::debug!(sql = %q.sql, "update");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(BindValue::from(p));
        }
        let row = query.fetch_optional(&mut *tx).await?;
        tx.commit().await?;
        Ok(row.map(|r| row_to_json(desc, &r)))
    }

    /// Delete one record. Returns the deleted row, or None for a missing id.
    pub async fn delete(
        pool: &PgPool,
        desc: &ResourceDescriptor,
        id: &Value,
    ) -> Result<Option<Value>, AppError> {
        let q = sql::delete(desc);
        let mut tx = pool.begin().await?;
        tracing::debug!(sql = %q.sql, "delete");
        let row = sqlx::query(&q.sql)
            .bind(BindValue::from(id))
            .fetch_optional(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(row.map(|r| row_to_json(desc, &r)))
    }

    /// Check unique-marked fields against existing rows, excluding the
    /// current record on update. Duplicates become per-field 422 errors; a
    /// concurrent insert still surfaces as a 409 via the constraint catch.
    async fn probe_unique(
        pool: &PgPool,
        desc: &ResourceDescriptor,
        body: &Map<String, Value>,
        exclude_id: Option<&Value>,
    ) -> Result<(), AppError> {
        let mut errors = ValidationErrors::new();
        for field in desc.fillable_fields().filter(|f| f.unique) {
            let Some(value) = body.get(&field.name) else { continue };
            if value.is_null() {
                continue;
            }
            let q = sql::exists_excluding(desc, &field.name, value, exclude_id);
            tracing::debug!(sql = %q.sql, "unique probe");
            let mut probe = sqlx::query_scalar::<_, bool>(&q.sql);
            for p in &q.params {
                probe = probe.bind(BindValue::from(p));
            }
            let taken = probe.fetch_one(pool).await?;
            if taken {
                errors
                    .entry(field.name.clone())
                    .or_default()
                    .push(format!("{} has already been taken", field.name));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }

    async fn fetch_all(
        pool: &PgPool,
        q: &QueryBuf,
        desc: &ResourceDescriptor,
    ) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(BindValue::from(p));
        }
        let rows = query.fetch_all(pool).await?;
        Ok(rows.iter().map(|r| row_to_json(desc, r)).collect())
    }
}

/// On update, a supplied empty or null password means "keep the current
/// hash": the field is removed from the payload, never validated or stored.
fn drop_empty_passwords(desc: &ResourceDescriptor, body: &mut Map<String, Value>) {
    for field in desc.fields.iter().filter(|f| f.cast == FieldCast::Password) {
        let empty = match body.get(&field.name) {
            Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            _ => false,
        };
        if empty {
            body.remove(&field.name);
        }
    }
}

/// Hash remaining password values so plaintext never reaches the database.
fn prepare_passwords(desc: &ResourceDescriptor, body: &mut Map<String, Value>) -> Result<(), AppError> {
    for field in desc.fields.iter().filter(|f| f.cast == FieldCast::Password) {
        let Some(Value::String(plain)) = body.get(&field.name) else {
            body.remove(&field.name);
            continue;
        };
        let hash = bcrypt::hash(plain, bcrypt::DEFAULT_COST)?;
        body.insert(field.name.clone(), Value::String(hash));
    }
    Ok(())
}

/// Decode a row into a JSON object, driven by the descriptor's casts rather
/// than trial-and-error over column types.
fn row_to_json(desc: &ResourceDescriptor, row: &PgRow) -> Value {
    let mut map = Map::new();
    map.insert(desc.pk_column.clone(), decode_pk(row, &desc.pk_column, desc.pk_type));
    for field in &desc.fields {
        if field.cast == FieldCast::Password {
            continue;
        }
        map.insert(field.name.clone(), decode_cell(row, &field.name, field.cast));
    }
    Value::Object(map)
}

fn decode_pk(row: &PgRow, name: &str, pk_type: PkType) -> Value {
    match pk_type {
        PkType::BigInt => row
            .try_get::<Option<i64>, _>(name)
            .ok()
            .flatten()
            .map(|n| Value::Number(n.into()))
            .unwrap_or(Value::Null),
        PkType::Uuid => row
            .try_get::<Option<uuid::Uuid>, _>(name)
            .ok()
            .flatten()
            .map(|u| Value::String(u.to_string()))
            .unwrap_or(Value::Null),
        PkType::Text => row
            .try_get::<Option<String>, _>(name)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}

fn decode_cell(row: &PgRow, name: &str, cast: FieldCast) -> Value {
    match cast {
        FieldCast::Integer => {
            if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
                return Value::Number(n.into());
            }
            if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
                return Value::Number(n.into());
            }
            Value::Null
        }
        FieldCast::Boolean => row
            .try_get::<Option<bool>, _>(name)
            .ok()
            .flatten()
            .map(Value::Bool)
            .unwrap_or(Value::Null),
        // numeric selected as ::text
        FieldCast::Decimal => row
            .try_get::<Option<String>, _>(name)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
        FieldCast::Json => row
            .try_get::<Option<Value>, _>(name)
            .ok()
            .flatten()
            .unwrap_or(Value::Null),
        FieldCast::DateTime => {
            if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
                return Value::String(d.to_rfc3339());
            }
            if let Ok(Some(d)) = row.try_get::<Option<chrono::NaiveDateTime>, _>(name) {
                return Value::String(d.format("%Y-%m-%dT%H:%M:%S%.f").to_string());
            }
            Value::Null
        }
        FieldCast::Date => row
            .try_get::<Option<chrono::NaiveDate>, _>(name)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        FieldCast::Text | FieldCast::Email | FieldCast::Password => row
            .try_get::<Option<String>, _>(name)
            .ok()
            .flatten()
            .map(Value::String)
            .unwrap_or(Value::Null),
    }
}
