//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from a
//! resource descriptor.

use crate::query::SortDir;
use crate::registry::{FieldCast, ResourceDescriptor};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from descriptors).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Outbound column list: the pk plus every field except password hashes,
/// which never leave the database. Numerics select as text so sqlx decodes
/// them without precision loss.
fn select_column_list(desc: &ResourceDescriptor) -> String {
    let mut cols = vec![quoted(&desc.pk_column)];
    for f in &desc.fields {
        if f.cast == FieldCast::Password {
            continue;
        }
        let q = quoted(&f.name);
        match f.cast {
            FieldCast::Decimal => cols.push(format!("{}::text AS {}", q, q)),
            _ => cols.push(q),
        }
    }
    cols.join(", ")
}

/// Placeholder with an SQL cast where the bound wire type differs from the
/// column type (timestamps, dates, numerics, jsonb bound from strings/JSON).
fn placeholder(cast: FieldCast, n: usize) -> String {
    match cast.pg_cast() {
        Some(t) => format!("${}::{}", n, t),
        None => format!("${}", n),
    }
}

fn where_clause(
    desc: &ResourceDescriptor,
    filter: Option<&(String, Value)>,
    search: Option<&str>,
    q: &mut QueryBuf,
) -> String {
    let mut parts = Vec::new();
    if let Some((field, value)) = filter {
        if let Some(f) = desc.find_field(field) {
            let n = q.push_param(value.clone());
            parts.push(format!("{} = {}", quoted(field), placeholder(f.cast, n)));
        }
    }
    if let Some(term) = search {
        let searchable = desc.searchable_columns();
        if !searchable.is_empty() {
            let pattern = format!("%{}%", term.replace('%', "\\%").replace('_', "\\_"));
            let mut likes = Vec::new();
            for col in searchable {
                let n = q.push_param(Value::String(pattern.clone()));
                likes.push(format!("{} ILIKE ${}", quoted(col), n));
            }
            parts.push(format!("({})", likes.join(" OR ")));
        }
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT one page, ordered by a validated sortable column.
pub fn select_page(
    desc: &ResourceDescriptor,
    filter: Option<&(String, Value)>,
    search: Option<&str>,
    sort: &str,
    dir: SortDir,
    limit: u32,
    offset: u64,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let cols = select_column_list(desc);
    let where_sql = where_clause(desc, filter, search, &mut q);
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} {} LIMIT {} OFFSET {}",
        cols,
        quoted(&desc.table),
        where_sql,
        quoted(sort),
        dir.as_sql(),
        limit,
        offset
    );
    q
}

/// COUNT(*) with the same filter/search predicate as [`select_page`].
pub fn count(
    desc: &ResourceDescriptor,
    filter: Option<&(String, Value)>,
    search: Option<&str>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(desc, filter, search, &mut q);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(&desc.table), where_sql);
    q
}

/// SELECT by primary key. Caller binds the id as the sole param.
pub fn select_by_id(desc: &ResourceDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = $1",
        select_column_list(desc),
        quoted(&desc.table),
        quoted(&desc.pk_column)
    );
    q
}

/// INSERT from the prepared body: fillable columns present in the body only,
/// RETURNING the outbound column list. A body with no fillable columns
/// inserts a row of column defaults.
pub fn insert(desc: &ResourceDescriptor, body: &serde_json::Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in desc.fillable_fields() {
        let Some(v) = body.get(&f.name) else { continue };
        let n = q.push_param(v.clone());
        cols.push(quoted(&f.name));
        placeholders.push(placeholder(f.cast, n));
    }
    if cols.is_empty() {
        q.sql = format!(
            "INSERT INTO {} DEFAULT VALUES RETURNING {}",
            quoted(&desc.table),
            select_column_list(desc)
        );
        return q;
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(&desc.table),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(desc)
    );
    q
}

/// UPDATE by id: SET only fillable columns present in the body. Touches
/// `updated_at` when the resource declares one.
pub fn update(desc: &ResourceDescriptor, id: &Value, body: &serde_json::Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for f in desc.fillable_fields() {
        let Some(v) = body.get(&f.name) else { continue };
        let n = q.push_param(v.clone());
        sets.push(format!("{} = {}", quoted(&f.name), placeholder(f.cast, n)));
    }
    if sets.is_empty() {
        // Nothing to change: re-read so the caller still gets the row (or a 404).
        q.params.push(id.clone());
        q.sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            select_column_list(desc),
            quoted(&desc.table),
            quoted(&desc.pk_column)
        );
        return q;
    }
    if desc.find_field("updated_at").is_some() {
        sets.push(format!("{} = NOW()", quoted("updated_at")));
    }
    let id_param = q.push_param(id.clone());
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(&desc.table),
        sets.join(", "),
        quoted(&desc.pk_column),
        id_param,
        select_column_list(desc)
    );
    q
}

/// DELETE by id, RETURNING the row so absence distinguishes a 404.
pub fn delete(desc: &ResourceDescriptor) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!(
        "DELETE FROM {} WHERE {} = $1 RETURNING {}",
        quoted(&desc.table),
        quoted(&desc.pk_column),
        select_column_list(desc)
    );
    q
}

/// Uniqueness probe: does any other row carry this value? Excludes the
/// current record on update.
pub fn exists_excluding(
    desc: &ResourceDescriptor,
    column: &str,
    value: &Value,
    exclude_id: Option<&Value>,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(value.clone());
    let mut sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = ${}",
        quoted(&desc.table),
        quoted(column),
        n
    );
    if let Some(id) = exclude_id {
        let m = q.push_param(id.clone());
        sql.push_str(&format!(" AND {} <> ${}", quoted(&desc.pk_column), m));
    }
    sql.push(')');
    q.sql = sql;
    q
}
