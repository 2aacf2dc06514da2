use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::Row;

use crate::database::query::{bind_value_raw, validate_identifier};
use crate::database::StoreError;
use crate::error::ApiError;
use crate::services::identity::EmployeeIdentity;
use crate::services::permissions::ROLE_ADMIN;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/admin/table/:table", post(table_post))
}

/// Tables operable through the maintenance surface. Everything else is
/// rejected outright; there is deliberately no way to name an arbitrary
/// table or invoke a function here.
const ALLOWED_TABLES: &[&str] = &[
    "employees",
    "user_types",
    "job_titles",
    "assignments",
    "locations",
    "districts",
    "markets",
    "regions",
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum TableOp {
    Select,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Deserialize)]
struct TableRequest {
    op: TableOp,
    /// Equality filters, column -> value.
    #[serde(default)]
    filters: Map<String, Value>,
    /// Column values for insert/update.
    #[serde(default)]
    values: Map<String, Value>,
}

/// POST /api/admin/table/:table - row-level maintenance against an
/// allow-listed table. ADMIN only.
async fn table_post(
    State(state): State<AppState>,
    Extension(identity): Extension<EmployeeIdentity>,
    Path(table): Path<String>,
    Json(req): Json<TableRequest>,
) -> Result<Json<Value>, ApiError> {
    if identity.role != ROLE_ADMIN {
        return Err(ApiError::forbidden("Table maintenance requires ADMIN"));
    }

    if !ALLOWED_TABLES.contains(&table.as_str()) {
        tracing::warn!(
            "Admin {} attempted operation on non-listed table '{}'",
            identity.employee.id,
            table
        );
        return Err(ApiError::forbidden(format!(
            "table '{}' is not operable via this endpoint",
            table
        )));
    }

    for column in req.filters.keys().chain(req.values.keys()) {
        validate_identifier(column).map_err(ApiError::from)?;
    }

    match req.op {
        TableOp::Select => select_rows(&state, &table, &req.filters).await,
        TableOp::Insert => insert_row(&state, &table, &req.values).await,
        TableOp::Update => update_rows(&state, &table, &req.filters, &req.values).await,
        TableOp::Delete => delete_rows(&state, &table, &req.filters).await,
    }
}

fn where_clause(filters: &Map<String, Value>, param_offset: usize) -> (String, Vec<&Value>) {
    let mut clauses = Vec::with_capacity(filters.len());
    let mut params = Vec::with_capacity(filters.len());
    for (i, (column, value)) in filters.iter().enumerate() {
        clauses.push(format!("\"{}\" = ${}", column, param_offset + i + 1));
        params.push(value);
    }
    (clauses.join(" AND "), params)
}

async fn select_rows(
    state: &AppState,
    table: &str,
    filters: &Map<String, Value>,
) -> Result<Json<Value>, ApiError> {
    let (clause, params) = where_clause(filters, 0);
    let mut sql = format!(
        "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"{}\"",
        table
    );
    if !clause.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&clause);
    }
    sql.push_str(" ORDER BY id) t");

    let mut q = sqlx::query(&sql);
    for p in params {
        q = bind_value_raw(q, p);
    }
    let rows = q
        .fetch_all(&state.db)
        .await
        .map_err(StoreError::from)?;

    let records: Vec<Value> = rows
        .iter()
        .map(|row| row.try_get("row").unwrap_or(Value::Null))
        .collect();

    Ok(Json(json!({ "success": true, "data": records })))
}

async fn insert_row(
    state: &AppState,
    table: &str,
    values: &Map<String, Value>,
) -> Result<Json<Value>, ApiError> {
    if values.is_empty() {
        return Err(ApiError::bad_request("insert requires values"));
    }

    let columns: Vec<String> = values.keys().map(|c| format!("\"{}\"", c)).collect();
    let placeholders: Vec<String> = (1..=values.len()).map(|i| format!("${}", i)).collect();
    let sql = format!(
        "INSERT INTO \"{}\" ({}) VALUES ({}) RETURNING row_to_json(\"{}\") AS row",
        table,
        columns.join(", "),
        placeholders.join(", "),
        table
    );

    let mut q = sqlx::query(&sql);
    for value in values.values() {
        q = bind_value_raw(q, value);
    }
    let row = q.fetch_one(&state.db).await.map_err(StoreError::from)?;
    let record: Value = row.try_get("row").unwrap_or(Value::Null);

    Ok(Json(json!({ "success": true, "data": record })))
}

async fn update_rows(
    state: &AppState,
    table: &str,
    filters: &Map<String, Value>,
    values: &Map<String, Value>,
) -> Result<Json<Value>, ApiError> {
    if values.is_empty() {
        return Err(ApiError::bad_request("update requires values"));
    }
    if filters.is_empty() {
        return Err(ApiError::bad_request("update requires filters"));
    }

    let assignments: Vec<String> = values
        .keys()
        .enumerate()
        .map(|(i, column)| format!("\"{}\" = ${}", column, i + 1))
        .collect();
    let (clause, filter_params) = where_clause(filters, values.len());
    let sql = format!(
        "UPDATE \"{}\" SET {} WHERE {} RETURNING row_to_json(\"{}\") AS row",
        table,
        assignments.join(", "),
        clause,
        table
    );

    let mut q = sqlx::query(&sql);
    for value in values.values() {
        q = bind_value_raw(q, value);
    }
    for value in filter_params {
        q = bind_value_raw(q, value);
    }
    let rows = q.fetch_all(&state.db).await.map_err(StoreError::from)?;

    let records: Vec<Value> = rows
        .iter()
        .map(|row| row.try_get("row").unwrap_or(Value::Null))
        .collect();

    Ok(Json(json!({ "success": true, "data": records })))
}

async fn delete_rows(
    state: &AppState,
    table: &str,
    filters: &Map<String, Value>,
) -> Result<Json<Value>, ApiError> {
    if filters.is_empty() {
        return Err(ApiError::bad_request("delete requires filters"));
    }

    let (clause, params) = where_clause(filters, 0);
    let sql = format!("DELETE FROM \"{}\" WHERE {}", table, clause);

    let mut q = sqlx::query(&sql);
    for value in params {
        q = bind_value_raw(q, value);
    }
    let result = q.execute(&state.db).await.map_err(StoreError::from)?;

    Ok(Json(json!({
        "success": true,
        "data": { "deleted": result.rows_affected() }
    })))
}
