use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::{get, put},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::database::models::Location;
use crate::database::repository::Repository;
use crate::error::ApiError;
use crate::services::hierarchy::{self, LocationView, PgHierarchyStore};
use crate::services::identity::EmployeeIdentity;
use crate::services::permissions;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/locations", get(list))
        .route("/api/locations/:id", put(update))
}

#[derive(Debug, Serialize)]
struct LocationsData {
    current_employee: crate::database::models::Employee,
    role: String,
    can_edit: bool,
    records: Vec<LocationView>,
}

/// GET /api/locations - every location with its district/market/region chain
/// attached. Visible to any authenticated employee.
async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<EmployeeIdentity>,
) -> Result<Json<Value>, ApiError> {
    let locations = Repository::<Location>::new("locations", state.db.clone())
        .select_all("id")
        .await?;

    let store = PgHierarchyStore::new(state.db.clone());
    let records = hierarchy::assemble_locations(&store, locations).await?;

    let data = LocationsData {
        can_edit: permissions::can_edit(Some(&identity)),
        current_employee: identity.employee,
        role: identity.role,
        records,
    };

    Ok(Json(json!({ "success": true, "data": data })))
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Deserialize)]
struct LocationChanges {
    name: Option<String>,
    address: Option<String>,
    district_id: Option<i32>,
    manager_employee_id: Option<i32>,
    is_active: Option<bool>,
}

/// PUT /api/locations/:id - ADMIN/HR, or the location's own manager.
async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<EmployeeIdentity>,
    Path(id): Path<i32>,
    Json(changes): Json<LocationChanges>,
) -> Result<Json<Value>, ApiError> {
    let location = Repository::<Location>::new("locations", state.db.clone())
        .select_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("location {} not found", id)))?;

    if !permissions::can_manage_location(Some(&identity), &location) {
        tracing::warn!(
            "Employee {} denied managing location {}",
            identity.employee.id,
            id
        );
        return Err(ApiError::forbidden("Not allowed to manage this location"));
    }

    let updated = sqlx::query_as::<_, Location>(
        r#"
        UPDATE locations SET
            name                = COALESCE($2, name),
            address             = COALESCE($3, address),
            district_id         = COALESCE($4, district_id),
            manager_employee_id = COALESCE($5, manager_employee_id),
            is_active           = COALESCE($6, is_active)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&changes.name)
    .bind(&changes.address)
    .bind(changes.district_id)
    .bind(changes.manager_employee_id)
    .bind(changes.is_active)
    .fetch_one(&state.db)
    .await
    .map_err(crate::database::StoreError::from)?;

    Ok(Json(json!({ "success": true, "data": updated })))
}
