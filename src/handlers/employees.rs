use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config;
use crate::error::ApiError;
use crate::services::assignments::{self, EmployeeWithAssignments};
use crate::services::employees::PgEmployeeStore;
use crate::services::identity::EmployeeIdentity;
use crate::services::permissions;
use crate::services::provisioning::{self, NewEmployeeRequest, UpdateEmployeeRequest};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/employees", get(list).post(create))
        .route(
            "/api/employees/:id",
            get(show).put(update).delete(deactivate),
        )
}

/// Role-annotated view model for the directory page.
#[derive(Debug, Serialize)]
struct DirectoryData {
    current_employee: crate::database::models::Employee,
    role: String,
    can_edit: bool,
    records: Vec<EmployeeWithAssignments>,
}

/// GET /api/employees - full directory with current assignments merged in.
async fn list(
    State(state): State<AppState>,
    Extension(identity): Extension<EmployeeIdentity>,
) -> Result<Json<Value>, ApiError> {
    if !permissions::can_manage_employees(Some(&identity)) {
        return Err(ApiError::forbidden("Employee directory requires a management role"));
    }

    let store = PgEmployeeStore::new(state.db.clone());
    let employees = store.list().await?;
    let current = assignments::fetch_all_current(&state.db).await?;
    let records = assignments::merge_current_assignments(employees, current);

    let data = DirectoryData {
        can_edit: permissions::can_edit(Some(&identity)),
        current_employee: identity.employee,
        role: identity.role,
        records,
    };

    Ok(Json(json!({ "success": true, "data": data })))
}

/// GET /api/employees/:id - a single employee with its current assignments.
async fn show(
    State(state): State<AppState>,
    Extension(identity): Extension<EmployeeIdentity>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, ApiError> {
    let store = PgEmployeeStore::new(state.db.clone());

    let employee = store
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("employee {} not found", id)))?;
    let current_assignments = store.current_assignments(id).await?;

    if !permissions::can_view_employee(Some(&identity), id, &current_assignments) {
        tracing::warn!(
            "Employee {} denied viewing employee {}",
            identity.employee.id,
            id
        );
        return Err(ApiError::forbidden("Not allowed to view this employee"));
    }

    let record = EmployeeWithAssignments {
        employee,
        current_assignments,
    };

    Ok(Json(json!({
        "success": true,
        "data": {
            "record": record,
            "role": identity.role,
            "can_edit": permissions::can_edit(Some(&identity)),
        }
    })))
}

/// POST /api/employees - provision a new employee: auth account first, then
/// the record, with compensation on failure. The response carries the
/// temporary password exactly once.
async fn create(
    State(state): State<AppState>,
    Extension(identity): Extension<EmployeeIdentity>,
    Json(req): Json<NewEmployeeRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    if !permissions::can_edit(Some(&identity)) {
        return Err(ApiError::forbidden("Creating employees requires ADMIN or HR"));
    }

    let store = PgEmployeeStore::new(state.db.clone());
    let provisioned = provisioning::provision_employee(
        state.auth.as_ref(),
        &store,
        &config::config().provisioning,
        req,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": provisioned })),
    ))
}

/// PUT /api/employees/:id - record changes plus optional auth-account sync.
async fn update(
    State(state): State<AppState>,
    Extension(identity): Extension<EmployeeIdentity>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> Result<Json<Value>, ApiError> {
    if !permissions::can_edit(Some(&identity)) {
        return Err(ApiError::forbidden("Editing employees requires ADMIN or HR"));
    }

    let store = PgEmployeeStore::new(state.db.clone());
    let employee = provisioning::update_employee(state.auth.as_ref(), &store, id, req).await?;

    Ok(Json(json!({ "success": true, "data": employee })))
}

#[derive(Debug, Deserialize)]
struct DeactivateQuery {
    /// Also block the linked auth account from signing in. Defaults to true.
    disable_auth: Option<bool>,
}

/// DELETE /api/employees/:id - soft delete; the row is never removed.
async fn deactivate(
    State(state): State<AppState>,
    Extension(identity): Extension<EmployeeIdentity>,
    Path(id): Path<i32>,
    Query(query): Query<DeactivateQuery>,
) -> Result<Json<Value>, ApiError> {
    if !permissions::can_edit(Some(&identity)) {
        return Err(ApiError::forbidden("Deactivating employees requires ADMIN or HR"));
    }

    let store = PgEmployeeStore::new(state.db.clone());
    let disable_auth = query.disable_auth.unwrap_or(true);
    let employee =
        provisioning::deactivate_employee(state.auth.as_ref(), &store, id, disable_auth).await?;

    Ok(Json(json!({ "success": true, "data": employee })))
}
