use axum::{extract::Extension, response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::services::identity::EmployeeIdentity;
use crate::services::permissions;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/auth/whoami", get(whoami))
}

/// GET /api/auth/whoami - the resolved employee plus its permission flags,
/// so the frontend can decide which surfaces to render.
async fn whoami(Extension(identity): Extension<EmployeeIdentity>) -> Json<Value> {
    let can_edit = permissions::can_edit(Some(&identity));
    let can_manage_employees = permissions::can_manage_employees(Some(&identity));

    Json(json!({
        "success": true,
        "data": {
            "employee": &identity.employee,
            "role": &identity.role,
            "current_assignments": &identity.current_assignments,
            "permissions": {
                "can_edit": can_edit,
                "can_manage_employees": can_manage_employees,
            }
        }
    }))
}
