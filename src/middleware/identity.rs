use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::Principal;
use crate::error::ApiError;
use crate::services::identity::resolve_current_employee;
use crate::state::AppState;

/// Middleware that maps the authenticated principal to its employee record
/// and injects the resolved identity. A principal without a matching, active
/// employee gets 403: orphaned auth accounts have no access.
pub async fn load_employee_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = request
        .extensions()
        .get::<Principal>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("Session required before identity resolution"))?;

    let identity = resolve_current_employee(&state.db, &principal)
        .await?
        .ok_or_else(|| {
            tracing::warn!("No employee record linked to principal {}", principal.id);
            ApiError::forbidden("No employee record is linked to this login")
        })?;

    if !identity.employee.is_active {
        tracing::warn!("Deactivated employee {} attempted access", identity.employee.id);
        return Err(ApiError::forbidden("Employee account is deactivated"));
    }

    tracing::debug!(
        "Resolved employee {} ({}) with role '{}'",
        identity.employee.id,
        identity.employee.email,
        identity.role
    );

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}
