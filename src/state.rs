use std::sync::Arc;

use sqlx::PgPool;

use crate::auth::provider::AuthProvider;

/// Shared per-request context: the database pool and the external auth
/// collaborator. Cloned into every handler by axum.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub auth: Arc<dyn AuthProvider>,
}
