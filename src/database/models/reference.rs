use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role classification governing permissions: ADMIN, HR, MANAGER, EMPLOYEE,
/// EXECUTIVE. Immutable reference data.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserType {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobTitle {
    pub id: i32,
    pub name: String,
}
