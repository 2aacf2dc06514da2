use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A physical site, optionally belonging to a district and optionally run by
/// a managing employee.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub address: Option<String>,
    pub district_id: Option<i32>,
    pub manager_employee_id: Option<i32>,
    pub is_active: bool,
}
