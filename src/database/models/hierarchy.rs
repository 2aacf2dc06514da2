use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Three levels above Location: district -> market -> region. Parent
// references are nullable; the chain is acyclic by construction.

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct District {
    pub id: i32,
    pub name: String,
    pub market_id: Option<i32>,
    pub manager_employee_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Market {
    pub id: i32,
    pub name: String,
    pub region_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Region {
    pub id: i32,
    pub name: String,
}
