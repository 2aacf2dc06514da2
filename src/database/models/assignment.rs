use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Time-bounded link of an employee to a location and job title, with a
/// supervisor back-reference. At most one current+primary row per employee.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Assignment {
    pub id: i32,
    pub employee_id: i32,
    pub location_id: i32,
    pub job_title_id: i32,
    pub supervisor_employee_id: Option<i32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub is_primary: bool,
}
