use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::auth::Principal;
use crate::database::models::{Assignment, Employee};
use crate::database::query::SelectQuery;
use crate::database::StoreError;

/// The resolved current employee: the row itself, its role name, and its
/// current assignments. Injected per-request by the identity middleware.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeIdentity {
    pub employee: Employee,
    /// UserType name; empty string when the role reference dangles so that
    /// permission checks degrade to denial instead of erroring.
    pub role: String,
    pub current_assignments: Vec<Assignment>,
}

#[derive(Debug, FromRow)]
struct EmployeeRoleRow {
    #[sqlx(flatten)]
    employee: Employee,
    role_name: Option<String>,
}

/// Map an authenticated principal to its employee record.
///
/// Two round trips by design: the employee row joined to its role name (the
/// store supports one level of join depth), then the current assignments
/// merged in memory. A principal with no matching employee resolves to `Ok(None)` -
/// orphaned auth accounts mean "no access", not an error.
pub async fn resolve_current_employee(
    pool: &PgPool,
    principal: &Principal,
) -> Result<Option<EmployeeIdentity>, StoreError> {
    let row = sqlx::query_as::<_, EmployeeRoleRow>(
        r#"
        SELECT e.*, ut.name AS role_name
        FROM employees e
        LEFT JOIN user_types ut ON ut.id = e.user_type_id
        WHERE e.auth_user_id = $1
        "#,
    )
    .bind(principal.id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let current_assignments = SelectQuery::<Assignment>::new("assignments")
        .filter("employee_id", row.employee.id)
        .filter("is_current", true)
        .fetch_all(pool)
        .await?;

    Ok(Some(EmployeeIdentity {
        employee: row.employee,
        role: row.role_name.unwrap_or_default(),
        current_assignments,
    }))
}
