//! Stateless permission predicates.
//!
//! Every predicate takes the resolved identity as an explicit argument and
//! treats `None` as "no permission". A missing role name is the empty string,
//! which matches no allowed set, so absent role data degrades to denial
//! rather than an error.

use crate::database::models::{Assignment, Location};
use crate::services::identity::EmployeeIdentity;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_HR: &str = "HR";
pub const ROLE_MANAGER: &str = "MANAGER";
pub const ROLE_EMPLOYEE: &str = "EMPLOYEE";
pub const ROLE_EXECUTIVE: &str = "EXECUTIVE";

fn role_of(identity: Option<&EmployeeIdentity>) -> &str {
    identity.map(|i| i.role.as_str()).unwrap_or("")
}

/// ADMIN and HR may edit employee and organizational records.
pub fn can_edit(identity: Option<&EmployeeIdentity>) -> bool {
    matches!(role_of(identity), ROLE_ADMIN | ROLE_HR)
}

/// Managers additionally get the employee-management surfaces (read-only
/// beyond their own reports; editing stays with ADMIN/HR).
pub fn can_manage_employees(identity: Option<&EmployeeIdentity>) -> bool {
    matches!(role_of(identity), ROLE_ADMIN | ROLE_HR | ROLE_MANAGER)
}

/// ADMIN/HR, or the employee set as the location's manager.
pub fn can_manage_location(identity: Option<&EmployeeIdentity>, location: &Location) -> bool {
    if can_edit(identity) {
        return true;
    }
    match identity {
        Some(me) => location.manager_employee_id == Some(me.employee.id),
        None => false,
    }
}

/// ADMIN/HR see everyone; everyone sees themselves; a MANAGER sees an
/// employee iff a current assignment names them as that employee's
/// supervisor. `target_assignments` are the target's assignment rows, fetched
/// by the caller.
pub fn can_view_employee(
    identity: Option<&EmployeeIdentity>,
    target_id: i32,
    target_assignments: &[Assignment],
) -> bool {
    let Some(me) = identity else {
        return false;
    };

    if matches!(me.role.as_str(), ROLE_ADMIN | ROLE_HR) {
        return true;
    }

    if me.employee.id == target_id {
        return true;
    }

    me.role == ROLE_MANAGER
        && target_assignments.iter().any(|a| {
            a.is_current
                && a.employee_id == target_id
                && a.supervisor_employee_id == Some(me.employee.id)
        })
}
