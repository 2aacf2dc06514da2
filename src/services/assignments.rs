use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;

use crate::database::models::{Assignment, Employee};
use crate::database::query::SelectQuery;
use crate::database::StoreError;

/// Employee row augmented with its current assignments for list views.
#[derive(Debug, Clone, Serialize)]
pub struct EmployeeWithAssignments {
    #[serde(flatten)]
    pub employee: Employee,
    pub current_assignments: Vec<Assignment>,
}

/// Fetch every current assignment in one query, for merging into a full
/// employee list.
pub async fn fetch_all_current(pool: &PgPool) -> Result<Vec<Assignment>, StoreError> {
    SelectQuery::new("assignments")
        .filter("is_current", true)
        .fetch_all(pool)
        .await
}

/// Attach current assignments to their employees by in-memory grouping.
/// Employees without any get an empty vec, never a null. Assignment order
/// within an employee follows the source list.
pub fn merge_current_assignments(
    employees: Vec<Employee>,
    assignments: Vec<Assignment>,
) -> Vec<EmployeeWithAssignments> {
    let mut by_employee: HashMap<i32, Vec<Assignment>> = HashMap::new();
    for assignment in assignments {
        by_employee
            .entry(assignment.employee_id)
            .or_default()
            .push(assignment);
    }

    employees
        .into_iter()
        .map(|employee| {
            let current_assignments = by_employee.remove(&employee.id).unwrap_or_default();
            EmployeeWithAssignments {
                employee,
                current_assignments,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn employee(id: i32) -> Employee {
        Employee {
            id,
            first_name: "Test".to_string(),
            last_name: format!("Person{}", id),
            email: format!("person{}@example.com", id),
            phone: None,
            is_active: true,
            user_type_id: 1,
            auth_user_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn assignment(id: i32, employee_id: i32) -> Assignment {
        Assignment {
            id,
            employee_id,
            location_id: 10,
            job_title_id: 4,
            supervisor_employee_id: None,
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end_date: None,
            is_current: true,
            is_primary: true,
        }
    }

    #[test]
    fn test_merge_groups_by_employee() {
        let employees = vec![employee(1), employee(2), employee(3)];
        let assignments = vec![assignment(100, 2)];

        let merged = merge_current_assignments(employees, assignments);

        assert_eq!(merged.len(), 3);
        assert!(merged[0].current_assignments.is_empty());
        assert_eq!(merged[1].current_assignments.len(), 1);
        assert_eq!(merged[1].current_assignments[0].id, 100);
        assert!(merged[2].current_assignments.is_empty());
    }

    #[test]
    fn test_merge_preserves_source_order() {
        let employees = vec![employee(5)];
        let assignments = vec![assignment(3, 5), assignment(1, 5), assignment(2, 5)];

        let merged = merge_current_assignments(employees, assignments);

        let ids: Vec<i32> = merged[0].current_assignments.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_merge_drops_assignments_without_listed_employee() {
        let merged = merge_current_assignments(vec![employee(1)], vec![assignment(9, 99)]);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].current_assignments.is_empty());
    }

    #[test]
    fn test_merge_empty_inputs() {
        let merged = merge_current_assignments(vec![], vec![]);
        assert!(merged.is_empty());
    }
}
