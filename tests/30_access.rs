// Access-control behavior across the assembled view layer: permission
// predicates combined with the assignment merger and hierarchy assembler,
// exercised through the library crate.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use alliance_hub::database::models::{Assignment, District, Employee, Location, Market, Region};
use alliance_hub::database::StoreError;
use alliance_hub::services::assignments::merge_current_assignments;
use alliance_hub::services::hierarchy::{assemble_locations, HierarchyStore};
use alliance_hub::services::identity::EmployeeIdentity;
use alliance_hub::services::permissions;

fn employee(id: i32) -> Employee {
    Employee {
        id,
        first_name: "Staff".to_string(),
        last_name: format!("Member{}", id),
        email: format!("staff{}@example.com", id),
        phone: None,
        is_active: true,
        user_type_id: 1,
        auth_user_id: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn identity(id: i32, role: &str, current_assignments: Vec<Assignment>) -> EmployeeIdentity {
    EmployeeIdentity {
        employee: employee(id),
        role: role.to_string(),
        current_assignments,
    }
}

fn assignment(id: i32, employee_id: i32, supervisor: Option<i32>, is_current: bool) -> Assignment {
    Assignment {
        id,
        employee_id,
        location_id: 1,
        job_title_id: 1,
        supervisor_employee_id: supervisor,
        start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        end_date: None,
        is_current,
        is_primary: true,
    }
}

struct FixtureStore {
    districts: Vec<District>,
    markets: Vec<Market>,
    regions: Vec<Region>,
}

#[async_trait]
impl HierarchyStore for FixtureStore {
    async fn districts_by_ids(&self, ids: &[i32]) -> Result<Vec<District>, StoreError> {
        Ok(self.districts.iter().filter(|d| ids.contains(&d.id)).cloned().collect())
    }

    async fn markets_by_ids(&self, ids: &[i32]) -> Result<Vec<Market>, StoreError> {
        Ok(self.markets.iter().filter(|m| ids.contains(&m.id)).cloned().collect())
    }

    async fn regions_by_ids(&self, ids: &[i32]) -> Result<Vec<Region>, StoreError> {
        Ok(self.regions.iter().filter(|r| ids.contains(&r.id)).cloned().collect())
    }
}

#[test]
fn manager_visibility_tracks_current_supervision() {
    let manager = identity(4, "MANAGER", vec![]);

    // The directory merge and the per-target permission check agree: the
    // report's assignment drives both.
    let employees = vec![employee(4), employee(8), employee(9)];
    let all_current = vec![assignment(1, 8, Some(4), true)];
    let merged = merge_current_assignments(employees, all_current);

    let report = &merged[1];
    assert_eq!(report.employee.id, 8);
    assert!(permissions::can_view_employee(
        Some(&manager),
        8,
        &report.current_assignments
    ));

    let unrelated = &merged[2];
    assert_eq!(unrelated.employee.id, 9);
    assert!(!permissions::can_view_employee(
        Some(&manager),
        9,
        &unrelated.current_assignments
    ));
}

#[test]
fn ended_assignment_revokes_manager_visibility() {
    let manager = identity(4, "MANAGER", vec![]);
    let mut supervision = assignment(1, 8, Some(4), true);

    assert!(permissions::can_view_employee(Some(&manager), 8, std::slice::from_ref(&supervision)));

    supervision.is_current = false;
    assert!(!permissions::can_view_employee(Some(&manager), 8, std::slice::from_ref(&supervision)));
}

#[tokio::test]
async fn directory_view_for_admin_shows_every_record() {
    let admin = identity(1, "ADMIN", vec![]);
    let employees = vec![employee(1), employee(2), employee(3)];
    let merged = merge_current_assignments(employees, vec![assignment(1, 2, Some(1), true)]);

    for record in &merged {
        assert!(permissions::can_view_employee(
            Some(&admin),
            record.employee.id,
            &record.current_assignments
        ));
    }
    assert!(permissions::can_edit(Some(&admin)));
    assert!(permissions::can_manage_employees(Some(&admin)));
}

#[tokio::test]
async fn location_views_resolve_hierarchy_for_any_role() {
    let store = FixtureStore {
        districts: vec![District {
            id: 1,
            name: "Metro East".to_string(),
            market_id: Some(10),
            manager_employee_id: Some(4),
        }],
        markets: vec![Market {
            id: 10,
            name: "Northeast".to_string(),
            region_id: Some(100),
        }],
        regions: vec![Region {
            id: 100,
            name: "Atlantic".to_string(),
        }],
    };

    let locations = vec![
        Location {
            id: 1,
            name: "Downtown".to_string(),
            address: None,
            district_id: Some(1),
            manager_employee_id: Some(4),
            is_active: true,
        },
        Location {
            id: 2,
            name: "Airport".to_string(),
            address: None,
            district_id: None,
            manager_employee_id: None,
            is_active: true,
        },
    ];

    let views = assemble_locations(&store, locations).await.unwrap();

    let chain = views[0]
        .district
        .as_ref()
        .and_then(|d| d.market.as_ref())
        .and_then(|m| m.region.as_ref())
        .map(|r| r.name.as_str());
    assert_eq!(chain, Some("Atlantic"));
    assert!(views[1].district.is_none());

    // Location management: the named manager may edit, an unrelated
    // manager-role employee may not.
    let named = identity(4, "MANAGER", vec![]);
    let other = identity(5, "MANAGER", vec![]);
    assert!(permissions::can_manage_location(Some(&named), &views[0].location));
    assert!(!permissions::can_manage_location(Some(&other), &views[0].location));
}
