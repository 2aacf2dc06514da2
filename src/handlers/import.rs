use axum::{
    extract::{Extension, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};

use crate::error::ApiError;
use crate::services::identity::EmployeeIdentity;
use crate::services::permissions;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/import/template/:entity", get(template))
}

const LOCATION_COLUMNS: &[&str] = &[
    "name",
    "address",
    "district_name",
    "manager_email",
    "is_active",
];

const LOCATION_SAMPLE: &[&str] = &[
    "Downtown Store",
    "123 Main St",
    "Metro East",
    "manager@example.com",
    "true",
];

const EMPLOYEE_COLUMNS: &[&str] = &[
    "first_name",
    "last_name",
    "email",
    "phone",
    "user_type",
    "location_name",
    "job_title",
    "supervisor_email",
    "start_date",
];

const EMPLOYEE_SAMPLE: &[&str] = &[
    "Jane",
    "Doe",
    "jane.doe@example.com",
    "555-0100",
    "EMPLOYEE",
    "Downtown Store",
    "Sales Associate",
    "manager@example.com",
    "2025-01-15",
];

/// Fixed shape: `#`-prefixed instruction lines, one blank line, the header
/// line, one sample data line.
fn render_template(entity: &str) -> Option<String> {
    let (columns, sample, instructions): (&[&str], &[&str], &[&str]) = match entity {
        "locations" => (
            LOCATION_COLUMNS,
            LOCATION_SAMPLE,
            &[
                "# Location bulk import template",
                "# One location per row. district_name and manager_email must match existing records.",
                "# Keep the header row; delete this comment block and the sample row before uploading.",
            ],
        ),
        "employees" => (
            EMPLOYEE_COLUMNS,
            EMPLOYEE_SAMPLE,
            &[
                "# Employee bulk import template",
                "# One employee per row. user_type is one of ADMIN, HR, MANAGER, EMPLOYEE, EXECUTIVE.",
                "# location_name, job_title and supervisor_email must match existing records.",
                "# Keep the header row; delete this comment block and the sample row before uploading.",
            ],
        ),
        _ => return None,
    };

    let mut out = String::new();
    for line in instructions {
        out.push_str(line);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&columns.join(","));
    out.push('\n');
    out.push_str(&sample.join(","));
    out.push('\n');
    Some(out)
}

/// GET /api/import/template/:entity - CSV template for bulk import.
async fn template(
    Extension(identity): Extension<EmployeeIdentity>,
    Path(entity): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !permissions::can_edit(Some(&identity)) {
        return Err(ApiError::forbidden("Import templates require ADMIN or HR"));
    }

    let body = render_template(&entity).ok_or_else(|| {
        ApiError::not_found(format!("no import template for entity '{}'", entity))
    })?;

    let disposition = format!("attachment; filename=\"{}_import_template.csv\"", entity);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}
