use async_trait::async_trait;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::{Assignment, Employee};
use crate::database::query::SelectQuery;
use crate::database::repository::Repository;
use crate::database::StoreError;

/// Row values for a new employee. The id is assigned by the caller
/// (provisioning) before insert.
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_type_id: i32,
    pub auth_user_id: Option<Uuid>,
}

/// Partial update; absent fields keep their stored values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmployeeChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub user_type_id: Option<i32>,
    pub is_active: Option<bool>,
}

/// Write surface of the employees table. A trait so the provisioning saga
/// and its compensation path are testable without a database.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Next id to hand out: max + 1, or the floor when the table is empty.
    async fn next_employee_id(&self, floor: i32) -> Result<i32, StoreError>;

    async fn insert(&self, new: &NewEmployee) -> Result<Employee, StoreError>;

    async fn update(&self, id: i32, changes: &EmployeeChanges) -> Result<Employee, StoreError>;

    /// Soft delete: flips is_active, never removes the row.
    async fn deactivate(&self, id: i32) -> Result<Employee, StoreError>;
}

pub struct PgEmployeeStore {
    pool: PgPool,
}

impl PgEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        Repository::new("employees", self.pool.clone()).select_all("id").await
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<Employee>, StoreError> {
        Repository::new("employees", self.pool.clone()).select_by_id(id).await
    }

    pub async fn current_assignments(&self, employee_id: i32) -> Result<Vec<Assignment>, StoreError> {
        SelectQuery::new("assignments")
            .filter("employee_id", employee_id)
            .filter("is_current", true)
            .fetch_all(&self.pool)
            .await
    }
}

#[async_trait]
impl EmployeeStore for PgEmployeeStore {
    async fn next_employee_id(&self, floor: i32) -> Result<i32, StoreError> {
        let next: i32 = sqlx::query_scalar("SELECT COALESCE(MAX(id) + 1, $1) FROM employees")
            .bind(floor)
            .fetch_one(&self.pool)
            .await?;
        Ok(next)
    }

    async fn insert(&self, new: &NewEmployee) -> Result<Employee, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            INSERT INTO employees
                (id, first_name, last_name, email, phone, user_type_id, auth_user_id,
                 is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, NOW(), NOW())
            RETURNING *
            "#,
        )
        .bind(new.id)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(new.user_type_id)
        .bind(new.auth_user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn update(&self, id: i32, changes: &EmployeeChanges) -> Result<Employee, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            UPDATE employees SET
                first_name   = COALESCE($2, first_name),
                last_name    = COALESCE($3, last_name),
                email        = COALESCE($4, email),
                phone        = COALESCE($5, phone),
                user_type_id = COALESCE($6, user_type_id),
                is_active    = COALESCE($7, is_active),
                updated_at   = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&changes.first_name)
        .bind(&changes.last_name)
        .bind(&changes.email)
        .bind(&changes.phone)
        .bind(changes.user_type_id)
        .bind(changes.is_active)
        .fetch_optional(&self.pool)
        .await?;

        employee.ok_or_else(|| StoreError::NotFound(format!("employee {} not found", id)))
    }

    async fn deactivate(&self, id: i32) -> Result<Employee, StoreError> {
        let employee = sqlx::query_as::<_, Employee>(
            "UPDATE employees SET is_active = FALSE, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        employee.ok_or_else(|| StoreError::NotFound(format!("employee {} not found", id)))
    }
}
