//! Employee provisioning: the two-step create against the external auth
//! provider and the local store, with the compensating delete when the second
//! step fails. There is no cross-store transaction, so the compensation is
//! the named failure path, not an incidental catch.

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::auth::provider::{AuthProvider, AuthProviderError};
use crate::config::ProvisioningConfig;
use crate::database::models::Employee;
use crate::database::StoreError;
use crate::services::employees::{EmployeeChanges, EmployeeStore, NewEmployee};

/// Fixed alphabet for generated passwords; ambiguous glyphs (0/O, 1/l/I)
/// are left out.
const PASSWORD_ALPHABET: &[u8] =
    b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789!@#$%&*";

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("auth provider error: {0}")]
    Auth(#[from] AuthProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
pub struct NewEmployeeRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub user_type_id: i32,
    /// Explicit id override; normally auto-assigned.
    pub id: Option<i32>,
    /// Initial password override; normally generated.
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProvisionedEmployee {
    pub employee: Employee,
    /// Handed back once so it can be passed to the new hire.
    pub temporary_password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmployeeRequest {
    #[serde(flatten)]
    pub changes: EmployeeChanges,
    /// Reset the linked auth account's password.
    pub password: Option<String>,
    /// Push an email change through to the linked auth account.
    #[serde(default)]
    pub sync_auth_email: bool,
}

/// Cryptographically random selection from the fixed alphabet.
pub fn generate_password(length: usize) -> String {
    (0..length)
        .map(|_| {
            let idx = OsRng.gen_range(0..PASSWORD_ALPHABET.len());
            PASSWORD_ALPHABET[idx] as char
        })
        .collect()
}

/// Create the auth principal, then the employee row. If the insert fails
/// after the principal exists, the principal is deleted as compensation;
/// failure of that cleanup is logged and never escalated, so the primary
/// error stays visible.
pub async fn provision_employee(
    auth: &dyn AuthProvider,
    store: &dyn EmployeeStore,
    cfg: &ProvisioningConfig,
    req: NewEmployeeRequest,
) -> Result<ProvisionedEmployee, ProvisionError> {
    let password = match req.password {
        Some(p) => p,
        None => generate_password(cfg.password_length),
    };

    let principal_id = auth.create_principal(&req.email, &password).await?;

    let id = match req.id {
        Some(id) => id,
        None => store.next_employee_id(cfg.employee_id_floor).await?,
    };

    let new = NewEmployee {
        id,
        first_name: req.first_name,
        last_name: req.last_name,
        email: req.email,
        phone: req.phone,
        user_type_id: req.user_type_id,
        auth_user_id: Some(principal_id),
    };

    match store.insert(&new).await {
        Ok(employee) => {
            info!("Provisioned employee {} ({})", employee.id, employee.email);
            Ok(ProvisionedEmployee {
                employee,
                temporary_password: password,
            })
        }
        Err(store_err) => {
            warn!(
                "Employee insert failed after principal {} was created; deleting principal",
                principal_id
            );
            if let Err(cleanup_err) = auth.delete_principal(principal_id).await {
                warn!(
                    "Compensating principal delete failed for {}: {}",
                    principal_id, cleanup_err
                );
            }
            Err(store_err.into())
        }
    }
}

/// Apply record changes, then sync the linked auth account where requested.
/// Employees without a login skip the auth calls silently.
pub async fn update_employee(
    auth: &dyn AuthProvider,
    store: &dyn EmployeeStore,
    id: i32,
    req: UpdateEmployeeRequest,
) -> Result<Employee, ProvisionError> {
    let sync_email = req.sync_auth_email.then(|| req.changes.email.clone()).flatten();

    let employee = store.update(id, &req.changes).await?;

    if let Some(auth_user_id) = employee.auth_user_id {
        if let Some(password) = &req.password {
            auth.update_principal_password(auth_user_id, password).await?;
        }
        if let Some(email) = &sync_email {
            auth.update_principal_email(auth_user_id, email).await?;
        }
    }

    Ok(employee)
}

/// Soft delete; the row stays queryable. Optionally blocks the linked auth
/// account from signing in.
pub async fn deactivate_employee(
    auth: &dyn AuthProvider,
    store: &dyn EmployeeStore,
    id: i32,
    disable_auth: bool,
) -> Result<Employee, ProvisionError> {
    let employee = store.deactivate(id).await?;

    if disable_auth {
        if let Some(auth_user_id) = employee.auth_user_id {
            auth.disable_principal(auth_user_id).await?;
        }
    }

    info!("Deactivated employee {}", employee.id);
    Ok(employee)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;
    use uuid::Uuid;

    fn cfg() -> ProvisioningConfig {
        ProvisioningConfig {
            password_length: 16,
            employee_id_floor: 1000,
        }
    }

    fn request(email: &str) -> NewEmployeeRequest {
        NewEmployeeRequest {
            first_name: "New".to_string(),
            last_name: "Hire".to_string(),
            email: email.to_string(),
            phone: None,
            user_type_id: 4,
            id: None,
            password: None,
        }
    }

    #[derive(Default)]
    struct MockAuthProvider {
        principals: Mutex<Vec<(Uuid, String)>>,
        disabled: Mutex<Vec<Uuid>>,
        password_updates: Mutex<Vec<(Uuid, String)>>,
        email_updates: Mutex<Vec<(Uuid, String)>>,
        fail_delete: bool,
    }

    impl MockAuthProvider {
        fn principal_for(&self, email: &str) -> Option<Uuid> {
            self.principals
                .lock()
                .unwrap()
                .iter()
                .find(|(_, e)| e == email)
                .map(|(id, _)| *id)
        }
    }

    #[async_trait]
    impl AuthProvider for MockAuthProvider {
        async fn create_principal(
            &self,
            email: &str,
            _password: &str,
        ) -> Result<Uuid, AuthProviderError> {
            let id = Uuid::new_v4();
            self.principals.lock().unwrap().push((id, email.to_string()));
            Ok(id)
        }

        async fn delete_principal(&self, id: Uuid) -> Result<(), AuthProviderError> {
            if self.fail_delete {
                return Err(AuthProviderError::Rejected {
                    status: 500,
                    message: "delete failed".to_string(),
                });
            }
            self.principals.lock().unwrap().retain(|(pid, _)| *pid != id);
            Ok(())
        }

        async fn update_principal_email(
            &self,
            id: Uuid,
            email: &str,
        ) -> Result<(), AuthProviderError> {
            self.email_updates.lock().unwrap().push((id, email.to_string()));
            Ok(())
        }

        async fn update_principal_password(
            &self,
            id: Uuid,
            password: &str,
        ) -> Result<(), AuthProviderError> {
            self.password_updates.lock().unwrap().push((id, password.to_string()));
            Ok(())
        }

        async fn disable_principal(&self, id: Uuid) -> Result<(), AuthProviderError> {
            self.disabled.lock().unwrap().push(id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockEmployeeStore {
        rows: Mutex<Vec<Employee>>,
        fail_insert: bool,
        deactivated: Mutex<Vec<i32>>,
    }

    fn employee_from(new: &NewEmployee) -> Employee {
        Employee {
            id: new.id,
            first_name: new.first_name.clone(),
            last_name: new.last_name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            is_active: true,
            user_type_id: new.user_type_id,
            auth_user_id: new.auth_user_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[async_trait]
    impl EmployeeStore for MockEmployeeStore {
        async fn next_employee_id(&self, floor: i32) -> Result<i32, StoreError> {
            let max = self.rows.lock().unwrap().iter().map(|e| e.id).max();
            Ok(max.map(|m| m + 1).unwrap_or(floor))
        }

        async fn insert(&self, new: &NewEmployee) -> Result<Employee, StoreError> {
            if self.fail_insert {
                return Err(StoreError::NotFound("insert rejected".to_string()));
            }
            let employee = employee_from(new);
            self.rows.lock().unwrap().push(employee.clone());
            Ok(employee)
        }

        async fn update(&self, id: i32, changes: &EmployeeChanges) -> Result<Employee, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("employee {} not found", id)))?;
            if let Some(v) = &changes.email {
                row.email = v.clone();
            }
            if let Some(v) = changes.is_active {
                row.is_active = v;
            }
            Ok(row.clone())
        }

        async fn deactivate(&self, id: i32) -> Result<Employee, StoreError> {
            self.deactivated.lock().unwrap().push(id);
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|e| e.id == id)
                .ok_or_else(|| StoreError::NotFound(format!("employee {} not found", id)))?;
            row.is_active = false;
            Ok(row.clone())
        }
    }

    #[test]
    fn test_generated_password_length_and_alphabet() {
        let password = generate_password(16);
        assert_eq!(password.len(), 16);
        assert!(password.bytes().all(|b| PASSWORD_ALPHABET.contains(&b)));

        assert_eq!(generate_password(24).len(), 24);
    }

    #[tokio::test]
    async fn test_provision_creates_principal_then_employee() {
        let auth = MockAuthProvider::default();
        let store = MockEmployeeStore::default();

        let result = provision_employee(&auth, &store, &cfg(), request("new@example.com"))
            .await
            .unwrap();

        // Empty table starts at the floor
        assert_eq!(result.employee.id, 1000);
        assert_eq!(result.temporary_password.len(), 16);

        let principal_id = auth.principal_for("new@example.com").unwrap();
        assert_eq!(result.employee.auth_user_id, Some(principal_id));
    }

    #[tokio::test]
    async fn test_provision_assigns_max_plus_one() {
        let auth = MockAuthProvider::default();
        let store = MockEmployeeStore::default();
        store.rows.lock().unwrap().push(employee_from(&NewEmployee {
            id: 1207,
            first_name: "Existing".to_string(),
            last_name: "Person".to_string(),
            email: "existing@example.com".to_string(),
            phone: None,
            user_type_id: 4,
            auth_user_id: None,
        }));

        let result = provision_employee(&auth, &store, &cfg(), request("new@example.com"))
            .await
            .unwrap();

        assert_eq!(result.employee.id, 1208);
    }

    #[tokio::test]
    async fn test_provision_honors_explicit_id_and_password() {
        let auth = MockAuthProvider::default();
        let store = MockEmployeeStore::default();
        let mut req = request("new@example.com");
        req.id = Some(77);
        req.password = Some("chosen-by-admin".to_string());

        let result = provision_employee(&auth, &store, &cfg(), req).await.unwrap();

        assert_eq!(result.employee.id, 77);
        assert_eq!(result.temporary_password, "chosen-by-admin");
    }

    #[tokio::test]
    async fn test_insert_failure_deletes_principal() {
        let auth = MockAuthProvider::default();
        let store = MockEmployeeStore {
            fail_insert: true,
            ..Default::default()
        };

        let result = provision_employee(&auth, &store, &cfg(), request("doomed@example.com")).await;

        assert!(matches!(result, Err(ProvisionError::Store(_))));
        // Compensation removed the orphaned principal
        assert!(auth.principal_for("doomed@example.com").is_none());
    }

    #[tokio::test]
    async fn test_failed_compensation_keeps_primary_error() {
        let auth = MockAuthProvider {
            fail_delete: true,
            ..Default::default()
        };
        let store = MockEmployeeStore {
            fail_insert: true,
            ..Default::default()
        };

        let result = provision_employee(&auth, &store, &cfg(), request("doomed@example.com")).await;

        // The store error surfaces even though cleanup also failed
        assert!(matches!(result, Err(ProvisionError::Store(_))));
    }

    #[tokio::test]
    async fn test_deactivate_is_soft_and_optionally_disables_auth() {
        let auth = MockAuthProvider::default();
        let store = MockEmployeeStore::default();
        let auth_id = Uuid::new_v4();
        store.rows.lock().unwrap().push(employee_from(&NewEmployee {
            id: 1001,
            first_name: "Current".to_string(),
            last_name: "Staff".to_string(),
            email: "staff@example.com".to_string(),
            phone: None,
            user_type_id: 4,
            auth_user_id: Some(auth_id),
        }));

        let employee = deactivate_employee(&auth, &store, 1001, true).await.unwrap();

        assert!(!employee.is_active);
        // The row still exists; only the flag changed
        assert_eq!(store.rows.lock().unwrap().len(), 1);
        assert_eq!(store.deactivated.lock().unwrap().as_slice(), &[1001]);
        assert_eq!(auth.disabled.lock().unwrap().as_slice(), &[auth_id]);
    }

    #[tokio::test]
    async fn test_update_syncs_auth_when_requested() {
        let auth = MockAuthProvider::default();
        let store = MockEmployeeStore::default();
        let auth_id = Uuid::new_v4();
        store.rows.lock().unwrap().push(employee_from(&NewEmployee {
            id: 1001,
            first_name: "Current".to_string(),
            last_name: "Staff".to_string(),
            email: "old@example.com".to_string(),
            phone: None,
            user_type_id: 4,
            auth_user_id: Some(auth_id),
        }));

        let req = UpdateEmployeeRequest {
            changes: EmployeeChanges {
                email: Some("new@example.com".to_string()),
                ..Default::default()
            },
            password: Some("reset-me-now".to_string()),
            sync_auth_email: true,
        };

        let employee = update_employee(&auth, &store, 1001, req).await.unwrap();

        assert_eq!(employee.email, "new@example.com");
        assert_eq!(
            auth.email_updates.lock().unwrap().as_slice(),
            &[(auth_id, "new@example.com".to_string())]
        );
        assert_eq!(
            auth.password_updates.lock().unwrap().as_slice(),
            &[(auth_id, "reset-me-now".to_string())]
        );
    }

    #[tokio::test]
    async fn test_update_without_login_skips_auth_calls() {
        let auth = MockAuthProvider::default();
        let store = MockEmployeeStore::default();
        store.rows.lock().unwrap().push(employee_from(&NewEmployee {
            id: 1002,
            first_name: "No".to_string(),
            last_name: "Login".to_string(),
            email: "nologin@example.com".to_string(),
            phone: None,
            user_type_id: 4,
            auth_user_id: None,
        }));

        let req = UpdateEmployeeRequest {
            changes: EmployeeChanges::default(),
            password: Some("ignored".to_string()),
            sync_auth_email: true,
        };

        update_employee(&auth, &store, 1002, req).await.unwrap();

        assert!(auth.password_updates.lock().unwrap().is_empty());
        assert!(auth.email_updates.lock().unwrap().is_empty());
    }
}
