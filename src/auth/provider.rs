use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::AuthApiConfig;

#[derive(Debug, Error)]
pub enum AuthProviderError {
    #[error("auth api request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("auth api rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid auth provider configuration: {0}")]
    Config(String),
}

/// Admin surface of the external auth collaborator.
///
/// Session validation does not go through here; tokens are verified locally
/// with the shared secret. This trait covers account lifecycle only, so tests
/// can substitute an in-memory implementation.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn create_principal(&self, email: &str, password: &str)
        -> Result<Uuid, AuthProviderError>;

    async fn delete_principal(&self, id: Uuid) -> Result<(), AuthProviderError>;

    async fn update_principal_email(&self, id: Uuid, email: &str)
        -> Result<(), AuthProviderError>;

    async fn update_principal_password(
        &self,
        id: Uuid,
        password: &str,
    ) -> Result<(), AuthProviderError>;

    /// Block the account from signing in without deleting it.
    async fn disable_principal(&self, id: Uuid) -> Result<(), AuthProviderError>;
}

/// Production implementation backed by the provider's admin REST API.
pub struct HttpAuthProvider {
    base_url: Url,
    service_key: String,
    http: reqwest::Client,
}

impl HttpAuthProvider {
    pub fn from_config(cfg: &AuthApiConfig) -> Result<Self, AuthProviderError> {
        if cfg.base_url.is_empty() {
            return Err(AuthProviderError::Config("AUTH_API_URL is not set".to_string()));
        }
        if cfg.service_key.is_empty() {
            return Err(AuthProviderError::Config("AUTH_SERVICE_KEY is not set".to_string()));
        }
        let base_url = Url::parse(&cfg.base_url)
            .map_err(|e| AuthProviderError::Config(format!("invalid AUTH_API_URL: {}", e)))?;
        Ok(Self {
            base_url,
            service_key: cfg.service_key.clone(),
            http: reqwest::Client::new(),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| AuthProviderError::Config(format!("invalid auth api path '{}': {}", path, e)))
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, AuthProviderError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(AuthProviderError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CreatedPrincipal {
    id: Uuid,
}

#[async_trait]
impl AuthProvider for HttpAuthProvider {
    async fn create_principal(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Uuid, AuthProviderError> {
        let resp = self
            .http
            .post(self.endpoint("admin/users")?)
            .bearer_auth(&self.service_key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true
            }))
            .send()
            .await?;

        let created: CreatedPrincipal = Self::check(resp).await?.json().await?;
        Ok(created.id)
    }

    async fn delete_principal(&self, id: Uuid) -> Result<(), AuthProviderError> {
        let resp = self
            .http
            .delete(self.endpoint(&format!("admin/users/{}", id))?)
            .bearer_auth(&self.service_key)
            .send()
            .await?;

        Self::check(resp).await?;
        Ok(())
    }

    async fn update_principal_email(
        &self,
        id: Uuid,
        email: &str,
    ) -> Result<(), AuthProviderError> {
        let resp = self
            .http
            .put(self.endpoint(&format!("admin/users/{}", id))?)
            .bearer_auth(&self.service_key)
            .json(&json!({ "email": email, "email_confirm": true }))
            .send()
            .await?;

        Self::check(resp).await?;
        Ok(())
    }

    async fn update_principal_password(
        &self,
        id: Uuid,
        password: &str,
    ) -> Result<(), AuthProviderError> {
        let resp = self
            .http
            .put(self.endpoint(&format!("admin/users/{}", id))?)
            .bearer_auth(&self.service_key)
            .json(&json!({ "password": password }))
            .send()
            .await?;

        Self::check(resp).await?;
        Ok(())
    }

    async fn disable_principal(&self, id: Uuid) -> Result<(), AuthProviderError> {
        let resp = self
            .http
            .put(self.endpoint(&format!("admin/users/{}", id))?)
            .bearer_auth(&self.service_key)
            .json(&json!({ "ban_duration": "none_permanent" }))
            .send()
            .await?;

        Self::check(resp).await?;
        Ok(())
    }
}
