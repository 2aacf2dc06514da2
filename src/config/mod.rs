use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub auth_api: AuthApiConfig,
    pub provisioning: ProvisioningConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Shared HS256 secret for validating session tokens issued by the auth provider.
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthApiConfig {
    /// Base URL of the auth provider's admin REST API.
    pub base_url: String,
    /// Service-role key authorizing admin operations.
    pub service_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    pub password_length: usize,
    /// First employee id handed out when the employees table is empty.
    pub employee_id_floor: i32,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECT_TIMEOUT") {
            self.database.connect_timeout_secs =
                v.parse().unwrap_or(self.database.connect_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("SESSION_JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Auth provider overrides
        if let Ok(v) = env::var("AUTH_API_URL") {
            self.auth_api.base_url = v;
        }
        if let Ok(v) = env::var("AUTH_SERVICE_KEY") {
            self.auth_api.service_key = v;
        }

        // Provisioning overrides
        if let Ok(v) = env::var("PROVISIONING_PASSWORD_LENGTH") {
            self.provisioning.password_length =
                v.parse().unwrap_or(self.provisioning.password_length);
        }
        if let Ok(v) = env::var("PROVISIONING_EMPLOYEE_ID_FLOOR") {
            self.provisioning.employee_id_floor =
                v.parse().unwrap_or(self.provisioning.employee_id_floor);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connect_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            auth_api: AuthApiConfig {
                base_url: "http://localhost:9999".to_string(),
                service_key: String::new(),
            },
            provisioning: ProvisioningConfig {
                password_length: 16,
                employee_id_floor: 1000,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                connect_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                cors_origins: vec!["https://hub-staging.example.com".to_string()],
            },
            auth_api: AuthApiConfig {
                base_url: String::new(),
                service_key: String::new(),
            },
            provisioning: ProvisioningConfig {
                password_length: 16,
                employee_id_floor: 1000,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                connect_timeout_secs: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                cors_origins: vec!["https://hub.example.com".to_string()],
            },
            auth_api: AuthApiConfig {
                base_url: String::new(),
                service_key: String::new(),
            },
            provisioning: ProvisioningConfig {
                password_length: 16,
                employee_id_floor: 1000,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.provisioning.password_length, 16);
        assert_eq!(config.provisioning.employee_id_floor, 1000);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.max_connections, 50);
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.cors_origins.len(), 1);
    }
}
