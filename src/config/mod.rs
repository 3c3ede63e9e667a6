use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub email: EmailConfig,
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    /// Origin used when building links that go out in emails (form links, dashboard links)
    pub public_base_url: String,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres connection string. `None` selects the in-memory store.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub transport: EmailTransportConfig,
    pub from_email: String,
    pub from_name: String,
    /// Inbox that receives new-submission notices
    pub therapist_email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EmailTransportConfig {
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
        use_tls: bool,
    },
    File {
        path: String,
    },
    /// No relay configured; every send fails with a not-configured error
    Disabled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    pub inactivity_days: i64,
}

/// Longest inactivity window accepted from the environment (ten years)
pub const MAX_INACTIVITY_DAYS: i64 = 3650;

/// Positive day count no larger than [`MAX_INACTIVITY_DAYS`]
pub fn parse_inactivity_days(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|days| (1..=MAX_INACTIVITY_DAYS).contains(days))
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
        // API overrides
        if let Some(v) = env::var("CRM_API_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("PUBLIC_BASE_URL") {
            self.api.public_base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Email overrides
        if let Ok(host) = env::var("SMTP_HOST") {
            let port = env::var("SMTP_PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(587);
            let use_tls = env::var("SMTP_USE_TLS").ok().and_then(|v| v.parse().ok()).unwrap_or(true);
            self.email.transport = EmailTransportConfig::Smtp {
                host,
                port,
                username: env::var("SMTP_USERNAME").unwrap_or_default(),
                password: env::var("SMTP_PASSWORD").unwrap_or_default(),
                use_tls,
            };
        } else if let Ok(path) = env::var("EMAIL_FILE_PATH") {
            self.email.transport = EmailTransportConfig::File { path };
        }
        if let Ok(v) = env::var("EMAIL_FROM") {
            self.email.from_email = v;
        }
        if let Ok(v) = env::var("EMAIL_FROM_NAME") {
            self.email.from_name = v;
        }
        if let Ok(v) = env::var("THERAPIST_EMAIL") {
            self.email.therapist_email = v;
        }

        // Reminder overrides
        if let Ok(v) = env::var("REMINDER_INACTIVITY_DAYS") {
            match parse_inactivity_days(&v) {
                Some(days) => self.reminders.inactivity_days = days,
                None => tracing::warn!(
                    "Ignoring REMINDER_INACTIVITY_DAYS={:?}, expected 1..={}",
                    v,
                    MAX_INACTIVITY_DAYS
                ),
            }
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            api: ApiConfig {
                port: 3000,
                public_base_url: "http://localhost:3000".to_string(),
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "development-secret-change-me".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            email: EmailConfig {
                transport: EmailTransportConfig::File {
                    path: "./emails".to_string(),
                },
                from_email: "crm.therapy@localhost".to_string(),
                from_name: "CRM Therapy".to_string(),
                therapist_email: "therapist@localhost".to_string(),
            },
            reminders: ReminderConfig { inactivity_days: 7 },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            api: ApiConfig {
                port: 8080,
                public_base_url: "https://staging.crm-therapy.example.com".to_string(),
                enable_request_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.crm-therapy.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            email: EmailConfig {
                transport: EmailTransportConfig::Disabled,
                from_email: "crm.therapy@example.com".to_string(),
                from_name: "CRM Therapy".to_string(),
                therapist_email: "therapist@example.com".to_string(),
            },
            reminders: ReminderConfig { inactivity_days: 7 },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            api: ApiConfig {
                port: 8080,
                public_base_url: "https://crm-therapy.example.com".to_string(),
                enable_request_logging: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://crm-therapy.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 8,
            },
            email: EmailConfig {
                transport: EmailTransportConfig::Disabled,
                from_email: "crm.therapy@example.com".to_string(),
                from_name: "CRM Therapy".to_string(),
                therapist_email: "therapist@example.com".to_string(),
            },
            reminders: ReminderConfig { inactivity_days: 7 },
        }
    }

    /// Public link a patient follows to reach the check-in form
    pub fn form_url(&self, token: &str) -> String {
        format!("{}/form/{}", self.api.public_base_url, token)
    }

    /// Dashboard page for a single patient, linked from therapist notices
    pub fn patient_url(&self, patient_id: uuid::Uuid) -> String {
        format!("{}/patient/{}", self.api.public_base_url, patient_id)
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert!(config.database.url.is_none());
        assert_eq!(config.reminders.inactivity_days, 7);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(matches!(config.email.transport, EmailTransportConfig::File { .. }));
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.database.run_migrations);
        assert!(matches!(config.email.transport, EmailTransportConfig::Disabled));
    }

    #[test]
    fn inactivity_days_must_be_positive_and_bounded() {
        assert_eq!(parse_inactivity_days("7"), Some(7));
        assert_eq!(parse_inactivity_days(" 30 "), Some(30));
        assert_eq!(parse_inactivity_days("3650"), Some(MAX_INACTIVITY_DAYS));
        for bad in ["0", "-3", "3651", "9000000000000", "seven", ""] {
            assert_eq!(parse_inactivity_days(bad), None, "{bad} should be ignored");
        }
    }

    #[test]
    fn builds_links_from_public_base_url() {
        let mut config = AppConfig::development();
        config.api.public_base_url = "https://crm.example.com".to_string();
        assert_eq!(config.form_url("abc"), "https://crm.example.com/form/abc");

        let id = uuid::Uuid::nil();
        assert_eq!(
            config.patient_url(id),
            "https://crm.example.com/patient/00000000-0000-0000-0000-000000000000"
        );
    }
}
