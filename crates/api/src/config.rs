use std::time::Duration;

use admissions_core::consent::ConsentPolicy;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// Grace period for background tasks after the listener stops.
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    /// Whether consent is asked once per session or remembered per account.
    pub consent_policy: ConsentPolicy,
    /// Live wizard sessions untouched for this long are dropped.
    pub wizard_session_idle_mins: u64,
    /// Name used in email subjects and signatures.
    pub portal_name: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                  |
    /// |----------------------------|--------------------------|
    /// | `HOST`                     | `0.0.0.0`                |
    /// | `PORT`                     | `3000`                   |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`     | `30`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                     |
    /// | `CONSENT_POLICY`           | `per_session`            |
    /// | `WIZARD_SESSION_IDLE_MINS` | `120`                    |
    /// | `PORTAL_NAME`              | `Admissions Portal`      |
    ///
    /// Storage and SMTP settings are read by `admissions_storage` and
    /// `admissions_events`.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let consent_policy = ConsentPolicy::parse(
            &std::env::var("CONSENT_POLICY").unwrap_or_else(|_| "per_session".into()),
        )
        .unwrap_or_else(|e| panic!("CONSENT_POLICY is invalid: {e}"));

        let wizard_session_idle_mins: u64 = std::env::var("WIZARD_SESSION_IDLE_MINS")
            .unwrap_or_else(|_| "120".into())
            .parse()
            .expect("WIZARD_SESSION_IDLE_MINS must be a valid u64");
        assert!(
            wizard_session_idle_mins > 0,
            "WIZARD_SESSION_IDLE_MINS must be greater than zero"
        );

        let portal_name =
            std::env::var("PORTAL_NAME").unwrap_or_else(|_| "Admissions Portal".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt: JwtConfig::from_env(),
            consent_policy,
            wizard_session_idle_mins,
            portal_name,
        }
    }

    pub fn wizard_session_idle(&self) -> Duration {
        Duration::from_secs(self.wizard_session_idle_mins * 60)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}
