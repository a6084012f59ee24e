use std::env;

use anyhow::Context;
use chrono::Duration;

use crate::store::CredentialPolicy;

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres storage when set; in-memory storage otherwise.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub otp_ttl: Duration,
    pub reject_reused_password: bool,
    pub auto_login_on_register: bool,
    pub admin_seed: Option<AdminSeed>,
    pub seed_default_categories: bool,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let access_token_ttl = Duration::minutes(minutes("ACCESS_TOKEN_EXPIRE_MINUTES", 60));
        let otp_ttl = Duration::minutes(minutes("OTP_TTL_MINUTES", 10));

        let admin_seed = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed { email, password })
            }
            _ => None,
        };

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://127.0.0.1:5173".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            access_token_ttl,
            otp_ttl,
            reject_reused_password: flag("REJECT_REUSED_PASSWORD"),
            auto_login_on_register: flag("AUTO_LOGIN_ON_REGISTER"),
            admin_seed,
            seed_default_categories: flag("SEED_DEFAULT_CATEGORIES"),
            cors_origins,
        })
    }

    /// Defaults for embedding the service without an environment, e.g. in tests.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            database_url: None,
            host: "127.0.0.1".to_string(),
            port: 3000,
            jwt_secret: jwt_secret.into(),
            access_token_ttl: Duration::minutes(60),
            otp_ttl: Duration::minutes(10),
            reject_reused_password: false,
            auto_login_on_register: false,
            admin_seed: None,
            seed_default_categories: false,
            cors_origins: Vec::new(),
        }
    }

    pub fn credential_policy(&self) -> CredentialPolicy {
        CredentialPolicy {
            otp_ttl: self.otp_ttl,
            reject_reused_password: self.reject_reused_password,
            ..CredentialPolicy::default()
        }
    }
}

fn minutes(key: &str, default: i64) -> i64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn flag(key: &str) -> bool {
    env::var(key)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
