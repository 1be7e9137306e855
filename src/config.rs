use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::rate_limit;

#[derive(Clone)]
pub struct MailerCredentials {
    pub user: String,
    pub password: String,
}

/// Service configuration, read once from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    /// Absent when MAILER_USER/MAILER_PASSWORD are not both set; email
    /// sending is disabled in that case rather than failing startup.
    pub mailer: Option<MailerCredentials>,
    /// Session cookies are marked Secure only in production.
    pub cookie_secure: bool,
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let supabase_url = env::var("SUPABASE_URL")
            .expect("SUPABASE_URL must be set")
            .trim_end_matches('/')
            .to_string();
        let supabase_key = env::var("SUPABASE_KEY").expect("SUPABASE_KEY must be set");

        let mailer = match (env::var("MAILER_USER").ok(), env::var("MAILER_PASSWORD").ok()) {
            (Some(user), Some(password)) => Some(MailerCredentials { user, password }),
            _ => None,
        };

        let cookie_secure = env::var("APP_ENV").map(|v| v == "production").unwrap_or(false);

        Self {
            supabase_url,
            supabase_key,
            mailer,
            cookie_secure,
            rate_limit_max: env_or("REGISTER_RATE_LIMIT_MAX", rate_limit::DEFAULT_MAX_REQUESTS),
            rate_limit_window: Duration::from_secs(env_or(
                "REGISTER_RATE_LIMIT_WINDOW_SECS",
                rate_limit::DEFAULT_WINDOW_SECS,
            )),
            port: env_or("PORT", 3000),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
