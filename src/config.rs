use std::env;

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Unset selects the in-memory store.
    pub database_url: Option<String>,
    pub seed_catalog: bool,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8081,
            database_url: None,
            seed_catalog: true,
            log_filter: "jyotish_progress=info,axum=info".into(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: env::var("PORT").ok().and_then(|s| s.parse().ok()).unwrap_or(defaults.port),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            seed_catalog: env::var("SEED_CATALOG")
                .ok()
                .and_then(|s| parse_flag(&s))
                .unwrap_or(defaults.seed_catalog),
            log_filter: env::var("RUST_LOG").unwrap_or(defaults.log_filter),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
