use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub directus_url: String,
    pub directus_token: String,
    pub medusa_url: String,
    pub medusa_api_key: String,
    /// `None` keeps product links in memory for the life of the process.
    pub database_url: Option<String>,
    /// Directus collection holding the product rows.
    pub collection: String,
    pub currency_code: String,
    pub request_timeout_secs: u64,
    /// Retry budget for read-only listing calls. Mutations are never retried.
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Six-field cron expression for the in-server bulk sync, if enabled.
    pub sync_schedule: Option<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("directus_url", &self.directus_url)
            .field("directus_token", &"[redacted]")
            .field("medusa_url", &self.medusa_url)
            .field("medusa_api_key", &"[redacted]")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[redacted]"),
            )
            .field("collection", &self.collection)
            .field("currency_code", &self.currency_code)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("sync_schedule", &self.sync_schedule)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
