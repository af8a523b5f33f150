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
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// WebDriver endpoint the browser sessions are opened against.
    pub webdriver_url: String,
    /// Listing page that renders the merchant cards.
    pub target_url: String,
    pub navigation_timeout_secs: u64,
    pub scroll_delta_px: i64,
    pub scroll_settle_ms: u64,
    pub step_timeout_secs: u64,
    pub max_scroll_rounds: u32,
    pub stable_rounds: u32,
    pub extract_max_retries: u32,
    /// Six-field cron expression (seconds first) for the recurring scrape.
    pub scrape_cron: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("webdriver_url", &self.webdriver_url)
            .field("target_url", &self.target_url)
            .field("navigation_timeout_secs", &self.navigation_timeout_secs)
            .field("scroll_delta_px", &self.scroll_delta_px)
            .field("scroll_settle_ms", &self.scroll_settle_ms)
            .field("step_timeout_secs", &self.step_timeout_secs)
            .field("max_scroll_rounds", &self.max_scroll_rounds)
            .field("stable_rounds", &self.stable_rounds)
            .field("extract_max_retries", &self.extract_max_retries)
            .field("scrape_cron", &self.scrape_cron)
            .finish()
    }
}
