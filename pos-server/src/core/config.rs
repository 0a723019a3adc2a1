//! Server configuration
//!
//! All settings come from environment variables with defaults:
//!
//! | Variable | Default | Purpose |
//! |----------|---------|---------|
//! | WORK_DIR | ./data | Database and log directory |
//! | HTTP_PORT | 3000 | HTTP API port |
//! | CATALOG_PATH | (none) | JSON catalog file loaded at startup |
//! | LOG_LEVEL | info | tracing level filter |
//! | ENVIRONMENT | development | development / staging / production |

#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for the database and logs
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Optional JSON catalog file loaded at startup
    pub catalog_path: Option<String>,
    /// Log level filter
    pub log_level: String,
    /// Running environment: development | staging | production
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            catalog_path: std::env::var("CATALOG_PATH").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// Path of the order database inside the working directory
    pub fn db_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.work_dir).join("orders.redb")
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            work_dir: "./data".into(),
            http_port: 3000,
            catalog_path: None,
            log_level: "info".into(),
            environment: "development".into(),
        }
    }
}
