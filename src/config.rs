use std::env;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_IMPORT_CHUNK_SIZE, DEFAULT_LOCKOUT_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW_MS,
};

/// Which storage backend the process runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// SQLite tables with per-row updates
    Relational,
    /// One versioned document written with compare-and-swap
    Snapshot,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relational" | "sqlite" | "d1" => Ok(StoreBackend::Relational),
            "snapshot" | "kv" | "blob" => Ok(StoreBackend::Snapshot),
            other => Err(format!("Invalid STORE_BACKEND: {}", other)),
        }
    }
}

/// What the attempt throttle does when its own storage is broken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleMode {
    /// Log and let the login proceed unthrottled
    FailOpen,
    /// Refuse the login with a 503
    FailClosed,
}

impl FromStr for ThrottleMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fail-open" | "open" => Ok(ThrottleMode::FailOpen),
            "fail-closed" | "closed" => Ok(ThrottleMode::FailClosed),
            other => Err(format!("Invalid THROTTLE_MODE: {}", other)),
        }
    }
}

/// Brute-force guard settings
#[derive(Debug, Clone)]
pub struct ThrottlePolicy {
    pub max_attempts: u32,
    pub window_ms: i64,
    pub lockout_ms: i64,
    pub mode: ThrottleMode,
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window_ms: DEFAULT_WINDOW_MS,
            lockout_ms: DEFAULT_LOCKOUT_MS,
            mode: ThrottleMode::FailOpen,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub store_backend: StoreBackend,
    pub database_path: String,
    pub snapshot_path: String,
    pub allowed_origins: Vec<String>,
    /// Header set by a trusted reverse proxy carrying the client IP.
    /// Unset means the socket peer address identifies the client.
    pub trusted_ip_header: Option<String>,
    pub root_password: String,
    pub token_salt: String,
    pub throttle: ThrottlePolicy,
    pub import_chunk_size: usize,
    pub site_title: String,
    pub environment: String,
}

/// Durations of zero or less would disable the window or the lockout
fn require_positive(name: &str, value: i64) -> Result<i64, String> {
    if value > 0 {
        Ok(value)
    } else {
        Err(format!("{} must be greater than zero", name))
    }
}

/// Read an optional variable and parse it, falling back to `default`
fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = parse_var("SERVER_PORT", 8080u16)?;

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "relational".to_string())
            .parse()?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/navboard.db".to_string());
        let snapshot_path =
            env::var("SNAPSHOT_PATH").unwrap_or_else(|_| "./data/navboard.redb".to_string());

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let trusted_ip_header = env::var("TRUSTED_IP_HEADER")
            .ok()
            .map(|h| h.trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty());

        let root_password = env::var("ROOT_PASSWORD")
            .ok()
            .filter(|p| !p.is_empty())
            .ok_or("ROOT_PASSWORD must be set for admin access")?;

        let token_salt = env::var("TOKEN_SALT")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or("TOKEN_SALT must be set for API token hashing")?;

        let throttle = ThrottlePolicy {
            max_attempts: parse_var("LOGIN_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?.max(1),
            window_ms: require_positive(
                "LOGIN_WINDOW_MS",
                parse_var("LOGIN_WINDOW_MS", DEFAULT_WINDOW_MS)?,
            )?,
            lockout_ms: require_positive(
                "LOGIN_LOCKOUT_MS",
                parse_var("LOGIN_LOCKOUT_MS", DEFAULT_LOCKOUT_MS)?,
            )?,
            mode: env::var("THROTTLE_MODE")
                .unwrap_or_else(|_| "fail-open".to_string())
                .parse()?,
        };

        let import_chunk_size = parse_var("IMPORT_CHUNK_SIZE", DEFAULT_IMPORT_CHUNK_SIZE)?;

        let site_title = env::var("SITE_TITLE").unwrap_or_else(|_| "My Nav".to_string());
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            server_host,
            server_port,
            store_backend,
            database_path,
            snapshot_path,
            allowed_origins,
            trusted_ip_header,
            root_password,
            token_salt,
            throttle,
            import_chunk_size,
            site_title,
            environment,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Whether CORS should accept any origin
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.is_empty() || self.allowed_origins.iter().any(|o| o == "*")
    }
}
