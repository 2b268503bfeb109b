use std::path::PathBuf;
use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Waypoint.
///
/// Connector failures never travel past the probe that observed them; they
/// are folded into `failed` statuses. Only configuration and persistence
/// errors abort an operation.
#[derive(Debug, Error)]
pub enum WaypointError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Connector I/O ────────────────────────────────────────────────────
    #[error("connector: {0}")]
    Connector(#[from] ConnectorError),

    // ── Snapshot persistence ─────────────────────────────────────────────
    #[error("persistence: {0}")]
    Persistence(#[from] PersistenceError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Connector errors ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Error)]
pub enum ConnectorError {
    /// Credential rejected. The provider's message is kept verbatim.
    #[error("{connector} authentication failed: {message}")]
    Auth { connector: String, message: String },

    #[error("{connector} request failed: {message}")]
    Transport { connector: String, message: String },

    #[error("{connector} rate-limited{}", retry_hint(*.retry_after_secs))]
    RateLimited {
        connector: String,
        retry_after_secs: Option<u64>,
    },

    #[error("{connector} returned an unexpected response: {message}")]
    Malformed { connector: String, message: String },

    #[error("{connector} did not answer within {timeout_secs}s")]
    Timeout { connector: String, timeout_secs: u64 },
}

fn retry_hint(retry_after_secs: Option<u64>) -> String {
    retry_after_secs.map_or_else(String::new, |secs| format!(" (retry after {secs}s)"))
}

impl ConnectorError {
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

// ─── Persistence errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode snapshot: {0}")]
    Encode(String),

    #[error("snapshot at {path} is unreadable: {message}")]
    Corrupt { path: PathBuf, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, WaypointError>;
