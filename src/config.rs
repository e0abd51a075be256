use axum_extra::extract::cookie::Key;
use figment::Figment;
use figment::providers::{Env, Serialized};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Runtime configuration, merged from defaults and `RITUAL_`-prefixed
/// environment variables (`.env` is loaded by `main` before first access).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Socket address the HTTP server binds to.
    pub listen: String,
    /// SQLite database URL; the file is created on first run.
    pub database_url: String,
    /// Fallback log level when `RUST_LOG` is unset.
    pub loglevel: String,
    /// Master secret for the session/flash cookie key. Must be at least
    /// 32 bytes. When unset, a fresh key is generated per process and
    /// existing sessions do not survive a restart.
    pub cookie_secret: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:ritual.db".to_string(),
            loglevel: "info".to_string(),
            cookie_secret: None,
        }
    }
}

pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("RITUAL_"))
        .extract()
        .expect("invalid configuration")
});

/// Key for the private cookie jar, derived once from the configured secret.
pub static COOKIE_KEY: LazyLock<Key> = LazyLock::new(|| match CONFIG.cookie_secret.as_deref() {
    Some(secret) if secret.len() >= 32 => Key::derive_from(secret.as_bytes()),
    _ => Key::generate(),
});
