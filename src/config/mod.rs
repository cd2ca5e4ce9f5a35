//! Configuration module for the Tidecal backend.
//!
//! All configuration is loaded from environment variables. The account
//! credentials are required; everything else has sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::auth::Credentials;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// The single configured account (username + password digest)
    pub credentials: Credentials,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics if `TIDECAL_USERNAME` or `TIDECAL_PASSWORD` is missing — the
    /// server cannot run without its one account.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let username =
            env::var("TIDECAL_USERNAME").expect("Missing required env var TIDECAL_USERNAME");
        let password =
            env::var("TIDECAL_PASSWORD").expect("Missing required env var TIDECAL_PASSWORD");
        let credentials = Credentials::new(username, &password);

        let db_path = env::var("TIDECAL_DB_PATH")
            .unwrap_or_else(|_| "./data/tidecal.sqlite".to_string())
            .into();

        let bind_addr = env::var("TIDECAL_BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()
            .expect("Invalid TIDECAL_BIND_ADDR format");

        let log_level = env::var("TIDECAL_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Self {
            credentials,
            db_path,
            bind_addr,
            log_level,
        }
    }
}
