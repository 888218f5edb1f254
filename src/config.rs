// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,

    /// Base URL of the Piston-compatible execution service.
    pub piston_url: String,
    /// Client-side timeout around a single execution call, in seconds.
    pub exec_request_timeout_secs: u64,
    /// Remote compile-phase timeout, in milliseconds.
    pub exec_compile_timeout_ms: u64,
    /// Remote run-phase timeout, in milliseconds.
    pub exec_run_timeout_ms: u64,
    /// Sliding-window rate limit per language, calls per minute.
    pub exec_rate_limit_per_minute: usize,
    /// Whether identical (language, code, stdin) executions may be served
    /// from the in-process result cache.
    pub exec_cache_enabled: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://codequiz.db?mode=rwc".to_string());

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let piston_url = env::var("PISTON_API_URL")
            .unwrap_or_else(|_| "https://emkc.org/api/v2/piston".to_string());

        Self {
            database_url,
            rust_log,
            piston_url,
            exec_request_timeout_secs: parse_env("EXEC_REQUEST_TIMEOUT_SECS", 10),
            exec_compile_timeout_ms: parse_env("EXEC_COMPILE_TIMEOUT_MS", 10_000),
            exec_run_timeout_ms: parse_env("EXEC_RUN_TIMEOUT_MS", 3_000),
            exec_rate_limit_per_minute: parse_env("EXEC_RATE_LIMIT_PER_MINUTE", 60),
            exec_cache_enabled: env::var("EXEC_CACHE_ENABLED")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
