// src/executor/mod.rs
//
// Client for a Piston-compatible remote code-execution service.

pub mod cache;
pub mod languages;
pub mod rate_limit;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::Config;
use cache::ResultCache;
use languages::LanguageRegistry;
use rate_limit::RateLimiter;

/// Errors that can occur when dispatching code to the execution service.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The language key is not in the supported-language registry.
    #[error("language '{0}' is not supported")]
    UnsupportedLanguage(String),

    /// The per-language sliding-window limit was exhausted.
    #[error("rate limit exceeded for language '{0}'")]
    RateLimited(String),

    /// The network call did not complete within the configured timeout.
    #[error("API request timed out after {0}s")]
    Timeout(u64),

    /// The request failed below HTTP (DNS, connect, broken pipe).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service answered with a non-success HTTP status.
    #[error("API error (HTTP {status}): {message}")]
    Remote { status: u16, message: String },
}

/// What came back from one successful execution call.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// Compile-phase stderr, when the language has a compile step and it
    /// produced any.
    pub compile_stderr: Option<String>,
    pub run_stdout: String,
    pub run_stderr: String,
    pub exit_code: i64,
    /// Wall-clock duration of the call, measured client-side.
    pub duration_seconds: f64,
}

/// Seam between grading and the remote service, so tests can script outcomes.
#[async_trait]
pub trait CodeExecutor: Send + Sync {
    async fn execute(
        &self,
        language: &str,
        code: &str,
        stdin: &str,
    ) -> Result<ExecutionOutcome, ExecError>;

    /// Language keys this executor will accept.
    fn supported_languages(&self) -> Vec<String>;
}

#[derive(Debug, Serialize)]
struct PistonFile {
    name: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct PistonRequest {
    language: String,
    version: String,
    files: Vec<PistonFile>,
    stdin: String,
    args: Vec<String>,
    compile_timeout: u64,
    run_timeout: u64,
    compile_memory_limit: i64,
    run_memory_limit: i64,
}

#[derive(Debug, Default, Deserialize)]
struct PistonPhase {
    #[serde(default)]
    stdout: String,
    #[serde(default)]
    stderr: String,
    #[serde(default)]
    code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct PistonResponse {
    #[serde(default)]
    compile: Option<PistonPhase>,
    run: PistonPhase,
}

#[derive(Debug, Deserialize)]
struct PistonErrorBody {
    message: String,
}

/// HTTP client for the execution service. One outbound call per invocation,
/// behind the language registry, the rate limiter and (optionally) the
/// result cache.
pub struct PistonClient {
    base_url: String,
    http: reqwest::Client,
    registry: LanguageRegistry,
    limiter: RateLimiter,
    cache: Option<ResultCache>,
    compile_timeout_ms: u64,
    run_timeout_ms: u64,
    request_timeout_secs: u64,
}

impl PistonClient {
    pub fn new(config: &Config, registry: LanguageRegistry) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.exec_request_timeout_secs))
            .build()
            .expect("failed to build HTTP client");

        Self {
            base_url: config.piston_url.trim_end_matches('/').to_string(),
            http,
            registry,
            limiter: RateLimiter::per_minute(config.exec_rate_limit_per_minute),
            cache: config.exec_cache_enabled.then(ResultCache::default),
            compile_timeout_ms: config.exec_compile_timeout_ms,
            run_timeout_ms: config.exec_run_timeout_ms,
            request_timeout_secs: config.exec_request_timeout_secs,
        }
    }
}

#[async_trait]
impl CodeExecutor for PistonClient {
    async fn execute(
        &self,
        language: &str,
        code: &str,
        stdin: &str,
    ) -> Result<ExecutionOutcome, ExecError> {
        let spec = self
            .registry
            .get(language)
            .ok_or_else(|| ExecError::UnsupportedLanguage(language.to_string()))?;

        // Cache hits make no remote call, so they must not consume a
        // rate-limit slot.
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(language, code, stdin) {
                tracing::debug!(language, "execution served from cache");
                return Ok(hit);
            }
        }

        if !self.limiter.try_acquire(language) {
            return Err(ExecError::RateLimited(language.to_string()));
        }

        let body = PistonRequest {
            language: language.to_string(),
            version: spec.version.clone(),
            files: vec![PistonFile {
                name: spec.filename.clone(),
                content: code.to_string(),
            }],
            stdin: stdin.to_string(),
            args: vec![],
            compile_timeout: self.compile_timeout_ms,
            run_timeout: self.run_timeout_ms,
            compile_memory_limit: -1,
            run_memory_limit: -1,
        };

        let start = Instant::now();
        let response = self
            .http
            .post(format!("{}/execute", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ExecError::Timeout(self.request_timeout_secs)
                } else {
                    ExecError::Transport(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status >= 300 {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<PistonErrorBody>(&text)
                .map(|b| b.message)
                .unwrap_or(text);
            return Err(ExecError::Remote { status, message });
        }

        let parsed: PistonResponse = response.json().await.map_err(|e| ExecError::Remote {
            status,
            message: format!("failed to parse response: {e}"),
        })?;
        let duration_seconds = start.elapsed().as_secs_f64();

        let outcome = ExecutionOutcome {
            compile_stderr: parsed
                .compile
                .map(|c| c.stderr)
                .filter(|s| !s.is_empty()),
            run_stdout: parsed.run.stdout,
            run_stderr: parsed.run.stderr,
            exit_code: parsed.run.code.unwrap_or(0),
            duration_seconds,
        };

        if let Some(cache) = &self.cache {
            cache.insert(language, code, stdin, outcome.clone());
        }

        Ok(outcome)
    }

    fn supported_languages(&self) -> Vec<String> {
        self.registry.keys().into_iter().map(String::from).collect()
    }
}
