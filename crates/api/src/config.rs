use std::path::PathBuf;
use std::time::Duration;

use scrappy_core::runner::{EngineConfig, DEFAULT_TIMEOUT};

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the engine path and the token secret have defaults
/// suitable for local development. In production, override via environment
/// variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory where uploaded documents are staged before analysis.
    pub upload_dir: PathBuf,
    /// Maximum accepted upload size in bytes.
    pub max_file_size_bytes: usize,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Engine invocation configuration (interpreter, script, timeout).
    pub engine: EngineConfig,
}

/// Default maximum upload size in megabytes.
const DEFAULT_MAX_FILE_SIZE_MB: usize = 10;

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Required | Default         |
    /// |----------------------------|----------|-----------------|
    /// | `HOST`                     | no       | `0.0.0.0`       |
    /// | `PORT`                     | no       | `8000`          |
    /// | `CORS_ORIGINS`             | no       | `http://localhost:8000` |
    /// | `REQUEST_TIMEOUT_SECS`     | no       | `30`            |
    /// | `SCRAPPY_UPLOAD_DIR`       | no       | `temp_uploads`  |
    /// | `SCRAPPY_MAX_FILE_SIZE_MB` | no       | `10`            |
    /// | `SCRAPPY_ENGINE_PATH`      | **yes**  | --              |
    /// | `SCRAPPY_PYTHON`           | no       | `python3`       |
    /// | `SCRAPPY_JOB_TIMEOUT_SECS` | no       | `300`           |
    ///
    /// JWT settings are loaded by [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics if a required variable is missing or a value fails to parse,
    /// which is the desired behaviour -- misconfiguration should fail fast
    /// at startup.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:8000".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let upload_dir =
            PathBuf::from(std::env::var("SCRAPPY_UPLOAD_DIR").unwrap_or_else(|_| {
                "temp_uploads".into()
            }));

        let max_file_size_mb: usize = std::env::var("SCRAPPY_MAX_FILE_SIZE_MB")
            .unwrap_or_else(|_| DEFAULT_MAX_FILE_SIZE_MB.to_string())
            .parse()
            .expect("SCRAPPY_MAX_FILE_SIZE_MB must be a valid usize");

        let engine_path = PathBuf::from(
            std::env::var("SCRAPPY_ENGINE_PATH")
                .expect("SCRAPPY_ENGINE_PATH must be set in the environment"),
        );

        let interpreter =
            PathBuf::from(std::env::var("SCRAPPY_PYTHON").unwrap_or_else(|_| "python3".into()));

        let timeout = match std::env::var("SCRAPPY_JOB_TIMEOUT_SECS") {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .expect("SCRAPPY_JOB_TIMEOUT_SECS must be a valid u64"),
            ),
            Err(_) => DEFAULT_TIMEOUT,
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            upload_dir,
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            jwt: JwtConfig::from_env(),
            engine: EngineConfig {
                interpreter,
                engine_path,
                timeout,
            },
        }
    }
}
