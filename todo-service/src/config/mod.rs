use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const SERVICE_NAME: &str = "todo-service";

#[derive(Debug, Clone)]
pub struct TodoConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub bulk_replace: BulkReplaceConfig,
    pub cors: CorsConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Full connection string; may carry credentials. Unset outside prod means the
    /// service starts without a datastore and every todo request fails.
    pub uri: Option<Secret<String>>,
    /// Falls back to the database named in the URI, then `test`.
    pub database: Option<String>,
    pub app_name: String,
}

#[derive(Debug, Clone, Default)]
pub struct BulkReplaceConfig {
    /// Run delete-all + insert-many in one transaction. Needs a replica set.
    pub transactional: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Empty means any origin.
    pub allowed_origins: Vec<String>,
}

impl TodoConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env, PORT, LOG_LEVEL, OTLP_ENDPOINT)
        let common = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(TodoConfig {
            common,
            mongodb: MongoConfig {
                uri: optional_env("DB_HOST", is_prod)?.map(Secret::new),
                database: env::var("DB_NAME").ok().filter(|s| !s.is_empty()),
                app_name: SERVICE_NAME.to_string(),
            },
            bulk_replace: BulkReplaceConfig {
                transactional: parse_bool(&get_env(
                    "BULK_REPLACE_TRANSACTIONAL",
                    Some("false"),
                    is_prod,
                )?)?,
            },
            cors: CorsConfig {
                allowed_origins: parse_origins(&env::var("CORS_ALLOWED_ORIGINS").unwrap_or_default()),
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

/// Like `get_env` without a default, except that outside prod a missing value is `None`.
fn optional_env(key: &str, is_prod: bool) -> Result<Option<String>, AppError> {
    match env::var(key) {
        Ok(val) => Ok(Some(val)),
        Err(_) if is_prod => get_env(key, None, true).map(Some),
        Err(_) => Ok(None),
    }
}

fn parse_bool(value: &str) -> Result<bool, AppError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(AppError::ConfigError(anyhow::anyhow!(
            "Invalid boolean value: {}",
            other
        ))),
    }
}

/// Comma separated list; `*` anywhere means any origin.
fn parse_origins(value: &str) -> Vec<String> {
    let origins: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if origins.iter().any(|o| o == "*") {
        Vec::new()
    } else {
        origins
    }
}
