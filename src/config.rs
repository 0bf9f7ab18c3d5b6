//! Environment-driven configuration.
//!
//! Supported:
//! - MEDIREC_DATA_DIR (default `data`)
//! - MEDIREC_MODEL_DIR (unset: exemplar model from the training table)
//! - MEDIREC_DB_PATH (default `medirec.db`, `:memory:` for an ephemeral store)
//! - MEDIREC_HISTORY_LIMIT (default 50)
//! - MEDIREC_REQUIRE_SIGNED_MODELS (default false)
//! - MEDIREC_MODEL_SIGNING_PUBKEY_B64_FILE
//!
//! Invalid values fall back to the default with a warning.

use std::path::PathBuf;

pub const DATA_DIR_ENV: &str = "MEDIREC_DATA_DIR";
pub const MODEL_DIR_ENV: &str = "MEDIREC_MODEL_DIR";
pub const DB_PATH_ENV: &str = "MEDIREC_DB_PATH";
pub const HISTORY_LIMIT_ENV: &str = "MEDIREC_HISTORY_LIMIT";
pub const REQUIRE_SIGNED_MODELS_ENV: &str = "MEDIREC_REQUIRE_SIGNED_MODELS";
pub const PUBKEY_FILE_ENV: &str = "MEDIREC_MODEL_SIGNING_PUBKEY_B64_FILE";

const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Process configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub model_dir: Option<PathBuf>,
    pub db_path: String,
    pub history_limit: usize,
    pub require_signed_models: bool,
    pub pubkey_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            model_dir: None,
            db_path: "medirec.db".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            require_signed_models: false,
            pubkey_file: None,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}

impl AppConfig {
    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty(DATA_DIR_ENV) {
            cfg.data_dir = PathBuf::from(v);
        }
        cfg.model_dir = non_empty(MODEL_DIR_ENV).map(PathBuf::from);
        if let Some(v) = non_empty(DB_PATH_ENV) {
            cfg.db_path = v;
        }
        cfg.pubkey_file = non_empty(PUBKEY_FILE_ENV).map(PathBuf::from);

        if let Some(v) = non_empty(HISTORY_LIMIT_ENV) {
            match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => cfg.history_limit = n,
                _ => tracing::warn!(
                    "Ignoring invalid {}={:?}; using {}",
                    HISTORY_LIMIT_ENV,
                    v,
                    DEFAULT_HISTORY_LIMIT
                ),
            }
        }

        if let Some(v) = non_empty(REQUIRE_SIGNED_MODELS_ENV) {
            match parse_bool(&v) {
                Some(b) => cfg.require_signed_models = b,
                None => tracing::warn!(
                    "Ignoring invalid {}={:?}; signed models not required",
                    REQUIRE_SIGNED_MODELS_ENV,
                    v
                ),
            }
        }

        cfg
    }
}
