use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::params::DEFAULT_ROW_TAG;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub ingest: IngestConfig,
    pub warehouse: WarehouseConfig,
    pub aws: AwsConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `FEEDLOAD_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("FEEDLOAD_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            ingest: IngestConfig::from_env_profiled(p),
            warehouse: WarehouseConfig::from_env_profiled(p),
            aws: AwsConfig::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  ingest:      row_tag={}", self.ingest.row_tag);
        tracing::info!("  warehouse:   root={}", self.warehouse.root.display());
        tracing::info!(
            "  aws:         region={}, bucket={}, configured={}",
            self.aws.region,
            self.aws.s3_bucket.as_deref().unwrap_or("(none)"),
            self.aws.is_configured()
        );
    }
}

// ── Ingest ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// XML element whose instances become rows.
    pub row_tag: String,
}

impl IngestConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            row_tag: profiled_env_or(p, "ROW_TAG", DEFAULT_ROW_TAG),
        }
    }
}

// ── Warehouse ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Local root directory holding `<schema>/<table>/` trees.
    pub root: PathBuf,
}

impl WarehouseConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            root: PathBuf::from(profiled_env_or(p, "WAREHOUSE_DIR", "warehouse")),
        }
    }
}

// ── AWS / S3 ──────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_prefix: Option<String>,
    pub endpoint_url: Option<String>,
}

impl AwsConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            region: profiled_env_or(p, "AWS_REGION", "us-east-1"),
            access_key_id: profiled_env_opt(p, "AWS_ACCESS_KEY_ID"),
            secret_access_key: profiled_env_opt(p, "AWS_SECRET_ACCESS_KEY"),
            session_token: profiled_env_opt(p, "AWS_SESSION_TOKEN"),
            s3_bucket: profiled_env_opt(p, "S3_BUCKET"),
            s3_prefix: profiled_env_opt(p, "S3_PREFIX"),
            endpoint_url: profiled_env_opt(p, "AWS_ENDPOINT_URL"),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.access_key_id.is_some() && self.s3_bucket.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Keys are unique per test so parallel tests do not race on the process env.

    #[test]
    fn profiled_lookup_prefers_prefixed_key() {
        env::set_var("FLTEST_A_FLTEST_TAG", "record");
        env::set_var("FLTEST_TAG", "item");
        assert_eq!(
            profiled_env_or("FLTEST_A", "FLTEST_TAG", DEFAULT_ROW_TAG),
            "record"
        );
        env::remove_var("FLTEST_A_FLTEST_TAG");
        env::remove_var("FLTEST_TAG");
    }

    #[test]
    fn profiled_lookup_falls_back_to_plain_key() {
        env::set_var("FLTEST_PLAIN_KEY", "plain");
        assert_eq!(profiled_env_or("FLTEST_B", "FLTEST_PLAIN_KEY", "d"), "plain");
        env::remove_var("FLTEST_PLAIN_KEY");
    }

    #[test]
    fn empty_values_count_as_unset() {
        env::set_var("FLTEST_EMPTY_KEY", "");
        assert_eq!(profiled_env_or("", "FLTEST_EMPTY_KEY", "fallback"), "fallback");
        env::remove_var("FLTEST_EMPTY_KEY");
    }

    #[test]
    fn aws_needs_key_and_bucket() {
        let mut aws = AwsConfig::default();
        assert!(!aws.is_configured());
        aws.access_key_id = Some("AKIA".into());
        assert!(!aws.is_configured());
        aws.s3_bucket = Some("lake".into());
        assert!(aws.is_configured());
    }
}
