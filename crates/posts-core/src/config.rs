use std::collections::BTreeMap;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8787;
pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_DATABASE_URL: &str = "file:./db.sqlite";
/// Placeholder host the relay targets when `MAIN_WORKER_URL` is unset.
pub const DEFAULT_MAIN_WORKER_URL: &str = "http://127.0.0.1:8787";
pub const DEFAULT_CRON: &str = "* * * * *";
pub const DEFAULT_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_D1_API_BASE: &str = "https://api.cloudflare.com/client/v4";
/// Name of the runtime binding that carries the managed database.
pub const DB_BINDING: &str = "DB";

/// Top-level config (posts.toml + POSTS_* env overrides + DATABASE_URL / MAIN_WORKER_URL).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostsConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Runtime bindings handed to every execution context, keyed by binding name.
    #[serde(default)]
    pub bindings: BTreeMap<String, D1BindingConfig>,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub triggers: TriggersConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

/// Which record store the process talks to. Chosen once at startup.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    /// File-backed SQLite at `database.url`.
    #[default]
    Local,
    /// Cloudflare D1 reached through the `DB` binding.
    Managed,
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Backend::Local => write!(f, "local"),
            Backend::Managed => write!(f, "managed"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Local store location. Overridden by the `DATABASE_URL` env var.
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Apply the `posts` schema on startup (idempotent).
    #[serde(default = "bool_true")]
    pub migrate_on_start: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            url: default_database_url(),
            migrate_on_start: true,
        }
    }
}

/// Credentials for one D1 database, reached over the Cloudflare HTTP API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct D1BindingConfig {
    pub account_id: String,
    pub database_id: String,
    pub api_token: String,
    #[serde(default = "default_d1_api_base")]
    pub api_base: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Run the trigger relay inside the gateway process.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cron")]
    pub cron: String,
    /// Base URL of the gateway receiving `/api/scheduled`.
    /// Overridden by the `MAIN_WORKER_URL` env var.
    #[serde(default = "default_main_worker_url")]
    pub main_worker_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cron: default_cron(),
            main_worker_url: default_main_worker_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Posts older than this many days are removed by a cleanup run.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Cron expression for the periodic cleanup job. Unset disables the job.
    #[serde(default)]
    pub schedule: Option<String>,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            retention_days: DEFAULT_RETENTION_DAYS,
            schedule: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggersConfig {
    /// When false the /trigger/* routes are not mounted.
    #[serde(default = "bool_true")]
    pub enabled: bool,
}

impl Default for TriggersConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}
fn default_d1_api_base() -> String {
    DEFAULT_D1_API_BASE.to_string()
}
fn default_cron() -> String {
    DEFAULT_CRON.to_string()
}
fn default_main_worker_url() -> String {
    DEFAULT_MAIN_WORKER_URL.to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_retention_days() -> u32 {
    DEFAULT_RETENTION_DAYS
}
fn bool_true() -> bool {
    true
}

impl PostsConfig {
    /// Load config from a TOML file with env var overrides.
    ///
    /// Precedence, lowest first:
    ///   1. built-in defaults
    ///   2. the TOML file (explicit path, else ./posts.toml; missing is fine)
    ///   3. POSTS_SECTION__KEY env vars
    ///   4. DATABASE_URL and MAIN_WORKER_URL
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        Self::figment(config_path)
            .extract()
            .map_err(|e| crate::error::PostsError::Config(e.to_string()))
    }

    pub fn figment(config_path: Option<&str>) -> Figment {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);
        tracing::debug!(path = %path, "resolving config");

        Figment::from(Serialized::defaults(PostsConfig::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("POSTS_").split("__"))
            .merge(
                Env::raw()
                    .only(&["DATABASE_URL"])
                    .map(|_| "database.url".into()),
            )
            .merge(
                Env::raw()
                    .only(&["MAIN_WORKER_URL"])
                    .map(|_| "relay.main_worker_url".into()),
            )
    }
}

fn default_config_path() -> String {
    std::env::var("POSTS_CONFIG").unwrap_or_else(|_| "posts.toml".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_file_or_env() {
        Jail::expect_with(|_jail| {
            let config: PostsConfig = PostsConfig::figment(Some("missing.toml")).extract()?;
            assert_eq!(config.gateway.port, DEFAULT_PORT);
            assert_eq!(config.database.backend, Backend::Local);
            assert_eq!(config.database.url, DEFAULT_DATABASE_URL);
            assert_eq!(config.relay.main_worker_url, DEFAULT_MAIN_WORKER_URL);
            assert_eq!(config.relay.cron, "* * * * *");
            assert_eq!(config.cleanup.retention_days, 30);
            assert!(config.cleanup.schedule.is_none());
            assert!(config.triggers.enabled);
            assert!(config.bindings.is_empty());
            Ok(())
        });
    }

    #[test]
    fn toml_file_then_env_overrides() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "posts.toml",
                r#"
                [gateway]
                port = 9000

                [database]
                backend = "managed"

                [bindings.DB]
                account_id = "acc"
                database_id = "db-1"
                api_token = "tok"

                [cleanup]
                retention_days = 7
                "#,
            )?;
            jail.set_env("POSTS_GATEWAY__BIND", "0.0.0.0");
            jail.set_env("DATABASE_URL", "file:/tmp/posts.sqlite");
            jail.set_env("MAIN_WORKER_URL", "https://posts.example.dev");

            let config: PostsConfig = PostsConfig::figment(Some("posts.toml")).extract()?;
            assert_eq!(config.gateway.port, 9000);
            assert_eq!(config.gateway.bind, "0.0.0.0");
            assert_eq!(config.database.backend, Backend::Managed);
            assert_eq!(config.database.url, "file:/tmp/posts.sqlite");
            assert_eq!(config.relay.main_worker_url, "https://posts.example.dev");
            assert_eq!(config.cleanup.retention_days, 7);

            let db = config.bindings.get(DB_BINDING).expect("DB binding");
            assert_eq!(db.database_id, "db-1");
            assert_eq!(db.api_base, DEFAULT_D1_API_BASE);
            Ok(())
        });
    }

    #[test]
    fn malformed_file_is_config_error() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "[gateway]\nport = \"not a number\"")?;
            let err = PostsConfig::load(Some("bad.toml")).unwrap_err();
            assert_eq!(err.code(), "CONFIG_ERROR");
            Ok(())
        });
    }
}
