use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of login tokens. Default: 24.
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Account that cannot be edited or deleted through the user API.
    #[serde(default = "default_super_admin_username")]
    pub super_admin_username: String,
    /// When set, the super admin is created on startup if missing.
    #[serde(default)]
    pub super_admin_password: Option<String>,
}

fn default_token_ttl_hours() -> i64 {
    24
}
fn default_super_admin_username() -> String {
    "superadmin".into()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Filesystem,
    S3,
}

#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    #[serde(default)]
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_storage_backend")]
    pub backend: StorageBackend,
    /// Root directory of the filesystem backend. Default: "./data/blobs".
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,
    /// Largest accepted certificate upload in bytes. Default: 10 MiB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    /// Lifetime of signed certificate URLs. Default: 300.
    #[serde(default = "default_signed_url_ttl_secs")]
    pub signed_url_ttl_secs: u64,
    /// Externally reachable base URL, used to build filesystem download links.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default)]
    pub s3: Option<S3Config>,
}

fn default_storage_backend() -> StorageBackend {
    StorageBackend::Filesystem
}
fn default_base_path() -> PathBuf {
    PathBuf::from("./data/blobs")
}
fn default_max_upload_size() -> u64 {
    10 * 1024 * 1024
}
fn default_signed_url_ttl_secs() -> u64 {
    300
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:3000".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            base_path: default_base_path(),
            max_upload_size: default_max_upload_size(),
            signed_url_ttl_secs: default_signed_url_ttl_secs(),
            public_base_url: default_public_base_url(),
            s3: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// One of trace, debug, info, warn, error. Default: "info".
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., HKI__DATABASE__URL)
            .add_source(Environment::with_prefix("HKI").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
