//! Layered configuration for solder.
//!
//! Values are resolved in order, later layers winning:
//! 1. built-in defaults,
//! 2. a configuration file (TOML, YAML or JSON, picked by extension),
//! 3. `SOLDER_`-prefixed environment variables, with `__` separating
//!    nested keys (`SOLDER_SERVER__BIND=0.0.0.0:8080`).
//!
//! Paths left unset fall back to the platform data directory.

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "SOLDER_";
const CONFIG_FILE_NAME: &str = "solder.toml";
const DATABASE_FILE_NAME: &str = "solder.sqlite";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address the HTTP server listens on.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Externally reachable base URL; download links in manifests are built from it.
    #[serde(default = "default_public_url")]
    pub public_url: String,
}
impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind: default_bind(), public_url: default_public_url() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite database file.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: None, max_connections: default_max_connections() }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding uploaded logos and mod files.
    #[serde(default)]
    pub root: Option<PathBuf>,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_public_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "solder")
}

impl Config {
    /// Load configuration from an explicit file, or from the default file in
    /// the platform config directory when it exists.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let file = match file {
            Some(path) if !path.exists() => exn::bail!(ErrorKind::NotFound(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME)).filter(|p| p.exists()),
        };
        let config = Self::figment(file.as_deref())?.extract::<Self>().or_raise(|| ErrorKind::Invalid)?;
        config.finalize(project_dirs().as_ref().map(ProjectDirs::data_dir))
    }

    /// Build the layered provider without extracting it.
    pub fn figment(file: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            tracing::debug!(path = %path.display(), "loading configuration file");
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__")))
    }

    /// Fill unset paths from `data_dir` and validate the result.
    fn finalize(mut self, data_dir: Option<&Path>) -> Result<Self> {
        if let Some(data_dir) = data_dir {
            self.database.path.get_or_insert_with(|| data_dir.join(DATABASE_FILE_NAME));
            self.storage.root.get_or_insert_with(|| data_dir.join("storage"));
        }
        self.server.public_url = self.server.public_url.trim_end_matches('/').to_string();
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        self.bind_addr()?;
        let url = &self.server.public_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            exn::bail!(ErrorKind::Validation(format!("server.public_url `{url}` must be an http(s) URL")));
        }
        if self.database.max_connections == 0 {
            exn::bail!(ErrorKind::Validation("database.max_connections must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server
            .bind
            .parse::<SocketAddr>()
            .or_raise(|| ErrorKind::Validation(format!("server.bind `{}` is not a socket address", self.server.bind)))
    }

    /// Base URL under which stored artifacts are downloadable.
    pub fn download_url(&self) -> String {
        format!("{}/storage", self.server.public_url)
    }
}
