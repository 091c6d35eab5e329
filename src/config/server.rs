use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::auth::Role;
use crate::error::{Error, Result};

/// Page-size ceilings applied to list requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaginationLimits {
    /// Default page size when the request omits `limit`.
    pub default_limit: i64,
    /// Cap for anonymous and regular callers.
    pub default_max: i64,
    /// Cap for callers holding the admin role.
    pub admin_max: i64,
}

impl PaginationLimits {
    #[must_use]
    pub fn max_for(&self, role: Option<Role>) -> i64 {
        match role {
            Some(Role::Admin) => self.admin_max,
            _ => self.default_max,
        }
    }
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self {
            default_limit: 10,
            default_max: 100,
            admin_max: 1000,
        }
    }
}

/// An extra bearer token accepted alongside the built-in allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub user_id: i64,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub pagination: PaginationLimits,
    pub tokens: Vec<TokenEntry>,
}

impl ServerConfig {
    /// Builds the configuration from defaults, then the TOML file at `path` if
    /// given, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e.message())))
    }

    /// Overrides fields from `HOST`, `PORT`, `DATA_DIR`,
    /// `DEFAULT_MAX_PAGINATION_LIMIT` and `ADMIN_MAX_PAGINATION_LIMIT`.
    pub fn apply_env<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = get("HOST").filter(|v| !v.is_empty()) {
            self.host = host;
        }
        if let Some(port) = get("PORT").filter(|v| !v.is_empty()) {
            self.port = parse_env("PORT", &port)?;
        }
        if let Some(dir) = get("DATA_DIR").filter(|v| !v.is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(max) = get("DEFAULT_MAX_PAGINATION_LIMIT").filter(|v| !v.is_empty()) {
            self.pagination.default_max = parse_limit("DEFAULT_MAX_PAGINATION_LIMIT", &max)?;
        }
        if let Some(max) = get("ADMIN_MAX_PAGINATION_LIMIT").filter(|v| !v.is_empty()) {
            self.pagination.admin_max = parse_limit("ADMIN_MAX_PAGINATION_LIMIT", &max)?;
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("sintropia.db")
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{key} has an invalid value: {value:?}")))
}

fn parse_limit(key: &str, value: &str) -> Result<i64> {
    let limit: i64 = parse_env(key, value)?;
    if limit < 1 {
        return Err(Error::Config(format!("{key} must be at least 1")));
    }
    Ok(limit)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            data_dir: PathBuf::from("./data"),
            pagination: PaginationLimits::default(),
            tokens: Vec::new(),
        }
    }
}
