use super::portainer::PortainerSettings;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "portdeck.toml";
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../config/default_portdeck.toml");

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BIND: &str = "0.0.0.0:8000";
pub const DEFAULT_RESERVED_NAMES: &[&str] = &["portainer"];

pub fn default_config_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".config/portdeck")
}

pub fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    fs::create_dir_all(config_dir).with_context(|| format!("creating {:?}", config_dir))
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct FilterConfig {
    pub reserved_names: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct PortainerConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub endpoint_id: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub portainer: PortainerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AppConfig {
    /// Merges another AppConfig into self.
    /// Values from `other` overwrite values in `self` if present.
    pub fn merge(&mut self, other: AppConfig) {
        if let Some(url) = other.dashboard.base_url {
            self.dashboard.base_url = Some(url);
        }
        if let Some(secs) = other.dashboard.timeout_secs {
            self.dashboard.timeout_secs = Some(secs);
        }
        // reserved names replace rather than append, so a project can un-hide a container
        if let Some(names) = other.filter.reserved_names {
            self.filter.reserved_names = Some(names);
        }
        if let Some(url) = other.portainer.url {
            self.portainer.url = Some(url);
        }
        if let Some(username) = other.portainer.username {
            self.portainer.username = Some(username);
        }
        if let Some(password) = other.portainer.password {
            self.portainer.password = Some(password);
        }
        if let Some(endpoint) = other.portainer.endpoint_id {
            self.portainer.endpoint_id = Some(endpoint);
        }
        if let Some(bind) = other.server.bind {
            self.server.bind = Some(bind);
        }
    }

    /// Applies the `PORTAINER_*` / `ENDPOINT_ID` variables on top of the file values
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("PORTAINER_URL") {
            self.portainer.url = Some(url);
        }
        if let Some(username) = non_empty("PORTAINER_USERNAME") {
            self.portainer.username = Some(username);
        }
        if let Some(password) = non_empty("PORTAINER_PASSWORD") {
            self.portainer.password = Some(password);
        }
        if let Some(endpoint) = non_empty("ENDPOINT_ID") {
            self.portainer.endpoint_id = Some(endpoint);
        }
    }

    pub fn api_url(&self) -> &str {
        self.dashboard.base_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.dashboard.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }

    pub fn reserved_names(&self) -> Vec<String> {
        match &self.filter.reserved_names {
            Some(names) => names.clone(),
            None => DEFAULT_RESERVED_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let bind = self.server.bind.as_deref().unwrap_or(DEFAULT_BIND);
        bind.parse::<SocketAddr>()
            .with_context(|| format!("invalid bind address '{bind}'"))
    }

    pub fn portainer_settings(&self) -> Result<PortainerSettings> {
        let p = &self.portainer;
        let (Some(url), Some(username), Some(password), Some(endpoint_id)) = (
            p.url.clone(),
            p.username.clone(),
            p.password.clone(),
            p.endpoint_id.clone(),
        ) else {
            bail!(
                "Portainer is not configured: set url, username, password and endpoint_id under [portainer] or via PORTAINER_URL, PORTAINER_USERNAME, PORTAINER_PASSWORD, ENDPOINT_ID"
            );
        };

        Ok(PortainerSettings {
            url,
            username,
            password,
            endpoint_id,
        })
    }
}

fn read_config_file(path: &Path) -> Result<Option<AppConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    let config = toml::from_str(&content).with_context(|| format!("parsing {:?}", path))?;
    debug!("Loaded config from {:?}", path);
    Ok(Some(config))
}

/// Loads `portdeck.toml` from the config dir, then merges the one in `project_dir` over it
pub fn load_app_config(config_dir: &Path, project_dir: &Path) -> Result<AppConfig> {
    let mut app_config = read_config_file(&config_dir.join(CONFIG_FILE_NAME))?.unwrap_or_default();

    let local_path = project_dir.join(CONFIG_FILE_NAME);
    if local_path != config_dir.join(CONFIG_FILE_NAME) {
        if let Some(local) = read_config_file(&local_path)? {
            app_config.merge(local);
        }
    }

    Ok(app_config)
}

/// Full resolution used by the binary: files first, process environment last
pub fn load_config(config_dir: &Path, project_dir: &Path) -> Result<AppConfig> {
    let mut app_config = load_app_config(config_dir, project_dir)?;
    app_config.apply_env(|key| std::env::var(key).ok());
    Ok(app_config)
}

/// Writes the default config unless one already exists. Returns whether a file was written.
pub fn install_default_config(target_dir: &Path) -> Result<bool> {
    ensure_config_dir(target_dir)?;

    let target = target_dir.join(CONFIG_FILE_NAME);
    if target.exists() {
        return Ok(false);
    }

    fs::write(&target, DEFAULT_CONFIG_TOML)
        .with_context(|| format!("writing template to {:?}", target))?;
    Ok(true)
}
