use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const APP_NAME: &str = "csv-to-jira";

/// Jira's usual story-points field on Cloud instances.
pub const DEFAULT_SIZE_FIELD: &str = "customfield_10016";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub instances: HashMap<String, InstanceConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct InstanceConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub verify: Option<bool>,
    pub size_field: Option<String>,
}

/// Connection settings given on the command line; they win over the file.
#[derive(Debug, Default, Clone)]
pub struct InstanceOverrides {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub disable_certificate_verification: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedInstance {
    pub url: String,
    pub username: String,
    pub password: String,
    pub verify: bool,
    pub size_field: String,
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("config.toml")
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Load the config file; a missing file is an empty config.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    let config: AppConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

pub fn resolve_instance(
    config: &AppConfig,
    name: &str,
    overrides: &InstanceOverrides,
) -> Result<ResolvedInstance> {
    let instance = config.instances.get(name).cloned().unwrap_or_default();

    let Some(url) = overrides.url.clone().or(instance.url) else {
        bail!("Jira url not set; pass --instance-url or add `url` under [instances.{name}] in {}", config_path().display());
    };
    let Some(username) = overrides.username.clone().or(instance.username) else {
        bail!("Jira username not set; pass --username or add `username` under [instances.{name}]");
    };
    let Some(password) = overrides.password.clone().or(instance.password) else {
        bail!("No password or API token for {username} at {url}; pass --password, set JIRA_API_TOKEN or add `password` under [instances.{name}]");
    };
    let verify =
        !overrides.disable_certificate_verification && instance.verify.unwrap_or(true);

    Ok(ResolvedInstance {
        url,
        username,
        password,
        verify,
        size_field: instance
            .size_field
            .unwrap_or_else(|| DEFAULT_SIZE_FIELD.to_string()),
    })
}
