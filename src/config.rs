use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::pagination::DEFAULT_LIMIT;
use crate::scope_path;

const CONFIG_FILE: &str = "config.json";
const DEFAULT_DAV_PATH: &str = "/remote.php/dav";
const DEFAULT_BLACKLIST: &str = r"\.(part|filepart)$";
pub const DEFAULT_PREVIEW_CONCURRENCY: usize = 5;

pub const ENV_URL: &str = "DAVPICKER_URL";
pub const ENV_USER: &str = "DAVPICKER_USER";
pub const ENV_PASSWORD: &str = "DAVPICKER_PASSWORD";
pub const ENV_REQUEST_TOKEN: &str = "DAVPICKER_REQUEST_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    /// Server origin, e.g. `https://cloud.example.com`.
    pub server_url: String,
    pub dav_path: String,
    pub username: String,
    pub password: Option<String>,
    pub request_token: Option<String>,
    pub page_limit: u32,
    pub preview_concurrency: usize,
    pub blacklist_files_regex: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            dav_path: DEFAULT_DAV_PATH.to_string(),
            username: String::new(),
            password: None,
            request_token: None,
            page_limit: DEFAULT_LIMIT,
            preview_concurrency: DEFAULT_PREVIEW_CONCURRENCY,
            blacklist_files_regex: Some(DEFAULT_BLACKLIST.to_string()),
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "davpicker")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// Reads the config file; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let resolved = match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_path(),
        };
        let config = match resolved {
            Some(p) => Self::load_from(&p)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_URL) {
            self.server_url = url;
        }
        if let Some(user) = non_empty(ENV_USER) {
            self.username = user;
        }
        if let Some(password) = non_empty(ENV_PASSWORD) {
            self.password = Some(password);
        }
        if let Some(token) = non_empty(ENV_REQUEST_TOKEN) {
            self.request_token = Some(token);
        }
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.server_url.trim().is_empty() {
            return Err(AppError::Config(format!(
                "server url is not set (config file or {ENV_URL})"
            )));
        }
        reqwest::Url::parse(&self.server_url)
            .map_err(|e| AppError::Config(format!("invalid server url {}: {e}", self.server_url)))?;
        if self.username.trim().is_empty() {
            return Err(AppError::Config(format!(
                "username is not set (config file or {ENV_USER})"
            )));
        }
        if self.page_limit == 0 {
            return Err(AppError::Config("pageLimit must be positive".to_string()));
        }
        if self.preview_concurrency == 0 {
            return Err(AppError::Config(
                "previewConcurrency must be positive".to_string(),
            ));
        }
        self.blacklist()?;
        Ok(())
    }

    /// Path component of the DAV root, always with a leading and no trailing slash.
    pub fn dav_root_path(&self) -> String {
        let path = scope_path::normalize(&format!("/{}", self.dav_path.trim_start_matches('/')));
        if path == "/" {
            String::new()
        } else {
            path
        }
    }

    pub fn dav_root_url(&self) -> String {
        format!(
            "{}{}",
            self.server_url.trim_end_matches('/'),
            self.dav_root_path()
        )
    }

    /// Collection holding the user's files, relative to the DAV root.
    pub fn files_root(&self) -> String {
        format!("/files/{}", self.username)
    }

    pub fn blacklist(&self) -> Result<Option<Regex>, AppError> {
        self.blacklist_files_regex
            .as_deref()
            .filter(|pattern| !pattern.is_empty())
            .map(Regex::new)
            .transpose()
            .map_err(|e| AppError::Config(format!("invalid blacklist regex: {e}")))
    }
}
