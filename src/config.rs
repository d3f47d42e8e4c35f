//! Suite variables: which instance to test and which test groups to run.
//!
//! Variables come from a JSON file and may be overridden from the
//! environment, the latter taking precedence.

use crate::ckan_version::CkanVersion;
use crate::error::{Error, Result};
use crate::pattern_cache::DEFAULT_PATTERN_CACHE_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const ENV_API_BASE_URL: &str = "CKANFT_API_BASE_URL";
pub const ENV_USER_AGENT: &str = "CKANFT_USER_AGENT";
pub const ENV_CKAN_VERSION: &str = "CKANFT_CKAN_VERSION";
pub const ENV_INC_SYNC_SENSITIVE: &str = "CKANFT_INC_SYNC_SENSITIVE";
pub const ENV_INC_FIXED_DATA: &str = "CKANFT_INC_FIXED_DATA";

const DEFAULT_USER_AGENT: &str = "ckan-functional-tests";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteVariables {
    pub api_base_url: Option<String>,
    pub api_user_agent: String,
    pub ckan_version: Option<String>,
    /// Include tests sensitive to the instance's database and search index
    /// being in sync.
    pub inc_sync_sensitive: bool,
    /// Include tests comparing against stored fixed data.
    pub inc_fixed_data: bool,
    pub pattern_cache_capacity: usize,
}

impl Default for SuiteVariables {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_user_agent: DEFAULT_USER_AGENT.to_string(),
            ckan_version: None,
            inc_sync_sensitive: true,
            inc_fixed_data: true,
            pattern_cache_capacity: DEFAULT_PATTERN_CACHE_CAPACITY,
        }
    }
}

impl SuiteVariables {
    /// Read variables from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::config(format!("failed to read variables file {}: {err}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|err| {
            Error::config(format!("invalid variables file {}: {err}", path.display()))
        })
    }

    /// Load from `path` if given, then apply environment overrides.
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        let mut vars = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        vars.apply_env()?;
        Ok(vars)
    }

    /// Override fields from `CKANFT_*` environment variables.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Override fields from `lookup`, keyed by the `CKANFT_*` variable names.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_API_BASE_URL) {
            self.api_base_url = Some(url);
        }
        if let Some(agent) = lookup(ENV_USER_AGENT) {
            self.api_user_agent = agent;
        }
        if let Some(version) = lookup(ENV_CKAN_VERSION) {
            self.ckan_version = Some(version);
        }
        if let Some(raw) = lookup(ENV_INC_SYNC_SENSITIVE) {
            self.inc_sync_sensitive = parse_flag(ENV_INC_SYNC_SENSITIVE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_INC_FIXED_DATA) {
            self.inc_fixed_data = parse_flag(ENV_INC_FIXED_DATA, &raw)?;
        }
        Ok(())
    }

    /// The configured CKAN version, defaulting to the pre-2.9 shape.
    pub fn ckan_version(&self) -> Result<CkanVersion> {
        self.ckan_version
            .as_deref()
            .map_or(Ok(CkanVersion::default()), str::parse)
    }

    pub fn base_url(&self) -> Result<&str> {
        self.api_base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                Error::config(format!("api_base_url is not set (file or {ENV_API_BASE_URL})"))
            })
    }

    /// Base URLs for endpoints published under both `/api` and `/api/3`.
    pub fn base_urls_with_v3(&self) -> Result<[String; 2]> {
        let base = self.base_url()?.trim_end_matches('/');
        Ok([base.to_string(), format!("{base}/3")])
    }
}

fn parse_flag(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        other => Err(Error::config(format!("{name}: expected a boolean, got {other:?}"))),
    }
}
