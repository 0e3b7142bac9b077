//! Configuration Management
//!
//! Persistent CLI configuration, stored as JSON in the user config directory.

use crate::adapter::DEFAULT_MAX_PAGES;
use crate::gcp::auth;
use crate::gcp::location::region_of_zone;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_cache_ttl_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_pages() -> usize {
    DEFAULT_MAX_PAGES
}

/// User configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Project queried when none is given on the command line
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default)]
    pub zones: Vec<String>,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Page cap of list and search queries
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default)]
    pub include_in_development: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_id: None,
            regions: Vec::new(),
            zones: Vec::new(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            max_pages: default_max_pages(),
            include_in_development: false,
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcp-adapters").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("ignoring configuration at {:?}: {:#}", path, err);
                Self::default()
            },
        }
    }

    /// Load configuration from a file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(())
    }

    /// Get effective project (CLI > config > gcloud default)
    pub fn effective_project(&self, cli: Option<&str>) -> Result<String> {
        let project = cli
            .map(str::to_string)
            .or_else(|| self.project_id.clone())
            .or_else(auth::get_default_project)
            .context("No project configured. Pass --project or run 'gcloud config set project'")?;

        if !auth::validate_project_id(&project) {
            anyhow::bail!("Invalid project ID: {}", project);
        }
        Ok(project)
    }

    /// Get effective zones (CLI > config > gcloud default)
    pub fn effective_zones(&self, cli: &[String]) -> Vec<String> {
        if !cli.is_empty() {
            return cli.to_vec();
        }
        if !self.zones.is_empty() {
            return self.zones.clone();
        }
        auth::get_default_zone().into_iter().collect()
    }

    /// Get effective regions (CLI > config > regions of the zones > gcloud default)
    pub fn effective_regions(&self, cli: &[String], zones: &[String]) -> Vec<String> {
        if !cli.is_empty() {
            return cli.to_vec();
        }
        if !self.regions.is_empty() {
            return self.regions.clone();
        }

        let mut regions: Vec<String> = Vec::new();
        for region in zones.iter().map(|zone| region_of_zone(zone)) {
            if !regions.contains(&region) {
                regions.push(region);
            }
        }
        if regions.is_empty() {
            regions.extend(auth::get_default_region());
        }
        regions
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Record the locations of this run
    pub fn remember(&mut self, project_id: &str, regions: &[String], zones: &[String]) {
        self.project_id = Some(project_id.to_string());
        self.regions = regions.to_vec();
        self.zones = zones.to_vec();
    }
}
