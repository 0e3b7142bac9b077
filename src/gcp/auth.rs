//! GCP Authentication
//!
//! Bearer tokens come from Application Default Credentials (ADC), service
//! account keys or gcloud CLI credentials, or from a fixed token supplied by
//! the host environment.

use anyhow::{Context, Result};
use gcp_auth::TokenProvider;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Default scopes for GCP API access
pub const DEFAULT_SCOPES: &[&str] = &["https://www.googleapis.com/auth/cloud-platform"];

/// Tokens are considered stale this long before gcp_auth would expire them
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Lifetime assumed for a fresh token
const TOKEN_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// Application Default Credentials with a cached bearer token
#[derive(Clone)]
pub struct GcpCredentials {
    provider: Arc<dyn TokenProvider>,
    cached: Arc<RwLock<Option<(String, Instant)>>>,
}

impl std::fmt::Debug for GcpCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpCredentials").finish_non_exhaustive()
    }
}

impl GcpCredentials {
    /// Initialize Application Default Credentials
    pub async fn new() -> Result<Self> {
        let provider = gcp_auth::provider().await.context(
            "Failed to initialize GCP authentication. Run 'gcloud auth application-default login'",
        )?;

        Ok(Self {
            provider,
            cached: Arc::new(RwLock::new(None)),
        })
    }

    /// Access token for API calls, refreshed once the cached one goes stale
    pub async fn get_token(&self) -> Result<String> {
        if let Some((token, stale_at)) = self.cached.read().await.as_ref() {
            if Instant::now() < *stale_at {
                return Ok(token.clone());
            }
            tracing::debug!("Cached token is stale, fetching a new one");
        }

        let token = self
            .provider
            .token(DEFAULT_SCOPES)
            .await
            .context("Failed to get access token")?
            .as_str()
            .to_string();

        let stale_at = Instant::now() + TOKEN_LIFETIME - TOKEN_REFRESH_MARGIN;
        *self.cached.write().await = Some((token.clone(), stale_at));

        Ok(token)
    }
}

/// Where bearer tokens come from
#[derive(Clone, Debug)]
pub enum TokenSource {
    /// Application Default Credentials with token caching
    Adc(GcpCredentials),
    /// A fixed token, e.g. from `GCP_ACCESS_TOKEN` or a test harness
    Static(String),
    /// No authentication (emulators, mock servers)
    Anonymous,
}

impl TokenSource {
    /// Resolve a token source from the environment
    ///
    /// `GCP_ACCESS_TOKEN` wins over ADC so CI jobs can inject a token.
    pub async fn from_environment() -> Result<Self> {
        if let Ok(token) = std::env::var("GCP_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                tracing::debug!("Using access token from GCP_ACCESS_TOKEN");
                return Ok(Self::Static(token.trim().to_string()));
            }
        }
        Ok(Self::Adc(GcpCredentials::new().await?))
    }

    /// Current bearer token, if any
    pub async fn token(&self) -> Result<Option<String>> {
        match self {
            Self::Adc(credentials) => credentials.get_token().await.map(Some),
            Self::Static(token) => Ok(Some(token.clone())),
            Self::Anonymous => Ok(None),
        }
    }
}

/// Get the gcloud configuration directory
pub fn get_gcloud_config_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("CLOUDSDK_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|p| p.join("gcloud"))
}

/// Validate a GCP project ID format
/// Project IDs must be 6-30 characters, lowercase letters, digits, and hyphens
/// Must start with a letter and cannot end with a hyphen
pub fn validate_project_id(project: &str) -> bool {
    (6..=30).contains(&project.len())
        && project.starts_with(|c: char| c.is_ascii_lowercase())
        && !project.ends_with('-')
        && project
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// Find `key` inside `[section]` of an INI-style gcloud file
fn find_ini_value(content: &str, section: &str, key: &str) -> Option<String> {
    let header = format!("[{}]", section);
    let mut in_section = false;

    for line in content.lines().map(str::trim) {
        // Security: Skip comments and empty lines
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            in_section = line == header;
            continue;
        }
        if !in_section {
            continue;
        }
        if let Some((name, value)) = line.split_once('=') {
            if name.trim() == key {
                return Some(value.trim().to_string());
            }
        }
    }

    None
}

/// Read a property from the active gcloud configuration
fn read_gcloud_property(section: &str, key: &str) -> Option<String> {
    let config_dir = get_gcloud_config_dir()?;

    let active = std::fs::read_to_string(config_dir.join("active_config"))
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|_| "default".to_string());

    // Security: Validate config name to prevent path traversal
    if !active
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        tracing::warn!("Invalid characters in active_config name");
        return None;
    }

    let candidates = [
        config_dir
            .join("configurations")
            .join(format!("config_{}", active)),
        config_dir.join("properties"),
    ];

    candidates.iter().find_map(|path| {
        let content = std::fs::read_to_string(path).ok()?;
        find_ini_value(&content, section, key)
    })
}

/// Read the default project from the environment or gcloud configuration
/// Security: Validates project ID format before returning
pub fn get_default_project() -> Option<String> {
    for var in ["CLOUDSDK_CORE_PROJECT", "GOOGLE_CLOUD_PROJECT", "GCLOUD_PROJECT"] {
        if let Ok(project) = std::env::var(var) {
            if validate_project_id(&project) {
                return Some(project);
            }
            tracing::warn!("Invalid project ID format in {}", var);
        }
    }

    read_gcloud_property("core", "project").filter(|p| validate_project_id(p))
}

/// Get the default zone from the environment or gcloud configuration
pub fn get_default_zone() -> Option<String> {
    std::env::var("CLOUDSDK_COMPUTE_ZONE")
        .ok()
        .or_else(|| read_gcloud_property("compute", "zone"))
}

/// Get the default region from the environment or gcloud configuration
pub fn get_default_region() -> Option<String> {
    std::env::var("CLOUDSDK_COMPUTE_REGION")
        .ok()
        .or_else(|| read_gcloud_property("compute", "region"))
}
