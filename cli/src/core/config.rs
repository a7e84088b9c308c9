use anyhow::{Context, Result};
use gobotany::ClientConfig;
use gobotany::config::{
    DEFAULT_BASE_URL, DEFAULT_CHOOSE_BEST, DEFAULT_PILES_PATH, DEFAULT_TAXON_PATH,
    DEFAULT_TIMEOUT_SECS,
};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::cli::CliConfig;
use super::constants::{APP_DOT_FOLDER, CONFIG_FILE_NAME, MAX_CHOOSE_BEST, MAX_TIMEOUT_SECS};
use crate::utils::file::expand_path;

// =============================================================================
// File Config
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ApiFileConfig {
    pub base_url: Option<String>,
    pub piles_path: Option<String>,
    pub taxon_path: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryFileConfig {
    pub choose_best: Option<u32>,
}

/// File-based configuration (JSON)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub api: Option<ApiFileConfig>,
    pub query: Option<QueryFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Names of top-level keys nothing reads
    fn unknown_fields(&self) -> Vec<&str> {
        match &self.extra {
            serde_json::Value::Object(map) => map.keys().map(|k| k.as_str()).collect(),
            _ => Vec::new(),
        }
    }

    fn warn_unknown_fields(&self) {
        let unknown = self.unknown_fields();
        if !unknown.is_empty() {
            tracing::warn!(
                fields = %unknown.join(", "),
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(api) = other.api {
            let current = self.api.get_or_insert_with(ApiFileConfig::default);
            if api.base_url.is_some() {
                tracing::trace!(base_url = ?api.base_url, "Merging api.base_url");
                current.base_url = api.base_url;
            }
            if api.piles_path.is_some() {
                tracing::trace!(piles_path = ?api.piles_path, "Merging api.piles_path");
                current.piles_path = api.piles_path;
            }
            if api.taxon_path.is_some() {
                tracing::trace!(taxon_path = ?api.taxon_path, "Merging api.taxon_path");
                current.taxon_path = api.taxon_path;
            }
            if api.timeout_secs.is_some() {
                tracing::trace!(timeout_secs = ?api.timeout_secs, "Merging api.timeout_secs");
                current.timeout_secs = api.timeout_secs;
            }
        }

        if let Some(query) = other.query {
            let current = self.query.get_or_insert_with(QueryFileConfig::default);
            if query.choose_best.is_some() {
                tracing::trace!(choose_best = ?query.choose_best, "Merging query.choose_best");
                current.choose_best = query.choose_best;
            }
        }
    }
}

// =============================================================================
// App Config
// =============================================================================

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ClientConfig,
    pub choose_best: u32,
}

impl AppConfig {
    /// Load configuration: profile file -> local or `--config` file -> CLI/env
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_with_profile(cli, get_profile_config_path())
    }

    pub fn load_with_profile(cli: &CliConfig, profile_path: Option<PathBuf>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Profile dir (~/.gobotany/gobotany.json), skipped if missing
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            let expanded = expand_path(&path.to_string_lossy());
            if !expanded.exists() {
                anyhow::bail!("Config file not found: {}", expanded.display());
            }
            Some(expanded)
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        let file_api = file_config.api.unwrap_or_default();
        let file_query = file_config.query.unwrap_or_default();

        // 3. Layer: defaults -> file config -> CLI/env overrides
        let base_url = cli
            .base_url
            .clone()
            .or(file_api.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let piles_path = cli
            .piles_path
            .clone()
            .or(file_api.piles_path)
            .unwrap_or_else(|| DEFAULT_PILES_PATH.to_string());
        let taxon_path = cli
            .taxon_path
            .clone()
            .or(file_api.taxon_path)
            .unwrap_or_else(|| DEFAULT_TAXON_PATH.to_string());
        let timeout_secs = cli
            .timeout_secs
            .or(file_api.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let choose_best = file_query.choose_best.unwrap_or(DEFAULT_CHOOSE_BEST);

        let config = Self {
            api: ClientConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                ..ClientConfig::default()
            }
            .with_paths(&piles_path, &taxon_path)
            .with_timeout(Duration::from_secs(timeout_secs)),
            choose_best,
        };
        config.validate()?;

        tracing::debug!(
            base_url = %config.api.base_url,
            timeout_secs,
            choose_best,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let timeout_secs = self.api.timeout.as_secs();
        if timeout_secs > MAX_TIMEOUT_SECS {
            anyhow::bail!(
                "Timeout of {}s exceeds the maximum of {}s",
                timeout_secs,
                MAX_TIMEOUT_SECS
            );
        }
        if self.choose_best == 0 || self.choose_best > MAX_CHOOSE_BEST {
            anyhow::bail!(
                "query.choose_best must be between 1 and {}, got {}",
                MAX_CHOOSE_BEST,
                self.choose_best
            );
        }
        self.api.validate().context("Invalid API configuration")?;
        Ok(())
    }
}

/// Get the profile config path (~/.gobotany/gobotany.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_merge_other_takes_precedence() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{"api": {"base_url": "https://a.example", "timeout_secs": 10}}"#,
        )
        .unwrap();
        let overlay: FileConfig =
            serde_json::from_str(r#"{"api": {"base_url": "https://b.example"}}"#).unwrap();
        base.merge(overlay);

        let api = base.api.unwrap();
        assert_eq!(api.base_url.as_deref(), Some("https://b.example"));
        assert_eq!(api.timeout_secs, Some(10));
    }

    #[test]
    fn test_unknown_fields_collected() {
        let config: FileConfig =
            serde_json::from_str(r#"{"api": {}, "apii": {}, "verbose": true}"#).unwrap();
        let mut unknown = config.unknown_fields();
        unknown.sort();
        assert_eq!(unknown, vec!["apii", "verbose"]);
    }

    #[test]
    fn test_layering_profile_file_cli() {
        let dir = tempfile::tempdir().unwrap();
        let profile = write_config(
            &dir,
            "profile.json",
            r#"{"api": {"base_url": "https://profile.example", "timeout_secs": 12},
                "query": {"choose_best": 5}}"#,
        );
        let local = write_config(
            &dir,
            "local.json",
            r#"{"api": {"base_url": "https://local.example", "piles_path": "api/piles"}}"#,
        );
        let cli = CliConfig {
            config: Some(local),
            timeout_secs: Some(20),
            ..CliConfig::default()
        };

        let config = AppConfig::load_with_profile(&cli, Some(profile)).unwrap();
        assert_eq!(config.api.base_url, "https://local.example");
        assert_eq!(config.api.piles_path, "/api/piles/");
        assert_eq!(config.api.taxon_path, DEFAULT_TAXON_PATH);
        assert_eq!(config.api.timeout, Duration::from_secs(20));
        assert_eq!(config.choose_best, 5);
    }

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let empty = write_config(&dir, "empty.json", "{}");
        let cli = CliConfig {
            config: Some(empty),
            ..CliConfig::default()
        };

        let config = AppConfig::load_with_profile(&cli, None).unwrap();
        assert_eq!(config.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.api.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(config.choose_best, DEFAULT_CHOOSE_BEST);
    }

    #[test]
    fn test_missing_cli_config_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let cli = CliConfig {
            config: Some(dir.path().join("nope.json")),
            ..CliConfig::default()
        };
        let err = AppConfig::load_with_profile(&cli, None).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let bad_best = write_config(&dir, "best.json", r#"{"query": {"choose_best": 0}}"#);
        let cli = CliConfig {
            config: Some(bad_best),
            ..CliConfig::default()
        };
        assert!(AppConfig::load_with_profile(&cli, None).is_err());

        let ok = write_config(&dir, "ok.json", "{}");
        let cli = CliConfig {
            config: Some(ok.clone()),
            base_url: Some("ftp://example.org".to_string()),
            ..CliConfig::default()
        };
        assert!(AppConfig::load_with_profile(&cli, None).is_err());

        let cli = CliConfig {
            config: Some(ok),
            timeout_secs: Some(0),
            ..CliConfig::default()
        };
        assert!(AppConfig::load_with_profile(&cli, None).is_err());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let broken = write_config(&dir, "broken.json", "{ not json");
        let cli = CliConfig {
            config: Some(broken),
            ..CliConfig::default()
        };
        let err = AppConfig::load_with_profile(&cli, None).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
