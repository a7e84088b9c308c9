//! Client configuration and resource paths

use std::time::Duration;

use url::Url;

use crate::error::ClientError;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Public Go Botany site
pub const DEFAULT_BASE_URL: &str = "https://gobotany.nativeplanttrust.org";

/// Pile resource root (pile info, characters, character values)
pub const DEFAULT_PILES_PATH: &str = "/piles/";

/// Taxon search resource
pub const DEFAULT_TAXON_PATH: &str = "/taxon/";

/// Request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Number of filters requested by `query_best_filters` when unspecified
pub const DEFAULT_CHOOSE_BEST: u32 = 3;

// ============================================================================
// CLIENT CONFIG
// ============================================================================

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub piles_path: String,
    pub taxon_path: String,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            piles_path: DEFAULT_PILES_PATH.to_string(),
            taxon_path: DEFAULT_TAXON_PATH.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    /// Config for `base_url` with default paths and timeout
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let config = Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_paths(mut self, piles_path: &str, taxon_path: &str) -> Self {
        self.piles_path = normalize_dir(piles_path);
        self.taxon_path = normalize_dir(taxon_path);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        let url = Url::parse(&self.base_url).map_err(|e| {
            ClientError::Config(format!("invalid base_url '{}': {}", self.base_url, e))
        })?;
        if url.cannot_be_a_base() {
            return Err(ClientError::Config(format!(
                "base_url '{}' cannot be used as a base",
                self.base_url
            )));
        }
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "unsupported base_url scheme '{}'",
                url.scheme()
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::Config("timeout must be greater than 0".into()));
        }
        Ok(())
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            piles: normalize_dir(&self.piles_path),
            taxon: normalize_dir(&self.taxon_path),
        }
    }
}

/// Ensure a resource root starts and ends with a slash
fn normalize_dir(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", trimmed)
    }
}

// ============================================================================
// ENDPOINTS
// ============================================================================

/// Resource paths relative to the transport's base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    piles: String,
    taxon: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        ClientConfig::default().endpoints()
    }
}

impl Endpoints {
    /// `<piles><pile>` - pile metadata, identity lookup without trailing slash
    pub fn pile(&self, pile_slug: &str) -> String {
        format!("{}{}", self.piles, pile_slug)
    }

    /// `<piles><pile>/characters/`
    pub fn characters(&self, pile_slug: &str) -> String {
        format!("{}{}/characters/", self.piles, pile_slug)
    }

    /// `<piles><pile>/<character>/`
    pub fn character_values(&self, pile_slug: &str, character_short_name: &str) -> String {
        format!("{}{}/{}/", self.piles, pile_slug, character_short_name)
    }

    pub fn taxon(&self) -> &str {
        &self.taxon
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        let endpoints = Endpoints::default();
        assert_eq!(endpoints.pile("woody-plants"), "/piles/woody-plants");
        assert_eq!(
            endpoints.characters("woody-plants"),
            "/piles/woody-plants/characters/"
        );
        assert_eq!(
            endpoints.character_values("woody-plants", "leaf_length"),
            "/piles/woody-plants/leaf_length/"
        );
        assert_eq!(endpoints.taxon(), "/taxon/");
    }

    #[test]
    fn test_custom_paths_normalized() {
        let config = ClientConfig::default().with_paths("api/piles", "/api/taxon");
        let endpoints = config.endpoints();
        assert_eq!(endpoints.pile("ferns"), "/api/piles/ferns");
        assert_eq!(endpoints.taxon(), "/api/taxon/");
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        let err = ClientConfig::new("not a url").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn test_new_rejects_non_http_scheme() {
        let err = ClientConfig::new("ftp://example.org").unwrap_err();
        assert!(err.to_string().contains("unsupported base_url scheme"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = ClientConfig::default().with_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_new_accepts_local_server() {
        let config = ClientConfig::new("http://127.0.0.1:8000").unwrap();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }
}
