// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths, log targets and identifiers)
pub const APP_NAME_LOWER: &str = "gobotany";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".gobotany";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "gobotany.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "GOBOTANY_CONFIG";

// =============================================================================
// Environment Variables - Logging
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "GOBOTANY_LOG";

// =============================================================================
// Environment Variables - API
// =============================================================================

/// Environment variable for the Go Botany site URL
pub const ENV_BASE_URL: &str = "GOBOTANY_BASE_URL";

/// Environment variable for the request timeout
pub const ENV_TIMEOUT_SECS: &str = "GOBOTANY_TIMEOUT_SECS";

/// Environment variable for the pile resource root
pub const ENV_PILES_PATH: &str = "GOBOTANY_PILES_PATH";

/// Environment variable for the taxon search resource
pub const ENV_TAXON_PATH: &str = "GOBOTANY_TAXON_PATH";

// =============================================================================
// Limits
// =============================================================================

/// Upper bound for the request timeout
pub const MAX_TIMEOUT_SECS: u64 = 600;

/// Upper bound for `best --count`
pub const MAX_CHOOSE_BEST: u32 = 50;
