use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::constants::{ENV_BASE_URL, ENV_CONFIG, ENV_PILES_PATH, ENV_TAXON_PATH, ENV_TIMEOUT_SECS};

#[derive(Parser)]
#[command(name = "gobotany")]
#[command(version, about = "Go Botany filter and species query client", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Go Botany site URL
    #[arg(long, short = 'u', global = true, env = ENV_BASE_URL)]
    pub base_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = ENV_TIMEOUT_SECS)]
    pub timeout_secs: Option<u64>,

    /// Pile resource root path
    #[arg(long, global = true, env = ENV_PILES_PATH)]
    pub piles_path: Option<String>,

    /// Taxon search resource path
    #[arg(long, global = true, env = ENV_TAXON_PATH)]
    pub taxon_path: Option<String>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,
}

/// Parse a `name=value` argument
pub fn parse_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("Invalid pair '{}'. Expected name=value", s)),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Show a pile's character groups and default filters
    Info {
        /// Pile slug, e.g. woody-plants
        pile: String,
        /// Also load the default filters and their value domains
        #[arg(long)]
        defaults: bool,
    },
    /// Show the value domain of one character
    Values {
        pile: String,
        character: String,
        /// Character value type (TEXT or LENGTH)
        #[arg(long = "type", default_value = "TEXT")]
        value_type: String,
    },
    /// Ask the server for the most useful next filters
    Best {
        pile: String,
        /// Number of filters to choose
        #[arg(long)]
        count: Option<u32>,
        /// Restrict to a character group id (repeatable)
        #[arg(long = "group")]
        groups: Vec<u64>,
        /// Character short name to leave out (repeatable)
        #[arg(long = "exclude")]
        exclude: Vec<String>,
    },
    /// Run a filtered species query
    Query {
        pile: String,
        /// Server-side filter value, name=value (repeatable)
        #[arg(long = "filter", value_parser = parse_pair)]
        filters: Vec<(String, String)>,
        /// Client-side attribute match, attribute=value (repeatable)
        #[arg(long = "require", value_parser = parse_pair)]
        require: Vec<(String, String)>,
        /// Start from the pile's default filters
        #[arg(long)]
        defaults: bool,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub piles_path: Option<String>,
    pub taxon_path: Option<String>,
    pub config: Option<PathBuf>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Commands) {
    let cli = Cli::parse();
    let config = CliConfig {
        base_url: cli.base_url,
        timeout_secs: cli.timeout_secs,
        piles_path: cli.piles_path,
        taxon_path: cli.taxon_path,
        config: cli.config,
    };
    (config, cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        assert_eq!(
            parse_pair("leaf_shape=oval"),
            Ok(("leaf_shape".to_string(), "oval".to_string()))
        );
        assert_eq!(
            parse_pair("height = 10-20"),
            Ok(("height".to_string(), "10-20".to_string()))
        );
    }

    #[test]
    fn test_parse_pair_empty_value_allowed() {
        assert_eq!(
            parse_pair("habitat="),
            Ok(("habitat".to_string(), String::new()))
        );
    }

    #[test]
    fn test_parse_pair_rejects_malformed() {
        assert!(parse_pair("oval").is_err());
        assert!(parse_pair("=oval").is_err());
    }

    #[test]
    fn test_cli_query_args() {
        let cli = Cli::try_parse_from([
            "gobotany",
            "query",
            "woody-plants",
            "--filter",
            "leaf_shape=oval",
            "--require",
            "color=red",
            "--defaults",
        ])
        .unwrap();
        match cli.command {
            Commands::Query {
                pile,
                filters,
                require,
                defaults,
                json,
            } => {
                assert_eq!(pile, "woody-plants");
                assert_eq!(filters, vec![("leaf_shape".into(), "oval".into())]);
                assert_eq!(require, vec![("color".into(), "red".into())]);
                assert!(defaults);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_best_repeatable_args() {
        let cli = Cli::try_parse_from([
            "gobotany",
            "best",
            "ferns",
            "--count",
            "4",
            "--group",
            "1",
            "--group",
            "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Best { count, groups, .. } => {
                assert_eq!(count, Some(4));
                assert_eq!(groups, vec![1, 2]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
