//! Client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GET {url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ClientError {
    pub fn decode(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            url: url.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let err = ClientError::Status {
            url: "http://localhost/taxon/".to_string(),
            status: reqwest::StatusCode::BAD_GATEWAY,
        };
        assert_eq!(
            err.to_string(),
            "GET http://localhost/taxon/ returned 502 Bad Gateway"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ClientError::Config("base_url required".to_string());
        assert_eq!(
            err.to_string(),
            "Client configuration error: base_url required"
        );
    }

    #[test]
    fn test_decode_error_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ClientError::decode("http://localhost/piles/woody-plants", source);
        assert!(
            err.to_string()
                .starts_with("Failed to decode response from http://localhost/piles/woody-plants")
        );
    }
}
