use std::path::PathBuf;

use reqwest::StatusCode;

/// Errors returned by [`crate::WeatherClient::fetch_weather`].
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    /// Timeout, DNS failure, refused connection or an unreadable body.
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("Provider returned {status}: {message}")]
    Provider { status: StatusCode, message: String },

    /// The provider answered 2xx but the body did not have the expected shape.
    #[error("Failed to parse provider response: {0}")]
    Parse(String),
}

impl WeatherError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, WeatherError::Network(e) if e.is_timeout())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WeatherError::Provider { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Errors returned by key-value storage and the favorites store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A record exists but does not deserialize into the expected shape.
    #[error("Stored value under '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        source: serde_json::Error,
    },

    #[error("Failed to serialize value for '{key}': {source}")]
    Serialize {
        key: String,
        source: serde_json::Error,
    },

    #[error("Invalid storage key '{0}': use ASCII letters, digits, '-' or '_'")]
    InvalidKey(String),

    /// For custom [`crate::KeyValueStore`] backends whose medium refuses
    /// the operation (quota, offline). The bundled stores never return it.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Rejected [`crate::PlaceQuery`] construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("City name must not be empty")]
    EmptyName,

    #[error("Latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("Longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}
