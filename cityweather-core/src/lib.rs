//! Core library for the `cityweather` CLI.
//!
//! This crate defines:
//! - Weather lookup against OpenWeather by city name or coordinates
//! - A persisted favorites list over pluggable key-value storage
//! - Configuration handling and the shared domain models
//!
//! It is used by `cityweather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod favorites;
pub mod model;
pub mod provider;
pub mod storage;

pub use config::Config;
pub use error::{QueryError, StorageError, WeatherError};
pub use favorites::{FAVORITES_KEY, FavoritesStore};
pub use model::{FavoritesList, PlaceQuery, WeatherReading};
pub use provider::{
    DEFAULT_TIMEOUT, WeatherClient, client_from_config, openweather::OpenWeatherClient,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

pub use reqwest::StatusCode;
