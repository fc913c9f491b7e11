use crate::{
    Config, PlaceQuery, WeatherError, WeatherReading, provider::openweather::OpenWeatherClient,
};
use async_trait::async_trait;
use std::{fmt::Debug, time::Duration};

pub mod openweather;

/// Timeout applied by [`WeatherClient::fetch`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

#[async_trait]
pub trait WeatherClient: Send + Sync + Debug {
    /// Issues a single request for `query`, giving up after `timeout`.
    ///
    /// Never retries and never caches; every call goes to the provider.
    async fn fetch_weather(
        &self,
        query: &PlaceQuery,
        timeout: Duration,
    ) -> Result<WeatherReading, WeatherError>;

    async fn fetch(&self, query: &PlaceQuery) -> Result<WeatherReading, WeatherError> {
        self.fetch_weather(query, DEFAULT_TIMEOUT).await
    }
}

/// Construct an OpenWeather client from config (and the API key env override).
pub fn client_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    build_client(config.api_key(), config.base_url())
}

fn build_client(
    api_key: Option<String>,
    base_url: Option<&str>,
) -> anyhow::Result<OpenWeatherClient> {
    let api_key = api_key.ok_or_else(|| {
        anyhow::anyhow!(
            "No OpenWeather API key configured.\n\
                 Hint: run `cityweather configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    let client = match base_url {
        Some(url) => OpenWeatherClient::with_base_url(api_key, url),
        None => OpenWeatherClient::new(api_key),
    };

    Ok(client)
}
