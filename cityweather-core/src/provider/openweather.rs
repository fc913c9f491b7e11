use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{PlaceQuery, WeatherError, WeatherReading};

use super::WeatherClient;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
}

/// Error body, e.g. `{"cod":"404","message":"city not found"}`.
#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: String,
}

#[async_trait]
impl WeatherClient for OpenWeatherClient {
    async fn fetch_weather(
        &self,
        query: &PlaceQuery,
        timeout: Duration,
    ) -> Result<WeatherReading, WeatherError> {
        let place: Vec<(&str, String)> = match query {
            PlaceQuery::ByName(name) => vec![("q", name.clone())],
            PlaceQuery::ByCoordinates { latitude, longitude } => {
                vec![("lat", latitude.to_string()), ("lon", longitude.to_string())]
            }
        };

        tracing::debug!(
            %query,
            timeout_ms = timeout.as_millis() as u64,
            "Requesting current weather"
        );

        let res = self
            .http
            .get(&self.base_url)
            .query(&place)
            .query(&[("units", "metric"), ("appid", self.api_key.as_str())])
            .timeout(timeout)
            .send()
            .await
            .map_err(WeatherError::Network)?;

        let status = res.status();
        let body = res.text().await.map_err(WeatherError::Network)?;

        if !status.is_success() {
            let message = serde_json::from_str::<OwErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| truncate_body(&body));
            tracing::warn!(%query, %status, %message, "OpenWeather request failed");
            return Err(WeatherError::Provider { status, message });
        }

        parse_current(&body)
    }
}

fn parse_current(body: &str) -> Result<WeatherReading, WeatherError> {
    let parsed: OwCurrentResponse = serde_json::from_str(body)
        .map_err(|e| WeatherError::Parse(format!("OpenWeather current JSON: {e}")))?;

    let condition = parsed.weather.into_iter().next().ok_or_else(|| {
        WeatherError::Parse("OpenWeather response contained no weather conditions".into())
    })?;

    if parsed.main.humidity > 100 {
        return Err(WeatherError::Parse(format!(
            "humidity {} is outside 0..=100",
            parsed.main.humidity
        )));
    }

    Ok(WeatherReading {
        place_name: parsed.name,
        temperature_celsius: parsed.main.temp,
        feels_like_celsius: parsed.main.feels_like,
        humidity_percent: parsed.main.humidity,
        condition_main: condition.main,
        condition_description: condition.description,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
