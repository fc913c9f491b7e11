use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use cityweather_core::{
    Config, FavoritesStore, FileStore, OpenWeatherClient, PlaceQuery, StorageError,
    WeatherClient, WeatherError, WeatherReading, client_from_config,
};
use tokio::task::JoinSet;

use crate::format;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "cityweather", version, about = "Current weather and favorite cities")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure the OpenWeather API key and request timeout.
    Configure,

    /// Show current weather for a city or a coordinate pair.
    Show {
        /// City name, e.g. "Paris".
        #[arg(required_unless_present = "lat")]
        city: Option<String>,

        /// Latitude in degrees, -90..=90.
        #[arg(long, requires = "lon", conflicts_with = "city", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in degrees, -180..=180.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Request timeout; defaults to the configured value (5000 ms).
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Add the returned place to favorites.
        #[arg(long)]
        save: bool,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: FavoritesCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum FavoritesCommand {
    /// List saved cities.
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Save a city name.
    Add { city: String },

    /// Remove a city name.
    Remove { city: String },

    /// Remove every saved city.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Show current weather for every saved city.
    Weather {
        #[arg(long)]
        timeout_ms: Option<u64>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::Show {
                city,
                lat,
                lon,
                timeout_ms,
                save,
                format,
            } => {
                let query = place_query(city.as_deref(), lat, lon)?;
                show(query, timeout_ms, save, format).await
            }
            Command::Favorites { action } => favorites(action).await,
        }
    }
}

/// City input is trimmed here; the core sends names untouched.
fn place_query(
    city: Option<&str>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> anyhow::Result<PlaceQuery> {
    let query = match (city, lat, lon) {
        (Some(city), _, _) => PlaceQuery::by_name(city.trim())?,
        (None, Some(lat), Some(lon)) => PlaceQuery::by_coordinates(lat, lon)?,
        _ => bail!("Provide a city name or both --lat and --lon"),
    };
    Ok(query)
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load()?;

    let api_key = inquire::Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_display_mode(inquire::PasswordDisplayMode::Masked)
        .prompt()
        .context("Failed to read API key")?;

    let timeout_ms = inquire::CustomType::<u64>::new("Request timeout (ms):")
        .with_default(config.timeout().as_millis() as u64)
        .prompt()
        .context("Failed to read timeout")?;

    config.set_api_key(api_key.trim().to_string());
    config.openweather.timeout_ms = Some(timeout_ms);

    let path = config.save()?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

fn open_favorites(config: &Config) -> anyhow::Result<FavoritesStore<FileStore>> {
    Ok(FavoritesStore::new(FileStore::new(config.data_dir()?)))
}

fn timeout_for(config: &Config, timeout_ms: Option<u64>) -> Duration {
    timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.timeout())
}

async fn show(
    query: PlaceQuery,
    timeout_ms: Option<u64>,
    save: bool,
    output: OutputFormat,
) -> anyhow::Result<()> {
    let config = Config::load()?;
    let client = client_from_config(&config)?;

    let reading = client
        .fetch_weather(&query, timeout_for(&config, timeout_ms))
        .await
        .map_err(|e| weather_error(&query, e))?;

    match output {
        OutputFormat::Text => println!("{}", format::render_reading(&reading)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reading)?),
    }

    if save {
        let store = open_favorites(&config)?;
        store.add(&reading.place_name).await.map_err(storage_error)?;
        if output == OutputFormat::Text {
            println!("Saved {} to favorites", reading.place_name);
        }
    }

    Ok(())
}

async fn favorites(action: FavoritesCommand) -> anyhow::Result<()> {
    let config = Config::load()?;
    let store = open_favorites(&config)?;

    match action {
        FavoritesCommand::List { format: output } => {
            let list = store.load().await.map_err(storage_error)?;
            match output {
                OutputFormat::Text => println!("{}", format::render_favorites(&list)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&list)?),
            }
        }
        FavoritesCommand::Add { city } => {
            let city = city.trim();
            if city.is_empty() {
                bail!("City name must not be empty");
            }
            let list = store.add(city).await.map_err(storage_error)?;
            println!("{}", format::render_favorites(&list));
        }
        FavoritesCommand::Remove { city } => {
            let list = store.remove(city.trim()).await.map_err(storage_error)?;
            println!("{}", format::render_favorites(&list));
        }
        FavoritesCommand::Clear { yes } => {
            let confirmed = yes
                || inquire::Confirm::new("Remove all favorites?")
                    .with_default(false)
                    .prompt()
                    .context("Failed to read confirmation")?;
            if !confirmed {
                println!("Aborted");
                return Ok(());
            }
            store.clear().await.map_err(storage_error)?;
            println!("Cleared favorites");
        }
        FavoritesCommand::Weather {
            timeout_ms,
            format: output,
        } => {
            let list = store.load().await.map_err(storage_error)?;
            if list.is_empty() {
                println!("{}", format::render_favorites(&list));
                return Ok(());
            }

            let client = client_from_config(&config)?;
            let results =
                fetch_all(&client, list.into_vec(), timeout_for(&config, timeout_ms)).await?;
            print_results(&results, output)?;
        }
    }

    Ok(())
}

type CityResult = (String, anyhow::Result<WeatherReading>);

/// Fetches every city concurrently; results come back in input order.
async fn fetch_all(
    client: &OpenWeatherClient,
    cities: Vec<String>,
    timeout: Duration,
) -> anyhow::Result<Vec<CityResult>> {
    let mut tasks = JoinSet::new();
    for (idx, city) in cities.into_iter().enumerate() {
        let client = client.clone();
        tasks.spawn(async move {
            let result = match PlaceQuery::by_name(city.as_str()) {
                Ok(query) => client
                    .fetch_weather(&query, timeout)
                    .await
                    .map_err(|e| weather_error(&query, e)),
                Err(e) => Err(e.into()),
            };
            (idx, city, result)
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("Weather lookup task failed")?);
    }
    results.sort_by_key(|(idx, ..)| *idx);

    Ok(results
        .into_iter()
        .map(|(_, city, result)| (city, result))
        .collect())
}

fn print_results(results: &[CityResult], output: OutputFormat) -> anyhow::Result<()> {
    match output {
        OutputFormat::Text => {
            for (city, result) in results {
                match result {
                    Ok(reading) => println!("{}\n", format::render_reading(reading)),
                    Err(e) => println!("{city}: {e:#}\n"),
                }
            }
        }
        OutputFormat::Json => {
            let entries: Vec<_> = results
                .iter()
                .map(|(city, result)| match result {
                    Ok(reading) => serde_json::json!({ "city": city, "reading": reading }),
                    Err(e) => serde_json::json!({ "city": city, "error": format!("{e:#}") }),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

/// Attach a user-facing message for each error kind.
fn weather_error(query: &PlaceQuery, err: WeatherError) -> anyhow::Error {
    let message = match &err {
        e if e.is_not_found() => format!("City not found: {query}"),
        e if e.is_timeout() => format!("Timed out fetching weather for {query}"),
        WeatherError::Network(_) => {
            format!("Could not reach the weather provider for {query}; check your connection")
        }
        WeatherError::Provider { status, .. } => {
            format!("Weather provider rejected the request for {query} ({status})")
        }
        WeatherError::Parse(_) => {
            format!("Unexpected response from the weather provider for {query}")
        }
    };
    anyhow::Error::new(err).context(message)
}

fn storage_error(err: StorageError) -> anyhow::Error {
    let message = match &err {
        StorageError::Corrupt { .. } => {
            "Favorites data is corrupt.\nHint: run `cityweather favorites clear` to reset it."
        }
        _ => "Failed to access favorites",
    };
    anyhow::Error::new(err).context(message)
}
