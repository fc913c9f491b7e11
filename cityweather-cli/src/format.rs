//! Human-friendly rendering of readings and favorites.

use std::fmt::Write as _;

use cityweather_core::{FavoritesList, WeatherReading};

pub fn condition_icon(condition_main: &str) -> &'static str {
    match condition_main.to_lowercase().as_str() {
        "clear" => "☀️",
        "clouds" => "☁️",
        "rain" => "🌧️",
        "thunderstorm" => "⛈️",
        "snow" => "❄️",
        "mist" | "haze" | "fog" => "🌫️",
        _ => "🌈",
    }
}

pub fn outfit_suggestion(temperature_celsius: f64) -> &'static str {
    if temperature_celsius < 0.0 {
        "⛄ Heavy coat, thermals, gloves, beanie"
    } else if temperature_celsius < 10.0 {
        "🧥 Warm jacket, sweater, long pants"
    } else if temperature_celsius < 20.0 {
        "👕 Light jacket, t-shirt, jeans"
    } else {
        "🩳 Shorts, t-shirt, sunglasses"
    }
}

/// Uppercases the first letter of every word: "light rain" -> "Light Rain".
fn capitalize_words(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Rounds half away from zero; going through i64 also turns -0 into 0.
fn round_degrees(value: f64) -> i64 {
    value.round() as i64
}

pub fn render_reading(reading: &WeatherReading) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        reading.place_name,
        condition_icon(&reading.condition_main)
    );
    let _ = writeln!(
        out,
        "  {}°C, {}",
        round_degrees(reading.temperature_celsius),
        capitalize_words(&reading.condition_description)
    );
    let _ = writeln!(
        out,
        "  Feels like: {}°C",
        round_degrees(reading.feels_like_celsius)
    );
    let _ = writeln!(out, "  Humidity: {}%", reading.humidity_percent);
    let _ = write!(
        out,
        "  Recommended outfit: {}",
        outfit_suggestion(reading.temperature_celsius)
    );
    out
}

pub fn render_favorites(list: &FavoritesList) -> String {
    if list.is_empty() {
        return "No favorites yet\nSave locations with `cityweather show <CITY> --save`"
            .to_string();
    }
    list.iter()
        .enumerate()
        .map(|(i, city)| format!("{:>2}. {city}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}
