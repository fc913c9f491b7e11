use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// What to look weather up for.
///
/// Built through [`PlaceQuery::by_name`] or [`PlaceQuery::by_coordinates`],
/// which reject values the provider could not interpret.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceQuery {
    ByName(String),
    ByCoordinates { latitude: f64, longitude: f64 },
}

impl PlaceQuery {
    /// The name is sent as-is; trimming is up to the caller.
    pub fn by_name(name: impl Into<String>) -> Result<Self, QueryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(QueryError::EmptyName);
        }
        Ok(PlaceQuery::ByName(name))
    }

    pub fn by_coordinates(latitude: f64, longitude: f64) -> Result<Self, QueryError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(QueryError::LatitudeOutOfRange(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(QueryError::LongitudeOutOfRange(longitude));
        }
        Ok(PlaceQuery::ByCoordinates { latitude, longitude })
    }
}

impl fmt::Display for PlaceQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceQuery::ByName(name) => f.write_str(name),
            PlaceQuery::ByCoordinates { latitude, longitude } => {
                write!(f, "{latitude},{longitude}")
            }
        }
    }
}

/// Current conditions for one place, in metric units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub place_name: String,
    pub temperature_celsius: f64,
    pub feels_like_celsius: f64,
    pub humidity_percent: u8,
    /// Provider category, e.g. "Clear" or "Rain".
    pub condition_main: String,
    pub condition_description: String,
}

/// Ordered, duplicate-free list of favorite city names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavoritesList(Vec<String>);

impl FavoritesList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact, case-sensitive match.
    pub fn contains(&self, city: &str) -> bool {
        self.0.iter().any(|c| c == city)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }

    /// Appends `city` unless already present. Returns whether the list changed.
    pub(crate) fn insert(&mut self, city: &str) -> bool {
        if self.contains(city) {
            return false;
        }
        self.0.push(city.to_string());
        true
    }

    /// Drops every entry equal to `city`. Returns whether the list changed.
    pub(crate) fn remove(&mut self, city: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c != city);
        self.0.len() != before
    }
}

impl From<Vec<String>> for FavoritesList {
    fn from(cities: Vec<String>) -> Self {
        Self(cities)
    }
}

impl<'a> IntoIterator for &'a FavoritesList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_name_rejects_empty() {
        assert_eq!(PlaceQuery::by_name(""), Err(QueryError::EmptyName));
    }

    #[test]
    fn by_name_keeps_input_untrimmed() {
        let q = PlaceQuery::by_name(" Paris ").unwrap();
        assert_eq!(q, PlaceQuery::ByName(" Paris ".to_string()));
    }

    #[test]
    fn by_coordinates_accepts_bounds() {
        assert!(PlaceQuery::by_coordinates(90.0, 180.0).is_ok());
        assert!(PlaceQuery::by_coordinates(-90.0, -180.0).is_ok());
    }

    #[test]
    fn by_coordinates_rejects_out_of_range() {
        assert_eq!(
            PlaceQuery::by_coordinates(90.5, 0.0),
            Err(QueryError::LatitudeOutOfRange(90.5))
        );
        assert_eq!(
            PlaceQuery::by_coordinates(0.0, -181.0),
            Err(QueryError::LongitudeOutOfRange(-181.0))
        );
    }

    #[test]
    fn by_coordinates_rejects_non_finite() {
        assert!(matches!(
            PlaceQuery::by_coordinates(f64::NAN, 0.0),
            Err(QueryError::LatitudeOutOfRange(_))
        ));
        assert!(matches!(
            PlaceQuery::by_coordinates(0.0, f64::INFINITY),
            Err(QueryError::LongitudeOutOfRange(_))
        ));
    }

    #[test]
    fn display_formats_both_variants() {
        assert_eq!(PlaceQuery::by_name("Rome").unwrap().to_string(), "Rome");
        assert_eq!(
            PlaceQuery::by_coordinates(48.85, 2.35).unwrap().to_string(),
            "48.85,2.35"
        );
    }

    #[test]
    fn favorites_insert_is_idempotent_and_case_sensitive() {
        let mut list = FavoritesList::new();
        assert!(list.insert("Paris"));
        assert!(!list.insert("Paris"));
        assert!(list.insert("paris"));
        assert_eq!(list.into_vec(), vec!["Paris".to_string(), "paris".to_string()]);
    }

    #[test]
    fn favorites_serialize_as_plain_array() {
        let list = FavoritesList::from(vec!["Paris".to_string(), "Rome".to_string()]);
        let json = serde_json::to_string(&list).unwrap();
        assert_eq!(json, r#"["Paris","Rome"]"#);
    }
}
