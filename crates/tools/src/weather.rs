//! Weather tool — returns deterministic mock weather data.
//!
//! In production this would call a real weather API (OpenWeatherMap, etc.).
//! The mock returns plausible data derived from the location name so the
//! dialogue loop can be tested end-to-end without network access.

use async_trait::async_trait;
use std::collections::HashMap;

use augent_core::error::ToolError;
use augent_core::tool::{Tool, ToolResult};

const WEATHER_TERMS: &[&str] = &[
    "weather", "temperature", "forecast", "sunny", "rainy", "cloudy",
];

pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "weather"
    }

    fn description(&self) -> &str {
        "Looks up current weather conditions for a location. Returns temperature, conditions, humidity, and wind."
    }

    fn can_handle(&self, query: &str) -> bool {
        let lower = query.to_lowercase();
        WEATHER_TERMS.iter().any(|term| lower.contains(term))
    }

    async fn execute(
        &self,
        query: &str,
        parameters: &HashMap<String, String>,
    ) -> Result<ToolResult, ToolError> {
        let location = extract_location(query)
            .or_else(|| parameters.get("location").cloned())
            .filter(|l| !l.is_empty());

        let Some(location) = location else {
            return Ok(ToolResult::failure(
                "No location specified. Please provide a location.",
            ));
        };

        let units = parameters.get("units").map(String::as_str).unwrap_or("metric");
        let weather = mock_weather(&location, units);

        Ok(ToolResult::ok(format!(
            "The weather in {} is currently {} at {}{} with {}% humidity and {} km/h wind from the {}",
            weather.location,
            weather.conditions.to_lowercase(),
            weather.temperature,
            weather.units,
            weather.humidity,
            weather.wind_speed,
            weather.wind_direction,
        ))
        .with_data(
            "weather",
            serde_json::to_value(&weather).unwrap_or_default(),
        ))
    }
}

#[derive(serde::Serialize)]
struct WeatherData {
    location: String,
    temperature: f64,
    units: String,
    conditions: String,
    humidity: u32,
    wind_speed: f64,
    wind_direction: String,
}

/// Pull a location out of `in/for/at` phrasing; the word after the
/// preposition, minus trailing punctuation.
fn extract_location(query: &str) -> Option<String> {
    let mut words = query.split_whitespace();
    while let Some(word) = words.next() {
        let is_preposition = ["in", "for", "at"]
            .iter()
            .any(|p| word.eq_ignore_ascii_case(p));
        if !is_preposition {
            continue;
        }
        if let Some(next) = words.next() {
            let location = next.trim_matches(|c: char| c.is_ascii_punctuation());
            if !location.is_empty() {
                return Some(location.to_string());
            }
        }
    }
    None
}

/// Generate deterministic mock weather based on location name hash.
fn mock_weather(location: &str, units: &str) -> WeatherData {
    let hash: u32 = location
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));

    let conditions_list = [
        "Clear skies",
        "Partly cloudy",
        "Overcast",
        "Light rain",
        "Heavy rain",
        "Thunderstorms",
        "Snow",
        "Foggy",
    ];

    let wind_dirs = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

    let base_temp_c = ((hash % 40) as f64) - 5.0; // -5 to 35°C
    let (temperature, unit_label) = if units == "imperial" {
        (base_temp_c * 9.0 / 5.0 + 32.0, "°F")
    } else {
        (base_temp_c, "°C")
    };

    WeatherData {
        location: location.to_string(),
        temperature: (temperature * 10.0).round() / 10.0,
        units: unit_label.to_string(),
        conditions: conditions_list[(hash as usize / 7) % conditions_list.len()].to_string(),
        humidity: 30 + (hash % 60),
        wind_speed: ((hash % 30) as f64) + 5.0,
        wind_direction: wind_dirs[(hash as usize / 3) % wind_dirs.len()].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn can_handle_weather_queries() {
        let tool = WeatherTool;
        assert!(tool.can_handle("what's the weather in Oslo"));
        assert!(tool.can_handle("Temperature tomorrow?"));
        assert!(!tool.can_handle("calculate 2 + 2"));
    }

    #[test]
    fn extracts_location_from_prepositions() {
        assert_eq!(extract_location("weather in Tokyo"), Some("Tokyo".into()));
        assert_eq!(
            extract_location("forecast for London, please"),
            Some("London".into())
        );
        assert_eq!(extract_location("what's the weather"), None);
    }

    #[test]
    fn location_extraction_matches_whole_words_only() {
        // "Berlin" contains "in" but is not a preposition.
        assert_eq!(extract_location("weather Berlin today"), None);
        assert_eq!(extract_location("weather IN Oslo"), Some("Oslo".into()));
    }

    #[test]
    fn location_extraction_handles_multibyte_case_folding() {
        // 'İ' lowercases to a sequence with a different byte length; byte
        // offsets from a lowercased copy must not index the original.
        assert_eq!(extract_location("İİİ weather at X"), Some("X".into()));
        assert_eq!(
            extract_location("İstanbul weather in Ankara"),
            Some("Ankara".into())
        );
    }

    #[tokio::test]
    async fn multibyte_query_executes_cleanly() {
        let tool = WeatherTool;
        let result = tool
            .execute("İİİ weather at Paris", &HashMap::new())
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.result.contains("Paris"));
    }

    #[tokio::test]
    async fn lookup_returns_weather() {
        let tool = WeatherTool;
        let result = tool
            .execute("weather in Tokyo", &HashMap::new())
            .await
            .unwrap();

        assert!(result.success);
        assert!(result.result.contains("Tokyo"));
        assert!(result.data.contains_key("weather"));
    }

    #[tokio::test]
    async fn location_parameter_is_a_fallback() {
        let tool = WeatherTool;
        let mut params = HashMap::new();
        params.insert("location".to_string(), "Bergen".to_string());

        let result = tool
            .execute("how's the weather today", &params)
            .await
            .unwrap();
        assert!(result.success);
        assert!(result.result.contains("Bergen"));
    }

    #[tokio::test]
    async fn imperial_units() {
        let tool = WeatherTool;
        let mut params = HashMap::new();
        params.insert("units".to_string(), "imperial".to_string());

        let result = tool.execute("weather in Miami", &params).await.unwrap();
        assert!(result.result.contains("°F"));
    }

    #[tokio::test]
    async fn deterministic_results() {
        let tool = WeatherTool;
        let r1 = tool
            .execute("weather in London", &HashMap::new())
            .await
            .unwrap();
        let r2 = tool
            .execute("weather in London", &HashMap::new())
            .await
            .unwrap();
        assert_eq!(r1.result, r2.result);
    }

    #[tokio::test]
    async fn missing_location_fails_cleanly() {
        let tool = WeatherTool;
        let result = tool
            .execute("what's the weather like", &HashMap::new())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .contains("location"));
    }
}
