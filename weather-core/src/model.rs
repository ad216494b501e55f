use serde_json::Value;

/// What to look up: a coordinate pair or a free-text city name.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    Coordinates { lat: f64, lon: f64 },
    City(String),
}

impl WeatherQuery {
    /// Query parameters identifying the location, without credentials or units.
    pub fn location_params(&self) -> Vec<(&'static str, String)> {
        match self {
            WeatherQuery::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
            WeatherQuery::City(city) => vec![("q", city.clone())],
        }
    }
}

/// Raw provider answer: status code and body text, uninterpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    pub status: u16,
    pub body: String,
}

impl ProviderReply {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }

    pub fn json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}
