use crate::api::{errors::ApiError, AppState};
use axum::{
    extract::{RawQuery, State},
    Json,
};
use serde_json::Value;

/// `lat` and `lon` from a query string, first occurrence wins
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WeatherQuery {
    pub lat: Option<String>,
    pub lon: Option<String>,
}

impl WeatherQuery {
    /// Lenient parse: repeated keys keep their first value, unknown keys are ignored
    pub fn parse(raw: Option<&str>) -> Self {
        let mut query = Self::default();
        for (key, value) in url::form_urlencoded::parse(raw.unwrap_or_default().as_bytes()) {
            let slot = match key.as_ref() {
                "lat" => &mut query.lat,
                "lon" => &mut query.lon,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        query
    }
}

/// Relay current weather for the given coordinates from the upstream provider
pub async fn get_weather(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Value>, ApiError> {
    let Some(api_key) = state.config.weather.api_key.as_deref() else {
        tracing::error!("Weather API key not configured");
        return Err(ApiError::internal("Weather API key not configured on server"));
    };

    let query = WeatherQuery::parse(raw.as_deref());
    let (Some(lat), Some(lon)) = (non_empty(query.lat.as_deref()), non_empty(query.lon.as_deref()))
    else {
        return Err(ApiError::bad_request(
            "Latitude and longitude parameters are required",
        ));
    };

    let weather = state.weather.fetch(lat, lon, api_key).await?;
    Ok(Json(weather))
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
