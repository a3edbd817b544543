use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::{
    condition::condition_label,
    config::UpstreamConfig,
    error::{LookupError, Upstream},
    model::{CurrentConditions, DailyForecastEntry, Location, WeatherReport},
};

use super::WeatherLookup;

/// Number of forecast days kept in a report.
pub const FORECAST_DAYS: usize = 3;

pub const CURRENT_FIELDS: [&str; 7] = [
    "temperature_2m",
    "relative_humidity_2m",
    "apparent_temperature",
    "precipitation",
    "weather_code",
    "wind_speed_10m",
    "wind_direction_10m",
];

pub const DAILY_FIELDS: [&str; 6] = [
    "temperature_2m_max",
    "temperature_2m_min",
    "precipitation_sum",
    "weather_code",
    "sunrise",
    "sunset",
];

/// Weather lookup backed by the Open-Meteo geocoding and forecast APIs.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    config: UpstreamConfig,
}

impl OpenMeteoProvider {
    pub fn new(config: UpstreamConfig) -> Self {
        Self { config }
    }

    async fn fetch_place(&self, http: &Client, city: &str) -> Result<GeoPlace, LookupError> {
        debug!(city, url = %self.config.geocoding_url, "geocoding city");

        let body = get_text(
            http.get(&self.config.geocoding_url).query(&[
                ("name", city),
                ("count", "1"),
                ("language", self.config.language.as_str()),
                ("format", "json"),
            ]),
            Upstream::Geocoding,
        )
        .await?;

        let parsed: GeoResponse =
            serde_json::from_str(&body).map_err(|e| LookupError::MalformedResponse {
                service: Upstream::Geocoding,
                cause: e.to_string(),
            })?;

        parsed
            .results
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| LookupError::CityNotFound(city.to_string()))
    }

    async fn fetch_forecast(
        &self,
        http: &Client,
        place: &GeoPlace,
    ) -> Result<OmForecastResponse, LookupError> {
        let latitude = place.latitude.to_string();
        let longitude = place.longitude.to_string();
        let current = CURRENT_FIELDS.join(",");
        let daily = DAILY_FIELDS.join(",");

        debug!(%latitude, %longitude, url = %self.config.forecast_url, "fetching forecast");

        let body = get_text(
            http.get(&self.config.forecast_url).query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", current.as_str()),
                ("daily", daily.as_str()),
                ("timezone", "auto"),
            ]),
            Upstream::Forecast,
        )
        .await?;

        serde_json::from_str(&body).map_err(|e| LookupError::MalformedResponse {
            service: Upstream::Forecast,
            cause: e.to_string(),
        })
    }
}

#[async_trait]
impl WeatherLookup for OpenMeteoProvider {
    async fn weather_for_city(&self, city: &str) -> Result<WeatherReport, LookupError> {
        // One client per lookup; its connections are released when it drops.
        let http = Client::builder()
            .build()
            .map_err(|e| LookupError::Upstream {
                service: Upstream::Geocoding,
                cause: error_chain(e),
            })?;

        let place = self.fetch_place(&http, city).await?;
        let forecast = self.fetch_forecast(&http, &place).await?;

        build_report(place, forecast)
    }
}

/// Send a GET and return the body, mapping transport errors and non-2xx statuses.
async fn get_text(
    request: reqwest::RequestBuilder,
    service: Upstream,
) -> Result<String, LookupError> {
    let res = request.send().await.map_err(|e| LookupError::Upstream {
        service,
        cause: error_chain(e),
    })?;

    let status = res.status();
    let body = res.text().await.map_err(|e| LookupError::Upstream {
        service,
        cause: format!("failed to read response body: {}", error_chain(e)),
    })?;

    if !status.is_success() {
        return Err(LookupError::UpstreamStatus {
            service,
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    Ok(body)
}

/// reqwest keeps the interesting part (refused, DNS, timeout) in `source()`.
fn error_chain(e: reqwest::Error) -> String {
    format!("{:#}", anyhow::Error::from(e))
}

fn build_report(place: GeoPlace, forecast: OmForecastResponse) -> Result<WeatherReport, LookupError> {
    let forecast_days = forecast
        .daily
        .into_entries(FORECAST_DAYS)
        .map_err(|cause| LookupError::MalformedResponse {
            service: Upstream::Forecast,
            cause,
        })?;

    let current = forecast.current;

    Ok(WeatherReport {
        location: Location {
            name: place.name,
            country: place.country,
            latitude: place.latitude,
            longitude: place.longitude,
            timezone: forecast.timezone,
        },
        current: CurrentConditions {
            temperature: current.temperature_2m,
            feels_like: current.apparent_temperature,
            humidity: current.relative_humidity_2m,
            wind_speed: current.wind_speed_10m,
            wind_direction: current.wind_direction_10m,
            precipitation: current.precipitation,
            condition: condition_label(current.weather_code).to_string(),
            condition_code: current.weather_code,
        },
        forecast: forecast_days,
    })
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    results: Option<Vec<GeoPlace>>,
}

#[derive(Debug, Deserialize)]
struct GeoPlace {
    name: String,
    #[serde(default)]
    country: String,
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    relative_humidity_2m: u8,
    apparent_temperature: f64,
    precipitation: f64,
    weather_code: i32,
    wind_speed_10m: f64,
    wind_direction_10m: u16,
}

/// Open-Meteo's daily block: one array per field, aligned by index.
#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    temperature_2m_max: Vec<f64>,
    temperature_2m_min: Vec<f64>,
    precipitation_sum: Vec<f64>,
    weather_code: Vec<i32>,
    sunrise: Vec<String>,
    sunset: Vec<String>,
}

impl OmDaily {
    /// Zip the parallel arrays into per-day records, keeping at most `limit` days.
    fn into_entries(self, limit: usize) -> Result<Vec<DailyForecastEntry>, String> {
        let days = self.time.len().min(limit);

        for (field, len) in [
            ("temperature_2m_max", self.temperature_2m_max.len()),
            ("temperature_2m_min", self.temperature_2m_min.len()),
            ("precipitation_sum", self.precipitation_sum.len()),
            ("weather_code", self.weather_code.len()),
            ("sunrise", self.sunrise.len()),
            ("sunset", self.sunset.len()),
        ] {
            if len < days {
                return Err(format!(
                    "daily.{field} has {len} entries, expected at least {days}"
                ));
            }
        }

        let entries = (0..days)
            .map(|i| DailyForecastEntry {
                date: self.time[i].clone(),
                max_temp: self.temperature_2m_max[i],
                min_temp: self.temperature_2m_min[i],
                precipitation: self.precipitation_sum[i],
                condition: condition_label(self.weather_code[i]).to_string(),
                sunrise: self.sunrise[i].clone(),
                sunset: self.sunset[i].clone(),
            })
            .collect();

        Ok(entries)
    }
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    timezone: String,
    current: OmCurrent,
    daily: OmDaily,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenMeteoProvider {
        OpenMeteoProvider::new(UpstreamConfig {
            geocoding_url: format!("{}/v1/search", server.uri()),
            forecast_url: format!("{}/v1/forecast", server.uri()),
            language: "ja".to_string(),
        })
    }

    fn tokyo() -> Value {
        json!({
            "results": [{
                "id": 1850147,
                "name": "東京",
                "country": "日本",
                "latitude": 35.6895,
                "longitude": 139.69171,
                "timezone": "Asia/Tokyo"
            }],
            "generationtime_ms": 0.5
        })
    }

    fn forecast(days: usize) -> Value {
        let dates: Vec<String> = (1..=days).map(|d| format!("2025-05-{d:02}")).collect();
        let codes = [0, 3, 61, 95, 2, 1, 45];

        json!({
            "latitude": 35.7,
            "longitude": 139.6875,
            "timezone": "Asia/Tokyo",
            "current": {
                "time": "2025-05-01T12:00",
                "temperature_2m": 21.4,
                "relative_humidity_2m": 56,
                "apparent_temperature": 20.9,
                "precipitation": 0.0,
                "weather_code": 2,
                "wind_speed_10m": 11.2,
                "wind_direction_10m": 135
            },
            "daily": {
                "time": dates,
                "temperature_2m_max": (0..days).map(|i| 20.0 + i as f64).collect::<Vec<_>>(),
                "temperature_2m_min": (0..days).map(|i| 12.0 + i as f64).collect::<Vec<_>>(),
                "precipitation_sum": (0..days).map(|i| i as f64 * 0.5).collect::<Vec<_>>(),
                "weather_code": codes[..days].to_vec(),
                "sunrise": dates.iter().map(|d| format!("{d}T04:50")).collect::<Vec<_>>(),
                "sunset": dates.iter().map(|d| format!("{d}T18:30")).collect::<Vec<_>>()
            }
        })
    }

    async fn mount(server: &MockServer, geo: ResponseTemplate, weather: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(geo)
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(weather)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn sends_expected_query_parameters() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "Tokyo"))
            .and(query_param("count", "1"))
            .and(query_param("language", "ja"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(tokyo()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "35.6895"))
            .and(query_param("longitude", "139.69171"))
            .and(query_param("current", CURRENT_FIELDS.join(",")))
            .and(query_param("daily", DAILY_FIELDS.join(",")))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast(7)))
            .expect(1)
            .mount(&server)
            .await;

        let report = provider_for(&server)
            .weather_for_city("Tokyo")
            .await
            .expect("lookup should succeed");

        assert_eq!(report.location.name, "東京");
        assert_eq!(report.location.country, "日本");
        assert_eq!(report.location.timezone, "Asia/Tokyo");
    }

    #[tokio::test]
    async fn shapes_current_conditions_and_keeps_three_days() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(tokyo()),
            ResponseTemplate::new(200).set_body_json(forecast(7)),
        )
        .await;

        let report = provider_for(&server).weather_for_city("Tokyo").await.unwrap();

        assert_eq!(report.current.temperature, 21.4);
        assert_eq!(report.current.feels_like, 20.9);
        assert_eq!(report.current.humidity, 56);
        assert_eq!(report.current.wind_speed, 11.2);
        assert_eq!(report.current.wind_direction, 135);
        assert_eq!(report.current.condition_code, 2);
        assert_eq!(report.current.condition, "Partly cloudy");

        assert_eq!(report.forecast.len(), 3);
        let dates: Vec<&str> = report.forecast.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, ["2025-05-01", "2025-05-02", "2025-05-03"]);

        let third = &report.forecast[2];
        assert_eq!(third.max_temp, 22.0);
        assert_eq!(third.min_temp, 14.0);
        assert_eq!(third.precipitation, 1.0);
        assert_eq!(third.condition, "Slight rain");
        assert_eq!(third.sunrise, "2025-05-03T04:50");
        assert_eq!(third.sunset, "2025-05-03T18:30");
    }

    #[tokio::test]
    async fn short_daily_series_is_not_padded() {
        for days in [0, 1, 2, 3] {
            let server = MockServer::start().await;
            mount(
                &server,
                ResponseTemplate::new(200).set_body_json(tokyo()),
                ResponseTemplate::new(200).set_body_json(forecast(days)),
            )
            .await;

            let report = provider_for(&server).weather_for_city("Tokyo").await.unwrap();
            assert_eq!(report.forecast.len(), days.min(FORECAST_DAYS));
        }
    }

    #[tokio::test]
    async fn empty_or_missing_results_is_city_not_found() {
        for geo in [json!({"results": []}), json!({"generationtime_ms": 0.2})] {
            let server = MockServer::start().await;
            mount(
                &server,
                ResponseTemplate::new(200).set_body_json(geo),
                ResponseTemplate::new(200).set_body_json(forecast(3)),
            )
            .await;

            let err = provider_for(&server)
                .weather_for_city("Atlantis City")
                .await
                .unwrap_err();

            assert!(matches!(err, LookupError::CityNotFound(ref c) if c == "Atlantis City"));
            assert!(err.to_string().contains("Atlantis City"));
        }
    }

    #[tokio::test]
    async fn non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(tokyo()),
            ResponseTemplate::new(503).set_body_string("service unavailable"),
        )
        .await;

        let err = provider_for(&server).weather_for_city("Tokyo").await.unwrap_err();

        match err {
            LookupError::UpstreamStatus { service, status, ref body } => {
                assert_eq!(service, Upstream::Forecast);
                assert_eq!(status, 503);
                assert_eq!(body, "service unavailable");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unparsable_body_is_malformed_response() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_string("<html>oops</html>"),
            ResponseTemplate::new(200).set_body_json(forecast(3)),
        )
        .await;

        let err = provider_for(&server).weather_for_city("Tokyo").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::MalformedResponse { service: Upstream::Geocoding, .. }
        ));
        assert!(err.to_string().starts_with("malformed geocoding response: "));
    }

    #[tokio::test]
    async fn misaligned_daily_arrays_are_malformed() {
        let mut body = forecast(3);
        body["daily"]["sunset"] = json!(["2025-05-01T18:30"]);

        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(tokyo()),
            ResponseTemplate::new(200).set_body_json(body),
        )
        .await;

        let err = provider_for(&server).weather_for_city("Tokyo").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::MalformedResponse { service: Upstream::Forecast, .. }
        ));
        assert!(err.to_string().contains("daily.sunset"));
    }

    #[tokio::test]
    async fn unknown_weather_code_is_labelled_unknown() {
        let mut body = forecast(3);
        body["current"]["weather_code"] = json!(42);

        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(tokyo()),
            ResponseTemplate::new(200).set_body_json(body),
        )
        .await;

        let report = provider_for(&server).weather_for_city("Tokyo").await.unwrap();
        assert_eq!(report.current.condition_code, 42);
        assert_eq!(report.current.condition, "unknown");
    }

    #[tokio::test]
    async fn identical_upstream_answers_give_identical_reports() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(tokyo()),
            ResponseTemplate::new(200).set_body_json(forecast(5)),
        )
        .await;

        let provider = provider_for(&server);
        let first = provider.weather_for_city("Tokyo").await.unwrap();
        let second = provider.weather_for_city("Tokyo").await.unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn connection_failure_is_upstream_error() {
        let provider = OpenMeteoProvider::new(UpstreamConfig {
            geocoding_url: "http://127.0.0.1:1/v1/search".to_string(),
            ..UpstreamConfig::default()
        });

        let err = provider.weather_for_city("Tokyo").await.unwrap_err();
        assert!(matches!(
            err,
            LookupError::Upstream { service: Upstream::Geocoding, .. }
        ));

        let message = err.to_string();
        assert!(message.starts_with("geocoding request failed: "));
        assert!(
            message.to_lowercase().contains("connection refused"),
            "root cause missing from: {message}"
        );
    }

    #[tokio::test]
    async fn geocoding_status_error_skips_forecast() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(forecast(3)))
            .expect(0)
            .mount(&server)
            .await;

        let err = provider_for(&server).weather_for_city("Tokyo").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::UpstreamStatus { service: Upstream::Geocoding, status: 500, .. }
        ));
        assert_eq!(err.to_string(), "geocoding API error: 500: internal error");
    }

    #[tokio::test]
    async fn unparsable_forecast_is_malformed_response() {
        let server = MockServer::start().await;
        mount(
            &server,
            ResponseTemplate::new(200).set_body_json(tokyo()),
            ResponseTemplate::new(200).set_body_string("{\"timezone\": \"Asia/Tok"),
        )
        .await;

        let err = provider_for(&server).weather_for_city("Tokyo").await.unwrap_err();

        assert!(matches!(
            err,
            LookupError::MalformedResponse { service: Upstream::Forecast, .. }
        ));
        assert!(err.to_string().starts_with("malformed forecast response: "));
    }

    #[tokio::test]
    async fn forecast_without_expected_blocks_is_malformed() {
        for block in ["current", "daily"] {
            let mut body = forecast(3);
            body.as_object_mut().unwrap().remove(block);

            let server = MockServer::start().await;
            mount(
                &server,
                ResponseTemplate::new(200).set_body_json(tokyo()),
                ResponseTemplate::new(200).set_body_json(body),
            )
            .await;

            let err = provider_for(&server).weather_for_city("Tokyo").await.unwrap_err();

            assert!(matches!(
                err,
                LookupError::MalformedResponse { service: Upstream::Forecast, .. }
            ));
            assert!(
                err.to_string().contains(&format!("missing field `{block}`")),
                "unexpected message: {err}"
            );
        }
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "晴".repeat(300);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
