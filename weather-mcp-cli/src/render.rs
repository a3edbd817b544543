use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use weather_mcp_core::WeatherReport;

/// Human-friendly rendering of a [`WeatherReport`].
pub struct ReportView<'a>(pub &'a WeatherReport);

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        let loc = &report.location;
        let cur = &report.current;

        writeln!(f, "Weather for {}, {} ({})", loc.name, loc.country, loc.timezone)?;

        writeln!(f, "\nCurrent conditions:")?;
        writeln!(f, "  Temperature:   {}°C", cur.temperature)?;
        writeln!(f, "  Feels like:    {}°C", cur.feels_like)?;
        writeln!(f, "  Humidity:      {}%", cur.humidity)?;
        writeln!(f, "  Wind:          {} km/h from {}°", cur.wind_speed, cur.wind_direction)?;
        writeln!(f, "  Precipitation: {} mm", cur.precipitation)?;
        writeln!(f, "  Condition:     {}", cur.condition)?;

        if report.forecast.is_empty() {
            return Ok(());
        }

        writeln!(f, "\nForecast:")?;
        for day in &report.forecast {
            writeln!(f, "\n{}:", format_date(&day.date))?;
            writeln!(f, "  High:          {}°C", day.max_temp)?;
            writeln!(f, "  Low:           {}°C", day.min_temp)?;
            writeln!(f, "  Precipitation: {} mm", day.precipitation)?;
            writeln!(f, "  Condition:     {}", day.condition)?;
            writeln!(f, "  Sunrise:       {}", format_time(&day.sunrise))?;
            writeln!(f, "  Sunset:        {}", format_time(&day.sunset))?;
        }

        Ok(())
    }
}

/// `2025-05-01` -> `2025-05-01 (Thu)`; anything unparsable is shown as-is.
fn format_date(raw: &str) -> String {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d (%a)").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// `2025-05-01T04:50` -> `04:50`.
fn format_time(raw: &str) -> String {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
