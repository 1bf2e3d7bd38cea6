//! Plain-text rendering of reports and history.

use std::fmt::Write as _;

use weather_core::{UnitSystem, WeatherReport};

fn temperature_suffix(unit: UnitSystem) -> &'static str {
    match unit {
        UnitSystem::Metric => "°C",
        UnitSystem::Imperial => "°F",
        UnitSystem::Standard => "K",
    }
}

fn wind_suffix(unit: UnitSystem) -> &'static str {
    match unit {
        UnitSystem::Imperial => "mph",
        UnitSystem::Metric | UnitSystem::Standard => "m/s",
    }
}

pub fn report(report: &WeatherReport) -> String {
    let current = &report.current;
    let temp = temperature_suffix(report.unit);
    let offset = current.utc_offset();

    let mut out = String::new();
    let _ = writeln!(out, "{}", current.label());
    let _ = writeln!(
        out,
        "  {}{temp}  {}  (feels like {}{temp})",
        current.temperature.round(),
        current.condition,
        current.feels_like.round(),
    );
    let _ = writeln!(
        out,
        "  Humidity {}%  Wind {} {}",
        current.humidity,
        current.wind_speed,
        wind_suffix(report.unit),
    );
    let _ = writeln!(
        out,
        "  Observed {} local time",
        current.observed_at.with_timezone(&offset).format("%a %H:%M"),
    );

    if !report.forecast.is_empty() {
        let _ = writeln!(out, "\nForecast:");
        for slice in &report.forecast {
            let _ = writeln!(
                out,
                "  {}  {:>5}{temp}  {}",
                slice.at.with_timezone(&offset).format("%a %H:%M"),
                slice.temperature.round(),
                slice.condition,
            );
        }
    }

    out
}

pub fn history(entries: &[String]) -> String {
    if entries.is_empty() {
        return "No recent searches\n".to_string();
    }
    entries.iter().enumerate().map(|(i, e)| format!("{:>2}. {e}\n", i + 1)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use weather_core::{Coordinates, CurrentObservation, ForecastSlice};

    fn sample(unit: UnitSystem) -> WeatherReport {
        WeatherReport {
            current: CurrentObservation {
                name: "Paris".into(),
                country: Some("FR".into()),
                coordinates: Coordinates::new(48.85, 2.35),
                temperature: 18.6,
                feels_like: 17.2,
                humidity: 55,
                wind_speed: 4.1,
                icon: "01d".into(),
                condition: "clear sky".into(),
                utc_offset_secs: 7200,
                observed_at: Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap(),
            },
            forecast: vec![ForecastSlice {
                at: Utc.with_ymd_and_hms(2026, 5, 4, 12, 0, 0).unwrap(),
                temperature: 21.4,
                icon: "02d".into(),
                condition: "Clouds".into(),
            }],
            unit,
        }
    }

    #[test]
    fn metric_report_uses_celsius_and_local_time() {
        let out = report(&sample(UnitSystem::Metric));

        assert!(out.starts_with("Paris, FR\n"));
        assert!(out.contains("19°C"));
        assert!(out.contains("m/s"));
        assert!(out.contains("Mon 12:00"));
        assert!(out.contains("Mon 14:00"));
    }

    #[test]
    fn suffixes_follow_unit_system() {
        assert!(report(&sample(UnitSystem::Imperial)).contains("mph"));
        let kelvin = report(&sample(UnitSystem::Standard));
        assert!(kelvin.contains("19K"));
        assert!(kelvin.contains("m/s"));
    }

    #[test]
    fn history_lists_entries_in_order() {
        let out = history(&["Oslo, NO".to_string(), "Rome, IT".to_string()]);
        assert_eq!(out, " 1. Oslo, NO\n 2. Rome, IT\n");
        assert_eq!(history(&[]), "No recent searches\n");
    }
}
