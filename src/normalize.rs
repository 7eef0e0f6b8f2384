//! Pure transform from the raw nested payload into flat dated records
//!
//! The payload carries a date/weather-code block and an optional temperature
//! block aligned by index. The temperature block may be shorter than the
//! date block or missing entirely; that is normal source behavior, not an
//! error. Only a payload with no usable date/code series at all is rejected.

use crate::error::TenkiError;
use crate::jma::{AreaSeries, ForecastPayload, ForecastSection, TimeSeries};
use crate::models::ForecastRecord;
use crate::Result;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

/// Sentinel the source uses for a temperature it does not know
const UNKNOWN_TEMP: &str = "--";

/// Flatten a raw payload into dated records for one region.
///
/// Records come out ordered as received, forecast date ascending. Weather
/// codes pass through verbatim; interpreting them is a presentation concern.
pub fn normalize(
    area_code: &str,
    area_name: &str,
    payload: &ForecastPayload,
) -> Result<Vec<ForecastRecord>> {
    // The weekly outlook is the last section carrying a weather-code series;
    // earlier sections repeat the next couple of days at finer granularity.
    let (section, series, codes) = payload
        .sections
        .iter()
        .rev()
        .find_map(|section| code_series(section).map(|(series, codes)| (section, series, codes)))
        .ok_or_else(|| {
            TenkiError::malformed_payload("no time series with weather codes in payload")
        })?;

    let temps = temp_series(section);
    let ingested_at = Utc::now();

    let mut records = Vec::with_capacity(series.time_defines.len());
    for (i, marker) in series.time_defines.iter().enumerate() {
        let Some(weather_code) = codes.weather_codes.get(i) else {
            warn!(area_code, index = i, "date marker without a weather code, skipping");
            continue;
        };
        let Some(forecast_date) = parse_forecast_date(marker) else {
            warn!(area_code, marker = %marker, "unparsable date marker, skipping");
            continue;
        };

        records.push(ForecastRecord {
            area_code: area_code.to_string(),
            area_name: area_name.to_string(),
            forecast_date,
            weather_code: weather_code.clone(),
            temp_min: temps.and_then(|t| parse_temp(t.temps_min.get(i))),
            temp_max: temps.and_then(|t| parse_temp(t.temps_max.get(i))),
            ingested_at,
        });
    }

    Ok(records)
}

/// Find the date/weather-code block of a section
fn code_series(section: &ForecastSection) -> Option<(&TimeSeries, &AreaSeries)> {
    section.time_series.iter().find_map(|series| {
        series
            .areas
            .iter()
            .find(|area| !area.weather_codes.is_empty())
            .map(|area| (series, area))
    })
}

/// Find the temperature block of a section, if it has one
fn temp_series(section: &ForecastSection) -> Option<&AreaSeries> {
    section.time_series.iter().find_map(|series| {
        series
            .areas
            .iter()
            .find(|area| !area.temps_min.is_empty() || !area.temps_max.is_empty())
    })
}

/// Normalize a date marker to calendar-date granularity: the offset carried
/// by the marker is applied, then time-of-day is discarded.
fn parse_forecast_date(marker: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(marker)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Parse one temperature entry; sentinels and unparsable values are unknown
fn parse_temp(raw: Option<&String>) -> Option<i64> {
    let raw = raw?.trim();
    if raw.is_empty() || raw == UNKNOWN_TEMP {
        return None;
    }
    match raw.parse::<i64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(value = raw, "unparsable temperature, treating as unknown");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn payload(
        dates: &[&str],
        codes: &[&str],
        temps_min: &[&str],
        temps_max: &[&str],
    ) -> ForecastPayload {
        let mut time_series = vec![TimeSeries {
            time_defines: dates.iter().map(|d| d.to_string()).collect(),
            areas: vec![AreaSeries {
                weather_codes: codes.iter().map(|c| c.to_string()).collect(),
                ..AreaSeries::default()
            }],
        }];
        if !temps_min.is_empty() || !temps_max.is_empty() {
            time_series.push(TimeSeries {
                time_defines: dates.iter().map(|d| d.to_string()).collect(),
                areas: vec![AreaSeries {
                    temps_min: temps_min.iter().map(|t| t.to_string()).collect(),
                    temps_max: temps_max.iter().map(|t| t.to_string()).collect(),
                    ..AreaSeries::default()
                }],
            });
        }
        ForecastPayload {
            sections: vec![ForecastSection { time_series }],
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_scenario_ragged_temperatures() {
        // Region "130000", two dates, second min temperature unknown
        let payload = payload(
            &["2024-06-01T00:00:00+09:00", "2024-06-02T00:00:00+09:00"],
            &["100", "300"],
            &["18", "--"],
            &["25", "27"],
        );

        let records = normalize("130000", "東京都", &payload).unwrap();
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.forecast_date, date("2024-06-01"));
        assert_eq!(first.weather_code, "100");
        assert_eq!(first.temp_min, Some(18));
        assert_eq!(first.temp_max, Some(25));

        let second = &records[1];
        assert_eq!(second.forecast_date, date("2024-06-02"));
        assert_eq!(second.weather_code, "300");
        assert_eq!(second.temp_min, None);
        assert_eq!(second.temp_max, Some(27));
        assert_eq!(second.area_name, "東京都");
    }

    #[test]
    fn test_short_temperature_block_never_aborts() {
        // 4 dates/codes but only 2 temperature entries
        let payload = payload(
            &[
                "2024-06-01T00:00:00+09:00",
                "2024-06-02T00:00:00+09:00",
                "2024-06-03T00:00:00+09:00",
                "2024-06-04T00:00:00+09:00",
            ],
            &["100", "101", "200", "300"],
            &["18", "19"],
            &["25", "26"],
        );

        let records = normalize("130000", "東京都", &payload).unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(records[1].temp_min, Some(19));
        assert_eq!(records[2].temp_min, None);
        assert_eq!(records[2].temp_max, None);
        assert_eq!(records[3].temp_min, None);
        assert_eq!(records[3].temp_max, None);
    }

    #[test]
    fn test_missing_temperature_block_entirely() {
        let payload = payload(
            &["2024-06-01T00:00:00+09:00"],
            &["100"],
            &[],
            &[],
        );

        let records = normalize("130000", "東京都", &payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].temp_min, None);
        assert_eq!(records[0].temp_max, None);
    }

    #[test]
    fn test_unknown_weather_code_passes_through() {
        let payload = payload(
            &["2024-06-01T00:00:00+09:00"],
            &["999"],
            &["18"],
            &["25"],
        );

        let records = normalize("130000", "東京都", &payload).unwrap();
        assert_eq!(records[0].weather_code, "999");
    }

    #[test]
    fn test_empty_payload_is_malformed() {
        let empty = ForecastPayload { sections: vec![] };
        let err = normalize("130000", "東京都", &empty).unwrap_err();
        assert!(matches!(err, TenkiError::MalformedPayload { .. }));
    }

    #[test]
    fn test_sections_without_code_series_are_malformed() {
        let payload = ForecastPayload {
            sections: vec![ForecastSection {
                time_series: vec![TimeSeries {
                    time_defines: vec!["2024-06-01T00:00:00+09:00".to_string()],
                    areas: vec![AreaSeries::default()],
                }],
            }],
        };
        let err = normalize("130000", "東京都", &payload).unwrap_err();
        assert!(matches!(err, TenkiError::MalformedPayload { .. }));
    }

    #[test]
    fn test_weekly_section_preferred_over_short_range() {
        // The short-range section comes first; the weekly outlook must win.
        let short_range = ForecastSection {
            time_series: vec![TimeSeries {
                time_defines: vec!["2024-06-01T11:00:00+09:00".to_string()],
                areas: vec![AreaSeries {
                    weather_codes: vec!["100".to_string()],
                    ..AreaSeries::default()
                }],
            }],
        };
        let weekly = ForecastSection {
            time_series: vec![TimeSeries {
                time_defines: vec![
                    "2024-06-02T00:00:00+09:00".to_string(),
                    "2024-06-03T00:00:00+09:00".to_string(),
                ],
                areas: vec![AreaSeries {
                    weather_codes: vec!["200".to_string(), "300".to_string()],
                    ..AreaSeries::default()
                }],
            }],
        };
        let payload = ForecastPayload {
            sections: vec![short_range, weekly],
        };

        let records = normalize("130000", "東京都", &payload).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].weather_code, "200");
    }

    #[test]
    fn test_offset_applied_before_truncation() {
        // 23:00 UTC on May 31st is already June 1st in the +09:00 offset the
        // marker carries; the marker's own local date is what counts.
        let payload = payload(
            &["2024-06-01T08:00:00+09:00"],
            &["100"],
            &[],
            &[],
        );
        let records = normalize("130000", "東京都", &payload).unwrap();
        assert_eq!(records[0].forecast_date, date("2024-06-01"));
    }

    #[test]
    fn test_unparsable_date_marker_skipped() {
        let payload = payload(
            &["not-a-date", "2024-06-02T00:00:00+09:00"],
            &["100", "300"],
            &[],
            &[],
        );
        let records = normalize("130000", "東京都", &payload).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].weather_code, "300");
    }

    #[rstest]
    #[case("18", Some(18))]
    #[case("-3", Some(-3))]
    #[case("--", None)]
    #[case("", None)]
    #[case("  ", None)]
    #[case("warm", None)]
    fn test_temperature_sentinels(#[case] raw: &str, #[case] expected: Option<i64>) {
        let payload = payload(
            &["2024-06-01T00:00:00+09:00"],
            &["100"],
            &[raw],
            &[raw],
        );
        let records = normalize("130000", "東京都", &payload).unwrap();
        assert_eq!(records[0].temp_min, expected);
        assert_eq!(records[0].temp_max, expected);
    }
}
