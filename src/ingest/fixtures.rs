/// Test fixtures: representative Open-Meteo response bodies.
///
/// Structurally complete but truncated to the minimum needed to exercise
/// the parsers. Arrays are column-oriented: `time[i]` pairs with
/// `precipitation[i]` (or `river_discharge[i]`), and any value may be
/// `null` when the model has no data for that slot.
///
/// Forecast response shape:
///   current.{temperature_2m, relative_humidity_2m, precipitation,
///            weather_code, pressure_msl, wind_speed_10m}
///   hourly.{time[], precipitation[], precipitation_probability[]}
///   daily.{time[], precipitation_sum[], temperature_2m_max[], temperature_2m_min[]}
///
/// Flood response shape:
///   daily.{time[], river_discharge[]}   (last entry is today)

/// Kuala Lumpur during a monsoon burst: heavy rain now (WMO 65), three
/// rainy hours, a dry gap (one `null`), then a second shower.
pub(crate) fn fixture_forecast_monsoon_json() -> &'static str {
    r#"{
      "latitude": 3.125,
      "longitude": 101.6875,
      "timezone": "Asia/Kuala_Lumpur",
      "current_units": { "precipitation": "mm", "pressure_msl": "hPa", "wind_speed_10m": "km/h" },
      "current": {
        "time": "2024-11-28T15:00",
        "interval": 900,
        "temperature_2m": 24.6,
        "relative_humidity_2m": 94,
        "precipitation": 18.4,
        "weather_code": 65,
        "pressure_msl": 1003.1,
        "surface_pressure": 996.2,
        "wind_speed_10m": 14.8
      },
      "hourly": {
        "time": [
          "2024-11-28T15:00", "2024-11-28T16:00", "2024-11-28T17:00",
          "2024-11-28T18:00", "2024-11-28T19:00", "2024-11-28T20:00"
        ],
        "precipitation": [12.0, 8.5, 2.1, null, 0.0, 1.2],
        "precipitation_probability": [95, 90, 80, null, 40, 55]
      },
      "daily": {
        "time": ["2024-11-28", "2024-11-29"],
        "precipitation_sum": [61.3, 22.0],
        "temperature_2m_max": [29.1, 30.4],
        "temperature_2m_min": [23.8, null]
      }
    }"#
}

/// River discharge climbing through a wet week; today (412 m³/s) exceeds
/// every day in the history. One day is missing from the model.
pub(crate) fn fixture_flood_rising_json() -> &'static str {
    r#"{
      "latitude": 3.125,
      "longitude": 101.675,
      "daily_units": { "time": "iso8601", "river_discharge": "m³/s" },
      "daily": {
        "time": ["2024-11-23", "2024-11-24", "2024-11-25", "2024-11-26", "2024-11-27", "2024-11-28"],
        "river_discharge": [120.0, 180.0, null, 190.0, 260.0, 412.0]
      }
    }"#
}

/// Low-lying point in the Klang valley.
pub(crate) fn fixture_elevation_lowland_json() -> &'static str {
    r#"{ "elevation": [8.0] }"#
}
