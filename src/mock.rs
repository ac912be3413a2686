//! Synthetic readings for the fallback report.
//!
//! Values are drawn from ranges that are plausible for the service area so
//! the fallback report scores like a real one; the aggregator marks it
//! `is_mock` and never caches it.

use rand::Rng;

use crate::model::{
    CurrentConditions, DischargeStatistics, ElevationReading, RainfallAnalysis, RiverReading,
    WeatherForecast, WeatherReading,
};
use crate::thresholds::PrecipitationThresholds;

pub struct SyntheticReadings {
    pub weather: WeatherReading,
    pub river: RiverReading,
    pub elevation: ElevationReading,
}

pub fn synthetic_readings<R: Rng + ?Sized>(
    rng: &mut R,
    thresholds: &PrecipitationThresholds,
) -> SyntheticReadings {
    let precipitation = rng.gen_range(0.0..20.0);
    let humidity = rng.gen_range(60.0..95.0);
    let pressure = rng.gen_range(995.0..1020.0);
    let percentile: f64 = rng.gen_range(10.0..90.0);
    let elevation = rng.gen_range(5.0..150.0);

    let average = rng.gen_range(50.0..400.0);
    // Scale today's flow with the drawn percentile so trend and level agree.
    let current = average * (0.5 + percentile / 100.0);

    let intensity = thresholds.band_for(precipitation);
    let duration_hours = if precipitation > 0.1 {
        rng.gen_range(1..=12) as f64
    } else {
        0.0
    };

    let weather = WeatherReading {
        current: CurrentConditions {
            temperature_c: rng.gen_range(23.0..33.0),
            precipitation_mm_h: precipitation,
            humidity_pct: humidity,
            wind_speed_kmh: rng.gen_range(0.0..30.0),
            pressure_hpa: pressure,
            conditions: "Unavailable (estimated)".to_string(),
        },
        forecast: WeatherForecast::default(),
        analysis: RainfallAnalysis {
            description: "Estimated conditions; live forecast unavailable.".to_string(),
            intensity,
            duration_hours,
            total_expected_mm: precipitation * duration_hours,
            periods_count: u32::from(duration_hours > 0.0),
        },
    };

    let river = RiverReading {
        current_discharge_m3s: current,
        statistics: DischargeStatistics {
            percentile,
            average,
            median: average,
            min: average * 0.3,
            max: average * 2.5,
            status: "estimated".to_string(),
            description: "Estimated discharge; live river data unavailable.".to_string(),
        },
        data_points: Vec::new(),
    };

    SyntheticReadings {
        weather,
        river,
        elevation: ElevationReading {
            elevation_m: elevation,
        },
    }
}
