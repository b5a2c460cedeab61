//! Daily production history for a date range.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::{PlantProfile, RandomSource, round1};

/// Parallel per-day series over an inclusive date range.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalSeries {
    pub dates: Vec<NaiveDate>,
    pub daily_production: Vec<f64>,
    pub daily_target: Vec<f64>,
    pub efficiency: Vec<f64>,
}

impl HistoricalSeries {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn total_production(&self) -> f64 {
        round1(self.daily_production.iter().sum())
    }
}

/// Synthesize one entry per day in `[start, end]`. An inverted range yields
/// an empty series.
///
/// Per day the draws are: season factor, weather factor, efficiency factor.
pub fn compute_historical_series(
    plant: &PlantProfile,
    start: NaiveDate,
    end: NaiveDate,
    rng: &mut impl RandomSource,
) -> HistoricalSeries {
    let mut series = HistoricalSeries::default();
    if end < start {
        return series;
    }
    let days = (end - start).num_days() + 1;
    let target = plant.daily_target_kwh.max(0.0);

    for offset in 0..days {
        let date = start + Duration::days(offset);
        let month = date.month();

        let season = season_factor(month, rng);
        let weekend = if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            0.98
        } else {
            1.0
        };
        let weather = rng.uniform(0.85, 1.15);

        // Cooler months run slightly more efficiently.
        let base_efficiency = if matches!(month, 11 | 12 | 1 | 2) {
            96.0
        } else {
            94.0
        };

        series.dates.push(date);
        series
            .daily_production
            .push(round1(target * season * weekend * weather));
        series.daily_target.push(target);
        series
            .efficiency
            .push(round1(base_efficiency * rng.uniform(0.95, 1.02)));
    }
    series
}

fn season_factor(month: u32, rng: &mut impl RandomSource) -> f64 {
    match month {
        5..=8 => rng.uniform(0.85, 0.95),
        4 | 9 => rng.uniform(0.70, 0.85),
        _ => rng.uniform(0.50, 0.70),
    }
}
