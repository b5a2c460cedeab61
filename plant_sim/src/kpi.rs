//! Derived dashboard figures: percentages, trend markers, gauge bands and
//! energy formatting.

use serde::{Deserialize, Serialize};

use crate::{HistoricalSeries, InstantTelemetry, PlantProfile, round1};

/// `value` as a percentage of `whole`, one decimal. A non-positive `whole`
/// yields 0 rather than dividing by zero.
pub fn percentage_of(value: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        round1(value / whole * 100.0)
    } else {
        0.0
    }
}

/// Same contract as [`percentage_of`]; used for the panel data sheet ratios.
pub fn calculate_efficiency(actual: f64, theoretical: f64) -> f64 {
    percentage_of(actual, theoretical)
}

/// Per-day achievement against target, in percent.
pub fn achievement_series(series: &HistoricalSeries) -> Vec<f64> {
    series
        .daily_production
        .iter()
        .zip(&series.daily_target)
        .map(|(actual, target)| {
            if *target > 0.0 {
                100.0 * actual / target
            } else {
                0.0
            }
        })
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Trend::Up
        } else if delta < 0.0 {
            Trend::Down
        } else {
            Trend::Flat
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetBand {
    Positive,
    Neutral,
    Negative,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaugeBand {
    Low,
    Medium,
    High,
}

impl GaugeBand {
    pub fn of(pct: f64) -> Self {
        if pct >= 70.0 {
            GaugeBand::High
        } else if pct >= 40.0 {
            GaugeBand::Medium
        } else {
            GaugeBand::Low
        }
    }
}

/// Headline figures shown above the charts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KpiSummary {
    pub capacity_pct: f64,
    pub capacity_band: TargetBand,
    pub target_pct: f64,
    pub target_band: TargetBand,
    pub efficiency_delta: f64,
    pub efficiency_trend: Trend,
    pub performance_ratio_delta: f64,
    pub performance_ratio_trend: Trend,
    pub gauge_pct: f64,
    pub gauge_band: GaugeBand,
}

impl KpiSummary {
    pub fn from_telemetry(plant: &PlantProfile, telemetry: &InstantTelemetry) -> Self {
        let capacity_pct = percentage_of(telemetry.current_production_kw, plant.capacity_kw);
        let capacity_band = if capacity_pct >= 50.0 {
            TargetBand::Positive
        } else {
            TargetBand::Neutral
        };

        let target_pct = percentage_of(telemetry.daily_production_kwh, plant.daily_target_kwh);
        let target_band = if target_pct >= 90.0 {
            TargetBand::Positive
        } else if target_pct >= 70.0 {
            TargetBand::Neutral
        } else {
            TargetBand::Negative
        };

        let efficiency_delta =
            round1(telemetry.efficiency_pct - telemetry.efficiency_pct_yesterday);
        let performance_ratio_delta = round1(
            telemetry.performance_ratio_pct - telemetry.performance_ratio_pct_yesterday,
        );

        // The gauge keeps full precision for its needle; only the label rounds.
        let gauge_pct = if plant.capacity_kw > 0.0 {
            telemetry.current_production_kw / plant.capacity_kw * 100.0
        } else {
            0.0
        };

        Self {
            capacity_pct,
            capacity_band,
            target_pct,
            target_band,
            efficiency_delta,
            efficiency_trend: Trend::of(efficiency_delta),
            performance_ratio_delta,
            performance_ratio_trend: Trend::of(performance_ratio_delta),
            gauge_pct,
            gauge_band: GaugeBand::of(gauge_pct),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnergyUnit {
    KilowattHour,
    Kilowatt,
}

/// Human-readable energy or power, scaled to the largest sensible unit.
pub fn format_energy(value: f64, unit: EnergyUnit) -> String {
    match unit {
        EnergyUnit::KilowattHour if value >= 1_000_000.0 => {
            format!("{:.2} GWh", value / 1_000_000.0)
        }
        EnergyUnit::KilowattHour if value >= 1_000.0 => format!("{:.2} MWh", value / 1_000.0),
        EnergyUnit::KilowattHour => format!("{value:.2} kWh"),
        EnergyUnit::Kilowatt if value >= 1_000.0 => format!("{:.2} MW", value / 1_000.0),
        EnergyUnit::Kilowatt => format!("{value:.2} kW"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RngSource, SequenceRandom, compute_historical_series, compute_instant_telemetry};
    use chrono::NaiveDate;

    fn plant(capacity_kw: f64, target: f64) -> PlantProfile {
        PlantProfile {
            capacity_kw,
            daily_target_kwh: target,
            ..PlantProfile::unknown("plant-001")
        }
    }

    #[test]
    fn percentages_guard_zero_denominators() {
        assert_eq!(percentage_of(250.0, 500.0), 50.0);
        assert_eq!(percentage_of(10.0, 0.0), 0.0);
        assert_eq!(percentage_of(10.0, -5.0), 0.0);
        assert_eq!(calculate_efficiency(18.0, 20.0), 90.0);
        assert_eq!(calculate_efficiency(1.0, 0.0), 0.0);
    }

    #[test]
    fn gauge_bands() {
        assert_eq!(GaugeBand::of(0.0), GaugeBand::Low);
        assert_eq!(GaugeBand::of(39.9), GaugeBand::Low);
        assert_eq!(GaugeBand::of(40.0), GaugeBand::Medium);
        assert_eq!(GaugeBand::of(70.0), GaugeBand::High);
    }

    #[test]
    fn energy_formatting_scales_units() {
        assert_eq!(format_energy(950.0, EnergyUnit::KilowattHour), "950.00 kWh");
        assert_eq!(format_energy(2500.0, EnergyUnit::KilowattHour), "2.50 MWh");
        assert_eq!(format_energy(3_200_000.0, EnergyUnit::KilowattHour), "3.20 GWh");
        assert_eq!(format_energy(468.8, EnergyUnit::Kilowatt), "468.80 kW");
        assert_eq!(format_energy(1500.0, EnergyUnit::Kilowatt), "1.50 MW");
    }

    #[test]
    fn kpis_for_unknown_plant_are_zero() {
        let p = PlantProfile::unknown("ghost");
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let t = compute_instant_telemetry(&p, now, &mut RngSource::seeded(1));
        let kpi = KpiSummary::from_telemetry(&p, &t);
        assert_eq!(kpi.capacity_pct, 0.0);
        assert_eq!(kpi.target_pct, 0.0);
        assert_eq!(kpi.target_band, TargetBand::Negative);
        assert_eq!(kpi.gauge_pct, 0.0);
        assert_eq!(kpi.gauge_band, GaugeBand::Low);
    }

    #[test]
    fn kpi_trends_follow_yesterday() {
        let p = plant(500.0, 2500.0);
        let now = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        // Midpoint draws: efficiency 95 vs 93 yesterday, PR unchanged.
        let t = compute_instant_telemetry(&p, now, &mut SequenceRandom::constant(0.5));
        let kpi = KpiSummary::from_telemetry(&p, &t);
        assert_eq!(kpi.efficiency_delta, 2.0);
        assert_eq!(kpi.efficiency_trend, Trend::Up);
        assert_eq!(kpi.performance_ratio_trend, Trend::Flat);
        assert!(kpi.capacity_pct > 50.0);
        assert_eq!(kpi.capacity_band, TargetBand::Positive);
    }

    #[test]
    fn achievement_handles_zero_target() {
        let mut rng = RngSource::seeded(5);
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let s = compute_historical_series(&plant(500.0, 2500.0), start, end, &mut rng);
        let a = achievement_series(&s);
        assert_eq!(a.len(), 3);
        assert!(a.iter().all(|pct| (40.0..=110.0).contains(pct)));

        let s = compute_historical_series(&plant(0.0, 0.0), start, end, &mut rng);
        assert!(achievement_series(&s).iter().all(|pct| *pct == 0.0));
    }
}
