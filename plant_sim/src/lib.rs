//! Shared plant models and the telemetry synthesizer.
//! Keep this crate free of HTTP/IO deps so the headend and tests can reuse it.
//!
//! Everything here is recomputed per call from an immutable [`PlantProfile`],
//! a wall-clock timestamp and an injected [`RandomSource`].

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub mod history;
pub mod kpi;
pub mod random;
pub mod telemetry;
pub mod weather;

pub use history::{HistoricalSeries, compute_historical_series};
pub use kpi::{
    EnergyUnit, GaugeBand, KpiSummary, TargetBand, Trend, achievement_series,
    calculate_efficiency, format_energy, percentage_of,
};
pub use random::{RandomSource, RngSource, SequenceRandom};
pub use telemetry::{
    ComponentReport, HourlyCurve, InstantTelemetry, compute_instant_telemetry, daylight_factor,
};
pub use weather::{WeatherCondition, WeatherSnapshot, compute_weather};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlantStatus {
    Operational,
    #[serde(rename = "Partially Operational")]
    PartiallyOperational,
    #[serde(rename = "Under Maintenance")]
    UnderMaintenance,
    Offline,
}

impl PlantStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlantStatus::Operational => "Operational",
            PlantStatus::PartiallyOperational => "Partially Operational",
            PlantStatus::UnderMaintenance => "Under Maintenance",
            PlantStatus::Offline => "Offline",
        }
    }
}

impl fmt::Display for PlantStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceStatus {
    Scheduled,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentStatus {
    Normal,
    Warning,
    Critical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InverterStatus {
    Online,
    Offline,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceTask {
    pub task: String,
    pub date: NaiveDate,
    pub status: MaintenanceStatus,
}

/// Static description of a plant. Read-only for the synthesizer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlantProfile {
    pub id: String,
    pub name: String,
    pub location: String,
    pub capacity_kw: f64,
    pub panel_count: u32,
    /// `None` only for the unknown-plant placeholder.
    pub install_date: Option<NaiveDate>,
    pub status: PlantStatus,
    pub daily_target_kwh: f64,
    #[serde(default)]
    pub maintenance_schedule: Vec<MaintenanceTask>,
}

impl PlantProfile {
    /// Placeholder returned for ids the directory does not know.
    /// Zero capacity and target keep every derived percentage at 0.
    pub fn unknown(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: "Unknown Plant".to_string(),
            location: "Unknown".to_string(),
            capacity_kw: 0.0,
            panel_count: 0,
            install_date: None,
            status: PlantStatus::Offline,
            daily_target_kwh: 0.0,
            maintenance_schedule: Vec::new(),
        }
    }

    /// Roughly one inverter per 100 kW, never fewer than one.
    pub fn inverter_count(&self) -> usize {
        let hundreds = (self.capacity_kw.max(0.0) / 100.0).floor() as usize;
        hundreds.max(1)
    }
}

/// Round to one decimal place, the precision every dashboard figure uses.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant(capacity_kw: f64) -> PlantProfile {
        PlantProfile {
            capacity_kw,
            ..PlantProfile::unknown("p")
        }
    }

    #[test]
    fn inverter_count_follows_capacity() {
        assert_eq!(plant(500.0).inverter_count(), 5);
        assert_eq!(plant(750.0).inverter_count(), 7);
        assert_eq!(plant(50.0).inverter_count(), 1);
        assert_eq!(plant(0.0).inverter_count(), 1);
    }

    #[test]
    fn status_serializes_to_display_label() {
        for status in [
            PlantStatus::Operational,
            PlantStatus::PartiallyOperational,
            PlantStatus::UnderMaintenance,
            PlantStatus::Offline,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{status}\""));
        }
    }

    #[test]
    fn unknown_plant_is_offline_and_empty() {
        let p = PlantProfile::unknown("plant-404");
        assert_eq!(p.id, "plant-404");
        assert_eq!(p.name, "Unknown Plant");
        assert_eq!(p.status, PlantStatus::Offline);
        assert_eq!(p.daily_target_kwh, 0.0);
        assert!(p.maintenance_schedule.is_empty());
    }

    #[test]
    fn round1_keeps_one_decimal() {
        assert_eq!(round1(12.345), 12.3);
        assert_eq!(round1(0.06), 0.1);
    }
}
