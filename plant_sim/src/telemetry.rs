//! Instantaneous plant telemetry: current output, today's hourly curve,
//! efficiency/performance figures and equipment health.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{
    ComponentStatus, InverterStatus, PlantProfile, PlantStatus, RandomSource, round1,
};

/// First productive hour (inclusive).
pub const DAYLIGHT_START: u32 = 6;
/// First dark hour after sunset (exclusive end of the window).
pub const DAYLIGHT_END: u32 = 19;

const SOLAR_NOON: f64 = 12.5;
const BASE_EFFICIENCY: f64 = 96.0;
const REALIZED_DERATE: f64 = 0.9;
const PROJECTED_DERATE: f64 = 0.85;
const INVERTER_FAULT_PROBABILITY: f64 = 0.05;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    #[serde(rename = "PV Panels")]
    PvPanels,
    Inverters,
    #[serde(rename = "Mounting System")]
    MountingSystem,
    #[serde(rename = "AC Subsystem")]
    AcSubsystem,
    Communications,
}

impl Component {
    /// Monitored components with the number of days since their last check.
    const INSPECTED: [(Component, i64); 5] = [
        (Component::PvPanels, 3),
        (Component::Inverters, 2),
        (Component::MountingSystem, 10),
        (Component::AcSubsystem, 5),
        (Component::Communications, 0),
    ];
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentReport {
    pub component: Component,
    pub status: ComponentStatus,
    pub last_check: NaiveDate,
}

/// Today's production per hour. Entries up to and including `current_hour`
/// are realized, later ones are a conservative projection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HourlyCurve {
    pub hours: Vec<String>,
    pub values: Vec<f64>,
    pub current_hour: u32,
}

impl HourlyCurve {
    pub fn realized(&self) -> &[f64] {
        let end = (self.current_hour as usize + 1).min(self.values.len());
        &self.values[..end]
    }

    pub fn projected(&self) -> &[f64] {
        let start = (self.current_hour as usize + 1).min(self.values.len());
        &self.values[start..]
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstantTelemetry {
    pub plant_id: String,
    pub timestamp: NaiveDateTime,
    pub current_production_kw: f64,
    pub daily_production_kwh: f64,
    pub efficiency_pct: f64,
    pub efficiency_pct_yesterday: f64,
    pub performance_ratio_pct: f64,
    pub performance_ratio_pct_yesterday: f64,
    pub peak_power_kw: f64,
    pub average_power_kw: f64,
    pub inverter_status: Vec<InverterStatus>,
    pub component_status: Vec<ComponentReport>,
    pub hourly_curve: HourlyCurve,
}

/// Fraction of nameplate capacity available at `hour`: a triangle peaking at
/// 12:30, zero outside [06:00, 19:00).
pub fn daylight_factor(hour: u32) -> f64 {
    if !(DAYLIGHT_START..DAYLIGHT_END).contains(&hour) {
        return 0.0;
    }
    (1.0 - (hour as f64 - SOLAR_NOON).abs() / 8.0).max(0.0)
}

/// Synthesize the live view of `plant` at `now`.
///
/// Draw order is fixed (current output, realized hours, yesterday's
/// efficiency, performance ratio, yesterday's ratio, inverter faults) so a
/// replayed [`RandomSource`] always reproduces the same telemetry.
pub fn compute_instant_telemetry(
    plant: &PlantProfile,
    now: NaiveDateTime,
    rng: &mut impl RandomSource,
) -> InstantTelemetry {
    let capacity = plant.capacity_kw.max(0.0);
    let current_hour = now.hour();

    let factor = daylight_factor(current_hour);
    let current_production_kw = if factor > 0.0 {
        round1((factor * rng.uniform(0.8, 1.2)).max(0.0) * capacity)
    } else {
        0.0
    };

    let mut hours = Vec::with_capacity(24);
    let mut values = Vec::with_capacity(24);
    for hour in 0..24u32 {
        hours.push(format!("{hour:02}:00"));
        let factor = daylight_factor(hour);
        let value = if factor == 0.0 {
            0.0
        } else if hour <= current_hour {
            (factor * rng.uniform(0.8, 1.2) * capacity * REALIZED_DERATE).max(0.0)
        } else {
            factor * capacity * PROJECTED_DERATE
        };
        values.push(round1(value));
    }
    let hourly_curve = HourlyCurve {
        hours,
        values,
        current_hour,
    };

    let realized = hourly_curve.realized();
    let daily_production_kwh = round1(realized.iter().sum());

    let efficiency_pct = round1(BASE_EFFICIENCY - temperature_derate(current_hour));
    let efficiency_pct_yesterday = round1(BASE_EFFICIENCY - rng.uniform(0.0, 6.0));
    let performance_ratio_pct = round1(efficiency_pct * rng.uniform(0.94, 0.99));
    // Yesterday's ratio jitters around today's rather than following
    // yesterday's efficiency.
    let performance_ratio_pct_yesterday =
        round1(performance_ratio_pct - rng.uniform(-1.5, 1.5));

    let peak_power_kw = round1(hourly_curve.values.iter().copied().fold(0.0, f64::max));
    let producing: Vec<f64> = realized.iter().copied().filter(|v| *v > 0.0).collect();
    let average_power_kw = if producing.is_empty() {
        0.0
    } else {
        round1(producing.iter().sum::<f64>() / producing.len() as f64)
    };

    let partial = plant.status == PlantStatus::PartiallyOperational;
    let inverter_status: Vec<InverterStatus> = (0..plant.inverter_count())
        .map(|_| {
            if partial && rng.unit() < INVERTER_FAULT_PROBABILITY {
                InverterStatus::Offline
            } else {
                InverterStatus::Online
            }
        })
        .collect();

    let inverters_degraded =
        partial || inverter_status.iter().any(|s| *s == InverterStatus::Offline);
    let today = now.date();
    let component_status = Component::INSPECTED
        .iter()
        .map(|(component, days_ago)| ComponentReport {
            component: *component,
            status: if *component == Component::Inverters && inverters_degraded {
                ComponentStatus::Warning
            } else {
                ComponentStatus::Normal
            },
            last_check: today - Duration::days(*days_ago),
        })
        .collect();

    InstantTelemetry {
        plant_id: plant.id.clone(),
        timestamp: now,
        current_production_kw,
        daily_production_kwh,
        efficiency_pct,
        efficiency_pct_yesterday,
        performance_ratio_pct,
        performance_ratio_pct_yesterday,
        peak_power_kw,
        average_power_kw,
        inverter_status,
        component_status,
        hourly_curve,
    }
}

/// Efficiency loss from module heating. Ambient temperature peaks at 14:00
/// and every degree above 25 °C costs 0.4 points.
fn temperature_derate(hour: u32) -> f64 {
    let hour_temp = 20.0 + 10.0 * (1.0 - (hour as f64 - 14.0).abs() / 8.0);
    ((hour_temp - 25.0) * 0.4).max(0.0)
}
