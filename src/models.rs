use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use plant_sim::{
    HistoricalSeries, InstantTelemetry, KpiSummary, MaintenanceStatus, PlantProfile, PlantStatus,
};

use crate::alerts::{Alert, AlertLevel, ResolvedAlert};
use crate::assistant::ChatTurn;
use crate::panels::PanelRecord;

/// Top-level layout of `plants.yaml`.
#[derive(Debug, Deserialize)]
pub struct PlantsFile {
    pub plants: Vec<PlantCfg>,
    #[serde(default)]
    pub panels: Vec<PanelRecord>,
    #[serde(default)]
    pub alerts: Vec<AlertCfg>,
    #[serde(default)]
    pub alert_history: Vec<ResolvedAlertCfg>,
}

#[derive(Debug, Deserialize)]
pub struct PlantCfg {
    pub id: String,
    pub name: String,
    pub location: String,
    pub capacity_kw: f64,
    pub panel_count: u32,
    pub install_date: NaiveDate,
    #[serde(default = "default_plant_status")]
    pub status: PlantStatus,
    pub daily_target_kwh: f64,
    #[serde(default)]
    pub maintenance_schedule: Vec<MaintenanceTaskCfg>,
}

#[derive(Debug, Deserialize)]
pub struct MaintenanceTaskCfg {
    pub task: String,
    pub date: NaiveDate,
    #[serde(default = "default_task_status")]
    pub status: MaintenanceStatus,
}

/// Seed alert; timestamps are offsets back from startup.
#[derive(Debug, Deserialize)]
pub struct AlertCfg {
    pub id: String,
    pub plant_id: String,
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    pub raised_minutes_ago: i64,
}

#[derive(Debug, Deserialize)]
pub struct ResolvedAlertCfg {
    pub id: String,
    pub plant_id: String,
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    pub raised_minutes_ago: i64,
    pub resolved_minutes_ago: i64,
    pub resolution: String,
}

pub fn default_plant_status() -> PlantStatus {
    PlantStatus::Operational
}

pub fn default_task_status() -> MaintenanceStatus {
    MaintenanceStatus::Scheduled
}

impl PlantCfg {
    pub fn into_profile(self) -> PlantProfile {
        PlantProfile {
            id: self.id,
            name: self.name,
            location: self.location,
            capacity_kw: self.capacity_kw,
            panel_count: self.panel_count,
            install_date: Some(self.install_date),
            status: self.status,
            daily_target_kwh: self.daily_target_kwh,
            maintenance_schedule: self
                .maintenance_schedule
                .into_iter()
                .map(|t| plant_sim::MaintenanceTask {
                    task: t.task,
                    date: t.date,
                    status: t.status,
                })
                .collect(),
        }
    }
}

impl AlertCfg {
    pub fn into_alert(self, now: DateTime<Utc>) -> Alert {
        Alert {
            id: self.id,
            plant_id: self.plant_id,
            level: self.level,
            title: self.title,
            message: self.message,
            raised_at: now - Duration::minutes(self.raised_minutes_ago),
        }
    }
}

impl ResolvedAlertCfg {
    pub fn into_resolved(self, now: DateTime<Utc>) -> ResolvedAlert {
        ResolvedAlert {
            id: self.id,
            plant_id: self.plant_id,
            level: self.level,
            title: self.title,
            message: self.message,
            raised_at: now - Duration::minutes(self.raised_minutes_ago),
            resolved_at: now - Duration::minutes(self.resolved_minutes_ago),
            resolution: self.resolution,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub plants: usize,
    pub assistant: String,
}

#[derive(Serialize)]
pub struct SettingsView {
    pub refresh_secs: u64,
    pub min_refresh_secs: u64,
    pub max_refresh_secs: u64,
    pub history_default_days: i64,
}

#[derive(Serialize)]
pub struct TelemetryView {
    pub plant: PlantProfile,
    pub telemetry: InstantTelemetry,
    pub kpi: KpiSummary,
    pub current_production_label: String,
    pub daily_production_label: String,
}

#[derive(Serialize)]
pub struct HistoryView {
    pub plant_id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(flatten)]
    pub series: HistoricalSeries,
    pub achievement_pct: Vec<f64>,
    pub total_production_kwh: f64,
}

#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AlertFilter {
    pub plant_id: Option<String>,
    pub level: Option<AlertLevel>,
}

#[derive(Debug, Deserialize)]
pub struct AlertHistoryQuery {
    pub plant_id: Option<String>,
    pub days: Option<i64>,
    pub level: Option<AlertLevel>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingAlert {
    pub plant_id: String,
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub panel_id: Option<String>,
}

#[derive(Serialize)]
pub struct AssistantReply {
    pub reply: String,
    pub transcript: Vec<ChatTurn>,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
}
