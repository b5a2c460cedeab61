//! In-memory alert store.
//! - Active alerts are listed newest first and can be filtered by plant and level.
//! - Acknowledging moves an alert into the resolved history.
//! - Callers pass `now` so tests can pin the clock.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    Critical,
    Warning,
    Information,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Critical => "Critical",
            AlertLevel::Warning => "Warning",
            AlertLevel::Information => "Information",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub plant_id: String,
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAlert {
    pub id: String,
    pub plant_id: String,
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    pub raised_at: DateTime<Utc>,
    pub resolved_at: DateTime<Utc>,
    pub resolution: String,
}

#[derive(Clone, Debug, Default)]
pub struct AlertStore {
    active: Vec<Alert>,
    history: Vec<ResolvedAlert>,
}

impl AlertStore {
    pub fn new(active: Vec<Alert>, history: Vec<ResolvedAlert>) -> Self {
        Self { active, history }
    }

    pub fn list_active(&self, plant_id: Option<&str>, level: Option<AlertLevel>) -> Vec<Alert> {
        let mut rows: Vec<Alert> = self
            .active
            .iter()
            .filter(|a| matches_filter(&a.plant_id, a.level, plant_id, level))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.raised_at.cmp(&a.raised_at));
        rows
    }

    /// Resolved alerts raised within the last `days` days, newest first.
    pub fn list_history(
        &self,
        plant_id: Option<&str>,
        days: i64,
        level: Option<AlertLevel>,
        now: DateTime<Utc>,
    ) -> Vec<ResolvedAlert> {
        let cutoff = now - Duration::days(days.max(0));
        let mut rows: Vec<ResolvedAlert> = self
            .history
            .iter()
            .filter(|a| a.raised_at > cutoff)
            .filter(|a| matches_filter(&a.plant_id, a.level, plant_id, level))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.raised_at.cmp(&a.raised_at));
        rows
    }

    /// Move an active alert into history. Returns false for unknown ids.
    pub fn acknowledge(&mut self, alert_id: &str, now: DateTime<Utc>) -> bool {
        let Some(pos) = self.active.iter().position(|a| a.id == alert_id) else {
            return false;
        };
        let alert = self.active.remove(pos);
        self.history.push(ResolvedAlert {
            id: format!("hist-{}", alert.id),
            plant_id: alert.plant_id,
            level: alert.level,
            title: alert.title,
            message: alert.message,
            raised_at: alert.raised_at,
            resolved_at: now,
            resolution: "Acknowledged".to_string(),
        });
        true
    }

    pub fn create(
        &mut self,
        plant_id: impl Into<String>,
        level: AlertLevel,
        title: impl Into<String>,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Alert {
        let alert = Alert {
            id: format!("alert-{}", Uuid::new_v4()),
            plant_id: plant_id.into(),
            level,
            title: title.into(),
            message: message.into(),
            raised_at: now,
        };
        self.active.push(alert.clone());
        alert
    }
}

fn matches_filter(
    alert_plant: &str,
    alert_level: AlertLevel,
    plant_id: Option<&str>,
    level: Option<AlertLevel>,
) -> bool {
    plant_id.is_none_or(|p| p == alert_plant) && level.is_none_or(|l| l == alert_level)
}
