//! Plant directory and seed loading.
//! - `plants.yaml` carries plants, panels and seed alerts.
//! - PLANTS_PATH overrides the location; otherwise common relative paths are tried.
//! - With no file at all, the built-in sample set (same YAML, compiled in) is used.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use plant_sim::PlantProfile;

use crate::alerts::AlertStore;
use crate::models::PlantsFile;
use crate::panels::PanelRegistry;

const BUILTIN_PLANTS: &str = include_str!("../plants.yaml");

/// Plants keyed by id, listed in file order.
#[derive(Clone, Debug, Default)]
pub struct PlantDirectory {
    order: Vec<String>,
    plants: HashMap<String, PlantProfile>,
}

impl PlantDirectory {
    pub fn new(plants: Vec<PlantProfile>) -> Self {
        let mut dir = Self::default();
        for plant in plants {
            if dir.plants.contains_key(&plant.id) {
                tracing::warn!("duplicate plant id {} ignored", plant.id);
                continue;
            }
            dir.order.push(plant.id.clone());
            dir.plants.insert(plant.id.clone(), plant);
        }
        dir
    }

    pub fn list(&self) -> Vec<PlantProfile> {
        self.order
            .iter()
            .filter_map(|id| self.plants.get(id))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&PlantProfile> {
        self.plants.get(id)
    }

    /// Known plant, or the "Unknown Plant" placeholder.
    pub fn lookup(&self, id: &str) -> PlantProfile {
        self.get(id)
            .cloned()
            .unwrap_or_else(|| PlantProfile::unknown(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Everything the headend starts from.
pub struct Seed {
    pub directory: PlantDirectory,
    pub alerts: AlertStore,
    pub panels: PanelRegistry,
}

impl Seed {
    pub fn from_yaml(raw: &str, now: DateTime<Utc>) -> Result<Self> {
        // Python-ish: `data = yaml.safe_load(raw)`
        let parsed: PlantsFile = serde_yaml::from_str(raw).context("parsing plants.yaml")?;
        let directory = PlantDirectory::new(
            parsed.plants.into_iter().map(|p| p.into_profile()).collect(),
        );
        let alerts = AlertStore::new(
            parsed.alerts.into_iter().map(|a| a.into_alert(now)).collect(),
            parsed
                .alert_history
                .into_iter()
                .map(|a| a.into_resolved(now))
                .collect(),
        );
        Ok(Self {
            directory,
            alerts,
            panels: PanelRegistry::new(parsed.panels),
        })
    }

    pub fn builtin(now: DateTime<Utc>) -> Result<Self> {
        Self::from_yaml(BUILTIN_PLANTS, now).context("built-in sample plants")
    }
}

/// Load the seed file, falling back to the built-in samples when none is found.
/// An explicit PLANTS_PATH that cannot be read is an error.
pub async fn load_seed(override_path: Option<&Path>, now: DateTime<Utc>) -> Result<Seed> {
    if let Some(path) = override_path {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading PLANTS_PATH {}", path.display()))?;
        tracing::info!("loaded plants from {}", path.display());
        return Seed::from_yaml(&raw, now);
    }

    let candidates = [PathBuf::from("plants.yaml"), PathBuf::from("../plants.yaml")];
    for path in candidates {
        if let Ok(raw) = tokio::fs::read_to_string(&path).await {
            tracing::info!("loaded plants from {}", path.display());
            return Seed::from_yaml(&raw, now);
        }
    }

    tracing::warn!("plants.yaml not found; using built-in sample plants");
    Seed::builtin(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::panels::DirtLevel;
    use plant_sim::{MaintenanceStatus, PlantStatus};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn builtin_samples_parse() {
        let seed = Seed::builtin(now()).unwrap();
        let ids: Vec<_> = seed.directory.list().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, ["plant-001", "plant-002", "plant-003"]);

        let gamma = seed.directory.get("plant-003").unwrap();
        assert_eq!(gamma.status, PlantStatus::PartiallyOperational);
        assert_eq!(gamma.capacity_kw, 300.0);
        assert_eq!(gamma.maintenance_schedule[0].status, MaintenanceStatus::InProgress);

        assert_eq!(seed.panels.list().len(), 5);
        assert_eq!(seed.panels.get("P003").unwrap().dirt_level, DirtLevel::None);
        assert_eq!(seed.alerts.list_active(None, None).len(), 4);
        assert_eq!(seed.alerts.list_history(None, 30, None, now()).len(), 3);
    }

    #[test]
    fn lookup_returns_placeholder_for_unknown_ids() {
        let seed = Seed::builtin(now()).unwrap();
        assert_eq!(seed.directory.lookup("plant-001").name, "SolarField Alpha");
        let ghost = seed.directory.lookup("plant-999");
        assert_eq!(ghost.name, "Unknown Plant");
        assert_eq!(ghost.location, "Unknown");
        assert_eq!(ghost.status, PlantStatus::Offline);
        assert!(seed.directory.get("plant-999").is_none());
    }

    #[test]
    fn seed_alert_offsets_are_relative_to_now() {
        let seed = Seed::builtin(now()).unwrap();
        let newest = &seed.alerts.list_active(None, None)[0];
        assert_eq!(newest.id, "alert-002");
        assert_eq!(newest.raised_at, now() - chrono::Duration::minutes(45));
    }

    #[test]
    fn minimal_file_uses_defaults() {
        let raw = r#"
plants:
  - id: p1
    name: Rooftop
    location: Austin, TX
    capacity_kw: 80
    panel_count: 200
    install_date: 2022-02-01
    daily_target_kwh: 400
"#;
        let seed = Seed::from_yaml(raw, now()).unwrap();
        let p = seed.directory.get("p1").unwrap();
        assert_eq!(p.status, PlantStatus::Operational);
        assert!(p.maintenance_schedule.is_empty());
        assert!(seed.panels.list().is_empty());
        assert!(seed.alerts.list_active(None, None).is_empty());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let a = PlantProfile::unknown("dup");
        let mut b = PlantProfile::unknown("dup");
        b.name = "Second".into();
        let dir = PlantDirectory::new(vec![a, b]);
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.lookup("dup").name, "Unknown Plant");
    }

    #[test]
    fn malformed_yaml_is_an_error() {
        assert!(Seed::from_yaml("plants: [", now()).is_err());
    }

    #[tokio::test]
    async fn unreadable_override_is_an_error() {
        let missing = Path::new("/nonexistent/plants.yaml");
        assert!(load_seed(Some(missing), now()).await.is_err());
    }
}
