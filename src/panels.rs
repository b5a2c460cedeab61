//! Per-panel health records used by the dashboard and the assistant.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PanelType {
    Monocrystalline,
    Polycrystalline,
    #[serde(rename = "Thin Film")]
    ThinFilm,
    Bifacial,
    #[serde(rename = "PERC")]
    Perc,
}

impl PanelType {
    pub fn as_str(self) -> &'static str {
        match self {
            PanelType::Monocrystalline => "Monocrystalline",
            PanelType::Polycrystalline => "Polycrystalline",
            PanelType::ThinFilm => "Thin Film",
            PanelType::Bifacial => "Bifacial",
            PanelType::Perc => "PERC",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirtLevel {
    None,
    Light,
    Moderate,
    Heavy,
}

impl DirtLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DirtLevel::None => "None",
            DirtLevel::Light => "Light",
            DirtLevel::Moderate => "Moderate",
            DirtLevel::Heavy => "Heavy",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaintenanceKind {
    Cleaning,
    Inspection,
    Repair,
    Replacement,
}

impl MaintenanceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MaintenanceKind::Cleaning => "Cleaning",
            MaintenanceKind::Inspection => "Inspection",
            MaintenanceKind::Repair => "Repair",
            MaintenanceKind::Replacement => "Replacement",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemKind {
    Hotspot,
    Microcrack,
    Corrosion,
    #[serde(rename = "Junction Box")]
    JunctionBox,
    Delamination,
    Discoloration,
    #[serde(rename = "PID")]
    Pid,
    #[serde(rename = "Snail Trail")]
    SnailTrail,
    Shading,
    Other,
}

impl ProblemKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemKind::Hotspot => "Hotspot",
            ProblemKind::Microcrack => "Microcrack",
            ProblemKind::Corrosion => "Corrosion",
            ProblemKind::JunctionBox => "Junction Box",
            ProblemKind::Delamination => "Delamination",
            ProblemKind::Discoloration => "Discoloration",
            ProblemKind::Pid => "PID",
            ProblemKind::SnailTrail => "Snail Trail",
            ProblemKind::Shading => "Shading",
            ProblemKind::Other => "Other",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProblemSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProblemSeverity {
    pub fn as_str(self) -> &'static str {
        match self {
            ProblemSeverity::Low => "Low",
            ProblemSeverity::Medium => "Medium",
            ProblemSeverity::High => "High",
            ProblemSeverity::Critical => "Critical",
        }
    }
}

macro_rules! display_as_str {
    ($($ty:ty),+) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })+
    };
}

display_as_str!(PanelType, DirtLevel, MaintenanceKind, ProblemKind, ProblemSeverity);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub date: NaiveDate,
    pub kind: MaintenanceKind,
    pub note: String,
    pub technician: String,
    pub cost: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelProblem {
    pub kind: ProblemKind,
    pub severity: ProblemSeverity,
    pub date: NaiveDate,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelRecord {
    pub id: String,
    pub panel_type: PanelType,
    pub manufacturer: String,
    pub model: String,
    pub install_date: NaiveDate,
    pub nominal_power_w: f64,
    pub current_efficiency_pct: f64,
    pub initial_efficiency_pct: f64,
    pub current_production_kwh: f64,
    pub expected_production_kwh: f64,
    pub operating_temp_c: f64,
    pub mean_irradiance_kwh_m2: f64,
    pub ambient_temp_c: f64,
    pub humidity_pct: f64,
    pub dirt_level: DirtLevel,
    #[serde(default)]
    pub maintenance_history: Vec<MaintenanceRecord>,
    #[serde(default)]
    pub problems: Vec<PanelProblem>,
}

/// Partial update for the measured fields; `None` leaves a field untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PanelUpdate {
    pub current_efficiency_pct: Option<f64>,
    pub current_production_kwh: Option<f64>,
    pub expected_production_kwh: Option<f64>,
    pub operating_temp_c: Option<f64>,
    pub mean_irradiance_kwh_m2: Option<f64>,
    pub ambient_temp_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub dirt_level: Option<DirtLevel>,
}

impl PanelUpdate {
    fn apply(self, panel: &mut PanelRecord) {
        // Python-ish: `panel.update({k: v for k, v in changes.items() if v is not None})`
        if let Some(v) = self.current_efficiency_pct {
            panel.current_efficiency_pct = v;
        }
        if let Some(v) = self.current_production_kwh {
            panel.current_production_kwh = v;
        }
        if let Some(v) = self.expected_production_kwh {
            panel.expected_production_kwh = v;
        }
        if let Some(v) = self.operating_temp_c {
            panel.operating_temp_c = v;
        }
        if let Some(v) = self.mean_irradiance_kwh_m2 {
            panel.mean_irradiance_kwh_m2 = v;
        }
        if let Some(v) = self.ambient_temp_c {
            panel.ambient_temp_c = v;
        }
        if let Some(v) = self.humidity_pct {
            panel.humidity_pct = v;
        }
        if let Some(v) = self.dirt_level {
            panel.dirt_level = v;
        }
    }
}

/// Panels in load order. Mutators return false when the id is unknown.
#[derive(Clone, Debug, Default)]
pub struct PanelRegistry {
    panels: Vec<PanelRecord>,
}

impl PanelRegistry {
    pub fn new(panels: Vec<PanelRecord>) -> Self {
        Self { panels }
    }

    pub fn list(&self) -> &[PanelRecord] {
        &self.panels
    }

    pub fn get(&self, id: &str) -> Option<&PanelRecord> {
        self.panels.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: &str) -> Option<&mut PanelRecord> {
        self.panels.iter_mut().find(|p| p.id == id)
    }

    pub fn add_maintenance(&mut self, id: &str, record: MaintenanceRecord) -> bool {
        match self.get_mut(id) {
            Some(panel) => {
                panel.maintenance_history.push(record);
                true
            }
            None => false,
        }
    }

    pub fn add_problem(&mut self, id: &str, problem: PanelProblem) -> bool {
        match self.get_mut(id) {
            Some(panel) => {
                panel.problems.push(problem);
                true
            }
            None => false,
        }
    }

    pub fn update(&mut self, id: &str, update: PanelUpdate) -> bool {
        match self.get_mut(id) {
            Some(panel) => {
                update.apply(panel);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_panel(id: &str) -> PanelRecord {
        PanelRecord {
            id: id.into(),
            panel_type: PanelType::Monocrystalline,
            manufacturer: "SunPower".into(),
            model: "Maxeon 3".into(),
            install_date: NaiveDate::from_ymd_opt(2022, 5, 10).unwrap(),
            nominal_power_w: 400.0,
            current_efficiency_pct: 20.1,
            initial_efficiency_pct: 22.0,
            current_production_kwh: 1.8,
            expected_production_kwh: 2.0,
            operating_temp_c: 48.5,
            mean_irradiance_kwh_m2: 5.7,
            ambient_temp_c: 28.0,
            humidity_pct: 65.0,
            dirt_level: DirtLevel::Light,
            maintenance_history: vec![MaintenanceRecord {
                date: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
                kind: MaintenanceKind::Cleaning,
                note: "Routine cleaning".into(),
                technician: "Carlos Silva".into(),
                cost: 120.0,
            }],
            problems: vec![PanelProblem {
                kind: ProblemKind::Hotspot,
                severity: ProblemSeverity::Low,
                date: NaiveDate::from_ymd_opt(2023, 5, 2).unwrap(),
                description: "Small hotspot in the top right corner".into(),
            }],
        }
    }

    fn registry() -> PanelRegistry {
        PanelRegistry::new(vec![sample_panel("P001"), sample_panel("P002")])
    }

    #[test]
    fn list_keeps_load_order() {
        let r = registry();
        let ids: Vec<_> = r.list().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["P001", "P002"]);
        assert!(r.get("P002").is_some());
        assert!(r.get("P404").is_none());
    }

    #[test]
    fn maintenance_and_problems_append() {
        let mut r = registry();
        let record = MaintenanceRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            kind: MaintenanceKind::Inspection,
            note: "Semiannual inspection".into(),
            technician: "Ana Santos".into(),
            cost: 80.0,
        };
        assert!(r.add_maintenance("P001", record.clone()));
        assert!(!r.add_maintenance("P404", record));
        assert_eq!(r.get("P001").unwrap().maintenance_history.len(), 2);
        assert_eq!(r.get("P002").unwrap().maintenance_history.len(), 1);

        let problem = PanelProblem {
            kind: ProblemKind::Pid,
            severity: ProblemSeverity::Medium,
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            description: "Early PID signs".into(),
        };
        assert!(r.add_problem("P002", problem.clone()));
        assert!(!r.add_problem("P404", problem));
        assert_eq!(r.get("P002").unwrap().problems.len(), 2);
    }

    #[test]
    fn update_applies_only_present_fields() {
        let mut r = registry();
        let update = PanelUpdate {
            current_efficiency_pct: Some(19.4),
            dirt_level: Some(DirtLevel::Heavy),
            ..PanelUpdate::default()
        };
        assert!(r.update("P001", update));
        let p = r.get("P001").unwrap();
        assert_eq!(p.current_efficiency_pct, 19.4);
        assert_eq!(p.dirt_level, DirtLevel::Heavy);
        assert_eq!(p.operating_temp_c, 48.5);
        assert_eq!(p.humidity_pct, 65.0);

        assert!(!r.update("P404", PanelUpdate::default()));
    }

    #[test]
    fn enum_labels_match_serialization() {
        assert_eq!(serde_json::to_string(&PanelType::ThinFilm).unwrap(), "\"Thin Film\"");
        assert_eq!(PanelType::ThinFilm.to_string(), "Thin Film");
        assert_eq!(serde_json::to_string(&ProblemKind::SnailTrail).unwrap(), "\"Snail Trail\"");
        assert_eq!(ProblemKind::Pid.to_string(), "PID");
        assert_eq!(serde_json::to_string(&DirtLevel::None).unwrap(), "\"None\"");
        assert_eq!(serde_json::from_str::<DirtLevel>("\"None\"").unwrap(), DirtLevel::None);
    }
}
