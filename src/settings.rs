use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::columns::ColumnMapping;
use crate::error::{BursarError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudentDefaults {
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub gender: String,
    pub residence: String,
}

impl Default for StudentDefaults {
    fn default() -> Self {
        Self {
            date_of_birth: "2000-01-01".to_string(),
            place_of_birth: "UNKNOWN".to_string(),
            gender: "UNKNOWN".to_string(),
            residence: "UNKNOWN".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: String,
    /// Marks students created by the importer; cleanup keys off it.
    pub matricule_prefix: String,
    /// Matricule of the user payments are attributed to.
    pub admin_matricule: String,
    pub default_expected_fee: f64,
    pub placeholder_phone: String,
    pub payment_method: String,
    pub student_defaults: StudentDefaults,
    /// Sheet token → class-section, layered over the built-in table.
    pub class_map: BTreeMap<String, String>,
    pub columns: ColumnMapping,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir().to_string_lossy().to_string(),
            matricule_prefix: "IMP".to_string(),
            admin_matricule: "ADMIN001".to_string(),
            default_expected_fee: 175_000.0,
            placeholder_phone: "000000000".to_string(),
            payment_method: "CASH".to_string(),
            student_defaults: StudentDefaults::default(),
            class_map: BTreeMap::new(),
            columns: ColumnMapping::default(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bursar")
}

fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".local")
        .join("share")
        .join("bursar")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("ignoring unreadable {}: {e}", path.display());
                Settings::default()
            }
        }
    } else {
        Settings::default()
    }
}

pub fn save_settings(settings: &Settings) -> Result<()> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| BursarError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn database_path(settings: &Settings) -> PathBuf {
    PathBuf::from(&settings.data_dir).join("bursar.db")
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| PathBuf::from(path))
        .to_string_lossy()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let settings = Settings {
            data_dir: "/tmp/test".to_string(),
            matricule_prefix: "GBHS".to_string(),
            ..Settings::default()
        };
        let json = serde_json::to_string_pretty(&settings).unwrap();
        std::fs::write(&path, &json).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let loaded: Settings = serde_json::from_str(&content).unwrap();
        assert_eq!(loaded.matricule_prefix, "GBHS");
        assert_eq!(loaded.data_dir, "/tmp/test");
        assert_eq!(loaded.columns, ColumnMapping::default());
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.default_expected_fee, 175_000.0);
        assert_eq!(s.placeholder_phone, "000000000");
        assert!(s.class_map.is_empty());
        assert!(!s.data_dir.is_empty());
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"data_dir": "/tmp/test", "admin_matricule": "BURSAR01", "class_map": {"6X": "FORM 6 X"}}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.admin_matricule, "BURSAR01");
        assert_eq!(s.matricule_prefix, "IMP");
        assert_eq!(s.student_defaults.gender, "UNKNOWN");
        assert_eq!(s.class_map.get("6X").map(String::as_str), Some("FORM 6 X"));
    }

    #[test]
    fn test_database_path_in_data_dir() {
        let s = Settings {
            data_dir: "/srv/school".to_string(),
            ..Settings::default()
        };
        assert_eq!(database_path(&s), PathBuf::from("/srv/school/bursar.db"));
    }
}
