use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{FinanzasError, Result};
use crate::models::Kind;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub user_name: String,
    pub income_categories: Vec<String>,
    pub expense_categories: Vec<String>,
    pub income_methods: Vec<String>,
    pub expense_methods: Vec<String>,
    pub credit_cards: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file().to_string_lossy().to_string(),
            source_url: None,
            user_name: String::new(),
            income_categories: strings(&["Sueldo", "Aguinaldo", "Varios"]),
            expense_categories: strings(&["Colegio", "Comida", "Transporte", "Hogar", "Otros"]),
            income_methods: strings(&["Cuenta Bancaria", "Efectivo"]),
            expense_methods: strings(&[
                "Efectivo",
                "Tarjeta Débito",
                "Visa Ctes",
                "Visa Nación",
                "MasterCard",
            ]),
            credit_cards: strings(&["Visa Ctes", "Visa Nación", "MasterCard"]),
        }
    }
}

impl Settings {
    pub fn categories(&self, kind: Kind) -> &[String] {
        match kind {
            Kind::Income => &self.income_categories,
            Kind::Expense => &self.expense_categories,
        }
    }

    pub fn methods(&self, kind: Kind) -> &[String] {
        match kind {
            Kind::Income => &self.income_methods,
            Kind::Expense => &self.expense_methods,
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("finanzas")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn default_data_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Documents")
        .join("finanzas")
        .join("movimientos.csv")
}

pub fn load_settings() -> Settings {
    let path = settings_path();
    if path.exists() {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        match serde_json::from_str(&content) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("ignoring unreadable {}: {e}", path.display());
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
        .map_err(|e| FinanzasError::Settings(e.to_string()))?;
    std::fs::write(settings_path(), format!("{json}\n"))?;
    Ok(())
}

pub fn settings_file_exists() -> bool {
    settings_path().exists()
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

/// Expand `~` and anchor relative paths at the current directory, so a
/// stored path does not depend on where later commands run.
pub fn absolute_path(path: &str) -> Result<String> {
    let expanded = PathBuf::from(shellexpand_path(path));
    if expanded.is_absolute() {
        return Ok(expanded.to_string_lossy().to_string());
    }
    Ok(std::env::current_dir()?
        .join(expanded)
        .to_string_lossy()
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_json() {
        let mut settings = Settings::default();
        settings.user_name = "Alex".to_string();
        settings.source_url = Some("https://example.com/a.csv".to_string());
        let json = serde_json::to_string_pretty(&settings).unwrap();
        let loaded: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.user_name, "Alex");
        assert_eq!(loaded.source_url.as_deref(), Some("https://example.com/a.csv"));
        assert_eq!(loaded.credit_cards, settings.credit_cards);
    }

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert!(s.user_name.is_empty());
        assert!(s.source_url.is_none());
        assert!(s.data_file.ends_with("movimientos.csv"));
        assert_eq!(s.categories(Kind::Income)[0], "Sueldo");
        assert_eq!(s.methods(Kind::Expense).len(), 5);
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let json = r#"{"data_file": "/tmp/m.csv", "credit_cards": ["Amex"]}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.data_file, "/tmp/m.csv");
        assert_eq!(s.credit_cards, vec!["Amex".to_string()]);
        assert_eq!(s.expense_categories.len(), 5);
    }

    #[test]
    fn test_source_url_omitted_when_unset() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(!json.contains("source_url"));
    }

    #[test]
    fn test_absolute_path_anchors_relative_files() {
        let stored = absolute_path("no-such-dir/libro.csv").unwrap();
        let expected = std::env::current_dir().unwrap().join("no-such-dir/libro.csv");
        assert_eq!(PathBuf::from(&stored), expected);
        assert_eq!(
            absolute_path("/nonexistent-finanzas/libro.csv").unwrap(),
            "/nonexistent-finanzas/libro.csv"
        );
    }

    #[test]
    fn test_shellexpand_tilde() {
        let expanded = shellexpand_path("~/x.csv");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("x.csv"));
    }
}
