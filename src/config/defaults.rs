//! Ledger defaults loading from a TOML file
//!
//! Every new ledger is seeded with a category set and a few settings. The set can be
//! overridden by a TOML file (see [`load_defaults`]); otherwise the built-in set is used.

use crate::entities::CategoryKind;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming an alternative defaults file.
pub const DEFAULTS_PATH_ENV: &str = "CASHFLOW_DEFAULTS";

/// Everything seeded into a freshly created ledger
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct LedgerDefaults {
    /// Categories created with every ledger
    #[serde(default)]
    pub categories: Vec<CategoryDefault>,
    /// Settings created with every ledger
    #[serde(default)]
    pub settings: Vec<SettingDefault>,
}

/// A single default category
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct CategoryDefault {
    /// Category name
    pub name: String,
    /// `income` or `expense`
    #[serde(rename = "type")]
    pub kind: CategoryKind,
    /// Optional icon
    pub icon: Option<String>,
    /// Optional color
    pub color: Option<String>,
}

/// A single default setting
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SettingDefault {
    /// Setting key
    pub key: String,
    /// Initial value
    pub value: String,
}

const BUILTIN_CATEGORIES: [(&str, CategoryKind, &str, &str); 10] = [
    ("Salary", CategoryKind::Income, "💼", "#22c55e"),
    ("Freelance", CategoryKind::Income, "💻", "#10b981"),
    ("Rental", CategoryKind::Income, "🏠", "#14b8a6"),
    ("Other Income", CategoryKind::Income, "💰", "#06b6d4"),
    ("Housing", CategoryKind::Expense, "🏡", "#ef4444"),
    ("Utilities", CategoryKind::Expense, "⚡", "#f97316"),
    ("Groceries", CategoryKind::Expense, "🛒", "#f59e0b"),
    ("Transport", CategoryKind::Expense, "🚗", "#eab308"),
    ("Subscriptions", CategoryKind::Expense, "📺", "#84cc16"),
    ("Other Expense", CategoryKind::Expense, "💸", "#64748b"),
];

/// Key of the setting the monthly summary starts its running balance from.
pub const STARTING_BALANCE_KEY: &str = "starting_balance";

impl Default for LedgerDefaults {
    fn default() -> Self {
        Self {
            categories: BUILTIN_CATEGORIES
                .iter()
                .map(|(name, kind, icon, color)| CategoryDefault {
                    name: (*name).to_string(),
                    kind: *kind,
                    icon: Some((*icon).to_string()),
                    color: Some((*color).to_string()),
                })
                .collect(),
            settings: vec![SettingDefault {
                key: STARTING_BALANCE_KEY.to_string(),
                value: "0".to_string(),
            }],
        }
    }
}

impl LedgerDefaults {
    /// Rejects sets that would violate a uniqueness constraint at ledger creation.
    pub fn validate(&self) -> Result<()> {
        let mut seen_categories = std::collections::HashSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(Error::Config {
                    message: "Default category name cannot be empty".to_string(),
                });
            }
            if !seen_categories.insert((category.name.trim(), category.kind)) {
                return Err(Error::Config {
                    message: format!("Duplicate default category: {}", category.name),
                });
            }
        }

        let mut seen_keys = std::collections::HashSet::new();
        for setting in &self.settings {
            if !seen_keys.insert(setting.key.as_str()) {
                return Err(Error::Config {
                    message: format!("Duplicate default setting: {}", setting.key),
                });
            }
        }
        Ok(())
    }
}

/// Loads ledger defaults from a TOML file
///
/// # Arguments
/// * `path` - Path to the defaults file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - The set contains duplicates
pub fn load_defaults<P: AsRef<Path>>(path: P) -> Result<LedgerDefaults> {
    debug!("Loading ledger defaults from {:?}", path.as_ref());
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read defaults file: {e}"),
    })?;

    let defaults: LedgerDefaults = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse defaults file: {e}"),
    })?;
    defaults.validate()?;
    Ok(defaults)
}

/// Loads the defaults named by `CASHFLOW_DEFAULTS`, or the built-in set when unset.
pub fn load_configured_defaults() -> Result<LedgerDefaults> {
    match std::env::var(DEFAULTS_PATH_ENV) {
        Ok(path) => load_defaults(path),
        Err(std::env::VarError::NotPresent) => {
            info!("{DEFAULTS_PATH_ENV} not set, using built-in ledger defaults");
            Ok(LedgerDefaults::default())
        }
        Err(e) => Err(e.into()),
    }
}
