//! YAML configuration for the generate command.
//!
//! Supports default row count, seed and dialect, per-table skipping, and
//! per-column value strategies.

use super::{ConstantGenerator, FakeGenerator, FakeKind, GeneratorRegistry};
use crate::parser::SqlDialect;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// How values for one column are produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ColumnStrategy {
    /// Built-in generator for the column's type
    #[default]
    Random,

    /// Realistic fake data
    Fake {
        /// Generator name: email, name, phone, city, uuid, etc.
        generator: String,
    },

    /// The same value on every row
    Constant {
        /// The constant value to use
        value: String,
    },
}

impl ColumnStrategy {
    /// Validate the strategy configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        match self {
            ColumnStrategy::Random => Ok(()),
            ColumnStrategy::Fake { generator } => {
                generator
                    .parse::<FakeKind>()
                    .map_err(|e| anyhow::anyhow!("{}", e))?;
                Ok(())
            }
            ColumnStrategy::Constant { value } => {
                if value.is_empty() {
                    anyhow::bail!("Constant strategy requires a non-empty value");
                }
                Ok(())
            }
        }
    }
}

/// Per-table settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Resolve the table's columns but emit no INSERT for it
    pub skip: bool,
}

/// Complete YAML configuration for the generate command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateYamlConfig {
    /// Rows per table
    pub rows: Option<usize>,
    /// Random seed for reproducible output
    pub seed: Option<u64>,
    /// Output dialect
    pub dialect: Option<SqlDialect>,
    /// Per-table settings
    pub tables: HashMap<String, TableConfig>,
    /// Per-column strategies keyed by `table.column`
    pub columns: HashMap<String, ColumnStrategy>,
}

impl GenerateYamlConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let config: GenerateYamlConfig = serde_yaml_ng::from_str(content)?;
        Ok(config)
    }

    /// Check column keys and strategies
    pub fn validate(&self) -> anyhow::Result<()> {
        for (key, strategy) in &self.columns {
            match key.split_once('.') {
                Some((table, column)) if !table.is_empty() && !column.is_empty() => {}
                _ => anyhow::bail!(
                    "Invalid column key '{}': expected 'table.column'",
                    key
                ),
            }
            strategy
                .validate()
                .map_err(|e| anyhow::anyhow!("Column '{}': {}", key, e))?;
        }
        Ok(())
    }

    /// Get configuration for a specific table
    pub fn get_table_config(&self, table_name: &str) -> Option<&TableConfig> {
        self.tables.get(table_name).or_else(|| {
            // Try case-insensitive match
            let lower = table_name.to_lowercase();
            self.tables
                .iter()
                .find(|(k, _)| k.to_lowercase() == lower)
                .map(|(_, v)| v)
        })
    }

    /// Check if a table should be skipped
    pub fn should_skip(&self, table_name: &str) -> bool {
        self.get_table_config(table_name)
            .map(|c| c.skip)
            .unwrap_or(false)
    }

    /// Names of all tables marked `skip: true`
    pub fn skipped_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .iter()
            .filter(|(_, c)| c.skip)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Get strategy for a column (case-insensitive)
    pub fn get_column_strategy(&self, full_name: &str) -> Option<&ColumnStrategy> {
        self.columns.get(full_name).or_else(|| {
            let lower = full_name.to_lowercase();
            self.columns
                .iter()
                .find(|(k, _)| k.to_lowercase() == lower)
                .map(|(_, v)| v)
        })
    }

    /// Default registry with this configuration's column overrides applied
    pub fn build_registry(&self) -> anyhow::Result<GeneratorRegistry> {
        let mut registry = GeneratorRegistry::with_defaults();
        for (key, strategy) in &self.columns {
            match strategy {
                ColumnStrategy::Random => {}
                ColumnStrategy::Fake { generator } => {
                    let kind = generator
                        .parse::<FakeKind>()
                        .map_err(|e| anyhow::anyhow!("Column '{}': {}", key, e))?;
                    registry.register_column(key, Arc::new(FakeGenerator::new(kind)));
                }
                ColumnStrategy::Constant { value } => {
                    registry.register_column(key, Arc::new(ConstantGenerator::new(value.clone())));
                }
            }
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
rows: 25
seed: 42
dialect: postgres
tables:
  Audit_Log:
    skip: true
columns:
  users.email:
    strategy: fake
    generator: email
  users.status:
    strategy: constant
    value: active
  users.bio:
    strategy: random
"#;

    #[test]
    fn test_parse_full_config() {
        let config = GenerateYamlConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.rows, Some(25));
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.dialect, Some(SqlDialect::Postgres));
        assert_eq!(
            config.get_column_strategy("USERS.EMAIL"),
            Some(&ColumnStrategy::Fake {
                generator: "email".to_string()
            })
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_table_lookup_case_insensitive() {
        let config = GenerateYamlConfig::from_yaml(SAMPLE).unwrap();
        assert!(config.should_skip("audit_log"));
        assert!(!config.should_skip("users"));
        assert_eq!(config.skipped_tables(), vec!["Audit_Log".to_string()]);
    }

    #[test]
    fn test_empty_config_defaults() {
        let config = GenerateYamlConfig::from_yaml("{}").unwrap();
        assert_eq!(config.rows, None);
        assert!(config.tables.is_empty());
        assert!(config.columns.is_empty());
    }

    #[test]
    fn test_validate_rejects_bad_key() {
        let config = GenerateYamlConfig::from_yaml(
            "columns:\n  email:\n    strategy: fake\n    generator: email\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_unknown_generator() {
        let config = GenerateYamlConfig::from_yaml(
            "columns:\n  users.email:\n    strategy: fake\n    generator: nope\n",
        )
        .unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Unknown fake generator"));
    }

    #[test]
    fn test_validate_rejects_empty_constant() {
        let config = GenerateYamlConfig::from_yaml(
            "columns:\n  users.status:\n    strategy: constant\n    value: \"\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_build_registry_registers_overrides() {
        let config = GenerateYamlConfig::from_yaml(SAMPLE).unwrap();
        let registry = config.build_registry().unwrap();
        assert!(registry.has_override("users.email"));
        assert!(registry.has_override("Users.Status"));
        assert!(!registry.has_override("users.bio"));
    }
}
