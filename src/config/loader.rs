//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading incentive
//! configurations from YAML files.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::calculation::get_condition;
use crate::error::{EngineError, EngineResult};
use crate::models::EmployeeType;

use super::types::{
    IncentiveConfig, PayoutRule, PositionMatrix, ProgramMetadata, ProgressionConfig,
};

/// Loads and provides access to the incentive configuration.
///
/// # Directory Structure
///
/// ```text
/// config/qip/
/// ├── metadata.yaml     # Program metadata and rule set version
/// ├── positions.yaml    # Position applicability matrix
/// └── progression.yaml  # Progression caps and payout tables
/// ```
///
/// # Example
///
/// ```no_run
/// use qip_incentive_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/qip").unwrap();
/// println!("Rule set version: {}", loader.metadata().version);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: IncentiveConfig,
}

impl ConfigLoader {
    /// Loads and validates configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - The matrix references an unknown condition id
    /// - Rules reference missing progression groups or peer rules
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<ProgramMetadata>(&path.join("metadata.yaml"))?;
        let matrix = Self::load_yaml::<PositionMatrix>(&path.join("positions.yaml"))?;
        let progression = Self::load_yaml::<ProgressionConfig>(&path.join("progression.yaml"))?;

        let loader = Self::from_config(IncentiveConfig::new(metadata, matrix, progression))?;

        info!(
            path = %path.display(),
            version = %loader.metadata().version,
            rules = loader.config.matrix().all_rules().count(),
            progression_groups = loader.config.progression().groups.len(),
            "Loaded incentive configuration"
        );

        Ok(loader)
    }

    /// Wraps an in-memory configuration after validating it.
    pub fn from_config(config: IncentiveConfig) -> EngineResult<Self> {
        validate_config(&config)?;
        Ok(Self { config })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying incentive configuration.
    pub fn config(&self) -> &IncentiveConfig {
        &self.config
    }

    /// Returns the program metadata.
    pub fn metadata(&self) -> &ProgramMetadata {
        self.config.metadata()
    }
}

/// Checks a configuration for internal consistency.
///
/// Run at load time and again at the start of every batch, since a batch may
/// be handed a configuration built in memory.
pub fn validate_config(config: &IncentiveConfig) -> EngineResult<()> {
    let matrix = config.matrix();
    let progression = config.progression();

    for employee_type in EmployeeType::ALL {
        if !matrix.types.contains_key(&employee_type) {
            return Err(EngineError::InvalidConfig {
                message: format!("no position table for {}", employee_type),
            });
        }
    }

    let mut names = HashSet::new();
    for (employee_type, rule) in matrix.all_rules() {
        if !names.insert(rule.name.as_str()) {
            return Err(EngineError::InvalidConfig {
                message: format!("duplicate position rule name '{}'", rule.name),
            });
        }

        for id in &rule.conditions {
            get_condition(*id)?;
        }

        match &rule.payout {
            PayoutRule::Progressive { progression: group } => {
                if progression.group(group).is_none() {
                    return Err(EngineError::InvalidConfig {
                        message: format!(
                            "rule '{}' uses unknown progression group '{}'",
                            rule.name, group
                        ),
                    });
                }
            }
            PayoutRule::ReferenceAverage { reference } => {
                let is_progressive = matrix
                    .rule(reference)
                    .is_some_and(|peer| matches!(peer.payout, PayoutRule::Progressive { .. }));
                if !is_progressive {
                    return Err(EngineError::InvalidConfig {
                        message: format!(
                            "rule '{}' references '{}' which is not a progressive rule",
                            rule.name, reference
                        ),
                    });
                }
            }
            PayoutRule::Zero => {}
        }

        debug!(
            employee_type = %employee_type,
            rule = %rule.name,
            conditions = ?rule.conditions,
            "Validated position rule"
        );
    }

    for (name, group) in &progression.groups {
        if group.cap < 0 {
            // Caught per record by the tracker; reported here so it shows up at load.
            warn!(group = %name, cap = group.cap, "Progression group has a negative cap");
            continue;
        }

        let cap = i64::from(group.cap);
        if let Some(month) = group.table.keys().find(|month| i64::from(**month) > cap) {
            return Err(EngineError::InvalidConfig {
                message: format!(
                    "progression group '{}' has an entry for month {} above its cap {}",
                    name, month, group.cap
                ),
            });
        }

        let amounts: Vec<_> = group.table.values().collect();
        if amounts.iter().any(|amount| amount.is_sign_negative()) {
            return Err(EngineError::InvalidConfig {
                message: format!("progression group '{}' has a negative amount", name),
            });
        }
        if amounts.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(EngineError::InvalidConfig {
                message: format!("progression group '{}' is not non-decreasing", name),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PositionRule, ProgressionGroup};
    use rust_decimal::Decimal;

    fn config_path() -> &'static str {
        "./config/qip"
    }

    fn loaded() -> IncentiveConfig {
        ConfigLoader::load(config_path()).unwrap().config().clone()
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.metadata().code, "QIP");
        assert_eq!(loader.metadata().currency, "VND");
    }

    #[test]
    fn test_progression_caps_differ_per_group() {
        let config = loaded();
        assert_eq!(config.progression().group("inspector").unwrap().cap, 15);
        assert_eq!(config.progression().group("management").unwrap().cap, 12);
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(EngineError::ConfigNotFound { path }) => {
                assert!(path.contains("metadata.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_unknown_condition_id_is_rejected() {
        let mut config = loaded();
        let (metadata, mut matrix, progression) = (
            config.metadata().clone(),
            config.matrix().clone(),
            config.progression().clone(),
        );
        matrix
            .types
            .get_mut(&EmployeeType::Type1)
            .unwrap()
            .default
            .conditions
            .insert(11);
        config = IncentiveConfig::new(metadata, matrix, progression);

        assert_eq!(
            ConfigLoader::from_config(config).err(),
            Some(EngineError::UnknownCondition { id: 11 })
        );
    }

    #[test]
    fn test_unknown_progression_group_is_rejected() {
        let config = loaded();
        let mut matrix = config.matrix().clone();
        matrix.types.get_mut(&EmployeeType::Type1).unwrap().default.payout =
            PayoutRule::Progressive {
                progression: "missing".to_string(),
            };
        let config = IncentiveConfig::new(
            config.metadata().clone(),
            matrix,
            config.progression().clone(),
        );

        assert!(matches!(
            validate_config(&config),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_reference_to_non_progressive_rule_is_rejected() {
        let config = loaded();
        let mut matrix = config.matrix().clone();
        matrix.types.get_mut(&EmployeeType::Type2).unwrap().default.payout =
            PayoutRule::ReferenceAverage {
                reference: "type3_default".to_string(),
            };
        let config = IncentiveConfig::new(
            config.metadata().clone(),
            matrix,
            config.progression().clone(),
        );

        assert!(matches!(
            validate_config(&config),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_duplicate_rule_name_is_rejected() {
        let config = loaded();
        let mut matrix = config.matrix().clone();
        let table = matrix.types.get_mut(&EmployeeType::Type1).unwrap();
        let duplicate: PositionRule = table.positions[0].clone();
        table.positions.push(duplicate);
        let config = IncentiveConfig::new(
            config.metadata().clone(),
            matrix,
            config.progression().clone(),
        );

        assert!(matches!(
            validate_config(&config),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_decreasing_progression_table_is_rejected() {
        let config = loaded();
        let mut progression = config.progression().clone();
        progression.groups.insert(
            "management".to_string(),
            ProgressionGroup {
                cap: 3,
                table: [
                    (1, Decimal::from(200_000)),
                    (2, Decimal::from(100_000)),
                ]
                .into_iter()
                .collect(),
            },
        );
        let config =
            IncentiveConfig::new(config.metadata().clone(), config.matrix().clone(), progression);

        assert!(matches!(
            validate_config(&config),
            Err(EngineError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_table_entry_above_cap_is_rejected() {
        let config = loaded();
        let mut progression = config.progression().clone();
        progression
            .groups
            .get_mut("management")
            .unwrap()
            .table
            .insert(13, Decimal::from(2_000_000));
        let config =
            IncentiveConfig::new(config.metadata().clone(), config.matrix().clone(), progression);

        assert!(validate_config(&config).is_err());
    }
}
