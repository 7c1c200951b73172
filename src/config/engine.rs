//! Dialog engine configuration

use serde::Deserialize;

use crate::domain::dialogs::VersionChangePolicy;

use super::error::ValidationError;

/// Engine behavior settings
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// What to do when a running dialog's definition changed between turns
    #[serde(default)]
    pub version_change: VersionChangePolicy,
}

impl EngineConfig {
    /// Validate engine configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_config_defaults_to_warn() {
        let config = EngineConfig::default();
        assert_eq!(config.version_change, VersionChangePolicy::Warn);
        assert!(config.validate().is_ok());
    }
}
