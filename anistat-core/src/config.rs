use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{RelationKind, TagDimension};

/// Top-level anistat configuration, matching `anistat.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnistatConfig {
    #[serde(default)]
    pub clustering: ClusteringSection,
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub statistics: StatisticsSection,
}

impl AnistatConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.clustering.continuity_kinds.is_empty() {
            return Err(ConfigError::Invalid(
                "clustering.continuity_kinds must not be empty".into(),
            ));
        }
        if self.statistics.min_group_size == 0 {
            return Err(ConfigError::Invalid(
                "statistics.min_group_size must be at least 1".into(),
            ));
        }
        let close = self.statistics.agreement_close;
        let far = self.statistics.agreement_far;
        if !(0.0..=1.0).contains(&close) || !(0.0..=1.0).contains(&far) || close > far {
            return Err(ConfigError::Invalid(format!(
                "statistics agreement thresholds must satisfy 0 <= close ({close}) <= far ({far}) <= 1"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringSection {
    /// Relation kinds that keep two entries in the same franchise.
    pub continuity_kinds: BTreeSet<RelationKind>,
}

impl Default for ClusteringSection {
    fn default() -> Self {
        Self {
            continuity_kinds: RelationKind::CONTINUITY.into_iter().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Upper bound accepted for a user's watched episode count.
    pub max_watched_episodes: u32,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            max_watched_episodes: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsSection {
    /// Smallest tag group kept by the categorical score breakdown.
    pub min_group_size: usize,
    /// Run independent statistics on the rayon pool.
    pub parallel: bool,
    /// Absolute rank difference at or below which user and catalog agree.
    pub agreement_close: f64,
    /// Absolute rank difference above which user and catalog disagree.
    pub agreement_far: f64,
    /// Tag dimensions covered by breakdown and co-occurrence.
    pub dimensions: Vec<TagDimension>,
}

impl Default for StatisticsSection {
    fn default() -> Self {
        Self {
            min_group_size: 8,
            parallel: true,
            agreement_close: 0.05,
            agreement_far: 0.15,
            dimensions: TagDimension::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AnistatConfig::default();
        config.validate().unwrap();
        assert_eq!(config.statistics.min_group_size, 8);
        assert_eq!(config.clustering.continuity_kinds.len(), 5);
        assert!(!config.clustering.continuity_kinds.contains(&RelationKind::Other));
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = AnistatConfig::from_toml_str("").unwrap();
        assert_eq!(config.store.max_watched_episodes, 10_000);
        assert_eq!(config.statistics.dimensions.len(), 4);
    }

    #[test]
    fn partial_sections_parse() {
        let raw = r#"
[clustering]
continuity_kinds = ["sequel", "Prequel"]

[statistics]
min_group_size = 3
parallel = false
agreement_close = 0.1
agreement_far = 0.2
dimensions = ["genre", "studio"]
"#;
        let config = AnistatConfig::from_toml_str(raw).unwrap();
        assert_eq!(
            config.clustering.continuity_kinds,
            BTreeSet::from([RelationKind::Sequel, RelationKind::Prequel])
        );
        assert_eq!(config.statistics.min_group_size, 3);
        assert!(!config.statistics.parallel);
        assert_eq!(
            config.statistics.dimensions,
            vec![TagDimension::Genre, TagDimension::Studio]
        );
    }

    #[test]
    fn empty_continuity_is_invalid() {
        let raw = "[clustering]\ncontinuity_kinds = []\n";
        let err = AnistatConfig::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn inverted_agreement_thresholds_are_invalid() {
        let raw = "[statistics]\nagreement_close = 0.3\nagreement_far = 0.1\n";
        let err = AnistatConfig::from_toml_str(raw).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = AnistatConfig::from_toml_str("[clustering\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = AnistatConfig::load(&dir.path().join("anistat.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anistat.toml");
        std::fs::write(&path, "[store]\nmax_watched_episodes = 500\n").unwrap();
        let config = AnistatConfig::load(&path).unwrap();
        assert_eq!(config.store.max_watched_episodes, 500);
    }
}
