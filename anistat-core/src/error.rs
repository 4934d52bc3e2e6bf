use crate::types::EntryId;

/// Top-level anistat error type.
///
/// All fallible operations in `anistat-core` return [`Result<T, AnistatError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum AnistatError {
    /// The fetched catalog and progress records disagree with each other.
    /// Fatal to the whole analysis.
    #[error("Data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    /// A statistic could not be computed for the given sample.
    #[error("Analysis error: {0}")]
    Analyze(#[from] AnalyzeError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Inconsistencies between catalog records, progress records and derived views.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DataIntegrityError {
    /// A progress record references an id the catalog does not contain.
    #[error("progress record references unknown entry {id}")]
    UnknownEntry {
        /// Id carried by the orphan progress record.
        id: EntryId,
    },

    /// Two catalog records share the same id.
    #[error("catalog contains entry {id} more than once")]
    DuplicateEntry {
        /// The repeated id.
        id: EntryId,
    },

    /// Two progress records share the same id.
    #[error("user progress contains entry {id} more than once")]
    DuplicateProgress {
        /// The repeated id.
        id: EntryId,
    },

    /// Watched episode count exceeds the in-progress ceiling.
    #[error("entry {id} has {watched} watched episodes, above the ceiling of {ceiling}")]
    WatchedAboveCeiling {
        /// Entry the count belongs to.
        id: EntryId,
        /// Reported watched episodes.
        watched: u32,
        /// Configured ceiling.
        ceiling: u32,
    },

    /// A catalog or user score is outside `0..=10` or not a number.
    #[error("entry {id} has score {score} outside 0..=10")]
    ScoreOutOfRange {
        /// Entry the score belongs to.
        id: EntryId,
        /// The offending score.
        score: f64,
    },

    /// A franchise component names an entry the table does not hold.
    #[error("franchise component references missing entry {id}")]
    MissingMember {
        /// The unresolved id.
        id: EntryId,
    },
}

/// Errors from the statistics engine.
///
/// Only truly undefined arithmetic is an error; an empty filter result is not.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeError {
    /// Not enough data for this statistic's denominator to be defined.
    #[error("Insufficient data for analysis: {0}")]
    InsufficientData(String),
}

/// Errors in anistat configuration parsing and validation.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration values are present but semantically invalid.
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, AnistatError>`.
pub type Result<T> = std::result::Result<T, AnistatError>;
