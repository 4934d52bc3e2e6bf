use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use chrono::{NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

// ── Typed ID wrappers ──────────────────────────────────────────────

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
            Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }
    };
}

typed_id!(EntryId);

// ── Relations ──────────────────────────────────────────────────────

/// How one catalog entry relates to another.
///
/// Every kind is kept for display; only the configured continuity subset
/// takes part in franchise clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum RelationKind {
    Sequel,
    Prequel,
    SideStory,
    ParentStory,
    AlternativeVersion,
    Other,
}

impl RelationKind {
    pub const ALL: [Self; 6] = [
        Self::Sequel,
        Self::Prequel,
        Self::SideStory,
        Self::ParentStory,
        Self::AlternativeVersion,
        Self::Other,
    ];

    /// Kinds treated as the same ongoing work unless configured otherwise.
    pub const CONTINUITY: [Self; 5] = [
        Self::Sequel,
        Self::Prequel,
        Self::SideStory,
        Self::ParentStory,
        Self::AlternativeVersion,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequel => "sequel",
            Self::Prequel => "prequel",
            Self::SideStory => "side_story",
            Self::ParentStory => "parent_story",
            Self::AlternativeVersion => "alternative_version",
            Self::Other => "other",
        }
    }

    /// Parse a catalog spelling ("Side story", "alternative-version", ...).
    /// Anything unrecognised is [`RelationKind::Other`].
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        match normalized.as_str() {
            "sequel" => Self::Sequel,
            "prequel" => Self::Prequel,
            "side_story" => Self::SideStory,
            "parent_story" => Self::ParentStory,
            "alternative_version" => Self::AlternativeVersion,
            _ => Self::Other,
        }
    }
}

impl From<String> for RelationKind {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl std::fmt::Display for RelationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed relation as declared by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub id: EntryId,
    pub kind: RelationKind,
}

// ── Tags ───────────────────────────────────────────────────────────

/// Categorical tag dimension an entry is labelled along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagDimension {
    Genre,
    Theme,
    Studio,
    Demographic,
}

impl TagDimension {
    pub const ALL: [Self; 4] = [Self::Genre, Self::Theme, Self::Studio, Self::Demographic];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Genre => "genre",
            Self::Theme => "theme",
            Self::Studio => "studio",
            Self::Demographic => "demographic",
        }
    }
}

impl std::fmt::Display for TagDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One sorted, de-duplicated tag set per dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tags {
    #[serde(default)]
    pub genres: BTreeSet<String>,
    #[serde(default)]
    pub themes: BTreeSet<String>,
    #[serde(default)]
    pub studios: BTreeSet<String>,
    #[serde(default)]
    pub demographics: BTreeSet<String>,
}

impl Tags {
    pub fn get(&self, dimension: TagDimension) -> &BTreeSet<String> {
        match dimension {
            TagDimension::Genre => &self.genres,
            TagDimension::Theme => &self.themes,
            TagDimension::Studio => &self.studios,
            TagDimension::Demographic => &self.demographics,
        }
    }
}

// ── Broadcast slot ─────────────────────────────────────────────────

/// Weekly broadcast slot in the broadcaster's local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    pub weekday: Weekday,
    pub time: NaiveTime,
    pub timezone: Tz,
}

// ── Raw input records ──────────────────────────────────────────────

/// One catalog record as handed over by the fetch collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: EntryId,
    /// Default (romanized) title.
    pub title: String,
    /// Localized titles keyed by language tag (`en`, `ja`, `fr-FR`, ...).
    #[serde(default)]
    pub titles: BTreeMap<String, String>,
    #[serde(default)]
    pub episodes: Option<u32>,
    #[serde(default, with = "duration_secs")]
    pub episode_avg_duration: Option<Duration>,
    #[serde(default)]
    pub air_start: Option<NaiveDate>,
    #[serde(default)]
    pub air_end: Option<NaiveDate>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub studios: Vec<String>,
    #[serde(default)]
    pub demographics: Vec<String>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default)]
    pub broadcast: Option<Broadcast>,
}

/// The user's progress on one entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: EntryId,
    #[serde(default)]
    pub watched_episodes: Option<u32>,
    #[serde(default)]
    pub score: Option<f64>,
}

// ── Entry ──────────────────────────────────────────────────────────

/// One row of the merged entry table: catalog metadata plus user progress.
///
/// `user_watched_episodes` is `None` for entries the user never tracked,
/// which is distinct from `Some(0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: EntryId,
    pub title: String,
    pub episode_count: Option<u32>,
    #[serde(with = "duration_secs")]
    pub episode_avg_duration: Option<Duration>,
    pub air_start: Option<NaiveDate>,
    pub air_end: Option<NaiveDate>,
    pub catalog_score: Option<f64>,
    pub tags: Tags,
    pub relations: Vec<Relation>,
    pub broadcast: Option<Broadcast>,
    pub user_watched_episodes: Option<u32>,
    pub user_score: Option<f64>,
}

impl Entry {
    /// A bare entry with no metadata and no user progress.
    pub fn new(id: impl Into<EntryId>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            episode_count: None,
            episode_avg_duration: None,
            air_start: None,
            air_end: None,
            catalog_score: None,
            tags: Tags::default(),
            relations: Vec::new(),
            broadcast: None,
            user_watched_episodes: None,
            user_score: None,
        }
    }

    /// `(catalog_score, user_score)` when both are present.
    pub fn paired_scores(&self) -> Option<(f64, f64)> {
        Some((self.catalog_score?, self.user_score?))
    }
}

/// Serialize `Option<Duration>` as whole seconds.
pub(crate) mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Duration>, ser: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => ser.serialize_some(&d.as_secs()),
            None => ser.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(de)?.map(Duration::from_secs))
    }
}

// ── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_kind_parses_catalog_spellings() {
        assert_eq!(RelationKind::parse("Sequel"), RelationKind::Sequel);
        assert_eq!(RelationKind::parse("Side story"), RelationKind::SideStory);
        assert_eq!(
            RelationKind::parse("alternative-version"),
            RelationKind::AlternativeVersion
        );
        assert_eq!(RelationKind::parse(" Parent Story "), RelationKind::ParentStory);
        assert_eq!(RelationKind::parse("Spin-off"), RelationKind::Other);
        assert_eq!(RelationKind::parse("summary"), RelationKind::Other);
    }

    #[test]
    fn relation_kind_deserializes_unknown_as_other() {
        let kind: RelationKind = serde_json::from_str("\"character\"").unwrap();
        assert_eq!(kind, RelationKind::Other);
        let kind: RelationKind = serde_json::from_str("\"Side Story\"").unwrap();
        assert_eq!(kind, RelationKind::SideStory);
    }

    #[test]
    fn catalog_record_minimal_json() {
        let json = r#"{"id": 5, "title": "Cowboy Bebop"}"#;
        let record: CatalogRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, EntryId(5));
        assert!(record.relations.is_empty());
        assert!(record.episode_avg_duration.is_none());
        assert!(record.broadcast.is_none());
    }

    #[test]
    fn catalog_record_full_json() {
        let json = r#"{
            "id": 1,
            "title": "Shingeki no Kyojin",
            "titles": {"en": "Attack on Titan"},
            "episodes": 25,
            "episode_avg_duration": 1440,
            "air_start": "2013-04-07",
            "air_end": "2013-09-29",
            "score": 8.5,
            "genres": ["Action", "Drama"],
            "relations": [{"id": 2, "kind": "sequel"}],
            "broadcast": {"weekday": "Sun", "time": "01:58:00", "timezone": "Asia/Tokyo"}
        }"#;
        let record: CatalogRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.episode_avg_duration, Some(Duration::from_secs(1440)));
        assert_eq!(record.relations[0].kind, RelationKind::Sequel);
        let slot = record.broadcast.unwrap();
        assert_eq!(slot.weekday, Weekday::Sun);
        assert_eq!(slot.timezone, chrono_tz::Asia::Tokyo);
    }

    #[test]
    fn entry_paired_scores() {
        let mut entry = Entry::new(1, "x");
        assert!(entry.paired_scores().is_none());
        entry.catalog_score = Some(7.5);
        assert!(entry.paired_scores().is_none());
        entry.user_score = Some(9.0);
        assert_eq!(entry.paired_scores(), Some((7.5, 9.0)));
    }

    #[test]
    fn tags_get_by_dimension() {
        let mut tags = Tags::default();
        tags.studios.insert("Madhouse".into());
        assert!(tags.get(TagDimension::Studio).contains("Madhouse"));
        assert!(tags.get(TagDimension::Genre).is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn arb_relation_kind() -> impl Strategy<Value = RelationKind> {
            proptest::sample::select(RelationKind::ALL.to_vec())
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            #[test]
            fn relation_kind_serde_roundtrip(kind in arb_relation_kind()) {
                let json = serde_json::to_string(&kind).unwrap();
                let back: RelationKind = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(back, kind);
            }

            #[test]
            fn relation_kind_as_str_stable(kind in arb_relation_kind()) {
                prop_assert_eq!(RelationKind::parse(kind.as_str()), kind);
                prop_assert_eq!(kind.to_string(), kind.as_str());
            }

            #[test]
            fn typed_id_roundtrip(id in any::<u64>()) {
                let entry_id = EntryId(id);
                let json = serde_json::to_string(&entry_id).unwrap();
                let back: EntryId = serde_json::from_str(&json).unwrap();
                prop_assert_eq!(back, entry_id);
            }
        }
    }
}
