//! Hero domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Hero record
///
/// Stored as a single document. `metadata` is flattened so `created` and
/// `lastModified` sit at the top level of the document, next to `_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub superpowers: Vec<String>,
    pub gender: Gender,
    #[serde(flatten)]
    pub metadata: Metadata,
    #[serde(default)]
    pub is_removed: bool,
}

/// Bookkeeping timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(with = "timestamp")]
    pub created: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub last_modified: DateTime<Utc>,
}

impl Metadata {
    /// Metadata for a record created at `now`
    pub fn created_at(now: DateTime<Utc>) -> Self {
        Self {
            created: now,
            last_modified: now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        };
        f.write_str(s)
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Ok(Gender::Male),
            "female" | "f" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender: {other}")),
        }
    }
}

/// Collapse a list of superpowers into a set, keeping first-seen order.
pub fn dedup_superpowers(powers: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    powers
        .into_iter()
        .filter(|p| seen.insert(p.clone()))
        .collect()
}

/// Timestamp encoding used in stored documents
///
/// RFC 3339 in UTC with a fixed six fractional digits, so that comparing the
/// encoded strings orders them the same way as the instants they encode.
pub mod timestamp {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    /// Current time, truncated to the precision that survives a round trip
    pub fn now() -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            ts: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match ts {
                Some(ts) => super::serialize(ts, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            let raw = Option::<String>::deserialize(deserializer)?;
            raw.map(|raw| {
                DateTime::parse_from_rfc3339(&raw)
                    .map(|ts| ts.with_timezone(&Utc))
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_hero() -> Hero {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Hero {
            id: Uuid::new_v4(),
            name: "Storm".to_string(),
            superpowers: vec!["weather".to_string(), "flight".to_string()],
            gender: Gender::Female,
            metadata: Metadata::created_at(now),
            is_removed: false,
        }
    }

    #[test]
    fn test_hero_document_layout() {
        let hero = sample_hero();
        let doc = serde_json::to_value(&hero).unwrap();

        assert_eq!(doc["_id"], hero.id.to_string());
        assert_eq!(doc["superpowers"][1], "flight");
        assert_eq!(doc["gender"], "female");
        assert_eq!(doc["created"], "2024-03-01T12:00:00.000000Z");
        assert_eq!(doc["lastModified"], "2024-03-01T12:00:00.000000Z");
        assert_eq!(doc["isRemoved"], false);
        assert!(doc.get("metadata").is_none());
    }

    #[test]
    fn test_hero_document_roundtrip() {
        let hero = sample_hero();
        let doc = serde_json::to_value(&hero).unwrap();
        let back: Hero = serde_json::from_value(doc).unwrap();
        assert_eq!(back, hero);
    }

    #[test]
    fn test_missing_is_removed_defaults_to_false() {
        let doc = serde_json::json!({
            "_id": Uuid::new_v4().to_string(),
            "name": "Cyclops",
            "superpowers": ["optic blast"],
            "gender": "male",
            "created": "2024-03-01T12:00:00.000000Z",
            "lastModified": "2024-03-01T12:00:00.000000Z",
        });

        let hero: Hero = serde_json::from_value(doc).unwrap();
        assert!(!hero.is_removed);
    }

    #[test]
    fn test_timestamp_encoding_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let later = earlier + chrono::Duration::milliseconds(500);
        assert!(timestamp::format(&earlier) < timestamp::format(&later));
    }

    #[test]
    fn test_now_survives_roundtrip() {
        let now = timestamp::now();
        let encoded = timestamp::format(&now);
        let decoded = chrono::DateTime::parse_from_rfc3339(&encoded)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(decoded, now);
    }

    #[test]
    fn test_gender_parsing() {
        assert_eq!("Female".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!("m".parse::<Gender>(), Ok(Gender::Male));
        assert!("robot".parse::<Gender>().is_err());
    }

    #[test]
    fn test_dedup_superpowers_keeps_first_occurrence() {
        let powers = vec![
            "flight".to_string(),
            "strength".to_string(),
            "flight".to_string(),
        ];
        assert_eq!(dedup_superpowers(powers), vec!["flight", "strength"]);
    }
}
