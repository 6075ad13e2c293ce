//! Hero DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::hero::{Gender, timestamp};

/// Request to create a new hero
///
/// Identity and metadata are assigned by the repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHero {
    pub name: String,
    #[serde(default)]
    pub superpowers: Vec<String>,
    pub gender: Gender,
}

/// Partial update of a hero
///
/// Only the fields that are `Some` end up in the `$set` document.
/// `last_modified` is overwritten by the repository on every update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHero {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superpowers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub last_modified: Option<DateTime<Utc>>,
}

/// List query criteria
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Filters {
    /// Match heroes having any of these superpowers
    #[serde(default)]
    pub superpowers: Vec<String>,
}
