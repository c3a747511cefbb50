use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper for stored submissions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubmissionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What a citizen is contributing. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Need,
    Offer,
    Idea,
}

impl Category {
    pub const fn label(self) -> &'static str {
        match self {
            Category::Need => "need",
            Category::Offer => "offer",
            Category::Idea => "idea",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Matched,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Open => "open",
            SubmissionStatus::InProgress => "in_progress",
            SubmissionStatus::Resolved => "resolved",
            SubmissionStatus::Matched => "matched",
        }
    }
}

/// Fixed list of neighborhoods used as a soft matching signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Neighborhood {
    Downtown,
    #[serde(rename = "North Side")]
    NorthSide,
    #[serde(rename = "South Side")]
    SouthSide,
    #[serde(rename = "East End")]
    EastEnd,
    #[serde(rename = "West End")]
    WestEnd,
    Midtown,
    Riverside,
    Hillcrest,
    Oakwood,
    Greenfield,
}

impl Neighborhood {
    pub const fn label(self) -> &'static str {
        match self {
            Neighborhood::Downtown => "Downtown",
            Neighborhood::NorthSide => "North Side",
            Neighborhood::SouthSide => "South Side",
            Neighborhood::EastEnd => "East End",
            Neighborhood::WestEnd => "West End",
            Neighborhood::Midtown => "Midtown",
            Neighborhood::Riverside => "Riverside",
            Neighborhood::Hillcrest => "Hillcrest",
            Neighborhood::Oakwood => "Oakwood",
            Neighborhood::Greenfield => "Greenfield",
        }
    }
}

/// A stored citizen submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id: SubmissionId,
    pub category: Category,
    pub status: SubmissionStatus,
    pub title: String,
    pub description: String,
    pub neighborhood: Option<Neighborhood>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub hours_offered: Option<u32>,
    pub matched_with_id: Option<SubmissionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Open and not yet paired: eligible for match suggestions.
    pub fn is_available(&self) -> bool {
        self.status == SubmissionStatus::Open && self.matched_with_id.is_none()
    }

    /// Mark this submission as matched with `partner`.
    pub(crate) fn pair_with(&mut self, partner: &SubmissionId, now: DateTime<Utc>) {
        self.status = SubmissionStatus::Matched;
        self.matched_with_id = Some(partner.clone());
        self.updated_at = now;
    }
}

/// Intake payload before validation. Unknown enum values fail deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSubmission {
    pub category: Category,
    #[serde(default)]
    pub status: Option<SubmissionStatus>,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub neighborhood: Option<Neighborhood>,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub hours_offered: Option<i64>,
}

/// Explicit tri-state for a single field in a partial update.
///
/// An absent JSON member deserializes to `Keep` via `#[serde(default)]`, `null` to
/// `Clear`, and any other value to `Set`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Patch<T> {
    Keep,
    Clear,
    Set(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Keep
    }
}

impl<T> Patch<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// Apply the patch to an optional stored value.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Clear => *slot = None,
            Patch::Set(value) => *slot = Some(value),
        }
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Set(value),
            None => Patch::Clear,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Patch::Set(value) => serializer.serialize_some(value),
            Patch::Keep | Patch::Clear => serializer.serialize_none(),
        }
    }
}

/// Partial update covering every mutable column. There is no `category` entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPatch {
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub status: Patch<SubmissionStatus>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub title: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub description: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub neighborhood: Patch<Neighborhood>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub contact_name: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub contact_email: Patch<String>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub hours_offered: Patch<i64>,
    #[serde(default, skip_serializing_if = "Patch::is_keep")]
    pub matched_with_id: Patch<SubmissionId>,
}
