use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use time::OffsetDateTime;

// Identifies one exercise for the lifetime of a store. Ids are handed out by
// the store from a monotonically increasing counter and are never reused, so
// holding an id across deletions is safe (lookups just start returning None).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExerciseId(pub u64);

impl fmt::Display for ExerciseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/*
 * Where an exercise can be practiced. `Anywhere` doubles as the "no filter"
 * choice on the filtering side; as a tag on a record it simply means the
 * drill has no location requirement.
 */
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Location {
    #[default]
    Anywhere,
    Indoor,
    Outdoor,
}

impl Location {
    pub fn label(&self) -> &'static str {
        match self {
            Location::Anywhere => "anywhere",
            Location::Indoor => "indoor",
            Location::Outdoor => "outdoor",
        }
    }

    pub fn parse(text: &str) -> Option<Location> {
        match text.trim().to_ascii_lowercase().as_str() {
            "anywhere" => Some(Location::Anywhere),
            "indoor" => Some(Location::Indoor),
            "outdoor" => Some(Location::Outdoor),
            _ => None,
        }
    }
}

/*
 * One trainable drill. Exercises are not serialized; only the completion log
 * is persisted, and it stores title snapshots rather than ids, so history
 * survives catalog edits and deletions.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct Exercise {
    pub id: ExerciseId,
    pub title: String,
    pub instructions: String,
    /* None means no video; the "#" placeholder from older data means the same. */
    pub video_url: Option<String>,
    pub location: Location,
    /* Set on drills that want a freshly rolled rep count (1..=11) per session. */
    pub uses_rep_count: bool,
}

impl Exercise {
    pub fn has_real_video(&self) -> bool {
        match self.video_url.as_deref() {
            Some("#") | None => false,
            Some(url) => !url.is_empty(),
        }
    }
}

/*
 * Working copy of an exercise's editable fields, as held by the management
 * form. Free-text fields are kept untrimmed while editing; validation and
 * trimming happen in the store when the draft is saved.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExerciseDraft {
    pub title: String,
    pub instructions: String,
    pub video_url: String,
    pub location: Location,
    pub uses_rep_count: bool,
}

impl ExerciseDraft {
    pub fn from_exercise(exercise: &Exercise) -> Self {
        ExerciseDraft {
            title: exercise.title.clone(),
            instructions: exercise.instructions.clone(),
            video_url: exercise.video_url.clone().unwrap_or_default(),
            location: exercise.location,
            uses_rep_count: exercise.uses_rep_count,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Customer => "customer",
        }
    }
}

/*
 * An account in the local user directory. `enabled_exercise_ids` only
 * matters for customers; admins see the whole catalog regardless.
 */
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub email: String,
    pub name: String,
    pub role: Role,
    pub enabled_exercise_ids: HashSet<ExerciseId>,
}

impl UserAccount {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/*
 * One completed session. Immutable once created. The serialized form is the
 * persistence contract: an array of `{id, title, date, time}` objects where
 * `date` is the RFC 3339 timestamp and `time` is the wall-clock display
 * label captured at completion.
 */
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub title: String,
    #[serde(rename = "date", with = "time::serde::rfc3339")]
    pub completed_at: OffsetDateTime,
    #[serde(rename = "time")]
    pub time_label: String,
}

impl HistoryEntry {
    /// Calendar day this entry belongs to, derived from the stored
    /// timestamp. All date-bucketing goes through this one derivation.
    pub fn day(&self) -> time::Date {
        self.completed_at.date()
    }
}
