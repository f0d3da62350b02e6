//! Core domain types for the gym planner.
//!
//! This module defines the fundamental types used throughout the system:
//! - Schedule days and their derived display status
//! - Exercise logs (one recorded set each)
//! - Exercise variant axes and a user's variant choice
//! - Backend queries and the authenticated session

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

/// Variant value that enables the laterality side qualifier.
pub const SINGLE_VARIANT: &str = "Single";

// ============================================================================
// Schedule Types
// ============================================================================

/// A planned or logged workout day. At most one exists per date.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(from = "StoredScheduleDay")]
pub struct ScheduleDay {
    pub id: Uuid,
    pub schedule_date: NaiveDate,
    pub muscle_groups: Vec<String>,
    pub is_rest_day: bool,
    pub training_completed: bool,
    pub photo_url: Option<String>,
    pub topic: Option<String>,
    pub notes: Option<String>,
    pub equipment_needed: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A schedule row as stored, legacy columns included.
///
/// `muscle_group` and `script_draft` only fill in when the current column
/// is empty, so rows that still carry both load.
#[derive(Deserialize)]
struct StoredScheduleDay {
    id: Uuid,
    schedule_date: NaiveDate,
    #[serde(default, deserialize_with = "deserialize_muscle_groups")]
    muscle_groups: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_muscle_groups")]
    muscle_group: Vec<String>,
    #[serde(default)]
    is_rest_day: Option<bool>,
    #[serde(default)]
    training_completed: Option<bool>,
    #[serde(default)]
    photo_url: Option<String>,
    #[serde(default)]
    topic: Option<String>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    script_draft: Option<String>,
    #[serde(default)]
    equipment_needed: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<StoredScheduleDay> for ScheduleDay {
    fn from(row: StoredScheduleDay) -> Self {
        let muscle_groups = if row.muscle_groups.is_empty() {
            row.muscle_group
        } else {
            row.muscle_groups
        };
        let notes = match row.notes {
            Some(notes) if !notes.trim().is_empty() => Some(notes),
            notes => row.script_draft.or(notes),
        };

        Self {
            id: row.id,
            schedule_date: row.schedule_date,
            muscle_groups,
            is_rest_day: row.is_rest_day.unwrap_or_default(),
            training_completed: row.training_completed.unwrap_or_default(),
            photo_url: row.photo_url,
            topic: row.topic,
            notes,
            equipment_needed: row.equipment_needed,
            created_at: row.created_at,
        }
    }
}

impl ScheduleDay {
    pub fn has_photo(&self) -> bool {
        self.photo_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// Derived calendar status for this day
    pub fn status(&self) -> DayStatus {
        if self.is_rest_day {
            return DayStatus::Rest;
        }
        match (self.training_completed, self.has_photo()) {
            (true, true) => DayStatus::Complete,
            (true, false) | (false, true) => DayStatus::PartiallyComplete,
            (false, false) => DayStatus::NoActivity,
        }
    }
}

/// Insert payload for a schedule day; the backend assigns id and timestamp.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct NewScheduleDay {
    pub schedule_date: NaiveDate,
    pub muscle_groups: Vec<String>,
    pub is_rest_day: bool,
    pub training_completed: bool,
    pub photo_url: Option<String>,
    pub topic: Option<String>,
    pub notes: Option<String>,
    pub equipment_needed: Option<String>,
}

impl NewScheduleDay {
    pub fn for_date(date: NaiveDate) -> Self {
        Self {
            schedule_date: date,
            ..Self::default()
        }
    }
}

/// Display status of a calendar day that has a schedule
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    NoActivity,
    PartiallyComplete,
    Complete,
    Rest,
}

impl DayStatus {
    /// Single-character marker used by the calendar grid
    pub fn marker(self) -> char {
        match self {
            DayStatus::NoActivity => '·',
            DayStatus::PartiallyComplete => '◐',
            DayStatus::Complete => '●',
            DayStatus::Rest => 'R',
        }
    }
}

impl fmt::Display for DayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DayStatus::NoActivity => "no activity",
            DayStatus::PartiallyComplete => "partially complete",
            DayStatus::Complete => "complete",
            DayStatus::Rest => "rest",
        };
        f.write_str(text)
    }
}

/// Accepts a structured list, a JSON list stored as text, or a bare string.
fn deserialize_muscle_groups<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::List(groups)) => groups,
        Some(Raw::Text(text)) => parse_muscle_groups(&text),
        None => Vec::new(),
    })
}

/// Parse a muscle-group field stored as text.
///
/// A JSON array is decoded as a list; any other non-empty value becomes a
/// single-element list.
pub fn parse_muscle_groups(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Vec<String>>(trimmed) {
        Ok(groups) => groups,
        Err(_) => vec![trimmed.to_string()],
    }
}

// ============================================================================
// Exercise Log Types
// ============================================================================

/// One recorded set belonging to a schedule day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLog {
    pub id: Uuid,
    pub schedule_id: Uuid,
    pub exercise_name: String,
    /// Weight in kg, or speed for cardio
    pub weight: f64,
    /// Repetitions, or duration in minutes for cardio
    pub reps: f64,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an exercise log
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewExerciseLog {
    pub schedule_id: Uuid,
    pub exercise_name: String,
    pub weight: f64,
    pub reps: f64,
}

// ============================================================================
// Catalog Types
// ============================================================================

/// What the two numeric fields of a log mean for an exercise
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    #[default]
    WeightReps,
    SpeedDuration,
}

impl MetricKind {
    /// Units of the (weight, reps) pair
    pub fn units(self) -> (&'static str, &'static str) {
        match self {
            MetricKind::WeightReps => ("kg", "reps"),
            MetricKind::SpeedDuration => ("km/h", "min"),
        }
    }
}

/// Optional variant axes configured for one exercise
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct ExerciseVariants {
    pub equipment: Vec<String>,
    pub grips: Vec<String>,
    pub modes: Vec<String>,
    pub metric: MetricKind,
}

/// Laterality side for single-limb work
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Left => f.write_str("Left"),
            Side::Right => f.write_str("Right"),
        }
    }
}

impl std::str::FromStr for Side {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "left" | "l" => Ok(Side::Left),
            "right" | "r" => Ok(Side::Right),
            other => Err(crate::Error::Validation(format!(
                "unknown side '{}', expected left or right",
                other
            ))),
        }
    }
}

/// The variant values picked in the log-entry form
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VariantChoice {
    pub equipment: Option<String>,
    pub grip: Option<String>,
    pub mode: Option<String>,
    pub side: Option<Side>,
}

impl VariantChoice {
    /// True when mode or equipment selects the single-limb variant
    pub fn is_single(&self) -> bool {
        self.mode.as_deref() == Some(SINGLE_VARIANT)
            || self.equipment.as_deref() == Some(SINGLE_VARIANT)
    }
}

// ============================================================================
// Backend Query Types
// ============================================================================

/// Sort direction for list queries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Filter for listing schedule days, always ordered by date
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScheduleQuery {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub photos_only: bool,
    pub order: SortOrder,
}

impl ScheduleQuery {
    /// Every schedule in an inclusive date range, oldest first
    pub fn range(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            ..Self::default()
        }
    }

    /// Schedules carrying a progress photo, newest first
    pub fn gallery() -> Self {
        Self {
            photos_only: true,
            order: SortOrder::Descending,
            ..Self::default()
        }
    }

    pub fn matches(&self, day: &ScheduleDay) -> bool {
        self.from.map_or(true, |from| day.schedule_date >= from)
            && self.to.map_or(true, |to| day.schedule_date <= to)
            && (!self.photos_only || day.has_photo())
    }
}

/// Filter for listing exercise logs, always ordered by creation time
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogQuery {
    pub schedule_id: Option<Uuid>,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl LogQuery {
    /// Logs of one day in display order
    pub fn for_day(schedule_id: Uuid) -> Self {
        Self {
            schedule_id: Some(schedule_id),
            ..Self::default()
        }
    }

    /// Logs across all days, newest first
    pub fn history(limit: Option<usize>) -> Self {
        Self {
            schedule_id: None,
            order: SortOrder::Descending,
            limit,
        }
    }

    pub fn matches(&self, log: &ExerciseLog) -> bool {
        self.schedule_id.map_or(true, |id| log.schedule_id == id)
    }
}

/// Sort logs by creation time; ties keep their insertion order.
pub fn sort_logs(logs: &mut [ExerciseLog], order: SortOrder) {
    match order {
        SortOrder::Ascending => logs.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortOrder::Descending => logs.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
}

// ============================================================================
// Session Types
// ============================================================================

/// An authenticated session with the backend
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub email: String,
    pub user_id: Option<String>,
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthSession {
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires| now < expires)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(json: &str) -> ScheduleDay {
        serde_json::from_str(json).unwrap()
    }

    const BASE: &str = r#""id":"6f9619ff-8b86-4d01-b42d-00cf4fc964ff","schedule_date":"2026-10-05","created_at":"2026-10-01T08:00:00Z""#;

    #[test]
    fn test_muscle_groups_structured_list() {
        let d = day(&format!(r#"{{{},"muscle_groups":["Back","Chest"]}}"#, BASE));
        assert_eq!(d.muscle_groups, vec!["Back", "Chest"]);
    }

    #[test]
    fn test_muscle_groups_json_text() {
        let d = day(&format!(
            r#"{{{},"muscle_groups":"[\"Legs\",\"Core\"]"}}"#,
            BASE
        ));
        assert_eq!(d.muscle_groups, vec!["Legs", "Core"]);
    }

    #[test]
    fn test_muscle_groups_malformed_text_becomes_single_item() {
        let d = day(&format!(r#"{{{},"muscle_group":"Back & Biceps"}}"#, BASE));
        assert_eq!(d.muscle_groups, vec!["Back & Biceps"]);

        let d = day(&format!(r#"{{{},"muscle_groups":"[Back"}}"#, BASE));
        assert_eq!(d.muscle_groups, vec!["[Back"]);
    }

    #[test]
    fn test_muscle_groups_missing_or_null() {
        assert!(day(&format!("{{{}}}", BASE)).muscle_groups.is_empty());
        let d = day(&format!(r#"{{{},"muscle_groups":null}}"#, BASE));
        assert!(d.muscle_groups.is_empty());
        let d = day(&format!(r#"{{{},"muscle_groups":""}}"#, BASE));
        assert!(d.muscle_groups.is_empty());
    }

    #[test]
    fn test_row_with_legacy_and_current_columns() {
        let d = day(&format!(
            r#"{{{},"muscle_group":"Back","muscle_groups":["Back","Chest"],"script_draft":"old","notes":"new"}}"#,
            BASE
        ));
        assert_eq!(d.muscle_groups, vec!["Back", "Chest"]);
        assert_eq!(d.notes.as_deref(), Some("new"));

        let d = day(&format!(
            r#"{{{},"muscle_group":"Legs","muscle_groups":null,"script_draft":"film squats","notes":""}}"#,
            BASE
        ));
        assert_eq!(d.muscle_groups, vec!["Legs"]);
        assert_eq!(d.notes.as_deref(), Some("film squats"));
    }

    #[test]
    fn test_serialized_day_uses_current_columns_only() {
        let mut d = day(&format!(r#"{{{},"muscle_group":"Back","script_draft":"x"}}"#, BASE));
        d.equipment_needed = Some("Tripod".into());
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["muscle_groups"], serde_json::json!(["Back"]));
        assert_eq!(json["notes"], "x");
        assert_eq!(json["equipment_needed"], "Tripod");
        assert!(json.get("muscle_group").is_none());
        assert!(json.get("script_draft").is_none());

        let back: ScheduleDay = serde_json::from_value(json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn test_legacy_script_draft_maps_to_notes() {
        let d = day(&format!(r#"{{{},"script_draft":"film the deadlift"}}"#, BASE));
        assert_eq!(d.notes.as_deref(), Some("film the deadlift"));
    }

    #[test]
    fn test_status_derivation() {
        let mut d = day(&format!("{{{}}}", BASE));
        assert_eq!(d.status(), DayStatus::NoActivity);

        d.training_completed = true;
        assert_eq!(d.status(), DayStatus::PartiallyComplete);

        d.photo_url = Some("https://cdn/p.jpg".into());
        assert_eq!(d.status(), DayStatus::Complete);

        d.training_completed = false;
        assert_eq!(d.status(), DayStatus::PartiallyComplete);

        d.is_rest_day = true;
        assert_eq!(d.status(), DayStatus::Rest);
    }

    #[test]
    fn test_empty_photo_url_is_not_a_photo() {
        let mut d = day(&format!("{{{}}}", BASE));
        d.photo_url = Some(String::new());
        assert!(!d.has_photo());
    }

    #[test]
    fn test_sort_logs_ascending_keeps_ties_stable() {
        let t = Utc::now();
        let schedule_id = Uuid::new_v4();
        let make = |name: &str, offset: i64| ExerciseLog {
            id: Uuid::new_v4(),
            schedule_id,
            exercise_name: name.into(),
            weight: 10.0,
            reps: 8.0,
            created_at: t + Duration::seconds(offset),
        };
        let mut logs = vec![make("c", 5), make("a", 0), make("b1", 2), make("b2", 2)];
        sort_logs(&mut logs, SortOrder::Ascending);
        let names: Vec<_> = logs.iter().map(|l| l.exercise_name.as_str()).collect();
        assert_eq!(names, vec!["a", "b1", "b2", "c"]);

        sort_logs(&mut logs, SortOrder::Descending);
        assert_eq!(logs[0].exercise_name, "c");
    }

    #[test]
    fn test_side_parsing() {
        assert_eq!("LEFT".parse::<Side>().unwrap(), Side::Left);
        assert_eq!("r".parse::<Side>().unwrap(), Side::Right);
        assert!("middle".parse::<Side>().is_err());
    }

    #[test]
    fn test_session_expiry() {
        let now = Utc::now();
        let mut session = AuthSession {
            email: "coach@gym.test".into(),
            user_id: None,
            access_token: "t".into(),
            expires_at: Some(now + Duration::hours(1)),
        };
        assert!(session.is_valid_at(now));
        session.expires_at = Some(now - Duration::seconds(1));
        assert!(!session.is_valid_at(now));
        session.expires_at = None;
        assert!(session.is_valid_at(now));
    }
}
