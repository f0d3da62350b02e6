//! Cross-day views: the set history and the progress-photo gallery.

use crate::backend::Backend;
use crate::types::*;
use crate::Result;
use chrono::NaiveDate;
use std::collections::HashMap;
use uuid::Uuid;

/// A logged set together with the date of its day
#[derive(Clone, Debug, PartialEq)]
pub struct HistoryEntry {
    pub date: Option<NaiveDate>,
    pub log: ExerciseLog,
}

/// Load logs across all days, newest first
///
/// `exercise` filters case-insensitively on the stored label; `limit`
/// applies after filtering.
pub fn load_history<B: Backend + ?Sized>(
    backend: &B,
    exercise: Option<&str>,
    limit: Option<usize>,
) -> Result<Vec<HistoryEntry>> {
    let needle = exercise.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty());
    let query = LogQuery::history(if needle.is_some() { None } else { limit });

    let mut logs = backend.list_logs(&query)?;
    sort_logs(&mut logs, SortOrder::Descending);
    if let Some(needle) = &needle {
        logs.retain(|l| l.exercise_name.to_lowercase().contains(needle.as_str()));
    }
    if let Some(limit) = limit {
        logs.truncate(limit);
    }

    let dates: HashMap<Uuid, NaiveDate> = backend
        .list_schedules(&ScheduleQuery::default())?
        .into_iter()
        .map(|s| (s.id, s.schedule_date))
        .collect();

    tracing::debug!("Loaded {} history entries", logs.len());
    Ok(logs
        .into_iter()
        .map(|log| HistoryEntry {
            date: dates.get(&log.schedule_id).copied(),
            log,
        })
        .collect())
}

/// Days with a progress photo, newest first
pub fn load_gallery<B: Backend + ?Sized>(backend: &B) -> Result<Vec<ScheduleDay>> {
    let mut days = backend.list_schedules(&ScheduleQuery::gallery())?;
    days.retain(ScheduleDay::has_photo);
    days.sort_by(|a, b| b.schedule_date.cmp(&a.schedule_date));
    Ok(days)
}

/// Days across all months that carry a content topic or notes
pub fn count_drafted_ideas<B: Backend + ?Sized>(backend: &B) -> Result<usize> {
    let filled = |text: &Option<String>| text.as_deref().is_some_and(|t| !t.trim().is_empty());
    Ok(backend
        .list_schedules(&ScheduleQuery::default())?
        .iter()
        .filter(|day| filled(&day.topic) || filled(&day.notes))
        .count())
}
