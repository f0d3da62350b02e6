//! CSV export of exercise logs.
//!
//! Writes one row per logged set, joined with the date of its schedule day.

use crate::types::{ExerciseLog, ScheduleDay};
use crate::Result;
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow<'a> {
    date: String,
    exercise: &'a str,
    weight: f64,
    reps: f64,
    logged_at: String,
    id: String,
}

/// Write `logs` to `csv_path`, replacing any existing file
///
/// Rows are ordered by schedule date, then creation time. Logs whose
/// schedule is not in `schedules` are written with an empty date.
pub fn write_logs_csv(csv_path: &Path, schedules: &[ScheduleDay], logs: &[ExerciseLog]) -> Result<usize> {
    let dates: HashMap<Uuid, String> = schedules
        .iter()
        .map(|s| (s.id, s.schedule_date.to_string()))
        .collect();

    let mut ordered: Vec<(String, &ExerciseLog)> = logs
        .iter()
        .map(|log| (dates.get(&log.schedule_id).cloned().unwrap_or_default(), log))
        .collect();
    ordered.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.created_at.cmp(&b.1.created_at)));

    let rows: Vec<CsvRow> = ordered
        .into_iter()
        .map(|(date, log)| CsvRow {
            date,
            exercise: &log.exercise_name,
            weight: log.weight,
            reps: log.reps,
            logged_at: log.created_at.to_rfc3339(),
            id: log.id.to_string(),
        })
        .collect();

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(csv_path)?;
    let mut writer = csv::Writer::from_writer(file);
    for row in &rows {
        writer.serialize(row)?;
    }

    writer.flush()?;
    let file = writer
        .into_inner()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    file.sync_all()?;

    tracing::info!("Exported {} logs to {:?}", rows.len(), csv_path);
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn schedule(date: &str) -> ScheduleDay {
        ScheduleDay {
            id: Uuid::new_v4(),
            schedule_date: date.parse().unwrap(),
            muscle_groups: vec![],
            is_rest_day: false,
            training_completed: true,
            photo_url: None,
            topic: None,
            notes: None,
            equipment_needed: None,
            created_at: Utc::now(),
        }
    }

    fn log(schedule_id: Uuid, name: &str, offset: i64) -> ExerciseLog {
        ExerciseLog {
            id: Uuid::new_v4(),
            schedule_id,
            exercise_name: name.into(),
            weight: 40.0,
            reps: 10.0,
            created_at: Utc::now() + Duration::seconds(offset),
        }
    }

    #[test]
    fn test_export_orders_by_date_then_time() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("out").join("logs.csv");

        let early = schedule("2026-10-01");
        let late = schedule("2026-10-09");
        let logs = vec![
            log(late.id, "Row", 0),
            log(early.id, "Squat (Barbell)", 5),
            log(early.id, "Lunge", 1),
        ];

        let count = write_logs_csv(&csv_path, &[late, early], &logs).unwrap();
        assert_eq!(count, 3);

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert!(lines[0].starts_with("date,exercise,weight,reps,logged_at,id"));
        assert!(lines[1].starts_with("2026-10-01,Lunge,"));
        assert!(lines[2].starts_with("2026-10-01,Squat (Barbell),"));
        assert!(lines[3].starts_with("2026-10-09,Row,"));
    }

    #[test]
    fn test_export_empty_writes_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let csv_path = temp_dir.path().join("logs.csv");
        assert_eq!(write_logs_csv(&csv_path, &[], &[]).unwrap(), 0);
        assert!(csv_path.exists());
    }
}
