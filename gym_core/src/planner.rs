//! View state for the calendar and day-detail screens.
//!
//! The planner holds the displayed month's schedules, the selected date and
//! that day's logs. Every mutation writes through to the backend first and
//! then patches the in-memory copy instead of re-fetching.

use crate::backend::{photo_content_type, Backend};
use crate::calendar::{self, MonthGrid, MonthSummary, WeekStart, YearMonth};
use crate::catalog::{self, EmptySelection, ExerciseCatalog, ResolvedExercise};
use crate::types::*;
use crate::{Error, Result};
use chrono::NaiveDate;
use uuid::Uuid;

/// A set as entered in the log form
#[derive(Clone, Debug, Default)]
pub struct LogEntry {
    pub exercise: String,
    pub choice: VariantChoice,
    pub weight: f64,
    pub reps: f64,
}

/// New numbers for a logged set; `exercise` also re-labels it with `choice`
#[derive(Clone, Debug, Default)]
pub struct LogEdit {
    pub exercise: Option<String>,
    pub choice: VariantChoice,
    pub weight: f64,
    pub reps: f64,
}

pub struct Planner<B: Backend> {
    backend: B,
    catalog: &'static ExerciseCatalog,
    empty_selection: EmptySelection,
    week_start: WeekStart,
    month: YearMonth,
    schedules: Vec<ScheduleDay>,
    selected: Option<NaiveDate>,
    logs: Vec<ExerciseLog>,
}

impl<B: Backend> Planner<B> {
    pub fn new(backend: B, month: YearMonth) -> Self {
        Self {
            backend,
            catalog: catalog::get_default_catalog(),
            empty_selection: EmptySelection::default(),
            week_start: WeekStart::default(),
            month,
            schedules: Vec::new(),
            selected: None,
            logs: Vec::new(),
        }
    }

    pub fn with_empty_selection(mut self, policy: EmptySelection) -> Self {
        self.empty_selection = policy;
        self
    }

    pub fn with_week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn schedules(&self) -> &[ScheduleDay] {
        &self.schedules
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected
    }

    /// Logs of the selected day, oldest first
    pub fn logs(&self) -> &[ExerciseLog] {
        &self.logs
    }

    /// Fetch the schedules of `month` and make it the displayed month
    pub fn open_month(&mut self, month: YearMonth) -> Result<()> {
        let query = ScheduleQuery::range(month.first_day(), month.last_day());
        self.schedules = self.backend.list_schedules(&query)?;
        self.month = month;
        tracing::debug!("Opened {} with {} schedules", month, self.schedules.len());

        if self.selected.is_some_and(|d| !month.contains(d)) {
            self.selected = None;
            self.logs.clear();
        }
        Ok(())
    }

    pub fn grid(&self) -> MonthGrid {
        MonthGrid::build(self.month, &self.schedules, self.week_start)
    }

    pub fn summary(&self) -> MonthSummary {
        self.grid().summary()
    }

    pub fn schedule_for(&self, date: NaiveDate) -> Option<&ScheduleDay> {
        calendar::select(&self.schedules, date)
    }

    /// Select a date; fetch its logs when a schedule exists
    pub fn select_date(&mut self, date: NaiveDate) -> Result<Option<&ScheduleDay>> {
        if !self.month.contains(date) {
            self.open_month(YearMonth::of(date))?;
        }
        self.selected = Some(date);

        self.logs = match self.schedule_for(date).map(|s| s.id) {
            Some(id) => {
                let mut logs = self.backend.list_logs(&LogQuery::for_day(id))?;
                sort_logs(&mut logs, SortOrder::Ascending);
                logs
            }
            None => Vec::new(),
        };
        Ok(self.schedule_for(date))
    }

    /// The schedule for `date`, created on first edit
    pub fn ensure_day(&mut self, date: NaiveDate) -> Result<ScheduleDay> {
        if !self.month.contains(date) {
            self.open_month(YearMonth::of(date))?;
        }
        if let Some(existing) = self.schedule_for(date) {
            return Ok(existing.clone());
        }

        let created = self.backend.insert_schedule(&NewScheduleDay::for_date(date))?;
        tracing::info!("Created schedule for {}", date);
        let at = self
            .schedules
            .partition_point(|s| s.schedule_date < created.schedule_date);
        self.schedules.insert(at, created.clone());
        Ok(created)
    }

    fn modify_day<F>(&mut self, date: NaiveDate, f: F) -> Result<ScheduleDay>
    where
        F: FnOnce(&mut ScheduleDay),
    {
        let mut day = self.ensure_day(date)?;
        f(&mut day);
        let saved = self.backend.update_schedule(&day)?;
        if let Some(slot) = self.schedules.iter_mut().find(|s| s.id == saved.id) {
            *slot = saved.clone();
        }
        Ok(saved)
    }

    /// Replace the day's muscle groups, dropping blanks and duplicates
    pub fn set_muscle_groups(&mut self, date: NaiveDate, groups: &[String]) -> Result<ScheduleDay> {
        let mut cleaned: Vec<String> = Vec::new();
        for group in groups.iter().map(|g| g.trim()).filter(|g| !g.is_empty()) {
            let group = self.catalog.canonical_group(group).unwrap_or(group);
            if !cleaned.iter().any(|g| g == group) {
                cleaned.push(group.to_string());
            }
        }
        self.modify_day(date, |day| day.muscle_groups = cleaned)
    }

    pub fn toggle_rest(&mut self, date: NaiveDate) -> Result<ScheduleDay> {
        self.modify_day(date, |day| day.is_rest_day = !day.is_rest_day)
    }

    pub fn toggle_completed(&mut self, date: NaiveDate) -> Result<ScheduleDay> {
        self.modify_day(date, |day| day.training_completed = !day.training_completed)
    }

    pub fn set_topic(&mut self, date: NaiveDate, topic: Option<String>) -> Result<ScheduleDay> {
        let topic = topic.filter(|t| !t.trim().is_empty());
        self.modify_day(date, |day| day.topic = topic)
    }

    pub fn set_notes(&mut self, date: NaiveDate, notes: Option<String>) -> Result<ScheduleDay> {
        let notes = notes.filter(|n| !n.trim().is_empty());
        self.modify_day(date, |day| day.notes = notes)
    }

    pub fn set_equipment_needed(&mut self, date: NaiveDate, equipment: Option<String>) -> Result<ScheduleDay> {
        let equipment = equipment.filter(|e| !e.trim().is_empty());
        self.modify_day(date, |day| day.equipment_needed = equipment)
    }

    /// Upload a progress photo and record its URL on the day
    pub fn attach_photo(&mut self, date: NaiveDate, bytes: &[u8], extension: &str) -> Result<ScheduleDay> {
        if bytes.is_empty() {
            return Err(Error::Validation("photo file is empty".into()));
        }
        let content_type = photo_content_type(extension)?;
        let key = format!(
            "{}/{}-{}.{}",
            date.format("%Y/%m"),
            date,
            Uuid::new_v4().simple(),
            extension.to_lowercase()
        );
        let url = self.backend.upload_photo(&key, bytes, content_type)?;
        self.modify_day(date, |day| day.photo_url = Some(url))
    }

    /// Exercises offered for the day's muscle groups
    pub fn exercises_for(&self, date: NaiveDate) -> catalog::ExerciseMap {
        let groups = self
            .schedule_for(date)
            .map(|s| s.muscle_groups.as_slice())
            .unwrap_or_default();
        self.catalog.exercises_for(groups, self.empty_selection)
    }

    /// Resolve a form entry against the catalog for the day's groups
    pub fn resolve(&self, date: NaiveDate, entry: &LogEntry) -> Result<ResolvedExercise> {
        self.resolve_choice(date, &entry.exercise, &entry.choice)
    }

    fn resolve_choice(&self, date: NaiveDate, exercise: &str, choice: &VariantChoice) -> Result<ResolvedExercise> {
        let groups = self
            .schedule_for(date)
            .map(|s| s.muscle_groups.as_slice())
            .unwrap_or_default();
        catalog::resolve_exercise(self.catalog, groups, self.empty_selection, exercise, choice)
    }

    /// Record a set on `date`
    pub fn add_log(&mut self, date: NaiveDate, entry: &LogEntry) -> Result<ExerciseLog> {
        validate_numbers(entry.weight, entry.reps)?;
        if !self.month.contains(date) {
            self.open_month(YearMonth::of(date))?;
        }
        // Nothing is written until the entry resolves.
        let resolved = self.resolve(date, entry)?;
        let day = self.ensure_day(date)?;

        let log = self.backend.insert_log(&NewExerciseLog {
            schedule_id: day.id,
            exercise_name: resolved.label,
            weight: entry.weight,
            reps: entry.reps,
        })?;
        tracing::info!("Logged {} on {}", log.exercise_name, date);

        if self.selected == Some(date) {
            self.logs.push(log.clone());
        }
        Ok(log)
    }

    /// Change an existing log of the selected day
    pub fn update_log(&mut self, id: Uuid, edit: &LogEdit) -> Result<ExerciseLog> {
        validate_numbers(edit.weight, edit.reps)?;
        let mut log = self
            .logs
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("log {} on the selected day", id)))?;

        match (&edit.exercise, self.selected) {
            (Some(exercise), Some(date)) => {
                log.exercise_name = self.resolve_choice(date, exercise, &edit.choice)?.label;
            }
            (None, _) if edit.choice != VariantChoice::default() => {
                return Err(Error::Validation("variant options need an exercise".into()));
            }
            _ => {}
        }
        log.weight = edit.weight;
        log.reps = edit.reps;

        let saved = self.backend.update_log(&log)?;
        if let Some(slot) = self.logs.iter_mut().find(|l| l.id == id) {
            *slot = saved.clone();
        }
        Ok(saved)
    }

    /// Delete a log; only the selected day's list is patched
    pub fn delete_log(&mut self, id: Uuid) -> Result<()> {
        self.backend.delete_log(id)?;
        self.logs.retain(|l| l.id != id);
        Ok(())
    }
}

fn validate_numbers(weight: f64, reps: f64) -> Result<()> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(Error::Validation(format!("weight must be zero or more, got {}", weight)));
    }
    if !reps.is_finite() || reps <= 0.0 {
        return Err(Error::Validation(format!("reps must be more than zero, got {}", reps)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::LocalBackend;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn planner(dir: &std::path::Path) -> Planner<LocalBackend> {
        let mut backend = LocalBackend::new(dir, None);
        backend.sign_in("coach@gym.test", "pw").unwrap();
        let mut planner = Planner::new(backend, YearMonth::new(2026, 10).unwrap());
        planner.open_month(planner.month()).unwrap();
        planner
    }

    fn numbers(weight: f64, reps: f64) -> LogEdit {
        LogEdit {
            weight,
            reps,
            ..LogEdit::default()
        }
    }

    fn entry(exercise: &str, weight: f64, reps: f64) -> LogEntry {
        LogEntry {
            exercise: exercise.into(),
            weight,
            reps,
            ..LogEntry::default()
        }
    }

    #[test]
    fn test_ensure_day_creates_once() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());

        let first = p.ensure_day(date("2026-10-05")).unwrap();
        let again = p.ensure_day(date("2026-10-05")).unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(p.schedules().len(), 1);
    }

    #[test]
    fn test_optimistic_patch_matches_backend() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-05");

        p.set_muscle_groups(d, &["back".into(), "Chest".into(), "Back".into(), " ".into()])
            .unwrap();
        p.toggle_completed(d).unwrap();

        let local = p.schedule_for(d).unwrap().clone();
        assert_eq!(local.muscle_groups, vec!["Back", "Chest"]);
        assert!(local.training_completed);

        let mut fresh = Planner::new(LocalBackend::new(temp_dir.path(), None), p.month());
        fresh.open_month(p.month()).unwrap();
        assert_eq!(fresh.schedule_for(d), Some(&local));
    }

    #[test]
    fn test_rest_toggle_restores_muscle_groups() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-07");
        p.set_muscle_groups(d, &["Legs".into(), "Core".into()]).unwrap();
        let before = p.schedule_for(d).unwrap().muscle_groups.clone();

        let on = p.toggle_rest(d).unwrap();
        assert!(on.is_rest_day);
        assert_eq!(on.status(), DayStatus::Rest);

        let off = p.toggle_rest(d).unwrap();
        assert!(!off.is_rest_day);
        assert_eq!(off.muscle_groups, before);
    }

    #[test]
    fn test_select_date_loads_logs_in_creation_order() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-05");
        p.set_muscle_groups(d, &["Legs".into()]).unwrap();

        p.add_log(d, &entry("Squat", 100.0, 5.0)).unwrap();
        p.add_log(d, &entry("Lunge", 20.0, 10.0)).unwrap();
        p.add_log(d, &entry("Leg Press", 180.0, 12.0)).unwrap();

        assert!(p.select_date(d).unwrap().is_some());
        let names: Vec<_> = p.logs().iter().map(|l| l.exercise_name.as_str()).collect();
        assert_eq!(names, vec!["Squat", "Lunge", "Leg Press"]);
        assert!(p.logs().windows(2).all(|w| w[0].created_at <= w[1].created_at));
    }

    #[test]
    fn test_select_empty_date() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        assert!(p.select_date(date("2026-10-09")).unwrap().is_none());
        assert!(p.logs().is_empty());
        assert_eq!(p.selected_date(), Some(date("2026-10-09")));
    }

    #[test]
    fn test_select_date_in_other_month_opens_it() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        p.select_date(date("2026-12-01")).unwrap();
        assert_eq!(p.month(), YearMonth::new(2026, 12).unwrap());
    }

    #[test]
    fn test_add_log_appends_to_selected_day() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-05");
        p.set_muscle_groups(d, &["Back".into()]).unwrap();
        p.select_date(d).unwrap();

        let choice = VariantChoice {
            equipment: Some("Dumbbell".into()),
            mode: Some("Single".into()),
            side: Some(Side::Left),
            ..VariantChoice::default()
        };
        let log = p
            .add_log(d, &LogEntry { exercise: "Row".into(), choice, weight: 30.0, reps: 10.0 })
            .unwrap();
        assert_eq!(log.exercise_name, "Row (Dumbbell, Single, Left)");
        assert_eq!(p.logs(), &[log]);
    }

    #[test]
    fn test_add_log_rejects_exercise_outside_groups() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-05");
        p.set_muscle_groups(d, &["Chest".into()]).unwrap();

        assert!(matches!(
            p.add_log(d, &entry("Squat", 100.0, 5.0)),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            p.add_log(d, &entry("Dips", 0.0, 0.0)),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_empty_selection_policy_applies_to_untagged_days() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-05");
        assert!(p.exercises_for(d).is_empty());
        assert!(p.add_log(d, &entry("Plank", 0.0, 1.0)).is_err());

        let mut p = p.with_empty_selection(EmptySelection::Everything);
        assert!(!p.exercises_for(d).is_empty());
        assert!(p.add_log(d, &entry("Plank", 0.0, 1.0)).is_ok());
    }

    #[test]
    fn test_delete_log_leaves_other_days_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let monday = date("2026-10-05");
        let tuesday = date("2026-10-06");
        p.set_muscle_groups(monday, &["Arms".into()]).unwrap();
        p.set_muscle_groups(tuesday, &["Arms".into()]).unwrap();

        p.add_log(tuesday, &entry("Bicep Curl", 12.0, 12.0)).unwrap();
        p.select_date(monday).unwrap();
        let doomed = p.add_log(monday, &entry("Bicep Curl", 14.0, 10.0)).unwrap();
        let kept = p.add_log(monday, &entry("Preacher Curl", 20.0, 8.0)).unwrap();

        p.delete_log(doomed.id).unwrap();
        assert_eq!(p.logs(), &[kept]);

        p.select_date(tuesday).unwrap();
        assert_eq!(p.logs().len(), 1);
        assert_eq!(p.logs()[0].exercise_name, "Bicep Curl");
    }

    #[test]
    fn test_update_log_patches_in_place() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-05");
        p.set_muscle_groups(d, &["Cardio".into()]).unwrap();
        p.select_date(d).unwrap();

        let log = p.add_log(d, &entry("Treadmill", 8.5, 30.0)).unwrap();
        let updated = p.update_log(log.id, &numbers(9.0, 25.0)).unwrap();
        assert_eq!(updated.weight, 9.0);
        assert_eq!(updated.exercise_name, "Treadmill");
        assert_eq!(p.logs()[0].reps, 25.0);

        assert!(matches!(p.update_log(Uuid::new_v4(), &numbers(1.0, 1.0)), Err(Error::NotFound(_))));
        assert!(matches!(p.update_log(log.id, &numbers(-1.0, 1.0)), Err(Error::Validation(_))));
    }

    #[test]
    fn test_update_log_relabels_variant() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-05");
        p.set_muscle_groups(d, &["Back".into()]).unwrap();
        p.select_date(d).unwrap();

        let both = VariantChoice {
            mode: Some("Both".into()),
            ..VariantChoice::default()
        };
        let log = p
            .add_log(d, &LogEntry { exercise: "Row".into(), choice: both, weight: 60.0, reps: 8.0 })
            .unwrap();
        assert_eq!(log.exercise_name, "Row (Both)");

        let edit = LogEdit {
            exercise: Some("row".into()),
            choice: VariantChoice {
                mode: Some("single".into()),
                side: Some(Side::Left),
                ..VariantChoice::default()
            },
            weight: 30.0,
            reps: 10.0,
        };
        let updated = p.update_log(log.id, &edit).unwrap();
        assert_eq!(updated.id, log.id);
        assert_eq!(updated.exercise_name, "Row (Single, Left)");
        assert_eq!(p.logs()[0].exercise_name, "Row (Single, Left)");

        let mut fresh = Planner::new(LocalBackend::new(temp_dir.path(), None), p.month());
        fresh.select_date(d).unwrap();
        assert_eq!(fresh.logs(), p.logs());

        let outside = LogEdit { exercise: Some("Squat".into()), ..numbers(30.0, 10.0) };
        assert!(matches!(p.update_log(log.id, &outside), Err(Error::Validation(_))));
        let orphan_choice = LogEdit {
            choice: VariantChoice { grip: Some("Neutral".into()), ..VariantChoice::default() },
            ..numbers(30.0, 10.0)
        };
        assert!(matches!(p.update_log(log.id, &orphan_choice), Err(Error::Validation(_))));
        assert_eq!(p.logs()[0].exercise_name, "Row (Single, Left)");
    }

    #[test]
    fn test_rejected_log_writes_no_day() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-12");

        assert!(p.add_log(d, &entry("Squat", 100.0, 5.0)).is_err());
        assert!(p.add_log(d, &entry("Nonexistent", 10.0, 5.0)).is_err());
        assert!(p.schedule_for(d).is_none());
        assert!(p.backend().list_schedules(&ScheduleQuery::default()).unwrap().is_empty());
        assert_eq!(p.summary().planned, 0);

        p.set_muscle_groups(d, &["Legs".into()]).unwrap();
        let bad_variant = LogEntry {
            choice: VariantChoice { grip: Some("Wide".into()), ..VariantChoice::default() },
            ..entry("Squat", 100.0, 5.0)
        };
        assert!(p.add_log(d, &bad_variant).is_err());
        assert!(p.backend().list_logs(&LogQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_add_log_in_other_month_uses_that_days_groups() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let november = date("2026-11-03");
        p.set_muscle_groups(november, &["Core".into()]).unwrap();
        p.open_month(YearMonth::new(2026, 10).unwrap()).unwrap();

        let log = p.add_log(november, &entry("Plank", 0.0, 1.0)).unwrap();
        assert_eq!(log.exercise_name, "Plank");
        assert_eq!(p.month(), YearMonth::new(2026, 11).unwrap());
    }

    #[test]
    fn test_set_equipment_needed() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-05");

        let day = p.set_equipment_needed(d, Some("Tripod, ring light".into())).unwrap();
        assert_eq!(day.equipment_needed.as_deref(), Some("Tripod, ring light"));
        let day = p.set_equipment_needed(d, Some("  ".into())).unwrap();
        assert!(day.equipment_needed.is_none());
    }

    #[test]
    fn test_attach_photo_marks_progress() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut p = planner(temp_dir.path());
        let d = date("2026-10-05");

        let day = p.attach_photo(d, b"fake-jpeg", "JPG").unwrap();
        assert!(day.has_photo());
        assert_eq!(day.status(), DayStatus::PartiallyComplete);
        let day = p.toggle_completed(d).unwrap();
        assert_eq!(day.status(), DayStatus::Complete);
        assert_eq!(p.summary().photos, 1);

        assert!(p.attach_photo(d, b"", "jpg").is_err());
        assert!(p.attach_photo(d, b"gif", "gif").is_err());
    }
}
