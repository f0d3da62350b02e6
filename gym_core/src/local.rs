//! File-backed implementation of the backend collaborator.
//!
//! Layout under the data directory:
//! - `schedules.json`: every schedule day
//! - `logs.json`: every exercise log
//! - `session.json`: the signed-in session
//! - `photos/`: uploaded progress photos

use crate::backend::Backend;
use crate::document;
use crate::types::*;
use crate::{Error, Result};
use chrono::Utc;
use std::path::{Component, Path, PathBuf};
use uuid::Uuid;

pub struct LocalBackend {
    root: PathBuf,
    coach_email: Option<String>,
}

impl LocalBackend {
    /// Create a backend rooted at `root`; `coach_email` restricts sign-in
    pub fn new(root: impl Into<PathBuf>, coach_email: Option<String>) -> Self {
        Self {
            root: root.into(),
            coach_email,
        }
    }

    fn schedules_path(&self) -> PathBuf {
        self.root.join("schedules.json")
    }

    fn logs_path(&self) -> PathBuf {
        self.root.join("logs.json")
    }

    fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }

    fn photos_dir(&self) -> PathBuf {
        self.root.join("photos")
    }
}

fn conflict(message: String) -> Error {
    Error::Backend {
        status: 409,
        message,
    }
}

impl Backend for LocalBackend {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthSession> {
        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(Error::Unauthorized("email and password are required".into()));
        }
        if let Some(coach) = &self.coach_email {
            if !coach.eq_ignore_ascii_case(email) {
                tracing::warn!("Rejected local sign-in for {}", email);
                return Err(Error::Unauthorized("invalid login credentials".into()));
            }
        }

        let session = AuthSession {
            email: email.to_string(),
            user_id: None,
            access_token: Uuid::new_v4().to_string(),
            expires_at: None,
        };
        document::save(&self.session_path(), &Some(session.clone()))?;
        tracing::info!("Signed in locally as {}", session.email);
        Ok(session)
    }

    fn sign_out(&mut self) -> Result<()> {
        document::remove(&self.session_path())
    }

    fn current_session(&self) -> Result<Option<AuthSession>> {
        let session: Option<AuthSession> = document::load(&self.session_path())?;
        Ok(session.filter(|s| s.is_valid_at(Utc::now())))
    }

    fn list_schedules(&self, query: &ScheduleQuery) -> Result<Vec<ScheduleDay>> {
        let all: Vec<ScheduleDay> = document::load(&self.schedules_path())?;
        let mut days: Vec<ScheduleDay> = all.into_iter().filter(|d| query.matches(d)).collect();
        match query.order {
            SortOrder::Ascending => days.sort_by_key(|d| d.schedule_date),
            SortOrder::Descending => days.sort_by(|a, b| b.schedule_date.cmp(&a.schedule_date)),
        }
        Ok(days)
    }

    fn insert_schedule(&mut self, new: &NewScheduleDay) -> Result<ScheduleDay> {
        document::update(&self.schedules_path(), |days: &mut Vec<ScheduleDay>| {
            if days.iter().any(|d| d.schedule_date == new.schedule_date) {
                return Err(conflict(format!(
                    "a schedule for {} already exists",
                    new.schedule_date
                )));
            }
            let day = ScheduleDay {
                id: Uuid::new_v4(),
                schedule_date: new.schedule_date,
                muscle_groups: new.muscle_groups.clone(),
                is_rest_day: new.is_rest_day,
                training_completed: new.training_completed,
                photo_url: new.photo_url.clone(),
                topic: new.topic.clone(),
                notes: new.notes.clone(),
                equipment_needed: new.equipment_needed.clone(),
                created_at: Utc::now(),
            };
            days.push(day.clone());
            tracing::debug!("Inserted schedule {} for {}", day.id, day.schedule_date);
            Ok(day)
        })
    }

    fn update_schedule(&mut self, day: &ScheduleDay) -> Result<ScheduleDay> {
        document::update(&self.schedules_path(), |days: &mut Vec<ScheduleDay>| {
            if days
                .iter()
                .any(|d| d.id != day.id && d.schedule_date == day.schedule_date)
            {
                return Err(conflict(format!(
                    "a schedule for {} already exists",
                    day.schedule_date
                )));
            }
            let existing = days
                .iter_mut()
                .find(|d| d.id == day.id)
                .ok_or_else(|| Error::NotFound(format!("schedule {}", day.id)))?;
            *existing = day.clone();
            Ok(day.clone())
        })
    }

    fn list_logs(&self, query: &LogQuery) -> Result<Vec<ExerciseLog>> {
        let all: Vec<ExerciseLog> = document::load(&self.logs_path())?;
        let mut logs: Vec<ExerciseLog> = all.into_iter().filter(|l| query.matches(l)).collect();
        sort_logs(&mut logs, query.order);
        if let Some(limit) = query.limit {
            logs.truncate(limit);
        }
        Ok(logs)
    }

    fn insert_log(&mut self, new: &NewExerciseLog) -> Result<ExerciseLog> {
        let days: Vec<ScheduleDay> = document::load(&self.schedules_path())?;
        if !days.iter().any(|d| d.id == new.schedule_id) {
            return Err(Error::NotFound(format!("schedule {}", new.schedule_id)));
        }

        document::update(&self.logs_path(), |logs: &mut Vec<ExerciseLog>| {
            let log = ExerciseLog {
                id: Uuid::new_v4(),
                schedule_id: new.schedule_id,
                exercise_name: new.exercise_name.clone(),
                weight: new.weight,
                reps: new.reps,
                created_at: Utc::now(),
            };
            logs.push(log.clone());
            tracing::debug!("Inserted log {} on schedule {}", log.id, log.schedule_id);
            Ok(log)
        })
    }

    fn update_log(&mut self, log: &ExerciseLog) -> Result<ExerciseLog> {
        document::update(&self.logs_path(), |logs: &mut Vec<ExerciseLog>| {
            let existing = logs
                .iter_mut()
                .find(|l| l.id == log.id)
                .ok_or_else(|| Error::NotFound(format!("log {}", log.id)))?;
            *existing = log.clone();
            Ok(log.clone())
        })
    }

    fn delete_log(&mut self, id: Uuid) -> Result<()> {
        document::update(&self.logs_path(), |logs: &mut Vec<ExerciseLog>| {
            let before = logs.len();
            logs.retain(|l| l.id != id);
            if logs.len() == before {
                return Err(Error::NotFound(format!("log {}", id)));
            }
            tracing::debug!("Deleted log {}", id);
            Ok(())
        })
    }

    fn upload_photo(&mut self, key: &str, bytes: &[u8], _content_type: &str) -> Result<String> {
        let relative = Path::new(key);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::Validation(format!("invalid photo key '{}'", key)));
        }

        let path = self.photos_dir().join(relative);
        document::write_blob(&path, bytes)?;
        tracing::info!("Stored photo {} ({} bytes)", key, bytes.len());

        let absolute = path.canonicalize()?;
        Ok(format!("file://{}", absolute.display()))
    }
}
