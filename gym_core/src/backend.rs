//! The backend collaborator that owns persistence, identity and blobs.
//!
//! Everything the planner stores goes through [`Backend`]. Two
//! implementations exist: [`crate::local::LocalBackend`] keeps JSON
//! documents in the data directory, [`crate::remote::RemoteBackend`] talks
//! to the hosted REST service.

use crate::config::{BackendKind, Config};
use crate::types::*;
use crate::{Error, Result};
use std::path::Path;
use uuid::Uuid;

/// Request/response contract with the backend
///
/// Calls are made one at a time from user-triggered handlers; there is no
/// retry or cancellation.
pub trait Backend {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthSession>;
    fn sign_out(&mut self) -> Result<()>;
    /// The stored session, or `None` when signed out or expired
    fn current_session(&self) -> Result<Option<AuthSession>>;

    fn list_schedules(&self, query: &ScheduleQuery) -> Result<Vec<ScheduleDay>>;
    fn insert_schedule(&mut self, day: &NewScheduleDay) -> Result<ScheduleDay>;
    fn update_schedule(&mut self, day: &ScheduleDay) -> Result<ScheduleDay>;

    fn list_logs(&self, query: &LogQuery) -> Result<Vec<ExerciseLog>>;
    fn insert_log(&mut self, log: &NewExerciseLog) -> Result<ExerciseLog>;
    fn update_log(&mut self, log: &ExerciseLog) -> Result<ExerciseLog>;
    fn delete_log(&mut self, id: Uuid) -> Result<()>;

    /// Store a blob under `key` and return its public retrieval URL
    fn upload_photo(&mut self, key: &str, bytes: &[u8], content_type: &str) -> Result<String>;

    /// Fail with [`Error::Unauthorized`] unless a session is active
    fn require_session(&self) -> Result<AuthSession> {
        self.current_session()?
            .ok_or_else(|| Error::Unauthorized("run `gymlog login` first".into()))
    }
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthSession> {
        (**self).sign_in(email, password)
    }
    fn sign_out(&mut self) -> Result<()> {
        (**self).sign_out()
    }
    fn current_session(&self) -> Result<Option<AuthSession>> {
        (**self).current_session()
    }
    fn list_schedules(&self, query: &ScheduleQuery) -> Result<Vec<ScheduleDay>> {
        (**self).list_schedules(query)
    }
    fn insert_schedule(&mut self, day: &NewScheduleDay) -> Result<ScheduleDay> {
        (**self).insert_schedule(day)
    }
    fn update_schedule(&mut self, day: &ScheduleDay) -> Result<ScheduleDay> {
        (**self).update_schedule(day)
    }
    fn list_logs(&self, query: &LogQuery) -> Result<Vec<ExerciseLog>> {
        (**self).list_logs(query)
    }
    fn insert_log(&mut self, log: &NewExerciseLog) -> Result<ExerciseLog> {
        (**self).insert_log(log)
    }
    fn update_log(&mut self, log: &ExerciseLog) -> Result<ExerciseLog> {
        (**self).update_log(log)
    }
    fn delete_log(&mut self, id: Uuid) -> Result<()> {
        (**self).delete_log(id)
    }
    fn upload_photo(&mut self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        (**self).upload_photo(key, bytes, content_type)
    }
}

/// Open the backend selected by the configuration
pub fn open(config: &Config, data_dir: &Path) -> Result<Box<dyn Backend>> {
    match config.backend.kind {
        BackendKind::Local => {
            tracing::debug!("Using local backend in {:?}", data_dir);
            Ok(Box::new(crate::local::LocalBackend::new(
                data_dir,
                config.backend.coach_email.clone(),
            )))
        }
        BackendKind::Remote => {
            let url = config.backend.url.clone().ok_or_else(|| {
                Error::Config("backend.url is required for the remote backend".into())
            })?;
            let key = config.backend.anon_key.clone().ok_or_else(|| {
                Error::Config("backend.anon_key is required for the remote backend".into())
            })?;
            tracing::debug!("Using remote backend at {}", url);
            Ok(Box::new(crate::remote::RemoteBackend::new(
                url,
                key,
                config.backend.photo_bucket.clone(),
                data_dir.join("session.json"),
            )?))
        }
    }
}

/// Content type for a photo file extension
pub fn photo_content_type(extension: &str) -> Result<&'static str> {
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => Ok("image/jpeg"),
        "png" => Ok("image/png"),
        "webp" => Ok("image/webp"),
        "heic" => Ok("image/heic"),
        other => Err(Error::Validation(format!(
            "unsupported photo type '{}', expected jpg, png, webp or heic",
            other
        ))),
    }
}
