//! Hosted REST implementation of the backend collaborator.
//!
//! Tables are served under `/rest/v1/<table>` with PostgREST-style filters,
//! password sign-in under `/auth/v1`, and progress photos under
//! `/storage/v1/object/<bucket>/<key>`. Every request carries the project's
//! anon key; data requests also carry the session's bearer token.

use crate::backend::Backend;
use crate::document;
use crate::types::*;
use crate::{Error, Result};
use chrono::{Duration, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use uuid::Uuid;

pub const SCHEDULE_TABLE: &str = "content_schedule";
pub const LOG_TABLE: &str = "workout_logs";

pub struct RemoteBackend {
    client: Client,
    base_url: String,
    anon_key: String,
    bucket: String,
    session_path: PathBuf,
}

/// Password-grant response of the auth endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

/// Error bodies differ between the auth, rest and storage services
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl RemoteBackend {
    pub fn new(
        base_url: impl Into<String>,
        anon_key: impl Into<String>,
        bucket: impl Into<String>,
        session_path: impl Into<PathBuf>,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("gymlog/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
            bucket: bucket.into(),
            session_path: session_path.into(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    /// Public retrieval URL of an uploaded object
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url,
            self.bucket,
            key.trim_start_matches('/')
        )
    }

    fn authorized(&self, builder: RequestBuilder) -> Result<RequestBuilder> {
        let session = self.require_session()?;
        Ok(builder
            .header("apikey", &self.anon_key)
            .bearer_auth(session.access_token))
    }

    fn insert_row<T, R>(&self, table: &str, row: &T) -> Result<R>
    where
        T: serde::Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self
            .authorized(self.client.post(self.table_url(table)))?
            .header("Prefer", "return=representation")
            .json(row);
        single_row(request.send()?, table)
    }

    fn patch_row<T, R>(&self, table: &str, id: Uuid, row: &T) -> Result<R>
    where
        T: serde::Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self
            .authorized(self.client.patch(self.table_url(table)))?
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(row);
        single_row(request.send()?, table).map_err(|e| match e {
            Error::NotFound(_) => Error::NotFound(format!("{} {}", table, id)),
            other => other,
        })
    }
}

/// Query parameters for a schedule listing
pub fn schedule_params(query: &ScheduleQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("select", "*".to_string())];
    if let Some(from) = query.from {
        params.push(("schedule_date", format!("gte.{}", from)));
    }
    if let Some(to) = query.to {
        params.push(("schedule_date", format!("lte.{}", to)));
    }
    if query.photos_only {
        params.push(("photo_url", "not.is.null".to_string()));
    }
    params.push(("order", format!("schedule_date.{}", query.order.as_str())));
    params
}

/// Query parameters for a log listing
pub fn log_params(query: &LogQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("select", "*".to_string())];
    if let Some(id) = query.schedule_id {
        params.push(("schedule_id", format!("eq.{}", id)));
    }
    params.push(("order", format!("created_at.{}", query.order.as_str())));
    if let Some(limit) = query.limit {
        params.push(("limit", limit.to_string()));
    }
    params
}

/// Map an error status and body to a domain error
fn backend_error(status: u16, body: &str) -> Error {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        401 | 403 => Error::Unauthorized(message),
        404 => Error::NotFound(message),
        _ => Error::Backend { status, message },
    }
}

fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    tracing::warn!("Backend answered {}: {}", status, body);
    Err(backend_error(status.as_u16(), &body))
}

fn rows<R: DeserializeOwned>(response: Response) -> Result<Vec<R>> {
    Ok(check(response)?.json::<Vec<R>>()?)
}

fn single_row<R: DeserializeOwned>(response: Response, table: &str) -> Result<R> {
    rows(response)?
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(format!("{} returned no row", table)))
}

impl Backend for RemoteBackend {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthSession> {
        let response = self
            .client
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()?;
        let token: TokenResponse = check(response)?.json()?;

        let session = AuthSession {
            email: token
                .user
                .as_ref()
                .and_then(|u| u.email.clone())
                .unwrap_or_else(|| email.to_string()),
            user_id: token.user.map(|u| u.id),
            access_token: token.access_token,
            expires_at: token.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
        };
        document::save(&self.session_path, &Some(session.clone()))?;
        tracing::info!("Signed in as {}", session.email);
        Ok(session)
    }

    fn sign_out(&mut self) -> Result<()> {
        if let Some(session) = self.current_session()? {
            let result = self
                .client
                .post(format!("{}/auth/v1/logout", self.base_url))
                .header("apikey", &self.anon_key)
                .bearer_auth(&session.access_token)
                .send()
                .map_err(Error::from)
                .and_then(check);
            if let Err(e) = result {
                tracing::warn!("Remote sign-out failed, dropping local session anyway: {}", e);
            }
        }
        document::remove(&self.session_path)
    }

    fn current_session(&self) -> Result<Option<AuthSession>> {
        let session: Option<AuthSession> = document::load(&self.session_path)?;
        Ok(session.filter(|s| s.is_valid_at(Utc::now())))
    }

    fn list_schedules(&self, query: &ScheduleQuery) -> Result<Vec<ScheduleDay>> {
        let request = self
            .authorized(self.client.get(self.table_url(SCHEDULE_TABLE)))?
            .query(&schedule_params(query));
        rows(request.send()?)
    }

    fn insert_schedule(&mut self, day: &NewScheduleDay) -> Result<ScheduleDay> {
        self.insert_row(SCHEDULE_TABLE, day)
    }

    fn update_schedule(&mut self, day: &ScheduleDay) -> Result<ScheduleDay> {
        self.patch_row(SCHEDULE_TABLE, day.id, day)
    }

    fn list_logs(&self, query: &LogQuery) -> Result<Vec<ExerciseLog>> {
        let request = self
            .authorized(self.client.get(self.table_url(LOG_TABLE)))?
            .query(&log_params(query));
        rows(request.send()?)
    }

    fn insert_log(&mut self, log: &NewExerciseLog) -> Result<ExerciseLog> {
        self.insert_row(LOG_TABLE, log)
    }

    fn update_log(&mut self, log: &ExerciseLog) -> Result<ExerciseLog> {
        self.patch_row(LOG_TABLE, log.id, log)
    }

    fn delete_log(&mut self, id: Uuid) -> Result<()> {
        let request = self
            .authorized(self.client.delete(self.table_url(LOG_TABLE)))?
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation");
        let deleted: Vec<ExerciseLog> = rows(request.send()?)?;
        if deleted.is_empty() {
            return Err(Error::NotFound(format!("log {}", id)));
        }
        Ok(())
    }

    fn upload_photo(&mut self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        let key = key.trim_start_matches('/');
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, key);
        let request = self
            .authorized(self.client.post(url))?
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(bytes.to_vec());
        check(request.send()?)?;
        tracing::info!("Uploaded photo {} ({} bytes)", key, bytes.len());
        Ok(self.public_url(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn remote(dir: &std::path::Path) -> RemoteBackend {
        RemoteBackend::new(
            "https://project.example.test/",
            "anon",
            "progress-photos",
            dir.join("session.json"),
        )
        .unwrap()
    }

    #[test]
    fn test_schedule_params_for_month() {
        let query = ScheduleQuery::range(
            NaiveDate::from_ymd_opt(2026, 10, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 31).unwrap(),
        );
        let params = schedule_params(&query);
        assert_eq!(
            params,
            vec![
                ("select", "*".to_string()),
                ("schedule_date", "gte.2026-10-01".to_string()),
                ("schedule_date", "lte.2026-10-31".to_string()),
                ("order", "schedule_date.asc".to_string()),
            ]
        );
    }

    #[test]
    fn test_schedule_params_for_gallery() {
        let params = schedule_params(&ScheduleQuery::gallery());
        assert!(params.contains(&("photo_url", "not.is.null".to_string())));
        assert!(params.contains(&("order", "schedule_date.desc".to_string())));
    }

    #[test]
    fn test_log_params() {
        let id = Uuid::new_v4();
        let params = log_params(&LogQuery::for_day(id));
        assert!(params.contains(&("schedule_id", format!("eq.{}", id))));
        assert!(params.contains(&("order", "created_at.asc".to_string())));

        let params = log_params(&LogQuery::history(Some(20)));
        assert!(params.contains(&("order", "created_at.desc".to_string())));
        assert!(params.contains(&("limit", "20".to_string())));
    }

    #[test]
    fn test_backend_error_mapping() {
        assert!(matches!(
            backend_error(400, r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#),
            Error::Backend { status: 400, ref message } if message == "Invalid login credentials"
        ));
        assert!(matches!(backend_error(401, "{}"), Error::Unauthorized(_)));
        assert!(matches!(
            backend_error(409, r#"{"message":"duplicate key value"}"#),
            Error::Backend { status: 409, ref message } if message == "duplicate key value"
        ));
        assert!(matches!(
            backend_error(500, "upstream down"),
            Error::Backend { status: 500, ref message } if message == "upstream down"
        ));
    }

    #[test]
    fn test_public_url_trims_slashes() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = remote(temp_dir.path());
        assert_eq!(
            backend.public_url("/2026/10/05.jpg"),
            "https://project.example.test/storage/v1/object/public/progress-photos/2026/10/05.jpg"
        );
    }

    #[test]
    fn test_requests_need_a_session() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = remote(temp_dir.path());
        let result = backend.list_schedules(&ScheduleQuery::default());
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[test]
    fn test_expired_session_counts_as_signed_out() {
        let temp_dir = tempfile::tempdir().unwrap();
        let backend = remote(temp_dir.path());
        let stale = AuthSession {
            email: "coach@gym.test".into(),
            user_id: Some("u1".into()),
            access_token: "token".into(),
            expires_at: Some(Utc::now() - Duration::minutes(5)),
        };
        document::save(&temp_dir.path().join("session.json"), &Some(stale)).unwrap();
        assert!(backend.current_session().unwrap().is_none());
    }
}
