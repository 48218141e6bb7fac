/// Supabase (PostgREST) client for the two leaderboard queries.
use std::time::Duration;

use leaderboard_core::{EventParticipation, Participant};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const STUDENTS_TABLE: &str = "students";
const STUDENTS_SELECT: &str = "id,first_name,last_name,is_male,house_id";

const PARTICIPANTS_TABLE: &str = "event_participants";
const PARTICIPANTS_SELECT: &str = "student_id,event_log!inner(event_details,event_types!inner(points))";

/// Pause between retries of a failed request.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Connection settings for the hosted database.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abc.supabase.co`.
    pub url: String,
    pub anon_key: String,
    pub timeout: Duration,
    /// Extra attempts after the first failure. 0 disables retrying.
    pub retries: usize,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Supabase returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to decode {table} rows: {source}")]
    Decode {
        table: &'static str,
        source: serde_json::Error,
    },
}

/// Where the leaderboard's rows come from.
///
/// Implemented by [`SupabaseClient`]; tests substitute canned rows.
pub trait LeaderboardSource: Send + Sync + 'static {
    /// Current students with a house assigned.
    fn fetch_eligible_participants(
        &self,
    ) -> impl Future<Output = Result<Vec<Participant>, FetchError>> + Send;

    /// Every event participation with its base points and event details.
    fn fetch_event_participations(
        &self,
    ) -> impl Future<Output = Result<Vec<EventParticipation>, FetchError>> + Send;
}

pub struct SupabaseClient {
    http: Client,
    config: SupabaseConfig,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self, FetchError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SupabaseConfig {
        &self.config
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.config.url.trim_end_matches('/'))
    }

    /// Send one GET to a table and decode the rows.
    async fn get_once<T: DeserializeOwned>(
        &self,
        table: &'static str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, FetchError> {
        let resp = self
            .http
            .get(self.table_url(table))
            .query(query)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            let body = body.chars().take(200).collect();
            return Err(FetchError::Status { status, body });
        }

        serde_json::from_str(&body).map_err(|source| FetchError::Decode { table, source })
    }

    /// GET with retries on any failure.
    ///
    /// Retries up to `retries` times with a 1-second delay between attempts.
    async fn get_rows<T: DeserializeOwned>(
        &self,
        table: &'static str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, FetchError> {
        let mut attempt = 0;
        loop {
            match self.get_once(table, query).await {
                Ok(rows) => return Ok(rows),
                Err(e) if attempt < self.config.retries => {
                    attempt += 1;
                    warn!("Retry {attempt}/{} for {table}: {e}", self.config.retries);
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl LeaderboardSource for SupabaseClient {
    async fn fetch_eligible_participants(&self) -> Result<Vec<Participant>, FetchError> {
        let rows: Vec<StudentRow> = self
            .get_rows(
                STUDENTS_TABLE,
                &[
                    ("select", STUDENTS_SELECT),
                    ("current_student", "eq.true"),
                    ("house_id", "not.is.null"),
                ],
            )
            .await?;
        debug!("Fetched {} students", rows.len());
        Ok(students_from_rows(rows))
    }

    async fn fetch_event_participations(&self) -> Result<Vec<EventParticipation>, FetchError> {
        let rows: Vec<ParticipationRow> = self
            .get_rows(PARTICIPANTS_TABLE, &[("select", PARTICIPANTS_SELECT)])
            .await?;
        debug!("Fetched {} event participations", rows.len());
        Ok(participations_from_rows(rows))
    }
}

#[derive(Debug, Deserialize)]
pub struct StudentRow {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_male: Option<bool>,
    pub house_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ParticipationRow {
    pub student_id: Option<String>,
    pub event_log: Option<EventLogRow>,
}

#[derive(Debug, Deserialize)]
pub struct EventLogRow {
    /// Text or jsonb column, depending on the schema.
    pub event_details: Option<Value>,
    pub event_types: Option<EventTypeRow>,
}

#[derive(Debug, Deserialize)]
pub struct EventTypeRow {
    pub points: Option<f64>,
}

/// Keep students with both a gender and a house; they are the ranked set.
pub fn students_from_rows(rows: Vec<StudentRow>) -> Vec<Participant> {
    rows.into_iter()
        .filter_map(|row| {
            let (Some(is_male), Some(house_id)) = (row.is_male, row.house_id) else {
                warn!(student_id = %row.id, "Skipping student without gender or house");
                return None;
            };
            Some(Participant {
                id: row.id,
                first_name: row.first_name.unwrap_or_default(),
                last_name: row.last_name.unwrap_or_default(),
                is_male,
                house_id,
            })
        })
        .collect()
}

/// Flatten the nested PostgREST shape. Rows without a student are dropped.
pub fn participations_from_rows(rows: Vec<ParticipationRow>) -> Vec<EventParticipation> {
    rows.into_iter()
        .filter_map(|row| {
            let student_id = row.student_id?;
            let (base_points, event_details) = match row.event_log {
                Some(log) => (
                    log.event_types.and_then(|t| t.points),
                    log.event_details.and_then(details_text),
                ),
                None => (None, None),
            };
            Some(EventParticipation { student_id, base_points, event_details })
        })
        .collect()
}

/// Event details as the raw JSON text the override parser expects.
fn details_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use axum::{
        Json, Router,
        extract::{Query, State},
        http::HeaderMap,
        response::{IntoResponse, Response},
        routing::get,
    };
    use tokio::net::TcpListener;

    const ANON_KEY: &str = "anon-test-key";

    /// Stand-in PostgREST endpoint. Answers 503 for the first `failures` requests.
    #[derive(Clone, Default)]
    struct StubRest {
        failures: usize,
        hits: Arc<AtomicUsize>,
        seen: Arc<Mutex<Vec<(HeaderMap, HashMap<String, String>)>>>,
    }

    impl StubRest {
        fn failing(failures: usize) -> Self {
            StubRest { failures, ..Default::default() }
        }

        fn record(&self, headers: HeaderMap, query: HashMap<String, String>) -> Option<Response> {
            self.seen.lock().unwrap().push((headers, query));
            let hit = self.hits.fetch_add(1, Ordering::SeqCst);
            (hit < self.failures).then(|| (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response())
        }
    }

    async fn students_route(
        State(stub): State<StubRest>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> Response {
        if let Some(busy) = stub.record(headers, query) {
            return busy;
        }
        Json(serde_json::json!([
            {"id": "u1", "first_name": "Ann", "last_name": "Zed", "is_male": false, "house_id": 4}
        ]))
        .into_response()
    }

    async fn participations_route(
        State(stub): State<StubRest>,
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> Response {
        if let Some(busy) = stub.record(headers, query) {
            return busy;
        }
        Json(serde_json::json!([
            {"student_id": "u1", "event_log": {"event_details": "{\"customPoints\": 25}", "event_types": {"points": 10}}}
        ]))
        .into_response()
    }

    async fn spawn_stub(stub: StubRest) -> String {
        let app = Router::new()
            .route("/rest/v1/students", get(students_route))
            .route("/rest/v1/event_participants", get(participations_route))
            .with_state(stub);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn client(url: String, retries: usize) -> SupabaseClient {
        SupabaseClient::new(SupabaseConfig {
            url,
            anon_key: ANON_KEY.to_string(),
            timeout: Duration::from_secs(5),
            retries,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_students_request_sends_key_and_filters() {
        let stub = StubRest::default();
        let url = spawn_stub(stub.clone()).await;

        let students = client(url, 0).fetch_eligible_participants().await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(students[0].full_name(), "Ann Zed");

        let seen = stub.seen.lock().unwrap();
        let (headers, query) = &seen[0];
        assert_eq!(headers["apikey"], ANON_KEY);
        assert_eq!(headers["authorization"], format!("Bearer {ANON_KEY}").as_str());
        assert_eq!(query["select"], STUDENTS_SELECT);
        assert_eq!(query["current_student"], "eq.true");
        assert_eq!(query["house_id"], "not.is.null");
    }

    #[tokio::test]
    async fn test_participations_request_uses_nested_select() {
        let stub = StubRest::default();
        let url = spawn_stub(stub.clone()).await;

        let events = client(url, 0).fetch_event_participations().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].base_points, Some(10.0));
        assert_eq!(events[0].event_details.as_deref(), Some(r#"{"customPoints": 25}"#));

        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen[0].1["select"], PARTICIPANTS_SELECT);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_one_failure() {
        let stub = StubRest::failing(1);
        let url = spawn_stub(stub.clone()).await;

        let students = client(url, 1).fetch_eligible_participants().await.unwrap();
        assert_eq!(students.len(), 1);
        assert_eq!(stub.hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_retries_surfaces_status_error() {
        let stub = StubRest::failing(1);
        let url = spawn_stub(stub.clone()).await;

        let err = client(url, 0).fetch_eligible_participants().await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
                assert_eq!(body, "busy");
            }
            other => panic!("expected status error, got {other}"),
        }
        assert_eq!(stub.hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_decode_student_rows() {
        let body = r#"[
            {"id": "u1", "first_name": "Ann", "last_name": "Zed", "is_male": false, "house_id": 4},
            {"id": "u2", "first_name": "Bob", "last_name": null, "is_male": true, "house_id": 7},
            {"id": "u3", "first_name": "Cy", "last_name": "Dee", "is_male": null, "house_id": 1}
        ]"#;
        let rows: Vec<StudentRow> = serde_json::from_str(body).unwrap();
        let students = students_from_rows(rows);

        assert_eq!(students.len(), 2);
        assert_eq!(students[0].full_name(), "Ann Zed");
        assert_eq!(students[0].house_id, 4);
        assert!(students[1].is_male);
        assert_eq!(students[1].last_name, "");
    }

    #[test]
    fn test_decode_nested_participation_rows() {
        let body = r#"[
            {"student_id": "u1", "event_log": {"event_details": "{\"customPoints\": 25}", "event_types": {"points": 10}}},
            {"student_id": "u1", "event_log": {"event_details": {"customPoints": 3}, "event_types": {"points": 10}}},
            {"student_id": "u2", "event_log": {"event_details": null, "event_types": null}},
            {"student_id": null, "event_log": {"event_details": null, "event_types": {"points": 5}}}
        ]"#;
        let rows: Vec<ParticipationRow> = serde_json::from_str(body).unwrap();
        let events = participations_from_rows(rows);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].base_points, Some(10.0));
        assert_eq!(events[0].event_details.as_deref(), Some(r#"{"customPoints": 25}"#));
        assert_eq!(events[1].event_details.as_deref(), Some(r#"{"customPoints":3}"#));
        assert_eq!(events[2].base_points, None);
        assert_eq!(events[2].event_details, None);
    }

    #[test]
    fn test_table_url_trims_trailing_slash() {
        let client = SupabaseClient::new(SupabaseConfig {
            url: "https://example.supabase.co/".to_string(),
            anon_key: "key".to_string(),
            timeout: Duration::from_secs(5),
            retries: 0,
        })
        .unwrap();
        assert_eq!(client.table_url("students"), "https://example.supabase.co/rest/v1/students");
    }

    #[test]
    fn test_status_error_message() {
        let err = FetchError::Status {
            status: StatusCode::UNAUTHORIZED,
            body: "Invalid API key".to_string(),
        };
        assert_eq!(err.to_string(), "Supabase returned 401 Unauthorized: Invalid API key");
    }
}
