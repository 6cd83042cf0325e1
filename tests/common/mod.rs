#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::sync::Notify;

use foundation_admin::auth::password;
use foundation_admin::browser::Catalog;
use foundation_admin::config::Config;
use foundation_admin::db::{MemoryRecordSource, RecordSource, SortOrder, StoreError, TextMatch};
use foundation_admin::models::Record;
use foundation_admin::state::SharedState;

pub const ADMIN_USER: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

pub fn record(id: &str, fields: Value) -> Record {
    let Value::Object(fields) = fields else {
        panic!("record fields must be an object");
    };
    Record::new(id, fields)
}

pub fn names(records: &[Record]) -> Vec<String> {
    records.iter().map(|r| r.text("name")).collect()
}

/// Seeds the four standard collections. Rows are inserted out of recency
/// order so listings have to sort.
pub fn seeded_memory() -> MemoryRecordSource {
    let source = MemoryRecordSource::with_collections(
        Catalog::standard().unwrap().collections(),
    );

    source.insert(
        "contact_submissions",
        [
            record("c1", json!({ "name": "Frank Ho", "email": "frank@example.org", "subject": "Volunteering", "created_at": "2024-04-01T09:00:00Z", "status": "New" })),
            record("c2", json!({ "name": "Grace Lam", "email": "grace@example.org", "subject": "Donation receipt", "created_at": "2024-04-02T09:00:00Z", "status": "New" })),
        ],
    );

    source.insert(
        "donors",
        [
            record("d2", json!({ "name": "Bob", "email": "bob@example.org", "phone": "555-0102", "amount": 50, "program": "Scholarships", "date": "2024-05-02", "created_at": "2024-05-02T10:00:00Z", "status": "Received" })),
            record("d1", json!({ "name": "Anna", "email": "anna@example.org", "phone": "555-0101", "amount": 100, "program": "Meals", "date": "2024-05-03", "created_at": "2024-05-03T10:00:00Z", "status": "Received" })),
            record("d3", json!({ "name": "Hannah", "email": "hannah@example.org", "phone": "555-0103", "amount": 25, "program": "Meals", "date": "2024-05-01", "created_at": "2024-05-01T10:00:00Z", "status": "Pending" })),
        ],
    );

    source.insert(
        "event_registrations",
        [
            record("e2", json!({ "name": "Evan Pham", "email": "evan@example.org", "phone": "555-0202", "event": "Spring Gala", "registration_date": "2024-06-01T12:00:00Z", "attendee_type": "Guest", "special_requirements": null, "status": "Pending" })),
            record("e1", json!({ "name": "Dana Vo", "email": "dana@example.org", "phone": "555-0201", "event": "Spring Gala", "registration_date": "2024-06-02T12:00:00Z", "attendee_type": "Sponsor", "special_requirements": "Vegetarian, no nuts", "status": "Confirmed" })),
        ],
    );

    source.insert(
        "volunteer_applications",
        [
            record("v2", json!({ "name": "Brian Tran", "email": "brian@example.org", "phone": "555-0302", "skills": "Cooking", "availability": "Weekends", "experience": "Food bank", "motivation": "Give back", "date": "2024-03-02", "status": "Approved" })),
            record("v1", json!({ "name": "Alice Nguyen", "email": "alice@example.org", "phone": "555-0301", "skills": "Teaching, tutoring", "availability": "Evenings", "experience": "Two years", "motivation": "I said \"yes\" right away", "date": "2024-03-03", "status": "Pending" })),
            record("v3", json!({ "name": "Carla Diaz", "email": "carla@example.org", "phone": "555-0303", "skills": "Design", "availability": "Weekdays", "experience": "None", "motivation": "Learn", "date": "2024-03-01", "status": "Rejected" })),
        ],
    );

    source
}

/// Wraps a memory source to count calls and inject failures.
pub struct ProbeSource {
    pub inner: MemoryRecordSource,
    pub calls: AtomicUsize,
    pub fail_queries: AtomicBool,
    pub fail_updates: AtomicBool,
}

impl ProbeSource {
    pub fn new(inner: MemoryRecordSource) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
            fail_queries: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn query_guard(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RecordSource for ProbeSource {
    fn backend(&self) -> &str {
        "probe"
    }

    async fn select_all(&self, collection: &str, order: SortOrder) -> Result<Vec<Record>, StoreError> {
        self.query_guard()?;
        self.inner.select_all(collection, order).await
    }

    async fn select_matching(
        &self,
        collection: &str,
        filter: TextMatch<'_>,
        order: SortOrder,
    ) -> Result<Vec<Record>, StoreError> {
        self.query_guard()?;
        self.inner.select_matching(collection, filter, order).await
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.update_field(collection, id, field, value).await
    }

    async fn count(&self, collection: &str) -> Result<i64, StoreError> {
        self.query_guard()?;
        self.inner.count(collection).await
    }
}

/// Blocks searches for one term until released, so tests can order
/// concurrent responses deterministically.
pub struct GatedSource {
    pub inner: MemoryRecordSource,
    pub gated_term: String,
    entered: Notify,
    release: Notify,
}

impl GatedSource {
    pub fn new(inner: MemoryRecordSource, gated_term: &str) -> Self {
        Self {
            inner,
            gated_term: gated_term.to_string(),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Resolves once a gated search is parked.
    pub async fn wait_until_blocked(&self) {
        tokio::time::timeout(Duration::from_secs(5), self.entered.notified())
            .await
            .expect("gated search never started");
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl RecordSource for GatedSource {
    fn backend(&self) -> &str {
        "gated"
    }

    async fn select_all(&self, collection: &str, order: SortOrder) -> Result<Vec<Record>, StoreError> {
        self.inner.select_all(collection, order).await
    }

    async fn select_matching(
        &self,
        collection: &str,
        filter: TextMatch<'_>,
        order: SortOrder,
    ) -> Result<Vec<Record>, StoreError> {
        // Read before parking so the result reflects the store at issue time.
        let result = self.inner.select_matching(collection, filter, order).await;
        if filter.term == self.gated_term {
            self.entered.notify_one();
            self.release.notified().await;
        }
        result
    }

    async fn update_field(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.inner.update_field(collection, id, field, value).await
    }

    async fn count(&self, collection: &str) -> Result<i64, StoreError> {
        self.inner.count(collection).await
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: None,
        jwt_secret: "test-jwt-secret-that-is-long-enough".to_string(),
        admin_username: ADMIN_USER.to_string(),
        admin_password_hash: password::hash(ADMIN_PASSWORD).expect("hash test password"),
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        session_ttl_minutes: 60,
        view_ttl: Duration::from_secs(600),
        secure_cookies: false,
        log_level: "warn".to_string(),
    }
}

/// A running test server backed by the seeded in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub probe: Arc<ProbeSource>,
    pub state: SharedState,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Login through the JSON API, return (body, status).
    pub async fn login(&self, username: &str, password: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .post(self.url("/api/v1/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("login request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Login with the configured admin, return the session token.
    pub async fn token(&self) -> String {
        let (body, status) = self.login(ADMIN_USER, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    /// GET an admin page with the session cookie, return (body, status, headers).
    pub async fn get_page(&self, path: &str, token: &str) -> (String, StatusCode, reqwest::header::HeaderMap) {
        let resp = self
            .client
            .get(self.url(path))
            .header("cookie", format!("admin_session={token}"))
            .send()
            .await
            .expect("page request failed");
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await.unwrap_or_default();
        (body, status, headers)
    }

    /// POST an HTMX form with the session cookie, return (body, status).
    pub async fn post_form(&self, path: &str, token: &str, form: &[(&str, &str)]) -> (String, StatusCode) {
        let resp = self
            .client
            .post(self.url(path))
            .header("cookie", format!("admin_session={token}"))
            .header("hx-request", "true")
            .form(form)
            .send()
            .await
            .expect("form request failed");
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        (body, status)
    }

    /// Make an authenticated GET request against the JSON API.
    pub async fn get_api(&self, path: &str, token: &str) -> (Value, StatusCode) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("get request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Make an authenticated PUT request with JSON body.
    pub async fn put_api(&self, path: &str, token: &str, body: &Value) -> (Value, StatusCode) {
        let resp = self
            .client
            .put(self.url(path))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .expect("put request failed");
        let status = resp.status();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        (body, status)
    }

    /// Mount an entity page and return the view id embedded in it.
    pub async fn mount(&self, entity: &str, token: &str) -> (String, String) {
        let (body, status, _) = self.get_page(&format!("/admin/{entity}"), token).await;
        assert_eq!(status, StatusCode::OK, "mount failed: {body}");
        let view = view_id(&body).expect("page has no view id");
        (view, body)
    }

    /// Rows of a collection as currently stored.
    pub fn stored(&self, collection: &str) -> Vec<Record> {
        self.probe.inner.dump(collection)
    }
}

/// Pull the view id out of a rendered browser page.
pub fn view_id(html: &str) -> Option<String> {
    let marker = "id=\"view-id\" name=\"view\" value=\"";
    let start = html.find(marker)? + marker.len();
    let end = html[start..].find('"')? + start;
    Some(html[start..end].to_string())
}

/// Spawn the app on a random port with the seeded store.
pub async fn spawn_app() -> TestApp {
    spawn_app_with(seeded_memory()).await
}

pub async fn spawn_app_with(memory: MemoryRecordSource) -> TestApp {
    let probe = Arc::new(ProbeSource::new(memory));
    let catalog = Catalog::standard().expect("standard catalog");

    let (app, state) = foundation_admin::build_app(probe.clone(), catalog, test_config());

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    // Spawn server in background
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        probe,
        state,
    }
}
