//! Integration tests for the Tidecal backend.

use std::sync::Arc;

use reqwest::Client;
use serde_json::{json, Value};
use tempfile::TempDir;

use crate::auth::{Credentials, SessionStore};
use crate::config::Config;
use crate::db::{init_database, Repository};
use crate::models::{CreateEventRequest, EventFilter, UpdateEventRequest};
use crate::{create_router, AppState};

const TEST_USERNAME: &str = "alice";
const TEST_PASSWORD: &str = "deep-blue";

/// Test fixture for HTTP-level tests: a real server on an ephemeral port
/// with a client already logged in as the configured account.
struct TestFixture {
    client: Client,
    base_url: String,
    _temp_dir: TempDir,
}

impl TestFixture {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.sqlite");

        let pool = init_database(&db_path).await.expect("Failed to init DB");
        let repo = Arc::new(Repository::new(pool));

        let config = Config {
            credentials: Credentials::new(TEST_USERNAME.to_string(), TEST_PASSWORD),
            db_path,
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            log_level: "warn".to_string(),
        };

        let state = AppState {
            repo,
            sessions: Arc::new(SessionStore::new()),
            config: Arc::new(config),
        };

        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get addr");
        let base_url = format!("http://{}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        // Log in and attach the session token to all subsequent requests
        let login_resp = Client::new()
            .post(format!("{}/api/login", base_url))
            .json(&json!({ "username": TEST_USERNAME, "password": TEST_PASSWORD }))
            .send()
            .await
            .expect("Login request failed");
        assert_eq!(login_resp.status(), 200);
        let login_body: Value = login_resp.json().await.unwrap();
        let token = login_body["data"]["token"].as_str().unwrap().to_string();

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("x-session-token", token.parse().unwrap());
        let client = Client::builder().default_headers(headers).build().unwrap();

        TestFixture {
            client,
            base_url,
            _temp_dir: temp_dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Repository-only fixture for tests that need multiple usernames; the HTTP
/// surface only ever serves the single configured account.
async fn test_repo() -> (Arc<Repository>, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let pool = init_database(&temp_dir.path().join("test.sqlite"))
        .await
        .expect("Failed to init DB");
    (Arc::new(Repository::new(pool)), temp_dir)
}

fn create_request(title: &str, date: &str) -> CreateEventRequest {
    CreateEventRequest {
        title: title.to_string(),
        description: String::new(),
        event_date: date.to_string(),
        event_time: None,
        tags: None,
        platforms: None,
    }
}

// ==================== HTTP TESTS ====================

#[tokio::test]
async fn test_health_check() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .get(fixture.url("/health"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let fixture = TestFixture::new().await;

    for (username, password) in [
        (TEST_USERNAME, "wrong-password"),
        ("mallory", TEST_PASSWORD),
        ("", ""),
    ] {
        let resp = Client::new()
            .post(fixture.url("/api/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 401);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_api_requires_session() {
    let fixture = TestFixture::new().await;

    // No token at all
    let resp = Client::new()
        .get(fixture.url("/api/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Made-up token
    let resp = Client::new()
        .get(fixture.url("/api/events"))
        .header("x-session-token", "not-a-real-token")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_logout_revokes_session() {
    let fixture = TestFixture::new().await;

    let resp = fixture
        .client
        .post(fixture.url("/api/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // The same token no longer works
    let resp = fixture
        .client
        .get(fixture.url("/api/events"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_event_crud() {
    let fixture = TestFixture::new().await;

    // Create with mixed tag shapes: array for tags, comma string for platforms
    let create_resp = fixture
        .client
        .post(fixture.url("/api/events"))
        .json(&json!({
            "title": "Dive Briefing",
            "description": "Monthly planning",
            "event_date": "2024-06-01",
            "tags": ["Work", "urgent"],
            "platforms": "Discord, GitHub"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(create_resp.status(), 200);
    let create_body: Value = create_resp.json().await.unwrap();
    assert_eq!(create_body["success"], true);
    let event_id = create_body["data"]["id"].as_i64().unwrap();
    assert_eq!(create_body["data"]["tags"], json!(["Work", "urgent"]));
    assert_eq!(create_body["data"]["platforms"], json!(["Discord", "GitHub"]));
    assert_eq!(create_body["data"]["username"], TEST_USERNAME);

    // List within the month
    let list_resp = fixture
        .client
        .get(fixture.url("/api/events?start_date=2024-06-01&end_date=2024-06-30"))
        .send()
        .await
        .unwrap();
    assert_eq!(list_resp.status(), 200);
    let list_body: Value = list_resp.json().await.unwrap();
    let events = list_body["data"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["title"], "Dive Briefing");
    assert_eq!(events[0]["tags"], json!(["Work", "urgent"]));

    // Partial update: new title, tags as comma string; platforms untouched
    let update_resp = fixture
        .client
        .put(fixture.url(&format!("/api/events/{}", event_id)))
        .json(&json!({
            "title": "Dive Debriefing",
            "tags": "Work, review"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(update_resp.status(), 200);
    let update_body: Value = update_resp.json().await.unwrap();
    assert_eq!(update_body["data"]["title"], "Dive Debriefing");
    assert_eq!(update_body["data"]["tags"], json!(["Work", "review"]));
    assert_eq!(update_body["data"]["platforms"], json!(["Discord", "GitHub"]));
    assert_eq!(update_body["data"]["event_date"], "2024-06-01");

    // Delete
    let delete_resp = fixture
        .client
        .delete(fixture.url(&format!("/api/events/{}", event_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_resp.status(), 200);

    // Deleting again reports not found
    let delete_again = fixture
        .client
        .delete(fixture.url(&format!("/api/events/{}", event_id)))
        .send()
        .await
        .unwrap();
    assert_eq!(delete_again.status(), 404);
}

#[tokio::test]
async fn test_create_event_validation() {
    let fixture = TestFixture::new().await;

    // Missing title
    let resp = fixture
        .client
        .post(fixture.url("/api/events"))
        .json(&json!({ "title": "  ", "event_date": "2024-06-01" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    // Malformed date
    let resp = fixture
        .client
        .post(fixture.url("/api/events"))
        .json(&json!({ "title": "Briefing", "event_date": "June 1st" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_profile_picture_upload_and_fetch() {
    let fixture = TestFixture::new().await;

    // Nothing stored yet
    let resp = fixture
        .client
        .get(fixture.url("/api/profile-picture"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert!(body["data"]["picture"].is_null());

    // Upload
    let resp = fixture
        .client
        .post(fixture.url("/api/profile-picture"))
        .json(&json!({ "picture": "data:image/png;base64,AAAA" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Fetch it back
    let resp = fixture
        .client
        .get(fixture.url("/api/profile-picture"))
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["picture"], "data:image/png;base64,AAAA");

    // Empty upload is rejected
    let resp = fixture
        .client
        .post(fixture.url("/api/profile-picture"))
        .json(&json!({ "picture": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

// ==================== REPOSITORY TESTS ====================

#[tokio::test]
async fn test_list_events_filters_and_orders() {
    let (repo, _dir) = test_repo().await;

    for date in ["2024-06-15", "2024-06-01", "2024-07-01", "2024-05-31"] {
        repo.create_event("alice", &create_request(&format!("on {}", date), date))
            .await
            .unwrap();
    }
    repo.create_event("bob", &create_request("bob's day", "2024-06-10"))
        .await
        .unwrap();

    let filter = EventFilter {
        start_date: Some("2024-06-01".to_string()),
        end_date: Some("2024-06-30".to_string()),
    };
    let events = repo.list_events("alice", &filter).await.unwrap();

    // Inclusive bounds, only alice's rows, ascending by date
    let dates: Vec<&str> = events.iter().map(|e| e.event_date.as_str()).collect();
    assert_eq!(dates, vec!["2024-06-01", "2024-06-15"]);
    assert!(events.iter().all(|e| e.username == "alice"));

    // Unbounded list returns everything, still ascending
    let all = repo
        .list_events("alice", &EventFilter::default())
        .await
        .unwrap();
    assert_eq!(all.len(), 4);
    assert!(all.windows(2).all(|w| w[0].event_date <= w[1].event_date));

    // Unknown user sees nothing
    let none = repo
        .list_events("carol", &EventFilter::default())
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_update_cannot_touch_other_users_event() {
    let (repo, _dir) = test_repo().await;

    let bobs = repo
        .create_event("bob", &create_request("bob's briefing", "2024-06-01"))
        .await
        .unwrap();

    let updates = UpdateEventRequest {
        title: Some("hijacked".to_string()),
        ..Default::default()
    };
    let err = repo.update_event(bobs.id, "alice", &updates).await;
    assert!(err.is_err());

    // Bob's event is untouched
    let unchanged = repo.get_event(bobs.id, "bob").await.unwrap().unwrap();
    assert_eq!(unchanged.title, "bob's briefing");
}

#[tokio::test]
async fn test_delete_non_owned_returns_false() {
    let (repo, _dir) = test_repo().await;

    let bobs = repo
        .create_event("bob", &create_request("bob's briefing", "2024-06-01"))
        .await
        .unwrap();

    assert!(!repo.delete_event(bobs.id, "alice").await.unwrap());
    assert!(!repo.delete_event(9999, "bob").await.unwrap());
    assert!(repo.get_event(bobs.id, "bob").await.unwrap().is_some());

    assert!(repo.delete_event(bobs.id, "bob").await.unwrap());
    assert!(repo.get_event(bobs.id, "bob").await.unwrap().is_none());
}

#[tokio::test]
async fn test_created_event_decodes_list_fields() {
    let (repo, _dir) = test_repo().await;

    let request = CreateEventRequest {
        tags: Some(serde_json::from_value(json!("Work, urgent, Work")).unwrap()),
        platforms: Some(serde_json::from_value(json!(["Discord"])).unwrap()),
        ..create_request("Dive Briefing", "2024-06-01")
    };
    let event = repo.create_event("alice", &request).await.unwrap();

    assert_eq!(event.tags, vec!["Work", "urgent"]);
    assert_eq!(event.platforms, vec!["Discord"]);

    // And the same shape comes back from a read
    let fetched = repo.get_event(event.id, "alice").await.unwrap().unwrap();
    assert_eq!(fetched.tags, vec!["Work", "urgent"]);
    assert_eq!(fetched.platforms, vec!["Discord"]);
}

#[tokio::test]
async fn test_malformed_stored_tags_decode_to_empty() {
    let (repo, dir) = test_repo().await;

    let event = repo
        .create_event("alice", &create_request("legacy row", "2024-06-01"))
        .await
        .unwrap();

    // Simulate a hand-edited legacy row
    let pool = init_database(&dir.path().join("test.sqlite")).await.unwrap();
    sqlx::query("UPDATE events SET tags = 'not valid json', platforms = '{\"not\":\"a list\"}' WHERE id = ?")
        .bind(event.id)
        .execute(&pool)
        .await
        .unwrap();

    let fetched = repo.get_event(event.id, "alice").await.unwrap().unwrap();
    assert_eq!(fetched.tags, Vec::<String>::new());
    assert_eq!(fetched.platforms, Vec::<String>::new());
}

#[tokio::test]
async fn test_profile_picture_upsert_keeps_one_row() {
    let (repo, dir) = test_repo().await;

    let first = repo
        .save_profile_picture("alice", "data:image/png;base64,OLD")
        .await
        .unwrap();
    tokio::time::sleep(tokio::time::Duration::from_millis(5)).await;
    let second = repo
        .save_profile_picture("alice", "data:image/png;base64,NEW")
        .await
        .unwrap();

    assert!(second.updated_at >= first.updated_at);
    assert_eq!(
        repo.get_profile_picture("alice").await.unwrap().as_deref(),
        Some("data:image/png;base64,NEW")
    );

    // Exactly one row for the username, not two
    let pool = init_database(&dir.path().join("test.sqlite")).await.unwrap();
    let row = sqlx::query("SELECT COUNT(*) AS n FROM users WHERE username = 'alice'")
        .fetch_one(&pool)
        .await
        .unwrap();
    let n: i64 = sqlx::Row::get(&row, "n");
    assert_eq!(n, 1);

    // Other usernames are unaffected and empty
    assert_eq!(repo.get_profile_picture("bob").await.unwrap(), None);
}
