use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use courier_api::{build_router, config::Config, state::{AppState, ReadinessCheck}};
use courier_core::{ChannelHub, EmailService, EmailServiceDeps, ServiceConfig};
use courier_persist::{
    EmailStore, PersistError, Result as PersistResult, SearchHit, SearchIndex, StaffDirectory,
    TaskQueue, ThreadAppend,
};
use courier_storage::MemoryObjectStore;
use courier_types::{EmailMessage, ScheduledTask, StaffProfile, ThreadAggregate};

#[derive(Default)]
struct InMemoryStore {
    messages: Mutex<HashMap<String, EmailMessage>>,
    threads: Mutex<HashMap<String, ThreadAggregate>>,
    tasks: Mutex<Vec<ScheduledTask>>,
}

#[async_trait]
impl EmailStore for InMemoryStore {
    async fn insert_message(&self, message: &EmailMessage) -> PersistResult<String> {
        let mut messages = self.messages.lock().unwrap();
        let id = format!("{:024x}", messages.len() + 1);
        let mut stored = message.clone();
        stored.id = id.clone();
        messages.insert(stored.message_id.clone(), stored);
        Ok(id)
    }

    async fn find_message(&self, message_id: &str) -> PersistResult<Option<EmailMessage>> {
        Ok(self.messages.lock().unwrap().get(message_id).cloned())
    }

    async fn update_message(&self, message: &EmailMessage) -> PersistResult<()> {
        self.messages
            .lock()
            .unwrap()
            .insert(message.message_id.clone(), message.clone());
        Ok(())
    }

    async fn delete_message(&self, message_id: &str) -> PersistResult<()> {
        self.messages.lock().unwrap().remove(message_id);
        Ok(())
    }

    async fn record_reply(&self, parent_message_id: &str, replied_at: DateTime<Utc>) -> PersistResult<()> {
        let mut messages = self.messages.lock().unwrap();
        let parent = messages
            .get_mut(parent_message_id)
            .ok_or_else(|| PersistError::MessageNotFound(parent_message_id.to_string()))?;
        parent.thread_info.reply_count += 1;
        parent.thread_info.last_reply_at = Some(replied_at);
        Ok(())
    }

    async fn list_thread_messages(&self, thread_id: &str, limit: Option<i64>) -> PersistResult<Vec<EmailMessage>> {
        let mut found: Vec<EmailMessage> = self
            .messages
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.thread_id.as_deref() == Some(thread_id))
            .cloned()
            .collect();
        found.sort_by_key(|m| m.created_at);
        if let Some(limit) = limit {
            found.truncate(limit as usize);
        }
        Ok(found)
    }

    async fn append_to_thread(&self, append: &ThreadAppend) -> PersistResult<()> {
        let mut threads = self.threads.lock().unwrap();
        let thread = threads.entry(append.thread_id.clone()).or_insert_with(|| ThreadAggregate {
            thread_id: append.thread_id.clone(),
            subject: append.subject.clone(),
            participants: append.participants.clone(),
            last_message: None,
            message_count: 0,
            created_at: append.appended_at,
            updated_at: append.appended_at,
        });
        thread.message_count += 1;
        thread.last_message = Some(append.last_message.clone());
        Ok(())
    }

    async fn get_thread(&self, thread_id: &str) -> PersistResult<Option<ThreadAggregate>> {
        Ok(self.threads.lock().unwrap().get(thread_id).cloned())
    }
}

#[async_trait]
impl StaffDirectory for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> PersistResult<Option<StaffProfile>> {
        Ok((email == "alice@example.com").then(|| StaffProfile {
            email: email.to_string(),
            full_name: "Alice Archer".to_string(),
            role: "staff".to_string(),
            department: "operations".to_string(),
            profile_photo_url: String::new(),
            status: "active".to_string(),
        }))
    }
}

#[async_trait]
impl SearchIndex for InMemoryStore {
    async fn index(&self, _message: &EmailMessage) -> PersistResult<()> {
        Ok(())
    }

    async fn search(&self, query: &str, limit: i64) -> PersistResult<Vec<SearchHit>> {
        Ok(self
            .messages
            .lock()
            .unwrap()
            .values()
            .filter(|m| m.subject.to_lowercase().contains(&query.to_lowercase()))
            .take(limit as usize)
            .map(|m| SearchHit {
                message_id: m.message_id.clone(),
                thread_id: m.thread_id.clone(),
                subject: m.subject.clone(),
                from: m.from.email.clone(),
                snippet: m.content.text.clone(),
                score: 1.0,
                created_at: m.created_at,
            })
            .collect())
    }
}

#[async_trait]
impl TaskQueue for InMemoryStore {
    async fn schedule(&self, mut task: ScheduledTask) -> PersistResult<String> {
        let mut tasks = self.tasks.lock().unwrap();
        task.id = format!("task-{}", tasks.len() + 1);
        let id = task.id.clone();
        tasks.push(task);
        Ok(id)
    }

    async fn claim_due(
        &self,
        _now: DateTime<Utc>,
        _lease_until: DateTime<Utc>,
        _limit: usize,
    ) -> PersistResult<Vec<ScheduledTask>> {
        Ok(Vec::new())
    }

    async fn complete(&self, _task_id: &str) -> PersistResult<()> {
        Ok(())
    }

    async fn fail(&self, _task_id: &str, _error: &str) -> PersistResult<()> {
        Ok(())
    }
}

struct DownDatabase;

#[async_trait]
impl ReadinessCheck for DownDatabase {
    async fn ping(&self) -> Result<(), String> {
        Err("connection refused".to_string())
    }
}

fn test_config() -> Config {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/default.toml");
    Config::from_file(path).expect("default config parses")
}

struct TestApp {
    state: Arc<AppState>,
    store: Arc<InMemoryStore>,
    objects: Arc<MemoryObjectStore>,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::default());
        let objects = Arc::new(MemoryObjectStore::new());
        let hub = Arc::new(ChannelHub::default());

        let service = Arc::new(EmailService::new(
            EmailServiceDeps {
                store: store.clone(),
                directory: store.clone(),
                search: store.clone(),
                notifier: hub.clone(),
                tasks: store.clone(),
                objects: objects.clone(),
            },
            ServiceConfig::default(),
        ));

        Self {
            state: Arc::new(AppState::new(test_config(), service, hub)),
            store,
            objects,
        }
    }

    fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn post_email(&self, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/emails")
                .header(header::CONTENT_TYPE, "application/json")
                .header("cf-connecting-ip", "198.51.100.7")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }
}

fn email_body() -> Value {
    json!({
        "from": "alice@example.com",
        "to": ["bob@example.com"],
        "bcc": ["audit@example.com"],
        "subject": "Quarterly planning",
        "text": "Let's meet on Thursday.",
        "attachments": [
            { "filename": "agenda.txt", "content_type": "text/plain", "content_base64": "YWdlbmRh" }
        ]
    })
}

#[tokio::test]
async fn test_health_without_database_check() {
    let app = TestApp::new();
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "unchecked");
}

#[tokio::test]
async fn test_health_reports_down_database() {
    let app = TestApp::new();
    let state = Arc::new((*app.state).clone().with_database(Arc::new(DownDatabase)));

    let response = build_router(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_send_email_returns_created_without_bcc() {
    let app = TestApp::new();
    let (status, body) = app.post_email(email_body()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["from"]["full_name"], "Alice Archer");
    assert_eq!(body["status"], "sent");
    assert!(body.get("bcc").is_none());
    assert_eq!(body["thread_info"]["depth"], 0);
    assert_eq!(body["attachments"][0]["size"], 6);

    let message_id = body["message_id"].as_str().unwrap();
    let stored = app.store.find_message(message_id).await.unwrap().unwrap();
    assert_eq!(stored.bcc.len(), 1);
    assert_eq!(stored.metadata.client_ip, "198.51.100.7");
    assert_eq!(app.objects.len(), 1);
}

#[tokio::test]
async fn test_attachment_download_returns_bytes() {
    let app = TestApp::new();
    let (_, body) = app.post_email(email_body()).await;
    let url = body["attachments"][0]["url"].as_str().unwrap().to_string();

    let response = app
        .router()
        .oneshot(Request::builder().uri(&url).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"agenda");

    let (status, _) = app.get(&url.replace("/0", "/3")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reply_is_visible_in_thread() {
    let app = TestApp::new();
    let (_, parent) = app.post_email(email_body()).await;

    let mut reply = email_body();
    reply["subject"] = json!("Re: Quarterly planning");
    reply["in_reply_to"] = parent["message_id"].clone();
    reply["attachments"] = json!([]);
    let (status, reply) = app.post_email(reply).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(reply["thread_id"], parent["thread_id"]);
    assert_eq!(reply["thread_info"]["depth"], 1);

    let thread_id = parent["thread_id"].as_str().unwrap();
    let (status, thread) = app.get(&format!("/threads/{}", thread_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(thread["message_count"], 2);

    let (_, messages) = app.get(&format!("/threads/{}/messages?limit=1", thread_id)).await;
    assert_eq!(messages.as_array().unwrap().len(), 1);
    assert_eq!(messages[0]["message_id"], parent["message_id"]);
}

#[tokio::test]
async fn test_scheduled_email_is_accepted_as_draft() {
    let app = TestApp::new();
    let mut body = email_body();
    body["schedule_at"] = json!((Utc::now() + Duration::hours(1)).to_rfc3339());

    let (status, draft) = app.post_email(body).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(draft["status"], "scheduled");
    assert_eq!(draft["is_draft"], true);
    assert_eq!(app.store.tasks.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_email_is_bad_request() {
    let app = TestApp::new();
    let mut body = email_body();
    body["to"] = json!([]);

    let (status, body) = app.post_email(body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("recipient"));
    assert!(app.store.messages.lock().unwrap().is_empty());
    assert!(app.objects.is_empty());
}

#[tokio::test]
async fn test_unknown_parent_is_not_found() {
    let app = TestApp::new();
    let mut body = email_body();
    body["in_reply_to"] = json!("missing@courier");

    let (status, _) = app.post_email(body).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(app.objects.is_empty());
}

#[tokio::test]
async fn test_missing_resources_are_not_found() {
    let app = TestApp::new();

    let (status, body) = app.get("/emails/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());

    let (status, _) = app.get("/threads/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search() {
    let app = TestApp::new();
    app.post_email(email_body()).await;

    let (status, body) = app.get("/search?q=quarterly").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hits"].as_array().unwrap().len(), 1);

    let (status, _) = app.get("/search?q=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_metrics_without_recorder_is_not_found() {
    let app = TestApp::new();
    let (status, _) = app.get("/metrics").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
