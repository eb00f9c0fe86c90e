#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header::AUTHORIZATION, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use approvex::{ApiClient, SessionContext};

pub const PASSWORD: &str = "secret1";
pub const REFRESH_TOKEN: &str = "refresh-token";

/// Sign a token the way the backend would; the client never checks the key
pub fn mint_token(role: &str, exp_offset_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + exp_offset_secs;
    encode(
        &Header::default(),
        &json!({ "exp": exp, "role": role, "name": "Test User", "user_id": 1 }),
        &EncodingKey::from_secret(b"mock-backend-secret"),
    )
    .expect("token should encode")
}

pub fn student_user() -> Value {
    json!({
        "id": 1,
        "username": "21CS001",
        "name": "Arjun Kumar",
        "email": "21cs001@college.edu",
        "mobile_number": "9876543210",
        "role": "student",
        "student_class": "CSE-A",
        "department": "CSE"
    })
}

pub fn staff_user(designation: &str) -> Value {
    json!({
        "id": 2,
        "username": "tutor1",
        "name": "Dr. Priya Sharma",
        "email": "priya@college.edu",
        "mobile_number": "9123456780",
        "role": "staff",
        "designation": designation,
        "student_class": "CSE-A",
        "department": "CSE"
    })
}

/// A request approved by the tutor and waiting at the HOD
pub fn sample_request(id: i64) -> Value {
    json!({
        "id": id,
        "student_name": "Arjun Kumar",
        "roll_number": "21CS001",
        "contact": "9876543210",
        "reason": "Bank account opening",
        "status": "tutor_approved",
        "current_stage": "hod",
        "tutor_status": "approved",
        "tutor_name": "Dr. Priya Sharma",
        "tutor_at": "2025-01-10T09:30:00Z",
        "hod_status": "pending",
        "dean_status": null,
        "extracted": {"name": "Arjun Kumar"},
        "checklist": {"signature": true},
        "is_valid": true,
        "created_at": "2025-01-09T08:00:00"
    })
}

/// What the mock saw, plus switches that change how it answers
#[derive(Default)]
pub struct MockState {
    pub valid_access: Mutex<String>,
    pub refresh_ok: AtomicBool,
    pub reject_all: AtomicBool,
    pub submit_warning: AtomicBool,
    pub refresh_calls: AtomicUsize,
    pub protected_calls: AtomicUsize,
    pub seen_tokens: Mutex<Vec<String>>,
    pub last_body: Mutex<Option<Value>>,
    pub last_query: Mutex<HashMap<String, String>>,
    pub form_fields: Mutex<HashMap<String, String>>,
    pub uploaded: Mutex<Option<(String, usize)>>,
}

impl MockState {
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn protected_calls(&self) -> usize {
        self.protected_calls.load(Ordering::SeqCst)
    }

    pub fn seen_tokens(&self) -> Vec<String> {
        self.seen_tokens.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.last_body.lock().unwrap().clone()
    }

    pub fn accept(&self, token: &str) {
        *self.valid_access.lock().unwrap() = token.to_string();
    }
}

/// Fake ApproveX backend bound to a free local port
pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    pub async fn start() -> Result<Self> {
        let state = Arc::new(MockState::default());
        state.refresh_ok.store(true, Ordering::SeqCst);

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind mock backend")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let app = router(state.clone());
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { base_url, state, handle })
    }

    /// Client over an in-memory session
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base_url, SessionContext::in_memory()).expect("mock base url is valid")
    }

    /// Client already holding `access` (accepted or not) and the refresh token
    pub fn signed_in_client(&self, access: &str) -> ApiClient {
        let client = self.client();
        client
            .session()
            .save_auth(&serde_json::from_value(json!({
                "access": access,
                "refresh": REFRESH_TOKEN,
                "user": student_user(),
            }))
            .expect("payload should parse"))
            .expect("memory store never fails");
        client
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

type Shared = State<Arc<MockState>>;

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/auth/login/", post(login))
        .route("/api/auth/student/signup/", post(student_signup))
        .route("/api/auth/staff/signup/", post(staff_signup))
        .route("/api/auth/token/refresh/", post(refresh))
        .route("/api/auth/bonafide/check/", post(check))
        .route("/api/auth/bonafide/submit/", post(submit))
        .route("/api/auth/bonafide/my/", get(my_requests))
        .route("/api/auth/bonafide/incoming/", get(incoming))
        .route("/api/auth/bonafide/:id/", get(detail))
        .route("/api/auth/bonafide/:id/status/", patch(update_status))
        .route("/api/auth/bonafide/:id/file-token/", post(file_token))
        .route("/api/auth/notifications/", get(notifications))
        .route("/api/auth/notifications/:id/mark-read/", post(mark_read))
        .with_state(state)
}

fn detail_response(status: StatusCode, detail: &str) -> Response {
    (status, Json(json!({ "detail": detail }))).into_response()
}

fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    state.protected_calls.fetch_add(1, Ordering::SeqCst);
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default()
        .to_string();
    state.seen_tokens.lock().unwrap().push(token.clone());

    let valid = state.valid_access.lock().unwrap().clone();
    if state.reject_all.load(Ordering::SeqCst) || token.is_empty() || token != valid {
        return Err(detail_response(
            StatusCode::UNAUTHORIZED,
            "Given token not valid for any token type",
        ));
    }
    Ok(())
}

fn issue(state: &MockState, user: Value) -> Response {
    let role = user["role"].as_str().unwrap_or("student").to_string();
    let access = mint_token(&role, 3600);
    state.accept(&access);
    Json(json!({ "access": access, "refresh": REFRESH_TOKEN, "user": user })).into_response()
}

async fn login(State(state): Shared, Json(body): Json<Value>) -> Response {
    *state.last_body.lock().unwrap() = Some(body.clone());
    if body["password"] != PASSWORD {
        return detail_response(StatusCode::UNAUTHORIZED, "Invalid credentials");
    }
    match body["username"].as_str() {
        Some("tutor1") | Some("priya@college.edu") => issue(&state, staff_user("TUTOR")),
        Some("21CS001") | Some("21cs001@college.edu") => issue(&state, student_user()),
        _ => detail_response(StatusCode::UNAUTHORIZED, "Invalid credentials"),
    }
}

async fn student_signup(State(state): Shared, Json(body): Json<Value>) -> Response {
    *state.last_body.lock().unwrap() = Some(body.clone());
    if body["email"] == "taken@college.edu" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "email": ["Email already registered."] })),
        )
            .into_response();
    }
    let mut user = student_user();
    user["username"] = body["username"].clone();
    user["name"] = body["name"].clone();
    issue(&state, user)
}

async fn staff_signup(State(state): Shared, Json(body): Json<Value>) -> Response {
    *state.last_body.lock().unwrap() = Some(body.clone());
    let designation = body["designation"].as_str().unwrap_or("TUTOR").to_string();
    issue(&state, staff_user(&designation))
}

async fn refresh(State(state): Shared, Json(body): Json<Value>) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    if !state.refresh_ok.load(Ordering::SeqCst) || body["refresh"] != REFRESH_TOKEN {
        return detail_response(StatusCode::UNAUTHORIZED, "Token is invalid or expired");
    }
    let access = mint_token("student", 3600);
    state.accept(&access);
    Json(json!({ "access": access })).into_response()
}

async fn read_form(state: &MockState, mut multipart: Multipart) -> Result<(), Response> {
    let mut fields = HashMap::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if name == "file" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| detail_response(StatusCode::BAD_REQUEST, "bad file"))?;
            *state.uploaded.lock().unwrap() = Some((file_name, bytes.len()));
        } else {
            let value = field
                .text()
                .await
                .map_err(|_| detail_response(StatusCode::BAD_REQUEST, "bad field"))?;
            fields.insert(name, value);
        }
    }
    *state.form_fields.lock().unwrap() = fields;
    Ok(())
}

async fn check(State(state): Shared, headers: HeaderMap, multipart: Multipart) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    if let Err(resp) = read_form(&state, multipart).await {
        return resp;
    }
    Json(json!({
        "extracted": { "name": "Arjun Kumar", "roll_number": "21CS001" },
        "checklist": { "name": true, "signature": false },
        "is_valid": false,
        "explanation": "Signature missing"
    }))
    .into_response()
}

async fn submit(State(state): Shared, headers: HeaderMap, multipart: Multipart) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    if let Err(resp) = read_form(&state, multipart).await {
        return resp;
    }
    let mut created = sample_request(42);
    created["status"] = json!("submitted");
    created["current_stage"] = json!("tutor");
    created["tutor_status"] = json!("pending");
    created["hod_status"] = Value::Null;
    if state.submit_warning.load(Ordering::SeqCst) {
        // Student without a class: created, but wrapped with a warning
        created["current_stage"] = Value::Null;
        let body = json!({ "warning": "No class assigned.", "result": created });
        return (StatusCode::CREATED, Json(body)).into_response();
    }
    (StatusCode::CREATED, Json(created)).into_response()
}

async fn my_requests(
    State(state): Shared,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    *state.last_query.lock().unwrap() = query;
    Json(json!([sample_request(7), sample_request(8)])).into_response()
}

async fn incoming(State(state): Shared, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    let mut done = sample_request(9);
    done["status"] = json!("approved");
    done["current_stage"] = json!("done");
    Json(json!([sample_request(7), done])).into_response()
}

async fn detail(State(state): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    if id == 404 {
        return detail_response(StatusCode::NOT_FOUND, "Not found.");
    }
    Json(sample_request(id)).into_response()
}

async fn update_status(
    State(state): Shared,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    *state.last_body.lock().unwrap() = Some(body.clone());

    let mut updated = sample_request(id);
    if body["action"] == "rejected" {
        updated["status"] = json!("rejected");
        updated["current_stage"] = json!("done");
        updated["hod_status"] = json!("rejected");
        updated["hod_comment"] = body["comment"].clone();
    } else {
        updated["status"] = json!("hod_approved");
        updated["current_stage"] = json!("dean");
        updated["hod_status"] = json!("approved");
        updated["dean_status"] = json!("pending");
    }
    Json(updated).into_response()
}

async fn file_token(State(state): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    Json(json!({ "url": format!("/media/bonafide/{}.pdf?token=abc", id) })).into_response()
}

async fn notifications(State(state): Shared, headers: HeaderMap) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    Json(json!([
        {
            "id": 1,
            "verb": "approved",
            "message": "Your request #7 was approved by the tutor",
            "unread": true,
            "target_bonafide": 7,
            "created_at": "2025-01-10T09:30:00Z"
        },
        {
            "id": 2,
            "verb": "submitted",
            "message": "Request #7 submitted",
            "unread": false,
            "target_bonafide": 7,
            "created_at": "2025-01-09T08:00:00Z"
        }
    ]))
    .into_response()
}

async fn mark_read(State(state): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    if let Err(resp) = authorize(&state, &headers) {
        return resp;
    }
    Json(json!({ "id": id, "unread": false })).into_response()
}
