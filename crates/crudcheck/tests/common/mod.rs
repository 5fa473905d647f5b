//! In-process fakes for the hosted collection and a WebDriver server

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

/// How the fake collection misbehaves
#[derive(Debug, Clone)]
pub struct Behavior {
    pub create_status: u16,
    pub omit_id: bool,
    pub update_status: u16,
    pub persist_updates: bool,
    pub persist_deletes: bool,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            create_status: 201,
            omit_id: false,
            update_status: 200,
            persist_updates: true,
            persist_deletes: true,
        }
    }
}

#[derive(Default)]
struct Store {
    books: BTreeMap<String, Value>,
    requests: Vec<String>,
    next_id: u64,
}

#[derive(Clone)]
struct CrudState {
    behavior: Behavior,
    store: Arc<Mutex<Store>>,
}

/// Fake crudcrud-style collection served at `/api/<key>/books`
pub struct FakeCrud {
    pub addr: SocketAddr,
    store: Arc<Mutex<Store>>,
}

pub const API_KEY: &str = "0b5e3c1f";

impl FakeCrud {
    pub async fn start(behavior: Behavior) -> Self {
        let store = Arc::new(Mutex::new(Store::default()));
        let state = CrudState {
            behavior,
            store: store.clone(),
        };

        let app = Router::new()
            .route("/api/:key/books", post(create_book).get(list_books))
            .route(
                "/api/:key/books/:id",
                get(get_book).put(update_book).delete(delete_book),
            )
            .with_state(state);

        let addr = serve(app).await;
        Self { addr, store }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    pub fn requests(&self) -> Vec<String> {
        self.store.lock().unwrap().requests.clone()
    }

    pub fn book_count(&self) -> usize {
        self.store.lock().unwrap().books.len()
    }

    /// Seed a record that was not created by the suite
    pub fn seed(&self, id: &str, book: Value) {
        let mut book = book;
        book["_id"] = json!(id);
        self.store.lock().unwrap().books.insert(id.to_string(), book);
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).unwrap()
}

async fn create_book(
    State(state): State<CrudState>,
    Path(_key): Path<String>,
    Json(mut book): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    store.requests.push("POST /books".to_string());

    if state.behavior.create_status != 201 {
        return (status(state.behavior.create_status), "service unavailable").into_response();
    }

    store.next_id += 1;
    let id = format!("66a0{:08x}", store.next_id);
    book["_id"] = json!(id);
    store.books.insert(id, book.clone());

    if state.behavior.omit_id {
        book.as_object_mut().unwrap().remove("_id");
    }
    (StatusCode::CREATED, Json(book)).into_response()
}

async fn list_books(State(state): State<CrudState>, Path(_key): Path<String>) -> Response {
    let mut store = state.store.lock().unwrap();
    store.requests.push("GET /books".to_string());
    let books: Vec<Value> = store.books.values().cloned().collect();
    Json(books).into_response()
}

async fn get_book(
    State(state): State<CrudState>,
    Path((_key, id)): Path<(String, String)>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    store.requests.push("GET /books/{id}".to_string());
    match store.books.get(&id) {
        Some(book) => Json(book.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn update_book(
    State(state): State<CrudState>,
    Path((_key, id)): Path<(String, String)>,
    Json(mut book): Json<Value>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    store.requests.push("PUT /books/{id}".to_string());
    if !store.books.contains_key(&id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    if state.behavior.persist_updates {
        book["_id"] = json!(id.clone());
        store.books.insert(id, book);
    }
    status(state.behavior.update_status).into_response()
}

async fn delete_book(
    State(state): State<CrudState>,
    Path((_key, id)): Path<(String, String)>,
) -> Response {
    let mut store = state.store.lock().unwrap();
    store.requests.push("DELETE /books/{id}".to_string());
    if !store.books.contains_key(&id) {
        return StatusCode::NOT_FOUND.into_response();
    }
    if state.behavior.persist_deletes {
        store.books.remove(&id);
    }
    StatusCode::OK.into_response()
}

/// Fake WebDriver endpoint recording every command it receives
pub struct FakeWebDriver {
    pub addr: SocketAddr,
    log: Arc<Mutex<Vec<(String, Value)>>>,
}

/// How the fake WebDriver misbehaves
#[derive(Debug, Clone, Default)]
pub struct DriverBehavior {
    pub reject_sessions: bool,
    pub fail_maximize: bool,
}

#[derive(Clone)]
struct DriverState {
    behavior: DriverBehavior,
    log: Arc<Mutex<Vec<(String, Value)>>>,
}

impl FakeWebDriver {
    pub async fn start(behavior: DriverBehavior) -> Self {
        let log = Arc::new(Mutex::new(Vec::new()));
        let state = DriverState {
            behavior,
            log: log.clone(),
        };

        let app = Router::new()
            .route("/status", get(driver_status))
            .route("/session", post(new_session))
            .route("/session/:id", axum::routing::delete(delete_session))
            .route("/session/:id/window/maximize", post(maximize_window))
            .with_state(state);

        let addr = serve(app).await;
        Self { addr, log }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn commands(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    /// Body of the first command with this name
    pub fn body_of(&self, command: &str) -> Option<Value> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .find(|(c, _)| c == command)
            .map(|(_, b)| b.clone())
    }
}

async fn driver_status() -> Json<Value> {
    Json(json!({ "value": { "ready": true, "message": "ready" } }))
}

async fn new_session(State(state): State<DriverState>, Json(body): Json<Value>) -> impl IntoResponse {
    state.log.lock().unwrap().push(("new_session".to_string(), body));
    if state.behavior.reject_sessions {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "value": {
                    "error": "session not created",
                    "message": "browser binary not found"
                }
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "value": { "sessionId": "5e55", "capabilities": {} } })),
    )
}

async fn maximize_window(State(state): State<DriverState>, Path(id): Path<String>) -> impl IntoResponse {
    state
        .log
        .lock()
        .unwrap()
        .push(("maximize".to_string(), json!({ "session": id })));
    if state.behavior.fail_maximize {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "value": {
                    "error": "unknown error",
                    "message": "failed to change window state"
                }
            })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "value": { "x": 0, "y": 0, "width": 1920, "height": 1080 } })),
    )
}

async fn delete_session(State(state): State<DriverState>, Path(id): Path<String>) -> Json<Value> {
    state
        .log
        .lock()
        .unwrap()
        .push(("delete_session".to_string(), json!({ "session": id })));
    Json(json!({ "value": null }))
}
