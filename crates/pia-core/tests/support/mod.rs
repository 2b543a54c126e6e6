//! In-process mock of the PES, CML and simulation backends.
//!
//! Binds `127.0.0.1:0`, keeps resources in memory, counts every request and can
//! delay individual CML GETs to force out-of-order completions.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use pia_core::ResourceClient;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct MockState {
    collections: Mutex<HashMap<String, Vec<(String, Value)>>>,
    next_id: AtomicUsize,
    hits: AtomicUsize,
    cml_gets: AtomicUsize,
    delays: Mutex<HashMap<usize, Duration>>,
    cml_posts: Mutex<Vec<(String, Value)>>,
}

impl MockState {
    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockBackend {
    pub base_url: String,
    state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/api/pes/:collection", get(list).post(create))
            .route(
                "/api/pes/:collection/:id",
                get(fetch).put(update).delete(remove),
            )
            .route("/api/pes/:collection/:id/render", get(render))
            .route("/cml/:module/:endpoint", get(cml_get).post(cml_post))
            .route("/api/piase/run_simulation", post(run_simulation))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn client(&self) -> ResourceClient {
        ResourceClient::new(&self.base_url).unwrap()
    }

    /// Requests received so far, across all routes.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Delay the `nth` CML GET (1-based, counted across modules) before it responds.
    pub fn delay_cml_get(&self, nth: usize, delay: Duration) {
        self.state.delays.lock().unwrap().insert(nth, delay);
    }

    pub fn cml_posts(&self) -> Vec<(String, Value)> {
        self.state.cml_posts.lock().unwrap().clone()
    }

    pub fn insert(&self, collection: &str, id: &str, doc: Value) {
        self.state
            .collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push((id.to_string(), doc));
    }

    pub fn stored(&self, collection: &str, id: &str) -> Option<Value> {
        self.state
            .collections
            .lock()
            .unwrap()
            .get(collection)
            .and_then(|items| items.iter().find(|(k, _)| k == id).map(|(_, v)| v.clone()))
    }

    /// Wait until at least `n` requests have arrived.
    pub async fn wait_for_hits(&self, n: usize) {
        for _ in 0..200 {
            if self.hits() >= n {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {} requests, saw {}", n, self.hits());
    }
}

// ---------------------------------------------------------------------------
// PES handlers
// ---------------------------------------------------------------------------

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

fn collection_meta(collection: &str) -> Option<(&'static str, &'static str, &'static str)> {
    match collection {
        "prompts" => Some(("prompt_data", "Prompt", ".json")),
        "curricula" => Some(("curriculum_data", "Curriculum", ".curriculum.json")),
        _ => None,
    }
}

async fn list(State(state): State<Arc<MockState>>, Path(collection): Path<String>) -> Response {
    state.hit();
    if collection_meta(&collection).is_none() {
        return error(StatusCode::NOT_FOUND, "Unknown collection");
    }
    let collections = state.collections.lock().unwrap();
    let rows: Vec<Value> = collections
        .get(&collection)
        .map(|items| {
            items
                .iter()
                .map(|(id, doc)| {
                    let name = doc.get("name").or_else(|| doc.get("objective")).cloned();
                    json!({ "filename": id, "name": name, "version": doc.get("version").cloned() })
                })
                .collect()
        })
        .unwrap_or_default();
    Json(Value::Array(rows)).into_response()
}

async fn create(
    State(state): State<Arc<MockState>>,
    Path(collection): Path<String>,
    Json(mut body): Json<Value>,
) -> Response {
    state.hit();
    let Some((_, label, suffix)) = collection_meta(&collection) else {
        return error(StatusCode::NOT_FOUND, "Unknown collection");
    };
    let requested = body
        .as_object_mut()
        .and_then(|m| m.remove("filename"))
        .and_then(|v| v.as_str().map(str::to_string));
    let filename = match requested {
        Some(name) => {
            let name = name.to_lowercase().replace(' ', "_");
            if !name.ends_with(suffix) {
                return error(StatusCode::BAD_REQUEST, "Invalid filename");
            }
            name
        }
        None => {
            let n = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
            format!("{}_{}{}", label.to_lowercase(), n, suffix)
        }
    };

    let mut collections = state.collections.lock().unwrap();
    let items = collections.entry(collection).or_default();
    if items.iter().any(|(id, _)| *id == filename) {
        return error(StatusCode::CONFLICT, &format!("{} file already exists.", label));
    }
    items.push((filename.clone(), body));
    (
        StatusCode::CREATED,
        Json(json!({ "message": format!("{} created successfully.", label), "filename": filename })),
    )
        .into_response()
}

async fn fetch(
    State(state): State<Arc<MockState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    state.hit();
    let Some((key, label, _)) = collection_meta(&collection) else {
        return error(StatusCode::NOT_FOUND, "Unknown collection");
    };
    let collections = state.collections.lock().unwrap();
    match collections
        .get(&collection)
        .and_then(|items| items.iter().find(|(k, _)| *k == id))
    {
        Some((filename, doc)) => {
            let mut body = json!({ "filename": filename });
            body[key] = doc.clone();
            Json(body).into_response()
        }
        None => error(StatusCode::NOT_FOUND, &format!("{} file not found.", label)),
    }
}

async fn update(
    State(state): State<Arc<MockState>>,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    state.hit();
    let Some((_, label, _)) = collection_meta(&collection) else {
        return error(StatusCode::NOT_FOUND, "Unknown collection");
    };
    let mut collections = state.collections.lock().unwrap();
    match collections
        .get_mut(&collection)
        .and_then(|items| items.iter_mut().find(|(k, _)| *k == id))
    {
        Some((_, doc)) => {
            *doc = body;
            Json(json!({ "message": format!("{} updated successfully.", label), "filename": id }))
                .into_response()
        }
        None => error(StatusCode::NOT_FOUND, &format!("{} file not found.", label)),
    }
}

async fn remove(
    State(state): State<Arc<MockState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    state.hit();
    let Some((_, label, _)) = collection_meta(&collection) else {
        return error(StatusCode::NOT_FOUND, "Unknown collection");
    };
    let mut collections = state.collections.lock().unwrap();
    let items = collections.entry(collection).or_default();
    let before = items.len();
    items.retain(|(k, _)| *k != id);
    if items.len() == before {
        return error(StatusCode::NOT_FOUND, &format!("{} file not found.", label));
    }
    Json(json!({ "message": format!("{} deleted successfully.", label) })).into_response()
}

async fn render(
    State(state): State<Arc<MockState>>,
    Path((collection, id)): Path<(String, String)>,
) -> Response {
    state.hit();
    let collections = state.collections.lock().unwrap();
    match collections
        .get(&collection)
        .and_then(|items| items.iter().find(|(k, _)| *k == id))
    {
        Some((_, doc)) => {
            let title = doc
                .get("name")
                .or_else(|| doc.get("objective"))
                .and_then(Value::as_str)
                .unwrap_or("Untitled");
            Json(json!({ "markdown": format!("# {}\n", title) })).into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Not found."),
    }
}

// ---------------------------------------------------------------------------
// CML + simulation handlers
// ---------------------------------------------------------------------------

async fn cml_get(
    State(state): State<Arc<MockState>>,
    Path((module, endpoint)): Path<(String, String)>,
) -> Response {
    if module == "offline" {
        state.hit();
        return (StatusCode::SERVICE_UNAVAILABLE, "down for maintenance").into_response();
    }
    // Numbered before the hit is counted, so wait_for_hits(n) implies n numbered GETs.
    let n = state.cml_gets.fetch_add(1, Ordering::SeqCst) + 1;
    state.hit();
    let delay = state.delays.lock().unwrap().get(&n).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    Json(json!({ "module": module, "endpoint": endpoint, "request": n })).into_response()
}

async fn cml_post(
    State(state): State<Arc<MockState>>,
    Path((module, endpoint)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Response {
    state.hit();
    state
        .cml_posts
        .lock()
        .unwrap()
        .push((format!("/cml/{}/{}", module, endpoint), body.clone()));
    Json(json!({ "ok": true, "echo": body })).into_response()
}

async fn run_simulation(State(state): State<Arc<MockState>>) -> Response {
    state.hit();
    Json(json!({
        "run_id": "run_1",
        "summary": {"agent_reached_goal": true, "total_steps_taken": 7, "final_agent_position": [4, 4]},
        "text_log": "Step 1: move east\nStep 7: goal reached",
        "image_urls": ["/static/simulations/run_1/final.png"]
    }))
    .into_response()
}
