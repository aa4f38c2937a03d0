//! In-process fake of the pipeline service
//!
//! Serves the REST routes the client talks to from memory, with the same
//! envelope shape and POST-upserts-by-key behaviour as the real service.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
};
use docflow_client::{ClientConfig, DocflowClient};
use serde_json::{Value, json};

/// Headers seen on one request
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeService {
    pub pipelines: Arc<Mutex<Vec<Value>>>,
    pub models: Arc<Mutex<Vec<Value>>>,
    pub profiles: Arc<Mutex<Vec<Value>>>,
    /// Bodies of search requests, in arrival order
    pub searches: Arc<Mutex<Vec<Value>>>,
    pub seen: Arc<Mutex<Vec<SeenRequest>>>,
    pub progress_polls: Arc<Mutex<u32>>,
}

/// Job id whose progress never reaches a terminal status
pub const STUCK_JOB_ID: &str = "job-stuck";

type Reply = (StatusCode, Json<Value>);

fn ok(data: Value) -> Reply {
    (StatusCode::OK, Json(json!({ "success": true, "data": data })))
}

fn fail(status: StatusCode, message: &str) -> Reply {
    (status, Json(json!({ "success": false, "message": message })))
}

impl FakeService {
    fn record(&self, path: &str, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().unwrap().push(SeenRequest {
            path: path.to_string(),
            authorization: header("authorization"),
            content_type: header("content-type"),
        });
    }

    pub fn stored(&self, id: &str) -> Option<Value> {
        self.pipelines
            .lock()
            .unwrap()
            .iter()
            .find(|p| p["id"] == id)
            .cloned()
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    /// Store a pipeline record verbatim, bypassing the upsert route
    pub fn seed_pipeline(&self, record: Value) {
        self.pipelines.lock().unwrap().push(record);
    }

    pub fn searches(&self) -> Vec<Value> {
        self.searches.lock().unwrap().clone()
    }
}

fn contains(value: &Value, needle: &str) -> bool {
    value
        .as_str()
        .is_some_and(|text| text.to_lowercase().contains(&needle.to_lowercase()))
}

async fn list_pipelines(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Reply {
    svc.record("/api/v1/pipelines", &headers);
    let pipelines = svc.pipelines.lock().unwrap();
    let matching: Vec<Value> = pipelines
        .iter()
        .filter(|p| match params.get("app_id") {
            Some(app_id) => p["app_id"] == app_id.as_str(),
            None => true,
        })
        .cloned()
        .collect();
    ok(Value::Array(matching))
}

async fn upsert_pipeline(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply {
    svc.record("/api/v1/pipelines", &headers);
    let Some(key) = body["key"]
        .as_str()
        .filter(|k| !k.is_empty())
        .map(str::to_string)
    else {
        return fail(StatusCode::BAD_REQUEST, "key is required");
    };

    let mut pipelines = svc.pipelines.lock().unwrap();
    match pipelines.iter_mut().find(|p| p["key"] == key.as_str()) {
        Some(existing) => {
            body["id"] = existing["id"].clone();
            *existing = body.clone();
        }
        None => {
            body["id"] = json!(format!("p-{}", pipelines.len() + 1));
            pipelines.push(body.clone());
        }
    }
    ok(body)
}

async fn get_pipeline(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    svc.record(&format!("/api/v1/pipelines/{}", id), &headers);
    match svc.stored(&id) {
        Some(pipeline) => ok(pipeline),
        None => fail(StatusCode::NOT_FOUND, "pipeline not found"),
    }
}

/// Updates are refused with a 200 envelope, like a locked pipeline
async fn update_pipeline(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    svc.record(&format!("/api/v1/pipelines/{}", id), &headers);
    fail(StatusCode::OK, "pipeline is locked")
}

async fn delete_pipeline(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    svc.record(&format!("/api/v1/pipelines/{}", id), &headers);
    let mut pipelines = svc.pipelines.lock().unwrap();
    let before = pipelines.len();
    pipelines.retain(|p| p["id"] != id.as_str());
    if pipelines.len() == before {
        fail(StatusCode::NOT_FOUND, "pipeline not found")
    } else {
        (StatusCode::OK, Json(json!({ "success": true })))
    }
}

async fn list_models(State(svc): State<FakeService>, headers: HeaderMap) -> Reply {
    svc.record("/api/v1/llm-models", &headers);
    ok(Value::Array(svc.models.lock().unwrap().clone()))
}

async fn create_model(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply {
    svc.record("/api/v1/llm-models", &headers);
    let mut models = svc.models.lock().unwrap();
    if models.iter().any(|m| m["model_id"] == body["model_id"]) {
        return fail(StatusCode::CONFLICT, "model_id already registered");
    }
    body["id"] = json!(format!("m-{}", models.len() + 1));
    models.push(body.clone());
    ok(body)
}

async fn get_model(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    svc.record(&format!("/api/v1/llm-models/{}", id), &headers);
    let models = svc.models.lock().unwrap();
    match models.iter().find(|m| m["id"] == id.as_str()) {
        Some(model) => ok(model.clone()),
        None => fail(StatusCode::NOT_FOUND, "model not found"),
    }
}

async fn update_model(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(mut body): Json<Value>,
) -> Reply {
    svc.record(&format!("/api/v1/llm-models/{}", id), &headers);
    let mut models = svc.models.lock().unwrap();
    match models.iter_mut().find(|m| m["id"] == id.as_str()) {
        Some(existing) => {
            body["id"] = json!(id);
            *existing = body.clone();
            ok(body)
        }
        None => fail(StatusCode::NOT_FOUND, "model not found"),
    }
}

async fn delete_model(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    svc.record(&format!("/api/v1/llm-models/{}", id), &headers);
    let mut models = svc.models.lock().unwrap();
    let before = models.len();
    models.retain(|m| m["id"] != id.as_str());
    if models.len() == before {
        fail(StatusCode::NOT_FOUND, "model not found")
    } else {
        (StatusCode::OK, Json(json!({ "success": true })))
    }
}

/// Matches `query` against `model_id` and `name`, `family` exactly
async fn search_models(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    svc.record("/api/v1/llm-models/search", &headers);
    svc.searches.lock().unwrap().push(body.clone());
    let models = svc.models.lock().unwrap();
    let matching: Vec<Value> = models
        .iter()
        .filter(|m| match body["query"].as_str() {
            Some(query) => contains(&m["model_id"], query) || contains(&m["name"], query),
            None => true,
        })
        .filter(|m| match body.get("family") {
            Some(family) => &m["family"] == family,
            None => true,
        })
        .cloned()
        .collect();
    ok(Value::Array(matching))
}

async fn list_profiles(State(svc): State<FakeService>, headers: HeaderMap) -> Reply {
    svc.record("/api/v1/profiles", &headers);
    ok(Value::Array(svc.profiles.lock().unwrap().clone()))
}

/// Upserts by email; a blank email is refused with a 200 envelope
async fn save_profile(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Reply {
    svc.record("/api/v1/profiles", &headers);
    if body["email"].as_str().unwrap_or_default().trim().is_empty() {
        return fail(StatusCode::OK, "email is required");
    }
    let mut profiles = svc.profiles.lock().unwrap();
    match profiles.iter_mut().find(|p| p["email"] == body["email"]) {
        Some(existing) => {
            body["id"] = existing["id"].clone();
            *existing = body.clone();
        }
        None => {
            body["id"] = json!(format!("u-{}", profiles.len() + 1));
            profiles.push(body.clone());
        }
    }
    ok(body)
}

async fn search_profiles(
    State(svc): State<FakeService>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Reply {
    svc.record("/api/v1/profiles/search", &headers);
    svc.searches.lock().unwrap().push(body.clone());
    let Some(query) = body["query"].as_str().filter(|q| !q.trim().is_empty()) else {
        return fail(StatusCode::BAD_REQUEST, "query is required");
    };
    let profiles = svc.profiles.lock().unwrap();
    let matching: Vec<Value> = profiles
        .iter()
        .filter(|p| contains(&p["email"], query) || contains(&p["display_name"], query))
        .cloned()
        .collect();
    ok(Value::Array(matching))
}

async fn my_profile(State(svc): State<FakeService>, headers: HeaderMap) -> Reply {
    svc.record("/api/v1/profiles/myprofile", &headers);
    ok(json!({
        "profile": { "id": "u-1", "email": "admin@example.org", "team": "platform" },
        "roles": ["admin"],
        "permissions": ["pipelines.*"]
    }))
}

async fn save_onboarding(State(svc): State<FakeService>, Json(body): Json<Value>) -> Reply {
    if body["app_id"].as_str().unwrap_or_default().is_empty() {
        return fail(StatusCode::UNPROCESSABLE_ENTITY, "app_id is required");
    }
    *svc.progress_polls.lock().unwrap() = 0;
    ok(json!({ "job_id": "job-1" }))
}

/// Reports `running` twice, then `completed`; [`STUCK_JOB_ID`] never finishes
async fn onboarding_progress(State(svc): State<FakeService>, Path(job_id): Path<String>) -> Reply {
    let mut polls = svc.progress_polls.lock().unwrap();
    *polls += 1;
    let (status, progress) = if job_id == STUCK_JOB_ID {
        ("running", 10)
    } else if *polls < 3 {
        ("running", 40 * *polls)
    } else {
        ("completed", 100)
    };
    ok(json!({ "job_id": job_id, "status": status, "progress": progress }))
}

async fn cancel_onboarding(Path(_job_id): Path<String>) -> Reply {
    (StatusCode::OK, Json(json!({ "success": true, "message": "cancelled" })))
}

/// Start the fake on an ephemeral port and return a client pointed at it
pub async fn spawn(token: Option<&str>) -> (DocflowClient, FakeService) {
    let svc = FakeService::default();

    let app = Router::new()
        .route(
            "/api/v1/pipelines",
            get(list_pipelines).post(upsert_pipeline),
        )
        .route(
            "/api/v1/pipelines/{id}",
            get(get_pipeline)
                .put(update_pipeline)
                .delete(delete_pipeline),
        )
        .route("/api/v1/llm-models", get(list_models).post(create_model))
        .route("/api/v1/llm-models/search", post(search_models))
        .route(
            "/api/v1/llm-models/{id}",
            get(get_model).put(update_model).delete(delete_model),
        )
        .route("/api/v1/profiles", get(list_profiles).post(save_profile))
        .route("/api/v1/profiles/search", post(search_profiles))
        .route("/api/v1/profiles/myprofile", get(my_profile))
        .route("/api/v1/onboard/save", post(save_onboarding))
        .route("/api/v1/onboard/progress/{job_id}", get(onboarding_progress))
        .route("/api/v1/onboard/cancel/{job_id}", post(cancel_onboarding))
        .with_state(svc.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = ClientConfig::new(format!("http://{}", addr));
    if let Some(token) = token {
        config = config.with_token(token);
    }
    (DocflowClient::new(config).unwrap(), svc)
}
