//! In-process stand-in for the risk-assessment server.
//!
//! Mirrors the REST routes, status codes and `{message}` / `{error}` bodies
//! of the real backend with a small canned dataset.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::task::JoinHandle;

pub const TEST_TOKEN: &str = "test-token-123";
pub const PASSWORD: &str = "secret";
pub const CLINICIAN_EMAIL: &str = "dr.house@medsafe.test";
pub const PHARMACIST_EMAIL: &str = "rx@medsafe.test";
pub const ADMIN_EMAIL: &str = "root@medsafe.test";
pub const PATIENT_EMAIL: &str = "pat@medsafe.test";
/// Search query answered with a 200 and a non-JSON body.
pub const GARBAGE_QUERY: &str = "__garbage__";

const DRUGS: &[&str] = &[
    "Aspirin",
    "Atorvastatin",
    "Ibuprofen",
    "Lisinopril",
    "Metformin",
    "Simvastatin",
    "Warfarin",
];

struct ServerState {
    patients: Mutex<Vec<Value>>,
}

pub struct TestServer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Bind to an ephemeral port and serve until dropped.
pub async fn spawn() -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test server");
    let addr = listener.local_addr().expect("test server addr");
    let app = router();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    TestServer {
        base_url: format!("http://{addr}"),
        handle,
    }
}

pub fn router() -> Router {
    let state = Arc::new(ServerState {
        patients: Mutex::new(vec![json!({
            "_id": "p-1",
            "name": "Jane Doe",
            "age": 64,
            "gender": "Female",
            "allergies": ["Sulfa"],
            "medical_history": ["Atrial fibrillation"],
            "current_medications": ["Aspirin"],
            "created_at": "2026-01-05T09:00:00"
        })]),
    });

    Router::new()
        .route("/", get(health))
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/api/assess", post(assess))
        .route("/api/assess/override", post(log_override))
        .route("/api/alternatives/:drug_id", get(alternatives))
        .route("/api/drugs/search", get(search_drugs))
        .route("/api/patients", get(list_patients).post(create_patient))
        .route("/api/patient/:id", get(get_patient))
        .route("/api/admin/stats", get(admin_stats))
        .with_state(state)
}

fn reply(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn require_token(headers: &HeaderMap) -> Result<(), Response> {
    let token = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match token {
        None => Err(reply(
            StatusCode::UNAUTHORIZED,
            json!({"message": "Token is missing!"}),
        )),
        Some(TEST_TOKEN) => Ok(()),
        Some(_) => Err(reply(
            StatusCode::UNAUTHORIZED,
            json!({"message": "Token is invalid!", "error": "Signature verification failed"}),
        )),
    }
}

fn role_for(email: &str) -> Option<&'static str> {
    match email {
        CLINICIAN_EMAIL => Some("clinician"),
        PHARMACIST_EMAIL => Some("pharmacist"),
        ADMIN_EMAIL => Some("admin"),
        PATIENT_EMAIL => Some("patient"),
        _ => None,
    }
}

async fn health() -> Json<Value> {
    Json(json!({"message": "MedSafe API is running"}))
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    match role_for(email) {
        Some(role) if password == PASSWORD => {
            reply(StatusCode::OK, json!({"token": TEST_TOKEN, "role": role}))
        }
        _ => reply(
            StatusCode::UNAUTHORIZED,
            json!({"message": "Invalid credentials"}),
        ),
    }
}

async fn register(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default();
    if role_for(email).is_some() {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({"message": "User already exists"}),
        );
    }
    reply(
        StatusCode::CREATED,
        json!({"message": "User created", "user_id": "u-new"}),
    )
}

async fn assess(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = require_token(&headers) {
        return denied;
    }
    let drug = body["drug_id"].as_str().unwrap_or_default();
    let patient = &body["patient_data"];
    if drug.is_empty() || !patient.is_object() {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({"error": "Missing patient data or drug ID"}),
        );
    }
    let on_aspirin = patient["current_medications"]
        .as_array()
        .map(|meds| meds.iter().any(|m| m == "Aspirin"))
        .unwrap_or(false);

    let result = match drug {
        "Warfarin" if on_aspirin => json!({
            "risk_score": 1.0,
            "risk_level": "Critical",
            "interactions": ["Increased bleeding risk"],
            "shap_values": [],
            "recommendation": "Contraindicated due to known interaction."
        }),
        "Warfarin" => json!({
            "risk_score": 0.82,
            "risk_level": "High",
            "interactions": [],
            "shap_values": [
                {"feature": "Age", "value": 0.31, "contribution": "positive"},
                {"feature": "Creatinine", "value": 0.12, "contribution": "positive"},
                {"feature": "Polypharmacy", "value": -0.04, "contribution": "negative"}
            ]
        }),
        "Lisinopril" => json!({
            "risk_score": 0.55,
            "risk_level": "Medium",
            "interactions": [],
            "shap_values": [{"feature": "Age", "value": 0.2, "contribution": "positive"}]
        }),
        _ => json!({
            "risk_score": 0.12,
            "risk_level": "Low",
            "interactions": [],
            "shap_values": [{"feature": "Age", "value": -0.05, "contribution": "negative"}]
        }),
    };
    reply(StatusCode::OK, result)
}

async fn log_override(headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Err(denied) = require_token(&headers) {
        return denied;
    }
    if body["reason"].as_str().unwrap_or_default().is_empty() {
        return reply(StatusCode::BAD_REQUEST, json!({"error": "Missing reason"}));
    }
    reply(
        StatusCode::OK,
        json!({"message": "Override logged successfully"}),
    )
}

async fn alternatives(headers: HeaderMap, Path(drug_id): Path<String>) -> Response {
    if let Err(denied) = require_token(&headers) {
        return denied;
    }
    let alternatives = match drug_id.as_str() {
        "Warfarin" => json!([
            {"name": "Apixaban", "risk_reduction": "40%"},
            {"name": "Rivaroxaban", "risk_reduction": "30%"}
        ]),
        "Lisinopril" => json!([{"name": "Losartan", "risk_reduction": "25%"}]),
        _ => json!([]),
    };
    reply(StatusCode::OK, json!({"alternatives": alternatives}))
}

async fn search_drugs(Query(params): Query<HashMap<String, String>>) -> Response {
    let query = params.get("q").map(String::as_str).unwrap_or_default();
    if query == GARBAGE_QUERY {
        return (StatusCode::OK, "<html>maintenance</html>").into_response();
    }
    let needle = query.to_lowercase();
    let hits: Vec<&str> = DRUGS
        .iter()
        .copied()
        .filter(|d| !needle.is_empty() && d.to_lowercase().contains(&needle))
        .take(10)
        .collect();
    reply(StatusCode::OK, json!(hits))
}

async fn list_patients(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    if let Err(denied) = require_token(&headers) {
        return denied;
    }
    let patients = state.patients.lock().expect("patients lock").clone();
    reply(StatusCode::OK, Value::Array(patients))
}

async fn create_patient(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Err(denied) = require_token(&headers) {
        return denied;
    }
    if body["name"].as_str().unwrap_or_default().is_empty() || !body["age"].is_number() {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({"error": "Missing required fields"}),
        );
    }
    let mut patients = state.patients.lock().expect("patients lock");
    let id = format!("p-{}", patients.len() + 1);
    let mut record = body;
    record["_id"] = json!(id);
    patients.push(record);
    reply(
        StatusCode::CREATED,
        json!({"message": "Patient created", "patient_id": id}),
    )
}

async fn get_patient(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if let Err(denied) = require_token(&headers) {
        return denied;
    }
    let patients = state.patients.lock().expect("patients lock");
    match patients.iter().find(|p| p["_id"] == id.as_str()) {
        Some(patient) => reply(StatusCode::OK, patient.clone()),
        None => reply(
            StatusCode::NOT_FOUND,
            json!({"error": "Patient not found"}),
        ),
    }
}

async fn admin_stats(headers: HeaderMap) -> Response {
    if let Err(denied) = require_token(&headers) {
        return denied;
    }
    reply(
        StatusCode::OK,
        json!({
            "metrics": {
                "total_users": 4,
                "total_assessments": 12,
                "high_risk_alerts": 3,
                "overrides": 1
            },
            "logs": [
                {
                    "_id": "l-1",
                    "user_id": "65f0c1a2b3c4",
                    "action": "OVERRIDE_RISK",
                    "details": {"drug_id": "Warfarin", "risk_level": "High", "reason": "Benefit outweighs risk", "patient_id": null},
                    "ip_address": "127.0.0.1",
                    "timestamp": "Mon, 05 Jan 2026 09:00:00 GMT"
                },
                {
                    "_id": "l-2",
                    "user_id": null,
                    "action": "VIEW_ALTERNATIVES",
                    "details": {"drug_id": "Lisinopril", "count": 1},
                    "ip_address": "127.0.0.1",
                    "timestamp": "Mon, 05 Jan 2026 09:05:00 GMT"
                }
            ]
        }),
    )
}
