use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use loan_core::features::{FeatureMatrix, FittedScaler};
use loan_core::model::{Classifier, InferenceError, LinearClassifier};
use loan_core::{ArtifactStore, PredictionLog, PredictionService};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use crate::config::Config;
use crate::{create_router, AppState};

const HEADER: &str = "annual_income,debt_to_income_ratio,credit_score,loan_amount,interest_rate,gender,marital_status,education_level,employment_status,loan_purpose,grade_subgrade";
const BOUNDARY: &str = "loan-test-boundary";

struct Broken;

impl Classifier for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn positive_proba(&self, _features: &FeatureMatrix) -> Result<Vec<f64>, InferenceError> {
        Err(InferenceError::Run("session poisoned".to_string()))
    }
}

fn app_with(dir: &TempDir, classifier: Arc<dyn Classifier>) -> Router {
    let columns = vec![
        "credit_score".to_string(),
        "grade_subgrade_A1".to_string(),
        "grade_subgrade_B2".to_string(),
    ];
    let scaler = FittedScaler::Standard {
        mean: vec![650.0, 0.0, 0.0],
        scale: vec![50.0, 1.0, 1.0],
    };
    let store = ArtifactStore::from_parts(columns, scaler, classifier).unwrap();

    let mut config = Config::from_lookup(|_| None).unwrap();
    config.prediction_log = dir.path().join("predictions_log.csv");
    config.upload_dir = dir.path().join("uploads");

    let log = PredictionLog::open(&config.prediction_log);
    create_router(AppState {
        service: Arc::new(PredictionService::new(Arc::new(store), log)),
        config,
    })
}

fn app(dir: &TempDir) -> Router {
    app_with(dir, Arc::new(LinearClassifier::new(vec![1.0, 0.5, 0.2], 0.0)))
}

fn application() -> Value {
    json!({
        "annual_income": 52000, "debt_to_income_ratio": 0.18, "credit_score": 712,
        "loan_amount": 12500, "interest_rate": 11.4, "gender": "Female",
        "marital_status": "Single", "education_level": "Bachelor's",
        "employment_status": "Employed", "loan_purpose": "Car", "grade_subgrade": "B2"
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_upload(uri: &str, field: &str, filename: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(&app(&dir), get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["classifier"], "linear");
}

#[tokio::test]
async fn test_index_describes_model() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(&app(&dir), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"]["feature_count"], 3);
    assert!(body["routes"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r == "POST /predict-batch-ui"));
}

#[tokio::test]
async fn test_batch_page_lists_required_columns() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(&app(&dir), get("/batch")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["field"], "file");
    assert_eq!(body["required_columns"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn test_predict_and_history() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(&app, get("/history")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["records"].is_null());

    let (status, body) = send(&app, post_json("/predict", &application())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["prediction"], "Will Pay Back");
    assert_eq!(body["probability"], 0.8085);
    assert_eq!(body["logged"], true);

    let (_, body) = send(&app, get("/history")).await;
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["grade_subgrade"], "B2");
    assert_eq!(records[0]["prediction"], "Will Pay Back");
}

#[tokio::test]
async fn test_predict_missing_field_is_client_error() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let mut payload = application();
    payload.as_object_mut().unwrap().remove("credit_score");

    let (status, body) = send(&app, post_json("/predict", &payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("credit_score"));

    let (_, body) = send(&app, get("/history")).await;
    assert!(body["records"].is_null());
}

#[tokio::test]
async fn test_predict_empty_category_is_zero_filled() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let mut payload = application();
    payload["grade_subgrade"] = json!("");
    payload["debt_to_income_ratio"] = json!(-0.01);

    let (status, body) = send(&app, post_json("/predict", &payload)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["probability"], 0.7756);
    assert_eq!(body["prediction"], "Will Pay Back");
    assert_eq!(body["logged"], true);

    let (_, body) = send(&app, get("/history")).await;
    assert_eq!(body["records"][0]["grade_subgrade"], "");
}

#[tokio::test]
async fn test_inference_failure_is_generic_server_error() {
    let dir = TempDir::new().unwrap();
    let app = app_with(&dir, Arc::new(Broken));

    let (status, body) = send(&app, post_json("/predict", &application())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");

    let (_, body) = send(&app, get("/history")).await;
    assert!(body["records"].is_null());
}

#[tokio::test]
async fn test_batch_upload_scores_and_logs_every_row() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let csv = format!(
        "{HEADER}\n\
         52000,0.18,712,12500,11.4,Female,Single,Bachelor's,Employed,Car,B2\n\
         31000,0.41,400,8000,17.9,Male,Married,High School,Unemployed,Home,D3\n\
         90000,0.10,780,20000,7.1,Male,Single,Master's,Employed,Business,A1"
    );

    let (status, body) = send(
        &app,
        post_upload("/predict-batch-ui", "file", "../applicants.csv", &csv),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let rows = body["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["prediction"], "Will Pay Back");
    assert_eq!(rows[1]["prediction"], "Will NOT Pay Back");
    assert_eq!(rows[0]["timestamp"], rows[2]["timestamp"]);
    assert_eq!(body["logged"], true);

    assert!(dir.path().join("uploads").join("applicants.csv").exists());

    let (_, body) = send(&app, get("/history")).await;
    assert_eq!(body["records"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_batch_alias_route() {
    let dir = TempDir::new().unwrap();
    let csv = format!("{HEADER}\n52000,0.18,712,12500,11.4,Female,Single,Bachelor's,Employed,Car,B2");

    let (status, body) = send(&app(&dir), post_upload("/predict-batch", "file", "one.csv", &csv)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_batch_missing_column_rejected_without_logging() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let csv = format!(
        "{}\n52000,0.18,12500,11.4,Female,Single,Bachelor's,Employed,Car,B2",
        HEADER.replace("credit_score,", "")
    );

    let (status, body) = send(&app, post_upload("/predict-batch-ui", "file", "bad.csv", &csv)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Missing columns: [\"credit_score\"]");

    let (_, body) = send(&app, get("/history")).await;
    assert!(body["records"].is_null());
}

#[tokio::test]
async fn test_batch_without_file_field() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(
        &app(&dir),
        post_upload("/predict-batch-ui", "attachment", "batch.csv", HEADER),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}

#[tokio::test]
async fn test_batch_with_empty_filename() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(&app(&dir), post_upload("/predict-batch-ui", "file", "", HEADER)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Empty filename");
}

#[tokio::test]
async fn test_batch_without_multipart_body() {
    let dir = TempDir::new().unwrap();
    let (status, body) = send(&app(&dir), post_json("/predict-batch-ui", &application())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No file uploaded");
}
