//! Inference backend against a local mock endpoint.
//!
//! An `axum` server on 127.0.0.1 stands in for the hosted summarization
//! service, so the tests check the exact request the backend sends and how
//! it reads both success and error bodies.
//!
//! Run with:
//!   cargo test --test inference

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use report_summarizer::model::inference::InferenceModel;
use report_summarizer::{ErrorClass, ModelError, ReportConfig, SummaryModel};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

// ── Mock endpoint ────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Captured {
    requests: Arc<Mutex<Vec<(String, Option<String>, Value)>>>,
}

async fn summarize_ok(
    State(captured): State<Captured>,
    Path((org, name)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    captured
        .requests
        .lock()
        .unwrap()
        .push((format!("{org}/{name}"), auth, body));
    Json(json!([{ "summary_text": "<s> The patient is healthy.</s>" }]))
}

async fn summarize_loading() -> impl IntoResponse {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": "Model facebook/bart-large-cnn is currently loading" })),
    )
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn request_carries_model_path_token_and_parameters() {
    let captured = Captured::default();
    let app = Router::new()
        .route("/:org/:name", post(summarize_ok))
        .with_state(captured.clone());
    let endpoint = spawn(app).await;

    let config = ReportConfig::builder()
        .endpoint(format!("{endpoint}/"))
        .api_token("test-token")
        .build()
        .unwrap();
    let model = InferenceModel::new(&config).unwrap();
    assert_eq!(model.url(), format!("{endpoint}/facebook/bart-large-cnn"));

    let raw = model
        .generate("Blood pressure 120/80.", &config.generation_params())
        .await
        .unwrap();
    assert_eq!(raw, "<s> The patient is healthy.</s>");

    let requests = captured.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (path, auth, body) = &requests[0];
    assert_eq!(path, "facebook/bart-large-cnn");
    assert_eq!(auth.as_deref(), Some("Bearer test-token"));
    assert_eq!(body["inputs"], "Blood pressure 120/80.");
    let g = &body["parameters"]["generate_parameters"];
    assert_eq!(g["max_length"], 150);
    assert_eq!(g["min_length"], 30);
    assert_eq!(g["length_penalty"], 2.0);
    assert_eq!(g["num_beams"], 4);
    assert_eq!(g["early_stopping"], true);
}

#[tokio::test]
async fn custom_generation_settings_are_forwarded() {
    let captured = Captured::default();
    let app = Router::new()
        .route("/:org/:name", post(summarize_ok))
        .with_state(captured.clone());
    let endpoint = spawn(app).await;

    let config = ReportConfig::builder()
        .endpoint(endpoint)
        .model_name("sshleifer/distilbart-cnn-12-6")
        .max_summary_tokens(60)
        .min_summary_tokens(10)
        .beam_width(2)
        .early_stopping(false)
        .build()
        .unwrap();
    let model = InferenceModel::new(&config).unwrap();
    model
        .generate("Hemoglobin low.", &config.generation_params())
        .await
        .unwrap();

    let requests = captured.requests.lock().unwrap();
    let (path, _, body) = &requests[0];
    assert_eq!(path, "sshleifer/distilbart-cnn-12-6");
    let g = &body["parameters"]["generate_parameters"];
    assert_eq!(g["max_length"], 60);
    assert_eq!(g["min_length"], 10);
    assert_eq!(g["num_beams"], 2);
    assert_eq!(g["early_stopping"], false);
}

#[tokio::test]
async fn error_body_becomes_status_error() {
    let app = Router::new().route("/:org/:name", post(summarize_loading));
    let endpoint = spawn(app).await;

    let config = ReportConfig::builder().endpoint(endpoint).build().unwrap();
    let model = InferenceModel::new(&config).unwrap();
    let err = model
        .generate("text", &config.generation_params())
        .await
        .unwrap_err();

    match err {
        ModelError::Status { status, message } => {
            assert_eq!(status, 503);
            assert!(message.contains("currently loading"));
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_summarization_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ReportConfig::builder()
        .endpoint(format!("http://{addr}"))
        .request_timeout_secs(5)
        .build()
        .unwrap();
    let tokenizer = tokenizers::Tokenizer::from_bytes(
        json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": [],
            "normalizer": null,
            "pre_tokenizer": { "type": "WhitespaceSplit" },
            "post_processor": null,
            "decoder": null,
            "model": { "type": "WordLevel", "vocab": { "<unk>": 0 }, "unk_token": "<unk>" }
        })
        .to_string()
        .as_bytes(),
    )
    .unwrap();
    let model = Arc::new(InferenceModel::new(&config).unwrap());
    let handle = report_summarizer::ModelHandle::from_parts(model, tokenizer, &config);

    let err = handle
        .generate("text", &config.generation_params())
        .await
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::Summarization);
}
