//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    ChatRequest, ChatResponse, ErrorResponse, HealthResponse, StartThinkingResponse,
    StepsRequest, StockNameRequest, StockNameResponse, SuccessResponse, SuggestionRequest,
    SuggestionResponse,
};
use super::AppState;
use crate::agent::{generate_session_id, is_valid_session_id, AgentRequest};
use crate::health::{probe_backend, BackendHealth};
use crate::stock_names::resolve_stock_name;
use crate::suggestions::generate_suggestions;
use crate::thinking::{OnComplete, ThinkingSnapshot};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde_json::Value;

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Prompt-based helpers
        .route("/api/suggestions", post(suggest))
        .route("/api/stock-name", post(stock_name))
        // Agent dispatch
        .route("/api/chat", post(send_chat))
        // Health proxy
        .route("/api/health", get(health))
        // Thinking animation
        .route("/api/thinking", get(thinking_snapshot))
        .route("/api/thinking/start", post(start_thinking))
        .route("/api/thinking/reset", post(reset_thinking))
        .route("/api/thinking/history", put(set_thinking_history))
        .route("/api/thinking/stream", get(stream_thinking))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Prompt-based helpers
// ============================================================

async fn suggest(
    State(state): State<AppState>,
    Json(req): Json<SuggestionRequest>,
) -> Result<Json<SuggestionResponse>, AppError> {
    let llm = state
        .llm
        .as_deref()
        .ok_or_else(|| AppError::Unavailable("No LLM configured".to_string()))?;

    let suggestions = generate_suggestions(&req.chat_history, llm)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Suggestion generation failed");
            AppError::BadGateway(e.to_string())
        })?;

    Ok(Json(SuggestionResponse { suggestions }))
}

async fn stock_name(
    State(state): State<AppState>,
    Json(req): Json<StockNameRequest>,
) -> Json<StockNameResponse> {
    let stock_name = resolve_stock_name(&req.isin, state.llm.as_deref()).await;
    Json(StockNameResponse { stock_name })
}

// ============================================================
// Agent dispatch
// ============================================================

async fn send_chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.query.trim().is_empty() {
        return Err(AppError::BadRequest("Query must not be empty".to_string()));
    }

    let session_id = match req.session_id {
        Some(id) if is_valid_session_id(&id) => id,
        _ => generate_session_id(),
    };

    let request = AgentRequest {
        user_id: state.config.user_id.clone(),
        session_id,
        query: req.query,
    };

    let ack = state.agent.dispatch(&request).await.map_err(|e| {
        tracing::error!(error = %e, session_id = %request.session_id, "Agent dispatch failed");
        AppError::BadGateway(e.to_string())
    })?;

    Ok(Json(ChatResponse {
        status: ack.status,
        message: ack.message,
        session_id: request.session_id,
    }))
}

// ============================================================
// Health proxy
// ============================================================

async fn health(State(state): State<AppState>) -> Response {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

    match probe_backend(&state.http, &state.config.backend_url).await {
        BackendHealth::Healthy(backend) => Json(HealthResponse {
            frontend: "healthy",
            backend,
            error: None,
            timestamp,
        })
        .into_response(),
        BackendHealth::Unhealthy(error) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse {
                frontend: "healthy",
                backend: Value::String("unhealthy".to_string()),
                error: Some(error),
                timestamp,
            }),
        )
            .into_response(),
    }
}

// ============================================================
// Thinking animation
// ============================================================

async fn thinking_snapshot(State(state): State<AppState>) -> Json<ThinkingSnapshot> {
    Json(state.thinking.snapshot())
}

async fn start_thinking(
    State(state): State<AppState>,
    Json(req): Json<StepsRequest>,
) -> Json<StartThinkingResponse> {
    let step_count = req.steps.len();
    let on_complete: OnComplete = Box::new(move || {
        tracing::info!(steps = step_count, "Thinking animation finished");
    });
    let run_id = state.thinking.start(req.steps, Some(on_complete));
    Json(StartThinkingResponse { run_id })
}

async fn reset_thinking(State(state): State<AppState>) -> Json<SuccessResponse> {
    state.thinking.reset();
    Json(SuccessResponse { ok: true })
}

async fn set_thinking_history(
    State(state): State<AppState>,
    Json(req): Json<StepsRequest>,
) -> Json<SuccessResponse> {
    state.thinking.set_all_steps(req.steps);
    Json(SuccessResponse { ok: true })
}

async fn stream_thinking(State(state): State<AppState>) -> impl IntoResponse {
    // Subscribe before snapshotting so no event falls between the two
    let rx = state.thinking.subscribe();
    let thinking = state.thinking.clone();
    sse_stream(state.thinking.snapshot(), rx, move || thinking.snapshot())
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    /// A required upstream is not configured
    Unavailable(String),
    /// An upstream call failed
    BadGateway(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            AppError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentAck, AgentClient};
    use crate::config::{AnimationConfig, AppConfig};
    use crate::llm::testing::MockLlmService;
    use crate::llm::{LlmError, LlmService};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    /// Fake backend exposing `/health` and the agent's `/query`
    async fn fake_backend(healthy: bool) -> String {
        let router = Router::new()
            .route(
                "/health",
                get(move || async move {
                    if healthy {
                        (StatusCode::OK, Json(json!({"status": "ok"})))
                    } else {
                        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "down"})))
                    }
                }),
            )
            .route(
                "/query",
                post(|Json(req): Json<AgentRequest>| async move {
                    Json(AgentAck {
                        status: "accepted".to_string(),
                        message: format!("{}:{}", req.user_id, req.query),
                    })
                }),
            );
        serve(router).await
    }

    /// Backend whose agent endpoint always fails
    async fn failing_backend() -> String {
        let router = Router::new().route(
            "/query",
            post(|| async { (StatusCode::BAD_GATEWAY, "agent offline") }),
        );
        serve(router).await
    }

    /// Address nothing listens on
    async fn unreachable_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{addr}")
    }

    async fn app(backend: &str, llm: Option<Arc<dyn LlmService>>) -> String {
        let config = AppConfig {
            port: 0,
            backend_url: backend.to_string(),
            agent_api_url: backend.to_string(),
            user_id: "tester".to_string(),
            animation: AnimationConfig {
                char_delay: Duration::from_millis(1),
                step_pause: Duration::from_millis(1),
                completion_delay: Duration::from_millis(1),
            },
        };
        let agent = AgentClient::new(&config.agent_api_url).unwrap();
        serve(create_router(AppState::new(config, llm, agent))).await
    }

    #[tokio::test]
    async fn test_health_ok() {
        let backend = fake_backend(true).await;
        let url = app(&backend, None).await;

        let resp = reqwest::get(format!("{url}/api/health")).await.unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["frontend"], "healthy");
        assert_eq!(body["backend"]["status"], "ok");
        assert!(body.get("error").is_none());
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_health_degraded_returns_503() {
        let backend = fake_backend(false).await;
        let url = app(&backend, None).await;

        let resp = reqwest::get(format!("{url}/api/health")).await.unwrap();
        assert_eq!(resp.status(), 503);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["frontend"], "healthy");
        assert_eq!(body["backend"], "unhealthy");
        assert!(body["error"].is_string());
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_health_unreachable_backend_returns_503() {
        let backend = unreachable_backend().await;
        let url = app(&backend, None).await;

        let resp = reqwest::get(format!("{url}/api/health")).await.unwrap();
        assert_eq!(resp.status(), 503);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["frontend"], "healthy");
        assert_eq!(body["backend"], "unhealthy");
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_dispatch_generates_session() {
        let backend = fake_backend(true).await;
        let url = app(&backend, None).await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{url}/api/chat"))
            .json(&json!({"query": "balance?", "session_id": "bogus"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["status"], "accepted");
        assert_eq!(body["message"], "tester:balance?");
        assert!(is_valid_session_id(body["session_id"].as_str().unwrap()));
        assert_ne!(body["session_id"], "bogus");

        let existing = "session_1700000000000_abcdefghi";
        let body: Value = client
            .post(format!("{url}/api/chat"))
            .json(&json!({"query": "more", "session_id": existing}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["session_id"], existing);
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_query() {
        let backend = fake_backend(true).await;
        let url = app(&backend, None).await;

        let resp = reqwest::Client::new()
            .post(format!("{url}/api/chat"))
            .json(&json!({"query": "   "}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_chat_agent_failure_is_bad_gateway() {
        for backend in [failing_backend().await, unreachable_backend().await] {
            let url = app(&backend, None).await;

            let resp = reqwest::Client::new()
                .post(format!("{url}/api/chat"))
                .json(&json!({"query": "balance?"}))
                .send()
                .await
                .unwrap();
            assert_eq!(resp.status(), 502);
            let body: Value = resp.json().await.unwrap();
            assert!(body["error"].is_string(), "{body}");
        }
    }

    #[tokio::test]
    async fn test_suggestions() {
        let backend = fake_backend(true).await;
        let llm = Arc::new(MockLlmService::new());
        llm.queue_text(r#"{"suggestions": ["Show spending", "Compare to last month"]}"#);
        let url = app(&backend, Some(llm)).await;

        let resp = reqwest::Client::new()
            .post(format!("{url}/api/suggestions"))
            .json(&json!({"chatHistory": "user: hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["suggestions"], json!(["Show spending", "Compare to last month"]));
    }

    #[tokio::test]
    async fn test_suggestions_without_llm_is_unavailable() {
        let backend = fake_backend(true).await;
        let url = app(&backend, None).await;

        let resp = reqwest::Client::new()
            .post(format!("{url}/api/suggestions"))
            .json(&json!({"chatHistory": "user: hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 503);
    }

    #[tokio::test]
    async fn test_suggestions_llm_error_is_bad_gateway() {
        let backend = fake_backend(true).await;
        let llm = Arc::new(MockLlmService::new());
        llm.queue_error(LlmError::network("connection reset"));
        let url = app(&backend, Some(llm)).await;

        let resp = reqwest::Client::new()
            .post(format!("{url}/api/suggestions"))
            .json(&json!({"chatHistory": "user: hi"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 502);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].as_str().unwrap().contains("connection reset"), "{body}");
    }

    #[tokio::test]
    async fn test_stock_name_fallback() {
        let backend = fake_backend(true).await;
        let url = app(&backend, None).await;

        let body: Value = reqwest::Client::new()
            .post(format!("{url}/api/stock-name"))
            .json(&json!({"isin": "US0378331005"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["stockName"], "Stock 331005");
    }

    #[tokio::test]
    async fn test_thinking_lifecycle() {
        let backend = fake_backend(true).await;
        let url = app(&backend, None).await;
        let client = reqwest::Client::new();

        client
            .put(format!("{url}/api/thinking/history"))
            .json(&json!({"steps": ["earlier"]}))
            .send()
            .await
            .unwrap();

        let body: Value = client
            .post(format!("{url}/api/thinking/start"))
            .json(&json!({"steps": ["ab", "c"]}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["run_id"], 1);

        let mut snapshot = Value::Null;
        for _ in 0..200 {
            snapshot = reqwest::get(format!("{url}/api/thinking"))
                .await
                .unwrap()
                .json()
                .await
                .unwrap();
            if snapshot["completed_steps"] == json!(["ab", "c"]) && snapshot["active_step"].is_null()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(snapshot["completed_steps"], json!(["ab", "c"]));
        assert_eq!(snapshot["all_steps"], json!(["earlier"]));
        assert_eq!(snapshot["typing"], false);

        client
            .post(format!("{url}/api/thinking/reset"))
            .send()
            .await
            .unwrap();
        let snapshot: Value = reqwest::get(format!("{url}/api/thinking"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(snapshot["completed_steps"], json!([]));
        assert_eq!(snapshot["all_steps"], json!([]));
    }

    #[tokio::test]
    async fn test_thinking_stream_starts_with_init() {
        let backend = fake_backend(true).await;
        let url = app(&backend, None).await;

        let mut resp = reqwest::get(format!("{url}/api/thinking/stream"))
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let chunk = resp.chunk().await.unwrap().unwrap();
        let text = String::from_utf8_lossy(&chunk);
        assert!(text.contains("event: init"), "{text}");
    }

    #[tokio::test]
    async fn test_thinking_stream_relays_run_events() {
        let backend = fake_backend(true).await;
        let url = app(&backend, None).await;

        let mut resp = reqwest::get(format!("{url}/api/thinking/stream"))
            .await
            .unwrap();
        reqwest::Client::new()
            .post(format!("{url}/api/thinking/start"))
            .json(&json!({"steps": ["ab"]}))
            .send()
            .await
            .unwrap();

        let mut text = String::new();
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !text.contains("event: completed") {
            let chunk = tokio::time::timeout_at(deadline, resp.chunk())
                .await
                .expect("stream stalled")
                .unwrap()
                .expect("stream ended");
            text.push_str(&String::from_utf8_lossy(&chunk));
        }

        let init = text.find("event: init").unwrap();
        let started = text.find("event: run_started").unwrap();
        let reveal = text.find("event: reveal").unwrap();
        let completed = text.find("event: completed").unwrap();
        assert!(init < started && started < reveal && reveal < completed, "{text}");
        assert!(text.contains(r#""revealed_text":"ab""#), "{text}");
    }

    #[tokio::test]
    async fn test_version() {
        let backend = fake_backend(true).await;
        let url = app(&backend, None).await;
        let text = reqwest::get(format!("{url}/version"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(text, env!("CARGO_PKG_VERSION"));
    }
}
