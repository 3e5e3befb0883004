use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
};
use intake_flow::{ExecutionResult, ExecutionStatus, FlowError, InMemorySessionStorage, SessionStorage};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    client::{HttpBackend, IntakeBackend},
    config::Config,
    controller::IntakeController,
    models::{
        CaseTypeSelection, FileUploadRequest, FreeTextRequest, HistoryAnswerRequest,
        InterviewAnswerRequest, LegacyAnswerRequest, PatientInput, StructuredAnswersRequest,
        SuggestionQuery, SymptomRequest, VitalsInput,
    },
    workflow::create_flow_runner,
};

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn conflict_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::CONFLICT,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn flow_error(session_id: &str, e: FlowError) -> ApiError {
    match e {
        FlowError::SessionNotFound(_) => not_found_error("Session not found", session_id),
        FlowError::NavigationRefused { .. } => conflict_error("Step not reachable yet", &e.to_string()),
        FlowError::Busy { .. } => conflict_error("Request already in progress", &e.to_string()),
        other => {
            error!(%session_id, error = %other, "Intake action failed");
            internal_error("Intake action failed", &other.to_string())
        }
    }
}

/// Turn a step transition into the JSON reply. Rejections become 422 with every message.
fn step_reply(session_id: &str, outcome: intake_flow::Result<ExecutionResult>) -> ApiResult<Value> {
    let result = outcome.map_err(|e| flow_error(session_id, e))?;
    let status = result.status.as_str();
    if let ExecutionStatus::Rejected(errors) = result.status {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "Validation failed",
                "errors": errors,
                "session_id": session_id,
                "step_index": result.step_index,
                "step_id": result.step_id
            })),
        ));
    }

    Ok(Json(json!({
        "session_id": session_id,
        "status": status,
        "step_index": result.step_index,
        "step_id": result.step_id,
        "response": result.response
    })))
}

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<IntakeController>,
}

impl AppState {
    pub fn new(
        backend: Arc<dyn IntakeBackend>,
        session_storage: Arc<dyn SessionStorage>,
        config: &Config,
    ) -> Self {
        let runner = create_flow_runner(backend.clone(), session_storage);
        let controller = IntakeController::new(runner, backend, config.suggestion_debounce);
        Self {
            controller: Arc::new(controller),
        }
    }
}

pub fn create_app(config: &Config) -> anyhow::Result<Router> {
    let backend = Arc::new(HttpBackend::new(config.backend_url.clone())?);
    info!(backend_url = %backend.base_url(), "Using intake backend");
    let session_storage = Arc::new(InMemorySessionStorage::new());
    Ok(build_router(AppState::new(backend, session_storage, config)))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/intake", post(create_session))
        .route("/intake/{id}", get(get_view).delete(abandon_session))
        .route("/intake/{id}/restart", post(restart_session))
        .route("/intake/{id}/next", post(next_step))
        .route("/intake/{id}/prev", post(prev_step))
        .route("/intake/{id}/navigate/{step}", post(navigate))
        .route("/intake/{id}/case-type", put(select_case_type))
        .route("/intake/{id}/patient", put(update_patient))
        .route("/intake/{id}/vitals", put(update_vitals))
        .route("/intake/{id}/files", post(record_upload))
        .route("/intake/{id}/suggestions", get(suggestions))
        .route("/intake/{id}/symptoms", post(add_symptom))
        .route("/intake/{id}/symptoms/{symptom}", delete(remove_symptom))
        .route("/intake/{id}/free-text", put(update_free_text))
        .route("/intake/{id}/labels", post(analyze_labels))
        .route("/intake/{id}/history/generate", post(history_generate))
        .route("/intake/{id}/history/answer", post(history_answer))
        .route("/intake/{id}/history/previous", post(history_previous))
        .route("/intake/{id}/history/complete", post(history_complete))
        .route("/intake/{id}/history/review", post(history_review))
        .route("/intake/{id}/history/proceed", post(history_proceed))
        .route("/intake/{id}/interview/answer", post(interview_answer))
        .route("/intake/{id}/interview/structured", post(interview_structured))
        .route("/intake/{id}/interview/legacy", post(interview_legacy))
        .route("/intake/{id}/analysis/retry", post(retry_analysis))
        .route("/intake/{id}/server-status", get(server_status))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Symptom Intake Service",
        "version": "0.1.0",
        "description": "Multi-step medical symptom intake with AI-driven follow-up questions",
        "endpoints": {
            "POST /intake": "Start a new intake session",
            "GET /intake/{id}": "Current step, sidebar and panel",
            "DELETE /intake/{id}": "Discard an intake session",
            "POST /intake/{id}/restart": "Discard a session and start a new one",
            "POST /intake/{id}/next": "Validate the current step and continue",
            "POST /intake/{id}/prev": "Go back one step",
            "POST /intake/{id}/navigate/{step}": "Jump to a visited step",
            "PUT /intake/{id}/case-type": "Select the case type",
            "PUT /intake/{id}/patient": "Update patient demographics",
            "PUT /intake/{id}/vitals": "Update clinical vitals",
            "POST /intake/{id}/files": "Record an uploaded document",
            "GET /intake/{id}/suggestions?q=": "Symptom suggestions",
            "POST /intake/{id}/symptoms": "Add a symptom",
            "DELETE /intake/{id}/symptoms/{symptom}": "Remove a symptom",
            "PUT /intake/{id}/free-text": "Describe symptoms in free text",
            "POST /intake/{id}/labels": "Extract medical labels",
            "POST /intake/{id}/history/{action}": "Patient history questionnaire",
            "POST /intake/{id}/interview/{kind}": "Answer interview questions",
            "POST /intake/{id}/analysis/retry": "Request the analysis again",
            "GET /intake/{id}/server-status": "Check the analysis backend",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_session(State(state): State<AppState>) -> ApiResult<Value> {
    let session = state
        .controller
        .create()
        .await
        .map_err(|e| internal_error("Failed to create intake session", &e.to_string()))?;
    let view = state
        .controller
        .view(&session.id)
        .await
        .map_err(|e| flow_error(&session.id, e))?;
    Ok(Json(view))
}

async fn get_view(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let view = state
        .controller
        .view(&id)
        .await
        .map_err(|e| flow_error(&id, e))?;
    Ok(Json(view))
}

async fn abandon_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    state
        .controller
        .abandon(&id)
        .await
        .map_err(|e| flow_error(&id, e))?;
    Ok(Json(json!({ "session_id": id, "status": "deleted" })))
}

async fn restart_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let session = state
        .controller
        .restart(&id)
        .await
        .map_err(|e| flow_error(&id, e))?;
    let view = state
        .controller
        .view(&session.id)
        .await
        .map_err(|e| flow_error(&session.id, e))?;
    Ok(Json(view))
}

async fn next_step(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    step_reply(&id, state.controller.next(&id).await)
}

async fn prev_step(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    step_reply(&id, state.controller.prev(&id).await)
}

async fn navigate(
    State(state): State<AppState>,
    Path((id, step)): Path<(String, usize)>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.navigate(&id, step).await)
}

async fn select_case_type(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<CaseTypeSelection>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.select_case_type(&id, request).await)
}

async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<PatientInput>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.update_patient(&id, request).await)
}

async fn update_vitals(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<VitalsInput>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.update_vitals(&id, request).await)
}

async fn record_upload(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FileUploadRequest>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.record_upload(&id, request).await)
}

async fn suggestions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<SuggestionQuery>,
) -> ApiResult<Value> {
    let reply = state
        .controller
        .suggestions(&id, &query.q)
        .await
        .map_err(|e| flow_error(&id, e))?;
    Ok(Json(json!({
        "session_id": id,
        "lookup": reply.lookup,
        "html": reply.html
    })))
}

async fn add_symptom(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SymptomRequest>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.add_symptom(&id, &request.symptom).await)
}

async fn remove_symptom(
    State(state): State<AppState>,
    Path((id, symptom)): Path<(String, String)>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.remove_symptom(&id, &symptom).await)
}

async fn update_free_text(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<FreeTextRequest>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.update_free_text(&id, &request.text).await)
}

async fn analyze_labels(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    step_reply(&id, state.controller.analyze_labels(&id).await)
}

async fn history_generate(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    step_reply(&id, state.controller.history_generate(&id).await)
}

async fn history_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<HistoryAnswerRequest>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.history_answer(&id, &request.answer).await)
}

async fn history_previous(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    step_reply(&id, state.controller.history_previous(&id).await)
}

async fn history_complete(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<HistoryAnswerRequest>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.history_complete(&id, &request.answer).await)
}

async fn history_review(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    step_reply(&id, state.controller.history_review(&id).await)
}

async fn history_proceed(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    step_reply(&id, state.controller.history_proceed(&id).await)
}

async fn interview_answer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<InterviewAnswerRequest>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.interview_answer(&id, request.answer).await)
}

async fn interview_structured(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StructuredAnswersRequest>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.interview_structured(&id, request.answers).await)
}

async fn interview_legacy(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<LegacyAnswerRequest>,
) -> ApiResult<Value> {
    step_reply(&id, state.controller.interview_legacy(&id, request.answer).await)
}

async fn retry_analysis(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    step_reply(&id, state.controller.retry_analysis(&id).await)
}

async fn server_status(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let status = state.controller.server_status().await;
    info!(session_id = %id, ?status, "Server status checked");
    Ok(Json(json!({
        "session_id": id,
        "server": status,
        "message": status.message()
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        let config = Config {
            suggestion_debounce: Duration::ZERO,
            ..Config::default()
        };
        let backend = Arc::new(FakeBackend::default().with_suggestions("co", &["Cough", "Cold"]));
        build_router(AppState::new(
            backend,
            Arc::new(InMemorySessionStorage::new()),
            &config,
        ))
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(body) => {
                request = request.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };
        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn new_session(app: &Router) -> String {
        let (status, body) = call(app, Method::POST, "/intake", None).await;
        assert_eq!(status, StatusCode::OK);
        body["session_id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_healthy() {
        let (status, body) = call(&app(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn new_session_starts_at_case_type() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = call(&app, Method::GET, &format!("/intake/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"]["index"], 0);
        assert_eq!(body["step"]["id"], "case_type");
    }

    #[tokio::test]
    async fn next_without_case_type_is_rejected() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = call(&app, Method::POST, &format!("/intake/{id}/next"), None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0], "Please select a medical case type to continue");

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/intake/{id}/case-type"),
            Some(json!({ "case_type": "general" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = call(&app, Method::POST, &format!("/intake/{id}/next"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step_id"], "patient_demographics");
    }

    #[tokio::test]
    async fn sidebar_cannot_skip_ahead() {
        let app = app();
        let id = new_session(&app).await;

        let (status, _) = call(&app, Method::POST, &format!("/intake/{id}/navigate/3"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let (status, body) = call(&app(), Method::GET, "/intake/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["session_id"], "missing");
    }

    #[tokio::test]
    async fn deleted_session_releases_storage() {
        let storage = Arc::new(InMemorySessionStorage::new());
        let app = build_router(AppState::new(
            Arc::new(FakeBackend::default()),
            storage.clone(),
            &Config::default(),
        ));
        let id = new_session(&app).await;
        let restarted = new_session(&app).await;
        assert_eq!(storage.len(), 2);

        let (status, body) = call(&app, Method::DELETE, &format!("/intake/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "deleted");
        assert_eq!(storage.len(), 1);

        let (status, _) = call(&app, Method::GET, &format!("/intake/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = call(&app, Method::DELETE, &format!("/intake/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = call(&app, Method::POST, &format!("/intake/{restarted}/restart"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"]["id"], "case_type");
        assert_ne!(body["session_id"], restarted.as_str());
        assert_eq!(storage.len(), 1);
    }

    #[tokio::test]
    async fn suggestions_and_symptom_selection() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = call(&app, Method::GET, &format!("/intake/{id}/suggestions?q=Co"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["lookup"]["outcome"], "fetched");
        assert_eq!(body["lookup"]["suggestions"][0], "Cough");

        let (_, body) = call(&app, Method::GET, &format!("/intake/{id}/suggestions?q=c"), None).await;
        assert_eq!(body["lookup"]["outcome"], "too_short");

        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/intake/{id}/symptoms"),
            Some(json!({ "symptom": "Cough" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["response"].as_str().unwrap().contains("Cough"));

        let (status, _) = call(&app, Method::DELETE, &format!("/intake/{id}/symptoms/Fever"), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn server_status_reports_unreachable_backend() {
        let app = app();
        let id = new_session(&app).await;

        let (status, body) = call(&app, Method::GET, &format!("/intake/{id}/server-status"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["server"]["state"], "unreachable");
    }
}
