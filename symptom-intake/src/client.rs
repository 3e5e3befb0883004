//! Client for the intake backend that generates suggestions, questions and analyses.
//!
//! Endpoints (all `POST` with JSON bodies unless noted):
//!
//!   /get_symptoms                  `{input}` -> `[symptom, ...]`
//!   /submit_symptoms               FormState -> `{completed}` | `{question_type, structured_questions}` | `{question}`
//!   /analyze                       FormState -> `{analysis, possible_conditions, diagnostic_tests, recommendations}`
//!   /extract_labels                `{symptoms, free_text}` -> `{extracted_labels, label_count, correlation_matrix, feature_questions}`
//!   /generate_followup_questions   patient profile -> `{questions}`
//!   /generate_patient_summary      FormState -> `{patient_summary, vitals_abnormalities, medical_significance}`
//!   /followup                      FormState -> `{question}` | `{completed}`
//!   HEAD /                         reachability check
//!
//! A non-2xx status and a body that is not declared as JSON are both failures; callers
//! substitute fallback content instead of surfacing them.

use async_trait::async_trait;
use reqwest::{Client, Response, header::CONTENT_TYPE};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{FormState, PatientProfile};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Cannot connect to server: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Server error: {status}")]
    Status { status: u16, body: String },

    #[error("Server returned {content_type} instead of JSON")]
    NotJson { content_type: String },

    #[error("Unexpected response: {0}")]
    Decode(String),
}

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Whether the backend answered `HEAD /`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ServerStatus {
    Running,
    Responded { status: u16 },
    Unreachable { error: String },
}

impl ServerStatus {
    pub fn message(&self) -> String {
        match self {
            ServerStatus::Running => {
                "Server is running. The issue might be with the API endpoints.".to_string()
            }
            ServerStatus::Responded { status } => format!("Server responded with status: {status}"),
            ServerStatus::Unreachable { .. } => {
                "Cannot connect to server. Please make sure the backend is running on the correct port."
                    .to_string()
            }
        }
    }
}

/// The collaborator behind the wizard. Responses are returned as raw JSON because
/// every caller tolerates missing or odd fields in its own way.
#[async_trait]
pub trait IntakeBackend: Send + Sync {
    async fn suggest_symptoms(&self, input: &str) -> BackendResult<Vec<String>>;
    async fn submit_symptoms(&self, form: &FormState) -> BackendResult<Value>;
    async fn analyze(&self, form: &FormState) -> BackendResult<Value>;
    async fn extract_labels(&self, symptoms: &[String], free_text: &str) -> BackendResult<Value>;
    async fn generate_followup_questions(&self, profile: &PatientProfile) -> BackendResult<Value>;
    async fn generate_patient_summary(&self, form: &FormState) -> BackendResult<Value>;
    async fn followup(&self, form: &FormState) -> BackendResult<Value>;
    async fn server_status(&self) -> ServerStatus;
}

/// [`IntakeBackend`] over HTTP
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> BackendResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Calling backend");
        let response = self.http.post(&url).json(body).send().await?;
        read_json(path, response).await
    }
}

async fn read_json(path: &str, response: Response) -> BackendResult<Value> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(path, status = status.as_u16(), "Backend returned an error status");
        return Err(BackendError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    if !content_type.contains("application/json") {
        warn!(path, %content_type, "Backend returned a non-JSON body");
        return Err(BackendError::NotJson {
            content_type: if content_type.is_empty() {
                "a body without content type".to_string()
            } else {
                content_type
            },
        });
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl IntakeBackend for HttpBackend {
    async fn suggest_symptoms(&self, input: &str) -> BackendResult<Vec<String>> {
        let value = self.post_json("/get_symptoms", &json!({ "input": input })).await?;
        serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
    }

    async fn submit_symptoms(&self, form: &FormState) -> BackendResult<Value> {
        self.post_json("/submit_symptoms", form).await
    }

    async fn analyze(&self, form: &FormState) -> BackendResult<Value> {
        self.post_json("/analyze", form).await
    }

    async fn extract_labels(&self, symptoms: &[String], free_text: &str) -> BackendResult<Value> {
        self.post_json(
            "/extract_labels",
            &json!({ "symptoms": symptoms, "free_text": free_text }),
        )
        .await
    }

    async fn generate_followup_questions(&self, profile: &PatientProfile) -> BackendResult<Value> {
        self.post_json("/generate_followup_questions", profile).await
    }

    async fn generate_patient_summary(&self, form: &FormState) -> BackendResult<Value> {
        self.post_json("/generate_patient_summary", form).await
    }

    async fn followup(&self, form: &FormState) -> BackendResult<Value> {
        self.post_json("/followup", form).await
    }

    async fn server_status(&self) -> ServerStatus {
        let url = format!("{}/", self.base_url);
        match self.http.head(&url).send().await {
            Ok(response) if response.status().is_success() => ServerStatus::Running,
            Ok(response) => ServerStatus::Responded {
                status: response.status().as_u16(),
            },
            Err(e) => ServerStatus::Unreachable {
                error: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_json_response_is_returned() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/get_symptoms")
            .match_body(mockito::Matcher::Json(json!({ "input": "hea" })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"["Headache","Heartburn"]"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(server.url()).unwrap();
        let suggestions = backend.suggest_symptoms("hea").await.unwrap();

        assert_eq!(suggestions, vec!["Headache".to_string(), "Heartburn".to_string()]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_html_body_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/submit_symptoms")
            .with_status(200)
            .with_header("content-type", "text/html; charset=utf-8")
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let backend = HttpBackend::new(server.url()).unwrap();
        let result = backend.submit_symptoms(&FormState::default()).await;

        assert!(matches!(result, Err(BackendError::NotJson { .. })));
    }

    #[tokio::test]
    async fn test_error_status_is_a_failure() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/analyze")
            .with_status(500)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error":"boom"}"#)
            .create_async()
            .await;

        let backend = HttpBackend::new(server.url()).unwrap();
        let result = backend.analyze(&FormState::default()).await;

        assert!(matches!(result, Err(BackendError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_server_status() {
        let mut server = mockito::Server::new_async().await;
        server.mock("HEAD", "/").with_status(503).create_async().await;

        let backend = HttpBackend::new(server.url()).unwrap();
        assert_eq!(
            backend.server_status().await,
            ServerStatus::Responded { status: 503 }
        );

        let free_port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let unreachable = HttpBackend::new(format!("http://127.0.0.1:{free_port}")).unwrap();
        assert!(matches!(
            unreachable.server_status().await,
            ServerStatus::Unreachable { .. }
        ));
    }
}
