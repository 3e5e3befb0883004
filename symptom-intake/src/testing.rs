//! Scripted backend for tests. Anything not configured fails like an unreachable server.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::client::{BackendError, BackendResult, IntakeBackend, ServerStatus};
use crate::models::{FormState, PatientProfile};

fn unavailable() -> BackendError {
    BackendError::Status {
        status: 503,
        body: "unavailable".to_string(),
    }
}

#[derive(Default)]
pub struct FakeBackend {
    suggestions: HashMap<String, Vec<String>>,
    suggest_delays: HashMap<String, Duration>,
    submit_replies: Mutex<VecDeque<Value>>,
    followup_replies: Mutex<VecDeque<Value>>,
    analysis: Option<Value>,
    labels: Option<Value>,
    label_delay: Option<Duration>,
    questions: Option<Value>,
    summary: Option<Value>,
    suggest_calls: AtomicUsize,
    submit_calls: AtomicUsize,
    analyze_calls: AtomicUsize,
    label_calls: AtomicUsize,
    summary_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn with_suggestions(mut self, query: &str, found: &[&str]) -> Self {
        self.suggestions
            .insert(query.to_string(), found.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Hold the reply for `query` back on the tokio clock
    pub fn with_suggest_delay(mut self, query: &str, delay: Duration) -> Self {
        self.suggest_delays.insert(query.to_string(), delay);
        self
    }

    /// Queue a `/submit_symptoms` reply; an empty queue fails
    pub fn with_submit(self, reply: Value) -> Self {
        self.submit_replies
            .lock()
            .expect("submit queue")
            .push_back(reply);
        self
    }

    pub fn with_followup(self, reply: Value) -> Self {
        self.followup_replies
            .lock()
            .expect("followup queue")
            .push_back(reply);
        self
    }

    pub fn with_analysis(mut self, reply: Value) -> Self {
        self.analysis = Some(reply);
        self
    }

    pub fn with_labels(mut self, reply: Value) -> Self {
        self.labels = Some(reply);
        self
    }

    /// Hold every label extraction back on the tokio clock
    pub fn with_label_delay(mut self, delay: Duration) -> Self {
        self.label_delay = Some(delay);
        self
    }

    pub fn with_questions(mut self, reply: Value) -> Self {
        self.questions = Some(reply);
        self
    }

    pub fn with_summary(mut self, reply: Value) -> Self {
        self.summary = Some(reply);
        self
    }

    pub fn suggest_calls(&self) -> usize {
        self.suggest_calls.load(Ordering::SeqCst)
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn analyze_calls(&self) -> usize {
        self.analyze_calls.load(Ordering::SeqCst)
    }

    pub fn label_calls(&self) -> usize {
        self.label_calls.load(Ordering::SeqCst)
    }

    pub fn summary_calls(&self) -> usize {
        self.summary_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntakeBackend for FakeBackend {
    async fn suggest_symptoms(&self, input: &str) -> BackendResult<Vec<String>> {
        self.suggest_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.suggest_delays.get(input) {
            tokio::time::sleep(*delay).await;
        }
        self.suggestions.get(input).cloned().ok_or_else(unavailable)
    }

    async fn submit_symptoms(&self, _form: &FormState) -> BackendResult<Value> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        self.submit_replies
            .lock()
            .expect("submit queue")
            .pop_front()
            .ok_or_else(unavailable)
    }

    async fn analyze(&self, _form: &FormState) -> BackendResult<Value> {
        self.analyze_calls.fetch_add(1, Ordering::SeqCst);
        self.analysis.clone().ok_or_else(unavailable)
    }

    async fn extract_labels(&self, _symptoms: &[String], _free_text: &str) -> BackendResult<Value> {
        self.label_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.label_delay {
            tokio::time::sleep(delay).await;
        }
        self.labels.clone().ok_or_else(unavailable)
    }

    async fn generate_followup_questions(&self, _profile: &PatientProfile) -> BackendResult<Value> {
        self.questions.clone().ok_or_else(unavailable)
    }

    async fn generate_patient_summary(&self, _form: &FormState) -> BackendResult<Value> {
        self.summary_calls.fetch_add(1, Ordering::SeqCst);
        self.summary.clone().ok_or_else(unavailable)
    }

    async fn followup(&self, _form: &FormState) -> BackendResult<Value> {
        self.followup_replies
            .lock()
            .expect("followup queue")
            .pop_front()
            .ok_or_else(unavailable)
    }

    async fn server_status(&self) -> ServerStatus {
        ServerStatus::Unreachable {
            error: "connection refused".to_string(),
        }
    }
}
