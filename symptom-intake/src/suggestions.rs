//! Debounced symptom suggestions with a per-session cache.
//!
//! Each keystroke is a call to [`SuggestionLookup::lookup`]. A call waits out the debounce
//! window and gives up if a newer keystroke arrived in the meantime. Results are cached per
//! normalised query for the lifetime of the session, and a reply that comes back after a
//! newer request was issued is cached but not shown.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::client::IntakeBackend;

pub const MIN_QUERY_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "suggestions", rename_all = "snake_case")]
pub enum SuggestionOutcome {
    /// Fewer than two characters; the dropdown is hidden
    TooShort,
    Cached(Vec<String>),
    Fetched(Vec<String>),
    /// A newer keystroke arrived during the debounce window
    Superseded,
    /// The same query was already sent and its answer is still pending or failed
    Duplicate,
    /// The reply arrived after a newer request was issued
    Stale,
    Failed(String),
}

pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

#[derive(Default)]
pub struct SuggestionLookup {
    cache: DashMap<String, Vec<String>>,
    last_query: Mutex<Option<String>>,
    keystrokes: AtomicU64,
    issued: AtomicU64,
}

impl SuggestionLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cached(&self, query: &str) -> Option<Vec<String>> {
        self.cache.get(&normalize(query)).map(|hit| hit.clone())
    }

    pub async fn lookup(
        &self,
        raw: &str,
        debounce: Duration,
        backend: &dyn IntakeBackend,
    ) -> SuggestionOutcome {
        let query = normalize(raw);
        if query.chars().count() < MIN_QUERY_LEN {
            return SuggestionOutcome::TooShort;
        }
        if let Some(hit) = self.cache.get(&query) {
            return SuggestionOutcome::Cached(hit.clone());
        }

        let keystroke = self.keystrokes.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(debounce).await;
        if self.keystrokes.load(Ordering::SeqCst) != keystroke {
            debug!(%query, "Suggestion lookup superseded");
            return SuggestionOutcome::Superseded;
        }

        {
            let mut last = self.last_query.lock().await;
            if last.as_deref() == Some(query.as_str()) {
                return SuggestionOutcome::Duplicate;
            }
            *last = Some(query.clone());
        }

        let request = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let result = backend.suggest_symptoms(&query).await;
        let is_latest = self.issued.load(Ordering::SeqCst) == request;

        match result {
            Ok(found) => {
                self.cache.insert(query.clone(), found.clone());
                if is_latest {
                    SuggestionOutcome::Fetched(found)
                } else {
                    debug!(%query, "Discarding stale suggestions");
                    SuggestionOutcome::Stale
                }
            }
            Err(e) => {
                warn!(%query, error = %e, "Symptom suggestions failed");
                if is_latest {
                    SuggestionOutcome::Failed(e.to_string())
                } else {
                    SuggestionOutcome::Stale
                }
            }
        }
    }
}

/// One lookup per session
pub struct SuggestionRegistry {
    lookups: DashMap<String, Arc<SuggestionLookup>>,
    debounce: Duration,
}

impl SuggestionRegistry {
    pub fn new(debounce: Duration) -> Self {
        Self {
            lookups: DashMap::new(),
            debounce,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    pub fn for_session(&self, session_id: &str) -> Arc<SuggestionLookup> {
        self.lookups
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(SuggestionLookup::new()))
            .clone()
    }

    /// Drop the cache and request counter of a finished session
    pub fn forget(&self, session_id: &str) {
        self.lookups.remove(session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;

    const DEBOUNCE: Duration = Duration::from_millis(300);

    #[tokio::test(start_paused = true)]
    async fn short_queries_are_ignored() {
        let backend = FakeBackend::default();
        let lookup = SuggestionLookup::new();

        assert_eq!(lookup.lookup(" H ", DEBOUNCE, &backend).await, SuggestionOutcome::TooShort);
        assert_eq!(backend.suggest_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn results_are_cached_by_normalised_query() {
        let backend = FakeBackend::default().with_suggestions("hea", &["Headache", "Heartburn"]);
        let lookup = SuggestionLookup::new();

        let first = lookup.lookup("Hea", DEBOUNCE, &backend).await;
        assert_eq!(
            first,
            SuggestionOutcome::Fetched(vec!["Headache".to_string(), "Heartburn".to_string()])
        );

        let second = lookup.lookup("  HEA ", DEBOUNCE, &backend).await;
        assert!(matches!(second, SuggestionOutcome::Cached(ref list) if list.len() == 2));
        assert_eq!(backend.suggest_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn typing_within_the_debounce_window_sends_one_request() {
        let backend = Arc::new(
            FakeBackend::default()
                .with_suggestions("he", &["Headache"])
                .with_suggestions("hea", &["Headache"]),
        );
        let lookup = Arc::new(SuggestionLookup::new());

        let early = {
            let (lookup, backend) = (lookup.clone(), backend.clone());
            tokio::spawn(async move { lookup.lookup("he", DEBOUNCE, backend.as_ref()).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let late = lookup.lookup("hea", DEBOUNCE, backend.as_ref()).await;

        assert_eq!(early.await.unwrap(), SuggestionOutcome::Superseded);
        assert_eq!(late, SuggestionOutcome::Fetched(vec!["Headache".to_string()]));
        assert_eq!(backend.suggest_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_reply_is_not_shown_over_a_newer_one() {
        let backend = Arc::new(
            FakeBackend::default()
                .with_suggestions("co", &["Cold"])
                .with_suggest_delay("co", Duration::from_secs(2))
                .with_suggestions("cou", &["Cough"]),
        );
        let lookup = Arc::new(SuggestionLookup::new());

        let slow = {
            let (lookup, backend) = (lookup.clone(), backend.clone());
            tokio::spawn(async move { lookup.lookup("co", DEBOUNCE, backend.as_ref()).await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;
        let fast = lookup.lookup("cou", DEBOUNCE, backend.as_ref()).await;

        assert_eq!(fast, SuggestionOutcome::Fetched(vec!["Cough".to_string()]));
        assert_eq!(slow.await.unwrap(), SuggestionOutcome::Stale);
        assert_eq!(lookup.cached("co"), Some(vec!["Cold".to_string()]));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_query_is_not_repeated() {
        let backend = FakeBackend::default();
        let lookup = SuggestionLookup::new();

        assert!(matches!(
            lookup.lookup("rash", DEBOUNCE, &backend).await,
            SuggestionOutcome::Failed(_)
        ));
        assert_eq!(lookup.lookup("rash", DEBOUNCE, &backend).await, SuggestionOutcome::Duplicate);
        assert_eq!(backend.suggest_calls(), 1);
    }

    #[test]
    fn forgotten_session_starts_a_new_lookup() {
        let registry = SuggestionRegistry::new(DEBOUNCE);
        let first = registry.for_session("s1");
        assert!(Arc::ptr_eq(&first, &registry.for_session("s1")));

        registry.forget("s1");
        assert!(!Arc::ptr_eq(&first, &registry.for_session("s1")));
    }
}
