//! FlowRunner – loads a session, performs exactly **one** wizard transition, and persists the
//! updated session back to storage.
//!
//! Every transition for a given session runs under that session's lock, so two requests for
//! the same session never interleave their reads and writes of the session context. Requests
//! for different sessions proceed independently.
//!
//! ```rust,ignore
//! let runner = FlowRunner::new(Arc::new(wizard), Arc::new(InMemorySessionStorage::new()));
//! let session = runner.create().await?;
//! let result = runner.next(&session.id).await?;
//! ```
//!
//! Actions that must not be submitted twice while one is still in flight take a
//! [`FlowRunner::try_begin`] marker first. A second request for the same action fails fast
//! with [`FlowError::Busy`]; other actions on the session still queue on the lock as usual.

use dashmap::{DashMap, mapref::entry::Entry};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::{
    error::{FlowError, Result},
    storage::{Session, SessionStorage},
    wizard::{ExecutionResult, Wizard},
};

/// High-level helper that orchestrates the _lock → load → transition → save_ pattern.
#[derive(Clone)]
pub struct FlowRunner {
    wizard: Arc<Wizard>,
    storage: Arc<dyn SessionStorage>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    in_flight: Arc<DashMap<(String, String), ()>>,
}

/// Marks one action as running for a session until dropped
pub struct InFlight {
    running: Arc<DashMap<(String, String), ()>>,
    key: (String, String),
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.running.remove(&self.key);
    }
}

impl FlowRunner {
    pub fn new(wizard: Arc<Wizard>, storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            wizard,
            storage,
            locks: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
        }
    }

    pub fn wizard(&self) -> &Arc<Wizard> {
        &self.wizard
    }

    pub fn storage(&self) -> &Arc<dyn SessionStorage> {
        &self.storage
    }

    /// Start a new session at the first step and persist it
    pub async fn create(&self) -> Result<Session> {
        let session = Session::new(self.wizard.id.clone());
        self.storage.save(session.clone()).await?;
        debug!(session_id = %session.id, "Session created");
        Ok(session)
    }

    fn lock_for(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to a session
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        self.lock_for(session_id).lock_owned().await
    }

    /// Mark `action` as running for a session, or fail with `Busy` if it already is.
    /// Does not lock the session.
    pub fn try_begin(&self, session_id: &str, action: &str) -> Result<InFlight> {
        let key = (session_id.to_string(), action.to_string());
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => Err(FlowError::Busy {
                session_id: session_id.to_string(),
                action: action.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(InFlight {
                    running: self.in_flight.clone(),
                    key,
                })
            }
        }
    }

    pub async fn load(&self, session_id: &str) -> Result<Session> {
        self.storage
            .get(session_id)
            .await?
            .ok_or_else(|| FlowError::SessionNotFound(session_id.to_string()))
    }

    pub async fn save(&self, session: Session) -> Result<()> {
        self.storage.save(session).await
    }

    /// Delete a session and release its lock entry
    pub async fn remove(&self, session_id: &str) -> Result<()> {
        let guard = self.acquire(session_id).await;
        let found = self.storage.get(session_id).await?.is_some();
        if found {
            self.storage.delete(session_id).await?;
        }
        drop(guard);
        self.locks.remove(session_id);
        if !found {
            return Err(FlowError::SessionNotFound(session_id.to_string()));
        }
        debug!(session_id = %session_id, "Session removed");
        Ok(())
    }

    /// Validate the current step and move forward
    pub async fn next(&self, session_id: &str) -> Result<ExecutionResult> {
        let _guard = self.acquire(session_id).await;
        let mut session = self.load(session_id).await?;
        let result = self.wizard.advance(&mut session).await?;
        self.save(session).await?;
        Ok(result)
    }

    /// Move back one step
    pub async fn prev(&self, session_id: &str) -> Result<ExecutionResult> {
        let _guard = self.acquire(session_id).await;
        let mut session = self.load(session_id).await?;
        let result = self.wizard.retreat(&mut session);
        self.save(session).await?;
        Ok(result)
    }

    /// Sidebar navigation: show a visited step, or the one right after the current step
    pub async fn navigate(&self, session_id: &str, target: usize) -> Result<ExecutionResult> {
        let _guard = self.acquire(session_id).await;
        let mut session = self.load(session_id).await?;
        if !self.wizard.can_navigate_to(&session, target) {
            return Err(FlowError::NavigationRefused {
                current: session.current_step,
                target,
            });
        }
        let step_id = self
            .wizard
            .step(target)
            .map(|s| s.id().to_string())
            .ok_or_else(|| FlowError::StepNotFound(target.to_string()))?;
        let result = self.wizard.show(&mut session, &step_id)?;
        self.save(session).await?;
        Ok(result)
    }

    /// Jump to a step and enter it without validating the current one
    pub async fn jump(&self, session_id: &str, step_id: &str) -> Result<ExecutionResult> {
        let _guard = self.acquire(session_id).await;
        let mut session = self.load(session_id).await?;
        let result = self.wizard.jump_to(&mut session, step_id).await?;
        self.save(session).await?;
        Ok(result)
    }

    /// Same as [`FlowRunner::jump`] for a caller that already holds the session guard
    /// and has the session loaded.
    pub async fn jump_locked(&self, session: &mut Session, step_id: &str) -> Result<ExecutionResult> {
        self.wizard.jump_to(session, step_id).await
    }

    /// Show a step without entering it. The caller holds the session guard.
    pub fn show_locked(&self, session: &mut Session, step_id: &str) -> Result<ExecutionResult> {
        self.wizard.show(session, step_id)
    }
}
