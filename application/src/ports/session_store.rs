//! Session store port
//!
//! The registry of active sessions: session id → latest snapshot plus the
//! cancellation token of the task driving it. Only insert and remove need
//! coordination; each session is written by exactly one driving task.

use panel_domain::{PanelSession, SessionId};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tokio_util::sync::CancellationToken;

/// A session as held by the store
#[derive(Debug, Clone)]
pub struct StoredSession {
    pub session: PanelSession,
    pub cancellation: CancellationToken,
}

pub trait SessionStore: Send + Sync {
    fn insert(&self, session: PanelSession, cancellation: CancellationToken);

    /// Replace the snapshot of a registered session.
    /// Returns `false` if the session is no longer registered.
    fn update(&self, session: &PanelSession) -> bool;

    fn get(&self, id: &SessionId) -> Option<PanelSession>;

    fn cancellation(&self, id: &SessionId) -> Option<CancellationToken>;

    fn remove(&self, id: &SessionId) -> Option<StoredSession>;

    fn active_ids(&self) -> Vec<SessionId>;
}

/// Process-local store behind a single `RwLock`
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn insert(&self, session: PanelSession, cancellation: CancellationToken) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.insert(
            session.id().clone(),
            StoredSession {
                session,
                cancellation,
            },
        );
    }

    fn update(&self, session: &PanelSession) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        match sessions.get_mut(session.id()) {
            Some(stored) => {
                stored.session = session.clone();
                true
            }
            None => false,
        }
    }

    fn get(&self, id: &SessionId) -> Option<PanelSession> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(id).map(|stored| stored.session.clone())
    }

    fn cancellation(&self, id: &SessionId) -> Option<CancellationToken> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        sessions.get(id).map(|stored| stored.cancellation.clone())
    }

    fn remove(&self, id: &SessionId) -> Option<StoredSession> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions.remove(id)
    }

    fn active_ids(&self) -> Vec<SessionId> {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<_> = sessions.keys().cloned().collect();
        ids.sort();
        ids
    }
}
