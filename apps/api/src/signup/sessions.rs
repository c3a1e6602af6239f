//! In-memory store of active signup flows.
//!
//! Owned by `AppState` and shared by clone. The lock is a plain std mutex and
//! is never held across an await point: handlers mark a step pending under
//! the lock, run the backend call, then re-lock to resolve it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::signup::flow::FlowSession;
use crate::signup::UtmParams;

#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<Uuid, FlowSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh flow and return a snapshot of it.
    pub fn create(&self, utm: UtmParams) -> FlowSession {
        let session = FlowSession::new(utm);
        let snapshot = session.clone();
        self.lock().insert(session.id, session);
        snapshot
    }

    /// Snapshot of a flow, if it exists.
    pub fn get(&self, id: Uuid) -> Option<FlowSession> {
        self.lock().get(&id).cloned()
    }

    /// Run `f` against the stored flow under the lock. Returns `None` for an
    /// unknown id.
    pub fn with<T>(&self, id: Uuid, f: impl FnOnce(&mut FlowSession) -> T) -> Option<T> {
        self.lock().get_mut(&id).map(f)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, FlowSession>> {
        self.inner.lock().expect("signup session store poisoned")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signup::flow::FlowState;

    #[test]
    fn test_created_flow_is_retrievable() {
        let store = SessionStore::new();
        let created = store.create(UtmParams::default());
        let fetched = store.get(created.id).expect("flow should exist");
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.state, FlowState::Credentials);
    }

    #[test]
    fn test_unknown_flow_is_none() {
        let store = SessionStore::new();
        assert!(store.get(Uuid::new_v4()).is_none());
        assert!(store.with(Uuid::new_v4(), |_| ()).is_none());
    }

    #[test]
    fn test_with_mutates_the_stored_flow() {
        let store = SessionStore::new();
        let id = store.create(UtmParams::default()).id;

        store
            .with(id, |s| s.begin_step(FlowState::Credentials))
            .expect("flow should exist")
            .expect("begin should succeed");

        assert!(store.get(id).unwrap().pending);
    }

    #[test]
    fn test_clones_share_the_same_flows() {
        let store = SessionStore::new();
        let other = store.clone();
        let id = store.create(UtmParams::default()).id;
        assert!(other.get(id).is_some());
    }
}
