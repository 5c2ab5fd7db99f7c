// Paw Voice Engine — Session Registry
// Maps session ids to their Dispatcher. Each dispatcher owns one
// ContextWindow, so sessions never share history. The registry lock is only
// held for map lookups, never across a turn.

use crate::atoms::traits::{GenerativeActionExecutor, GenerativeBackend, InstantActionExecutor};
use crate::engine::config::EngineConfig;
use crate::engine::dispatcher::Dispatcher;
use log::info;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

pub struct SessionManager {
    config: EngineConfig,
    instant: Arc<dyn InstantActionExecutor>,
    backend: Arc<dyn GenerativeBackend>,
    actions: Arc<dyn GenerativeActionExecutor>,
    sessions: Mutex<HashMap<String, Arc<Dispatcher>>>,
}

impl SessionManager {
    /// Collaborators are shared by every session created from this manager.
    pub fn new(
        config: EngineConfig,
        instant: Arc<dyn InstantActionExecutor>,
        backend: Arc<dyn GenerativeBackend>,
        actions: Arc<dyn GenerativeActionExecutor>,
    ) -> Self {
        SessionManager {
            config,
            instant,
            backend,
            actions,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn get_or_create(&self, session_id: &str) -> Arc<Dispatcher> {
        let mut sessions = self.sessions.lock();
        if let Some(existing) = sessions.get(session_id) {
            return Arc::clone(existing);
        }
        info!("[sessions] Created session {}", session_id);
        let dispatcher = Arc::new(Dispatcher::new(
            session_id,
            &self.config,
            Arc::clone(&self.instant),
            Arc::clone(&self.backend),
            Arc::clone(&self.actions),
        ));
        sessions.insert(session_id.to_string(), Arc::clone(&dispatcher));
        dispatcher
    }

    pub fn get(&self, session_id: &str) -> Option<Arc<Dispatcher>> {
        self.sessions.lock().get(session_id).cloned()
    }

    /// Drop a session. A turn already in flight keeps its own Arc and finishes.
    pub fn remove(&self, session_id: &str) -> bool {
        let removed = self.sessions.lock().remove(session_id).is_some();
        if removed {
            info!("[sessions] Removed session {}", session_id);
        }
        removed
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}
