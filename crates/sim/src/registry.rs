//! Session registry: independent simulations addressed by id.
//!
//! Each session sits behind its own lock, so callers working on different
//! sessions never contend and a single session is only ever driven by one
//! caller at a time. The map lock is held only long enough to look a
//! session up.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use plume_core::{DVec2, SimConfig, SimError};
use tracing::info;

use crate::simulation::Simulation;

/// Identifier handed out by [`SessionRegistry::create`].
pub type SessionId = u64;

type SessionMap = HashMap<SessionId, Arc<Mutex<Simulation>>>;

/// Thread-safe map from session id to simulation.
#[derive(Debug)]
pub struct SessionRegistry {
    base: SimConfig,
    next_id: AtomicU64,
    sessions: Mutex<SessionMap>,
}

impl SessionRegistry {
    /// A registry whose sessions are built from `base`.
    pub fn new(base: SimConfig) -> Result<Self, SimError> {
        base.validate()?;
        Ok(Self {
            base,
            next_id: AtomicU64::new(1),
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn base_config(&self) -> &SimConfig {
        &self.base
    }

    /// Starts a new session at `start`, or at the base config's start.
    pub fn create(&self, start: Option<DVec2>) -> Result<SessionId, SimError> {
        let mut config = self.base.clone();
        if let Some(start) = start {
            config.start = start;
        }
        let sim = Simulation::new(config)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.map().insert(id, Arc::new(Mutex::new(sim)));
        info!(session = id, "session created");
        Ok(id)
    }

    /// Runs `f` with exclusive access to session `id`.
    pub fn with_session<R>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut Simulation) -> R,
    ) -> Result<R, SimError> {
        let session = self
            .map()
            .get(&id)
            .cloned()
            .ok_or(SimError::UnknownSession(id))?;
        let mut sim = session
            .lock()
            .map_err(|_| SimError::SessionPoisoned(id))?;
        Ok(f(&mut sim))
    }

    /// Drops session `id`.
    pub fn remove(&self, id: SessionId) -> Result<(), SimError> {
        if self.map().remove(&id).is_none() {
            return Err(SimError::UnknownSession(id));
        }
        info!(session = id, "session removed");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    /// Live session ids in ascending order.
    pub fn ids(&self) -> Vec<SessionId> {
        let mut ids: Vec<_> = self.map().keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // Map operations cannot leave the map half-updated, so a poisoned map
    // lock is still safe to use.
    fn map(&self) -> MutexGuard<'_, SessionMap> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
