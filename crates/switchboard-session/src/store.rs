//! Session store: the only mutable shared state in the system.
//!
//! Sessions are keyed by an opaque string identifier and locked
//! individually, so operations on different sessions never block each other
//! while mutations of the same session serialize.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use switchboard_core::Capability;

/// The author of one conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One conversation turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    /// Epoch seconds.
    pub timestamp: i64,
}

impl Turn {
    /// A turn stamped with the current time.
    pub fn now(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// One caller's ongoing conversation.
///
/// Owned exclusively by the [`SessionStore`]; the identifier is immutable
/// once assigned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub turns: Vec<Turn>,
    /// The capability that handled the most recent turn.
    pub last_backend: Option<Capability>,
    /// Epoch seconds.
    pub started_at: i64,
    /// Epoch seconds; refreshed by every touch.
    pub last_active_at: i64,
}

impl Session {
    fn new(id: String) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id,
            turns: Vec::new(),
            last_backend: None,
            started_at: now,
            last_active_at: now,
        }
    }
}

/// Summary of one session, for listing endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub started_at: String,
    pub last_active_at: String,
    pub turn_count: usize,
    pub last_backend: Option<Capability>,
}

/// Errors from the session store.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A lock was poisoned by a panicking writer. The only store error that
    /// escalates to a hard server failure.
    #[error("session store corrupted: {0}")]
    Poisoned(String),
    #[error("session not found: {0}")]
    NotFound(String),
}

impl From<SessionError> for switchboard_core::SwitchboardError {
    fn from(err: SessionError) -> Self {
        switchboard_core::SwitchboardError::Session(err.to_string())
    }
}

/// Store of all active sessions.
///
/// Two-level locking: the registry lock is held only long enough to resolve
/// the per-session handle; all reads and mutations of a session take that
/// session's own lock. Eviction takes the same per-session lock before
/// removal, so it cannot race an in-flight mutation.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Arc<Mutex<Session>>>>,
    ttl_secs: i64,
    max_turns: usize,
}

impl SessionStore {
    /// Create a store with the given TTL and per-session turn cap.
    pub fn new(ttl_minutes: u32, max_turns: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl_secs: i64::from(ttl_minutes) * 60,
            max_turns,
        }
    }

    /// Resolve a session identifier, creating state as needed.
    ///
    /// A known, live identifier is reused and its TTL extended. An unknown
    /// or expired identifier is (re)created under the caller's identifier,
    /// so a client can resume with an id the server has already evicted.
    /// With no identifier, a fresh UUID is generated.
    pub fn get_or_create(&self, requested: Option<&str>) -> Result<String, SessionError> {
        let mut sessions = self.lock_registry()?;

        let id = match requested {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };

        match sessions.get(&id) {
            Some(handle) => {
                let mut session = lock_session(handle)?;
                if self.is_expired(&session) {
                    // Expired but not yet swept; resume as a fresh session
                    // under the same identifier.
                    *session = Session::new(id.clone());
                } else {
                    session.last_active_at = Utc::now().timestamp();
                }
            }
            None => {
                sessions.insert(id.clone(), Arc::new(Mutex::new(Session::new(id.clone()))));
                tracing::debug!(session_id = %id, "Session created");
            }
        }

        Ok(id)
    }

    /// Get a snapshot of a session.
    pub fn get(&self, id: &str) -> Result<Option<Session>, SessionError> {
        let handle = match self.handle(id)? {
            Some(h) => h,
            None => return Ok(None),
        };
        let session = lock_session(&handle)?;
        Ok(Some(session.clone()))
    }

    /// Fetch a session's turn history.
    pub fn history(&self, id: &str) -> Result<Vec<Turn>, SessionError> {
        let handle = self
            .handle(id)?
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        let session = lock_session(&handle)?;
        Ok(session.turns.clone())
    }

    /// Append turns to a session and record which backend produced them.
    ///
    /// Turns from one call are committed atomically under the session lock,
    /// preserving submission order for that session. History beyond the
    /// configured cap is trimmed oldest-first.
    pub fn append_turns(
        &self,
        id: &str,
        turns: Vec<Turn>,
        backend: Capability,
    ) -> Result<(), SessionError> {
        let handle = self
            .handle(id)?
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        let mut session = lock_session(&handle)?;

        session.turns.extend(turns);
        let excess = session.turns.len().saturating_sub(self.max_turns);
        if excess > 0 {
            session.turns.drain(..excess);
        }
        session.last_backend = Some(backend);
        session.last_active_at = Utc::now().timestamp();
        Ok(())
    }

    /// Remove a session. Clearing an unknown identifier is a no-op.
    ///
    /// Returns whether a session actually existed.
    pub fn clear(&self, id: &str) -> Result<bool, SessionError> {
        let mut sessions = self.lock_registry()?;
        let existed = sessions.remove(id).is_some();
        if existed {
            tracing::debug!(session_id = %id, "Session cleared");
        }
        Ok(existed)
    }

    /// List summaries of all live sessions.
    pub fn list(&self) -> Result<Vec<SessionSummary>, SessionError> {
        let handles: Vec<Arc<Mutex<Session>>> =
            self.lock_registry()?.values().cloned().collect();

        let mut summaries = Vec::with_capacity(handles.len());
        for handle in handles {
            let session = lock_session(&handle)?;
            if self.is_expired(&session) {
                continue;
            }
            summaries.push(SessionSummary {
                id: session.id.clone(),
                started_at: format_epoch(session.started_at),
                last_active_at: format_epoch(session.last_active_at),
                turn_count: session.turns.len(),
                last_backend: session.last_backend,
            });
        }
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }

    /// Sweep expired sessions. Returns how many were evicted.
    ///
    /// Each candidate's own lock is taken before removal, so a sweep never
    /// races an in-flight mutation of that session.
    pub fn evict_expired(&self) -> Result<usize, SessionError> {
        let mut sessions = self.lock_registry()?;
        let expired: Vec<String> = sessions
            .iter()
            .filter_map(|(id, handle)| {
                let session = lock_session(handle).ok()?;
                self.is_expired(&session).then(|| id.clone())
            })
            .collect();

        for id in &expired {
            sessions.remove(id);
        }
        if !expired.is_empty() {
            tracing::info!(count = expired.len(), "Evicted expired sessions");
        }
        Ok(expired.len())
    }

    /// Number of live (non-expired) sessions.
    pub fn len(&self) -> usize {
        self.list().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether the store holds no live sessions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // -- Private helpers --

    fn handle(&self, id: &str) -> Result<Option<Arc<Mutex<Session>>>, SessionError> {
        Ok(self.lock_registry()?.get(id).cloned())
    }

    fn lock_registry(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, Arc<Mutex<Session>>>>, SessionError>
    {
        self.sessions
            .lock()
            .map_err(|e| SessionError::Poisoned(format!("registry lock: {}", e)))
    }

    fn is_expired(&self, session: &Session) -> bool {
        Utc::now().timestamp() - session.last_active_at > self.ttl_secs
    }
}

fn lock_session(
    handle: &Arc<Mutex<Session>>,
) -> Result<std::sync::MutexGuard<'_, Session>, SessionError> {
    handle
        .lock()
        .map_err(|e| SessionError::Poisoned(format!("session lock: {}", e)))
}

/// Format epoch seconds as ISO 8601.
fn format_epoch(epoch: i64) -> String {
    Local
        .timestamp_opt(epoch, 0)
        .single()
        .map(|dt: DateTime<Local>| dt.to_rfc3339())
        .unwrap_or_else(|| epoch.to_string())
}

// =============================================================================
// Tests
// =============================================================================
