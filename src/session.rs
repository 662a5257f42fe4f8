use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;
use uuid::Uuid;

use crate::error::{EditorError, EditorResult};
use crate::table::Table;

/// Default idle lifetime of a session (24 hours).
pub const SESSION_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// One-shot message shown on the next render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "lowercase")]
pub enum Notice {
    Success(String),
    Error(String),
}

/// A user action that produces a new table.
#[derive(Clone, Debug)]
pub enum Event {
    AddRow(HashMap<String, String>),
    DeleteRow(i64),
    ModifyRow {
        index: i64,
        values: HashMap<String, String>,
    },
}

/// Per-browser editing state.
///
/// A session owns exactly one table. The table itself is never changed: every
/// successful event swaps in a new one.
#[derive(Clone, Debug)]
pub struct Session {
    file_name: String,
    digest: String,
    table: Arc<Table>,
    notice: Option<Notice>,
    last_used: Instant,
}

impl Session {
    /// Start a session on a freshly loaded upload.
    pub fn open(file_name: impl Into<String>, digest: impl Into<String>, table: Arc<Table>) -> Self {
        Session {
            file_name: file_name.into(),
            digest: digest.into(),
            table,
            notice: None,
            last_used: Instant::now(),
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn shared_table(&self) -> Arc<Table> {
        Arc::clone(&self.table)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Digest of the upload this session started from.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }

    /// Compute the table `event` would produce, without touching the session.
    pub fn apply(&self, event: &Event) -> EditorResult<Table> {
        let table = self.table.as_ref();
        match event {
            Event::AddRow(values) => Ok(table.add_row(values)),
            Event::DeleteRow(index) => table.delete_row(table.checked_index(*index)?),
            Event::ModifyRow { index, values } => {
                table.modify_row(table.checked_index(*index)?, values)
            }
        }
    }

    /// Move to the session that follows `event`.
    ///
    /// On success the new table replaces the old one; on failure the table is
    /// kept and the error becomes the notice.
    pub fn handle(mut self, event: &Event) -> Session {
        match self.apply(event) {
            Ok(table) => {
                let message = match event {
                    Event::AddRow(_) => "Row added",
                    Event::DeleteRow(_) => "Row deleted",
                    Event::ModifyRow { .. } => "Row modified",
                };
                log::info!("{}: {} now has {} rows", message, self.file_name, table.row_count());
                self.table = Arc::new(table);
                self.notice = Some(Notice::Success(message.to_string()));
            }
            Err(e) => {
                log::warn!("rejected edit on {}: {}", self.file_name, e);
                self.notice = Some(Notice::Error(e.to_string()));
            }
        }
        self
    }
}

/// Live sessions keyed by the id stored in the session cookie.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(SESSION_DURATION)
    }
}

impl SessionStore {
    /// Create a store whose sessions expire after `ttl` without use.
    pub fn new(ttl: Duration) -> Self {
        SessionStore {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Register `session` and return its new id.
    pub fn open(&self, session: Session) -> String {
        let id = Uuid::new_v4().to_string();
        let mut sessions = self.lock();
        sessions.insert(id.clone(), session);
        log::info!("opened session {} ({} live)", id, sessions.len());
        id
    }

    /// Replace the session `id` with `f(session)`.
    ///
    /// # Returns
    /// * `EditorResult<()>` - `EditorError::NoSession` if `id` is unknown or expired
    pub fn update<F>(&self, id: &str, f: F) -> EditorResult<()>
    where
        F: FnOnce(Session) -> Session,
    {
        let mut sessions = self.lock();
        self.purge_expired(&mut sessions);

        let session = sessions.remove(id).ok_or(EditorError::NoSession)?;
        let mut next = f(session);
        next.last_used = Instant::now();
        sessions.insert(id.to_string(), next);
        Ok(())
    }

    /// Copy of session `id`, leaving any pending notice in place.
    pub fn get(&self, id: &str) -> Option<Session> {
        let mut sessions = self.lock();
        self.purge_expired(&mut sessions);

        let stored = sessions.get_mut(id)?;
        stored.last_used = Instant::now();
        Some(stored.clone())
    }

    /// Copy of session `id` for rendering.
    ///
    /// The pending notice is handed out once: the stored session forgets it.
    pub fn snapshot(&self, id: &str) -> Option<Session> {
        let mut sessions = self.lock();
        self.purge_expired(&mut sessions);

        let stored = sessions.get_mut(id)?;
        stored.last_used = Instant::now();
        let snapshot = stored.clone();
        stored.notice = None;
        Some(snapshot)
    }

    /// Discard session `id`. Returns whether it existed.
    pub fn close(&self, id: &str) -> bool {
        let removed = self.lock().remove(id).is_some();
        if removed {
            log::info!("closed session {}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn purge_expired(&self, sessions: &mut HashMap<String, Session>) {
        let ttl = self.ttl;
        sessions.retain(|id, session| {
            let alive = session.last_used.elapsed() < ttl;
            if !alive {
                log::info!("session {} expired", id);
            }
            alive
        });
    }
}
