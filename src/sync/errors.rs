/// Reporting of failed persistence calls
///
/// Persistence runs fire-and-forget, so failures never reach the caller of
/// a mutation. They are handed to an `ErrorSink`; `ErrorLog` keeps the most
/// recent ones for display and turns a 401 into a forced logout.

use crate::error::{RemoteError, RemoteErrorKind};
use crate::sync::session::Session;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// How many entries `ErrorLog` retains
pub const MAX_ERRORS: usize = 10;

/// Receiver of persistence failures
pub trait ErrorSink: Send + Sync {
    /// `context` names the operation that failed, e.g. "create_element"
    fn report(&self, context: &str, error: &RemoteError);
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEntry {
    pub id: Uuid,
    pub context: String,
    pub kind: RemoteErrorKind,
    pub status: Option<u16>,
    /// User-facing text
    pub message: String,
    pub occurred_at: DateTime<Utc>,
}

/// Bounded, newest-first log of persistence failures
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Mutex<VecDeque<ErrorEntry>>,
    session: Option<Arc<Session>>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log that logs out `session` when the server answers 401
    pub fn with_session(session: Arc<Session>) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            session: Some(session),
        }
    }

    /// Snapshot, newest first
    pub fn entries(&self) -> Vec<ErrorEntry> {
        self.lock().iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<ErrorEntry> {
        self.lock().front().cloned()
    }

    pub fn by_context(&self, context: &str) -> Vec<ErrorEntry> {
        self.lock()
            .iter()
            .filter(|entry| entry.context == context)
            .cloned()
            .collect()
    }

    /// Remove one entry; false if it was already gone
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ErrorEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ErrorSink for ErrorLog {
    fn report(&self, context: &str, error: &RemoteError) {
        tracing::error!("❌ {} failed: {}", context, error);

        if error.kind() == RemoteErrorKind::Unauthorized {
            if let Some(session) = &self.session {
                session.force_logout();
            }
            return;
        }

        let entry = ErrorEntry {
            id: Uuid::new_v4(),
            context: context.to_string(),
            kind: error.kind(),
            status: error.status(),
            message: error.user_message(),
            occurred_at: Utc::now(),
        };

        let mut entries = self.lock();
        entries.push_front(entry);
        entries.truncate(MAX_ERRORS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> RemoteError {
        RemoteError::Status {
            status: code,
            message: None,
        }
    }

    #[test]
    fn keeps_ten_newest_first() {
        let log = ErrorLog::new();
        for code in 0..12u16 {
            log.report(&format!("op{}", code), &status(500 + code));
        }

        let entries = log.entries();
        assert_eq!(entries.len(), MAX_ERRORS);
        assert_eq!(entries[0].context, "op11");
        assert_eq!(entries[9].context, "op2");
    }

    #[test]
    fn unauthorized_logs_out_instead_of_recording() {
        let session = Arc::new(Session::new(Some("t".into())));
        let log = ErrorLog::with_session(Arc::clone(&session));

        log.report("update_element", &status(401));

        assert!(log.is_empty());
        assert!(!session.is_authenticated());
    }

    #[test]
    fn dismiss_and_filter_by_context() {
        let log = ErrorLog::new();
        log.report("create_element", &status(422));
        log.report("delete_connection", &status(404));
        log.report("create_element", &RemoteError::Unreachable("refused".into()));

        let creates = log.by_context("create_element");
        assert_eq!(creates.len(), 2);
        assert_eq!(creates[0].kind, RemoteErrorKind::Unreachable);
        assert_eq!(creates[1].message, "Invalid data");

        assert!(log.dismiss(creates[0].id));
        assert!(!log.dismiss(creates[0].id));
        assert_eq!(log.len(), 2);

        log.clear();
        assert!(log.latest().is_none());
    }
}
