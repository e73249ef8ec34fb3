/// Session-scoped credential context
///
/// Holds the bearer token used by `ApiClient`. The token lives in an
/// `ArcSwapOption` so readers on persistence tasks never block the editor.
/// `force_logout` clears it and bumps a watch channel that the embedding
/// application listens on to restart from a clean state.

use arc_swap::ArcSwapOption;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug)]
pub struct Session {
    token: ArcSwapOption<String>,
    /// Incremented on every forced logout
    logouts: watch::Sender<u64>,
}

impl Session {
    pub fn new(token: Option<String>) -> Self {
        let (logouts, _) = watch::channel(0);
        Self {
            token: ArcSwapOption::new(token.map(Arc::new)),
            logouts,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn token(&self) -> Option<Arc<String>> {
        self.token.load_full()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.load().is_some()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        self.token.store(Some(Arc::new(token.into())));
    }

    /// Drop the credential and notify subscribers
    pub fn force_logout(&self) {
        self.token.store(None);
        self.logouts.send_modify(|count| *count += 1);
        tracing::warn!("🔒 Session expired, credentials cleared");
    }

    /// Receiver that changes whenever the session is forcibly logged out
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.logouts.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn force_logout_clears_token_and_notifies() {
        let session = Session::new(Some("abc".into()));
        let mut logouts = session.subscribe();
        assert_eq!(session.token().as_deref().map(String::as_str), Some("abc"));

        session.force_logout();

        assert!(!session.is_authenticated());
        assert!(logouts.has_changed().unwrap());
        assert_eq!(*logouts.borrow_and_update(), 1);
    }

    #[test]
    fn token_can_be_replaced() {
        let session = Session::anonymous();
        session.set_token("fresh");
        assert!(session.is_authenticated());
    }
}
