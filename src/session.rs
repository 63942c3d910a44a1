//! Persisted login session shared by every outgoing request

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::errors::AppResult;
use crate::models::Session;
use crate::utils::fs::{read_json, remove_if_exists, write_json};

/// Current session, mirrored to `session.json`
#[derive(Clone)]
pub struct SessionStore {
    path: PathBuf,
    current: Arc<RwLock<Option<Session>>>,
}

impl SessionStore {
    /// Empty store backed by `path`; nothing is read until [`load`](Self::load)
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Load a previously persisted session; an unreadable file starts logged out
    pub async fn load<P: AsRef<Path>>(path: P) -> Self {
        let store = Self::new(path);
        match read_json::<Session>(&store.path).await {
            Ok(Some(session)) => {
                debug!("Restored session for {}", session.username);
                *store.current.write().await = Some(session);
            }
            Ok(None) => debug!("No session file at {}", store.path.display()),
            Err(e) => warn!(
                "Ignoring unreadable session file {}: {}",
                store.path.display(),
                e
            ),
        }
        store
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// Token for the `Authorization` header, if logged in
    pub async fn bearer(&self) -> Option<String> {
        self.current.read().await.as_ref().map(|s| s.token.clone())
    }

    pub async fn is_logged_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn set(&self, session: Session) -> AppResult<()> {
        write_json(&self.path, &session).await?;
        info!("Logged in as {}", session.username);
        *self.current.write().await = Some(session);
        Ok(())
    }

    pub async fn clear(&self) -> AppResult<()> {
        remove_if_exists(&self.path).await?;
        if let Some(previous) = self.current.write().await.take() {
            info!("Logged out {}", previous.username);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            username: "mochi_owner".to_string(),
            token: "tok-123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_set_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::new(&path);
        assert_eq!(store.bearer().await, None);

        store.set(session()).await.unwrap();
        assert_eq!(store.bearer().await.as_deref(), Some("tok-123"));

        let reloaded = SessionStore::load(&path).await;
        assert_eq!(reloaded.current().await, Some(session()));
    }

    #[tokio::test]
    async fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::new(&path);
        store.set(session()).await.unwrap();
        store.clear().await.unwrap();

        assert!(!store.is_logged_in().await);
        assert!(!path.exists());
        assert!(SessionStore::load(&path).await.current().await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, b"{not json").await.unwrap();

        let store = SessionStore::load(&path).await;
        assert!(store.bearer().await.is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", session());
        assert!(!rendered.contains("tok-123"));
    }
}
