//! Login, registration and logout

use std::sync::Arc;
use tracing::info;

use crate::api::AuthBackend;
use crate::errors::{AppError, AppResult};
use crate::models::{AuthResponse, Credentials, Session};
use crate::session::SessionStore;

#[derive(Clone)]
pub struct AuthService {
    backend: Arc<dyn AuthBackend>,
    session: SessionStore,
}

impl AuthService {
    pub fn new(backend: Arc<dyn AuthBackend>, session: SessionStore) -> Self {
        Self { backend, session }
    }

    pub async fn login(&self, username: &str, password: &str) -> AppResult<Session> {
        let credentials = Self::credentials(username, password)?;
        let response = self.backend.login(&credentials).await?;
        self.establish(credentials, response).await
    }

    pub async fn register(&self, username: &str, password: &str) -> AppResult<Session> {
        let credentials = Self::credentials(username, password)?;
        let response = self.backend.register(&credentials).await?;
        info!("Registered account {}", credentials.username);
        self.establish(credentials, response).await
    }

    pub async fn logout(&self) -> AppResult<()> {
        self.session.clear().await
    }

    pub async fn current_session(&self) -> Option<Session> {
        self.session.current().await
    }

    fn credentials(username: &str, password: &str) -> AppResult<Credentials> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AppError::validation("Please enter both username and password"));
        }
        Ok(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    async fn establish(&self, credentials: Credentials, response: AuthResponse) -> AppResult<Session> {
        if response.token.trim().is_empty() {
            return Err(AppError::internal("Server returned an empty token"));
        }
        let session = Session {
            username: response.username.unwrap_or(credentials.username),
            token: response.token,
        };
        self.session.set(session.clone()).await?;
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ApiError, ApiResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeAuth {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuthBackend for FakeAuth {
        async fn login(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if credentials.password != "correct horse" {
                return Err(ApiError::Status {
                    status: 401,
                    endpoint: "/login".to_string(),
                    message: "Invalid credentials".to_string(),
                });
            }
            Ok(AuthResponse {
                token: "tok-abc".to_string(),
                username: None,
            })
        }

        async fn register(&self, credentials: &Credentials) -> ApiResult<AuthResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AuthResponse {
                token: "tok-new".to_string(),
                username: Some(credentials.username.clone()),
            })
        }
    }

    fn service(dir: &std::path::Path, backend: Arc<FakeAuth>) -> AuthService {
        AuthService::new(backend, SessionStore::new(dir.join("session.json")))
    }

    #[tokio::test]
    async fn test_login_stores_session() {
        let dir = tempfile::tempdir().unwrap();
        let auth = service(dir.path(), Arc::new(FakeAuth::default()));

        let session = auth.login("mochi_owner", "correct horse").await.unwrap();
        assert_eq!(session.username, "mochi_owner");
        assert_eq!(auth.current_session().await, Some(session));
        assert!(dir.path().join("session.json").exists());

        auth.logout().await.unwrap();
        assert!(auth.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_logged_out() {
        let dir = tempfile::tempdir().unwrap();
        let auth = service(dir.path(), Arc::new(FakeAuth::default()));

        let err = auth.login("mochi_owner", "wrong").await.unwrap_err();
        assert!(matches!(err, AppError::Api(ApiError::Status { status: 401, .. })));
        assert!(auth.current_session().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_fields_make_no_call() {
        let dir = tempfile::tempdir().unwrap();
        let backend = Arc::new(FakeAuth::default());
        let auth = service(dir.path(), backend.clone());

        assert!(auth.register("  ", "pw").await.is_err());
        assert!(auth.login("someone", "").await.is_err());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }
}
