use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chatdeck::auth::{
    AuthError, AuthProvider, AuthSession, AuthUser, GoTrueAuthProvider, UserProfile,
    AUTH_SESSION_KEY,
};
use chatdeck::error::ChatError;
use chatdeck::storage::{KeyValueStore, MemoryKeyValueStore};
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "anon-key";

fn provider(server: &MockServer) -> (Arc<MemoryKeyValueStore>, GoTrueAuthProvider) {
    let storage = Arc::new(MemoryKeyValueStore::new());
    let auth = GoTrueAuthProvider::new(server.uri(), API_KEY, storage.clone());
    (storage, auth)
}

fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": refresh,
        "user": {
            "id": "user-1",
            "email": "ada@example.com",
            "user_metadata": { "display_name": "Ada" }
        }
    })
}

fn store_session(storage: &MemoryKeyValueStore, session: &AuthSession) {
    storage
        .set(AUTH_SESSION_KEY, &serde_json::to_string(session).unwrap())
        .unwrap();
}

fn stored_session(storage: &MemoryKeyValueStore) -> Option<AuthSession> {
    storage
        .get(AUTH_SESSION_KEY)
        .unwrap()
        .map(|raw| serde_json::from_str(&raw).unwrap())
}

fn expired_session(refresh_token: Option<&str>) -> AuthSession {
    AuthSession {
        access_token: "stale".to_string(),
        refresh_token: refresh_token.map(str::to_string),
        expires_at: Some(Utc::now() - Duration::minutes(5)),
        user: UserProfile {
            id: "user-1".to_string(),
            email: "ada@example.com".to_string(),
            display_name: Some("Ada".to_string()),
        },
    }
}

#[tokio::test]
async fn sign_in_stores_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(header("apikey", API_KEY))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "password": "hunter2"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-1", "refresh-1")))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, auth) = provider(&server);
    let session = auth
        .sign_in_with_password("ada@example.com", "hunter2")
        .await
        .expect("sign in");

    assert_eq!(session.access_token, "access-1");
    assert_eq!(session.refresh_token.as_deref(), Some("refresh-1"));
    assert!(session.expires_at.unwrap() > Utc::now());
    assert_eq!(session.user.display_name.as_deref(), Some("Ada"));
    assert_eq!(stored_session(&storage), Some(session));

    let user = auth.current_user().await.unwrap();
    assert_eq!(
        user,
        AuthUser::Authenticated {
            email: "ada@example.com".to_string(),
            display_name: Some("Ada".to_string()),
        }
    );
}

#[tokio::test]
async fn sign_in_with_wrong_password_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, auth) = provider(&server);
    let err = auth
        .sign_in_with_password("ada@example.com", "wrong")
        .await
        .unwrap_err();

    assert!(matches!(err, AuthError::InvalidCredentials(ref m) if m == "Invalid login credentials"));
    assert!(stored_session(&storage).is_none());
    assert_eq!(auth.current_user().await.unwrap(), AuthUser::Unauthenticated);
}

#[tokio::test]
async fn sign_in_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let (_storage, auth) = provider(&server);
    let err = auth.sign_in_with_password("ada@example.com", "x").await.unwrap_err();
    assert!(matches!(err, AuthError::RateLimited));
}

#[tokio::test]
async fn sign_up_without_confirmation_signs_in() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .and(header("apikey", API_KEY))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "data": { "display_name": "Ada" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-1", "refresh-1")))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, auth) = provider(&server);
    let profile = auth
        .sign_up("ada@example.com", "hunter2", "Ada")
        .await
        .expect("sign up");

    assert_eq!(profile.email, "ada@example.com");
    assert_eq!(profile.display_name.as_deref(), Some("Ada"));
    assert!(stored_session(&storage).is_some());
}

#[tokio::test]
async fn sign_up_pending_confirmation_stores_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "user-2",
            "email": "grace@example.com",
            "confirmation_sent_at": "2024-05-01T10:00:00Z",
            "user_metadata": { "display_name": "Grace" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, auth) = provider(&server);
    let profile = auth
        .sign_up("grace@example.com", "hunter2", "Grace")
        .await
        .expect("sign up");

    assert_eq!(profile.id, "user-2");
    assert_eq!(profile.display_name.as_deref(), Some("Grace"));
    assert!(stored_session(&storage).is_none());
    assert!(!auth.current_user().await.unwrap().is_authenticated());
}

#[tokio::test]
async fn sign_up_existing_user_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "code": 422,
            "error_code": "user_already_exists",
            "msg": "User already registered"
        })))
        .mount(&server)
        .await;

    let (_storage, auth) = provider(&server);
    let err = auth.sign_up("ada@example.com", "hunter2", "Ada").await.unwrap_err();
    match err {
        AuthError::Rejected { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "User already registered");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn expired_session_is_refreshed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_partial_json(json!({ "refresh_token": "refresh-old" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("access-2", "refresh-2")))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, auth) = provider(&server);
    store_session(&storage, &expired_session(Some("refresh-old")));

    let session = auth.get_session().await.unwrap().expect("refreshed session");
    assert_eq!(session.access_token, "access-2");
    assert_eq!(
        stored_session(&storage).map(|s| s.refresh_token),
        Some(Some("refresh-2".to_string()))
    );
}

#[tokio::test]
async fn failed_refresh_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Refresh Token Not Found"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, auth) = provider(&server);
    store_session(&storage, &expired_session(Some("revoked")));

    assert!(auth.get_session().await.unwrap().is_none());
    assert!(stored_session(&storage).is_none());
}

#[tokio::test]
async fn expired_session_without_refresh_token_is_dropped() {
    let server = MockServer::start().await;
    let (storage, auth) = provider(&server);
    store_session(&storage, &expired_session(None));

    assert_eq!(auth.current_user().await.unwrap(), AuthUser::Unauthenticated);
    assert!(stored_session(&storage).is_none());
}

#[tokio::test]
async fn malformed_stored_session_is_discarded() {
    let server = MockServer::start().await;
    let (storage, auth) = provider(&server);
    storage.set(AUTH_SESSION_KEY, "garbage").unwrap();

    assert!(auth.get_session().await.unwrap().is_none());
    assert!(storage.get(AUTH_SESSION_KEY).unwrap().is_none());
}

#[tokio::test]
async fn sign_out_revokes_remotely_and_clears() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer live-token"))
        .and(header("apikey", API_KEY))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, auth) = provider(&server);
    let mut session = expired_session(None);
    session.access_token = "live-token".to_string();
    session.expires_at = Some(Utc::now() + Duration::hours(1));
    store_session(&storage, &session);

    auth.sign_out().await.expect("sign out");
    assert!(stored_session(&storage).is_none());
}

#[tokio::test]
async fn sign_out_clears_locally_when_remote_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, auth) = provider(&server);
    let mut session = expired_session(None);
    session.expires_at = None;
    store_session(&storage, &session);

    auth.sign_out().await.expect("sign out");
    assert!(stored_session(&storage).is_none());
}

#[tokio::test]
async fn sign_out_without_session_skips_remote_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let (_storage, auth) = provider(&server);
    auth.sign_out().await.expect("sign out");
}

/// Storage that cannot be read but can still be cleared.
#[derive(Default)]
struct UnreadableStore {
    removals: AtomicUsize,
}

impl KeyValueStore for UnreadableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, ChatError> {
        Err(ChatError::Storage("permission denied".to_string()))
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), ChatError> {
        Ok(())
    }

    fn remove(&self, _key: &str) -> Result<(), ChatError> {
        self.removals.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn sign_out_clears_even_when_session_is_unreadable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let storage = Arc::new(UnreadableStore::default());
    let auth = GoTrueAuthProvider::new(server.uri(), API_KEY, storage.clone());

    auth.sign_out().await.expect("sign out");
    assert_eq!(storage.removals.load(Ordering::SeqCst), 1);
}
