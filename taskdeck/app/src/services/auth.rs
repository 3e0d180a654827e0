use crate::connectors::storage::{PUSH_TOKEN_KEY, USER_EMAIL_KEY};
use crate::connectors::{AuthProvider, BackendError, DocumentStore, KeyValueStore, PushMessaging};
use crate::error::AppError;
use crate::services::InFlight;
use crate::wire;
use chrono::Utc;
use std::sync::Arc;
use taskdeck_core::Identity;
use taskdeck_core::validation::require_credentials;
use tracing::{info, warn};

/// Login, signup and logout.
///
/// The session itself only changes through the auth-state stream; these
/// calls just ask the provider.
pub struct AuthService {
    auth: Arc<dyn AuthProvider>,
    documents: Arc<dyn DocumentStore>,
    push: Arc<dyn PushMessaging>,
    cache: Arc<dyn KeyValueStore>,
    users_collection: String,
    in_flight: InFlight,
}

impl AuthService {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        documents: Arc<dyn DocumentStore>,
        push: Arc<dyn PushMessaging>,
        cache: Arc<dyn KeyValueStore>,
        users_collection: impl Into<String>,
    ) -> Self {
        Self {
            auth,
            documents,
            push,
            cache,
            users_collection: users_collection.into(),
            in_flight: InFlight::default(),
        }
    }

    #[tracing::instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        require_credentials(email, password)?;
        let _guard = self.in_flight.begin()?;
        let identity = self.auth.sign_in(email, password).await?;
        info!(user_id = %identity.user_id, "Signed in");
        self.remember(USER_EMAIL_KEY, &identity.email);
        Ok(identity)
    }

    /// Creates the account, then registers the device for push if allowed.
    #[tracing::instrument(skip(self, password))]
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, AppError> {
        require_credentials(email, password)?;
        let _guard = self.in_flight.begin()?;
        let identity = self.auth.sign_up(email, password).await?;
        info!(user_id = %identity.user_id, "Account created");
        self.register_for_push(&identity).await?;
        Ok(identity)
    }

    #[tracing::instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.auth.sign_out().await?;
        Ok(())
    }

    /// The email that last signed in on this device.
    pub fn last_email(&self) -> Option<String> {
        self.cache.get(USER_EMAIL_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "Cannot read cached email");
            None
        })
    }

    async fn register_for_push(&self, identity: &Identity) -> Result<(), BackendError> {
        let permission = self.push.request_permission().await?;
        if !permission.allows_delivery() {
            warn!(?permission, "Push permission not granted, skipping registration");
            return Ok(());
        }
        let token = self.push.get_token().await?;
        self.remember(PUSH_TOKEN_KEY, &token);
        self.documents
            .set_record(
                &self.users_collection,
                &identity.user_id,
                wire::user_fields(&identity.email, &token, Utc::now()),
            )
            .await?;
        info!(user_id = %identity.user_id, "Saved user record and push token");
        Ok(())
    }

    fn remember(&self, key: &str, value: &str) {
        if let Err(e) = self.cache.set(key, value) {
            warn!(key, error = %e, "Cannot write local cache");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::auth::MockAuthProvider;
    use crate::connectors::documents::MockDocumentStore;
    use crate::connectors::push::MockPushMessaging;
    use crate::connectors::storage::MockKeyValueStore;
    use crate::connectors::{AuthError, MemoryKeyValueStore, PushPermission, StorageError};
    use mockall::predicate::*;
    use taskdeck_core::ValidationError;

    fn alice() -> Identity {
        Identity::new("uid-alice", "alice@example.com")
    }

    struct Mocks {
        auth: MockAuthProvider,
        documents: MockDocumentStore,
        push: MockPushMessaging,
        cache: Arc<MemoryKeyValueStore>,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                auth: MockAuthProvider::new(),
                documents: MockDocumentStore::new(),
                push: MockPushMessaging::new(),
                cache: Arc::new(MemoryKeyValueStore::new()),
            }
        }

        fn service(self) -> (AuthService, Arc<MemoryKeyValueStore>) {
            let cache = Arc::clone(&self.cache);
            let service = AuthService::new(
                Arc::new(self.auth),
                Arc::new(self.documents),
                Arc::new(self.push),
                self.cache,
                "users",
            );
            (service, cache)
        }
    }

    #[tokio::test]
    async fn empty_credentials_fail_without_calling_the_provider() {
        // Arrange: no expectations, so any provider call panics.
        let (service, _) = Mocks::new().service();

        // Act
        let sign_in = service.sign_in("", "secret").await;
        let sign_up = service.sign_up("alice@example.com", "").await;

        // Assert
        assert_eq!(
            sign_in,
            Err(AppError::Validation(ValidationError::MissingCredentials))
        );
        assert_eq!(
            sign_up,
            Err(AppError::Validation(ValidationError::MissingCredentials))
        );
    }

    #[tokio::test]
    async fn sign_in_caches_email() {
        let mut mocks = Mocks::new();
        mocks
            .auth
            .expect_sign_in()
            .with(eq("alice@example.com"), eq("secret"))
            .times(1)
            .returning(|_, _| Ok(alice()));
        let (service, cache) = mocks.service();

        let identity = service.sign_in("alice@example.com", "secret").await;

        assert_eq!(identity, Ok(alice()));
        assert_eq!(
            cache.get(USER_EMAIL_KEY).unwrap().as_deref(),
            Some("alice@example.com")
        );
        assert_eq!(service.last_email().as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn rejected_sign_in_is_an_auth_error_and_caches_nothing() {
        let mut mocks = Mocks::new();
        mocks
            .auth
            .expect_sign_in()
            .returning(|_, _| Err(AuthError::InvalidCredentials));
        let (service, cache) = mocks.service();

        let result = service.sign_in("alice@example.com", "wrong").await;

        assert_eq!(result, Err(AppError::Auth(AuthError::InvalidCredentials)));
        assert_eq!(cache.get(USER_EMAIL_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn cache_failure_does_not_fail_sign_in() {
        let mut auth = MockAuthProvider::new();
        auth.expect_sign_in().returning(|_, _| Ok(alice()));
        let mut cache = MockKeyValueStore::new();
        cache
            .expect_set()
            .times(1)
            .returning(|_, _| Err(StorageError::Io(std::io::Error::other("disk full"))));
        let service = AuthService::new(
            Arc::new(auth),
            Arc::new(MockDocumentStore::new()),
            Arc::new(MockPushMessaging::new()),
            Arc::new(cache),
            "users",
        );

        let result = service.sign_in("alice@example.com", "secret").await;

        assert_eq!(result, Ok(alice()));
    }

    #[tokio::test]
    async fn sign_up_with_permission_saves_user_record_and_token() {
        // Arrange
        let mut mocks = Mocks::new();
        mocks
            .auth
            .expect_sign_up()
            .times(1)
            .returning(|_, _| Ok(alice()));
        mocks
            .push
            .expect_request_permission()
            .times(1)
            .returning(|| Ok(PushPermission::Provisional));
        mocks
            .push
            .expect_get_token()
            .times(1)
            .returning(|| Ok("token-123".to_string()));
        mocks
            .documents
            .expect_set_record()
            .withf(|collection, id, fields| {
                collection == "users"
                    && id == "uid-alice"
                    && fields.get(wire::EMAIL).and_then(|v| v.as_str()) == Some("alice@example.com")
                    && fields.get(wire::PUSH_TOKEN).and_then(|v| v.as_str()) == Some("token-123")
                    && fields.contains_key(wire::CREATED_AT)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let (service, cache) = mocks.service();

        // Act
        let result = service.sign_up("alice@example.com", "secret").await;

        // Assert
        assert_eq!(result, Ok(alice()));
        assert_eq!(
            cache.get(PUSH_TOKEN_KEY).unwrap().as_deref(),
            Some("token-123")
        );
    }

    #[tokio::test]
    async fn sign_up_without_permission_skips_registration() {
        let mut mocks = Mocks::new();
        mocks.auth.expect_sign_up().returning(|_, _| Ok(alice()));
        mocks
            .push
            .expect_request_permission()
            .returning(|| Ok(PushPermission::Denied));
        let (service, cache) = mocks.service();

        let result = service.sign_up("alice@example.com", "secret").await;

        assert_eq!(result, Ok(alice()));
        assert_eq!(cache.get(PUSH_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_account_is_an_auth_error() {
        let mut mocks = Mocks::new();
        mocks
            .auth
            .expect_sign_up()
            .returning(|_, _| Err(AuthError::EmailInUse));
        let (service, _) = mocks.service();

        let result = service.sign_up("alice@example.com", "secret").await;

        assert_eq!(result, Err(AppError::Auth(AuthError::EmailInUse)));
    }

    #[tokio::test]
    async fn failed_user_record_write_is_a_backend_error() {
        let mut mocks = Mocks::new();
        mocks.auth.expect_sign_up().returning(|_, _| Ok(alice()));
        mocks
            .push
            .expect_request_permission()
            .returning(|| Ok(PushPermission::Granted));
        mocks
            .push
            .expect_get_token()
            .returning(|| Ok("token-123".to_string()));
        mocks
            .documents
            .expect_set_record()
            .returning(|_, _, _| Err(BackendError::PermissionDenied("users".into())));
        let (service, _) = mocks.service();

        let result = service.sign_up("alice@example.com", "secret").await;

        assert_eq!(
            result,
            Err(AppError::Backend(BackendError::PermissionDenied(
                "users".into()
            )))
        );
    }

    #[tokio::test]
    async fn sign_out_asks_the_provider() {
        let mut mocks = Mocks::new();
        mocks.auth.expect_sign_out().times(1).returning(|| Ok(()));
        let (service, _) = mocks.service();

        assert_eq!(service.sign_out().await, Ok(()));
    }
}
