//! Drives the session state from the auth provider.

use crate::connectors::{AuthChanges, AuthProvider, RoleStore};
use crate::state::SessionHandle;
use crate::subscription::Subscription;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// How hard to try fetching a user's role before leaving it unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleLookupPolicy {
    pub attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RoleLookupPolicy {
    fn default() -> Self {
        Self {
            attempts: 1,
            retry_delay: Duration::from_millis(500),
        }
    }
}

pub struct SessionController;

impl SessionController {
    /// Listens to the auth-state stream for the lifetime of the returned handle.
    ///
    /// Every sign-in starts a role lookup. A newer auth event supersedes a
    /// lookup still in flight.
    pub fn start(
        auth: &dyn AuthProvider,
        roles: Arc<dyn RoleStore>,
        session: SessionHandle,
        policy: RoleLookupPolicy,
    ) -> Subscription {
        let changes = auth.auth_state_changes();
        Subscription::spawn("auth-listener", listen(changes, roles, session, policy))
    }
}

async fn listen(
    mut changes: AuthChanges,
    roles: Arc<dyn RoleStore>,
    session: SessionHandle,
    policy: RoleLookupPolicy,
) {
    let mut role_lookup: Option<Subscription> = None;
    while let Some(identity) = changes.next().await {
        match &identity {
            Some(identity) => info!(user_id = %identity.user_id, "Signed in"),
            None => info!("Signed out"),
        }
        let lookup = session.apply_auth_change(identity);
        if let Some(previous) = role_lookup.take() {
            previous.cancel().await;
        }
        if let Some(user_id) = lookup {
            role_lookup = Some(Subscription::spawn(
                "role-lookup",
                lookup_role(Arc::clone(&roles), session.clone(), user_id, policy),
            ));
        }
    }
}

async fn lookup_role(
    roles: Arc<dyn RoleStore>,
    session: SessionHandle,
    user_id: String,
    policy: RoleLookupPolicy,
) {
    let attempts = policy.attempts.max(1);
    for attempt in 1..=attempts {
        match roles.user_role(&user_id).await {
            Ok(role) => {
                session.resolve_role(&user_id, role);
                info!(user_id = %user_id, %role, "Resolved role");
                return;
            }
            Err(e) => {
                warn!(user_id = %user_id, attempt, error = %e, "Role lookup failed");
                if attempt < attempts {
                    tokio::time::sleep(policy.retry_delay).await;
                }
            }
        }
    }
    warn!(user_id = %user_id, "Role left unknown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::auth::MockAuthProvider;
    use crate::connectors::roles::MockRoleStore;
    use crate::connectors::BackendError;
    use futures::stream;
    use mockall::predicate::*;
    use taskdeck_core::{Identity, Role, RoleStatus, ScreenSet, SessionState};
    use tokio::sync::watch;

    fn alice() -> Identity {
        Identity::new("uid-alice", "alice@example.com")
    }

    fn auth_emitting(events: Vec<Option<Identity>>) -> MockAuthProvider {
        let mut auth = MockAuthProvider::new();
        auth.expect_auth_state_changes()
            .times(1)
            .returning(move || stream::iter(events.clone()).chain(stream::pending()).boxed());
        auth
    }

    async fn wait_for(
        rx: &mut watch::Receiver<SessionState>,
        predicate: impl FnMut(&SessionState) -> bool,
    ) -> SessionState {
        tokio::time::timeout(Duration::from_secs(1), rx.wait_for(predicate))
            .await
            .expect("timed out waiting for the session")
            .expect("session closed")
            .clone()
    }

    fn quick_retries(attempts: u32) -> RoleLookupPolicy {
        RoleLookupPolicy {
            attempts,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn null_first_event_routes_to_signed_out() {
        // Arrange
        let auth = auth_emitting(vec![None]);
        let roles = MockRoleStore::new();
        let session = SessionHandle::new();
        let mut rx = session.subscribe();

        // Act
        let _listener = SessionController::start(
            &auth,
            Arc::new(roles),
            session.clone(),
            RoleLookupPolicy::default(),
        );

        // Assert
        let state = wait_for(&mut rx, |s| *s != SessionState::Initializing).await;
        assert_eq!(state, SessionState::SignedOut);
        assert_eq!(state.screens(), ScreenSet::SignedOut);
    }

    #[tokio::test]
    async fn sign_in_resolves_role() {
        let auth = auth_emitting(vec![Some(alice())]);
        let mut roles = MockRoleStore::new();
        roles
            .expect_user_role()
            .with(eq("uid-alice"))
            .times(1)
            .returning(|_| Ok(Role::Admin));
        let session = SessionHandle::new();
        let mut rx = session.subscribe();

        let _listener =
            SessionController::start(&auth, Arc::new(roles), session.clone(), quick_retries(1));

        let state = wait_for(&mut rx, |s| {
            s.session().is_some_and(|s| s.role != RoleStatus::Unknown)
        })
        .await;
        assert!(state.session().unwrap().is_admin());
    }

    #[tokio::test]
    async fn failed_lookup_leaves_role_unknown() {
        let auth = auth_emitting(vec![Some(alice())]);
        let mut roles = MockRoleStore::new();
        roles
            .expect_user_role()
            .times(1)
            .returning(|_| Err(BackendError::Unavailable("offline".into())));
        let session = SessionHandle::new();
        let mut rx = session.subscribe();

        let _listener =
            SessionController::start(&auth, Arc::new(roles), session.clone(), quick_retries(1));
        let state = wait_for(&mut rx, |s| s.is_signed_in()).await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(state.screens(), ScreenSet::SignedIn);
        assert_eq!(
            session.current().session().map(|s| s.role),
            Some(RoleStatus::Unknown)
        );
    }

    #[tokio::test]
    async fn lookup_is_retried_up_to_the_limit() {
        let auth = auth_emitting(vec![Some(alice())]);
        let mut roles = MockRoleStore::new();
        let mut calls = 0;
        roles.expect_user_role().times(2).returning(move |_| {
            calls += 1;
            if calls == 1 {
                Err(BackendError::Unavailable("flaky".into()))
            } else {
                Ok(Role::User)
            }
        });
        let session = SessionHandle::new();
        let mut rx = session.subscribe();

        let _listener =
            SessionController::start(&auth, Arc::new(roles), session.clone(), quick_retries(3));

        let state = wait_for(&mut rx, |s| {
            s.session().is_some_and(|s| s.role != RoleStatus::Unknown)
        })
        .await;
        assert_eq!(
            state.session().unwrap().role,
            RoleStatus::Resolved(Role::User)
        );
    }

    #[tokio::test]
    async fn sign_out_after_sign_in_ends_signed_out() {
        let auth = auth_emitting(vec![Some(alice()), None]);
        let mut roles = MockRoleStore::new();
        roles.expect_user_role().returning(|_| Ok(Role::User));
        let session = SessionHandle::new();

        let listener =
            SessionController::start(&auth, Arc::new(roles), session.clone(), quick_retries(1));
        let mut rx = session.subscribe();
        let state = wait_for(&mut rx, |s| *s == SessionState::SignedOut).await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        listener.cancel().await;

        assert_eq!(state, SessionState::SignedOut);
        assert_eq!(session.current(), SessionState::SignedOut);
    }
}
