//! Who is signed in, what they may do, and which screens they can reach.

use std::fmt::{Display, Formatter};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity reported by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Identity {
    pub user_id: String,
    pub email: String,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Reads the role stored on a user record; anything but "admin" is a plain user.
    pub fn from_role_str(value: Option<&str>) -> Self {
        match value {
            Some("admin") => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role is fetched after sign-in; until then it is `Unknown`, never `User`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RoleStatus {
    #[default]
    Unknown,
    Resolved(Role),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub identity: Identity,
    pub role: RoleStatus,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            role: RoleStatus::Unknown,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }

    pub fn email(&self) -> &str {
        &self.identity.email
    }

    pub fn is_admin(&self) -> bool {
        self.role == RoleStatus::Resolved(Role::Admin)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// The auth provider has not reported yet.
    #[default]
    Initializing,
    SignedOut,
    SignedIn(Session),
}

impl SessionState {
    /// Applies one event from the auth-state stream.
    ///
    /// Returns the user id whose role must be looked up, if any. Re-reporting
    /// the signed-in user keeps an already resolved role.
    pub fn apply_auth_change(&mut self, identity: Option<Identity>) -> Option<String> {
        let Some(identity) = identity else {
            *self = SessionState::SignedOut;
            return None;
        };
        if let SessionState::SignedIn(session) = self {
            if session.identity == identity {
                return match session.role {
                    RoleStatus::Unknown => Some(identity.user_id),
                    RoleStatus::Resolved(_) => None,
                };
            }
        }
        let user_id = identity.user_id.clone();
        *self = SessionState::SignedIn(Session::new(identity));
        Some(user_id)
    }

    /// Records the looked-up role, unless `user_id` is no longer the one signed in.
    pub fn resolve_role(&mut self, user_id: &str, role: Role) -> bool {
        match self {
            SessionState::SignedIn(session) if session.user_id() == user_id => {
                let resolved = RoleStatus::Resolved(role);
                let changed = session.role != resolved;
                session.role = resolved;
                changed
            }
            _ => false,
        }
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::SignedIn(session) => Some(session),
            _ => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }

    pub fn screens(&self) -> ScreenSet {
        match self {
            SessionState::Initializing => ScreenSet::Loading,
            SessionState::SignedOut => ScreenSet::SignedOut,
            SessionState::SignedIn(_) => ScreenSet::SignedIn,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Login,
    Signup,
    Dashboard,
    TaskDetail,
}

/// The screens reachable in a session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenSet {
    /// Spinner only, shown until the first auth event arrives.
    Loading,
    SignedOut,
    SignedIn,
}

impl ScreenSet {
    pub fn screens(self) -> &'static [Screen] {
        match self {
            ScreenSet::Loading => &[],
            ScreenSet::SignedOut => &[Screen::Login, Screen::Signup],
            ScreenSet::SignedIn => &[Screen::Dashboard, Screen::TaskDetail],
        }
    }

    pub fn initial(self) -> Option<Screen> {
        self.screens().first().copied()
    }

    pub fn contains(self, screen: Screen) -> bool {
        self.screens().contains(&screen)
    }
}
