use tracing::info;

use crate::error::IdentityError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub email: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuthProvider {
    Google,
    Facebook,
}

impl AuthProvider {
    pub const ALL: [Self; 2] = [Self::Google, Self::Facebook];

    pub fn label(self) -> &'static str {
        match self {
            AuthProvider::Google => "Google",
            AuthProvider::Facebook => "Facebook",
        }
    }
}

/// Session presence as seen by the UI. Nothing in the image pipeline depends on it.
pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<User>;
    fn begin_sign_in(&self, provider: AuthProvider) -> Result<(), IdentityError>;
    fn end_session(&self) -> Result<(), IdentityError>;
}

/// Used when no identity backend is wired in: nobody is ever signed in.
#[derive(Default)]
pub struct OfflineIdentity;

impl IdentityProvider for OfflineIdentity {
    fn current_user(&self) -> Option<User> {
        None
    }

    fn begin_sign_in(&self, provider: AuthProvider) -> Result<(), IdentityError> {
        info!(provider = provider.label(), "sign-in requested without an identity backend");
        Err(IdentityError::Unavailable)
    }

    fn end_session(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}
