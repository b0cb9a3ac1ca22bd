//! Caller identity, as reported by the host's auth layer

use async_trait::async_trait;

/// Signed-in marketplace user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserIdentity {
    pub user_id: i64,
    /// Bearer token for the marketplace API.
    pub bearer_token: String,
}

impl UserIdentity {
    pub fn new(user_id: i64, bearer_token: impl Into<String>) -> Self {
        Self {
            user_id,
            bearer_token: bearer_token.into(),
        }
    }
}

/// Read-only view of the host's authentication state.
///
/// The booking core never performs a login; it asks who the caller is
/// right before a submission and treats `None` as signed out.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_identity(&self) -> Option<UserIdentity>;
}
