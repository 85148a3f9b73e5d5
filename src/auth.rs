use async_trait::async_trait;
use thiserror::Error;

use crate::store::types::UserRole;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account already registered: {0}")]
    AlreadyRegistered(String),
    #[error("identity provider failure: {0}")]
    Provider(String),
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
}

#[derive(Debug, Clone)]
pub struct NewUserProfile {
    pub display_name: String,
    pub university: String,
    pub graduation_year: u16,
}

/// Capability interface over the external identity provider. The core only
/// calls [`IdentityProvider::current_user`]; `uid` is the tenant key for all
/// session records.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn register(
        &self,
        email: &str,
        password: &str,
        profile: NewUserProfile,
    ) -> Result<String, AuthError>;

    async fn login(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    async fn logout(&self) -> Result<(), AuthError>;

    async fn reset_password(&self, email: &str) -> Result<(), AuthError>;

    async fn current_user(&self) -> Option<AuthUser>;
}
