use thiserror::Error;

use motorpool_auth::AccessError;
use motorpool_core::DomainError;
use motorpool_infra::StoreError;

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-layer error.
///
/// Invite redemption failures stay distinguishable (invalid vs. expired vs.
/// exhausted vs. already-a-member) so the HTTP layer can render an accurate
/// message for each.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// An authorization decision said no; surfaced verbatim.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The presented invite code does not resolve to a live code.
    /// Deactivated codes deliberately land here too: outsiders learn
    /// nothing about dead codes.
    #[error("invite code is invalid")]
    InviteCodeInvalid,

    #[error("invite code has expired")]
    InviteCodeExpired,

    /// Every use the code carried has been consumed.
    #[error("invite code has no remaining uses")]
    InviteCodeExhausted,

    #[error("user is already a member of this shop")]
    AlreadyMember,

    #[error("item not found")]
    ItemNotFound,

    /// Code generation kept colliding until the retry budget ran out.
    #[error("could not generate a unique invite code")]
    InviteCodeGeneration,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Validation(err.to_string())
    }
}
