use motorpool_core::UserId;

/// Principal context for a request.
///
/// Token verification is delegated upstream; by the time a request reaches a
/// handler the principal is a pre-verified user id. Shop-level authorization
/// happens in the services, not here.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
}

impl PrincipalContext {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}
