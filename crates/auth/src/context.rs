use usergate_core::UserId;

/// Identity proven by a bearer token.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct UserIdentity {
    id: UserId,
}

impl UserIdentity {
    pub fn new(id: UserId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> UserId {
        self.id
    }
}

/// Per-request authentication result (identity + derived privilege).
///
/// Built once by the authenticator and carried as a typed request extension;
/// handlers read it but never mutate it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestContext {
    identity: UserIdentity,
    is_admin: bool,
}

impl RequestContext {
    /// Derive the context for `identity`; privilege is `identity == admin_id`.
    pub fn derive(identity: UserIdentity, admin_id: UserId) -> Self {
        Self {
            identity,
            is_admin: identity.id() == admin_id,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.identity.id()
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}
