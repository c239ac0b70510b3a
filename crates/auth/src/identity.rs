use chapterhouse_core::{DomainError, DomainResult, UserId};

/// Contract consumed from the external identity provider.
///
/// Credential storage, token issuance and refresh all live outside the
/// core; all it needs is a stable actor id per request. Actor identity is
/// always passed explicitly into core calls — there is no ambient
/// "current user" global.
pub trait IdentityProvider: Send + Sync {
    /// The authenticated actor for the current request, if any.
    fn current_actor(&self) -> Option<UserId>;
}

/// Resolve the actor or fail before any rule evaluation happens.
pub fn require_actor(provider: &dyn IdentityProvider) -> DomainResult<UserId> {
    provider
        .current_actor()
        .ok_or_else(|| DomainError::forbidden("authenticate", "organization"))
}

/// Fixed-identity provider for tests and trusted internal callers.
#[derive(Debug, Clone, Copy)]
pub struct StaticIdentity(pub Option<UserId>);

impl IdentityProvider for StaticIdentity {
    fn current_actor(&self) -> Option<UserId> {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthenticated_is_denied_before_rules() {
        let err = require_actor(&StaticIdentity(None)).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden { .. }));
    }

    #[test]
    fn authenticated_actor_passes_through() {
        let actor = UserId::new();
        assert_eq!(require_actor(&StaticIdentity(Some(actor))).unwrap(), actor);
    }
}
