use core::str::FromStr;

use thiserror::Error;

use usergate_core::UserId;

use crate::context::RequestContext;

/// Which shape of route the handler is serving.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TargetRoute {
    /// Target is named by the request path (`/users/:id`).
    Explicit,
    /// Target is implicitly the caller (`/me`).
    OwnProfile,
}

/// Who may use the explicit-target routes.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ExplicitTargetPolicy {
    /// Only the admin identity. A non-admin naming its own id is still denied.
    #[default]
    AdminOnly,
    /// The admin identity, or a caller naming itself.
    AdminOrSelf,
}

impl FromStr for ExplicitTargetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin-only" | "admin_only" => Ok(Self::AdminOnly),
            "admin-or-self" | "admin_or_self" => Ok(Self::AdminOrSelf),
            other => Err(format!(
                "unknown explicit target policy '{other}' (expected admin-only or admin-or-self)"
            )),
        }
    }
}

/// How access to the target was obtained.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessKind {
    SelfAccess,
    AdminOverride,
}

/// The single user id a downstream store operation may touch.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub target: UserId,
    pub access: AccessKind,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden")]
    Forbidden,

    #[error("invalid target: {0}")]
    InvalidTarget(String),
}

/// Resolve the target of a user-scoped operation.
///
/// - No IO
/// - No panics
/// - `requested` is the raw path id; ignored for [`TargetRoute::OwnProfile`]
pub fn authorize_self_or_admin(
    ctx: &RequestContext,
    route: TargetRoute,
    requested: Option<&str>,
    policy: ExplicitTargetPolicy,
) -> Result<ResolvedTarget, AuthzError> {
    let caller = ctx.user_id();

    match route {
        TargetRoute::OwnProfile => Ok(ResolvedTarget {
            target: caller,
            access: AccessKind::SelfAccess,
        }),
        TargetRoute::Explicit => {
            // Non-admins learn nothing about the id under the strict policy.
            if !ctx.is_admin() && policy == ExplicitTargetPolicy::AdminOnly {
                return Err(AuthzError::Forbidden);
            }

            let raw = requested.ok_or_else(|| AuthzError::InvalidTarget("missing id".into()))?;
            let target =
                UserId::from_str(raw).map_err(|e| AuthzError::InvalidTarget(e.to_string()))?;

            let access = if target == caller {
                AccessKind::SelfAccess
            } else if ctx.is_admin() {
                AccessKind::AdminOverride
            } else {
                return Err(AuthzError::Forbidden);
            };

            Ok(ResolvedTarget { target, access })
        }
    }
}

/// Gate for collection-wide operations (listing all users).
pub fn require_admin(ctx: &RequestContext) -> Result<(), AuthzError> {
    if ctx.is_admin() {
        Ok(())
    } else {
        Err(AuthzError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::UserIdentity;

    const ADMIN: u64 = 1;

    fn ctx(raw: u64) -> RequestContext {
        RequestContext::derive(
            UserIdentity::new(UserId::new(raw).unwrap()),
            UserId::new(ADMIN).unwrap(),
        )
    }

    fn uid(raw: u64) -> UserId {
        UserId::new(raw).unwrap()
    }

    #[test]
    fn non_admin_explicit_self_is_denied_by_default() {
        let res = authorize_self_or_admin(
            &ctx(7),
            TargetRoute::Explicit,
            Some("7"),
            ExplicitTargetPolicy::default(),
        );
        assert_eq!(res, Err(AuthzError::Forbidden));
    }

    #[test]
    fn own_profile_resolves_to_caller() {
        let res = authorize_self_or_admin(
            &ctx(7),
            TargetRoute::OwnProfile,
            None,
            ExplicitTargetPolicy::AdminOnly,
        )
        .unwrap();
        assert_eq!(res.target, uid(7));
        assert_eq!(res.access, AccessKind::SelfAccess);
    }

    #[test]
    fn own_profile_ignores_path_and_admin_flag() {
        let res = authorize_self_or_admin(
            &ctx(ADMIN),
            TargetRoute::OwnProfile,
            Some("42"),
            ExplicitTargetPolicy::AdminOnly,
        )
        .unwrap();
        assert_eq!(res.target, uid(ADMIN));
    }

    #[test]
    fn admin_overrides_explicit_target() {
        let res = authorize_self_or_admin(
            &ctx(ADMIN),
            TargetRoute::Explicit,
            Some("42"),
            ExplicitTargetPolicy::AdminOnly,
        )
        .unwrap();
        assert_eq!(res.target, uid(42));
        assert_eq!(res.access, AccessKind::AdminOverride);
    }

    #[test]
    fn non_admin_never_learns_target_validity_under_strict_policy() {
        let res = authorize_self_or_admin(
            &ctx(7),
            TargetRoute::Explicit,
            Some("not-a-number"),
            ExplicitTargetPolicy::AdminOnly,
        );
        assert_eq!(res, Err(AuthzError::Forbidden));
    }

    #[test]
    fn admin_with_bad_target_gets_invalid_target() {
        for raw in [Some("abc"), Some("0"), Some("-1"), Some("18446744073709551615"), None] {
            let res = authorize_self_or_admin(
                &ctx(ADMIN),
                TargetRoute::Explicit,
                raw,
                ExplicitTargetPolicy::AdminOnly,
            );
            assert!(matches!(res, Err(AuthzError::InvalidTarget(_))), "{raw:?}");
        }
    }

    #[test]
    fn lenient_policy_allows_self_but_not_others() {
        let policy = ExplicitTargetPolicy::AdminOrSelf;

        let res = authorize_self_or_admin(&ctx(7), TargetRoute::Explicit, Some("7"), policy).unwrap();
        assert_eq!(res.target, uid(7));
        assert_eq!(res.access, AccessKind::SelfAccess);

        let res = authorize_self_or_admin(&ctx(7), TargetRoute::Explicit, Some("8"), policy);
        assert_eq!(res, Err(AuthzError::Forbidden));
    }

    #[test]
    fn listing_requires_admin() {
        assert!(require_admin(&ctx(ADMIN)).is_ok());
        assert_eq!(require_admin(&ctx(5)), Err(AuthzError::Forbidden));
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!("admin-only".parse::<ExplicitTargetPolicy>(), Ok(ExplicitTargetPolicy::AdminOnly));
        assert_eq!("ADMIN_OR_SELF".parse::<ExplicitTargetPolicy>(), Ok(ExplicitTargetPolicy::AdminOrSelf));
        assert!("anyone".parse::<ExplicitTargetPolicy>().is_err());
    }
}
