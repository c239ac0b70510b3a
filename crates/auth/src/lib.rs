//! `chapterhouse-auth` — the scoped-role authorization engine.
//!
//! Pure policy evaluation, decoupled from storage and transport: the
//! ledgers derive [`EffectiveGrant`]s from a user's currently-effective
//! assignments and ask [`authorize`] whether an [`Operation`] is allowed.
//! First matching rule in the ordered table allows; no match is a deny.

pub mod engine;
pub mod grant;
pub mod identity;
pub mod operation;

pub use engine::{authorize, decide, Decision, OperationMatcher, Rule, ScopeMatcher, RULES};
pub use grant::{EffectiveGrant, GrantScope};
pub use identity::{require_actor, IdentityProvider, StaticIdentity};
pub use operation::{Operation, OperationClass, OperationKind, TargetScope};
