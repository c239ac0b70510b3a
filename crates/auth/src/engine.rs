//! The authorization engine: a declarative rule table evaluated by one
//! generic matcher.
//!
//! Pure policy check: no IO, no clock reads, no side effects. Every
//! mutating ledger operation consults this before touching state, and a
//! denial therefore leaves no partial mutation behind.

use chapterhouse_core::{DomainError, DomainResult};
use chapterhouse_roles::RoleCapability;

use crate::grant::{EffectiveGrant, GrantScope};
use crate::operation::{Operation, OperationClass, TargetScope};

/// How a rule constrains the relationship between a grant's scope and an
/// operation's target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMatcher {
    /// Any target, any scope (super-authority).
    Any,
    /// Grant is chapter-scoped and the target is that chapter or a branch
    /// within it.
    SameChapter,
    /// Grant is branch-scoped and the target is exactly that branch.
    SameBranch,
    /// Grant's role category equals the category of the role the
    /// operation concerns (committee management).
    ManagedCategory,
}

/// Which operations a rule covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMatcher {
    Any,
    Classes(&'static [OperationClass]),
}

/// One row of the rule table.
///
/// Evaluation is first-match-allows over an ordered table; there are no
/// explicit deny rules, so absence of a match is a deny.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub capability: RoleCapability,
    pub scope: ScopeMatcher,
    pub operations: OperationMatcher,
}

/// The policy in force.
///
/// Branch-scope rules precede chapter-scope rules so that, for an
/// assignment carrying both scopes, the branch grant decides
/// branch-targeted operations.
pub const RULES: &[Rule] = &[
    // Chapter-wide super-authority: everything, everywhere.
    Rule {
        capability: RoleCapability::SuperAdmin,
        scope: ScopeMatcher::Any,
        operations: OperationMatcher::Any,
    },
    // Branch leadership: membership administration in its own branch.
    Rule {
        capability: RoleCapability::BranchAdmin,
        scope: ScopeMatcher::SameBranch,
        operations: OperationMatcher::Classes(&[OperationClass::MembershipAdmin]),
    },
    // Chapter officers: membership, assignment, and hierarchy
    // administration across their chapter.
    Rule {
        capability: RoleCapability::ChapterOfficer,
        scope: ScopeMatcher::SameChapter,
        operations: OperationMatcher::Classes(&[
            OperationClass::MembershipAdmin,
            OperationClass::AssignmentAdmin,
            OperationClass::OrgAdmin,
        ]),
    },
    // Committee managers: assignment and catalog operations for roles in
    // the category they manage, regardless of organizational scope.
    Rule {
        capability: RoleCapability::CommitteeManager,
        scope: ScopeMatcher::ManagedCategory,
        operations: OperationMatcher::Classes(&[
            OperationClass::AssignmentAdmin,
            OperationClass::CatalogAdmin,
        ]),
    },
];

/// Outcome of an authorization check, with enough context to log or
/// render a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allowed {
        /// Capability of the grant that matched.
        granted_by: RoleCapability,
    },
    Denied,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

fn scope_matches(matcher: ScopeMatcher, grant: &EffectiveGrant, operation: &Operation) -> bool {
    match matcher {
        ScopeMatcher::Any => true,
        ScopeMatcher::SameChapter => match (grant.scope, operation.target) {
            (GrantScope::Chapter(granted), TargetScope::Chapter(target)) => granted == target,
            (GrantScope::Chapter(granted), TargetScope::Branch { chapter_id, .. }) => {
                granted == chapter_id
            }
            _ => false,
        },
        ScopeMatcher::SameBranch => match (grant.scope, operation.target) {
            (GrantScope::Branch(granted), TargetScope::Branch { branch_id, .. }) => {
                granted == branch_id
            }
            _ => false,
        },
        ScopeMatcher::ManagedCategory => match (grant.category_id, operation.role_category) {
            (Some(managed), Some(target)) => managed == target,
            _ => false,
        },
    }
}

fn operations_match(matcher: OperationMatcher, operation: &Operation) -> bool {
    match matcher {
        OperationMatcher::Any => true,
        OperationMatcher::Classes(classes) => classes.contains(&operation.kind.class()),
    }
}

/// Evaluate the rule table for a set of effective grants.
///
/// Deny-by-default: zero grants, or grants none of which satisfy a rule,
/// yield `Decision::Denied`.
pub fn decide(grants: &[EffectiveGrant], operation: &Operation) -> Decision {
    for rule in RULES {
        for grant in grants {
            if grant.capability != rule.capability {
                continue;
            }
            if !scope_matches(rule.scope, grant, operation) {
                continue;
            }
            if !operations_match(rule.operations, operation) {
                continue;
            }
            return Decision::Allowed {
                granted_by: grant.capability,
            };
        }
    }
    Decision::Denied
}

/// Check authorization, mapping a denial to the typed domain error.
///
/// The error carries the rejected operation and target scope verbatim;
/// callers must surface it as-is, never downgrade it.
pub fn authorize(grants: &[EffectiveGrant], operation: &Operation) -> DomainResult<()> {
    match decide(grants, operation) {
        Decision::Allowed { .. } => Ok(()),
        Decision::Denied => Err(DomainError::forbidden(
            operation.kind.as_str(),
            operation.target.describe(),
        )),
    }
}
