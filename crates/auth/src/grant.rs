use serde::{Deserialize, Serialize};

use chapterhouse_core::{BranchId, CategoryId, ChapterId, RoleId};
use chapterhouse_roles::RoleCapability;

/// The scope a single grant applies to.
///
/// An assignment carrying both chapter and branch ids is split into one
/// grant per populated field; branch grants are evaluated first, so branch
/// scope wins for branch-targeted operations (documented tie-break).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrantScope {
    Chapter(ChapterId),
    Branch(BranchId),
}

/// One currently-effective capability a user holds.
///
/// Derived fresh from the assignment ledger + role catalog on every
/// authorization decision; never cached across requests, so a revocation
/// is visible to the very next check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveGrant {
    pub role_id: RoleId,
    pub capability: RoleCapability,
    /// Category the role belongs to; what a `CommitteeManager` manages.
    pub category_id: Option<CategoryId>,
    pub scope: GrantScope,
}

impl EffectiveGrant {
    /// Derive grants from an assignment's role and scope fields.
    ///
    /// Yields one grant per populated scope field, branch first.
    pub fn derive(
        role_id: RoleId,
        capability: RoleCapability,
        category_id: Option<CategoryId>,
        chapter_id: Option<ChapterId>,
        branch_id: Option<BranchId>,
    ) -> Vec<EffectiveGrant> {
        let mut grants = Vec::with_capacity(2);
        if let Some(branch_id) = branch_id {
            grants.push(EffectiveGrant {
                role_id,
                capability,
                category_id,
                scope: GrantScope::Branch(branch_id),
            });
        }
        if let Some(chapter_id) = chapter_id {
            grants.push(EffectiveGrant {
                role_id,
                capability,
                category_id,
                scope: GrantScope::Chapter(chapter_id),
            });
        }
        grants
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_scopes_yield_two_grants_branch_first() {
        let grants = EffectiveGrant::derive(
            RoleId::new(),
            RoleCapability::BranchAdmin,
            None,
            Some(ChapterId::new()),
            Some(BranchId::new()),
        );
        assert_eq!(grants.len(), 2);
        assert!(matches!(grants[0].scope, GrantScope::Branch(_)));
        assert!(matches!(grants[1].scope, GrantScope::Chapter(_)));
    }

    #[test]
    fn empty_scope_yields_no_grants() {
        let grants = EffectiveGrant::derive(
            RoleId::new(),
            RoleCapability::SuperAdmin,
            None,
            None,
            None,
        );
        assert!(grants.is_empty());
    }
}
