use serde::{Deserialize, Serialize};

use chapterhouse_core::{BranchId, ChapterId, DomainError, DomainResult};
use chapterhouse_roles::ScopeType;

/// Scope instance an assignment binds a role to.
///
/// At least one of chapter/branch must be set, consistent with the role's
/// scope type. This is the CHECK-constraint equivalent, validated before
/// authorization and before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentScope {
    pub chapter_id: Option<ChapterId>,
    pub branch_id: Option<BranchId>,
}

impl AssignmentScope {
    pub fn chapter(chapter_id: ChapterId) -> Self {
        Self {
            chapter_id: Some(chapter_id),
            branch_id: None,
        }
    }

    pub fn branch(branch_id: BranchId) -> Self {
        Self {
            chapter_id: None,
            branch_id: Some(branch_id),
        }
    }

    pub fn both(chapter_id: ChapterId, branch_id: BranchId) -> Self {
        Self {
            chapter_id: Some(chapter_id),
            branch_id: Some(branch_id),
        }
    }

    /// Enforce the scope-validity invariant against the role's scope type.
    pub fn validate_for(&self, scope_type: ScopeType) -> DomainResult<()> {
        match scope_type {
            ScopeType::Chapter => {
                if self.chapter_id.is_none() {
                    return Err(DomainError::validation(
                        "chapter-scoped role requires chapter_id",
                    ));
                }
                if self.branch_id.is_some() {
                    return Err(DomainError::validation(
                        "chapter-scoped role cannot carry branch_id",
                    ));
                }
            }
            ScopeType::Branch => {
                if self.branch_id.is_none() {
                    return Err(DomainError::validation(
                        "branch-scoped role requires branch_id",
                    ));
                }
                if self.chapter_id.is_some() {
                    return Err(DomainError::validation(
                        "branch-scoped role cannot carry chapter_id",
                    ));
                }
            }
            ScopeType::Both => {
                if self.chapter_id.is_none() && self.branch_id.is_none() {
                    return Err(DomainError::validation(
                        "assignment requires at least one of chapter_id/branch_id",
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn describe(&self) -> String {
        match (self.chapter_id, self.branch_id) {
            (Some(c), Some(b)) => format!("chapter {c}, branch {b}"),
            (Some(c), None) => format!("chapter {c}"),
            (None, Some(b)) => format!("branch {b}"),
            (None, None) => "no scope".to_string(),
        }
    }
}
