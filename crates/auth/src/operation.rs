use serde::{Deserialize, Serialize};

use chapterhouse_core::{BranchId, CategoryId, ChapterId};

/// What an operation targets, for scope matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetScope {
    /// A whole chapter.
    Chapter(ChapterId),
    /// A branch; carries the owning chapter so chapter-scoped grants can
    /// cover branch operations.
    Branch {
        chapter_id: ChapterId,
        branch_id: BranchId,
    },
    /// The role catalog (no organizational scope).
    Catalog,
    /// Organization-wide; only super-authority reaches this.
    Global,
}

impl TargetScope {
    pub fn describe(&self) -> String {
        match self {
            TargetScope::Chapter(c) => format!("chapter {c}"),
            TargetScope::Branch { branch_id, .. } => format!("branch {branch_id}"),
            TargetScope::Catalog => "role catalog".to_string(),
            TargetScope::Global => "organization".to_string(),
        }
    }
}

/// Coarse operation class the rule table matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationClass {
    /// Membership lifecycle: approve, suspend, lapse, reactivate,
    /// issue card, view members.
    MembershipAdmin,
    /// Role assignment lifecycle: assign, revoke.
    AssignmentAdmin,
    /// Organization hierarchy: create branch, change branch status,
    /// retire branch.
    OrgAdmin,
    /// Role catalog: define, deactivate.
    CatalogAdmin,
    /// Sensitive governance: rename role, create chapter.
    Governance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    ApproveMembership,
    SuspendMembership,
    LapseMembership,
    ReactivateMembership,
    IssueCard,
    ViewMembers,
    AssignRole,
    RevokeAssignment,
    AmendAssignmentNotes,
    CreateBranch,
    UpdateBranchStatus,
    RetireBranch,
    CreateChapter,
    UpdateChapterStatus,
    TeardownChapter,
    DefineRole,
    RenameRole,
    DeactivateRole,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::ApproveMembership => "membership.approve",
            OperationKind::SuspendMembership => "membership.suspend",
            OperationKind::LapseMembership => "membership.lapse",
            OperationKind::ReactivateMembership => "membership.reactivate",
            OperationKind::IssueCard => "membership.issue_card",
            OperationKind::ViewMembers => "membership.view",
            OperationKind::AssignRole => "assignment.assign",
            OperationKind::RevokeAssignment => "assignment.revoke",
            OperationKind::AmendAssignmentNotes => "assignment.amend_notes",
            OperationKind::CreateBranch => "org.create_branch",
            OperationKind::UpdateBranchStatus => "org.update_branch_status",
            OperationKind::RetireBranch => "org.retire_branch",
            OperationKind::CreateChapter => "org.create_chapter",
            OperationKind::UpdateChapterStatus => "org.update_chapter_status",
            OperationKind::TeardownChapter => "org.teardown_chapter",
            OperationKind::DefineRole => "catalog.define_role",
            OperationKind::RenameRole => "catalog.rename_role",
            OperationKind::DeactivateRole => "catalog.deactivate_role",
        }
    }

    pub fn class(&self) -> OperationClass {
        match self {
            OperationKind::ApproveMembership
            | OperationKind::SuspendMembership
            | OperationKind::LapseMembership
            | OperationKind::ReactivateMembership
            | OperationKind::IssueCard
            | OperationKind::ViewMembers => OperationClass::MembershipAdmin,
            OperationKind::AssignRole
            | OperationKind::RevokeAssignment
            | OperationKind::AmendAssignmentNotes => OperationClass::AssignmentAdmin,
            OperationKind::CreateBranch
            | OperationKind::UpdateBranchStatus
            | OperationKind::RetireBranch
            | OperationKind::UpdateChapterStatus => OperationClass::OrgAdmin,
            OperationKind::DefineRole | OperationKind::DeactivateRole => {
                OperationClass::CatalogAdmin
            }
            // Creating or dismantling a chapter reshapes the organization
            // itself, so both sit in the super-only tier.
            OperationKind::CreateChapter
            | OperationKind::TeardownChapter
            | OperationKind::RenameRole => OperationClass::Governance,
        }
    }
}

/// A fully-described intended operation: what, where, and (for role
/// operations) which catalog category the target role belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub target: TargetScope,
    /// Category of the role the operation concerns (assign/revoke/
    /// define/deactivate); lets committee managers administer exactly
    /// their own category.
    pub role_category: Option<CategoryId>,
}

impl Operation {
    pub fn new(kind: OperationKind, target: TargetScope) -> Self {
        Self {
            kind,
            target,
            role_category: None,
        }
    }

    pub fn with_role_category(mut self, category: Option<CategoryId>) -> Self {
        self.role_category = category;
        self
    }

    pub fn approve_membership(chapter_id: ChapterId, branch_id: BranchId) -> Self {
        Self::new(
            OperationKind::ApproveMembership,
            TargetScope::Branch {
                chapter_id,
                branch_id,
            },
        )
    }

    pub fn suspend_membership(chapter_id: ChapterId, branch_id: BranchId) -> Self {
        Self::new(
            OperationKind::SuspendMembership,
            TargetScope::Branch {
                chapter_id,
                branch_id,
            },
        )
    }

    pub fn lapse_membership(chapter_id: ChapterId, branch_id: BranchId) -> Self {
        Self::new(
            OperationKind::LapseMembership,
            TargetScope::Branch {
                chapter_id,
                branch_id,
            },
        )
    }

    pub fn reactivate_membership(chapter_id: ChapterId, branch_id: BranchId) -> Self {
        Self::new(
            OperationKind::ReactivateMembership,
            TargetScope::Branch {
                chapter_id,
                branch_id,
            },
        )
    }

    pub fn issue_card(chapter_id: ChapterId, branch_id: BranchId) -> Self {
        Self::new(
            OperationKind::IssueCard,
            TargetScope::Branch {
                chapter_id,
                branch_id,
            },
        )
    }

    pub fn view_members(chapter_id: ChapterId, branch_id: BranchId) -> Self {
        Self::new(
            OperationKind::ViewMembers,
            TargetScope::Branch {
                chapter_id,
                branch_id,
            },
        )
    }

    pub fn assign_role(target: TargetScope, role_category: Option<CategoryId>) -> Self {
        Self::new(OperationKind::AssignRole, target).with_role_category(role_category)
    }

    pub fn revoke_assignment(target: TargetScope, role_category: Option<CategoryId>) -> Self {
        Self::new(OperationKind::RevokeAssignment, target).with_role_category(role_category)
    }

    pub fn amend_assignment_notes(target: TargetScope, role_category: Option<CategoryId>) -> Self {
        Self::new(OperationKind::AmendAssignmentNotes, target).with_role_category(role_category)
    }

    pub fn create_branch(chapter_id: ChapterId) -> Self {
        Self::new(OperationKind::CreateBranch, TargetScope::Chapter(chapter_id))
    }

    pub fn update_branch_status(chapter_id: ChapterId, branch_id: BranchId) -> Self {
        Self::new(
            OperationKind::UpdateBranchStatus,
            TargetScope::Branch {
                chapter_id,
                branch_id,
            },
        )
    }

    pub fn retire_branch(chapter_id: ChapterId, branch_id: BranchId) -> Self {
        Self::new(
            OperationKind::RetireBranch,
            TargetScope::Branch {
                chapter_id,
                branch_id,
            },
        )
    }

    pub fn create_chapter() -> Self {
        Self::new(OperationKind::CreateChapter, TargetScope::Global)
    }

    pub fn update_chapter_status(chapter_id: ChapterId) -> Self {
        Self::new(
            OperationKind::UpdateChapterStatus,
            TargetScope::Chapter(chapter_id),
        )
    }

    pub fn teardown_chapter(chapter_id: ChapterId) -> Self {
        Self::new(
            OperationKind::TeardownChapter,
            TargetScope::Chapter(chapter_id),
        )
    }

    pub fn define_role(role_category: Option<CategoryId>) -> Self {
        Self::new(OperationKind::DefineRole, TargetScope::Catalog).with_role_category(role_category)
    }

    pub fn rename_role() -> Self {
        Self::new(OperationKind::RenameRole, TargetScope::Global)
    }

    pub fn deactivate_role(role_category: Option<CategoryId>) -> Self {
        Self::new(OperationKind::DeactivateRole, TargetScope::Catalog)
            .with_role_category(role_category)
    }
}
