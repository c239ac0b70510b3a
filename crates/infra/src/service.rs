//! The application service: the single boundary the API layer talks to.
//!
//! Every mutating call follows the same pipeline: resolve the target,
//! validate input invariants, load the actor's currently-effective grants
//! fresh from the assignment ledger, ask the engine, then run exactly one
//! ledger transaction. A denial or validation failure happens before any
//! write, so there is never partial state to unwind.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use chapterhouse_assignments::AssignmentScope;
use chapterhouse_auth::{authorize, EffectiveGrant, Operation, TargetScope};
use chapterhouse_core::{
    AssignmentId, BranchId, CategoryId, ChapterId, DomainError, DomainResult, ExpectedVersion,
    MembershipId, RoleId, UserId,
};
use chapterhouse_membership::{
    ApproveMembership, IssueCard, LapseMembership, MembershipCommand, ReactivateMembership,
    ReactivationPolicy, SuspendMembership,
};
use chapterhouse_org::{Branch, BranchStatus, Chapter, ChapterStatus};
use chapterhouse_roles::{PermissionSet, Role, RoleCapability, RoleCategory, ScopeType};

use crate::assignment_ledger::AssignmentLedger;
use crate::membership_ledger::MembershipLedger;
use crate::org_store::OrgStore;
use crate::role_catalog::RoleCatalog;
use crate::views::{AssignmentRecord, EffectiveRole, MembershipRecord};

/// Composes the hierarchy store, role catalog, and both ledgers behind
/// the operations of the external contract.
#[derive(Debug, Default)]
pub struct OrganizationService {
    org: OrgStore,
    catalog: RoleCatalog,
    memberships: MembershipLedger,
    assignments: AssignmentLedger,
    reactivation_policy: ReactivationPolicy,
}

impl OrganizationService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reactivation_policy(mut self, policy: ReactivationPolicy) -> Self {
        self.reactivation_policy = policy;
        self
    }

    pub fn org(&self) -> &OrgStore {
        &self.org
    }

    pub fn catalog(&self) -> &RoleCatalog {
        &self.catalog
    }

    // ── authorization ────────────────────────────────────────────────

    /// Derive the actor's currently-effective grants.
    ///
    /// Read fresh from the ledger on every decision; a revocation
    /// committed a moment ago is already gone from this list.
    fn effective_grants(&self, actor: UserId, now: DateTime<Utc>) -> DomainResult<Vec<EffectiveGrant>> {
        let mut grants = Vec::new();
        for assignment in self.assignments.list_effective(actor, now)? {
            let Some(role_id) = assignment.role_id() else {
                continue;
            };
            let role = self.catalog.get(role_id)?;
            let Some(scope) = assignment.scope() else {
                continue;
            };
            grants.extend(EffectiveGrant::derive(
                role.id,
                role.capability,
                role.category_id,
                scope.chapter_id,
                scope.branch_id,
            ));
        }
        Ok(grants)
    }

    /// The single authorization entry point; every mutating operation
    /// goes through here before touching a ledger.
    pub fn authorize(
        &self,
        actor: UserId,
        operation: &Operation,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let grants = self.effective_grants(actor, now)?;
        match authorize(&grants, operation) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(
                    actor = %actor,
                    operation = operation.kind.as_str(),
                    scope = %operation.target.describe(),
                    "authorization denied"
                );
                Err(err)
            }
        }
    }

    /// Read path for UI permission gating.
    pub fn get_effective_roles(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<EffectiveRole>> {
        let mut roles = Vec::new();
        for assignment in self.assignments.list_effective(user_id, now)? {
            let Some(role_id) = assignment.role_id() else {
                continue;
            };
            let role = self.catalog.get(role_id)?;
            if let Some(view) = EffectiveRole::project(&assignment, &role) {
                roles.push(view);
            }
        }
        Ok(roles)
    }

    // ── bootstrap ────────────────────────────────────────────────────

    /// Seed an empty organization: first chapter, the super-authority
    /// role, and its first holder. The one path that bypasses the
    /// engine — there is nobody to authorize the first appointment.
    pub fn bootstrap(
        &self,
        founder: UserId,
        chapter_name: &str,
        country: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<(Chapter, Role, AssignmentRecord)> {
        let chapter = self.org.create_chapter(chapter_name, country, None, now)?;
        let role = self.catalog.define_role(
            "Chairman",
            ScopeType::Chapter,
            RoleCapability::SuperAdmin,
            None,
            PermissionSet::new(),
            Some("Chapter-wide super-authority".to_string()),
            now,
        )?;
        let assignment = self.assignments.appoint(
            founder,
            role.id,
            AssignmentScope::chapter(chapter.id),
            founder,
            None,
            Some("bootstrap appointment".to_string()),
            now,
        )?;
        info!(chapter = %chapter.id, founder = %founder, "organization bootstrapped");
        let record = AssignmentRecord::project(&assignment).ok_or(DomainError::NotFound)?;
        Ok((chapter, role, record))
    }

    // ── membership lifecycle ─────────────────────────────────────────

    /// Self-service registration: creates the membership in `pending`.
    /// Not gated by the engine — anyone may apply to an existing branch.
    pub fn register(
        &self,
        user_id: UserId,
        branch_id: BranchId,
        now: DateTime<Utc>,
    ) -> DomainResult<MembershipRecord> {
        // Branch must exist; registration against a torn-down branch is
        // a caller error, not a conflict.
        self.org.get_branch(branch_id)?;
        let membership = self.memberships.register(user_id, branch_id, now)?;
        info!(user = %user_id, branch = %branch_id, "membership registered");
        MembershipRecord::project(&membership).ok_or(DomainError::NotFound)
    }

    fn membership_operation(
        &self,
        membership_id: MembershipId,
        make: impl FnOnce(ChapterId, BranchId) -> Operation,
    ) -> DomainResult<Operation> {
        let membership = self.memberships.get(membership_id)?;
        let branch_id = membership.branch_id().ok_or(DomainError::NotFound)?;
        let branch = self.org.get_branch(branch_id)?;
        Ok(make(branch.chapter_id, branch.id))
    }

    pub fn approve_membership(
        &self,
        actor: UserId,
        membership_id: MembershipId,
        now: DateTime<Utc>,
    ) -> DomainResult<MembershipRecord> {
        let operation = self.membership_operation(membership_id, Operation::approve_membership)?;
        self.authorize(actor, &operation, now)?;

        let membership = self.memberships.execute(
            membership_id,
            &MembershipCommand::ApproveMembership(ApproveMembership {
                membership_id,
                approved_by: actor,
                occurred_at: now,
            }),
            ExpectedVersion::Any,
        )?;
        info!(membership = %membership_id, approver = %actor, "membership approved");
        MembershipRecord::project(&membership).ok_or(DomainError::NotFound)
    }

    pub fn suspend_membership(
        &self,
        actor: UserId,
        membership_id: MembershipId,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<MembershipRecord> {
        let operation = self.membership_operation(membership_id, Operation::suspend_membership)?;
        self.authorize(actor, &operation, now)?;

        let membership = self.memberships.execute(
            membership_id,
            &MembershipCommand::SuspendMembership(SuspendMembership {
                membership_id,
                suspended_by: actor,
                reason,
                occurred_at: now,
            }),
            ExpectedVersion::Any,
        )?;
        info!(membership = %membership_id, "membership suspended");
        MembershipRecord::project(&membership).ok_or(DomainError::NotFound)
    }

    pub fn lapse_membership(
        &self,
        actor: UserId,
        membership_id: MembershipId,
        now: DateTime<Utc>,
    ) -> DomainResult<MembershipRecord> {
        let operation = self.membership_operation(membership_id, Operation::lapse_membership)?;
        self.authorize(actor, &operation, now)?;

        let membership = self.memberships.execute(
            membership_id,
            &MembershipCommand::LapseMembership(LapseMembership {
                membership_id,
                occurred_at: now,
            }),
            ExpectedVersion::Any,
        )?;
        info!(membership = %membership_id, "membership lapsed");
        MembershipRecord::project(&membership).ok_or(DomainError::NotFound)
    }

    pub fn reactivate_membership(
        &self,
        actor: UserId,
        membership_id: MembershipId,
        now: DateTime<Utc>,
    ) -> DomainResult<MembershipRecord> {
        let operation =
            self.membership_operation(membership_id, Operation::reactivate_membership)?;
        self.authorize(actor, &operation, now)?;

        let membership = self.memberships.execute(
            membership_id,
            &MembershipCommand::ReactivateMembership(ReactivateMembership {
                membership_id,
                reactivated_by: actor,
                policy: self.reactivation_policy,
                occurred_at: now,
            }),
            ExpectedVersion::Any,
        )?;
        info!(membership = %membership_id, policy = ?self.reactivation_policy, "membership reactivated");
        MembershipRecord::project(&membership).ok_or(DomainError::NotFound)
    }

    pub fn issue_card(
        &self,
        actor: UserId,
        membership_id: MembershipId,
        now: DateTime<Utc>,
    ) -> DomainResult<MembershipRecord> {
        let operation = self.membership_operation(membership_id, Operation::issue_card)?;
        self.authorize(actor, &operation, now)?;

        let membership = self.memberships.execute(
            membership_id,
            &MembershipCommand::IssueCard(IssueCard {
                membership_id,
                issued_by: actor,
                occurred_at: now,
            }),
            ExpectedVersion::Any,
        )?;
        info!(membership = %membership_id, "card issued");
        MembershipRecord::project(&membership).ok_or(DomainError::NotFound)
    }

    pub fn get_membership(&self, membership_id: MembershipId) -> DomainResult<MembershipRecord> {
        let membership = self.memberships.get(membership_id)?;
        MembershipRecord::project(&membership).ok_or(DomainError::NotFound)
    }

    pub fn list_branch_members(
        &self,
        actor: UserId,
        branch_id: BranchId,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<MembershipRecord>> {
        let branch = self.org.get_branch(branch_id)?;
        let operation = Operation::view_members(branch.chapter_id, branch.id);
        self.authorize(actor, &operation, now)?;

        Ok(self
            .memberships
            .list_for_branch(branch_id)?
            .iter()
            .filter_map(MembershipRecord::project)
            .collect())
    }

    // ── role assignment lifecycle ────────────────────────────────────

    /// Resolve an assignment scope to the operation target, validating
    /// the referenced chapter/branch actually exist and agree.
    fn resolve_scope_target(&self, scope: &AssignmentScope) -> DomainResult<TargetScope> {
        match (scope.chapter_id, scope.branch_id) {
            (chapter_id, Some(branch_id)) => {
                let branch = self.org.get_branch(branch_id)?;
                if let Some(chapter_id) = chapter_id {
                    if branch.chapter_id != chapter_id {
                        return Err(DomainError::validation(
                            "branch does not belong to the given chapter",
                        ));
                    }
                }
                Ok(TargetScope::Branch {
                    chapter_id: branch.chapter_id,
                    branch_id: branch.id,
                })
            }
            (Some(chapter_id), None) => {
                self.org.get_chapter(chapter_id)?;
                Ok(TargetScope::Chapter(chapter_id))
            }
            (None, None) => Err(DomainError::validation(
                "assignment requires at least one of chapter_id/branch_id",
            )),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn assign_role(
        &self,
        actor: UserId,
        user_id: UserId,
        role_id: RoleId,
        scope: AssignmentScope,
        notes: Option<String>,
        start_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> DomainResult<AssignmentRecord> {
        let role = self.catalog.get(role_id)?;

        // Input invariants first: scope validity, then liveness.
        scope.validate_for(role.scope_type)?;
        let target = self.resolve_scope_target(&scope)?;
        if !role.is_active {
            return Err(DomainError::conflict(
                "role is deactivated and cannot be newly assigned",
            ));
        }

        let operation = Operation::assign_role(target, role.category_id);
        self.authorize(actor, &operation, now)?;

        let assignment = self
            .assignments
            .appoint(user_id, role_id, scope, actor, start_date, notes, now)?;
        info!(
            user = %user_id,
            role = %role.name,
            scope = %scope.describe(),
            appointed_by = %actor,
            "role assigned"
        );
        AssignmentRecord::project(&assignment).ok_or(DomainError::NotFound)
    }

    pub fn revoke_assignment(
        &self,
        actor: UserId,
        assignment_id: AssignmentId,
        now: DateTime<Utc>,
    ) -> DomainResult<AssignmentRecord> {
        let assignment = self.assignments.get(assignment_id)?;
        let scope = assignment.scope().ok_or(DomainError::NotFound)?;
        let role_id = assignment.role_id().ok_or(DomainError::NotFound)?;
        let role = self.catalog.get(role_id)?;

        let target = self.resolve_scope_target(&scope)?;
        let operation = Operation::revoke_assignment(target, role.category_id);
        self.authorize(actor, &operation, now)?;

        let assignment = self.assignments.revoke(assignment_id, actor, now)?;
        info!(assignment = %assignment_id, revoked_by = %actor, "assignment revoked");
        AssignmentRecord::project(&assignment).ok_or(DomainError::NotFound)
    }

    pub fn amend_assignment_notes(
        &self,
        actor: UserId,
        assignment_id: AssignmentId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<AssignmentRecord> {
        let assignment = self.assignments.get(assignment_id)?;
        let scope = assignment.scope().ok_or(DomainError::NotFound)?;
        let role_id = assignment.role_id().ok_or(DomainError::NotFound)?;
        let role = self.catalog.get(role_id)?;

        let target = self.resolve_scope_target(&scope)?;
        let operation = Operation::amend_assignment_notes(target, role.category_id);
        self.authorize(actor, &operation, now)?;

        let assignment = self
            .assignments
            .amend_notes(assignment_id, notes, ExpectedVersion::Any, now)?;
        info!(assignment = %assignment_id, "assignment notes amended");
        AssignmentRecord::project(&assignment).ok_or(DomainError::NotFound)
    }

    pub fn list_user_assignments(&self, user_id: UserId) -> DomainResult<Vec<AssignmentRecord>> {
        Ok(self
            .assignments
            .list_for_user(user_id)?
            .iter()
            .filter_map(AssignmentRecord::project)
            .collect())
    }

    // ── organization hierarchy ───────────────────────────────────────

    pub fn create_chapter(
        &self,
        actor: UserId,
        name: &str,
        country: &str,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Chapter> {
        self.authorize(actor, &Operation::create_chapter(), now)?;
        let chapter = self.org.create_chapter(name, country, description, now)?;
        info!(chapter = %chapter.id, name, "chapter created");
        Ok(chapter)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn create_branch(
        &self,
        actor: UserId,
        chapter_id: ChapterId,
        name: &str,
        location: &str,
        description: Option<String>,
        min_members: Option<u32>,
        now: DateTime<Utc>,
    ) -> DomainResult<Branch> {
        self.authorize(actor, &Operation::create_branch(chapter_id), now)?;
        let branch = self.org.create_branch(
            chapter_id,
            name,
            location,
            description,
            min_members,
            Some(actor),
            now,
        )?;
        info!(branch = %branch.id, name, "branch created");
        Ok(branch)
    }

    pub fn update_chapter_status(
        &self,
        actor: UserId,
        chapter_id: ChapterId,
        status: ChapterStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<Chapter> {
        self.org.get_chapter(chapter_id)?;
        let operation = Operation::update_chapter_status(chapter_id);
        self.authorize(actor, &operation, now)?;

        let chapter = self.org.set_chapter_status(chapter_id, status)?;
        info!(chapter = %chapter_id, status = status.as_str(), "chapter status updated");
        Ok(chapter)
    }

    /// Cascade-delete a chapter and every branch in it. Super-authority
    /// only; the one true delete in the model.
    pub fn teardown_chapter(
        &self,
        actor: UserId,
        chapter_id: ChapterId,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        self.org.get_chapter(chapter_id)?;
        let operation = Operation::teardown_chapter(chapter_id);
        self.authorize(actor, &operation, now)?;

        self.org.teardown_chapter(chapter_id)?;
        info!(chapter = %chapter_id, "chapter torn down");
        Ok(())
    }

    pub fn update_branch_status(
        &self,
        actor: UserId,
        branch_id: BranchId,
        status: BranchStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<Branch> {
        let branch = self.org.get_branch(branch_id)?;
        let operation = Operation::update_branch_status(branch.chapter_id, branch.id);
        self.authorize(actor, &operation, now)?;

        let branch = self.org.set_branch_status(branch_id, status)?;
        info!(branch = %branch_id, status = status.as_str(), "branch status updated");
        Ok(branch)
    }

    /// Soft retirement; refuses while the branch still has active
    /// members.
    pub fn retire_branch(
        &self,
        actor: UserId,
        branch_id: BranchId,
        now: DateTime<Utc>,
    ) -> DomainResult<Branch> {
        let branch = self.org.get_branch(branch_id)?;
        let operation = Operation::retire_branch(branch.chapter_id, branch.id);
        self.authorize(actor, &operation, now)?;

        let active = self.memberships.count_active_in_branch(branch_id)?;
        if active > 0 {
            return Err(DomainError::conflict(format!(
                "branch still has {active} active members"
            )));
        }

        let branch = self.org.set_branch_status(branch_id, BranchStatus::Inactive)?;
        info!(branch = %branch_id, "branch retired");
        Ok(branch)
    }

    // ── role catalog ─────────────────────────────────────────────────

    #[allow(clippy::too_many_arguments)]
    pub fn define_role(
        &self,
        actor: UserId,
        name: &str,
        scope_type: ScopeType,
        capability: RoleCapability,
        category_id: Option<CategoryId>,
        permissions: PermissionSet,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Role> {
        self.authorize(actor, &Operation::define_role(category_id), now)?;
        let role = self.catalog.define_role(
            name,
            scope_type,
            capability,
            category_id,
            permissions,
            description,
            now,
        )?;
        info!(role = %role.id, name, "role defined");
        Ok(role)
    }

    pub fn define_category(
        &self,
        actor: UserId,
        name: &str,
        description: Option<String>,
        sort_order: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<RoleCategory> {
        self.authorize(actor, &Operation::define_role(None), now)?;
        self.catalog.define_category(name, description, sort_order, now)
    }

    /// Renaming is sensitive enough to be super-authority only: even
    /// though the engine no longer matches on names, the display name is
    /// what humans audit against.
    pub fn rename_role(
        &self,
        actor: UserId,
        role_id: RoleId,
        new_name: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Role> {
        self.authorize(actor, &Operation::rename_role(), now)?;
        let role = self.catalog.rename_role(role_id, new_name)?;
        info!(role = %role_id, new_name, "role renamed");
        Ok(role)
    }

    pub fn deactivate_role(
        &self,
        actor: UserId,
        role_id: RoleId,
        now: DateTime<Utc>,
    ) -> DomainResult<Role> {
        let role = self.catalog.get(role_id)?;
        self.authorize(actor, &Operation::deactivate_role(role.category_id), now)?;
        let role = self.catalog.deactivate_role(role_id)?;
        info!(role = %role_id, "role deactivated");
        Ok(role)
    }
}
