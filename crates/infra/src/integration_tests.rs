//! End-to-end scenarios across the service boundary: registration,
//! approval, scoped assignment, revocation immediacy.

use chrono::{DateTime, Utc};

use chapterhouse_assignments::AssignmentScope;
use chapterhouse_auth::Operation;
use chapterhouse_core::{BranchId, ChapterId, DomainError, UserId};
use chapterhouse_membership::{MembershipStatus, ReactivationPolicy};
use chapterhouse_org::{BranchStatus, ChapterStatus};
use chapterhouse_roles::{PermissionSet, RoleCapability, ScopeType};

use crate::service::OrganizationService;

struct Fixture {
    service: OrganizationService,
    founder: UserId,
    chapter_id: ChapterId,
    branch_b: BranchId,
    branch_c: BranchId,
}

fn now() -> DateTime<Utc> {
    Utc::now()
}

fn fixture() -> Fixture {
    fixture_with_policy(ReactivationPolicy::ViaPending)
}

fn fixture_with_policy(policy: ReactivationPolicy) -> Fixture {
    let service = OrganizationService::new().with_reactivation_policy(policy);
    let founder = UserId::new();
    let (chapter, _, _) = service.bootstrap(founder, "NDC UK", "UK", now()).unwrap();
    let branch_b = service
        .create_branch(founder, chapter.id, "Leeds Branch", "Leeds", None, None, now())
        .unwrap()
        .id;
    let branch_c = service
        .create_branch(founder, chapter.id, "Kent Branch", "Kent", None, None, now())
        .unwrap()
        .id;
    Fixture {
        service,
        founder,
        chapter_id: chapter.id,
        branch_b,
        branch_c,
    }
}

impl Fixture {
    /// Define a branch-admin role and hand it to a fresh actor, scoped
    /// to the given branch.
    fn branch_admin_for(&self, branch: BranchId) -> UserId {
        let actor = UserId::new();
        let role = match self.service.catalog().get_by_name("Branch Chairman") {
            Ok(role) => role,
            Err(_) => self
                .service
                .define_role(
                    self.founder,
                    "Branch Chairman",
                    ScopeType::Branch,
                    RoleCapability::BranchAdmin,
                    None,
                    PermissionSet::new(),
                    None,
                    now(),
                )
                .unwrap(),
        };
        self.service
            .assign_role(
                self.founder,
                actor,
                role.id,
                AssignmentScope::branch(branch),
                None,
                None,
                now(),
            )
            .unwrap();
        actor
    }
}

#[test]
fn register_creates_pending_and_duplicates_conflict() {
    let fx = fixture();
    let user = UserId::new();

    let membership = fx.service.register(user, fx.branch_b, now()).unwrap();
    assert_eq!(membership.status, MembershipStatus::Pending);
    assert!(membership.approved_by.is_none());

    let err = fx.service.register(user, fx.branch_b, now()).unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[test]
fn actor_without_roles_cannot_approve_and_state_is_untouched() {
    let fx = fixture();
    let membership = fx.service.register(UserId::new(), fx.branch_b, now()).unwrap();

    let nobody = UserId::new();
    let err = fx
        .service
        .approve_membership(nobody, membership.id, now())
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    let unchanged = fx.service.get_membership(membership.id).unwrap();
    assert_eq!(unchanged.status, MembershipStatus::Pending);
    assert!(unchanged.approved_by.is_none());
}

#[test]
fn branch_admin_approves_own_branch_and_stamps_approver() {
    let fx = fixture();
    let admin = fx.branch_admin_for(fx.branch_b);
    let membership = fx.service.register(UserId::new(), fx.branch_b, now()).unwrap();

    let approved = fx
        .service
        .approve_membership(admin, membership.id, now())
        .unwrap();
    assert_eq!(approved.status, MembershipStatus::Active);
    assert_eq!(approved.approved_by, Some(admin));
    assert!(approved.approved_at.is_some());
}

#[test]
fn branch_admin_is_denied_on_the_other_branch() {
    let fx = fixture();
    let admin_b = fx.branch_admin_for(fx.branch_b);
    let membership = fx.service.register(UserId::new(), fx.branch_c, now()).unwrap();

    let err = fx
        .service
        .approve_membership(admin_b, membership.id, now())
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));
}

#[test]
fn approving_twice_succeeds_without_duplicate_side_effects() {
    let fx = fixture();
    let admin = fx.branch_admin_for(fx.branch_b);
    let membership = fx.service.register(UserId::new(), fx.branch_b, now()).unwrap();

    let first = fx
        .service
        .approve_membership(admin, membership.id, now())
        .unwrap();
    let second = fx
        .service
        .approve_membership(admin, membership.id, now())
        .unwrap();
    assert_eq!(first.status, MembershipStatus::Active);
    assert_eq!(second.approved_by, first.approved_by);
    assert_eq!(second.approved_at, first.approved_at);
}

#[test]
fn chapter_scoped_role_with_branch_scope_fails_validation() {
    let fx = fixture();
    let role = fx
        .service
        .define_role(
            fx.founder,
            "Treasurer",
            ScopeType::Chapter,
            RoleCapability::ChapterOfficer,
            None,
            PermissionSet::new(),
            None,
            now(),
        )
        .unwrap();

    let err = fx
        .service
        .assign_role(
            fx.founder,
            UserId::new(),
            role.id,
            AssignmentScope::branch(fx.branch_b),
            None,
            None,
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation(_)));
}

#[test]
fn issue_card_requires_active_membership() {
    let fx = fixture();
    let admin = fx.branch_admin_for(fx.branch_b);
    let membership = fx.service.register(UserId::new(), fx.branch_b, now()).unwrap();

    let err = fx.service.issue_card(admin, membership.id, now()).unwrap_err();
    match err {
        DomainError::InvalidState { current, .. } => assert_eq!(current, "pending"),
        other => panic!("expected InvalidState, got {other:?}"),
    }

    fx.service.approve_membership(admin, membership.id, now()).unwrap();
    let carded = fx.service.issue_card(admin, membership.id, now()).unwrap();
    assert!(carded.card_issued);
    assert!(carded.card_issued_at.is_some());
}

#[test]
fn super_authority_reaches_every_scope() {
    let fx = fixture();
    let membership = fx.service.register(UserId::new(), fx.branch_c, now()).unwrap();

    // The founder holds the chapter super-role and never received any
    // branch-level grant, yet approves in any branch and renames roles.
    let approved = fx
        .service
        .approve_membership(fx.founder, membership.id, now())
        .unwrap();
    assert_eq!(approved.status, MembershipStatus::Active);

    let chairman = fx.service.catalog().get_by_name("Chairman").unwrap();
    let renamed = fx
        .service
        .rename_role(fx.founder, chairman.id, "National Chairman", now())
        .unwrap();
    assert_eq!(renamed.capability, RoleCapability::SuperAdmin);
}

#[test]
fn rename_role_is_denied_below_super_authority() {
    let fx = fixture();
    let admin = fx.branch_admin_for(fx.branch_b);
    let role = fx.service.catalog().get_by_name("Branch Chairman").unwrap();

    let err = fx
        .service
        .rename_role(admin, role.id, "Branch Supremo", now())
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));
}

#[test]
fn revocation_takes_effect_on_the_next_check() {
    let fx = fixture();
    let admin = fx.branch_admin_for(fx.branch_b);
    let first = fx.service.register(UserId::new(), fx.branch_b, now()).unwrap();
    let second = fx.service.register(UserId::new(), fx.branch_b, now()).unwrap();

    // Works while the grant is live.
    fx.service.approve_membership(admin, first.id, now()).unwrap();

    let assignment = fx
        .service
        .list_user_assignments(admin)
        .unwrap()
        .into_iter()
        .find(|a| a.is_active)
        .unwrap();
    fx.service
        .revoke_assignment(fx.founder, assignment.id, now())
        .unwrap();

    // The very next call with the same actor is denied.
    let err = fx
        .service
        .approve_membership(admin, second.id, now())
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));
    assert!(fx.service.get_effective_roles(admin, now()).unwrap().is_empty());
}

#[test]
fn deactivated_role_blocks_new_assignments_but_keeps_existing_grants() {
    let fx = fixture();
    let admin = fx.branch_admin_for(fx.branch_b);
    let role = fx.service.catalog().get_by_name("Branch Chairman").unwrap();

    fx.service.deactivate_role(fx.founder, role.id, now()).unwrap();

    let err = fx
        .service
        .assign_role(
            fx.founder,
            UserId::new(),
            role.id,
            AssignmentScope::branch(fx.branch_c),
            None,
            None,
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // The sitting branch admin keeps working until revoked.
    let membership = fx.service.register(UserId::new(), fx.branch_b, now()).unwrap();
    assert!(fx.service.approve_membership(admin, membership.id, now()).is_ok());
}

#[test]
fn committee_manager_administers_only_its_category() {
    let fx = fixture();
    let category = fx
        .service
        .define_category(fx.founder, "Committees", None, 1, now())
        .unwrap();
    let other_category = fx
        .service
        .define_category(fx.founder, "Chapter Executives", None, 2, now())
        .unwrap();

    let committee_chair = fx
        .service
        .define_role(
            fx.founder,
            "Finance Committee Chair",
            ScopeType::Both,
            RoleCapability::CommitteeManager,
            Some(category.id),
            PermissionSet::new(),
            None,
            now(),
        )
        .unwrap();
    let committee_member = fx
        .service
        .define_role(
            fx.founder,
            "Finance Committee Member",
            ScopeType::Both,
            RoleCapability::Member,
            Some(category.id),
            PermissionSet::new(),
            None,
            now(),
        )
        .unwrap();
    let officer_role = fx
        .service
        .define_role(
            fx.founder,
            "Organiser",
            ScopeType::Chapter,
            RoleCapability::ChapterOfficer,
            Some(other_category.id),
            PermissionSet::new(),
            None,
            now(),
        )
        .unwrap();

    let manager = UserId::new();
    fx.service
        .assign_role(
            fx.founder,
            manager,
            committee_chair.id,
            AssignmentScope::chapter(fx.chapter_id),
            None,
            None,
            now(),
        )
        .unwrap();

    // In-category assignment is allowed.
    assert!(fx
        .service
        .assign_role(
            manager,
            UserId::new(),
            committee_member.id,
            AssignmentScope::chapter(fx.chapter_id),
            None,
            None,
            now(),
        )
        .is_ok());

    // Out-of-category assignment is denied.
    let err = fx
        .service
        .assign_role(
            manager,
            UserId::new(),
            officer_role.id,
            AssignmentScope::chapter(fx.chapter_id),
            None,
            None,
            now(),
        )
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));
}

#[test]
fn lapsed_membership_reactivates_per_policy() {
    for (policy, expected) in [
        (ReactivationPolicy::ViaPending, MembershipStatus::Pending),
        (ReactivationPolicy::DirectToActive, MembershipStatus::Active),
    ] {
        let fx = fixture_with_policy(policy);
        let admin = fx.branch_admin_for(fx.branch_b);
        let membership = fx.service.register(UserId::new(), fx.branch_b, now()).unwrap();
        fx.service.approve_membership(admin, membership.id, now()).unwrap();
        fx.service.lapse_membership(admin, membership.id, now()).unwrap();

        let reactivated = fx
            .service
            .reactivate_membership(admin, membership.id, now())
            .unwrap();
        assert_eq!(reactivated.status, expected, "policy {policy:?}");
    }
}

#[test]
fn chapter_status_changes_go_through_the_engine() {
    let fx = fixture();
    let nobody = UserId::new();

    let err = fx
        .service
        .update_chapter_status(nobody, fx.chapter_id, ChapterStatus::Inactive, now())
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));
    assert!(fx.service.org().get_chapter(fx.chapter_id).unwrap().is_active());

    // Branch leadership carries no chapter-hierarchy authority either.
    let admin = fx.branch_admin_for(fx.branch_b);
    assert!(fx
        .service
        .update_chapter_status(admin, fx.chapter_id, ChapterStatus::Inactive, now())
        .is_err());

    let updated = fx
        .service
        .update_chapter_status(fx.founder, fx.chapter_id, ChapterStatus::Inactive, now())
        .unwrap();
    assert_eq!(updated.status, ChapterStatus::Inactive);
}

#[test]
fn teardown_chapter_is_super_only_and_cascades() {
    let fx = fixture();
    let admin = fx.branch_admin_for(fx.branch_b);

    let err = fx
        .service
        .teardown_chapter(admin, fx.chapter_id, now())
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));

    fx.service.teardown_chapter(fx.founder, fx.chapter_id, now()).unwrap();
    assert_eq!(
        fx.service.org().get_chapter(fx.chapter_id).unwrap_err(),
        DomainError::NotFound
    );
    assert_eq!(
        fx.service.org().get_branch(fx.branch_b).unwrap_err(),
        DomainError::NotFound
    );
}

#[test]
fn amending_assignment_notes_is_gated_like_other_assignment_admin() {
    let fx = fixture();
    let admin = fx.branch_admin_for(fx.branch_b);
    let assignment = fx
        .service
        .list_user_assignments(admin)
        .unwrap()
        .into_iter()
        .next()
        .unwrap();

    let amended = fx
        .service
        .amend_assignment_notes(
            fx.founder,
            assignment.id,
            Some("acting during transition".to_string()),
            now(),
        )
        .unwrap();
    assert_eq!(amended.notes.as_deref(), Some("acting during transition"));
    assert!(amended.is_active);

    // A branch admin holds no assignment-administration authority, not
    // even over their own record.
    let err = fx
        .service
        .amend_assignment_notes(admin, assignment.id, None, now())
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden { .. }));
}

#[test]
fn retire_branch_refuses_while_members_are_active() {
    let fx = fixture();
    let admin = fx.branch_admin_for(fx.branch_b);
    let membership = fx.service.register(UserId::new(), fx.branch_b, now()).unwrap();
    fx.service.approve_membership(admin, membership.id, now()).unwrap();

    let err = fx.service.retire_branch(fx.founder, fx.branch_b, now()).unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    fx.service.lapse_membership(admin, membership.id, now()).unwrap();
    let retired = fx.service.retire_branch(fx.founder, fx.branch_b, now()).unwrap();
    assert_eq!(retired.status, BranchStatus::Inactive);
}

#[test]
fn authorize_is_the_single_entry_point_for_ui_gating() {
    let fx = fixture();
    let admin = fx.branch_admin_for(fx.branch_b);

    let own_branch = Operation::approve_membership(fx.chapter_id, fx.branch_b);
    let other_branch = Operation::approve_membership(fx.chapter_id, fx.branch_c);

    assert!(fx.service.authorize(admin, &own_branch, now()).is_ok());
    assert!(matches!(
        fx.service.authorize(admin, &other_branch, now()).unwrap_err(),
        DomainError::Forbidden { .. }
    ));

    let roles = fx.service.get_effective_roles(admin, now()).unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].capability, RoleCapability::BranchAdmin);
}

#[test]
fn both_scoped_assignment_grants_branch_and_chapter_authority() {
    let fx = fixture();
    let role = fx
        .service
        .define_role(
            fx.founder,
            "Welfare Officer",
            ScopeType::Both,
            RoleCapability::BranchAdmin,
            None,
            PermissionSet::new(),
            None,
            now(),
        )
        .unwrap();

    let officer = UserId::new();
    fx.service
        .assign_role(
            fx.founder,
            officer,
            role.id,
            AssignmentScope::both(fx.chapter_id, fx.branch_b),
            None,
            None,
            now(),
        )
        .unwrap();

    // Branch grant covers the officer's own branch...
    let membership = fx.service.register(UserId::new(), fx.branch_b, now()).unwrap();
    assert!(fx.service.approve_membership(officer, membership.id, now()).is_ok());

    // ...but BranchAdmin carries no chapter-wide membership authority,
    // so the other branch stays out of reach.
    let other = fx.service.register(UserId::new(), fx.branch_c, now()).unwrap();
    assert!(matches!(
        fx.service.approve_membership(officer, other.id, now()).unwrap_err(),
        DomainError::Forbidden { .. }
    ));
}
