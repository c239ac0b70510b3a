//! Wire-shaped views returned across the service boundary.
//!
//! The aggregates keep their state private; these records are the
//! persisted entity shapes API consumers see: closed status enums,
//! scope fields, audit stamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chapterhouse_assignments::{AssignmentScope, ExecutiveAssignment};
use chapterhouse_core::{AssignmentId, BranchId, MembershipId, RoleId, UserId};
use chapterhouse_membership::{Membership, MembershipStatus};
use chapterhouse_roles::{Role, RoleCapability};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub id: MembershipId,
    pub user_id: UserId,
    pub branch_id: BranchId,
    pub status: MembershipStatus,
    pub joined_date: DateTime<Utc>,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub suspension_reason: Option<String>,
    pub card_issued: bool,
    pub card_issued_at: Option<DateTime<Utc>>,
}

impl MembershipRecord {
    /// Project a rehydrated aggregate into its wire shape.
    ///
    /// Only registered memberships have one; the ledger never hands out
    /// unregistered aggregates.
    pub(crate) fn project(membership: &Membership) -> Option<Self> {
        Some(Self {
            id: membership.id_typed(),
            user_id: membership.user_id()?,
            branch_id: membership.branch_id()?,
            status: membership.status(),
            joined_date: membership.joined_date()?,
            approved_by: membership.approved_by(),
            approved_at: membership.approved_at(),
            suspension_reason: membership.suspension_reason().map(str::to_string),
            card_issued: membership.card_issued(),
            card_issued_at: membership.card_issued_at(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    pub id: AssignmentId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub scope: AssignmentScope,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub appointed_by: Option<UserId>,
    pub notes: Option<String>,
}

impl AssignmentRecord {
    pub(crate) fn project(assignment: &ExecutiveAssignment) -> Option<Self> {
        Some(Self {
            id: assignment.id_typed(),
            user_id: assignment.user_id()?,
            role_id: assignment.role_id()?,
            scope: assignment.scope()?,
            start_date: assignment.start_date()?,
            end_date: assignment.end_date(),
            is_active: assignment.is_active(),
            appointed_by: assignment.appointed_by(),
            notes: assignment.notes().map(str::to_string),
        })
    }
}

/// Read path for UI permission gating: which roles a user currently
/// holds, and where.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveRole {
    pub assignment_id: AssignmentId,
    pub role_id: RoleId,
    pub role_name: String,
    pub capability: RoleCapability,
    pub scope: AssignmentScope,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
}

impl EffectiveRole {
    pub(crate) fn project(assignment: &ExecutiveAssignment, role: &Role) -> Option<Self> {
        Some(Self {
            assignment_id: assignment.id_typed(),
            role_id: role.id,
            role_name: role.name.clone(),
            capability: role.capability,
            scope: assignment.scope()?,
            start_date: assignment.start_date()?,
            end_date: assignment.end_date(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapterhouse_core::{BranchId, MembershipId, UserId};

    #[test]
    fn membership_record_serializes_status_lowercase() {
        let record = MembershipRecord {
            id: MembershipId::new(),
            user_id: UserId::new(),
            branch_id: BranchId::new(),
            status: MembershipStatus::Pending,
            joined_date: Utc::now(),
            approved_by: None,
            approved_at: None,
            suspension_reason: None,
            card_issued: false,
            card_issued_at: None,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["card_issued"], false);
    }
}
