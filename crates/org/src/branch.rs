use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chapterhouse_core::{BranchId, ChapterId, DomainError, DomainResult, Entity, UserId};

/// Default minimum membership for a viable branch.
pub const DEFAULT_MIN_MEMBERS: u32 = 20;

/// Branch lifecycle status.
///
/// New branches may start `pending` until they reach `min_members`;
/// retirement is modeled as `inactive` (soft), never row deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchStatus {
    Active,
    Inactive,
    Pending,
}

impl BranchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchStatus::Active => "active",
            BranchStatus::Inactive => "inactive",
            BranchStatus::Pending => "pending",
        }
    }
}

impl core::str::FromStr for BranchStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(BranchStatus::Active),
            "inactive" => Ok(BranchStatus::Inactive),
            "pending" => Ok(BranchStatus::Pending),
            other => Err(DomainError::validation(format!(
                "unknown branch status '{other}'"
            ))),
        }
    }
}

/// Sub-unit of exactly one chapter; the primary scope for local
/// memberships and branch-level role assignments.
///
/// Name uniqueness within a chapter and referential integrity against the
/// owning chapter are enforced by the org store, not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub chapter_id: ChapterId,
    pub name: String,
    pub location: String,
    pub description: Option<String>,
    pub min_members: u32,
    pub status: BranchStatus,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Branch {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BranchId,
        chapter_id: ChapterId,
        name: impl Into<String>,
        location: impl Into<String>,
        description: Option<String>,
        min_members: Option<u32>,
        created_by: Option<UserId>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("branch name cannot be empty"));
        }
        let location = location.into();
        if location.trim().is_empty() {
            return Err(DomainError::validation("branch location cannot be empty"));
        }
        let min_members = min_members.unwrap_or(DEFAULT_MIN_MEMBERS);
        if min_members == 0 {
            return Err(DomainError::validation("min_members must be at least 1"));
        }

        Ok(Self {
            id,
            chapter_id,
            name,
            location,
            description,
            min_members,
            status: BranchStatus::Pending,
            created_by,
            created_at,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == BranchStatus::Active
    }

    /// Status change; idempotent. Callers must already have passed the
    /// authorization engine — the store does not self-authorize.
    pub fn set_status(&mut self, status: BranchStatus) {
        self.status = status;
    }
}

impl Entity for Branch {
    type Id = BranchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_branch(min_members: Option<u32>) -> DomainResult<Branch> {
        Branch::new(
            BranchId::new(),
            ChapterId::new(),
            "Leicester Branch",
            "Leicester",
            None,
            min_members,
            None,
            Utc::now(),
        )
    }

    #[test]
    fn defaults_min_members_when_unspecified() {
        let branch = test_branch(None).unwrap();
        assert_eq!(branch.min_members, DEFAULT_MIN_MEMBERS);
    }

    #[test]
    fn rejects_zero_min_members() {
        let err = test_branch(Some(0)).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn new_branch_starts_pending() {
        let branch = test_branch(None).unwrap();
        assert_eq!(branch.status, BranchStatus::Pending);
    }

    #[test]
    fn unknown_status_string_fails_validation() {
        let err = "dormant".parse::<BranchStatus>().unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
