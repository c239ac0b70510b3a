use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chapterhouse_core::{CategoryId, DomainError, DomainResult, Entity, RoleId};

use crate::permissions::PermissionSet;

/// Which scope fields an assignment referencing this role may populate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeType {
    Chapter,
    Branch,
    Both,
}

impl ScopeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeType::Chapter => "chapter",
            ScopeType::Branch => "branch",
            ScopeType::Both => "both",
        }
    }
}

impl core::str::FromStr for ScopeType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chapter" => Ok(ScopeType::Chapter),
            "branch" => Ok(ScopeType::Branch),
            "both" => Ok(ScopeType::Both),
            other => Err(DomainError::validation(format!(
                "unknown scope type '{other}'"
            ))),
        }
    }
}

/// Stable authorization tag attached to a role.
///
/// The engine matches on this, never on the display name, so renaming a
/// role ("Chairman" → "National Chairman") cannot change what it is
/// allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleCapability {
    /// Chapter-wide super-authority (the "Chairman" tier): every
    /// operation, every scope.
    SuperAdmin,
    /// Chapter-level officer (secretary tier): membership and assignment
    /// administration across the officer's chapter.
    ChapterOfficer,
    /// Manages roles within one catalog category (committee seats).
    CommitteeManager,
    /// Branch-level leadership: membership administration within the
    /// assignment's own branch only.
    BranchAdmin,
    /// Ordinary member; carries no administrative authority.
    Member,
}

impl RoleCapability {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleCapability::SuperAdmin => "super_admin",
            RoleCapability::ChapterOfficer => "chapter_officer",
            RoleCapability::CommitteeManager => "committee_manager",
            RoleCapability::BranchAdmin => "branch_admin",
            RoleCapability::Member => "member",
        }
    }
}

/// A named, scoped capability bundle assignable to users.
///
/// Roles are read-mostly: the catalog mutates them only through privileged
/// operations, and deletion is replaced by deactivation so historical
/// assignments stay explicable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    /// Display name, globally unique in the catalog. Free to change;
    /// never consulted by the authorization engine.
    pub name: String,
    pub scope_type: ScopeType,
    pub capability: RoleCapability,
    pub category_id: Option<CategoryId>,
    pub permissions: PermissionSet,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Role {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: RoleId,
        name: impl Into<String>,
        scope_type: ScopeType,
        capability: RoleCapability,
        category_id: Option<CategoryId>,
        permissions: PermissionSet,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("role name cannot be empty"));
        }

        Ok(Self {
            id,
            name,
            scope_type,
            capability,
            category_id,
            permissions,
            description,
            is_active: true,
            created_at,
        })
    }

    pub fn rename(&mut self, name: impl Into<String>) -> DomainResult<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("role name cannot be empty"));
        }
        self.name = name;
        Ok(())
    }

    /// Soft retirement: blocks new assignments, leaves existing ones
    /// untouched until they are revoked or expire.
    pub fn deactivate(&mut self) {
        self.is_active = false;
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Grouping label for catalog display ("Chapter Executives",
/// "Committees"); pure metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCategory {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: u32,
    pub created_at: DateTime<Utc>,
}

impl RoleCategory {
    pub fn new(
        id: CategoryId,
        name: impl Into<String>,
        description: Option<String>,
        sort_order: u32,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        Ok(Self {
            id,
            name,
            description,
            sort_order,
            created_at,
        })
    }
}

impl Entity for RoleCategory {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
