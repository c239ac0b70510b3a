//! Role catalog: the read-mostly store every authorization decision
//! resolves roles through.
//!
//! Lookup by id and by name are both O(1) hash map hits — this sits on
//! the hot path of every `authorize` call. Mutators are crate-private;
//! outside callers go through the service, which gates them on the
//! authorization engine.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use chapterhouse_core::{CategoryId, DomainError, DomainResult, RoleId};
use chapterhouse_roles::{PermissionSet, Role, RoleCapability, RoleCategory, ScopeType};

#[derive(Debug, Default)]
struct CatalogState {
    roles: HashMap<RoleId, Role>,
    by_name: HashMap<String, RoleId>,
    categories: HashMap<CategoryId, RoleCategory>,
}

#[derive(Debug, Default)]
pub struct RoleCatalog {
    state: RwLock<CatalogState>,
}

fn poisoned() -> DomainError {
    DomainError::conflict("role catalog lock poisoned")
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl RoleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn define_role(
        &self,
        name: &str,
        scope_type: ScopeType,
        capability: RoleCapability,
        category_id: Option<CategoryId>,
        permissions: PermissionSet,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Role> {
        let role = Role::new(
            RoleId::new(),
            name,
            scope_type,
            capability,
            category_id,
            permissions,
            description,
            now,
        )?;

        let mut state = self.state.write().map_err(|_| poisoned())?;
        if let Some(category_id) = category_id {
            if !state.categories.contains_key(&category_id) {
                return Err(DomainError::validation("unknown role category"));
            }
        }
        let key = name_key(&role.name);
        if state.by_name.contains_key(&key) {
            return Err(DomainError::conflict(format!("role '{name}' already exists")));
        }
        state.by_name.insert(key, role.id);
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    pub(crate) fn define_category(
        &self,
        name: &str,
        description: Option<String>,
        sort_order: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<RoleCategory> {
        let category = RoleCategory::new(CategoryId::new(), name, description, sort_order, now)?;

        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state
            .categories
            .values()
            .any(|c| c.name.eq_ignore_ascii_case(&category.name))
        {
            return Err(DomainError::conflict(format!(
                "category '{name}' already exists"
            )));
        }
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    pub fn get(&self, id: RoleId) -> DomainResult<Role> {
        let state = self.state.read().map_err(|_| poisoned())?;
        state.roles.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    pub fn get_by_name(&self, name: &str) -> DomainResult<Role> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let id = state
            .by_name
            .get(&name_key(name))
            .ok_or(DomainError::NotFound)?;
        state.roles.get(id).cloned().ok_or(DomainError::NotFound)
    }

    pub fn list_active(&self) -> DomainResult<Vec<Role>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut roles: Vec<Role> = state
            .roles
            .values()
            .filter(|r| r.is_active)
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    pub fn list_categories(&self) -> DomainResult<Vec<RoleCategory>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut categories: Vec<RoleCategory> = state.categories.values().cloned().collect();
        categories.sort_by_key(|c| c.sort_order);
        Ok(categories)
    }

    /// Rename the display name. The capability tag is untouched, so the
    /// role's authority does not change. Callers gate this through the
    /// engine (super-authority only).
    pub(crate) fn rename_role(&self, id: RoleId, new_name: &str) -> DomainResult<Role> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        let key = name_key(new_name);
        if let Some(existing) = state.by_name.get(&key) {
            if *existing != id {
                return Err(DomainError::conflict(format!(
                    "role '{new_name}' already exists"
                )));
            }
        }

        let role = state.roles.get_mut(&id).ok_or(DomainError::NotFound)?;
        let old_key = name_key(&role.name);
        role.rename(new_name)?;
        let role = role.clone();

        state.by_name.remove(&old_key);
        state.by_name.insert(key, id);
        Ok(role)
    }

    /// Soft retirement: always allowed, only blocks new assignments.
    /// Existing assignments keep granting until revoked or expired.
    pub(crate) fn deactivate_role(&self, id: RoleId) -> DomainResult<Role> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let role = state.roles.get_mut(&id).ok_or(DomainError::NotFound)?;
        role.deactivate();
        Ok(role.clone())
    }
}
