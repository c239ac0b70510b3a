//! Organization hierarchy store: chapters and branches.
//!
//! Uniqueness (branch name per chapter) and referential integrity (a
//! branch cannot outlive its chapter) are enforced here, inside one write
//! lock per mutation. The store does not self-authorize, so its mutators
//! are crate-private: the only way in from outside is through the
//! service, which gates every mutation on the authorization engine.
//! Reads stay public.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use chapterhouse_core::{BranchId, ChapterId, DomainError, DomainResult, UserId};
use chapterhouse_org::{Branch, BranchStatus, Chapter, ChapterStatus};

#[derive(Debug, Default)]
struct OrgState {
    chapters: HashMap<ChapterId, Chapter>,
    branches: HashMap<BranchId, Branch>,
    /// (chapter, lowercased branch name) → branch, for per-chapter
    /// uniqueness.
    branch_names: HashMap<(ChapterId, String), BranchId>,
}

/// In-memory hierarchy store.
#[derive(Debug, Default)]
pub struct OrgStore {
    state: RwLock<OrgState>,
}

fn poisoned() -> DomainError {
    DomainError::conflict("org store lock poisoned")
}

fn name_key(chapter_id: ChapterId, name: &str) -> (ChapterId, String) {
    (chapter_id, name.trim().to_lowercase())
}

impl OrgStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn create_chapter(
        &self,
        name: &str,
        country: &str,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Chapter> {
        let chapter = Chapter::new(ChapterId::new(), name, country, description, now)?;

        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state
            .chapters
            .values()
            .any(|c| c.name.eq_ignore_ascii_case(&chapter.name))
        {
            return Err(DomainError::conflict(format!(
                "chapter '{name}' already exists"
            )));
        }
        state.chapters.insert(chapter.id, chapter.clone());
        Ok(chapter)
    }

    pub fn get_chapter(&self, id: ChapterId) -> DomainResult<Chapter> {
        let state = self.state.read().map_err(|_| poisoned())?;
        state.chapters.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    pub(crate) fn set_chapter_status(
        &self,
        id: ChapterId,
        status: ChapterStatus,
    ) -> DomainResult<Chapter> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let chapter = state.chapters.get_mut(&id).ok_or(DomainError::NotFound)?;
        chapter.set_status(status);
        Ok(chapter.clone())
    }

    pub(crate) fn create_branch(
        &self,
        chapter_id: ChapterId,
        name: &str,
        location: &str,
        description: Option<String>,
        min_members: Option<u32>,
        created_by: Option<UserId>,
        now: DateTime<Utc>,
    ) -> DomainResult<Branch> {
        let branch = Branch::new(
            BranchId::new(),
            chapter_id,
            name,
            location,
            description,
            min_members,
            created_by,
            now,
        )?;

        let mut state = self.state.write().map_err(|_| poisoned())?;
        let chapter = state
            .chapters
            .get(&chapter_id)
            .ok_or(DomainError::NotFound)?;
        if !chapter.is_active() {
            return Err(DomainError::invalid_state(
                chapter.status.as_str(),
                "create branch",
            ));
        }

        let key = name_key(chapter_id, &branch.name);
        if state.branch_names.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "branch '{name}' already exists in this chapter"
            )));
        }

        state.branch_names.insert(key, branch.id);
        state.branches.insert(branch.id, branch.clone());
        Ok(branch)
    }

    pub fn get_branch(&self, id: BranchId) -> DomainResult<Branch> {
        let state = self.state.read().map_err(|_| poisoned())?;
        state.branches.get(&id).cloned().ok_or(DomainError::NotFound)
    }

    pub fn list_active_branches(&self) -> DomainResult<Vec<Branch>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut branches: Vec<Branch> = state
            .branches
            .values()
            .filter(|b| b.is_active())
            .cloned()
            .collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    pub fn list_branches_of(&self, chapter_id: ChapterId) -> DomainResult<Vec<Branch>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let mut branches: Vec<Branch> = state
            .branches
            .values()
            .filter(|b| b.chapter_id == chapter_id)
            .cloned()
            .collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(branches)
    }

    pub(crate) fn set_branch_status(&self, id: BranchId, status: BranchStatus) -> DomainResult<Branch> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let branch = state.branches.get_mut(&id).ok_or(DomainError::NotFound)?;
        branch.set_status(status);
        Ok(branch.clone())
    }

    /// Full teardown of a chapter and every branch in it. The only true
    /// delete in the model; everything else is a soft status change.
    pub(crate) fn teardown_chapter(&self, id: ChapterId) -> DomainResult<()> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.chapters.remove(&id).is_none() {
            return Err(DomainError::NotFound);
        }
        state.branches.retain(|_, b| b.chapter_id != id);
        state.branch_names.retain(|(chapter, _), _| *chapter != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_chapter() -> (OrgStore, ChapterId) {
        let store = OrgStore::new();
        let chapter = store
            .create_chapter("NDC UK", "UK", None, Utc::now())
            .unwrap();
        (store, chapter.id)
    }

    #[test]
    fn duplicate_branch_name_in_chapter_conflicts() {
        let (store, chapter) = store_with_chapter();
        store
            .create_branch(chapter, "Leeds Branch", "Leeds", None, None, None, Utc::now())
            .unwrap();
        let err = store
            .create_branch(chapter, "leeds branch", "Leeds", None, None, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn same_name_in_different_chapters_is_fine() {
        let (store, chapter_a) = store_with_chapter();
        let chapter_b = store
            .create_chapter("NDC Germany", "DE", None, Utc::now())
            .unwrap()
            .id;
        store
            .create_branch(chapter_a, "Central", "London", None, None, None, Utc::now())
            .unwrap();
        assert!(store
            .create_branch(chapter_b, "Central", "Berlin", None, None, None, Utc::now())
            .is_ok());
    }

    #[test]
    fn branch_requires_existing_active_chapter() {
        let store = OrgStore::new();
        let err = store
            .create_branch(
                ChapterId::new(),
                "Orphan",
                "Nowhere",
                None,
                None,
                None,
                Utc::now(),
            )
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    #[test]
    fn teardown_cascades_to_branches() {
        let (store, chapter) = store_with_chapter();
        let branch = store
            .create_branch(chapter, "Hull Branch", "Hull", None, None, None, Utc::now())
            .unwrap();
        store.teardown_chapter(chapter).unwrap();
        assert_eq!(store.get_branch(branch.id).unwrap_err(), DomainError::NotFound);
    }

    #[test]
    fn list_active_filters_pending_branches() {
        let (store, chapter) = store_with_chapter();
        let branch = store
            .create_branch(chapter, "Kent Branch", "Kent", None, None, None, Utc::now())
            .unwrap();
        assert!(store.list_active_branches().unwrap().is_empty());
        store.set_branch_status(branch.id, BranchStatus::Active).unwrap();
        assert_eq!(store.list_active_branches().unwrap().len(), 1);
    }
}
