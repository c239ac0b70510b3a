//! Assignment ledger: append-only event streams per assignment plus the
//! per-user and duplicate-active indexes.
//!
//! `list_effective` is the primary input to every authorization decision
//! and always reads current ledger state — there is no cross-request
//! cache, so a revocation is visible to the very next check.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use chapterhouse_core::{
    Aggregate, AggregateRoot, AssignmentId, DomainError, DomainResult, ExpectedVersion, RoleId,
    UserId,
};
use chapterhouse_assignments::{
    AmendNotes, Appoint, AssignmentCommand, AssignmentEvent, AssignmentScope, ExecutiveAssignment,
    Revoke,
};

#[derive(Debug, Default)]
struct LedgerState {
    streams: HashMap<AssignmentId, Vec<AssignmentEvent>>,
    by_user: HashMap<UserId, Vec<AssignmentId>>,
    /// (user, role) pairs with a currently-active assignment; one user
    /// may not hold the same role twice at once.
    active_pairs: HashSet<(UserId, RoleId)>,
}

#[derive(Debug, Default)]
pub struct AssignmentLedger {
    state: RwLock<LedgerState>,
}

fn poisoned() -> DomainError {
    DomainError::conflict("assignment ledger lock poisoned")
}

fn rehydrate(id: AssignmentId, stream: &[AssignmentEvent]) -> ExecutiveAssignment {
    let mut assignment = ExecutiveAssignment::empty(id);
    for event in stream {
        assignment.apply(event);
    }
    assignment
}

impl AssignmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appoint a user to a role within a validated scope.
    ///
    /// Scope validity against the role's scope type and the authorization
    /// decision are the caller's (service's) responsibility; this ledger
    /// enforces the duplicate-active-assignment rule and persists.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn appoint(
        &self,
        user_id: UserId,
        role_id: RoleId,
        scope: AssignmentScope,
        appointed_by: UserId,
        start_date: Option<DateTime<Utc>>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<ExecutiveAssignment> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        if state.active_pairs.contains(&(user_id, role_id)) {
            return Err(DomainError::conflict(
                "user already holds an active assignment of this role",
            ));
        }

        let assignment_id = AssignmentId::new();
        let aggregate = ExecutiveAssignment::empty(assignment_id);
        let events = aggregate.handle(&AssignmentCommand::Appoint(Appoint {
            assignment_id,
            user_id,
            role_id,
            scope,
            appointed_by,
            start_date,
            notes,
            occurred_at: now,
        }))?;

        let mut next = aggregate;
        for event in &events {
            next.apply(event);
        }
        state.streams.insert(assignment_id, events);
        state.by_user.entry(user_id).or_default().push(assignment_id);
        state.active_pairs.insert((user_id, role_id));
        Ok(next)
    }

    /// Close an assignment's grant window (end_date = now,
    /// is_active = false). The stream is kept; nothing is deleted.
    pub(crate) fn revoke(
        &self,
        assignment_id: AssignmentId,
        revoked_by: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<ExecutiveAssignment> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        let stream = state
            .streams
            .get_mut(&assignment_id)
            .ok_or(DomainError::NotFound)?;
        let assignment = rehydrate(assignment_id, stream);

        let events = assignment.handle(&AssignmentCommand::Revoke(Revoke {
            assignment_id,
            revoked_by,
            occurred_at: now,
        }))?;

        let mut next = assignment;
        for event in &events {
            next.apply(event);
        }
        stream.extend(events);

        if let (Some(user_id), Some(role_id)) = (next.user_id(), next.role_id()) {
            state.active_pairs.remove(&(user_id, role_id));
        }
        Ok(next)
    }

    pub(crate) fn amend_notes(
        &self,
        assignment_id: AssignmentId,
        notes: Option<String>,
        expected: ExpectedVersion,
        now: DateTime<Utc>,
    ) -> DomainResult<ExecutiveAssignment> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        let stream = state
            .streams
            .get_mut(&assignment_id)
            .ok_or(DomainError::NotFound)?;
        let assignment = rehydrate(assignment_id, stream);
        expected.check(assignment.version())?;

        let events = assignment.handle(&AssignmentCommand::AmendNotes(AmendNotes {
            assignment_id,
            notes,
            occurred_at: now,
        }))?;

        let mut next = assignment;
        for event in &events {
            next.apply(event);
        }
        stream.extend(events);
        Ok(next)
    }

    pub fn get(&self, assignment_id: AssignmentId) -> DomainResult<ExecutiveAssignment> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let stream = state
            .streams
            .get(&assignment_id)
            .ok_or(DomainError::NotFound)?;
        Ok(rehydrate(assignment_id, stream))
    }

    /// All currently-effective assignments for a user at `now`.
    pub fn list_effective(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<ExecutiveAssignment>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let ids = state.by_user.get(&user_id).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| state.streams.get(&id).map(|s| rehydrate(id, s)))
            .filter(|a| a.is_effective_at(now))
            .collect())
    }

    /// Every assignment the user has ever held, revoked ones included.
    pub fn list_for_user(&self, user_id: UserId) -> DomainResult<Vec<ExecutiveAssignment>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let ids = state.by_user.get(&user_id).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| state.streams.get(&id).map(|s| rehydrate(id, s)))
            .collect())
    }
}
