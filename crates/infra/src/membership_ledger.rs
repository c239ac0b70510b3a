//! Membership ledger: append-only event streams per membership plus the
//! (user, branch) uniqueness index, all behind one lock.
//!
//! Every mutation is a single read-evaluate-write section: rehydrate the
//! aggregate, run the pure command handler, check the expected version,
//! append. Two concurrent registrations for the same (user, branch) pair
//! serialize on the write lock and the second hits the index.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use chapterhouse_core::{
    Aggregate, AggregateRoot, BranchId, DomainError, DomainResult, ExpectedVersion, MembershipId,
    UserId,
};
use chapterhouse_membership::{
    Membership, MembershipCommand, MembershipEvent, RegisterMembership,
};

#[derive(Debug, Default)]
struct LedgerState {
    streams: HashMap<MembershipId, Vec<MembershipEvent>>,
    by_user_branch: HashMap<(UserId, BranchId), MembershipId>,
    by_branch: HashMap<BranchId, Vec<MembershipId>>,
}

#[derive(Debug, Default)]
pub struct MembershipLedger {
    state: RwLock<LedgerState>,
}

fn poisoned() -> DomainError {
    DomainError::conflict("membership ledger lock poisoned")
}

fn rehydrate(id: MembershipId, stream: &[MembershipEvent]) -> Membership {
    let mut membership = Membership::empty(id);
    for event in stream {
        membership.apply(event);
    }
    membership
}

impl MembershipLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a membership in `pending` for (user, branch).
    ///
    /// Conflict if the pair already has a membership, whatever its state —
    /// lapsed members reactivate, they do not re-register.
    pub(crate) fn register(
        &self,
        user_id: UserId,
        branch_id: BranchId,
        now: DateTime<Utc>,
    ) -> DomainResult<Membership> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        if state.by_user_branch.contains_key(&(user_id, branch_id)) {
            return Err(DomainError::conflict(
                "user is already a member of this branch",
            ));
        }

        let membership_id = MembershipId::new();
        let aggregate = Membership::empty(membership_id);
        let events = aggregate.handle(&MembershipCommand::RegisterMembership(
            RegisterMembership {
                membership_id,
                user_id,
                branch_id,
                occurred_at: now,
            },
        ))?;

        let mut next = aggregate;
        for event in &events {
            next.apply(event);
        }
        state.streams.insert(membership_id, events);
        state.by_user_branch.insert((user_id, branch_id), membership_id);
        state.by_branch.entry(branch_id).or_default().push(membership_id);
        Ok(next)
    }

    /// Run a lifecycle command against an existing membership.
    ///
    /// The expected-version check runs inside the lock; a concurrent
    /// writer that slipped in between the caller's read and this write
    /// surfaces as a conflict rather than a lost update.
    pub(crate) fn execute(
        &self,
        membership_id: MembershipId,
        command: &MembershipCommand,
        expected: ExpectedVersion,
    ) -> DomainResult<Membership> {
        let mut state = self.state.write().map_err(|_| poisoned())?;

        let stream = state
            .streams
            .get_mut(&membership_id)
            .ok_or(DomainError::NotFound)?;
        let membership = rehydrate(membership_id, stream);
        expected.check(membership.version())?;

        let events = membership.handle(command)?;
        let mut next = membership;
        for event in &events {
            next.apply(event);
        }
        stream.extend(events);
        Ok(next)
    }

    pub fn get(&self, membership_id: MembershipId) -> DomainResult<Membership> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let stream = state
            .streams
            .get(&membership_id)
            .ok_or(DomainError::NotFound)?;
        Ok(rehydrate(membership_id, stream))
    }

    pub fn list_for_branch(&self, branch_id: BranchId) -> DomainResult<Vec<Membership>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let ids = state.by_branch.get(&branch_id).cloned().unwrap_or_default();
        Ok(ids
            .into_iter()
            .filter_map(|id| state.streams.get(&id).map(|s| rehydrate(id, s)))
            .collect())
    }

    pub fn count_active_in_branch(&self, branch_id: BranchId) -> DomainResult<usize> {
        Ok(self
            .list_for_branch(branch_id)?
            .into_iter()
            .filter(|m| m.status() == chapterhouse_membership::MembershipStatus::Active)
            .count())
    }

    /// Full audit trail for one membership.
    pub fn history(&self, membership_id: MembershipId) -> DomainResult<Vec<MembershipEvent>> {
        let state = self.state.read().map_err(|_| poisoned())?;
        state
            .streams
            .get(&membership_id)
            .cloned()
            .ok_or(DomainError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chapterhouse_membership::{ApproveMembership, MembershipStatus};

    #[test]
    fn register_is_unique_per_user_and_branch() {
        let ledger = MembershipLedger::new();
        let user = UserId::new();
        let branch = BranchId::new();

        let membership = ledger.register(user, branch, Utc::now()).unwrap();
        assert_eq!(membership.status(), MembershipStatus::Pending);

        let err = ledger.register(user, branch, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        // A different branch is a separate membership.
        assert!(ledger.register(user, BranchId::new(), Utc::now()).is_ok());
    }

    #[test]
    fn stale_expected_version_conflicts() {
        let ledger = MembershipLedger::new();
        let membership = ledger.register(UserId::new(), BranchId::new(), Utc::now()).unwrap();
        let id = membership.id_typed();

        let approve = MembershipCommand::ApproveMembership(ApproveMembership {
            membership_id: id,
            approved_by: UserId::new(),
            occurred_at: Utc::now(),
        });

        ledger.execute(id, &approve, ExpectedVersion::Exact(1)).unwrap();
        // A writer holding the pre-approval version loses.
        let err = ledger
            .execute(
                id,
                &MembershipCommand::SuspendMembership(chapterhouse_membership::SuspendMembership {
                    membership_id: id,
                    suspended_by: UserId::new(),
                    reason: None,
                    occurred_at: Utc::now(),
                }),
                ExpectedVersion::Exact(1),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn history_preserves_every_transition() {
        let ledger = MembershipLedger::new();
        let membership = ledger.register(UserId::new(), BranchId::new(), Utc::now()).unwrap();
        let id = membership.id_typed();

        ledger
            .execute(
                id,
                &MembershipCommand::ApproveMembership(ApproveMembership {
                    membership_id: id,
                    approved_by: UserId::new(),
                    occurred_at: Utc::now(),
                }),
                ExpectedVersion::Any,
            )
            .unwrap();

        let history = ledger.history(id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].event_type(), "membership.registered");
        assert_eq!(history[1].event_type(), "membership.approved");
    }
}
