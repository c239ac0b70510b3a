//! `chapterhouse-membership` — the membership lifecycle aggregate.
//!
//! pending → active → suspended/lapsed, card issuance, and the
//! reactivation policy knob. Pure decision logic; persistence and
//! uniqueness live in the infra ledger.

pub mod membership;

pub use membership::{
    ApproveMembership, CardIssued, IssueCard, LapseMembership, Membership, MembershipApproved,
    MembershipCommand, MembershipEvent, MembershipLapsed, MembershipReactivated,
    MembershipRegistered, MembershipStatus, MembershipSuspended, ReactivateMembership,
    ReactivationPolicy, RegisterMembership, SuspendMembership,
};
