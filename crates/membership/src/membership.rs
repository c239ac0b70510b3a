use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chapterhouse_core::{
    Aggregate, AggregateRoot, BranchId, DomainError, MembershipId, UserId,
};

/// Membership lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    Pending,
    Active,
    Suspended,
    Lapsed,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::Active => "active",
            MembershipStatus::Suspended => "suspended",
            MembershipStatus::Lapsed => "lapsed",
        }
    }
}

impl core::str::FromStr for MembershipStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(MembershipStatus::Pending),
            "active" => Ok(MembershipStatus::Active),
            "suspended" => Ok(MembershipStatus::Suspended),
            "lapsed" => Ok(MembershipStatus::Lapsed),
            other => Err(DomainError::validation(format!(
                "unknown membership status '{other}'"
            ))),
        }
    }
}

/// Where a reactivated lapsed membership lands.
///
/// The organization's rulebook does not pin this down, so it is a policy
/// knob on the service rather than a hidden assumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactivationPolicy {
    /// Lapsed members re-enter the approval queue.
    #[default]
    ViaPending,
    /// Lapsed members return straight to active.
    DirectToActive,
}

/// Aggregate root: one user's membership in one branch.
///
/// The (user, branch) pair is unique; uniqueness is enforced by the
/// ledger index, identity and lifecycle live here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    id: MembershipId,
    user_id: Option<UserId>,
    branch_id: Option<BranchId>,
    status: MembershipStatus,
    joined_date: Option<DateTime<Utc>>,
    approved_by: Option<UserId>,
    approved_at: Option<DateTime<Utc>>,
    suspension_reason: Option<String>,
    card_issued: bool,
    card_issued_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Membership {
    /// Create an empty, not-yet-registered aggregate instance for rehydration.
    pub fn empty(id: MembershipId) -> Self {
        Self {
            id,
            user_id: None,
            branch_id: None,
            status: MembershipStatus::Pending,
            joined_date: None,
            approved_by: None,
            approved_at: None,
            suspension_reason: None,
            card_issued: false,
            card_issued_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> MembershipId {
        self.id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    pub fn status(&self) -> MembershipStatus {
        self.status
    }

    pub fn joined_date(&self) -> Option<DateTime<Utc>> {
        self.joined_date
    }

    pub fn approved_by(&self) -> Option<UserId> {
        self.approved_by
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.approved_at
    }

    pub fn suspension_reason(&self) -> Option<&str> {
        self.suspension_reason.as_deref()
    }

    pub fn card_issued(&self) -> bool {
        self.card_issued
    }

    pub fn card_issued_at(&self) -> Option<DateTime<Utc>> {
        self.card_issued_at
    }

    pub fn exists(&self) -> bool {
        self.created
    }
}

impl AggregateRoot for Membership {
    type Id = MembershipId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterMembership (user registers against a branch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterMembership {
    pub membership_id: MembershipId,
    pub user_id: UserId,
    pub branch_id: BranchId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveMembership (pending → active).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveMembership {
    pub membership_id: MembershipId,
    pub approved_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: SuspendMembership (active → suspended).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuspendMembership {
    pub membership_id: MembershipId,
    pub suspended_by: UserId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: LapseMembership (active | suspended → lapsed; time-based or
/// explicit).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LapseMembership {
    pub membership_id: MembershipId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReactivateMembership (lapsed → per policy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactivateMembership {
    pub membership_id: MembershipId,
    pub reactivated_by: UserId,
    pub policy: ReactivationPolicy,
    pub occurred_at: DateTime<Utc>,
}

/// Command: IssueCard (active only; one-way flag).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCard {
    pub membership_id: MembershipId,
    pub issued_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipCommand {
    RegisterMembership(RegisterMembership),
    ApproveMembership(ApproveMembership),
    SuspendMembership(SuspendMembership),
    LapseMembership(LapseMembership),
    ReactivateMembership(ReactivateMembership),
    IssueCard(IssueCard),
}

/// Event: MembershipRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRegistered {
    pub membership_id: MembershipId,
    pub user_id: UserId,
    pub branch_id: BranchId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MembershipApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipApproved {
    pub membership_id: MembershipId,
    pub approved_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MembershipSuspended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSuspended {
    pub membership_id: MembershipId,
    pub suspended_by: UserId,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MembershipLapsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipLapsed {
    pub membership_id: MembershipId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MembershipReactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipReactivated {
    pub membership_id: MembershipId,
    pub reactivated_by: UserId,
    /// Status the membership re-entered (per the policy in force).
    pub new_status: MembershipStatus,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CardIssued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardIssued {
    pub membership_id: MembershipId,
    pub issued_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipEvent {
    MembershipRegistered(MembershipRegistered),
    MembershipApproved(MembershipApproved),
    MembershipSuspended(MembershipSuspended),
    MembershipLapsed(MembershipLapsed),
    MembershipReactivated(MembershipReactivated),
    CardIssued(CardIssued),
}

impl MembershipEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            MembershipEvent::MembershipRegistered(_) => "membership.registered",
            MembershipEvent::MembershipApproved(_) => "membership.approved",
            MembershipEvent::MembershipSuspended(_) => "membership.suspended",
            MembershipEvent::MembershipLapsed(_) => "membership.lapsed",
            MembershipEvent::MembershipReactivated(_) => "membership.reactivated",
            MembershipEvent::CardIssued(_) => "membership.card_issued",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            MembershipEvent::MembershipRegistered(e) => e.occurred_at,
            MembershipEvent::MembershipApproved(e) => e.occurred_at,
            MembershipEvent::MembershipSuspended(e) => e.occurred_at,
            MembershipEvent::MembershipLapsed(e) => e.occurred_at,
            MembershipEvent::MembershipReactivated(e) => e.occurred_at,
            MembershipEvent::CardIssued(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Membership {
    type Command = MembershipCommand;
    type Event = MembershipEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            MembershipEvent::MembershipRegistered(e) => {
                self.id = e.membership_id;
                self.user_id = Some(e.user_id);
                self.branch_id = Some(e.branch_id);
                self.status = MembershipStatus::Pending;
                self.joined_date = Some(e.occurred_at);
                self.created = true;
            }
            MembershipEvent::MembershipApproved(e) => {
                self.status = MembershipStatus::Active;
                self.approved_by = Some(e.approved_by);
                self.approved_at = Some(e.occurred_at);
                self.suspension_reason = None;
            }
            MembershipEvent::MembershipSuspended(e) => {
                self.status = MembershipStatus::Suspended;
                self.suspension_reason = e.reason.clone();
            }
            MembershipEvent::MembershipLapsed(_) => {
                self.status = MembershipStatus::Lapsed;
            }
            MembershipEvent::MembershipReactivated(e) => {
                self.status = e.new_status;
                if e.new_status == MembershipStatus::Active {
                    self.approved_by = Some(e.reactivated_by);
                    self.approved_at = Some(e.occurred_at);
                }
                self.suspension_reason = None;
            }
            MembershipEvent::CardIssued(e) => {
                self.card_issued = true;
                self.card_issued_at = Some(e.occurred_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            MembershipCommand::RegisterMembership(cmd) => self.handle_register(cmd),
            MembershipCommand::ApproveMembership(cmd) => self.handle_approve(cmd),
            MembershipCommand::SuspendMembership(cmd) => self.handle_suspend(cmd),
            MembershipCommand::LapseMembership(cmd) => self.handle_lapse(cmd),
            MembershipCommand::ReactivateMembership(cmd) => self.handle_reactivate(cmd),
            MembershipCommand::IssueCard(cmd) => self.handle_issue_card(cmd),
        }
    }
}

impl Membership {
    fn ensure_exists(&self) -> Result<(), DomainError> {
        if self.created {
            Ok(())
        } else {
            Err(DomainError::not_found())
        }
    }

    fn handle_register(
        &self,
        cmd: &RegisterMembership,
    ) -> Result<Vec<MembershipEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict(
                "membership already exists for this user and branch",
            ));
        }

        Ok(vec![MembershipEvent::MembershipRegistered(
            MembershipRegistered {
                membership_id: cmd.membership_id,
                user_id: cmd.user_id,
                branch_id: cmd.branch_id,
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_approve(&self, cmd: &ApproveMembership) -> Result<Vec<MembershipEvent>, DomainError> {
        self.ensure_exists()?;

        match self.status {
            // Deliberate policy: re-approving an active membership is a
            // no-op success so callers can retry safely.
            MembershipStatus::Active => Ok(vec![]),
            MembershipStatus::Pending => Ok(vec![MembershipEvent::MembershipApproved(
                MembershipApproved {
                    membership_id: cmd.membership_id,
                    approved_by: cmd.approved_by,
                    occurred_at: cmd.occurred_at,
                },
            )]),
            current => Err(DomainError::invalid_state(current.as_str(), "approve")),
        }
    }

    fn handle_suspend(&self, cmd: &SuspendMembership) -> Result<Vec<MembershipEvent>, DomainError> {
        self.ensure_exists()?;

        match self.status {
            MembershipStatus::Active => Ok(vec![MembershipEvent::MembershipSuspended(
                MembershipSuspended {
                    membership_id: cmd.membership_id,
                    suspended_by: cmd.suspended_by,
                    reason: cmd.reason.clone(),
                    occurred_at: cmd.occurred_at,
                },
            )]),
            current => Err(DomainError::invalid_state(current.as_str(), "suspend")),
        }
    }

    fn handle_lapse(&self, cmd: &LapseMembership) -> Result<Vec<MembershipEvent>, DomainError> {
        self.ensure_exists()?;

        match self.status {
            MembershipStatus::Active | MembershipStatus::Suspended => {
                Ok(vec![MembershipEvent::MembershipLapsed(MembershipLapsed {
                    membership_id: cmd.membership_id,
                    occurred_at: cmd.occurred_at,
                })])
            }
            current => Err(DomainError::invalid_state(current.as_str(), "lapse")),
        }
    }

    fn handle_reactivate(
        &self,
        cmd: &ReactivateMembership,
    ) -> Result<Vec<MembershipEvent>, DomainError> {
        self.ensure_exists()?;

        match self.status {
            MembershipStatus::Lapsed => {
                let new_status = match cmd.policy {
                    ReactivationPolicy::ViaPending => MembershipStatus::Pending,
                    ReactivationPolicy::DirectToActive => MembershipStatus::Active,
                };
                Ok(vec![MembershipEvent::MembershipReactivated(
                    MembershipReactivated {
                        membership_id: cmd.membership_id,
                        reactivated_by: cmd.reactivated_by,
                        new_status,
                        occurred_at: cmd.occurred_at,
                    },
                )])
            }
            current => Err(DomainError::invalid_state(current.as_str(), "reactivate")),
        }
    }

    fn handle_issue_card(&self, cmd: &IssueCard) -> Result<Vec<MembershipEvent>, DomainError> {
        self.ensure_exists()?;

        if self.status != MembershipStatus::Active {
            return Err(DomainError::invalid_state(
                self.status.as_str(),
                "issue card",
            ));
        }

        // One-way flag: issuing twice is a retry, not an error.
        if self.card_issued {
            return Ok(vec![]);
        }

        Ok(vec![MembershipEvent::CardIssued(CardIssued {
            membership_id: cmd.membership_id,
            issued_by: cmd.issued_by,
            occurred_at: cmd.occurred_at,
        })])
    }
}
