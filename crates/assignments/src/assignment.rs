use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chapterhouse_core::{Aggregate, AggregateRoot, AssignmentId, DomainError, RoleId, UserId};

use crate::scope::AssignmentScope;

/// Aggregate root: a time-bounded grant of one role to one user within
/// one scope instance.
///
/// Assignments are never deleted; revocation closes the window
/// (end_date = now, is_active = false) so the appointment history stays
/// auditable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutiveAssignment {
    id: AssignmentId,
    user_id: Option<UserId>,
    role_id: Option<RoleId>,
    scope: Option<AssignmentScope>,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    is_active: bool,
    appointed_by: Option<UserId>,
    notes: Option<String>,
    version: u64,
    created: bool,
}

impl ExecutiveAssignment {
    /// Create an empty, not-yet-appointed aggregate instance for rehydration.
    pub fn empty(id: AssignmentId) -> Self {
        Self {
            id,
            user_id: None,
            role_id: None,
            scope: None,
            start_date: None,
            end_date: None,
            is_active: false,
            appointed_by: None,
            notes: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> AssignmentId {
        self.id
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    pub fn role_id(&self) -> Option<RoleId> {
        self.role_id
    }

    pub fn scope(&self) -> Option<AssignmentScope> {
        self.scope
    }

    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn appointed_by(&self) -> Option<UserId> {
        self.appointed_by
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    pub fn exists(&self) -> bool {
        self.created
    }

    /// "Currently effective": active, started, and not past its end date.
    pub fn is_effective_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date.is_some_and(|start| start <= now)
            && self.end_date.is_none_or(|end| end > now)
    }
}

impl AggregateRoot for ExecutiveAssignment {
    type Id = AssignmentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: Appoint a user to a role within a scope.
///
/// Scope validity against the role's scope type is checked by the caller
/// (the ledger), which holds the role; the aggregate enforces lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appoint {
    pub assignment_id: AssignmentId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub scope: AssignmentScope,
    pub appointed_by: UserId,
    pub start_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Revoke (close the grant window).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revoke {
    pub assignment_id: AssignmentId,
    pub revoked_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AmendNotes on a live assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmendNotes {
    pub assignment_id: AssignmentId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentCommand {
    Appoint(Appoint),
    Revoke(Revoke),
    AmendNotes(AmendNotes),
}

/// Event: Appointed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointed {
    pub assignment_id: AssignmentId,
    pub user_id: UserId,
    pub role_id: RoleId,
    pub scope: AssignmentScope,
    pub appointed_by: UserId,
    pub start_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: Revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revoked {
    pub assignment_id: AssignmentId,
    pub revoked_by: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: NotesAmended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotesAmended {
    pub assignment_id: AssignmentId,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssignmentEvent {
    Appointed(Appointed),
    Revoked(Revoked),
    NotesAmended(NotesAmended),
}

impl AssignmentEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            AssignmentEvent::Appointed(_) => "assignment.appointed",
            AssignmentEvent::Revoked(_) => "assignment.revoked",
            AssignmentEvent::NotesAmended(_) => "assignment.notes_amended",
        }
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            AssignmentEvent::Appointed(e) => e.occurred_at,
            AssignmentEvent::Revoked(e) => e.occurred_at,
            AssignmentEvent::NotesAmended(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ExecutiveAssignment {
    type Command = AssignmentCommand;
    type Event = AssignmentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            AssignmentEvent::Appointed(e) => {
                self.id = e.assignment_id;
                self.user_id = Some(e.user_id);
                self.role_id = Some(e.role_id);
                self.scope = Some(e.scope);
                self.start_date = Some(e.start_date);
                self.end_date = None;
                self.is_active = true;
                self.appointed_by = Some(e.appointed_by);
                self.notes = e.notes.clone();
                self.created = true;
            }
            AssignmentEvent::Revoked(e) => {
                self.is_active = false;
                self.end_date = Some(e.occurred_at);
            }
            AssignmentEvent::NotesAmended(e) => {
                self.notes = e.notes.clone();
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            AssignmentCommand::Appoint(cmd) => self.handle_appoint(cmd),
            AssignmentCommand::Revoke(cmd) => self.handle_revoke(cmd),
            AssignmentCommand::AmendNotes(cmd) => self.handle_amend_notes(cmd),
        }
    }
}

impl ExecutiveAssignment {
    fn handle_appoint(&self, cmd: &Appoint) -> Result<Vec<AssignmentEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("assignment already exists"));
        }

        Ok(vec![AssignmentEvent::Appointed(Appointed {
            assignment_id: cmd.assignment_id,
            user_id: cmd.user_id,
            role_id: cmd.role_id,
            scope: cmd.scope,
            appointed_by: cmd.appointed_by,
            start_date: cmd.start_date.unwrap_or(cmd.occurred_at),
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_revoke(&self, cmd: &Revoke) -> Result<Vec<AssignmentEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if !self.is_active {
            return Err(DomainError::invalid_state("revoked", "revoke"));
        }

        Ok(vec![AssignmentEvent::Revoked(Revoked {
            assignment_id: cmd.assignment_id,
            revoked_by: cmd.revoked_by,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_amend_notes(&self, cmd: &AmendNotes) -> Result<Vec<AssignmentEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }

        Ok(vec![AssignmentEvent::NotesAmended(NotesAmended {
            assignment_id: cmd.assignment_id,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}
