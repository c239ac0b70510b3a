use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use chapterhouse_core::{DomainError, DomainResult};

/// Action a role may take on a resource area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Read,
    Write,
    Create,
    Update,
    Delete,
    Approve,
    Assign,
    Manage,
    /// Grants every action on the area.
    All,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Read => "read",
            Action::Write => "write",
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Approve => "approve",
            Action::Assign => "assign",
            Action::Manage => "manage",
            Action::All => "all",
        }
    }
}

impl core::str::FromStr for Action {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "read" => Ok(Action::Read),
            "write" => Ok(Action::Write),
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            "approve" => Ok(Action::Approve),
            "assign" => Ok(Action::Assign),
            "manage" => Ok(Action::Manage),
            "all" => Ok(Action::All),
            other => Err(DomainError::validation(format!("unknown action '{other}'"))),
        }
    }
}

/// Mapping from resource-area name (e.g. `"finance"`, `"members"`) to the
/// actions a role holder may take there.
///
/// Areas are opaque strings at this layer; BTree containers keep
/// serialization deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(BTreeMap<String, BTreeSet<Action>>);

impl PermissionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, area: impl Into<String>, actions: impl IntoIterator<Item = Action>) -> Self {
        self.0.entry(area.into()).or_default().extend(actions);
        self
    }

    pub fn allows(&self, area: &str, action: Action) -> bool {
        self.0
            .get(area)
            .is_some_and(|actions| actions.contains(&Action::All) || actions.contains(&action))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn areas(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Parse from the wire shape (`{"finance": ["read", "write"]}`),
    /// rejecting unknown action names.
    pub fn parse(raw: &BTreeMap<String, Vec<String>>) -> DomainResult<Self> {
        let mut set = PermissionSet::new();
        for (area, actions) in raw {
            if area.trim().is_empty() {
                return Err(DomainError::validation("permission area cannot be empty"));
            }
            let parsed = actions
                .iter()
                .map(|a| a.parse::<Action>())
                .collect::<DomainResult<Vec<_>>>()?;
            set = set.grant(area.clone(), parsed);
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_covers_every_action() {
        let perms = PermissionSet::new().grant("finance", [Action::All]);
        assert!(perms.allows("finance", Action::Delete));
        assert!(!perms.allows("members", Action::Read));
    }

    #[test]
    fn parse_rejects_unknown_action() {
        let mut raw = BTreeMap::new();
        raw.insert("finance".to_string(), vec!["transmogrify".to_string()]);
        let err = PermissionSet::parse(&raw).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
