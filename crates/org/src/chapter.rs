use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use chapterhouse_core::{ChapterId, DomainError, DomainResult, Entity};

/// Chapter lifecycle status. Closed set; unknown wire values are rejected
/// at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterStatus {
    Active,
    Inactive,
}

impl ChapterStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChapterStatus::Active => "active",
            ChapterStatus::Inactive => "inactive",
        }
    }
}

impl core::str::FromStr for ChapterStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ChapterStatus::Active),
            "inactive" => Ok(ChapterStatus::Inactive),
            other => Err(DomainError::validation(format!(
                "unknown chapter status '{other}'"
            ))),
        }
    }
}

/// Top-level organizational unit. Owns branches; never physically deleted
/// while branches reference it (cascade teardown only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub name: String,
    pub country: String,
    pub description: Option<String>,
    pub status: ChapterStatus,
    pub created_at: DateTime<Utc>,
}

impl Chapter {
    pub fn new(
        id: ChapterId,
        name: impl Into<String>,
        country: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("chapter name cannot be empty"));
        }
        let country = country.into();
        if country.trim().is_empty() {
            return Err(DomainError::validation("chapter country cannot be empty"));
        }

        Ok(Self {
            id,
            name,
            country,
            description,
            status: ChapterStatus::Active,
            created_at,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == ChapterStatus::Active
    }

    /// Status change; idempotent (setting the current status is a no-op).
    pub fn set_status(&mut self, status: ChapterStatus) {
        self.status = status;
    }
}

impl Entity for Chapter {
    type Id = ChapterId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
