//! Core domain types for the Culling Games backend

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod game_state;
pub mod team;
pub mod week;

pub use game_state::*;
pub use team::*;
pub use week::*;

/// ---------- Common type aliases ----------
pub type TeamId = i64;
pub type UserId = i64;
pub type SubmissionId = i64;
pub type PowerId = i64;

/// ---------- Enums ----------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Master,
    Coordinator,
    Team,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Master => "MASTER",
            Role::Coordinator => "COORDINATOR",
            Role::Team => "TEAM",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} `{value}`")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MASTER" => Ok(Role::Master),
            "COORDINATOR" => Ok(Role::Coordinator),
            "TEAM" => Ok(Role::Team),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    Pending,
    Approved,
    Verified,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "PENDING",
            SubmissionStatus::Approved => "APPROVED",
            SubmissionStatus::Verified => "VERIFIED",
            SubmissionStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_reviewed(self) -> bool {
        self != SubmissionStatus::Pending
    }
}

impl FromStr for SubmissionStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(SubmissionStatus::Pending),
            "APPROVED" => Ok(SubmissionStatus::Approved),
            "VERIFIED" => Ok(SubmissionStatus::Verified),
            "REJECTED" => Ok(SubmissionStatus::Rejected),
            other => Err(UnknownVariant {
                kind: "submission status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PowerKind {
    Curse,
    Shield,
}

impl PowerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PowerKind::Curse => "CURSE",
            PowerKind::Shield => "SHIELD",
        }
    }
}

impl FromStr for PowerKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CURSE" => Ok(PowerKind::Curse),
            "SHIELD" => Ok(PowerKind::Shield),
            other => Err(UnknownVariant {
                kind: "power",
                value: other.to_string(),
            }),
        }
    }
}

/// Authenticated identity attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl Caller {
    pub fn has_role(&self, allowed: &[Role]) -> bool {
        allowed.contains(&self.role)
    }
}

/// Leader or member contact card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl Person {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamPower {
    pub id: PowerId,
    pub team_id: TeamId,
    pub power_type: PowerKind,
    pub week_number: i32,
    pub is_active: bool,
    pub used_count: i32,
    pub power_value: i32,
}

impl TeamPower {
    /// Requested but not yet valued or used by a master.
    pub fn is_pending(&self) -> bool {
        !self.is_active && self.used_count == 0 && self.power_value == 0
    }
}
