use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Class,
    Club,
    Lab,
    Other,
}

impl GroupKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKind::Class => "class",
            GroupKind::Club => "club",
            GroupKind::Lab => "lab",
            GroupKind::Other => "other",
        }
    }
}

impl fmt::Display for GroupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKind {
    type Err = GroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "class" => Ok(GroupKind::Class),
            "club" => Ok(GroupKind::Club),
            "lab" => Ok(GroupKind::Lab),
            "other" => Ok(GroupKind::Other),
            _ => Err(GroupError::InvalidKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupRole {
    Admin,
    Member,
}

impl GroupRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupRole::Admin => "admin",
            GroupRole::Member => "member",
        }
    }
}

impl fmt::Display for GroupRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupRole {
    type Err = GroupError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(GroupRole::Admin),
            "member" => Ok(GroupRole::Member),
            _ => Err(GroupError::InvalidRole(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GroupError {
    #[error("group name must not be empty")]
    EmptyName,
    #[error("unknown group type {0:?}, expected class, club, lab or other")]
    InvalidKind(String),
    #[error("unknown member role {0:?}")]
    InvalidRole(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: GroupKind,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Name and description are trimmed; a blank description is dropped.
    pub fn new(name: &str, description: Option<&str>, kind: GroupKind, created_by: &str) -> Result<Self, GroupError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GroupError::EmptyName);
        }

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.map(str::trim).filter(|d| !d.is_empty()).map(str::to_string),
            kind,
            created_by: created_by.to_string(),
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupMember {
    pub id: String,
    pub group_id: String,
    pub user_id: String,
    pub role: GroupRole,
    pub joined_at: DateTime<Utc>,
}

impl GroupMember {
    pub fn new(group_id: &str, user_id: &str, role: GroupRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            user_id: user_id.to_string(),
            role,
            joined_at: Utc::now(),
        }
    }
}
