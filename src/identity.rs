//! Owner resolution for submitted memories
//!
//! The wizard never looks up "who is logged in" on its own. Callers pass a
//! resolver built from the request's session context.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the participant a memory belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub String);

impl OwnerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Supplies the identity an in-progress memory is attributed to
pub trait IdentityResolver: Send + Sync {
    fn current_owner_id(&self) -> Option<OwnerId>;

    /// Display name of the participant when acting on someone else's behalf
    fn acting_for(&self) -> Option<String> {
        None
    }
}

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Owns memories; stored as either "user" or "participant"
    #[serde(alias = "user")]
    Participant,
    /// Caregiver account linked to participants
    #[serde(alias = "admin")]
    Supporter,
}

/// Logged-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: OwnerId,
    pub role: Role,
    #[serde(default)]
    pub full_name: Option<String>,
}

/// Participant a supporter has selected to act for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: OwnerId,
    pub full_name: String,
}

/// Explicit per-request session context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionContext {
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub selected_participant: Option<Participant>,
}

impl SessionContext {
    pub fn participant(id: impl Into<String>) -> Self {
        Self {
            profile: Some(Profile {
                id: OwnerId::new(id),
                role: Role::Participant,
                full_name: None,
            }),
            selected_participant: None,
        }
    }

    pub fn supporter(id: impl Into<String>, selected: Option<Participant>) -> Self {
        Self {
            profile: Some(Profile {
                id: OwnerId::new(id),
                role: Role::Supporter,
                full_name: None,
            }),
            selected_participant: selected,
        }
    }

    fn is_participant(&self) -> bool {
        matches!(&self.profile, Some(p) if p.role == Role::Participant)
    }
}

impl IdentityResolver for SessionContext {
    fn current_owner_id(&self) -> Option<OwnerId> {
        let owner = if self.is_participant() {
            self.profile.as_ref().map(|p| p.id.clone())
        } else {
            self.selected_participant.as_ref().map(|p| p.id.clone())
        };
        owner.filter(|id| !id.is_empty())
    }

    fn acting_for(&self) -> Option<String> {
        if self.is_participant() {
            return None;
        }
        self.selected_participant.as_ref().map(|p| p.full_name.clone())
    }
}

/// Resolver for a fixed owner, handy for batch tools and tests
impl IdentityResolver for OwnerId {
    fn current_owner_id(&self) -> Option<OwnerId> {
        if self.is_empty() {
            None
        } else {
            Some(self.clone())
        }
    }
}
