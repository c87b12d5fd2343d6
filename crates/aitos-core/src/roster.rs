//! Team roster

use crate::identity::CurrentUser;
use crate::storage::{self, KeyValueStore, TEAM_MEMBERS_KEY};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Active,
    Away,
    Busy,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MemberStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberStatus::Active => "active",
            MemberStatus::Away => "away",
            MemberStatus::Busy => "busy",
            MemberStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    pub user_id: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub status: MemberStatus,
}

impl TeamMember {
    /// Upper-cased first letters of each word in the display name
    pub fn initials(&self) -> String {
        self.display_name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    fn for_user(user: &CurrentUser) -> Self {
        Self {
            id: user.id.clone(),
            user_id: user.id.clone(),
            email: user.email_or_default(),
            display_name: user.display_name(),
            role: "Team Member".to_string(),
            avatar_url: None,
            status: MemberStatus::Active,
        }
    }
}

/// The roster written on first run
pub fn default_members() -> Vec<TeamMember> {
    [
        ("mock-1", "mock-user-1", "oriel", "Oriel", "Team Leader"),
        ("mock-2", "mock-user-2", "nitish", "Nitish", "Developer"),
        ("mock-3", "mock-user-3", "daniel", "Daniel", "COO & CTO"),
    ]
    .into_iter()
    .map(|(id, user_id, handle, name, role)| TeamMember {
        id: id.to_string(),
        user_id: user_id.to_string(),
        email: format!("{handle}@ait-os.com"),
        display_name: name.to_string(),
        role: role.to_string(),
        avatar_url: None,
        status: MemberStatus::Active,
    })
    .collect()
}

pub struct RosterStore {
    store: Arc<dyn KeyValueStore>,
    members: Vec<TeamMember>,
}

impl RosterStore {
    /// Load the persisted roster, falling back to the default members when
    /// nothing usable is stored
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let members = match storage::read_list(store.as_ref(), TEAM_MEMBERS_KEY) {
            Ok(Some(members)) => members,
            Ok(None) => default_members(),
            Err(e) => {
                tracing::warn!(error = %e, "team roster unreadable, using defaults");
                default_members()
            }
        };
        Self { store, members }
    }

    /// Add the signed-in user to the roster unless a member with the same
    /// user id already exists. Returns true when a member was added.
    pub fn ensure_current_user(&mut self, user: &CurrentUser) -> bool {
        if self.find_by_user_id(&user.id).is_some() {
            return false;
        }

        let member = TeamMember::for_user(user);
        tracing::info!(user_id = %member.user_id, name = %member.display_name, "adding current user to roster");
        self.members.push(member);
        self.persist();
        true
    }

    pub fn find_by_user_id(&self, user_id: &str) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn members(&self) -> &[TeamMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// One "- Name (Role)" line per member, for prompt context
    pub fn team_context(&self) -> String {
        self.members
            .iter()
            .map(|m| format!("- {} ({})", m.display_name, m.role))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn persist(&self) {
        if let Err(e) = storage::write_list(self.store.as_ref(), TEAM_MEMBERS_KEY, &self.members) {
            tracing::error!(error = %e, "failed to persist team roster");
        }
    }
}
