use std::collections::{HashMap, HashSet};

use contracts::domain::a001_audit_log::dto::{LogEntry, LogEntryView};
use contracts::system::users::User;

/// `{prefix}{firstname} {lastname}`, trimmed. No space after the prefix.
pub fn display_name(prefix: &str, firstname: &str, lastname: &str) -> String {
    format!("{}{} {}", prefix, firstname, lastname)
        .trim()
        .to_string()
}

/// Snapshot of the identity table taken once per request: which owners are
/// active (not soft-deleted) and what every owner, deleted or not, is called.
#[derive(Debug, Clone, Default)]
pub struct OwnerDirectory {
    active: HashSet<String>,
    names: HashMap<String, String>,
}

impl OwnerDirectory {
    pub fn from_users(users: impl IntoIterator<Item = User>) -> Self {
        let mut directory = Self::default();
        for user in users {
            if !user.is_deleted {
                directory.active.insert(user.id.clone());
            }
            let name = display_name(&user.prefix, &user.firstname, &user.lastname);
            directory.names.insert(user.id, name);
        }
        directory
    }

    pub fn is_active(&self, owner_id: &str) -> bool {
        self.active.contains(owner_id)
    }

    pub fn has_active(&self) -> bool {
        !self.active.is_empty()
    }

    /// Active owner ids in a stable order
    pub fn active_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.active.iter().cloned().collect();
        ids.sort();
        ids
    }

    /// Empty when the owner cannot be resolved
    pub fn display_name(&self, owner_id: &str) -> &str {
        self.names.get(owner_id).map(String::as_str).unwrap_or("")
    }

    pub fn enrich(&self, entry: LogEntry) -> LogEntryView {
        let user_name = self.display_name(&entry.user_id).to_string();
        LogEntryView { entry, user_name }
    }
}
