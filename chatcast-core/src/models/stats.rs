use serde::{Deserialize, Serialize};

use super::event::AuthorRoles;

/// Aggregate counters for one channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub total_messages: u64,
    pub unique_users: Vec<UserStat>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStat {
    pub id: String,
    pub username: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub roles: AuthorRoles,
    pub message_count: u64,
}

impl ChannelStats {
    /// Authors sorted by descending message count, truncated to `limit`.
    #[must_use]
    pub fn top_users(&self, limit: usize) -> Vec<UserStat> {
        let mut users = self.unique_users.clone();
        users.sort_by(|a, b| b.message_count.cmp(&a.message_count));
        users.truncate(limit);
        users
    }
}
