use serde::{Deserialize, Serialize};

/// Tag assigned to profiles that have never been seen before.
pub const NEW_USER_TAG: &str = "新用户";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Long-lived per-user interest profile.
///
/// Tags accumulate monotonically: the tagging heuristic only ever appends,
/// duplicates are suppressed, and the storage layer replaces the whole set
/// on write (last writer wins, no conflict detection).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: UserId,
    pub tags: Vec<String>,
}

impl UserProfile {
    /// Synthesized profile for users with no stored profile row.
    pub fn default_for(user_id: UserId) -> Self {
        Self { user_id, tags: vec![NEW_USER_TAG.to_string()] }
    }
}
