use serde::{Deserialize, Serialize};

use super::recommendation::ResolvedRecommendation;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One transcript entry. Immutable once appended; the full ordered history is
/// replayed to the model on every turn, with no windowing or summarization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Result of one guide turn: the cleaned assistant text plus the catalog
/// entries the model named, resolved in catalog order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuideTurn {
    pub display_text: String,
    pub recommendations: Vec<ResolvedRecommendation>,
}
