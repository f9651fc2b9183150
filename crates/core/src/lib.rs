pub mod config;
pub mod domain;
pub mod errors;
pub mod extraction;
pub mod prompt;
pub mod tagging;

pub use domain::chat::{ChatMessage, GuideTurn, Role};
pub use domain::order::{OrderItemSummary, OrderSummary};
pub use domain::product::{Product, ProductId};
pub use domain::profile::{UserId, UserProfile, NEW_USER_TAG};
pub use domain::recommendation::ResolvedRecommendation;
pub use errors::GuideError;
pub use extraction::{Extraction, MarkerExtractor, RecommendationParser};
pub use tagging::{TagRules, TagUpdate};
