pub mod llm;
pub mod orchestrator;

pub use llm::{ChatClient, ChatRequest, GatewayChatClient};
pub use orchestrator::GuideOrchestrator;
