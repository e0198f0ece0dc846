pub mod client;
pub mod config;
pub mod conversation;
pub mod state;

// Re-export main types for convenience
pub use client::{AssistantClient, ClientError, StatusCode};
pub use config::Config;
pub use conversation::{Conversation, SUBMIT_FAILED_MESSAGE};
pub use state::{ChatMessage, ChatRole, SubmitStatus};
