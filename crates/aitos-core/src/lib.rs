pub mod ai;
pub mod bounded;
pub mod config;
pub mod error;
pub mod gateway;
pub mod history;
pub mod identity;
pub mod ids;
pub mod module;
pub mod prompt;
pub mod provider;
pub mod roster;
pub mod storage;
pub mod task;

// Re-export main types for convenience
pub use ai::{ClaudeClient, GenerationRequest, OllamaClient, OpenAIClient, TextGenerator};
pub use bounded::BoundedLog;
pub use config::Config;
pub use error::{DashboardError, Result};
pub use gateway::{AiGateway, FALLBACK_RESPONSE};
pub use history::{CommandResponse, HistoryLog};
pub use identity::CurrentUser;
pub use module::Module;
pub use prompt::PromptContext;
pub use provider::Provider;
pub use roster::{MemberStatus, RosterStore, TeamMember};
pub use storage::{KeyValueStore, MemoryStore, SqliteStore};
pub use task::{Priority, Task, TaskDraft, TaskStatus, TaskStore};
