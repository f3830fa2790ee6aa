//! Codepilot Domain Layer
//!
//! Plain value types shared by every other Codepilot crate. Apart from `uuid`
//! for session identifiers this crate has no external dependencies; the
//! extractor, providers and CLI all build on these types.
//!
//! ## Key Concepts
//!
//! - **Artifact**: a user-uploaded file blob prior to classification
//! - **Turn**: one message in the conversation, tagged with a role
//! - **Transcript**: the ordered, append-only list of turns for a session
//! - **Attachment**: an encoded image that travels alongside a prompt
//! - **SessionId**: UUIDv7 identifier scoping one interactive session
//!
//! ## Architecture
//!
//! Trait definitions for provider interactions live in [`traits`]; the HTTP
//! implementations live in `codepilot-llm`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod artifact;
pub mod attachment;
pub mod session;
pub mod traits;
pub mod transcript;
pub mod turn;

// Re-exports for convenience
pub use artifact::UploadedArtifact;
pub use attachment::ImageAttachment;
pub use session::SessionId;
pub use traits::{ChatProvider, ChatRequest};
pub use transcript::Transcript;
pub use turn::{ConversationTurn, Role};
