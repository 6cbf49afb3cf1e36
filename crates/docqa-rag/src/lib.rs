//! Query-time side of the pipeline: retrieval, prompting and generation.

pub mod answer;
pub mod completion;
pub mod context;
pub mod error;
pub mod retrieval;

pub use answer::{build_messages, render_answer, AnswerGenerator, NO_ANSWER};
pub use completion::{Completion, CompletionBackend, HfChatBackend, Message, Role};
pub use context::RagContext;
pub use error::{BackendError, GenerationError};
pub use retrieval::{assemble_context, RetrievalService};
