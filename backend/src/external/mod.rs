//! External API integrations

pub mod ai;
pub mod email;
pub mod embeddings;

pub use ai::AiClient;
pub use email::EmailClient;
pub use embeddings::EmbeddingClient;
