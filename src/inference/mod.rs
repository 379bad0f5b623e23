//! The inference-backend seam and its Ollama implementation.
mod backend;
mod ollama;

pub use backend::*;
pub use ollama::*;
