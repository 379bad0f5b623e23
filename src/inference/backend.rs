use futures::stream::BoxStream;
use serde::Serialize;

/// Incremental text of one decision. Ends when the model is done, or with
/// an `Err` item when the backend fails partway.
pub type Fragments = BoxStream<'static, anyhow::Result<String>>;

/// One decision request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub model: String,
    pub prompt: String,
    pub temperature: f32,
}

/// A model the backend can serve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    pub name: String,
    pub size: Option<String>,
}

/// Produces agent decisions as a stream of text fragments.
#[async_trait::async_trait]
pub trait Inference: Send + Sync {
    /// Opens a decision stream. Errors here mean no text was produced.
    async fn stream(&self, request: Request) -> anyhow::Result<Fragments>;
    async fn models(&self) -> anyhow::Result<Vec<Model>>;
    async fn healthy(&self) -> bool;
}
