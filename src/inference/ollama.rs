use super::*;
use bytes::Bytes;
use futures::Stream;
use futures::StreamExt;
use serde::Deserialize;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

pub const SYSTEM_PROMPT: &str = "You are an expert poker player. Analyze and decide the optimal action.

Output format: <action>ACTION</action>
- <action>f</action> = fold
- <action>cc</action> = call/check
- <action>cbr AMOUNT</action> = bet/raise to AMOUNT

Think step by step about your decision, then output ONE action tag at the end.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    stream: bool,
    options: Options,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Options {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Default, Deserialize)]
struct Chunk {
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Message {
    #[serde(default)]
    content: String,
    #[serde(default)]
    thinking: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Tags {
    #[serde(default)]
    models: Vec<Tag>,
}

#[derive(Debug, Deserialize)]
struct Tag {
    name: String,
    #[serde(default)]
    details: Option<Details>,
}

#[derive(Debug, Deserialize)]
struct Details {
    #[serde(default)]
    parameter_size: Option<String>,
}

/// Streaming client for a local Ollama server.
///
/// Concurrency is bounded by the semaphore handed in at construction: a
/// permit is taken before the request goes out and released when the
/// returned fragment stream is dropped.
#[derive(Clone)]
pub struct Ollama {
    client: reqwest::Client,
    endpoint: String,
    gate: Arc<Semaphore>,
    max_tokens: u32,
}

impl Ollama {
    pub fn new(endpoint: &str, timeout: Duration, gate: Arc<Semaphore>) -> anyhow::Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            gate,
            max_tokens: crate::MAX_TOKENS,
        })
    }
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }
}

#[async_trait::async_trait]
impl Inference for Ollama {
    async fn stream(&self, request: Request) -> anyhow::Result<Fragments> {
        let permit = self.gate.clone().acquire_owned().await?;
        log::debug!("[ollama] {} deciding", request.model);
        let body = ChatRequest {
            model: &request.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            stream: true,
            options: Options {
                temperature: request.temperature,
                num_predict: self.max_tokens,
            },
        };
        let response = self
            .client
            .post(self.url("/api/chat"))
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(fragments(response.bytes_stream(), permit))
    }

    async fn models(&self) -> anyhow::Result<Vec<Model>> {
        let tags = self
            .client
            .get(self.url("/api/tags"))
            .send()
            .await?
            .error_for_status()?
            .json::<Tags>()
            .await?;
        Ok(tags
            .models
            .into_iter()
            .map(|t| Model {
                name: t.name,
                size: t.details.and_then(|d| d.parameter_size),
            })
            .collect())
    }

    async fn healthy(&self) -> bool {
        self.client
            .get(self.url("/api/tags"))
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

/// Reassembles newline-delimited JSON chunks split across network reads.
#[derive(Debug, Default)]
struct Decoder {
    buffer: Vec<u8>,
    done: bool,
}

impl Decoder {
    fn feed(&mut self, bytes: &[u8]) -> Vec<anyhow::Result<String>> {
        self.buffer.extend_from_slice(bytes);
        let mut out = Vec::new();
        while let Some(i) = self.buffer.iter().position(|b| *b == b'\n') {
            let line = self.buffer.drain(..=i).collect::<Vec<_>>();
            out.extend(self.line(&line));
        }
        out
    }
    fn finish(&mut self) -> Vec<anyhow::Result<String>> {
        let line = std::mem::take(&mut self.buffer);
        self.line(&line)
    }
    fn line(&mut self, line: &[u8]) -> Vec<anyhow::Result<String>> {
        if self.done || line.iter().all(|b| b.is_ascii_whitespace()) {
            return Vec::new();
        }
        let chunk = match serde_json::from_slice::<Chunk>(line) {
            Ok(chunk) => chunk,
            Err(e) => {
                log::debug!("[ollama] skipping undecodable line: {}", e);
                return Vec::new();
            }
        };
        if let Some(error) = chunk.error {
            self.done = true;
            return vec![Err(anyhow::anyhow!("ollama: {}", error))];
        }
        self.done = chunk.done;
        chunk
            .message
            .map(|m| [Some(m.content), m.thinking])
            .into_iter()
            .flatten()
            .flatten()
            .filter(|s| !s.is_empty())
            .map(Ok)
            .collect()
    }
}

/// Turns a raw byte stream into text fragments. `guard` lives as long as
/// the returned stream.
fn fragments<S, E, G>(bytes: S, guard: G) -> Fragments
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<anyhow::Error> + Send + 'static,
    G: Send + 'static,
{
    let state = (bytes.boxed(), Decoder::default(), VecDeque::new(), guard);
    futures::stream::unfold(state, |(mut bytes, mut decoder, mut queue, guard)| async move {
        loop {
            if let Some(item) = queue.pop_front() {
                return Some((item, (bytes, decoder, queue, guard)));
            }
            if decoder.done {
                return None;
            }
            match bytes.next().await {
                Some(Ok(chunk)) => queue.extend(decoder.feed(&chunk)),
                Some(Err(e)) => {
                    decoder.done = true;
                    queue.push_back(Err(e.into()));
                }
                None => {
                    queue.extend(decoder.finish());
                    decoder.done = true;
                }
            }
        }
    })
    .boxed()
}
