#![deny(missing_docs)]
//! Tool interface, registry, and request-time selector.
//!
//! [`ToolDyn`] is the object-safe abstraction both local (in-process) and
//! remote (MCP-discovered) tools implement, so [`ToolRegistry`] and
//! [`ToolSelector`] treat the two uniformly. Selection narrows the
//! registry's full set down to what one request actually exposes to the
//! model.

use async_trait::async_trait;
use reactor_core::tool::ToolSpec;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::warn;

/// Errors from tool operations.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found in the registry.
    #[error("tool not found: {0}")]
    NotFound(String),

    /// Tool execution failed.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The input provided to the tool was invalid.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all for other errors.
    #[error("{0}")]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Object-safe trait for tool implementations.
///
/// Any tool source (local function, MCP server) implements this trait.
/// Tools are stored as `Arc<dyn ToolDyn>` in [`ToolRegistry`].
pub trait ToolDyn: Send + Sync {
    /// The tool's unique name.
    fn name(&self) -> &str;

    /// Human-readable description of what the tool does, also used by the
    /// keyword and semantic selection strategies.
    fn description(&self) -> &str;

    /// JSON Schema for the tool's input parameters.
    fn input_schema(&self) -> serde_json::Value;

    /// Coarse category tag consulted by the keyword strategy. `None` means
    /// the tool never matches a keyword query and only surfaces under
    /// `All` or a sufficiently similar semantic query.
    fn category(&self) -> Option<&str> {
        None
    }

    /// Whether invoking this tool requires human approval.
    fn requires_approval(&self) -> bool {
        false
    }

    /// Execute the tool with the given input.
    fn call(
        &self,
        input: serde_json::Value,
    ) -> Pin<Box<dyn Future<Output = Result<serde_json::Value, ToolError>> + Send + '_>>;
}

/// Build the wire-format [`ToolSpec`] a provider sends to the model from a
/// live [`ToolDyn`] implementation.
pub fn to_spec(tool: &dyn ToolDyn) -> ToolSpec {
    let mut spec = ToolSpec::new(tool.name(), tool.description(), tool.input_schema());
    spec.category = tool.category().map(str::to_string);
    spec.requires_approval = tool.requires_approval();
    spec
}

/// Registry of tools available to a request.
///
/// Holds tools as `Arc<dyn ToolDyn>` keyed by name. Aggregates both local
/// tools and tools discovered from remote MCP servers, since both sides
/// implement the same [`ToolDyn`] seam.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn ToolDyn>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. On a duplicate name, keeps the first registration
    /// and logs a warning rather than silently overwriting it.
    pub fn register(&mut self, tool: Arc<dyn ToolDyn>) {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            warn!(tool = %name, "duplicate tool registration ignored, keeping first");
            return;
        }
        self.order.push(name.clone());
        self.tools.insert(name, tool);
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolDyn>> {
        self.tools.get(name)
    }

    /// Iterate over all registered tools in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ToolDyn>> {
        self.order.iter().filter_map(move |name| self.tools.get(name))
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Pluggable embedding backend for the semantic selection strategy. No
/// concrete embedding model ships in this crate; hosts supply one.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a piece of text into a fixed-dimension vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, ToolError>;
}

/// How a request's exposed tool set is narrowed from the full registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Expose every registered tool.
    All,
    /// Match prompt terms against each tool's category keyword.
    Keyword,
    /// Rank by cosine similarity between prompt and tool-description
    /// embeddings.
    Semantic,
}

struct EmbeddingCache {
    fingerprint: String,
    vectors: HashMap<String, Vec<f32>>,
}

/// Narrows a [`ToolRegistry`]'s full set down to what one request exposes.
pub struct ToolSelector {
    embedder: Option<Arc<dyn Embedder>>,
    cache: Mutex<Option<EmbeddingCache>>,
}

impl ToolSelector {
    /// Construct a selector with no embedding backend; `Semantic` requests
    /// degrade to `All`.
    pub fn new() -> Self {
        Self { embedder: None, cache: Mutex::new(None) }
    }

    /// Construct a selector backed by the given embedder.
    pub fn with_embedder(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder: Some(embedder), cache: Mutex::new(None) }
    }

    /// Select the tools to expose for one request.
    pub async fn select(
        &self,
        registry: &ToolRegistry,
        prompt: &str,
        strategy: SelectionStrategy,
        similarity_threshold: f32,
        max_results: usize,
    ) -> Vec<Arc<dyn ToolDyn>> {
        let all: Vec<Arc<dyn ToolDyn>> = registry.iter().cloned().collect();
        match strategy {
            SelectionStrategy::All => all,
            SelectionStrategy::Keyword => self.select_keyword(&all, prompt),
            SelectionStrategy::Semantic => match self.select_semantic(&all, prompt, similarity_threshold, max_results).await {
                Some(selected) => selected,
                None => all,
            },
        }
    }

    fn select_keyword(&self, all: &[Arc<dyn ToolDyn>], prompt: &str) -> Vec<Arc<dyn ToolDyn>> {
        let prompt_lower = prompt.to_lowercase();
        let matched: Vec<Arc<dyn ToolDyn>> = all
            .iter()
            .filter(|tool| {
                tool.category()
                    .map(|category| prompt_lower.contains(&category.to_lowercase()))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        if matched.is_empty() {
            all.to_vec()
        } else {
            matched
        }
    }

    async fn select_semantic(
        &self,
        all: &[Arc<dyn ToolDyn>],
        prompt: &str,
        similarity_threshold: f32,
        max_results: usize,
    ) -> Option<Vec<Arc<dyn ToolDyn>>> {
        let embedder = self.embedder.as_ref()?;
        let fingerprint = fingerprint_of(all);
        let vectors = self.embeddings_for(all, &fingerprint, embedder.as_ref()).await.ok()?;
        let query = embedder.embed(prompt).await.ok()?;

        let mut scored: Vec<(f32, Arc<dyn ToolDyn>)> = all
            .iter()
            .filter_map(|tool| {
                let vector = vectors.get(tool.name())?;
                Some((cosine_similarity(&query, vector), tool.clone()))
            })
            .filter(|(score, _)| *score >= similarity_threshold)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(max_results);
        Some(scored.into_iter().map(|(_, tool)| tool).collect())
    }

    async fn embeddings_for(
        &self,
        all: &[Arc<dyn ToolDyn>],
        fingerprint: &str,
        embedder: &dyn Embedder,
    ) -> Result<HashMap<String, Vec<f32>>, ToolError> {
        {
            let cache = self.cache.lock().expect("embedding cache poisoned");
            if let Some(existing) = cache.as_ref() {
                if existing.fingerprint == fingerprint {
                    return Ok(existing.vectors.clone());
                }
            }
        }

        let mut vectors = HashMap::with_capacity(all.len());
        for tool in all {
            let text = format!("{} {}", tool.name(), tool.description());
            vectors.insert(tool.name().to_string(), embedder.embed(&text).await?);
        }

        let mut cache = self.cache.lock().expect("embedding cache poisoned");
        *cache = Some(EmbeddingCache { fingerprint: fingerprint.to_string(), vectors: vectors.clone() });
        Ok(vectors)
    }
}

impl Default for ToolSelector {
    fn default() -> Self {
        Self::new()
    }
}

fn fingerprint_of(tools: &[Arc<dyn ToolDyn>]) -> String {
    let mut parts: Vec<String> = tools.iter().map(|t| format!("{}:{}", t.name(), t.description())).collect();
    parts.sort();
    parts.join("|")
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
