use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{RdfError, Result};

/// Resolves remote `@context` URLs. The codec never performs network I/O on
/// its own; callers plug in whatever fetching policy they need.
pub trait DocumentLoader: Send + Sync {
    /// Return the JSON document published at `url`.
    fn load(&self, url: &str) -> Result<Value>;
}

/// A [`DocumentLoader`] backed by an in-memory map of URL to document.
///
/// Example:
/// ```
/// use affinidi_rdf_codec::jsonld::{DocumentLoader, StaticDocumentLoader};
/// use serde_json::json;
///
/// let loader = StaticDocumentLoader::new()
///     .with_document("https://example.org/ctx", json!({"@context": {"name": "https://schema.org/name"}}));
/// assert!(loader.load("https://example.org/ctx").is_ok());
/// assert!(loader.load("https://example.org/missing").is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticDocumentLoader {
    documents: HashMap<String, Value>,
}

impl StaticDocumentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        self.documents.insert(url.into(), document);
    }
}

impl DocumentLoader for StaticDocumentLoader {
    fn load(&self, url: &str) -> Result<Value> {
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| RdfError::parse(format!("no document registered for <{url}>")))
    }
}

/// Per-parse view of the loader: every URL is fetched at most once, and a
/// context that (indirectly) imports itself is rejected.
#[derive(Default)]
pub(crate) struct ContextCache {
    loader: Option<Arc<dyn DocumentLoader>>,
    loaded: HashMap<String, Value>,
    active: HashSet<String>,
}

impl ContextCache {
    pub fn new(loader: Option<Arc<dyn DocumentLoader>>) -> Self {
        Self {
            loader,
            loaded: HashMap::new(),
            active: HashSet::new(),
        }
    }

    /// The `@context` value published at `url`.
    pub fn fetch(&mut self, url: &str) -> Result<Value> {
        if let Some(context) = self.loaded.get(url) {
            return Ok(context.clone());
        }
        let loader = self.loader.as_ref().ok_or_else(|| {
            RdfError::parse(format!(
                "remote context <{url}> requires a document loader"
            ))
        })?;
        let document = loader.load(url)?;
        tracing::debug!(url, "remote JSON-LD context loaded");
        // A context document wraps its definitions in `@context`.
        let context = match document {
            Value::Object(mut map) => map
                .remove("@context")
                .ok_or_else(|| RdfError::parse(format!("document <{url}> has no @context")))?,
            _ => {
                return Err(RdfError::parse(format!(
                    "document <{url}> is not a JSON object"
                )));
            }
        };
        self.loaded.insert(url.to_string(), context.clone());
        Ok(context)
    }

    /// Mark `url` as being processed. Fails on a recursive import.
    pub fn begin(&mut self, url: &str) -> Result<()> {
        if !self.active.insert(url.to_string()) {
            return Err(RdfError::parse(format!("recursive context inclusion of <{url}>")));
        }
        Ok(())
    }

    pub fn end(&mut self, url: &str) {
        self.active.remove(url);
    }
}

impl fmt::Debug for ContextCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextCache")
            .field("loader", &self.loader.is_some())
            .field("loaded", &self.loaded.keys().collect::<Vec<_>>())
            .finish()
    }
}
