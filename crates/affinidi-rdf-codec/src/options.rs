/*!
 * Decoder and encoder options
 */

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{RdfError, Result};
use crate::jsonld::DocumentLoader;

const DEFAULT_MAX_LINE_BYTES: usize = 16 * 1024 * 1024;
const DEFAULT_MAX_STATEMENT_BYTES: usize = 64 * 1024 * 1024;
const DEFAULT_MAX_DEPTH: usize = 256;

const SAFE_MAX_LINE_BYTES: usize = 1024 * 1024;
const SAFE_MAX_STATEMENT_BYTES: usize = 4 * 1024 * 1024;
const SAFE_MAX_DEPTH: usize = 64;
const SAFE_MAX_STATEMENTS: usize = 1_000_000;

/// Cooperative cancellation handle. Clones share the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationSignal {
    canceled: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }

    /// Fails with [`RdfError::Canceled`] once [`cancel`](Self::cancel) was called.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            Err(RdfError::Canceled)
        } else {
            Ok(())
        }
    }
}

/// Options for every decoder. A cap of zero means unlimited.
#[derive(Clone)]
pub struct DecoderOptions {
    pub max_line_bytes: usize,
    pub max_statement_bytes: usize,
    pub max_depth: usize,
    pub max_statements: usize,
    pub allow_quoted_triple_statement: bool,
    pub strict_iri_validation: bool,
    pub expand_rdfxml_containers: bool,
    pub lenient_escapes: bool,
    pub base_iri: Option<String>,
    pub cancellation: Option<CancellationSignal>,
    pub document_loader: Option<Arc<dyn DocumentLoader>>,
}

impl DecoderOptions {
    /// Returns a builder for `DecoderOptions`
    /// Example:
    /// ```
    /// use affinidi_rdf_codec::DecoderOptions;
    ///
    /// let options = DecoderOptions::builder().with_max_depth(16).build();
    /// assert_eq!(options.max_depth, 16);
    /// ```
    pub fn builder() -> DecoderOptionsBuilder {
        DecoderOptionsBuilder::default()
    }

    /// Conservative caps for untrusted input.
    pub fn safe() -> Self {
        DecoderOptionsBuilder::default().safe_mode().build()
    }

    pub(crate) fn check_canceled(&self) -> Result<()> {
        match &self.cancellation {
            Some(signal) => signal.check(),
            None => Ok(()),
        }
    }
}

impl Default for DecoderOptions {
    fn default() -> Self {
        DecoderOptionsBuilder::default().build()
    }
}

impl fmt::Debug for DecoderOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderOptions")
            .field("max_line_bytes", &self.max_line_bytes)
            .field("max_statement_bytes", &self.max_statement_bytes)
            .field("max_depth", &self.max_depth)
            .field("max_statements", &self.max_statements)
            .field(
                "allow_quoted_triple_statement",
                &self.allow_quoted_triple_statement,
            )
            .field("strict_iri_validation", &self.strict_iri_validation)
            .field("expand_rdfxml_containers", &self.expand_rdfxml_containers)
            .field("lenient_escapes", &self.lenient_escapes)
            .field("base_iri", &self.base_iri)
            .field("cancellation", &self.cancellation)
            .field("document_loader", &self.document_loader.is_some())
            .finish()
    }
}

/// Builder for `DecoderOptions`.
/// Example:
/// ```
/// use affinidi_rdf_codec::DecoderOptions;
///
/// // Defaults, with statements capped at 1000
/// let options = DecoderOptions::builder().with_max_statements(1000).build();
/// ```
pub struct DecoderOptionsBuilder {
    /// Largest line the line reader returns
    /// Default: 16 MiB
    max_line_bytes: usize,

    /// Largest accumulated statement buffer
    /// Default: 64 MiB
    max_statement_bytes: usize,

    /// Maximum nesting of collections, blank node property lists, quoted
    /// triples, annotations, XML elements and JSON objects
    /// Default: 256
    max_depth: usize,

    /// Maximum statements emitted before failing
    /// Default: unlimited
    max_statements: usize,

    /// Permit `<<...>>` as the subject or object of a statement
    /// Default: true
    allow_quoted_triple_statement: bool,

    /// Validate every IRI against RFC 3987
    /// Default: false
    strict_iri_validation: bool,

    /// Expand rdf:li inside rdf:Bag/Seq/Alt into rdf:_N
    /// Default: false
    expand_rdfxml_containers: bool,

    /// Accept unknown string escapes as the escaped letter
    /// Default: false
    lenient_escapes: bool,

    /// Initial base IRI
    base_iri: Option<String>,

    cancellation: Option<CancellationSignal>,

    /// Resolver for remote JSON-LD contexts
    document_loader: Option<Arc<dyn DocumentLoader>>,
}

impl Default for DecoderOptionsBuilder {
    fn default() -> Self {
        DecoderOptionsBuilder {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            max_statement_bytes: DEFAULT_MAX_STATEMENT_BYTES,
            max_depth: DEFAULT_MAX_DEPTH,
            max_statements: 0,
            allow_quoted_triple_statement: true,
            strict_iri_validation: false,
            expand_rdfxml_containers: false,
            lenient_escapes: false,
            base_iri: None,
            cancellation: None,
            document_loader: None,
        }
    }
}

impl DecoderOptionsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> DecoderOptions {
        DecoderOptions {
            max_line_bytes: self.max_line_bytes,
            max_statement_bytes: self.max_statement_bytes,
            max_depth: self.max_depth,
            max_statements: self.max_statements,
            allow_quoted_triple_statement: self.allow_quoted_triple_statement,
            strict_iri_validation: self.strict_iri_validation,
            expand_rdfxml_containers: self.expand_rdfxml_containers,
            lenient_escapes: self.lenient_escapes,
            base_iri: self.base_iri,
            cancellation: self.cancellation,
            document_loader: self.document_loader,
        }
    }

    /// Pin every byte, depth and count cap to conservative values.
    pub fn safe_mode(mut self) -> Self {
        self.max_line_bytes = SAFE_MAX_LINE_BYTES;
        self.max_statement_bytes = SAFE_MAX_STATEMENT_BYTES;
        self.max_depth = SAFE_MAX_DEPTH;
        self.max_statements = SAFE_MAX_STATEMENTS;
        self
    }

    pub fn with_max_line_bytes(mut self, max: usize) -> Self {
        self.max_line_bytes = max;
        self
    }

    pub fn with_max_statement_bytes(mut self, max: usize) -> Self {
        self.max_statement_bytes = max;
        self
    }

    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    pub fn with_max_statements(mut self, max: usize) -> Self {
        self.max_statements = max;
        self
    }

    pub fn with_quoted_triple_statements(mut self, allow: bool) -> Self {
        self.allow_quoted_triple_statement = allow;
        self
    }

    pub fn with_strict_iri_validation(mut self, strict: bool) -> Self {
        self.strict_iri_validation = strict;
        self
    }

    pub fn with_rdfxml_container_expansion(mut self, expand: bool) -> Self {
        self.expand_rdfxml_containers = expand;
        self
    }

    pub fn with_lenient_escapes(mut self, lenient: bool) -> Self {
        self.lenient_escapes = lenient;
        self
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.base_iri = Some(base_iri.into());
        self
    }

    pub fn with_cancellation(mut self, signal: CancellationSignal) -> Self {
        self.cancellation = Some(signal);
        self
    }

    pub fn with_document_loader(mut self, loader: Arc<dyn DocumentLoader>) -> Self {
        self.document_loader = Some(loader);
        self
    }
}

/// Options for every encoder.
#[derive(Clone, Debug, Default)]
pub struct EncoderOptions {
    /// Prefix label to namespace, in header order.
    pub prefixes: Vec<(String, String)>,
    pub base_iri: Option<String>,
    pub pretty: bool,
    pub canonicalize_json: bool,
}

impl EncoderOptions {
    pub fn builder() -> EncoderOptionsBuilder {
        EncoderOptionsBuilder::default()
    }
}

/// Builder for `EncoderOptions`.
/// Example:
/// ```
/// use affinidi_rdf_codec::EncoderOptions;
///
/// let options = EncoderOptions::builder()
///     .with_prefix("ex", "http://example.org/")
///     .with_pretty(true)
///     .build();
/// assert_eq!(options.prefixes.len(), 1);
/// ```
#[derive(Default)]
pub struct EncoderOptionsBuilder {
    options: EncoderOptions,
}

impl EncoderOptionsBuilder {
    pub fn build(self) -> EncoderOptions {
        self.options
    }

    /// Add a prefix; a label given twice keeps the last namespace.
    pub fn with_prefix(mut self, label: impl Into<String>, namespace: impl Into<String>) -> Self {
        let label = label.into();
        let namespace = namespace.into();
        match self.options.prefixes.iter_mut().find(|(l, _)| *l == label) {
            Some(entry) => entry.1 = namespace,
            None => self.options.prefixes.push((label, namespace)),
        }
        self
    }

    pub fn with_base_iri(mut self, base_iri: impl Into<String>) -> Self {
        self.options.base_iri = Some(base_iri.into());
        self
    }

    /// Group TriG output into graph blocks and Turtle output by subject.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.options.pretty = pretty;
        self
    }

    /// Apply JSON canonicalization (RFC 8785) to JSON-LD output.
    pub fn with_canonical_json(mut self, canonicalize: bool) -> Self {
        self.options.canonicalize_json = canonicalize;
        self
    }
}
