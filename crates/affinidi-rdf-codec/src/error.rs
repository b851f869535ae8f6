use std::fmt;

/// Longest excerpt (in characters) carried by a located error.
pub const EXCERPT_LIMIT: usize = 160;

/// Stable classification of every [`RdfError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedFormat,
    LineTooLong,
    StatementTooLong,
    DepthExceeded,
    TripleLimitExceeded,
    ParseError,
    IoError,
    ContextCanceled,
    InvalidIri,
    InvalidLiteral,
}

impl ErrorKind {
    /// Boundary errors are raised by configured caps or cancellation; callers
    /// may retry them with different limits.
    pub fn is_boundary(self) -> bool {
        matches!(
            self,
            Self::LineTooLong
                | Self::StatementTooLong
                | Self::DepthExceeded
                | Self::TripleLimitExceeded
                | Self::ContextCanceled
        )
    }
}

/// Errors that can occur while decoding or encoding RDF.
#[derive(Debug, thiserror::Error)]
pub enum RdfError {
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("line exceeds the limit of {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("statement exceeds the limit of {limit} bytes")]
    StatementTooLong { limit: usize },

    #[error("nesting depth exceeds the limit of {limit}")]
    DepthExceeded { limit: usize },

    #[error("statement count exceeds the limit of {limit}")]
    TripleLimitExceeded { limit: usize },

    #[error("{0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("operation canceled")]
    Canceled,

    #[error("invalid IRI: {0}")]
    InvalidIri(String),

    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    #[error("encoder is closed")]
    EncoderClosed,

    #[error("{0}")]
    Located(Box<LocatedError>),
}

/// Result type alias for RDF operations.
pub type Result<T> = std::result::Result<T, RdfError>;

impl RdfError {
    pub fn parse(msg: impl fmt::Display) -> Self {
        Self::Parse(msg.to_string())
    }

    pub fn invalid_iri(msg: impl fmt::Display) -> Self {
        Self::InvalidIri(msg.to_string())
    }

    pub fn invalid_literal(msg: impl fmt::Display) -> Self {
        Self::InvalidLiteral(msg.to_string())
    }

    pub fn unsupported(msg: impl fmt::Display) -> Self {
        Self::UnsupportedFormat(msg.to_string())
    }

    /// The stable kind of this error, looking through any position wrapper.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::LineTooLong { .. } => ErrorKind::LineTooLong,
            Self::StatementTooLong { .. } => ErrorKind::StatementTooLong,
            Self::DepthExceeded { .. } => ErrorKind::DepthExceeded,
            Self::TripleLimitExceeded { .. } => ErrorKind::TripleLimitExceeded,
            Self::Parse(_) => ErrorKind::ParseError,
            Self::Io(_) | Self::EncoderClosed => ErrorKind::IoError,
            Self::Canceled => ErrorKind::ContextCanceled,
            Self::InvalidIri(_) => ErrorKind::InvalidIri,
            Self::InvalidLiteral(_) => ErrorKind::InvalidLiteral,
            Self::Located(located) => located.source.kind(),
        }
    }

    /// Position attached to this error, if any.
    pub fn position(&self) -> Option<&Position> {
        match self {
            Self::Located(located) => Some(&located.position),
            _ => None,
        }
    }

    /// The error without its position wrapper.
    pub fn inner(&self) -> &RdfError {
        match self {
            Self::Located(located) => located.source.inner(),
            other => other,
        }
    }

    /// Attach format and position context. An error that already carries a
    /// position keeps it.
    pub fn with_position(self, format: &str, position: Position, excerpt: &str) -> Self {
        match self {
            Self::Located(_) => self,
            // Cancellation is never dressed up as a located parse failure.
            Self::Canceled => self,
            other => Self::Located(Box::new(LocatedError {
                format: format.to_string(),
                position,
                excerpt: make_excerpt(excerpt),
                source: other,
            })),
        }
    }
}

impl From<serde_json::Error> for RdfError {
    fn from(error: serde_json::Error) -> Self {
        if error.is_io() {
            return Self::Io(error.into());
        }
        Self::Parse(format!("JSON syntax error: {error}"))
    }
}

impl From<quick_xml::Error> for RdfError {
    fn from(error: quick_xml::Error) -> Self {
        match error {
            quick_xml::Error::Io(io) => Self::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Self::Parse(format!("XML syntax error: {other}")),
        }
    }
}

/// Location of an error within the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    /// 1-based line, 0 when unknown.
    pub line: u64,
    /// 1-based column, 0 when unknown.
    pub column: u64,
    /// Byte offset from the start of the input, -1 when unknown.
    pub offset: i64,
}

impl Position {
    pub const UNKNOWN: Position = Position {
        line: 0,
        column: 0,
        offset: -1,
    };

    pub fn new(line: u64, column: u64, offset: i64) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    pub fn line(line: u64) -> Self {
        Self {
            line,
            ..Self::UNKNOWN
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

/// An error enriched with the format name, position and an excerpt of the
/// offending statement.
#[derive(Debug)]
pub struct LocatedError {
    pub format: String,
    pub position: Position,
    pub excerpt: String,
    pub source: RdfError,
}

impl fmt::Display for LocatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}",
            self.format, self.position.line, self.position.column, self.source
        )?;
        if self.excerpt.is_empty() {
            return Ok(());
        }
        write!(f, "\n  {}", self.excerpt)?;
        let column = self.position.column as usize;
        if column > 0 && column <= self.excerpt.chars().count() {
            write!(f, "\n  {}^", " ".repeat(column - 1))?;
        }
        Ok(())
    }
}

/// Collapse whitespace runs and elide the middle of long excerpts.
fn make_excerpt(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let count = collapsed.chars().count();
    if count <= EXCERPT_LIMIT {
        return collapsed;
    }
    let keep = (EXCERPT_LIMIT - 1) / 2;
    let head: String = collapsed.chars().take(keep).collect();
    let tail: String = collapsed.chars().skip(count - keep).collect();
    format!("{head}…{tail}")
}
