use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RdfError;

/// The supported RDF syntaxes, plus `Auto` for detection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Turtle,
    NTriples,
    TriG,
    NQuads,
    RdfXml,
    JsonLd,
    Auto,
}

impl Format {
    pub const ALL: [Format; 6] = [
        Format::Turtle,
        Format::NTriples,
        Format::TriG,
        Format::NQuads,
        Format::RdfXml,
        Format::JsonLd,
    ];

    /// Canonical identifier, e.g. `turtle` or `nquads`.
    pub fn name(self) -> &'static str {
        match self {
            Self::Turtle => "turtle",
            Self::NTriples => "ntriples",
            Self::TriG => "trig",
            Self::NQuads => "nquads",
            Self::RdfXml => "rdfxml",
            Self::JsonLd => "jsonld",
            Self::Auto => "auto",
        }
    }

    /// Preferred media type; `None` for `Auto`.
    pub fn media_type(self) -> Option<&'static str> {
        match self {
            Self::Turtle => Some("text/turtle"),
            Self::NTriples => Some("application/n-triples"),
            Self::TriG => Some("application/trig"),
            Self::NQuads => Some("application/n-quads"),
            Self::RdfXml => Some("application/rdf+xml"),
            Self::JsonLd => Some("application/ld+json"),
            Self::Auto => None,
        }
    }

    /// Whether the syntax can carry named graphs.
    pub fn supports_quads(self) -> bool {
        matches!(self, Self::TriG | Self::NQuads | Self::JsonLd)
    }

    /// Map a file extension (with or without the leading dot) to a format.
    pub fn from_extension(extension: &str) -> Option<Format> {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "ttl" => Some(Self::Turtle),
            "nt" => Some(Self::NTriples),
            "trig" => Some(Self::TriG),
            "nq" => Some(Self::NQuads),
            "rdf" | "xml" => Some(Self::RdfXml),
            "jsonld" | "json" => Some(Self::JsonLd),
            _ => None,
        }
    }

    /// Map a path to a format by its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Map a media type (parameters such as `; charset=utf-8` are ignored).
    pub fn from_media_type(media_type: &str) -> Option<Format> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "text/turtle" => Some(Self::Turtle),
            "application/n-triples" => Some(Self::NTriples),
            "application/trig" => Some(Self::TriG),
            "application/n-quads" => Some(Self::NQuads),
            "application/rdf+xml" | "application/xml" | "text/xml" => Some(Self::RdfXml),
            "application/ld+json" => Some(Self::JsonLd),
            _ => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = RdfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        match lower.as_str() {
            "turtle" => Ok(Self::Turtle),
            "ntriples" | "n-triples" => Ok(Self::NTriples),
            "trig" => Ok(Self::TriG),
            "nquads" | "n-quads" => Ok(Self::NQuads),
            "rdfxml" | "rdf/xml" => Ok(Self::RdfXml),
            "jsonld" | "json-ld" => Ok(Self::JsonLd),
            "auto" => Ok(Self::Auto),
            _ => Self::from_extension(&lower)
                .or_else(|| Self::from_media_type(&lower))
                .ok_or_else(|| RdfError::unsupported(s)),
        }
    }
}
