use std::collections::HashMap;

use serde_json::{Map, Value};

use super::loader::ContextCache;
use crate::error::{RdfError, Result};
use crate::lexical::{is_absolute_iri, resolve_iri};

/// A processed JSON-LD context that maps terms to IRIs and type/container info.
#[derive(Clone, Debug, Default)]
pub struct Context {
    terms: HashMap<String, TermDefinition>,
    pub vocab: Option<String>,
    pub base: Option<String>,
    pub default_language: Option<String>,
    /// Base in effect before any `@context`, restored by a `null` context.
    document_base: Option<String>,
}

/// A single term definition within a JSON-LD context.
#[derive(Clone, Debug, Default)]
pub struct TermDefinition {
    /// `None` for a term explicitly mapped to `null`.
    pub iri: Option<String>,
    pub reverse: bool,
    pub type_mapping: Option<String>,
    /// `Some(None)` when the term resets the default language.
    pub language: Option<Option<String>>,
    pub container: Option<ContainerType>,
    pub context: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerType {
    Set,
    List,
}

/// Whether `value` is a JSON-LD keyword.
pub fn is_keyword(value: &str) -> bool {
    matches!(
        value,
        "@base"
            | "@container"
            | "@context"
            | "@direction"
            | "@graph"
            | "@id"
            | "@import"
            | "@included"
            | "@index"
            | "@json"
            | "@language"
            | "@list"
            | "@nest"
            | "@none"
            | "@prefix"
            | "@propagate"
            | "@protected"
            | "@reverse"
            | "@set"
            | "@type"
            | "@value"
            | "@version"
            | "@vocab"
    )
}

impl Context {
    /// An empty context whose relative IRIs resolve against `base`.
    pub fn new(base: Option<String>) -> Self {
        Self {
            base: base.clone(),
            document_base: base,
            ..Self::default()
        }
    }

    /// Process a `@context` value (string URL, object, array or null) and
    /// merge it into this context.
    pub(crate) fn process(&mut self, context_value: &Value, cache: &mut ContextCache) -> Result<()> {
        match context_value {
            Value::Array(items) => {
                for item in items {
                    self.process(item, cache)?;
                }
            }
            Value::String(url) => {
                let url = match &self.base {
                    Some(base) if !is_absolute_iri(url) => resolve_iri(base, url),
                    _ => url.clone(),
                };
                cache.begin(&url)?;
                let remote = cache.fetch(&url);
                let result = remote.and_then(|context| self.process(&context, cache));
                cache.end(&url);
                result?;
            }
            Value::Object(object) => self.process_object(object)?,
            Value::Null => {
                self.terms.clear();
                self.vocab = None;
                self.default_language = None;
                self.base = self.document_base.clone();
            }
            _ => {
                return Err(RdfError::parse(format!(
                    "invalid @context value: {context_value}"
                )));
            }
        }
        Ok(())
    }

    fn process_object(&mut self, object: &Map<String, Value>) -> Result<()> {
        if let Some(base) = object.get("@base") {
            self.base = match base {
                Value::Null => None,
                Value::String(iri) => Some(match &self.base {
                    Some(current) if !is_absolute_iri(iri) => resolve_iri(current, iri),
                    _ => iri.clone(),
                }),
                _ => return Err(RdfError::parse("@base must be a string or null")),
            };
        }

        if let Some(vocab) = object.get("@vocab") {
            self.vocab = match vocab {
                Value::Null => None,
                Value::String(iri) => Some(
                    self.expand_iri(iri, true)
                        .ok_or_else(|| RdfError::parse(format!("invalid @vocab: {iri}")))?,
                ),
                _ => return Err(RdfError::parse("@vocab must be a string or null")),
            };
        }

        if let Some(language) = object.get("@language") {
            self.default_language = match language {
                Value::Null => None,
                Value::String(tag) => Some(tag.clone()),
                _ => return Err(RdfError::parse("@language must be a string or null")),
            };
        }

        let mut defined = HashMap::new();
        for term in object.keys() {
            self.define_term(object, term, &mut defined)?;
        }
        Ok(())
    }

    /// Create the definition for `term` from the local context, defining
    /// any term it depends on first.
    fn define_term(
        &mut self,
        local: &Map<String, Value>,
        term: &str,
        defined: &mut HashMap<String, bool>,
    ) -> Result<()> {
        match defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(RdfError::parse(format!("cyclic IRI mapping for term '{term}'")));
            }
            None => {}
        }
        if term.starts_with('@') {
            // Context keywords are handled by the caller; other
            // keyword-like terms are ignored.
            return Ok(());
        }
        defined.insert(term.to_string(), false);
        self.terms.remove(term);
        let value = local.get(term).unwrap_or(&Value::Null);

        let definition = match value {
            Value::Null => TermDefinition::default(),
            Value::String(id) => TermDefinition {
                iri: self.expand_defining(id, local, defined)?,
                ..TermDefinition::default()
            },
            Value::Object(object) => self.expanded_definition(term, object, local, defined)?,
            _ => {
                return Err(RdfError::parse(format!(
                    "invalid term definition for '{term}': {value}"
                )));
            }
        };
        self.terms.insert(term.to_string(), definition);
        defined.insert(term.to_string(), true);
        Ok(())
    }

    fn expanded_definition(
        &mut self,
        term: &str,
        object: &Map<String, Value>,
        local: &Map<String, Value>,
        defined: &mut HashMap<String, bool>,
    ) -> Result<TermDefinition> {
        let mut definition = TermDefinition::default();

        if let Some(reverse) = object.get("@reverse") {
            let iri = reverse
                .as_str()
                .ok_or_else(|| RdfError::parse(format!("@reverse of '{term}' must be a string")))?;
            definition.iri = self.expand_defining(iri, local, defined)?;
            definition.reverse = true;
        } else {
            match object.get("@id") {
                Some(Value::Null) => definition.iri = None,
                Some(Value::String(id)) => {
                    definition.iri = self.expand_defining(id, local, defined)?;
                }
                Some(other) => {
                    return Err(RdfError::parse(format!(
                        "@id of '{term}' must be a string, found {other}"
                    )));
                }
                None => {
                    if let Some((prefix, _)) = term.split_once(':')
                        && prefix != term
                        && local.contains_key(prefix)
                    {
                        self.define_term(local, prefix, defined)?;
                    }
                    definition.iri = Some(self.expand_iri(term, true).ok_or_else(|| {
                        RdfError::parse(format!("term '{term}' has no IRI mapping"))
                    })?);
                }
            }
        }

        if let Some(type_mapping) = object.get("@type") {
            let mapping = type_mapping
                .as_str()
                .ok_or_else(|| RdfError::parse(format!("@type of '{term}' must be a string")))?;
            definition.type_mapping = if mapping.starts_with('@') {
                Some(mapping.to_string())
            } else {
                self.expand_defining(mapping, local, defined)?
            };
        }

        if let Some(language) = object.get("@language") {
            definition.language = Some(language.as_str().map(str::to_string));
        }

        definition.container = match object.get("@container") {
            Some(Value::String(container)) => container_type(container),
            Some(Value::Array(containers)) => containers
                .iter()
                .filter_map(Value::as_str)
                .find_map(container_type),
            _ => None,
        };

        definition.context = object.get("@context").cloned();
        Ok(definition)
    }

    /// Vocabulary-relative expansion that first defines any local term the
    /// value refers to.
    fn expand_defining(
        &mut self,
        value: &str,
        local: &Map<String, Value>,
        defined: &mut HashMap<String, bool>,
    ) -> Result<Option<String>> {
        if is_keyword(value) {
            return Ok(Some(value.to_string()));
        }
        if local.contains_key(value) && defined.get(value) != Some(&true) {
            self.define_term(local, value, defined)?;
        }
        if let Some((prefix, suffix)) = value.split_once(':')
            && !suffix.starts_with("//")
            && local.contains_key(prefix)
        {
            self.define_term(local, prefix, defined)?;
        }
        Ok(self.expand_iri(value, true))
    }

    /// Expand a term, compact IRI or relative IRI.
    ///
    /// Vocabulary-relative expansion (`vocab`) consults term definitions and
    /// `@vocab`; document-relative expansion resolves against `@base`.
    /// Returns `None` for values that do not map to an IRI.
    pub fn expand_iri(&self, value: &str, vocab: bool) -> Option<String> {
        if is_keyword(value) {
            return Some(value.to_string());
        }
        if vocab && let Some(definition) = self.terms.get(value) {
            return definition.iri.clone();
        }
        if let Some((prefix, suffix)) = value.split_once(':') {
            if prefix == "_" || suffix.starts_with("//") {
                return Some(value.to_string());
            }
            if let Some(TermDefinition {
                iri: Some(namespace),
                reverse: false,
                ..
            }) = self.terms.get(prefix)
            {
                return Some(format!("{namespace}{suffix}"));
            }
            if is_absolute_iri(value) {
                return Some(value.to_string());
            }
        }
        if vocab {
            return self.vocab.as_ref().map(|namespace| format!("{namespace}{value}"));
        }
        Some(match &self.base {
            Some(base) => resolve_iri(base, value),
            None => value.to_string(),
        })
    }

    /// Get the term definition for a given term name.
    pub fn get_term(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term)
    }

    /// The keyword `key` stands for, directly or through an alias.
    pub fn keyword<'a>(&'a self, key: &'a str) -> Option<&'a str> {
        if key.starts_with('@') {
            return is_keyword(key).then_some(key);
        }
        match self.terms.get(key) {
            Some(TermDefinition { iri: Some(iri), .. }) if is_keyword(iri) => Some(iri.as_str()),
            _ => None,
        }
    }

    /// Create a child context by processing a scoped `@context` layered on
    /// top of this one.
    pub(crate) fn with_scoped_context(
        &self,
        scoped_context: &Value,
        cache: &mut ContextCache,
    ) -> Result<Context> {
        let mut child = self.clone();
        child.process(scoped_context, cache)?;
        Ok(child)
    }
}

fn container_type(value: &str) -> Option<ContainerType> {
    match value {
        "@set" => Some(ContainerType::Set),
        "@list" => Some(ContainerType::List),
        _ => None,
    }
}
