//! Tokenizer for one unit of Turtle or TriG text.

use crate::error::{RdfError, Result};
use crate::lexical::names::{is_local_escape, is_pn_chars, is_pn_chars_base, is_pn_chars_u};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Body of `<...>`, escapes not yet decoded.
    IriRef(String),
    /// `prefix:local`; `local` has its backslash escapes removed and is
    /// empty for a bare namespace such as `ex:`.
    PrefixedName { prefix: String, local: String },
    BlankNodeLabel(String),
    /// Body of a single-line string, escapes not yet decoded.
    String(String),
    /// Body of a triple-quoted string, escapes not yet decoded.
    LongString(String),
    Integer(String),
    Decimal(String),
    Double(String),
    Boolean(bool),
    Prefix { sparql: bool },
    Base { sparql: bool },
    Version { sparql: bool },
    Graph,
    Dot,
    Comma,
    Semicolon,
    LBracket,
    RBracket,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LDoubleAngle,
    RDoubleAngle,
    AnnotationOpen,
    AnnotationClose,
    A,
    LangTag(String),
    DatatypeMarker,
}

impl TokenKind {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::IriRef(iri) => format!("<{iri}>"),
            Self::PrefixedName { prefix, local } => format!("{prefix}:{local}"),
            Self::BlankNodeLabel(label) => format!("_:{label}"),
            Self::String(_) | Self::LongString(_) => "string".to_string(),
            Self::Integer(v) | Self::Decimal(v) | Self::Double(v) => v.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Prefix { .. } => "prefix directive".to_string(),
            Self::Base { .. } => "base directive".to_string(),
            Self::Version { .. } => "version directive".to_string(),
            Self::Graph => "GRAPH".to_string(),
            Self::Dot => "'.'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Semicolon => "';'".to_string(),
            Self::LBracket => "'['".to_string(),
            Self::RBracket => "']'".to_string(),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::LBrace => "'{'".to_string(),
            Self::RBrace => "'}'".to_string(),
            Self::LDoubleAngle => "'<<'".to_string(),
            Self::RDoubleAngle => "'>>'".to_string(),
            Self::AnnotationOpen => "'{|'".to_string(),
            Self::AnnotationClose => "'|}'".to_string(),
            Self::A => "'a'".to_string(),
            Self::LangTag(tag) => format!("@{tag}"),
            Self::DatatypeMarker => "'^^'".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Byte offset of the token within the tokenized text.
    pub offset: usize,
}

pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    token_start: usize,
    at_statement_start: bool,
    directive_args: u8,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            token_start: 0,
            at_statement_start: true,
            directive_args: 0,
        }
    }

    /// Offset of the token being read, or of the failing token after an error.
    pub fn offset(&self) -> usize {
        self.token_start
    }

    pub fn tokenize(&mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    pub fn next_token(&mut self) -> Result<Option<Token>> {
        self.skip_whitespace_and_comments();
        self.token_start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        let kind = match c {
            '<' if self.starts_with("<<") => {
                self.advance(2);
                TokenKind::LDoubleAngle
            }
            '<' => self.read_iri()?,
            '>' if self.starts_with(">>") => {
                self.advance(2);
                TokenKind::RDoubleAngle
            }
            '{' if self.starts_with("{|") => {
                self.advance(2);
                TokenKind::AnnotationOpen
            }
            '|' if self.starts_with("|}") => {
                self.advance(2);
                TokenKind::AnnotationClose
            }
            '^' if self.starts_with("^^") => {
                self.advance(2);
                TokenKind::DatatypeMarker
            }
            '"' | '\'' => self.read_string(c)?,
            '@' => self.read_at()?,
            '0'..='9' | '+' | '-' => self.read_number()?,
            '.' if self.peek_at(1).is_some_and(|n| n.is_ascii_digit()) => self.read_number()?,
            '.' => self.single(TokenKind::Dot),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '_' if self.starts_with("_:") => self.read_blank_label()?,
            c if is_pn_chars_base(c) || c == ':' => self.read_name()?,
            other => {
                return Err(RdfError::parse(format!("unexpected character '{other}'")));
            }
        };
        self.after_token(&kind);
        Ok(Some(Token {
            kind,
            offset: self.token_start,
        }))
    }

    fn after_token(&mut self, kind: &TokenKind) {
        match kind {
            TokenKind::Dot | TokenKind::LBrace | TokenKind::RBrace => {
                self.at_statement_start = true;
                self.directive_args = 0;
            }
            TokenKind::Prefix { .. } => {
                self.at_statement_start = false;
                self.directive_args = 2;
            }
            TokenKind::Base { .. } | TokenKind::Version { .. } => {
                self.at_statement_start = false;
                self.directive_args = 1;
            }
            _ if self.directive_args > 0 => {
                // SPARQL-style directives have no terminating dot.
                self.directive_args -= 1;
                self.at_statement_start = self.directive_args == 0;
            }
            _ => self.at_statement_start = false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(n)
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance(1);
        kind
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance(c.len_utf8());
            } else if c == '#' {
                match self.input[self.pos..].find('\n') {
                    Some(nl) => self.advance(nl + 1),
                    None => self.pos = self.input.len(),
                }
            } else {
                break;
            }
        }
    }

    fn read_iri(&mut self) -> Result<TokenKind> {
        self.advance(1);
        let start = self.pos;
        loop {
            match self.peek() {
                Some('>') => {
                    let raw = self.input[start..self.pos].to_string();
                    self.advance(1);
                    return Ok(TokenKind::IriRef(raw));
                }
                Some('\\') => {
                    self.advance(1);
                    match self.peek() {
                        Some(c @ ('u' | 'U')) => self.advance(c.len_utf8()),
                        _ => return Err(RdfError::invalid_iri("invalid escape in IRI")),
                    }
                }
                Some(c @ ('\u{0000}'..='\u{0020}' | '<' | '"' | '{' | '}' | '|' | '^' | '`')) => {
                    return Err(RdfError::invalid_iri(format!(
                        "unexpected character {c:?} in IRI"
                    )));
                }
                Some(c) => self.advance(c.len_utf8()),
                None => return Err(RdfError::parse("unterminated IRI")),
            }
        }
    }

    fn read_string(&mut self, quote: char) -> Result<TokenKind> {
        let triple: String = std::iter::repeat_n(quote, 3).collect();
        if self.starts_with(&triple) {
            self.advance(3);
            let start = self.pos;
            loop {
                if self.starts_with(&triple) && self.peek_at(3) != Some(quote) {
                    let raw = self.input[start..self.pos].to_string();
                    self.advance(3);
                    return Ok(TokenKind::LongString(raw));
                }
                match self.peek() {
                    Some('\\') => {
                        self.advance(1);
                        if let Some(c) = self.peek() {
                            self.advance(c.len_utf8());
                        }
                    }
                    Some(c) => self.advance(c.len_utf8()),
                    None => return Err(RdfError::parse("unterminated long string")),
                }
            }
        }

        self.advance(1);
        let start = self.pos;
        loop {
            match self.peek() {
                Some('\\') => {
                    self.advance(1);
                    match self.peek() {
                        Some(c) => self.advance(c.len_utf8()),
                        None => return Err(RdfError::parse("unterminated string")),
                    }
                }
                Some(c) if c == quote => {
                    let raw = self.input[start..self.pos].to_string();
                    self.advance(1);
                    return Ok(TokenKind::String(raw));
                }
                Some('\n' | '\r') | None => return Err(RdfError::parse("unterminated string")),
                Some(c) => self.advance(c.len_utf8()),
            }
        }
    }

    fn read_at(&mut self) -> Result<TokenKind> {
        self.advance(1);
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '-' {
                self.advance(1);
            } else {
                break;
            }
        }
        let word = &self.input[start..self.pos];
        if self.at_statement_start {
            match word {
                "prefix" => return Ok(TokenKind::Prefix { sparql: false }),
                "base" => return Ok(TokenKind::Base { sparql: false }),
                "version" => return Ok(TokenKind::Version { sparql: false }),
                _ => {}
            }
        }
        if word.is_empty() {
            return Err(RdfError::parse("expected language tag after '@'"));
        }
        Ok(TokenKind::LangTag(word.to_string()))
    }

    fn read_digits(&mut self) -> usize {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
        }
        self.pos - start
    }

    fn read_number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        if matches!(self.peek(), Some('+' | '-')) {
            self.advance(1);
        }
        let integral = self.read_digits();
        let mut fractional = None;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.advance(1);
            fractional = Some(self.read_digits());
        }
        let exponent_follows = match (self.peek(), self.peek_at(1), self.peek_at(2)) {
            (Some('e' | 'E'), Some(d), _) if d.is_ascii_digit() => true,
            (Some('e' | 'E'), Some('+' | '-'), Some(d)) if d.is_ascii_digit() => true,
            _ => false,
        };
        if integral == 0 && fractional.is_none() {
            return Err(RdfError::parse("invalid numeric literal"));
        }
        if exponent_follows {
            self.advance(1);
            if matches!(self.peek(), Some('+' | '-')) {
                self.advance(1);
            }
            self.read_digits();
            return Ok(TokenKind::Double(self.input[start..self.pos].to_string()));
        }
        let lexical = self.input[start..self.pos].to_string();
        Ok(match fractional {
            Some(_) => TokenKind::Decimal(lexical),
            None => TokenKind::Integer(lexical),
        })
    }

    fn read_blank_label(&mut self) -> Result<TokenKind> {
        self.advance(2);
        let start = self.pos;
        match self.peek() {
            Some(c) if is_pn_chars_u(c) || c.is_ascii_digit() => self.advance(c.len_utf8()),
            _ => return Err(RdfError::parse("empty blank node label")),
        }
        while let Some(c) = self.peek() {
            if is_pn_chars(c) || c == '.' {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        while self.input[start..self.pos].ends_with('.') {
            self.pos -= 1;
        }
        Ok(TokenKind::BlankNodeLabel(self.input[start..self.pos].to_string()))
    }

    fn read_name(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if is_pn_chars(c) || c == '.' {
                self.advance(c.len_utf8());
            } else {
                break;
            }
        }
        if self.peek() != Some(':') {
            while self.input[start..self.pos].ends_with('.') {
                self.pos -= 1;
            }
            return self.keyword(start);
        }
        let prefix = self.input[start..self.pos].to_string();
        if prefix.ends_with('.') {
            return Err(RdfError::parse(format!("invalid prefix '{prefix}'")));
        }
        self.advance(1);
        let local = self.read_local()?;
        Ok(TokenKind::PrefixedName { prefix, local })
    }

    fn read_local(&mut self) -> Result<String> {
        let mut local = String::new();
        let mut trailing_dots = 0;
        while let Some(c) = self.peek() {
            let first = local.is_empty();
            match c {
                '\\' => {
                    match self.peek_at(1) {
                        Some(e) if is_local_escape(e) => {
                            local.push(e);
                            self.advance(1 + e.len_utf8());
                        }
                        _ => return Err(RdfError::parse("invalid escape in local name")),
                    }
                    trailing_dots = 0;
                }
                '%' => {
                    let hex: String = self.input[self.pos + 1..].chars().take(2).collect();
                    if hex.len() != 2 || !hex.chars().all(|h| h.is_ascii_hexdigit()) {
                        return Err(RdfError::parse("invalid percent escape in local name"));
                    }
                    local.push('%');
                    local.push_str(&hex);
                    self.advance(3);
                    trailing_dots = 0;
                }
                '.' if !first => {
                    local.push(c);
                    self.advance(1);
                    trailing_dots += 1;
                }
                c if (first && (is_pn_chars_u(c) || c == ':' || c.is_ascii_digit()))
                    || (!first && (is_pn_chars(c) || c == ':')) =>
                {
                    local.push(c);
                    self.advance(c.len_utf8());
                    trailing_dots = 0;
                }
                _ => break,
            }
        }
        // Trailing dots terminate the statement.
        for _ in 0..trailing_dots {
            local.pop();
            self.pos -= 1;
        }
        Ok(local)
    }

    fn keyword(&mut self, start: usize) -> Result<TokenKind> {
        let word = &self.input[start..self.pos];
        let kind = match word {
            "a" => TokenKind::A,
            "true" => TokenKind::Boolean(true),
            "false" => TokenKind::Boolean(false),
            w if self.at_statement_start && w.eq_ignore_ascii_case("prefix") => {
                TokenKind::Prefix { sparql: true }
            }
            w if self.at_statement_start && w.eq_ignore_ascii_case("base") => {
                TokenKind::Base { sparql: true }
            }
            w if self.at_statement_start && w.eq_ignore_ascii_case("version") => {
                TokenKind::Version { sparql: true }
            }
            w if self.at_statement_start && w.eq_ignore_ascii_case("graph") => TokenKind::Graph,
            other => {
                return Err(RdfError::parse(format!("unexpected word '{other}'")));
            }
        };
        Ok(kind)
    }
}

/// Tokenize a whole unit of text.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    Tokenizer::new(input).tokenize()
}
