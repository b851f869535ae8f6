//! Statement-boundary scanner for the Turtle family.
//!
//! Lines are pushed in as they are read. The scanner strips comments, keeps
//! track of strings, IRIs and nesting across lines, and cuts the accumulated
//! text into units the parser can handle one at a time: a statement ending
//! in `.`, or in TriG mode a graph block opener ending in `{` or a closer
//! ending in `}`.

use std::collections::VecDeque;

use crate::error::Position;

/// A complete unit of Turtle or TriG text together with where it started.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatementUnit {
    pub text: String,
    pub position: Position,
}

impl StatementUnit {
    /// Position of the byte at `index` within this unit.
    pub fn position_at(&self, index: usize) -> Position {
        let index = index.min(self.text.len());
        let before = &self.text[..index];
        let newlines = before.matches('\n').count() as u64;
        let column = match before.rfind('\n') {
            Some(nl) => before[nl + 1..].chars().count() as u64 + 1,
            None => self.position.column + before.chars().count() as u64,
        };
        let offset = if self.position.offset < 0 {
            -1
        } else {
            self.position.offset + index as i64
        };
        Position::new(self.position.line + newlines, column, offset)
    }
}

#[derive(Clone, Debug, Default)]
struct ScanState {
    short_string: Option<char>,
    long_string: Option<char>,
    in_iri: bool,
    escaped: bool,
    bracket_depth: usize,
    paren_depth: usize,
    annotation_depth: usize,
    quoted_depth: usize,
    previous: Option<char>,
}

impl ScanState {
    fn at_top_level(&self) -> bool {
        self.bracket_depth == 0
            && self.paren_depth == 0
            && self.annotation_depth == 0
            && self.quoted_depth == 0
    }
}

fn is_name_char_before_dot(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':' | '%') || !c.is_ascii()
}

fn is_name_char_after_dot(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':') || !c.is_ascii()
}

/// A `.` between two name characters belongs to a decimal or a dotted local
/// name; anything else ends the statement.
fn is_terminator(previous: Option<char>, next: Option<char>) -> bool {
    let inside_name = previous.is_some_and(is_name_char_before_dot)
        && next.is_some_and(is_name_char_after_dot);
    !inside_name
}

/// Incremental statement scanner.
#[derive(Clone, Debug, Default)]
pub struct StatementScanner {
    trig: bool,
    state: ScanState,
    pending: String,
    start: Option<Position>,
    ready: VecDeque<StatementUnit>,
}

impl StatementScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scanner that also treats top-level `{` and `}` as unit boundaries.
    pub fn trig() -> Self {
        Self {
            trig: true,
            ..Self::default()
        }
    }

    /// Bytes accumulated towards the statement currently being read.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// True while a long string is still open.
    pub fn in_long_string(&self) -> bool {
        self.state.long_string.is_some()
    }

    /// Feed one physical line (without its terminator). `line_number` is
    /// 1-based and `line_offset` is the byte offset of the line in the input.
    pub fn push_line(&mut self, line: &str, line_number: u64, line_offset: u64) {
        let mut chars: Vec<(usize, char)> = line.char_indices().collect();
        chars.push((line.len(), '\n'));
        let at = |i: usize| chars.get(i).map(|&(_, c)| c);

        let mut i = 0;
        while i < chars.len() {
            let (byte, c) = chars[i];
            let next = at(i + 1);
            let position = Position::new(line_number, i as u64 + 1, (line_offset + byte as u64) as i64);

            if self.state.escaped {
                self.state.escaped = false;
                self.append(c, position);
                i += 1;
                continue;
            }

            if let Some(quote) = self.state.long_string {
                if c == '\\' {
                    self.state.escaped = true;
                } else if c == quote
                    && next == Some(quote)
                    && at(i + 2) == Some(quote)
                    && at(i + 3) != Some(quote)
                {
                    self.append_str(&quote.to_string().repeat(3), position);
                    self.state.long_string = None;
                    self.state.previous = Some(quote);
                    i += 3;
                    continue;
                }
                self.append(c, position);
                i += 1;
                continue;
            }

            if let Some(quote) = self.state.short_string {
                if c == '\\' {
                    self.state.escaped = true;
                } else if c == quote || c == '\n' {
                    self.state.short_string = None;
                }
                self.append(c, position);
                i += 1;
                continue;
            }

            if self.state.in_iri {
                if c == '>' || c == '\n' {
                    self.state.in_iri = false;
                } else if c == '\\' {
                    self.state.escaped = true;
                }
                self.append(c, position);
                i += 1;
                continue;
            }

            match c {
                '#' => {
                    // Comment: skip to the synthetic line terminator.
                    i = chars.len() - 1;
                    continue;
                }
                '"' | '\'' => {
                    if next == Some(c) && at(i + 2) == Some(c) {
                        self.append_str(&c.to_string().repeat(3), position);
                        self.state.long_string = Some(c);
                        i += 3;
                        continue;
                    }
                    self.state.short_string = Some(c);
                    self.append(c, position);
                }
                '<' if next == Some('<') => {
                    self.append_str("<<", position);
                    self.state.quoted_depth += 1;
                    i += 2;
                    continue;
                }
                '<' => {
                    self.state.in_iri = true;
                    self.append(c, position);
                }
                '>' if next == Some('>') && self.state.quoted_depth > 0 => {
                    self.append_str(">>", position);
                    self.state.quoted_depth -= 1;
                    i += 2;
                    continue;
                }
                '[' => {
                    self.state.bracket_depth += 1;
                    self.append(c, position);
                }
                ']' => {
                    self.state.bracket_depth = self.state.bracket_depth.saturating_sub(1);
                    self.append(c, position);
                }
                '(' => {
                    self.state.paren_depth += 1;
                    self.append(c, position);
                }
                ')' => {
                    self.state.paren_depth = self.state.paren_depth.saturating_sub(1);
                    self.append(c, position);
                }
                '{' if next == Some('|') => {
                    self.append_str("{|", position);
                    self.state.annotation_depth += 1;
                    i += 2;
                    continue;
                }
                '|' if next == Some('}') && self.state.annotation_depth > 0 => {
                    self.append_str("|}", position);
                    self.state.annotation_depth -= 1;
                    i += 2;
                    continue;
                }
                '{' | '}' => {
                    self.append(c, position);
                    if self.trig && self.state.at_top_level() {
                        self.cut();
                    }
                }
                '\\' => {
                    self.state.escaped = true;
                    self.append(c, position);
                }
                '.' => {
                    let terminates =
                        self.state.at_top_level() && is_terminator(self.state.previous, next);
                    self.append(c, position);
                    if terminates {
                        self.cut();
                    }
                }
                _ => self.append(c, position),
            }
            i += 1;
        }
    }

    /// The next complete unit, if one is ready.
    pub fn next_unit(&mut self) -> Option<StatementUnit> {
        self.ready.pop_front()
    }

    /// Take whatever remains after the last complete unit, if it is not
    /// blank. Called at end of input.
    pub fn finish(&mut self) -> Option<StatementUnit> {
        let text = std::mem::take(&mut self.pending);
        let start = self.start.take();
        let trimmed = text.trim_end();
        if trimmed.is_empty() {
            return None;
        }
        Some(StatementUnit {
            text: trimmed.to_string(),
            position: start.unwrap_or_default(),
        })
    }

    fn append(&mut self, c: char, position: Position) {
        if self.start.is_none() {
            if c.is_whitespace() {
                self.state.previous = Some(c);
                return;
            }
            self.start = Some(position);
        }
        self.pending.push(c);
        self.state.previous = Some(c);
    }

    fn append_str(&mut self, s: &str, position: Position) {
        if self.start.is_none() {
            self.start = Some(position);
        }
        self.pending.push_str(s);
        self.state.previous = s.chars().last();
    }

    fn cut(&mut self) {
        let text = std::mem::take(&mut self.pending);
        let position = self.start.take().unwrap_or_default();
        self.ready.push_back(StatementUnit {
            text: text.trim_end().to_string(),
            position,
        });
    }
}

/// True when `text` holds at least one complete Turtle statement.
pub fn is_statement_complete(text: &str) -> bool {
    let (complete, _) = split_statements(text);
    !complete.is_empty()
}

/// Split `block` into complete Turtle statements, returning them together with
/// any trailing incomplete remainder. Comments are removed from the output.
pub fn split_statements(block: &str) -> (Vec<String>, String) {
    let mut scanner = StatementScanner::new();
    let mut offset = 0u64;
    for (index, line) in block.split('\n').enumerate() {
        scanner.push_line(line, index as u64 + 1, offset);
        offset += line.len() as u64 + 1;
    }
    let mut complete = Vec::new();
    while let Some(unit) = scanner.next_unit() {
        complete.push(unit.text);
    }
    let remainder = scanner.finish().map(|unit| unit.text).unwrap_or_default();
    (complete, remainder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_statement() {
        assert!(is_statement_complete("<s> <p> <o> ."));
        assert!(!is_statement_complete("<s> <p> <o>"));
    }

    #[test]
    fn dot_inside_string_and_iri() {
        assert!(!is_statement_complete("<s> <p> \"a. b\""));
        assert!(!is_statement_complete("<http://example.org/a.b> <p>"));
        assert!(!is_statement_complete("<s> <p> \"\"\"x.\ny.\"\"\""));
    }

    #[test]
    fn decimals_and_dotted_names_do_not_terminate() {
        assert!(!is_statement_complete("<s> <p> 1.5"));
        assert!(!is_statement_complete("ex:s ex:p ex:a.b"));
        assert!(is_statement_complete("<s> <p> 1."));
        assert!(is_statement_complete("<s> <p> 1.5 ."));
    }

    #[test]
    fn nesting_defers_terminator() {
        assert!(!is_statement_complete("<s> <p> [ <q> \"x\" . "));
        assert!(!is_statement_complete("<s> <p> ( 1 2 . "));
        assert!(!is_statement_complete("<s> <p> <o> {| <q> <r> ."));
        assert!(is_statement_complete("<s> <p> <o> {| <q> <r> |} ."));
    }

    #[test]
    fn comments_are_stripped() {
        let (complete, rest) = split_statements("<s> <p> <o> . # trailing . comment\n# only\n<a> <b>");
        assert_eq!(complete, vec!["<s> <p> <o> ."]);
        assert_eq!(rest, "<a> <b>");
        assert!(!is_statement_complete("<s> <p> \"#not a comment\""));
    }

    #[test]
    fn split_keeps_remainder() {
        let (complete, rest) = split_statements("<a> <b> <c> . <d> <e> <f> . <g> <h>");
        assert_eq!(complete, vec!["<a> <b> <c> .", "<d> <e> <f> ."]);
        assert_eq!(rest, "<g> <h>");
    }

    #[test]
    fn long_string_with_trailing_quote() {
        let (complete, rest) = split_statements("<s> <p> \"\"\"say \"hi\"\"\"\" .");
        assert_eq!(complete.len(), 1);
        assert!(rest.is_empty());
    }

    #[test]
    fn escaped_quote_in_string() {
        assert!(!is_statement_complete("<s> <p> \"a\\\" . b"));
    }

    #[test]
    fn quoted_triples() {
        assert!(is_statement_complete("<< <s> <p> <o> >> <q> 1 ."));
        assert!(!is_statement_complete("<< <s> <p> ex:o . "));
    }

    #[test]
    fn trig_braces_are_boundaries() {
        let mut scanner = StatementScanner::trig();
        scanner.push_line("GRAPH <g> { <s> <p> <o> . <s> <p> <o2> }", 1, 0);
        let units: Vec<String> = std::iter::from_fn(|| scanner.next_unit())
            .map(|u| u.text)
            .collect();
        assert_eq!(units, vec!["GRAPH <g> {", "<s> <p> <o> .", "<s> <p> <o2> }"]);
    }

    #[test]
    fn unit_positions() {
        let mut scanner = StatementScanner::new();
        scanner.push_line("<a> <b> <c> .  <d>", 1, 0);
        scanner.push_line("  <e> <f> .", 2, 19);
        let first = scanner.next_unit().unwrap();
        assert_eq!(first.position, Position::new(1, 1, 0));
        let second = scanner.next_unit().unwrap();
        assert_eq!(second.position, Position::new(1, 16, 15));
        assert_eq!(second.text, "<d>\n  <e> <f> .");
        let at = second.position_at(second.text.find("<e>").unwrap());
        assert_eq!((at.line, at.column), (2, 3));
    }
}
