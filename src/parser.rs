/*
 * Copyright (c) 2025 Raphael Amorim
 *
 * This file is part of envdoc, which is licensed
 * under GNU General Public License v3.0.
 */

use crate::document::{Document, Entry, VariableSource};
use crate::error::{LexError, LexErrorKind, Result};
use crate::lexer::{Lexer, Position, QuoteStyle, Token, TokenKind};

/// Resolves `$NAME` references: entries already declared in the document
/// being built first, then the caller's source.
struct Scope<'a> {
    local: &'a Document,
    outer: Option<&'a dyn VariableSource>,
}

impl Scope<'_> {
    fn resolve(&self, name: &str, out: &mut String) {
        if let Some(value) = self.local.get(name) {
            out.push_str(value);
        } else if let Some(value) = self.outer.and_then(|outer| outer.lookup(name)) {
            out.push_str(&value);
        }
        // Unresolved names expand to nothing
    }
}

/// Parser converts tokens into a [`Document`]
pub struct Parser<'a> {
    lexer: Lexer,
    current_token: Token,
    variables: Option<&'a dyn VariableSource>,
}

impl<'a> Parser<'a> {
    pub fn new(lexer: Lexer) -> Self {
        Self {
            lexer,
            current_token: Token {
                kind: TokenKind::EOF,
                position: Position::new(0, 0),
            },
            variables: None,
        }
    }

    /// Resolve references that are not declared earlier in the source
    /// through `variables`.
    pub fn with_variables(lexer: Lexer, variables: &'a dyn VariableSource) -> Self {
        Self {
            variables: Some(variables),
            ..Self::new(lexer)
        }
    }

    fn next_token(&mut self) -> std::result::Result<(), LexError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn error(&self, kind: LexErrorKind) -> LexError {
        let position = self.current_token.position;
        LexError::new(kind, position.line, position.column)
    }

    /// Parse the whole input. Nothing is returned unless every line parsed.
    pub fn parse_document(mut self) -> Result<Document> {
        let mut document = Document::new();
        self.next_token()?;

        loop {
            match &self.current_token.kind {
                TokenKind::EOF => break,
                TokenKind::Comment(raw) => {
                    document.push_comment_raw(raw.clone());
                    self.next_token()?;
                }
                TokenKind::BlankLine => {
                    document.push_blank_line();
                    self.next_token()?;
                }
                TokenKind::Key(_) => {
                    let line = self.current_token.position.line;
                    let entry = self.parse_entry(&document)?;
                    if document.contains_key(entry.name()) {
                        tracing::debug!(
                            key = entry.name(),
                            line,
                            "duplicate key shadows an earlier entry"
                        );
                    }
                    document.push_entry(entry);
                }
                // A value with no key in front of it
                TokenKind::Assignment | TokenKind::Value { .. } => {
                    return Err(self.error(LexErrorKind::EmptyKey).into());
                }
            }
        }

        Ok(document)
    }

    fn parse_entry(&mut self, document: &Document) -> Result<Entry> {
        let name = match &self.current_token.kind {
            TokenKind::Key(name) => name.clone(),
            _ => return Err(self.error(LexErrorKind::EmptyKey).into()),
        };

        self.next_token()?; // Skip key
        if self.current_token.kind != TokenKind::Assignment {
            return Err(self.error(LexErrorKind::MissingAssignment).into());
        }

        self.next_token()?; // Skip '='
        let (raw, quote) = match &self.current_token.kind {
            TokenKind::Value { raw, quote } => (raw.clone(), *quote),
            _ => return Err(self.error(LexErrorKind::MissingAssignment).into()),
        };

        let scope = Scope {
            local: document,
            outer: self.variables,
        };
        let value = expand_variables(&raw, quote, &mut |name, out| scope.resolve(name, out));

        self.next_token()?; // Skip value

        Ok(Entry::from_parts(name, value, raw, quote))
    }
}

fn is_name_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Expand `${NAME}` and `$NAME` references in a value, handing each name to
/// `resolve`. Double-quoted values also decode backslash sequences in the
/// same pass, so `\$` yields a literal dollar sign. Single-quoted values are
/// returned unchanged.
pub(crate) fn expand_variables(
    input: &str,
    quote: QuoteStyle,
    resolve: &mut dyn FnMut(&str, &mut String),
) -> String {
    if quote == QuoteStyle::Single {
        return input.to_string();
    }
    let escapes = quote == QuoteStyle::Double;
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if escapes => match chars.next() {
                Some('n') => result.push('\n'),
                Some('t') => result.push('\t'),
                Some('r') => result.push('\r'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('$') => result.push('$'),
                Some(other) => {
                    // Unknown escapes are kept as written
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            },
            '$' => match chars.peek() {
                Some('{') => {
                    let mut lookahead = chars.clone();
                    lookahead.next(); // Skip '{'

                    let mut var_name = String::new();
                    let mut closed = false;
                    for c in lookahead.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        var_name.push(c);
                    }

                    if closed {
                        chars = lookahead;
                        resolve(&var_name, &mut result);
                    } else {
                        // No closing brace, keep the text literally
                        result.push('$');
                    }
                }
                Some(&next) if is_name_start(next) => {
                    let mut var_name = String::new();
                    while let Some(&c) = chars.peek() {
                        if !is_name_char(c) {
                            break;
                        }
                        var_name.push(c);
                        chars.next();
                    }
                    resolve(&var_name, &mut result);
                }
                _ => result.push('$'),
            },
            _ => result.push(c),
        }
    }

    result
}
