/*
 * Copyright (c) 2025 Raphael Amorim
 *
 * This file is part of envdoc, which is licensed
 * under GNU General Public License v3.0.
 */

use crate::error::{LexError, LexErrorKind};

/// How a value was quoted in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuoteStyle {
    #[default]
    Unquoted,
    Single, // '...'
    Double, // "..."
}

impl QuoteStyle {
    pub fn delimiter(self) -> Option<char> {
        match self {
            QuoteStyle::Unquoted => None,
            QuoteStyle::Single => Some('\''),
            QuoteStyle::Double => Some('"'),
        }
    }
}

/// Token types that can be produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A whole comment line, leading whitespace and `#` included
    Comment(String),
    Key(String),
    Assignment, // =
    /// Value text as written, without the surrounding quotes
    Value {
        raw: String,
        quote: QuoteStyle,
    },
    BlankLine,
    EOF,
}

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

/// Source position information, 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// Returns true if `name` can be used as an environment variable name.
pub fn is_valid_key(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    LineStart,
    Assignment,
    Value,
}

/// Lexer that converts dotenv text into tokens, one line at a time
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    read_position: usize,
    ch: char,
    line: usize,
    column: usize,
    state: State,
    finished: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let mut lexer = Self {
            input: input.chars().collect(),
            position: 0,
            read_position: 0,
            ch: '\0',
            line: 1,
            column: 0,
            state: State::LineStart,
            finished: false,
        };
        lexer.read_char();
        lexer
    }

    /// Tokenize the whole input. The last token is always `EOF`.
    pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
        Lexer::new(input).collect()
    }

    fn read_char(&mut self) {
        if self.ch == '\n' && !self.is_eof() {
            self.line += 1;
            self.column = 0;
        }
        self.ch = self.input.get(self.read_position).copied().unwrap_or('\0');
        self.position = self.read_position;
        self.read_position += 1;
        self.column += 1;
    }

    fn is_eof(&self) -> bool {
        self.position >= self.input.len()
    }

    fn current_position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn error(&self, kind: LexErrorKind, position: Position) -> LexError {
        LexError::new(kind, position.line, position.column)
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        match self.state {
            State::LineStart => self.read_line_start(),
            State::Assignment => {
                let position = self.current_position();
                self.read_char(); // Skip the '='
                self.state = State::Value;
                Ok(Token {
                    kind: TokenKind::Assignment,
                    position,
                })
            }
            State::Value => self.read_value(),
        }
    }

    fn read_line_start(&mut self) -> Result<Token, LexError> {
        let line_start = self.position;
        let position = self.current_position();

        self.skip_whitespace();

        if self.is_eof() {
            // Whitespace-only last line without a newline still counts
            let kind = if line_start < self.input.len() {
                TokenKind::BlankLine
            } else {
                TokenKind::EOF
            };
            return Ok(Token { kind, position });
        }

        match self.ch {
            '\n' => {
                self.read_char();
                Ok(Token {
                    kind: TokenKind::BlankLine,
                    position,
                })
            }
            '#' => Ok(self.read_comment(line_start, position)),
            _ => self.read_key(),
        }
    }

    fn read_comment(&mut self, line_start: usize, position: Position) -> Token {
        while !self.is_eof() && self.ch != '\n' {
            self.read_char();
        }

        let mut comment: String = self.input[line_start..self.position].iter().collect();
        if comment.ends_with('\r') {
            comment.pop();
        }

        self.skip_newline();

        Token {
            kind: TokenKind::Comment(comment),
            position,
        }
    }

    fn read_key(&mut self) -> Result<Token, LexError> {
        let position = self.current_position();
        let mut key = String::new();

        while !self.is_eof() && self.ch != '=' && self.ch != '\n' {
            key.push(self.ch);
            self.read_char();
        }

        if self.is_eof() || self.ch == '\n' {
            return Err(self.error(LexErrorKind::MissingAssignment, position));
        }

        let key = key.trim();
        if key.is_empty() {
            return Err(self.error(LexErrorKind::EmptyKey, position));
        }
        if !is_valid_key(key) {
            return Err(self.error(LexErrorKind::InvalidKey(key.to_string()), position));
        }

        self.state = State::Assignment;
        Ok(Token {
            kind: TokenKind::Key(key.to_string()),
            position,
        })
    }

    fn read_value(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        let position = self.current_position();

        let (raw, quote) = match self.ch {
            '"' if !self.is_eof() => (self.read_quoted('"', position)?, QuoteStyle::Double),
            '\'' if !self.is_eof() => (self.read_quoted('\'', position)?, QuoteStyle::Single),
            _ => (self.read_unquoted(), QuoteStyle::Unquoted),
        };

        self.skip_newline();
        self.state = State::LineStart;

        Ok(Token {
            kind: TokenKind::Value { raw, quote },
            position,
        })
    }

    fn read_unquoted(&mut self) -> String {
        let mut value = String::new();
        while !self.is_eof() && self.ch != '\n' {
            value.push(self.ch);
            self.read_char();
        }
        value.truncate(value.trim_end().len());
        value
    }

    /// Read a quoted value up to its closing delimiter. Escapes are kept
    /// verbatim in double quotes so the closing quote can be escaped.
    fn read_quoted(&mut self, delimiter: char, position: Position) -> Result<String, LexError> {
        self.read_char(); // Skip the opening quote

        let mut value = String::new();
        loop {
            if self.is_eof() {
                return Err(self.error(LexErrorKind::UnterminatedQuote, position));
            }
            if self.ch == delimiter {
                break;
            }
            if delimiter == '"' && self.ch == '\\' {
                value.push(self.ch);
                self.read_char();
                if self.is_eof() {
                    return Err(self.error(LexErrorKind::UnterminatedQuote, position));
                }
            }
            value.push(self.ch);
            self.read_char();
        }

        self.read_char(); // Skip the closing quote

        self.skip_whitespace();
        if !self.is_eof() && self.ch != '\n' {
            return Err(self.error(LexErrorKind::TrailingCharacters, self.current_position()));
        }

        Ok(value)
    }

    fn skip_newline(&mut self) {
        if self.ch == '\n' && !self.is_eof() {
            self.read_char();
        }
    }

    fn skip_whitespace(&mut self) {
        while !self.is_eof() && self.ch.is_whitespace() && self.ch != '\n' {
            self.read_char();
        }
    }
}

impl Iterator for Lexer {
    type Item = Result<Token, LexError>;

    /// Yields tokens up to and including `EOF`, or stops after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let token = self.next_token();
        match &token {
            Ok(Token {
                kind: TokenKind::EOF,
                ..
            })
            | Err(_) => self.finished = true,
            Ok(_) => {}
        }
        Some(token)
    }
}
