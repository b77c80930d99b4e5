/*
 * Copyright (c) 2025 Raphael Amorim
 *
 * This file is part of envdoc, which is licensed
 * under GNU General Public License v3.0.
 */

//! Error types shared by the lexer, parser, serializer and loader.
//!
//! Errors never include value text from the source, only names, paths and
//! positions, since dotenv files routinely hold secrets.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// What went wrong while tokenizing a line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexErrorKind {
    #[error("unterminated quote")]
    UnterminatedQuote,

    #[error("invalid key '{0}': keys must start with a letter or '_' and contain only letters, digits and '_'")]
    InvalidKey(String),

    #[error("empty key")]
    EmptyKey,

    #[error("expected '=' after key")]
    MissingAssignment,

    #[error("unexpected characters after closing quote")]
    TrailingCharacters,
}

/// A lexical error with the position it was detected at.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct LexError {
    pub kind: LexErrorKind,
    pub line: usize,
    pub column: usize,
}

impl LexError {
    pub fn new(kind: LexErrorKind, line: usize, column: usize) -> Self {
        Self { kind, line, column }
    }
}

/// Errors surfaced by the public API.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{}line {line}, column {column}: {kind}", display_path(.path))]
    Lexical {
        path: Option<PathBuf>,
        line: usize,
        column: usize,
        kind: LexErrorKind,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to set environment variable {name}: {reason}")]
    Environment { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!("{}: ", path.display()),
        None => String::new(),
    }
}

impl Error {
    /// Attach a file path to a lexical error that was produced from raw text.
    pub fn with_path(self, source_path: &Path) -> Self {
        match self {
            Error::Lexical {
                path: None,
                line,
                column,
                kind,
            } => Error::Lexical {
                path: Some(source_path.to_path_buf()),
                line,
                column,
                kind,
            },
            other => other,
        }
    }

    /// The lexical error kind, if this is a lexical error.
    pub fn lex_kind(&self) -> Option<&LexErrorKind> {
        match self {
            Error::Lexical { kind, .. } => Some(kind),
            _ => None,
        }
    }

    pub fn is_lexical(&self) -> bool {
        matches!(self, Error::Lexical { .. })
    }
}

impl From<LexError> for Error {
    fn from(error: LexError) -> Self {
        Error::Lexical {
            path: None,
            line: error.line,
            column: error.column,
            kind: error.kind,
        }
    }
}
