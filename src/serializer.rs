/*
 * Copyright (c) 2025 Raphael Amorim
 *
 * This file is part of envdoc, which is licensed
 * under GNU General Public License v3.0.
 */

use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::document::{Document, Entry, Node, VariableSource};
use crate::error::{Error, Result};
use crate::lexer::Lexer;
use crate::loader::LoadOptions;
use crate::parser::Parser;

/// Line terminator written after every node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Configuration options for the serializer
#[derive(Debug, Clone, Default)]
pub struct SerializerConfig {
    pub line_ending: LineEnding,
}

/// Where a document comes from
#[derive(Debug, Clone, Copy)]
pub enum Source<'a> {
    Path(&'a Path),
    Content(&'a str),
}

/// Writes documents back to dotenv text.
///
/// Comments and quote styles are reproduced exactly. Whitespace around `=`
/// and after values is not kept: entries are always written as
/// `NAME=value`, and every node ends with the configured line ending.
///
/// Entries keep their `$NAME` references as written. [`Document::set`] and
/// [`Document::remove`] expand the entries that depend on the edited name
/// again, so a document parsed without an outside variable source reads back
/// with the same values after any edit.
#[derive(Debug, Clone, Default)]
pub struct Serializer {
    config: SerializerConfig,
}

impl Serializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: SerializerConfig) -> Self {
        Self { config }
    }

    pub fn serialize(&self, document: &Document) -> String {
        let line_ending = self.config.line_ending.as_str();
        let mut result = String::new();
        for node in document {
            self.format_node(node, &mut result);
            result.push_str(line_ending);
        }
        result
    }

    pub fn format_node(&self, node: &Node, out: &mut String) {
        match node {
            Node::Comment(comment) => out.push_str(comment.raw()),
            Node::BlankLine => {}
            Node::Entry(entry) => self.format_entry(entry, out),
        }
    }

    fn format_entry(&self, entry: &Entry, out: &mut String) {
        out.push_str(entry.name());
        out.push('=');
        match entry.quote().delimiter() {
            Some(quote) => {
                out.push(quote);
                out.push_str(entry.raw_value());
                out.push(quote);
            }
            None => out.push_str(entry.raw_value()),
        }
    }

    /// Serialize `document` into the file at `path`, replacing its contents.
    pub fn write_file(&self, document: &Document, path: &Path) -> Result<()> {
        fs::write(path, self.serialize(document)).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), entries = document.len(), "wrote dotenv file");
        Ok(())
    }
}

/// Serialize with the default configuration.
pub fn serialize(document: &Document) -> String {
    Serializer::new().serialize(document)
}

/// Materialize one source into a document, expanding references through
/// the options' variable source (or the document itself when unset).
pub fn deserialize_document(source: Source<'_>, options: &LoadOptions) -> Result<Document> {
    let variables = options
        .expand_variables
        .as_deref()
        .map(|variables| variables as &dyn VariableSource);
    deserialize_document_with(source, variables)
}

/// Like [`deserialize_document`], with the expansion source given directly.
pub fn deserialize_document_with(
    source: Source<'_>,
    variables: Option<&dyn VariableSource>,
) -> Result<Document> {
    match source {
        Source::Content(content) => parse_content(content, variables),
        Source::Path(path) => {
            // The file is read fully and closed before parsing
            let content = fs::read_to_string(path).map_err(|source| Error::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let document =
                parse_content(&content, variables).map_err(|error| error.with_path(path))?;
            tracing::debug!(
                path = %path.display(),
                entries = document.len(),
                "parsed dotenv file"
            );
            Ok(document)
        }
    }
}

fn parse_content(content: &str, variables: Option<&dyn VariableSource>) -> Result<Document> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let lexer = Lexer::new(content);
    let parser = match variables {
        Some(variables) => Parser::with_variables(lexer, variables),
        None => Parser::new(lexer),
    };
    parser.parse_document()
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(content: &str) -> Result<Self> {
        deserialize_document_with(Source::Content(content), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn round_trip(input: &str) -> String {
        let document: Document = input.parse().expect("parse should succeed");
        serialize(&document)
    }

    #[test]
    fn test_comment_preservation() {
        assert_eq!(round_trip("# note\n\nX=1\n"), "# note\n\nX=1\n");
        assert_eq!(round_trip("   #  indented  \n"), "   #  indented  \n");
    }

    #[test]
    fn test_quote_styles_are_kept() {
        let input = "A=plain\nB='single $A'\nC=\"double\\n$A\"\n";
        assert_eq!(round_trip(input), input);
    }

    #[test]
    fn test_whitespace_is_normalized() {
        assert_eq!(round_trip("  KEY =  value  "), "KEY=value\n");
        assert_eq!(round_trip("KEY=\"v\"   \n"), "KEY=\"v\"\n");
    }

    #[test]
    fn test_crlf_output() {
        let document: Document = "# c\nX=1".parse().unwrap();
        let serializer = Serializer::with_config(SerializerConfig {
            line_ending: LineEnding::CrLf,
        });
        assert_eq!(serializer.serialize(&document), "# c\r\nX=1\r\n");
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(serialize(&Document::new()), "");
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let document: Document = "\u{feff}X=1".parse().unwrap();
        assert_eq!(document.get("X"), Some("1"));
    }

    #[test]
    fn test_set_values_survive_round_trip() {
        let mut document = Document::new();
        document.set("QUOTES", "it's \"quoted\" and costs $5");
        document.set("SPACES", "  padded  ");
        document.set("MULTI", "one\ntwo");

        let reparsed: Document = serialize(&document).parse().unwrap();
        for (name, value) in document.vars() {
            assert_eq!(reparsed.get(name), Some(value), "value of {name}");
        }
    }

    #[test]
    fn test_display_matches_serialize() {
        let document: Document = "A=1\n# c\n".parse().unwrap();
        assert_eq!(document.to_string(), serialize(&document));
    }
}
