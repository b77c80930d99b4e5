/*
 * Copyright (c) 2025 Raphael Amorim
 *
 * This file is part of envdoc, which is licensed
 * under GNU General Public License v3.0.
 */

//! Ordered, format-preserving dotenv document.
//!
//! A [`Document`] is both a sequence of nodes (comments, blank lines and
//! entries, in source order) and a name to value mapping. Lookup is by name
//! and the last entry with a given name wins, as in a shell; earlier entries
//! with the same name stay in the sequence so serialization keeps them.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::hash::BuildHasher;

use crate::lexer::QuoteStyle;
use crate::parser::expand_variables;

/// Anything that can resolve `$NAME` references during parsing.
pub trait VariableSource {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl<S: BuildHasher> VariableSource for HashMap<String, String, S> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|value| Cow::Borrowed(value.as_str()))
    }
}

impl VariableSource for BTreeMap<String, String> {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|value| Cow::Borrowed(value.as_str()))
    }
}

impl VariableSource for Document {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(Cow::Borrowed)
    }
}

/// A comment line, stored exactly as written (leading whitespace and `#` included)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    raw: String,
}

impl Comment {
    pub(crate) fn from_raw(raw: String) -> Self {
        Self { raw }
    }

    /// Build a comment from free text, adding the `# ` marker when missing.
    pub fn new(text: &str) -> Self {
        let text = text.trim_end_matches(['\r', '\n']);
        if text.trim_start().starts_with('#') {
            Self::from_raw(text.to_string())
        } else if text.is_empty() {
            Self::from_raw("#".to_string())
        } else {
            Self::from_raw(format!("# {text}"))
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The comment text without the marker and surrounding whitespace.
    pub fn text(&self) -> &str {
        let trimmed = self.raw.trim_start();
        trimmed.strip_prefix('#').unwrap_or(trimmed).trim()
    }
}

/// A single `NAME=value` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    name: String,
    value: String,
    raw_value: String,
    quote: QuoteStyle,
}

impl Entry {
    /// Create an entry from a final value. The raw form is chosen so that
    /// parsing it back yields exactly `value`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        let (raw_value, quote) = encode_value(&value, None);
        Self {
            name: name.into(),
            value,
            raw_value,
            quote,
        }
    }

    pub(crate) fn from_parts(
        name: String,
        value: String,
        raw_value: String,
        quote: QuoteStyle,
    ) -> Self {
        Self {
            name,
            value,
            raw_value,
            quote,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The value after unescaping and variable expansion
    pub fn value(&self) -> &str {
        &self.value
    }

    /// The value as written, between the quotes if any
    pub fn raw_value(&self) -> &str {
        &self.raw_value
    }

    pub fn quote(&self) -> QuoteStyle {
        self.quote
    }

    /// Replace the value, keeping the quote style when it can still
    /// represent the new value. Returns the previous value.
    fn replace_value(&mut self, value: String) -> String {
        let (raw_value, quote) = encode_value(&value, Some(self.quote));
        self.raw_value = raw_value;
        self.quote = quote;
        std::mem::replace(&mut self.value, value)
    }
}

/// Document node types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Comment(Comment),
    BlankLine,
    Entry(Entry),
}

impl Node {
    pub fn as_entry(&self) -> Option<&Entry> {
        match self {
            Node::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_comment(&self) -> Option<&Comment> {
        match self {
            Node::Comment(comment) => Some(comment),
            _ => None,
        }
    }

    pub fn is_blank_line(&self) -> bool {
        matches!(self, Node::BlankLine)
    }
}

/// An ordered dotenv document.
#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Node>,
    // name -> index of the most recent entry with that name
    index: HashMap<String, usize>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last-write-wins lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_entry(name).map(Entry::value)
    }

    pub fn get_entry(&self, name: &str) -> Option<&Entry> {
        self.index
            .get(name)
            .and_then(|&index| self.nodes.get(index))
            .and_then(Node::as_entry)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Set `name` to `value`.
    ///
    /// If the name exists, the entry that currently wins lookup is rewritten
    /// in place and the previous value returned. Otherwise a new entry is
    /// appended at the end.
    ///
    /// Later entries whose raw text references `name` keep that text and are
    /// expanded again, so their values match what the serialized document
    /// parses back to.
    ///
    /// Names are not validated here; check untrusted names with
    /// [`crate::lexer::is_valid_key`] or the serialized text will not parse back.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();

        if let Some(index) = self.index.get(&name).copied() {
            if let Some(Node::Entry(entry)) = self.nodes.get_mut(index) {
                let previous = entry.replace_value(value);
                self.refresh_references(index + 1, HashSet::from([name]));
                return Some(previous);
            }
        }

        self.push_entry(Entry::new(name, value));
        None
    }

    /// Append an entry, even if its name already exists. The new entry
    /// shadows earlier ones for lookup.
    pub fn push_entry(&mut self, entry: Entry) {
        self.index.insert(entry.name.clone(), self.nodes.len());
        self.nodes.push(Node::Entry(entry));
    }

    /// Append one comment node per line of `text`.
    pub fn push_comment(&mut self, text: &str) {
        if text.is_empty() {
            self.nodes.push(Node::Comment(Comment::new(text)));
            return;
        }
        for line in text.lines() {
            self.nodes.push(Node::Comment(Comment::new(line)));
        }
    }

    pub(crate) fn push_comment_raw(&mut self, raw: String) {
        self.nodes.push(Node::Comment(Comment::from_raw(raw)));
    }

    pub fn push_blank_line(&mut self) {
        self.nodes.push(Node::BlankLine);
    }

    /// Remove every entry named `name`, returning the value that won lookup.
    /// Later references to `name` are expanded again and become empty.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let previous = self.get(name).map(str::to_string)?;
        let first = self
            .nodes
            .iter()
            .position(|node| matches!(node, Node::Entry(entry) if entry.name == name))
            .unwrap_or(self.nodes.len());
        self.nodes
            .retain(|node| !matches!(node, Node::Entry(entry) if entry.name == name));
        self.refresh_references(first, HashSet::from([name.to_string()]));
        self.reindex();
        Some(previous)
    }

    /// Re-expand entries from `start` on that reference a name in `changed`,
    /// resolving against the entries before them. An entry whose value
    /// changes joins `changed`; one that keeps its value while redefining a
    /// changed name shadows it, so it leaves `changed`.
    ///
    /// References that were resolved through a caller's variable source read
    /// as empty once re-expanded, as they do when the text is parsed again.
    fn refresh_references(&mut self, start: usize, mut changed: HashSet<String>) {
        for position in start..self.nodes.len() {
            if changed.is_empty() {
                break;
            }
            let (before, rest) = self.nodes.split_at_mut(position);
            let Some(Node::Entry(entry)) = rest.first_mut() else {
                continue;
            };

            let mut dependent = false;
            expand_variables(&entry.raw_value, entry.quote, &mut |name, _| {
                dependent |= changed.contains(name);
            });

            let mut updated = false;
            if dependent {
                let value = expand_variables(&entry.raw_value, entry.quote, &mut |name, out| {
                    if let Some(value) = lookup_before(before, name) {
                        out.push_str(value);
                    }
                });
                if value != entry.value {
                    entry.value = value;
                    updated = true;
                }
            }

            if updated {
                tracing::trace!(key = entry.name(), "re-expanded dependent entry");
                changed.insert(entry.name.clone());
            } else {
                changed.remove(&entry.name);
            }
        }
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (index, node) in self.nodes.iter().enumerate() {
            if let Node::Entry(entry) = node {
                self.index.insert(entry.name.clone(), index);
            }
        }
    }

    /// Number of distinct entry names
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// All nodes in document order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Node> {
        self.nodes.iter()
    }

    /// Every entry node in document order, shadowed ones included
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.nodes.iter().filter_map(Node::as_entry)
    }

    /// Effective `(name, value)` pairs: each name once, at the position of
    /// the entry that wins lookup.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(move |(index, node)| match node {
                Node::Entry(entry) if self.index.get(&entry.name) == Some(&index) => {
                    Some((entry.name(), entry.value()))
                }
                _ => None,
            })
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Document {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.set(name, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut document = Document::new();
        document.extend(iter);
        document
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::serializer::serialize(self))
    }
}

// Value of the last entry named `name` in `nodes`
fn lookup_before<'a>(nodes: &'a [Node], name: &str) -> Option<&'a str> {
    nodes.iter().rev().find_map(|node| match node {
        Node::Entry(entry) if entry.name == name => Some(entry.value()),
        _ => None,
    })
}

fn fits_unquoted(value: &str) -> bool {
    value.trim() == value
        && !value.starts_with(['"', '\'', '#'])
        && !value.contains(['\n', '\r', '$'])
}

fn fits_single(value: &str) -> bool {
    !value.contains('\'')
}

fn escape_double(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '$' => escaped.push_str("\\$"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Pick a raw form for `value` that parses back to exactly `value`,
/// honoring `preferred` when it can.
fn encode_value(value: &str, preferred: Option<QuoteStyle>) -> (String, QuoteStyle) {
    match preferred {
        Some(QuoteStyle::Unquoted) if fits_unquoted(value) => {
            return (value.to_string(), QuoteStyle::Unquoted);
        }
        Some(QuoteStyle::Single) if fits_single(value) => {
            return (value.to_string(), QuoteStyle::Single);
        }
        Some(QuoteStyle::Double) => return (escape_double(value), QuoteStyle::Double),
        _ => {}
    }

    if fits_unquoted(value) {
        (value.to_string(), QuoteStyle::Unquoted)
    } else if fits_single(value) {
        (value.to_string(), QuoteStyle::Single)
    } else {
        (escape_double(value), QuoteStyle::Double)
    }
}
