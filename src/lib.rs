pub mod document;
pub mod env;
pub mod error;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod serializer;

pub use document::{Comment, Document, Entry, Node, VariableSource};
pub use env::{Environment, MemoryEnv, ProcessEnv};
pub use error::{Error, LexError, LexErrorKind, Result};
pub use lexer::QuoteStyle;
pub use loader::{LoadOptions, LoadReport, load, load_into, parse};
pub use serializer::{
    LineEnding, Serializer, SerializerConfig, Source, deserialize_document,
    deserialize_document_with, serialize,
};
