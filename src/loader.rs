/*
 * Copyright (c) 2025 Raphael Amorim
 *
 * This file is part of envdoc, which is licensed
 * under GNU General Public License v3.0.
 */

//! Combine dotenv sources into one document and apply it to an environment.
//!
//! Sources are merged strictly in order: every file in list order, then the
//! raw content. Later sources overwrite earlier ones, and each source can
//! reference what the previous ones defined.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::document::{Document, VariableSource};
use crate::env::{Environment, ProcessEnv};
use crate::error::Result;
use crate::serializer::{Source, deserialize_document, deserialize_document_with};

/// What to load and how to apply it
#[derive(Clone, Default)]
pub struct LoadOptions {
    pub files: Vec<PathBuf>,
    pub content: Option<String>,
    /// Consulted for references a source does not declare itself.
    /// Ignored when merging several sources, where the merged document so
    /// far takes its place.
    pub expand_variables: Option<Arc<dyn VariableSource + Send + Sync>>,
    /// Replace variables that are already set in the environment
    pub override_environment: bool,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.push(path.into());
        self
    }

    pub fn files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn expand_variables(
        mut self,
        variables: impl VariableSource + Send + Sync + 'static,
    ) -> Self {
        self.expand_variables = Some(Arc::new(variables));
        self
    }

    pub fn override_environment(mut self, override_environment: bool) -> Self {
        self.override_environment = override_environment;
        self
    }

    fn source_count(&self) -> usize {
        self.files.len() + usize::from(self.content.is_some())
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("files", &self.files)
            .field("content", &self.content.as_ref().map(|_| ".."))
            .field("expand_variables", &self.expand_variables.is_some())
            .field("override_environment", &self.override_environment)
            .finish()
    }
}

/// Summary of a load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Variables written to the environment
    pub applied: usize,
    /// Variables left alone because they were already set
    pub skipped_existing: usize,
    /// Files plus raw content that were read
    pub sources: usize,
}

/// Build the document described by `options`.
pub fn parse(options: &LoadOptions) -> Result<Document> {
    match (options.files.as_slice(), options.content.as_deref()) {
        ([file], None) => deserialize_document(Source::Path(file), options),
        ([], Some(content)) => deserialize_document(Source::Content(content), options),
        ([], None) => Ok(Document::new()),
        (files, content) => merge(files, content),
    }
}

fn merge(files: &[PathBuf], content: Option<&str>) -> Result<Document> {
    tracing::debug!(
        files = files.len(),
        content = content.is_some(),
        "merging dotenv sources"
    );

    files
        .iter()
        .map(|file| Source::Path(file))
        .chain(content.map(Source::Content))
        .try_fold(Document::new(), |mut merged, source| {
            // A failing source leaves `merged` untouched
            let variables: &dyn VariableSource = &merged;
            let parsed = deserialize_document_with(source, Some(variables))?;
            for (name, value) in parsed.vars() {
                merged.set(name, value);
            }
            Ok(merged)
        })
}

/// Parse `options` and apply the result to the process environment.
pub fn load(options: &LoadOptions) -> Result<LoadReport> {
    load_into(options, &mut ProcessEnv)
}

/// Parse `options` and apply the result to `env`. A variable is written only
/// when `override_environment` is set or the variable is not set yet.
pub fn load_into<E: Environment + ?Sized>(
    options: &LoadOptions,
    env: &mut E,
) -> Result<LoadReport> {
    let document = parse(options)?;
    let mut report = LoadReport {
        sources: options.source_count(),
        ..LoadReport::default()
    };

    for (name, value) in document.vars() {
        if options.override_environment || !env.has(name) {
            env.set(name, value)?;
            report.applied += 1;
            tracing::trace!(key = name, "applied variable");
        } else {
            report.skipped_existing += 1;
            tracing::trace!(key = name, "kept existing environment value");
        }
    }

    tracing::debug!(
        applied = report.applied,
        skipped_existing = report.skipped_existing,
        sources = report.sources,
        "loaded dotenv into environment"
    );
    Ok(report)
}
