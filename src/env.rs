/*
 * Copyright (c) 2025 Raphael Amorim
 *
 * This file is part of envdoc, which is licensed
 * under GNU General Public License v3.0.
 */

//! Environment variable stores the loader can write into.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::document::VariableSource;
use crate::error::{Error, Result};

/// The minimal capability set the loader needs from an environment.
pub trait Environment {
    fn get(&self, name: &str) -> Option<String>;

    fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()>;
}

/// The environment of the current process.
///
/// Writes are process-wide and unsynchronized; load once during startup,
/// before other threads read the environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|value| value.to_string_lossy().into_owned())
    }

    fn has(&self, name: &str) -> bool {
        std::env::var_os(name).is_some()
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        // std::env::set_var panics on these instead of returning an error
        if name.is_empty() || name.contains(['=', '\0']) {
            return Err(Error::Environment {
                name: name.to_string(),
                reason: "invalid variable name".to_string(),
            });
        }
        if value.contains('\0') {
            return Err(Error::Environment {
                name: name.to_string(),
                reason: "value contains a NUL byte".to_string(),
            });
        }

        unsafe {
            std::env::set_var(name, value);
        }
        Ok(())
    }
}

impl VariableSource for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        Environment::get(self, name).map(Cow::Owned)
    }
}

/// An in-memory environment, useful for tests and for collecting what a
/// load would apply without touching the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryEnv {
    vars: HashMap<String, String>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vars(&self) -> &HashMap<String, String> {
        &self.vars
    }

    pub fn into_inner(self) -> HashMap<String, String> {
        self.vars
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryEnv {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

impl Environment for MemoryEnv {
    fn get(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn has(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        self.vars.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

impl VariableSource for MemoryEnv {
    fn lookup(&self, name: &str) -> Option<Cow<'_, str>> {
        self.vars.get(name).map(|value| Cow::Borrowed(value.as_str()))
    }
}
