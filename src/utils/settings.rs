//! Environment lookups used to overlay file configuration.
//!
//! Values come from the process environment unless a fixed set of
//! variables is supplied, which keeps configuration tests independent of
//! the environment they run in.

use std::collections::HashMap;
use std::env;

/// Where environment values are read from.
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    fixed: Option<HashMap<String, String>>,
}

impl EnvSource {
    /// Reads from the process environment.
    pub fn process() -> Self {
        Self::default()
    }

    /// Reads only from the given variables.
    pub fn fixed<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fixed: Some(
                vars.into_iter()
                    .map(|(key, value)| (key.into(), value.into()))
                    .collect(),
            ),
        }
    }

    /// Returns a variable's value. Unset and empty variables are `None`.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        let value = match &self.fixed {
            Some(vars) => vars.get(key).cloned(),
            None => env::var(key).ok(),
        };
        value.filter(|v| !v.trim().is_empty())
    }

    /// Returns the first of `keys` that is set.
    pub fn get_env_vars(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|key| self.get_env_var(key))
    }
}
