use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Platform, PostError};

/// Opaque key/value credential bag supplied by the caller.
///
/// Validity is field presence only. Each consumer declares the keys it needs and calls
/// [`Credentials::require`] before touching the network or a browser. `Debug` prints
/// key names only.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Returns the value when present and not blank.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    /// First non-blank value among several spellings of the same field.
    pub fn get_any(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn has_all(&self, keys: &[&str]) -> bool {
        keys.iter().all(|key| self.get(key).is_some())
    }

    /// Fails on the first absent key, in declaration order.
    pub fn require(&self, platform: Platform, keys: &[&str]) -> Result<(), PostError> {
        match keys.iter().find(|key| self.get(key).is_none()) {
            Some(missing) => Err(PostError::MissingCredential {
                platform,
                field: (*missing).to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Alias-aware lookup that reports the first spelling when every alias is absent.
    pub fn need(&self, platform: Platform, keys: &[&str]) -> Result<&str, PostError> {
        self.get_any(keys).ok_or_else(|| PostError::MissingCredential {
            platform,
            field: keys.first().copied().unwrap_or_default().to_string(),
        })
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Credentials {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
