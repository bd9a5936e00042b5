// Key-value preference store abstraction

use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value types a preference can hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Int(i64),
    Str(String),
}

impl PrefValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PrefValue::Int(_) => "int",
            PrefValue::Str(_) => "string",
        }
    }
}

impl std::fmt::Display for PrefValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefValue::Int(i) => write!(f, "{}", i),
            PrefValue::Str(s) => write!(f, "{}", s),
        }
    }
}

/// Flat-namespace key-value store the task store persists into
pub trait Preferences {
    /// Read the raw value for a key
    fn get(&self, key: &str) -> Result<Option<PrefValue>>;

    /// Write a value, replacing whatever the key held
    fn put(&mut self, key: &str, value: PrefValue) -> Result<()>;

    /// Remove a key. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;

    fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key)? {
            None => Ok(None),
            Some(PrefValue::Str(s)) => Ok(Some(s)),
            Some(other) => Err(eyre!("Preference {} holds an {}, not a string", key, other.type_name())),
        }
    }

    fn get_int(&self, key: &str) -> Result<Option<i64>> {
        match self.get(key)? {
            None => Ok(None),
            Some(PrefValue::Int(i)) => Ok(Some(i)),
            Some(other) => Err(eyre!("Preference {} holds a {}, not an int", key, other.type_name())),
        }
    }

    fn put_string(&mut self, key: &str, value: &str) -> Result<()> {
        self.put(key, PrefValue::Str(value.to_string()))
    }

    fn put_int(&mut self, key: &str, value: i64) -> Result<()> {
        self.put(key, PrefValue::Int(value))
    }
}

/// Preferences held only in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    values: HashMap<String, PrefValue>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<PrefValue>> {
        Ok(self.values.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: PrefValue) -> Result<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Validate a preference key
pub(crate) fn validate_key(key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(eyre!("Preference key cannot be empty or whitespace-only"));
    }
    if key.len() > 256 {
        return Err(eyre!("Preference key too long: {} chars (max 256)", key.len()));
    }
    Ok(())
}
