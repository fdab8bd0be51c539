//! Account subject resolution
//!
//! A line template names an account subject by key; the account name written
//! to the ledger depends on the asset classification of the record. Each
//! classification may override names, and the default (unclassified) map
//! fills the gaps.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::JournalError;

/// One entry of a subject list, as served by the subject catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectEntry {
    pub subject_key: String,
    #[serde(default)]
    pub subject_name: String,
    #[serde(default)]
    pub default_name: String,
}

impl SubjectEntry {
    pub fn new(
        subject_key: impl Into<String>,
        subject_name: impl Into<String>,
        default_name: impl Into<String>,
    ) -> Self {
        Self {
            subject_key: subject_key.into(),
            subject_name: subject_name.into(),
            default_name: default_name.into(),
        }
    }
}

/// Subject key to account name, for one classification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectMap {
    names: HashMap<String, String>,
}

impl SubjectMap {
    /// Default map: the configured name, else the catalog's default name
    pub fn from_default_entries(entries: &[SubjectEntry]) -> Self {
        let names = entries
            .iter()
            .filter_map(|entry| {
                let name = if entry.subject_name.trim().is_empty() {
                    &entry.default_name
                } else {
                    &entry.subject_name
                };
                (!name.trim().is_empty()).then(|| (entry.subject_key.clone(), name.clone()))
            })
            .collect();
        Self { names }
    }

    /// Classification map: only names configured for the classification
    pub fn from_classified_entries(entries: &[SubjectEntry]) -> Self {
        let names = entries
            .iter()
            .filter(|entry| !entry.subject_name.trim().is_empty())
            .map(|entry| (entry.subject_key.clone(), entry.subject_name.clone()))
            .collect();
        Self { names }
    }

    pub fn get(&self, subject_key: &str) -> Option<&str> {
        self.names.get(subject_key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Resolves account names for a whole run
#[derive(Debug, Clone, Default)]
pub struct SubjectMapper {
    default: SubjectMap,
    by_classification: HashMap<String, SubjectMap>,
}

impl SubjectMapper {
    pub fn new(default: SubjectMap) -> Self {
        Self {
            default,
            by_classification: HashMap::new(),
        }
    }

    pub fn insert_classification(&mut self, classification: impl Into<String>, map: SubjectMap) {
        self.by_classification.insert(classification.into(), map);
    }

    pub fn with_classification(mut self, classification: impl Into<String>, map: SubjectMap) -> Self {
        self.insert_classification(classification, map);
        self
    }

    /// Resolves the account name for a subject key
    ///
    /// Looks in the classification's map first, then in the default map.
    ///
    /// # Errors
    ///
    /// Returns `SubjectResolution` when neither map names the key.
    pub fn resolve(&self, subject_key: &str, classification: &str) -> Result<&str, JournalError> {
        self.by_classification
            .get(classification)
            .and_then(|map| map.get(subject_key))
            .or_else(|| self.default.get(subject_key))
            .ok_or_else(|| JournalError::SubjectResolution {
                subject_key: subject_key.to_string(),
            })
    }

    pub fn classifications(&self) -> impl Iterator<Item = &str> {
        self.by_classification.keys().map(String::as_str)
    }
}
