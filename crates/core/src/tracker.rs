use std::collections::HashMap;

use crate::models::ApplicationStatus;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusLookupError {
    #[error("please enter an application id")]
    EmptyId,
    #[error("application id {0} not found")]
    NotFound(String),
}

/// Canonical form of an application id: trimmed and upper-cased.
pub fn normalize_application_id(id: &str) -> String {
    id.trim().to_uppercase()
}

/// Normalizes a user-supplied id, rejecting one that is blank.
pub fn application_key(id: &str) -> Result<String, StatusLookupError> {
    let key = normalize_application_id(id);
    if key.is_empty() {
        return Err(StatusLookupError::EmptyId);
    }
    Ok(key)
}

/// Application statuses keyed by normalized id.
#[derive(Debug, Clone, Default)]
pub struct StatusBook {
    entries: HashMap<String, ApplicationStatus>,
}

impl StatusBook {
    pub fn new(statuses: impl IntoIterator<Item = ApplicationStatus>) -> Self {
        let mut book = Self::default();
        for status in statuses {
            book.insert(status);
        }
        book
    }

    /// Replaces any status already stored under the same normalized id.
    pub fn insert(&mut self, status: ApplicationStatus) {
        self.entries
            .insert(normalize_application_id(&status.id), status);
    }

    pub fn get(&self, id: &str) -> Option<&ApplicationStatus> {
        self.entries.get(&normalize_application_id(id))
    }

    pub fn lookup_status(&self, id: &str) -> Result<&ApplicationStatus, StatusLookupError> {
        let key = application_key(id)?;
        self.entries
            .get(&key)
            .ok_or(StatusLookupError::NotFound(key))
    }
}
