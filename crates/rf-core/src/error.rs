//! # AppError
//!
//! Centralized error handling for the Rusty-Forum core.
//! Maps domain-specific failures to actionable error types; the HTTP layer
//! picks the status code and envelope from the variant.

use serde::ser::{Serialize, SerializeMap, Serializer};
use thiserror::Error;

/// The primary error type for all rf-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or inconsistent input, keyed by field name
    #[error("{}", .0.summary())]
    Validation(FieldErrors),

    /// Referenced post, comment or vote target does not exist
    #[error("Register #{0} not found.")]
    NotFound(i64),

    /// The actor is not allowed to perform the action
    #[error("This action is unauthorized.")]
    Forbidden,

    /// No valid identity accompanied a request that needs one
    #[error("Unauthenticated.")]
    Unauthenticated,

    /// Infrastructure failure (e.g., DB down, constraint race)
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Storage(format!("{err:#}"))
    }
}

/// A specialized Result type for Rusty-Forum logic.
pub type Result<T> = std::result::Result<T, AppError>;

/// Field-keyed validation messages, serialized as `{"field": ["msg", ...]}`.
/// Fields keep the order in which they first failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(Vec<(String, Vec<String>)>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single failing field.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        match self.0.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message.into()),
            None => self.0.push((field.to_string(), vec![message.into()])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(|(_, messages)| messages.len()).sum()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, messages)| messages.as_slice())
    }

    /// `Ok(())` when nothing was recorded, otherwise the collected errors.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }

    /// First message, suffixed with how many more follow.
    pub fn summary(&self) -> String {
        let Some(first) = self.0.iter().flat_map(|(_, messages)| messages).next() else {
            return "The given data was invalid.".to_string();
        };
        match self.len() - 1 {
            0 => first.clone(),
            1 => format!("{first} (and 1 more error)"),
            n => format!("{first} (and {n} more errors)"),
        }
    }
}

impl Serialize for FieldErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (field, messages) in &self.0 {
            map.serialize_entry(field, messages)?;
        }
        map.end()
    }
}
