// crates/site-bench-core/src/core/identifiers.rs
// ============================================================================
// Module: Site Bench Identifiers
// Description: Opaque identifiers for components, profiles, and runs.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: rand, serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings that serialize transparently. Component
//! identifiers are validated at request boundaries through
//! [`ComponentId::parse`]; the other wrappers perform no validation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use rand::RngCore;
use serde::Deserialize;
use serde::Serialize;

use crate::core::request::ValidationError;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum length of a component identifier in bytes.
pub const MAX_COMPONENT_ID_LENGTH: usize = 255;

// ============================================================================
// SECTION: Component Identifier
// ============================================================================

/// Identifier naming an optional, independently activatable component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(String);

impl ComponentId {
    /// Creates a component identifier without validation.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parses an externally supplied component identifier.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidComponent`] when the identifier is
    /// empty, too long, or contains control characters.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::InvalidComponent("component id is empty".to_string()));
        }
        if trimmed.len() > MAX_COMPONENT_ID_LENGTH {
            return Err(ValidationError::InvalidComponent(format!(
                "component id exceeds {MAX_COMPONENT_ID_LENGTH} bytes"
            )));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(ValidationError::InvalidComponent(format!(
                "component id contains control characters: {}",
                trimmed.escape_debug()
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ComponentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Profile Identifier
// ============================================================================

/// Identifier of a persisted benchmark profile.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(String);

impl ProfileId {
    /// Creates a new profile identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Run Identifier
// ============================================================================

/// Identifier of a single benchmark run.
///
/// # Invariants
/// - Generated identifiers sort by start time at millisecond resolution.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Creates a run identifier from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh run identifier anchored at `started_at`.
    #[must_use]
    pub fn generate(started_at: Timestamp) -> Self {
        let suffix = rand::thread_rng().next_u32();
        Self(format!("run-{:013}-{suffix:08x}", started_at.unix_millis().max(0)))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
