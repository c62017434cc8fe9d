// crates/site-bench-core/src/core/request.rs
// ============================================================================
// Module: Site Bench Requests
// Description: External request shape, validated request, and profiles.
// Purpose: Turn untrusted caller input into an immutable, typed request.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`RawBenchmarkRequest`] mirrors what an external caller submits: string
//! test labels, integer intensities, and string component identifiers, plus an
//! optional profile id. [`RawBenchmarkRequest::resolve`] validates it into a
//! [`BenchmarkRequest`], which is immutable once built.
//! Security posture: request inputs are untrusted and fail closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::components::ComponentSet;
use crate::core::identifiers::ComponentId;
use crate::core::identifiers::ProfileId;
use crate::core::kinds::Intensity;
use crate::core::kinds::TestKind;
use crate::interfaces::ProfileResolver;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum number of components a request may name.
pub const MAX_REQUEST_COMPONENTS: usize = 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Malformed benchmark request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Test label does not name a known test kind.
    #[error("unknown test kind: {0}")]
    UnknownTestKind(String),
    /// Intensity key does not name a known test kind.
    #[error("unknown intensity key: {0}")]
    UnknownIntensityKey(String),
    /// Request selects no tests.
    #[error("no tests selected")]
    NoTestsSelected,
    /// Component identifier is malformed.
    #[error("invalid component: {0}")]
    InvalidComponent(String),
    /// Request names more components than allowed.
    #[error("too many components: {actual} (max {max})")]
    TooManyComponents {
        /// Maximum allowed components.
        max: usize,
        /// Components supplied.
        actual: usize,
    },
    /// Profile id could not be resolved.
    #[error("unknown profile: {0}")]
    UnknownProfile(String),
}

// ============================================================================
// SECTION: Profiles
// ============================================================================

/// Named preset of test kinds and components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenchmarkProfile {
    /// Profile identifier.
    pub id: ProfileId,
    /// Display name.
    pub name: String,
    /// Test kinds the profile selects.
    pub tests: Vec<TestKind>,
    /// Components the profile requests active.
    pub components: ComponentSet,
}

// ============================================================================
// SECTION: Raw Request
// ============================================================================

/// Request as submitted by an external caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBenchmarkRequest {
    /// Selected test labels.
    #[serde(default)]
    pub tests: Vec<String>,
    /// Intensity per test label; values are clamped to `0..=100`.
    #[serde(default)]
    pub intensities: BTreeMap<String, i64>,
    /// Component identifiers that should be active during the run.
    #[serde(default)]
    pub components: Vec<String>,
    /// Optional profile used to resolve tests and components.
    #[serde(default)]
    pub profile_id: Option<String>,
}

impl RawBenchmarkRequest {
    /// Validates the raw request into a [`BenchmarkRequest`].
    ///
    /// When `profile_id` is set, the profile's tests and components replace
    /// the request's own; intensities always come from the request.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when any field is malformed or the profile
    /// cannot be resolved.
    pub fn resolve(
        &self,
        profiles: Option<&dyn ProfileResolver>,
    ) -> Result<BenchmarkRequest, ValidationError> {
        let profile = match &self.profile_id {
            Some(raw_id) => {
                let id = ProfileId::new(raw_id.trim());
                let resolved = profiles.and_then(|resolver| resolver.profile(&id));
                Some(resolved.ok_or_else(|| ValidationError::UnknownProfile(raw_id.clone()))?)
            }
            None => None,
        };

        let (tests, components) = match &profile {
            Some(profile) => (profile.tests.clone(), profile.components.clone()),
            None => (parse_tests(&self.tests)?, parse_components(&self.components)?),
        };

        let mut request = BenchmarkRequest::new(tests, components)?;
        for (label, value) in &self.intensities {
            let kind = TestKind::from_label(label)
                .ok_or_else(|| ValidationError::UnknownIntensityKey(label.clone()))?;
            request = request.with_intensity(kind, Intensity::clamped(*value));
        }
        if let Some(profile) = profile {
            request = request.with_profile(profile.id);
        }
        Ok(request)
    }
}

/// Parses test labels into kinds.
fn parse_tests(labels: &[String]) -> Result<Vec<TestKind>, ValidationError> {
    labels.iter().map(|label| label.parse::<TestKind>()).collect()
}

/// Parses component identifiers into a set.
fn parse_components(raw: &[String]) -> Result<ComponentSet, ValidationError> {
    if raw.len() > MAX_REQUEST_COMPONENTS {
        return Err(ValidationError::TooManyComponents {
            max: MAX_REQUEST_COMPONENTS,
            actual: raw.len(),
        });
    }
    raw.iter().map(|value| ComponentId::parse(value)).collect()
}

// ============================================================================
// SECTION: Validated Request
// ============================================================================

/// Validated, immutable benchmark request.
///
/// # Invariants
/// - At least one test kind is selected.
/// - Every stored intensity is within `0..=100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BenchmarkRequest {
    /// Selected test kinds.
    tests: BTreeSet<TestKind>,
    /// Intensity per test kind.
    intensities: BTreeMap<TestKind, Intensity>,
    /// Components that should be active during the run.
    components: ComponentSet,
    /// Profile the request was resolved from.
    profile_id: Option<ProfileId>,
}

impl BenchmarkRequest {
    /// Creates a request selecting `tests` with `components` active.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NoTestsSelected`] when `tests` is empty and
    /// [`ValidationError::TooManyComponents`] when the component set is too large.
    pub fn new(
        tests: impl IntoIterator<Item = TestKind>,
        components: ComponentSet,
    ) -> Result<Self, ValidationError> {
        let tests: BTreeSet<TestKind> = tests.into_iter().collect();
        if tests.is_empty() {
            return Err(ValidationError::NoTestsSelected);
        }
        if components.len() > MAX_REQUEST_COMPONENTS {
            return Err(ValidationError::TooManyComponents {
                max: MAX_REQUEST_COMPONENTS,
                actual: components.len(),
            });
        }
        Ok(Self {
            tests,
            intensities: BTreeMap::new(),
            components,
            profile_id: None,
        })
    }

    /// Returns the request with an intensity set for `kind`.
    #[must_use]
    pub fn with_intensity(mut self, kind: TestKind, intensity: Intensity) -> Self {
        self.intensities.insert(kind, intensity);
        self
    }

    /// Returns the request tagged with the profile it came from.
    #[must_use]
    pub fn with_profile(mut self, profile_id: ProfileId) -> Self {
        self.profile_id = Some(profile_id);
        self
    }

    /// Returns the selected test kinds.
    #[must_use]
    pub const fn tests(&self) -> &BTreeSet<TestKind> {
        &self.tests
    }

    /// Returns true when `kind` is selected.
    #[must_use]
    pub fn is_selected(&self, kind: TestKind) -> bool {
        self.tests.contains(&kind)
    }

    /// Returns the explicit intensity for `kind`, if any.
    #[must_use]
    pub fn intensity_for(&self, kind: TestKind) -> Option<Intensity> {
        self.intensities.get(&kind).copied()
    }

    /// Returns the requested component set.
    #[must_use]
    pub const fn components(&self) -> &ComponentSet {
        &self.components
    }

    /// Returns the profile id the request was resolved from.
    #[must_use]
    pub const fn profile_id(&self) -> Option<&ProfileId> {
        self.profile_id.as_ref()
    }
}
