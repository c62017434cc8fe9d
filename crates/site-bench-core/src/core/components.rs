// crates/site-bench-core/src/core/components.rs
// ============================================================================
// Module: Site Bench Component Sets
// Description: Component sets, activation diffs, and pending restore records.
// Purpose: Model environment mutation as explicit, serializable values.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`ComponentSet`] is an ordered set of component identifiers; equality is
//! set equality. [`EnvironmentDiff::compute`] derives the temporary activation
//! change for a run and always excludes the harness's own identifier.
//! [`PendingRestoreRecord`] is the durable form of that diff.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::collections::btree_set;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ComponentId;

// ============================================================================
// SECTION: Component Set
// ============================================================================

/// Ordered set of component identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentSet(BTreeSet<ComponentId>);

impl ComponentSet {
    /// Creates an empty component set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Inserts a component; returns `false` when it was already present.
    pub fn insert(&mut self, id: ComponentId) -> bool {
        self.0.insert(id)
    }

    /// Removes a component; returns `true` when it was present.
    pub fn remove(&mut self, id: &ComponentId) -> bool {
        self.0.remove(id)
    }

    /// Returns true when the set contains `id`.
    #[must_use]
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.0.contains(id)
    }

    /// Returns the number of components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates components in identifier order.
    pub fn iter(&self) -> btree_set::Iter<'_, ComponentId> {
        self.0.iter()
    }

    /// Returns components in `self` that are not in `other`.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    /// Returns a copy of the set without `id`.
    #[must_use]
    pub fn without(&self, id: &ComponentId) -> Self {
        let mut copy = self.clone();
        copy.remove(id);
        copy
    }

    /// Joins identifiers with `", "` for log lines.
    #[must_use]
    pub fn joined(&self) -> String {
        self.0.iter().map(ComponentId::as_str).collect::<Vec<_>>().join(", ")
    }
}

impl FromIterator<ComponentId> for ComponentSet {
    fn from_iter<I: IntoIterator<Item = ComponentId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ComponentSet {
    type Item = &'a ComponentId;
    type IntoIter = btree_set::Iter<'a, ComponentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for ComponentSet {
    type Item = ComponentId;
    type IntoIter = btree_set::IntoIter<ComponentId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ============================================================================
// SECTION: Environment Diff
// ============================================================================

/// Temporary activation change applied for the duration of a run.
///
/// # Invariants
/// - Neither set contains the harness's own component identifier.
/// - The two sets are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDiff {
    /// Components to activate for the run.
    pub to_activate: ComponentSet,
    /// Components to deactivate for the run.
    pub to_deactivate: ComponentSet,
}

impl EnvironmentDiff {
    /// Computes `requested - current` and `current - requested`, excluding `self_id`.
    #[must_use]
    pub fn compute(current: &ComponentSet, requested: &ComponentSet, self_id: &ComponentId) -> Self {
        Self {
            to_activate: requested.difference(current).without(self_id),
            to_deactivate: current.difference(requested).without(self_id),
        }
    }

    /// Returns true when the diff changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.to_activate.is_empty() && self.to_deactivate.is_empty()
    }
}

// ============================================================================
// SECTION: Pending Restore Record
// ============================================================================

/// Durable record of the mutation applied for a run.
///
/// Written before any mutation and cleared only after restoration succeeds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingRestoreRecord {
    /// Components activated for the run; deactivated on restore.
    pub activated_for_test: ComponentSet,
    /// Components deactivated for the run; reactivated on restore.
    pub deactivated_for_test: ComponentSet,
}

impl PendingRestoreRecord {
    /// Returns true when restoring this record changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.activated_for_test.is_empty() && self.deactivated_for_test.is_empty()
    }
}

impl From<&EnvironmentDiff> for PendingRestoreRecord {
    fn from(diff: &EnvironmentDiff) -> Self {
        Self {
            activated_for_test: diff.to_activate.clone(),
            deactivated_for_test: diff.to_deactivate.clone(),
        }
    }
}
