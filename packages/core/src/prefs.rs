//! Strict preference orders and their validation.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::MatchingError;
use crate::ids::{ProposerId, ReviewerId};

/// An ordered sequence of opposite-group identifiers, strictly ranked.
///
/// Position is preference: earlier means more preferred. Each identifier
/// appears exactly once. Immutable once assigned to an actor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferenceList<Id> {
    ranked: Vec<Id>,
}

impl<Id: Eq + Hash + Clone> PreferenceList<Id> {
    pub fn new(ranked: Vec<Id>) -> Self {
        Self { ranked }
    }

    pub fn len(&self) -> usize {
        self.ranked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranked.is_empty()
    }

    /// Consume the list into its ranked order.
    pub fn into_ranked(self) -> Vec<Id> {
        self.ranked
    }

    /// Whether `a` is strictly preferred over `b`.
    ///
    /// Linear scan from most- to least-preferred, stopping at the first
    /// of the two encountered. Resolves in at most len - 1 steps and
    /// usually far fewer, with no index precomputation. Requires the
    /// list to be duplicate-free; an id absent from the list loses.
    pub fn prefers(&self, a: &Id, b: &Id) -> bool {
        for id in &self.ranked {
            if id == a {
                return true;
            }
            if id == b {
                return false;
            }
        }
        false
    }

    /// Whether this list is a duplicate-free, complete ranking of `universe`.
    pub fn is_permutation_of(&self, universe: &HashSet<Id>) -> bool {
        if self.ranked.len() != universe.len() {
            return false;
        }
        let mut seen = HashSet::with_capacity(self.ranked.len());
        self.ranked
            .iter()
            .all(|id| universe.contains(id) && seen.insert(id))
    }
}

impl<Id> From<Vec<Id>> for PreferenceList<Id> {
    fn from(ranked: Vec<Id>) -> Self {
        Self { ranked }
    }
}

/// A table of preference lists, one per member of a group.
pub type PreferenceTable<Id, OtherId> = HashMap<Id, PreferenceList<OtherId>>;

/// Validate a pair of preference tables for bootstrap.
///
/// The two tables must name universes of the same size and be mutually
/// complete: every proposer list is a permutation of the full reviewer
/// universe and vice versa.
pub fn validate_tables(
    proposers: &PreferenceTable<ProposerId, ReviewerId>,
    reviewers: &PreferenceTable<ReviewerId, ProposerId>,
) -> Result<(), MatchingError> {
    if proposers.is_empty() {
        return Err(MatchingError::InvalidPreferenceList(
            "proposer table is empty".into(),
        ));
    }
    if proposers.len() != reviewers.len() {
        return Err(MatchingError::InvalidPreferenceList(format!(
            "group sizes differ: {} proposers vs {} reviewers",
            proposers.len(),
            reviewers.len()
        )));
    }

    let proposer_universe: HashSet<ProposerId> = proposers.keys().cloned().collect();
    let reviewer_universe: HashSet<ReviewerId> = reviewers.keys().cloned().collect();

    for (id, prefs) in proposers {
        if !prefs.is_permutation_of(&reviewer_universe) {
            return Err(MatchingError::InvalidPreferenceList(format!(
                "proposer '{}' does not rank the full reviewer universe exactly once",
                id
            )));
        }
    }
    for (id, prefs) in reviewers {
        if !prefs.is_permutation_of(&proposer_universe) {
            return Err(MatchingError::InvalidPreferenceList(format!(
                "reviewer '{}' does not rank the full proposer universe exactly once",
                id
            )));
        }
    }

    Ok(())
}
