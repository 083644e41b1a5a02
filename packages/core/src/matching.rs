//! The coordinator-owned view of all accepted engagements.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::ids::{ProposerId, ReviewerId};
use crate::prefs::PreferenceTable;

/// Mapping from proposer to reviewer, reflecting the live state of all
/// accepted engagements. Entries are added on Matched events and removed
/// on Unmatched events; at quiescence this is the final result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchSet {
    matches: HashMap<ProposerId, ReviewerId>,
}

impl MatchSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an engagement, replacing any previous entry for `proposer`.
    pub fn insert(&mut self, proposer: ProposerId, reviewer: ReviewerId) {
        self.matches.insert(proposer, reviewer);
    }

    /// Drop the engagement for `proposer`, if present.
    pub fn remove(&mut self, proposer: &ProposerId) -> Option<ReviewerId> {
        self.matches.remove(proposer)
    }

    pub fn get(&self, proposer: &ProposerId) -> Option<&ReviewerId> {
        self.matches.get(proposer)
    }

    /// The proposer currently engaged to `reviewer`, if any.
    pub fn proposer_for(&self, reviewer: &ReviewerId) -> Option<&ProposerId> {
        self.matches
            .iter()
            .find(|(_, r)| *r == reviewer)
            .map(|(p, _)| p)
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProposerId, &ReviewerId)> {
        self.matches.iter()
    }

    /// Whether this is a bijection covering `n` pairs.
    pub fn is_perfect(&self, n: usize) -> bool {
        if self.matches.len() != n {
            return false;
        }
        let reviewers: HashSet<&ReviewerId> = self.matches.values().collect();
        reviewers.len() == n
    }

    /// All blocking pairs under the given preference tables.
    ///
    /// A blocking pair is a proposer p and reviewer r, not matched to each
    /// other, who each prefer the other over their current match. An
    /// unmatched side always prefers any partner over none. Empty result
    /// means the matching is stable.
    pub fn blocking_pairs(
        &self,
        proposer_prefs: &PreferenceTable<ProposerId, ReviewerId>,
        reviewer_prefs: &PreferenceTable<ReviewerId, ProposerId>,
    ) -> Vec<(ProposerId, ReviewerId)> {
        let by_reviewer: HashMap<&ReviewerId, &ProposerId> =
            self.matches.iter().map(|(p, r)| (r, p)).collect();

        let mut blocking = Vec::new();
        for (p, p_list) in proposer_prefs {
            for (r, r_list) in reviewer_prefs {
                if self.matches.get(p) == Some(r) {
                    continue;
                }
                let p_wants = match self.matches.get(p) {
                    Some(current) => p_list.prefers(r, current),
                    None => true,
                };
                let r_wants = match by_reviewer.get(r) {
                    Some(current) => r_list.prefers(p, *current),
                    None => true,
                };
                if p_wants && r_wants {
                    blocking.push((p.clone(), r.clone()));
                }
            }
        }
        blocking
    }
}
