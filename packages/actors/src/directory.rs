//! Explicit id-to-handle table for peer addressing.
//!
//! The coordinator builds this during bootstrap and hands an
//! `Arc<Directory>` to every actor that needs to message peers, rather
//! than relying on an ambient global namespace.

use std::collections::HashMap;
use std::sync::RwLock;

use matching_core::{MatchingError, ProposerId, ReviewerId};
use ractor::ActorRef;

use crate::messages::{ProposerMessage, ReviewerMessage};

/// Lookup table from member id to actor handle, one map per group.
#[derive(Default)]
pub struct Directory {
    proposers: RwLock<HashMap<ProposerId, ActorRef<ProposerMessage>>>,
    reviewers: RwLock<HashMap<ReviewerId, ActorRef<ReviewerMessage>>>,
}

impl Directory {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a proposer actor.
    pub fn register_proposer(&self, id: ProposerId, actor: ActorRef<ProposerMessage>) {
        self.proposers.write().unwrap().insert(id, actor);
    }

    /// Register a reviewer actor.
    pub fn register_reviewer(&self, id: ReviewerId, actor: ActorRef<ReviewerMessage>) {
        self.reviewers.write().unwrap().insert(id, actor);
    }

    /// Look up a proposer actor by id.
    pub fn proposer(&self, id: &ProposerId) -> Result<ActorRef<ProposerMessage>, MatchingError> {
        self.proposers
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| MatchingError::UnknownActor(format!("proposer '{id}'")))
    }

    /// Look up a reviewer actor by id.
    pub fn reviewer(&self, id: &ReviewerId) -> Result<ActorRef<ReviewerMessage>, MatchingError> {
        self.reviewers
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| MatchingError::UnknownActor(format!("reviewer '{id}'")))
    }

    /// Stop every registered actor. Used at teardown after quiescence.
    pub fn stop_all(&self) {
        for actor in self.proposers.read().unwrap().values() {
            actor.stop(None);
        }
        for actor in self.reviewers.read().unwrap().values() {
            actor.stop(None);
        }
    }
}
