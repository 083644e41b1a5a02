//! Proposer actor: drives its own proposal sequence.

use std::collections::VecDeque;
use std::sync::Arc;

use matching_core::{PreferenceList, ProposerId, ReviewerId};
use ractor::{Actor, ActorProcessingErr, ActorRef};

use crate::directory::Directory;
use crate::messages::{CoordinatorMessage, ProposalReply, ProposerMessage, ReviewerMessage};

/// State for the proposer actor.
pub struct ProposerState {
    /// This proposer's id.
    pub id: ProposerId,
    /// Untried reviewers, best first. Consumed front-to-back, never reset.
    pub remaining: VecDeque<ReviewerId>,
    /// Current match, if any.
    pub matched: Option<ReviewerId>,
    /// Terminal flag: preference list consumed with no acceptance.
    pub exhausted: bool,
    /// Peer lookup table.
    pub directory: Arc<Directory>,
    /// Coordinator reference for match bookkeeping.
    pub coordinator: ActorRef<CoordinatorMessage>,
}

/// Proposer actor arguments.
pub struct ProposerArgs {
    pub id: ProposerId,
    pub preferences: PreferenceList<ReviewerId>,
    pub directory: Arc<Directory>,
    pub coordinator: ActorRef<CoordinatorMessage>,
}

/// Proposer actor that works down its preference list until accepted
/// or exhausted.
///
/// All messages are processed strictly one at a time in arrival order;
/// the `Propose` rpc below is awaited inside `handle`, so an incoming
/// `RejectedBy` cannot race the proposer's own proposal logic.
pub struct ProposerActor;

impl Actor for ProposerActor {
    type Msg = ProposerMessage;
    type State = ProposerState;
    type Arguments = ProposerArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::debug!("Starting proposer: {}", args.id);

        Ok(ProposerState {
            id: args.id,
            remaining: args.preferences.into_ranked().into(),
            matched: None,
            exhausted: false,
            directory: args.directory,
            coordinator: args.coordinator,
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            ProposerMessage::Run => {
                if state.matched.is_some() || state.exhausted {
                    // Stale trigger; matched and exhausted are both
                    // states Run has nothing to do in.
                    return Ok(());
                }

                let Some(reviewer_id) = state.remaining.pop_front() else {
                    state.exhausted = true;
                    tracing::info!("Proposer {} exhausted its list unmatched", state.id);
                    state.coordinator.send_message(CoordinatorMessage::Impossible {
                        proposer: state.id.clone(),
                    })?;
                    return Ok(());
                };

                let reviewer = match state.directory.reviewer(&reviewer_id) {
                    Ok(actor) => actor,
                    Err(e) => {
                        // Unreachable target counts as an implicit reject.
                        tracing::warn!("Proposer {} skipping {}: {}", state.id, reviewer_id, e);
                        myself.send_message(ProposerMessage::Run)?;
                        return Ok(());
                    }
                };

                let proposer_id = state.id.clone();
                let result = ractor::rpc::call(
                    &reviewer,
                    |reply| ReviewerMessage::Propose {
                        proposer: proposer_id,
                        reply,
                    },
                    None,
                )
                .await;

                match result {
                    Ok(ractor::rpc::CallResult::Success(ProposalReply::Accept)) => {
                        tracing::debug!("Proposer {} accepted by {}", state.id, reviewer_id);
                        state.matched = Some(reviewer_id.clone());
                        state.coordinator.send_message(CoordinatorMessage::Matched {
                            proposer: state.id.clone(),
                            reviewer: reviewer_id,
                        })?;
                    }
                    Ok(ractor::rpc::CallResult::Success(ProposalReply::Reject)) => {
                        // Try the next candidate; reviewer_id is never retried.
                        myself.send_message(ProposerMessage::Run)?;
                    }
                    Ok(_) | Err(_) => {
                        // Dropped reply or dead reviewer: implicit reject.
                        tracing::warn!(
                            "Proposer {}: {} unavailable, treating as reject",
                            state.id,
                            reviewer_id
                        );
                        myself.send_message(ProposerMessage::Run)?;
                    }
                }
            }

            ProposerMessage::RejectedBy { reviewer } => {
                if state.matched.as_ref() != Some(&reviewer) {
                    tracing::debug!(
                        "Proposer {} ignoring stale rejection from {}",
                        state.id,
                        reviewer
                    );
                    return Ok(());
                }

                tracing::debug!("Proposer {} displaced from {}", state.id, reviewer);
                state.matched = None;
                state.coordinator.send_message(CoordinatorMessage::Unmatched {
                    proposer: state.id.clone(),
                    reviewer,
                })?;
                // Resume the search down the remaining list.
                myself.send_message(ProposerMessage::Run)?;
            }
        }

        Ok(())
    }
}
