//! Reviewer actor: evaluates proposals against its current match.

use std::sync::Arc;

use matching_core::{PreferenceList, ProposerId, ReviewerId};
use ractor::{Actor, ActorProcessingErr, ActorRef};

use crate::directory::Directory;
use crate::messages::{ProposalReply, ProposerMessage, ReviewerMessage};

/// State for the reviewer actor.
pub struct ReviewerState {
    /// This reviewer's id.
    pub id: ReviewerId,
    /// Ranking over the proposer group. Never consumed, only scanned.
    pub preferences: PreferenceList<ProposerId>,
    /// Current match, if any.
    pub matched: Option<ProposerId>,
    /// Peer lookup table, used to notify a displaced proposer.
    pub directory: Arc<Directory>,
}

/// Reviewer actor arguments.
pub struct ReviewerArgs {
    pub id: ReviewerId,
    pub preferences: PreferenceList<ProposerId>,
    pub directory: Arc<Directory>,
}

/// Reviewer actor that accepts, rejects, or trades up.
///
/// The mailbox serializes concurrent proposals, so each evaluation is
/// atomic with respect to this reviewer's state. A reviewer stays
/// reactive for the whole run; there is no terminal state.
pub struct ReviewerActor;

impl Actor for ReviewerActor {
    type Msg = ReviewerMessage;
    type State = ReviewerState;
    type Arguments = ReviewerArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        tracing::debug!("Starting reviewer: {}", args.id);

        Ok(ReviewerState {
            id: args.id,
            preferences: args.preferences,
            matched: None,
            directory: args.directory,
        })
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            ReviewerMessage::Propose { proposer, reply } => {
                match &state.matched {
                    None => {
                        tracing::debug!("Reviewer {} accepts {}", state.id, proposer);
                        state.matched = Some(proposer);
                        let _ = reply.send(ProposalReply::Accept);
                    }
                    Some(current) => {
                        if state.preferences.prefers(&proposer, current) {
                            // Trade up: notify the displaced proposer
                            // asynchronously, then accept the newcomer.
                            let displaced = current.clone();
                            tracing::debug!(
                                "Reviewer {} trades up from {} to {}",
                                state.id,
                                displaced,
                                proposer
                            );
                            match state.directory.proposer(&displaced) {
                                Ok(actor) => {
                                    if actor
                                        .send_message(ProposerMessage::RejectedBy {
                                            reviewer: state.id.clone(),
                                        })
                                        .is_err()
                                    {
                                        tracing::warn!(
                                            "Reviewer {} could not notify displaced {}",
                                            state.id,
                                            displaced
                                        );
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Reviewer {}: {}", state.id, e);
                                }
                            }
                            state.matched = Some(proposer);
                            let _ = reply.send(ProposalReply::Accept);
                        } else {
                            let _ = reply.send(ProposalReply::Reject);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
