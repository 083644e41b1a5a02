//! Message types for actor communication.

use matching_core::{MatchSet, ProposerId, ReviewerId};
use ractor::RpcReplyPort;

use crate::coordinator::MatchOutcome;

/// Reply to a proposal, returned over the caller's reply port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalReply {
    Accept,
    Reject,
}

/// Messages for the ProposerActor.
#[derive(Debug)]
pub enum ProposerMessage {
    /// Propose to the next untried reviewer. Sent once by the
    /// coordinator at launch, then re-posted by the proposer itself
    /// after a rejection or a displacement.
    Run,

    /// Delivered by a reviewer that traded up to a better proposal.
    RejectedBy { reviewer: ReviewerId },
}

/// Messages for the ReviewerActor.
#[derive(Debug)]
pub enum ReviewerMessage {
    /// A proposal, evaluated atomically against the reviewer's mailbox.
    /// Only the calling proposer awaits the reply.
    Propose {
        proposer: ProposerId,
        reply: RpcReplyPort<ProposalReply>,
    },
}

/// Messages for the CoordinatorActor.
#[derive(Debug)]
pub enum CoordinatorMessage {
    /// Trigger the initial round: issue Run to every proposer.
    Launch,

    /// A proposer's offer was accepted.
    Matched {
        proposer: ProposerId,
        reviewer: ReviewerId,
    },

    /// A previously matched proposer was displaced.
    Unmatched {
        proposer: ProposerId,
        reviewer: ReviewerId,
    },

    /// A proposer exhausted its preference list without acceptance.
    Impossible { proposer: ProposerId },

    /// Periodic probe from the ticker task; drives quiescence detection.
    IdleCheck,

    /// Live snapshot of the current match set.
    GetMatches { reply: RpcReplyPort<MatchSet> },

    /// Reply with the final outcome once quiescence is declared.
    AwaitResult { reply: RpcReplyPort<MatchOutcome> },

    /// Subscribe to the event stream.
    Subscribe {
        sender: tokio::sync::broadcast::Sender<matching_core::MatchEvent>,
    },

    /// Tear down the actor population and stop.
    Shutdown,
}
