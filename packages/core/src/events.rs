//! Event types for real-time updates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ProposerId, ReviewerId};

/// Events emitted by the matching system as engagements change.
///
/// The stream of these events, plus one final MatchSet snapshot at
/// quiescence, is the system's whole external output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    /// A proposer's offer was accepted.
    Matched {
        proposer: ProposerId,
        reviewer: ReviewerId,
        timestamp: DateTime<Utc>,
    },
    /// A previously matched proposer was displaced by a trade-up.
    Unmatched {
        proposer: ProposerId,
        reviewer: ReviewerId,
        timestamp: DateTime<Utc>,
    },
    /// A proposer exhausted its preference list without acceptance.
    Impossible {
        proposer: ProposerId,
        timestamp: DateTime<Utc>,
    },
}

impl MatchEvent {
    pub fn matched(proposer: ProposerId, reviewer: ReviewerId) -> Self {
        Self::Matched {
            proposer,
            reviewer,
            timestamp: Utc::now(),
        }
    }

    pub fn unmatched(proposer: ProposerId, reviewer: ReviewerId) -> Self {
        Self::Unmatched {
            proposer,
            reviewer,
            timestamp: Utc::now(),
        }
    }

    pub fn impossible(proposer: ProposerId) -> Self {
        Self::Impossible {
            proposer,
            timestamp: Utc::now(),
        }
    }

    /// Get the timestamp of the event.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            MatchEvent::Matched { timestamp, .. } => *timestamp,
            MatchEvent::Unmatched { timestamp, .. } => *timestamp,
            MatchEvent::Impossible { timestamp, .. } => *timestamp,
        }
    }

    /// Get a short description of this event for logging.
    pub fn description(&self) -> String {
        match self {
            MatchEvent::Matched {
                proposer, reviewer, ..
            } => format!("{} matched with {}", proposer, reviewer),
            MatchEvent::Unmatched {
                proposer, reviewer, ..
            } => format!("{} displaced from {}", proposer, reviewer),
            MatchEvent::Impossible { proposer, .. } => {
                format!("{} exhausted its preference list unmatched", proposer)
            }
        }
    }
}
