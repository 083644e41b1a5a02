//! Actor system for stable matching by deferred acceptance.
//!
//! This crate decomposes the classically sequential Gale-Shapley
//! algorithm into a population of independent, message-passing actors.
//!
//! # Architecture
//!
//! - `CoordinatorActor` - spawns the population, consumes match events,
//!   declares convergence via quiescence detection
//! - `ProposerActor` - one per proposer; drives its own proposal
//!   sequence down its preference list
//! - `ReviewerActor` - one per reviewer; accepts, rejects, or trades up
//!
//! The only coordination primitive is message exchange: per-actor FIFO
//! mailboxes serialize each actor's state transitions, and global
//! convergence is inferred from the absence of further activity rather
//! than from an explicit termination check.
//!
//! # Usage
//!
//! ```ignore
//! use actors::{CoordinatorConfig, run_matching};
//!
//! let outcome = run_matching(proposer_prefs, reviewer_prefs, CoordinatorConfig::default()).await?;
//! for (proposer, reviewer) in outcome.matches.iter() {
//!     println!("{proposer} -> {reviewer}");
//! }
//! ```

mod coordinator;
mod directory;
mod messages;
mod proposer;
mod reviewer;

pub use coordinator::{
    CoordinatorActor, CoordinatorArgs, CoordinatorConfig, CoordinatorState, MatchOutcome,
    run_matching, start_coordinator,
};
pub use directory::Directory;
pub use messages::{CoordinatorMessage, ProposalReply, ProposerMessage, ReviewerMessage};
pub use proposer::{ProposerActor, ProposerArgs, ProposerState};
pub use reviewer::{ReviewerActor, ReviewerArgs, ReviewerState};

/// Re-export ractor types for convenience.
pub use ractor::{Actor, ActorRef, RpcReplyPort, concurrency};
