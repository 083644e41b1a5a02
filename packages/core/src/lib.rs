//! Core domain types for the stable matching system.
//!
//! This crate contains shared types used across all packages:
//! - ProposerId and ReviewerId for the two sides of the matching
//! - PreferenceList and PreferenceTable for strict preference orders
//! - MatchSet for the live engagement bookkeeping
//! - Events for real-time updates

mod error;
mod events;
mod ids;
mod matching;
mod prefs;

pub use error::MatchingError;
pub use events::MatchEvent;
pub use ids::{ProposerId, ReviewerId};
pub use matching::MatchSet;
pub use prefs::{PreferenceList, PreferenceTable, validate_tables};
