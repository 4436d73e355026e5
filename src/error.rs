//! Error types of the engine.
//!
//! Two families are kept apart:
//! - [`TournamentError`]: fatal to starting (or persisting) a tournament run.
//! - [`MatchError`]: fatal to a single match only. The scheduler turns it into a forfeit and
//!   carries on with the tournament.
//!
//! Agent faults raised during play are neither: they are contained by the game adapter and
//! end up as an [`AgentFault`](crate::match_record::AgentFault) inside the match record.

use thiserror::Error;

/// Conditions aborting a tournament before (or while) it runs.
#[derive(Debug, Error)]
pub enum TournamentError {
    /// No game adapter registered under this identifier.
    #[error("unknown game '{0}'")]
    UnknownGame(String),

    /// The party has no submission for this game.
    #[error("no agent submitted by '{party}' for game '{game}'")]
    AgentNotFound {
        /// Party identifier
        party: String,
        /// Game identifier
        game: String,
    },

    /// Fewer than two parties could compete.
    #[error("game '{game}' needs at least {required} participants, found {found}")]
    InsufficientParticipants {
        /// Game identifier
        game: String,
        /// Minimum number of participants
        required: usize,
        /// Eligible participants found
        found: usize,
    },

    /// Another run for the same game holds the advisory lock.
    #[error("a tournament for game '{0}' is already running")]
    AlreadyRunning(String),

    /// The result store rejected a write or a read.
    #[error("persistence failure for run '{run_id}'")]
    Persistence {
        /// Run whose results could not be stored
        run_id: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Failures confined to one match.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Wrong number of agent instances for the game adapter.
    #[error("game '{game}' requires {expected} players, got {got}")]
    Arity {
        /// Game identifier
        game: String,
        /// Players required by the adapter
        expected: usize,
        /// Instances provided
        got: usize,
    },

    /// The agent of a participant could not be instantiated.
    #[error("could not instantiate agent of '{participant}': {reason}")]
    Instantiation {
        /// Party identifier of the offending participant
        participant: String,
        /// Human readable cause
        reason: String,
    },
}
