//! Tournament strategies used by the evaluator to schedule matchups.
//!
//! This module defines the [`TournamentStrategy`] trait and the two built-in formats:
//! - [`SingleEliminationTournament`]: shuffled bracket, byes for odd rounds, coin flip on draws.
//! - [`RoundRobinTournament`]: every pair meets twice, roles swapped.
//!
//! # Implementing a Custom Strategy
//! The scheduler calls `add_participants` once, then alternates between `advance_round` and one
//! `on_result` per pairing of that round, in order, until `advance_round` returns `None`.
//! Standings may be read at any time, and so may `is_over`.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::agent::Participant;
use crate::match_record::{MatchRecord, ScoringConvention};
use crate::standings::{Standing, Standings};

mod round_robin;
mod single_elimination;

pub use round_robin::{schedule, RoundRobinTournament};
pub use single_elimination::{Seeding, SingleEliminationTournament};

/// Built-in tournament formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TournamentFormat {
    /// Knockout bracket
    SingleElimination,
    /// Doubled round-robin
    RoundRobin,
}

impl Display for TournamentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentFormat::SingleElimination => f.write_str("single-elimination"),
            TournamentFormat::RoundRobin => f.write_str("round-robin"),
        }
    }
}

/// Matches of one round.
#[derive(Debug, Clone)]
pub struct Round {
    /// Round number, starting at 1
    pub number: u32,
    /// Pairings to play, in order. Each pairing lists participants in seat order.
    pub pairings: Vec<Vec<Participant>>,
    /// Records of the automatic advances of this round, already applied to the standings
    pub byes: Vec<MatchRecord>,
}

/// A trait defining how participants are paired and scored in a tournament.
pub trait TournamentStrategy {
    /// Score kept for every participant.
    type Standing: Standing;

    /// Format identifier
    fn format(&self) -> TournamentFormat;

    /// Scoring convention of the score deltas of this format
    fn scoring(&self) -> ScoringConvention;

    /// Number of players per match
    fn players_per_match(&self) -> usize {
        2
    }

    /// Seeds the tournament. Must be called before advancing rounds.
    fn add_participants(&mut self, participants: Vec<Participant>);

    /// Returns the next round, `None` once the tournament is over.
    fn advance_round(&mut self) -> Option<Round>;

    /// True once every pairing handed out was resolved and no round is left to play.
    ///
    /// A run stopped at that point is reported as completed.
    fn is_over(&self) -> bool;

    /// Processes the record of one pairing of the current round. The strategy may annotate it
    /// (round number, advancing participant, tiebreak) before it gets persisted.
    fn on_result(&mut self, record: &mut MatchRecord);

    /// Current standings
    fn standings(&self) -> &Standings<Self::Standing>;

    /// Sole remaining participant, for elimination formats
    fn champion(&self) -> Option<&Participant> {
        None
    }
}
