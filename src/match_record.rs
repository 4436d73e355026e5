//! Normalized match results, as produced by the executor and persisted by the result store.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Normalized result of one match. Indices refer to the match's participant list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// One player won, one lost.
    Decisive {
        /// Index of the winner
        winner: usize,
        /// Index of the loser, never equal to `winner`
        loser: usize,
    },
    /// Nobody won.
    Draw,
}

impl MatchOutcome {
    /// Builds a decisive outcome.
    pub fn decisive(winner: usize, loser: usize) -> Self {
        debug_assert_ne!(winner, loser, "a player cannot beat itself");
        MatchOutcome::Decisive { winner, loser }
    }

    /// Index of the winner, if any
    pub fn winner(&self) -> Option<usize> {
        match self {
            MatchOutcome::Decisive { winner, .. } => Some(*winner),
            MatchOutcome::Draw => None,
        }
    }

    /// Index of the loser, if any
    pub fn loser(&self) -> Option<usize> {
        match self {
            MatchOutcome::Decisive { loser, .. } => Some(*loser),
            MatchOutcome::Draw => None,
        }
    }
}

/// How a match record was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// The match was played to completion.
    #[serde(rename = "regulation")]
    Regulation,
    /// No opponent this round, automatic advance.
    #[serde(rename = "bye")]
    Bye,
    /// The match was drawn and the advancing entrant was picked by a coin flip.
    #[serde(rename = "tiebreak(draw)")]
    Tiebreak,
    /// At least one agent could not be instantiated.
    #[serde(rename = "forfeit")]
    Forfeit,
}

impl Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Regulation => "regulation",
            Decision::Bye => "bye",
            Decision::Tiebreak => "tiebreak(draw)",
            Decision::Forfeit => "forfeit",
        };
        f.write_str(s)
    }
}

/// Kind of misbehavior of an agent during a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// `select_action` returned an error (includes timeouts of process agents)
    Error,
    /// `select_action` panicked
    Panic,
    /// The answer could not be parsed as an action
    InvalidAction,
    /// The action was parsed but refused by the game rules
    IllegalAction,
}

/// A fault contained by the game adapter. The faulty player lost the match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFault {
    /// Index of the faulty player in the match
    pub player: usize,
    /// What went wrong
    pub kind: FaultKind,
    /// Details for the record
    pub detail: String,
}

impl Display for AgentFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            FaultKind::Error => "error",
            FaultKind::Panic => "panic",
            FaultKind::InvalidAction => "invalid action",
            FaultKind::IllegalAction => "illegal action",
        };
        write!(f, "player {}: {kind} ({})", self.player, self.detail)
    }
}

/// One move as seen by a [`MatchObserver`](crate::adapter::MatchObserver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveEvent {
    /// Turn number, starting at 0
    pub turn: u32,
    /// Index of the player who moved
    pub player: usize,
    /// State given to the player
    pub state: String,
    /// Raw answer of the player
    pub action: String,
}

/// Score deltas applied per outcome, one convention per tournament format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringConvention {
    /// win +1, loss -1, draw 0
    Bracket,
    /// win 1, loss 0, draw 0.5
    RoundRobin,
}

impl ScoringConvention {
    /// Per-participant deltas for an outcome between `num_players` participants
    pub fn deltas(&self, outcome: &MatchOutcome, num_players: usize) -> Vec<f64> {
        let (win, lose, draw) = match self {
            ScoringConvention::Bracket => (1.0, -1.0, 0.0),
            ScoringConvention::RoundRobin => (1.0, 0.0, 0.5),
        };
        match outcome {
            MatchOutcome::Draw => vec![draw; num_players],
            MatchOutcome::Decisive { winner, loser } => (0..num_players)
                .map(|i| {
                    if i == *winner {
                        win
                    } else if i == *loser {
                        lose
                    } else {
                        0.0
                    }
                })
                .collect(),
        }
    }
}

/// One executed (or awarded) pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Position of the record in its run, unique per run
    pub sequence: u32,
    /// Round number, bracket only
    pub round: Option<u32>,
    /// Party identifiers, in seat order
    pub participants: Vec<String>,
    /// `None` for a bye
    pub outcome: Option<MatchOutcome>,
    /// How the record was decided
    pub decision: Decision,
    /// Party advancing to the next round, bracket only
    pub advanced: Option<String>,
    /// Score delta of each participant, in seat order
    pub score_deltas: Vec<f64>,
    /// Faults contained during play
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<AgentFault>,
    /// Moves, when trace recording is enabled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trace: Vec<MoveEvent>,
}

impl MatchRecord {
    /// Record of an automatic advance.
    pub fn bye(party: &str, round: u32) -> Self {
        Self {
            sequence: 0,
            round: Some(round),
            participants: vec![party.to_owned()],
            outcome: None,
            decision: Decision::Bye,
            advanced: Some(party.to_owned()),
            score_deltas: vec![1.0],
            faults: vec![],
            trace: vec![],
        }
    }

    /// Party identifier of the winner, byes included
    pub fn winner(&self) -> Option<&str> {
        match (&self.outcome, self.decision) {
            (None, Decision::Bye) => self.participants.first().map(String::as_str),
            (Some(outcome), _) => outcome
                .winner()
                .and_then(|i| self.participants.get(i))
                .map(String::as_str),
            _ => None,
        }
    }

    /// True if the match ended without a winner
    pub fn is_draw(&self) -> bool {
        matches!(self.outcome, Some(MatchOutcome::Draw))
    }
}

impl Display for MatchRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let players = self.participants.join(" VS ");
        match self.winner() {
            Some(winner) => write!(f, "[{players}] {} -> {winner}", self.decision),
            None => write!(f, "[{players}] {} -> draw", self.decision),
        }
    }
}
