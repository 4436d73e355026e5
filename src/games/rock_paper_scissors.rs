//! Rock-Paper-Scissors, first to two round wins.
//!
//! Both players choose simultaneously: the first player's choice is kept hidden until the
//! second one has answered. State line: `<round> <my_wins> <their_wins> <opponent_last_hand>`
//! (`-` before the first resolved round). Answers: `rock`, `paper`, `scissors` (or `r`, `p`, `s`).
//!
//! Tied rounds replay. After `max_rounds` rounds the game stops and may end level.

use std::fmt::Display;
use std::str::FromStr;

use anyhow::ensure;

use crate::game_interface::{Game, GameFactory};

/// Round wins needed to take the game
pub const WINS_NEEDED: u32 = 2;

/// One hand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hand {
    /// beats scissors
    Rock,
    /// beats rock
    Paper,
    /// beats paper
    Scissors,
}

impl Hand {
    fn beats(self, other: Hand) -> bool {
        matches!(
            (self, other),
            (Hand::Rock, Hand::Scissors) | (Hand::Paper, Hand::Rock) | (Hand::Scissors, Hand::Paper)
        )
    }
}

impl FromStr for Hand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rock" | "r" => Ok(Hand::Rock),
            "paper" | "p" => Ok(Hand::Paper),
            "scissors" | "s" => Ok(Hand::Scissors),
            other => Err(format!("'{other}' is not a hand")),
        }
    }
}

impl Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Hand::Rock => "rock",
            Hand::Paper => "paper",
            Hand::Scissors => "scissors",
        };
        f.write_str(s)
    }
}

/// What the current player sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RockPaperScissorsState {
    /// Rounds resolved so far
    pub round: u32,
    /// Round wins of the player to move
    pub my_wins: u32,
    /// Round wins of the opponent
    pub their_wins: u32,
    /// Hand played by the opponent in the last resolved round
    pub opponent_last: Option<Hand>,
}

impl Display for RockPaperScissorsState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {} ", self.round, self.my_wins, self.their_wins)?;
        match self.opponent_last {
            Some(hand) => write!(f, "{hand}"),
            None => f.write_str("-"),
        }
    }
}

/// A best-of-three game
#[derive(Debug, Clone)]
pub struct RockPaperScissors {
    wins: [u32; 2],
    pending: Option<Hand>,
    last: Option<[Hand; 2]>,
    round: u32,
    max_rounds: u32,
}

impl RockPaperScissors {
    /// New game stopping after `max_rounds` resolved rounds at most
    pub fn new(max_rounds: u32) -> Self {
        Self {
            wins: [0, 0],
            pending: None,
            last: None,
            round: 0,
            max_rounds,
        }
    }
}

impl Game for RockPaperScissors {
    type State = RockPaperScissorsState;
    type Action = Hand;

    fn apply_action(&mut self, action: &Hand) -> anyhow::Result<()> {
        ensure!(!self.is_finished(), "game is over");
        let Some(first) = self.pending.take() else {
            self.pending = Some(*action);
            return Ok(());
        };
        let second = *action;
        if first.beats(second) {
            self.wins[0] += 1;
        } else if second.beats(first) {
            self.wins[1] += 1;
        }
        self.last = Some([first, second]);
        self.round += 1;
        Ok(())
    }

    fn get_state(&self) -> RockPaperScissorsState {
        let me = self.get_current_player_number();
        RockPaperScissorsState {
            round: self.round,
            my_wins: self.wins[me],
            their_wins: self.wins[1 - me],
            opponent_last: self.last.map(|hands| hands[1 - me]),
        }
    }

    fn get_current_player_number(&self) -> usize {
        if self.pending.is_some() {
            1
        } else {
            0
        }
    }

    fn is_finished(&self) -> bool {
        self.wins.iter().any(|w| *w >= WINS_NEEDED) || self.round >= self.max_rounds
    }

    fn get_player_score(&self, player_number: u32) -> f32 {
        self.wins[player_number as usize] as f32
    }
}

/// Builds fresh games
#[derive(Debug, Clone, Copy)]
pub struct RockPaperScissorsFactory {
    /// Round cap of every game
    pub max_rounds: u32,
}

impl Default for RockPaperScissorsFactory {
    fn default() -> Self {
        Self { max_rounds: 9 }
    }
}

impl GameFactory<RockPaperScissors> for RockPaperScissorsFactory {
    fn new_game(&self) -> RockPaperScissors {
        RockPaperScissors::new(self.max_rounds)
    }
}
