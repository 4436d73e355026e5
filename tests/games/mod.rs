use agent_tournament::prelude::*;
use anyhow::ensure;

/// Take 1 to 3 sticks, whoever takes the last one wins.
pub struct Nim {
    sticks: u32,
    current: usize,
    winner: Option<usize>,
}

impl Game for Nim {
    type State = u32;
    type Action = u32;

    fn apply_action(&mut self, action: &u32) -> anyhow::Result<()> {
        ensure!((1..=3).contains(action), "can only take 1 to 3 sticks");
        ensure!(*action <= self.sticks, "only {} sticks left", self.sticks);
        self.sticks -= action;
        if self.sticks == 0 {
            self.winner = Some(self.current);
        }
        self.current = 1 - self.current;
        Ok(())
    }

    fn get_state(&self) -> u32 {
        self.sticks
    }

    fn get_current_player_number(&self) -> usize {
        self.current
    }

    fn is_finished(&self) -> bool {
        self.sticks == 0
    }

    fn get_player_score(&self, player_number: u32) -> f32 {
        if self.winner == Some(player_number as usize) {
            1.0
        } else {
            0.0
        }
    }
}

pub struct NimFactory {
    pub sticks: u32,
}

impl GameFactory<Nim> for NimFactory {
    fn new_game(&self) -> Nim {
        Nim {
            sticks: self.sticks,
            current: 0,
            winner: None,
        }
    }
}

/// Leaves a multiple of 4 whenever possible
pub fn perfect(state: &str) -> anyhow::Result<String> {
    let sticks: u32 = state.parse()?;
    Ok(match sticks % 4 {
        0 => 1,
        n => n,
    }
    .to_string())
}

/// Always takes as many as allowed
pub fn greedy(state: &str) -> anyhow::Result<String> {
    let sticks: u32 = state.parse()?;
    Ok(sticks.min(3).to_string())
}
