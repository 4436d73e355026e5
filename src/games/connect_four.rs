//! Connect-4 on a 7x6 board.
//!
//! State line sent to the current player: `<symbol> <last_move> <columns>` where `symbol` is
//! `X` (first player) or `O`, `last_move` is the column the opponent just played (`-1` on the
//! first move) and `columns` lists the 7 columns bottom-up separated by `/` (`-` when empty).
//! The answer is a column number in `0..7`.

use std::fmt::Display;

use anyhow::{bail, ensure};

use crate::game_interface::{Game, GameFactory};

/// Number of columns
pub const COLUMNS: usize = 7;
/// Number of rows
pub const ROWS: usize = 6;

const SYMBOLS: [char; 2] = ['X', 'O'];
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// What the current player sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectFourState {
    /// Symbol of the player to move
    pub symbol: char,
    /// Column played by the opponent on the previous move
    pub last_move: Option<usize>,
    /// Columns, bottom-up
    pub columns: Vec<String>,
}

impl Display for ConnectFourState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last = self.last_move.map_or(-1, |c| c as isize);
        let columns = self
            .columns
            .iter()
            .map(|c| if c.is_empty() { "-" } else { c.as_str() })
            .collect::<Vec<_>>()
            .join("/");
        write!(f, "{} {last} {columns}", self.symbol)
    }
}

/// A Connect-4 game, first player is always `X`.
#[derive(Debug, Clone, Default)]
pub struct ConnectFour {
    columns: [Vec<usize>; COLUMNS],
    current: usize,
    last_move: Option<usize>,
    winner: Option<usize>,
}

impl ConnectFour {
    fn cell(&self, column: isize, row: isize) -> Option<usize> {
        if column < 0 || row < 0 {
            return None;
        }
        self.columns
            .get(column as usize)
            .and_then(|c| c.get(row as usize))
            .copied()
    }

    fn connects_four(&self, column: usize, row: usize) -> bool {
        let player = self.columns[column][row];
        let (column, row) = (column as isize, row as isize);
        DIRECTIONS.iter().any(|(dx, dy)| {
            let count_towards = |sign: isize| {
                (1..4)
                    .take_while(|k| {
                        self.cell(column + sign * k * dx, row + sign * k * dy) == Some(player)
                    })
                    .count()
            };
            1 + count_towards(1) + count_towards(-1) >= 4
        })
    }

    fn is_full(&self) -> bool {
        self.columns.iter().all(|c| c.len() == ROWS)
    }
}

impl Game for ConnectFour {
    type State = ConnectFourState;
    type Action = usize;

    fn apply_action(&mut self, action: &usize) -> anyhow::Result<()> {
        ensure!(self.winner.is_none(), "game is over");
        let column = *action;
        if column >= COLUMNS {
            bail!("column {column} out of board");
        }
        if self.columns[column].len() >= ROWS {
            bail!("column {column} is full");
        }
        self.columns[column].push(self.current);
        let row = self.columns[column].len() - 1;
        if self.connects_four(column, row) {
            self.winner = Some(self.current);
        }
        self.last_move = Some(column);
        self.current = 1 - self.current;
        Ok(())
    }

    fn get_state(&self) -> ConnectFourState {
        ConnectFourState {
            symbol: SYMBOLS[self.current],
            last_move: self.last_move,
            columns: self
                .columns
                .iter()
                .map(|c| c.iter().map(|p| SYMBOLS[*p]).collect())
                .collect(),
        }
    }

    fn get_current_player_number(&self) -> usize {
        self.current
    }

    fn is_finished(&self) -> bool {
        self.winner.is_some() || self.is_full()
    }

    fn get_player_score(&self, player_number: u32) -> f32 {
        match self.winner {
            Some(w) if w == player_number as usize => 1.0,
            Some(_) => 0.0,
            None => 0.5,
        }
    }
}

/// Builds empty boards
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectFourFactory;

impl GameFactory<ConnectFour> for ConnectFourFactory {
    fn new_game(&self) -> ConnectFour {
        ConnectFour::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(moves: &[usize]) -> ConnectFour {
        let mut game = ConnectFourFactory.new_game();
        for m in moves {
            game.apply_action(m).unwrap();
        }
        game
    }

    #[test]
    fn vertical_win() {
        let game = play(&[0, 1, 0, 1, 0, 1, 0]);
        assert!(game.is_finished());
        assert_eq!(game.get_player_score(0), 1.0);
        assert_eq!(game.get_player_score(1), 0.0);
    }

    #[test]
    fn diagonal_win() {
        // X: 0, 1, 2, 3 climbing; O fills underneath
        let game = play(&[0, 1, 1, 2, 2, 3, 2, 3, 3, 6, 3]);
        assert!(game.is_finished());
        assert_eq!(game.get_player_score(0), 1.0);
    }

    #[test]
    fn state_line() {
        let game = play(&[3, 3]);
        assert_eq!(game.get_state().to_string(), "X 3 -/-/-/XO/-/-/-");
        assert_eq!(ConnectFour::default().get_state().to_string(), "X -1 -/-/-/-/-/-/-");
    }

    #[test]
    fn illegal_moves() {
        let mut game = play(&[0, 0, 0, 0, 0, 0]);
        assert!(game.apply_action(&0).is_err());
        assert!(game.apply_action(&7).is_err());
        assert!(game.apply_action(&1).is_ok());
    }

    #[test]
    fn full_board_is_a_draw() {
        let mut game = ConnectFour::default();
        for (c, column) in game.columns.iter_mut().enumerate() {
            *column = (0..ROWS).map(|r| (r / 2 + c) % 2).collect();
        }
        for c in 0..COLUMNS {
            for r in 0..ROWS {
                assert!(!game.connects_four(c, r));
            }
        }
        assert!(game.is_finished());
        assert_eq!(game.get_player_score(0), 0.5);
        assert_eq!(game.get_player_score(1), 0.5);
    }
}
