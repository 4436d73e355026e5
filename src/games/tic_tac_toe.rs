//! Tic-Tac-Toe.
//!
//! State line: `<symbol> <board>` where `board` is the 9 cells row by row (`X`, `O` or `.`).
//! The answer is a cell index in `0..9`.

use std::fmt::Display;

use anyhow::{bail, ensure};

use crate::game_interface::{Game, GameFactory};

const SYMBOLS: [char; 2] = ['X', 'O'];
const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// What the current player sees
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicTacToeState {
    /// Symbol of the player to move
    pub symbol: char,
    /// Cells, row by row
    pub board: [Option<char>; 9],
}

impl Display for TicTacToeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let board = self.board.iter().map(|c| c.unwrap_or('.')).collect::<String>();
        write!(f, "{} {board}", self.symbol)
    }
}

/// A Tic-Tac-Toe game, first player is always `X`.
#[derive(Debug, Clone, Default)]
pub struct TicTacToe {
    cells: [Option<usize>; 9],
    current: usize,
    winner: Option<usize>,
}

impl TicTacToe {
    fn wins(&self, player: usize) -> bool {
        LINES
            .iter()
            .any(|line| line.iter().all(|i| self.cells[*i] == Some(player)))
    }
}

impl Game for TicTacToe {
    type State = TicTacToeState;
    type Action = usize;

    fn apply_action(&mut self, action: &usize) -> anyhow::Result<()> {
        ensure!(!self.is_finished(), "game is over");
        let cell = *action;
        match self.cells.get(cell) {
            None => bail!("cell {cell} out of board"),
            Some(Some(_)) => bail!("cell {cell} already taken"),
            Some(None) => {}
        }
        self.cells[cell] = Some(self.current);
        if self.wins(self.current) {
            self.winner = Some(self.current);
        }
        self.current = 1 - self.current;
        Ok(())
    }

    fn get_state(&self) -> TicTacToeState {
        TicTacToeState {
            symbol: SYMBOLS[self.current],
            board: self.cells.map(|c| c.map(|p| SYMBOLS[p])),
        }
    }

    fn get_current_player_number(&self) -> usize {
        self.current
    }

    fn is_finished(&self) -> bool {
        self.winner.is_some() || self.cells.iter().all(Option::is_some)
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
pub struct TicTacToeFactory;

impl GameFactory<TicTacToe> for TicTacToeFactory {
    fn new_game(&self) -> TicTacToe {
        TicTacToe::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(moves: &[usize]) -> TicTacToe {
        let mut game = TicTacToeFactory.new_game();
        for m in moves {
            game.apply_action(m).unwrap();
        }
        game
    }

    #[test]
    fn row_win_for_second_player() {
        let game = play(&[0, 3, 1, 4, 8, 5]);
        assert!(game.is_finished());
        assert_eq!(game.get_player_score(1), 1.0);
        assert_eq!(game.get_player_score(0), 0.0);
    }

    #[test]
    fn cat_game() {
        // X O X / X O O / O X X
        let game = play(&[0, 1, 2, 4, 3, 5, 7, 6, 8]);
        assert!(game.is_finished());
        assert_eq!(game.get_player_score(0), 0.5);
    }

    #[test]
    fn taken_cell_is_illegal() {
        let mut game = play(&[4]);
        assert!(game.apply_action(&4).is_err());
        assert!(game.apply_action(&9).is_err());
        assert_eq!(game.get_state().to_string(), "O ....X....");
    }
}
