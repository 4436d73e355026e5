//! Built-in games and the registry mapping game identifiers to [`GameAdapter`]s.
//!
//! The registry is built once, at start-up, and shared read-only by every tournament run.

use std::collections::HashMap;
use std::sync::Arc;

use crate::adapter::{GameAdapter, RulesAdapter};
use crate::error::TournamentError;

pub mod connect_four;
pub mod rock_paper_scissors;
pub mod tic_tac_toe;

/// Identifier of Connect-4
pub const CONNECT_FOUR: &str = "conn4";
/// Identifier of Tic-Tac-Toe
pub const TIC_TAC_TOE: &str = "tictactoe";
/// Identifier of Rock-Paper-Scissors
pub const ROCK_PAPER_SCISSORS: &str = "rps";

/// Immutable mapping from game identifier to adapter.
#[derive(Clone, Default)]
pub struct GameRegistry {
    adapters: HashMap<String, Arc<dyn GameAdapter>>,
}

impl GameRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding `conn4`, `tictactoe` and `rps`, every match capped at `max_turns` moves.
    pub fn builtin(max_turns: u32) -> Self {
        Self::new()
            .with_adapter(
                RulesAdapter::new(CONNECT_FOUR, connect_four::ConnectFourFactory)
                    .with_max_turns(max_turns),
            )
            .with_adapter(
                RulesAdapter::new(TIC_TAC_TOE, tic_tac_toe::TicTacToeFactory)
                    .with_max_turns(max_turns),
            )
            .with_adapter(
                RulesAdapter::new(
                    ROCK_PAPER_SCISSORS,
                    rock_paper_scissors::RockPaperScissorsFactory::default(),
                )
                .with_max_turns(max_turns),
            )
    }

    /// Adds (or replaces) the adapter registered under `adapter.name()`
    pub fn with_adapter(mut self, adapter: impl GameAdapter + 'static) -> Self {
        self.adapters
            .insert(adapter.name().to_owned(), Arc::new(adapter));
        self
    }

    /// Looks up a game.
    ///
    /// # Errors
    /// [`TournamentError::UnknownGame`] if nothing is registered under `game`.
    pub fn get(&self, game: &str) -> Result<Arc<dyn GameAdapter>, TournamentError> {
        self.adapters
            .get(game)
            .cloned()
            .ok_or_else(|| TournamentError::UnknownGame(game.to_owned()))
    }

    /// Registered identifiers, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names = self.adapters.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_games() {
        let registry = GameRegistry::builtin(100);
        assert_eq!(registry.names(), vec!["conn4", "rps", "tictactoe"]);
        for name in registry.names() {
            assert_eq!(registry.get(name).unwrap().required_players(), 2);
        }
    }

    #[test]
    fn unknown_game() {
        let registry = GameRegistry::builtin(100);
        assert!(matches!(
            registry.get("chess"),
            Err(TournamentError::UnknownGame(name)) if name == "chess"
        ));
    }
}
