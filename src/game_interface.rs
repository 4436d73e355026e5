//! Module defining traits that need to be implemented to plug a game or an agent into the engine

/// What the game should implement
pub trait Game {
    /// Type representing game state. Sent to the current player as a single line of text.
    type State: ToString;
    /// What should be returned by players to make the game progress. Parsed from the agent's answer.
    type Action: std::str::FromStr;

    /// Apply an action of the current player to the game.
    ///
    /// # Error
    /// Returned when `action` is not allowed in the current position. The adapter treats it as
    /// a fault of the current player, who then loses the match.
    fn apply_action(&mut self, action: &Self::Action) -> anyhow::Result<()>;

    /// The current state that will be given to the current player
    ///
    /// Does not returns &State because of annoying lifetime to deal with.
    fn get_state(&self) -> Self::State;

    /// The number of the player that should play now
    fn get_current_player_number(&self) -> usize;

    /// True if game is finished
    fn is_finished(&self) -> bool;

    /// Used at the end of the game to collect players score
    fn get_player_score(&self, player_number: u32) -> f32;
}

/// What will be given to the registry to allow it to create games
pub trait GameFactory<G: Game> {
    /// Returns an initialized game
    fn new_game(&self) -> G;

    /// Number of agents taking part in every game
    fn num_players(&self) -> usize {
        2
    }
}

/// What an agent instance should implement.
///
/// The agent receives the state of the game as text (see [`Game::State`]) and answers with the
/// text of its action. Any error returned here is a fault of the agent and costs it the match.
pub trait Agent: Send {
    /// Select an action for the given state
    fn select_action(&mut self, state: &str) -> anyhow::Result<String>;
}

/// In-process agent backed by a closure.
pub struct FnAgent<F>(F);

impl<F> FnAgent<F>
where
    F: FnMut(&str) -> anyhow::Result<String> + Send,
{
    /// Wraps `select_action` into an agent
    pub fn new(select_action: F) -> Self {
        Self(select_action)
    }
}

impl<F> Agent for FnAgent<F>
where
    F: FnMut(&str) -> anyhow::Result<String> + Send,
{
    fn select_action(&mut self, state: &str) -> anyhow::Result<String> {
        (self.0)(state)
    }
}

#[cfg(test)]
mod interface_tests {
    use super::*;

    struct DummyGame {
        played: u32,
    }

    impl Game for DummyGame {
        type State = String;
        type Action = u32;

        fn apply_action(&mut self, action: &u32) -> anyhow::Result<()> {
            anyhow::ensure!(*action < 3, "action out of range");
            self.played += 1;
            Ok(())
        }

        fn is_finished(&self) -> bool {
            self.played >= 2
        }

        fn get_state(&self) -> String {
            self.played.to_string()
        }

        fn get_player_score(&self, _player_number: u32) -> f32 {
            0.0
        }

        fn get_current_player_number(&self) -> usize {
            (self.played % 2) as usize
        }
    }

    struct DummyFactory {}

    impl GameFactory<DummyGame> for DummyFactory {
        fn new_game(&self) -> DummyGame {
            DummyGame { played: 0 }
        }
    }

    fn make_game<G: Game, F: GameFactory<G>>(factory: &F) -> G {
        factory.new_game()
    }

    #[test]
    fn test_factory_defaults() {
        let factory = DummyFactory {};
        assert_eq!(factory.num_players(), 2);
        assert_eq!(make_game(&factory).get_state(), "0");
    }

    #[test]
    fn test_illegal_action_is_an_error() {
        let mut game = DummyFactory {}.new_game();
        assert!(game.apply_action(&7).is_err());
        assert!(game.apply_action(&1).is_ok());
        assert_eq!(game.get_current_player_number(), 1);
    }

    #[test]
    fn test_fn_agent() {
        let mut agent = FnAgent::new(|state: &str| Ok(format!("{state}!")));
        assert_eq!(agent.select_action("3").unwrap(), "3!");
    }
}
