//! Uniform contract between the orchestrator and a game's rules engine.
//!
//! A [`GameAdapter`] creates [`Match`]es from agent instances. Running a match always returns a
//! [`MatchOutcome`]: an agent returning an error, panicking, answering garbage or playing an
//! illegal move loses the match on the spot. Faults are reported to the [`MatchObserver`] the
//! executor passes in, together with every move played.

use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;

use tracing::{debug, error, trace, warn};

use crate::error::MatchError;
use crate::game_interface::{Agent, Game, GameFactory};
use crate::match_record::{AgentFault, FaultKind, MatchOutcome, MoveEvent};

/// Default cap on the number of moves of a single match.
pub const DEFAULT_MAX_TURNS: u32 = 1000;

/// Receives the move-by-move trace of a match.
pub trait MatchObserver {
    /// Called after every accepted move
    fn on_move(&mut self, _event: &MoveEvent) {}

    /// Called when a fault ends the match
    fn on_fault(&mut self, _fault: &AgentFault) {}
}

/// Observer ignoring everything.
pub struct NoopObserver;

impl MatchObserver for NoopObserver {}

/// A single game between agent instances, ready to be played.
pub trait Match {
    /// Plays the match to completion.
    fn run(&mut self, observer: &mut dyn MatchObserver) -> MatchOutcome;
}

/// A game as seen by the orchestrator.
pub trait GameAdapter: Send + Sync {
    /// Game identifier (e.g. `"conn4"`)
    fn name(&self) -> &str;

    /// Number of agent instances per match
    fn required_players(&self) -> usize;

    /// Creates a fresh match between `instances`, in seat order.
    ///
    /// # Errors
    /// [`MatchError::Arity`] if `instances.len() != self.required_players()`.
    fn new_match(&self, instances: Vec<Box<dyn Agent>>) -> Result<Box<dyn Match>, MatchError>;
}

/// [`GameAdapter`] driving any [`Game`] built by a [`GameFactory`].
pub struct RulesAdapter<G, F> {
    name: String,
    factory: F,
    max_turns: u32,
    _game: PhantomData<fn() -> G>,
}

impl<G, F> RulesAdapter<G, F>
where
    G: Game,
    F: GameFactory<G>,
{
    /// Adapter registered under `name`
    pub fn new(name: impl Into<String>, factory: F) -> Self {
        Self {
            name: name.into(),
            factory,
            max_turns: DEFAULT_MAX_TURNS,
            _game: PhantomData,
        }
    }

    /// Moves after which a match is scored as it stands
    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }
}

impl<G, F> GameAdapter for RulesAdapter<G, F>
where
    G: Game + 'static,
    F: GameFactory<G> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn required_players(&self) -> usize {
        self.factory.num_players()
    }

    fn new_match(&self, instances: Vec<Box<dyn Agent>>) -> Result<Box<dyn Match>, MatchError> {
        let expected = self.required_players();
        if instances.len() != expected {
            return Err(MatchError::Arity {
                game: self.name.clone(),
                expected,
                got: instances.len(),
            });
        }
        Ok(Box::new(RulesMatch {
            game: self.factory.new_game(),
            agents: instances,
            max_turns: self.max_turns,
        }))
    }
}

struct RulesMatch<G> {
    game: G,
    agents: Vec<Box<dyn Agent>>,
    max_turns: u32,
}

impl<G: Game> RulesMatch<G> {
    fn ask(&mut self, player: usize, state: &str) -> Result<(G::Action, String), AgentFault> {
        let agent = &mut self.agents[player];
        let answer = match panic::catch_unwind(AssertUnwindSafe(|| agent.select_action(state))) {
            Ok(Ok(answer)) => answer,
            Ok(Err(e)) => {
                return Err(AgentFault {
                    player,
                    kind: FaultKind::Error,
                    detail: format!("{e:#}"),
                })
            }
            Err(payload) => {
                return Err(AgentFault {
                    player,
                    kind: FaultKind::Panic,
                    detail: panic_message(payload.as_ref()),
                })
            }
        };
        let answer = answer.trim().to_owned();
        match G::Action::from_str(&answer) {
            Ok(action) => Ok((action, answer)),
            Err(_) => Err(AgentFault {
                player,
                kind: FaultKind::InvalidAction,
                detail: format!("could not parse action '{answer}'"),
            }),
        }
    }

    fn scored_outcome(&self) -> MatchOutcome {
        let scores = (0..self.agents.len())
            .map(|i| self.game.get_player_score(i as u32))
            .collect::<Vec<_>>();
        trace!(?scores);
        let best = scores.iter().copied().fold(f32::MIN, f32::max);
        let worst = scores.iter().copied().fold(f32::MAX, f32::min);
        if (best - worst).abs() < f32::EPSILON {
            return MatchOutcome::Draw;
        }
        let winner = scores.iter().position(|s| *s == best).unwrap_or(0);
        let loser = scores.iter().position(|s| *s == worst).unwrap_or(0);
        MatchOutcome::decisive(winner, loser)
    }

    /// The faulty player loses, the best scored among the others wins.
    fn forfeit_outcome(&self, faulty: usize) -> MatchOutcome {
        let winner = (0..self.agents.len())
            .filter(|i| *i != faulty)
            .fold(None, |best: Option<(usize, f32)>, i| {
                let score = self.game.get_player_score(i as u32);
                match best {
                    Some((_, s)) if s >= score => best,
                    _ => Some((i, score)),
                }
            });
        match winner {
            Some((winner, _)) => MatchOutcome::decisive(winner, faulty),
            None => MatchOutcome::Draw,
        }
    }
}

impl<G: Game> Match for RulesMatch<G> {
    fn run(&mut self, observer: &mut dyn MatchObserver) -> MatchOutcome {
        let mut turn = 0;
        while !self.game.is_finished() {
            if turn >= self.max_turns {
                warn!("match stopped after {turn} turns, scoring current position");
                break;
            }
            let player = self.game.get_current_player_number();
            if player >= self.agents.len() {
                error!("game asked player {player} to move, only {} seated", self.agents.len());
                break;
            }
            let state = self.game.get_state().to_string();
            trace!(turn, player, %state);

            let (action, answer) = match self.ask(player, &state) {
                Ok(played) => played,
                Err(fault) => {
                    debug!(?fault, "agent fault");
                    observer.on_fault(&fault);
                    return self.forfeit_outcome(player);
                }
            };
            if let Err(e) = self.game.apply_action(&action) {
                let fault = AgentFault {
                    player,
                    kind: FaultKind::IllegalAction,
                    detail: format!("{e:#}"),
                };
                debug!(?fault, "illegal move");
                observer.on_fault(&fault);
                return self.forfeit_outcome(player);
            }
            observer.on_move(&MoveEvent {
                turn,
                player,
                state,
                action: answer,
            });
            turn += 1;
        }
        self.scored_outcome()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "agent panicked".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game_interface::FnAgent;

    /// First to reach 3 wins, each player adds 1 or 2 per move
    struct RaceGame {
        totals: [u32; 2],
        current: usize,
    }

    impl Game for RaceGame {
        type State = String;
        type Action = u32;

        fn apply_action(&mut self, action: &u32) -> anyhow::Result<()> {
            anyhow::ensure!(*action == 1 || *action == 2, "step must be 1 or 2");
            self.totals[self.current] += action;
            self.current = 1 - self.current;
            Ok(())
        }

        fn get_state(&self) -> String {
            format!("{} {}", self.totals[0], self.totals[1])
        }

        fn get_current_player_number(&self) -> usize {
            self.current
        }

        fn is_finished(&self) -> bool {
            self.totals.iter().any(|t| *t >= 3)
        }

        fn get_player_score(&self, player_number: u32) -> f32 {
            self.totals[player_number as usize] as f32
        }
    }

    struct RaceFactory;

    impl GameFactory<RaceGame> for RaceFactory {
        fn new_game(&self) -> RaceGame {
            RaceGame {
                totals: [0, 0],
                current: 0,
            }
        }
    }

    fn constant(answer: &'static str) -> Box<dyn Agent> {
        Box::new(FnAgent::new(move |_state: &str| Ok(answer.to_owned())))
    }

    #[derive(Default)]
    struct Recorder {
        moves: Vec<MoveEvent>,
        faults: Vec<AgentFault>,
    }

    impl MatchObserver for Recorder {
        fn on_move(&mut self, event: &MoveEvent) {
            self.moves.push(event.clone());
        }

        fn on_fault(&mut self, fault: &AgentFault) {
            self.faults.push(fault.clone());
        }
    }

    #[test]
    fn arity_is_checked() {
        let adapter = RulesAdapter::new("race", RaceFactory);
        let err = adapter.new_match(vec![constant("1")]).err().unwrap();
        assert_eq!(
            err,
            MatchError::Arity {
                game: "race".into(),
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn regular_win() {
        let adapter = RulesAdapter::new("race", RaceFactory);
        let mut game = adapter
            .new_match(vec![constant("2"), constant("1")])
            .unwrap();
        let mut recorder = Recorder::default();
        assert_eq!(game.run(&mut recorder), MatchOutcome::decisive(0, 1));
        assert_eq!(recorder.moves.len(), 3);
        assert!(recorder.faults.is_empty());
    }

    #[test]
    fn error_on_first_move_loses() {
        let adapter = RulesAdapter::new("race", RaceFactory);
        let failing = Box::new(FnAgent::new(|_state: &str| anyhow::bail!("boom")));
        let mut game = adapter.new_match(vec![failing, constant("1")]).unwrap();
        let mut recorder = Recorder::default();
        assert_eq!(game.run(&mut recorder), MatchOutcome::decisive(1, 0));
        assert_eq!(recorder.faults[0].kind, FaultKind::Error);
    }

    #[test]
    fn panic_is_contained() {
        let adapter = RulesAdapter::new("race", RaceFactory);
        let panicking = Box::new(FnAgent::new(|_state: &str| -> anyhow::Result<String> {
            panic!("agent bug")
        }));
        let mut game = adapter.new_match(vec![constant("1"), panicking]).unwrap();
        let mut recorder = Recorder::default();
        assert_eq!(game.run(&mut recorder), MatchOutcome::decisive(0, 1));
        assert_eq!(recorder.faults[0].kind, FaultKind::Panic);
        assert_eq!(recorder.faults[0].detail, "agent bug");
    }

    #[test]
    fn garbage_and_illegal_answers_lose() {
        let adapter = RulesAdapter::new("race", RaceFactory);
        let mut game = adapter
            .new_match(vec![constant("one"), constant("1")])
            .unwrap();
        let mut recorder = Recorder::default();
        assert_eq!(game.run(&mut recorder), MatchOutcome::decisive(1, 0));
        assert_eq!(recorder.faults[0].kind, FaultKind::InvalidAction);

        let mut game = adapter
            .new_match(vec![constant("1"), constant("5")])
            .unwrap();
        let mut recorder = Recorder::default();
        assert_eq!(game.run(&mut recorder), MatchOutcome::decisive(0, 1));
        assert_eq!(recorder.faults[0].kind, FaultKind::IllegalAction);
    }

    #[test]
    fn turn_cap_scores_the_position() {
        let adapter = RulesAdapter::new("race", RaceFactory).with_max_turns(2);
        let mut game = adapter
            .new_match(vec![constant("1"), constant("1")])
            .unwrap();
        assert_eq!(game.run(&mut NoopObserver), MatchOutcome::Draw);
    }
}
