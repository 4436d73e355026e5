//! # Agent Tournament
//!
//! Tournament orchestration for small game-playing agents submitted by competing parties.
//!
//! It provides:
//! - Resolution of the most recent submission of every party (`AgentRegistry`)
//! - A uniform game contract with built-in Connect-4, Tic-Tac-Toe and Rock-Paper-Scissors
//!   (`GameAdapter`, `GameRegistry`)
//! - Match execution with failure containment: a crashing, panicking or cheating agent loses
//!   its match and never aborts the tournament (`MatchExecutor`)
//! - Tournament logic via the `TournamentStrategy` trait, with `SingleEliminationTournament`
//!   (byes, coin-flip tiebreaks) and `RoundRobinTournament` (every pair twice, roles swapped)
//! - Standings that can be re-derived at any time from persisted match records (`ResultStore`)
//!
//! Matches run strictly one after the other, in a deterministic order.
//!
//! # Documentation Overview
//!
//! - For the tournament run itself, see the [`server`] module and its [`Evaluator`](server::Evaluator).
//! - For configuring evaluation behavior, see [`Configuration`](crate::configuration::Configuration).
//! - To understand tournament formats and match scheduling, see the [`TournamentStrategy`](crate::tournament_strategy::TournamentStrategy) trait and its implementations.
//! - For implementing custom games and agents, check out the [`Game`](game_interface::Game),
//!   [`GameFactory`](game_interface::GameFactory) and [`Agent`](game_interface::Agent) traits.
//!
//! # Usage Example
//!
//! A round-robin of in-process agents at Rock-Paper-Scissors:
//!
//! ```
//! use agent_tournament::prelude::*;
//! use time::OffsetDateTime;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut agents = AgentRegistry::new();
//!     for (party, hand) in [("group1", "rock"), ("group2", "paper"), ("group3", "scissors")] {
//!         let handle = handle_from_fn(move |_state: &str| Ok(hand.to_owned()));
//!         agents.submit(party, "rps", hand, OffsetDateTime::now_utc(), handle);
//!     }
//!
//!     let config = Configuration::new().with_verbose(false).with_seed(Some(42));
//!     let evaluator = Evaluator::new(GameRegistry::builtin(config.max_turns()), agents, config);
//!     let report = evaluator.run_round_robin("rps")?;
//!
//!     // everybody beats somebody and loses to somebody else
//!     assert_eq!(report.matches.len(), 6);
//!     for entry in &report.standings {
//!         assert_eq!(entry.standing.wins, 2);
//!     }
//!     println!("{}", report.generate_report());
//!     Ok(())
//! }
//! ```
//!
//! # Example Agent
//!
//! Submissions collected from disk (see [`agent_collector`]) run as separate processes and
//! talk over TCP:
//!
//! ```no_run
//! use std::io::{BufRead, BufReader, Write};
//! use std::net::TcpStream;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut args = std::env::args().skip(1); // Skip binary name
//!
//!     // Read the port number to connect to, then the time allowed per action (ms)
//!     let port: u16 = args.next().unwrap_or_default().parse()?;
//!     let _action_timeout_ms: u64 = args.next().unwrap_or_default().parse()?;
//!     let stream = TcpStream::connect(("127.0.0.1", port))?;
//!     let mut writer = stream.try_clone()?;
//!
//!     // Interaction loop: one state line in, one action line out
//!     for line in BufReader::new(stream).lines() {
//!         let _state = line?;
//!         writeln!(writer, "rock")?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Agent Requirements
//!
//! - `Game::State` must implement `ToString` and `Game::Action` must implement `FromStr`
//! - Agent logic must answer within the configured action timeout
//! - Communication is done over TCP using a basic line protocol:
//!  * Server -> Agent : string of Game::State
//!  * Agent -> Server : string of Game::Action
#![warn(missing_docs)]

pub mod adapter;
pub mod agent;
pub mod agent_collector;
pub mod agent_registry;
pub mod client_handler;
pub mod configuration;
pub mod error;
pub mod game_interface;
pub mod games;
mod logger;
pub mod match_record;
pub mod match_runner;
pub mod report;
pub mod run_control;
pub mod server;
pub mod standings;
pub mod store;
mod tournament_scheduler;
pub mod tournament_strategy;

pub use anyhow;

/// Commonly used types and traits for quick access.
///
/// Import this prelude to get started easily:
/// ```rust
/// use agent_tournament::prelude::*;
/// ```
///
/// Includes:
/// - [`Configuration`](crate::configuration::Configuration)
/// - [`Evaluator`](crate::server::Evaluator) and its [`TournamentReport`](crate::report::TournamentReport)
/// - the registries of games and agents
/// - all built-in [`Tournament strategies`](crate::tournament_strategy)
pub mod prelude {
    pub use crate::adapter::{GameAdapter, RulesAdapter};
    pub use crate::agent::{handle_from_fn, AgentHandle, FnHandle, Participant};
    pub use crate::agent_collector::collect_agents;
    pub use crate::agent_registry::AgentRegistry;
    pub use crate::configuration::Configuration;
    pub use crate::error::{MatchError, TournamentError};
    pub use crate::game_interface::{Agent, FnAgent, Game, GameFactory};
    pub use crate::games::GameRegistry;
    pub use crate::match_record::{Decision, MatchOutcome, MatchRecord, ScoringConvention};
    pub use crate::match_runner::MatchExecutor;
    pub use crate::report::{RunStatus, TournamentReport};
    pub use crate::run_control::{AbortHandle, RunLocks};
    pub use crate::server::Evaluator;
    pub use crate::standings::{BracketStanding, RoundRobinStanding, Standing, Standings};
    pub use crate::store::{JsonFileStore, MemoryStore, ResultStore};
    pub use crate::tournament_strategy::*;
}
