//! Core evaluation logic for running tournaments.
//!
//! This module defines the [`Evaluator`] type, which orchestrates tournament execution.
//! Its responsibilities include:
//!
//! - Resolving the latest submission of every party from the [`AgentRegistry`]
//! - Running matches sequentially using a [`TournamentStrategy`]
//! - Persisting every match record, each followed by a standings snapshot, to a [`ResultStore`]
//! - Returning the final standings and every match record as a [`TournamentReport`]
//!
//! # Behavior & Configuration
//!
//! Behavior is controlled by a [`Configuration`] object (verbosity, log file, random seed,
//! trace recording, persistence retries).
//!
//! Only one run per game may be in progress for a given set of [`RunLocks`]. Sharing the locks
//! between evaluators (see [`Evaluator::with_locks`]) extends the rule to all of them.
//!
//! ## Failures
//!
//! Setup failures ([`TournamentError::UnknownGame`], [`TournamentError::AlreadyRunning`],
//! [`TournamentError::InsufficientParticipants`]) are reported before any match runs.
//! Misbehaving agents never abort a run: they lose their match, and the fault is kept in the
//! match record. A store that keeps failing after the configured retries aborts the run with
//! [`TournamentError::Persistence`]; standings can then be re-derived from what was written
//! with [`Evaluator::rebuild_standings`].
//!
//! # Example
//!
//! See crate-level documentation for an example on how to use the `Evaluator`.

use std::collections::HashSet;
use std::fmt::Display;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use serde::Serialize;
use time::{format_description, OffsetDateTime};
use tracing::{error, info, instrument, trace, warn};

use crate::agent::Participant;
use crate::agent_registry::AgentRegistry;
use crate::configuration::Configuration;
use crate::error::TournamentError;
use crate::games::GameRegistry;
use crate::logger::init_logger;
use crate::match_record::MatchRecord;
use crate::match_runner::MatchExecutor;
use crate::report::{RunStatus, TournamentReport};
use crate::run_control::{AbortHandle, RunLocks};
use crate::standings::{BracketStanding, RoundRobinStanding, Standing, Standings};
use crate::store::{MemoryStore, ResultStore};
use crate::tournament_scheduler::TournamentScheduler;
use crate::tournament_strategy::{RoundRobinTournament, SingleEliminationTournament, TournamentStrategy};

/// The main type for running agent tournaments.
///
/// It resolves agents, schedules matches, persists results and builds the final report.
pub struct Evaluator {
    games: GameRegistry,
    agents: AgentRegistry,
    store: Arc<dyn ResultStore>,
    config: Configuration,
    locks: RunLocks,
    abort: AbortHandle,
}

impl Evaluator {
    /// Create an [`Evaluator`] over the given games and submissions, storing results in memory.
    ///
    /// Installs the file logger when `config.log` is set.
    #[instrument(skip_all)]
    pub fn new(games: GameRegistry, agents: AgentRegistry, config: Configuration) -> Evaluator {
        if config.log {
            if let Err(e) = init_logger() {
                eprintln!("logging disabled: {e:#}");
            }
        }
        trace!(?config, games = ?games.names());

        Evaluator {
            games,
            agents,
            store: Arc::new(MemoryStore::new()),
            config,
            locks: RunLocks::new(),
            abort: AbortHandle::new(),
        }
    }

    /// Persist results to `store` instead of memory
    pub fn with_store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = store;
        self
    }

    /// Share the run locks of another evaluator
    pub fn with_locks(mut self, locks: RunLocks) -> Self {
        self.locks = locks;
        self
    }

    /// Handle to stop the runs of this evaluator between rounds.
    ///
    /// Once aborted, every later run of this evaluator stops before its first round.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Run locks of this evaluator
    pub fn locks(&self) -> &RunLocks {
        &self.locks
    }

    /// Store the results are written to
    pub fn store(&self) -> &Arc<dyn ResultStore> {
        &self.store
    }

    /// Submissions known to this evaluator
    pub fn agents(&self) -> &AgentRegistry {
        &self.agents
    }

    /// Single elimination tournament between every party having a submission for `game`.
    ///
    /// The bracket is shuffled with the configured seed (entropy if none).
    pub fn run_bracket(
        &self,
        game: &str,
    ) -> Result<TournamentReport<BracketStanding>, TournamentError> {
        self.evaluate(game, SingleEliminationTournament::new(self.config.seed))
    }

    /// Doubled round-robin between every party having a submission for `game`.
    pub fn run_round_robin(
        &self,
        game: &str,
    ) -> Result<TournamentReport<RoundRobinStanding>, TournamentError> {
        self.evaluate(game, RoundRobinTournament::new())
    }

    /// Executes a tournament of `game` between every party having a submission for it.
    ///
    /// # Returns
    /// The report of the run: ranked standings and every match record, byes included. The
    /// status is [`RunStatus::Aborted`] if the [`AbortHandle`] stopped the run early.
    ///
    /// # Errors
    /// - [`TournamentError::UnknownGame`] if `game` is not registered
    /// - [`TournamentError::AlreadyRunning`] if a run of `game` is in progress
    /// - [`TournamentError::InsufficientParticipants`] if fewer than 2 parties can compete
    /// - [`TournamentError::Persistence`] if the store keeps failing
    #[instrument(skip(self, strategy))]
    pub fn evaluate<T>(
        &self,
        game: &str,
        mut strategy: T,
    ) -> Result<TournamentReport<T::Standing>, TournamentError>
    where
        T: TournamentStrategy,
        T::Standing: Serialize + Display,
    {
        // 1. setup checks, nothing runs before they pass
        let adapter = self.games.get(game)?;
        let _guard = self.locks.acquire(game)?;
        let participants = self.agents.roster(game);
        let required = adapter.required_players().max(2);
        if participants.len() < required {
            return Err(TournamentError::InsufficientParticipants {
                game: game.to_owned(),
                required,
                found: participants.len(),
            });
        }
        if strategy.players_per_match() != adapter.required_players() {
            warn!(
                "{} matches have {} players, '{game}' requires {}: every match will be forfeited",
                strategy.format(),
                strategy.players_per_match(),
                adapter.required_players()
            );
        }

        let run_id = new_run_id(game);
        info!(run_id = %run_id, format = %strategy.format(), participants = ?participants);
        if self.config.verbose {
            println!(
                "Tournament {run_id}: {} of '{game}' between {} participants",
                strategy.format(),
                participants.len()
            );
        }

        // 2. create scheduler
        let format = strategy.format();
        strategy.add_participants(participants);
        let executor = MatchExecutor::new(strategy.scoring()).with_traces(self.config.record_traces);
        let mut scheduler = TournamentScheduler::new(strategy, adapter, executor);

        // 3. main loop, aborts are honoured between rounds only
        if self.config.verbose {
            disable_line_wrap();
        }
        let result = self.run_rounds(&run_id, &mut scheduler);
        if self.config.verbose {
            enable_line_wrap();
        }
        let (status, matches) = result?;

        // 4. final snapshot
        let standings = scheduler.standings().ranked();
        self.persist_standings(&run_id, &standings)?;

        let report = TournamentReport {
            run_id,
            game: game.to_owned(),
            format,
            status,
            rounds_completed: scheduler.rounds_completed(),
            champion: scheduler.champion().map(|p| p.party.clone()),
            standings,
            matches,
        };
        info!(status = %report.status, finished = scheduler.is_finished(), champion = ?report.champion, "tournament over");
        Ok(report)
    }

    fn run_rounds<T>(
        &self,
        run_id: &str,
        scheduler: &mut TournamentScheduler<T>,
    ) -> Result<(RunStatus, Vec<MatchRecord>), TournamentError>
    where
        T: TournamentStrategy,
        T::Standing: Serialize,
    {
        let mut matches = vec![];
        loop {
            // a run whose last match is played is complete, abort or not
            if self.abort.is_aborted() && !scheduler.is_decided() {
                warn!(run_id, "run aborted after {} round(s)", scheduler.rounds_completed());
                return Ok((RunStatus::Aborted, matches));
            }
            let Some(round) = scheduler.advance() else {
                return Ok((RunStatus::Completed, matches));
            };
            info!(run_id, round = round.number, matches = round.pairings.len());

            for bye in round.byes {
                if self.config.verbose {
                    print_record(&bye);
                }
                self.persist_match(run_id, &bye)?;
                self.persist_standings(run_id, &scheduler.standings().ranked())?;
                matches.push(bye);
            }
            for pairing in &round.pairings {
                if self.config.verbose {
                    print_running_match(round.number, pairing);
                }
                let record = scheduler.play(pairing);
                if self.config.verbose {
                    print_record(&record);
                }
                self.persist_match(run_id, &record)?;
                self.persist_standings(run_id, &scheduler.standings().ranked())?;
                matches.push(record);
            }
            scheduler.end_round();
        }
    }

    /// Re-derives the standings of a run from its persisted match records.
    ///
    /// Records stored more than once count once, so calling this any number of times yields
    /// the same standings. Parties are named after their latest submission for `game`.
    pub fn rebuild_standings<S: Standing>(
        &self,
        run_id: &str,
        game: &str,
    ) -> Result<Standings<S>, TournamentError> {
        let records = self
            .store
            .load_matches(run_id)
            .map_err(|source| persistence(run_id, source))?;
        let mut seen = HashSet::new();
        let parties = records
            .iter()
            .flat_map(|r| r.participants.iter())
            .filter(|party| seen.insert(party.as_str()))
            .map(|party| {
                let name = self
                    .agents
                    .latest(party, game)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| party.clone());
                (party.clone(), name)
            })
            .collect::<Vec<_>>();
        Ok(Standings::from_records(parties, &records))
    }

    fn persist_match(&self, run_id: &str, record: &MatchRecord) -> Result<(), TournamentError> {
        self.with_retries(run_id, "match record", || self.store.save_match(run_id, record))
    }

    fn persist_standings<S: Serialize>(
        &self,
        run_id: &str,
        standings: &S,
    ) -> Result<(), TournamentError> {
        let snapshot =
            serde_json::to_value(standings).map_err(|e| persistence(run_id, io::Error::from(e)))?;
        self.with_retries(run_id, "standings", || {
            self.store.save_standings(run_id, &snapshot)
        })
    }

    /// At-least-once write: retried `config.persist_retries` times
    fn with_retries(
        &self,
        run_id: &str,
        what: &str,
        mut write: impl FnMut() -> io::Result<()>,
    ) -> Result<(), TournamentError> {
        let mut attempt = 0;
        loop {
            match write() {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.config.persist_retries => {
                    attempt += 1;
                    warn!(run_id, "writing {what} failed ({e}), retry {attempt}");
                }
                Err(e) => {
                    error!(run_id, "writing {what} failed: {e}");
                    return Err(persistence(run_id, e));
                }
            }
        }
    }
}

fn persistence(run_id: &str, source: io::Error) -> TournamentError {
    TournamentError::Persistence {
        run_id: run_id.to_owned(),
        source,
    }
}

/// `<game>-<local time>-<counter>`, unique within the process
fn new_run_id(game: &str) -> String {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let stamp = format_description::parse("[year][month][day]-[hour][minute][second]")
        .ok()
        .and_then(|format| now.format(&format).ok())
        .unwrap_or_else(|| now.unix_timestamp().to_string());
    format!("{game}-{stamp}-{n}")
}

fn print_record(record: &MatchRecord) {
    let faults = record
        .faults
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let deltas = record
        .score_deltas
        .iter()
        .map(|d| format!("{d}"))
        .collect::<Vec<_>>()
        .join("/");

    // clear line, green match, results, red errors, start of line
    println!("\x1b[2K\x1b[32m{record}: \x1b[39m{deltas} \x1b[31m{faults}\x1b[39m\x1b[0G");
}

fn print_running_match(round: u32, pairing: &[Participant]) {
    // clear, green, default, start of line
    print!(
        "\x1b[2K\x1b[32mRound {round}, running...:\x1b[39m {}\x1b[0G",
        pairing
            .iter()
            .map(|p| p.party.as_str())
            .collect::<Vec<_>>()
            .join(" VS ")
    );
    let _ = std::io::Write::flush(&mut std::io::stdout());
}

fn disable_line_wrap() {
    print!("\x1b[?7l");
}

fn enable_line_wrap() {
    print!("\x1b[?7h");
}
