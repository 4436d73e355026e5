use std::sync::Arc;

use tracing::{debug, trace};

use crate::adapter::GameAdapter;
use crate::agent::Participant;
use crate::match_record::MatchRecord;
use crate::match_runner::MatchExecutor;
use crate::standings::Standings;
use crate::tournament_strategy::{Round, TournamentStrategy};

/// Drives a [`TournamentStrategy`] one round and one match at a time, sequentially.
///
/// Every record leaving the scheduler carries a run-unique sequence number.
pub struct TournamentScheduler<S: TournamentStrategy> {
    strategy: S,
    adapter: Arc<dyn GameAdapter>,
    executor: MatchExecutor,
    next_sequence: u32,
    rounds_completed: u32,
    is_finished: bool,
}

impl<S: TournamentStrategy> TournamentScheduler<S> {
    pub fn new(strategy: S, adapter: Arc<dyn GameAdapter>, executor: MatchExecutor) -> Self {
        TournamentScheduler {
            strategy,
            adapter,
            executor,
            next_sequence: 0,
            rounds_completed: 0,
            is_finished: false,
        }
    }

    /// Next round to play, with numbered bye records. `None` once the strategy is done.
    pub fn advance(&mut self) -> Option<Round> {
        if self.is_finished {
            return None;
        }
        trace!("next round");
        let Some(mut round) = self.strategy.advance_round() else {
            trace!("no more matches");
            self.is_finished = true;
            return None;
        };
        for bye in &mut round.byes {
            bye.sequence = self.take_sequence();
        }
        Some(round)
    }

    /// Plays one pairing of the current round. A match that cannot be set up is forfeited.
    pub fn play(&mut self, pairing: &[Participant]) -> MatchRecord {
        let mut record = match self.executor.execute(pairing, self.adapter.as_ref()) {
            Ok(record) => record,
            Err(e) => self.executor.forfeit(pairing, &e),
        };
        record.sequence = self.take_sequence();
        self.strategy.on_result(&mut record);
        debug!(%record);
        record
    }

    /// Marks the current round as fully played
    pub fn end_round(&mut self) {
        self.rounds_completed += 1;
    }

    /// All tournament matches ran and finished
    pub fn is_finished(&self) -> bool {
        self.is_finished
    }

    /// Nothing is left to play, even if [`advance`](Self::advance) was not called yet
    pub fn is_decided(&self) -> bool {
        self.is_finished || self.strategy.is_over()
    }

    pub fn rounds_completed(&self) -> u32 {
        self.rounds_completed
    }

    pub fn standings(&self) -> &Standings<S::Standing> {
        self.strategy.standings()
    }

    pub fn champion(&self) -> Option<&Participant> {
        self.strategy.champion()
    }

    fn take_sequence(&mut self) -> u32 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }
}
