//! Runs one match through a [`GameAdapter`] and turns its outcome into a [`MatchRecord`].

use tracing::{debug, instrument, warn};

use crate::adapter::{GameAdapter, MatchObserver};
use crate::agent::Participant;
use crate::error::MatchError;
use crate::match_record::{AgentFault, Decision, MatchOutcome, MatchRecord, MoveEvent, ScoringConvention};

/// Collects faults, and moves when asked to
struct RecordingObserver {
    keep_moves: bool,
    moves: Vec<MoveEvent>,
    faults: Vec<AgentFault>,
}

impl MatchObserver for RecordingObserver {
    fn on_move(&mut self, event: &MoveEvent) {
        if self.keep_moves {
            self.moves.push(event.clone());
        }
    }

    fn on_fault(&mut self, fault: &AgentFault) {
        self.faults.push(fault.clone());
    }
}

/// Executes matches for one tournament format.
#[derive(Debug, Clone, Copy)]
pub struct MatchExecutor {
    scoring: ScoringConvention,
    record_traces: bool,
}

impl MatchExecutor {
    /// Executor scoring records with `scoring`, without traces
    pub fn new(scoring: ScoringConvention) -> Self {
        Self {
            scoring,
            record_traces: false,
        }
    }

    /// Keep the move-by-move trace in every record
    pub fn with_traces(mut self, value: bool) -> Self {
        self.record_traces = value;
        self
    }

    /// Scoring convention used for the deltas
    pub fn scoring(&self) -> ScoringConvention {
        self.scoring
    }

    /// Instantiates fresh agents for `participants` (in seat order), plays the match and
    /// builds its record. The record has no sequence nor round yet.
    ///
    /// # Errors
    /// - [`MatchError::Instantiation`] naming the first participant whose agent could not be built
    /// - [`MatchError::Arity`] if the adapter does not accept that many players
    #[instrument(skip_all, fields(game = adapter.name()))]
    pub fn execute(
        &self,
        participants: &[Participant],
        adapter: &dyn GameAdapter,
    ) -> Result<MatchRecord, MatchError> {
        let mut instances = Vec::with_capacity(participants.len());
        for participant in participants {
            let instance = participant
                .instantiate()
                .map_err(|e| MatchError::Instantiation {
                    participant: participant.party.clone(),
                    reason: format!("{e:#}"),
                })?;
            instances.push(instance);
        }

        let mut game = adapter.new_match(instances)?;
        let mut observer = RecordingObserver {
            keep_moves: self.record_traces,
            moves: vec![],
            faults: vec![],
        };
        let outcome = game.run(&mut observer);
        debug!(?outcome, faults = observer.faults.len());

        let mut record = self.record(participants, outcome, Decision::Regulation);
        record.faults = observer.faults;
        record.trace = observer.moves;
        Ok(record)
    }

    /// Record of a match that could not be played.
    ///
    /// The participant whose agent could not be built loses. Any other error leaves the match
    /// drawn.
    pub fn forfeit(&self, participants: &[Participant], error: &MatchError) -> MatchRecord {
        warn!("match forfeited: {error}");
        let failed = match error {
            MatchError::Instantiation { participant, .. } => {
                participants.iter().position(|p| &p.party == participant)
            }
            MatchError::Arity { .. } => None,
        };
        let outcome = match failed {
            Some(loser) if participants.len() > 1 => {
                let winner = if loser == 0 { 1 } else { 0 };
                MatchOutcome::decisive(winner, loser)
            }
            _ => MatchOutcome::Draw,
        };
        self.record(participants, outcome, Decision::Forfeit)
    }

    fn record(
        &self,
        participants: &[Participant],
        outcome: MatchOutcome,
        decision: Decision,
    ) -> MatchRecord {
        MatchRecord {
            sequence: 0,
            round: None,
            participants: participants.iter().map(|p| p.party.clone()).collect(),
            outcome: Some(outcome),
            decision,
            advanced: None,
            score_deltas: self.scoring.deltas(&outcome, participants.len()),
            faults: vec![],
            trace: vec![],
        }
    }
}
