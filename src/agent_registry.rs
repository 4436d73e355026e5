//! Agent submissions per party and game, and resolution of the most recent one.

use std::collections::BTreeSet;
use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::agent::{AgentHandle, Participant};
use crate::error::TournamentError;

/// One uploaded agent.
#[derive(Clone)]
pub struct Submission {
    /// Registry-assigned identifier, increasing with registration order
    pub id: u64,
    /// Submitting party
    pub party: String,
    /// Game identifier
    pub game: String,
    /// Display name (file name, class name...)
    pub name: String,
    /// Upload time
    pub created_at: OffsetDateTime,
    handle: Arc<dyn AgentHandle>,
}

/// All known submissions.
#[derive(Default, Clone)]
pub struct AgentRegistry {
    submissions: Vec<Submission>,
}

impl AgentRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a submission and returns its identifier.
    pub fn submit(
        &mut self,
        party: impl Into<String>,
        game: impl Into<String>,
        name: impl Into<String>,
        created_at: OffsetDateTime,
        handle: Arc<dyn AgentHandle>,
    ) -> u64 {
        let id = self.submissions.len() as u64 + 1;
        self.submissions.push(Submission {
            id,
            party: party.into(),
            game: game.into(),
            name: name.into(),
            created_at,
            handle,
        });
        id
    }

    /// Most recent submission of `party` for `game`. Same creation time: highest id wins.
    pub fn latest(&self, party: &str, game: &str) -> Option<&Submission> {
        self.submissions
            .iter()
            .filter(|s| s.party == party && s.game == game)
            .max_by_key(|s| (s.created_at, s.id))
    }

    /// Handle of the most recent submission.
    ///
    /// # Errors
    /// [`TournamentError::AgentNotFound`] if `party` never submitted for `game`.
    pub fn resolve(&self, party: &str, game: &str) -> Result<Arc<dyn AgentHandle>, TournamentError> {
        self.latest(party, game)
            .map(|s| s.handle.clone())
            .ok_or_else(|| not_found(party, game))
    }

    /// [`Participant`] built from the most recent submission.
    pub fn participant(&self, party: &str, game: &str) -> Result<Participant, TournamentError> {
        let submission = self.latest(party, game).ok_or_else(|| not_found(party, game))?;
        debug!(party, game, submission = submission.id, "resolved agent");
        Ok(Participant::new(
            &submission.party,
            &submission.name,
            submission.id,
            submission.handle.clone(),
        ))
    }

    /// Parties having at least one submission for `game`, sorted
    pub fn parties(&self, game: &str) -> Vec<String> {
        self.submissions
            .iter()
            .filter(|s| s.game == game)
            .map(|s| s.party.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One participant per party with a submission for `game`
    pub fn roster(&self, game: &str) -> Vec<Participant> {
        self.seed(&self.parties(game), game)
    }

    /// Participants for the given parties. Parties without a submission cannot compete and
    /// are left out.
    pub fn seed(&self, parties: &[String], game: &str) -> Vec<Participant> {
        parties
            .iter()
            .filter_map(|party| match self.participant(party, game) {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("{e}, '{party}' cannot compete");
                    None
                }
            })
            .collect()
    }
}

fn not_found(party: &str, game: &str) -> TournamentError {
    TournamentError::AgentNotFound {
        party: party.to_owned(),
        game: game.to_owned(),
    }
}
