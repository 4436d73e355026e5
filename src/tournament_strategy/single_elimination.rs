use std::mem;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{info, instrument, warn};

use super::{Round, TournamentFormat, TournamentStrategy};
use crate::agent::Participant;
use crate::match_record::{Decision, MatchOutcome, MatchRecord, ScoringConvention};
use crate::standings::{BracketStanding, Standings};

/// How the initial bracket is ordered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Seeding {
    /// Uniform random permutation
    #[default]
    Shuffle,
    /// Keep the order participants were given in
    AsGiven,
}

/// A knockout tournament for two-player games.
///
/// Each round pairs consecutive entrants `(0, 1), (2, 3), ...`. With an odd number of entrants
/// the last one gets a bye (scored as a win). Winners advance. A draw is settled by an unbiased
/// coin flip and recorded as `tiebreak(draw)`. The tournament ends when one entrant remains,
/// after `ceil(log2(n))` rounds.
pub struct SingleEliminationTournament {
    bracket: Vec<Participant>,
    next_round: Vec<Participant>,
    round: u32,
    pending: usize,
    seeding: Seeding,
    rng: StdRng,
    standings: Standings<BracketStanding>,
    champion: Option<Participant>,
}

impl SingleEliminationTournament {
    /// Creates a shuffled bracket. `seed` makes the shuffle and the coin flips reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            bracket: vec![],
            next_round: vec![],
            round: 0,
            pending: 0,
            seeding: Seeding::Shuffle,
            rng,
            standings: Standings::seeded([]),
            champion: None,
        }
    }

    /// Changes the initial ordering
    pub fn with_seeding(mut self, seeding: Seeding) -> Self {
        self.seeding = seeding;
        self
    }

    /// Entrants of the current round
    pub fn bracket(&self) -> &[Participant] {
        &self.bracket
    }

    /// Current round number, 0 before the first round
    pub fn round(&self) -> u32 {
        self.round
    }
}

impl TournamentStrategy for SingleEliminationTournament {
    type Standing = BracketStanding;

    fn format(&self) -> TournamentFormat {
        TournamentFormat::SingleElimination
    }

    fn scoring(&self) -> ScoringConvention {
        ScoringConvention::Bracket
    }

    fn add_participants(&mut self, mut participants: Vec<Participant>) {
        if self.seeding == Seeding::Shuffle {
            participants.shuffle(&mut self.rng);
        }
        info!(
            bracket = ?participants.iter().map(|p| &p.party).collect::<Vec<_>>(),
            "bracket seeded"
        );
        self.standings = Standings::new(&participants);
        self.bracket = participants;
        self.next_round.clear();
        self.round = 0;
        self.pending = 0;
        self.champion = None;
    }

    #[instrument(skip_all, fields(round = self.round + 1))]
    fn advance_round(&mut self) -> Option<Round> {
        if self.round > 0 {
            self.bracket = mem::take(&mut self.next_round);
        }
        if self.bracket.len() <= 1 {
            if self.champion.is_none() {
                self.champion = self.bracket.first().cloned();
                if let Some(champion) = &self.champion {
                    info!("{} wins the tournament", champion.party);
                }
            }
            return None;
        }

        self.round += 1;
        let mut entrants = self.bracket.clone();
        let mut byes = vec![];
        if entrants.len() % 2 == 1 {
            if let Some(lucky) = entrants.pop() {
                info!("{} receives a bye", lucky.party);
                let record = MatchRecord::bye(&lucky.party, self.round);
                self.standings.apply(&record);
                byes.push(record);
                self.next_round.push(lucky);
            }
        }

        let pairings = entrants
            .chunks(2)
            .map(<[Participant]>::to_vec)
            .collect::<Vec<_>>();
        info!("{} matches", pairings.len());
        self.pending = pairings.len();
        Some(Round {
            number: self.round,
            pairings,
            byes,
        })
    }

    fn is_over(&self) -> bool {
        if self.pending > 0 {
            return false;
        }
        let entrants = if self.round == 0 {
            &self.bracket
        } else {
            &self.next_round
        };
        self.champion.is_some() || entrants.len() <= 1
    }

    fn on_result(&mut self, record: &mut MatchRecord) {
        self.pending = self.pending.saturating_sub(1);
        record.round = Some(self.round);
        let seat = match record.outcome {
            Some(MatchOutcome::Decisive { winner, .. }) => winner,
            Some(MatchOutcome::Draw) | None => {
                let seat = usize::from(self.rng.gen_bool(0.5));
                record.decision = Decision::Tiebreak;
                seat
            }
        };
        let advancing = record
            .participants
            .get(seat)
            .and_then(|party| self.bracket.iter().find(|p| &p.party == party))
            .cloned();
        match advancing {
            Some(participant) => {
                record.advanced = Some(participant.party.clone());
                self.next_round.push(participant);
            }
            None => warn!("record {record} does not belong to round {}", self.round),
        }
        self.standings.apply(record);
    }

    fn standings(&self) -> &Standings<BracketStanding> {
        &self.standings
    }

    fn champion(&self) -> Option<&Participant> {
        self.champion.as_ref()
    }
}
