use tracing::info;

use super::{Round, TournamentFormat, TournamentStrategy};
use crate::agent::Participant;
use crate::match_record::{MatchRecord, ScoringConvention};
use crate::standings::{RoundRobinStanding, Standings};

/// Every unordered pair `{a, b}` twice: `(a, b)` immediately followed by `(b, a)`.
///
/// `k` participants give `k * (k - 1)` pairings.
pub fn schedule<T: Clone>(participants: &[T]) -> Vec<(T, T)> {
    let n = participants.len();
    let mut pending = Vec::with_capacity(n * n.saturating_sub(1));
    for i in 0..n {
        for j in (i + 1)..n {
            pending.push((participants[i].clone(), participants[j].clone()));
            pending.push((participants[j].clone(), participants[i].clone()));
        }
    }
    pending
}

/// A round-robin tournament where each participant plays every other participant twice, once
/// in each seat, to cancel first-move advantage.
///
/// Ranking: win rate, then wins, then fewest losses.
pub struct RoundRobinTournament {
    participants: Vec<Participant>,
    standings: Standings<RoundRobinStanding>,
    scheduled: bool,
    pending: usize,
}

impl RoundRobinTournament {
    /// Creates a new Round Robin tournament.
    pub fn new() -> Self {
        Self {
            participants: vec![],
            standings: Standings::seeded([]),
            scheduled: false,
            pending: 0,
        }
    }
}

impl Default for RoundRobinTournament {
    fn default() -> Self {
        Self::new()
    }
}

impl TournamentStrategy for RoundRobinTournament {
    type Standing = RoundRobinStanding;

    fn format(&self) -> TournamentFormat {
        TournamentFormat::RoundRobin
    }

    fn scoring(&self) -> ScoringConvention {
        ScoringConvention::RoundRobin
    }

    fn add_participants(&mut self, participants: Vec<Participant>) {
        self.standings = Standings::new(&participants);
        self.participants = participants;
        self.scheduled = false;
        self.pending = 0;
    }

    fn advance_round(&mut self) -> Option<Round> {
        if self.scheduled {
            // first (and only) round was already ran
            return None;
        }
        self.scheduled = true;

        let pairings = schedule(&self.participants)
            .into_iter()
            .map(|(a, b)| vec![a, b])
            .collect::<Vec<_>>();
        if pairings.is_empty() {
            return None;
        }
        self.pending = pairings.len();
        info!(
            "round-robin over {} participants: {} matches",
            self.participants.len(),
            pairings.len()
        );
        Some(Round {
            number: 1,
            pairings,
            byes: vec![],
        })
    }

    fn is_over(&self) -> bool {
        self.pending == 0 && (self.scheduled || self.participants.len() < 2)
    }

    fn on_result(&mut self, record: &mut MatchRecord) {
        self.pending = self.pending.saturating_sub(1);
        self.standings.apply(record);
    }

    fn standings(&self) -> &Standings<RoundRobinStanding> {
        &self.standings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::handle_from_fn;
    use crate::match_record::{Decision, MatchOutcome};

    fn participants(names: &[&str]) -> Vec<Participant> {
        names
            .iter()
            .map(|n| Participant::new(*n, *n, 1, handle_from_fn(|_s: &str| Ok(String::new()))))
            .collect()
    }

    #[test]
    fn both_role_orders() {
        let pairs = schedule(&["A", "B", "C"]);
        assert_eq!(
            pairs,
            vec![
                ("A", "B"),
                ("B", "A"),
                ("A", "C"),
                ("C", "A"),
                ("B", "C"),
                ("C", "B")
            ]
        );
        assert!(schedule(&["A"]).is_empty());
    }

    #[test]
    fn first_mover_always_wins() {
        let mut tournament = RoundRobinTournament::new();
        tournament.add_participants(participants(&["A", "B"]));
        let round = tournament.advance_round().unwrap();
        assert_eq!(round.pairings.len(), 2);
        assert!(!tournament.is_over());
        for pairing in &round.pairings {
            let outcome = MatchOutcome::decisive(0, 1);
            let mut record = MatchRecord {
                sequence: 0,
                round: None,
                participants: pairing.iter().map(|p| p.party.clone()).collect(),
                outcome: Some(outcome),
                decision: Decision::Regulation,
                advanced: None,
                score_deltas: ScoringConvention::RoundRobin.deltas(&outcome, 2),
                faults: vec![],
                trace: vec![],
            };
            tournament.on_result(&mut record);
        }
        assert!(tournament.is_over());
        assert!(tournament.advance_round().is_none());

        let expected = RoundRobinStanding {
            wins: 1,
            losses: 1,
            draws: 0,
            games: 2,
        };
        for party in ["A", "B"] {
            let standing = tournament.standings().get(party).unwrap();
            assert_eq!(standing, &expected);
            assert_eq!(standing.win_rate(), 0.5);
        }
    }
}
