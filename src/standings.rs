//! Standings: per-participant accumulation of match records and ranked snapshots.
//!
//! Standings are a pure function of the match records applied to them, so they can always be
//! rebuilt from persisted records with [`Standings::from_records`].

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::agent::Participant;
use crate::match_record::{Decision, MatchOutcome, MatchRecord};

/// Score of one participant in a given tournament format.
pub trait Standing: Default + Clone + Debug {
    /// Applies `record` to the participant seated at `seat`
    fn record(&mut self, record: &MatchRecord, seat: usize);

    /// `Ordering::Less` when `self` ranks before `other`
    fn rank_cmp(&self, other: &Self) -> Ordering;
}

/// Bracket score: win +1, loss -1, draw 0, bye +1.
#[derive(PartialEq, Eq, Default, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BracketStanding {
    /// Cumulative points
    pub points: i32,
    /// Rounds taken part in, byes included
    pub rounds_played: u32,
}

impl Standing for BracketStanding {
    fn record(&mut self, record: &MatchRecord, seat: usize) {
        self.rounds_played += 1;
        match (record.decision, &record.outcome) {
            (Decision::Bye, _) => self.points += 1,
            (_, Some(MatchOutcome::Decisive { winner, loser })) => {
                if *winner == seat {
                    self.points += 1;
                } else if *loser == seat {
                    self.points -= 1;
                }
            }
            _ => {}
        }
    }

    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .points
            .cmp(&self.points)
            .then(other.rounds_played.cmp(&self.rounds_played))
    }
}

impl std::fmt::Display for BracketStanding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "points: {}, rounds: {}",
            self.points, self.rounds_played
        )
    }
}

/// Round-robin score summary.
#[derive(PartialEq, Eq, Default, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoundRobinStanding {
    /// Number of wins.
    pub wins: u32,
    /// Number of losses.
    pub losses: u32,
    /// Number of draws.
    pub draws: u32,
    /// Number of games played.
    pub games: u32,
}

impl RoundRobinStanding {
    /// `wins / games`, 0 when no game was played
    pub fn win_rate(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.wins as f64 / self.games as f64
        }
    }
}

impl Standing for RoundRobinStanding {
    fn record(&mut self, record: &MatchRecord, seat: usize) {
        self.games += 1;
        match &record.outcome {
            Some(MatchOutcome::Decisive { winner, loser }) => {
                if *winner == seat {
                    self.wins += 1;
                } else if *loser == seat {
                    self.losses += 1;
                }
            }
            Some(MatchOutcome::Draw) => self.draws += 1,
            None => {}
        }
    }

    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .win_rate()
            .total_cmp(&self.win_rate())
            .then(other.wins.cmp(&self.wins))
            .then(self.losses.cmp(&other.losses))
    }
}

impl std::fmt::Display for RoundRobinStanding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "win: {}, draw: {}, loss: {}, games: {}, win rate: {:.1}%",
            self.wins,
            self.draws,
            self.losses,
            self.games,
            self.win_rate() * 100.0
        )
    }
}

/// One leaderboard line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry<S> {
    /// 1-based position
    pub rank: usize,
    /// Party identifier
    pub party: String,
    /// Submission name
    pub name: String,
    /// Score
    pub standing: S,
}

#[derive(Debug, Clone)]
struct Entry<S> {
    party: String,
    name: String,
    standing: S,
}

/// Standings of every seeded participant.
#[derive(Debug, Clone)]
pub struct Standings<S> {
    entries: Vec<Entry<S>>,
    index: HashMap<String, usize>,
}

impl<S: Standing> Standings<S> {
    /// Zeroed standings for `participants`
    pub fn new(participants: &[Participant]) -> Self {
        Self::seeded(
            participants
                .iter()
                .map(|p| (p.party.clone(), p.name.clone())),
        )
    }

    /// Zeroed standings from `(party, name)` pairs
    pub fn seeded(parties: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut standings = Self {
            entries: vec![],
            index: HashMap::new(),
        };
        for (party, name) in parties {
            if standings.index.contains_key(&party) {
                continue;
            }
            standings.index.insert(party.clone(), standings.entries.len());
            standings.entries.push(Entry {
                party,
                name,
                standing: S::default(),
            });
        }
        standings
    }

    /// Re-derives standings from persisted records.
    ///
    /// Records are applied in sequence order and duplicates (same sequence) count once.
    pub fn from_records(
        parties: impl IntoIterator<Item = (String, String)>,
        records: &[MatchRecord],
    ) -> Self {
        let mut standings = Self::seeded(parties);
        let unique = records
            .iter()
            .map(|r| (r.sequence, r))
            .collect::<BTreeMap<_, _>>();
        for record in unique.values() {
            standings.apply(record);
        }
        standings
    }

    /// Applies a record to each of its participants, exactly once.
    pub fn apply(&mut self, record: &MatchRecord) {
        for (seat, party) in record.participants.iter().enumerate() {
            match self.index.get(party) {
                Some(i) => self.entries[*i].standing.record(record, seat),
                None => warn!("'{party}' is not part of the standings, record ignored for it"),
            }
        }
    }

    /// Standing of `party`
    pub fn get(&self, party: &str) -> Option<&S> {
        self.index.get(party).map(|i| &self.entries[*i].standing)
    }

    /// Number of participants
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nobody was seeded
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Leaderboard snapshot, best first. Ties fall back on party identifier order.
    pub fn ranked(&self) -> Vec<RankedEntry<S>> {
        let mut sorted = self.entries.iter().collect::<Vec<_>>();
        sorted.sort_by(|a, b| {
            a.standing
                .rank_cmp(&b.standing)
                .then_with(|| a.party.cmp(&b.party))
        });
        sorted
            .into_iter()
            .enumerate()
            .map(|(i, e)| RankedEntry {
                rank: i + 1,
                party: e.party.clone(),
                name: e.name.clone(),
                standing: e.standing.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_record::ScoringConvention;

    fn played(seq: u32, a: &str, b: &str, outcome: MatchOutcome) -> MatchRecord {
        MatchRecord {
            sequence: seq,
            round: None,
            participants: vec![a.to_owned(), b.to_owned()],
            outcome: Some(outcome),
            decision: Decision::Regulation,
            advanced: None,
            score_deltas: ScoringConvention::RoundRobin.deltas(&outcome, 2),
            faults: vec![],
            trace: vec![],
        }
    }

    fn parties(names: &[&str]) -> Vec<(String, String)> {
        names
            .iter()
            .map(|n| (n.to_string(), format!("{n}.py")))
            .collect()
    }

    #[test]
    fn win_rate_without_games() {
        assert_eq!(RoundRobinStanding::default().win_rate(), 0.0);
    }

    #[test]
    fn round_robin_ranking_tie_breaks() {
        let a = RoundRobinStanding { wins: 2, losses: 2, draws: 0, games: 4 };
        let b = RoundRobinStanding { wins: 1, losses: 0, draws: 1, games: 2 };
        let c = RoundRobinStanding { wins: 1, losses: 1, draws: 0, games: 2 };
        // same win rate: more wins first, then fewer losses
        assert_eq!(a.rank_cmp(&b), Ordering::Less);
        assert_eq!(b.rank_cmp(&c), Ordering::Less);
    }

    #[test]
    fn bracket_points() {
        let mut standings = Standings::<BracketStanding>::seeded(parties(&["a", "b", "c"]));
        standings.apply(&played(0, "a", "b", MatchOutcome::decisive(0, 1)));
        standings.apply(&MatchRecord::bye("c", 1));
        standings.apply(&played(2, "a", "c", MatchOutcome::Draw));
        assert_eq!(
            standings.get("a"),
            Some(&BracketStanding { points: 1, rounds_played: 2 })
        );
        assert_eq!(
            standings.get("b"),
            Some(&BracketStanding { points: -1, rounds_played: 1 })
        );
        assert_eq!(
            standings.get("c"),
            Some(&BracketStanding { points: 1, rounds_played: 2 })
        );
        let ranked = standings.ranked();
        assert_eq!(ranked[0].party, "a");
        assert_eq!(ranked[1].party, "c");
        assert_eq!(ranked[2].rank, 3);
    }

    #[test]
    fn rebuild_is_idempotent_and_ignores_duplicates() {
        let records = vec![
            played(0, "a", "b", MatchOutcome::decisive(0, 1)),
            played(1, "b", "a", MatchOutcome::Draw),
            played(1, "b", "a", MatchOutcome::Draw),
        ];
        let first = Standings::<RoundRobinStanding>::from_records(parties(&["a", "b"]), &records);
        let second = Standings::<RoundRobinStanding>::from_records(parties(&["a", "b"]), &records);
        assert_eq!(first.ranked(), second.ranked());
        assert_eq!(
            first.get("a"),
            Some(&RoundRobinStanding { wins: 1, losses: 0, draws: 1, games: 2 })
        );
    }
}
