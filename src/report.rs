//! Final (or partial) result of one tournament run.

use std::fmt::{Display, Write};

use serde::{Deserialize, Serialize};

use crate::match_record::MatchRecord;
use crate::standings::RankedEntry;
use crate::tournament_strategy::TournamentFormat;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Every round was played
    Completed,
    /// Stopped between rounds by an [`AbortHandle`](crate::run_control::AbortHandle)
    Aborted,
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Completed => f.write_str("completed"),
            RunStatus::Aborted => f.write_str("aborted"),
        }
    }
}

/// Standings and every match record of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TournamentReport<S> {
    /// Run identifier, also the key of the persisted results
    pub run_id: String,
    /// Game identifier
    pub game: String,
    /// Tournament format
    pub format: TournamentFormat,
    /// How the run ended
    pub status: RunStatus,
    /// Rounds fully played
    pub rounds_completed: u32,
    /// Bracket winner
    pub champion: Option<String>,
    /// Leaderboard, best first
    pub standings: Vec<RankedEntry<S>>,
    /// Records in sequence order, byes included
    pub matches: Vec<MatchRecord>,
}

impl<S: Display> TournamentReport<S> {
    /// Leader of the standings
    pub fn leader(&self) -> Option<&RankedEntry<S>> {
        self.standings.first()
    }

    /// Generate a text report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        // writing to a String cannot fail
        let _ = self.write_report(&mut report);
        report
    }

    /// Print report to stdout
    pub fn print_report(&self) {
        println!("{}", self.generate_report());
    }

    fn write_report(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "=== Tournament {} ({}, {}) ===", self.run_id, self.game, self.format)?;
        writeln!(
            out,
            "Status: {}, {} round(s), {} match record(s)",
            self.status,
            self.rounds_completed,
            self.matches.len()
        )?;
        if let Some(champion) = &self.champion {
            writeln!(out, "Champion: {champion}")?;
        }

        writeln!(out, "\nStandings:")?;
        writeln!(out, "{:>4}  {:<20} {:<24} Score", "Rank", "Party", "Agent")?;
        writeln!(out, "{}", "-".repeat(72))?;
        for entry in &self.standings {
            writeln!(
                out,
                "{:>4}  {:<20} {:<24} {}",
                entry.rank, entry.party, entry.name, entry.standing
            )?;
        }

        writeln!(out, "\nMatches:")?;
        for record in &self.matches {
            let round = record
                .round
                .map(|r| format!("R{r} "))
                .unwrap_or_default();
            writeln!(out, "#{:<4} {round}{record}", record.sequence)?;
            for fault in &record.faults {
                writeln!(out, "        fault: {fault}")?;
            }
        }
        Ok(())
    }
}
