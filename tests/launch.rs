use crate::games::{greedy, perfect, NimFactory};

use agent_tournament::prelude::*;
use std::path::PathBuf;
use time::{format_description, OffsetDateTime};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

mod games;

const NIM: &str = "nim";

fn init_test_logger() {
    let local_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let timer = tracing_subscriber::fmt::time::OffsetTime::new(
        local_offset,
        format_description::parse("[hour]:[minute]:[second]").unwrap(),
    );

    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .with_ansi(false)
        .with_timer(timer)
        .with_test_writer()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn nim_games() -> GameRegistry {
    GameRegistry::builtin(100).with_adapter(RulesAdapter::new(NIM, NimFactory { sticks: 10 }))
}

fn submit<F>(agents: &mut AgentRegistry, party: &str, select_action: F)
where
    F: FnMut(&str) -> anyhow::Result<String> + Clone + Send + Sync + 'static,
{
    agents.submit(
        party,
        NIM,
        format!("{party}_bot"),
        OffsetDateTime::now_utc(),
        handle_from_fn(select_action),
    );
}

fn config() -> Configuration {
    Configuration::new().with_verbose(false).with_seed(Some(7))
}

fn temp_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("agent-tournament-it-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

#[test]
fn nim_bracket_survives_faulty_agents() {
    init_test_logger();

    let mut agents = AgentRegistry::new();
    submit(&mut agents, "perfect", perfect);
    submit(&mut agents, "greedy", greedy);
    submit(&mut agents, "crasher", |_: &str| anyhow::bail!("segfault"));
    submit(&mut agents, "panicker", |_: &str| -> anyhow::Result<String> {
        panic!("index out of bounds")
    });
    submit(&mut agents, "cheater", |_: &str| Ok("7".to_owned()));
    submit(&mut agents, "chatty", |_: &str| Ok("hello there".to_owned()));

    let evaluator = Evaluator::new(nim_games(), agents, config());
    let report = evaluator.run_bracket(NIM).unwrap();
    report.print_report();

    assert_eq!(report.status, RunStatus::Completed);
    assert_eq!(report.champion.as_deref(), Some("perfect"));
    // 6 entrants: 3 matches, then 1 match and a bye, then the final
    assert_eq!(report.rounds_completed, 3);
    assert_eq!(report.matches.len(), 6);
    assert_eq!(
        report.matches.iter().map(|r| r.sequence).collect::<Vec<_>>(),
        (0..6).collect::<Vec<_>>()
    );
    assert_eq!(report.matches.iter().filter(|r| r.decision == Decision::Bye).count(), 1);

    for record in report.matches.iter().filter(|r| r.decision == Decision::Regulation) {
        let faulty = record
            .participants
            .iter()
            .filter(|p| !matches!(p.as_str(), "perfect" | "greedy"))
            .count();
        if faulty > 0 {
            assert!(!record.faults.is_empty(), "{record}");
            let winner = record.winner().unwrap();
            if faulty == 1 {
                assert!(matches!(winner, "perfect" | "greedy"), "{record}");
            }
        }
    }

    let leader = report.leader().unwrap();
    assert_eq!(leader.party, "perfect");
    assert_eq!(leader.name, "perfect_bot");
}

#[test]
fn round_robin_results_survive_a_restart() {
    init_test_logger();
    let root = temp_root("restart");

    let mut agents = AgentRegistry::new();
    submit(&mut agents, "perfect", perfect);
    submit(&mut agents, "greedy", greedy);
    submit(&mut agents, "one", |_: &str| Ok("1".to_owned()));

    let store = JsonFileStore::new(&root).unwrap();
    let evaluator = Evaluator::new(nim_games(), agents.clone(), config())
        .with_store(std::sync::Arc::new(store));
    let report = evaluator.run_round_robin(NIM).unwrap();

    assert_eq!(report.matches.len(), 6);
    let parties = report
        .standings
        .iter()
        .map(|e| e.party.as_str())
        .collect::<Vec<_>>();
    assert_eq!(parties, vec!["perfect", "greedy", "one"]);
    assert_eq!(report.standings[0].standing.wins, 4);
    assert_eq!(report.standings[1].standing.wins, 2);
    assert_eq!(report.standings[2].standing.losses, 4);

    // a fresh process only has the files
    let reopened = JsonFileStore::new(&root).unwrap();
    let restarted = Evaluator::new(nim_games(), agents, config())
        .with_store(std::sync::Arc::new(reopened));
    let rebuilt = restarted
        .rebuild_standings::<RoundRobinStanding>(&report.run_id, NIM)
        .unwrap();
    assert_eq!(rebuilt.ranked(), report.standings);
    assert_eq!(restarted.store().load_matches(&report.run_id).unwrap(), report.matches);

    let snapshot = restarted
        .store()
        .load_standings(&report.run_id)
        .unwrap()
        .unwrap();
    assert_eq!(snapshot[0]["party"], "perfect");
    assert_eq!(snapshot.as_array().map(Vec::len), Some(3));

    std::fs::remove_dir_all(root).unwrap();
}

#[test]
fn one_run_per_game_across_evaluators() {
    let mut agents = AgentRegistry::new();
    submit(&mut agents, "perfect", perfect);
    submit(&mut agents, "greedy", greedy);

    let first = Evaluator::new(nim_games(), agents.clone(), config());
    let second = Evaluator::new(nim_games(), agents, config()).with_locks(first.locks().clone());

    let guard = first.locks().acquire(NIM).unwrap();
    assert!(matches!(
        second.run_round_robin(NIM),
        Err(TournamentError::AlreadyRunning(game)) if game == NIM
    ));
    // other games are not blocked
    assert!(matches!(
        second.run_round_robin("rps"),
        Err(TournamentError::InsufficientParticipants { found: 0, .. })
    ));
    drop(guard);

    assert!(second.run_round_robin(NIM).is_ok());
    assert!(!first.locks().is_locked(NIM));
}

#[test]
fn traces_and_faults_are_kept() {
    let mut agents = AgentRegistry::new();
    submit(&mut agents, "perfect", perfect);
    submit(&mut agents, "cheater", |_: &str| Ok("7".to_owned()));

    let evaluator = Evaluator::new(nim_games(), agents, config().with_record_traces(true));
    let report = evaluator.run_round_robin(NIM).unwrap();

    assert_eq!(report.matches.len(), 2);
    for record in &report.matches {
        assert_eq!(record.winner(), Some("perfect"));
        assert_eq!(record.faults.len(), 1);
        assert_eq!(record.faults[0].kind, agent_tournament::match_record::FaultKind::IllegalAction);
    }

    let opening = report
        .matches
        .iter()
        .find(|r| r.participants[0] == "perfect")
        .unwrap();
    assert_eq!(opening.trace[0].state, "10");
    assert_eq!(opening.trace[0].action, "2");
    assert_eq!(opening.faults[0].player, 1);
}
