//! Tournament CLI
//!
//! Collects submissions from disk, runs one tournament and prints the final report.

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use agent_tournament::prelude::*;

fn print_usage() {
    println!("Agent tournament runner");
    println!();
    println!("Usage:");
    println!("  agent-tournament <agents_root> <game> <bracket|round-robin> [results_dir]");
    println!();
    println!("Submissions are read from <agents_root>/<game>/<party>/<executable>.");
    println!("Results are written as JSON under [results_dir] when given, kept in memory otherwise.");
    println!();
    println!("Games:");
    for game in GameRegistry::builtin(0).names() {
        println!("  {game}");
    }
    println!();
    println!("Behavior is tuned with TOURNAMENT_* environment variables (see Configuration).");
}

fn run(args: &[String]) -> anyhow::Result<()> {
    let [root, game, format, rest @ ..] = args else {
        print_usage();
        anyhow::bail!("missing arguments");
    };
    let config = Configuration::from_env();
    let agents = collect_agents(root, config)?;
    let mut evaluator = Evaluator::new(GameRegistry::builtin(config.max_turns()), agents, config);
    if let Some(results_dir) = rest.first() {
        evaluator = evaluator.with_store(Arc::new(JsonFileStore::new(results_dir)?));
    }

    match format.as_str() {
        "bracket" | "single-elimination" => evaluator.run_bracket(game)?.print_report(),
        "round-robin" | "rr" => evaluator.run_round_robin(game)?.print_report(),
        other => {
            print_usage();
            anyhow::bail!("unknown tournament format '{other}'");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = env::args().skip(1).collect::<Vec<_>>();
    if matches!(args.first().map(String::as_str), Some("-h" | "--help")) {
        print_usage();
        return ExitCode::SUCCESS;
    }
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
