//! Builds an [`AgentRegistry`] from submissions stored on disk.
//!
//! Expected layout: `<root>/<game>/<party>/<executable>`. Every regular executable file in a
//! party directory is one submission, created at its modification time. Files sharing a
//! modification time are registered in file name order, so the greatest name is the most recent.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::agent_registry::AgentRegistry;
use crate::client_handler::ProcessHandle;
use crate::configuration::Configuration;

const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

/// Scans `directory` and registers every valid submission as a process agent.
///
/// Games are not checked against a game registry here: submissions for unknown games are
/// registered but never resolved.
///
/// # Errors
/// If `directory` is not a readable directory. Invalid submissions are skipped with a warning.
#[instrument(skip(config))]
pub fn collect_agents(
    directory: impl AsRef<Path> + std::fmt::Debug,
    config: Configuration,
) -> anyhow::Result<AgentRegistry> {
    let verbose = config.verbose;
    let directory = directory.as_ref();

    if !Path::is_dir(directory) {
        bail!("'{directory:?}' is not a valid directory");
    }
    if verbose {
        println!("Collecting agents...");
    }

    let mut registry = AgentRegistry::new();
    for game_dir in sorted_entries(directory)? {
        let Some(game) = dir_name(&game_dir) else {
            continue;
        };
        let parties = match sorted_entries(&game_dir) {
            Ok(parties) => parties,
            Err(e) => {
                error!("game directory '{game}' skipped: {e:#}");
                continue;
            }
        };
        info!(game = %game, party_directories = ?parties);

        let longest_name = parties
            .iter()
            .filter_map(|p| p.file_name())
            .fold(0, |acu, name| acu.max(name.len()))
            + 3; // at least 3 dots

        for party_dir in parties {
            let Some(party) = dir_name(&party_dir) else {
                warn!("Not a directory: '{}'", party_dir.display());
                continue;
            };
            if verbose {
                print!("Collecting {game}/{party:·<longest_name$} ");
                let _ = std::io::stdout().flush(); // try to flush stdout
            }

            let submissions = match collect_submissions(&party_dir) {
                Ok(submissions) => submissions,
                Err(e) => {
                    error!("agent collection failed: {e:#}");
                    if verbose {
                        println!("{RED}{e}{RESET}");
                    }
                    continue;
                }
            };

            let count = submissions.len();
            for (path, created_at) in submissions {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let handle = ProcessHandle::new(&path, config.action_timeout)
                    .with_debug_stderr(config.debug_agent_stderr);
                registry.submit(&party, &game, name, created_at, Arc::new(handle));
            }

            if verbose {
                if count == 0 {
                    println!("{YELLOW}No submission{RESET}");
                } else {
                    println!("{GREEN}Ok{RESET} ({count} submission(s))");
                }
            }
        }
    }

    Ok(registry)
}

/// Entries of `dir`, sorted by path
fn sorted_entries(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("cannot read '{}'", dir.display()))?
        .filter_map(|item| item.ok().map(|e| e.path()))
        .collect::<Vec<_>>();
    entries.sort();
    Ok(entries)
}

/// Name of `path` if it is a directory with a UTF-8 name
fn dir_name(path: &Path) -> Option<String> {
    if !path.is_dir() {
        return None;
    }
    path.file_name()?.to_str().map(str::to_owned)
}

/// Valid submissions of one party directory, in file name order
#[instrument]
fn collect_submissions(dir: &Path) -> anyhow::Result<Vec<(PathBuf, OffsetDateTime)>> {
    let mut submissions = vec![];
    for path in sorted_entries(dir)? {
        match check_submission(&path) {
            Ok(created_at) => submissions.push((path, created_at)),
            Err(e) => warn!("submission skipped: {e:#}"),
        }
    }
    Ok(submissions)
}

/// Validates one submission file and returns its creation time
fn check_submission(path: &Path) -> anyhow::Result<OffsetDateTime> {
    let metadata = path
        .metadata()
        .with_context(|| format!("cannot read metadata of {path:?}"))?;
    if !metadata.is_file() {
        bail!("{path:?} is not a file");
    }
    if path.file_name().and_then(|n| n.to_str()).is_none() {
        bail!("name error: {path:?}");
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if metadata.permissions().mode() & 0o111 == 0 {
            bail!("{path:?} is not executable");
        }
    }
    let modified = metadata
        .modified()
        .with_context(|| format!("no modification time for {path:?}"))?;
    Ok(OffsetDateTime::from(modified))
}

#[cfg(all(test, unix))]
mod tests {
    use std::fs::{self, File};
    use std::os::unix::fs::PermissionsExt;
    use std::time::{Duration, SystemTime};

    use super::*;

    fn write(path: &Path, mode: u32, modified: SystemTime) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "#!/bin/sh\nexit 0\n").unwrap();
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(modified)
            .unwrap();
    }

    #[test]
    fn layout_and_latest_submission() {
        let root = std::env::temp_dir().join(format!("agent-tournament-collect-{}", std::process::id()));
        let _ = fs::remove_dir_all(&root);
        let t0 = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let t1 = t0 + Duration::from_secs(60);

        write(&root.join("rps/group1/agent_v1"), 0o755, t0);
        write(&root.join("rps/group1/agent_v2"), 0o755, t1);
        // same time as v2, greater name
        write(&root.join("rps/group1/agent_v3"), 0o755, t1);
        write(&root.join("rps/group2/notes.txt"), 0o644, t1);
        write(&root.join("rps/group3/bot"), 0o700, t0);
        write(&root.join("conn4/group1/c4"), 0o755, t0);
        fs::write(root.join("rps/README"), "not a party").unwrap();

        let registry = collect_agents(&root, Configuration::new().with_verbose(false)).unwrap();
        assert_eq!(registry.parties("rps"), vec!["group1".to_owned(), "group3".to_owned()]);
        assert_eq!(registry.latest("group1", "rps").unwrap().name, "agent_v3");
        assert!(registry.resolve("group2", "rps").is_err());
        assert_eq!(registry.parties("conn4"), vec!["group1".to_owned()]);

        assert!(collect_agents(root.join("rps/README"), Configuration::new().with_verbose(false)).is_err());
        fs::remove_dir_all(root).unwrap();
    }
}
