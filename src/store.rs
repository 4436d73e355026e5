//! Result storage, keyed by tournament run identifier.
//!
//! The engine writes every [`MatchRecord`] as soon as it is known, then a standings snapshot.
//! Writes are at-least-once: a retried write may store the same record twice, which is why
//! loading deduplicates records by their `sequence`.

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::Value;
use tracing::{debug, warn};

use crate::match_record::MatchRecord;

/// Durable storage of match records and standings snapshots.
pub trait ResultStore: Send + Sync {
    /// Appends one match record of `run_id`
    fn save_match(&self, run_id: &str, record: &MatchRecord) -> io::Result<()>;

    /// Replaces the standings snapshot of `run_id`
    fn save_standings(&self, run_id: &str, standings: &Value) -> io::Result<()>;

    /// Every record stored for `run_id`, deduplicated and sorted by sequence
    fn load_matches(&self, run_id: &str) -> io::Result<Vec<MatchRecord>>;

    /// Last standings snapshot of `run_id`
    fn load_standings(&self, run_id: &str) -> io::Result<Option<Value>>;
}

fn dedup(records: impl IntoIterator<Item = MatchRecord>) -> Vec<MatchRecord> {
    records
        .into_iter()
        .map(|r| (r.sequence, r))
        .collect::<BTreeMap<_, _>>()
        .into_values()
        .collect()
}

#[derive(Default)]
struct Run {
    matches: Vec<MatchRecord>,
    standings: Option<Value>,
}

/// Volatile store, for tests and embedding.
#[derive(Default)]
pub struct MemoryStore {
    runs: Mutex<HashMap<String, Run>>,
}

impl MemoryStore {
    /// An empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Identifiers of the runs stored so far, sorted
    pub fn runs(&self) -> Vec<String> {
        let mut runs = self
            .runs
            .lock()
            .map(|r| r.keys().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        runs.sort();
        runs
    }

    fn with_run<T>(&self, run_id: &str, f: impl FnOnce(&mut Run) -> T) -> io::Result<T> {
        let mut runs = self
            .runs
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "memory store poisoned"))?;
        Ok(f(runs.entry(run_id.to_owned()).or_default()))
    }
}

impl ResultStore for MemoryStore {
    fn save_match(&self, run_id: &str, record: &MatchRecord) -> io::Result<()> {
        self.with_run(run_id, |run| run.matches.push(record.clone()))
    }

    fn save_standings(&self, run_id: &str, standings: &Value) -> io::Result<()> {
        self.with_run(run_id, |run| run.standings = Some(standings.clone()))
    }

    fn load_matches(&self, run_id: &str) -> io::Result<Vec<MatchRecord>> {
        self.with_run(run_id, |run| dedup(run.matches.iter().cloned()))
    }

    fn load_standings(&self, run_id: &str) -> io::Result<Option<Value>> {
        self.with_run(run_id, |run| run.standings.clone())
    }
}

/// Store writing under a root directory:
/// - `<root>/<run_id>/matches.jsonl`: one JSON record per line, append only
/// - `<root>/<run_id>/standings.json`: pretty printed snapshot, replaced on every save
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    const MATCHES: &'static str = "matches.jsonl";
    const STANDINGS: &'static str = "standings.json";

    /// Creates `root` if needed.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn run_dir(&self, run_id: &str) -> io::Result<PathBuf> {
        if run_id.is_empty() || run_id.contains(['/', '\\']) || run_id.starts_with('.') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid run identifier '{run_id}'"),
            ));
        }
        Ok(self.root.join(run_id))
    }
}

impl ResultStore for JsonFileStore {
    fn save_match(&self, run_id: &str, record: &MatchRecord) -> io::Result<()> {
        let dir = self.run_dir(run_id)?;
        fs::create_dir_all(&dir)?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(dir.join(Self::MATCHES))?;
        // never glue a record to the partial line of an interrupted append
        if !ends_with_newline(&mut file)? {
            warn!(run_id, "terminating a partial record line");
            line.insert(0, '\n');
        }
        file.write_all(line.as_bytes())?;
        file.flush()
    }

    fn save_standings(&self, run_id: &str, standings: &Value) -> io::Result<()> {
        let dir = self.run_dir(run_id)?;
        fs::create_dir_all(&dir)?;
        // write then rename, a crash never leaves a truncated snapshot
        let tmp = dir.join(format!("{}.tmp", Self::STANDINGS));
        fs::write(&tmp, serde_json::to_string_pretty(standings)?)?;
        fs::rename(tmp, dir.join(Self::STANDINGS))
    }

    fn load_matches(&self, run_id: &str) -> io::Result<Vec<MatchRecord>> {
        let path = self.run_dir(run_id)?.join(Self::MATCHES);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e),
        };
        let mut records = vec![];
        for (n, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<MatchRecord>(&line) {
                Ok(record) => records.push(record),
                // an interrupted append leaves a partial last line
                Err(e) => warn!("{}:{}: skipping unreadable record: {e}", path.display(), n + 1),
            }
        }
        debug!(run_id, count = records.len(), "records loaded");
        Ok(dedup(records))
    }

    fn load_standings(&self, run_id: &str) -> io::Result<Option<Value>> {
        let path = self.run_dir(run_id)?.join(Self::STANDINGS);
        match fs::read_to_string(path) {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// True for an empty file
fn ends_with_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_record::{Decision, MatchOutcome, ScoringConvention};

    fn record(sequence: u32) -> MatchRecord {
        let outcome = MatchOutcome::decisive(0, 1);
        MatchRecord {
            sequence,
            round: Some(1),
            participants: vec!["a".into(), "b".into()],
            outcome: Some(outcome),
            decision: Decision::Regulation,
            advanced: Some("a".into()),
            score_deltas: ScoringConvention::Bracket.deltas(&outcome, 2),
            faults: vec![],
            trace: vec![],
        }
    }

    fn temp_root(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("agent-tournament-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn memory_store_deduplicates() {
        let store = MemoryStore::new();
        store.save_match("run", &record(1)).unwrap();
        store.save_match("run", &record(0)).unwrap();
        store.save_match("run", &record(1)).unwrap();
        let loaded = store.load_matches("run").unwrap();
        assert_eq!(loaded.iter().map(|r| r.sequence).collect::<Vec<_>>(), vec![0, 1]);
        assert!(store.load_matches("other").unwrap().is_empty());
        assert_eq!(store.runs(), vec!["other".to_owned(), "run".to_owned()]);
    }

    #[test]
    fn json_file_store() {
        let root = temp_root("store");
        let store = JsonFileStore::new(&root).unwrap();
        store.save_match("run-1", &record(0)).unwrap();
        store.save_match("run-1", &record(0)).unwrap();
        store.save_match("run-1", &record(1)).unwrap();
        // partial line of an interrupted write
        let mut file = OpenOptions::new()
            .append(true)
            .open(root.join("run-1").join("matches.jsonl"))
            .unwrap();
        file.write_all(b"{\"sequence\": 2, \"rou").unwrap();

        let loaded = store.load_matches("run-1").unwrap();
        assert_eq!(loaded, vec![record(0), record(1)]);

        assert_eq!(store.load_standings("run-1").unwrap(), None);
        let snapshot = serde_json::json!([{"rank": 1, "party": "a"}]);
        store.save_standings("run-1", &snapshot).unwrap();
        assert_eq!(store.load_standings("run-1").unwrap(), Some(snapshot));

        assert!(store.save_match("../escape", &record(0)).is_err());
        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn append_after_interrupted_write() {
        let root = temp_root("interrupted");
        let store = JsonFileStore::new(&root).unwrap();
        store.save_match("run-1", &record(0)).unwrap();
        let mut file = OpenOptions::new()
            .append(true)
            .open(root.join("run-1").join("matches.jsonl"))
            .unwrap();
        file.write_all(b"{\"sequence\": 1, \"rou").unwrap();

        // the retry of the interrupted write
        store.save_match("run-1", &record(1)).unwrap();
        store.save_match("run-1", &record(2)).unwrap();
        let loaded = store.load_matches("run-1").unwrap();
        assert_eq!(loaded, vec![record(0), record(1), record(2)]);
        fs::remove_dir_all(root).unwrap();
    }
}
