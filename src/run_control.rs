//! Cancellation and the advisory single-run-per-game lock.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::error::TournamentError;

/// Requests a running tournament to stop. Cheap to clone, all clones share one flag.
///
/// The request is honoured between rounds, never in the middle of a match.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    /// A handle not aborted yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the run to stop after the current round
    pub fn abort(&self) {
        info!("abort requested");
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// True once [`abort`](Self::abort) was called
    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}

/// Set of games currently being run. Shared between evaluators through clones.
#[derive(Debug, Clone, Default)]
pub struct RunLocks {
    running: Arc<Mutex<HashSet<String>>>,
}

impl RunLocks {
    /// No game locked
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lock of `game` until the returned guard is dropped.
    ///
    /// # Errors
    /// [`TournamentError::AlreadyRunning`] if a run of `game` holds it.
    pub fn acquire(&self, game: &str) -> Result<RunGuard, TournamentError> {
        let mut running = self
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !running.insert(game.to_owned()) {
            return Err(TournamentError::AlreadyRunning(game.to_owned()));
        }
        debug!(game, "run lock acquired");
        Ok(RunGuard {
            locks: self.clone(),
            game: game.to_owned(),
        })
    }

    /// True while a run of `game` holds the lock
    pub fn is_locked(&self, game: &str) -> bool {
        self.running
            .lock()
            .map(|r| r.contains(game))
            .unwrap_or(true)
    }
}

/// Releases the lock of its game on drop.
#[derive(Debug)]
pub struct RunGuard {
    locks: RunLocks,
    game: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut running = self
            .locks
            .running
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        running.remove(&self.game);
        debug!(game = %self.game, "run lock released");
    }
}
