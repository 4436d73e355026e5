use std::{fmt::Debug, hash::Hash, sync::Arc};

use crate::game_interface::{Agent, FnAgent};

/// Something able to build fresh agent instances, one per match.
pub trait AgentHandle: Send + Sync {
    /// Builds a new, independent agent instance
    fn instantiate(&self) -> anyhow::Result<Box<dyn Agent>>;
}

/// [`AgentHandle`] backed by a closure.
pub struct FnHandle<F>(F);

impl<F> FnHandle<F>
where
    F: Fn() -> anyhow::Result<Box<dyn Agent>> + Send + Sync,
{
    /// Wraps `factory` into a handle
    pub fn new(factory: F) -> Self {
        Self(factory)
    }
}

impl<F> AgentHandle for FnHandle<F>
where
    F: Fn() -> anyhow::Result<Box<dyn Agent>> + Send + Sync,
{
    fn instantiate(&self) -> anyhow::Result<Box<dyn Agent>> {
        (self.0)()
    }
}

/// Handle building a [`FnAgent`] from a cloneable closure, for baselines and tests.
pub fn handle_from_fn<F>(select_action: F) -> Arc<dyn AgentHandle>
where
    F: FnMut(&str) -> anyhow::Result<String> + Clone + Send + Sync + 'static,
{
    Arc::new(FnHandle::new(move || {
        Ok(Box::new(FnAgent::new(select_action.clone())) as Box<dyn Agent>)
    }))
}

/// A competing party together with its resolved agent for one game.
///
/// Immutable for the whole tournament.
#[derive(Clone)]
pub struct Participant {
    /// Party (group) identifier, unique within a tournament
    pub party: String,
    /// Human readable name of the submission
    pub name: String,
    /// Identifier of the resolved submission
    pub submission_id: u64,
    handle: Arc<dyn AgentHandle>,
}

impl Participant {
    /// Participant of `party` playing with the submission `submission_id`
    pub fn new(
        party: impl Into<String>,
        name: impl Into<String>,
        submission_id: u64,
        handle: Arc<dyn AgentHandle>,
    ) -> Participant {
        Participant {
            party: party.into(),
            name: name.into(),
            submission_id,
            handle,
        }
    }

    /// A fresh agent instance for one match
    pub fn instantiate(&self) -> anyhow::Result<Box<dyn Agent>> {
        self.handle.instantiate()
    }
}

impl Debug for Participant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Participant")
            .field("party", &self.party)
            .field("name", &self.name)
            .field("submission_id", &self.submission_id)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Participant {
    fn eq(&self, other: &Self) -> bool {
        self.party == other.party
    }
}

impl Eq for Participant {}

impl Hash for Participant {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.party.hash(state);
    }
}
