//! Participant actions and the action ledger.
//!
//! The scheme raises obligations on the participant — write a checkpoint,
//! read a checkpoint back, provide initial data — and the participant must
//! acknowledge each one before the next synchronization point. The ledger
//! tracks both sides and reports what is missing.

use std::collections::BTreeSet;
use std::fmt;

/// A named obligation on the participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// Save solver state so the current window can be replayed.
    WriteCheckpoint,
    /// Restore solver state; the window did not converge and is repeated.
    ReadCheckpoint,
    /// Provide initial data before the first exchange.
    InitializeData,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteCheckpoint => write!(f, "write-checkpoint"),
            Self::ReadCheckpoint => write!(f, "read-checkpoint"),
            Self::InitializeData => write!(f, "initialize-data"),
        }
    }
}

/// Tracks required and fulfilled actions across one coupling cycle.
///
/// Both sets are cleared together when a completeness check passes; a
/// failed check leaves the ledger untouched (the scheme treats it as
/// fatal).
#[derive(Debug, Default)]
pub struct ActionLedger {
    required: BTreeSet<Action>,
    fulfilled: BTreeSet<Action>,
}

impl ActionLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise an obligation. Idempotent within a cycle.
    pub fn require(&mut self, action: Action) {
        self.required.insert(action);
    }

    /// Whether the participant currently has to perform `action`.
    pub fn is_required(&self, action: Action) -> bool {
        self.required.contains(&action)
    }

    /// Whether `action` has been acknowledged this cycle.
    pub fn is_fulfilled(&self, action: Action) -> bool {
        self.fulfilled.contains(&action)
    }

    /// Acknowledge an obligation.
    ///
    /// Returns `false` if `action` was never required this cycle; the
    /// caller decides how to surface that misuse.
    pub fn mark_fulfilled(&mut self, action: Action) -> bool {
        if !self.required.contains(&action) {
            return false;
        }
        self.fulfilled.insert(action);
        true
    }

    /// Required actions not yet fulfilled, in stable order.
    pub fn missing(&self) -> Vec<Action> {
        self.required.difference(&self.fulfilled).copied().collect()
    }

    /// Check that every required action was fulfilled.
    ///
    /// On success both sets are cleared for the next cycle. On failure the
    /// missing actions are returned and the ledger is left as-is.
    pub fn check_completeness(&mut self) -> Result<(), Vec<Action>> {
        let missing = self.missing();
        if !missing.is_empty() {
            return Err(missing);
        }
        self.required.clear();
        self.fulfilled.clear();
        Ok(())
    }

    /// Required actions in stable order, for state printing.
    pub fn required(&self) -> impl Iterator<Item = Action> + '_ {
        self.required.iter().copied()
    }
}
