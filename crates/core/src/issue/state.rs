//! Issue lifecycle state and its transition table.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Position of an [`Issue`](super::Issue) in its lifecycle.
///
/// The empty string is never a valid state; every variant round-trips
/// through [`IssueState::as_str`] / [`FromStr`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum IssueState {
    /// Admitted but not yet embedded or deduplicated.
    Pending,
    /// Actionable; available to workers.
    Open,
    /// A worker has claimed this issue and is working it.
    InProgress,
    /// Resolved.
    Done,
    /// A previously `done` issue whose fix did not hold.
    Revert,
    /// Terminal; no longer actionable, screenshots released.
    Closed,
}

impl IssueState {
    /// Returns the string representation of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match *self {
            Self::Pending => "pending",
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Revert => "revert",
            Self::Closed => "closed",
        }
    }

    /// Whether a worker-facing "start progress" transition is legal from
    /// this state (`open` or `revert` only).
    #[must_use]
    pub const fn can_start_progress(&self) -> bool {
        matches!(self, Self::Open | Self::Revert)
    }

    /// Whether a "set done" transition is legal from this state
    /// (`open` or `in_progress` only).
    #[must_use]
    pub const fn can_set_done(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    /// Whether a "revert" transition is legal from this state (`done` only).
    #[must_use]
    pub const fn can_revert(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Whether a forced reopen is legal from this state (any state but
    /// `open` itself — reopening an already-open issue is a no-op guard
    /// rejection, not an error, handled by the caller).
    #[must_use]
    pub const fn can_reopen(&self) -> bool {
        !matches!(self, Self::Open)
    }

    /// Whether a close transition is legal from this state (any state but
    /// `closed` itself).
    #[must_use]
    pub const fn can_close(&self) -> bool {
        !matches!(self, Self::Closed)
    }
}

/// Every state, used by [`IssueState::allowed_for`] to turn a guard
/// predicate into the list of states it allows.
pub const ALL: [IssueState; 6] = [
    IssueState::Pending,
    IssueState::Open,
    IssueState::InProgress,
    IssueState::Done,
    IssueState::Revert,
    IssueState::Closed,
];

impl IssueState {
    /// States from which `guard` allows the transition, as their wire
    /// representations. Lets a guarded `UPDATE ... WHERE state = ANY(...)`
    /// derive its allowed-state list from the same predicate the
    /// in-process `can_*` guards use, rather than a second hand-written
    /// literal that can drift out of sync with it.
    #[must_use]
    pub fn allowed_for(guard: impl Fn(&IssueState) -> bool) -> Vec<&'static str> {
        ALL.iter().filter(|state| guard(state)).map(IssueState::as_str).collect()
    }
}

impl FromStr for IssueState {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "done" => Ok(Self::Done),
            "revert" => Ok(Self::Revert),
            "closed" => Ok(Self::Closed),
            other => Err(CoreError::InvalidIssueState(other.to_owned())),
        }
    }
}

impl std::fmt::Display for IssueState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for state in [
            IssueState::Pending,
            IssueState::Open,
            IssueState::InProgress,
            IssueState::Done,
            IssueState::Revert,
            IssueState::Closed,
        ] {
            assert_eq!(IssueState::from_str(state.as_str()).unwrap(), state);
        }
    }

    #[test]
    fn start_progress_only_from_open_or_revert() {
        assert!(IssueState::Open.can_start_progress());
        assert!(IssueState::Revert.can_start_progress());
        assert!(!IssueState::Pending.can_start_progress());
        assert!(!IssueState::Done.can_start_progress());
        assert!(!IssueState::InProgress.can_start_progress());
        assert!(!IssueState::Closed.can_start_progress());
    }

    #[test]
    fn set_done_only_from_open_or_in_progress() {
        assert!(IssueState::Open.can_set_done());
        assert!(IssueState::InProgress.can_set_done());
        assert!(!IssueState::Pending.can_set_done());
        assert!(!IssueState::Done.can_set_done());
        assert!(!IssueState::Revert.can_set_done());
        assert!(!IssueState::Closed.can_set_done());
    }

    #[test]
    fn revert_only_from_done() {
        assert!(IssueState::Done.can_revert());
        assert!(!IssueState::Open.can_revert());
        assert!(!IssueState::Pending.can_revert());
    }

    #[test]
    fn reopen_rejected_only_from_open() {
        assert!(!IssueState::Open.can_reopen());
        for state in [
            IssueState::Pending,
            IssueState::InProgress,
            IssueState::Done,
            IssueState::Revert,
            IssueState::Closed,
        ] {
            assert!(state.can_reopen());
        }
    }

    #[test]
    fn allowed_for_matches_the_guard_it_was_built_from() {
        let allowed = IssueState::allowed_for(IssueState::can_start_progress);
        assert_eq!(allowed, vec!["open", "revert"]);

        let allowed = IssueState::allowed_for(IssueState::can_reopen);
        assert_eq!(allowed, vec!["pending", "in_progress", "done", "revert", "closed"]);
    }

    #[test]
    fn close_rejected_only_from_closed() {
        assert!(!IssueState::Closed.can_close());
        for state in [
            IssueState::Pending,
            IssueState::Open,
            IssueState::InProgress,
            IssueState::Done,
            IssueState::Revert,
        ] {
            assert!(state.can_close());
        }
    }
}
