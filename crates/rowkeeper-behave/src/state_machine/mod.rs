//! Finite state machines enforced by database triggers.
//!
//! An entity with the [`Stateful`](crate::behavior::BehaviorKind::Stateful)
//! behavior keeps its current state in a `machine_state` column. The rules
//! live in the shared `state_machine` table, one row per entity:
//!
//! - `states`: every legal value (empty means any value is legal)
//! - `entry_states`: legal first values (empty means any state)
//! - `transitions`: legal `{"from", "to"}` moves (empty means any move)
//! - `default_state`: assigned when a row is inserted without a state
//!
//! The generated triggers reject violating writes, stamp `stated_at` on
//! every effective state change and append one row per change to the
//! `state_machine_queue` table for downstream consumers.

mod store;
pub(crate) mod triggers;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{BehaveError, Result};

pub use store::{
    StateTransition, load_definition, save_definition, schema_sql, transitions_for,
};

/// Rejection message: no `state_machine` row exists for the entity.
pub const MSG_DEFINITION_MISSING: &str = "State machine definition is missing";
/// Rejection message: inserted state is not an entry state.
pub const MSG_INVALID_ENTRY_STATE: &str = "Invalid machine_state, should be one of entry_states";
/// Rejection message: inserted state is not a known state.
pub const MSG_INVALID_STATE: &str = "Invalid machine_state, should be one of states";
/// Rejection message: updated state is not a known state.
pub const MSG_INVALID_NEW_STATE: &str = "New state is not a valid state definition";
/// Rejection message: the `(old, new)` pair is not a listed transition.
pub const MSG_NO_TRANSITION: &str = "No transition available from old state to new one";
/// Rejection message: a set state was cleared.
pub const MSG_NULL_CLEAR: &str = "UPDATE cannot set machine_state to NULL";
/// Rejection message: first assignment by update is not an entry state.
pub const MSG_ENTRY_REQUIRED: &str = "UPDATE must assign an entry state, as old state is NULL";

const VIOLATIONS: [(&str, ViolationReason); 7] = [
    (MSG_DEFINITION_MISSING, ViolationReason::MissingDefinition),
    (MSG_INVALID_ENTRY_STATE, ViolationReason::InvalidEntryState),
    (MSG_INVALID_STATE, ViolationReason::InvalidState),
    (MSG_INVALID_NEW_STATE, ViolationReason::InvalidState),
    (MSG_NO_TRANSITION, ViolationReason::InvalidTransition),
    (MSG_NULL_CLEAR, ViolationReason::IllegalNullClear),
    (MSG_ENTRY_REQUIRED, ViolationReason::MissingEntryAssignment),
];

/// A permitted move between two states.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Transition {
    /// State being left.
    pub from: String,
    /// State being entered.
    pub to: String,
}

impl Transition {
    /// Creates a transition.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// One entity's state machine, as stored in the `state_machine` table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMachineDefinition {
    /// Entity (table) the machine governs.
    #[serde(default)]
    pub entity: String,
    /// State assigned when a row is inserted without one.
    #[serde(default)]
    pub default_state: Option<String>,
    /// Legal first states; empty means every state.
    #[serde(default)]
    pub entry_states: BTreeSet<String>,
    /// Universe of legal states; empty means any value.
    #[serde(default)]
    pub states: BTreeSet<String>,
    /// Legal moves; empty means any move between legal states.
    #[serde(default)]
    pub transitions: BTreeSet<Transition>,
}

impl StateMachineDefinition {
    /// Creates an open definition (no restrictions) for an entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            ..Self::default()
        }
    }

    /// Sets the default state.
    #[must_use]
    pub fn default_state(mut self, state: impl Into<String>) -> Self {
        self.default_state = Some(state.into());
        self
    }

    /// Adds legal states.
    #[must_use]
    pub fn states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Adds entry states.
    #[must_use]
    pub fn entry_states<I, S>(mut self, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entry_states.extend(states.into_iter().map(Into::into));
        self
    }

    /// Adds a legal transition.
    #[must_use]
    pub fn transition(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.transitions.insert(Transition::new(from, to));
        self
    }

    /// Returns whether `state` is accepted as a value at all.
    #[must_use]
    pub fn accepts_state(&self, state: &str) -> bool {
        self.states.is_empty() || self.states.contains(state)
    }

    /// Returns whether `state` is accepted as a first value.
    #[must_use]
    pub fn accepts_entry(&self, state: &str) -> bool {
        self.entry_states.is_empty() || self.entry_states.contains(state)
    }

    /// Returns whether moving from `from` to `to` is allowed.
    #[must_use]
    pub fn accepts_transition(&self, from: &str, to: &str) -> bool {
        self.accepts_state(to)
            && (self.transitions.is_empty()
                || self.transitions.contains(&Transition::new(from, to)))
    }

    /// Checks that the default, entry states and transitions only name
    /// known states.
    ///
    /// A restricted entry set must also contain the default state: a
    /// default is applied as the row's first state.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| BehaveError::InvalidDefinition {
            entity: self.entity.clone(),
            reason,
        };

        if let Some(default) = &self.default_state {
            if !self.accepts_state(default) {
                return Err(invalid(format!(
                    "default state '{default}' is not one of the states"
                )));
            }
            if !self.accepts_entry(default) {
                return Err(invalid(format!(
                    "default state '{default}' is not one of the entry states"
                )));
            }
        }

        if let Some(entry) = self.entry_states.iter().find(|s| !self.accepts_state(s)) {
            return Err(invalid(format!(
                "entry state '{entry}' is not one of the states"
            )));
        }

        if let Some(t) = self
            .transitions
            .iter()
            .find(|t| !self.accepts_state(&t.from) || !self.accepts_state(&t.to))
        {
            return Err(invalid(format!(
                "transition '{}' -> '{}' names an unknown state",
                t.from, t.to
            )));
        }

        Ok(())
    }
}

/// Why a write was rejected by the state machine triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationReason {
    /// No definition row exists for the entity.
    MissingDefinition,
    /// An inserted state is not an entry state.
    InvalidEntryState,
    /// A state is not one of the known states.
    InvalidState,
    /// The move is not a listed transition.
    InvalidTransition,
    /// A set state was cleared to NULL.
    IllegalNullClear,
    /// The first assignment by update is not an entry state.
    MissingEntryAssignment,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::MissingDefinition => "missing definition",
            Self::InvalidEntryState => "invalid entry state",
            Self::InvalidState => "invalid state",
            Self::InvalidTransition => "invalid transition",
            Self::IllegalNullClear => "illegal null-clear",
            Self::MissingEntryAssignment => "missing entry assignment",
        };
        f.write_str(text)
    }
}

/// A write rejected by the state machine triggers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("state machine violation ({reason}): {message}")]
pub struct StateMachineViolation {
    /// Classified reason.
    pub reason: ViolationReason,
    /// Message raised by the trigger.
    pub message: String,
}

impl StateMachineViolation {
    /// Classifies a database error message raised by a stateful trigger.
    ///
    /// Drivers may prefix or suffix the raised text, so the known messages
    /// are matched as substrings.
    #[must_use]
    pub fn from_message(message: &str) -> Option<Self> {
        VIOLATIONS
            .iter()
            .find(|(text, _)| message.contains(text))
            .map(|(text, reason)| Self {
                reason: *reason,
                message: (*text).to_string(),
            })
    }

    /// Classifies a rejected sqlx write, if it was a state machine violation.
    #[must_use]
    pub fn from_sqlx(error: &sqlx::Error) -> Option<Self> {
        match error {
            sqlx::Error::Database(db) => Self::from_message(db.message()),
            _ => None,
        }
    }
}
