//! Job lifecycle states and transition rules.
//!
//! States form a directed graph with explicit transition rules; the
//! validation here is pure and does no I/O. Every durable state change in
//! the system goes through [`validate_transition`] before it is written.

use diesel_derive_enum::DbEnum;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, DbEnum)]
#[db_enum(
    existing_type_path = "crate::schema::sql_types::JobState",
    value_style = "SCREAMING_SNAKE_CASE"
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Created but not yet picked up by the scheduler.
    Pending,
    /// Claimed by the scheduler, queued for a worker.
    Scheduled,
    /// Currently executing on a worker.
    Running,
    /// Completed successfully. Terminal.
    Succeeded,
    /// Exhausted all attempts. Terminal.
    Failed,
    /// Failed with attempts remaining; returns to the claim pool.
    Retrying,
    /// Explicitly cancelled. Terminal.
    Cancelled,
}

impl JobState {
    pub const ALL: [JobState; 7] = [
        JobState::Pending,
        JobState::Scheduled,
        JobState::Running,
        JobState::Succeeded,
        JobState::Failed,
        JobState::Retrying,
        JobState::Cancelled,
    ];

    /// Terminal states accept no outgoing transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Cancelled
        )
    }

    /// Whether `self -> to` is a legal transition.
    ///
    /// Self-transitions are never legal, and terminal states accept no
    /// outgoing transitions.
    pub fn can_transition_to(self, to: JobState) -> bool {
        if self == to || self.is_terminal() {
            return false;
        }

        match self {
            JobState::Pending => matches!(to, JobState::Scheduled | JobState::Cancelled),
            JobState::Scheduled => matches!(to, JobState::Running | JobState::Cancelled),
            JobState::Running => matches!(
                to,
                JobState::Succeeded | JobState::Failed | JobState::Retrying | JobState::Cancelled
            ),
            JobState::Retrying => matches!(to, JobState::Scheduled | JobState::Cancelled),
            _ => false,
        }
    }

    /// All legal target states from `self`. Empty for terminal states.
    pub fn allowed_transitions(self) -> Vec<JobState> {
        Self::ALL
            .into_iter()
            .filter(|to| self.can_transition_to(*to))
            .collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Scheduled => "SCHEDULED",
            JobState::Running => "RUNNING",
            JobState::Succeeded => "SUCCEEDED",
            JobState::Failed => "FAILED",
            JobState::Retrying => "RETRYING",
            JobState::Cancelled => "CANCELLED",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for state strings arriving over the wire (query params).
#[derive(Debug, Error)]
#[error("unknown job state: {0}")]
pub struct ParseJobStateError(pub String);

impl FromStr for JobState {
    type Err = ParseJobStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobState::Pending),
            "SCHEDULED" => Ok(JobState::Scheduled),
            "RUNNING" => Ok(JobState::Running),
            "SUCCEEDED" => Ok(JobState::Succeeded),
            "FAILED" => Ok(JobState::Failed),
            "RETRYING" => Ok(JobState::Retrying),
            "CANCELLED" => Ok(JobState::Cancelled),
            other => Err(ParseJobStateError(other.to_string())),
        }
    }
}

/// Rejection reasons for an illegal state transition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("self-transition not allowed: {state} -> {state}")]
    SelfTransition { state: JobState },

    #[error("cannot transition from terminal state {from} to {to}")]
    TerminalSource { from: JobState, to: JobState },

    #[error("invalid transition: {from} -> {to}")]
    Forbidden { from: JobState, to: JobState },
}

/// Validates `from -> to` against the transition table.
///
/// Returns the specific rejection kind so callers can distinguish a
/// terminal source from a merely absent edge.
pub fn validate_transition(from: JobState, to: JobState) -> Result<(), TransitionError> {
    if from == to {
        return Err(TransitionError::SelfTransition { state: from });
    }
    if from.is_terminal() {
        return Err(TransitionError::TerminalSource { from, to });
    }
    if !from.can_transition_to(to) {
        return Err(TransitionError::Forbidden { from, to });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(JobState::Succeeded.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(!JobState::Pending.is_terminal());
        assert!(!JobState::Scheduled.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(!JobState::Retrying.is_terminal());
    }

    #[test]
    fn full_transition_table() {
        use JobState::*;

        let allowed = [
            (Pending, Scheduled),
            (Pending, Cancelled),
            (Scheduled, Running),
            (Scheduled, Cancelled),
            (Running, Succeeded),
            (Running, Failed),
            (Running, Retrying),
            (Running, Cancelled),
            (Retrying, Scheduled),
            (Retrying, Cancelled),
        ];

        for from in JobState::ALL {
            for to in JobState::ALL {
                let expected = allowed.contains(&(from, to));
                assert_eq!(
                    from.can_transition_to(to),
                    expected,
                    "{from} -> {to} should be {expected}"
                );
                assert_eq!(validate_transition(from, to).is_ok(), expected);
            }
        }
    }

    #[test]
    fn self_transitions_rejected() {
        for state in JobState::ALL {
            assert!(!state.can_transition_to(state));
            assert_eq!(
                validate_transition(state, state),
                Err(TransitionError::SelfTransition { state })
            );
        }
    }

    #[test]
    fn terminal_source_reported() {
        assert_eq!(
            validate_transition(JobState::Failed, JobState::Retrying),
            Err(TransitionError::TerminalSource {
                from: JobState::Failed,
                to: JobState::Retrying
            })
        );
        assert_eq!(
            validate_transition(JobState::Succeeded, JobState::Pending),
            Err(TransitionError::TerminalSource {
                from: JobState::Succeeded,
                to: JobState::Pending
            })
        );
    }

    #[test]
    fn forbidden_edges_reported() {
        assert_eq!(
            validate_transition(JobState::Pending, JobState::Running),
            Err(TransitionError::Forbidden {
                from: JobState::Pending,
                to: JobState::Running
            })
        );
        assert_eq!(
            validate_transition(JobState::Pending, JobState::Succeeded),
            Err(TransitionError::Forbidden {
                from: JobState::Pending,
                to: JobState::Succeeded
            })
        );
        assert_eq!(
            validate_transition(JobState::Running, JobState::Pending),
            Err(TransitionError::Forbidden {
                from: JobState::Running,
                to: JobState::Pending
            })
        );
    }

    #[test]
    fn allowed_transitions_listing() {
        assert_eq!(
            JobState::Running.allowed_transitions(),
            vec![
                JobState::Succeeded,
                JobState::Failed,
                JobState::Retrying,
                JobState::Cancelled
            ]
        );
        assert!(JobState::Cancelled.allowed_transitions().is_empty());
    }

    #[test]
    fn parse_round_trip() {
        for state in JobState::ALL {
            assert_eq!(state.as_str().parse::<JobState>().unwrap(), state);
        }
        assert!("pending".parse::<JobState>().is_err());
        assert!("UNKNOWN".parse::<JobState>().is_err());
    }

    #[test]
    fn serde_wire_form() {
        assert_eq!(
            serde_json::to_string(&JobState::Scheduled).unwrap(),
            "\"SCHEDULED\""
        );
        let back: JobState = serde_json::from_str("\"RETRYING\"").unwrap();
        assert_eq!(back, JobState::Retrying);
    }
}
