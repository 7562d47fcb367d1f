use serde::{Deserialize, Serialize};

use crate::config::ThrottlePolicy;

/// Failed-login record for one identity (caller IP)
///
/// Timestamps are epoch milliseconds; `locked_until == 0` means not locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LoginAttempt {
    pub identity: String,
    /// Failures counted in the current window
    pub attempts: u32,
    /// Start of the current counting window
    pub first_attempt: i64,
    pub locked_until: i64,
}

/// Where an identity currently sits in the throttle state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// No record, lapsed window, or expired lock
    Clean,
    Counting { attempts: u32 },
    Locked { remaining_ms: i64, attempts: u32 },
}

/// Result of applying one failed credential check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureTransition {
    /// Identity is locked; the record must not be touched
    StillLocked { remaining_ms: i64, attempts: u32 },
    /// New record state to persist
    Record(LoginAttempt),
}

impl LoginAttempt {
    /// Start a fresh window with one failure
    pub fn first(identity: &str, now: i64) -> Self {
        Self {
            identity: identity.to_string(),
            attempts: 1,
            first_attempt: now,
            locked_until: 0,
        }
    }

    pub fn is_locked(&self, now: i64) -> bool {
        self.locked_until > now
    }

    pub fn remaining_lockout_ms(&self, now: i64) -> i64 {
        (self.locked_until - now).max(0)
    }

    /// Classify the record at `now`
    pub fn state(&self, now: i64, policy: &ThrottlePolicy) -> AttemptState {
        if self.is_locked(now) {
            return AttemptState::Locked {
                remaining_ms: self.remaining_lockout_ms(now),
                attempts: self.attempts,
            };
        }

        // An expired lock starts over, as does a lapsed window
        if self.locked_until != 0 || now - self.first_attempt > policy.window_ms {
            return AttemptState::Clean;
        }

        AttemptState::Counting {
            attempts: self.attempts,
        }
    }

    /// Apply a failed credential check to the current record (if any)
    pub fn after_failure(
        current: Option<&LoginAttempt>,
        identity: &str,
        now: i64,
        policy: &ThrottlePolicy,
    ) -> FailureTransition {
        let state = current
            .map(|record| record.state(now, policy))
            .unwrap_or(AttemptState::Clean);

        let mut next = match (state, current) {
            (AttemptState::Locked { remaining_ms, attempts }, _) => {
                return FailureTransition::StillLocked {
                    remaining_ms,
                    attempts,
                };
            }
            (AttemptState::Counting { attempts }, Some(record)) => LoginAttempt {
                attempts: attempts.saturating_add(1),
                ..record.clone()
            },
            _ => LoginAttempt::first(identity, now),
        };

        if next.attempts >= policy.max_attempts {
            next.locked_until = now + policy.lockout_ms;
            tracing::warn!(
                "Identity {} locked out after {} failed attempts",
                identity,
                next.attempts
            );
        }

        FailureTransition::Record(next)
    }
}
