//! Sliding-window brute-force guard for credential checks.
//!
//! Each identity moves through `Clean -> Counting -> Locked` as failures
//! accumulate (see [`LoginAttempt::state`]). The throttle is consulted
//! before any credential comparison. When its own storage fails, the
//! configured [`ThrottleMode`] decides whether logins proceed unthrottled
//! or are refused.

use serde::Serialize;

use crate::config::{ThrottleMode, ThrottlePolicy};
use crate::db::AttemptRepo;
use crate::error::{AppError, Result};
use crate::models::{AttemptState, FailureTransition, LoginAttempt};
use crate::security::now_ms;

/// Answer to "may this identity try a credential now?"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThrottleStatus {
    pub blocked: bool,
    pub remaining_ms: i64,
    pub attempts: u32,
}

impl ThrottleStatus {
    fn clean() -> Self {
        Self {
            blocked: false,
            remaining_ms: 0,
            attempts: 0,
        }
    }
}

/// What recording one failure did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FailureOutcome {
    pub locked: bool,
    pub attempts: u32,
    /// Remaining lockout when `locked`, otherwise 0
    pub lockout_ms: i64,
}

pub struct AttemptThrottle<'a> {
    repo: &'a dyn AttemptRepo,
    policy: &'a ThrottlePolicy,
}

impl<'a> AttemptThrottle<'a> {
    pub fn new(repo: &'a dyn AttemptRepo, policy: &'a ThrottlePolicy) -> Self {
        Self { repo, policy }
    }

    /// Map a storage failure according to the configured mode
    fn degrade<T>(&self, err: AppError, fallback: T, action: &str) -> Result<T> {
        match self.policy.mode {
            ThrottleMode::FailOpen => {
                tracing::warn!(
                    "Login throttle unavailable during {} (failing open): {}",
                    action,
                    err
                );
                Ok(fallback)
            }
            ThrottleMode::FailClosed => {
                tracing::error!("Login throttle unavailable during {}: {}", action, err);
                Err(AppError::SubsystemUnavailable(
                    "Login throttle is unavailable".to_string(),
                ))
            }
        }
    }

    pub async fn check(&self, identity: &str) -> Result<ThrottleStatus> {
        self.check_at(identity, now_ms()).await
    }

    pub async fn check_at(&self, identity: &str, now: i64) -> Result<ThrottleStatus> {
        let record = match self.repo.load_attempt(identity).await {
            Ok(record) => record,
            Err(err) => return self.degrade(err, ThrottleStatus::clean(), "check"),
        };

        let status = match record.map(|r| r.state(now, self.policy)) {
            Some(AttemptState::Locked {
                remaining_ms,
                attempts,
            }) => ThrottleStatus {
                blocked: true,
                remaining_ms,
                attempts,
            },
            Some(AttemptState::Counting { attempts }) => ThrottleStatus {
                blocked: false,
                remaining_ms: 0,
                attempts,
            },
            Some(AttemptState::Clean) | None => ThrottleStatus::clean(),
        };
        Ok(status)
    }

    pub async fn record_failure(&self, identity: &str) -> Result<FailureOutcome> {
        self.record_failure_at(identity, now_ms()).await
    }

    pub async fn record_failure_at(&self, identity: &str, now: i64) -> Result<FailureOutcome> {
        let unrecorded = FailureOutcome {
            locked: false,
            attempts: 0,
            lockout_ms: 0,
        };

        let current = match self.repo.load_attempt(identity).await {
            Ok(current) => current,
            Err(err) => return self.degrade(err, unrecorded, "record"),
        };

        let next = match LoginAttempt::after_failure(current.as_ref(), identity, now, self.policy)
        {
            FailureTransition::StillLocked {
                remaining_ms,
                attempts,
            } => {
                return Ok(FailureOutcome {
                    locked: true,
                    attempts,
                    lockout_ms: remaining_ms,
                })
            }
            FailureTransition::Record(next) => next,
        };

        if let Err(err) = self.repo.save_attempt(&next).await {
            return self.degrade(err, unrecorded, "record");
        }

        Ok(FailureOutcome {
            locked: next.is_locked(now),
            attempts: next.attempts,
            lockout_ms: next.remaining_lockout_ms(now),
        })
    }

    /// Forget an identity's failures (after a successful login)
    pub async fn clear(&self, identity: &str) -> Result<()> {
        match self.repo.delete_attempt(identity).await {
            Ok(()) => Ok(()),
            Err(err) => self.degrade(err, (), "clear"),
        }
    }
}
