use solana_sdk::signature::Signature;
use std::future::Future;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::core::connection::BoxError;
use crate::error::{classify_boxed, Result, WalletKitError};

/// State of one form's submission
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubmissionState<T = Signature> {
    #[default]
    Idle,
    Pending,
    Succeeded(T),
    Failed(WalletKitError),
}

impl<T> SubmissionState<T> {
    pub fn is_idle(&self) -> bool {
        matches!(self, SubmissionState::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, SubmissionState::Pending)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            SubmissionState::Succeeded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&WalletKitError> {
        match self {
            SubmissionState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Returned when a submit arrives while another one is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("A submission is already in flight")]
pub struct SubmissionInFlight;

/// Sequential state machine for a single form instance.
///
/// `Idle -> Pending -> Succeeded | Failed`, and from a settled state straight
/// back to `Pending` on the next submit. At most one submission is pending
/// at a time; a submit that arrives while one is pending is rejected and its
/// operation is never started. A pending submission cannot be cancelled.
pub struct SubmissionController<T = Signature> {
    name: &'static str,
    state: watch::Sender<SubmissionState<T>>,
}

impl<T> SubmissionController<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self { name, state }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn state(&self) -> SubmissionState<T> {
        self.state.borrow().clone()
    }

    /// Observe state changes
    pub fn watch(&self) -> watch::Receiver<SubmissionState<T>> {
        self.state.subscribe()
    }

    /// Whether the UI trigger should be disabled
    pub fn is_pending(&self) -> bool {
        self.state.borrow().is_pending()
    }

    /// Close the error surface: `Failed -> Idle`
    pub fn dismiss_error(&self) {
        self.state.send_if_modified(|state| {
            if matches!(state, SubmissionState::Failed(_)) {
                *state = SubmissionState::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Close the success surface: `Succeeded -> Idle`
    pub fn dismiss_success(&self) {
        self.state.send_if_modified(|state| {
            if matches!(state, SubmissionState::Succeeded(_)) {
                *state = SubmissionState::Idle;
                true
            } else {
                false
            }
        });
    }

    /// Run one submission.
    ///
    /// `validate` runs first; if it fails the state becomes `Failed` without
    /// ever passing through `Pending` and `execute` is not called. Otherwise
    /// the state becomes `Pending`, clearing any previous error, and whatever
    /// `execute` returns is settled into `Succeeded` or a classified `Failed`.
    pub async fn submit<P, V, F, Fut>(
        &self,
        validate: V,
        execute: F,
    ) -> std::result::Result<SubmissionState<T>, SubmissionInFlight>
    where
        V: FnOnce() -> Result<P>,
        F: FnOnce(P) -> Fut,
        Fut: Future<Output = std::result::Result<T, BoxError>>,
    {
        if self.is_pending() {
            debug!(form = self.name, "submit ignored while pending");
            return Err(SubmissionInFlight);
        }

        let prepared = match validate() {
            Ok(prepared) => prepared,
            Err(error) => {
                debug!(form = self.name, %error, "submission rejected by validation");
                let failed = SubmissionState::Failed(error);
                if !self.transition_unless_pending(failed.clone()) {
                    return Err(SubmissionInFlight);
                }
                return Ok(failed);
            },
        };

        if !self.transition_unless_pending(SubmissionState::Pending) {
            debug!(form = self.name, "submit ignored while pending");
            return Err(SubmissionInFlight);
        }
        debug!(form = self.name, "submission pending");

        let mut guard = PendingGuard {
            name: self.name,
            state: &self.state,
            armed: true,
        };

        let settled = match execute(prepared).await {
            Ok(value) => {
                info!(form = self.name, "submission succeeded");
                SubmissionState::Succeeded(value)
            },
            Err(raw) => {
                let error = classify_boxed(raw);
                warn!(form = self.name, %error, "submission failed");
                SubmissionState::Failed(error)
            },
        };

        guard.armed = false;
        self.state.send_replace(settled.clone());
        Ok(settled)
    }

    fn transition_unless_pending(&self, next: SubmissionState<T>) -> bool {
        let mut applied = false;
        self.state.send_if_modified(|state| {
            if state.is_pending() {
                return false;
            }
            *state = next;
            applied = true;
            true
        });
        applied
    }
}

/// Settles the state if a pending submission's future is dropped before
/// completing, so the form is not left disabled forever.
struct PendingGuard<'a, T> {
    name: &'static str,
    state: &'a watch::Sender<SubmissionState<T>>,
    armed: bool,
}

impl<T> Drop for PendingGuard<'_, T> {
    fn drop(&mut self) {
        if self.armed {
            warn!(form = self.name, "pending submission dropped before completion");
            self.state.send_replace(SubmissionState::Failed(WalletKitError::Unknown {
                message: "The submission was interrupted".to_string(),
            }));
        }
    }
}
