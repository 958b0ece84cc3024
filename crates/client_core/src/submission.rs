//! Request lifecycle for the single greet form.
//!
//! A [`SubmissionController`] turns one submit event into at most one in-flight
//! [`RemoteGreeter::greet`] call and reconciles the settled result into its
//! [`FormSurface`]. It is single-threaded by construction: state lives in a
//! `Cell`, so the controller is `!Sync` and overlapping submissions can only be
//! interleaved futures on one thread.

use std::{cell::Cell, time::Duration};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{GreetError, RemoteGreeter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Pending,
}

/// The user's submit action. The controller always marks it handled so the
/// hosting view never falls back to its own default submit behavior.
#[derive(Debug, Default)]
pub struct SubmitEvent {
    default_prevented: bool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Refused because another call was still pending.
    Ignored,
    Displayed(String),
    Failed(GreetError),
}

/// The two UI surfaces the controller owns, plus the field it reads.
pub trait FormSurface {
    fn name_value(&self) -> String;
    fn set_submit_enabled(&self, enabled: bool);
    fn write_greeting(&self, text: &str);
    /// Failures never go through `write_greeting`.
    fn report_failure(&self, error: &GreetError);
}

pub struct SubmissionController<G, S> {
    greeter: G,
    surface: S,
    state: Cell<SubmissionState>,
    call_timeout: Option<Duration>,
}

impl<G, S> SubmissionController<G, S>
where
    G: RemoteGreeter,
    S: FormSurface,
{
    pub fn new(greeter: G, surface: S) -> Self {
        Self {
            greeter,
            surface,
            state: Cell::new(SubmissionState::Idle),
            call_timeout: None,
        }
    }

    /// Expiry settles the call as a transport failure.
    pub fn with_call_timeout(mut self, call_timeout: Option<Duration>) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn state(&self) -> SubmissionState {
        self.state.get()
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub async fn submit(&self, event: &mut SubmitEvent) -> SubmitOutcome {
        event.prevent_default();

        if self.state.get() == SubmissionState::Pending {
            debug!("submit ignored; a greet call is already pending");
            return SubmitOutcome::Ignored;
        }

        let name = self.surface.name_value();
        let guard = PendingGuard::enter(&self.state, &self.surface);
        let submission_id = Uuid::new_v4();
        info!(%submission_id, name_len = name.len(), "submission started");

        let result = self.call(&name).await;
        drop(guard);

        match result {
            Ok(text) => {
                info!(%submission_id, outcome = "displayed", "submission settled");
                self.surface.write_greeting(&text);
                SubmitOutcome::Displayed(text)
            }
            Err(err) => {
                warn!(%submission_id, outcome = "failed", "submission settled: {err}");
                self.surface.report_failure(&err);
                SubmitOutcome::Failed(err)
            }
        }
    }

    async fn call(&self, name: &str) -> Result<String, GreetError> {
        let Some(limit) = self.call_timeout else {
            return self.greeter.greet(name).await;
        };

        match tokio::time::timeout(limit, self.greeter.greet(name)).await {
            Ok(result) => result,
            Err(_) => Err(GreetError::Transport(format!(
                "greet call timed out after {}ms",
                limit.as_millis()
            ))),
        }
    }
}

/// Holds the controller in `Pending` for as long as it lives.
///
/// Dropping it (on settle, on early return, when the submit future itself is
/// dropped, or during unwinding) puts the controller back to `Idle` and
/// re-enables the trigger.
struct PendingGuard<'a, S: FormSurface> {
    state: &'a Cell<SubmissionState>,
    surface: &'a S,
}

impl<'a, S: FormSurface> PendingGuard<'a, S> {
    fn enter(state: &'a Cell<SubmissionState>, surface: &'a S) -> Self {
        state.set(SubmissionState::Pending);
        surface.set_submit_enabled(false);
        Self { state, surface }
    }
}

impl<S: FormSurface> Drop for PendingGuard<'_, S> {
    fn drop(&mut self) {
        self.state.set(SubmissionState::Idle);
        self.surface.set_submit_enabled(true);
    }
}

#[cfg(test)]
#[path = "tests/submission_tests.rs"]
mod tests;
