use alloc::borrow::Cow;
use alloc::boxed::Box;

use listwindow::call_guarded;

use crate::{Clock, RecoveryError, RecoveryOptions};

/// A recovery action. It receives the scheduler's target (`()` for free-standing actions).
pub type RecoveryAction<S> = Box<dyn FnMut(&mut S) -> Result<(), RecoveryError>>;

/// What a recovery is about, handed to every callback.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecoveryContext {
    pub label: Cow<'static, str>,
    /// 1-based attempt number, filled in by the scheduler.
    pub attempt: u32,
    /// The failure of the previous attempt, if this is a retry.
    pub last_error: Option<RecoveryError>,
    /// Set on the failure report of the final attempt; nothing more will be scheduled.
    pub exhausted: bool,
}

impl RecoveryContext {
    pub fn new(label: impl Into<Cow<'static, str>>) -> Self {
        Self {
            label: label.into(),
            attempt: 0,
            last_error: None,
            exhausted: false,
        }
    }

    pub fn with_error(mut self, error: RecoveryError) -> Self {
        self.last_error = Some(error);
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecoveryState {
    pub enabled: bool,
    pub attempt_count: u32,
    pub is_recovering: bool,
    pub last_recovery_time_ms: Option<u64>,
    pub scheduled_recovery_id: Option<u64>,
}

/// Result of an attempt that ran during [`RecoveryScheduler::tick`].
#[derive(Clone, Debug, PartialEq)]
pub enum RecoveryOutcome {
    Succeeded { attempt: u32 },
    /// The attempt failed and another one has been scheduled.
    Retrying { attempt: u32, error: RecoveryError },
    /// The final attempt failed; nothing more is scheduled until `reset_recovery`.
    GaveUp { attempts: u32, error: RecoveryError },
}

struct PendingRecovery<S> {
    id: u64,
    due_ms: u64,
    action: RecoveryAction<S>,
    context: RecoveryContext,
}

/// A bounded-retry supervisor for recovery actions.
///
/// State machine per instance: `idle -> recovering (scheduled) -> attempt -> idle`, with a
/// failed attempt re-entering `recovering` until `recovery_attempts` is reached. Attempts run
/// from [`tick`](Self::tick) once `recovery_delay_ms` has elapsed; retries are re-queued rather
/// than called recursively, so the attempt sequence is bounded and observable.
pub struct RecoveryScheduler<C, S = ()> {
    options: RecoveryOptions,
    clock: C,
    enabled: bool,
    attempt_count: u32,
    is_recovering: bool,
    last_recovery_time: Option<u64>,
    next_id: u64,
    pending: Option<PendingRecovery<S>>,
}

impl<C: Clock, S> RecoveryScheduler<C, S> {
    pub fn new(options: RecoveryOptions, clock: C) -> Self {
        Self {
            enabled: options.enabled,
            options,
            clock,
            attempt_count: 0,
            is_recovering: false,
            last_recovery_time: None,
            next_id: 1,
            pending: None,
        }
    }

    pub fn options(&self) -> &RecoveryOptions {
        &self.options
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling cancels any pending attempt.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.cancel_recovery();
        }
    }

    pub fn is_recovering(&self) -> bool {
        self.is_recovering
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_exhausted(&self) -> bool {
        self.attempt_count >= self.options.recovery_attempts
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.as_ref().map(|p| p.due_ms)
    }

    /// Schedules `action` to run after `recovery_delay_ms`.
    ///
    /// Returns `false` (and does nothing) when disabled, already recovering, or out of attempts.
    pub fn schedule_recovery(
        &mut self,
        action: impl FnMut(&mut S) -> Result<(), RecoveryError> + 'static,
        context: RecoveryContext,
    ) -> bool {
        self.schedule_boxed(Box::new(action), context)
    }

    /// Runs the pending attempt if its delay has elapsed.
    pub fn tick(&mut self, target: &mut S) -> Option<RecoveryOutcome> {
        let now = self.clock.now_ms();
        let PendingRecovery {
            id,
            mut action,
            mut context,
            ..
        } = self.pending.take_if(|p| p.due_ms <= now)?;

        let attempt = context.attempt;
        adebug!(id, attempt, label = %context.label, "running recovery attempt");
        let _ = id;
        let result = call_guarded("recovery_action", || action(target))
            .unwrap_or(Err(RecoveryError::Panicked));
        self.is_recovering = false;

        match result {
            Ok(()) => {
                self.last_recovery_time = Some(now);
                self.attempt_count = 0;
                if let Some(cb) = &self.options.on_recovery_success {
                    call_guarded("on_recovery_success", || cb(&context));
                }
                Some(RecoveryOutcome::Succeeded { attempt })
            }
            Err(error) => {
                context.last_error = Some(error.clone());
                if self.is_exhausted() {
                    let attempts = self.attempt_count;
                    awarn!(attempts, %error, "recovery gave up");
                    context.exhausted = true;
                    self.report_failure(&error, &context);
                    return Some(RecoveryOutcome::GaveUp { attempts, error });
                }
                awarn!(attempt, %error, "recovery attempt failed; retrying");
                self.report_failure(&error, &context);
                self.schedule_boxed(action, context);
                Some(RecoveryOutcome::Retrying { attempt, error })
            }
        }
    }

    /// Cancels the pending attempt, if any. Attempt counters are kept.
    pub fn cancel_recovery(&mut self) -> bool {
        self.is_recovering = false;
        self.pending.take().is_some()
    }

    /// Cancels the pending attempt and zeroes every counter.
    pub fn reset_recovery(&mut self) {
        self.cancel_recovery();
        self.attempt_count = 0;
        self.last_recovery_time = None;
    }

    pub fn recovery_state(&self) -> RecoveryState {
        RecoveryState {
            enabled: self.enabled,
            attempt_count: self.attempt_count,
            is_recovering: self.is_recovering,
            last_recovery_time_ms: self.last_recovery_time,
            scheduled_recovery_id: self.pending.as_ref().map(|p| p.id),
        }
    }

    fn schedule_boxed(&mut self, action: RecoveryAction<S>, mut context: RecoveryContext) -> bool {
        if !self.enabled || self.is_recovering {
            return false;
        }
        if self.is_exhausted() {
            adebug!(attempts = self.attempt_count, "recovery exhausted; not scheduling");
            return false;
        }
        self.pending = None;
        self.attempt_count += 1;
        self.is_recovering = true;
        context.attempt = self.attempt_count;

        if let Some(cb) = &self.options.on_recovery_start {
            call_guarded("on_recovery_start", || cb(&context));
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let due_ms = self
            .clock
            .now_ms()
            .saturating_add(self.options.recovery_delay_ms);
        self.pending = Some(PendingRecovery {
            id,
            due_ms,
            action,
            context,
        });
        true
    }

    fn report_failure(&self, error: &RecoveryError, context: &RecoveryContext) {
        if let Some(cb) = &self.options.on_recovery_fail {
            call_guarded("on_recovery_fail", || cb(error, context));
        }
    }
}

impl<C: Clock> RecoveryScheduler<C, ()> {
    /// [`tick`](Self::tick) for free-standing actions.
    pub fn poll(&mut self) -> Option<RecoveryOutcome> {
        self.tick(&mut ())
    }
}

impl<C, S> core::fmt::Debug for RecoveryScheduler<C, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecoveryScheduler")
            .field("options", &self.options)
            .field("enabled", &self.enabled)
            .field("attempt_count", &self.attempt_count)
            .field("is_recovering", &self.is_recovering)
            .field("pending", &self.pending.as_ref().map(|p| p.id))
            .finish_non_exhaustive()
    }
}
