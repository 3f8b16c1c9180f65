use crate::{
    animation::schedule::{FrameHandle, FrameScheduler},
    foundation::error::TrafficResult,
};

/// Progress at which the fade-out phase ends and a cycle is complete.
pub const PROGRESS_END: f64 = 1.5;

/// Progress added per frame when the config does not say otherwise.
pub const DEFAULT_ANIMATION_SPEED: f64 = 0.01;

/// Invoked once each time a cycle reaches [`PROGRESS_END`].
pub type CompletionCallback = Box<dyn FnMut()>;

/// Lifecycle state of an [`AnimationDriver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum DriverState {
    /// Constructed, never started (or could not start).
    Idle,
    /// A tick is pending, or a loop cycle is about to begin.
    Running,
    /// Finished a non-looping cycle or stopped explicitly; nothing is scheduled.
    Stopped,
}

/// Snapshot of the driver's temporal state.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct AnimationState {
    /// In `[0, PROGRESS_END]`.
    pub progress: f64,
    /// Pending tick, if any; used only for cancellation.
    pub frame_handle: Option<FrameHandle>,
}

/// Result of delivering one tick to the driver.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub enum TickOutcome {
    /// The handle was not the driver's pending tick; nothing changed.
    Stale,
    /// Progress advanced; redraw requested.
    Advanced {
        /// Progress after the tick.
        progress: f64,
    },
    /// The cycle reached `PROGRESS_END`; redraw requested. With `looped` the driver already
    /// reset to 0 and scheduled the next cycle.
    Completed {
        /// `PROGRESS_END`, or 0 when the driver looped.
        progress: f64,
        /// Whether a new cycle was scheduled.
        looped: bool,
    },
}

impl TickOutcome {
    /// Whether the host should render a new frame.
    pub fn needs_redraw(self) -> bool {
        !matches!(self, Self::Stale)
    }

    /// Whether the tick finished a cycle.
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Frame-driven progress clock.
///
/// At most one tick is pending at any time: every new request is preceded by cancelling and
/// clearing the previous handle, and ticks carrying any other handle are ignored.
pub struct AnimationDriver {
    state: DriverState,
    anim: AnimationState,
    speed: f64,
    looping: bool,
    on_complete: Option<CompletionCallback>,
    completions: u64,
}

impl std::fmt::Debug for AnimationDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationDriver")
            .field("state", &self.state)
            .field("anim", &self.anim)
            .field("speed", &self.speed)
            .field("looping", &self.looping)
            .field("on_complete", &self.on_complete.is_some())
            .field("completions", &self.completions)
            .finish()
    }
}

impl AnimationDriver {
    /// Idle driver advancing `speed` per tick.
    pub fn new(speed: f64, looping: bool) -> Self {
        Self {
            state: DriverState::Idle,
            anim: AnimationState::default(),
            speed,
            looping,
            on_complete: None,
            completions: 0,
        }
    }

    /// Invoke `callback` each time a cycle completes.
    pub fn with_on_complete(mut self, callback: CompletionCallback) -> Self {
        self.on_complete = Some(callback);
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Current progress in `[0, PROGRESS_END]`.
    pub fn progress(&self) -> f64 {
        self.anim.progress
    }

    /// Progress plus the pending handle.
    pub fn animation_state(&self) -> AnimationState {
        self.anim
    }

    /// Progress added per tick.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Number of cycles completed so far.
    pub fn completions(&self) -> u64 {
        self.completions
    }

    /// Reset progress to 0 and schedule the first tick.
    ///
    /// Safe to call while running: the previous chain is cancelled first, so there is still a
    /// single pending tick afterwards. On failure the driver stays put at progress 0 with
    /// nothing scheduled.
    pub fn start(&mut self, scheduler: &mut dyn FrameScheduler) -> TrafficResult<()> {
        self.release(scheduler);
        self.anim.progress = 0.0;
        match scheduler.request_tick() {
            Ok(handle) => {
                self.anim.frame_handle = Some(handle);
                self.state = DriverState::Running;
                tracing::debug!(?handle, "animation started");
                Ok(())
            }
            Err(err) => {
                if self.state == DriverState::Running {
                    self.state = DriverState::Stopped;
                }
                tracing::warn!(error = %err, "animation could not start");
                Err(err)
            }
        }
    }

    /// Advance one frame if `handle` is the pending tick.
    pub fn tick(&mut self, handle: FrameHandle, scheduler: &mut dyn FrameScheduler) -> TickOutcome {
        if self.state != DriverState::Running || self.anim.frame_handle != Some(handle) {
            tracing::debug!(?handle, pending = ?self.anim.frame_handle, "ignoring stale tick");
            return TickOutcome::Stale;
        }
        self.anim.frame_handle = None;

        let progress = (self.anim.progress + self.speed).min(PROGRESS_END);
        self.anim.progress = progress;

        if progress < PROGRESS_END {
            self.reschedule(scheduler);
            return TickOutcome::Advanced { progress };
        }

        self.completions += 1;
        if let Some(callback) = self.on_complete.as_mut() {
            callback();
        }

        if self.looping {
            self.anim.progress = 0.0;
            self.reschedule(scheduler);
            tracing::debug!(completions = self.completions, "animation looped");
            TickOutcome::Completed {
                progress: 0.0,
                looped: true,
            }
        } else {
            self.state = DriverState::Stopped;
            tracing::debug!(completions = self.completions, "animation complete");
            TickOutcome::Completed {
                progress,
                looped: false,
            }
        }
    }

    /// Cancel the pending tick. Idempotent.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.release(scheduler);
        if self.state != DriverState::Stopped {
            tracing::debug!(progress = self.anim.progress, "animation stopped");
        }
        self.state = DriverState::Stopped;
    }

    fn release(&mut self, scheduler: &mut dyn FrameScheduler) {
        if let Some(handle) = self.anim.frame_handle.take() {
            scheduler.cancel_tick(handle);
        }
    }

    fn reschedule(&mut self, scheduler: &mut dyn FrameScheduler) {
        match scheduler.request_tick() {
            Ok(handle) => self.anim.frame_handle = Some(handle),
            Err(err) => {
                tracing::warn!(error = %err, "lost frame scheduling mid-animation");
                self.state = DriverState::Stopped;
            }
        }
    }
}
