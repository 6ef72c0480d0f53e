// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Per-source cached state, refreshed once per tick.

use crate::core::config::CachedSyncState;
use crate::core::time::{transform, FrameRate, FrameTime};
use crate::core::traits::InputSource;
use tracing::{debug, error};

/// A source's available sample window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimecodeSourceState {
    pub oldest_available_sample: FrameTime,
    pub newest_available_sample: FrameTime,
}

impl TimecodeSourceState {
    pub fn new(oldest: FrameTime, newest: FrameTime) -> Self {
        Self {
            oldest_available_sample: oldest,
            newest_available_sample: newest,
        }
    }

    fn transformed(&self, from: FrameRate, to: FrameRate) -> Self {
        Self {
            oldest_available_sample: transform(self.oldest_available_sample, from, to),
            newest_available_sample: transform(self.newest_available_sample, from, to),
        }
    }
}

/// Whether a source's reported state can still be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceValidity {
    Valid,
    Invalid,
}

/// Owns one [`InputSource`] plus the state cached from it each tick.
///
/// The handle owns the trait object, not the underlying media/hardware
/// resource: implementations keep a non-owning reference back to their
/// externally managed backend. Handles live for the duration of one
/// synchronization attempt: created on open, refreshed every tick, destroyed
/// on close.
pub struct InputSourceHandle {
    source: Box<dyn InputSource>,
    ready: bool,
    validity: SourceValidity,
    used_for_synchronization: bool,
    native_rate: FrameRate,
    /// Sample window in the source's native rate.
    native_state: Option<TimecodeSourceState>,
    /// The same window transformed into the synchronizer's rate.
    relative_state: Option<TimecodeSourceState>,
    /// Latch so the pre-roll rate mismatch warning fires once per attempt.
    rate_warning_logged: bool,
}

impl InputSourceHandle {
    pub fn new(source: Box<dyn InputSource>, used_for_synchronization: bool) -> Self {
        Self {
            source,
            ready: false,
            validity: SourceValidity::Valid,
            used_for_synchronization,
            native_rate: FrameRate::default(),
            native_state: None,
            relative_state: None,
            rate_warning_logged: false,
        }
    }

    /// Clear all cached state for a fresh synchronization attempt.
    pub fn reset(&mut self) {
        self.ready = false;
        self.validity = SourceValidity::Valid;
        self.native_state = None;
        self.relative_state = None;
        self.rate_warning_logged = false;
    }

    /// One-shot latch for the pre-roll rate warning. Returns true the first
    /// time it is taken each attempt.
    pub fn take_rate_warning(&mut self) -> bool {
        if self.rate_warning_logged {
            false
        } else {
            self.rate_warning_logged = true;
            true
        }
    }

    pub fn source(&self) -> &dyn InputSource {
        self.source.as_ref()
    }

    pub fn source_mut(&mut self) -> &mut dyn InputSource {
        self.source.as_mut()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn validity(&self) -> SourceValidity {
        self.validity
    }

    pub fn is_used_for_synchronization(&self) -> bool {
        self.used_for_synchronization
    }

    pub fn native_rate(&self) -> FrameRate {
        self.native_rate
    }

    pub fn native_state(&self) -> Option<&TimecodeSourceState> {
        self.native_state.as_ref()
    }

    pub fn relative_state(&self) -> Option<&TimecodeSourceState> {
        self.relative_state.as_ref()
    }

    pub fn display_name(&self) -> &str {
        self.source.display_name()
    }

    /// Refresh the cached state from the source. Called once per tick.
    ///
    /// A source that was ready and then reports an insane window (newest
    /// moving backwards without rollover, or samples outside the rollover
    /// range) is flipped to `Invalid` with a diagnostic; the state machine
    /// surfaces that as an error condition.
    pub fn update(&mut self, sync: &CachedSyncState) {
        if !self.source.is_ready() {
            if self.ready {
                debug!(
                    source = self.source.display_name(),
                    "previously ready source has no samples this tick"
                );
            }
            self.ready = false;
            return;
        }

        let previously_ready = self.ready;
        let previous_newest = self
            .native_state
            .map(|state| state.newest_available_sample);

        self.ready = true;
        self.native_rate = self.source.frame_rate();

        let native = TimecodeSourceState::new(
            self.source.oldest_sample_time(),
            self.source.newest_sample_time(),
        );

        if previously_ready && !self.window_is_sane(&native, previous_newest, sync) {
            self.validity = SourceValidity::Invalid;
            return;
        }

        self.relative_state = Some(native.transformed(self.native_rate, sync.frame_rate));
        self.native_state = Some(native);
    }

    fn window_is_sane(
        &self,
        native: &TimecodeSourceState,
        previous_newest: Option<FrameTime>,
        sync: &CachedSyncState,
    ) -> bool {
        match sync.rollover {
            Some(rollover) => {
                // With a cyclic counter the only hard invariant is staying
                // inside [0, rollover) in the source's own rate.
                let bound = transform(rollover, sync.frame_rate, self.native_rate);
                let in_range = |t: FrameTime| t >= FrameTime::zero() && t < bound;
                if !in_range(native.oldest_available_sample)
                    || !in_range(native.newest_available_sample)
                {
                    error!(
                        source = self.source.display_name(),
                        oldest = %native.oldest_available_sample,
                        newest = %native.newest_available_sample,
                        bound = %bound,
                        "source reported samples beyond the rollover bound"
                    );
                    return false;
                }
                true
            }
            None => {
                if native.oldest_available_sample > native.newest_available_sample {
                    error!(
                        source = self.source.display_name(),
                        oldest = %native.oldest_available_sample,
                        newest = %native.newest_available_sample,
                        "source reported an inverted sample window"
                    );
                    return false;
                }
                if let Some(previous) = previous_newest {
                    if native.newest_available_sample < previous {
                        error!(
                            source = self.source.display_name(),
                            newest = %native.newest_available_sample,
                            previous = %previous,
                            "source's newest sample moved backwards"
                        );
                        return false;
                    }
                }
                true
            }
        }
    }
}
