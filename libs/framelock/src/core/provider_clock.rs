// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! ProviderFrameClock - the single authoritative "current frame" per tick.
//!
//! Wraps whichever collaborator acts as the master clock: the externally
//! registered [`TimecodeProvider`](crate::core::traits::TimecodeProvider), or
//! one of the active input sources designated as master. Whatever the
//! backing, the clock always answers in the synchronizer's target rate, and
//! an unready backing yields the last known value rather than a failure; a
//! provider that stays unready is the state machine's timeout to judge, not
//! this adapter's.

use crate::core::registry::SharedTimecodeProvider;
use crate::core::source_state::InputSourceHandle;
use crate::core::time::{transform, FrameRate, FrameTime};
use crate::core::traits::ProviderStatus;
use tracing::debug;

/// Which collaborator the provider clock reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderBinding {
    /// The externally registered timecode provider.
    External,
    /// The input source at this index acts as master; its newest available
    /// sample is the provider time.
    MasterSource(usize),
}

pub struct ProviderFrameClock {
    binding: ProviderBinding,
    target_rate: FrameRate,
    last_known: FrameTime,
    has_fix: bool,
}

impl ProviderFrameClock {
    pub fn new(binding: ProviderBinding, target_rate: FrameRate) -> Self {
        Self {
            binding,
            target_rate,
            last_known: FrameTime::zero(),
            has_fix: false,
        }
    }

    pub fn binding(&self) -> ProviderBinding {
        self.binding
    }

    /// True once at least one live reading has been taken this attempt.
    pub fn has_fix(&self) -> bool {
        self.has_fix
    }

    /// Read the current provider frame, in the synchronizer's target rate.
    ///
    /// Reads a fresh value when the backing is ready; otherwise holds the
    /// last known value and logs at low severity.
    pub fn update(
        &mut self,
        provider: Option<&SharedTimecodeProvider>,
        handles: &[InputSourceHandle],
    ) -> FrameTime {
        match self.binding {
            ProviderBinding::External => {
                if let Some(provider) = provider {
                    let provider = provider.lock();
                    if provider.status() == ProviderStatus::Synchronized {
                        self.last_known = transform(
                            provider.frame_time(),
                            provider.frame_rate(),
                            self.target_rate,
                        );
                        self.has_fix = true;
                    } else {
                        debug!(
                            provider = provider.display_name(),
                            status = ?provider.status(),
                            "timecode provider not ready; holding last frame"
                        );
                    }
                }
            }
            ProviderBinding::MasterSource(index) => {
                match handles.get(index) {
                    Some(handle) if handle.is_ready() => {
                        if let Some(relative) = handle.relative_state() {
                            self.last_known = relative.newest_available_sample;
                            self.has_fix = true;
                        }
                    }
                    Some(handle) => {
                        debug!(
                            source = handle.display_name(),
                            "master source not ready; holding last frame"
                        );
                    }
                    None => {
                        debug!(index, "master source index out of range");
                    }
                }
            }
        }

        self.last_known
    }
}
