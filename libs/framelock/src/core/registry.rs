// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Host registry - injected context for the global provider/genlock slots
//!
//! The host owns exactly one "active timecode provider" slot and one "active
//! genlock" slot, plus the wall clock used for timeout measurement. The
//! registry is an explicit object handed to each synchronizer at
//! construction; there is no ambient global state. A synchronizer *claims*
//! exclusive use of the slots for the duration of an attempt and the claim is
//! released on every exit path, so a crashed or stopped attempt can never
//! leave a dangling registration behind.

use crate::core::clocks::Clock;
use crate::core::error::{Result, SyncError};
use crate::core::traits::{GenlockSource, TimecodeProvider};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub type SharedTimecodeProvider = Arc<Mutex<dyn TimecodeProvider>>;
pub type SharedGenlockSource = Arc<Mutex<dyn GenlockSource>>;

/// Opaque identity of one registry claimant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimToken(u64);

impl ClaimToken {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        ClaimToken(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Default)]
struct Slots {
    provider: Option<SharedTimecodeProvider>,
    genlock: Option<SharedGenlockSource>,
    claimed_by: Option<ClaimToken>,
}

pub struct HostRegistry {
    slots: Mutex<Slots>,
    wall_clock: Arc<dyn Clock>,
}

impl HostRegistry {
    pub fn new(wall_clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            slots: Mutex::new(Slots::default()),
            wall_clock,
        })
    }

    /// Install or clear the active timecode provider. Host-side API.
    pub fn set_timecode_provider(&self, provider: Option<SharedTimecodeProvider>) {
        self.slots.lock().provider = provider;
    }

    /// Install or clear the active genlock source. Host-side API.
    pub fn set_genlock_source(&self, genlock: Option<SharedGenlockSource>) {
        self.slots.lock().genlock = genlock;
    }

    pub fn timecode_provider(&self) -> Option<SharedTimecodeProvider> {
        self.slots.lock().provider.clone()
    }

    pub fn genlock_source(&self) -> Option<SharedGenlockSource> {
        self.slots.lock().genlock.clone()
    }

    /// Wall-clock time for timeout measurement.
    pub fn now(&self) -> Duration {
        self.wall_clock.now()
    }

    pub fn wall_clock(&self) -> &dyn Clock {
        self.wall_clock.as_ref()
    }

    /// Claim exclusive use of the provider/genlock slots.
    ///
    /// Fails fast when another synchronizer already holds the claim; the
    /// caller must transition to `Error`, never overwrite.
    pub(crate) fn claim(&self, token: ClaimToken) -> Result<()> {
        let mut slots = self.slots.lock();
        match slots.claimed_by {
            None => {
                slots.claimed_by = Some(token);
                Ok(())
            }
            Some(owner) if owner == token => Ok(()),
            Some(owner) => Err(SyncError::RegistrationConflict(format!(
                "provider/genlock slots already claimed by synchronizer {owner:?}"
            ))),
        }
    }

    /// Release a claim. Releasing a claim one does not hold is a no-op.
    pub(crate) fn release(&self, token: ClaimToken) {
        let mut slots = self.slots.lock();
        if slots.claimed_by == Some(token) {
            slots.claimed_by = None;
        }
    }

    /// True when any synchronizer currently holds the claim. Host-side
    /// introspection, used by tests to verify teardown.
    pub fn is_claimed(&self) -> bool {
        self.slots.lock().claimed_by.is_some()
    }
}
