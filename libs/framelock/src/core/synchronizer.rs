// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! The synchronization state machine.
//!
//! Single-threaded and tick-driven: the host calls [`TimecodeSynchronizer::tick`]
//! once per frame and the machine does everything inside that call: refreshes
//! every source's cached state, reads the provider clock, validates, computes
//! the offset, and transitions. Within one tick the ordering is fixed
//! (sources, then provider, then validation) so every value feeding a
//! decision is consistent as of that tick. There are no internal threads and no partial
//! teardown: [`stop_synchronization`](TimecodeSynchronizer::stop_synchronization)
//! synchronously closes every source and releases the host registry claim
//! before returning.

use crate::core::config::{CachedSyncState, SyncMode, SynchronizerConfig};
use crate::core::error::{Result, SyncError};
use crate::core::events::{EventBroadcaster, SyncEvent};
use crate::core::provider_clock::{ProviderBinding, ProviderFrameClock};
use crate::core::registry::{ClaimToken, HostRegistry};
use crate::core::source_state::{InputSourceHandle, SourceValidity};
use crate::core::time::{
    add_offset_with_rollover, is_between, is_between_with_rollover, FrameRate, FrameTime, Timecode,
};
use crate::core::traits::{GenlockStatus, InputSource, OpenParams, ProviderStatus, StartParams};
use crate::core::validator::validate_sources;
use crossbeam_channel::Receiver;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Fine-grained machine state. One-directional during an attempt; only the
/// terminal `Error` and idle `None` states can begin a new attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchronizationState {
    /// Idle; no attempt running.
    None,
    /// Snapshotting configuration and opening sources. Never observed across
    /// ticks; it advances (or fails) within `start_synchronization`.
    Initializing,
    /// Waiting for the genlock/provider signal to lock.
    PreRollingWaitGenlockSync,
    /// Waiting for every active source to report at least one sample.
    PreRollingWaitReadiness,
    /// Negotiating a common frame across all sources.
    PreRollingSynchronizing,
    /// Sources started; synchronized timecode is live.
    Synchronized,
    /// Attempt failed; sources closed, registry released.
    Error,
}

/// Coarse status exposed to callers (editor UI, host systems).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynchronizerStatus {
    Closed,
    Synchronizing,
    Synchronized,
    Error,
}

pub struct TimecodeSynchronizer {
    config: SynchronizerConfig,
    registry: Arc<HostRegistry>,
    token: ClaimToken,

    state: SynchronizationState,
    /// Immutable snapshot for the running attempt; written only while
    /// `Initializing`.
    cached: Option<CachedSyncState>,
    handles: Vec<InputSourceHandle>,
    sources_open: bool,
    claimed: bool,
    genlock_expected: bool,
    provider_clock: Option<ProviderFrameClock>,
    preroll_started_at: Option<Duration>,

    locked_offset: Option<i64>,
    current_sync_time: Option<FrameTime>,

    events: EventBroadcaster,
    last_error: Option<SyncError>,
}

impl TimecodeSynchronizer {
    pub fn new(config: SynchronizerConfig, registry: Arc<HostRegistry>) -> Self {
        Self {
            config,
            registry,
            token: ClaimToken::next(),
            state: SynchronizationState::None,
            cached: None,
            handles: Vec::new(),
            sources_open: false,
            claimed: false,
            genlock_expected: false,
            provider_clock: None,
            preroll_started_at: None,
            locked_offset: None,
            current_sync_time: None,
            events: EventBroadcaster::new(),
            last_error: None,
        }
    }

    /// Register a source with this synchronizer. Only allowed while idle.
    pub fn add_source(
        &mut self,
        source: Box<dyn InputSource>,
        used_for_synchronization: bool,
    ) -> Result<()> {
        match self.state {
            SynchronizationState::None | SynchronizationState::Error => {
                self.handles
                    .push(InputSourceHandle::new(source, used_for_synchronization));
                Ok(())
            }
            state => Err(SyncError::Runtime(format!(
                "cannot add a source while {state:?}"
            ))),
        }
    }

    pub fn synchronization_state(&self) -> SynchronizationState {
        self.state
    }

    pub fn status(&self) -> SynchronizerStatus {
        match self.state {
            SynchronizationState::None | SynchronizationState::Initializing => {
                SynchronizerStatus::Closed
            }
            SynchronizationState::PreRollingWaitGenlockSync
            | SynchronizationState::PreRollingWaitReadiness
            | SynchronizationState::PreRollingSynchronizing => SynchronizerStatus::Synchronizing,
            SynchronizationState::Synchronized => SynchronizerStatus::Synchronized,
            SynchronizationState::Error => SynchronizerStatus::Error,
        }
    }

    pub fn frame_rate(&self) -> FrameRate {
        self.config.frame_rate
    }

    /// The synchronized frame time as of the last tick, once `Synchronized`.
    pub fn current_sync_time(&self) -> Option<FrameTime> {
        self.current_sync_time
    }

    pub fn current_timecode(&self) -> Option<Timecode> {
        self.current_sync_time
            .map(|t| Timecode::from_frame_time(t, self.config.frame_rate))
    }

    /// Subscribe to lifecycle events. Events are delivered synchronously from
    /// within the tick that raised them.
    pub fn subscribe(&mut self) -> Receiver<SyncEvent> {
        self.events.subscribe()
    }

    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    pub fn sources(&self) -> &[InputSourceHandle] {
        &self.handles
    }

    /// Begin a synchronization attempt.
    ///
    /// Calling while an attempt is already running (pre-rolling or
    /// synchronized) is a no-op returning success. Calling from `Error`
    /// restarts. Returns false when the attempt failed immediately, in which
    /// case the machine is in `Error` and a `Failed` event has been raised.
    pub fn start_synchronization(&mut self) -> bool {
        match self.state {
            SynchronizationState::None | SynchronizationState::Error => {}
            state => {
                warn!(?state, "start requested while an attempt is running; ignoring");
                return true;
            }
        }

        if self.sources_open {
            // Should be unreachable: every path out of an attempt closes the
            // sources. Recover by closing and reopening instead of crashing.
            error!("sources unexpectedly open at start of attempt; closing and reopening");
            self.close_sources();
        }

        self.state = SynchronizationState::Initializing;
        self.last_error = None;

        if let Err(err) = self.initialize() {
            self.enter_error(err);
            return false;
        }

        self.preroll_started_at = Some(self.registry.now());
        self.state = SynchronizationState::PreRollingWaitGenlockSync;
        info!(rate = %self.config.frame_rate, mode = ?self.config.sync_mode, "pre-roll started");
        self.events.broadcast(SyncEvent::Started);
        true
    }

    /// Stop the current attempt, whatever state it is in.
    ///
    /// Synchronously closes all sources and releases the provider/genlock
    /// claim before returning; safe to call repeatedly.
    pub fn stop_synchronization(&mut self) {
        if self.state != SynchronizationState::None {
            info!(state = ?self.state, "stopping synchronization");
        }
        self.teardown();
        self.state = SynchronizationState::None;
    }

    /// Advance the machine by one host frame.
    pub fn tick(&mut self) {
        match self.state {
            SynchronizationState::None
            | SynchronizationState::Initializing
            | SynchronizationState::Error => return,
            _ => {}
        }

        let Some(cached) = self.cached.clone() else {
            self.enter_error(SyncError::Runtime(
                "active state without a cached sync snapshot".to_string(),
            ));
            return;
        };

        // 1. Refresh every source's cached window.
        for handle in &mut self.handles {
            handle.update(&cached);
        }

        // 2. State-independent failure triggers.
        if let Err(err) = self.check_global_failures(&cached) {
            self.enter_error(err);
            return;
        }

        // 3. Read the provider clock.
        let provider = self.registry.timecode_provider();
        let Some(mut clock) = self.provider_clock.take() else {
            self.enter_error(SyncError::Runtime(
                "active state without a provider clock".to_string(),
            ));
            return;
        };
        let provider_frame = clock.update(provider.as_ref(), &self.handles);
        let provider_has_fix = clock.has_fix();
        self.provider_clock = Some(clock);

        // 4. Per-state behavior.
        let step = match self.state {
            SynchronizationState::PreRollingWaitGenlockSync => {
                self.tick_wait_genlock_sync(provider_has_fix)
            }
            SynchronizationState::PreRollingWaitReadiness => self.tick_wait_readiness(&cached),
            SynchronizationState::PreRollingSynchronizing => {
                self.tick_synchronizing(&cached, provider_frame)
            }
            SynchronizationState::Synchronized => self.tick_synchronized(&cached, provider_frame),
            _ => Ok(()),
        };

        if let Err(err) = step {
            self.enter_error(err);
        }
    }

    // ------------------------------------------------------------------
    // Attempt setup / teardown
    // ------------------------------------------------------------------

    fn initialize(&mut self) -> Result<()> {
        self.config.validate()?;

        if !self
            .handles
            .iter()
            .any(|h| h.is_used_for_synchronization())
        {
            return Err(SyncError::NoUsableSources);
        }

        self.registry.claim(self.token)?;
        self.claimed = true;

        let binding = self.resolve_provider_binding()?;
        self.genlock_expected = self.registry.genlock_source().is_some();

        let cached = CachedSyncState::snapshot(&self.config);
        self.open_sources(&cached)?;

        self.provider_clock = Some(ProviderFrameClock::new(binding, cached.frame_rate));
        self.cached = Some(cached);
        Ok(())
    }

    fn resolve_provider_binding(&self) -> Result<ProviderBinding> {
        if self.registry.timecode_provider().is_some() {
            return Ok(ProviderBinding::External);
        }

        let index = self.config.master_source.ok_or_else(|| {
            SyncError::Configuration(
                "no timecode provider registered and no master source configured".to_string(),
            )
        })?;

        let handle = self.handles.get(index).ok_or_else(|| {
            SyncError::Configuration(format!("master source index {index} out of range"))
        })?;

        if !handle.is_used_for_synchronization() {
            return Err(SyncError::Configuration(format!(
                "master source '{}' is not marked as used for synchronization",
                handle.display_name()
            )));
        }

        Ok(ProviderBinding::MasterSource(index))
    }

    fn open_sources(&mut self, cached: &CachedSyncState) -> Result<()> {
        let params = OpenParams {
            target_rate: cached.frame_rate,
            rollover: cached.rollover,
        };

        // Everything after the first open must be unwound on failure, so the
        // flag flips first and the error path goes through close_sources.
        self.sources_open = true;
        for handle in &mut self.handles {
            handle.reset();
            if handle.source_mut().open(&params) {
                continue;
            }
            if handle.is_used_for_synchronization() {
                return Err(SyncError::Source(format!(
                    "source '{}' failed to open",
                    handle.display_name()
                )));
            }
            warn!(
                source = handle.display_name(),
                "auxiliary source failed to open; continuing without it"
            );
        }
        Ok(())
    }

    fn close_sources(&mut self) {
        if !self.sources_open {
            return;
        }
        for handle in &mut self.handles {
            handle.source_mut().close();
            handle.reset();
        }
        self.sources_open = false;
    }

    fn teardown(&mut self) {
        self.close_sources();
        if self.claimed {
            self.registry.release(self.token);
            self.claimed = false;
        }
        self.provider_clock = None;
        self.preroll_started_at = None;
        self.cached = None;
        self.genlock_expected = false;
        self.locked_offset = None;
        self.current_sync_time = None;
    }

    fn enter_error(&mut self, err: SyncError) {
        error!(error = %err, "synchronization attempt failed");
        self.teardown();
        self.last_error = Some(err);
        self.state = SynchronizationState::Error;
        self.events.broadcast(SyncEvent::Failed);
    }

    // ------------------------------------------------------------------
    // Global failure triggers (checked every tick, any state)
    // ------------------------------------------------------------------

    fn check_global_failures(&self, cached: &CachedSyncState) -> Result<()> {
        if self.genlock_expected {
            let Some(genlock) = self.registry.genlock_source() else {
                return Err(SyncError::Genlock(
                    "genlock source disappeared from the host registry".to_string(),
                ));
            };
            let genlock = genlock.lock();
            match genlock.status() {
                GenlockStatus::Closed | GenlockStatus::Error => {
                    return Err(SyncError::Genlock(format!(
                        "genlock '{}' reported non-synchronizing status {:?}",
                        genlock.display_name(),
                        genlock.status()
                    )));
                }
                GenlockStatus::Synchronizing | GenlockStatus::Synchronized => {}
            }
        }

        let external = matches!(
            self.provider_clock.as_ref().map(|c| c.binding()),
            Some(ProviderBinding::External)
        );
        if external {
            let Some(provider) = self.registry.timecode_provider() else {
                return Err(SyncError::Provider(
                    "timecode provider disappeared from the host registry".to_string(),
                ));
            };
            let provider = provider.lock();
            match provider.status() {
                ProviderStatus::Closed | ProviderStatus::Error => {
                    return Err(SyncError::Provider(format!(
                        "provider '{}' reported status {:?}",
                        provider.display_name(),
                        provider.status()
                    )));
                }
                _ => {}
            }
            if self.state == SynchronizationState::Synchronized
                && provider.frame_rate() != cached.frame_rate
            {
                return Err(SyncError::Provider(format!(
                    "provider '{}' rate {} no longer matches the target rate {}",
                    provider.display_name(),
                    provider.frame_rate(),
                    cached.frame_rate
                )));
            }
        }

        for handle in &self.handles {
            if handle.validity() == SourceValidity::Invalid {
                return Err(SyncError::Source(format!(
                    "source '{}' became invalid",
                    handle.display_name()
                )));
            }
        }

        if self.is_pre_rolling() {
            let timeout = self.config.pre_roll_timeout;
            if let Some(started_at) = self.preroll_started_at {
                if self.registry.now().saturating_sub(started_at) > timeout {
                    return Err(SyncError::PreRollTimeout(timeout));
                }
            }
        }

        Ok(())
    }

    fn is_pre_rolling(&self) -> bool {
        matches!(
            self.state,
            SynchronizationState::PreRollingWaitGenlockSync
                | SynchronizationState::PreRollingWaitReadiness
                | SynchronizationState::PreRollingSynchronizing
        )
    }

    // ------------------------------------------------------------------
    // Per-state tick behavior
    // ------------------------------------------------------------------

    fn tick_wait_genlock_sync(&mut self, provider_has_fix: bool) -> Result<()> {
        if self.genlock_expected {
            let Some(genlock) = self.registry.genlock_source() else {
                // The disappearance trigger fires next tick; nothing to do.
                return Ok(());
            };
            if genlock.lock().status() != GenlockStatus::Synchronized {
                return Ok(());
            }
        }

        let provider_ready = match self.provider_clock.as_ref().map(|c| c.binding()) {
            Some(ProviderBinding::External) => provider_has_fix,
            // A master source's readiness is what the next state polls.
            Some(ProviderBinding::MasterSource(_)) => true,
            None => false,
        };

        if provider_ready {
            debug!("genlock and provider locked; waiting for source readiness");
            self.state = SynchronizationState::PreRollingWaitReadiness;
        }
        Ok(())
    }

    fn tick_wait_readiness(&mut self, cached: &CachedSyncState) -> Result<()> {
        let target = cached.frame_rate;
        let mut all_ready = true;

        for handle in &mut self.handles {
            if !handle.is_used_for_synchronization() {
                continue;
            }
            if !handle.is_ready() {
                all_ready = false;
                continue;
            }

            let native = handle.native_rate();
            if !native.is_multiple_of(&target) && !native.is_factor_of(&target) {
                if handle.take_rate_warning() {
                    warn!(
                        source = handle.display_name(),
                        source_rate = %native,
                        target_rate = %target,
                        "source rate is not an integer multiple or factor of the target rate; \
                         sample alignment will drift within a frame"
                    );
                }
            }
        }

        if all_ready {
            debug!("all sources ready; negotiating a common frame");
            self.state = SynchronizationState::PreRollingSynchronizing;
        }
        Ok(())
    }

    fn tick_synchronizing(
        &mut self,
        cached: &CachedSyncState,
        provider_frame: FrameTime,
    ) -> Result<()> {
        // A source dropping back to not-ready mid-negotiation is
        // informational; re-poll next tick (the pre-roll timeout still
        // bounds the wait).
        let mut windows = Vec::with_capacity(self.handles.len());
        for handle in &self.handles {
            if !handle.is_used_for_synchronization() {
                continue;
            }
            match (handle.is_ready(), handle.relative_state()) {
                (true, Some(relative)) => windows.push((handle.display_name(), relative)),
                _ => {
                    debug!(
                        source = handle.display_name(),
                        "source not ready during negotiation; retrying next tick"
                    );
                    return Ok(());
                }
            }
        }

        let window = validate_sources(cached, windows)?;

        let offset = match cached.sync_mode {
            SyncMode::UserDefinedOffset => cached.frame_offset,
            SyncMode::Auto => window.offset_to_newest(provider_frame)? - cached.auto_frame_offset,
            SyncMode::AutoOldest => {
                window.offset_to_oldest(provider_frame)? + cached.auto_frame_offset
            }
        };

        let candidate = Self::calculate_sync_time(cached, provider_frame, offset)?;

        if !window.contains_frame(candidate)? {
            debug!(
                %candidate,
                oldest = %window.oldest(),
                newest = %window.newest(),
                "candidate frame not yet available in every source"
            );
            return Ok(());
        }

        // Lock the offset and bring the sources up at the agreed time.
        let params = StartParams {
            start_time: candidate,
        };
        for handle in &mut self.handles {
            handle.source_mut().start(&params);
        }

        self.locked_offset = Some(offset);
        self.current_sync_time = Some(candidate);
        self.state = SynchronizationState::Synchronized;
        info!(sync_time = %candidate, offset, "synchronized");
        self.events.broadcast(SyncEvent::Succeeded);
        Ok(())
    }

    fn tick_synchronized(
        &mut self,
        cached: &CachedSyncState,
        provider_frame: FrameTime,
    ) -> Result<()> {
        let Some(offset) = self.locked_offset else {
            return Err(SyncError::Runtime(
                "synchronized without a locked offset".to_string(),
            ));
        };

        let sync_time = Self::calculate_sync_time(cached, provider_frame, offset)?;

        // Once live, a source whose window no longer contains the frame is
        // reported, not fatal: transient buffer starvation should not tear
        // down the whole session. Downstream consumers judge the severity.
        for handle in &self.handles {
            if !handle.is_used_for_synchronization() {
                continue;
            }
            let Some(relative) = handle.relative_state() else {
                continue;
            };
            let contained = match cached.rollover {
                Some(rollover) => is_between_with_rollover(
                    sync_time,
                    relative.oldest_available_sample,
                    relative.newest_available_sample,
                    rollover,
                )?,
                None => is_between(
                    sync_time,
                    relative.oldest_available_sample,
                    relative.newest_available_sample,
                ),
            };
            if !contained {
                warn!(
                    source = handle.display_name(),
                    %sync_time,
                    oldest = %relative.oldest_available_sample,
                    newest = %relative.newest_available_sample,
                    "synchronized frame outside source's available window"
                );
            }
        }

        self.current_sync_time = Some(sync_time);
        Ok(())
    }

    fn calculate_sync_time(
        cached: &CachedSyncState,
        provider_frame: FrameTime,
        offset: i64,
    ) -> Result<FrameTime> {
        match cached.rollover {
            Some(rollover) => add_offset_with_rollover(provider_frame, offset, rollover),
            None => Ok(provider_frame + offset),
        }
    }
}

impl Drop for TimecodeSynchronizer {
    fn drop(&mut self) {
        // A dropped synchronizer must not leave sources open or the registry
        // claim held.
        self.teardown();
    }
}
