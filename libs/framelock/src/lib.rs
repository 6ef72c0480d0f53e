// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! framelock - frame-accurate timecode synchronization.
//!
//! Pulls the playback clocks of several independent time-producing sources
//! (media decoders, genlock hardware, external timecode feeds) into lockstep
//! behind one synchronized timecode, suitable for driving frame-accurate
//! multi-camera or multi-stream production.
//!
//! The crate is the synchronization core only: the
//! [`TimecodeSynchronizer`](core::synchronizer::TimecodeSynchronizer) state
//! machine, its rollover-aware frame-time arithmetic, and the capability
//! traits the surrounding system implements
//! ([`InputSource`](core::traits::InputSource),
//! [`TimecodeProvider`](core::traits::TimecodeProvider),
//! [`GenlockSource`](core::traits::GenlockSource)). Editor UI, asset
//! persistence, and concrete decoder/hardware backends live with the host.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use framelock::core::prelude::*;
//! use std::sync::Arc;
//!
//! let registry = HostRegistry::new(Arc::new(SoftwareClock::new()));
//! let mut sync = TimecodeSynchronizer::new(
//!     SynchronizerConfig {
//!         frame_rate: FrameRate::FPS_30,
//!         master_source: Some(0),
//!         ..Default::default()
//!     },
//!     registry,
//! );
//!
//! sync.add_source(Box::new(my_decoder), true)?;
//! sync.start_synchronization();
//!
//! // Host tick loop:
//! loop {
//!     sync.tick();
//!     if let Some(tc) = sync.current_timecode() {
//!         // drive downstream consumers
//!     }
//! }
//! ```

// Suppress pedantic clippy warnings that are intentional design choices
#![allow(clippy::collapsible_if)] // Nested conditions are clearer in the state machine
#![allow(clippy::manual_clamp)] // Manual clamp is sometimes clearer

pub mod core;

pub use core::{
    add_offset_with_rollover,
    distance_with_rollover,
    is_between,
    is_between_with_rollover,
    transform,
    CachedSyncState,
    ClaimToken,
    Clock,
    EventBroadcaster,
    FrameRate,
    FrameTime,
    GenlockSource,
    GenlockStatus,
    HostRegistry,
    InputSource,
    InputSourceHandle,
    ManualClock,
    OpenParams,
    ProviderBinding,
    ProviderFrameClock,
    ProviderStatus,
    Result,
    RolloverState,
    ScriptedControl,
    ScriptedSource,
    SharedGenlockSource,
    SharedTimecodeProvider,
    SoftwareClock,
    SourceValidity,
    StartParams,
    SyncError,
    SyncEvent,
    SyncMode,
    SynchronizationState,
    SynchronizerConfig,
    SynchronizerStatus,
    SystemTimecodeProvider,
    Timecode,
    TimecodeProvider,
    TimecodeSourceState,
    TimecodeSynchronizer,
    ValidatedWindow,
    WrapPath,
};

pub use core::validator::validate_sources;
