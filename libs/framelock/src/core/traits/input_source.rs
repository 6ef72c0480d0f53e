// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! InputSource - trait for time-producing collaborators
//!
//! Every clock the synchronizer can pull into lockstep (media decoders,
//! genlock capture cards, external timecode feeds) implements this one
//! capability set. Concrete backends live outside this crate; in-tree the
//! only implementation is the deterministic
//! [`ScriptedSource`](crate::core::sources::ScriptedSource).

use crate::core::time::{FrameRate, FrameTime};

/// Parameters handed to [`InputSource::open`].
///
/// Carries the synchronizer's target rate and rollover setting so a source
/// can self-validate before committing resources.
#[derive(Debug, Clone, Copy)]
pub struct OpenParams {
    pub target_rate: FrameRate,
    pub rollover: Option<FrameTime>,
}

/// Parameters handed to [`InputSource::start`].
#[derive(Debug, Clone, Copy)]
pub struct StartParams {
    /// The synchronized frame time the source should begin producing at.
    /// Sources may seek, or apply a delay, depending on their backend.
    pub start_time: FrameTime,
}

/// Capability interface for a time-producing source.
///
/// ## Failure semantics
///
/// Any of the query methods may legitimately return a "not ready" / zero
/// answer before `open`/`start` have been called. Callers treat a not-ready
/// source as informational and poll again next tick; the synchronizer never
/// blocks on a source.
///
/// ## Threading
///
/// Implementations may run decode work on their own threads, but must present
/// an already-consistent snapshot to `is_ready` / `oldest_sample_time` /
/// `newest_sample_time`: the values returned within one tick are read
/// together and must agree with each other.
pub trait InputSource: Send {
    /// Prepare the source. Returns false when the source cannot service the
    /// requested rate/rollover combination.
    fn open(&mut self, params: &OpenParams) -> bool;

    /// Begin producing samples at the given start time.
    fn start(&mut self, params: &StartParams);

    /// Release resources. Must be idempotent and safe to call at any point,
    /// including on a source that never opened.
    fn close(&mut self);

    /// True once at least one sample is available.
    fn is_ready(&self) -> bool;

    /// The source's native frame rate.
    fn frame_rate(&self) -> FrameRate;

    /// Oldest buffered sample, in the source's native rate.
    fn oldest_sample_time(&self) -> FrameTime;

    /// Newest buffered sample, in the source's native rate.
    fn newest_sample_time(&self) -> FrameTime;

    /// Diagnostics-only name.
    fn display_name(&self) -> &str;
}
