// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Scripted source - deterministic input for tests and host bring-up
//!
//! A source whose readiness, rate and sample window are set explicitly
//! instead of being produced by hardware. Useful for validating a
//! synchronizer setup without cameras or decks attached, and for driving the
//! state machine deterministically in tests.
//!
//! This is an **input source** - it produces a sample window, it never
//! consumes anything.

use crate::core::time::{FrameRate, FrameTime};
use crate::core::traits::{InputSource, OpenParams, StartParams};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug)]
struct ScriptedState {
    ready: bool,
    rate: FrameRate,
    oldest: FrameTime,
    newest: FrameTime,
    open_result: bool,
    open: bool,
    open_count: u32,
    close_count: u32,
    start_time: Option<FrameTime>,
    last_open_params: Option<OpenParams>,
}

/// Deterministic, manually scripted [`InputSource`].
///
/// The source itself is handed to the synchronizer (boxed); the paired
/// [`ScriptedControl`] stays with the test or host and mutates the scripted
/// state from outside.
pub struct ScriptedSource {
    name: String,
    state: Arc<Mutex<ScriptedState>>,
}

/// External control handle for a [`ScriptedSource`].
#[derive(Clone)]
pub struct ScriptedControl {
    state: Arc<Mutex<ScriptedState>>,
}

impl ScriptedSource {
    pub fn new(name: impl Into<String>, rate: FrameRate) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(ScriptedState {
                ready: false,
                rate,
                oldest: FrameTime::zero(),
                newest: FrameTime::zero(),
                open_result: true,
                open: false,
                open_count: 0,
                close_count: 0,
                start_time: None,
                last_open_params: None,
            })),
        }
    }

    /// Convenience: a source that is immediately ready with the given window.
    pub fn ready_with_window(
        name: impl Into<String>,
        rate: FrameRate,
        oldest: i64,
        newest: i64,
    ) -> Self {
        let source = Self::new(name, rate);
        let control = source.control();
        control.set_ready(true);
        control.set_window(FrameTime::from_frame(oldest), FrameTime::from_frame(newest));
        source
    }

    pub fn control(&self) -> ScriptedControl {
        ScriptedControl {
            state: self.state.clone(),
        }
    }
}

impl ScriptedControl {
    pub fn set_ready(&self, ready: bool) {
        self.state.lock().ready = ready;
    }

    pub fn set_rate(&self, rate: FrameRate) {
        self.state.lock().rate = rate;
    }

    pub fn set_window(&self, oldest: FrameTime, newest: FrameTime) {
        let mut state = self.state.lock();
        state.oldest = oldest;
        state.newest = newest;
    }

    /// Slide the whole window forward by `frames` (native rate).
    pub fn advance_window(&self, frames: i64) {
        let mut state = self.state.lock();
        state.oldest = state.oldest + frames;
        state.newest = state.newest + frames;
    }

    /// Make the next `open` call fail.
    pub fn fail_open(&self) {
        self.state.lock().open_result = false;
    }

    pub fn is_open(&self) -> bool {
        self.state.lock().open
    }

    pub fn open_count(&self) -> u32 {
        self.state.lock().open_count
    }

    pub fn close_count(&self) -> u32 {
        self.state.lock().close_count
    }

    /// The start time handed to the source, if `start` was called.
    pub fn start_time(&self) -> Option<FrameTime> {
        self.state.lock().start_time
    }

    pub fn last_open_params(&self) -> Option<OpenParams> {
        self.state.lock().last_open_params
    }
}

impl InputSource for ScriptedSource {
    fn open(&mut self, params: &OpenParams) -> bool {
        let mut state = self.state.lock();
        state.last_open_params = Some(*params);
        state.open_count += 1;
        if state.open_result {
            state.open = true;
        }
        state.open_result
    }

    fn start(&mut self, params: &StartParams) {
        self.state.lock().start_time = Some(params.start_time);
    }

    fn close(&mut self) {
        let mut state = self.state.lock();
        state.open = false;
        state.close_count += 1;
    }

    fn is_ready(&self) -> bool {
        self.state.lock().ready
    }

    fn frame_rate(&self) -> FrameRate {
        self.state.lock().rate
    }

    fn oldest_sample_time(&self) -> FrameTime {
        self.state.lock().oldest
    }

    fn newest_sample_time(&self) -> FrameTime {
        self.state.lock().newest
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
