// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Frame-based time representation and rollover-aware arithmetic.
//!
//! Everything else in the crate is built on these types: rational
//! [`FrameRate`]s, frame+subframe [`FrameTime`]s with exact cross-rate
//! [`transform`], rollover-modulus operations, and the human-readable
//! [`Timecode`] view.

mod frame_rate;
mod frame_time;
pub mod rollover;
mod timecode;

pub use frame_rate::FrameRate;
pub use frame_time::{transform, FrameTime, MAX_SUBFRAME};
pub use rollover::{
    add_offset_with_rollover, distance_with_rollover, is_between, is_between_with_rollover,
    WrapPath,
};
pub use timecode::Timecode;
