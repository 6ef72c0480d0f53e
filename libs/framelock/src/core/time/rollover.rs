// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Rollover-modulus frame arithmetic.
//!
//! Cyclic timecode counters (24-hour wall timecode, LTC feeds) wrap back to
//! zero at a configured rollover frame. Every comparison and distance in that
//! regime has two candidate paths, direct or through the wrap point, and the
//! synchronizer must pick them deterministically. All functions here reject a
//! non-positive rollover frame outright; "no rollover" is expressed by not
//! calling them, never by a sentinel value.

use super::FrameTime;
use crate::core::error::{Result, SyncError};

/// Which of the two possible paths a rollover-aware distance took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapPath {
    Direct,
    Wrapped,
}

fn validate_rollover(rollover: FrameTime) -> Result<i64> {
    let period = rollover.frame();
    if period <= 0 {
        return Err(SyncError::InvalidRollover(format!(
            "rollover frame must be positive, got {period}"
        )));
    }
    Ok(period)
}

/// Add a signed whole-frame offset, wrapping the result into `[0, rollover)`.
pub fn add_offset_with_rollover(
    time: FrameTime,
    offset: i64,
    rollover: FrameTime,
) -> Result<FrameTime> {
    let period = validate_rollover(rollover)?;
    let frame = (time.frame() + offset).rem_euclid(period);
    Ok(FrameTime::new(frame, time.subframe()))
}

/// Signed whole-frame distance from `b` to `a`, taking whichever of the two
/// paths (direct, or through the rollover point) is shorter in magnitude.
///
/// Antisymmetric by construction: `distance(a, b) == -distance(b, a)`. When
/// both paths tie (exactly half the period apart) the direct path wins, which
/// keeps the law exact for even periods.
pub fn distance_with_rollover(
    a: FrameTime,
    b: FrameTime,
    rollover: FrameTime,
) -> Result<(i64, WrapPath)> {
    let period = validate_rollover(rollover)?;

    let direct = a.frame() - b.frame();
    let through_wrap = direct - direct.signum() * period;

    if through_wrap.abs() < direct.abs() {
        Ok((through_wrap, WrapPath::Wrapped))
    } else {
        Ok((direct, WrapPath::Direct))
    }
}

/// True when `t` lies in `[low, high]` walking forward from `low`, wrapping
/// at the rollover point when `low > high` (the window straddles the wrap).
///
/// A zero-length window (`low == high`) contains only `t == low`.
pub fn is_between_with_rollover(
    t: FrameTime,
    low: FrameTime,
    high: FrameTime,
    rollover: FrameTime,
) -> Result<bool> {
    validate_rollover(rollover)?;

    if low <= high {
        Ok(low <= t && t <= high)
    } else {
        Ok(t >= low || t <= high)
    }
}

/// Plain-ordering companion for the no-rollover regime.
pub fn is_between(t: FrameTime, low: FrameTime, high: FrameTime) -> bool {
    low <= t && t <= high
}
