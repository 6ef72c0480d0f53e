// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crate::core::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Rational ticks-per-second frame rate.
///
/// Production rates are rarely integral (NTSC rates carry a /1001
/// denominator), so the numerator/denominator pair is kept exact and all
/// time rescaling goes through [`transform`](crate::core::time::transform)
/// rather than floating-point seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameRate {
    pub numerator: u32,
    pub denominator: u32,
}

impl FrameRate {
    pub const FPS_24: FrameRate = FrameRate::new(24, 1);
    pub const FPS_25: FrameRate = FrameRate::new(25, 1);
    pub const FPS_30: FrameRate = FrameRate::new(30, 1);
    pub const FPS_48: FrameRate = FrameRate::new(48, 1);
    pub const FPS_50: FrameRate = FrameRate::new(50, 1);
    pub const FPS_60: FrameRate = FrameRate::new(60, 1);
    pub const FPS_120: FrameRate = FrameRate::new(120, 1);
    pub const NTSC_24: FrameRate = FrameRate::new(24000, 1001);
    pub const NTSC_30: FrameRate = FrameRate::new(30000, 1001);
    pub const NTSC_60: FrameRate = FrameRate::new(60000, 1001);

    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    /// A rate is usable when both terms are non-zero.
    pub const fn is_valid(&self) -> bool {
        self.numerator != 0 && self.denominator != 0
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SyncError::InvalidFrameRate(format!(
                "{}/{} is not a usable rate",
                self.numerator, self.denominator
            )))
        }
    }

    pub fn as_frames_per_second(&self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    /// Duration of a single frame.
    pub fn as_interval(&self) -> Duration {
        Duration::from_secs_f64(self.denominator as f64 / self.numerator as f64)
    }

    /// True when `other` ticks an integer number of times per tick of `self`
    /// (24fps is a multiple of itself, 48, 120; not of 25 or 29.97).
    pub fn is_multiple_of(&self, other: &FrameRate) -> bool {
        let lhs = other.numerator as u64 * self.denominator as u64;
        let rhs = self.numerator as u64 * other.denominator as u64;
        rhs != 0 && lhs % rhs == 0
    }

    /// True when `self` ticks an integer number of times per tick of `other`.
    pub fn is_factor_of(&self, other: &FrameRate) -> bool {
        other.is_multiple_of(self)
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        FrameRate::FPS_30
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{} fps", self.numerator)
        } else {
            write!(f, "{}/{} fps", self.numerator, self.denominator)
        }
    }
}
