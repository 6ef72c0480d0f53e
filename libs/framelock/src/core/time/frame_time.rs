// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use super::FrameRate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// Integer frame number plus a sub-frame fraction in `[0, 1)`.
///
/// A `FrameTime` is only meaningful relative to a [`FrameRate`]; arithmetic
/// and comparison are valid between times of the same rate. Cross-rate use
/// goes through [`transform`]. Negative times keep floor semantics: the frame
/// number is the floor and the sub-frame is always non-negative, so
/// `-0.5` frames is `{ frame: -1, subframe: 0.5 }`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FrameTime {
    frame: i64,
    subframe: f32,
}

/// Largest sub-frame value below 1.0.
pub const MAX_SUBFRAME: f32 = 0.999_999_94;

impl FrameTime {
    pub fn new(frame: i64, subframe: f32) -> Self {
        debug_assert!(
            (0.0..1.0).contains(&subframe),
            "subframe {subframe} out of [0, 1)"
        );
        Self {
            frame,
            subframe: subframe.clamp(0.0, MAX_SUBFRAME),
        }
    }

    pub const fn from_frame(frame: i64) -> Self {
        Self {
            frame,
            subframe: 0.0,
        }
    }

    pub const fn zero() -> Self {
        Self::from_frame(0)
    }

    pub const fn frame(&self) -> i64 {
        self.frame
    }

    pub const fn subframe(&self) -> f32 {
        self.subframe
    }

    pub const fn floor_to_frame(&self) -> i64 {
        self.frame
    }

    pub fn ceil_to_frame(&self) -> i64 {
        if self.subframe > 0.0 {
            self.frame + 1
        } else {
            self.frame
        }
    }

    /// Round to the nearest whole frame; exactly .5 rounds up.
    pub fn round_to_frame(&self) -> i64 {
        if self.subframe >= 0.5 {
            self.frame + 1
        } else {
            self.frame
        }
    }

    pub fn as_decimal(&self) -> f64 {
        self.frame as f64 + self.subframe as f64
    }

    pub fn as_seconds(&self, rate: FrameRate) -> f64 {
        self.as_decimal() * rate.denominator as f64 / rate.numerator as f64
    }

    fn from_decimal_parts(frame: i64, subframe: f64) -> Self {
        // Re-normalize a possibly out-of-range fraction back to [0, 1).
        // The f64->f32 cast can round a fraction just below 1.0 up to 1.0,
        // so clamp in f64 first.
        let carry = subframe.floor();
        let sub = (subframe - carry).min(MAX_SUBFRAME as f64);
        Self::new(frame + carry as i64, sub as f32)
    }
}

impl PartialEq for FrameTime {
    fn eq(&self, other: &Self) -> bool {
        self.frame == other.frame && self.subframe == other.subframe
    }
}

impl PartialOrd for FrameTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.frame.cmp(&other.frame) {
            Ordering::Equal => self.subframe.partial_cmp(&other.subframe),
            ord => Some(ord),
        }
    }
}

impl Add for FrameTime {
    type Output = FrameTime;

    fn add(self, rhs: FrameTime) -> FrameTime {
        let sub = self.subframe as f64 + rhs.subframe as f64;
        FrameTime::from_decimal_parts(self.frame + rhs.frame, sub)
    }
}

impl Add<i64> for FrameTime {
    type Output = FrameTime;

    fn add(self, rhs: i64) -> FrameTime {
        FrameTime::new(self.frame + rhs, self.subframe)
    }
}

impl Sub for FrameTime {
    type Output = FrameTime;

    fn sub(self, rhs: FrameTime) -> FrameTime {
        let sub = self.subframe as f64 - rhs.subframe as f64;
        FrameTime::from_decimal_parts(self.frame - rhs.frame, sub)
    }
}

impl Sub<i64> for FrameTime {
    type Output = FrameTime;

    fn sub(self, rhs: i64) -> FrameTime {
        FrameTime::new(self.frame - rhs, self.subframe)
    }
}

impl From<i64> for FrameTime {
    fn from(frame: i64) -> Self {
        FrameTime::from_frame(frame)
    }
}

impl fmt::Display for FrameTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:.3}", self.frame, self.subframe)
    }
}

/// Exact rational rescale of `time` from `from` ticks into `to` ticks.
///
/// The integer part is rescaled in 128-bit integer arithmetic (no precision
/// loss even for large frame counts); only the sub-frame goes through f64.
/// Callers that need an integral frame must pick a rounding explicitly;
/// [`FrameTime::round_to_frame`] is the round-to-nearest choice.
pub fn transform(time: FrameTime, from: FrameRate, to: FrameRate) -> FrameTime {
    if from == to {
        return time;
    }

    // time_in_to = time * (to.num * from.den) / (to.den * from.num)
    let num = to.numerator as i128 * from.denominator as i128;
    let den = to.denominator as i128 * from.numerator as i128;

    let scaled = time.frame() as i128 * num;
    let whole = scaled.div_euclid(den);
    let rem = scaled.rem_euclid(den);

    let sub = (rem as f64 + time.subframe() as f64 * num as f64) / den as f64;
    FrameTime::from_decimal_parts(whole as i64, sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nearly_equal(actual: FrameTime, expected: FrameTime) -> bool {
        actual.frame() == expected.frame()
            && (actual.subframe() - expected.subframe()).abs() < 1e-4
    }

    #[test]
    fn test_comparison_ordering() {
        let times = [
            FrameTime::new(-10, 0.0),
            FrameTime::new(-10, 0.32),
            FrameTime::new(-5, 0.0),
            FrameTime::new(-5, 0.99),
            FrameTime::new(0, 0.0),
            FrameTime::new(0, 0.64),
            FrameTime::new(3, 0.1),
            FrameTime::new(10, 0.99),
        ];

        for (i, lhs) in times.iter().enumerate() {
            for (j, rhs) in times.iter().enumerate() {
                assert_eq!(lhs < rhs, i < j, "{lhs} < {rhs}");
                assert_eq!(lhs == rhs, i == j, "{lhs} == {rhs}");
                assert_eq!(lhs > rhs, i > j, "{lhs} > {rhs}");
            }
        }
    }

    #[test]
    fn test_addition_carries_subframe() {
        let add = FrameTime::new(10, 0.8);
        assert!(nearly_equal(
            FrameTime::new(0, 0.32) + add,
            FrameTime::new(11, 0.12)
        ));
        assert!(nearly_equal(
            FrameTime::new(-10, 0.32) + add,
            FrameTime::new(1, 0.12)
        ));
        assert!(nearly_equal(
            FrameTime::new(5, 0.1) + add,
            FrameTime::new(15, 0.9)
        ));
    }

    #[test]
    fn test_addition_negative_floor_semantics() {
        let add = FrameTime::new(-13, 0.9);
        assert!(nearly_equal(
            FrameTime::new(0, 0.0) + add,
            FrameTime::new(-13, 0.9)
        ));
        assert!(nearly_equal(
            FrameTime::new(0, 0.32) + add,
            FrameTime::new(-12, 0.22)
        ));
    }

    #[test]
    fn test_subtraction_borrows_subframe() {
        let sub = FrameTime::new(10, 0.1);
        assert!(nearly_equal(
            FrameTime::new(0, 0.0) - sub,
            FrameTime::new(-11, 0.9)
        ));
        assert!(nearly_equal(
            FrameTime::new(10, 0.32) - sub,
            FrameTime::new(0, 0.22)
        ));
        assert!(nearly_equal(
            FrameTime::new(10, 0.0) - FrameTime::new(-13, 0.01),
            FrameTime::new(22, 0.99)
        ));
    }

    #[test]
    fn test_integer_offset_ops() {
        assert_eq!((FrameTime::new(5, 0.25) + 3).frame(), 8);
        assert_eq!((FrameTime::new(5, 0.25) - 8).frame(), -3);
        assert_eq!((FrameTime::new(5, 0.25) + 3).subframe(), 0.25);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(FrameTime::new(4, 0.49).round_to_frame(), 4);
        assert_eq!(FrameTime::new(4, 0.5).round_to_frame(), 5);
        assert_eq!(FrameTime::new(4, 0.1).ceil_to_frame(), 5);
        assert_eq!(FrameTime::from_frame(4).ceil_to_frame(), 4);
        assert_eq!(FrameTime::new(-3, 0.7).floor_to_frame(), -3);
    }

    #[test]
    fn test_transform_60_to_30() {
        // Halving the rate halves the frame count; odd frames become .5.
        let cases = [
            (FrameTime::from_frame(0), FrameTime::from_frame(0)),
            (FrameTime::from_frame(10), FrameTime::from_frame(5)),
            (FrameTime::new(3, 0.0), FrameTime::new(1, 0.5)),
            (FrameTime::new(-10, 0.0), FrameTime::new(-5, 0.0)),
            (FrameTime::new(-5, 0.0), FrameTime::new(-3, 0.5)),
            (FrameTime::new(-10, 0.32), FrameTime::new(-5, 0.16)),
        ];

        for (input, expected) in cases {
            let actual = transform(input, FrameRate::FPS_60, FrameRate::FPS_30);
            assert!(nearly_equal(actual, expected), "{input} -> {actual}");
        }
    }

    #[test]
    fn test_transform_to_ntsc() {
        // 60fps frame 6 = 0.1s = 2.997 frames at 29.97.
        let actual = transform(
            FrameTime::from_frame(6),
            FrameRate::FPS_60,
            FrameRate::NTSC_30,
        );
        assert_eq!(actual.frame(), 2);
        assert!((actual.subframe() - 0.997).abs() < 1e-4);
    }

    #[test]
    fn test_transform_identity() {
        let t = FrameTime::new(41, 0.64);
        assert_eq!(transform(t, FrameRate::FPS_60, FrameRate::FPS_60), t);
    }

    #[test]
    fn test_transform_roundtrip_within_one_frame() {
        let rates = [
            (FrameRate::FPS_60, FrameRate::FPS_30),
            (FrameRate::FPS_60, FrameRate::NTSC_30),
            (FrameRate::FPS_24, FrameRate::NTSC_60),
            (FrameRate::FPS_25, FrameRate::FPS_50),
        ];
        let times = [-100i64, -7, 0, 3, 59, 1439, 86_399];

        for (a, b) in rates {
            for frame in times {
                let t = FrameTime::new(frame, 0.32);
                let back = transform(transform(t, a, b), b, a);
                assert!(
                    (back.as_decimal() - t.as_decimal()).abs() < 1.0,
                    "{t} via {a}->{b}->{a} came back as {back}"
                );
            }
        }
    }

    #[test]
    fn test_large_frame_counts_do_not_overflow() {
        // A day of 60fps frames rescaled to NTSC rates stays exact in the
        // integer part.
        let day = FrameTime::from_frame(60 * 60 * 60 * 24);
        let ntsc = transform(day, FrameRate::FPS_60, FrameRate::NTSC_60);
        assert_eq!(ntsc.frame(), 60 * 60 * 60 * 24 * 1000 / 1001);
    }

    #[test]
    fn test_as_seconds() {
        assert!((FrameTime::from_frame(60).as_seconds(FrameRate::FPS_60) - 1.0).abs() < 1e-12);
        assert!(
            (FrameTime::new(0, 0.64).as_seconds(FrameRate::FPS_60) - 0.0106666).abs() < 1e-4
        );
    }
}
