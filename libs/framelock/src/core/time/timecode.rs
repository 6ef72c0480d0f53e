// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use super::{FrameRate, FrameTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Human-readable hours:minutes:seconds:frames view of a [`FrameTime`].
///
/// For the /1001 NTSC rates (29.97, 59.94) the SMPTE drop-frame convention
/// applies: the first frame numbers of every minute are skipped, except every
/// tenth minute, so that displayed timecode tracks wall time. Drop-frame
/// timecode is written with a `;` before the frame field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timecode {
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
    pub frames: i32,
    pub drop_frame: bool,
}

impl Timecode {
    /// Whether `rate` is displayed as drop-frame timecode (29.97 / 59.94).
    pub fn uses_drop_frame(rate: FrameRate) -> bool {
        rate.denominator == 1001 && rate.numerator % 30000 == 0
    }

    /// Nominal whole frames per second used for display (30 for 29.97).
    fn display_fps(rate: FrameRate) -> i64 {
        (rate.as_frames_per_second()).round() as i64
    }

    /// Split a frame number into timecode fields at `rate`.
    ///
    /// Sub-frame content is discarded (timecode labels whole frames). Negative
    /// frame numbers are clamped to zero; a synchronized timeline never runs
    /// before its own epoch.
    pub fn from_frame_time(time: FrameTime, rate: FrameRate) -> Timecode {
        let fps = Self::display_fps(rate);
        let drop_frame = Self::uses_drop_frame(rate);
        let mut frame = time.frame().max(0);

        if drop_frame {
            // 2 frames dropped per minute at 29.97, 4 at 59.94, minute 0 of
            // each block of ten excepted.
            let dropped = fps / 15;
            let frames_per_min = fps * 60 - dropped;
            let frames_per_10min = fps * 600 - dropped * 9;

            let blocks = frame / frames_per_10min;
            let rem = frame % frames_per_10min;

            frame += dropped * 9 * blocks;
            if rem > dropped {
                frame += dropped * ((rem - dropped) / frames_per_min);
            }
        }

        Timecode {
            hours: (frame / (fps * 3600)) as i32,
            minutes: ((frame / (fps * 60)) % 60) as i32,
            seconds: ((frame / fps) % 60) as i32,
            frames: (frame % fps) as i32,
            drop_frame,
        }
    }

    /// Inverse of [`from_frame_time`](Self::from_frame_time).
    pub fn to_frame_time(&self, rate: FrameRate) -> FrameTime {
        let fps = Self::display_fps(rate);
        let total_minutes = self.hours as i64 * 60 + self.minutes as i64;
        let mut frame = (self.hours as i64 * 3600 + self.minutes as i64 * 60
            + self.seconds as i64)
            * fps
            + self.frames as i64;

        if self.drop_frame {
            let dropped = fps / 15;
            frame -= dropped * (total_minutes - total_minutes / 10);
        }

        FrameTime::from_frame(frame)
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = if self.drop_frame { ';' } else { ':' };
        write!(
            f,
            "{:02}:{:02}:{:02}{}{:02}",
            self.hours, self.minutes, self.seconds, sep, self.frames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_drop_display() {
        let tc = Timecode::from_frame_time(
            FrameTime::from_frame(60 * 3600 + 60 * 60 + 60 + 1),
            FrameRate::FPS_60,
        );
        assert_eq!(tc.to_string(), "01:01:01:01");
        assert!(!tc.drop_frame);
    }

    #[test]
    fn test_detects_drop_frame_rates() {
        assert!(Timecode::uses_drop_frame(FrameRate::NTSC_30));
        assert!(Timecode::uses_drop_frame(FrameRate::NTSC_60));
        assert!(!Timecode::uses_drop_frame(FrameRate::NTSC_24));
        assert!(!Timecode::uses_drop_frame(FrameRate::FPS_30));
    }

    #[test]
    fn test_drop_frame_skips_first_two_of_minute() {
        // Frame 1800 at 29.97 is one nominal minute in; frames :00 and :01
        // of minute one are dropped, so it displays as 00:01:00;02.
        let tc = Timecode::from_frame_time(FrameTime::from_frame(1800), FrameRate::NTSC_30);
        assert_eq!(tc.to_string(), "00:01:00;02");

        // Minute ten is exempt from the drop.
        let tc = Timecode::from_frame_time(FrameTime::from_frame(17982), FrameRate::NTSC_30);
        assert_eq!(tc.to_string(), "00:10:00;00");
    }

    #[test]
    fn test_drop_frame_roundtrip() {
        for frame in [0, 1, 1799, 1800, 17981, 17982, 107_892, 2_589_407] {
            let tc = Timecode::from_frame_time(FrameTime::from_frame(frame), FrameRate::NTSC_30);
            assert_eq!(
                tc.to_frame_time(FrameRate::NTSC_30).frame(),
                frame,
                "frame {frame} via {tc}"
            );
        }
    }

    #[test]
    fn test_non_drop_roundtrip() {
        for frame in [0, 59, 60, 3600, 86_399 * 24] {
            let tc = Timecode::from_frame_time(FrameTime::from_frame(frame), FrameRate::FPS_24);
            assert_eq!(tc.to_frame_time(FrameRate::FPS_24).frame(), frame);
        }
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        let tc = Timecode::from_frame_time(FrameTime::from_frame(-10), FrameRate::FPS_30);
        assert_eq!(tc.to_string(), "00:00:00:00");
    }

    #[test]
    fn test_subframe_discarded() {
        let tc = Timecode::from_frame_time(FrameTime::new(59, 0.9), FrameRate::FPS_30);
        assert_eq!(tc.to_string(), "00:00:01:29");
    }
}
