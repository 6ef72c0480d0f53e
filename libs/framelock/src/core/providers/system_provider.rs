// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crate::core::clocks::Clock;
use crate::core::time::{FrameRate, FrameTime};
use crate::core::traits::{ProviderStatus, TimecodeProvider};
use std::sync::Arc;

/// Timecode provider derived from a wall [`Clock`].
///
/// The fallback master when no house sync or LTC feed is available: frame
/// time is simply elapsed wall time multiplied by the configured rate,
/// wrapped at the configured rollover. Accuracy is whatever the injected
/// clock delivers; there is no external signal to lock to, so the provider is
/// `Synchronized` from the moment it exists.
pub struct SystemTimecodeProvider {
    clock: Arc<dyn Clock>,
    rate: FrameRate,
    rollover: Option<FrameTime>,
}

impl SystemTimecodeProvider {
    pub fn new(clock: Arc<dyn Clock>, rate: FrameRate, rollover: Option<FrameTime>) -> Self {
        Self {
            clock,
            rate,
            rollover,
        }
    }
}

impl TimecodeProvider for SystemTimecodeProvider {
    fn status(&self) -> ProviderStatus {
        ProviderStatus::Synchronized
    }

    fn frame_time(&self) -> FrameTime {
        let seconds = self.clock.now().as_secs_f64();
        let frames = seconds * self.rate.numerator as f64 / self.rate.denominator as f64;

        let mut frame = frames.floor() as i64;
        if let Some(rollover) = self.rollover {
            if rollover.frame() > 0 {
                frame = frame.rem_euclid(rollover.frame());
            }
        }

        FrameTime::new(frame, (frames.fract()) as f32)
    }

    fn frame_rate(&self) -> FrameRate {
        self.rate
    }

    fn display_name(&self) -> &str {
        "System Timecode Provider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clocks::ManualClock;
    use std::time::Duration;

    #[test]
    fn test_frame_tracks_clock() {
        let clock = Arc::new(ManualClock::new());
        let provider = SystemTimecodeProvider::new(clock.clone(), FrameRate::FPS_30, None);

        assert_eq!(provider.frame_time().frame(), 0);

        clock.advance(Duration::from_secs(2));
        assert_eq!(provider.frame_time().frame(), 60);

        clock.advance(Duration::from_millis(50));
        let t = provider.frame_time();
        assert_eq!(t.frame(), 61);
        assert!((t.subframe() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_wraps_at_rollover() {
        let clock = Arc::new(ManualClock::new());
        let provider = SystemTimecodeProvider::new(
            clock.clone(),
            FrameRate::FPS_30,
            Some(FrameTime::from_frame(90)),
        );

        clock.advance(Duration::from_secs(4));
        // 120 frames wraps into [0, 90).
        assert_eq!(provider.frame_time().frame(), 30);
    }

    #[test]
    fn test_always_synchronized() {
        let provider = SystemTimecodeProvider::new(
            Arc::new(ManualClock::new()),
            FrameRate::FPS_60,
            None,
        );
        assert_eq!(provider.status(), ProviderStatus::Synchronized);
    }
}
