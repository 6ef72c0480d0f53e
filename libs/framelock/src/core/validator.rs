// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Cross-source consistency validation.
//!
//! During pre-roll every active source's transformed sample window is checked
//! against every other's: windows must be self-consistent under the rollover
//! regime, all sources must agree on whether a rollover event is in progress,
//! and the per-source windows must leave a non-empty intersection for the
//! candidate sync frame to land in. Once synchronized this full validation is
//! replaced by a cheaper per-source containment check.

use crate::core::config::CachedSyncState;
use crate::core::error::{Result, SyncError};
use crate::core::source_state::TimecodeSourceState;
use crate::core::time::{
    distance_with_rollover, is_between, is_between_with_rollover, FrameTime,
};
use tracing::debug;

/// Whether a source window is currently straddling the rollover point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverState {
    NoWrap,
    Wrapped,
}

/// The agreed intersection of all source windows, plus the offset helpers the
/// state machine's sync modes are built on.
#[derive(Debug, Clone)]
pub struct ValidatedWindow {
    oldest: FrameTime,
    newest: FrameTime,
    rollover_state: RolloverState,
    rollover: Option<FrameTime>,
}

impl ValidatedWindow {
    pub fn oldest(&self) -> FrameTime {
        self.oldest
    }

    pub fn newest(&self) -> FrameTime {
        self.newest
    }

    pub fn rollover_state(&self) -> RolloverState {
        self.rollover_state
    }

    /// Rollover-aware containment of a candidate sync frame.
    pub fn contains_frame(&self, candidate: FrameTime) -> Result<bool> {
        match self.rollover {
            Some(rollover) => {
                is_between_with_rollover(candidate, self.oldest, self.newest, rollover)
            }
            None => Ok(is_between(candidate, self.oldest, self.newest)),
        }
    }

    /// Signed frame count from `frame` to the newest commonly available
    /// frame. The `Auto` sync mode anchors here.
    pub fn offset_to_newest(&self, frame: FrameTime) -> Result<i64> {
        self.offset_to(self.newest, frame)
    }

    /// Signed frame count from `frame` to the oldest commonly available
    /// frame. The `AutoOldest` sync mode anchors here.
    pub fn offset_to_oldest(&self, frame: FrameTime) -> Result<i64> {
        self.offset_to(self.oldest, frame)
    }

    fn offset_to(&self, target: FrameTime, frame: FrameTime) -> Result<i64> {
        match self.rollover {
            Some(rollover) => Ok(distance_with_rollover(target, frame, rollover)?.0),
            None => Ok(target.frame() - frame.frame()),
        }
    }
}

fn classify(
    name: &str,
    state: &TimecodeSourceState,
    sync: &CachedSyncState,
) -> Result<RolloverState> {
    let oldest = state.oldest_available_sample;
    let newest = state.newest_available_sample;

    let Some(rollover) = sync.rollover else {
        if oldest > newest {
            return Err(SyncError::Consistency(format!(
                "source '{name}' reports an out-of-order window \
                 (oldest {oldest} > newest {newest}) with rollover disabled"
            )));
        }
        return Ok(RolloverState::NoWrap);
    };

    let bound = FrameTime::from_frame(rollover.frame());
    for (label, t) in [("oldest", oldest), ("newest", newest)] {
        if t < FrameTime::zero() || t >= bound {
            return Err(SyncError::Consistency(format!(
                "source '{name}' reports a {label} sample {t} beyond the \
                 rollover bound {bound}"
            )));
        }
    }

    if oldest <= newest {
        return Ok(RolloverState::NoWrap);
    }

    // oldest > newest claims an in-progress rollover. Small backward jitter
    // can fake that; a genuine wrap leaves the two ends most of a period
    // apart.
    let gap = oldest.frame() - newest.frame();
    if gap < rollover.frame() / 2 {
        return Err(SyncError::Consistency(format!(
            "source '{name}' claims a rollover but oldest {oldest} is only \
             {gap} frames past newest {newest} (period {})",
            rollover.frame()
        )));
    }

    Ok(RolloverState::Wrapped)
}

/// Validate the transformed windows of all sources used for synchronization
/// and compute their intersection.
///
/// Windows arrive already transformed into the synchronizer's rate. The first
/// source seeds the accumulator; each subsequent source narrows it
/// (`newest = min`, `oldest = max`).
pub fn validate_sources<'a>(
    sync: &CachedSyncState,
    sources: impl IntoIterator<Item = (&'a str, &'a TimecodeSourceState)>,
) -> Result<ValidatedWindow> {
    let mut accumulated: Option<(ValidatedWindow, &str)> = None;

    for (name, state) in sources {
        let rollover_state = classify(name, state, sync)?;

        match &mut accumulated {
            None => {
                accumulated = Some((
                    ValidatedWindow {
                        oldest: state.oldest_available_sample,
                        newest: state.newest_available_sample,
                        rollover_state,
                        rollover: sync.rollover,
                    },
                    name,
                ));
            }
            Some((window, first_name)) => {
                if window.rollover_state != rollover_state {
                    return Err(SyncError::Consistency(format!(
                        "rollover mismatch: source '{first_name}' reports \
                         {:?} while source '{name}' reports {rollover_state:?}",
                        window.rollover_state
                    )));
                }
                if state.oldest_available_sample > window.oldest {
                    window.oldest = state.oldest_available_sample;
                }
                if state.newest_available_sample < window.newest {
                    window.newest = state.newest_available_sample;
                }
            }
        }
    }

    let (window, _) = accumulated.ok_or(SyncError::NoUsableSources)?;
    debug!(
        oldest = %window.oldest,
        newest = %window.newest,
        rollover_state = ?window.rollover_state,
        "validated source intersection"
    );
    Ok(window)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SynchronizerConfig;
    use crate::core::time::FrameRate;

    fn sync_state(rollover: Option<i64>) -> CachedSyncState {
        let config = SynchronizerConfig {
            frame_rate: FrameRate::FPS_30,
            rollover: rollover.map(FrameTime::from_frame),
            ..Default::default()
        };
        CachedSyncState::snapshot(&config)
    }

    fn window(oldest: i64, newest: i64) -> TimecodeSourceState {
        TimecodeSourceState::new(FrameTime::from_frame(oldest), FrameTime::from_frame(newest))
    }

    #[test]
    fn test_three_source_intersection() {
        let sync = sync_state(None);
        let a = window(10, 100);
        let b = window(20, 90);
        let c = window(15, 95);

        let validated = validate_sources(
            &sync,
            [("a", &a), ("b", &b), ("c", &c)],
        )
        .unwrap();

        assert_eq!(validated.oldest().frame(), 20);
        assert_eq!(validated.newest().frame(), 90);
        assert_eq!(validated.rollover_state(), RolloverState::NoWrap);
    }

    #[test]
    fn test_no_sources_is_an_error() {
        let sync = sync_state(None);
        let result = validate_sources(&sync, []);
        assert!(matches!(result, Err(SyncError::NoUsableSources)));
    }

    #[test]
    fn test_inverted_window_without_rollover_rejected() {
        let sync = sync_state(None);
        let bad = window(100, 20);
        let err = validate_sources(&sync, [("deck", &bad)]).unwrap_err();
        assert!(matches!(err, SyncError::Consistency(_)));
        assert!(err.to_string().contains("deck"));
    }

    #[test]
    fn test_rollover_mismatch_rejected() {
        // One source has wrapped (1195 -> 5 with a period of 1200), the
        // other has not; they cannot both be right.
        let sync = sync_state(Some(1200));
        let wrapped = window(1195, 5);
        let plain = window(1190, 1198);

        let err =
            validate_sources(&sync, [("wrapped", &wrapped), ("plain", &plain)]).unwrap_err();
        assert!(matches!(err, SyncError::Consistency(_)));
        assert!(err.to_string().contains("rollover mismatch"));
    }

    #[test]
    fn test_agreeing_wrapped_sources_intersect() {
        let sync = sync_state(Some(1200));
        let a = window(1150, 20);
        let b = window(1180, 10);

        let validated = validate_sources(&sync, [("a", &a), ("b", &b)]).unwrap();
        assert_eq!(validated.oldest().frame(), 1180);
        assert_eq!(validated.newest().frame(), 10);
        assert_eq!(validated.rollover_state(), RolloverState::Wrapped);

        assert!(validated.contains_frame(FrameTime::from_frame(1195)).unwrap());
        assert!(validated.contains_frame(FrameTime::from_frame(5)).unwrap());
        assert!(!validated.contains_frame(FrameTime::from_frame(600)).unwrap());
    }

    #[test]
    fn test_window_beyond_rollover_bound_rejected() {
        let sync = sync_state(Some(1200));
        let bad = window(1100, 1250);
        let err = validate_sources(&sync, [("deck", &bad)]).unwrap_err();
        assert!(matches!(err, SyncError::Consistency(_)));
    }

    #[test]
    fn test_small_backward_jitter_is_not_a_rollover() {
        // oldest just ahead of newest is jitter, not a 1200-frame wrap.
        let sync = sync_state(Some(1200));
        let jitter = window(500, 490);
        let err = validate_sources(&sync, [("deck", &jitter)]).unwrap_err();
        assert!(matches!(err, SyncError::Consistency(_)));
    }

    #[test]
    fn test_offset_helpers_plain() {
        let sync = sync_state(None);
        let a = window(10, 100);
        let validated = validate_sources(&sync, [("a", &a)]).unwrap();

        assert_eq!(validated.offset_to_newest(FrameTime::from_frame(40)).unwrap(), 60);
        assert_eq!(validated.offset_to_oldest(FrameTime::from_frame(40)).unwrap(), -30);
    }

    #[test]
    fn test_offset_helpers_through_rollover() {
        let sync = sync_state(Some(1200));
        let a = window(1150, 20);
        let validated = validate_sources(&sync, [("a", &a)]).unwrap();

        // Provider sits at 1190; the newest common frame (20) is 30 frames
        // ahead through the wrap.
        assert_eq!(
            validated.offset_to_newest(FrameTime::from_frame(1190)).unwrap(),
            30
        );
        assert_eq!(
            validated.offset_to_oldest(FrameTime::from_frame(1190)).unwrap(),
            -40
        );
    }

    #[test]
    fn test_containment_boundaries() {
        let sync = sync_state(None);
        let a = window(20, 90);
        let validated = validate_sources(&sync, [("a", &a)]).unwrap();

        assert!(validated.contains_frame(FrameTime::from_frame(20)).unwrap());
        assert!(validated.contains_frame(FrameTime::from_frame(90)).unwrap());
        assert!(!validated.contains_frame(FrameTime::from_frame(19)).unwrap());
        assert!(!validated.contains_frame(FrameTime::from_frame(91)).unwrap());
    }
}
