// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use crate::core::error::{Result, SyncError};
use crate::core::time::{FrameRate, FrameTime};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Policy for computing the offset between the provider clock and the
/// synchronized output clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMode {
    /// Constant operator-supplied offset.
    UserDefinedOffset,
    /// Anchor to the newest frame available in every source, then back off by
    /// the configured margin. Maximizes buffer depth.
    Auto,
    /// Anchor to the oldest frame available in every source, plus the margin.
    /// Minimizes latency at the cost of buffer depth.
    AutoOldest,
}

impl Default for SyncMode {
    fn default() -> Self {
        SyncMode::Auto
    }
}

/// Operator-facing configuration for one synchronizer instance.
///
/// Deserializable from host profiles (JSON or TOML). The configuration is
/// read once per attempt: the state machine snapshots it into a
/// [`CachedSyncState`] while `Initializing` and never re-reads it until the
/// next `start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynchronizerConfig {
    /// Target rate of the synchronized output clock.
    pub frame_rate: FrameRate,

    /// Offset policy.
    pub sync_mode: SyncMode,

    /// Offset applied in [`SyncMode::UserDefinedOffset`], in target-rate
    /// frames.
    pub frame_offset: i64,

    /// Safety margin applied by the automatic modes, in target-rate frames.
    pub auto_frame_offset: i64,

    /// Frame at which source counters wrap back to zero (e.g. 24h wall
    /// timecode). `None` disables rollover handling entirely.
    pub rollover: Option<FrameTime>,

    /// Wall-clock bound on the pre-roll negotiation.
    pub pre_roll_timeout: Duration,

    /// Index of the source acting as master clock when no external timecode
    /// provider is registered. The source must be marked as used for
    /// synchronization.
    pub master_source: Option<usize>,
}

impl Default for SynchronizerConfig {
    fn default() -> Self {
        Self {
            frame_rate: FrameRate::FPS_30,
            sync_mode: SyncMode::default(),
            frame_offset: 0,
            auto_frame_offset: 0,
            rollover: None,
            pre_roll_timeout: Duration::from_secs(30),
            master_source: None,
        }
    }
}

impl SynchronizerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| SyncError::Configuration(format!("bad JSON profile: {e}")))
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| SyncError::Configuration(format!("bad TOML profile: {e}")))
    }

    /// Reject configurations the state machine must never run with.
    pub fn validate(&self) -> Result<()> {
        self.frame_rate.validate()?;

        if let Some(rollover) = self.rollover {
            if rollover.frame() <= 0 {
                return Err(SyncError::InvalidRollover(format!(
                    "configured rollover frame must be positive, got {}",
                    rollover.frame()
                )));
            }
        }

        if self.auto_frame_offset < 0 {
            return Err(SyncError::Configuration(format!(
                "auto_frame_offset must be non-negative, got {}",
                self.auto_frame_offset
            )));
        }

        Ok(())
    }
}

/// Snapshot of the configuration taken at the start of one synchronization
/// attempt.
///
/// Immutable for the duration of the attempt: only the `Initializing` state
/// constructs one, and every later state reads through it, so a config edit
/// mid-attempt cannot produce a torn decision.
#[derive(Debug, Clone)]
pub struct CachedSyncState {
    pub frame_rate: FrameRate,
    pub sync_mode: SyncMode,
    pub frame_offset: i64,
    pub auto_frame_offset: i64,
    pub rollover: Option<FrameTime>,
}

impl CachedSyncState {
    pub fn snapshot(config: &SynchronizerConfig) -> Self {
        Self {
            frame_rate: config.frame_rate,
            sync_mode: config.sync_mode,
            frame_offset: config.frame_offset,
            auto_frame_offset: config.auto_frame_offset,
            rollover: config.rollover,
        }
    }

    pub fn rollover_enabled(&self) -> bool {
        self.rollover.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SynchronizerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_rollover() {
        let config = SynchronizerConfig {
            rollover: Some(FrameTime::from_frame(0)),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(SyncError::InvalidRollover(_))
        ));
    }

    #[test]
    fn test_rejects_invalid_rate() {
        let config = SynchronizerConfig {
            frame_rate: FrameRate::new(0, 1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = SynchronizerConfig {
            frame_rate: FrameRate::NTSC_30,
            sync_mode: SyncMode::AutoOldest,
            auto_frame_offset: 3,
            rollover: Some(FrameTime::from_frame(24 * 60 * 60 * 30)),
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let back = SynchronizerConfig::from_json_str(&json).unwrap();
        assert_eq!(back.frame_rate, FrameRate::NTSC_30);
        assert_eq!(back.sync_mode, SyncMode::AutoOldest);
        assert_eq!(back.auto_frame_offset, 3);
    }

    #[test]
    fn test_toml_profile() {
        let profile = r#"
            sync_mode = "Auto"
            frame_offset = 0
            auto_frame_offset = 2
            master_source = 0

            [frame_rate]
            numerator = 60
            denominator = 1

            [pre_roll_timeout]
            secs = 5
            nanos = 0
        "#;

        let config = SynchronizerConfig::from_toml_str(profile).unwrap();
        assert_eq!(config.frame_rate, FrameRate::FPS_60);
        assert_eq!(config.pre_roll_timeout, Duration::from_secs(5));
        assert_eq!(config.master_source, Some(0));
        assert!(config.rollover.is_none());
    }

    #[test]
    fn test_snapshot_copies_fields() {
        let config = SynchronizerConfig {
            sync_mode: SyncMode::UserDefinedOffset,
            frame_offset: 17,
            rollover: Some(FrameTime::from_frame(1200)),
            ..Default::default()
        };

        let cached = CachedSyncState::snapshot(&config);
        assert_eq!(cached.frame_offset, 17);
        assert!(cached.rollover_enabled());
        assert_eq!(cached.sync_mode, SyncMode::UserDefinedOffset);
    }
}
