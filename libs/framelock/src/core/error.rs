// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("invalid frame rate: {0}")]
    InvalidFrameRate(String),

    #[error("invalid rollover frame: {0}")]
    InvalidRollover(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("no sources available for synchronization")]
    NoUsableSources,

    #[error("registration conflict: {0}")]
    RegistrationConflict(String),

    #[error("source consistency error: {0}")]
    Consistency(String),

    #[error("pre-roll timed out after {0:?}")]
    PreRollTimeout(std::time::Duration),

    #[error("timecode provider error: {0}")]
    Provider(String),

    #[error("genlock error: {0}")]
    Genlock(String),

    #[error("source error: {0}")]
    Source(String),

    #[error("runtime error: {0}")]
    Runtime(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
