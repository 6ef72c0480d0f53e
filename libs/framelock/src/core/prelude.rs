// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Convenience re-exports for host integrations.
//!
//! ```rust,ignore
//! use framelock::core::prelude::*;
//! ```

pub use crate::core::clocks::{Clock, ManualClock, SoftwareClock};
pub use crate::core::config::{SyncMode, SynchronizerConfig};
pub use crate::core::error::{Result, SyncError};
pub use crate::core::events::SyncEvent;
pub use crate::core::registry::HostRegistry;
pub use crate::core::sources::ScriptedSource;
pub use crate::core::synchronizer::{
    SynchronizationState, SynchronizerStatus, TimecodeSynchronizer,
};
pub use crate::core::time::{FrameRate, FrameTime, Timecode};
pub use crate::core::traits::{
    GenlockSource, GenlockStatus, InputSource, OpenParams, ProviderStatus, StartParams,
    TimecodeProvider,
};
