//! Recording session management
//!
//! This module provides the `RecordingController` abstraction that manages:
//! - The idle -> recording -> sending -> idle lifecycle
//! - Codec negotiation against the capture backend
//! - Chunk buffering and final artifact assembly
//! - The display-only status line

mod controller;
mod stats;

pub use controller::{AudioArtifact, RecordingController, RecordingState};
pub use stats::SessionStats;
