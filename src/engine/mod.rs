// SPDX-License-Identifier: MIT

pub mod mpv;

use anyhow::Result;

pub use mpv::MpvEngine;

/// Discrete playback states reported by the rendering engine. The engine is
/// push-poor: these are derived by polling, never delivered as events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Unstarted,
    Ended,
    Playing,
    Paused,
    Buffering,
    Cued,
}

/// Control and query surface of the external media renderer.
///
/// The session controller exclusively owns the handle; nothing else may call
/// control methods on it. Queries may fail transiently (e.g. the process is
/// mid-teardown); callers treat per-call errors as skippable.
pub trait Engine {
    fn load(&mut self, video_id: &str) -> Result<()>;
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self) -> Result<()>;
    fn seek_to(&mut self, seconds: f64) -> Result<()>;
    fn set_volume(&mut self, percent: i64) -> Result<()>;
    fn current_time(&mut self) -> Result<f64>;
    fn duration(&mut self) -> Result<f64>;
    fn state(&mut self) -> Result<EngineState>;
}
