// SPDX-License-Identifier: MIT

pub mod guide;
pub mod progress;
pub mod queue;

use crate::config::PlaybackConfig;
use crate::engine::{Engine, EngineState};
use crate::provider::{Channel, Video};
use progress::ProgressTracker;
use queue::PlaybackQueue;
use std::time::Instant;
use tracing::{debug, info, warn};

pub use guide::GuideNavigator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Playing,
    Paused,
}

/// Read-only view of the session for rendering.
#[derive(Debug, Clone)]
pub struct PlaybackSnapshot {
    pub channel: Option<Channel>,
    pub video: Option<Video>,
    pub state: SessionState,
    pub is_playing: bool,
    pub volume: i64,
    pub elapsed_seconds: f64,
    pub duration_seconds: f64,
    pub progress_percent: f64,
    pub queue_position: usize,
    pub queue_len: usize,
}

/// Owns current-channel/current-video state and reconciles it against the
/// poll-based rendering engine.
///
/// Two independent detectors can report the end of a video: the coarse poll's
/// near-end signal and the engine's own `Ended` state. Both funnel into
/// [`advance_if_current`], which is keyed by video identity, so whichever
/// fires first wins and the other becomes a no-op. Timer cancellation always
/// happens before new queue state is committed; a late poll can then only
/// observe the cancelled outcome.
///
/// [`advance_if_current`]: SessionController::advance_if_current
pub struct SessionController {
    engine: Option<Box<dyn Engine>>,
    queue: PlaybackQueue,
    tracker: ProgressTracker,
    state: SessionState,
    current_channel: Option<Channel>,
    volume: i64,
    elapsed: f64,
    duration: f64,
    last_engine_state: Option<EngineState>,
}

impl SessionController {
    pub fn new(config: &PlaybackConfig) -> Self {
        Self {
            engine: None,
            queue: PlaybackQueue::new(),
            tracker: ProgressTracker::new(
                config.coarse_poll(),
                config.fine_poll(),
                config.early_advance_threshold_secs,
            ),
            state: SessionState::Idle,
            current_channel: None,
            volume: config.default_volume.clamp(0, 100),
            elapsed: 0.0,
            duration: 0.0,
            last_engine_state: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SessionState::Playing
    }

    pub fn volume(&self) -> i64 {
        self.volume
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn current_channel(&self) -> Option<&Channel> {
        self.current_channel.as_ref()
    }

    pub fn current_video(&self) -> Option<&Video> {
        self.queue.current()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let progress_percent = if self.duration > 0.0 {
            (self.elapsed / self.duration * 100.0).clamp(0.0, 100.0)
        } else {
            0.0
        };
        PlaybackSnapshot {
            channel: self.current_channel.clone(),
            video: self.queue.current().cloned(),
            state: self.state,
            is_playing: self.is_playing(),
            volume: self.volume,
            elapsed_seconds: self.elapsed.max(0.0),
            duration_seconds: self.duration.max(0.0),
            progress_percent,
            queue_position: self.queue.position(),
            queue_len: self.queue.len(),
        }
    }

    /// Commits a new channel and its video queue. The caller has already
    /// fetched the videos; nothing here touches the network, and the quote
    /// refresh for the new ticker runs elsewhere without gating this switch.
    pub fn select_channel(&mut self, channel: Channel, videos: Vec<Video>) {
        // Old video's polls die before any new state is committed.
        self.tracker.cancel();
        self.elapsed = 0.0;
        self.duration = 0.0;

        info!(
            "Switching to channel {} ({}), {} videos",
            channel.channel_number,
            channel.ticker,
            videos.len()
        );
        self.current_channel = Some(channel);
        self.queue.set_queue(videos);

        if self.queue.current().is_some() {
            self.state = SessionState::Loading;
            self.load_current();
        } else {
            self.state = SessionState::Idle;
            info!("Channel has no videos");
        }
    }

    /// Attaches the engine handle this controller exclusively owns from now
    /// on. The stored volume is applied immediately; if a video is already
    /// selected it starts playing.
    pub fn on_engine_ready(&mut self, mut engine: Box<dyn Engine>) {
        if let Err(e) = engine.set_volume(self.volume) {
            debug!("Could not apply initial volume: {}", e);
        }
        if let Ok(d) = engine.duration() {
            self.duration = d.max(0.0);
        }
        self.engine = Some(engine);
        self.last_engine_state = None;

        if self.queue.current().is_some() {
            self.load_current();
            if self.state == SessionState::Loading {
                self.state = SessionState::Playing;
            }
        }
    }

    /// Loads the current video into the engine and arms the polls for it.
    fn load_current(&mut self) {
        let Some(video) = self.queue.current().cloned() else {
            return;
        };
        let Some(engine) = self.engine.as_mut() else {
            // Polls stay unarmed until a handle attaches.
            return;
        };

        if let Err(e) = engine.load(&video.video_id) {
            warn!("Failed to load video {}: {}", video.video_id, e);
        }
        self.tracker.arm(video.video_id.clone(), Instant::now());
        // Whatever end-of-file the engine still reports belongs to the
        // previous file; ignore it until a non-Ended state is observed.
        self.last_engine_state = Some(EngineState::Ended);
    }

    /// The reconciliation primitive both end-of-video detectors call.
    ///
    /// No-op unless `video_id` is still the current video, so a detector
    /// firing late — after a channel switch or after the other detector
    /// already advanced — changes nothing.
    pub fn advance_if_current(&mut self, video_id: &str) {
        let Some(current) = self.queue.current() else {
            return;
        };
        if current.video_id != video_id {
            debug!(
                "Ignoring stale advance for {} (current is {})",
                video_id, current.video_id
            );
            return;
        }

        self.tracker.cancel();
        self.elapsed = 0.0;
        self.duration = 0.0;
        self.last_engine_state = Some(EngineState::Ended);

        match self.queue.advance().map(|v| v.title.clone()) {
            Some(title) => {
                debug!("Advancing to next video: {}", title);
                self.state = SessionState::Loading;
                self.load_current();
            }
            None => {
                self.state = SessionState::Idle;
            }
        }
    }

    /// Maps a discrete engine state onto session transitions.
    pub fn on_engine_state_changed(&mut self, engine_state: EngineState) {
        match engine_state {
            EngineState::Playing => {
                if self.queue.current().is_some() {
                    self.state = SessionState::Playing;
                }
            }
            EngineState::Paused => {
                if matches!(self.state, SessionState::Playing | SessionState::Paused) {
                    self.state = SessionState::Paused;
                }
            }
            EngineState::Ended => {
                if let Some(id) = self.queue.current().map(|v| v.video_id.clone()) {
                    self.advance_if_current(&id);
                }
            }
            EngineState::Unstarted | EngineState::Buffering | EngineState::Cued => {}
        }
    }

    /// Toggles playback. Silently ignored while no engine handle is attached;
    /// the engine may simply not have finished initializing.
    pub fn play_pause(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            debug!("Ignoring play/pause before engine attach");
            return;
        };
        match self.state {
            SessionState::Playing => {
                if let Err(e) = engine.pause() {
                    warn!("Pause failed: {}", e);
                } else {
                    self.state = SessionState::Paused;
                }
            }
            SessionState::Paused | SessionState::Loading => {
                if let Err(e) = engine.play() {
                    warn!("Play failed: {}", e);
                } else {
                    self.state = SessionState::Playing;
                }
            }
            SessionState::Idle => {}
        }
    }

    pub fn seek_relative(&mut self, delta_seconds: f64) {
        let target = (self.elapsed + delta_seconds).clamp(0.0, self.duration.max(0.0));
        self.seek_to(target);
    }

    /// Seeks to a fraction of the video, `0.0..=1.0`.
    pub fn seek_absolute(&mut self, fraction: f64) {
        let fraction = fraction.clamp(0.0, 1.0);
        self.seek_to(fraction * self.duration.max(0.0));
    }

    fn seek_to(&mut self, seconds: f64) {
        if self.queue.current().is_none() {
            return;
        }
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        match engine.seek_to(seconds) {
            Ok(()) => self.elapsed = seconds,
            Err(e) => debug!("Seek failed: {}", e),
        }
    }

    /// Clamps into `[0, 100]` and remembers the value even with no engine
    /// attached; it is applied on attach.
    pub fn set_volume(&mut self, volume: i64) {
        self.volume = volume.clamp(0, 100);
        if let Some(engine) = self.engine.as_mut()
            && let Err(e) = engine.set_volume(self.volume)
        {
            debug!("Volume change failed: {}", e);
        }
    }

    pub fn adjust_volume(&mut self, delta: i64) {
        self.set_volume(self.volume + delta);
    }

    /// Drives all due polls. Called from the single-threaded app tick; every
    /// engine query error is swallowed for that tick only.
    pub fn tick(&mut self) {
        if self.engine.is_none() {
            return;
        }
        let now = Instant::now();
        self.poll_fine(now);
        self.poll_coarse(now);
        self.poll_engine_state();
    }

    fn is_current(&self, video_id: &str) -> bool {
        self.queue
            .current()
            .is_some_and(|v| v.video_id == video_id)
    }

    fn read_times(&mut self) -> Option<(f64, f64)> {
        let engine = self.engine.as_mut()?;
        match (engine.current_time(), engine.duration()) {
            (Ok(elapsed), Ok(duration)) => Some((elapsed.max(0.0), duration.max(0.0))),
            (Err(e), _) | (_, Err(e)) => {
                debug!("Engine time query failed, retrying next tick: {}", e);
                None
            }
        }
    }

    fn poll_fine(&mut self, now: Instant) {
        let Some(video_id) = self.tracker.fine_due(now) else {
            return;
        };
        if !self.is_current(&video_id) {
            return;
        }
        if let Some((elapsed, duration)) = self.read_times() {
            self.elapsed = elapsed;
            self.duration = duration;
        }
    }

    fn poll_coarse(&mut self, now: Instant) {
        let Some(video_id) = self.tracker.coarse_due(now) else {
            return;
        };
        if !self.is_current(&video_id) {
            return;
        }
        if let Some((elapsed, duration)) = self.read_times()
            && self.tracker.note_coarse_reading(&video_id, elapsed, duration)
        {
            self.advance_if_current(&video_id);
        }
    }

    fn poll_engine_state(&mut self) {
        let observed = {
            let Some(engine) = self.engine.as_mut() else {
                return;
            };
            match engine.state() {
                Ok(state) => state,
                Err(e) => {
                    debug!("Engine state query failed, retrying next tick: {}", e);
                    return;
                }
            }
        };

        if self.last_engine_state != Some(observed) {
            self.last_engine_state = Some(observed);
            self.on_engine_state_changed(observed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TrustTier;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Probe {
        loads: Vec<String>,
        seeks: Vec<f64>,
        volumes: Vec<i64>,
        time: f64,
        duration: f64,
        state: EngineState,
        fail_queries: bool,
    }

    impl Probe {
        fn new() -> Self {
            Self {
                loads: Vec::new(),
                seeks: Vec::new(),
                volumes: Vec::new(),
                time: 0.0,
                duration: 0.0,
                state: EngineState::Unstarted,
                fail_queries: false,
            }
        }
    }

    struct FakeEngine(Rc<RefCell<Probe>>);

    impl Engine for FakeEngine {
        fn load(&mut self, video_id: &str) -> anyhow::Result<()> {
            self.0.borrow_mut().loads.push(video_id.to_string());
            Ok(())
        }

        fn play(&mut self) -> anyhow::Result<()> {
            self.0.borrow_mut().state = EngineState::Playing;
            Ok(())
        }

        fn pause(&mut self) -> anyhow::Result<()> {
            self.0.borrow_mut().state = EngineState::Paused;
            Ok(())
        }

        fn seek_to(&mut self, seconds: f64) -> anyhow::Result<()> {
            self.0.borrow_mut().seeks.push(seconds);
            Ok(())
        }

        fn set_volume(&mut self, percent: i64) -> anyhow::Result<()> {
            self.0.borrow_mut().volumes.push(percent);
            Ok(())
        }

        fn current_time(&mut self) -> anyhow::Result<f64> {
            let probe = self.0.borrow();
            if probe.fail_queries {
                anyhow::bail!("engine handle disposed");
            }
            Ok(probe.time)
        }

        fn duration(&mut self) -> anyhow::Result<f64> {
            let probe = self.0.borrow();
            if probe.fail_queries {
                anyhow::bail!("engine handle disposed");
            }
            Ok(probe.duration)
        }

        fn state(&mut self) -> anyhow::Result<EngineState> {
            let probe = self.0.borrow();
            if probe.fail_queries {
                anyhow::bail!("engine handle disposed");
            }
            Ok(probe.state)
        }
    }

    fn video(id: &str) -> Video {
        Video {
            id: id.to_string(),
            video_id: id.to_string(),
            title: format!("video {}", id),
            description: String::new(),
            thumbnail: String::new(),
            source: "YouTube".to_string(),
            trust_tier: TrustTier::Community,
            stock_ticker: "TEST".to_string(),
            duration: None,
            published_at: None,
            channel_title: None,
        }
    }

    fn channel(number: u32, ticker: &str) -> Channel {
        Channel {
            id: format!("ch-{}", number),
            channel_number: number,
            ticker: ticker.to_string(),
            company_name: format!("{} Inc.", ticker),
        }
    }

    /// Zero poll intervals: every poll is due on every tick.
    fn test_config() -> PlaybackConfig {
        PlaybackConfig {
            coarse_poll_ms: 0,
            fine_poll_ms: 0,
            early_advance_threshold_secs: 3.0,
            default_volume: 80,
            seek_step_secs: 10.0,
        }
    }

    fn session_with_engine() -> (SessionController, Rc<RefCell<Probe>>) {
        let mut session = SessionController::new(&test_config());
        let probe = Rc::new(RefCell::new(Probe::new()));
        session.on_engine_ready(Box::new(FakeEngine(probe.clone())));
        (session, probe)
    }

    #[test]
    fn test_select_channel_loads_first_video() {
        let (mut session, probe) = session_with_engine();
        session.select_channel(channel(1, "AAPL"), vec![video("a"), video("b")]);

        assert_eq!(session.state(), SessionState::Loading);
        assert_eq!(session.current_video().unwrap().video_id, "a");
        assert_eq!(probe.borrow().loads, vec!["a"]);
    }

    #[test]
    fn test_empty_channel_goes_idle_without_advancing() {
        let (mut session, probe) = session_with_engine();
        session.select_channel(channel(2, "MSFT"), Vec::new());

        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.current_video().is_none());
        assert!(probe.borrow().loads.is_empty());

        // An end-of-media report with nothing queued must stay inert.
        session.on_engine_state_changed(EngineState::Ended);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_near_end_advances_exactly_once() {
        let (mut session, probe) = session_with_engine();
        session.select_channel(channel(1, "AAPL"), vec![video("a"), video("b"), video("c")]);

        {
            let mut p = probe.borrow_mut();
            p.time = 97.5;
            p.duration = 100.0;
            // mpv notices the end at the same moment.
            p.state = EngineState::Ended;
        }

        session.tick();
        assert_eq!(session.current_video().unwrap().video_id, "b");
        assert_eq!(probe.borrow().loads, vec!["a", "b"]);

        // The engine keeps reporting Ended for the finished file for a few
        // more ticks; that must not advance again.
        probe.borrow_mut().time = 0.0;
        session.tick();
        session.tick();
        assert_eq!(session.current_video().unwrap().video_id, "b");
        assert_eq!(probe.borrow().loads, vec!["a", "b"]);
    }

    #[test]
    fn test_native_ended_advances_when_first() {
        let (mut session, probe) = session_with_engine();
        session.select_channel(channel(1, "AAPL"), vec![video("a"), video("b")]);

        session.on_engine_state_changed(EngineState::Ended);
        assert_eq!(session.current_video().unwrap().video_id, "b");
        assert_eq!(probe.borrow().loads, vec!["a", "b"]);
    }

    #[test]
    fn test_advance_wraps_to_first_video() {
        let (mut session, _probe) = session_with_engine();
        session.select_channel(channel(1, "AAPL"), vec![video("a"), video("b")]);

        session.advance_if_current("a");
        session.advance_if_current("b");
        assert_eq!(session.current_video().unwrap().video_id, "a");
        assert_eq!(session.state(), SessionState::Loading);
    }

    #[test]
    fn test_stale_advance_after_channel_switch_is_rejected() {
        let (mut session, probe) = session_with_engine();
        session.select_channel(channel(1, "AAPL"), vec![video("a")]);
        session.select_channel(channel(2, "MSFT"), vec![video("x"), video("y")]);

        // Simulated late fire of the old channel's near-end timer.
        session.advance_if_current("a");
        assert_eq!(session.current_video().unwrap().video_id, "x");
        assert_eq!(probe.borrow().loads, vec!["a", "x"]);
    }

    #[test]
    fn test_volume_clamped_and_applied_on_attach() {
        let mut session = SessionController::new(&test_config());
        session.set_volume(150);
        assert_eq!(session.volume(), 100);
        session.set_volume(-5);
        assert_eq!(session.volume(), 0);
        session.set_volume(60);

        let probe = Rc::new(RefCell::new(Probe::new()));
        session.on_engine_ready(Box::new(FakeEngine(probe.clone())));
        assert_eq!(probe.borrow().volumes, vec![60]);
    }

    #[test]
    fn test_seek_absolute_scales_by_duration() {
        let (mut session, probe) = session_with_engine();
        session.select_channel(channel(1, "AAPL"), vec![video("a")]);

        {
            let mut p = probe.borrow_mut();
            p.time = 10.0;
            p.duration = 200.0;
            p.state = EngineState::Playing;
        }
        session.tick();

        session.seek_absolute(0.5);
        assert_eq!(probe.borrow().seeks, vec![100.0]);
    }

    #[test]
    fn test_relative_seek_clamps_to_bounds() {
        let (mut session, probe) = session_with_engine();
        session.select_channel(channel(1, "AAPL"), vec![video("a")]);

        {
            let mut p = probe.borrow_mut();
            p.time = 5.0;
            p.duration = 60.0;
            p.state = EngineState::Playing;
        }
        session.tick();

        session.seek_relative(-30.0);
        session.seek_relative(120.0);
        let seeks = probe.borrow().seeks.clone();
        assert_eq!(seeks[0], 0.0);
        assert_eq!(seeks[1], 60.0);
    }

    #[test]
    fn test_play_pause_without_engine_is_silent() {
        let mut session = SessionController::new(&test_config());
        session.select_channel(channel(1, "AAPL"), vec![video("a")]);
        let before = session.state();
        session.play_pause();
        assert_eq!(session.state(), before);
    }

    #[test]
    fn test_play_pause_toggles() {
        let (mut session, _probe) = session_with_engine();
        session.select_channel(channel(1, "AAPL"), vec![video("a")]);
        session.on_engine_state_changed(EngineState::Playing);

        session.play_pause();
        assert_eq!(session.state(), SessionState::Paused);
        session.play_pause();
        assert_eq!(session.state(), SessionState::Playing);
    }

    #[test]
    fn test_polling_fault_is_swallowed_and_recovers() {
        let (mut session, probe) = session_with_engine();
        session.select_channel(channel(1, "AAPL"), vec![video("a")]);

        probe.borrow_mut().fail_queries = true;
        session.tick();
        assert_eq!(session.snapshot().elapsed_seconds, 0.0);

        {
            let mut p = probe.borrow_mut();
            p.fail_queries = false;
            p.time = 12.0;
            p.duration = 48.0;
            p.state = EngineState::Playing;
        }
        session.tick();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.elapsed_seconds, 12.0);
        assert_eq!(snapshot.progress_percent, 25.0);
    }

    #[test]
    fn test_progress_percent_zero_without_duration() {
        let (session, _probe) = session_with_engine();
        assert_eq!(session.snapshot().progress_percent, 0.0);
    }

    #[test]
    fn test_engine_pause_state_maps_to_paused() {
        let (mut session, probe) = session_with_engine();
        session.select_channel(channel(1, "AAPL"), vec![video("a")]);

        probe.borrow_mut().state = EngineState::Playing;
        session.tick();
        assert_eq!(session.state(), SessionState::Playing);

        probe.borrow_mut().state = EngineState::Paused;
        session.tick();
        assert_eq!(session.state(), SessionState::Paused);
    }
}
