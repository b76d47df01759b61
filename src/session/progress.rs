// SPDX-License-Identifier: MIT

use std::time::{Duration, Instant};
use tracing::debug;

/// Deadline scheduler for the two playback polls, keyed to the identity of
/// the video they watch.
///
/// The coarse poll exists only to detect the approaching end of the current
/// video early enough to advance before the engine's own end-of-file handling
/// kicks in; it fires its signal at most once per armed video. The fine poll
/// merely refreshes the elapsed/duration numbers for display.
///
/// Both polls are cancelled together and re-armed whenever the loaded video
/// changes. A due-check for a video other than the armed one always comes
/// back empty, so late ticks for a superseded video cannot mutate anything.
#[derive(Debug)]
pub struct ProgressTracker {
    coarse_interval: Duration,
    fine_interval: Duration,
    threshold_secs: f64,
    armed: Option<ArmedPolls>,
}

#[derive(Debug)]
struct ArmedPolls {
    video_id: String,
    next_coarse: Instant,
    next_fine: Instant,
    near_end_fired: bool,
}

impl ProgressTracker {
    pub fn new(coarse_interval: Duration, fine_interval: Duration, threshold_secs: f64) -> Self {
        Self {
            coarse_interval,
            fine_interval,
            threshold_secs,
            armed: None,
        }
    }

    /// Arms both polls for `video_id`, cancelling whatever was armed before.
    pub fn arm(&mut self, video_id: String, now: Instant) {
        if let Some(old) = self.armed.take() {
            debug!("Cancelling polls for superseded video {}", old.video_id);
        }
        self.armed = Some(ArmedPolls {
            video_id,
            next_coarse: now + self.coarse_interval,
            next_fine: now + self.fine_interval,
            near_end_fired: false,
        });
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn armed_video(&self) -> Option<&str> {
        self.armed.as_ref().map(|a| a.video_id.as_str())
    }

    /// When the fine poll is due, reschedules it and returns the armed video
    /// id the caller must verify before touching state.
    pub fn fine_due(&mut self, now: Instant) -> Option<String> {
        let armed = self.armed.as_mut()?;
        if now < armed.next_fine {
            return None;
        }
        armed.next_fine = now + self.fine_interval;
        Some(armed.video_id.clone())
    }

    /// Same as [`fine_due`] for the coarse poll. Once the near-end signal has
    /// fired the coarse poll stays silent until re-armed.
    pub fn coarse_due(&mut self, now: Instant) -> Option<String> {
        let armed = self.armed.as_mut()?;
        if armed.near_end_fired || now < armed.next_coarse {
            return None;
        }
        armed.next_coarse = now + self.coarse_interval;
        Some(armed.video_id.clone())
    }

    /// Feeds a coarse-poll reading back in. Returns `true` exactly once per
    /// armed video, when the remaining time drops inside the early-advance
    /// window; firing disarms the coarse poll.
    pub fn note_coarse_reading(&mut self, video_id: &str, elapsed: f64, duration: f64) -> bool {
        let Some(armed) = self.armed.as_mut() else {
            return false;
        };
        if armed.video_id != video_id || armed.near_end_fired {
            return false;
        }
        if duration <= 0.0 {
            return false;
        }

        let remaining = duration - elapsed;
        if remaining > 0.0 && remaining < self.threshold_secs {
            armed.near_end_fired = true;
            debug!(
                "Near-end signal for {} ({:.1}s remaining)",
                video_id, remaining
            );
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> ProgressTracker {
        ProgressTracker::new(Duration::from_millis(500), Duration::from_millis(100), 3.0)
    }

    #[test]
    fn test_polls_due_after_interval() {
        let mut t = tracker();
        let start = Instant::now();
        t.arm("v1".to_string(), start);

        assert!(t.fine_due(start).is_none());
        assert_eq!(
            t.fine_due(start + Duration::from_millis(100)).as_deref(),
            Some("v1")
        );
        assert!(t.coarse_due(start + Duration::from_millis(100)).is_none());
        assert_eq!(
            t.coarse_due(start + Duration::from_millis(500)).as_deref(),
            Some("v1")
        );
    }

    #[test]
    fn test_near_end_fires_exactly_once() {
        let mut t = tracker();
        let start = Instant::now();
        t.arm("v1".to_string(), start);

        // duration=100, elapsed=97.5 -> remaining=2.5 < 3.0
        assert!(t.note_coarse_reading("v1", 97.5, 100.0));
        assert!(!t.note_coarse_reading("v1", 98.5, 100.0));
        // coarse poll is disarmed after firing
        assert!(t.coarse_due(start + Duration::from_secs(10)).is_none());
    }

    #[test]
    fn test_not_near_end_outside_window() {
        let mut t = tracker();
        t.arm("v1".to_string(), Instant::now());

        assert!(!t.note_coarse_reading("v1", 50.0, 100.0));
        // remaining exactly 0 does not count as "near" end
        assert!(!t.note_coarse_reading("v1", 100.0, 100.0));
        // unknown duration yields no signal
        assert!(!t.note_coarse_reading("v1", 5.0, 0.0));
    }

    #[test]
    fn test_stale_video_reading_ignored() {
        let mut t = tracker();
        t.arm("v2".to_string(), Instant::now());
        assert!(!t.note_coarse_reading("v1", 97.5, 100.0));
    }

    #[test]
    fn test_rearm_resets_near_end() {
        let mut t = tracker();
        let start = Instant::now();
        t.arm("v1".to_string(), start);
        assert!(t.note_coarse_reading("v1", 97.5, 100.0));

        t.arm("v2".to_string(), start);
        assert_eq!(t.armed_video(), Some("v2"));
        assert!(t.note_coarse_reading("v2", 98.0, 100.0));
    }

    #[test]
    fn test_cancel_silences_everything() {
        let mut t = tracker();
        let start = Instant::now();
        t.arm("v1".to_string(), start);
        t.cancel();

        assert!(t.armed_video().is_none());
        assert!(t.fine_due(start + Duration::from_secs(1)).is_none());
        assert!(!t.note_coarse_reading("v1", 97.5, 100.0));
    }
}
