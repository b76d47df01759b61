// SPDX-License-Identifier: MIT

use crate::provider::Video;

/// Ordered video list for one channel plus the current position.
/// Advancing past the last video wraps back to the first; the channel never
/// stops on its own.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    videos: Vec<Video>,
    index: usize,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the queue and resets to the first video. An empty list is
    /// allowed and leaves the queue inert.
    pub fn set_queue(&mut self, videos: Vec<Video>) {
        self.videos = videos;
        self.index = 0;
    }

    pub fn current(&self) -> Option<&Video> {
        self.videos.get(self.index)
    }

    pub fn len(&self) -> usize {
        self.videos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    pub fn position(&self) -> usize {
        self.index
    }

    /// Moves to the next video, wrapping around at the end. Returns the new
    /// current video, or `None` when the queue is empty.
    pub fn advance(&mut self) -> Option<&Video> {
        if self.videos.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.videos.len();
        self.videos.get(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::TrustTier;

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

    #[test]
    fn test_set_queue_resets_index() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(vec![video("a"), video("b")]);
        queue.advance();
        assert_eq!(queue.current().unwrap().video_id, "b");

        queue.set_queue(vec![video("c"), video("d")]);
        assert_eq!(queue.current().unwrap().video_id, "c");
    }

    #[test]
    fn test_n_advances_wrap_to_start() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(vec![video("a"), video("b"), video("c")]);
        let first = queue.current().unwrap().video_id.clone();

        for _ in 0..3 {
            queue.advance();
        }
        assert_eq!(queue.current().unwrap().video_id, first);
    }

    #[test]
    fn test_single_video_wraps_onto_itself() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(vec![video("only")]);
        assert_eq!(queue.advance().unwrap().video_id, "only");
    }

    #[test]
    fn test_empty_queue_is_inert() {
        let mut queue = PlaybackQueue::new();
        queue.set_queue(Vec::new());
        assert!(queue.current().is_none());
        assert!(queue.advance().is_none());
        assert_eq!(queue.position(), 0);
    }
}
