// SPDX-License-Identifier: MIT

/// Keyboard state machine for the modal channel guide.
///
/// Independent of playback: it only tracks a highlighted row over the fixed
/// channel list and hands a selection intent back to the caller on commit.
/// Unlike the playback queue, navigation clamps at the list ends instead of
/// wrapping.
#[derive(Debug, Default)]
pub struct GuideNavigator {
    selected: usize,
    channel_count: usize,
    open: bool,
}

impl GuideNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Opens the guide over `channel_count` channels, seeding the highlight
    /// to the currently playing channel when known.
    pub fn open(&mut self, channel_count: usize, playing_index: Option<usize>) {
        self.channel_count = channel_count;
        self.selected = playing_index
            .unwrap_or(0)
            .min(channel_count.saturating_sub(1));
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn move_up(&mut self) {
        if self.open {
            self.selected = self.selected.saturating_sub(1);
        }
    }

    pub fn move_down(&mut self) {
        if self.open && self.selected + 1 < self.channel_count {
            self.selected += 1;
        }
    }

    /// Emits the highlighted channel index as a selection intent and closes
    /// the guide. `None` when the channel list is empty.
    pub fn commit(&mut self) -> Option<usize> {
        let intent = (self.channel_count > 0).then_some(self.selected);
        self.close();
        intent
    }

    /// Closes without emitting a selection.
    pub fn cancel(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_seeds_to_playing_channel() {
        let mut guide = GuideNavigator::new();
        guide.open(10, Some(7));
        assert!(guide.is_open());
        assert_eq!(guide.selected(), 7);

        guide.close();
        guide.open(10, None);
        assert_eq!(guide.selected(), 0);
    }

    #[test]
    fn test_move_up_clamps_at_top() {
        let mut guide = GuideNavigator::new();
        guide.open(5, Some(0));
        guide.move_up();
        assert_eq!(guide.selected(), 0);
    }

    #[test]
    fn test_move_down_clamps_at_bottom() {
        let mut guide = GuideNavigator::new();
        guide.open(5, Some(4));
        guide.move_down();
        assert_eq!(guide.selected(), 4);
    }

    #[test]
    fn test_navigation_inert_while_closed() {
        let mut guide = GuideNavigator::new();
        guide.open(5, Some(2));
        guide.close();
        guide.move_down();
        guide.move_up();
        assert_eq!(guide.selected(), 2);
    }

    #[test]
    fn test_commit_emits_and_closes() {
        let mut guide = GuideNavigator::new();
        guide.open(5, Some(3));
        assert_eq!(guide.commit(), Some(3));
        assert!(!guide.is_open());
    }

    #[test]
    fn test_cancel_emits_nothing() {
        let mut guide = GuideNavigator::new();
        guide.open(5, Some(3));
        guide.cancel();
        assert!(!guide.is_open());
    }

    #[test]
    fn test_commit_on_empty_list() {
        let mut guide = GuideNavigator::new();
        guide.open(0, None);
        assert_eq!(guide.commit(), None);
    }

    #[test]
    fn test_seed_beyond_list_clamps() {
        let mut guide = GuideNavigator::new();
        guide.open(3, Some(9));
        assert_eq!(guide.selected(), 2);
    }
}
