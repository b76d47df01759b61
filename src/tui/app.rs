// SPDX-License-Identifier: MIT

use crate::config::Config;
use crate::engine::Engine;
use crate::provider::{Channel, StockSnapshot, TickerApi, fetch_stock};
use crate::session::{GuideNavigator, SessionController};
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, warn};

const MAX_LOG_LINES: usize = 200;

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
}

pub struct App {
    pub config: Config,
    pub api: TickerApi,
    pub session: SessionController,
    pub guide: GuideNavigator,
    pub channels: Vec<Channel>,
    pub stock: Option<StockSnapshot>,
    pub show_help: bool,
    pub status_message: Option<String>,
    pub logs: Vec<(DateTime<Local>, String)>,
    last_input: Instant,
    controls_hide: Duration,
    stock_refresh: Duration,
    next_stock_refresh: Option<Instant>,
    stock_tx: mpsc::UnboundedSender<StockSnapshot>,
    stock_rx: mpsc::UnboundedReceiver<StockSnapshot>,
}

impl App {
    pub fn new(config: Config, api: TickerApi, channels: Vec<Channel>) -> Self {
        let session = SessionController::new(&config.playback);
        let controls_hide = Duration::from_secs(config.ui.controls_hide_seconds);
        let stock_refresh = Duration::from_secs(config.ui.stock_refresh_seconds.max(1));
        let (stock_tx, stock_rx) = mpsc::unbounded_channel();

        Self {
            config,
            api,
            session,
            guide: GuideNavigator::new(),
            channels,
            stock: None,
            show_help: false,
            status_message: None,
            logs: Vec::new(),
            last_input: Instant::now(),
            controls_hide,
            stock_refresh,
            next_stock_refresh: None,
            stock_tx,
            stock_rx,
        }
    }

    pub fn attach_engine(&mut self, engine: Box<dyn Engine>) {
        self.session.on_engine_ready(engine);
        self.log("Media engine ready".to_string());
    }

    pub fn log(&mut self, message: String) {
        debug!("{}", message);
        self.logs.push((Local::now(), message));
        if self.logs.len() > MAX_LOG_LINES {
            let drop = self.logs.len() - MAX_LOG_LINES;
            self.logs.drain(..drop);
        }
    }

    /// Key hints fade out after a few seconds of idle playback.
    pub fn controls_visible(&self) -> bool {
        !self.session.is_playing() || self.last_input.elapsed() < self.controls_hide
    }

    /// Index into `channels` of the channel currently tuned, if any.
    pub fn playing_index(&self) -> Option<usize> {
        let current = self.session.current_channel()?;
        self.channels.iter().position(|c| c.id == current.id)
    }

    pub async fn handle_key_event(&mut self, key: KeyEvent) -> Option<Action> {
        self.last_input = Instant::now();

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Action::Quit);
        }

        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('?') | KeyCode::F(1) | KeyCode::Char('q')
            ) {
                self.show_help = false;
            }
            return None;
        }

        if self.guide.is_open() {
            match key.code {
                KeyCode::Up | KeyCode::Char('k') => self.guide.move_up(),
                KeyCode::Down | KeyCode::Char('j') => self.guide.move_down(),
                KeyCode::Enter => {
                    if let Some(index) = self.guide.commit() {
                        self.tune_to(index).await;
                    }
                }
                KeyCode::Esc | KeyCode::Char('g') | KeyCode::Char('q') => self.guide.cancel(),
                _ => {}
            }
            return None;
        }

        match key.code {
            KeyCode::Char('q') => return Some(Action::Quit),
            KeyCode::Char('?') | KeyCode::F(1) => self.show_help = true,
            KeyCode::Char('g') | KeyCode::Enter => {
                self.guide.open(self.channels.len(), self.playing_index());
            }
            KeyCode::Up | KeyCode::Char('k') | KeyCode::PageUp => self.zap(-1).await,
            KeyCode::Down | KeyCode::Char('j') | KeyCode::PageDown => self.zap(1).await,
            KeyCode::Char(' ') => self.session.play_pause(),
            KeyCode::Left => {
                let step = self.config.playback.seek_step_secs;
                self.session.seek_relative(-step);
            }
            KeyCode::Right => {
                let step = self.config.playback.seek_step_secs;
                self.session.seek_relative(step);
            }
            KeyCode::Char('n') => {
                if let Some(id) = self.session.current_video().map(|v| v.video_id.clone()) {
                    self.session.advance_if_current(&id);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.session.adjust_volume(5),
            KeyCode::Char('-') => self.session.adjust_volume(-5),
            _ => {}
        }

        None
    }

    /// Steps to the adjacent channel, wrapping around the lineup.
    async fn zap(&mut self, direction: i64) {
        if self.channels.is_empty() {
            return;
        }
        let len = self.channels.len() as i64;
        let current = self.playing_index().unwrap_or(0) as i64;
        let next = (current + direction).rem_euclid(len) as usize;
        self.tune_to(next).await;
    }

    /// Tunes to a channel by lineup index: fetches its queue, hands both to
    /// the session, then kicks off a quote refresh that never gates playback.
    pub async fn tune_to(&mut self, index: usize) {
        let Some(channel) = self.channels.get(index).cloned() else {
            return;
        };

        self.status_message = None;
        let videos = match self.api.get_videos(&channel.ticker).await {
            Ok(videos) => videos,
            Err(e) => {
                warn!("Failed to fetch videos for {}: {}", channel.ticker, e);
                self.status_message = Some(format!("Could not load {}: {}", channel.ticker, e));
                self.log(format!("Video fetch failed for {}", channel.ticker));
                return;
            }
        };

        self.log(format!(
            "Tuned to channel {} ({})",
            channel.channel_number, channel.ticker
        ));
        let ticker = channel.ticker.clone();
        self.session.select_channel(channel, videos);

        self.stock = None;
        self.spawn_stock_refresh(&ticker);
        self.next_stock_refresh = Some(Instant::now() + self.stock_refresh);
    }

    fn spawn_stock_refresh(&self, ticker: &str) {
        let client = self.api.http().clone();
        let base_url = self.api.base_url().to_string();
        let ticker = ticker.to_string();
        let tx = self.stock_tx.clone();
        tokio::spawn(async move {
            match fetch_stock(&client, &base_url, &ticker).await {
                Ok(snapshot) => {
                    let _ = tx.send(snapshot);
                }
                Err(e) => debug!("Stock refresh for {} failed: {}", ticker, e),
            }
        });
    }

    /// Periodic work: playback polls, quote refresh schedule, and results of
    /// background fetches. Returns true when a redraw is warranted.
    pub async fn async_tick(&mut self) -> bool {
        self.session.tick();

        while let Ok(snapshot) = self.stock_rx.try_recv() {
            // A slow fetch for a previous channel may land after a zap.
            let still_current = self
                .session
                .current_channel()
                .is_some_and(|c| c.ticker == snapshot.ticker);
            if still_current {
                self.stock = Some(snapshot);
            } else {
                debug!("Discarding stale quote for {}", snapshot.ticker);
            }
        }

        if let Some(due) = self.next_stock_refresh
            && Instant::now() >= due
            && let Some(ticker) = self.session.current_channel().map(|c| c.ticker.clone())
        {
            self.spawn_stock_refresh(&ticker);
            self.next_stock_refresh = Some(Instant::now() + self.stock_refresh);
        }

        self.session.current_channel().is_some() || self.guide.is_open() || self.show_help
    }
}
