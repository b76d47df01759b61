// SPDX-License-Identifier: MIT

pub mod app;
pub mod event;
pub mod ui;
pub mod widgets;

use anyhow::Result;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::time::Duration;

use crate::config::Config;
use crate::engine::mpv::MpvEngine;
use crate::provider::TickerApi;

pub use app::App;
pub use event::{Event, EventHandler};

pub struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    pub event_handler: EventHandler,
}

impl Tui {
    pub fn new(tick_rate: u64) -> Result<Self> {
        let backend = CrosstermBackend::new(io::stdout());
        let terminal = Terminal::new(backend)?;
        let event_handler = EventHandler::new(tick_rate);
        Ok(Self {
            terminal,
            event_handler,
        })
    }

    pub fn init(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        self.terminal.hide_cursor()?;
        self.terminal.clear()?;
        Ok(())
    }

    pub fn draw(&mut self, app: &mut App) -> Result<()> {
        self.terminal.draw(|frame| ui::draw(frame, app))?;
        Ok(())
    }

    pub fn exit(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

pub async fn run_tui(config: Config) -> Result<()> {
    let mut api = TickerApi::new(
        &config.api.base_url,
        Duration::from_secs(config.api.cache_ttl_seconds),
    )?;

    // Best-effort lineup seed; the channel fetch below reports real failures.
    if let Err(e) = api.init_channels().await {
        tracing::debug!("init-channels failed: {}", e);
    }
    let channels = api.get_channels().await?;

    if !MpvEngine::is_mpv_installed() {
        anyhow::bail!("mpv not found in PATH. Install mpv to use tickertv.");
    }
    let mut engine = MpvEngine::new();
    engine.launch().await?;

    let tick_rate = config.playback.fine_poll_ms.max(50);
    let mut tui = Tui::new(tick_rate)?;
    tui.init()?;

    let mut app = App::new(config, api, channels);
    app.attach_engine(Box::new(engine));
    if !app.channels.is_empty() {
        app.tune_to(0).await;
    }

    let res = run_app(&mut tui, &mut app).await;

    tui.exit()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

async fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    tui.draw(app)?;

    loop {
        let event = tokio::time::timeout(Duration::from_millis(100), tui.event_handler.next()).await;

        let should_redraw = match event {
            Ok(Ok(Event::Key(key_event))) => match app.handle_key_event(key_event).await {
                Some(app::Action::Quit) => break,
                None => true,
            },
            Ok(Ok(Event::Resize(_, _))) => true,
            Ok(Ok(Event::Tick)) => app.async_tick().await,
            Ok(Err(e)) => return Err(e),
            // Timeout with no event still drives the playback polls.
            Err(_) => app.async_tick().await,
        };

        if should_redraw {
            tui.draw(app)?;
        }
    }

    Ok(())
}
