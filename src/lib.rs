// SPDX-License-Identifier: MIT

pub mod cache;
pub mod config;
pub mod engine;
pub mod provider;
pub mod session;
pub mod tui;

pub use cache::CacheManager;
pub use config::Config;
pub use provider::TickerApi;
pub use session::SessionController;
pub use tui::run_tui;
