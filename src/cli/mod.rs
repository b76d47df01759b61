// SPDX-License-Identifier: MIT

use anyhow::Result;

pub mod cache;
pub mod list;
pub mod stock;

pub use cache::CacheCommand;
pub use list::{ChannelsCommand, VideosCommand};
pub use stock::StockCommand;

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => anyhow::bail!("Invalid format: {}. Use 'text' or 'json'", s),
        }
    }
}
