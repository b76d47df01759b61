// SPDX-License-Identifier: MIT

use super::OutputFormat;
use anyhow::Result;
use tickertv::provider::TickerApi;

pub struct ChannelsCommand {
    pub format: OutputFormat,
}

impl ChannelsCommand {
    pub async fn execute(self, api: &mut TickerApi) -> Result<()> {
        let channels = api.get_channels().await?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&channels)?);
            }
            OutputFormat::Text => {
                if channels.is_empty() {
                    println!("No channels found");
                    return Ok(());
                }
                for channel in channels {
                    println!(
                        "{:>3}  {:<6} {}",
                        channel.channel_number, channel.ticker, channel.company_name
                    );
                }
            }
        }

        Ok(())
    }
}

pub struct VideosCommand {
    pub ticker: String,
    pub format: OutputFormat,
    pub limit: Option<usize>,
}

impl VideosCommand {
    pub async fn execute(self, api: &mut TickerApi) -> Result<()> {
        let videos = api.get_videos(&self.ticker).await?;
        let videos: Vec<_> = videos
            .into_iter()
            .take(self.limit.unwrap_or(usize::MAX))
            .collect();

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&videos)?);
            }
            OutputFormat::Text => {
                if videos.is_empty() {
                    println!("No videos found for {}", self.ticker.to_uppercase());
                    return Ok(());
                }
                for (i, video) in videos.iter().enumerate() {
                    println!("{:>3}. {} [{}]", i + 1, video.title, video.trust_tier);
                    if let Some(channel_title) = &video.channel_title {
                        println!("     {}", channel_title);
                    }
                }
            }
        }

        Ok(())
    }
}
