// SPDX-License-Identifier: MIT

use anyhow::Result;
use tickertv::provider::TickerApi;

pub enum CacheCommand {
    Clear,
}

impl CacheCommand {
    pub async fn execute(self, api: &TickerApi) -> Result<()> {
        match self {
            CacheCommand::Clear => {
                api.clear_cache().await?;
                println!("Cache cleared");
            }
        }
        Ok(())
    }
}
