// SPDX-License-Identifier: MIT

use super::OutputFormat;
use anyhow::Result;
use tickertv::provider::TickerApi;

pub struct StockCommand {
    pub ticker: String,
    pub format: OutputFormat,
}

impl StockCommand {
    pub async fn execute(self, api: &TickerApi) -> Result<()> {
        let snapshot = api.get_stock(&self.ticker).await?;

        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            OutputFormat::Text => {
                let direction = if snapshot.is_up() { "▲" } else { "▼" };
                println!(
                    "{}  {:.2}  {} {:+.2} ({:+.2}%)",
                    snapshot.ticker,
                    snapshot.current_price,
                    direction,
                    snapshot.change,
                    snapshot.percent_change
                );
                println!(
                    "open {:.2}  high {:.2}  low {:.2}  prev close {:.2}",
                    snapshot.open, snapshot.high, snapshot.low, snapshot.previous_close
                );
            }
        }

        Ok(())
    }
}
