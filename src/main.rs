// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use tickertv::Config;
use tickertv::provider::TickerApi;

mod cli;
use cli::{CacheCommand, ChannelsCommand, OutputFormat, StockCommand, VideosCommand};

fn cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
}

#[derive(Parser)]
#[command(name = "tickertv")]
#[command(about = "A terminal TV experience for stock market video channels")]
#[command(version)]
#[command(styles = cargo_style())]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug logging to file (tickertv_debug.log)
    #[arg(long, global = true)]
    debug_log: bool,

    /// Override the API base URL from the config file
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the TV interface (default if no command given)
    Tui,

    /// List the channel lineup
    Channels {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List the video queue for a ticker
    Videos {
        /// Stock ticker symbol, e.g. AAPL
        ticker: String,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
        /// Limit the number of videos printed
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the live quote for a ticker
    Stock {
        /// Stock ticker symbol, e.g. AAPL
        ticker: String,
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Manage the on-disk listing cache
    #[command(subcommand)]
    Cache(CacheSubCommand),
}

#[derive(Subcommand)]
enum CacheSubCommand {
    /// Clear cache
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.debug_log {
        let file = File::create("tickertv_debug.log")?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_level(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(file_layer)
            .with(
                EnvFilter::from_default_env()
                    .add_directive("tickertv=debug".parse()?)
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env()
                    .add_directive(tracing::Level::DEBUG.into())
                    .add_directive("hyper_util=error".parse()?),
            )
            .init();
    } else if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("hyper_util=error".parse()?),
            )
            .init();
    }

    let mut config = Config::load_or_default(Config::default_path());
    if let Some(api_url) = cli.api_url {
        config.api.base_url = api_url;
    }

    match cli.command {
        Some(Commands::Tui) | None => {
            tickertv::run_tui(config).await?;
        }

        Some(Commands::Channels { format }) => {
            let mut api = api_from(&config)?;
            let cmd = ChannelsCommand {
                format: OutputFormat::from_str(&format)?,
            };
            cmd.execute(&mut api).await?;
        }

        Some(Commands::Videos {
            ticker,
            format,
            limit,
        }) => {
            let mut api = api_from(&config)?;
            let cmd = VideosCommand {
                ticker,
                format: OutputFormat::from_str(&format)?,
                limit,
            };
            cmd.execute(&mut api).await?;
        }

        Some(Commands::Stock { ticker, format }) => {
            let api = api_from(&config)?;
            let cmd = StockCommand {
                ticker,
                format: OutputFormat::from_str(&format)?,
            };
            cmd.execute(&api).await?;
        }

        Some(Commands::Cache(CacheSubCommand::Clear)) => {
            let api = api_from(&config)?;
            CacheCommand::Clear.execute(&api).await?;
        }
    }

    Ok(())
}

fn api_from(config: &Config) -> Result<TickerApi> {
    TickerApi::new(
        &config.api.base_url,
        Duration::from_secs(config.api.cache_ttl_seconds),
    )
}
