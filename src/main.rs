use std::env;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use env_logger::Env;

use yahoo_finance_api::records::sorted_entries;
use yahoo_finance_api::{ClientConfig, HistoryQuery, Ticker, YahooClient};

const USAGE: &str = "usage: yf-history <SYMBOL> [RANGE] [INTERVAL] [--prepost] [--config PATH]";

struct Args {
    symbol: String,
    range: Option<String>,
    interval: Option<String>,
    prepost: bool,
    config: Option<String>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut positional = Vec::new();
    let mut prepost = false;
    let mut config = None;

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--prepost" => prepost = true,
            "--config" => {
                config = Some(raw.next().context("--config requires a path")?);
            }
            "-h" | "--help" => bail!(USAGE),
            flag if flag.starts_with("--") => bail!("unknown flag {}\n{}", flag, USAGE),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let symbol = positional.next().context(USAGE)?;
    Ok(Args {
        symbol,
        range: positional.next(),
        interval: positional.next(),
        prepost,
        config,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = parse_args(env::args().skip(1))?;

    let config = match &args.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => ClientConfig::builtin(),
    };
    let client = YahooClient::builder()
        .config(config)
        .build()
        .context("Failed to construct Yahoo Finance client")?;

    let mut query = HistoryQuery::new().prepost(args.prepost);
    if let Some(range) = args.range {
        query = query.range(range);
    }
    if let Some(interval) = args.interval {
        query = query.interval(interval);
    }

    let ticker = Ticker::new(args.symbol, Arc::new(client));
    let series = ticker
        .history(&query)
        .with_context(|| format!("Failed to fetch history for {}", ticker.symbol()))?;

    println!(
        "{:<20} {:>12} {:>12} {:>12} {:>12} {:>14}",
        "time", "open", "high", "low", "close", "volume"
    );
    for (key, bar) in sorted_entries(&series) {
        println!(
            "{:<20} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>14}",
            key, bar.open, bar.high, bar.low, bar.close, bar.volume
        );
    }

    Ok(())
}
