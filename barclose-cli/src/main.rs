//! barclose CLI: replay runs and configuration checks.
//!
//! Commands:
//! - `run`: replay CSV or synthetic bars through the engine on a paper account
//! - `check-config`: load and validate a TOML config
//! - `default-config`: print a config (default or named preset) as TOML

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Duration;
use clap::{ArgGroup, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use barclose_core::config::PRESETS;
use barclose_core::EngineConfig;
use barclose_runner::export::write_file;
use barclose_runner::{
    load_bars_csv, summary_json, synthetic_bars, trades_csv, Replay, ReplayOptions,
    ReplaySummary,
};

#[derive(Parser)]
#[command(name = "barclose", about = "barclose CLI: bar-close trading decision engine")]
struct Cli {
    /// Log level when RUST_LOG is unset (error, warn, info, debug, trace).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay bars through the engine on a paper account.
    #[command(group(ArgGroup::new("source").required(true).args(["bars", "synthetic"])))]
    #[command(group(ArgGroup::new("strategy").args(["config", "preset"])))]
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Named preset: ma_rsi_crossover, ma_rsi_confirmed, stochastic_ema.
        #[arg(long)]
        preset: Option<String>,

        /// CSV file with columns time,open,high,low,close,volume.
        #[arg(long)]
        bars: Option<PathBuf>,

        /// Generate this many synthetic bars instead of reading a file.
        #[arg(long)]
        synthetic: Option<usize>,

        /// Seed for synthetic bars.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Synthetic bar interval in minutes, up to one week.
        #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(i64).range(1..=10_080))]
        interval_minutes: i64,

        /// Starting paper balance.
        #[arg(long, default_value_t = 10_000.0)]
        balance: f64,

        /// Paper spread in pips.
        #[arg(long, default_value_t = 1.0)]
        spread_pips: f64,

        /// Write the JSON summary here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the closed-trade tape as CSV.
        #[arg(long)]
        trades: Option<PathBuf>,
    },
    /// Load and validate a TOML config.
    CheckConfig {
        #[arg(long)]
        config: PathBuf,
    },
    /// Print a config as TOML.
    DefaultConfig {
        /// Named preset to print instead of the defaults.
        #[arg(long)]
        preset: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.json_logs);

    match cli.command {
        Commands::Run {
            config,
            preset,
            bars,
            synthetic,
            seed,
            interval_minutes,
            balance,
            spread_pips,
            output,
            trades,
        } => {
            let engine_config = load_config(config, preset)?;
            let source = match (bars, synthetic) {
                (Some(path), _) => BarSource::Csv(path),
                (None, Some(n)) => BarSource::Synthetic {
                    n,
                    seed,
                    interval: Duration::minutes(interval_minutes),
                },
                (None, None) => bail!("one of --bars or --synthetic is required"),
            };
            let options = ReplayOptions {
                balance,
                spread_pips,
            };
            run_replay(&engine_config, source, options, output, trades)
        }
        Commands::CheckConfig { config } => check_config(config),
        Commands::DefaultConfig { preset } => {
            let config = match preset {
                Some(name) => EngineConfig::preset(&name)?,
                None => EngineConfig::default(),
            };
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

/// Install the global subscriber. `RUST_LOG` wins over `--log-level`.
/// Logs go to stderr so stdout stays clean for the summary.
fn init_logging(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}

enum BarSource {
    Csv(PathBuf),
    Synthetic {
        n: usize,
        seed: u64,
        interval: Duration,
    },
}

fn load_config(path: Option<PathBuf>, preset: Option<String>) -> Result<EngineConfig> {
    let config = match (path, preset) {
        (Some(path), _) => EngineConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        (None, Some(name)) => {
            let config = EngineConfig::preset(&name)
                .with_context(|| format!("valid presets: {}", PRESETS.join(", ")))?;
            config.validate()?;
            config
        }
        (None, None) => EngineConfig::default(),
    };
    Ok(config)
}

fn run_replay(
    config: &EngineConfig,
    source: BarSource,
    options: ReplayOptions,
    output: Option<PathBuf>,
    trades: Option<PathBuf>,
) -> Result<()> {
    if !(options.balance > 0.0) {
        bail!("--balance must be positive, got {}", options.balance);
    }

    let bars = match source {
        BarSource::Csv(path) => load_bars_csv(&path)
            .with_context(|| format!("loading bars from {}", path.display()))?,
        BarSource::Synthetic { n, seed, interval } => {
            if n == 0 {
                bail!("--synthetic needs at least one bar");
            }
            info!(n, seed, "generating synthetic bars; results are not market evidence");
            synthetic_bars(n, 1.1, seed, interval)
        }
    };

    let summary = Replay::new(config, options)?.run(&bars)?;
    print_summary(&summary);

    let json = summary_json(&summary)?;
    match output {
        Some(path) => {
            write_file(&path, &json)?;
            eprintln!("Summary written to: {}", path.display());
        }
        None => println!("{json}"),
    }
    if let Some(path) = trades {
        write_file(&path, &trades_csv(&summary.trades)?)?;
        eprintln!("Trades written to: {}", path.display());
    }
    Ok(())
}

fn check_config(path: PathBuf) -> Result<()> {
    let config = EngineConfig::from_file(&path)
        .with_context(|| format!("loading config {}", path.display()))?;
    println!("OK: {}", path.display());
    println!("  symbol:      {}", config.instrument.symbol);
    println!("  rule:        {}", config.strategy.rule.name());
    println!("  sizing:      {}", config.strategy.sizing.name());
    println!("  fingerprint: {}", config.fingerprint()?);
    Ok(())
}

fn print_summary(s: &ReplaySummary) {
    eprintln!();
    eprintln!("=== Replay: {} ({} / {}) ===", s.symbol, s.rule, s.sizing);
    if let (Some(first), Some(last)) = (s.first_bar, s.last_bar) {
        eprintln!("Bars:            {} ({first} .. {last})", s.bars);
    }
    eprintln!("Warmup bars:     {}", s.warmup_bars);
    eprintln!("Signals:         {} buy / {} sell", s.signals.buy, s.signals.sell);
    eprintln!("Orders:          {}", s.orders);
    eprintln!("Reversal closes: {}", s.reversal_closes);
    eprintln!("Markers:         {}", s.markers.len());
    eprintln!(
        "Trades:          {} ({} winning)",
        s.trades.len(),
        s.winning_trades()
    );
    eprintln!("Open positions:  {}", s.open_positions);
    for (kind, count) in &s.errors {
        eprintln!("Errors [{kind}]: {count}");
    }
    eprintln!(
        "Balance:         {:.2} -> {:.2} ({:+.2})",
        s.starting_balance,
        s.final_balance,
        s.net_profit()
    );
    eprintln!("Config:          {}", s.config_fingerprint);
}
