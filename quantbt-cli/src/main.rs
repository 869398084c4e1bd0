//! quantbt CLI — run backtests, fetch and synthesize data, analyze runs.
//!
//! Commands:
//! - `run` — execute a backtest (or an independent-leg sweep) from a TOML config
//! - `fetch` — fetch validated price rows through the provider chain
//! - `synth` — write a deterministic synthetic price CSV
//! - `metrics` — recompute the metrics summary from a run's `metadata.json`
//! - `strategies` — list registered strategies

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};

use quantbt_core::data::frame::{read_rows, write_rows};
use quantbt_core::data::{
    rows_to_market_events, DataRequest, DataSettings, ProviderConfig, SyntheticProvider,
};
use quantbt_core::domain::MarketEvent;
use quantbt_core::strategy::StrategyRegistry;
use quantbt_runner::{
    analyze_metadata, best_by_sharpe, BacktestRunner, MetricsReport, ParamSweep, RunConfig,
};

#[derive(Parser)]
#[command(name = "quantbt", about = "quantbt — event-driven backtesting engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a backtest from a TOML config file.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// Price CSV to replay instead of the config's [data] section.
        #[arg(long)]
        events: Option<PathBuf>,

        /// Symbol for --events. Defaults to the file stem, upper-cased.
        #[arg(long)]
        symbol: Option<String>,

        /// Run [[grid]] entries as independent legs in parallel.
        #[arg(long, default_value_t = false)]
        sweep: bool,
    },
    /// Fetch validated rows for a symbol through the provider chain.
    Fetch {
        symbol: String,

        /// Start date (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// End date (YYYY-MM-DD).
        #[arg(long)]
        end: String,

        /// Provider chain, tried in order: local_csv, synthetic, yahoo.
        #[arg(long, value_delimiter = ',', default_value = "local_csv,yahoo")]
        providers: Vec<String>,

        /// Cache directory.
        #[arg(long, default_value = "data/cache")]
        cache_dir: PathBuf,

        /// Directory with local CSV fixtures.
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Also write the rows to this CSV file.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write a deterministic synthetic price series as CSV.
    Synth {
        symbol: String,

        #[arg(long)]
        start: String,

        #[arg(long)]
        end: String,

        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Output file. Defaults to synthetic_<symbol>.csv.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Recompute metrics from a run's metadata.json.
    Metrics {
        /// Path to metadata.json.
        #[arg(long)]
        metadata: PathBuf,

        /// Where to write metrics.json. Defaults to the metadata directory.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// List registered strategies.
    Strategies,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            events,
            symbol,
            sweep,
        } => run_cmd(&config, events.as_deref(), symbol, sweep),
        Commands::Fetch {
            symbol,
            start,
            end,
            providers,
            cache_dir,
            data_dir,
            out,
        } => fetch_cmd(&symbol, &start, &end, providers, cache_dir, data_dir, out.as_deref()),
        Commands::Synth {
            symbol,
            start,
            end,
            seed,
            out,
        } => synth_cmd(&symbol, &start, &end, seed, out),
        Commands::Metrics {
            metadata,
            output_dir,
        } => {
            let summary = analyze_metadata(&metadata, output_dir.as_deref())?;
            println!("{}", serde_json::to_string(&summary)?);
            Ok(())
        }
        Commands::Strategies => {
            for name in StrategyRegistry::with_builtins().available() {
                println!("{name}");
            }
            Ok(())
        }
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn parse_date(text: &str) -> Result<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{text}', expected YYYY-MM-DD"))?;
    let Some(midnight) = date.and_hms_opt(0, 0, 0) else {
        bail!("invalid date '{text}'");
    };
    Ok(Utc.from_utc_datetime(&midnight))
}

fn load_events(config: &RunConfig, events: Option<&Path>, symbol: Option<String>) -> Result<Vec<MarketEvent>> {
    if let Some(path) = events {
        let symbol = match symbol {
            Some(s) => s,
            None => path
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_uppercase)
                .context("cannot derive a symbol from the events path; pass --symbol")?,
        };
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let mut rows = read_rows(file)?;
        rows.sort_by_key(|r| r.timestamp);
        return Ok(rows_to_market_events(&symbol, &rows));
    }

    let Some(data) = &config.data else {
        bail!("config has no [data] section; pass --events <csv>");
    };
    let request = data.request()?;
    let manager = data.settings.build_manager()?;
    let rows = manager.fetch(&request)?;
    Ok(rows_to_market_events(&request.symbol, &rows))
}

fn run_cmd(config_path: &Path, events: Option<&Path>, symbol: Option<String>, sweep: bool) -> Result<()> {
    let config = RunConfig::load(config_path)?;
    let registry = StrategyRegistry::with_builtins();
    let events = load_events(&config, events, symbol)?;
    tracing::info!(events = events.len(), strategy = %config.strategy.name, "events loaded");

    if sweep {
        if config.grid.is_empty() {
            bail!("--sweep needs at least one [[grid]] entry");
        }
        let sweep = ParamSweep::from_config(&config, registry)?;
        let mut legs = Vec::new();
        for (i, outcome) in sweep.run(&events, &config.grid).into_iter().enumerate() {
            match outcome {
                Ok(leg) => {
                    println!(
                        "leg {:>3}  sharpe={:>8.4}  return={:>8.4}  params={}",
                        leg.index,
                        leg.summary.sharpe,
                        leg.summary.cumulative_return,
                        serde_json::to_string(&leg.parameters)?
                    );
                    legs.push(leg);
                }
                Err(e) => eprintln!("leg {:>3}  failed: {e}", i + 1),
            }
        }
        if let Some(best) = best_by_sharpe(&legs) {
            println!("best: leg {} ({})", best.index, sweep.leg_run_id(best.index));
        }
        return Ok(());
    }

    let host = config.build_host(&registry)?;
    let settings = config.backtest_settings()?;
    let execution = config.execution_handler()?;
    let mut runner = BacktestRunner::with_execution(host, settings, Box::new(execution))?;
    let result = runner.run(&events)?;

    let report = MetricsReport::from_result(&result)?;
    println!("{}", report.summary_table());
    if let Some(snapshot) = runner.last_snapshot() {
        println!("\nfinal equity: {:.2}", snapshot.get("equity").copied().unwrap_or(0.0));
    }
    println!("Artifacts saved to: {}", runner.output_dir().display());
    Ok(())
}

fn fetch_cmd(
    symbol: &str,
    start: &str,
    end: &str,
    providers: Vec<String>,
    cache_dir: PathBuf,
    data_dir: Option<PathBuf>,
    out: Option<&Path>,
) -> Result<()> {
    let request = DataRequest::daily(symbol, parse_date(start)?, parse_date(end)?);
    let settings = DataSettings {
        cache_dir,
        data_dir,
        provider_chain: providers.into_iter().map(ProviderConfig::named).collect(),
    };
    let rows = settings.build_manager()?.fetch(&request)?;
    if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
        println!(
            "{}: {} rows from {} to {}",
            request.symbol,
            rows.len(),
            first.timestamp.date_naive(),
            last.timestamp.date_naive()
        );
    }
    if let Some(path) = out {
        let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
        write_rows(&rows, file)?;
        println!("Rows written to: {}", path.display());
    }
    Ok(())
}

fn synth_cmd(symbol: &str, start: &str, end: &str, seed: u64, out: Option<PathBuf>) -> Result<()> {
    let request = DataRequest::daily(symbol, parse_date(start)?, parse_date(end)?);
    let rows = SyntheticProvider::new(seed).generate(&request);
    if rows.is_empty() {
        bail!("no weekdays between {start} and {end}");
    }
    let path = out.unwrap_or_else(|| PathBuf::from(format!("synthetic_{}.csv", symbol.to_lowercase())));
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    write_rows(&rows, file)?;
    println!("{} rows written to {}", rows.len(), path.display());
    Ok(())
}
