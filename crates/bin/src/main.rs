//! Tangent CLI binary.
//!
//! Portfolio risk analysis, optimization and Monte Carlo projection from the
//! command line.

mod args;
mod render;

use args::{history_window, parse_position};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tangent::{
    ProjectionInput, ReportBuilder, SimulationMode, TangentConfig,
    data::{
        HistoryWindow, Holdings, InMemoryPriceSource, Lookback, Portfolio, PriceSeries,
        PriceSource, yahoo::YahooPriceSource,
    },
    pipeline,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tangent")]
#[command(about = "Tangent: portfolio risk, optimization and projection", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (default: <config dir>/tangent/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format (json or text)
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where prices come from and which part of history to use.
#[derive(Args)]
struct HistoryArgs {
    /// Read prices from a JSON file instead of Yahoo Finance
    #[arg(long)]
    prices: Option<PathBuf>,

    /// First date of history (YYYY-MM-DD)
    #[arg(long, requires = "end", conflicts_with = "lookback")]
    start: Option<NaiveDate>,

    /// Last date of history (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<NaiveDate>,

    /// Relative history window (1mo, 6mo, 1y, 2y, 5y, max)
    #[arg(long)]
    lookback: Option<Lookback>,
}

#[derive(Subcommand)]
enum Commands {
    /// Risk metrics of a weighted portfolio
    Analyze {
        /// Positions as TICKER=WEIGHT (or TICKER=SHARES with --shares)
        #[arg(required = true, value_parser = parse_position)]
        positions: Vec<(String, f64)>,

        /// Treat position values as share counts
        #[arg(long)]
        shares: bool,

        #[command(flatten)]
        history: HistoryArgs,
    },

    /// Maximum-Sharpe allocation across tickers
    Optimize {
        /// Tickers to allocate across
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Lower weight bound per asset (negative allows short positions)
        #[arg(long, allow_negative_numbers = true)]
        min_weight: Option<f64>,

        /// Upper weight bound per asset
        #[arg(long)]
        max_weight: Option<f64>,

        /// Also compute an efficient frontier with this many points
        #[arg(long)]
        frontier: Option<usize>,

        #[command(flatten)]
        history: HistoryArgs,
    },

    /// Monte Carlo projection of portfolio value
    Simulate {
        /// Return source
        #[arg(long, value_parser = ["parametric", "empirical"])]
        mode: Option<String>,

        /// Expected annual return for parametric mode
        #[arg(long, allow_negative_numbers = true)]
        annual_return: Option<f64>,

        /// Annual volatility for parametric mode
        #[arg(long)]
        annual_volatility: Option<f64>,

        /// Horizon in years
        #[arg(long)]
        years: Option<f64>,

        /// Number of simulated paths
        #[arg(long)]
        trials: Option<usize>,

        /// Starting portfolio value
        #[arg(long)]
        initial_value: Option<f64>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Portfolio as TICKER=WEIGHT, used in empirical mode
        #[arg(value_parser = parse_position)]
        positions: Vec<(String, f64)>,

        #[command(flatten)]
        history: HistoryArgs,
    },

    /// Closing-price history of a ticker (default: last month)
    History {
        /// Ticker symbol
        ticker: String,

        #[command(flatten)]
        history: HistoryArgs,
    },

    /// Latest closing price of a ticker
    Price {
        /// Ticker symbol
        ticker: String,

        /// Read prices from a JSON file instead of Yahoo Finance
        #[arg(long)]
        prices: Option<PathBuf>,
    },
}

/// Price file or Yahoo Finance, chosen per invocation.
enum Prices {
    File(InMemoryPriceSource),
    Yahoo(YahooPriceSource),
}

impl Prices {
    fn open(path: Option<&Path>) -> tangent::data::Result<Self> {
        match path {
            Some(path) => Ok(Self::File(InMemoryPriceSource::from_json_file(path)?)),
            None => Ok(Self::Yahoo(YahooPriceSource::new()?)),
        }
    }
}

impl PriceSource for Prices {
    async fn fetch_series(
        &self,
        symbol: &str,
        window: &HistoryWindow,
    ) -> tangent::data::Result<PriceSeries> {
        match self {
            Self::File(source) => source.fetch_series(symbol, window).await,
            Self::Yahoo(source) => source.fetch_series(symbol, window).await,
        }
    }

    async fn latest_price(&self, symbol: &str) -> tangent::data::Result<f64> {
        match self {
            Self::File(source) => source.latest_price(symbol).await,
            Self::Yahoo(source) => source.latest_price(symbol).await,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = TangentConfig::load(cli.config.as_deref())?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Analyze {
            positions,
            shares,
            history,
        } => {
            apply_history(&mut config, &history)?;
            let source = Prices::open(history.prices.as_deref())?;
            analyze(&config, &source, positions, shares, json).await?;
        }
        Commands::Optimize {
            tickers,
            min_weight,
            max_weight,
            frontier,
            history,
        } => {
            apply_history(&mut config, &history)?;
            if let Some(min_weight) = min_weight {
                config.optimizer.min_weight = min_weight;
            }
            if let Some(max_weight) = max_weight {
                config.optimizer.max_weight = max_weight;
            }
            config.validate()?;
            let tickers: Vec<String> = tickers.iter().map(|t| t.trim().to_uppercase()).collect();
            let source = Prices::open(history.prices.as_deref())?;
            optimize(&config, &source, &tickers, frontier, json).await?;
        }
        Commands::Simulate {
            mode,
            annual_return,
            annual_volatility,
            years,
            trials,
            initial_value,
            seed,
            positions,
            history,
        } => {
            apply_history(&mut config, &history)?;
            let sim = &mut config.simulation;
            match mode.as_deref() {
                Some("empirical") => sim.mode = SimulationMode::Empirical,
                Some(_) => sim.mode = SimulationMode::Parametric,
                None => {}
            }
            sim.annual_return = annual_return.unwrap_or(sim.annual_return);
            sim.annual_volatility = annual_volatility.unwrap_or(sim.annual_volatility);
            sim.horizon_years = years.unwrap_or(sim.horizon_years);
            sim.trials = trials.unwrap_or(sim.trials);
            sim.initial_value = initial_value.unwrap_or(sim.initial_value);
            sim.seed = seed.unwrap_or(sim.seed);
            config.validate()?;
            simulate(&config, &history, positions, json).await?;
        }
        Commands::History { ticker, history } => {
            let ticker = ticker.trim().to_uppercase();
            let window = history_window(history.start, history.end, history.lookback)?
                .unwrap_or(HistoryWindow::Lookback(Lookback::OneMonth));
            let source = Prices::open(history.prices.as_deref())?;
            price_history(&source, &ticker, &window, json).await?;
        }
        Commands::Price { ticker, prices } => {
            let ticker = ticker.trim().to_uppercase();
            let source = Prices::open(prices.as_deref())?;
            let price = source.latest_price(&ticker).await?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({ "symbol": ticker, "price": price }))?
                );
            } else {
                println!("{ticker}: {price:.2}");
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_history(
    config: &mut TangentConfig,
    history: &HistoryArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(window) = history_window(history.start, history.end, history.lookback)? {
        config.data.window = window;
    }
    config.validate()?;
    Ok(())
}

fn spinner(message: String) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

async fn fetch_panel(
    config: &TangentConfig,
    source: &Prices,
    symbols: &[String],
) -> Result<Vec<PriceSeries>, Box<dyn std::error::Error>> {
    let pb = spinner(format!("Fetching price history for {} symbols...", symbols.len()))?;
    match pipeline::load_panel(source, symbols, &config.data.window, config.data.concurrency).await
    {
        Ok(panel) => {
            let rows: usize = panel.iter().map(PriceSeries::len).sum();
            pb.finish_with_message(format!("Fetched {} series ({} prices)", panel.len(), rows));
            Ok(panel)
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(e.into())
        }
    }
}

/// Weights as given, or value weights from share counts at current prices.
async fn portfolio(
    source: &Prices,
    positions: Vec<(String, f64)>,
    shares: bool,
) -> Result<Portfolio, Box<dyn std::error::Error>> {
    if !shares {
        return Ok(Portfolio::new(positions)?);
    }
    let holdings = Holdings::new(positions)?;
    let mut prices = BTreeMap::new();
    for symbol in holdings.symbols() {
        let price = source.latest_price(&symbol).await?;
        prices.insert(symbol, price);
    }
    tracing::debug!(positions = prices.len(), "priced holdings");
    Ok(holdings.to_portfolio(&prices)?)
}

async fn analyze(
    config: &TangentConfig,
    source: &Prices,
    positions: Vec<(String, f64)>,
    shares: bool,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let weights = portfolio(source, positions, shares).await?;
    let symbols = weights.symbols();
    let panel = fetch_panel(config, source, &symbols).await?;
    let analysis = pipeline::analyze(config, &panel, &weights)?;

    if json {
        let report = ReportBuilder::new()
            .kind("analysis")
            .symbols(symbols)
            .contents(&analysis)?
            .build();
        println!("{}", report.to_json()?);
    } else {
        render::analysis(&analysis);
    }
    Ok(())
}

async fn price_history(
    source: &Prices,
    ticker: &str,
    window: &HistoryWindow,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let pb = spinner(format!("Fetching price history for {ticker}..."))?;
    let series = match source.fetch_series(ticker, window).await {
        Ok(series) => {
            pb.finish_with_message(format!("Fetched {} prices", series.len()));
            series
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    if json {
        let report = ReportBuilder::new()
            .kind("history")
            .symbols(vec![ticker.to_string()])
            .contents(&series)?
            .build();
        println!("{}", report.to_json()?);
    } else {
        render::history(&series);
    }
    Ok(())
}

async fn optimize(
    config: &TangentConfig,
    source: &Prices,
    tickers: &[String],
    frontier_points: Option<usize>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let panel = fetch_panel(config, source, tickers).await?;
    let estimates = pipeline::estimate(config, &panel)?;
    let optimization = estimates.optimize(config)?;
    let frontier = match frontier_points {
        Some(points) => Some(estimates.frontier(config, points)?),
        None => None,
    };

    if json {
        let report = ReportBuilder::new()
            .kind("optimization")
            .symbols(tickers.to_vec())
            .contents(&json!({
                "optimization": optimization,
                "frontier": frontier,
            }))?
            .build();
        println!("{}", report.to_json()?);
    } else {
        render::optimization(&optimization);
        if let Some(points) = &frontier {
            render::frontier(points);
        }
    }
    Ok(())
}

async fn simulate(
    config: &TangentConfig,
    history: &HistoryArgs,
    positions: Vec<(String, f64)>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let sim = &config.simulation;
    let (symbols, result) = match sim.mode {
        SimulationMode::Parametric => {
            if !positions.is_empty() {
                return Err("positions are only used in empirical mode".into());
            }
            (Vec::new(), pipeline::project(config, ProjectionInput::from_config(config))?)
        }
        SimulationMode::Empirical => {
            if positions.is_empty() {
                return Err("empirical mode needs at least one TICKER=WEIGHT position".into());
            }
            let weights = Portfolio::new(positions)?;
            let symbols = weights.symbols();
            let source = Prices::open(history.prices.as_deref())?;
            let panel = fetch_panel(config, &source, &symbols).await?;
            let analysis = pipeline::analyze(config, &panel, &weights)?;
            let result = pipeline::project(config, ProjectionInput::History(&analysis.returns))?;
            (symbols, result)
        }
    };

    if json {
        let report = ReportBuilder::new()
            .kind("projection")
            .symbols(symbols)
            .contents(&result)?
            .build();
        println!("{}", report.to_json()?);
    } else {
        render::projection(&result, sim.initial_value, sim.trials);
    }
    Ok(())
}
