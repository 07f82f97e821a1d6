//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::backtest::{self as backtest_engine, BacktestResult};
use crate::domain::config_validation::{parse_date, validate_data_config, validate_strategy_config};
use crate::domain::error::AnalyzerError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::rule::Predicate;
use crate::domain::strategy::RuleConfig;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_DATA_DIR: &str = "stock_data";

#[derive(Parser, Debug)]
#[command(
    name = "stratanalyzer",
    about = "Rule-based indicator strategy backtester for intraday stock data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        stock: Option<String>,
        #[arg(long)]
        timeframe: Option<String>,
        /// First date to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Last date to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// HTML report path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Trade ledger CSV path
        #[arg(long)]
        trades: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// List stocks and timeframes in a data directory
    ListStocks {
        #[arg(long, default_value = DEFAULT_DATA_DIR)]
        data_dir: PathBuf,
    },
    /// Validate a strategy configuration
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub stock: Option<String>,
    pub timeframe: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub output: Option<PathBuf>,
    pub trades: Option<PathBuf>,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            stock,
            timeframe,
            from,
            to,
            output,
            trades,
            dry_run,
        } => {
            let overrides = Overrides {
                stock,
                timeframe,
                from,
                to,
                output,
                trades,
            };
            if dry_run {
                run_dry_run(&config, &overrides)
            } else {
                run_backtest(&config, &overrides)
            }
        }
        Command::ListStocks { data_dir } => run_list_stocks(&data_dir),
        Command::Validate { config } => run_validate(&config),
    }
}

fn fail(err: AnalyzerError) -> ExitCode {
    error!("{err}");
    ExitCode::from(&err)
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, AnalyzerError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// A config view where command-line overrides shadow file values.
pub struct LayeredConfig<'a> {
    base: &'a dyn ConfigPort,
    overrides: HashMap<(String, String), String>,
}

impl<'a> LayeredConfig<'a> {
    pub fn new(base: &'a dyn ConfigPort, overrides: &Overrides) -> Self {
        let mut map = HashMap::new();
        let mut set = |section: &str, key: &str, value: Option<String>| {
            if let Some(v) = value {
                map.insert((section.to_string(), key.to_string()), v);
            }
        };
        set("data", "stock", overrides.stock.clone());
        set("data", "timeframe", overrides.timeframe.clone());
        set("data", "from_date", overrides.from.clone());
        set("data", "to_date", overrides.to.clone());
        set(
            "report",
            "output",
            overrides.output.as_ref().map(|p| p.display().to_string()),
        );
        set(
            "report",
            "trades_csv",
            overrides.trades.as_ref().map(|p| p.display().to_string()),
        );
        Self {
            base,
            overrides: map,
        }
    }
}

impl ConfigPort for LayeredConfig<'_> {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.overrides
            .get(&(section.to_string(), key.to_string()))
            .cloned()
            .or_else(|| self.base.get_string(section, key))
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.base.get_int(section, key, default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.base.get_double(section, key, default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.base.get_bool(section, key, default)
    }
}

/// Which bars to load.
#[derive(Debug, Clone, PartialEq)]
pub struct DataSelection {
    pub dir: PathBuf,
    pub stock: String,
    pub timeframe: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

pub fn build_data_selection(config: &dyn ConfigPort) -> Result<DataSelection, AnalyzerError> {
    validate_data_config(config)?;
    let required = |key: &str| {
        config
            .get_string("data", key)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| AnalyzerError::ConfigMissing {
                section: "data".to_string(),
                key: key.to_string(),
            })
    };
    Ok(DataSelection {
        dir: PathBuf::from(
            config
                .get_string("data", "dir")
                .unwrap_or_else(|| DEFAULT_DATA_DIR.to_string()),
        ),
        stock: required("stock")?.to_uppercase(),
        timeframe: required("timeframe")?,
        from: parse_date(config.get_string("data", "from_date").as_deref(), "from_date")?,
        to: parse_date(config.get_string("data", "to_date").as_deref(), "to_date")?,
    })
}

fn period(config: &dyn ConfigPort, key: &str, default: usize) -> Result<usize, AnalyzerError> {
    let value = config.get_int("indicators", key, default as i64);
    usize::try_from(value).map_err(|_| AnalyzerError::InvalidParameter {
        name: key.to_string(),
        reason: format!("must be at least 1, got {}", value),
    })
}

pub fn build_indicator_params(config: &dyn ConfigPort) -> Result<IndicatorParams, AnalyzerError> {
    let defaults = IndicatorParams::default();
    Ok(IndicatorParams {
        ema_length: period(config, "ema_period", defaults.ema_length)?,
        rsi_length: period(config, "rsi_period", defaults.rsi_length)?,
        st_length: period(config, "supertrend_period", defaults.st_length)?,
        st_multiplier: config.get_double(
            "indicators",
            "supertrend_multiplier",
            defaults.st_multiplier,
        ),
    })
}

/// Enabled predicates of one `[entry]`/`[exit]` section, in a fixed order.
pub fn build_predicates(config: &dyn ConfigPort, section: &str) -> Vec<Predicate> {
    let mut predicates = Vec::new();
    if config.get_bool(section, "price_above_ema", false) {
        predicates.push(Predicate::PriceAboveEma);
    }
    if config.get_bool(section, "price_below_ema", false) {
        predicates.push(Predicate::PriceBelowEma);
    }
    let threshold = |key: &str| {
        config
            .get_string(section, key)
            .filter(|s| !s.trim().is_empty())
            .and_then(|s| s.trim().parse::<f64>().ok())
    };
    if let Some(t) = threshold("rsi_below") {
        predicates.push(Predicate::RsiBelow(t));
    }
    if let Some(t) = threshold("rsi_above") {
        predicates.push(Predicate::RsiAbove(t));
    }
    if config.get_bool(section, "supertrend_up", false) {
        predicates.push(Predicate::SupertrendUp);
    }
    if config.get_bool(section, "supertrend_down", false) {
        predicates.push(Predicate::SupertrendDown);
    }
    predicates
}

pub fn build_rule_config(config: &dyn ConfigPort) -> Result<RuleConfig, AnalyzerError> {
    validate_strategy_config(config)?;
    let rules = RuleConfig::new(
        build_indicator_params(config)?,
        build_predicates(config, "entry"),
        build_predicates(config, "exit"),
    );
    rules.validate()?;
    if rules.entry.is_empty() {
        warn!("no entry conditions enabled; no trades will be opened");
    }
    Ok(rules)
}

/// Load the selected bars and run the configured strategy over them.
pub fn execute_backtest(
    data_port: &dyn DataPort,
    selection: &DataSelection,
    rules: &RuleConfig,
) -> Result<BacktestResult, AnalyzerError> {
    let bars = data_port.fetch_bars(
        &selection.stock,
        &selection.timeframe,
        selection.from,
        selection.to,
    )?;
    info!(
        stock = %selection.stock,
        timeframe = %selection.timeframe,
        bars = bars.len(),
        "loaded bars"
    );
    let result = backtest_engine::run(&bars, rules)?;
    if let (Some(pos), Some(last)) = (&result.open_position, bars.last()) {
        info!(
            entry_index = pos.entry_index,
            unrealized = pos.unrealized_pnl(last.close),
            "position still open at end of data"
        );
    }
    Ok(result)
}

fn print_summary(selection: &DataSelection, rules: &RuleConfig, result: &BacktestResult) {
    let s = &result.summary;
    println!(
        "=== {} ({}) {} to {} ===",
        selection.stock, selection.timeframe, selection.from, selection.to
    );
    println!("Indicators:       {}", rules.indicators);
    println!("Entry:            {}", rules.entry);
    println!("Exit:             {}", rules.exit);
    println!("Bars:             {}", result.bars_processed);
    if let Some((first, last)) = result.data_range() {
        println!(
            "Data Range:       {} to {}",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        );
    }
    println!("Total Trades:     {}", s.total_trades);
    println!("Total Profit:     {:.2}", s.total_profit);
    println!("Win Rate:         {:.2}%", s.win_rate);
    println!("Average Profit:   {:.2}", s.average_profit);
    println!("Profit Factor:    {:.2}", s.profit_factor);
    println!("Max Drawdown:     {:.2}", s.max_drawdown);

    if !result.ledger.is_empty() {
        println!("\n{:<20} {:<20} {:>10} {:>10} {:>10}", "Entry", "Exit", "Buy", "Sell", "Profit");
        for t in result.ledger.iter() {
            println!(
                "{:<20} {:<20} {:>10.2} {:>10.2} {:>10.2}",
                t.entry_time.format("%Y-%m-%d %H:%M"),
                t.exit_time.format("%Y-%m-%d %H:%M"),
                t.entry_price,
                t.exit_price,
                t.profit
            );
        }
    }
    if let Some(pos) = &result.open_position {
        println!(
            "\nOpen position: long since {} at {:.2}",
            pos.entry_time.format("%Y-%m-%d %H:%M"),
            pos.entry_price
        );
    }
}

#[cfg(feature = "html-report")]
fn write_html(
    path: &str,
    selection: &DataSelection,
    rules: &RuleConfig,
    result: &BacktestResult,
) -> Result<(), AnalyzerError> {
    use crate::adapters::html_report_adapter::HtmlReportAdapter;

    let title = format!("{} ({}) backtest", selection.stock, selection.timeframe);
    HtmlReportAdapter::new(title).write(result, rules, path)
}

#[cfg(not(feature = "html-report"))]
fn write_html(
    path: &str,
    _selection: &DataSelection,
    _rules: &RuleConfig,
    _result: &BacktestResult,
) -> Result<(), AnalyzerError> {
    warn!(path, "html-report feature is disabled; skipping HTML report");
    Ok(())
}

pub fn write_reports(
    config: &dyn ConfigPort,
    selection: &DataSelection,
    rules: &RuleConfig,
    result: &BacktestResult,
) -> Result<(), AnalyzerError> {
    if let Some(path) = config.get_string("report", "output") {
        write_html(&path, selection, rules, result)?;
        info!(path = %path, "report written");
    }
    if let Some(path) = config.get_string("report", "trades_csv") {
        CsvReportAdapter::new().write(result, rules, &path)?;
        info!(path = %path, "trade ledger written");
    }
    Ok(())
}

fn run_backtest(config_path: &Path, overrides: &Overrides) -> ExitCode {
    let file = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let config = LayeredConfig::new(&file, overrides);

    let result = build_data_selection(&config).and_then(|selection| {
        let rules = build_rule_config(&config)?;
        let data_port = CsvAdapter::new(selection.dir.clone());
        let result = execute_backtest(&data_port, &selection, &rules)?;
        print_summary(&selection, &rules, &result);
        write_reports(&config, &selection, &rules, &result)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

pub fn run_dry_run(config_path: &Path, overrides: &Overrides) -> ExitCode {
    let file = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let config = LayeredConfig::new(&file, overrides);

    let selection = match build_data_selection(&config) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };
    let rules = match build_rule_config(&config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };
    info!("config validated successfully");

    println!("Data:");
    println!("  dir:       {}", selection.dir.display());
    println!("  stock:     {}", selection.stock);
    println!("  timeframe: {}", selection.timeframe);
    println!("  range:     {} to {}", selection.from, selection.to);
    println!("\nRules:");
    println!("  entry: {}", rules.entry);
    println!("  exit:  {}", rules.exit);
    println!("\nIndicators to compute:");
    for kind in rules.required_indicators() {
        println!("  {}", kind);
    }
    println!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn run_list_stocks(data_dir: &Path) -> ExitCode {
    let adapter = CsvAdapter::new(data_dir.to_path_buf());
    let stocks = match adapter.list_stocks() {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    if stocks.is_empty() {
        warn!(dir = %data_dir.display(), "no stock files found");
        return ExitCode::SUCCESS;
    }
    for stock in &stocks {
        match adapter.list_timeframes(stock) {
            Ok(tfs) => println!("{}: {}", stock, tfs.join(", ")),
            Err(e) => return fail(e),
        }
    }
    info!(count = stocks.len(), "stocks found");
    ExitCode::SUCCESS
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(a) => a,
        Err(e) => return fail(e),
    };
    let rules = match build_rule_config(&config) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    println!("Indicators: {}", rules.indicators);
    println!("Entry (all): {}", rules.entry);
    println!("Exit (any):  {}", rules.exit);
    println!("\nStrategy configuration is valid.");
    ExitCode::SUCCESS
}
