//! CLI integration tests for the backtest command orchestration.
//!
//! Tests cover:
//! - Config parsing (build_rule_config, build_data_selection)
//! - Validation failures and their exit codes
//! - Dry-run and validate modes with real INI files on disk
//! - Full pipeline from CSV files to HTML and CSV reports

mod common;

use common::*;
use stratanalyzer::adapters::csv_adapter::CsvAdapter;
use stratanalyzer::adapters::file_config_adapter::FileConfigAdapter;
use stratanalyzer::cli::{self, Cli, Overrides};
use stratanalyzer::domain::error::AnalyzerError;
use stratanalyzer::domain::indicator::IndicatorKind;
use stratanalyzer::domain::rule::Predicate;
use stratanalyzer::ports::data_port::DataPort;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

const VALID_INI: &str = r#"
[data]
dir = stock_data
stock = RELIANCE
timeframe = 5
from_date = 2025-07-10
to_date = 2025-07-23

[indicators]
ema_period = 20
rsi_period = 14
supertrend_period = 10
supertrend_multiplier = 3.0

[entry]
price_above_ema = true
rsi_below = 30
supertrend_up = false

[exit]
price_below_ema = true
rsi_above = 60
"#;

fn ini_for_dir(dir: &Path, extra: &str) -> String {
    format!(
        "[data]\ndir = {}\nstock = INFY\ntimeframe = 5\nfrom_date = 2025-07-10\nto_date = 2025-07-12\n\n\
         [indicators]\nema_period = 5\nrsi_period = 4\nsupertrend_period = 3\nsupertrend_multiplier = 2\n\n\
         [entry]\nprice_above_ema = true\n\n[exit]\nprice_below_ema = true\n{}",
        dir.display(),
        extra
    )
}

mod config_loading {
    use super::*;

    #[test]
    fn build_rule_config_valid_full() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let rules = cli::build_rule_config(&adapter).unwrap();

        assert_eq!(rules.indicators.ema_length, 20);
        assert_eq!(rules.indicators.rsi_length, 14);
        assert_eq!(rules.indicators.st_length, 10);
        assert!((rules.indicators.st_multiplier - 3.0).abs() < f64::EPSILON);
        assert_eq!(
            rules.entry.predicates,
            vec![Predicate::PriceAboveEma, Predicate::RsiBelow(30.0)]
        );
        assert_eq!(
            rules.exit.predicates,
            vec![Predicate::PriceBelowEma, Predicate::RsiAbove(60.0)]
        );
        assert_eq!(
            rules.required_indicators(),
            vec![IndicatorKind::Ema, IndicatorKind::Rsi]
        );
    }

    #[test]
    fn build_data_selection_valid() {
        let adapter = FileConfigAdapter::from_string(VALID_INI).unwrap();
        let selection = cli::build_data_selection(&adapter).unwrap();
        assert_eq!(selection.stock, "RELIANCE");
        assert_eq!(selection.timeframe, "5");
        assert_eq!(selection.from, date(2025, 7, 10));
        assert_eq!(selection.to, date(2025, 7, 23));
    }

    #[test]
    fn empty_sections_use_defaults_and_no_rules() {
        let adapter = FileConfigAdapter::from_string("[indicators]\n").unwrap();
        let rules = cli::build_rule_config(&adapter).unwrap();
        assert_eq!(rules.indicators.ema_length, 20);
        assert!(rules.entry.is_empty());
        assert!(rules.exit.is_empty());
    }
}

mod validation_errors {
    use super::*;

    #[test]
    fn zero_period_is_config_error() {
        let ini = VALID_INI.replace("ema_period = 20", "ema_period = 0");
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let err = cli::build_rule_config(&adapter).unwrap_err();
        assert!(matches!(err, AnalyzerError::ConfigInvalid { ref key, .. } if key == "ema_period"));
        assert_eq!(ExitCode::from(&err), ExitCode::from(2));
    }

    #[test]
    fn rsi_threshold_above_100_is_rejected() {
        let ini = VALID_INI.replace("rsi_above = 60", "rsi_above = 160");
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        assert!(cli::build_rule_config(&adapter).is_err());
    }

    #[test]
    fn reversed_range_is_rejected() {
        let ini = VALID_INI.replace("to_date = 2025-07-23", "to_date = 2025-07-01");
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let err = cli::build_data_selection(&adapter).unwrap_err();
        assert!(matches!(err, AnalyzerError::ConfigInvalid { .. }));
    }

    #[test]
    fn missing_stock_is_rejected() {
        let ini = VALID_INI.replace("stock = RELIANCE\n", "");
        let adapter = FileConfigAdapter::from_string(&ini).unwrap();
        let err = cli::build_data_selection(&adapter).unwrap_err();
        assert!(matches!(err, AnalyzerError::ConfigMissing { ref key, .. } if key == "stock"));
    }
}

mod command_modes {
    use super::*;

    #[test]
    fn dry_run_succeeds_on_valid_config() {
        let file = write_temp_ini(VALID_INI);
        let code = cli::run_dry_run(file.path(), &Overrides::default());
        assert_eq!(code, ExitCode::SUCCESS);
    }

    #[test]
    fn dry_run_fails_on_missing_file() {
        let code = cli::run_dry_run(Path::new("/nonexistent/cfg.ini"), &Overrides::default());
        assert_eq!(code, ExitCode::from(2));
    }

    #[test]
    fn dry_run_honours_overrides() {
        let ini = VALID_INI.replace("stock = RELIANCE\n", "");
        let file = write_temp_ini(&ini);
        let without = cli::run_dry_run(file.path(), &Overrides::default());
        assert_eq!(without, ExitCode::from(2));

        let overrides = Overrides {
            stock: Some("TCS".to_string()),
            ..Overrides::default()
        };
        assert_eq!(cli::run_dry_run(file.path(), &overrides), ExitCode::SUCCESS);
    }

    #[test]
    fn validate_command_via_run() {
        use clap::Parser;
        let file = write_temp_ini(VALID_INI);
        let cli_args = Cli::parse_from([
            "stratanalyzer",
            "validate",
            "--config",
            file.path().to_str().unwrap(),
        ]);
        assert_eq!(cli::run(cli_args), ExitCode::SUCCESS);
    }
}

mod full_pipeline {
    use super::*;

    #[test]
    fn csv_files_to_reports() {
        let dir = tempfile::tempdir().unwrap();
        write_stock_csv(dir.path(), "INFY", "5", &generate_bars(900));
        write_stock_csv(dir.path(), "INFY", "15", &generate_bars(50));

        let html = dir.path().join("out").join("report.html");
        let trades = dir.path().join("out").join("trades.csv");
        let file = write_temp_ini(&ini_for_dir(dir.path(), ""));

        let config = FileConfigAdapter::from_file(file.path()).unwrap();
        let overrides = Overrides {
            output: Some(html.clone()),
            trades: Some(trades.clone()),
            ..Overrides::default()
        };
        let layered = cli::LayeredConfig::new(&config, &overrides);
        let selection = cli::build_data_selection(&layered).unwrap();
        let rules = cli::build_rule_config(&layered).unwrap();

        let port = CsvAdapter::new(selection.dir.clone());
        let result = cli::execute_backtest(&port, &selection, &rules).unwrap();
        assert!(result.bars_processed > 0);
        assert!(!result.ledger.is_empty());

        cli::write_reports(&layered, &selection, &rules, &result).unwrap();

        let csv = std::fs::read_to_string(&trades).unwrap();
        assert_eq!(csv.lines().count(), result.ledger.len() + 1);
        #[cfg(feature = "html-report")]
        {
            let contents = std::fs::read_to_string(&html).unwrap();
            assert!(contents.contains("INFY"));
            assert!(contents.contains("Trade Log"));
        }
    }

    #[test]
    fn csv_round_trip_matches_in_memory_run() {
        let dir = tempfile::tempdir().unwrap();
        let bars = generate_bars(400);
        write_stock_csv(dir.path(), "INFY", "5", &bars);

        let port = CsvAdapter::new(dir.path().to_path_buf());
        let loaded = port
            .fetch_bars("INFY", "5", date(2025, 7, 1), date(2025, 7, 31))
            .unwrap();
        assert_eq!(loaded.len(), bars.len());

        let rules = ema_cross_config(6);
        let from_disk = stratanalyzer::domain::backtest::run(&loaded, &rules).unwrap();
        let in_memory = stratanalyzer::domain::backtest::run(&bars, &rules).unwrap();
        assert_eq!(from_disk.ledger.len(), in_memory.ledger.len());
        assert!(
            (from_disk.summary.total_profit - in_memory.summary.total_profit).abs() < 1e-9
        );
    }

    #[test]
    fn backtest_command_end_to_end() {
        use clap::Parser;
        let dir = tempfile::tempdir().unwrap();
        write_stock_csv(dir.path(), "INFY", "5", &generate_bars(900));
        let trades = dir.path().join("trades.csv");
        let file = write_temp_ini(&ini_for_dir(
            dir.path(),
            &format!("\n[report]\ntrades_csv = {}\n", trades.display()),
        ));

        let cli_args = Cli::parse_from([
            "stratanalyzer",
            "backtest",
            "-c",
            file.path().to_str().unwrap(),
        ]);
        assert_eq!(cli::run(cli_args), ExitCode::SUCCESS);
        assert!(trades.exists());
    }

    #[test]
    fn backtest_with_unknown_stock_exits_no_data() {
        use clap::Parser;
        let dir = tempfile::tempdir().unwrap();
        write_stock_csv(dir.path(), "INFY", "5", &generate_bars(100));
        let file = write_temp_ini(&ini_for_dir(dir.path(), ""));

        let cli_args = Cli::parse_from([
            "stratanalyzer",
            "backtest",
            "-c",
            file.path().to_str().unwrap(),
            "--stock",
            "WIPRO",
        ]);
        assert_eq!(cli::run(cli_args), ExitCode::from(5));
    }

    #[test]
    fn list_stocks_reports_timeframes() {
        let dir = tempfile::tempdir().unwrap();
        write_stock_csv(dir.path(), "INFY", "5", &generate_bars(5));
        write_stock_csv(dir.path(), "INFY", "15", &generate_bars(5));
        write_stock_csv(dir.path(), "TCS", "1", &generate_bars(5));

        let port = CsvAdapter::new(dir.path().to_path_buf());
        assert_eq!(port.list_stocks().unwrap(), vec!["INFY", "TCS"]);
        assert_eq!(port.list_timeframes("INFY").unwrap(), vec!["5", "15"]);
    }
}
