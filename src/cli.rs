//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_state_adapter::JsonStateAdapter;
use crate::domain::agent::Agent;
use crate::domain::backtest::{AgentRun, Backtest};
use crate::domain::cycle::{AgentBook, CycleReport, run_cycle};
use crate::domain::error::AgentBenchError;
use crate::domain::market::{MarketData, SymbolData};
use crate::domain::settings::RunSettings;
use crate::domain::strategy::StrategyConfig;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;
use crate::ports::state_port::StatePort;

#[derive(Parser, Debug)]
#[command(name = "agentbench", about = "Multi-agent trading strategy simulator")]
pub struct Cli {
    /// Log filter (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over historical CSV data
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Report directory, overrides [backtest] output_dir
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run one live trading cycle (or repeat every [service] interval_secs)
    Cycle {
        #[arg(short, long)]
        config: PathBuf,
        /// Agent book file, overrides [service] state_file
        #[arg(long)]
        state: Option<PathBuf>,
    },
    /// List the built-in strategy presets
    Presets,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config)
            } else {
                run_backtest(&config, output.as_deref())
            }
        }
        Command::Validate { config } => run_validate(&config),
        Command::Cycle { config, state } => run_service(&config, state.as_deref()),
        Command::Presets => {
            print_presets();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            (&err).into()
        }
    }
}

pub fn load_settings(path: &Path) -> Result<RunSettings, AgentBenchError> {
    info!(path = %path.display(), "loading config");
    let adapter = FileConfigAdapter::from_file(path)?;
    RunSettings::from_config(&adapter)
}

/// Loads, enriches and date-restricts every configured symbol. Symbols that
/// cannot be read are skipped with a warning.
pub fn load_market(
    settings: &RunSettings,
    data: &dyn DataPort,
) -> Result<MarketData, AgentBenchError> {
    let symbols = if settings.symbols.is_empty() {
        data.list_symbols()?
    } else {
        settings.symbols.clone()
    };

    let mut market = MarketData::new();
    for symbol in &symbols {
        let bars = match data.fetch_bars(symbol) {
            Ok(bars) => bars,
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "skipping symbol");
                continue;
            }
        };
        if bars.is_empty() {
            warn!(symbol = %symbol, "no bars, skipping");
            continue;
        }
        market.insert(SymbolData::new(symbol, bars));

        match data.fetch_sentiment(symbol) {
            Ok(series) => market.attach_sentiment(symbol, &series),
            Err(e) => warn!(symbol = %symbol, error = %e, "ignoring sentiment"),
        }
    }

    market.enrich(&settings.feed);
    market.restrict(settings.start_date, settings.end_date);
    if market.is_empty() {
        warn!("no market data in range");
    }
    Ok(market)
}

fn build_agents(settings: &RunSettings) -> Result<Vec<Agent>, AgentBenchError> {
    settings
        .agents
        .iter()
        .map(|(name, strategy)| Agent::new(name, strategy.clone(), settings.initial_capital))
        .collect()
}

fn run_backtest(config_path: &Path, output: Option<&Path>) -> Result<(), AgentBenchError> {
    let settings = load_settings(config_path)?;
    let data = CsvAdapter::new(settings.data_dir.clone());
    let market = load_market(&settings, &data)?;

    let mut backtest = Backtest::new(&market, build_agents(&settings)?)?;
    let runs = backtest.run()?;
    print_summary(runs);

    let output_dir = output.map(Path::to_path_buf).or(settings.output_dir.clone());
    if let Some(dir) = output_dir {
        CsvReportAdapter::new(dir).write(runs)?;
    }
    Ok(())
}

fn run_dry_run(config_path: &Path) -> Result<(), AgentBenchError> {
    let settings = load_settings(config_path)?;
    describe_settings(&settings);
    eprintln!("\nDry run complete: configuration is valid");
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), AgentBenchError> {
    let settings = load_settings(config_path)?;
    describe_settings(&settings);
    println!("OK");
    Ok(())
}

fn describe_settings(settings: &RunSettings) {
    eprintln!("Data dir:        {}", settings.data_dir.display());
    if settings.symbols.is_empty() {
        eprintln!("Symbols:         all in data dir");
    } else {
        eprintln!("Symbols:         {}", settings.symbols.join(", "));
    }
    eprintln!("Initial capital: {}", settings.initial_capital);
    for (name, strategy) in &settings.agents {
        eprintln!(
            "Agent {:<12} preset={} buy>={} sell<={} allocation={} stop={}xATR",
            name,
            strategy.name,
            strategy.buy_threshold,
            strategy.sell_threshold,
            strategy.allocation.kind(),
            strategy.trailing_stop.atr_multiplier
        );
    }
}

fn print_summary(runs: &[AgentRun]) {
    println!(
        "{:<16} {:<12} {:>14} {:>10} {:>10} {:>8} {:>8}",
        "agent", "strategy", "final value", "return %", "max dd %", "trades", "sharpe"
    );
    for run in runs {
        let m = run.metrics();
        println!(
            "{:<16} {:<12} {:>14} {:>10.2} {:>10.2} {:>8} {:>8.2}",
            run.agent.name,
            run.agent.config.name,
            m.final_value.round_dp(2),
            m.total_return_pct,
            m.max_drawdown_pct,
            m.trade_count,
            m.sharpe_ratio
        );
    }
}

fn print_presets() {
    for name in StrategyConfig::preset_names() {
        let Some(preset) = StrategyConfig::preset(name) else {
            continue;
        };
        let weights: Vec<String> = preset
            .weights
            .iter()
            .map(|(rule, w)| format!("{}={:+}", rule, w))
            .collect();
        println!("{:<12} {}", preset.name, preset.description);
        println!("{:<12} weights: {}", "", weights.join(" "));
        println!(
            "{:<12} buy>={} sell<={} allocation={} stop={}xATR reversal_exit={}",
            "",
            preset.buy_threshold,
            preset.sell_threshold,
            preset.allocation.kind(),
            preset.trailing_stop.atr_multiplier,
            preset.trend_reversal_exit
        );
    }
}

/// Loads the book, applies configured strategies, runs one cycle and
/// persists the result. The book is only written after a successful cycle.
pub fn cycle_once(
    settings: &RunSettings,
    data: &dyn DataPort,
    state: &dyn StatePort,
) -> Result<CycleReport, AgentBenchError> {
    let mut book = state.load()?.unwrap_or_else(AgentBook::default);
    book.sync_configs(settings.agents.clone(), settings.initial_capital)?;

    let market = load_market(settings, data)?;
    let (next, report) = run_cycle(&book, &market);
    if report.date.is_some() {
        state.save(&next)?;
    }
    Ok(report)
}

fn run_service(config_path: &Path, state_path: Option<&Path>) -> Result<(), AgentBenchError> {
    let settings = load_settings(config_path)?;
    let state_file = state_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| settings.service.state_file.clone());
    let state = JsonStateAdapter::new(state_file);
    let data = CsvAdapter::new(settings.data_dir.clone());

    loop {
        let report = cycle_once(&settings, &data, &state)?;
        print_cycle(&report);

        if settings.service.interval_secs == 0 {
            return Ok(());
        }
        info!(seconds = settings.service.interval_secs, "sleeping until next cycle");
        std::thread::sleep(Duration::from_secs(settings.service.interval_secs));
    }
}

fn print_cycle(report: &CycleReport) {
    let Some(date) = report.date else {
        println!("up to date, no new market data");
        return;
    };
    println!("cycle {}: {} trades", date, report.trade_count());
    for agent in &report.agents {
        println!("{:<16} value {:>14}", agent.name, agent.value.round_dp(2));
        for trade in &agent.trades {
            println!(
                "{:<16} {} {} {} @ {}",
                "", trade.side, trade.shares, trade.symbol, trade.price
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::bar::Bar;
    use crate::domain::sentiment::SentimentSeries;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::collections::HashMap;

    struct MockData {
        bars: HashMap<String, Vec<Bar>>,
    }

    impl DataPort for MockData {
        fn fetch_bars(&self, symbol: &str) -> Result<Vec<Bar>, AgentBenchError> {
            self.bars.get(symbol).cloned().ok_or_else(|| AgentBenchError::NoData {
                symbol: symbol.to_string(),
            })
        }

        fn fetch_sentiment(&self, _symbol: &str) -> Result<SentimentSeries, AgentBenchError> {
            Ok(SentimentSeries::default())
        }

        fn list_symbols(&self) -> Result<Vec<String>, AgentBenchError> {
            let mut symbols: Vec<String> = self.bars.keys().cloned().collect();
            symbols.sort();
            Ok(symbols)
        }
    }

    fn closes(symbol: &str, values: &[i64]) -> Vec<Bar> {
        values
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                let p = Decimal::from(v);
                Bar::new(
                    symbol,
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64),
                    p,
                    p,
                    p,
                    p,
                )
            })
            .collect()
    }

    fn settings(symbols: Vec<String>) -> RunSettings {
        let config = FileConfigAdapter::from_string(
            "[backtest]\ndata_dir = unused\nagents = basic\n[feed]\nsma_fast = 2\nsma_slow = 3\n",
        )
        .unwrap();
        RunSettings {
            symbols,
            ..RunSettings::from_config(&config).unwrap()
        }
    }

    #[test]
    fn cli_parses_backtest() {
        let cli =
            Cli::try_parse_from(["agentbench", "backtest", "-c", "run.ini", "--dry-run"]).unwrap();
        assert_eq!(cli.log_level, "info");
        assert!(matches!(cli.command, Command::Backtest { dry_run: true, .. }));
    }

    #[test]
    fn cli_parses_global_log_level_after_subcommand() {
        let cli =
            Cli::try_parse_from(["agentbench", "cycle", "-c", "run.ini", "--log-level", "debug"])
                .unwrap();
        assert_eq!(cli.log_level, "debug");
    }

    #[test]
    fn load_market_skips_missing_symbols_and_enriches() {
        let data = MockData {
            bars: HashMap::from([("AAPL".to_string(), closes("AAPL", &[1, 2, 3, 4]))]),
        };
        let market =
            load_market(&settings(vec!["AAPL".into(), "GONE".into()]), &data).unwrap();

        assert!(market.get("GONE").is_none());
        let aapl = market.get("AAPL").unwrap();
        assert_eq!(aapl.bar_count(), 4);
        assert!(aapl.bars[3].indicators.sma_slow.is_some());
    }

    #[test]
    fn load_market_lists_symbols_when_unconfigured() {
        let data = MockData {
            bars: HashMap::from([
                ("AAPL".to_string(), closes("AAPL", &[1])),
                ("MSFT".to_string(), closes("MSFT", &[1])),
            ]),
        };
        let market = load_market(&settings(Vec::new()), &data).unwrap();
        let names: Vec<&str> = market.symbols().map(|s| s.symbol.as_str()).collect();
        assert_eq!(names, vec!["AAPL", "MSFT"]);
    }
}
