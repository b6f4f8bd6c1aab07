use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use shared_utils::env::get_env_var;
use trends_ingestor::cli::commands::{Cli, Commands};
use trends_ingestor::config::{CONFIG_PATH_ENV, Config};
use trends_ingestor::fetch::fetch_all;
use trends_ingestor::io::csv_sink::CsvDirSink;
use trends_ingestor::providers::google_rest::GoogleTrendsProvider;
use trends_ingestor::validate::validate_all;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => get_env_var(CONFIG_PATH_ENV)
            .with_context(|| format!("pass --config or set {CONFIG_PATH_ENV}"))?,
    };
    let mut config = Config::load_path(&config_path)?;
    config.apply_env_overrides();
    let sink = CsvDirSink::new(&config.data_dir);

    let ok = match cli.command {
        Commands::Fetch { symbols } => run_fetch(&config, &sink, symbols).await?,
        Commands::Validate => run_validate(&config)?,
        Commands::Run => {
            let fetched = run_fetch(&config, &sink, None).await?;
            let validated = run_validate(&config)?;
            fetched && validated
        }
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Runs the fetch pipeline; returns false only when every series failed.
async fn run_fetch(config: &Config, sink: &CsvDirSink, symbols: Option<String>) -> Result<bool> {
    let provider = GoogleTrendsProvider::new(
        &config.provider.hl,
        config.provider.tz,
        config.rate_limit.timeout(),
    )?;

    let mut series = config.series_defs();
    if let Some(filter) = symbols {
        let wanted: Vec<&str> = filter.split(',').map(str::trim).collect();
        for symbol in &wanted {
            if !series.iter().any(|def| def.symbol == *symbol) {
                bail!("unknown series symbol `{symbol}`");
            }
        }
        series.retain(|def| wanted.contains(&def.symbol.as_str()));
    }

    let report = fetch_all(
        &provider,
        &series,
        config.window,
        &config.rate_limit.policy(),
        sink,
    )
    .await;
    println!("{report}");

    Ok(!report.all_failed())
}

/// Validates the data directory; returns false when any file is invalid.
fn run_validate(config: &Config) -> Result<bool> {
    let report = validate_all(&config.data_dir, config.freshness.max_age_days)
        .with_context(|| format!("reading data directory {}", config.data_dir.display()))?;

    if report.is_empty() {
        bail!(
            "no CSV files found to validate in {}",
            config.data_dir.display()
        );
    }
    println!("{report}");

    Ok(report.all_valid())
}
