use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Fetches trends data into seed CSV files and validates them")]
pub struct Cli {
    /// Path to the config file (trend_seeds.toml). Falls back to the
    /// TREND_SEEDS_CONFIG environment variable.
    #[arg(short, long)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch every configured series and rewrite changed output files
    Fetch {
        /// Comma-separated subset of symbols to fetch (default: all)
        #[arg(long)]
        symbols: Option<String>,
    },

    /// Validate the output files in the data directory
    Validate,

    /// Fetch, then validate (the scheduled entry point)
    Run,
}
