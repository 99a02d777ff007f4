mod commands;
mod config;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::batch::BatchArgs;
use commands::improvement::{HistoryArgs, ImproveArgs};
use commands::method::ValidateMethodArgs;
use commands::schedule::{BookValueArgs, ScheduleArgs};

/// Fixed-asset depreciation schedules and book values
#[derive(Parser)]
#[command(
    name = "depr",
    version,
    about = "Fixed-asset depreciation schedules and book values",
    long_about = "A CLI for computing fixed-asset depreciation with decimal precision. \
                  Supports straight-line, declining balance, double declining balance and \
                  sum-of-years'-digits schedules, point-in-time book values, capital \
                  improvement re-basing and batch runs over an asset register."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file (YAML or JSON)
    #[arg(long, env = "DEPR_CONFIG", global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Annual (and optionally monthly) depreciation schedule for one asset
    Schedule(ScheduleArgs),
    /// Book value of one asset on a date or at the close of a month
    BookValue(BookValueArgs),
    /// Re-base an asset for a capital improvement and splice its schedule
    Improve(ImproveArgs),
    /// Full history of a stored asset record including its improvements
    History(HistoryArgs),
    /// Run every asset in a register file and total depreciation by year
    Batch(BatchArgs),
    /// Check a depreciation method name
    ValidateMethod(ValidateMethodArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    config::init_tracing();

    let engine = match config::load_engine(cli.config.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(&engine, args),
        Commands::BookValue(args) => commands::schedule::run_book_value(&engine, args),
        Commands::Improve(args) => commands::improvement::run_improve(&engine, args),
        Commands::History(args) => commands::improvement::run_history(&engine, args),
        Commands::Batch(args) => commands::batch::run_batch(&engine, args),
        Commands::ValidateMethod(args) => commands::method::run_validate_method(&engine, args),
        Commands::Version => {
            println!("depr {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
