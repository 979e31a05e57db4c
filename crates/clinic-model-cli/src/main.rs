mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::currency::ConvertArgs;
use commands::model::ModelArgs;

/// Outpatient clinic financial model
#[derive(Parser)]
#[command(
    name = "clinic",
    version,
    about = "Outpatient clinic financial model",
    long_about = "Runs the clinic financial model with decimal precision: income statement, \
                  break-even, 5-year DCF (NPV, IRR, MIRR, payback), tornado and two-way \
                  sensitivity grids, stress scenarios and currency conversion. Inputs come \
                  from --input (JSON or YAML), a piped document on stdin, or the baseline scenario."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine stages to stderr (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full model
    Model(ModelArgs),
    /// Income statement (monthly, annual, % of revenue)
    Pnl(ModelArgs),
    /// Break-even volume, margin of safety and break-even tariff
    Breakeven(ModelArgs),
    /// 5-year cash flows with NPV, IRR, MIRR and payback
    Valuation(ModelArgs),
    /// One-at-a-time EBITDA sensitivity (±20%)
    Tornado(ModelArgs),
    /// Patients × tariff EBITDA grid
    Grid(ModelArgs),
    /// Discount rate × growth NPV grid
    NpvGrid(ModelArgs),
    /// Payer mix, volume and cost stress scenarios
    Stress(ModelArgs),
    /// Convert the monetary inputs to another currency
    Convert(ConvertArgs),
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

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Model(args) => commands::model::run_model(args),
        Commands::Pnl(args) => commands::model::run_pnl(args),
        Commands::Breakeven(args) => commands::model::run_breakeven(args),
        Commands::Valuation(args) => commands::model::run_valuation(args),
        Commands::Tornado(args) => commands::model::run_tornado(args),
        Commands::Grid(args) => commands::model::run_grid(args),
        Commands::NpvGrid(args) => commands::model::run_npv_grid(args),
        Commands::Stress(args) => commands::model::run_stress(args),
        Commands::Convert(args) => commands::currency::run_convert(args),
        Commands::Version => {
            println!("clinic {}", env!("CARGO_PKG_VERSION"));
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
