mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::fx::FxConvertArgs;
use commands::health::BmiArgs;
use commands::loan::{AmortizeArgs, LoanPaymentArgs, PayoffArgs, TargetDateArgs};
use commands::time_value::{IrrArgs, NpvArgs, TvmArgs};
use commands::units::{ConvertArgs, UnitsArgs};

/// Loan, time-value, currency, unit and health calculators
#[derive(Parser)]
#[command(
    name = "calcpad",
    version,
    about = "Loan, time-value, currency, unit and health calculators",
    long_about = "A CLI for the calculator engines with decimal precision. Supports \
                  amortization schedules, payoff and target-date planning, NPV/IRR and \
                  TVM solving, cached currency conversion, unit conversion and BMI."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a fixed-term amortization schedule
    Amortize(AmortizeArgs),
    /// Level payment and totals for a fixed-term loan
    LoanPayment(LoanPaymentArgs),
    /// Schedule for a loan repaid with a given payment
    Payoff(PayoffArgs),
    /// Payment needed to repay a loan within a target number of periods
    TargetDate(TargetDateArgs),
    /// Net present value of periodic cash flows
    Npv(NpvArgs),
    /// Internal rate of return of periodic cash flows
    Irr(IrrArgs),
    /// Solve for the one missing time-value variable
    Tvm(TvmArgs),
    /// Convert between currencies
    FxConvert(FxConvertArgs),
    /// Convert a value between units of the same dimension
    Convert(ConvertArgs),
    /// List known units
    Units(UnitsArgs),
    /// Body-mass index and healthy weight range
    Bmi(BmiArgs),
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
    env_logger::init();
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::loan::run_amortize(args),
        Commands::LoanPayment(args) => commands::loan::run_loan_payment(args),
        Commands::Payoff(args) => commands::loan::run_payoff(args),
        Commands::TargetDate(args) => commands::loan::run_target_date(args),
        Commands::Npv(args) => commands::time_value::run_npv(args),
        Commands::Irr(args) => commands::time_value::run_irr(args),
        Commands::Tvm(args) => commands::time_value::run_tvm(args),
        Commands::FxConvert(args) => commands::fx::run_fx_convert(args),
        Commands::Convert(args) => commands::units::run_convert(args),
        Commands::Units(args) => commands::units::run_units(args),
        Commands::Bmi(args) => commands::health::run_bmi(args),
        Commands::Version => {
            println!("calcpad {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            log::debug!("command failed: {e:?}");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
