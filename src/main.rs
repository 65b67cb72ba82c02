use anyhow::Result;
use cadmargin::cli::quote::QuoteArgs;
use cadmargin::core::currency::Currency;
use cadmargin::core::log::init_logging;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct QuoteOpts {
    /// Cost in CAD, excluding tax
    #[arg(long)]
    cost: Option<f64>,

    /// Target margin in percent (1-99); solves for the selling price
    #[arg(long, conflicts_with = "price")]
    margin: Option<f64>,

    /// Sale price in CAD, excluding tax; solves for the margin
    #[arg(long)]
    price: Option<f64>,

    /// Tax / HST rate in percent
    #[arg(long, allow_negative_numbers = true)]
    tax: Option<f64>,

    /// Currency to convert the selling price to (USD, EUR, GBP, JPY, AUD, MXN)
    #[arg(long)]
    currency: Option<Currency>,
}

impl From<QuoteOpts> for QuoteArgs {
    fn from(opts: QuoteOpts) -> QuoteArgs {
        QuoteArgs {
            cost: opts.cost,
            margin: opts.margin,
            price: opts.price,
            tax_rate: opts.tax,
            currency: opts.currency,
        }
    }
}

impl From<Commands> for cadmargin::AppCommand {
    fn from(cmd: Commands) -> cadmargin::AppCommand {
        match cmd {
            Commands::Interactive => cadmargin::AppCommand::Interactive,
            Commands::Quote(opts) => cadmargin::AppCommand::Quote(opts.into()),
            Commands::Rates => cadmargin::AppCommand::Rates,
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration (at --config-path if given)
    Setup,
    /// Prompt for inputs and show breakdowns until you quit (default)
    Interactive,
    /// Calculate a single pricing breakdown
    Quote(QuoteOpts),
    /// Show current exchange rates for the supported currencies
    Rates,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let command = cli.command.unwrap_or(Commands::Interactive);
    let result = match command {
        Commands::Setup => match cli.config_path.as_deref() {
            Some(path) => cadmargin::cli::setup::setup_at_path(path),
            None => cadmargin::cli::setup::setup(),
        },
        cmd => cadmargin::run_command(cmd.into(), cli.config_path.as_deref()).await,
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
