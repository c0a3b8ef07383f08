use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use oakie::cli::setup::setup;
use oakie::core::log::init_logging;
use oakie::core::query::{ALL_SECTORS, Sort, SortDirection};
use oakie::core::{LookbackPeriod, MarketCapBand, QueryParams, SortField};

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

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// List companies with filters, sorting and pagination
    List {
        /// Case-insensitive match on company name or ticker
        #[arg(short, long, default_value = "")]
        search: String,
        /// Exact sector name
        #[arg(long, default_value = ALL_SECTORS)]
        sector: String,
        /// One of micro, small, mid, large
        #[arg(short, long)]
        market_cap: Option<MarketCapBand>,
        /// Sort field, e.g. name, ticker, market-cap, price, difference
        #[arg(long)]
        sort: Option<SortField>,
        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
        /// Page number, starting at 1
        #[arg(short, long, default_value_t = 1)]
        page: usize,
    },
    /// List the available sectors
    Sectors,
    /// Compare a company's price history with its intrinsic value
    Analysis {
        ticker: String,
        /// Lookback period: 1M, 3M, 6M, YTD, 1Y, 2Y, 3Y, 4Y, 5Y or All
        #[arg(short, long)]
        period: Option<LookbackPeriod>,
    },
}

impl From<Commands> for oakie::AppCommand {
    fn from(cmd: Commands) -> oakie::AppCommand {
        match cmd {
            Commands::List {
                search,
                sector,
                market_cap,
                sort,
                desc,
                page,
            } => oakie::AppCommand::List(QueryParams {
                search_term: search,
                sector: Some(sector),
                market_cap,
                sort: sort.map(|field| Sort {
                    field,
                    direction: if desc {
                        SortDirection::Descending
                    } else {
                        SortDirection::Ascending
                    },
                }),
                page: page.max(1),
            }),
            Commands::Sectors => oakie::AppCommand::Sectors,
            Commands::Analysis { ticker, period } => oakie::AppCommand::Analysis { ticker, period },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => setup(),
        Some(cmd) => oakie::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
