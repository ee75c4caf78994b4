use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use callboard::analytics::pagination::Nav;
use callboard::analytics::patterns::View;
use callboard::cli::{self, Context, OutputFormat};
use callboard::{source, web};

#[derive(Debug, Parser)]
#[command(name = "callboard")]
#[command(about = "Call-record analytics: summaries, activity patterns, revenue, and a paged call log")]
struct App {
    /// Read records from a JSON file instead of the configured API
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Totals, status breakdown, and running cost totals
    Summary {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Activity histogram for the current day, week, or month
    Pattern {
        /// day, week, or month (default from config)
        #[arg(long, value_parser = parse_view)]
        view: Option<View>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Cost per calendar month
    Revenue {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Call volume per week number
    Weekly {
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// One page of the call log, newest first
    Calls {
        /// Current page (1-based)
        #[arg(long, default_value = "1")]
        page: usize,
        /// Move from the current page: prev, next, or a page number
        #[arg(long, value_parser = parse_nav)]
        nav: Option<Nav>,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Refresh and redraw the summary and pattern on an interval
    Watch {
        /// day, week, or month (default from config)
        #[arg(long, value_parser = parse_view)]
        view: Option<View>,
    },
    /// Serve the local web dashboard
    Web {
        /// Listen address (default from config)
        #[arg(long)]
        addr: Option<String>,
        /// Open the dashboard in the default browser
        #[arg(long)]
        open: bool,
    },
    /// Check config, the call source, and the refresh log
    Health,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Write the default config to ~/.callboard/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `dashboard.page_size 25`
    Set { key: String, value: String },
    /// Restore the default config
    Reset,
}

fn parse_view(s: &str) -> Result<View, String> {
    View::parse(s).ok_or_else(|| format!("unknown view '{s}' (expected day, week, or month)"))
}

fn parse_nav(s: &str) -> Result<Nav, String> {
    Nav::parse(s).ok_or_else(|| format!("unknown nav '{s}' (expected prev, next, or a page number)"))
}

fn main() -> Result<()> {
    let app = App::parse();
    let ctx = Context::new(app.input);

    match app.command {
        Commands::Summary { format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_summary(&ctx, fmt)
        }
        Commands::Pattern { view, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_pattern(&ctx, view, fmt)
        }
        Commands::Revenue { format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_revenue(&ctx, fmt)
        }
        Commands::Weekly { format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_weekly(&ctx, fmt)
        }
        Commands::Calls { page, nav, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_calls(&ctx, page, nav, fmt)
        }
        Commands::Watch { view } => cli::run_watch(&ctx, view),
        Commands::Web { addr, open } => {
            let addr = addr.unwrap_or_else(|| ctx.config.dashboard.listen_addr.clone());
            let source = source::from_config(&ctx.config, ctx.input.as_deref());
            web::serve(&addr, web::Dashboard::new(ctx.config, source), open)
        }
        Commands::Health => cli::run_health(&ctx),
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
