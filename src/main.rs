use anyhow::Result;
use clap::Parser;
use leadmetrics::cli::{Cli, Commands};
use leadmetrics::commands::{self, ReportConfig};
use leadmetrics::config::load_config;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Report {
            campaigns,
            leads,
            sequences,
            platform,
            workspace,
            campaign,
            range,
            from,
            to,
            date_field,
            today,
            compare,
            format,
            output,
        } => {
            let settings = load_config();
            let config = ReportConfig {
                campaigns,
                leads,
                sequences,
                platform,
                workspace,
                campaign,
                range,
                from,
                to,
                date_field,
                // The only wall-clock read in the program
                today: today.unwrap_or_else(|| chrono::Local::now().date_naive()),
                compare,
                format,
                output,
            };
            commands::run_report(config, &settings)
        }
        Commands::Workspaces {
            campaigns,
            platform,
        } => commands::list_workspaces(&campaigns, platform, &mut std::io::stdout().lock()),
        Commands::Init { force } => commands::init_config(force),
    }
}

/// `-v` flags win over `RUST_LOG`; with neither, only warnings are shown.
fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
