use crate::core::{LeadDateField, Platform};
use crate::filter::DatePreset;
use crate::io::OutputFormat;
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "leadmetrics")]
#[command(about = "Campaign and lead KPI reports from exported outreach data", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute KPIs for a filtered slice of the data
    Report {
        /// Campaign table export (JSON)
        #[arg(long)]
        campaigns: PathBuf,

        /// Lead table export (JSON)
        #[arg(long)]
        leads: PathBuf,

        /// Email sequence step table export (JSON)
        #[arg(long)]
        sequences: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "email")]
        platform: Platform,

        /// Workspace name ("all" for every workspace)
        #[arg(long)]
        workspace: Option<String>,

        /// Restrict to one campaign id
        #[arg(long)]
        campaign: Option<String>,

        /// Named date window (defaults to the configured range)
        #[arg(long, value_enum, conflicts_with_all = ["from", "to"])]
        range: Option<DatePreset>,

        /// First day of an explicit range (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day of an explicit range (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Lead date the range applies to
        #[arg(long = "date-field", value_enum)]
        date_field: Option<LeadDateField>,

        /// Reference day for named ranges (defaults to the local date)
        #[arg(long)]
        today: Option<NaiveDate>,

        /// Also compute the preceding window and show changes
        #[arg(long)]
        compare: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "terminal")]
        format: OutputFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List workspace names and their campaigns
    Workspaces {
        /// Campaign table export (JSON)
        #[arg(long)]
        campaigns: PathBuf,

        #[arg(long, value_enum, default_value = "email")]
        platform: Platform,
    },

    /// Initialize configuration file
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}
