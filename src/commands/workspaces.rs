use crate::core::{NormalizedTable, Platform};
use crate::filter::{campaigns_in, workspaces, WorkspaceSelector};
use crate::io::source::read_rows;
use crate::normalize::Normalizer;
use anyhow::Result;
use colored::*;
use std::io::Write;
use std::path::Path;

/// Print every workspace with its campaigns, then campaigns without one.
pub fn list_workspaces(
    campaigns_path: &Path,
    platform: Platform,
    out: &mut dyn Write,
) -> Result<()> {
    let rows = read_rows(campaigns_path)?;
    let (campaigns, names, _) = Normalizer::default().normalize_campaigns(&rows, platform);
    let table = NormalizedTable::new(platform, campaigns, Vec::new(), names);

    for name in workspaces(&table) {
        let members = campaigns_in(&table, &WorkspaceSelector::Named(name.to_string()));
        writeln!(out, "{} ({} campaigns)", name.bold(), members.len())?;
        for campaign in members {
            writeln!(out, "  - {} [{}]", campaign.name, campaign.id.dimmed())?;
        }
    }

    let unassigned = table.campaigns.iter().filter(|c| c.workspace.is_none()).count();
    if unassigned > 0 {
        writeln!(out, "{} ({} campaigns)", "Unassigned".yellow(), unassigned)?;
    }
    Ok(())
}
