use crate::config::CONFIG_FILE_NAME;
use crate::io;
use anyhow::Result;
use std::path::Path;

pub const DEFAULT_CONFIG: &str = r#"# Leadmetrics Configuration

[metrics]
# Decimal places kept on rate metrics
precision = 4
# "current-status" or "cumulative"
funnel_mode = "current-status"

[filters]
# today, this-week, last-week, last-7-days, last-30-days, this-month, last-month, all-time
default_range = "last-7-days"
# sent, reply or bounce
lead_date_field = "sent"

[cache]
enabled = true
ttl_secs = 300

[status_aliases]
# "warm lead" = "interested"
"#;

pub fn init_config(force: bool) -> Result<()> {
    init_config_in(Path::new("."), force)
}

pub fn init_config_in(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_FILE_NAME);

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    io::write_file(&config_path, DEFAULT_CONFIG)?;
    println!("Created {CONFIG_FILE_NAME} configuration file");

    Ok(())
}
