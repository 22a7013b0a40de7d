//! Retention cleanup command handler

use chrono::Local;

use crate::config::Config;
use crate::scheduler::run_retention_cleanup;
use crate::state::SharedState;

pub async fn cmd_cleanup(config: &Config, days: Option<u32>) -> anyhow::Result<()> {
    let days = days.unwrap_or(config.scheduler.retention_days);
    if days == 0 {
        anyhow::bail!("Retention must keep at least one day of logs");
    }

    let state = SharedState::new(config.clone()).await?;
    let deleted = run_retention_cleanup(&state, Local::now().date_naive(), days).await?;

    println!("Removed {deleted} daily log(s) older than {days} day(s).");
    Ok(())
}
