//! Seed command handler

use chrono::Local;

use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_seed(config: &Config) -> anyhow::Result<()> {
    let state = SharedState::new(config.clone()).await?;
    let report = state.seeder().run(Local::now().date_naive()).await?;

    println!("Seed complete");
    println!("{:-<40}", "");
    println!("  Users created:    {}", report.users_created);
    println!("  Logs created:     {}", report.logs_created);
    println!("  Workouts created: {}", report.workouts_created);
    println!("  Progress entries: {}", report.progress_created);

    Ok(())
}
