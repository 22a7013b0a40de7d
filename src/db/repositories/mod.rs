pub mod daily_log;
pub mod meal;
pub mod progress;
pub mod user;
pub mod workout;
