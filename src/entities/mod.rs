pub mod prelude;

pub mod daily_logs;
pub mod meals;
pub mod progress_entries;
pub mod user_roles;
pub mod users;
pub mod workouts;
