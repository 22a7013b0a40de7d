pub use super::daily_logs::Entity as DailyLogs;
pub use super::meals::Entity as Meals;
pub use super::progress_entries::Entity as ProgressEntries;
pub use super::user_roles::Entity as UserRoles;
pub use super::users::Entity as Users;
pub use super::workouts::Entity as Workouts;
