use crate::domain::{DateRange, Role};
use crate::entities::{daily_logs, meals, progress_entries, users, workouts};
use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

pub mod migrator;
pub mod repositories;

pub use repositories::meal::NewMealRow;
pub use repositories::user::{NewUserRow, page_offset};
pub use repositories::workout::NewWorkoutRow;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to `:memory:` would see its own empty database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(false);
        if !in_memory {
            opt.max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn daily_log_repo(&self) -> repositories::daily_log::DailyLogRepository {
        repositories::daily_log::DailyLogRepository::new(self.conn.clone())
    }

    fn meal_repo(&self) -> repositories::meal::MealRepository {
        repositories::meal::MealRepository::new(self.conn.clone())
    }

    fn workout_repo(&self) -> repositories::workout::WorkoutRepository {
        repositories::workout::WorkoutRepository::new(self.conn.clone())
    }

    fn progress_repo(&self) -> repositories::progress::ProgressRepository {
        repositories::progress::ProgressRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(&self, row: NewUserRow, roles: &BTreeSet<Role>) -> Result<users::Model> {
        self.user_repo().create(row, roles).await
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_api_key(&self, api_key: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_api_key(api_key).await
    }

    pub async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        self.user_repo().username_or_email_taken(username, email).await
    }

    pub async fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> Result<bool> {
        self.user_repo().email_taken_by_other(email, user_id).await
    }

    pub async fn user_roles(&self, user_id: Uuid) -> Result<BTreeSet<Role>> {
        self.user_repo().roles_for(user_id).await
    }

    pub async fn roles_for_users(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, BTreeSet<Role>>> {
        self.user_repo().roles_for_many(ids).await
    }

    pub async fn save_user(&self, model: users::Model) -> Result<users::Model> {
        self.user_repo().save(model).await
    }

    pub async fn set_user_active(&self, id: Uuid, active: bool) -> Result<Option<users::Model>> {
        self.user_repo().set_active(id, active).await
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<()> {
        self.user_repo().set_password_hash(id, password_hash).await
    }

    pub async fn add_role(&self, user_id: Uuid, role: Role) -> Result<bool> {
        self.user_repo().add_role(user_id, role).await
    }

    pub async fn remove_role(&self, user_id: Uuid, role: Role) -> Result<bool> {
        self.user_repo().remove_role(user_id, role).await
    }

    pub async fn delete_user(&self, id: Uuid) -> Result<bool> {
        self.user_repo().delete(id).await
    }

    pub async fn list_users_page(
        &self,
        keyword: Option<&str>,
        page: u64,
        size: u64,
    ) -> Result<(Vec<users::Model>, u64)> {
        self.user_repo().list_page(keyword, page, size).await
    }

    pub async fn list_all_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list_all().await
    }

    pub async fn users_with_role(&self, role: Role) -> Result<Vec<users::Model>> {
        self.user_repo().find_by_role(role).await
    }

    // ========================================================================
    // Daily logs
    // ========================================================================

    pub async fn get_daily_log(&self, id: Uuid) -> Result<Option<daily_logs::Model>> {
        self.daily_log_repo().get_by_id(id).await
    }

    pub async fn get_daily_log_by_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<daily_logs::Model>> {
        self.daily_log_repo().get_by_date(user_id, date).await
    }

    /// Returns the log and whether it was newly created.
    pub async fn create_or_update_daily_log(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        notes: Option<String>,
    ) -> Result<(daily_logs::Model, bool)> {
        self.daily_log_repo()
            .create_or_update(user_id, date, notes)
            .await
    }

    pub async fn update_daily_log_notes(
        &self,
        id: Uuid,
        notes: Option<String>,
    ) -> Result<Option<daily_logs::Model>> {
        self.daily_log_repo().update_notes(id, notes).await
    }

    pub async fn delete_daily_log(&self, id: Uuid) -> Result<bool> {
        self.daily_log_repo().delete(id).await
    }

    pub async fn list_daily_logs(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<daily_logs::Model>> {
        self.daily_log_repo().list_between(user_id, range).await
    }

    pub async fn delete_daily_logs_before(&self, cutoff: NaiveDate) -> Result<u64> {
        self.daily_log_repo().delete_before(cutoff).await
    }

    pub async fn recompute_daily_totals(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<daily_logs::Model>> {
        self.daily_log_repo().recompute_totals(user_id, date).await
    }

    // ========================================================================
    // Meals
    // ========================================================================

    pub async fn insert_meal(
        &self,
        log: &daily_logs::Model,
        row: NewMealRow,
    ) -> Result<(meals::Model, daily_logs::Model)> {
        self.meal_repo().insert(log, row).await
    }

    pub async fn get_meal_with_log(
        &self,
        id: Uuid,
    ) -> Result<Option<(meals::Model, daily_logs::Model)>> {
        self.meal_repo().get_with_log(id).await
    }

    pub async fn save_meal(
        &self,
        meal: meals::Model,
        log: &daily_logs::Model,
    ) -> Result<(meals::Model, daily_logs::Model)> {
        self.meal_repo().save(meal, log).await
    }

    pub async fn delete_meal(&self, id: Uuid, log: &daily_logs::Model) -> Result<daily_logs::Model> {
        self.meal_repo().delete(id, log).await
    }

    pub async fn list_meals_for_log(&self, daily_log_id: Uuid) -> Result<Vec<meals::Model>> {
        self.meal_repo().list_for_log(daily_log_id).await
    }

    pub async fn list_meals_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<(meals::Model, daily_logs::Model)>> {
        self.meal_repo().list_for_user(user_id).await
    }

    // ========================================================================
    // Workouts
    // ========================================================================

    pub async fn insert_workout(
        &self,
        row: NewWorkoutRow,
    ) -> Result<(workouts::Model, daily_logs::Model)> {
        self.workout_repo().insert(row).await
    }

    pub async fn get_workout(&self, id: Uuid) -> Result<Option<workouts::Model>> {
        self.workout_repo().get_by_id(id).await
    }

    pub async fn save_workout(
        &self,
        workout: workouts::Model,
        previous_date: NaiveDate,
    ) -> Result<(workouts::Model, daily_logs::Model)> {
        self.workout_repo().save(workout, previous_date).await
    }

    pub async fn delete_workout(
        &self,
        workout: &workouts::Model,
    ) -> Result<Option<daily_logs::Model>> {
        self.workout_repo().delete(workout).await
    }

    pub async fn list_workouts(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<workouts::Model>> {
        self.workout_repo().list(user_id, range).await
    }

    pub async fn count_workouts(&self, user_id: Uuid, range: DateRange) -> Result<u64> {
        self.workout_repo().count(user_id, range).await
    }

    pub async fn recent_workouts(
        &self,
        user_id: Uuid,
        since: NaiveDateTime,
        limit: u64,
    ) -> Result<Vec<workouts::Model>> {
        self.workout_repo().recent(user_id, since, limit).await
    }

    // ========================================================================
    // Progress
    // ========================================================================

    pub async fn insert_progress(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        weight_kg: f64,
        notes: Option<String>,
    ) -> Result<progress_entries::Model> {
        self.progress_repo()
            .insert(user_id, date, weight_kg, notes)
            .await
    }

    pub async fn progress_history(
        &self,
        user_id: Uuid,
        range: DateRange,
    ) -> Result<Vec<progress_entries::Model>> {
        self.progress_repo().history(user_id, range).await
    }

    pub async fn latest_progress(&self, user_id: Uuid) -> Result<Option<progress_entries::Model>> {
        self.progress_repo().latest_for_user(user_id).await
    }

    pub async fn latest_progress_for_all(
        &self,
    ) -> Result<HashMap<Uuid, progress_entries::Model>> {
        self.progress_repo().latest_for_all().await
    }
}
