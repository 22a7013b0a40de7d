use std::sync::Arc;

use crate::cache::{CacheStore, InMemoryCache};
use crate::clients::NutritionClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AdminService, AuthService, DailyLogService, DefaultFoodService, FoodService, MealService,
    NutritionLookup, ProgressService, ReportService, SeaOrmAdminService, SeaOrmAuthService,
    SeaOrmDailyLogService, SeaOrmMealService, SeaOrmProgressService, SeaOrmReportService,
    SeaOrmUserService, SeaOrmWorkoutService, Seeder, UserService, WorkoutService,
};

/// Build the HTTP client shared by every outbound integration.
///
/// Built once per process so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent("FitTrack/1.0")
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub cache: Arc<dyn CacheStore>,

    pub users: Arc<dyn UserService>,

    pub auth: Arc<dyn AuthService>,

    pub admin: Arc<dyn AdminService>,

    pub daily_logs: Arc<dyn DailyLogService>,

    pub meals: Arc<dyn MealService>,

    pub workouts: Arc<dyn WorkoutService>,

    pub progress: Arc<dyn ProgressService>,

    pub reports: Arc<dyn ReportService>,

    pub foods: Arc<dyn FoodService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(config.nutrition.timeout_seconds)?;
        let nutrition = Arc::new(NutritionClient::with_shared_client(
            http_client,
            &config.nutrition,
        )?);

        Ok(Self::with_parts(config, store, nutrition))
    }

    /// Wire the services over an existing store and nutrition backend.
    #[must_use]
    pub fn with_parts(config: Config, store: Store, nutrition: Arc<dyn NutritionLookup>) -> Self {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new());

        let users: Arc<dyn UserService> = Arc::new(SeaOrmUserService::new(store.clone()));
        let auth = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            config.security.clone(),
        )) as Arc<dyn AuthService>;
        let admin =
            Arc::new(SeaOrmAdminService::new(store.clone(), users.clone())) as Arc<dyn AdminService>;

        let foods = Arc::new(DefaultFoodService::new(nutrition, cache.clone())) as Arc<dyn FoodService>;

        let daily_logs =
            Arc::new(SeaOrmDailyLogService::new(store.clone())) as Arc<dyn DailyLogService>;
        let meals =
            Arc::new(SeaOrmMealService::new(store.clone(), foods.clone())) as Arc<dyn MealService>;
        let workouts = Arc::new(SeaOrmWorkoutService::new(store.clone())) as Arc<dyn WorkoutService>;
        let progress =
            Arc::new(SeaOrmProgressService::new(store.clone())) as Arc<dyn ProgressService>;
        let reports = Arc::new(SeaOrmReportService::new(store.clone(), cache.clone()))
            as Arc<dyn ReportService>;

        Self {
            config: Arc::new(config),
            store,
            cache,
            users,
            auth,
            admin,
            daily_logs,
            meals,
            workouts,
            progress,
            reports,
            foods,
        }
    }

    #[must_use]
    pub fn seeder(&self) -> Seeder {
        Seeder::new(
            self.store.clone(),
            self.auth.clone(),
            self.daily_logs.clone(),
            self.workouts.clone(),
            self.progress.clone(),
        )
    }
}
