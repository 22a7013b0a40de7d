pub mod admin_service;
pub mod admin_service_impl;
pub use admin_service::{AdminError, AdminService, UserWeightReport};
pub use admin_service_impl::SeaOrmAdminService;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, AuthUser, LoginResult, RegisterUser};
pub use auth_service_impl::SeaOrmAuthService;

pub mod daily_log_service;
pub mod daily_log_service_impl;
pub use daily_log_service::{DailyLogDto, DailyLogError, DailyLogService};
pub use daily_log_service_impl::SeaOrmDailyLogService;

pub mod food_service;
pub mod food_service_impl;
pub use food_service::{FoodCalculation, FoodError, FoodSearchItem, FoodService, NutritionLookup};
pub use food_service_impl::DefaultFoodService;

pub mod meal_service;
pub mod meal_service_impl;
pub use meal_service::{DatedMeal, MealDto, MealError, MealService, MealUpdate, MealWrite, NewMeal};
pub use meal_service_impl::SeaOrmMealService;

pub mod progress_service;
pub mod progress_service_impl;
pub use progress_service::{ProgressDto, ProgressError, ProgressService, ProgressTrend};
pub use progress_service_impl::SeaOrmProgressService;

pub mod report_service;
pub mod report_service_impl;
pub use report_service::{ReportError, ReportService, ReportSummary};
pub use report_service_impl::SeaOrmReportService;

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{Page, ProfileUpdate, UserError, UserProfile, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod workout_service;
pub mod workout_service_impl;
pub use workout_service::{
    NewWorkout, WorkoutDto, WorkoutError, WorkoutService, WorkoutUpdate, WorkoutWrite,
};
pub use workout_service_impl::SeaOrmWorkoutService;

pub mod seed;
pub use seed::{SeedReport, Seeder};
