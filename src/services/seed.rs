//! Demo accounts and a week of sample activity.
//!
//! Every step checks for existing data first, so running the seeder again is
//! harmless.

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate, NaiveTime};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

use crate::db::Store;
use crate::domain::{DateRange, Gender, Goal, Role, UserId, WorkoutType};
use crate::entities::users;
use crate::services::auth_service::{AuthService, RegisterUser};
use crate::services::daily_log_service::DailyLogService;
use crate::services::progress_service::ProgressService;
use crate::services::workout_service::{NewWorkout, WorkoutService};

struct DemoAccount {
    username: &'static str,
    email: &'static str,
    password: &'static str,
    age: i32,
    gender: Gender,
    height_cm: i32,
    weight_kg: f64,
    goal: Goal,
    roles: &'static [Role],
}

const DEMO_ACCOUNTS: [DemoAccount; 2] = [
    DemoAccount {
        username: "admin",
        email: "admin@fitnessapp.com",
        password: "admin123",
        age: 30,
        gender: Gender::Male,
        height_cm: 180,
        weight_kg: 80.0,
        goal: Goal::Maintain,
        roles: &[Role::User, Role::Admin],
    },
    DemoAccount {
        username: "testuser",
        email: "testuser@fitnessapp.com",
        password: "test123",
        age: 25,
        gender: Gender::Female,
        height_cm: 165,
        weight_kg: 65.0,
        goal: Goal::Lose,
        roles: &[Role::User],
    },
];

struct PlannedWorkout {
    hour: u32,
    minute: u32,
    workout_type: WorkoutType,
    minutes: i32,
    notes: &'static str,
}

const fn planned(
    hour: u32,
    minute: u32,
    workout_type: WorkoutType,
    minutes: i32,
    notes: &'static str,
) -> PlannedWorkout {
    PlannedWorkout {
        hour,
        minute,
        workout_type,
        minutes,
        notes,
    }
}

/// Workouts for the day `offset` days before today.
fn weekly_plan(offset: u32) -> Vec<PlannedWorkout> {
    use WorkoutType::{Cardio, Other, Strength, Yoga};

    match offset % 7 {
        0 => vec![planned(8, 0, Strength, 60, "Full body strength training - Squats, Deadlifts, Bench Press")],
        1 => vec![
            planned(7, 0, Cardio, 45, "Morning run - 5km at moderate pace"),
            planned(18, 30, Cardio, 30, "Evening cycling session"),
        ],
        2 => vec![planned(6, 30, Yoga, 60, "Vinyasa flow yoga - Full body stretch and flexibility")],
        3 => vec![
            planned(7, 30, Strength, 45, "Upper body strength - Push and pull exercises"),
            planned(19, 0, Cardio, 20, "HIIT session - 20 minutes high intensity"),
        ],
        4 => vec![planned(8, 0, Cardio, 50, "Long distance run - 8km steady pace")],
        5 => vec![
            planned(9, 0, Strength, 50, "Lower body strength - Legs and glutes"),
            planned(17, 0, Yoga, 30, "Restorative yoga - Recovery session"),
        ],
        _ if offset % 2 == 0 => vec![planned(10, 0, Other, 40, "Outdoor hiking - Nature walk and light climbing")],
        _ => vec![planned(8, 0, Yoga, 45, "Gentle yoga and meditation")],
    }
}

fn log_notes(offset: u32) -> &'static str {
    match offset % 3 {
        0 => "Active day - multiple workouts",
        1 => "Moderate activity day",
        _ => "Rest day with light activity",
    }
}

fn progress_notes(day: u32) -> &'static str {
    match day % 7 {
        0 => "Weekly measurement - Progress check",
        3 => "Mid-week check-in",
        6 => "End of week measurement",
        _ => "Daily tracking",
    }
}

/// Weight `day` days ago, following the account's goal. Rounded to 2 decimals.
#[must_use]
pub fn seeded_weight(base_kg: f64, goal: Option<Goal>, day: u32) -> f64 {
    let i = f64::from(day);
    let change = match goal {
        Some(Goal::Lose) => -i * 0.015,
        Some(Goal::Gain) => i * 0.01,
        _ => (i / 5.0).sin() * 0.5,
    };
    ((base_kg + change) * 100.0).round() / 100.0
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub logs_created: usize,
    pub workouts_created: usize,
    pub progress_created: usize,
}

pub struct Seeder {
    store: Store,
    auth: Arc<dyn AuthService>,
    daily_logs: Arc<dyn DailyLogService>,
    workouts: Arc<dyn WorkoutService>,
    progress: Arc<dyn ProgressService>,
}

impl Seeder {
    #[must_use]
    pub fn new(
        store: Store,
        auth: Arc<dyn AuthService>,
        daily_logs: Arc<dyn DailyLogService>,
        workouts: Arc<dyn WorkoutService>,
        progress: Arc<dyn ProgressService>,
    ) -> Self {
        Self {
            store,
            auth,
            daily_logs,
            workouts,
            progress,
        }
    }

    pub async fn run(&self, today: NaiveDate) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for account in &DEMO_ACCOUNTS {
            let user = self.ensure_account(account, &mut report).await?;
            self.seed_week(&user, today, &mut report).await?;
            self.seed_progress(&user, today, &mut report).await?;
        }

        info!(
            event = "seed_finished",
            users = report.users_created,
            logs = report.logs_created,
            workouts = report.workouts_created,
            progress = report.progress_created
        );
        Ok(report)
    }

    async fn ensure_account(
        &self,
        account: &DemoAccount,
        report: &mut SeedReport,
    ) -> Result<users::Model> {
        if let Some(user) = self.store.get_user_by_username(account.username).await? {
            return Ok(user);
        }

        let profile = self
            .auth
            .register(RegisterUser {
                username: account.username.to_string(),
                email: account.email.to_string(),
                password: account.password.to_string(),
                age: Some(account.age),
                gender: Some(account.gender),
                height_cm: Some(account.height_cm),
                current_weight_kg: Some(account.weight_kg),
                goal: Some(account.goal),
                roles: account.roles.iter().copied().collect::<BTreeSet<_>>(),
            })
            .await
            .with_context(|| format!("Failed to create demo account {}", account.username))?;
        report.users_created += 1;

        self.store
            .get_user(profile.id.value())
            .await?
            .context("Demo account vanished after creation")
    }

    async fn seed_week(
        &self,
        user: &users::Model,
        today: NaiveDate,
        report: &mut SeedReport,
    ) -> Result<()> {
        let user_id = UserId::from(user.id);

        for offset in 0..7u32 {
            let date = today - Duration::days(i64::from(offset));

            if self.daily_logs.get_by_date(user_id, date).await?.is_none() {
                self.daily_logs
                    .create_or_update(user_id, date, Some(log_notes(offset)))
                    .await?;
                report.logs_created += 1;
            }

            if !self
                .workouts
                .find_workouts(user_id, DateRange::between(date, date))
                .await?
                .is_empty()
            {
                continue;
            }

            for plan in weekly_plan(offset) {
                let time = NaiveTime::from_hms_opt(plan.hour, plan.minute, 0)
                    .context("Invalid planned workout time")?;
                self.workouts
                    .add_workout(
                        user_id,
                        NewWorkout {
                            date_time: date.and_time(time),
                            workout_type: plan.workout_type,
                            duration_minutes: Some(plan.minutes),
                            calories_burned: None,
                            notes: Some(plan.notes.to_string()),
                        },
                        true,
                    )
                    .await?;
                report.workouts_created += 1;
            }
        }

        Ok(())
    }

    async fn seed_progress(
        &self,
        user: &users::Model,
        today: NaiveDate,
        report: &mut SeedReport,
    ) -> Result<()> {
        let user_id = UserId::from(user.id);
        let window = DateRange::between(today - Duration::days(30), today);

        if !self
            .progress
            .get_progress_history(user_id, window)
            .await?
            .is_empty()
        {
            return Ok(());
        }

        let Some(base) = user.current_weight_kg else {
            return Ok(());
        };
        let goal = user.goal.as_deref().and_then(|g| g.parse().ok());

        for day in 0..30u32 {
            let date = today - Duration::days(i64::from(day));
            self.progress
                .add_progress(
                    user_id,
                    date,
                    seeded_weight(base, goal, day),
                    Some(progress_notes(day).to_string()),
                )
                .await?;
            report.progress_created += 1;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_weight_follows_goal() {
        assert!((seeded_weight(65.0, Some(Goal::Lose), 10) - 64.85).abs() < 1e-9);
        assert!((seeded_weight(70.0, Some(Goal::Gain), 10) - 70.1).abs() < 1e-9);
        assert!((seeded_weight(80.0, Some(Goal::Maintain), 0) - 80.0).abs() < 1e-9);
        // sin(1) * 0.5 = 0.4207...
        assert!((seeded_weight(80.0, None, 5) - 80.42).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_plan_covers_every_day() {
        let total: usize = (0..7).map(|offset| weekly_plan(offset).len()).sum();
        assert_eq!(total, 10);
        assert_eq!(weekly_plan(6)[0].workout_type, WorkoutType::Other);
    }
}
