use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::{BTreeSet, HashMap};
use tokio::task;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::domain::Role;
use crate::entities::{user_roles, users};

/// Fields required to insert a new account. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUserRow {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub height_cm: Option<i32>,
    pub current_weight_kg: Option<f64>,
    pub goal: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the user row and its role rows in one transaction.
    pub async fn create(&self, row: NewUserRow, roles: &BTreeSet<Role>) -> Result<users::Model> {
        let now = chrono::Utc::now().to_rfc3339();
        let txn = self.conn.begin().await?;

        let model = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(row.username),
            email: Set(row.email),
            password_hash: Set(row.password_hash),
            api_key: Set(generate_api_key()),
            age: Set(row.age),
            gender: Set(row.gender),
            height_cm: Set(row.height_cm),
            current_weight_kg: Set(row.current_weight_kg),
            goal: Set(row.goal),
            active: Set(true),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .context("Failed to insert user")?;

        for role in roles {
            user_roles::ActiveModel {
                user_id: Set(model.id),
                role: Set(role.as_str().to_string()),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        Ok(model)
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")
    }

    pub async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(
                Condition::any()
                    .add(users::Column::Username.eq(username))
                    .add(users::Column::Email.eq(email)),
            )
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    /// True when another account already uses this email.
    pub async fn email_taken_by_other(&self, email: &str, user_id: Uuid) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .filter(users::Column::Id.ne(user_id))
            .count(&self.conn)
            .await?;
        Ok(count > 0)
    }

    pub async fn get_by_api_key(&self, api_key: &str) -> Result<Option<users::Model>> {
        users::Entity::find()
            .filter(users::Column::ApiKey.eq(api_key))
            .one(&self.conn)
            .await
            .context("Failed to query user by API key")
    }

    pub async fn roles_for(&self, user_id: Uuid) -> Result<BTreeSet<Role>> {
        let rows = user_roles::Entity::find()
            .filter(user_roles::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await?;

        Ok(rows.iter().filter_map(|r| r.role.parse().ok()).collect())
    }

    pub async fn roles_for_many(&self, user_ids: &[Uuid]) -> Result<HashMap<Uuid, BTreeSet<Role>>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = user_roles::Entity::find()
            .filter(user_roles::Column::UserId.is_in(user_ids.iter().copied()))
            .all(&self.conn)
            .await?;

        let mut map: HashMap<Uuid, BTreeSet<Role>> = HashMap::new();
        for row in rows {
            if let Ok(role) = row.role.parse() {
                map.entry(row.user_id).or_default().insert(role);
            }
        }
        Ok(map)
    }

    /// Persist every column of an already loaded and modified model.
    pub async fn save(&self, mut model: users::Model) -> Result<users::Model> {
        model.updated_at = chrono::Utc::now().to_rfc3339();
        let active: users::ActiveModel = model.into();
        let saved = active.reset_all().update(&self.conn).await?;
        Ok(saved)
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<Option<users::Model>> {
        let Some(user) = self.get_by_id(id).await? else {
            return Ok(None);
        };

        let mut model: users::ActiveModel = user.into();
        model.active = Set(active);
        model.updated_at = Set(chrono::Utc::now().to_rfc3339());
        Ok(Some(model.update(&self.conn).await?))
    }

    pub async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<()> {
        let user = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let mut model: users::ActiveModel = user.into();
        model.password_hash = Set(password_hash);
        model.updated_at = Set(chrono::Utc::now().to_rfc3339());
        model.update(&self.conn).await?;
        Ok(())
    }

    /// Returns false when the user already held the role.
    pub async fn add_role(&self, user_id: Uuid, role: Role) -> Result<bool> {
        let existing = user_roles::Entity::find_by_id((user_id, role.as_str().to_string()))
            .one(&self.conn)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        user_roles::ActiveModel {
            user_id: Set(user_id),
            role: Set(role.as_str().to_string()),
        }
        .insert(&self.conn)
        .await?;
        Ok(true)
    }

    pub async fn remove_role(&self, user_id: Uuid, role: Role) -> Result<bool> {
        let result = user_roles::Entity::delete_many()
            .filter(user_roles::Column::UserId.eq(user_id))
            .filter(user_roles::Column::Role.eq(role.as_str()))
            .exec(&self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = users::Entity::delete_by_id(id).exec(&self.conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Zero-based page of users ordered by username, plus the total row count.
    ///
    /// The keyword matches literally; `%` and `_` are not wildcards. A page
    /// whose offset does not fit SQLite's `OFFSET` comes back empty.
    pub async fn list_page(
        &self,
        keyword: Option<&str>,
        page: u64,
        size: u64,
    ) -> Result<(Vec<users::Model>, u64)> {
        let size = size.max(1);
        let mut query = users::Entity::find();

        if let Some(keyword) = keyword.map(str::trim).filter(|k| !k.is_empty()) {
            let pattern = format!("%{}%", escape_like(keyword));
            // SQLite LIKE is case-insensitive for ASCII.
            query = query.filter(
                Condition::any()
                    .add(users::Column::Username.like(LikeExpr::new(&pattern).escape('\\')))
                    .add(users::Column::Email.like(LikeExpr::new(&pattern).escape('\\'))),
            );
        }

        let paginator = query
            .order_by_asc(users::Column::Username)
            .paginate(&self.conn, size);

        let total = paginator.num_items().await?;
        let rows = if page_offset(page, size).is_some() {
            paginator.fetch_page(page).await?
        } else {
            Vec::new()
        };
        Ok((rows, total))
    }

    pub async fn list_all(&self) -> Result<Vec<users::Model>> {
        Ok(users::Entity::find()
            .order_by_asc(users::Column::Username)
            .all(&self.conn)
            .await?)
    }

    pub async fn find_by_role(&self, role: Role) -> Result<Vec<users::Model>> {
        let rows = users::Entity::find()
            .inner_join(user_roles::Entity)
            .filter(user_roles::Column::Role.eq(role.as_str()))
            .order_by_asc(users::Column::Username)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }
}

/// Hash a password using Argon2id on the blocking pool.
pub async fn hash_password_blocking(password: &str, config: &SecurityConfig) -> Result<String> {
    let password = password.to_string();
    let config = config.clone();
    task::spawn_blocking(move || hash_password(&password, &config))
        .await
        .context("Password hashing task panicked")?
}

pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored PHC string.
/// Note: This uses `spawn_blocking` because Argon2 is CPU-intensive.
pub async fn verify_password(password_hash: &str, password: &str) -> Result<bool> {
    let password_hash = password_hash.to_string();
    let password = password.to_string();

    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

/// Generate a random API key (64 character hex string)
#[must_use]
pub fn generate_api_key() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Row offset of `page`, if it fits a signed 64-bit `OFFSET`.
#[must_use]
pub fn page_offset(page: u64, size: u64) -> Option<i64> {
    page.checked_mul(size).and_then(|offset| i64::try_from(offset).ok())
}

/// Escapes backslash, `%` and `_` for a backslash-escaped `LIKE` pattern.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("ann"), "ann");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(3, 10), Some(30));
        assert_eq!(page_offset(u64::MAX, 100), None);
        assert_eq!(page_offset(u64::MAX / 2, 2), None);
    }

    #[test]
    fn test_api_key_shape() {
        let key = generate_api_key();
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key, generate_api_key());
    }

    #[tokio::test]
    async fn test_hash_then_verify() {
        let config = SecurityConfig::default();
        let hash = hash_password_blocking("secret-pass", &config).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(&hash, "secret-pass").await.unwrap());
        assert!(!verify_password(&hash, "wrong").await.unwrap());
    }
}
