use sqlx::{Pool, Sqlite};

use crate::db::models::User;
use crate::error::AppError;

pub struct UserRepository;

impl UserRepository {
    pub async fn create(
        pool: &Pool<Sqlite>,
        name: &str,
        email: &str,
        roll_no: &str,
        department: &str,
        phone: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let created_at = chrono::Utc::now().timestamp();

        sqlx::query_as::<_, User>(
            r#"
INSERT INTO users (name, email, roll_no, department, phone, password, created_at)
VALUES (?, ?, ?, ?, ?, ?, ?)
RETURNING *
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(roll_no)
        .bind(department)
        .bind(phone)
        .bind(password_hash)
        .bind(created_at)
        .fetch_one(pool)
        .await
        .map_err(conflict_from_unique)
    }

    pub async fn get_by_email(pool: &Pool<Sqlite>, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn get_by_id(pool: &Pool<Sqlite>, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn email_exists(pool: &Pool<Sqlite>, email: &str) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(row.is_some())
    }

    pub async fn roll_no_exists(pool: &Pool<Sqlite>, roll_no: &str) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE roll_no = ?")
            .bind(roll_no)
            .fetch_optional(pool)
            .await?;

        Ok(row.is_some())
    }

    pub async fn phone_exists(pool: &Pool<Sqlite>, phone: &str) -> Result<bool, AppError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE phone = ?")
            .bind(phone)
            .fetch_optional(pool)
            .await?;

        Ok(row.is_some())
    }

    pub async fn touch_last_login(pool: &Pool<Sqlite>, id: i64) -> Result<(), AppError> {
        let now = chrono::Utc::now().timestamp();

        sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }
}

/// Translate a UNIQUE-index rejection into the 409 error list. The schema's
/// unique indexes, not the pre-checks, are the source of truth for uniqueness.
fn conflict_from_unique(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            let message = db_err.message();
            let entry = if message.contains("users.email") {
                "Email already exists"
            } else if message.contains("users.roll_no") {
                "Roll number already exists"
            } else if message.contains("users.phone") {
                "Phone number already exists"
            } else {
                return AppError::Conflict(vec![message.to_string()]);
            };
            return AppError::Conflict(vec![entry.to_string()]);
        }
    }
    AppError::Database(err)
}
