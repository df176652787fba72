use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::db::models::User;
use crate::error::{AppError, DatabaseError};

/// CRUD access to the `users` relation. Email uniqueness is enforced by the
/// database; this layer only translates the violation into a typed error.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(config.connect_options())
            .await
            .map_err(|e| {
                AppError::Database(DatabaseError::ConnectionError(e.to_string()))
            })?;

        Ok(Self { pool })
    }

    /// At most one match, by the uniqueness invariant. Expects the caller to
    /// have normalized the email already.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, name, email, password, role, created_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Inserts a new user. A concurrent insert that already claimed the email
    /// surfaces as `DatabaseError::Duplicate`, distinct from generic query
    /// failures.
    pub async fn insert(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password, role) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, name, email, password, role, created_at",
        )
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
