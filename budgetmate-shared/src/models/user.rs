/// User model and database operations
///
/// Every user belongs to exactly one family. Joining another family through
/// an invite moves the user; their past transactions stay with the old one.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('admin', 'member');
///
/// CREATE TABLE users (
///     id BIGSERIAL PRIMARY KEY,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     name VARCHAR(255) NOT NULL,
///     avatar_url VARCHAR(512),
///     family_id BIGINT NOT NULL REFERENCES families(id) ON DELETE CASCADE,
///     role user_role NOT NULL DEFAULT 'member',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT users_email_key UNIQUE (email)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use budgetmate_shared::models::user::{CreateUser, User, UserRole};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool, family_id: i64) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser {
///     email: "asha@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     name: "Asha".to_string(),
///     family_id,
///     role: UserRole::Admin,
/// })
/// .await?;
///
/// let found = User::find_by_email(&pool, "asha@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

/// Role inside a family. Advisory only: the family creator is `admin`,
/// everyone who joins later is `member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Member => "member",
        }
    }
}

/// A user account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,

    /// Unique across all families
    pub email: String,

    /// Argon2id PHC string; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub name: String,

    pub avatar_url: Option<String>,

    pub family_id: i64,

    pub role: UserRole,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,

    /// Already hashed; see `auth::password::hash_password`
    pub password_hash: String,

    pub name: String,

    pub family_id: i64,

    pub role: UserRole,
}

impl User {
    /// Inserts a user.
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` when the email is
    /// already registered.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, name, family_id, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, email, password_hash, name, avatar_url, family_id, role, created_at
            "#,
        )
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.name)
        .bind(data.family_id)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, avatar_url, family_id, role, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Case-insensitive email lookup
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, avatar_url, family_id, role, created_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Whether `email` belongs to a user other than `user_id`.
    pub async fn email_taken_by_other(
        pool: &PgPool,
        email: &str,
        user_id: i64,
    ) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND id <> $2)",
        )
        .bind(email)
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    /// Members of a family, oldest account first.
    pub async fn list_by_family(pool: &PgPool, family_id: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, name, avatar_url, family_id, role, created_at
            FROM users
            WHERE family_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(family_id)
        .fetch_all(pool)
        .await
    }

    pub async fn update_profile(
        pool: &PgPool,
        id: i64,
        name: &str,
        email: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, email = $3
            WHERE id = $1
            RETURNING id, email, password_hash, name, avatar_url, family_id, role, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .fetch_one(pool)
        .await
    }

    pub async fn update_password(
        pool: &PgPool,
        id: i64,
        password_hash: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Moves the user into another family as a plain member.
    pub async fn join_family(pool: &PgPool, id: i64, family_id: i64) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET family_id = $2, role = 'member'
            WHERE id = $1
            RETURNING id, email, password_hash, name, avatar_url, family_id, role, created_at
            "#,
        )
        .bind(id)
        .bind(family_id)
        .fetch_one(pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: 7,
            email: "asha@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            name: "Asha".to_string(),
            avatar_url: None,
            family_id: 3,
            role: UserRole::Admin,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "admin");
        assert_eq!(json["family_id"], 3);
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(UserRole::Admin.as_str(), "admin");
        assert_eq!(UserRole::Member.as_str(), "member");
    }
}
