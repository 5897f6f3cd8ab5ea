use crate::db::now_epoch;
use crate::models::user::{NewUser, Role, User};
use anyhow::Result;
use bcrypt::hash;
use sqlx::SqlitePool;

const HASH_COST: u32 = 10;

#[derive(Debug)]
pub enum Registration {
    Created(User),
    EmailTaken,
}

/// Creates a `Client` account unless the email is already registered.
pub async fn register_user(pool: &SqlitePool, new_user: NewUser) -> Result<Registration> {
    if find_by_email(pool, &new_user.email).await?.is_some() {
        return Ok(Registration::EmailTaken);
    }

    let password = new_user.password;
    let password_hash = tokio::task::spawn_blocking(move || hash(password, HASH_COST)).await??;

    let inserted = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, name, role, created_at) VALUES (?, ?, ?, ?, ?) RETURNING *",
    )
    .bind(&new_user.email)
    .bind(&password_hash)
    .bind(&new_user.name)
    .bind(Role::Client)
    .bind(now_epoch())
    .fetch_one(pool)
    .await;

    match inserted {
        Ok(user) => {
            tracing::info!(user_id = user.id, email = %user.email, role = %user.role, "account registered");
            Ok(Registration::Created(user))
        }
        // Lost a race with a concurrent registration of the same email.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Ok(Registration::EmailTaken),
        Err(e) => Err(e.into()),
    }
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}
