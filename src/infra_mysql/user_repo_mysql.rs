use super::util::is_dup_key;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// Users live in `user (id BIGINT AUTO_INCREMENT, name, email, password)` with unique name and email.
pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    async fn fetch_one_where(&self, column: &str, value: &str) -> Result<Option<User>, AuthError> {
        let sql = format!("SELECT id, name, email, password FROM user WHERE {column} = ? LIMIT 1");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query user by {column}: {e}")))?;
        Ok(row.as_ref().map(to_user))
    }
}

fn to_user(row: &MySqlRow) -> User {
    User {
        id: row.get::<UserId, _>("id"),
        name: row.get::<String, _>("name"),
        email: row.get::<String, _>("email"),
        password_hash: row.get::<String, _>("password"),
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn create(&self, user: NewUser) -> Result<User, AuthError> {
        let result = sqlx::query(
            r#"
INSERT INTO user (name, email, password)
VALUES (?, ?, ?)
"#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_dup_key(&e) {
                AuthError::UserExists
            } else {
                AuthError::Store(e.to_string())
            }
        })?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|e| AuthError::InternalError(format!("user id out of range: {e}")))?;

        Ok(User {
            id: UserId(id),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
        })
    }

    async fn get(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        let row = sqlx::query("SELECT id, name, email, password FROM user WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Store(format!("query user: {e}")))?;
        Ok(row.as_ref().map(to_user))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        self.fetch_one_where("email", email).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<User>, AuthError> {
        self.fetch_one_where("name", name).await
    }
}
