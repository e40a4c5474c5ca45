use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use storefront_core::domain::user::{NewUser, User, UserId};

use super::{RepositoryError, UserRepository};
use crate::DbPool;

pub struct SqlUserRepository {
    pool: DbPool,
}

impl SqlUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, RepositoryError> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        email: row.try_get("email")?,
        name: row.try_get("name")?,
    })
}

#[async_trait::async_trait]
impl UserRepository for SqlUserRepository {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT id, email, name FROM users WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }

    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        let result = sqlx::query("INSERT INTO users (email, name) VALUES (?, ?)")
            .bind(&user.email)
            .bind(&user.name)
            .execute(&self.pool)
            .await?;

        Ok(User { id: UserId(result.last_insert_rowid()), email: user.email, name: user.name })
    }
}
