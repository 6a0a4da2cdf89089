use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use tracing::instrument;

use dresscode_auth::{HashedPassword, NewUser, Role, User};
use dresscode_core::UserId;

use super::PgStore;
use crate::error::map_sqlx_error;
use crate::repo::UserRepository;
use crate::{StoreError, StoreResult};

#[derive(Debug)]
struct UserRow {
    id: i64,
    name: String,
    email: String,
    role: String,
    password_hash: String,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

impl UserRow {
    fn into_parts(self) -> StoreResult<(User, HashedPassword)> {
        let role: Role = self.role.parse().map_err(StoreError::Backend)?;
        Ok((
            User {
                id: UserId::new(self.id),
                name: self.name,
                email: self.email,
                role,
            },
            HashedPassword::from_hash(self.password_hash),
        ))
    }
}

const USER_COLUMNS: &str = "SELECT id, name, email, role, password_hash FROM users";

#[async_trait]
impl UserRepository for PgStore {
    #[instrument(skip(self, user), fields(email = %user.email), err)]
    async fn create_user(&self, user: &NewUser) -> StoreResult<UserId> {
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO users (name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        Ok(UserId::new(id))
    }

    #[instrument(skip(self), err)]
    async fn find_credentials(&self, email: &str) -> StoreResult<Option<(User, HashedPassword)>> {
        let row = sqlx::query(&format!("{USER_COLUMNS} WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_credentials", e))?;

        row.map(|r| {
            UserRow::from_row(&r)
                .map_err(|e| map_sqlx_error("find_credentials", e))?
                .into_parts()
        })
        .transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> StoreResult<User> {
        let row = sqlx::query(&format!("{USER_COLUMNS} WHERE id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?
            .ok_or(StoreError::NotFound)?;

        let (user, _) = UserRow::from_row(&row)
            .map_err(|e| map_sqlx_error("get_user", e))?
            .into_parts()?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn user_role(&self, id: UserId) -> StoreResult<Role> {
        let role: String = sqlx::query_scalar("SELECT role FROM users WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("user_role", e))?
            .ok_or(StoreError::NotFound)?;
        role.parse().map_err(StoreError::Backend)
    }

    #[instrument(skip(self), fields(user_id = %id, role = %role), err)]
    async fn set_role(&self, id: UserId, role: Role) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id.get())
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("set_role", e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
