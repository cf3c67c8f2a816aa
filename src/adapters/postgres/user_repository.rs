use crate::domain::{User, UserId};
use crate::ports::{
    Context, RepositoryError, Result, UserRepository as UserRepositoryTrait,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::is_unique_violation;

fn map_row_to_user(row: &PgRow) -> std::result::Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::new(row.try_get("id")?),
        username: row.try_get("username")?,
        password: row.try_get("password")?,
        email: row.try_get("email")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// UserRepositoryのPostgreSQL実装
///
/// ユーザー名の一意性はUNIQUE制約で保証する。
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn get(&self, ctx: &Context, id: UserId) -> Result<User> {
        ctx.run(async {
            let row = sqlx::query(
                r#"
                SELECT id, username, password, email, created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

            match row {
                Some(row) => Ok(map_row_to_user(&row)?),
                None => Err(RepositoryError::user_not_found(id.value()).into()),
            }
        })
        .await
    }

    async fn create(&self, ctx: &Context, user: &User) -> Result<UserId> {
        ctx.run(async {
            let result = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO users (username, password, email, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(&user.username)
            .bind(&user.password)
            .bind(&user.email)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(id) => Ok(UserId::new(id)),
                Err(e) if is_unique_violation(&e) => {
                    Err(RepositoryError::duplicate_username(&user.username).into())
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn update(&self, ctx: &Context, user: &User) -> Result<()> {
        ctx.run(async {
            let result = sqlx::query(
                r#"
                UPDATE users
                SET username = $2, password = $3, email = $4, updated_at = $5
                WHERE id = $1
                "#,
            )
            .bind(user.id.value())
            .bind(&user.username)
            .bind(&user.password)
            .bind(&user.email)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(done) if done.rows_affected() == 0 => {
                    Err(RepositoryError::user_not_found(user.id.value()).into())
                }
                Ok(_) => Ok(()),
                Err(e) if is_unique_violation(&e) => {
                    Err(RepositoryError::duplicate_username(&user.username).into())
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn delete(&self, ctx: &Context, id: UserId) -> Result<()> {
        ctx.run(async {
            let mut tx = self.pool.begin().await?;

            // 未返却の貸出の分は在庫に戻す（貸出自体はCASCADEで消える）
            sqlx::query(
                r#"
                UPDATE books
                SET amount = books.amount + open_loans.count
                FROM (
                    SELECT book_id, COUNT(*)::INTEGER AS count
                    FROM loans
                    WHERE user_id = $1 AND returned_at IS NULL
                    GROUP BY book_id
                ) AS open_loans
                WHERE books.id = open_loans.book_id
                "#,
            )
            .bind(id.value())
            .execute(&mut *tx)
            .await?;

            let result = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id.value())
                .execute(&mut *tx)
                .await?;

            // txはドロップ時にロールバックされる
            if result.rows_affected() == 0 {
                return Err(RepositoryError::user_not_found(id.value()).into());
            }

            tx.commit().await?;
            Ok(())
        })
        .await
    }
}
