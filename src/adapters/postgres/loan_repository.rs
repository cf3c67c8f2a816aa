use crate::domain::{BookId, Loan, LoanId, UserId};
use crate::ports::{
    Context, LoanRepository as LoanRepositoryTrait, RepositoryError, Result,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use super::is_unique_violation;

fn map_row_to_loan(row: &PgRow) -> std::result::Result<Loan, sqlx::Error> {
    Ok(Loan {
        id: LoanId::new(row.try_get("id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        book_id: BookId::new(row.try_get("book_id")?),
        borrowed_at: row.try_get("borrowed_at")?,
        due_date: row.try_get("due_date")?,
        returned_at: row.try_get("returned_at")?,
    })
}

/// LoanRepositoryのPostgreSQL実装
///
/// 在庫の増減と貸出の記録は1つのトランザクションで行う。
/// 在庫の引き当ては`amount > 0`を条件とするUPDATEで行うため、
/// 同時に最後の1冊を借りようとしても成功するのは1件だけ。
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn open(&self, ctx: &Context, loan: &Loan) -> Result<LoanId> {
        ctx.run(async {
            let mut tx = self.pool.begin().await?;

            // 在庫の引き当て
            let taken = sqlx::query(
                r#"
                UPDATE books
                SET amount = amount - 1
                WHERE id = $1 AND amount > 0
                "#,
            )
            .bind(loan.book_id.value())
            .execute(&mut *tx)
            .await?;

            if taken.rows_affected() == 0 {
                let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM books WHERE id = $1")
                    .bind(loan.book_id.value())
                    .fetch_optional(&mut *tx)
                    .await?;

                // txはドロップ時にロールバックされる
                return Err(match exists {
                    Some(_) => RepositoryError::OutOfStock {
                        book_id: loan.book_id.value(),
                    },
                    None => RepositoryError::book_not_found(loan.book_id.value()),
                }
                .into());
            }

            // 貸出の記録
            let inserted = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO loans (user_id, book_id, borrowed_at, due_date, returned_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(loan.user_id.value())
            .bind(loan.book_id.value())
            .bind(loan.borrowed_at)
            .bind(loan.due_date)
            .bind(loan.returned_at)
            .fetch_one(&mut *tx)
            .await;

            let id = match inserted {
                Ok(id) => id,
                Err(e) if is_unique_violation(&e) => {
                    return Err(RepositoryError::Duplicate {
                        entity: "loan",
                        field: "book_id",
                        value: loan.book_id.to_string(),
                    }
                    .into());
                }
                Err(e) => return Err(e.into()),
            };

            tx.commit().await?;
            Ok(LoanId::new(id))
        })
        .await
    }

    async fn close(&self, ctx: &Context, loan: &Loan) -> Result<()> {
        ctx.run(async {
            let mut tx = self.pool.begin().await?;

            // 未返却の貸出だけを更新する（二重返却で在庫を増やさない）
            let closed = sqlx::query(
                r#"
                UPDATE loans
                SET returned_at = $2
                WHERE id = $1 AND returned_at IS NULL
                "#,
            )
            .bind(loan.id.value())
            .bind(loan.returned_at)
            .execute(&mut *tx)
            .await?;

            if closed.rows_affected() == 0 {
                let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM loans WHERE id = $1")
                    .bind(loan.id.value())
                    .fetch_optional(&mut *tx)
                    .await?;

                return match exists {
                    Some(_) => Ok(()),
                    None => Err(RepositoryError::loan_not_found(loan.id.value()).into()),
                };
            }

            sqlx::query("UPDATE books SET amount = amount + 1 WHERE id = $1")
                .bind(loan.book_id.value())
                .execute(&mut *tx)
                .await?;

            tx.commit().await?;
            Ok(())
        })
        .await
    }

    async fn find_open(
        &self,
        ctx: &Context,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<Option<Loan>> {
        ctx.run(async {
            let row = sqlx::query(
                r#"
                SELECT id, user_id, book_id, borrowed_at, due_date, returned_at
                FROM loans
                WHERE user_id = $1 AND book_id = $2 AND returned_at IS NULL
                "#,
            )
            .bind(user_id.value())
            .bind(book_id.value())
            .fetch_optional(&self.pool)
            .await?;

            Ok(row.as_ref().map(map_row_to_loan).transpose()?)
        })
        .await
    }

    async fn search_by_user(&self, ctx: &Context, user_id: UserId) -> Result<Vec<Loan>> {
        ctx.run(async {
            let rows = sqlx::query(
                r#"
                SELECT id, user_id, book_id, borrowed_at, due_date, returned_at
                FROM loans
                WHERE user_id = $1
                ORDER BY borrowed_at DESC, id DESC
                "#,
            )
            .bind(user_id.value())
            .fetch_all(&self.pool)
            .await?;

            Ok(rows
                .iter()
                .map(map_row_to_loan)
                .collect::<std::result::Result<Vec<_>, _>>()?)
        })
        .await
    }
}
