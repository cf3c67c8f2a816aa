use crate::domain::{Book, BookId};
use crate::ports::{
    BookRepository as BookRepositoryTrait, Context, RepositoryError, Result,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQLの行データをBookに変換する
fn map_row_to_book(row: &PgRow) -> std::result::Result<Book, sqlx::Error> {
    Ok(Book {
        id: BookId::new(row.try_get("id")?),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        amount: row.try_get("amount")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// BookRepositoryのPostgreSQL実装
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    /// PostgreSQLコネクションプールから新しいBookRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn get(&self, ctx: &Context, id: BookId) -> Result<Book> {
        ctx.run(async {
            let row = sqlx::query(
                r#"
                SELECT id, title, author, amount, created_at, updated_at
                FROM books
                WHERE id = $1
                "#,
            )
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

            match row {
                Some(row) => Ok(map_row_to_book(&row)?),
                None => Err(RepositoryError::book_not_found(id.value()).into()),
            }
        })
        .await
    }

    /// タイトル・著者のILIKE検索
    async fn search(&self, ctx: &Context, query: &str) -> Result<Vec<Book>> {
        let pattern = format!("%{}%", escape_like(query));

        ctx.run(async {
            let rows = sqlx::query(
                r#"
                SELECT id, title, author, amount, created_at, updated_at
                FROM books
                WHERE title ILIKE $1 OR author ILIKE $1
                ORDER BY id ASC
                "#,
            )
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await?;

            Ok(rows
                .iter()
                .map(map_row_to_book)
                .collect::<std::result::Result<Vec<_>, _>>()?)
        })
        .await
    }

    async fn create(&self, ctx: &Context, book: &Book) -> Result<BookId> {
        ctx.run(async {
            let id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO books (title, author, amount, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.amount)
            .bind(book.created_at)
            .bind(book.updated_at)
            .fetch_one(&self.pool)
            .await?;

            Ok(BookId::new(id))
        })
        .await
    }

    async fn update(&self, ctx: &Context, book: &Book) -> Result<()> {
        ctx.run(async {
            let result = sqlx::query(
                r#"
                UPDATE books
                SET title = $2, author = $3, amount = $4, updated_at = $5
                WHERE id = $1
                "#,
            )
            .bind(book.id.value())
            .bind(&book.title)
            .bind(&book.author)
            .bind(book.amount)
            .bind(book.updated_at)
            .execute(&self.pool)
            .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::book_not_found(book.id.value()).into());
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, ctx: &Context, id: BookId) -> Result<()> {
        ctx.run(async {
            let result = sqlx::query("DELETE FROM books WHERE id = $1")
                .bind(id.value())
                .execute(&self.pool)
                .await?;

            if result.rows_affected() == 0 {
                return Err(RepositoryError::book_not_found(id.value()).into());
            }
            Ok(())
        })
        .await
    }
}

/// LIKEのワイルドカードをエスケープする
fn escape_like(query: &str) -> String {
    let mut escaped = String::with_capacity(query.len());
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
