use async_trait::async_trait;

use crate::domain::{Book, BookId};
use crate::ports::{BookRepository, Context, RepositoryError, Result};

use super::MemoryStore;

#[async_trait]
impl BookRepository for MemoryStore {
    async fn get(&self, ctx: &Context, id: BookId) -> Result<Book> {
        let state = self.lock(ctx)?;
        state
            .books
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::book_not_found(id.value()).into())
    }

    async fn search(&self, ctx: &Context, query: &str) -> Result<Vec<Book>> {
        let query = query.to_lowercase();
        let state = self.lock(ctx)?;
        Ok(state
            .books
            .values()
            .filter(|b| {
                b.title.to_lowercase().contains(&query) || b.author.to_lowercase().contains(&query)
            })
            .cloned()
            .collect())
    }

    async fn create(&self, ctx: &Context, book: &Book) -> Result<BookId> {
        let mut state = self.lock(ctx)?;
        let id = state.next_book_id();
        let mut stored = book.clone();
        stored.id = id;
        state.books.insert(id, stored);
        Ok(id)
    }

    async fn update(&self, ctx: &Context, book: &Book) -> Result<()> {
        let mut state = self.lock(ctx)?;
        match state.books.get_mut(&book.id) {
            Some(stored) => {
                let created_at = stored.created_at;
                *stored = book.clone();
                stored.created_at = created_at;
                Ok(())
            }
            None => Err(RepositoryError::book_not_found(book.id.value()).into()),
        }
    }

    async fn delete(&self, ctx: &Context, id: BookId) -> Result<()> {
        let mut state = self.lock(ctx)?;
        if state.books.remove(&id).is_none() {
            return Err(RepositoryError::book_not_found(id.value()).into());
        }
        state.loans.retain(|_, loan| loan.book_id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let ctx = Context::background();
        let book = Book::new("Dune", "Frank Herbert", 1).unwrap();

        let first = store.create(&ctx, &book).await.unwrap();
        let second = store.create(&ctx, &book).await.unwrap();

        assert_eq!(first, BookId::new(1));
        assert_eq!(second, BookId::new(2));
        assert_eq!(store.get(&ctx, second).await.unwrap().id, second);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_over_title_and_author() {
        let store = MemoryStore::new();
        let ctx = Context::background();
        for (title, author) in [
            ("Dune", "Frank Herbert"),
            ("Neuromancer", "William Gibson"),
            ("Children of Dune", "Frank Herbert"),
        ] {
            let book = Book::new(title, author, 1).unwrap();
            store.create(&ctx, &book).await.unwrap();
        }

        assert_eq!(store.search(&ctx, "dune").await.unwrap().len(), 2);
        assert_eq!(store.search(&ctx, "GIBSON").await.unwrap().len(), 1);
        assert!(store.search(&ctx, "tolkien").await.unwrap().is_empty());
        assert_eq!(store.search(&ctx, "").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_missing_book_is_not_found() {
        let store = MemoryStore::new();
        let mut book = Book::new("Dune", "Frank Herbert", 1).unwrap();
        book.id = BookId::new(42);

        let err = store
            .update(&Context::background(), &book)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<RepositoryError>(),
            Some(&RepositoryError::book_not_found(42))
        );
    }

    #[tokio::test]
    async fn test_cancelled_context_is_rejected() {
        let store = MemoryStore::new();
        let (ctx, handle) = Context::background().with_cancel();
        handle.cancel();

        let err = store.get(&ctx, BookId::new(1)).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<RepositoryError>(),
            Some(&RepositoryError::Cancelled)
        );
    }
}
