use async_trait::async_trait;

use crate::domain::{BookId, Loan, LoanId, UserId};
use crate::ports::{Context, LoanRepository, RepositoryError, Result};

use super::MemoryStore;

#[async_trait]
impl LoanRepository for MemoryStore {
    async fn open(&self, ctx: &Context, loan: &Loan) -> Result<LoanId> {
        let mut state = self.lock(ctx)?;

        // 同じ利用者・書籍の未返却の貸出は1件まで
        if state
            .loans
            .values()
            .any(|l| l.user_id == loan.user_id && l.book_id == loan.book_id && l.is_open())
        {
            return Err(RepositoryError::Duplicate {
                entity: "loan",
                field: "book_id",
                value: loan.book_id.to_string(),
            }
            .into());
        }

        let book = state
            .books
            .get_mut(&loan.book_id)
            .ok_or_else(|| RepositoryError::book_not_found(loan.book_id.value()))?;
        if book.amount <= 0 {
            return Err(RepositoryError::OutOfStock {
                book_id: loan.book_id.value(),
            }
            .into());
        }
        book.amount -= 1;

        let id = state.next_loan_id();
        let mut stored = loan.clone();
        stored.id = id;
        state.loans.insert(id, stored);
        Ok(id)
    }

    async fn close(&self, ctx: &Context, loan: &Loan) -> Result<()> {
        let mut state = self.lock(ctx)?;

        let stored = state
            .loans
            .get_mut(&loan.id)
            .ok_or_else(|| RepositoryError::loan_not_found(loan.id.value()))?;
        let was_open = stored.is_open();
        stored.returned_at = loan.returned_at;

        if was_open && !loan.is_open() {
            if let Some(book) = state.books.get_mut(&loan.book_id) {
                book.amount = book.amount.saturating_add(1);
            }
        }
        Ok(())
    }

    async fn find_open(
        &self,
        ctx: &Context,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<Option<Loan>> {
        let state = self.lock(ctx)?;
        Ok(state
            .loans
            .values()
            .find(|l| l.user_id == user_id && l.book_id == book_id && l.is_open())
            .cloned())
    }

    async fn search_by_user(&self, ctx: &Context, user_id: UserId) -> Result<Vec<Loan>> {
        let state = self.lock(ctx)?;
        let mut loans: Vec<Loan> = state
            .loans
            .values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.borrowed_at.cmp(&a.borrowed_at).then(b.id.cmp(&a.id)));
        Ok(loans)
    }
}
