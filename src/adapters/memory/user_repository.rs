use async_trait::async_trait;

use crate::domain::{User, UserId};
use crate::ports::{Context, RepositoryError, Result, UserRepository};

use super::MemoryStore;

#[async_trait]
impl UserRepository for MemoryStore {
    async fn get(&self, ctx: &Context, id: UserId) -> Result<User> {
        let state = self.lock(ctx)?;
        state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::user_not_found(id.value()).into())
    }

    async fn create(&self, ctx: &Context, user: &User) -> Result<UserId> {
        let mut state = self.lock(ctx)?;
        if state.users.values().any(|u| u.username == user.username) {
            return Err(RepositoryError::duplicate_username(&user.username).into());
        }

        let id = state.next_user_id();
        let mut stored = user.clone();
        stored.id = id;
        state.users.insert(id, stored);
        Ok(id)
    }

    async fn update(&self, ctx: &Context, user: &User) -> Result<()> {
        let mut state = self.lock(ctx)?;
        if state
            .users
            .values()
            .any(|u| u.id != user.id && u.username == user.username)
        {
            return Err(RepositoryError::duplicate_username(&user.username).into());
        }

        match state.users.get_mut(&user.id) {
            Some(stored) => {
                let created_at = stored.created_at;
                *stored = user.clone();
                stored.created_at = created_at;
                Ok(())
            }
            None => Err(RepositoryError::user_not_found(user.id.value()).into()),
        }
    }

    async fn delete(&self, ctx: &Context, id: UserId) -> Result<()> {
        let mut guard = self.lock(ctx)?;
        let state = &mut *guard;
        if state.users.remove(&id).is_none() {
            return Err(RepositoryError::user_not_found(id.value()).into());
        }

        // 未返却の貸出の分は在庫に戻す
        for loan in state.loans.values().filter(|l| l.user_id == id && l.is_open()) {
            if let Some(book) = state.books.get_mut(&loan.book_id) {
                book.amount = book.amount.saturating_add(1);
            }
        }
        state.loans.retain(|_, loan| loan.user_id != id);
        Ok(())
    }
}
