//! User service - Handles user-related business logic.
//!
//! Enforces email uniqueness and orchestrates CRUD against the repository.
//! Absence is reported as `None`/`false`, never as an error.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use common::{AppError, AppResult};
use domain::{User, UserData};

use crate::repository::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a new user, rejecting an email that is already taken
    async fn create_user(&self, data: UserData) -> AppResult<User>;

    /// List all users
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Get user by ID
    async fn get_user(&self, id: i64) -> AppResult<Option<User>>;

    /// Get user by email
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Overwrite name and email of an existing user
    async fn update_user(&self, id: i64, data: UserData) -> AppResult<Option<User>>;

    /// Permanently delete user, returning whether it existed
    async fn delete_user(&self, id: i64) -> AppResult<bool>;
}

/// Concrete implementation of UserService using repository.
pub struct UserManager {
    repo: Arc<dyn UserRepository>,
}

impl UserManager {
    /// Create new user service instance with repository
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn create_user(&self, data: UserData) -> AppResult<User> {
        if self.repo.exists_by_email(&data.email).await? {
            warn!("Rejected user creation: email already registered");
            return Err(AppError::conflict("Email"));
        }

        let user = self.repo.insert(data).await?;
        info!(user_id = user.id, "User created");
        Ok(user)
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        debug!("Listing users");
        self.repo.list().await
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        debug!(user_id = id, "Looking up user by id");
        self.repo.find_by_id(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        debug!("Looking up user by email");
        self.repo.find_by_email(email).await
    }

    async fn update_user(&self, id: i64, data: UserData) -> AppResult<Option<User>> {
        let Some(mut user) = self.repo.find_by_id(id).await? else {
            return Ok(None);
        };

        // An unchanged email would always match its own record
        if user.email_changes_to(&data.email) && self.repo.exists_by_email(&data.email).await? {
            warn!(user_id = id, "Rejected user update: email already registered");
            return Err(AppError::conflict("Email"));
        }

        user.apply(data);
        let updated = self.repo.update(user).await?;
        info!(user_id = id, "User updated");
        Ok(Some(updated))
    }

    async fn delete_user(&self, id: i64) -> AppResult<bool> {
        if !self.repo.exists_by_id(id).await? {
            return Ok(false);
        }

        self.repo.delete_by_id(id).await?;
        info!(user_id = id, "User deleted");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::repository::MockUserRepository;

    fn service(repo: MockUserRepository) -> UserManager {
        UserManager::new(Arc::new(repo))
    }

    #[tokio::test]
    async fn test_create_user_success() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_email()
            .with(eq("alice@x.com"))
            .times(1)
            .returning(|_| Ok(false));
        repo.expect_insert()
            .times(1)
            .returning(|data| Ok(User::new(1, data.name, data.email)));

        let user = service(repo)
            .create_user(UserData::new("Alice", "alice@x.com"))
            .await
            .unwrap();

        assert_eq!(user, User::new(1, "Alice", "alice@x.com"));
    }

    #[tokio::test]
    async fn test_create_user_duplicate_email_skips_insert() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_email().returning(|_| Ok(true));
        repo.expect_insert().never();

        let result = service(repo)
            .create_user(UserData::new("Bob", "alice@x.com"))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_create_user_propagates_store_failure() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_email().returning(|_| Ok(false));
        repo.expect_insert()
            .returning(|_| Err(AppError::internal("store down")));

        let result = service(repo)
            .create_user(UserData::new("Alice", "alice@x.com"))
            .await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_list_users_empty() {
        let mut repo = MockUserRepository::new();
        repo.expect_list().returning(|| Ok(vec![]));

        let users = service(repo).list_users().await.unwrap();

        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_list_users_success() {
        let mut repo = MockUserRepository::new();
        repo.expect_list().returning(|| {
            Ok(vec![
                User::new(1, "Alice", "alice@x.com"),
                User::new(2, "Bob", "bob@x.com"),
            ])
        });

        let users = service(repo).list_users().await.unwrap();

        assert_eq!(users.len(), 2);
    }

    #[tokio::test]
    async fn test_get_user_success() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .with(eq(1))
            .returning(|id| Ok(Some(User::new(id, "Alice", "alice@x.com"))));

        let user = service(repo).get_user(1).await.unwrap();

        assert_eq!(user.map(|u| u.id), Some(1));
    }

    #[tokio::test]
    async fn test_get_user_not_found_is_none() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));

        let user = service(repo).get_user(99).await.unwrap();

        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_get_user_by_email() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .with(eq("alice@x.com"))
            .returning(|email| Ok(Some(User::new(1, "Alice", email))));

        let user = service(repo)
            .get_user_by_email("alice@x.com")
            .await
            .unwrap();

        assert_eq!(user.map(|u| u.name), Some("Alice".to_string()));
    }

    #[tokio::test]
    async fn test_update_user_not_found() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_exists_by_email().never();
        repo.expect_update().never();

        let result = service(repo)
            .update_user(99, UserData::new("Nobody", "nobody@x.com"))
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_user_same_email_skips_uniqueness_check() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(User::new(id, "Alice", "alice@x.com"))));
        repo.expect_exists_by_email().never();
        repo.expect_update().times(1).returning(Ok);

        let user = service(repo)
            .update_user(1, UserData::new("Alice B", "alice@x.com"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(user, User::new(1, "Alice B", "alice@x.com"));
    }

    #[tokio::test]
    async fn test_update_user_new_email_success() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(User::new(id, "Alice", "alice@x.com"))));
        repo.expect_exists_by_email()
            .with(eq("bob@x.com"))
            .times(1)
            .returning(|_| Ok(false));
        repo.expect_update()
            .withf(|user| user.id == 1 && user.name == "Alice B" && user.email == "bob@x.com")
            .times(1)
            .returning(Ok);

        let user = service(repo)
            .update_user(1, UserData::new("Alice B", "bob@x.com"))
            .await
            .unwrap();

        assert_eq!(user, Some(User::new(1, "Alice B", "bob@x.com")));
    }

    #[tokio::test]
    async fn test_update_user_taken_email_leaves_user_unmodified() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_id()
            .returning(|id| Ok(Some(User::new(id, "Alice", "alice@x.com"))));
        repo.expect_exists_by_email().returning(|_| Ok(true));
        repo.expect_update().never();

        let result = service(repo)
            .update_user(1, UserData::new("Alice B", "bob@x.com"))
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_delete_user_success() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_id().with(eq(1)).returning(|_| Ok(true));
        repo.expect_delete_by_id()
            .with(eq(1))
            .times(1)
            .returning(|_| Ok(()));

        assert!(service(repo).delete_user(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_user_absent_returns_false() {
        let mut repo = MockUserRepository::new();
        repo.expect_exists_by_id().returning(|_| Ok(false));
        repo.expect_delete_by_id().never();

        assert!(!service(repo).delete_user(1).await.unwrap());
    }
}
