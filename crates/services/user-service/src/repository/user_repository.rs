//! User repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{
    sqlx, ActiveModelTrait, ActiveValue::Unchanged, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, RuntimeErr, Set, SqlErr,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use common::{AppError, AppResult};
use domain::{User, UserData};

#[cfg(test)]
use mockall::automock;

/// User repository trait for dependency injection.
///
/// Records are keyed by a store-assigned id, with a secondary unique
/// lookup path on email.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>>;

    /// Find user by email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Check whether a user with this ID exists
    async fn exists_by_id(&self, id: i64) -> AppResult<bool>;

    /// Check whether any user holds this email address
    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;

    /// List all users
    async fn list(&self) -> AppResult<Vec<User>>;

    /// Insert a new user; the store assigns the ID
    async fn insert(&self, data: UserData) -> AppResult<User>;

    /// Overwrite name and email of an existing user
    async fn update(&self, user: User) -> AppResult<User>;

    /// Permanently delete user by ID
    async fn delete_by_id(&self, id: i64) -> AppResult<()>;
}

/// Concrete implementation of UserRepository backed by SeaORM
pub struct UserStore {
    db: Arc<DatabaseConnection>,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

/// Map write failures, surfacing the email unique index as a conflict.
fn map_write_err(err: DbErr) -> AppError {
    if matches!(err, DbErr::RecordNotUpdated) {
        return AppError::NotFound;
    }

    if is_unique_violation(&err) {
        tracing::warn!("Unique constraint rejected write: {}", err);
        return AppError::conflict("Email");
    }

    AppError::from(err)
}

fn is_unique_violation(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }

    match err {
        DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(e)))
        | DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(e))) => e.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn exists_by_id(&self, id: i64) -> AppResult<bool> {
        let count = UserEntity::find_by_id(id).count(&*self.db).await?;
        Ok(count > 0)
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        let count = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .count(&*self.db)
            .await?;
        Ok(count > 0)
    }

    async fn list(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_asc(user::Column::Id)
            .all(&*self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn insert(&self, data: UserData) -> AppResult<User> {
        let active_model = ActiveModel {
            name: Set(data.name),
            email: Set(data.email),
            ..Default::default()
        };

        let model = active_model.insert(&*self.db).await.map_err(map_write_err)?;
        Ok(User::from(model))
    }

    async fn update(&self, user: User) -> AppResult<User> {
        let active_model = ActiveModel {
            id: Unchanged(user.id),
            name: Set(user.name),
            email: Set(user.email),
        };

        let model = active_model.update(&*self.db).await.map_err(map_write_err)?;
        Ok(User::from(model))
    }

    async fn delete_by_id(&self, id: i64) -> AppResult<()> {
        UserEntity::delete_by_id(id)
            .exec(&*self.db)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;

    use sea_orm::sqlx::error::{DatabaseError, ErrorKind};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    use super::*;

    /// Postgres-style rejection from the `idx_users_email` unique index.
    #[derive(Debug)]
    struct DuplicateEmail;

    impl fmt::Display for DuplicateEmail {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message())
        }
    }

    impl StdError for DuplicateEmail {}

    impl DatabaseError for DuplicateEmail {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint \"idx_users_email\""
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed("23505"))
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    fn duplicate_email() -> RuntimeErr {
        RuntimeErr::SqlxError(sqlx::Error::Database(Box::new(DuplicateEmail)))
    }

    fn model(id: i64, name: &str, email: &str) -> user::Model {
        user::Model {
            id,
            name: name.to_string(),
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn find_by_id_maps_model_to_domain() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(1, "Alice", "alice@x.com")]])
            .into_connection();
        let store = UserStore::new(Arc::new(db));

        let user = store.find_by_id(1).await.unwrap();

        assert_eq!(user, Some(User::new(1, "Alice", "alice@x.com")));
    }

    #[tokio::test]
    async fn find_by_email_returns_none_when_absent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let store = UserStore::new(Arc::new(db));

        let user = store.find_by_email("nobody@x.com").await.unwrap();

        assert!(user.is_none());
    }

    #[tokio::test]
    async fn list_returns_all_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![
                model(1, "Alice", "alice@x.com"),
                model(2, "Bob", "bob@x.com"),
            ]])
            .into_connection();
        let store = UserStore::new(Arc::new(db));

        let users = store.list().await.unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[1].email, "bob@x.com");
    }

    #[tokio::test]
    async fn insert_returns_store_assigned_id() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![model(42, "Alice", "alice@x.com")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 42,
                rows_affected: 1,
            }])
            .into_connection();
        let store = UserStore::new(Arc::new(db));

        let user = store
            .insert(UserData::new("Alice", "alice@x.com"))
            .await
            .unwrap();

        assert_eq!(user.id, 42);
        assert_eq!(user.name, "Alice");
    }

    #[tokio::test]
    async fn update_of_missing_row_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let store = UserStore::new(Arc::new(db));

        let result = store.update(User::new(9, "Ghost", "ghost@x.com")).await;

        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn delete_by_id_executes_delete() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();
        let store = UserStore::new(Arc::new(db));

        assert!(store.delete_by_id(1).await.is_ok());
    }

    #[tokio::test]
    async fn query_errors_propagate_as_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".to_string())])
            .into_connection();
        let store = UserStore::new(Arc::new(db));

        let result = store.find_by_id(1).await;

        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[test]
    fn unique_violation_on_write_maps_to_conflict() {
        assert!(matches!(
            map_write_err(DbErr::Exec(duplicate_email())),
            AppError::Conflict(entity) if entity == "Email"
        ));
        assert!(matches!(
            map_write_err(DbErr::Query(duplicate_email())),
            AppError::Conflict(_)
        ));
    }

    #[test]
    fn other_write_errors_keep_their_kind() {
        assert!(matches!(
            map_write_err(DbErr::RecordNotUpdated),
            AppError::NotFound
        ));
        assert!(matches!(
            map_write_err(DbErr::Custom("disk full".to_string())),
            AppError::Database(_)
        ));
    }
}
