use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr,
};

use crate::access::Role;
use crate::auth::CredentialHasher;
use crate::entities::user;
use crate::error::{AppError, AppResult};

/// Account records: username, password hash, role.
#[derive(Clone)]
pub struct CredentialStore {
    db: DatabaseConnection,
    hasher: Arc<dyn CredentialHasher>,
}

impl CredentialStore {
    pub fn new(db: DatabaseConnection, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { db, hasher }
    }

    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> AppResult<user::Model> {
        let hash = self.hasher.hash(password)?;

        let new_user = user::ActiveModel {
            username: Set(username.to_string()),
            password: Set(hash),
            role: Set(role.as_str().to_string()),
            created_at: Set(now_sec()),
            ..Default::default()
        };

        new_user.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => AppError::UsernameTaken,
            _ => AppError::from(e),
        })
    }

    /// Checks a username/password pair. Unknown username and wrong password
    /// produce the same error.
    pub async fn verify_login(&self, username: &str, password: &str) -> AppResult<user::Model> {
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.hasher.verify(password, &user.password)? {
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }
}

fn now_sec() -> i64 {
    jiff::Timestamp::now().as_second()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Argon2Hasher;
    use crate::db::test_db;

    async fn store() -> CredentialStore {
        CredentialStore::new(test_db().await, Arc::new(Argon2Hasher))
    }

    #[tokio::test]
    async fn register_stores_hash_not_password() {
        let store = store().await;
        let user = store.register("alice", "pw123", Role::User).await.unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.role, "user");
        assert_ne!(user.password, "pw123");
        assert!(Argon2Hasher.verify("pw123", &user.password).unwrap());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = store().await;
        store.register("alice", "pw123", Role::User).await.unwrap();

        let err = store.register("alice", "other", Role::Admin).await.unwrap_err();
        assert!(matches!(err, AppError::UsernameTaken));
    }

    #[tokio::test]
    async fn login_round_trip() {
        let store = store().await;
        store.register("alice", "pw123", Role::User).await.unwrap();

        let user = store.verify_login("alice", "pw123").await.unwrap();
        assert_eq!(user.username, "alice");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_are_indistinguishable() {
        let store = store().await;
        store.register("alice", "pw123", Role::User).await.unwrap();

        let wrong_pw = store.verify_login("alice", "nope").await.unwrap_err();
        let no_user = store.verify_login("bob", "pw123").await.unwrap_err();

        assert!(matches!(wrong_pw, AppError::InvalidCredentials));
        assert!(matches!(no_user, AppError::InvalidCredentials));
        assert_eq!(wrong_pw.to_string(), no_user.to_string());
    }
}
