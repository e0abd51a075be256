//! Credential store: registration and login verification.
//!
//! Passwords are stored as argon2id PHC strings (salt embedded); plaintext
//! never reaches the database. Lookup failure and hash mismatch collapse
//! into the same `InvalidCredentials` error so usernames cannot be probed
//! through the login form.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::db::models::AuthUser;
use crate::db::sqlite::HabitStore;
use crate::error::RitualError;

#[derive(Clone)]
pub struct Accounts {
    store: HabitStore,
}

impl Accounts {
    pub fn new(store: HabitStore) -> Self {
        Self { store }
    }

    /// Create an account. Returns the new user id.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm: &str,
    ) -> Result<i64, RitualError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(RitualError::MissingCredentials);
        }
        if password != confirm {
            return Err(RitualError::PasswordMismatch);
        }
        let hash = hash_password(password)?;
        self.store.insert_user(username, &hash).await
    }

    /// Verify a login attempt and return the authenticated identity.
    pub async fn verify(&self, username: &str, password: &str) -> Result<AuthUser, RitualError> {
        let Some(user) = self.store.user_by_username(username.trim()).await? else {
            return Err(RitualError::InvalidCredentials);
        };
        let parsed = PasswordHash::new(&user.password_hash)
            .map_err(|e| RitualError::PasswordHash(e.to_string()))?;
        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return Err(RitualError::InvalidCredentials);
        }
        Ok(user.into())
    }
}

fn hash_password(password: &str) -> Result<String, RitualError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| RitualError::PasswordHash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    async fn test_accounts() -> Accounts {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await
            .unwrap();
        let store = HabitStore::new(pool);
        store.init_schema().await.unwrap();
        Accounts::new(store)
    }

    #[tokio::test]
    async fn register_then_verify_succeeds_once() {
        let accounts = test_accounts().await;
        let uid = accounts.register("alice", "pw1234", "pw1234").await.unwrap();

        let user = accounts.verify("alice", "pw1234").await.unwrap();
        assert_eq!(user.id, uid);
        assert_eq!(user.username, "alice");

        let err = accounts.register("alice", "other", "other").await.unwrap_err();
        assert!(matches!(err, RitualError::UsernameTaken));
    }

    #[tokio::test]
    async fn stored_hash_is_not_plaintext() {
        let accounts = test_accounts().await;
        accounts.register("alice", "pw1234", "pw1234").await.unwrap();
        let user = accounts
            .store
            .user_by_username("alice")
            .await
            .unwrap()
            .unwrap();
        assert!(user.password_hash.starts_with("$argon2"));
        assert!(!user.password_hash.contains("pw1234"));
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_alike() {
        let accounts = test_accounts().await;
        accounts.register("alice", "pw1234", "pw1234").await.unwrap();

        let wrong_pw = accounts.verify("alice", "nope").await.unwrap_err();
        let no_user = accounts.verify("mallory", "pw1234").await.unwrap_err();
        assert_eq!(wrong_pw.to_string(), no_user.to_string());
        assert!(matches!(wrong_pw, RitualError::InvalidCredentials));
        assert!(matches!(no_user, RitualError::InvalidCredentials));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let accounts = test_accounts().await;

        let err = accounts.register("", "pw", "pw").await.unwrap_err();
        assert!(matches!(err, RitualError::MissingCredentials));

        let err = accounts.register("alice", "", "").await.unwrap_err();
        assert!(matches!(err, RitualError::MissingCredentials));

        let err = accounts.register("alice", "pw1", "pw2").await.unwrap_err();
        assert!(matches!(err, RitualError::PasswordMismatch));
    }
}
