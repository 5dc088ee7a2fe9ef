//! Customer account service: registration and authentication.
//!
//! Passwords are salted and hashed with argon2; plaintext is never
//! stored or compared. The single staff credential is configuration,
//! not a row here.

use store::{Accounts, Customer};

use crate::DomainError;

/// Hashes a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash string.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Service for customer registration and login.
#[derive(Clone)]
pub struct AccountService<S> {
    store: S,
}

impl<S: Accounts> AccountService<S> {
    /// Creates a new account service with the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Registers a new customer account.
    ///
    /// Fails with `Validation` on blank username or password and with
    /// `Duplicate` when the username is already taken.
    #[tracing::instrument(skip(self, password))]
    pub async fn register(&self, username: &str, password: &str) -> Result<Customer, DomainError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(DomainError::validation(
                "username and password are required",
            ));
        }

        let password_hash = hash_password(password)?;
        let customer = self.store.insert_customer(username, &password_hash).await?;

        tracing::info!(customer_id = %customer.id, "customer registered");
        Ok(customer)
    }

    /// Authenticates a customer.
    ///
    /// Fails with `NotFound` for an unknown username so the caller can
    /// suggest registering, and with `InvalidCredentials` on a password
    /// mismatch.
    #[tracing::instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Customer, DomainError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(DomainError::validation(
                "username and password are required",
            ));
        }

        let customer = self
            .store
            .find_customer(username)
            .await?
            .ok_or_else(|| DomainError::not_found("customer", username))?;

        if !verify_password(password, &customer.password_hash) {
            return Err(DomainError::InvalidCredentials);
        }

        Ok(customer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::{Accounts as _, InMemoryStore};

    fn service() -> AccountService<InMemoryStore> {
        AccountService::new(InMemoryStore::new())
    }

    #[tokio::test]
    async fn register_then_authenticate() {
        let svc = service();
        svc.register("alice", "s3cret").await.unwrap();

        let customer = svc.authenticate("alice", "s3cret").await.unwrap();
        assert_eq!(customer.username, "alice");
    }

    #[tokio::test]
    async fn password_is_never_stored_in_plaintext() {
        let store = InMemoryStore::new();
        let svc = AccountService::new(store.clone());
        svc.register("alice", "s3cret").await.unwrap();

        let stored = store.find_customer("alice").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "s3cret");
        assert!(stored.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let svc = service();
        svc.register("alice", "one").await.unwrap();

        let result = svc.register("alice", "two").await;
        assert!(matches!(result, Err(DomainError::Duplicate { .. })));
    }

    #[tokio::test]
    async fn wrong_password_is_invalid_credentials() {
        let svc = service();
        svc.register("alice", "s3cret").await.unwrap();

        let result = svc.authenticate("alice", "wrong").await;
        assert!(matches!(result, Err(DomainError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unknown_username_is_not_found() {
        let svc = service();
        let result = svc.authenticate("nobody", "whatever").await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn blank_username_rejected() {
        let svc = service();
        let result = svc.register("  ", "pw").await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
