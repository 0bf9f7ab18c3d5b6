//! Account service: registration, login and logout.

use std::sync::Arc;

use crate::adapters::StorageError;
use crate::domain::Session;
use crate::ports::{AccountStore, Registration};
use crate::{MedirecError, Result};

/// Wraps the account collaborator and produces sessions.
pub struct AccountService<A: AccountStore> {
    store: Arc<A>,
}

impl<A> AccountService<A>
where
    A: AccountStore,
    A::Error: Into<StorageError>,
{
    pub fn new(store: Arc<A>) -> Self {
        Self { store }
    }

    fn validate(username: &str, password: &str) -> Result<()> {
        if username.trim().is_empty() {
            return Err(MedirecError::Validation("username must not be empty".into()));
        }
        if password.is_empty() {
            return Err(MedirecError::Validation("password must not be empty".into()));
        }
        Ok(())
    }

    /// Create an account.
    ///
    /// # Errors
    /// Returns `Validation` for empty credentials or a storage error.
    pub fn register(&self, username: &str, password: &str) -> Result<Registration> {
        Self::validate(username, password)?;
        let outcome = self
            .store
            .register(username, password)
            .map_err(|e| MedirecError::Storage(e.into()))?;
        if outcome == Registration::AlreadyExists {
            tracing::info!("Registration refused: username taken");
        }
        Ok(outcome)
    }

    /// Check credentials and open a session.
    ///
    /// # Errors
    /// Returns `InvalidCredentials` on a wrong pair, `Validation` for empty
    /// input, or a storage error.
    pub fn login(&self, username: &str, password: &str) -> Result<Session> {
        Self::validate(username, password)?;
        let ok = self
            .store
            .authenticate(username, password)
            .map_err(|e| MedirecError::Storage(e.into()))?;
        if !ok {
            tracing::warn!("Failed login attempt");
            return Err(MedirecError::InvalidCredentials);
        }
        tracing::info!("User logged in");
        Ok(Session::authenticated(username))
    }

    /// Close a session.
    #[must_use]
    pub fn logout(&self, session: Session) -> Session {
        if session.is_authenticated() {
            tracing::info!("User logged out");
        }
        Session::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;

    fn service() -> AccountService<SqliteStorage> {
        AccountService::new(Arc::new(SqliteStorage::in_memory().expect("db")))
    }

    #[test]
    fn test_register_login_logout() {
        let accounts = service();
        assert_eq!(
            accounts.register("alice", "pw").expect("Register"),
            Registration::Registered
        );
        assert_eq!(
            accounts.register("alice", "pw2").expect("Register"),
            Registration::AlreadyExists
        );

        let session = accounts.login("alice", "pw").expect("Login");
        assert_eq!(session.user_id(), Some("alice"));

        let session = accounts.logout(session);
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_wrong_password() {
        let accounts = service();
        accounts.register("alice", "pw").expect("Register");
        assert!(matches!(
            accounts.login("alice", "nope"),
            Err(MedirecError::InvalidCredentials)
        ));
        assert!(matches!(
            accounts.login("mallory", "pw"),
            Err(MedirecError::InvalidCredentials)
        ));
    }

    /// Account store that is always unreachable.
    struct UnavailableAccounts;

    impl AccountStore for UnavailableAccounts {
        type Error = StorageError;

        fn register(
            &self,
            _username: &str,
            _password: &str,
        ) -> std::result::Result<Registration, StorageError> {
            Err(StorageError::LockPoisoned)
        }

        fn authenticate(
            &self,
            _username: &str,
            _password: &str,
        ) -> std::result::Result<bool, StorageError> {
            Err(StorageError::LockPoisoned)
        }
    }

    #[test]
    fn test_store_failure_is_not_a_credential_error() {
        let accounts = AccountService::new(Arc::new(UnavailableAccounts));
        assert!(matches!(
            accounts.register("alice", "pw"),
            Err(MedirecError::Storage(StorageError::LockPoisoned))
        ));
        assert!(matches!(
            accounts.login("alice", "pw"),
            Err(MedirecError::Storage(StorageError::LockPoisoned))
        ));
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let accounts = service();
        assert!(matches!(
            accounts.register("", "pw"),
            Err(MedirecError::Validation(_))
        ));
        assert!(matches!(
            accounts.register("alice", ""),
            Err(MedirecError::Validation(_))
        ));
        assert!(matches!(
            accounts.login("  ", "pw"),
            Err(MedirecError::Validation(_))
        ));
    }
}
