//! Account port: credential storage collaborator.
//!
//! How credentials are stored is the adapter's concern; the application
//! only relies on these two operations.

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    AlreadyExists,
}

/// Trait for user account storage.
pub trait AccountStore: Send + Sync {
    /// Error type for account operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Create an account.
    ///
    /// # Errors
    /// Returns error if the storage operation fails. An existing username
    /// is `Ok(Registration::AlreadyExists)`.
    fn register(&self, username: &str, password: &str) -> Result<Registration, Self::Error>;

    /// Check a username/password pair.
    ///
    /// # Errors
    /// Returns error if the storage operation fails. Unknown users and wrong
    /// passwords are `Ok(false)`.
    fn authenticate(&self, username: &str, password: &str) -> Result<bool, Self::Error>;
}
