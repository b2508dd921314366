use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::AuthError;
use crate::models::Session;
use crate::push_id::PushIdGenerator;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    pub fn validate(&self) -> Result<(), AuthError> {
        if self.email.is_empty() || self.password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        Ok(())
    }
}

/// Email/password identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError>;

    /// Registers a new account. No session is returned; the user signs in afterwards.
    async fn create_account(&self, credentials: &Credentials) -> Result<(), AuthError>;
}

#[derive(Debug)]
struct Account {
    user_id: String,
    password: String,
}

/// Keeps accounts in memory. Used by tests and the offline mode of the binary.
#[derive(Debug, Default)]
pub struct MemoryIdentityProvider {
    ids: PushIdGenerator,
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn sign_in(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        credentials.validate()?;
        let accounts = self
            .accounts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match accounts.get(&credentials.email) {
            Some(account) if account.password == credentials.password => {
                Ok(Session::new(account.user_id.clone(), credentials.email.clone()))
            }
            Some(_) => Err(AuthError::InvalidCredentials("wrong password".to_string())),
            None => Err(AuthError::InvalidCredentials("unknown email".to_string())),
        }
    }

    async fn create_account(&self, credentials: &Credentials) -> Result<(), AuthError> {
        credentials.validate()?;
        let mut accounts = self
            .accounts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if accounts.contains_key(&credentials.email) {
            return Err(AuthError::EmailInUse);
        }
        accounts.insert(
            credentials.email.clone(),
            Account {
                user_id: self.ids.generate(),
                password: credentials.password.clone(),
            },
        );
        Ok(())
    }
}
