use std::sync::Arc;

use crate::auth::{Credentials, IdentityProvider};
use crate::models::Session;
use crate::presenter::Presenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginMode {
    #[default]
    SignIn,
    Register,
}

impl LoginMode {
    pub fn toggled(self) -> Self {
        match self {
            LoginMode::SignIn => LoginMode::Register,
            LoginMode::Register => LoginMode::SignIn,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Carry this session into the task list screen.
    SignedIn(Session),
    Registered,
    /// Missing input or a rejected request; the user has been alerted.
    Rejected,
}

/// Email/password form in front of the task list.
pub struct LoginController<P: Presenter> {
    identity: Arc<dyn IdentityProvider>,
    presenter: P,
    mode: LoginMode,
    email: String,
    password: String,
    loading: bool,
}

impl<P: Presenter> LoginController<P> {
    pub fn new(identity: Arc<dyn IdentityProvider>, presenter: P) -> Self {
        Self {
            identity,
            presenter,
            mode: LoginMode::default(),
            email: String::new(),
            password: String::new(),
            loading: false,
        }
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggled();
    }

    pub fn mode(&self) -> LoginMode {
        self.mode
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Runs sign-in or registration depending on the current mode.
    pub async fn submit(&mut self) -> LoginOutcome {
        match self.mode {
            LoginMode::SignIn => self.sign_in().await,
            LoginMode::Register => self.register().await,
        }
    }

    pub async fn sign_in(&mut self) -> LoginOutcome {
        let Some(credentials) = self.checked_credentials() else {
            return LoginOutcome::Rejected;
        };
        self.loading = true;
        let outcome = match self.identity.sign_in(&credentials).await {
            Ok(session) => {
                log::info!("signed in email={}", session.email);
                LoginOutcome::SignedIn(session)
            }
            Err(error) => {
                log::warn!("sign in failed email={}: {error}", credentials.email);
                self.presenter
                    .alert("Oops...", &format!("Failed to sign in: {error}"));
                LoginOutcome::Rejected
            }
        };
        self.reset();
        outcome
    }

    pub async fn register(&mut self) -> LoginOutcome {
        let Some(credentials) = self.checked_credentials() else {
            return LoginOutcome::Rejected;
        };
        self.loading = true;
        let outcome = match self.identity.create_account(&credentials).await {
            Ok(()) => {
                log::info!("account created email={}", credentials.email);
                LoginOutcome::Registered
            }
            Err(error) => {
                log::warn!("registration failed email={}: {error}", credentials.email);
                self.presenter
                    .alert("Oops...", &format!("Failed to create account: {error}"));
                LoginOutcome::Rejected
            }
        };
        self.reset();
        outcome
    }

    fn checked_credentials(&self) -> Option<Credentials> {
        let credentials = Credentials::new(self.email.clone(), self.password.clone());
        if credentials.validate().is_err() {
            self.presenter
                .alert("Invalid sign-up", "Email and password are required");
            self.presenter.dismiss_input();
            return None;
        }
        Some(credentials)
    }

    fn reset(&mut self) {
        self.email.clear();
        self.password.clear();
        self.loading = false;
        self.presenter.dismiss_input();
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }
}
