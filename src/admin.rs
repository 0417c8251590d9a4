//! Instructor area: login gate, dashboard and the two-step history wipe.

use tracing::{info, warn};

use crate::error::{QuizError, Result};
use crate::store::ScoreStore;
use crate::view::Dashboard;

#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    user: String,
    pass: String,
}

impl AdminCredentials {
    pub fn new(user: impl Into<String>, pass: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn verify(&self, user: &str, pass: &str) -> bool {
        self.user == user && self.pass == pass
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("user", &self.user)
            .field("pass", &"***")
            .finish()
    }
}

#[derive(Debug)]
pub struct AdminConsole {
    credentials: AdminCredentials,
    authenticated: bool,
    clear_pending: bool,
    leaderboard_size: usize,
    recent_size: usize,
}

impl AdminConsole {
    pub fn new(credentials: AdminCredentials) -> Self {
        Self {
            credentials,
            authenticated: false,
            clear_pending: false,
            leaderboard_size: 10,
            recent_size: 25,
        }
    }

    pub fn with_table_sizes(mut self, leaderboard_size: usize, recent_size: usize) -> Self {
        self.leaderboard_size = leaderboard_size;
        self.recent_size = recent_size;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn clear_pending(&self) -> bool {
        self.clear_pending
    }

    pub fn login(&mut self, user: &str, pass: &str) -> Result<()> {
        if self.credentials.verify(user, pass) {
            self.authenticated = true;
            info!(target: "admin", user, "instructor logged in");
            Ok(())
        } else {
            warn!(target: "admin", user, "rejected instructor login");
            Err(QuizError::NotAuthenticated)
        }
    }

    pub fn logout(&mut self) {
        if self.authenticated {
            info!(target: "admin", "instructor logged out");
        }
        self.authenticated = false;
        self.clear_pending = false;
    }

    fn require_auth(&self) -> Result<()> {
        if self.authenticated {
            Ok(())
        } else {
            Err(QuizError::NotAuthenticated)
        }
    }

    pub fn dashboard(&self, store: &dyn ScoreStore) -> Result<Dashboard> {
        self.require_auth()?;
        let records = store.load_all()?;
        Ok(Dashboard::build(&records, self.leaderboard_size, self.recent_size))
    }

    /// First step of the wipe. Nothing is deleted until `confirm_clear`.
    pub fn request_clear(&mut self) -> Result<()> {
        self.require_auth()?;
        self.clear_pending = true;
        Ok(())
    }

    pub fn cancel_clear(&mut self) {
        self.clear_pending = false;
    }

    pub fn confirm_clear(&mut self, store: &dyn ScoreStore) -> Result<()> {
        self.require_auth()?;
        if !self.clear_pending {
            return Err(QuizError::InvalidTransition {
                operation: "confirm clear",
                phase: "no clear was requested".to_string(),
            });
        }
        self.clear_pending = false;
        store.clear_all()?;
        warn!(target: "admin", "score history cleared");
        Ok(())
    }
}
