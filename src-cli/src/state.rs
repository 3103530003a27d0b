//! Application state management
use estate_core::{Backoffice, Config, Decision, Guard, Result, Session, User};

const FORBIDDEN: &str = "Access denied: administrators only";

/// Shared state handed to every command
pub struct AppState {
    backoffice: Backoffice,
}

impl AppState {
    pub fn new(config: Config) -> Result<Self> {
        Ok(Self {
            backoffice: Backoffice::new(config)?,
        })
    }

    pub async fn initialize(&self) -> Session {
        self.backoffice.initialize().await
    }

    pub fn backoffice(&self) -> &Backoffice {
        &self.backoffice
    }

    /// Resolve a guard to the signed-in user or a message for the caller.
    pub async fn require(&self, guard: &Guard) -> std::result::Result<User, String> {
        match self.backoffice.decide(guard) {
            Decision::Allow => {
                let user = self
                    .backoffice
                    .current_user()
                    .await
                    .map_err(|e| e.to_string())?;
                // The role is only known once the user is confirmed
                match self.backoffice.decide(guard) {
                    Decision::Forbidden => Err(FORBIDDEN.to_string()),
                    _ => Ok(user),
                }
            }
            Decision::Forbidden => Err(FORBIDDEN.to_string()),
            Decision::RedirectToLogin => Err("Not signed in; run `estate-desk login`".to_string()),
            Decision::Pending => Err("Session is still being restored".to_string()),
        }
    }
}
