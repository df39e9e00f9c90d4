use crate::error::AppError;
use crate::extractors::auth::Identity;

/// Single-administrator authorization check.
///
/// Mutating handlers call [`require_admin`](Self::require_admin) before
/// reading the request body, touching storage, or opening a transaction.
#[derive(Debug, Clone)]
pub struct AdminGate {
    admin_email: String,
}

impl AdminGate {
    pub fn new(admin_email: impl Into<String>) -> Self {
        Self {
            admin_email: admin_email.into(),
        }
    }

    /// Exact, case-sensitive match against the configured address.
    /// An empty configured address admits nobody.
    pub fn require_admin(&self, identity: Option<&Identity>) -> Result<(), AppError> {
        match identity {
            Some(id) if !self.admin_email.is_empty() && id.email == self.admin_email => Ok(()),
            _ => Err(AppError::Unauthorized),
        }
    }
}
