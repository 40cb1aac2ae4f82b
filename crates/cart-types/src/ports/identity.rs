use serde::{Deserialize, Serialize};

use crate::domain::cart::UserId;

/// What the identity layer currently knows about the shopper.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<UserId>,
    /// False until the identity layer has finished resolving the session.
    pub resolved: bool,
}

impl Identity {
    pub fn pending() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            resolved: true,
        }
    }

    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            resolved: true,
        }
    }
}

pub trait IdentityProvider: Send + Sync + 'static {
    fn current(&self) -> Identity;
}
